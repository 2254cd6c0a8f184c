//! Per-resource permission checks layered on the resolved role.
//!
//! Admins pass every check. Clients reach their own records, veterinarians the
//! records where they are the counterparty. Any unrecognized role is refused.

use tracing::warn;

use shared_models::appointment::Appointment;
use shared_models::auth::{Actor, Role};
use shared_models::error::AppError;
use shared_models::pet::{MedicalRecord, Pet};
use shared_models::shop::{Order, Product};

pub fn forbidden(actor: &Actor, action: &str) -> AppError {
    warn!("Denied {} for {} ({})", action, actor.id, actor.role);
    AppError::Forbidden("Insufficient permissions".to_string())
}

fn allow(granted: bool, actor: &Actor, action: &str) -> Result<(), AppError> {
    if granted {
        Ok(())
    } else {
        Err(forbidden(actor, action))
    }
}

pub fn require_admin(actor: &Actor) -> Result<(), AppError> {
    allow(actor.is_admin(), actor, "admin operation")
}

/// Passes when the actor holds one of `roles`; admins always pass.
pub fn require_role(actor: &Actor, roles: &[Role]) -> Result<(), AppError> {
    allow(
        actor.is_admin() || roles.contains(&actor.role),
        actor,
        "role-gated operation",
    )
}

pub fn authorize_self_or_admin(actor: &Actor, user_id: &str) -> Result<(), AppError> {
    allow(actor.is_admin() || actor.id == user_id, actor, "profile access")
}

// ==============================================================================
// PETS & MEDICAL RECORDS
// ==============================================================================

pub fn authorize_pet_create(actor: &Actor, owner_id: &str) -> Result<(), AppError> {
    let granted = match &actor.role {
        Role::Admin => true,
        Role::Client => actor.id == owner_id,
        _ => false,
    };
    allow(granted, actor, "pet creation")
}

pub fn authorize_pet_read(actor: &Actor, pet: &Pet) -> Result<(), AppError> {
    let granted = match &actor.role {
        Role::Admin | Role::Veterinarian => true,
        Role::Client => pet.owner_id == actor.id,
        Role::Unrecognized(_) => false,
    };
    allow(granted, actor, "pet read")
}

/// Veterinarians never modify pets.
pub fn authorize_pet_write(actor: &Actor, pet: &Pet) -> Result<(), AppError> {
    let granted = match &actor.role {
        Role::Admin => true,
        Role::Client => pet.owner_id == actor.id,
        _ => false,
    };
    allow(granted, actor, "pet modification")
}

/// Listing a client's pets: the client themself, veterinarians, or an admin.
pub fn authorize_client_pets(actor: &Actor, client_id: &str) -> Result<(), AppError> {
    let granted = match &actor.role {
        Role::Admin | Role::Veterinarian => true,
        Role::Client => actor.id == client_id,
        Role::Unrecognized(_) => false,
    };
    allow(granted, actor, "client pets listing")
}

pub fn authorize_medical_record_read(actor: &Actor, pet: &Pet) -> Result<(), AppError> {
    let granted = match &actor.role {
        Role::Admin | Role::Veterinarian => true,
        Role::Client => pet.owner_id == actor.id,
        Role::Unrecognized(_) => false,
    };
    allow(granted, actor, "medical record read")
}

pub fn authorize_medical_record_write(actor: &Actor, record: &MedicalRecord) -> Result<(), AppError> {
    let granted = match &actor.role {
        Role::Admin => true,
        Role::Veterinarian => record.veterinarian_id == actor.id,
        _ => false,
    };
    allow(granted, actor, "medical record modification")
}

// ==============================================================================
// APPOINTMENTS
// ==============================================================================

/// Booking for a pet: an admin, or the client who owns it.
pub fn authorize_booking(actor: &Actor, pet: &Pet) -> Result<(), AppError> {
    let granted = match &actor.role {
        Role::Admin => true,
        Role::Client => pet.owner_id == actor.id,
        _ => false,
    };
    allow(granted, actor, "booking")
}

pub fn authorize_appointment(actor: &Actor, appointment: &Appointment) -> Result<(), AppError> {
    let granted = match &actor.role {
        Role::Admin => true,
        Role::Client => appointment.client_id == actor.id,
        Role::Veterinarian => appointment.veterinarian_id == actor.id,
        Role::Unrecognized(_) => false,
    };
    allow(granted, actor, "appointment access")
}

/// Managing a veterinarian's own data (availability, catalog): the vet or an admin.
pub fn authorize_veterinarian_scope(actor: &Actor, veterinarian_id: &str) -> Result<(), AppError> {
    let granted = match &actor.role {
        Role::Admin => true,
        Role::Veterinarian => actor.id == veterinarian_id,
        _ => false,
    };
    allow(granted, actor, "veterinarian management")
}

// ==============================================================================
// SHOP
// ==============================================================================

pub fn authorize_product(actor: &Actor, product: &Product) -> Result<(), AppError> {
    authorize_veterinarian_scope(actor, &product.veterinarian_id)
}

pub fn authorize_order(actor: &Actor, order: &Order) -> Result<(), AppError> {
    let granted = match &actor.role {
        Role::Admin => true,
        Role::Client => order.client_id == actor.id,
        Role::Veterinarian => order.veterinarian_id == actor.id,
        Role::Unrecognized(_) => false,
    };
    allow(granted, actor, "order access")
}

/// Status changes belong to the fulfilling veterinarian.
pub fn authorize_order_fulfilment(actor: &Actor, order: &Order) -> Result<(), AppError> {
    authorize_veterinarian_scope(actor, &order.veterinarian_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::Utc;

    use shared_models::appointment::AppointmentStatus;

    fn actor(id: &str, role: Role) -> Actor {
        Actor::new(id, None, role)
    }

    fn pet(owner: &str) -> Pet {
        Pet {
            id: "pet-1".into(),
            owner_id: owner.into(),
            name: "Rex".into(),
            pet_type: "dog".into(),
            breed: String::new(),
            date_of_birth: None,
            weight: 0.0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn appointment(client: &str, vet: &str) -> Appointment {
        Appointment {
            id: "appt-1".into(),
            client_id: client.into(),
            veterinarian_id: vet.into(),
            pet_id: "pet-1".into(),
            appointment_date: Utc::now(),
            duration_minutes: 30,
            reason: "Checkup".into(),
            status: AppointmentStatus::Scheduled,
            notes: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn admin_bypasses_ownership() {
        let admin = actor("admin-1", Role::Admin);
        assert!(authorize_pet_write(&admin, &pet("someone")).is_ok());
        assert!(authorize_appointment(&admin, &appointment("c", "v")).is_ok());
        assert!(authorize_veterinarian_scope(&admin, "vet-9").is_ok());
        assert!(require_admin(&admin).is_ok());
    }

    #[test]
    fn clients_only_reach_their_own_pets() {
        let owner = actor("client-1", Role::Client);
        assert!(authorize_pet_read(&owner, &pet("client-1")).is_ok());
        assert!(authorize_booking(&owner, &pet("client-1")).is_ok());
        assert_matches!(
            authorize_booking(&owner, &pet("client-2")),
            Err(AppError::Forbidden(_))
        );
        assert_matches!(authorize_pet_create(&owner, "client-2"), Err(AppError::Forbidden(_)));
    }

    #[test]
    fn veterinarians_read_but_never_modify_pets() {
        let vet = actor("vet-1", Role::Veterinarian);
        assert!(authorize_pet_read(&vet, &pet("client-1")).is_ok());
        assert_matches!(authorize_pet_write(&vet, &pet("client-1")), Err(AppError::Forbidden(_)));
        assert_matches!(authorize_pet_create(&vet, "vet-1"), Err(AppError::Forbidden(_)));
        assert_matches!(authorize_booking(&vet, &pet("client-1")), Err(AppError::Forbidden(_)));
    }

    #[test]
    fn appointment_access_follows_counterparty() {
        let appt = appointment("client-1", "vet-1");
        assert!(authorize_appointment(&actor("client-1", Role::Client), &appt).is_ok());
        assert!(authorize_appointment(&actor("vet-1", Role::Veterinarian), &appt).is_ok());
        assert!(authorize_appointment(&actor("vet-2", Role::Veterinarian), &appt).is_err());
        // A client id presented under the vet role does not match the vet field.
        assert!(authorize_appointment(&actor("client-1", Role::Veterinarian), &appt).is_err());
    }

    #[test]
    fn medical_records_are_modified_by_their_author() {
        let record = MedicalRecord {
            id: "rec-1".into(),
            pet_id: "pet-1".into(),
            veterinarian_id: "vet-1".into(),
            date_of_visit: Utc::now(),
            reason_for_visit: "Vaccination".into(),
            diagnosis: String::new(),
            medication_prescribed: vec![],
            notes: String::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert!(authorize_medical_record_write(&actor("vet-1", Role::Veterinarian), &record).is_ok());
        assert!(authorize_medical_record_write(&actor("vet-2", Role::Veterinarian), &record).is_err());
        assert!(authorize_medical_record_write(&actor("client-1", Role::Client), &record).is_err());
    }

    #[test]
    fn unrecognized_roles_are_forbidden_everywhere() {
        let stranger = actor("user-1", Role::Unrecognized("authenticated".into()));
        assert_matches!(
            require_role(&stranger, &[Role::Client, Role::Veterinarian]),
            Err(AppError::Forbidden(_))
        );
        assert!(authorize_pet_read(&stranger, &pet("user-1")).is_err());
        assert!(authorize_client_pets(&stranger, "user-1").is_err());
        assert!(authorize_appointment(&stranger, &appointment("user-1", "user-1")).is_err());
    }
}
