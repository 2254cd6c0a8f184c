use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::debug;

use shared_models::appointment::Appointment;
use shared_models::clinic::{Client, Veterinarian};
use shared_models::pet::{MedicalRecord, Pet, PetQrCode};
use shared_models::shop::{Order, OrderItem, OrderStatus, PaymentStatus, Product, ProductFilters};

use crate::repository::{
    AppointmentQuery, AppointmentRepository, MedicalRecordRepository, OrderQuery,
    OrderRepository, PetRepository, ProductRepository, ProfileRepository, QrCodeRepository,
    RepoResult, RepositoryError, Store,
};

#[derive(Default)]
struct Tables {
    clients: HashMap<String, Client>,
    veterinarians: HashMap<String, Veterinarian>,
    pets: HashMap<String, Pet>,
    medical_records: HashMap<String, MedicalRecord>,
    qr_codes: HashMap<String, PetQrCode>,
    appointments: HashMap<String, Appointment>,
    products: HashMap<String, Product>,
    orders: HashMap<String, Order>,
    order_items: HashMap<String, Vec<OrderItem>>,
}

impl Tables {
    /// Mirrors the partial unique index on (veterinarian_id, appointment_date).
    fn slot_taken(&self, candidate: &Appointment) -> bool {
        candidate.occupies_calendar()
            && self.appointments.values().any(|existing| {
                existing.id != candidate.id
                    && existing.occupies_calendar()
                    && existing.veterinarian_id == candidate.veterinarian_id
                    && existing.appointment_date == candidate.appointment_date
            })
    }
}

/// Process-local storage used for development runs and tests.
#[derive(Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn not_found(what: &str) -> RepositoryError {
    RepositoryError::NotFound(what.to_string())
}

fn order_status_moved() -> RepositoryError {
    RepositoryError::Conflict("Order status changed, reload the order and retry".to_string())
}

#[async_trait]
impl ProfileRepository for InMemoryStore {
    async fn get_client(&self, id: &str) -> RepoResult<Client> {
        let tables = self.tables.read().await;
        tables.clients.get(id).cloned().ok_or_else(|| not_found("Client"))
    }

    async fn get_veterinarian(&self, id: &str) -> RepoResult<Veterinarian> {
        let tables = self.tables.read().await;
        tables
            .veterinarians
            .get(id)
            .cloned()
            .ok_or_else(|| not_found("Veterinarian"))
    }

    async fn list_clients(&self) -> RepoResult<Vec<Client>> {
        let tables = self.tables.read().await;
        let mut clients: Vec<Client> = tables.clients.values().cloned().collect();
        clients.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(clients)
    }

    async fn list_veterinarians(&self) -> RepoResult<Vec<Veterinarian>> {
        let tables = self.tables.read().await;
        let mut vets: Vec<Veterinarian> = tables.veterinarians.values().cloned().collect();
        vets.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(vets)
    }

    async fn create_client(&self, client: &Client) -> RepoResult<Client> {
        let mut tables = self.tables.write().await;
        if tables.clients.contains_key(&client.id) {
            return Err(RepositoryError::Conflict("Client already exists".to_string()));
        }
        tables.clients.insert(client.id.clone(), client.clone());
        Ok(client.clone())
    }

    async fn create_veterinarian(&self, vet: &Veterinarian) -> RepoResult<Veterinarian> {
        let mut tables = self.tables.write().await;
        if tables.veterinarians.contains_key(&vet.id) {
            return Err(RepositoryError::Conflict(
                "Veterinarian already exists".to_string(),
            ));
        }
        tables.veterinarians.insert(vet.id.clone(), vet.clone());
        Ok(vet.clone())
    }

    async fn update_client(&self, client: &Client) -> RepoResult<Client> {
        let mut tables = self.tables.write().await;
        let slot = tables
            .clients
            .get_mut(&client.id)
            .ok_or_else(|| not_found("Client"))?;
        *slot = client.clone();
        Ok(client.clone())
    }

    async fn update_veterinarian(&self, vet: &Veterinarian) -> RepoResult<Veterinarian> {
        let mut tables = self.tables.write().await;
        let slot = tables
            .veterinarians
            .get_mut(&vet.id)
            .ok_or_else(|| not_found("Veterinarian"))?;
        *slot = vet.clone();
        Ok(vet.clone())
    }

    async fn delete_profile(&self, id: &str) -> RepoResult<()> {
        let mut tables = self.tables.write().await;
        let removed_client = tables.clients.remove(id).is_some();
        let removed_vet = tables.veterinarians.remove(id).is_some();
        if removed_client || removed_vet {
            Ok(())
        } else {
            Err(not_found("User"))
        }
    }
}

#[async_trait]
impl PetRepository for InMemoryStore {
    async fn get_pet(&self, id: &str) -> RepoResult<Pet> {
        let tables = self.tables.read().await;
        tables.pets.get(id).cloned().ok_or_else(|| not_found("Pet"))
    }

    async fn list_pets_by_owner(&self, owner_id: &str) -> RepoResult<Vec<Pet>> {
        let tables = self.tables.read().await;
        let mut pets: Vec<Pet> = tables
            .pets
            .values()
            .filter(|pet| pet.owner_id == owner_id)
            .cloned()
            .collect();
        pets.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(pets)
    }

    async fn create_pet(&self, pet: &Pet) -> RepoResult<Pet> {
        let mut tables = self.tables.write().await;
        tables.pets.insert(pet.id.clone(), pet.clone());
        Ok(pet.clone())
    }

    async fn update_pet(&self, pet: &Pet) -> RepoResult<Pet> {
        let mut tables = self.tables.write().await;
        let slot = tables.pets.get_mut(&pet.id).ok_or_else(|| not_found("Pet"))?;
        *slot = pet.clone();
        Ok(pet.clone())
    }

    async fn delete_pet(&self, id: &str) -> RepoResult<()> {
        let mut tables = self.tables.write().await;
        tables.pets.remove(id).ok_or_else(|| not_found("Pet"))?;
        tables.qr_codes.retain(|_, qr_code| qr_code.pet_id != id);
        Ok(())
    }
}

#[async_trait]
impl QrCodeRepository for InMemoryStore {
    async fn get_qr_code_by_pet(&self, pet_id: &str) -> RepoResult<PetQrCode> {
        let tables = self.tables.read().await;
        tables
            .qr_codes
            .values()
            .find(|qr_code| qr_code.pet_id == pet_id)
            .cloned()
            .ok_or_else(|| not_found("QR code"))
    }

    async fn get_active_qr_code_by_public_url(&self, public_url: &str) -> RepoResult<PetQrCode> {
        let tables = self.tables.read().await;
        tables
            .qr_codes
            .values()
            .find(|qr_code| qr_code.is_active && qr_code.public_url == public_url)
            .cloned()
            .ok_or_else(|| not_found("QR code"))
    }

    async fn create_qr_code(&self, qr_code: &PetQrCode) -> RepoResult<PetQrCode> {
        let mut tables = self.tables.write().await;
        // Mirrors the unique index on qr_codes.pet_id.
        if tables.qr_codes.values().any(|existing| existing.pet_id == qr_code.pet_id) {
            return Err(RepositoryError::Conflict("QR code already exists".to_string()));
        }
        tables.qr_codes.insert(qr_code.id.clone(), qr_code.clone());
        Ok(qr_code.clone())
    }

    async fn update_qr_code(&self, qr_code: &PetQrCode) -> RepoResult<PetQrCode> {
        let mut tables = self.tables.write().await;
        let slot = tables
            .qr_codes
            .get_mut(&qr_code.id)
            .ok_or_else(|| not_found("QR code"))?;
        *slot = qr_code.clone();
        Ok(qr_code.clone())
    }
}

#[async_trait]
impl MedicalRecordRepository for InMemoryStore {
    async fn get_medical_record(&self, id: &str) -> RepoResult<MedicalRecord> {
        let tables = self.tables.read().await;
        tables
            .medical_records
            .get(id)
            .cloned()
            .ok_or_else(|| not_found("Medical record"))
    }

    async fn list_medical_records(&self, pet_id: &str) -> RepoResult<Vec<MedicalRecord>> {
        let tables = self.tables.read().await;
        let mut records: Vec<MedicalRecord> = tables
            .medical_records
            .values()
            .filter(|record| record.pet_id == pet_id)
            .cloned()
            .collect();
        records.sort_by(|a, b| b.date_of_visit.cmp(&a.date_of_visit));
        Ok(records)
    }

    async fn create_medical_record(&self, record: &MedicalRecord) -> RepoResult<MedicalRecord> {
        let mut tables = self.tables.write().await;
        tables
            .medical_records
            .insert(record.id.clone(), record.clone());
        Ok(record.clone())
    }

    async fn update_medical_record(&self, record: &MedicalRecord) -> RepoResult<MedicalRecord> {
        let mut tables = self.tables.write().await;
        let slot = tables
            .medical_records
            .get_mut(&record.id)
            .ok_or_else(|| not_found("Medical record"))?;
        *slot = record.clone();
        Ok(record.clone())
    }

    async fn delete_medical_record(&self, id: &str) -> RepoResult<()> {
        let mut tables = self.tables.write().await;
        tables
            .medical_records
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| not_found("Medical record"))
    }
}

#[async_trait]
impl AppointmentRepository for InMemoryStore {
    async fn get_appointment(&self, id: &str) -> RepoResult<Appointment> {
        let tables = self.tables.read().await;
        tables
            .appointments
            .get(id)
            .cloned()
            .ok_or_else(|| not_found("Appointment"))
    }

    async fn list_appointments(&self, query: &AppointmentQuery) -> RepoResult<Vec<Appointment>> {
        let tables = self.tables.read().await;
        let mut appointments: Vec<Appointment> = tables
            .appointments
            .values()
            .filter(|a| query.client_id.as_ref().map_or(true, |id| &a.client_id == id))
            .filter(|a| {
                query
                    .veterinarian_id
                    .as_ref()
                    .map_or(true, |id| &a.veterinarian_id == id)
            })
            .cloned()
            .collect();
        appointments.sort_by(|a, b| a.appointment_date.cmp(&b.appointment_date));
        Ok(appointments)
    }

    async fn list_veterinarian_appointments_between(
        &self,
        veterinarian_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> RepoResult<Vec<Appointment>> {
        let tables = self.tables.read().await;
        let mut appointments: Vec<Appointment> = tables
            .appointments
            .values()
            .filter(|a| {
                a.veterinarian_id == veterinarian_id
                    && a.appointment_date >= from
                    && a.appointment_date < to
            })
            .cloned()
            .collect();
        appointments.sort_by(|a, b| a.appointment_date.cmp(&b.appointment_date));
        Ok(appointments)
    }

    async fn create_appointment(&self, appointment: &Appointment) -> RepoResult<Appointment> {
        let mut tables = self.tables.write().await;
        if tables.slot_taken(appointment) {
            debug!(
                "Rejecting appointment {} for veterinarian {}: start already booked",
                appointment.id, appointment.veterinarian_id
            );
            return Err(RepositoryError::Conflict(
                "Selected time is not available".to_string(),
            ));
        }
        tables
            .appointments
            .insert(appointment.id.clone(), appointment.clone());
        Ok(appointment.clone())
    }

    async fn update_appointment(&self, appointment: &Appointment) -> RepoResult<Appointment> {
        let mut tables = self.tables.write().await;
        if !tables.appointments.contains_key(&appointment.id) {
            return Err(not_found("Appointment"));
        }
        if tables.slot_taken(appointment) {
            return Err(RepositoryError::Conflict(
                "Selected time is not available".to_string(),
            ));
        }
        tables
            .appointments
            .insert(appointment.id.clone(), appointment.clone());
        Ok(appointment.clone())
    }
}

#[async_trait]
impl ProductRepository for InMemoryStore {
    async fn get_product(&self, id: &str) -> RepoResult<Product> {
        let tables = self.tables.read().await;
        tables
            .products
            .get(id)
            .cloned()
            .ok_or_else(|| not_found("Product"))
    }

    async fn list_products(&self, filters: &ProductFilters) -> RepoResult<Vec<Product>> {
        let tables = self.tables.read().await;
        let mut products: Vec<Product> = tables
            .products
            .values()
            .filter(|product| filters.matches(product))
            .cloned()
            .collect();
        products.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        Ok(products
            .into_iter()
            .skip(filters.offset())
            .take(filters.limit())
            .collect())
    }

    async fn create_product(&self, product: &Product) -> RepoResult<Product> {
        let mut tables = self.tables.write().await;
        tables.products.insert(product.id.clone(), product.clone());
        Ok(product.clone())
    }

    async fn update_product(&self, product: &Product) -> RepoResult<Product> {
        let mut tables = self.tables.write().await;
        let slot = tables
            .products
            .get_mut(&product.id)
            .ok_or_else(|| not_found("Product"))?;
        *slot = product.clone();
        Ok(product.clone())
    }

    async fn set_product_stock(&self, id: &str, stock_quantity: i32) -> RepoResult<Product> {
        let mut tables = self.tables.write().await;
        let product = tables
            .products
            .get_mut(id)
            .ok_or_else(|| not_found("Product"))?;
        product.stock_quantity = stock_quantity;
        product.updated_at = Utc::now();
        Ok(product.clone())
    }
}

#[async_trait]
impl OrderRepository for InMemoryStore {
    async fn get_order(&self, id: &str) -> RepoResult<Order> {
        let tables = self.tables.read().await;
        tables.orders.get(id).cloned().ok_or_else(|| not_found("Order"))
    }

    async fn list_orders(&self, query: &OrderQuery) -> RepoResult<Vec<Order>> {
        let tables = self.tables.read().await;
        let mut orders: Vec<Order> = tables
            .orders
            .values()
            .filter(|o| query.client_id.as_ref().map_or(true, |id| &o.client_id == id))
            .filter(|o| {
                query
                    .veterinarian_id
                    .as_ref()
                    .map_or(true, |id| &o.veterinarian_id == id)
            })
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }

    async fn list_order_items(&self, order_id: &str) -> RepoResult<Vec<OrderItem>> {
        let tables = self.tables.read().await;
        Ok(tables.order_items.get(order_id).cloned().unwrap_or_default())
    }

    async fn create_order(&self, order: &Order, items: &[OrderItem]) -> RepoResult<Order> {
        let mut tables = self.tables.write().await;

        // Check every line before touching stock so a failure leaves nothing behind.
        let mut required: HashMap<&str, i32> = HashMap::new();
        for item in items {
            let quantity = required.entry(item.product_id.as_str()).or_default();
            *quantity = quantity.checked_add(item.quantity).ok_or_else(|| {
                RepositoryError::Rejected("Order quantity is too large".to_string())
            })?;
        }
        for (product_id, quantity) in &required {
            let product = tables
                .products
                .get(*product_id)
                .ok_or_else(|| not_found("Product"))?;
            if product.stock_quantity < *quantity {
                return Err(RepositoryError::Rejected(format!(
                    "Insufficient stock for product: {}",
                    product.name
                )));
            }
        }

        let now = Utc::now();
        for (product_id, quantity) in required {
            if let Some(product) = tables.products.get_mut(product_id) {
                product.stock_quantity -= quantity;
                product.updated_at = now;
            }
        }

        tables.orders.insert(order.id.clone(), order.clone());
        tables.order_items.insert(order.id.clone(), items.to_vec());
        Ok(order.clone())
    }

    async fn update_order_status(
        &self,
        id: &str,
        expected: OrderStatus,
        status: Option<OrderStatus>,
        payment_status: Option<PaymentStatus>,
    ) -> RepoResult<Order> {
        let mut tables = self.tables.write().await;
        let order = tables.orders.get_mut(id).ok_or_else(|| not_found("Order"))?;
        if order.status != expected {
            return Err(order_status_moved());
        }
        if let Some(status) = status {
            order.status = status;
        }
        if let Some(payment_status) = payment_status {
            order.payment_status = payment_status;
        }
        order.updated_at = Utc::now();
        Ok(order.clone())
    }

    async fn cancel_order(&self, id: &str) -> RepoResult<Order> {
        let mut tables = self.tables.write().await;

        let order = tables.orders.get(id).cloned().ok_or_else(|| not_found("Order"))?;
        if !order.status.is_cancellable() {
            return Err(RepositoryError::Rejected(
                "Order cannot be cancelled in current status".to_string(),
            ));
        }

        let now = Utc::now();
        let items = tables.order_items.get(id).cloned().unwrap_or_default();
        for item in &items {
            if let Some(product) = tables.products.get_mut(&item.product_id) {
                product.stock_quantity += item.quantity;
                product.updated_at = now;
            }
        }

        let order = tables.orders.get_mut(id).ok_or_else(|| not_found("Order"))?;
        order.status = OrderStatus::Cancelled;
        order.updated_at = now;
        Ok(order.clone())
    }
}

#[async_trait]
impl Store for InMemoryStore {
    async fn ping(&self) -> RepoResult<()> {
        Ok(())
    }
}
