use tracing::{debug, info};

use shared_database::{ProfileRepository, RepositoryError};
use shared_models::auth::{Actor, Role};
use shared_models::clinic::{Client, Profile, Veterinarian};
use shared_models::error::AppError;

use crate::models::{CreateUserRequest, ListUsersQuery, UpdateUserRequest};
use crate::services::guard;

pub struct UserService<'a, R: ?Sized> {
    repo: &'a R,
}

impl<'a, R> UserService<'a, R>
where
    R: ProfileRepository + ?Sized,
{
    pub fn new(repo: &'a R) -> Self {
        Self { repo }
    }

    /// Creates a client or veterinarian profile. Non-admins may only register
    /// themselves, with the role their token already resolves to.
    pub async fn create_profile(
        &self,
        actor: &Actor,
        request: CreateUserRequest,
    ) -> Result<Profile, AppError> {
        if !actor.is_admin() && request.role != actor.role.as_str() {
            return Err(guard::forbidden(actor, "profile creation"));
        }

        let id = match request.id.filter(|_| actor.is_admin()) {
            Some(id) if !id.is_empty() => id,
            _ => actor.id.clone(),
        };

        let profile = match Role::parse(&request.role) {
            Role::Client => {
                let client = Client {
                    id,
                    name: request.name,
                    email: request.email,
                    phone: request.phone,
                    address: request.address,
                    role: request.role,
                };
                Profile::Client(self.repo.create_client(&client).await?)
            }
            Role::Veterinarian => {
                let vet = Veterinarian {
                    id,
                    name: request.name,
                    email: request.email,
                    phone: request.phone,
                    clinic_address: request.address,
                    available_hours: Vec::new(),
                    role: request.role,
                };
                Profile::Veterinarian(self.repo.create_veterinarian(&vet).await?)
            }
            _ => return Err(AppError::BadRequest("Invalid role".to_string())),
        };

        info!("Created {} profile {}", actor.role, profile.id());
        Ok(profile)
    }

    pub async fn list_profiles(
        &self,
        actor: &Actor,
        query: &ListUsersQuery,
    ) -> Result<Vec<Profile>, AppError> {
        guard::require_admin(actor)?;

        let clients = self.repo.list_clients().await?;
        let vets = self.repo.list_veterinarians().await?;

        Ok(clients
            .into_iter()
            .map(Profile::Client)
            .chain(vets.into_iter().map(Profile::Veterinarian))
            .skip(query.offset())
            .take(query.limit())
            .collect())
    }

    pub async fn get_profile(&self, actor: &Actor, user_id: &str) -> Result<Profile, AppError> {
        guard::authorize_self_or_admin(actor, user_id)?;
        self.find_profile(user_id).await
    }

    pub async fn update_profile(
        &self,
        actor: &Actor,
        user_id: &str,
        request: UpdateUserRequest,
    ) -> Result<Profile, AppError> {
        guard::authorize_self_or_admin(actor, user_id)?;

        match self.find_profile(user_id).await? {
            Profile::Client(mut client) => {
                if let Some(name) = request.name {
                    client.name = name;
                }
                if let Some(email) = request.email {
                    client.email = email;
                }
                if let Some(phone) = request.phone {
                    client.phone = phone;
                }
                if let Some(address) = request.address {
                    client.address = address;
                }
                Ok(Profile::Client(self.repo.update_client(&client).await?))
            }
            Profile::Veterinarian(mut vet) => {
                if let Some(name) = request.name {
                    vet.name = name;
                }
                if let Some(email) = request.email {
                    vet.email = email;
                }
                if let Some(phone) = request.phone {
                    vet.phone = phone;
                }
                Ok(Profile::Veterinarian(self.repo.update_veterinarian(&vet).await?))
            }
        }
    }

    pub async fn delete_profile(&self, actor: &Actor, user_id: &str) -> Result<(), AppError> {
        guard::require_admin(actor)?;
        self.repo.delete_profile(user_id).await?;
        info!("Deleted profile {}", user_id);
        Ok(())
    }

    /// Client profiles win over veterinarian profiles with the same id.
    async fn find_profile(&self, user_id: &str) -> Result<Profile, AppError> {
        match self.repo.get_client(user_id).await {
            Ok(client) => return Ok(Profile::Client(client)),
            Err(RepositoryError::NotFound(_)) => {}
            Err(e) => return Err(e.into()),
        }

        match self.repo.get_veterinarian(user_id).await {
            Ok(vet) => Ok(Profile::Veterinarian(vet)),
            Err(RepositoryError::NotFound(_)) => {
                debug!("No profile stored for {}", user_id);
                Err(AppError::NotFound("User not found".to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }
}
