use tracing::debug;

use shared_database::ProfileRepository;
use shared_models::auth::Role;

/// Claims issued by the identity provider that say nothing about the
/// application role.
const GENERIC_CLAIMS: [&str; 3] = ["authenticated", "user", ""];

pub fn is_generic_claim(claim: &str) -> bool {
    GENERIC_CLAIMS.contains(&claim)
}

/// Maps the token's role claim to an application role.
///
/// A concrete claim is returned as is. A generic or missing claim is resolved
/// from the stored profiles, client first, then veterinarian. Lookup failures
/// count as "no profile"; when nothing matches the original claim comes back
/// as `Role::Unrecognized`.
pub async fn resolve_role<R>(repo: &R, claims_role: Option<&str>, user_id: &str) -> Role
where
    R: ProfileRepository + ?Sized,
{
    let claim = claims_role.unwrap_or("");
    let role = Role::parse(claim);
    if role.is_recognized() || !is_generic_claim(claim) {
        return role;
    }

    match repo.get_client(user_id).await {
        Ok(client) if !client.role.is_empty() => {
            debug!("Resolved role {} for {} from client profile", client.role, user_id);
            return Role::parse(&client.role);
        }
        Ok(_) => debug!("Client profile {} has no role", user_id),
        Err(e) => debug!("No client profile for {}: {}", user_id, e),
    }

    match repo.get_veterinarian(user_id).await {
        Ok(vet) if !vet.role.is_empty() => {
            debug!("Resolved role {} for {} from veterinarian profile", vet.role, user_id);
            Role::parse(&vet.role)
        }
        Ok(_) => {
            debug!("Veterinarian profile {} has no role", user_id);
            role
        }
        Err(e) => {
            debug!("No veterinarian profile for {}: {}", user_id, e);
            role
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use mockall::mock;
    use mockall::predicate::eq;

    use shared_database::{RepoResult, RepositoryError};
    use shared_models::clinic::{Client, Veterinarian};

    mock! {
        Profiles {}

        #[async_trait]
        impl ProfileRepository for Profiles {
            async fn get_client(&self, id: &str) -> RepoResult<Client>;
            async fn get_veterinarian(&self, id: &str) -> RepoResult<Veterinarian>;
            async fn list_clients(&self) -> RepoResult<Vec<Client>>;
            async fn list_veterinarians(&self) -> RepoResult<Vec<Veterinarian>>;
            async fn create_client(&self, client: &Client) -> RepoResult<Client>;
            async fn create_veterinarian(&self, vet: &Veterinarian) -> RepoResult<Veterinarian>;
            async fn update_client(&self, client: &Client) -> RepoResult<Client>;
            async fn update_veterinarian(&self, vet: &Veterinarian) -> RepoResult<Veterinarian>;
            async fn delete_profile(&self, id: &str) -> RepoResult<()>;
        }
    }

    fn client(role: &str) -> Client {
        Client {
            id: "user-1".into(),
            name: "Owner".into(),
            email: String::new(),
            phone: String::new(),
            address: String::new(),
            role: role.into(),
        }
    }

    fn vet(role: &str) -> Veterinarian {
        Veterinarian {
            id: "user-1".into(),
            name: "Vet".into(),
            email: String::new(),
            phone: String::new(),
            clinic_address: String::new(),
            available_hours: vec![],
            role: role.into(),
        }
    }

    #[tokio::test]
    async fn concrete_claims_skip_lookups() {
        let repo = MockProfiles::new();
        assert_eq!(resolve_role(&repo, Some("admin"), "user-1").await, Role::Admin);
        assert_eq!(resolve_role(&repo, Some("client"), "user-1").await, Role::Client);
        assert_eq!(
            resolve_role(&repo, Some("doctor"), "user-1").await,
            Role::Unrecognized("doctor".into())
        );
    }

    #[tokio::test]
    async fn generic_claim_uses_client_profile_first() {
        let mut repo = MockProfiles::new();
        repo.expect_get_client()
            .with(eq("user-1"))
            .times(1)
            .returning(|_| Ok(client("client")));
        repo.expect_get_veterinarian().never();

        assert_eq!(
            resolve_role(&repo, Some("authenticated"), "user-1").await,
            Role::Client
        );
    }

    #[tokio::test]
    async fn falls_back_to_veterinarian_profile() {
        let mut repo = MockProfiles::new();
        repo.expect_get_client()
            .returning(|_| Err(RepositoryError::NotFound("Client".into())));
        repo.expect_get_veterinarian()
            .returning(|_| Ok(vet("veterinarian")));

        assert_eq!(resolve_role(&repo, None, "user-1").await, Role::Veterinarian);
    }

    #[tokio::test]
    async fn client_without_role_falls_through_to_veterinarian() {
        let mut repo = MockProfiles::new();
        repo.expect_get_client().returning(|_| Ok(client("")));
        repo.expect_get_veterinarian().returning(|_| Ok(vet("veterinarian")));

        assert_eq!(resolve_role(&repo, Some("user"), "user-1").await, Role::Veterinarian);
    }

    #[tokio::test]
    async fn profiles_without_roles_leave_claim_unresolved() {
        let mut repo = MockProfiles::new();
        repo.expect_get_client().returning(|_| Ok(client("")));
        repo.expect_get_veterinarian().returning(|_| Ok(vet("")));

        assert_eq!(
            resolve_role(&repo, Some(""), "user-1").await,
            Role::Unrecognized(String::new())
        );
    }

    #[tokio::test]
    async fn lookup_errors_degrade_to_the_generic_claim() {
        let mut repo = MockProfiles::new();
        repo.expect_get_client()
            .returning(|_| Err(RepositoryError::Backend("connection reset".into())));
        repo.expect_get_veterinarian()
            .returning(|_| Err(RepositoryError::Backend("connection reset".into())));

        let role = resolve_role(&repo, Some("authenticated"), "user-1").await;
        assert_eq!(role, Role::Unrecognized("authenticated".into()));
        assert!(!role.is_recognized());
    }
}
