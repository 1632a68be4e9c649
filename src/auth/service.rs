use log::info;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use super::deliverability::{check_or_assume, EmailVerifier, UNDELIVERABLE_MESSAGE};
use super::token::TokenIssuer;
use super::{hash_password, is_valid_email, verify_password, verify_unknown_user};
use crate::config::Settings;
use crate::error::{CatalogError, CatalogResult, FieldError};
use crate::model::{NewUser, Role, User};
use crate::store::CatalogStore;

const INVALID_CREDENTIALS: &str = "Invalid email or password";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
    pub phone: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Profile plus bearer token, returned after register and login
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub phone: String,
    pub role: Role,
    pub token: String,
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

impl Registration {
    /// Local checks only, run before anything touches the store or network
    fn validate(&self) -> CatalogResult<()> {
        let mut errors = Vec::new();

        if self.username.trim().is_empty() {
            errors.push(FieldError::new("username", "Username is required"));
        }
        if !is_valid_email(self.email.trim()) {
            errors.push(FieldError::new("email", "Invalid email ID format."));
        }
        if self.password.is_empty() {
            errors.push(FieldError::new("password", "Password is required"));
        }
        if self.phone.trim().is_empty() {
            errors.push(FieldError::new("phone", "Phone number is required"));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(CatalogError::Validation(errors))
        }
    }
}

/// Registration and login
#[derive(Clone)]
pub struct AuthService {
    settings: Arc<Settings>,
    store: Arc<dyn CatalogStore>,
    tokens: TokenIssuer,
    verifier: Arc<dyn EmailVerifier>,
}

impl AuthService {
    pub fn new(
        settings: Arc<Settings>,
        store: Arc<dyn CatalogStore>,
        verifier: Arc<dyn EmailVerifier>,
    ) -> Self {
        let tokens = TokenIssuer::new(&settings.jwt_secret);
        Self {
            settings,
            store,
            tokens,
            verifier,
        }
    }

    pub fn tokens(&self) -> &TokenIssuer {
        &self.tokens
    }

    pub async fn register(&self, registration: Registration) -> CatalogResult<Session> {
        registration.validate()?;
        let email = normalize_email(&registration.email);

        if self.store.find_user_by_email(&email).await?.is_some() {
            return Err(CatalogError::invalid("email", "User already exists"));
        }

        let verdict = check_or_assume(self.verifier.as_ref(), &email).await;
        if !verdict.allows_registration() {
            return Err(CatalogError::invalid("email", UNDELIVERABLE_MESSAGE));
        }

        let role = if self.settings.is_admin_email(&email) {
            Role::Admin
        } else {
            Role::User
        };

        let user = self
            .store
            .create_user(NewUser {
                username: registration.username.trim().to_string(),
                email,
                password_hash: hash_password(&registration.password)?,
                phone: registration.phone.trim().to_string(),
                role,
            })
            .await?;

        info!("Registered user {} ({:?})", user.id, user.role);
        self.session_for(user)
    }

    /// Unknown email and wrong password fail the same way
    pub async fn login(&self, credentials: Credentials) -> CatalogResult<Session> {
        let email = normalize_email(&credentials.email);
        let authenticated = match self.store.find_user_by_email(&email).await? {
            Some(user) => {
                verify_password(&credentials.password, &user.password_hash).then_some(user)
            }
            None => {
                verify_unknown_user(&credentials.password);
                None
            }
        };

        let user =
            authenticated.ok_or_else(|| CatalogError::Auth(INVALID_CREDENTIALS.to_string()))?;
        self.session_for(user)
    }

    /// Resolves a bearer token to the user it was issued for
    pub async fn authenticate(&self, token: &str) -> CatalogResult<User> {
        let claims = self.tokens.verify(token)?;
        self.store
            .get_user(claims.id)
            .await?
            .ok_or_else(|| CatalogError::Auth("Not authorized, user not found".to_string()))
    }

    fn session_for(&self, user: User) -> CatalogResult<Session> {
        let token = self.tokens.issue(user.id)?;
        Ok(Session {
            id: user.id,
            username: user.username,
            email: user.email,
            phone: user.phone,
            role: user.role,
            token,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{ExternalServiceError, Verdict};
    use crate::store::MemoryStore;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Fixed {
        result: fn() -> Result<Verdict, ExternalServiceError>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl EmailVerifier for Fixed {
        async fn verify(&self, _email: &str) -> Result<Verdict, ExternalServiceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            (self.result)()
        }
    }

    fn service(result: fn() -> Result<Verdict, ExternalServiceError>) -> (AuthService, Arc<Fixed>) {
        let mut settings = Settings::for_secret("test-secret");
        settings.admin_emails = "chef@example.com".to_string();
        let verifier = Arc::new(Fixed {
            result,
            calls: AtomicUsize::new(0),
        });
        let service = AuthService::new(
            Arc::new(settings),
            Arc::new(MemoryStore::new()),
            verifier.clone(),
        );
        (service, verifier)
    }

    fn registration(email: &str) -> Registration {
        Registration {
            username: "cook".to_string(),
            email: email.to_string(),
            password: "hunter22".to_string(),
            phone: "555-0100".to_string(),
        }
    }

    #[tokio::test]
    async fn test_register_then_login() {
        let (service, _) = service(|| Ok(Verdict::Deliverable));

        let session = service.register(registration("Cook@Example.com ")).await.unwrap();
        assert_eq!(session.email, "cook@example.com");
        assert_eq!(session.role, Role::User);

        let login = service
            .login(Credentials {
                email: "cook@example.com".to_string(),
                password: "hunter22".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(login.id, session.id);

        let user = service.authenticate(&login.token).await.unwrap();
        assert_eq!(user.id, session.id);
    }

    #[tokio::test]
    async fn test_unknown_email_with_placeholder_password_fails() {
        let (service, _) = service(|| Ok(Verdict::Deliverable));
        let err = service
            .login(Credentials {
                email: "ghost@example.com".to_string(),
                password: "unknown-user-placeholder".to_string(),
            })
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), INVALID_CREDENTIALS);
    }

    #[tokio::test]
    async fn test_listed_email_becomes_admin() {
        let (service, _) = service(|| Ok(Verdict::Deliverable));
        let session = service.register(registration("chef@example.com")).await.unwrap();
        assert_eq!(session.role, Role::Admin);
    }

    #[tokio::test]
    async fn test_local_validation_runs_before_the_check() {
        let (service, verifier) = service(|| Ok(Verdict::Deliverable));

        let err = service
            .register(Registration {
                phone: String::new(),
                ..registration("not-an-email")
            })
            .await
            .unwrap_err();

        match err {
            CatalogError::Validation(errors) => {
                let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
                assert_eq!(fields, vec!["email", "phone"]);
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert_eq!(verifier.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_duplicate_is_rejected_before_the_check() {
        let (service, verifier) = service(|| Ok(Verdict::Deliverable));
        service.register(registration("cook@example.com")).await.unwrap();

        let err = service
            .register(registration("cook@example.com"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "User already exists");
        assert_eq!(verifier.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_undeliverable_blocks_registration() {
        let (service, _) = service(|| Ok(Verdict::Undeliverable));
        let err = service
            .register(registration("cook@example.com"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), UNDELIVERABLE_MESSAGE);
    }

    #[tokio::test]
    async fn test_checker_failure_does_not_block() {
        let (service, _) = service(|| Err(ExternalServiceError::Timeout));
        assert!(service.register(registration("cook@example.com")).await.is_ok());
    }

    #[tokio::test]
    async fn test_login_failures_share_a_message() {
        let (service, _) = service(|| Ok(Verdict::Deliverable));
        service.register(registration("cook@example.com")).await.unwrap();

        let wrong_password = service
            .login(Credentials {
                email: "cook@example.com".to_string(),
                password: "nope".to_string(),
            })
            .await
            .unwrap_err();
        let unknown = service
            .login(Credentials {
                email: "ghost@example.com".to_string(),
                password: "hunter22".to_string(),
            })
            .await
            .unwrap_err();

        assert!(matches!(wrong_password, CatalogError::Auth(_)));
        assert_eq!(wrong_password.to_string(), unknown.to_string());
    }
}
