//! Credential Store operations: signup, login, logout and user administration.

use std::str::FromStr;
use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;

use crate::error::BurnoutError;
use crate::gate::AccessGate;
use crate::password::{ensure_strong_password, CredentialHasher};
use crate::ports::{IssuedToken, Result, RevocationLedger, TokenIssuer, UserStore};
use crate::principal::Principal;
use crate::types::{NewUser, Role, User, UserChanges, UserId};

const MIN_USERNAME_LEN: usize = 3;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SignupRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginRequest {
    pub username_or_email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateUserRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateStatusRequest {
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub token: IssuedToken,
    pub user: User,
}

fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

fn validate_username(username: &str) -> Result<()> {
    if username.trim().chars().count() < MIN_USERNAME_LEN {
        return Err(BurnoutError::InvalidInput(
            "Username must be at least 3 characters long.".into(),
        ));
    }
    Ok(())
}

fn validate_email(email: &str) -> Result<()> {
    let email = email.trim();
    if !email.contains('@') || !email.contains('.') {
        return Err(BurnoutError::InvalidInput("Invalid email format.".into()));
    }
    Ok(())
}

fn user_not_found() -> BurnoutError {
    BurnoutError::NotFound("User not found.".into())
}

pub struct CredentialService {
    users: Arc<dyn UserStore>,
    ledger: Arc<dyn RevocationLedger>,
    tokens: Arc<dyn TokenIssuer>,
    gate: AccessGate,
    hasher: CredentialHasher,
}

impl CredentialService {
    pub fn new(
        users: Arc<dyn UserStore>,
        ledger: Arc<dyn RevocationLedger>,
        tokens: Arc<dyn TokenIssuer>,
    ) -> Self {
        let gate = AccessGate::new(Arc::clone(&users), Arc::clone(&ledger));
        Self {
            users,
            ledger,
            tokens,
            gate,
            hasher: CredentialHasher::default(),
        }
    }

    /// Replace the password hasher (builder pattern).
    pub fn with_hasher(mut self, hasher: CredentialHasher) -> Self {
        self.hasher = hasher;
        self
    }

    pub async fn signup(&self, req: SignupRequest) -> Result<User> {
        let (Some(username), Some(email), Some(password)) = (
            present(req.username),
            present(req.email),
            present(req.password),
        ) else {
            return Err(BurnoutError::InvalidInput(
                "Username, email, and password are required.".into(),
            ));
        };

        ensure_strong_password(&password)?;
        validate_username(&username)?;
        validate_email(&email)?;

        let role = match req.role.as_deref() {
            None | Some("") => Role::Staff,
            Some(raw) => Role::from_str(raw)
                .map_err(|_| BurnoutError::InvalidInput(format!("Unknown role '{raw}'.")))?,
        };

        if self
            .users
            .find_by_username_or_email(&username, &email)
            .await?
            .is_some()
        {
            return Err(BurnoutError::Conflict(
                "User with that username or email already exists.".into(),
            ));
        }

        let password_hash = self.hasher.hash(&password)?;
        let user = self
            .users
            .insert(NewUser {
                username,
                email,
                password_hash,
                role,
            })
            .await?;
        tracing::info!(user_id = user.id, role = %user.role, "user registered");
        Ok(user)
    }

    /// Unknown identifier and wrong password fail identically.
    pub async fn login(&self, req: LoginRequest) -> Result<LoginOutcome> {
        let (Some(identifier), Some(password)) =
            (present(req.username_or_email), present(req.password))
        else {
            return Err(BurnoutError::InvalidInput(
                "Username/email and password are required.".into(),
            ));
        };

        let user = match self
            .users
            .find_by_username_or_email(&identifier, &identifier)
            .await?
        {
            Some(user) if self.hasher.verify(&password, &user.password_hash) => user,
            Some(_) => {
                tracing::warn!("failed login attempt");
                return Err(BurnoutError::InvalidCredentials);
            }
            None => {
                self.hasher.verify_missing(&password);
                tracing::warn!("failed login attempt");
                return Err(BurnoutError::InvalidCredentials);
            }
        };

        if !user.is_active {
            return Err(BurnoutError::account_suspended());
        }

        let token = self.tokens.issue(&user)?;
        tracing::info!(user_id = user.id, jti = %token.token_id, "login succeeded");
        Ok(LoginOutcome { token, user })
    }

    pub async fn logout(&self, principal: &Principal) -> Result<()> {
        let token_id = principal.token_id.as_deref().ok_or(BurnoutError::BadToken)?;
        self.ledger.revoke(token_id, Utc::now()).await?;
        tracing::info!(user_id = principal.user_id, jti = token_id, "token revoked");
        Ok(())
    }

    /// Self-service or admin partial update. Absent or empty fields are untouched.
    pub async fn update_user(
        &self,
        principal: &Principal,
        target: UserId,
        req: UpdateUserRequest,
    ) -> Result<User> {
        let caller = self.gate.current_user(principal).await?;
        if caller.id != target && caller.role != Role::Admin {
            return Err(BurnoutError::Forbidden("Unauthorized".into()));
        }
        if self.users.get(target).await?.is_none() {
            return Err(user_not_found());
        }

        let mut changes = UserChanges::default();
        if let Some(username) = present(req.username) {
            validate_username(&username)?;
            changes.username = Some(username);
        }
        if let Some(email) = present(req.email) {
            validate_email(&email)?;
            changes.email = Some(email);
        }
        if let Some(password) = present(req.password) {
            ensure_strong_password(&password)?;
            changes.password_hash = Some(self.hasher.hash(&password)?);
        }

        let user = self
            .users
            .update(target, changes)
            .await?
            .ok_or_else(user_not_found)?;
        tracing::info!(user_id = user.id, by = caller.id, "user updated");
        Ok(user)
    }

    pub async fn update_status(
        &self,
        principal: &Principal,
        target: UserId,
        req: UpdateStatusRequest,
    ) -> Result<User> {
        self.gate.require_admin(principal).await?;
        if self.users.get(target).await?.is_none() {
            return Err(user_not_found());
        }
        let is_active = req.is_active.ok_or_else(|| {
            BurnoutError::InvalidInput("'is_active' field is required.".into())
        })?;
        let user = self
            .users
            .set_active(target, is_active)
            .await?
            .ok_or_else(user_not_found)?;
        tracing::info!(user_id = user.id, is_active, "user status changed");
        Ok(user)
    }

    pub async fn delete_user(&self, principal: &Principal, target: UserId) -> Result<()> {
        let admin = self.gate.require_admin(principal).await?;
        if !self.users.delete(target).await? {
            return Err(user_not_found());
        }
        tracing::info!(user_id = target, by = admin.id, "user deleted");
        Ok(())
    }

    pub async fn list_users(&self, principal: &Principal) -> Result<Vec<User>> {
        self.gate.require_admin(principal).await?;
        self.users.list(None).await
    }

    /// Unknown role names match nobody.
    pub async fn list_users_by_role(&self, principal: &Principal, role: &str) -> Result<Vec<User>> {
        self.gate.require_admin(principal).await?;
        match Role::from_str(role) {
            Ok(role) => self.users.list(Some(role)).await,
            Err(_) => Ok(Vec::new()),
        }
    }

    pub async fn get_user(&self, principal: &Principal, id: UserId) -> Result<User> {
        self.gate.require_admin(principal).await?;
        self.users.get(id).await?.ok_or_else(user_not_found)
    }

    /// Open to any active authenticated caller.
    pub async fn get_user_by_username(&self, principal: &Principal, username: &str) -> Result<User> {
        self.gate.current_user(principal).await?;
        self.users
            .get_by_username(username)
            .await?
            .ok_or_else(user_not_found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;

    /// Deterministic issuer: token id is derived from a counter.
    struct CountingIssuer(std::sync::atomic::AtomicU64);

    impl TokenIssuer for CountingIssuer {
        fn issue(&self, user: &User) -> Result<IssuedToken> {
            let n = self.0.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            Ok(IssuedToken {
                token: format!("token-{}-{n}", user.id),
                token_id: format!("jti-{n}"),
            })
        }
    }

    fn service() -> (Arc<MemoryStore>, CredentialService) {
        let store = Arc::new(MemoryStore::new());
        let svc = CredentialService::new(
            store.clone(),
            store.clone(),
            Arc::new(CountingIssuer(Default::default())),
        )
        .with_hasher(CredentialHasher::with_params(8, 1, 1).unwrap());
        (store, svc)
    }

    fn signup_req(username: &str, password: &str, role: Option<&str>) -> SignupRequest {
        SignupRequest {
            username: Some(username.into()),
            email: Some(format!("{username}@example.com")),
            password: Some(password.into()),
            role: role.map(str::to_string),
        }
    }

    fn as_principal(user: &User) -> Principal {
        Principal::in_process(user.id, user.username.clone(), user.role)
    }

    #[tokio::test]
    async fn signup_rejects_weak_and_accepts_strong() {
        let (_, svc) = service();
        let err = svc
            .signup(signup_req("sam", "abc12345", None))
            .await
            .unwrap_err();
        assert!(matches!(err, BurnoutError::WeakPassword));

        let user = svc
            .signup(signup_req("sam", "Abc12345!", None))
            .await
            .unwrap();
        assert_eq!(user.role, Role::Staff);
        assert!(user.is_active);
        assert_ne!(user.password_hash, "Abc12345!");
    }

    #[tokio::test]
    async fn signup_requires_fields_and_known_role() {
        let (_, svc) = service();
        let err = svc.signup(SignupRequest::default()).await.unwrap_err();
        assert!(matches!(err, BurnoutError::InvalidInput(_)));

        let err = svc
            .signup(signup_req("sam", "Abc12345!", Some("wizard")))
            .await
            .unwrap_err();
        assert!(matches!(err, BurnoutError::InvalidInput(_)));

        let user = svc
            .signup(signup_req("sam", "Abc12345!", Some("Student")))
            .await
            .unwrap();
        assert_eq!(user.role, Role::Student);
    }

    #[tokio::test]
    async fn signup_conflicts_on_username_or_email() {
        let (_, svc) = service();
        svc.signup(signup_req("sam", "Abc12345!", None)).await.unwrap();

        let err = svc
            .signup(signup_req("sam", "Abc12345!", None))
            .await
            .unwrap_err();
        assert!(matches!(err, BurnoutError::Conflict(_)));

        let mut req = signup_req("samuel", "Abc12345!", None);
        req.email = Some("sam@example.com".into());
        let err = svc.signup(req).await.unwrap_err();
        assert!(matches!(err, BurnoutError::Conflict(_)));
    }

    #[tokio::test]
    async fn login_by_username_or_email() {
        let (_, svc) = service();
        svc.signup(signup_req("sam", "Abc12345!", None)).await.unwrap();

        let by_name = svc
            .login(LoginRequest {
                username_or_email: Some("sam".into()),
                password: Some("Abc12345!".into()),
            })
            .await
            .unwrap();
        let by_email = svc
            .login(LoginRequest {
                username_or_email: Some("sam@example.com".into()),
                password: Some("Abc12345!".into()),
            })
            .await
            .unwrap();
        assert_eq!(by_name.user.id, by_email.user.id);
        assert_ne!(by_name.token.token_id, by_email.token.token_id);
    }

    #[tokio::test]
    async fn login_failures_are_indistinguishable() {
        let (_, svc) = service();
        svc.signup(signup_req("sam", "Abc12345!", None)).await.unwrap();

        let wrong_password = svc
            .login(LoginRequest {
                username_or_email: Some("sam".into()),
                password: Some("Wrong123!".into()),
            })
            .await
            .unwrap_err();
        let unknown_user = svc
            .login(LoginRequest {
                username_or_email: Some("nobody".into()),
                password: Some("Abc12345!".into()),
            })
            .await
            .unwrap_err();
        assert_eq!(wrong_password.to_string(), unknown_user.to_string());
        assert_eq!(wrong_password.http_status(), unknown_user.http_status());
        assert!(matches!(wrong_password, BurnoutError::InvalidCredentials));
    }

    #[tokio::test]
    async fn suspended_user_cannot_login() {
        let (_, svc) = service();
        let admin = svc
            .signup(signup_req("root", "Abc12345!", Some("admin")))
            .await
            .unwrap();
        let sam = svc.signup(signup_req("sam", "Abc12345!", None)).await.unwrap();
        svc.update_status(
            &as_principal(&admin),
            sam.id,
            UpdateStatusRequest {
                is_active: Some(false),
            },
        )
        .await
        .unwrap();

        let err = svc
            .login(LoginRequest {
                username_or_email: Some("sam".into()),
                password: Some("Abc12345!".into()),
            })
            .await
            .unwrap_err();
        assert_eq!(err.http_status(), 403);
    }

    #[tokio::test]
    async fn logout_revokes_token_id() {
        let (store, svc) = service();
        svc.signup(signup_req("sam", "Abc12345!", None)).await.unwrap();
        let outcome = svc
            .login(LoginRequest {
                username_or_email: Some("sam".into()),
                password: Some("Abc12345!".into()),
            })
            .await
            .unwrap();
        let principal = as_principal(&outcome.user).with_token_id(&outcome.token.token_id);
        svc.logout(&principal).await.unwrap();
        assert!(store.is_revoked(&outcome.token.token_id).await.unwrap());
    }

    #[tokio::test]
    async fn logout_without_token_id_is_bad_token() {
        let (_, svc) = service();
        let user = svc.signup(signup_req("sam", "Abc12345!", None)).await.unwrap();
        let err = svc.logout(&as_principal(&user)).await.unwrap_err();
        assert!(matches!(err, BurnoutError::BadToken));
    }

    #[tokio::test]
    async fn update_user_self_or_admin_only() {
        let (_, svc) = service();
        let sam = svc.signup(signup_req("sam", "Abc12345!", None)).await.unwrap();
        let kim = svc.signup(signup_req("kim", "Abc12345!", None)).await.unwrap();
        let admin = svc
            .signup(signup_req("root", "Abc12345!", Some("admin")))
            .await
            .unwrap();

        let err = svc
            .update_user(
                &as_principal(&kim),
                sam.id,
                UpdateUserRequest {
                    username: Some("hijack".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, BurnoutError::Forbidden(_)));

        let updated = svc
            .update_user(
                &as_principal(&sam),
                sam.id,
                UpdateUserRequest {
                    email: Some("sam@new.example.com".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.email, "sam@new.example.com");
        assert_eq!(updated.username, "sam");

        let renamed = svc
            .update_user(
                &as_principal(&admin),
                sam.id,
                UpdateUserRequest {
                    username: Some("samwise".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(renamed.username, "samwise");
    }

    #[tokio::test]
    async fn update_user_password_is_revalidated_and_rehashed() {
        let (_, svc) = service();
        let sam = svc.signup(signup_req("sam", "Abc12345!", None)).await.unwrap();
        let err = svc
            .update_user(
                &as_principal(&sam),
                sam.id,
                UpdateUserRequest {
                    password: Some("weak".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, BurnoutError::WeakPassword));

        svc.update_user(
            &as_principal(&sam),
            sam.id,
            UpdateUserRequest {
                password: Some("Newpass99?".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        let outcome = svc
            .login(LoginRequest {
                username_or_email: Some("sam".into()),
                password: Some("Newpass99?".into()),
            })
            .await
            .unwrap();
        assert_eq!(outcome.user.id, sam.id);
    }

    #[tokio::test]
    async fn update_status_requires_flag() {
        let (_, svc) = service();
        let admin = svc
            .signup(signup_req("root", "Abc12345!", Some("admin")))
            .await
            .unwrap();
        let sam = svc.signup(signup_req("sam", "Abc12345!", None)).await.unwrap();
        let err = svc
            .update_status(&as_principal(&admin), sam.id, UpdateStatusRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(err, BurnoutError::InvalidInput(_)));

        let err = svc
            .update_status(
                &as_principal(&sam),
                sam.id,
                UpdateStatusRequest {
                    is_active: Some(false),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, BurnoutError::Forbidden(_)));
    }

    #[tokio::test]
    async fn admin_listing_and_lookup() {
        let (_, svc) = service();
        let admin = svc
            .signup(signup_req("root", "Abc12345!", Some("admin")))
            .await
            .unwrap();
        let sam = svc
            .signup(signup_req("sam", "Abc12345!", Some("student")))
            .await
            .unwrap();
        let ap = as_principal(&admin);

        assert_eq!(svc.list_users(&ap).await.unwrap().len(), 2);
        let students = svc.list_users_by_role(&ap, "STUDENT").await.unwrap();
        assert_eq!(students.len(), 1);
        assert!(svc.list_users_by_role(&ap, "wizard").await.unwrap().is_empty());
        assert_eq!(svc.get_user(&ap, sam.id).await.unwrap().username, "sam");
        assert!(matches!(
            svc.get_user(&ap, 999).await.unwrap_err(),
            BurnoutError::NotFound(_)
        ));

        let sp = as_principal(&sam);
        assert!(svc.list_users(&sp).await.is_err());
        assert_eq!(
            svc.get_user_by_username(&sp, "root").await.unwrap().id,
            admin.id
        );
    }

    #[tokio::test]
    async fn delete_user_is_admin_only() {
        let (_, svc) = service();
        let admin = svc
            .signup(signup_req("root", "Abc12345!", Some("admin")))
            .await
            .unwrap();
        let sam = svc.signup(signup_req("sam", "Abc12345!", None)).await.unwrap();
        assert!(svc.delete_user(&as_principal(&sam), admin.id).await.is_err());
        svc.delete_user(&as_principal(&admin), sam.id).await.unwrap();
        let err = svc
            .delete_user(&as_principal(&admin), sam.id)
            .await
            .unwrap_err();
        assert!(matches!(err, BurnoutError::NotFound(_)));
    }
}
