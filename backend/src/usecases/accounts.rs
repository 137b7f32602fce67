use std::sync::Arc;

use crates::domain::{
    repositories::users::UserRepository,
    value_objects::iam::{AuthResponseDto, LoginModel, RegisterUserModel, UserDto, normalize_email},
};
use thiserror::Error;
use tracing::{error, info, warn};

use crate::{
    auth::{AccessControl, AuthError, AuthUser, credentials},
    axum_http::error_responses::AppError,
};

#[derive(Debug, Error)]
pub enum AccountError {
    #[error("{0}")]
    Validation(String),
    #[error("Email already registered")]
    EmailTaken,
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AccountError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            AccountError::Validation(_) => StatusCode::BAD_REQUEST,
            AccountError::EmailTaken => StatusCode::CONFLICT,
            AccountError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AccountError::Auth(AuthError::Forbidden) => StatusCode::FORBIDDEN,
            AccountError::Auth(AuthError::Internal(_)) | AccountError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AccountError::Auth(_) => StatusCode::UNAUTHORIZED,
        }
    }
}

impl From<AccountError> for AppError {
    fn from(err: AccountError) -> Self {
        match err {
            AccountError::Validation(msg) => AppError::Validation(msg),
            AccountError::EmailTaken => AppError::Conflict(err.to_string()),
            AccountError::InvalidCredentials => AppError::Unauthorized(err.to_string()),
            AccountError::Auth(inner) => inner.into(),
            AccountError::Internal(inner) => AppError::Internal(inner),
        }
    }
}

pub type UseCaseResult<T> = std::result::Result<T, AccountError>;

pub struct AccountUseCase<U>
where
    U: UserRepository + Send + Sync + 'static,
{
    user_repo: Arc<U>,
    access_control: Arc<AccessControl>,
}

impl<U> AccountUseCase<U>
where
    U: UserRepository + Send + Sync + 'static,
{
    pub fn new(user_repo: Arc<U>, access_control: Arc<AccessControl>) -> Self {
        Self {
            user_repo,
            access_control,
        }
    }

    pub async fn register(&self, model: RegisterUserModel) -> UseCaseResult<AuthResponseDto> {
        let email = normalize_email(&model.email);
        if email.is_empty() || model.password.is_empty() {
            return Err(AccountError::Validation(
                "email and password are required".to_string(),
            ));
        }
        if !credentials::is_valid_email(&email) {
            return Err(AccountError::Validation("Invalid email format".to_string()));
        }
        let violations = credentials::password_violations(&model.password);
        if !violations.is_empty() {
            return Err(AccountError::Validation(violations.join(", ")));
        }

        let existing = self.user_repo.find_by_email(&email).await.map_err(|err| {
            error!(db_error = ?err, "accounts: failed to look up email");
            AccountError::Internal(err)
        })?;
        if existing.is_some() {
            info!("accounts: registration rejected, email taken");
            return Err(AccountError::EmailTaken);
        }

        let password_hash = hash_off_thread(model.password.clone()).await?;

        // The unique index still decides a race between two registrations.
        let user = self
            .user_repo
            .create_user(model.to_entity(password_hash))
            .await
            .map_err(|err| {
                error!(db_error = ?err, "accounts: failed to insert user");
                AccountError::Internal(err)
            })?
            .ok_or(AccountError::EmailTaken)?;

        let token = self.access_control.issue_token(user.id)?;
        info!(user_id = %user.id, "accounts: user registered");

        Ok(AuthResponseDto {
            token,
            user: UserDto::from(user),
        })
    }

    pub async fn login(&self, model: LoginModel) -> UseCaseResult<AuthResponseDto> {
        let email = normalize_email(&model.email);
        if email.is_empty() || model.password.is_empty() {
            return Err(AccountError::Validation(
                "email and password are required".to_string(),
            ));
        }

        let user = self
            .user_repo
            .find_by_email(&email)
            .await
            .map_err(|err| {
                error!(db_error = ?err, "accounts: failed to load user for login");
                AccountError::Internal(err)
            })?
            .ok_or_else(|| {
                info!("accounts: login for unknown email");
                AccountError::InvalidCredentials
            })?;

        let matches = verify_off_thread(model.password, user.password_hash.clone()).await?;
        if !matches {
            warn!(user_id = %user.id, "accounts: login with wrong password");
            return Err(AccountError::InvalidCredentials);
        }

        let token = self.access_control.issue_token(user.id)?;
        info!(user_id = %user.id, "accounts: user logged in");

        Ok(AuthResponseDto {
            token,
            user: UserDto::from(user),
        })
    }

    pub async fn logout(&self, user: &AuthUser) -> UseCaseResult<()> {
        self.access_control.revoke(user).await?;
        Ok(())
    }
}

async fn hash_off_thread(password: String) -> UseCaseResult<String> {
    let hash = tokio::task::spawn_blocking(move || credentials::hash_password(&password))
        .await
        .map_err(|err| anyhow::anyhow!("password hashing task failed: {err}"))??;
    Ok(hash)
}

async fn verify_off_thread(password: String, password_hash: String) -> UseCaseResult<bool> {
    let matches =
        tokio::task::spawn_blocking(move || credentials::verify_password(&password, &password_hash))
            .await
            .map_err(|err| anyhow::anyhow!("password verification task failed: {err}"))??;
    Ok(matches)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use crates::domain::{
        entities::users::UserEntity,
        repositories::{revocations::MockRevocationRepository, users::MockUserRepository},
        value_objects::enums::membership_statuses::MembershipStatus,
    };
    use uuid::Uuid;

    fn access_control() -> Arc<AccessControl> {
        let mut revocations = MockRevocationRepository::new();
        revocations.expect_is_revoked().returning(|_| Ok(false));
        Arc::new(AccessControl::new(
            "supersecretjwtsecretforunittesting123",
            168,
            Arc::new(revocations),
            Arc::new(MockUserRepository::new()),
        ))
    }

    fn stored_user(email: &str, password_hash: String) -> UserEntity {
        let now = Utc::now();
        UserEntity {
            id: Uuid::new_v4(),
            email: email.to_string(),
            password_hash,
            full_name: Some("Jane Doe".to_string()),
            gender: None,
            date_of_birth: None,
            height_cm: None,
            weight_kg: None,
            goal: None,
            membership_status: "inactive".to_string(),
            is_admin: false,
            plan_id: None,
            stripe_customer_id: None,
            stripe_subscription_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn register_model(email: &str, password: &str) -> RegisterUserModel {
        RegisterUserModel {
            email: email.to_string(),
            password: password.to_string(),
            full_name: Some("Jane Doe".to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn register_creates_inactive_user_and_token() {
        let mut users = MockUserRepository::new();
        users.expect_find_by_email().returning(|_| Ok(None));
        users
            .expect_create_user()
            .withf(|new_user| {
                new_user.email == "jane@example.com"
                    && new_user.membership_status == "inactive"
                    && new_user.password_hash.starts_with("$argon2")
            })
            .returning(|new_user| Ok(Some(stored_user(&new_user.email, new_user.password_hash))));
        let access = access_control();
        let usecase = AccountUseCase::new(Arc::new(users), Arc::clone(&access));

        let response = usecase
            .register(register_model(" Jane@Example.com ", "Secret#123"))
            .await
            .unwrap();

        assert_eq!(response.user.email, "jane@example.com");
        assert_eq!(response.user.membership_status, MembershipStatus::Inactive);
        let verified = access.verify(&response.token).await.unwrap();
        assert_eq!(verified.user_id, response.user.id);
    }

    #[tokio::test]
    async fn register_rejects_duplicate_email() {
        let mut users = MockUserRepository::new();
        users
            .expect_find_by_email()
            .returning(|email| Ok(Some(stored_user(email, "hash".to_string()))));
        users.expect_create_user().never();
        let usecase = AccountUseCase::new(Arc::new(users), access_control());

        let err = usecase
            .register(register_model("jane@example.com", "Secret#123"))
            .await
            .unwrap_err();

        assert!(matches!(err, AccountError::EmailTaken));
        assert_eq!(err.status_code().as_u16(), 409);
    }

    #[tokio::test]
    async fn register_reports_insert_race_as_conflict() {
        let mut users = MockUserRepository::new();
        users.expect_find_by_email().returning(|_| Ok(None));
        users.expect_create_user().returning(|_| Ok(None));
        let usecase = AccountUseCase::new(Arc::new(users), access_control());

        let err = usecase
            .register(register_model("jane@example.com", "Secret#123"))
            .await
            .unwrap_err();

        assert!(matches!(err, AccountError::EmailTaken));
    }

    #[tokio::test]
    async fn register_validates_input_before_touching_storage() {
        let usecase = AccountUseCase::new(Arc::new(MockUserRepository::new()), access_control());

        let missing = usecase.register(register_model("", "")).await.unwrap_err();
        assert_eq!(missing.to_string(), "email and password are required");

        let bad_email = usecase
            .register(register_model("jane@example", "Secret#123"))
            .await
            .unwrap_err();
        assert_eq!(bad_email.to_string(), "Invalid email format");

        let weak = usecase
            .register(register_model("jane@example.com", "secret123"))
            .await
            .unwrap_err();
        assert_eq!(
            weak.to_string(),
            "Password must include an uppercase letter, Password must include a special character"
        );
        assert_eq!(weak.status_code().as_u16(), 400);
    }

    #[tokio::test]
    async fn login_checks_password() {
        let hash = credentials::hash_password("Secret#123").unwrap();
        let mut users = MockUserRepository::new();
        users
            .expect_find_by_email()
            .returning(move |email| Ok(Some(stored_user(email, hash.clone()))));
        let usecase = AccountUseCase::new(Arc::new(users), access_control());

        let ok = usecase
            .login(LoginModel {
                email: "JANE@example.com".to_string(),
                password: "Secret#123".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(ok.user.email, "jane@example.com");

        let err = usecase
            .login(LoginModel {
                email: "jane@example.com".to_string(),
                password: "Secret#999".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AccountError::InvalidCredentials));
        assert_eq!(err.status_code().as_u16(), 401);
    }

    #[tokio::test]
    async fn login_with_unknown_email_is_invalid_credentials() {
        let mut users = MockUserRepository::new();
        users.expect_find_by_email().returning(|_| Ok(None));
        let usecase = AccountUseCase::new(Arc::new(users), access_control());

        let err = usecase
            .login(LoginModel {
                email: "ghost@example.com".to_string(),
                password: "Secret#123".to_string(),
            })
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Invalid credentials");
    }
}
