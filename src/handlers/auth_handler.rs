//! Auth Handler
//!
//! Admin password login and customer phone/OTP login. Both end in a signed
//! session token.

use chrono::Utc;
use sqlx::PgPool;

use crate::auth::{generate_code, hash_code, normalize_phone, verify_password, TokenService};
use crate::domain::{CallerContext, Role};
use crate::error::AppError;
use crate::models::{User, UserSummary};
use crate::state::OtpSettings;
use crate::store::{OtpRepository, UserRepository};

use super::{AdminLoginCommand, AuthResult, OtpIssued};

/// Handler for login flows
pub struct AuthHandler {
    users: UserRepository,
    otps: OtpRepository,
    tokens: TokenService,
    settings: OtpSettings,
}

impl AuthHandler {
    pub fn new(pool: PgPool, tokens: TokenService, settings: OtpSettings) -> Self {
        Self {
            users: UserRepository::new(pool.clone()),
            otps: OtpRepository::new(pool),
            tokens,
            settings,
        }
    }

    /// Every failure past input validation is the same `InvalidCredentials`.
    pub async fn admin_login(&self, command: AdminLoginCommand) -> Result<AuthResult, AppError> {
        if command.phone.trim().is_empty() || command.password.is_empty() {
            return Err(AppError::InvalidRequest(
                "phone and password are required".to_string(),
            ));
        }

        let phone = normalize_phone(&command.phone).ok_or(AppError::InvalidCredentials)?;
        let user = self
            .users
            .find_by_phone(&phone)
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        if user_role(&user)? != Role::Admin {
            tracing::warn!(user_id = %user.id, "Password login attempted by non-admin");
            return Err(AppError::InvalidCredentials);
        }
        let stored_hash = user
            .password_hash
            .clone()
            .ok_or(AppError::InvalidCredentials)?;

        // argon2 is CPU bound
        let password = command.password;
        let matches = tokio::task::spawn_blocking(move || verify_password(&password, &stored_hash))
            .await
            .map_err(|e| AppError::Internal(format!("password check panicked: {}", e)))??;

        if !matches {
            tracing::warn!(user_id = %user.id, "Admin login failed");
            return Err(AppError::InvalidCredentials);
        }

        tracing::info!(user_id = %user.id, "Admin logged in");
        self.session_for(&user)
    }

    /// Issue a fresh code for `phone`, replacing any pending one.
    pub async fn request_otp(&self, phone: &str) -> Result<OtpIssued, AppError> {
        let phone = normalize_phone(phone).ok_or_else(|| {
            AppError::InvalidRequest("a valid phone number is required".to_string())
        })?;

        let code = generate_code();
        let expires_at = Utc::now() + self.settings.ttl;
        self.otps
            .upsert(&phone, &hash_code(&phone, &code), expires_at)
            .await?;

        tracing::info!(phone = %phone, expires_at = %expires_at, "OTP issued");
        tracing::debug!(phone = %phone, otp = %code, "OTP code");

        Ok(OtpIssued {
            phone,
            expires_at,
            otp: self.settings.expose_in_response.then_some(code),
        })
    }

    /// Check a code and log the phone's owner in, registering a customer on
    /// first login.
    pub async fn verify_otp(&self, phone: &str, otp: &str) -> Result<AuthResult, AppError> {
        if phone.trim().is_empty() || otp.trim().is_empty() {
            return Err(AppError::InvalidRequest(
                "phone and otp are required".to_string(),
            ));
        }
        let phone = normalize_phone(phone).ok_or(AppError::InvalidOtp)?;

        let record = self
            .otps
            .find(&phone)
            .await?
            .ok_or(AppError::InvalidOtp)?;

        if record.is_expired(Utc::now()) {
            self.otps.delete(&phone).await?;
            tracing::info!(phone = %phone, "Expired OTP discarded");
            return Err(AppError::InvalidOtp);
        }

        let code_hash = hash_code(&phone, otp);
        if code_hash != record.code_hash {
            tracing::warn!(phone = %phone, "Wrong OTP");
            return Err(AppError::InvalidOtp);
        }

        // A concurrent verify may have consumed it first
        if !self.otps.consume(&phone, &code_hash).await? {
            return Err(AppError::InvalidOtp);
        }

        let user = match self.users.find_by_phone(&phone).await? {
            Some(user) => user,
            None => {
                let user = self.users.create_customer(&phone).await?;
                tracing::info!(user_id = %user.id, "Customer registered");
                user
            }
        };

        tracing::info!(user_id = %user.id, "OTP login succeeded");
        self.session_for(&user)
    }

    /// The caller's own user record
    pub async fn me(&self, context: &CallerContext) -> Result<UserSummary, AppError> {
        let user = self
            .users
            .find_by_id(context.user_id)
            .await?
            .ok_or_else(|| AppError::UserNotFound(context.user_id.to_string()))?;

        summary(&user)
    }

    fn session_for(&self, user: &User) -> Result<AuthResult, AppError> {
        let profile = summary(user)?;
        let token = self.tokens.issue(user.id, profile.role)?;

        Ok(AuthResult {
            token,
            expires_in: self.tokens.expires_in(),
            user: profile,
        })
    }
}

/// A stored role we cannot parse is our fault, not the caller's.
fn user_role(user: &User) -> Result<Role, AppError> {
    user.role().map_err(|e| AppError::Internal(e.to_string()))
}

fn summary(user: &User) -> Result<UserSummary, AppError> {
    UserSummary::from_user(user).map_err(|e| AppError::Internal(e.to_string()))
}
