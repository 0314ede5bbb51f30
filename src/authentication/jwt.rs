use chrono::Duration;
use chrono::Utc;
use hmac::{Hmac, Mac};
use jwt::SignWithKey;
use jwt::VerifyWithKey;
use serde::Deserialize;
use serde::Serialize;
use sha2::Sha256;

use crate::database::schema::{Id, User, UserRole};
use crate::error::StoreError;

use super::permissions::ActionType;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct JwtSessionData {
    pub user_id: Id,
    pub email: String,
    pub role: UserRole,
    iat: i64,
    exp: i64,
}

impl JwtSessionData {
    pub fn new(user: &User, lifetime: Duration) -> Self {
        let now = Utc::now();

        Self {
            user_id: user.id,
            email: user.email.to_owned(),
            role: user.role,
            iat: now.timestamp(),
            exp: (now + lifetime).timestamp(),
        }
    }
}

/// The acting user of an authenticated request.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct SessionData {
    pub user_id: Id,
    pub email: String,
    pub role: UserRole,
}

impl SessionData {
    pub fn authenticate(&self, action: ActionType) -> Result<(), StoreError> {
        if !action.authenticate(self) {
            return Err(StoreError::PermissionDenied(
                "You don't have permission to perform this action".to_string(),
            ));
        }
        Ok(())
    }
}

impl From<JwtSessionData> for SessionData {
    fn from(value: JwtSessionData) -> Self {
        SessionData {
            user_id: value.user_id,
            email: value.email,
            role: value.role,
        }
    }
}

/// Signing key and token lifetime, built once from `Config`.
#[derive(Clone)]
pub struct SessionKeys {
    key: Hmac<Sha256>,
    lifetime: Duration,
}

impl SessionKeys {
    pub fn new(secret: &[u8], lifetime: Duration) -> Result<Self, StoreError> {
        let key: Hmac<Sha256> = Hmac::new_from_slice(secret)
            .map_err(|e| StoreError::Internal(format!("Invalid session secret: {e}")))?;

        Ok(Self { key, lifetime })
    }

    pub fn generate_jwt_session(&self, user: &User) -> Result<String, StoreError> {
        self.sign(JwtSessionData::new(user, self.lifetime))
    }

    fn sign(&self, claims: JwtSessionData) -> Result<String, StoreError> {
        claims
            .sign_with_key(&self.key)
            .map_err(|e| StoreError::Internal(format!("Failed to sign session: {e}")))
    }

    pub fn verify_jwt_session(&self, token: &str) -> Result<SessionData, StoreError> {
        let session: JwtSessionData = token.verify_with_key(&self.key).map_err(|e| {
            log::debug!("Rejected session token: {e}");
            StoreError::Unauthenticated
        })?;

        if session.exp <= Utc::now().timestamp() {
            return Err(StoreError::Unauthenticated);
        }

        Ok(session.into())
    }

    /// Accepts `Token <jwt>` and `Bearer <jwt>` header values.
    pub fn verify_header(&self, header: &str) -> Result<SessionData, StoreError> {
        let token = header
            .strip_prefix("Token ")
            .or_else(|| header.strip_prefix("Bearer "))
            .map(str::trim)
            .ok_or(StoreError::Unauthenticated)?;

        self.verify_jwt_session(token)
    }
}
