//! Authentication and authorization

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use core_kernel::{InstituteId, StudentId, UserId};

use crate::error::ApiError;

/// Role carried in the token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Admin,
    Teacher,
    Student,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Role::Admin => "ADMIN",
            Role::Teacher => "TEACHER",
            Role::Student => "STUDENT",
        };
        f.write_str(name)
    }
}

/// Roles allowed to manage fees and run reminders
pub const STAFF: &[Role] = &[Role::Admin, Role::Teacher];
/// Roles allowed to manage reminder rules
pub const ADMIN_ONLY: &[Role] = &[Role::Admin];

/// JWT claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    pub role: Role,
    /// Institute the user belongs to; every query is scoped to it
    pub institute_id: InstituteId,
    /// Student profile linked to a STUDENT user
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub student_id: Option<StudentId>,
    /// Expiration timestamp
    pub exp: i64,
    /// Issued at timestamp
    pub iat: i64,
}

impl Claims {
    /// Fails with 403 unless the caller holds one of `roles`
    pub fn require_role(&self, roles: &[Role]) -> Result<(), ApiError> {
        if roles.contains(&self.role) {
            Ok(())
        } else {
            Err(ApiError::Forbidden(format!("Role {} may not perform this action", self.role)))
        }
    }

    pub fn is_student(&self) -> bool {
        self.role == Role::Student
    }

    /// Student whose data the caller is limited to
    ///
    /// `None` for staff. A STUDENT token without a linked profile is rejected.
    pub fn student_scope(&self) -> Result<Option<StudentId>, ApiError> {
        if !self.is_student() {
            return Ok(None);
        }
        self.student_id
            .map(Some)
            .ok_or_else(|| ApiError::Forbidden("Student profile missing".to_string()))
    }

    /// Recording user, when `sub` is a UUID
    pub fn user_id(&self) -> Option<UserId> {
        self.sub.parse().ok()
    }
}

/// Auth errors
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid token")]
    InvalidToken,
    #[error("Token expired")]
    TokenExpired,
    #[error("Token could not be issued")]
    Encoding,
}

/// Issues a signed HS256 token
pub fn create_token(
    user_id: &str,
    role: Role,
    institute_id: InstituteId,
    student_id: Option<StudentId>,
    secret: &str,
    expiration_secs: u64,
) -> Result<String, AuthError> {
    let now = Utc::now();
    let exp = now + Duration::seconds(i64::try_from(expiration_secs).unwrap_or(i64::MAX / 1000));

    let claims = Claims {
        sub: user_id.to_string(),
        role,
        institute_id,
        student_id,
        exp: exp.timestamp(),
        iat: now.timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|_| AuthError::Encoding)
}

/// Validates a token and returns its claims
pub fn validate_token(token: &str, secret: &str) -> Result<Claims, AuthError> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => AuthError::TokenExpired,
        _ => AuthError::InvalidToken,
    })?;

    Ok(token_data.claims)
}
