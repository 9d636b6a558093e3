//! Authentication Module
//!
//! The security layer in front of this service authenticates the caller and
//! forwards the result in the `x-user-info` header as
//! `name|backend_roles|roles|tenant`. A request without the header is treated
//! as an internal call.

use async_trait::async_trait;
use axum::{extract::FromRequestParts, http::request::Parts};
use reports_core::Principal;

use crate::error::ApiError;

/// Header carrying the authenticated user.
pub const USER_INFO_HEADER: &str = "x-user-info";

/// Principal extracted from request headers, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerPrincipal(pub Option<Principal>);

impl CallerPrincipal {
    pub fn principal(&self) -> Option<&Principal> {
        self.0.as_ref()
    }
}

/// Parse the user-info header value.
///
/// A present but malformed header is rejected rather than downgraded to an
/// internal call.
pub fn principal_from_header(value: Option<&str>) -> Result<Option<Principal>, ApiError> {
    match value {
        None => Ok(None),
        Some(raw) => Principal::from_user_info(raw)
            .map(Some)
            .ok_or_else(|| ApiError::bad_request(format!("Malformed {} header", USER_INFO_HEADER))),
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for CallerPrincipal
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = match parts.headers.get(USER_INFO_HEADER) {
            None => None,
            Some(value) => Some(value.to_str().map_err(|_| {
                ApiError::bad_request(format!("{} header is not valid text", USER_INFO_HEADER))
            })?),
        };
        let principal = principal_from_header(header)?;
        if let Some(principal) = &principal {
            tracing::debug!(user = %principal.name, "Resolved caller principal");
        }
        Ok(Self(principal))
    }
}

// ============================================================================
// TESTS
// ============================================================================
