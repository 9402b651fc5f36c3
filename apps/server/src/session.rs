//! Turns the `x-user-id` request header into a [`Session`].
//!
//! Authentication happens in front of this service; by the time a request
//! arrives the header names the signed-in user.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use stockly_core::Session;

use crate::error::ApiError;

/// Header carrying the caller's user id.
pub const USER_ID_HEADER: &str = "x-user-id";

const MAX_USER_ID_LEN: usize = 128;

/// Extractor for the caller's session. Rejects with 401 when the header is
/// missing or blank.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Session);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .unwrap_or_default();

        if raw.is_empty() {
            return Err(ApiError::unauthorized(format!(
                "Missing {} header",
                USER_ID_HEADER
            )));
        }

        // The id prefixes uploaded image file names
        let usable = raw.len() <= MAX_USER_ID_LEN
            && raw
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
        if !usable {
            return Err(ApiError::unauthorized(format!(
                "Malformed {} header",
                USER_ID_HEADER
            )));
        }

        Ok(CurrentUser(Session::new(raw)))
    }
}
