//! # Admin Key Authentication
//!
//! Guards `POST /cache/invalidate` when an admin key is configured
//! (`admin_key` / `HISTOMAP_ADMIN_KEY`). Map and status routes stay public.
//!
//! ```text
//! Authorization: Bearer <admin-key>
//! ```

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode, header},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use subtle::ConstantTimeEq;

/// The configured admin key.
#[derive(Clone)]
pub struct AdminKey(pub Arc<str>);

impl AdminKey {
    #[must_use]
    pub fn new(key: &str) -> Self {
        Self(Arc::from(key))
    }

    /// Constant-time check of a presented key.
    ///
    /// Both sides are padded to the same length so the comparison always
    /// covers the same number of bytes.
    #[must_use]
    pub fn matches(&self, provided: &str) -> bool {
        let provided = provided.as_bytes();
        let expected = self.0.as_bytes();

        let len = provided.len().max(expected.len());
        let mut padded_provided = vec![0u8; len];
        let mut padded_expected = vec![0u8; len];
        padded_provided[..provided.len()].copy_from_slice(provided);
        padded_expected[..expected.len()].copy_from_slice(expected);

        let bytes_match: bool = padded_provided.ct_eq(&padded_expected).into();
        bytes_match && provided.len() == expected.len()
    }
}

/// Require `Authorization: Bearer <key>` matching the admin key.
pub async fn admin_key_middleware(
    State(key): State<AdminKey>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, (StatusCode, &'static str)> {
    let provided = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    match provided {
        Some(provided) if key.matches(provided) => Ok(next.run(request).await),
        Some(_) => {
            tracing::warn!(
                event = "auth_failure",
                reason = "invalid_admin_key",
                "Cache invalidation rejected: invalid admin key"
            );
            Err((StatusCode::UNAUTHORIZED, "Unauthorized"))
        }
        None => {
            tracing::warn!(
                event = "auth_failure",
                reason = "missing_bearer_token",
                "Cache invalidation rejected: missing bearer token"
            );
            Err((StatusCode::UNAUTHORIZED, "Unauthorized"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matching_key_is_accepted() {
        assert!(AdminKey::new("s3cret").matches("s3cret"));
    }

    #[test]
    fn prefix_and_longer_keys_are_rejected() {
        let key = AdminKey::new("s3cret");
        assert!(!key.matches("s3cre"));
        assert!(!key.matches("s3cret!"));
        assert!(!key.matches(""));
    }
}
