// Request-scoped identity propagation.
//
// Identity is explicit request-local state carried in the request's
// extensions rather than ambient thread-local storage: each in-flight
// request owns its own binding, concurrent requests can never observe each
// other's, and teardown is structural because the value is dropped with the
// request on every exit path.
use axum::{async_trait, extract::FromRequestParts, http::request::Parts, http::Extensions};
use thiserror::Error;

use crate::auth::Claims;
use crate::error::ApiError;
use crate::models::Role;

/// Authenticated identity resolved by the authentication gate, valid for the
/// duration of one request.
#[derive(Clone, Debug)]
pub struct RequestIdentity {
    pub user_id: i64,
    pub tenant_id: i64,
    pub role: Role,
}

/// Raised when identity is read outside an authenticated request.
#[derive(Debug, Error)]
#[error("request identity not set: handler invoked outside an authenticated request")]
pub struct MissingIdentityContext;

impl RequestIdentity {
    pub fn from_claims(claims: Claims) -> Self {
        Self {
            user_id: claims.user_id,
            tenant_id: claims.tenant_id,
            role: claims.role,
        }
    }

    pub fn from_extensions(extensions: &Extensions) -> Result<&Self, MissingIdentityContext> {
        extensions.get::<Self>().ok_or(MissingIdentityContext)
    }

    pub fn require_role(&self, role: Role) -> Result<(), ApiError> {
        if self.role == role {
            Ok(())
        } else {
            Err(ApiError::forbidden(
                "Forbidden: You don't have permission to perform this action",
            ))
        }
    }
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for RequestIdentity {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match Self::from_extensions(&parts.extensions) {
            Ok(identity) => Ok(identity.clone()),
            // On a user-facing route the missing binding means the request
            // carried no valid credentials, so reject with the generic body
            Err(err) => {
                tracing::debug!("{}", err);
                Err(ApiError::unauthorized())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_outside_a_request_fails() {
        let extensions = Extensions::new();
        assert!(RequestIdentity::from_extensions(&extensions).is_err());
    }

    #[test]
    fn read_returns_the_bound_identity() {
        let mut extensions = Extensions::new();
        extensions.insert(RequestIdentity {
            user_id: 7,
            tenant_id: 2,
            role: Role::Member,
        });

        let identity = RequestIdentity::from_extensions(&extensions).unwrap();
        assert_eq!(identity.user_id, 7);
        assert_eq!(identity.tenant_id, 2);
    }

    #[test]
    fn role_check_rejects_members() {
        let identity = RequestIdentity {
            user_id: 1,
            tenant_id: 1,
            role: Role::Member,
        };
        assert!(identity.require_role(Role::Admin).is_err());
        assert!(identity.require_role(Role::Member).is_ok());
    }
}
