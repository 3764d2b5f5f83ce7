//! Bearer-token authentication: token issuance/verification, the request
//! gate, and password hashing.

mod claims;
pub(crate) mod extractors;
pub mod jwt;
pub mod password;

pub use claims::Claims;
pub use extractors::AuthUser;
pub use jwt::JwtKeys;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// No credential on the request.
    #[error("Forbidden: no credential provided")]
    Missing,
    /// Bad signature, malformed, wrong issuer/audience or expired.
    #[error("Unauthorized: invalid or expired token")]
    Invalid,
}
