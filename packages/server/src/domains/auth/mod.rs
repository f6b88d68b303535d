//! Auth domain - verifies the bearer JWT that identifies the member.
//!
//! Token issuance belongs to the identity provider; this server only needs
//! the member id carried in the claims.

pub mod jwt;

pub use jwt::{Claims, JwtService};
