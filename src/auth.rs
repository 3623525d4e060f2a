//! Credential kinds, grant types, and issued authorizations.

pub mod authorization;
pub mod credentials;
pub mod grant;
pub mod secret;

pub use authorization::*;
pub use credentials::*;
pub use grant::*;
pub use secret::*;
