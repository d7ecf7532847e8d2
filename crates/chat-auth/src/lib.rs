//! # chat-auth
//!
//! Credential verification for the chat relay.
//!
//! ## Modules
//!
//! - `jwt`: token claims, signing, and validation
//! - `credential`: locating the token in cookies, headers, and query strings
//! - `verifier`: the [`IdentityVerifier`] shared by HTTP and WebSocket entry points
//! - `error`: the [`AuthFailure`] taxonomy

pub mod credential;
pub mod error;
pub mod jwt;
pub mod verifier;

pub use credential::CredentialSources;
pub use error::AuthFailure;
pub use jwt::{Claims, JwtDecoder, JwtEncoder};
pub use verifier::{IdentityVerifier, VerifiedIdentity};
