//! burnout_core: domain logic for the student burnout tracker.
//!
//! Storage and token signing are reached only through the port traits in
//! [`ports`], so the same services run against Postgres (`burnout_postgres`)
//! or the in-memory [`memory::MemoryStore`].

pub mod credentials;
pub mod error;
pub mod evaluations;
pub mod gate;
pub mod memory;
pub mod password;
pub mod ports;
pub mod principal;
pub mod scoring;
pub mod types;

pub use credentials::CredentialService;
pub use error::BurnoutError;
pub use evaluations::EvaluationService;
pub use gate::AccessGate;
pub use principal::{Principal, TokenClaims};
