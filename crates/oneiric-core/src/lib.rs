pub mod config;
pub mod credentials;
pub mod error;
pub mod types;

pub use config::OneiricConfig;
pub use credentials::{CredentialSource, CredentialStore};
pub use error::{OneiricError, Result};
pub use types::*;
