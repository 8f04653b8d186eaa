//! Shared building blocks for the group Q&A bot: domain types, content
//! hashing, configuration, errors, and collaborator contracts.

pub mod config;
pub mod error;
pub mod hashing;
pub mod traits;
pub mod types;

pub use config::QabotConfig;
pub use error::{QabotError, Result};
pub use hashing::{content_id, ContentId};
pub use traits::{Messenger, QaStore};
pub use types::*;
