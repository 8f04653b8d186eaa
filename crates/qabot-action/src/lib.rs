//! Confirmation workflow for the Q&A bot.
//!
//! Classifies inbound updates, keeps unconfirmed drafts in the pending
//! store, and commits them to the question store when a user presses the
//! confirmation button.

pub mod callback;
pub mod command;
pub mod commit;
pub mod error;
pub mod event;
pub mod format;
pub mod inline;
pub mod notify;
pub mod pending;
pub mod permission;
pub mod replies;
pub mod router;
pub mod testing;

pub use callback::{CallbackData, CallbackDispatcher, CallbackOutcome, CALLBACK_DELIMITER};
pub use command::{CommandExecutor, SlashCommand};
pub use commit::Committer;
pub use error::FlowError;
pub use event::{classify, CallbackQuery, EventCategory, InlineQuery, Message, Update, User};
pub use inline::{InlineAnswer, InlineCommand, InlineHandler};
pub use notify::Notifier;
pub use pending::PendingStore;
pub use permission::{AccessPolicy, Operation};
pub use router::EventRouter;
