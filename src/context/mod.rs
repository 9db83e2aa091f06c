//! Active-context state: data model, persistence, and the manager.

pub mod manager;
pub mod store;
pub mod types;

pub use manager::{ActiveContextManager, ContextSnapshot};
pub use store::{ContextStore, FileContextStore, MemoryContextStore};
pub use types::{Action, ActiveContext, Level, Permissions};
