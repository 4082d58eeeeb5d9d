mod record;
mod store;

pub use record::{SessionRecord, Slot};
pub use store::{MemorySessionStore, SessionStore};
