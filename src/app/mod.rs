//! App layer - snapshot ownership and event reduction
//!
//! The App actor receives poller events, reduces them into an owned
//! snapshot and publishes it to readers.

pub mod state;
pub mod actor;

pub use state::AppState;
pub use actor::AppActor;
