//! Connection module - the role a transport connection plays in a thread.

mod state;

pub use state::ConnectionState;
