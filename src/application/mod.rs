//! Application layer - services that coordinate domain operations and ports.

mod archivist;

pub use archivist::Archivist;
