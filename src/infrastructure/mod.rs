//! Adapters behind the domain ports: the row-locking in-memory store and
//! the simulated settlement rail.

pub mod in_memory;
pub mod settlement;
