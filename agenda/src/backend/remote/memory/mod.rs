//! In-process backend.
//!
//! Implements every collaborator trait over shared in-memory tables. Used by
//! the test suite, with fault injection ([`MemoryConnection::fail`]), latency
//! ([`MemoryConnection::set_latency`]) and call counters
//! ([`MemoryConnection::stats`]).

pub mod collaborators;
pub mod connection;
pub mod repositories;

#[cfg(test)]
pub mod test_utils;

pub use collaborators::{MemoryAuth, MemoryChangeFeed, MemoryObjectStorage};
pub use connection::{CallStats, MemoryConnection, RemoteOperation};
pub use repositories::MemoryRepository;
