//! Salon agenda client core.
//!
//! Screen controllers, domain services and the hosted backend binding for a
//! salon's daily appointment agenda.

pub mod backend;
pub mod config;
pub mod logging;
