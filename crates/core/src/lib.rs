//! Domain layer for the turbine site visit log.
//!
//! Pure types and rules shared by the database, notification, and API
//! crates. Nothing in here touches I/O.

pub mod error;
pub mod technicians;
pub mod time_window;
pub mod types;
pub mod visit;
