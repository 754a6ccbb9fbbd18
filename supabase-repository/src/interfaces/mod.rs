//! Destination-store trait definitions.

mod destination;

pub use destination::{AuthAdmin, TableStore};
