//! Contracts of external collaborators: order and fleet stores, alert and dispatch sinks.

mod events;
pub use self::events::*;

mod store;
pub use self::store::*;
