//! Solution domain models: stops and routes committed to vehicles.

mod route;
pub use self::route::*;
