//! Problem domain models: orders to deliver, vehicles to deliver them, travel costs.

mod costs;
pub use self::costs::*;

mod fleet;
pub use self::fleet::*;

mod orders;
pub use self::orders::*;
