//! The supervisory controller which drives orders, vehicles and routes through
//! one processing cycle, and the exception policy which recovers from failures.

mod exception;
pub use self::exception::*;

mod monitor;
pub use self::monitor::*;

mod supervisor;
pub use self::supervisor::*;
