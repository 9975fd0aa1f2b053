//! Contains functionality to build vehicle routes under capacity and time window constraints.

pub mod heuristics;

mod planner;
pub use self::planner::*;
