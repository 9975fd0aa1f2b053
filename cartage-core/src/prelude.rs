//! This module reimports commonly used types.

pub use crate::assignment::AssignmentFailure;
pub use crate::assignment::AssignmentOptimizer;
pub use crate::assignment::AssignmentResult;

pub use crate::construction::PlanOutcome;
pub use crate::construction::PlannerConfig;
pub use crate::construction::PlanningFailure;
pub use crate::construction::PlanningStrategy;
pub use crate::construction::RoutePlanner;

pub use crate::evolution::EvolutionConfig;
pub use crate::evolution::EvolutionConfigBuilder;

pub use crate::models::common::{Cost, Distance, Duration, GeoPoint, Load, Schedule, TimeWindow, Timestamp};
pub use crate::models::problem::{distance, duration};
pub use crate::models::problem::{CostModel, SpeedProfile};
pub use crate::models::problem::{Order, OrderStatus, Vehicle, VehicleStatus};
pub use crate::models::solution::{Route, Stop, StopKind};

pub use crate::utils::compare_floats;
pub use crate::utils::DefaultRandom;
pub use crate::utils::Environment;
pub use crate::utils::InfoLogger;
pub use crate::utils::{GenericError, GenericResult};
pub use crate::utils::{parallel_collect, parallel_into_collect};
pub use crate::utils::Random;
