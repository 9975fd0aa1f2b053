//! Flow crate orchestrates the delivery workflow on top of the core routing algorithms:
//! it validates incoming orders, drives the order lifecycle through assignment, routing
//! and dispatch, reacts to road conditions and recovers from failures.
//!

#[cfg(test)]
#[path = "../tests/helpers/mod.rs"]
#[macro_use]
pub mod helpers;

pub mod intake;
pub mod orchestration;
pub mod state;
