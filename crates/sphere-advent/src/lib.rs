//! Pure decision layer for the advent calendar: day resolution,
//! openability, snowdome bundling, and the item-acquisition flow.
//!
//! Nothing in this crate touches a clock, a database, or the network.
//! "Now" is always an explicit argument, and persistence writes are
//! emitted as [`flow::WriteIntent`] values for a caller to execute.

pub mod bundle;
pub mod calendar;
pub mod error;
pub mod flow;
pub mod openability;
pub mod snapshot;

#[cfg(test)]
mod flow_tests;
