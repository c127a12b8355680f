//! Staffboard domain logic: presence resolution, day planning and the
//! registry cache. This crate has no internal dependencies; storage is
//! reached through the traits in [`store`].

pub mod audit;
pub mod config;
pub mod error;
pub mod planner;
pub mod presence;
pub mod registry;
pub mod roles;
pub mod store;
pub mod timezone;
pub mod types;
pub mod validation;

#[cfg(test)]
pub(crate) mod test_support;
