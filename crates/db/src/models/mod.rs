//! Row models and insert DTOs.
//!
//! Each submodule holds `FromRow` structs matching the table columns and
//! the conversions into the scheduling core's domain types.

pub mod audit;
pub mod presence;
pub mod registry;
pub mod staff;
