//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that
//! accept `&PgPool` as the first argument.

pub mod audit_repo;
pub mod office_hours_repo;
pub mod presence_segment_repo;
pub mod registry_repo;
pub mod staff_repo;

pub use audit_repo::AuditLogRepo;
pub use office_hours_repo::OfficeHoursRepo;
pub use presence_segment_repo::PresenceSegmentRepo;
pub use registry_repo::{OfficeLocationRepo, PresenceStatusRepo};
pub use staff_repo::StaffRepo;
