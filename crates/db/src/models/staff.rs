//! Staff users as seen by the presence board.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use staffboard_core::store::StaffMember;
use staffboard_core::types::DbId;

/// A `users` row joined with the name of its default office.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct StaffUser {
    pub id: DbId,
    pub email: String,
    pub display_name: String,
    pub default_location: Option<String>,
}

impl From<StaffUser> for StaffMember {
    fn from(row: StaffUser) -> Self {
        Self {
            id: row.id,
            email: row.email,
            display_name: row.display_name,
            default_location: row.default_location,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateStaffUser {
    pub email: String,
    pub display_name: String,
    pub default_office_location_id: Option<DbId>,
    pub roles: Vec<String>,
}
