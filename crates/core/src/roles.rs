//! Well-known role names and the schedule-editing policy.
//!
//! Role names must match the seed data in the `roles` migration. The auth
//! collaborator normalizes whatever shape it stores into [`Actor::roles`]
//! once; nothing in the scheduling core re-derives roles.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::types::DbId;

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_AGENT: &str = "agent";
pub const ROLE_REQUESTER: &str = "requester";

/// The authenticated caller of a scheduling operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Actor {
    pub id: DbId,
    pub email: String,
    pub roles: BTreeSet<String>,
}

impl Actor {
    pub fn new<I, S>(id: DbId, email: impl Into<String>, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id,
            email: email.into(),
            roles: roles.into_iter().map(Into::into).collect(),
        }
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.contains(role)
    }
}

/// Requesters are customers of the helpdesk, not staff. They never touch
/// schedules, regardless of any other role they carry.
pub fn is_requester_role(actor: &Actor) -> bool {
    actor.has_role(ROLE_REQUESTER)
}

/// Whether `actor` may create, extend or cancel segments owned by `target_user_id`.
pub fn can_edit_schedule(actor: &Actor, target_user_id: DbId) -> bool {
    if is_requester_role(actor) {
        return false;
    }
    if actor.id == target_user_id {
        return true;
    }
    actor.has_role(ROLE_ADMIN)
}

/// Whether `actor` may read a staff member's day schedule. Any staff member
/// can see the roster; requesters see nothing.
pub fn can_view_schedule(actor: &Actor, _target_user_id: DbId) -> bool {
    !is_requester_role(actor)
}

/// Whether `actor` may activate or retire reference statuses.
pub fn can_manage_registry(actor: &Actor) -> bool {
    !is_requester_role(actor) && actor.has_role(ROLE_ADMIN)
}
