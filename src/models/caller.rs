use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

/// The role of an authenticated caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Teacher,
    Student,
}

impl FromStr for Role {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "teacher" => Ok(Role::Teacher),
            "student" => Ok(Role::Student),
            _ => Err(()),
        }
    }
}

/// The authenticated identity the upstream gateway attaches to every
/// request. Credential verification happens there; this service only makes
/// role and ownership decisions on top of it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Caller {
    /// The ID of the authenticated user.
    pub user_id: Uuid,
    /// The caller's role.
    pub role: Role,
}
