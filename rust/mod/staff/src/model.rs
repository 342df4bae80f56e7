use clinic_core::{Role, Team};
use serde::{Deserialize, Serialize};

/// A clinic employee with a login.
///
/// The password hash lives in its own column and never appears in the JSON
/// document or in API responses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Staff {
    pub id: String,

    /// Login name, unique across all staff.
    pub username: String,

    /// Display name.
    pub name: String,

    pub role: Role,

    /// Telesale team, only set for telesale staff.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team: Option<Team>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(default = "default_true")]
    pub active: bool,

    pub created_at: String,
    pub updated_at: String,
}

/// Input for creating a staff account.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateStaff {
    pub username: String,
    pub password: String,
    pub name: String,
    pub role: Role,
    #[serde(default)]
    pub team: Option<Team>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

/// Filters for listing staff.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaffQuery {
    #[serde(default)]
    pub role: Option<Role>,
    #[serde(default)]
    pub team: Option<Team>,
    #[serde(default)]
    pub active: Option<bool>,
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default)]
    pub offset: Option<usize>,
}

/// Body of a password change.
#[derive(Debug, Clone, Deserialize)]
pub struct SetPassword {
    pub password: String,
}

fn default_true() -> bool {
    true
}
