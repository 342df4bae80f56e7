//! The authenticated caller.
//!
//! The server's auth middleware validates the bearer token and inserts a
//! [`Principal`] into the request extensions. Module handlers take it as an
//! extractor and use [`Principal::require`] for role checks. Modules never
//! see tokens.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use serde::{Deserialize, Serialize};

use crate::ServiceError;

/// Staff role. Determines which records a caller can see and change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Admin,
    Manager,
    Telesale,
    Receptionist,
    Consultant,
    Technician,
    Marketing,
    Accountant,
    Hr,
    Warehouse,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "ADMIN",
            Self::Manager => "MANAGER",
            Self::Telesale => "TELESALE",
            Self::Receptionist => "RECEPTIONIST",
            Self::Consultant => "CONSULTANT",
            Self::Technician => "TECHNICIAN",
            Self::Marketing => "MARKETING",
            Self::Accountant => "ACCOUNTANT",
            Self::Hr => "HR",
            Self::Warehouse => "WAREHOUSE",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "ADMIN" => Some(Self::Admin),
            "MANAGER" => Some(Self::Manager),
            "TELESALE" => Some(Self::Telesale),
            "RECEPTIONIST" => Some(Self::Receptionist),
            "CONSULTANT" => Some(Self::Consultant),
            "TECHNICIAN" => Some(Self::Technician),
            "MARKETING" => Some(Self::Marketing),
            "ACCOUNTANT" => Some(Self::Accountant),
            "HR" => Some(Self::Hr),
            "WAREHOUSE" => Some(Self::Warehouse),
            _ => None,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Telesale team. Team A sources leads, Team B works them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Team {
    A,
    B,
}

impl Team {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "A" => Some(Self::A),
            "B" => Some(Self::B),
            _ => None,
        }
    }
}

/// The staff member making the current request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Principal {
    pub staff_id: String,
    pub name: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team: Option<Team>,
}

impl Principal {
    /// Admin or Manager.
    pub fn is_management(&self) -> bool {
        matches!(self.role, Role::Admin | Role::Manager)
    }

    /// Succeeds when the caller has one of `roles`. Admin always passes.
    pub fn require(&self, roles: &[Role]) -> Result<(), ServiceError> {
        if self.role == Role::Admin || roles.contains(&self.role) {
            return Ok(());
        }
        Err(ServiceError::PermissionDenied(format!(
            "role {} may not perform this action",
            self.role
        )))
    }

    /// Shorthand for `require(&[Role::Manager])`.
    pub fn require_management(&self) -> Result<(), ServiceError> {
        self.require(&[Role::Manager])
    }

    /// Whether this caller is the given staff member or management.
    pub fn is_self_or_management(&self, staff_id: &str) -> bool {
        self.staff_id == staff_id || self.is_management()
    }
}

impl<S: Send + Sync> FromRequestParts<S> for Principal {
    type Rejection = ServiceError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Principal>()
            .cloned()
            .ok_or_else(|| ServiceError::Unauthorized("missing credentials".into()))
    }
}
