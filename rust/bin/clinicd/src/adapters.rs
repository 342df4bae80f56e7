//! Cross-module wiring: each module sees the others only through a trait.

use std::sync::Arc;

use chrono::NaiveDate;
use clinic_core::{ServiceError, Team};
use crm::service::CrmService;
use staff::service::StaffService;

/// Telesale teams for CRM lead assignment, read from staff accounts.
pub struct StaffRoster(pub Arc<StaffService>);

impl crm::TeamRoster for StaffRoster {
    fn team_members(&self, team: Team) -> Result<Vec<String>, ServiceError> {
        self.0.team_members(team)
    }
}

/// Per-staff revenue for payroll commission, read from CRM orders.
pub struct CrmLedger(pub Arc<CrmService>);

impl hr::SalesLedger for CrmLedger {
    fn revenue_for_staff(&self, staff_id: &str, from: NaiveDate, to: NaiveDate) -> Result<i64, ServiceError> {
        self.0.revenue_for_staff(staff_id, from, to)
    }
}
