pub mod schema;
mod attendance;
mod contracts;
mod payroll;

use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime};
use serde::Deserialize;

use clinic_core::{ServiceError, Table};
use clinic_sql::SQLStore;

pub(crate) const CONTRACTS: Table = Table::new("hr_contracts", "contract");
pub(crate) const ATTENDANCE: Table = Table::new("hr_attendance", "attendance record");
pub(crate) const SLIPS: Table = Table::new("hr_salary_slips", "salary slip");

/// Where payroll gets each staff member's sales.
///
/// Implemented over the crm orders by the server.
pub trait SalesLedger: Send + Sync {
    /// Collected revenue credited to `staff_id` for orders dated in `[from, to]`.
    fn revenue_for_staff(&self, staff_id: &str, from: NaiveDate, to: NaiveDate) -> Result<i64, ServiceError>;
}

/// Shift and payroll rules, the `[hr]` section of the server config.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct HrConfig {
    /// Start of the working day, e.g. `"08:00"`.
    pub shift_start: NaiveTime,
    /// Minutes after `shift_start` before a check-in counts as late.
    pub late_grace_minutes: i64,
    /// Working days in a month for prorating the base salary.
    pub standard_days: i64,
    /// Deducted per late day, VND.
    pub late_penalty: i64,
}

impl Default for HrConfig {
    fn default() -> Self {
        Self {
            shift_start: NaiveTime::from_hms_opt(8, 0, 0).unwrap_or(NaiveTime::MIN),
            late_grace_minutes: 15,
            standard_days: 26,
            late_penalty: 50_000,
        }
    }
}

/// Contracts, attendance and payroll.
pub struct HrService {
    pub(crate) sql: Arc<dyn SQLStore>,
    pub(crate) ledger: Arc<dyn SalesLedger>,
    pub(crate) config: HrConfig,
}

impl HrService {
    /// Create the service, initializing the schema.
    pub fn new(
        sql: Arc<dyn SQLStore>,
        ledger: Arc<dyn SalesLedger>,
        config: HrConfig,
    ) -> Result<Arc<Self>, ServiceError> {
        if config.standard_days <= 0 {
            return Err(ServiceError::Validation("hr.standard_days must be positive".into()));
        }
        schema::init_schema(sql.as_ref())?;
        Ok(Arc::new(Self { sql, ledger, config }))
    }

    pub fn config(&self) -> &HrConfig {
        &self.config
    }
}

pub(crate) fn page(limit: Option<usize>, offset: Option<usize>) -> (usize, usize) {
    (limit.unwrap_or(50).clamp(1, 500), offset.unwrap_or(0))
}
