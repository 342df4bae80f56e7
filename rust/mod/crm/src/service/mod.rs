pub mod schema;
mod bookings;
mod customers;
mod dashboard;
pub mod import;
mod ranking;
mod sales;
mod telesales;

use std::sync::Arc;

use chrono::NaiveDateTime;

use clinic_core::{ServiceError, Table, Team};
use clinic_sql::SQLStore;

pub use bookings::Transition;
pub use import::normalize_phone;

pub(crate) const CUSTOMERS: Table = Table::new("customers", "customer");
pub(crate) const CALL_LOGS: Table = Table::new("call_logs", "call log");
pub(crate) const APPOINTMENTS: Table = Table::new("appointments", "appointment");
pub(crate) const SERVICES: Table = Table::new("services", "service");
pub(crate) const ORDERS: Table = Table::new("orders", "order");

/// Who is on which telesale team.
///
/// Lead assignment needs the Team B roster, which lives with the staff
/// accounts. The server wires an implementation over the staff module.
pub trait TeamRoster: Send + Sync {
    /// Ids of active telesale staff in `team`, ascending.
    fn team_members(&self, team: Team) -> Result<Vec<String>, ServiceError>;
}

/// Customers, calls, appointments and sales.
pub struct CrmService {
    pub(crate) sql: Arc<dyn SQLStore>,
    pub(crate) roster: Arc<dyn TeamRoster>,
}

impl CrmService {
    /// Create the service, initializing the schema.
    pub fn new(sql: Arc<dyn SQLStore>, roster: Arc<dyn TeamRoster>) -> Result<Arc<Self>, ServiceError> {
        schema::init_schema(sql.as_ref())?;
        Ok(Arc::new(Self { sql, roster }))
    }
}

/// Sortable text form of a local timestamp, as stored in index columns.
pub(crate) fn ts(at: &NaiveDateTime) -> String {
    at.format("%Y-%m-%dT%H:%M:%S").to_string()
}

pub(crate) fn page(limit: Option<usize>, offset: Option<usize>) -> (usize, usize) {
    (limit.unwrap_or(50).clamp(1, 500), offset.unwrap_or(0))
}

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use clinic_core::{Principal, Role, ServiceError, Team};
    use clinic_sql::SqliteStore;

    use super::{CrmService, TeamRoster};

    /// In-memory roster for tests.
    #[derive(Default)]
    pub struct FixedRoster {
        pub teams: Mutex<HashMap<&'static str, Vec<String>>>,
    }

    impl FixedRoster {
        pub fn set(&self, team: Team, ids: &[&str]) {
            let mut teams = self.teams.lock().unwrap();
            teams.insert(team.as_str(), ids.iter().map(|s| s.to_string()).collect());
        }
    }

    impl TeamRoster for FixedRoster {
        fn team_members(&self, team: Team) -> Result<Vec<String>, ServiceError> {
            let teams = self.teams.lock().unwrap();
            let mut ids = teams.get(team.as_str()).cloned().unwrap_or_default();
            ids.sort();
            Ok(ids)
        }
    }

    pub fn service() -> (Arc<CrmService>, Arc<FixedRoster>) {
        let roster = Arc::new(FixedRoster::default());
        let svc = CrmService::new(
            Arc::new(SqliteStore::open_in_memory().unwrap()),
            roster.clone(),
        )
        .unwrap();
        (svc, roster)
    }

    pub fn who(id: &str, role: Role, team: Option<Team>) -> Principal {
        Principal {
            staff_id: id.into(),
            name: id.to_uppercase(),
            role,
            team,
        }
    }

    pub fn admin() -> Principal {
        who("admin", Role::Admin, None)
    }
}
