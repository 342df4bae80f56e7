pub mod schema;
mod campaigns;
mod content;
mod reports;

use std::sync::Arc;

use clinic_core::{Principal, Role, ServiceError, Table};
use clinic_sql::SQLStore;

use crate::model::AiConfig;

pub use content::build_prompt;

pub(crate) const CAMPAIGNS: Table = Table::new("mkt_campaigns", "campaign");
pub(crate) const REPORTS: Table = Table::new("mkt_reports", "daily report");

/// Roles that run campaigns and enter results.
const WRITERS: [Role; 2] = [Role::Manager, Role::Marketing];
/// Roles that may read marketing figures.
const READERS: [Role; 3] = [Role::Manager, Role::Marketing, Role::Accountant];

/// Campaigns, daily results and content generation.
pub struct MarketingService {
    pub(crate) sql: Arc<dyn SQLStore>,
    pub(crate) ai: AiConfig,
    pub(crate) http: reqwest::Client,
}

impl MarketingService {
    /// Create the service, initializing the schema.
    pub fn new(sql: Arc<dyn SQLStore>, ai: AiConfig) -> Result<Arc<Self>, ServiceError> {
        schema::init_schema(sql.as_ref())?;
        Ok(Arc::new(Self {
            sql,
            ai,
            http: reqwest::Client::new(),
        }))
    }
}

pub(crate) fn require_writer(caller: &Principal) -> Result<(), ServiceError> {
    caller.require(&WRITERS)
}

pub(crate) fn require_reader(caller: &Principal) -> Result<(), ServiceError> {
    caller.require(&READERS)
}

pub(crate) fn page(limit: Option<usize>, offset: Option<usize>) -> (usize, usize) {
    (limit.unwrap_or(50).clamp(1, 500), offset.unwrap_or(0))
}
