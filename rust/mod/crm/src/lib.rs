//! Customer relationship module: customers and lead assignment, CSV import,
//! telesale call tracking, appointments and sales.
//!
//! # Usage
//!
//! ```ignore
//! let module = CrmModule::new(sql, roster)?;
//! let ledger = module.service().clone(); // revenue source for payroll
//! let router = module.routes();          // nested under /crm
//! ```

pub mod api;
pub mod model;
pub mod service;

use std::sync::Arc;

use axum::Router;

use clinic_core::{Module, ServiceError};
use clinic_sql::SQLStore;

use crate::service::CrmService;

pub use service::TeamRoster;

/// CRM module implementing the Module trait.
pub struct CrmModule {
    service: Arc<CrmService>,
}

impl CrmModule {
    pub fn new(sql: Arc<dyn SQLStore>, roster: Arc<dyn TeamRoster>) -> Result<Self, ServiceError> {
        Ok(Self {
            service: CrmService::new(sql, roster)?,
        })
    }

    pub fn service(&self) -> &Arc<CrmService> {
        &self.service
    }
}

impl Module for CrmModule {
    fn name(&self) -> &str {
        "crm"
    }

    fn routes(&self) -> Router {
        api::build_router(self.service.clone())
    }
}
