//! HR module: employment contracts, daily attendance and monthly payroll.
//!
//! Payroll pulls each staff member's sales through [`SalesLedger`], which
//! the server implements over the crm orders.

pub mod api;
pub mod model;
pub mod service;

use std::sync::Arc;

use axum::Router;

use clinic_core::{Module, ServiceError};
use clinic_sql::SQLStore;

use crate::service::HrService;

pub use service::{HrConfig, SalesLedger};

/// HR module implementing the Module trait.
pub struct HrModule {
    service: Arc<HrService>,
}

impl HrModule {
    pub fn new(sql: Arc<dyn SQLStore>, ledger: Arc<dyn SalesLedger>, config: HrConfig) -> Result<Self, ServiceError> {
        Ok(Self {
            service: HrService::new(sql, ledger, config)?,
        })
    }

    pub fn service(&self) -> &Arc<HrService> {
        &self.service
    }
}

impl Module for HrModule {
    fn name(&self) -> &str {
        "hr"
    }

    fn routes(&self) -> Router {
        api::build_router(self.service.clone())
    }
}
