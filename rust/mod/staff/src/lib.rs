//! Staff module: accounts, roles, telesale teams and login verification.
//!
//! # Usage
//!
//! ```ignore
//! let module = StaffModule::new(sql)?;
//! let staff = module.service().clone(); // used by the login handler
//! let router = module.routes();         // nested under /staff
//! ```

pub mod api;
pub mod model;
pub mod service;

use std::sync::Arc;

use axum::Router;

use clinic_core::{Module, ServiceError};
use clinic_sql::SQLStore;

use crate::service::StaffService;

pub use service::{hash_password, verify_password};

/// Staff module implementing the Module trait.
pub struct StaffModule {
    service: Arc<StaffService>,
}

impl StaffModule {
    pub fn new(sql: Arc<dyn SQLStore>) -> Result<Self, ServiceError> {
        Ok(Self {
            service: StaffService::new(sql)?,
        })
    }

    pub fn service(&self) -> &Arc<StaffService> {
        &self.service
    }
}

impl Module for StaffModule {
    fn name(&self) -> &str {
        "staff"
    }

    fn routes(&self) -> Router {
        api::build_router(self.service.clone())
    }
}
