//! FactorClaim module: users, items, merchants and the claim workflow.
//!
//! # Resources
//!
//! - **User**: an account with one of four roles (Admin, Rep, Factory,
//!   Warehouse Manager)
//! - **Item**: a production batch of fixtures, looked up by barcode
//! - **Merchant**: a shop that returns items through a claim
//! - **Claim**: a Rep's submission, moved through bilty, approval or
//!   rejection by the factory
//!
//! # Usage
//!
//! ```ignore
//! use factorclaim::{FactorClaimModule, service::FactorConfig};
//!
//! let module = FactorClaimModule::new(sql, kv, FactorConfig::default())?;
//! let router = module.routes(); // serves /api/...
//! ```

pub mod api;
pub mod model;
pub mod service;
mod validate;

use std::sync::Arc;

use axum::Router;

use factorclaim_core::{Module, ServiceError};
use factorclaim_kv::KVStore;
use factorclaim_sql::SQLStore;

use crate::service::{FactorConfig, FactorService};

/// The FactorClaim module. Owns the service and exposes its `/api` router.
pub struct FactorClaimModule {
    service: Arc<FactorService>,
}

impl FactorClaimModule {
    /// Create the module, initializing the database schema.
    pub fn new(
        sql: Arc<dyn SQLStore>,
        kv: Arc<dyn KVStore>,
        config: FactorConfig,
    ) -> Result<Self, ServiceError> {
        let service = FactorService::new(sql, kv, config)?;
        Ok(Self { service })
    }

    /// Get a reference to the underlying service.
    pub fn service(&self) -> &Arc<FactorService> {
        &self.service
    }
}

impl Module for FactorClaimModule {
    fn name(&self) -> &str {
        "api"
    }

    fn routes(&self) -> Router {
        api::build_router(self.service.clone())
    }
}
