//! NGAC policy engine for Blossom.
//!
//! # Components
//!
//! - **Graph** — typed nodes with assignment and association edges
//! - **Decider** — permission resolution with prohibitions subtracted
//! - **Command** — the six primitive mutations, authorized per principal
//! - **Differ** — turns a proposed graph into an ordered command list
//! - **Obligations** — event-triggered command templates run with system authority
//! - **PAP** — the base policy and the account/asset/SwID workflows
//!
//! # Usage
//!
//! ```ignore
//! use ngac::NgacModule;
//!
//! let module = NgacModule::new(kv, ServiceConfig::default());
//! let router = module.routes(); // serves /ngac/...
//! ```

pub mod api;
pub mod command;
pub mod decider;
pub mod differ;
pub mod epp;
pub mod error;
pub mod model;
pub mod pap;
pub mod policy_store;
pub mod service;

use std::sync::Arc;

use axum::Router;

use blossom_core::{Module, ServiceConfig};
use blossom_kv::KVStore;

pub use command::Command;
pub use decider::Decider;
pub use epp::EventContext;
pub use error::NgacError;
pub use policy_store::PolicyStore;
pub use service::NgacService;

/// Policy engine module implementing the Module trait.
pub struct NgacModule {
    service: Arc<NgacService>,
}

impl NgacModule {
    pub fn new(kv: Arc<dyn KVStore>, config: ServiceConfig) -> Self {
        Self {
            service: NgacService::new(kv, config),
        }
    }

    pub fn service(&self) -> &Arc<NgacService> {
        &self.service
    }
}

impl Module for NgacModule {
    fn name(&self) -> &str {
        "ngac"
    }

    fn routes(&self) -> Router {
        api::build_router(self.service.clone())
    }
}
