//! Module declaration and lifecycle
//!
//! Wires configuration, the database connection, form metadata and
//! collaborators into a ready `Service`, its native client and REST routes.

use crate::config::Config;
use crate::contract::{Field, FormId, SubmissionsApi};
use crate::domain::{Collaborators, FormCatalog, Service};
use anyhow::Result;
use parking_lot::RwLock;
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Submissions service module
pub struct SubmissionsModule {
    config: RwLock<Config>,
    db: RwLock<Option<Arc<DatabaseConnection>>>,
    service: RwLock<Option<Arc<Service>>>,
}

impl Default for SubmissionsModule {
    fn default() -> Self {
        Self {
            config: RwLock::new(Config::default()),
            db: RwLock::new(None),
            service: RwLock::new(None),
        }
    }
}

impl SubmissionsModule {
    /// Build the domain service over a database connection
    pub fn init(
        &self,
        config: Config,
        db: Arc<DatabaseConnection>,
        catalog: Arc<dyn FormCatalog>,
        collaborators: Collaborators,
    ) -> Result<()> {
        config.validate()?;
        *self.config.write() = config.clone();

        // Build repositories
        let repo = Arc::new(crate::infra::storage::SeaOrmSubmissionRepository::new(db.clone()));

        // Build domain service
        let service = Arc::new(Service::new(config, repo, catalog, collaborators));
        *self.service.write() = Some(service);
        *self.db.write() = Some(db);

        tracing::info!("Submissions service initialized");
        Ok(())
    }

    /// Create a form's table if it does not exist yet
    pub async fn provision_form(&self, form_id: FormId, fields: &[Field]) -> Result<()> {
        let db = self
            .db
            .read()
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("Database not initialized"))?
            .clone();
        crate::infra::storage::provision_form_table(&db, form_id, fields).await
    }

    pub fn config(&self) -> Config {
        self.config.read().clone()
    }

    pub fn service(&self) -> Result<Arc<Service>> {
        Ok(self
            .service
            .read()
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("Service not initialized"))?
            .clone())
    }

    /// In-process client for other modules
    pub fn client(&self) -> Result<Arc<dyn SubmissionsApi>> {
        Ok(Arc::new(crate::api::native::NativeClient::new(self.service()?)))
    }

    /// Mount the REST routes on `router`
    pub fn register_rest(&self, router: axum::Router) -> Result<axum::Router> {
        let service = self.service()?;

        tracing::info!("Registering submissions service REST routes");
        crate::api::rest::routes::register_routes(router, service)
    }
}

/// Install a fmt subscriber filtered by `RUST_LOG` (default `info`).
/// Does nothing if a global subscriber is already set.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
