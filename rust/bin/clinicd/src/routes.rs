//! Route registration: system endpoints, login and every module.

use std::sync::Arc;

use axum::middleware;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use clinic_core::Module;
use clinic_sql::SQLStore;
use staff::service::StaffService;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::adapters::{CrmLedger, StaffRoster};
use crate::auth_middleware::{self, JwtState};
use crate::bootstrap;
use crate::config::ServerConfig;
use crate::login;

/// Application shared state for system routes.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub staff: Arc<StaffService>,
}

/// Initialize every module on `sql` and assemble the full router.
pub fn build_app(config: ServerConfig, sql: Arc<dyn SQLStore>) -> anyhow::Result<Router> {
    let staff_module = staff::StaffModule::new(Arc::clone(&sql))?;
    bootstrap::ensure_admin(staff_module.service(), &config)?;

    let roster = Arc::new(StaffRoster(Arc::clone(staff_module.service())));
    let crm_module = crm::CrmModule::new(Arc::clone(&sql), roster)?;
    let ledger = Arc::new(CrmLedger(Arc::clone(crm_module.service())));
    let hr_module = hr::HrModule::new(Arc::clone(&sql), ledger, config.hr.clone())?;
    let inventory_module = inventory::InventoryModule::new(Arc::clone(&sql))?;
    let chat_module = chat::ChatModule::new(Arc::clone(&sql))?;
    let marketing_module = marketing::MarketingModule::new(Arc::clone(&sql), config.ai.clone())?;
    let training_module = training::TrainingModule::new(Arc::clone(&sql))?;

    let modules: Vec<&dyn Module> = vec![
        &staff_module,
        &crm_module,
        &hr_module,
        &inventory_module,
        &chat_module,
        &marketing_module,
        &training_module,
    ];
    let module_routes: Vec<(String, Router)> = modules
        .into_iter()
        .map(|m| {
            info!("{} module initialized", m.name());
            (m.name().to_string(), m.routes())
        })
        .collect();

    let jwt_state = Arc::new(JwtState::new(&config.jwt.secret));
    let state = AppState {
        config: Arc::new(config),
        staff: Arc::clone(staff_module.service()),
    };
    Ok(build_router(state, jwt_state, module_routes))
}

/// Mount system routes and each module under `/{name}`, behind JWT auth.
pub fn build_router(state: AppState, jwt_state: Arc<JwtState>, module_routes: Vec<(String, Router)>) -> Router {
    let mut app: Router = Router::new()
        .route("/health", get(health))
        .route("/version", get(version))
        .merge(login::routes())
        .with_state(state);

    for (name, router) in module_routes {
        app = app.nest(&format!("/{name}"), router);
    }

    app.layer(middleware::from_fn_with_state(jwt_state, auth_middleware::auth_middleware))
        .layer(TraceLayer::new_for_http())
}

async fn health() -> impl IntoResponse {
    axum::Json(serde_json::json!({
        "status": "ok",
    }))
}

async fn version() -> impl IntoResponse {
    axum::Json(serde_json::json!({
        "name": "clinicd",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
