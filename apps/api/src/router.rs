use std::sync::Arc;

use axum::{routing::get, Router};

use appointment_cell::appointment_routes;
use doctor_cell::router::doctor_routes;
use patient_cell::create_patient_router;
use shared_config::AppConfig;

pub fn create_router(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", get(|| async { "Clinic API is running!" }))
        .nest("/doctors", doctor_routes(state.clone()))
        .nest("/patients", create_patient_router(state.clone()))
        .nest("/appointments", appointment_routes(state))
}
