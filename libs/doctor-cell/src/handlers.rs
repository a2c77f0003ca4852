use std::sync::Arc;

use axum::{
    extract::{Extension, Path, State},
    Json,
};
use axum_extra::TypedHeader;
use headers::{authorization::Bearer, Authorization};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::User;
use shared_models::error::AppError;
use shared_utils::extractor::actor_from_user;

use crate::models::{DoctorScheduleResponse, UpdateScheduleRequest};
use crate::services::DoctorService;

#[axum::debug_handler]
pub async fn get_doctor(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(doctor_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let service = DoctorService::for_request(&config, auth.token());

    let doctor = service.get_doctor(doctor_id).await?;

    Ok(Json(json!(doctor)))
}

#[axum::debug_handler]
pub async fn get_doctor_schedule(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(doctor_id): Path<Uuid>,
) -> Result<Json<DoctorScheduleResponse>, AppError> {
    let service = DoctorService::for_request(&config, auth.token());

    let schedule = service.get_schedule(doctor_id).await?;

    Ok(Json(DoctorScheduleResponse { doctor_id, schedule }))
}

#[axum::debug_handler]
pub async fn update_doctor_schedule(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path(doctor_id): Path<Uuid>,
    Json(request): Json<UpdateScheduleRequest>,
) -> Result<Json<DoctorScheduleResponse>, AppError> {
    let actor = actor_from_user(&user)?;
    let service = DoctorService::for_request(&config, auth.token());

    let doctor = service
        .update_schedule(&actor, doctor_id, request.schedule)
        .await?;

    Ok(Json(DoctorScheduleResponse {
        doctor_id: doctor.id,
        schedule: doctor.schedule,
    }))
}
