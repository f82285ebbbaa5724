use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde::Deserialize;

use crate::errors::AppError;
use crate::models::Worker;
use crate::services::workers::{self, NewWorker, WorkerPatch};
use crate::state::AppState;

use super::check_admin;

// GET /api/workers
#[derive(Deserialize)]
pub struct WorkersQuery {
    pub service: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

pub async fn list_workers(
    State(state): State<Arc<AppState>>,
    Query(query): Query<WorkersQuery>,
) -> Result<Json<Vec<Worker>>, AppError> {
    let db = state.db.lock().unwrap();
    let workers = workers::list_workers(&db, query.service.as_deref(), query.limit, query.offset)?;
    Ok(Json(workers))
}

// GET /api/workers/:id
pub async fn get_worker(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Worker>, AppError> {
    let db = state.db.lock().unwrap();
    let worker = workers::get_worker(&db, &id)?;
    Ok(Json(worker))
}

// POST /api/workers
#[derive(Deserialize)]
pub struct CreateWorkerRequest {
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub service: String,
    pub base_price: f64,
    #[serde(default)]
    pub experience_years: i32,
    #[serde(default)]
    pub languages: Vec<String>,
    #[serde(default)]
    pub distance_km: f64,
    pub image_url: Option<String>,
}

pub async fn create_worker(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<CreateWorkerRequest>,
) -> Result<(StatusCode, Json<Worker>), AppError> {
    check_admin(&headers, &state.config.admin_token)?;

    let db = state.db.lock().unwrap();
    let worker = workers::create_worker(
        &db,
        NewWorker {
            name: &body.name,
            phone: &body.phone,
            email: body.email.as_deref(),
            service: &body.service,
            base_price: body.base_price,
            experience_years: body.experience_years,
            languages: body.languages,
            distance_km: body.distance_km,
            image_url: body.image_url.as_deref(),
        },
    )?;
    Ok((StatusCode::CREATED, Json(worker)))
}

// PATCH /api/workers/:id
#[derive(Deserialize)]
pub struct UpdateWorkerRequest {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub service: Option<String>,
    pub base_price: Option<f64>,
    pub rating: Option<f64>,
    pub review_count: Option<i64>,
    pub experience_years: Option<i32>,
    pub languages: Option<Vec<String>>,
    pub verified: Option<bool>,
    pub distance_km: Option<f64>,
    pub available: Option<bool>,
    pub image_url: Option<String>,
}

pub async fn update_worker(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<UpdateWorkerRequest>,
) -> Result<Json<Worker>, AppError> {
    check_admin(&headers, &state.config.admin_token)?;

    let db = state.db.lock().unwrap();
    let worker = workers::update_worker(
        &db,
        &id,
        WorkerPatch {
            name: body.name,
            phone: body.phone,
            email: body.email,
            service: body.service,
            base_price: body.base_price,
            rating: body.rating,
            review_count: body.review_count,
            experience_years: body.experience_years,
            languages: body.languages,
            verified: body.verified,
            distance_km: body.distance_km,
            available: body.available,
            image_url: body.image_url,
        },
    )?;
    Ok(Json(worker))
}
