use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde::Deserialize;

use crate::errors::AppError;
use crate::models::User;
use crate::services::users::{self, NewUser};
use crate::state::AppState;

use super::{check_admin, require_user};

// POST /api/users
#[derive(Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub password: String,
    pub role: Option<String>,
}

pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(body): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<User>), AppError> {
    let db = state.db.lock().unwrap();
    let user = users::register(
        &db,
        NewUser {
            name: &body.name,
            email: &body.email,
            phone: &body.phone,
            password: &body.password,
            role: body.role.as_deref(),
        },
    )?;
    Ok((StatusCode::CREATED, Json(user)))
}

// PATCH /api/users/:id
#[derive(Deserialize)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub phone: Option<String>,
}

pub async fn update_profile(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<UpdateProfileRequest>,
) -> Result<Json<User>, AppError> {
    // The user themselves, or an admin.
    if check_admin(&headers, &state.config.admin_token).is_err() {
        let caller = require_user(&headers)?;
        if caller != id {
            return Err(AppError::Forbidden("not your profile".into()));
        }
    }

    let db = state.db.lock().unwrap();
    let user = users::update_profile(&db, &id, body.name.as_deref(), body.phone.as_deref())?;
    Ok(Json(user))
}
