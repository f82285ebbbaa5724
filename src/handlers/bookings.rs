use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde::Deserialize;

use crate::db::queries::{BookingAdminView, BookingWithWorker};
use crate::errors::AppError;
use crate::models::{Booking, BookingStatus};
use crate::services::bookings::{self, NewBooking};
use crate::state::AppState;

use super::{check_admin, require_user};

// POST /api/bookings
#[derive(Deserialize)]
pub struct CreateBookingRequest {
    pub worker_id: String,
    pub service: Option<String>,
    pub date: String,
    pub time_slot: String,
    pub total_amount: Option<f64>,
}

pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<CreateBookingRequest>,
) -> Result<(StatusCode, Json<Booking>), AppError> {
    let user_id = require_user(&headers)?;

    let db = state.db.lock().unwrap();
    let booking = bookings::create_booking(
        &db,
        NewBooking {
            user_id: &user_id,
            worker_id: &body.worker_id,
            service: body.service.as_deref(),
            date: &body.date,
            time_slot: &body.time_slot,
            total_amount: body.total_amount,
        },
    )?;
    Ok((StatusCode::CREATED, Json(booking)))
}

// GET /api/bookings/my-bookings
pub async fn my_bookings(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<BookingWithWorker>>, AppError> {
    let user_id = require_user(&headers)?;

    let db = state.db.lock().unwrap();
    let bookings = bookings::list_for_user(&db, &user_id)?;
    Ok(Json(bookings))
}

// GET /api/bookings/all
#[derive(Deserialize)]
pub struct AllBookingsQuery {
    pub status: Option<String>,
    pub limit: Option<i64>,
}

pub async fn all_bookings(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<AllBookingsQuery>,
) -> Result<Json<Vec<BookingAdminView>>, AppError> {
    check_admin(&headers, &state.config.admin_token)?;

    let limit = query.limit.unwrap_or(50);
    let db = state.db.lock().unwrap();
    let bookings = bookings::list_all(&db, query.status.as_deref(), limit)?;
    Ok(Json(bookings))
}

// PATCH /api/bookings/:id/status
#[derive(Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}

/// Admins may request any legal transition; the booking's owner may only
/// cancel.
pub async fn update_status(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<UpdateStatusRequest>,
) -> Result<Json<Booking>, AppError> {
    let new_status = BookingStatus::parse(&body.status)
        .ok_or_else(|| AppError::Validation(format!("invalid status: {}", body.status)))?;

    let is_admin = check_admin(&headers, &state.config.admin_token).is_ok();

    let db = state.db.lock().unwrap();

    if !is_admin {
        let caller = require_user(&headers)?;
        let booking = bookings::get_booking(&db, &id)?;
        if booking.user_id != caller {
            return Err(AppError::Forbidden("not your booking".into()));
        }
        if new_status != BookingStatus::Cancelled {
            return Err(AppError::Forbidden(
                "customers may only cancel a booking".into(),
            ));
        }
    }

    let booking = bookings::update_status(
        &db,
        &id,
        new_status,
        state.config.allow_confirmed_cancellation,
    )?;
    Ok(Json(booking))
}
