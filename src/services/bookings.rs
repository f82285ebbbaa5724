use chrono::{NaiveDate, Utc};
use rusqlite::Connection;
use uuid::Uuid;

use crate::db::queries::{self, BookingAdminView, BookingWithWorker};
use crate::errors::AppError;
use crate::models::{Booking, BookingStatus};

const DATE_FMT: &str = "%Y-%m-%d";

pub struct NewBooking<'a> {
    pub user_id: &'a str,
    pub worker_id: &'a str,
    pub service: Option<&'a str>,
    pub date: &'a str,
    pub time_slot: &'a str,
    pub total_amount: Option<f64>,
}

/// Creates a booking in `pending` state. The referenced user and worker must
/// exist, the worker must be taking bookings, and the slot must be free.
/// The amount defaults to the worker's base price and is fixed from here on.
pub fn create_booking(conn: &Connection, req: NewBooking) -> Result<Booking, AppError> {
    let date = NaiveDate::parse_from_str(req.date, DATE_FMT)
        .map_err(|_| AppError::Validation(format!("invalid date: {}", req.date)))?;

    if req.time_slot.trim().is_empty() {
        return Err(AppError::Validation("time_slot must not be empty".into()));
    }

    let user = queries::get_user(conn, req.user_id)?
        .ok_or_else(|| AppError::NotFound(format!("user {}", req.user_id)))?;

    let worker = queries::get_worker(conn, req.worker_id)?
        .ok_or_else(|| AppError::NotFound(format!("worker {}", req.worker_id)))?;

    if !worker.available {
        return Err(AppError::Conflict(format!(
            "worker {} is not taking bookings",
            worker.id
        )));
    }

    let total_amount = req.total_amount.unwrap_or(worker.base_price);
    if total_amount < 0.0 {
        return Err(AppError::Validation(
            "total_amount must be non-negative".into(),
        ));
    }

    // Pre-check before the insert; the partial unique index on
    // (worker_id, date, time_slot) catches the race.
    if queries::slot_taken(conn, &worker.id, &date, req.time_slot)? {
        return Err(AppError::Conflict(format!(
            "worker {} is already booked on {} at {}",
            worker.id, req.date, req.time_slot
        )));
    }

    let service = req
        .service
        .map(str::to_string)
        .unwrap_or_else(|| worker.service.as_str().to_string());

    let now = Utc::now().naive_utc();
    let booking = Booking {
        id: Uuid::new_v4().to_string(),
        user_id: user.id,
        worker_id: worker.id,
        service,
        date,
        time_slot: req.time_slot.to_string(),
        status: BookingStatus::Pending,
        total_amount,
        created_at: now,
        updated_at: now,
    };

    queries::create_booking(conn, &booking)
        .map_err(|e| AppError::from_query(e, "time slot is already booked"))?;

    tracing::info!(
        booking_id = %booking.id,
        worker_id = %booking.worker_id,
        "booking created"
    );
    Ok(booking)
}

pub fn get_booking(conn: &Connection, id: &str) -> Result<Booking, AppError> {
    queries::get_booking(conn, id)?.ok_or_else(|| AppError::NotFound(format!("booking {id}")))
}

/// The user's bookings joined with worker display fields, newest first.
pub fn list_for_user(conn: &Connection, user_id: &str) -> Result<Vec<BookingWithWorker>, AppError> {
    if queries::get_user(conn, user_id)?.is_none() {
        return Err(AppError::NotFound(format!("user {user_id}")));
    }
    Ok(queries::list_bookings_for_user(conn, user_id)?)
}

pub fn list_all(
    conn: &Connection,
    status_filter: Option<&str>,
    limit: i64,
) -> Result<Vec<BookingAdminView>, AppError> {
    if let Some(s) = status_filter {
        if BookingStatus::parse(s).is_none() {
            return Err(AppError::Validation(format!("invalid status filter: {s}")));
        }
    }
    Ok(queries::list_all_bookings(conn, status_filter, limit)?)
}

/// The single gate for status mutations. Rejects anything outside the
/// transition table, including a repeat of the current status.
pub fn update_status(
    conn: &Connection,
    booking_id: &str,
    new_status: BookingStatus,
    allow_confirmed_cancellation: bool,
) -> Result<Booking, AppError> {
    let mut booking = get_booking(conn, booking_id)?;

    if !booking
        .status
        .can_transition_to(new_status, allow_confirmed_cancellation)
    {
        return Err(AppError::InvalidTransition(format!(
            "{} -> {}",
            booking.status.as_str(),
            new_status.as_str()
        )));
    }

    queries::update_booking_status(conn, booking_id, new_status)?;

    tracing::info!(
        booking_id = %booking.id,
        from = booking.status.as_str(),
        to = new_status.as_str(),
        "booking status changed"
    );

    booking.status = new_status;
    booking.updated_at = Utc::now().naive_utc();
    Ok(booking)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::models::{Role, ServiceCategory, User, Worker};

    fn setup_db() -> Connection {
        db::init_db(":memory:").unwrap()
    }

    fn seed_user(conn: &Connection, id: &str, email: &str) {
        let now = Utc::now().naive_utc();
        queries::create_user(
            conn,
            &User {
                id: id.to_string(),
                name: "Test Customer".to_string(),
                email: email.to_string(),
                phone: "+15551110000".to_string(),
                password_hash: "x".to_string(),
                role: Role::Customer,
                created_at: now,
                updated_at: now,
            },
        )
        .unwrap();
    }

    fn seed_worker(conn: &Connection, id: &str, phone: &str, base_price: f64) {
        let now = Utc::now().naive_utc();
        queries::create_worker(
            conn,
            &Worker {
                id: id.to_string(),
                name: "Test Plumber".to_string(),
                phone: phone.to_string(),
                email: None,
                service: ServiceCategory::Plumbing,
                base_price,
                rating: 4.5,
                review_count: 10,
                experience_years: 5,
                languages: vec!["en".to_string()],
                verified: true,
                distance_km: 2.0,
                available: true,
                image_url: None,
                created_at: now,
                updated_at: now,
            },
        )
        .unwrap();
    }

    fn new_booking<'a>(user_id: &'a str, worker_id: &'a str, slot: &'a str) -> NewBooking<'a> {
        NewBooking {
            user_id,
            worker_id,
            service: None,
            date: "2025-01-01",
            time_slot: slot,
            total_amount: Some(500.0),
        }
    }

    #[test]
    fn test_create_booking_starts_pending() {
        let conn = setup_db();
        seed_user(&conn, "u1", "u1@example.com");
        seed_worker(&conn, "w1", "+15552220000", 500.0);

        let booking = create_booking(&conn, new_booking("u1", "w1", "10:00")).unwrap();
        assert_eq!(booking.status, BookingStatus::Pending);
        assert_eq!(booking.total_amount, 500.0);
        assert_eq!(booking.service, "plumbing");

        let stored = get_booking(&conn, &booking.id).unwrap();
        assert_eq!(stored.status, BookingStatus::Pending);
        assert_eq!(stored.total_amount, 500.0);
    }

    #[test]
    fn test_amount_defaults_to_base_price() {
        let conn = setup_db();
        seed_user(&conn, "u1", "u1@example.com");
        seed_worker(&conn, "w1", "+15552220000", 750.0);

        let mut req = new_booking("u1", "w1", "10:00");
        req.total_amount = None;
        let booking = create_booking(&conn, req).unwrap();
        assert_eq!(booking.total_amount, 750.0);
    }

    #[test]
    fn test_unknown_user_rejected() {
        let conn = setup_db();
        seed_worker(&conn, "w1", "+15552220000", 500.0);

        let err = create_booking(&conn, new_booking("ghost", "w1", "10:00")).unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[test]
    fn test_unknown_worker_rejected() {
        let conn = setup_db();
        seed_user(&conn, "u1", "u1@example.com");

        let err = create_booking(&conn, new_booking("u1", "ghost", "10:00")).unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[test]
    fn test_negative_amount_rejected() {
        let conn = setup_db();
        seed_user(&conn, "u1", "u1@example.com");
        seed_worker(&conn, "w1", "+15552220000", 500.0);

        let mut req = new_booking("u1", "w1", "10:00");
        req.total_amount = Some(-1.0);
        let err = create_booking(&conn, req).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn test_bad_date_rejected() {
        let conn = setup_db();
        seed_user(&conn, "u1", "u1@example.com");
        seed_worker(&conn, "w1", "+15552220000", 500.0);

        let mut req = new_booking("u1", "w1", "10:00");
        req.date = "not-a-date";
        let err = create_booking(&conn, req).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn test_double_booking_rejected() {
        let conn = setup_db();
        seed_user(&conn, "u1", "u1@example.com");
        seed_user(&conn, "u2", "u2@example.com");
        seed_worker(&conn, "w1", "+15552220000", 500.0);

        create_booking(&conn, new_booking("u1", "w1", "10:00")).unwrap();
        let err = create_booking(&conn, new_booking("u2", "w1", "10:00")).unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        // A different slot on the same day is fine.
        create_booking(&conn, new_booking("u2", "w1", "11:00")).unwrap();
    }

    #[test]
    fn test_cancelled_booking_frees_slot() {
        let conn = setup_db();
        seed_user(&conn, "u1", "u1@example.com");
        seed_user(&conn, "u2", "u2@example.com");
        seed_worker(&conn, "w1", "+15552220000", 500.0);

        let first = create_booking(&conn, new_booking("u1", "w1", "10:00")).unwrap();
        update_status(&conn, &first.id, BookingStatus::Cancelled, false).unwrap();

        create_booking(&conn, new_booking("u2", "w1", "10:00")).unwrap();
    }

    #[test]
    fn test_unavailable_worker_rejected() {
        let conn = setup_db();
        seed_user(&conn, "u1", "u1@example.com");
        seed_worker(&conn, "w1", "+15552220000", 500.0);
        conn.execute("UPDATE workers SET available = 0 WHERE id = 'w1'", [])
            .unwrap();

        let err = create_booking(&conn, new_booking("u1", "w1", "10:00")).unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[test]
    fn test_confirm_then_complete() {
        let conn = setup_db();
        seed_user(&conn, "u1", "u1@example.com");
        seed_worker(&conn, "w1", "+15552220000", 500.0);
        let booking = create_booking(&conn, new_booking("u1", "w1", "10:00")).unwrap();

        let confirmed = update_status(&conn, &booking.id, BookingStatus::Confirmed, false).unwrap();
        assert_eq!(confirmed.status, BookingStatus::Confirmed);

        let completed = update_status(&conn, &booking.id, BookingStatus::Completed, false).unwrap();
        assert_eq!(completed.status, BookingStatus::Completed);
    }

    #[test]
    fn test_complete_from_pending_rejected() {
        let conn = setup_db();
        seed_user(&conn, "u1", "u1@example.com");
        seed_worker(&conn, "w1", "+15552220000", 500.0);
        let booking = create_booking(&conn, new_booking("u1", "w1", "10:00")).unwrap();

        let err =
            update_status(&conn, &booking.id, BookingStatus::Completed, false).unwrap_err();
        assert!(matches!(err, AppError::InvalidTransition(_)));

        // Status must be untouched.
        let stored = get_booking(&conn, &booking.id).unwrap();
        assert_eq!(stored.status, BookingStatus::Pending);
    }

    #[test]
    fn test_same_status_rejected() {
        let conn = setup_db();
        seed_user(&conn, "u1", "u1@example.com");
        seed_worker(&conn, "w1", "+15552220000", 500.0);
        let booking = create_booking(&conn, new_booking("u1", "w1", "10:00")).unwrap();

        let err = update_status(&conn, &booking.id, BookingStatus::Pending, false).unwrap_err();
        assert!(matches!(err, AppError::InvalidTransition(_)));
    }

    #[test]
    fn test_terminal_states_closed() {
        let conn = setup_db();
        seed_user(&conn, "u1", "u1@example.com");
        seed_worker(&conn, "w1", "+15552220000", 500.0);
        let booking = create_booking(&conn, new_booking("u1", "w1", "10:00")).unwrap();
        update_status(&conn, &booking.id, BookingStatus::Cancelled, false).unwrap();

        let err = update_status(&conn, &booking.id, BookingStatus::Confirmed, true).unwrap_err();
        assert!(matches!(err, AppError::InvalidTransition(_)));
    }

    #[test]
    fn test_confirmed_cancel_gated_by_config() {
        let conn = setup_db();
        seed_user(&conn, "u1", "u1@example.com");
        seed_worker(&conn, "w1", "+15552220000", 500.0);
        let booking = create_booking(&conn, new_booking("u1", "w1", "10:00")).unwrap();
        update_status(&conn, &booking.id, BookingStatus::Confirmed, false).unwrap();

        let err =
            update_status(&conn, &booking.id, BookingStatus::Cancelled, false).unwrap_err();
        assert!(matches!(err, AppError::InvalidTransition(_)));

        let cancelled = update_status(&conn, &booking.id, BookingStatus::Cancelled, true).unwrap();
        assert_eq!(cancelled.status, BookingStatus::Cancelled);
    }

    #[test]
    fn test_update_status_unknown_booking() {
        let conn = setup_db();
        let err = update_status(&conn, "ghost", BookingStatus::Confirmed, false).unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[test]
    fn test_list_for_user_joins_worker_fields() {
        let conn = setup_db();
        seed_user(&conn, "u1", "u1@example.com");
        seed_worker(&conn, "w1", "+15552220000", 500.0);
        let booking = create_booking(&conn, new_booking("u1", "w1", "10:00")).unwrap();

        let listed = list_for_user(&conn, "u1").unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, booking.id);
        assert_eq!(listed[0].worker_name, "Test Plumber");
        assert_eq!(listed[0].status, BookingStatus::Pending);
        assert_eq!(listed[0].total_amount, 500.0);
        assert_eq!(listed[0].date, "2025-01-01");
    }

    #[test]
    fn test_list_for_unknown_user_rejected() {
        let conn = setup_db();
        let err = list_for_user(&conn, "ghost").unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[test]
    fn test_list_all_with_filter() {
        let conn = setup_db();
        seed_user(&conn, "u1", "u1@example.com");
        seed_worker(&conn, "w1", "+15552220000", 500.0);
        let b1 = create_booking(&conn, new_booking("u1", "w1", "10:00")).unwrap();
        create_booking(&conn, new_booking("u1", "w1", "11:00")).unwrap();
        update_status(&conn, &b1.id, BookingStatus::Confirmed, false).unwrap();

        let all = list_all(&conn, None, 50).unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].user_name, "Test Customer");

        let confirmed = list_all(&conn, Some("confirmed"), 50).unwrap();
        assert_eq!(confirmed.len(), 1);
        assert_eq!(confirmed[0].id, b1.id);

        let err = list_all(&conn, Some("bogus"), 50).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
