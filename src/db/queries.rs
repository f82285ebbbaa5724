use anyhow::Context;
use chrono::{NaiveDate, NaiveDateTime, Utc};
use rusqlite::{params, Connection};
use serde::Serialize;

use crate::models::{Booking, BookingStatus, Role, ServiceCategory, User, Worker};

const TS_FMT: &str = "%Y-%m-%d %H:%M:%S";
const DATE_FMT: &str = "%Y-%m-%d";

// ── Users ──

pub fn create_user(conn: &Connection, user: &User) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO users (id, name, email, phone, password_hash, role, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            user.id,
            user.name,
            user.email,
            user.phone,
            user.password_hash,
            user.role.as_str(),
            user.created_at.format(TS_FMT).to_string(),
            user.updated_at.format(TS_FMT).to_string(),
        ],
    )?;
    Ok(())
}

pub fn get_user(conn: &Connection, id: &str) -> anyhow::Result<Option<User>> {
    let result = conn.query_row(
        "SELECT id, name, email, phone, password_hash, role, created_at, updated_at
         FROM users WHERE id = ?1",
        params![id],
        |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, String>(5)?,
                row.get::<_, String>(6)?,
                row.get::<_, String>(7)?,
            ))
        },
    );

    match result {
        Ok((id, name, email, phone, password_hash, role_str, created_at, updated_at)) => {
            let role = Role::parse(&role_str)
                .with_context(|| format!("unknown role in users row: {role_str}"))?;
            Ok(Some(User {
                id,
                name,
                email,
                phone,
                password_hash,
                role,
                created_at: parse_ts(&created_at),
                updated_at: parse_ts(&updated_at),
            }))
        }
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn update_user_profile(
    conn: &Connection,
    id: &str,
    name: Option<&str>,
    phone: Option<&str>,
) -> anyhow::Result<bool> {
    let now = Utc::now().naive_utc().format(TS_FMT).to_string();
    let count = conn.execute(
        "UPDATE users SET
           name = COALESCE(?1, name),
           phone = COALESCE(?2, phone),
           updated_at = ?3
         WHERE id = ?4",
        params![name, phone, now, id],
    )?;
    Ok(count > 0)
}

// ── Workers ──

pub fn create_worker(conn: &Connection, worker: &Worker) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO workers (id, name, phone, email, service, base_price, rating, review_count,
                              experience_years, languages, verified, distance_km, available,
                              image_url, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)",
        params![
            worker.id,
            worker.name,
            worker.phone,
            worker.email,
            worker.service.as_str(),
            worker.base_price,
            worker.rating,
            worker.review_count,
            worker.experience_years,
            serde_json::to_string(&worker.languages)?,
            worker.verified as i32,
            worker.distance_km,
            worker.available as i32,
            worker.image_url,
            worker.created_at.format(TS_FMT).to_string(),
            worker.updated_at.format(TS_FMT).to_string(),
        ],
    )?;
    Ok(())
}

pub fn get_worker(conn: &Connection, id: &str) -> anyhow::Result<Option<Worker>> {
    let result = conn.query_row(
        &format!("{WORKER_SELECT} WHERE id = ?1"),
        params![id],
        |row| Ok(parse_worker_row(row)),
    );

    match result {
        Ok(worker) => Ok(Some(worker?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn list_workers(
    conn: &Connection,
    service: Option<&str>,
    limit: i64,
    offset: i64,
) -> anyhow::Result<Vec<Worker>> {
    let (sql, params_vec): (String, Vec<Box<dyn rusqlite::types::ToSql>>) = match service {
        Some(category) => (
            format!("{WORKER_SELECT} WHERE service = ?1 ORDER BY rating DESC, name ASC LIMIT ?2 OFFSET ?3"),
            vec![
                Box::new(category.to_string()) as Box<dyn rusqlite::types::ToSql>,
                Box::new(limit),
                Box::new(offset),
            ],
        ),
        None => (
            format!("{WORKER_SELECT} ORDER BY rating DESC, name ASC LIMIT ?1 OFFSET ?2"),
            vec![
                Box::new(limit) as Box<dyn rusqlite::types::ToSql>,
                Box::new(offset),
            ],
        ),
    };

    let mut stmt = conn.prepare(&sql)?;
    let params_refs: Vec<&dyn rusqlite::types::ToSql> =
        params_vec.iter().map(|p| p.as_ref()).collect();
    let rows = stmt.query_map(params_refs.as_slice(), |row| Ok(parse_worker_row(row)))?;

    let mut workers = vec![];
    for row in rows {
        workers.push(row??);
    }
    Ok(workers)
}

pub fn update_worker(conn: &Connection, worker: &Worker) -> anyhow::Result<bool> {
    let now = Utc::now().naive_utc().format(TS_FMT).to_string();
    let count = conn.execute(
        "UPDATE workers SET
           name = ?1, phone = ?2, email = ?3, service = ?4, base_price = ?5, rating = ?6,
           review_count = ?7, experience_years = ?8, languages = ?9, verified = ?10,
           distance_km = ?11, available = ?12, image_url = ?13, updated_at = ?14
         WHERE id = ?15",
        params![
            worker.name,
            worker.phone,
            worker.email,
            worker.service.as_str(),
            worker.base_price,
            worker.rating,
            worker.review_count,
            worker.experience_years,
            serde_json::to_string(&worker.languages)?,
            worker.verified as i32,
            worker.distance_km,
            worker.available as i32,
            worker.image_url,
            now,
            worker.id,
        ],
    )?;
    Ok(count > 0)
}

const WORKER_SELECT: &str = "SELECT id, name, phone, email, service, base_price, rating, review_count, \
     experience_years, languages, verified, distance_km, available, image_url, created_at, updated_at \
     FROM workers";

fn parse_worker_row(row: &rusqlite::Row) -> anyhow::Result<Worker> {
    let service_str: String = row.get(4)?;
    let languages_json: String = row.get(9)?;
    let created_at_str: String = row.get(14)?;
    let updated_at_str: String = row.get(15)?;

    Ok(Worker {
        id: row.get(0)?,
        name: row.get(1)?,
        phone: row.get(2)?,
        email: row.get(3)?,
        service: ServiceCategory::parse(&service_str)
            .with_context(|| format!("unknown service in workers row: {service_str}"))?,
        base_price: row.get(5)?,
        rating: row.get(6)?,
        review_count: row.get(7)?,
        experience_years: row.get(8)?,
        languages: serde_json::from_str(&languages_json).unwrap_or_default(),
        verified: row.get::<_, i32>(10)? != 0,
        distance_km: row.get(11)?,
        available: row.get::<_, i32>(12)? != 0,
        image_url: row.get(13)?,
        created_at: parse_ts(&created_at_str),
        updated_at: parse_ts(&updated_at_str),
    })
}

// ── Bookings ──

pub fn create_booking(conn: &Connection, booking: &Booking) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO bookings (id, user_id, worker_id, service, date, time_slot, status,
                               total_amount, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            booking.id,
            booking.user_id,
            booking.worker_id,
            booking.service,
            booking.date.format(DATE_FMT).to_string(),
            booking.time_slot,
            booking.status.as_str(),
            booking.total_amount,
            booking.created_at.format(TS_FMT).to_string(),
            booking.updated_at.format(TS_FMT).to_string(),
        ],
    )?;
    Ok(())
}

pub fn get_booking(conn: &Connection, id: &str) -> anyhow::Result<Option<Booking>> {
    let result = conn.query_row(
        "SELECT id, user_id, worker_id, service, date, time_slot, status, total_amount, created_at, updated_at
         FROM bookings WHERE id = ?1",
        params![id],
        |row| Ok(parse_booking_row(row)),
    );

    match result {
        Ok(booking) => Ok(Some(booking?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Holds for any non-cancelled booking occupying the worker's slot.
pub fn slot_taken(
    conn: &Connection,
    worker_id: &str,
    date: &NaiveDate,
    time_slot: &str,
) -> anyhow::Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM bookings
         WHERE worker_id = ?1 AND date = ?2 AND time_slot = ?3 AND status != 'cancelled'",
        params![worker_id, date.format(DATE_FMT).to_string(), time_slot],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

pub fn update_booking_status(
    conn: &Connection,
    id: &str,
    status: BookingStatus,
) -> anyhow::Result<bool> {
    let now = Utc::now().naive_utc().format(TS_FMT).to_string();
    let count = conn.execute(
        "UPDATE bookings SET status = ?1, updated_at = ?2 WHERE id = ?3",
        params![status.as_str(), now, id],
    )?;
    Ok(count > 0)
}

/// Read model for a customer's booking list: the booking plus the worker
/// display fields the UI renders, joined at read time.
#[derive(Debug, Serialize)]
pub struct BookingWithWorker {
    pub id: String,
    pub worker_id: String,
    pub worker_name: String,
    pub worker_phone: String,
    pub worker_image_url: Option<String>,
    pub service: String,
    pub date: String,
    pub time_slot: String,
    pub status: BookingStatus,
    pub total_amount: f64,
    pub created_at: String,
    pub updated_at: String,
}

pub fn list_bookings_for_user(
    conn: &Connection,
    user_id: &str,
) -> anyhow::Result<Vec<BookingWithWorker>> {
    let mut stmt = conn.prepare(
        "SELECT b.id, b.worker_id, w.name, w.phone, w.image_url, b.service, b.date, b.time_slot,
                b.status, b.total_amount, b.created_at, b.updated_at
         FROM bookings b
         INNER JOIN workers w ON w.id = b.worker_id
         WHERE b.user_id = ?1
         ORDER BY b.created_at DESC, b.id DESC",
    )?;

    let rows = stmt.query_map(params![user_id], |row| {
        Ok(parse_booking_with_worker_row(row))
    })?;

    let mut bookings = vec![];
    for row in rows {
        bookings.push(row??);
    }
    Ok(bookings)
}

fn parse_booking_with_worker_row(row: &rusqlite::Row) -> anyhow::Result<BookingWithWorker> {
    let status_str: String = row.get(8)?;

    Ok(BookingWithWorker {
        id: row.get(0)?,
        worker_id: row.get(1)?,
        worker_name: row.get(2)?,
        worker_phone: row.get(3)?,
        worker_image_url: row.get(4)?,
        service: row.get(5)?,
        date: row.get(6)?,
        time_slot: row.get(7)?,
        status: BookingStatus::parse(&status_str)
            .with_context(|| format!("unknown status in bookings row: {status_str}"))?,
        total_amount: row.get(9)?,
        created_at: row.get(10)?,
        updated_at: row.get(11)?,
    })
}

/// Admin read model: booking joined with both customer and worker display
/// fields.
#[derive(Debug, Serialize)]
pub struct BookingAdminView {
    pub id: String,
    pub user_id: String,
    pub user_name: String,
    pub user_email: String,
    pub worker_id: String,
    pub worker_name: String,
    pub service: String,
    pub date: String,
    pub time_slot: String,
    pub status: BookingStatus,
    pub total_amount: f64,
    pub created_at: String,
    pub updated_at: String,
}

pub fn list_all_bookings(
    conn: &Connection,
    status_filter: Option<&str>,
    limit: i64,
) -> anyhow::Result<Vec<BookingAdminView>> {
    const BASE: &str = "SELECT b.id, b.user_id, u.name, u.email, b.worker_id, w.name, b.service, \
         b.date, b.time_slot, b.status, b.total_amount, b.created_at, b.updated_at \
         FROM bookings b \
         INNER JOIN users u ON u.id = b.user_id \
         INNER JOIN workers w ON w.id = b.worker_id";

    let (sql, params_vec): (String, Vec<Box<dyn rusqlite::types::ToSql>>) = match status_filter {
        Some(status) => (
            format!("{BASE} WHERE b.status = ?1 ORDER BY b.created_at DESC, b.id DESC LIMIT ?2"),
            vec![
                Box::new(status.to_string()) as Box<dyn rusqlite::types::ToSql>,
                Box::new(limit),
            ],
        ),
        None => (
            format!("{BASE} ORDER BY b.created_at DESC, b.id DESC LIMIT ?1"),
            vec![Box::new(limit) as Box<dyn rusqlite::types::ToSql>],
        ),
    };

    let mut stmt = conn.prepare(&sql)?;
    let params_refs: Vec<&dyn rusqlite::types::ToSql> =
        params_vec.iter().map(|p| p.as_ref()).collect();
    let rows = stmt.query_map(params_refs.as_slice(), |row| {
        Ok(parse_booking_admin_row(row))
    })?;

    let mut bookings = vec![];
    for row in rows {
        bookings.push(row??);
    }
    Ok(bookings)
}

fn parse_booking_admin_row(row: &rusqlite::Row) -> anyhow::Result<BookingAdminView> {
    let status_str: String = row.get(9)?;

    Ok(BookingAdminView {
        id: row.get(0)?,
        user_id: row.get(1)?,
        user_name: row.get(2)?,
        user_email: row.get(3)?,
        worker_id: row.get(4)?,
        worker_name: row.get(5)?,
        service: row.get(6)?,
        date: row.get(7)?,
        time_slot: row.get(8)?,
        status: BookingStatus::parse(&status_str)
            .with_context(|| format!("unknown status in bookings row: {status_str}"))?,
        total_amount: row.get(10)?,
        created_at: row.get(11)?,
        updated_at: row.get(12)?,
    })
}

fn parse_booking_row(row: &rusqlite::Row) -> anyhow::Result<Booking> {
    let date_str: String = row.get(4)?;
    let status_str: String = row.get(6)?;
    let created_at_str: String = row.get(8)?;
    let updated_at_str: String = row.get(9)?;

    Ok(Booking {
        id: row.get(0)?,
        user_id: row.get(1)?,
        worker_id: row.get(2)?,
        service: row.get(3)?,
        date: NaiveDate::parse_from_str(&date_str, DATE_FMT)
            .with_context(|| format!("bad date in bookings row: {date_str}"))?,
        time_slot: row.get(5)?,
        status: BookingStatus::parse(&status_str)
            .with_context(|| format!("unknown status in bookings row: {status_str}"))?,
        total_amount: row.get(7)?,
        created_at: parse_ts(&created_at_str),
        updated_at: parse_ts(&updated_at_str),
    })
}

fn parse_ts(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, TS_FMT).unwrap_or_else(|_| Utc::now().naive_utc())
}
