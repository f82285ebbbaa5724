use chrono::Utc;
use rusqlite::Connection;
use uuid::Uuid;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{ServiceCategory, Worker};

const DEFAULT_PAGE_SIZE: i64 = 50;
const MAX_PAGE_SIZE: i64 = 100;

pub struct NewWorker<'a> {
    pub name: &'a str,
    pub phone: &'a str,
    pub email: Option<&'a str>,
    pub service: &'a str,
    pub base_price: f64,
    pub experience_years: i32,
    pub languages: Vec<String>,
    pub distance_km: f64,
    pub image_url: Option<&'a str>,
}

#[derive(Default)]
pub struct WorkerPatch {
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

pub fn create_worker(conn: &Connection, req: NewWorker) -> Result<Worker, AppError> {
    if req.name.trim().is_empty() {
        return Err(AppError::Validation("name must not be empty".into()));
    }
    if req.phone.trim().is_empty() {
        return Err(AppError::Validation("phone must not be empty".into()));
    }
    let service = ServiceCategory::parse(req.service)
        .ok_or_else(|| AppError::Validation(format!("unknown service category: {}", req.service)))?;
    if req.base_price < 0.0 {
        return Err(AppError::Validation("base_price must be non-negative".into()));
    }
    if req.experience_years < 0 {
        return Err(AppError::Validation(
            "experience_years must be non-negative".into(),
        ));
    }
    if req.distance_km < 0.0 {
        return Err(AppError::Validation("distance_km must be non-negative".into()));
    }

    let now = Utc::now().naive_utc();
    let worker = Worker {
        id: Uuid::new_v4().to_string(),
        name: req.name.to_string(),
        phone: req.phone.to_string(),
        email: req.email.map(str::to_string),
        service,
        base_price: req.base_price,
        rating: 0.0,
        review_count: 0,
        experience_years: req.experience_years,
        languages: req.languages,
        verified: false,
        distance_km: req.distance_km,
        available: true,
        image_url: req.image_url.map(str::to_string),
        created_at: now,
        updated_at: now,
    };

    queries::create_worker(conn, &worker)
        .map_err(|e| AppError::from_query(e, "phone or email already registered"))?;

    tracing::info!(worker_id = %worker.id, service = worker.service.as_str(), "worker created");
    Ok(worker)
}

pub fn list_workers(
    conn: &Connection,
    service: Option<&str>,
    limit: Option<i64>,
    offset: Option<i64>,
) -> Result<Vec<Worker>, AppError> {
    if let Some(s) = service {
        if ServiceCategory::parse(s).is_none() {
            return Err(AppError::Validation(format!("unknown service category: {s}")));
        }
    }
    let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
    let offset = offset.unwrap_or(0).max(0);

    Ok(queries::list_workers(conn, service, limit, offset)?)
}

pub fn get_worker(conn: &Connection, id: &str) -> Result<Worker, AppError> {
    queries::get_worker(conn, id)?.ok_or_else(|| AppError::NotFound(format!("worker {id}")))
}

/// Profile edit. Field-level validation only; no lifecycle rules here.
pub fn update_worker(conn: &Connection, id: &str, patch: WorkerPatch) -> Result<Worker, AppError> {
    let mut worker = get_worker(conn, id)?;

    if let Some(name) = patch.name {
        if name.trim().is_empty() {
            return Err(AppError::Validation("name must not be empty".into()));
        }
        worker.name = name;
    }
    if let Some(phone) = patch.phone {
        if phone.trim().is_empty() {
            return Err(AppError::Validation("phone must not be empty".into()));
        }
        worker.phone = phone;
    }
    if let Some(email) = patch.email {
        worker.email = Some(email);
    }
    if let Some(service) = patch.service {
        worker.service = ServiceCategory::parse(&service)
            .ok_or_else(|| AppError::Validation(format!("unknown service category: {service}")))?;
    }
    if let Some(base_price) = patch.base_price {
        if base_price < 0.0 {
            return Err(AppError::Validation("base_price must be non-negative".into()));
        }
        worker.base_price = base_price;
    }
    if let Some(rating) = patch.rating {
        if !(0.0..=5.0).contains(&rating) {
            return Err(AppError::Validation("rating must be within 0..5".into()));
        }
        worker.rating = rating;
    }
    if let Some(review_count) = patch.review_count {
        if review_count < 0 {
            return Err(AppError::Validation(
                "review_count must be non-negative".into(),
            ));
        }
        worker.review_count = review_count;
    }
    if let Some(experience_years) = patch.experience_years {
        if experience_years < 0 {
            return Err(AppError::Validation(
                "experience_years must be non-negative".into(),
            ));
        }
        worker.experience_years = experience_years;
    }
    if let Some(languages) = patch.languages {
        worker.languages = languages;
    }
    if let Some(verified) = patch.verified {
        worker.verified = verified;
    }
    if let Some(distance_km) = patch.distance_km {
        if distance_km < 0.0 {
            return Err(AppError::Validation("distance_km must be non-negative".into()));
        }
        worker.distance_km = distance_km;
    }
    if let Some(available) = patch.available {
        worker.available = available;
    }
    if let Some(image_url) = patch.image_url {
        worker.image_url = Some(image_url);
    }

    queries::update_worker(conn, &worker)
        .map_err(|e| AppError::from_query(e, "phone or email already registered"))?;
    Ok(worker)
}
