use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Worker {
    pub id: String,
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub service: ServiceCategory,
    pub base_price: f64,
    pub rating: f64,
    pub review_count: i64,
    pub experience_years: i32,
    pub languages: Vec<String>,
    pub verified: bool,
    pub distance_km: f64,
    pub available: bool,
    pub image_url: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ServiceCategory {
    Plumbing,
    Electrical,
    Cleaning,
    Carpentry,
    Painting,
    ApplianceRepair,
}

impl ServiceCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceCategory::Plumbing => "plumbing",
            ServiceCategory::Electrical => "electrical",
            ServiceCategory::Cleaning => "cleaning",
            ServiceCategory::Carpentry => "carpentry",
            ServiceCategory::Painting => "painting",
            ServiceCategory::ApplianceRepair => "appliance_repair",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "plumbing" => Some(ServiceCategory::Plumbing),
            "electrical" => Some(ServiceCategory::Electrical),
            "cleaning" => Some(ServiceCategory::Cleaning),
            "carpentry" => Some(ServiceCategory::Carpentry),
            "painting" => Some(ServiceCategory::Painting),
            "appliance_repair" => Some(ServiceCategory::ApplianceRepair),
            _ => None,
        }
    }
}
