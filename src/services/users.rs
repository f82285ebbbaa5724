use anyhow::anyhow;
use chrono::Utc;
use rusqlite::Connection;
use uuid::Uuid;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{Role, User};

const MIN_PASSWORD_LEN: usize = 8;

pub struct NewUser<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub phone: &'a str,
    pub password: &'a str,
    pub role: Option<&'a str>,
}

/// Registration. The credential is stored bcrypt-hashed; token issuance is
/// someone else's problem.
pub fn register(conn: &Connection, req: NewUser) -> Result<User, AppError> {
    if req.name.trim().is_empty() {
        return Err(AppError::Validation("name must not be empty".into()));
    }
    if !req.email.contains('@') {
        return Err(AppError::Validation(format!("invalid email: {}", req.email)));
    }
    if req.password.len() < MIN_PASSWORD_LEN {
        return Err(AppError::Validation(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    let role = match req.role {
        Some(r) => {
            Role::parse(r).ok_or_else(|| AppError::Validation(format!("unknown role: {r}")))?
        }
        None => Role::Customer,
    };

    let password_hash = bcrypt::hash(req.password, bcrypt::DEFAULT_COST)
        .map_err(|e| AppError::Internal(anyhow!("failed to hash password: {e}")))?;

    let now = Utc::now().naive_utc();
    let user = User {
        id: Uuid::new_v4().to_string(),
        name: req.name.to_string(),
        email: req.email.to_string(),
        phone: req.phone.to_string(),
        password_hash,
        role,
        created_at: now,
        updated_at: now,
    };

    queries::create_user(conn, &user)
        .map_err(|e| AppError::from_query(e, "email already registered"))?;

    tracing::info!(user_id = %user.id, "user registered");
    Ok(user)
}

pub fn get_user(conn: &Connection, id: &str) -> Result<User, AppError> {
    queries::get_user(conn, id)?.ok_or_else(|| AppError::NotFound(format!("user {id}")))
}

pub fn update_profile(
    conn: &Connection,
    id: &str,
    name: Option<&str>,
    phone: Option<&str>,
) -> Result<User, AppError> {
    if let Some(n) = name {
        if n.trim().is_empty() {
            return Err(AppError::Validation("name must not be empty".into()));
        }
    }

    if !queries::update_user_profile(conn, id, name, phone)? {
        return Err(AppError::NotFound(format!("user {id}")));
    }
    get_user(conn, id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    fn setup_db() -> Connection {
        db::init_db(":memory:").unwrap()
    }

    fn alice<'a>() -> NewUser<'a> {
        NewUser {
            name: "Alice",
            email: "alice@example.com",
            phone: "+15551110000",
            password: "correct horse",
            role: None,
        }
    }

    #[test]
    fn test_register_defaults_to_customer() {
        let conn = setup_db();
        let user = register(&conn, alice()).unwrap();
        assert_eq!(user.role, Role::Customer);
        assert_ne!(user.password_hash, "correct horse");

        let fetched = get_user(&conn, &user.id).unwrap();
        assert_eq!(fetched.email, "alice@example.com");
    }

    #[test]
    fn test_register_admin_role() {
        let conn = setup_db();
        let mut req = alice();
        req.role = Some("admin");
        let user = register(&conn, req).unwrap();
        assert_eq!(user.role, Role::Admin);
    }

    #[test]
    fn test_duplicate_email_conflict() {
        let conn = setup_db();
        register(&conn, alice()).unwrap();

        let mut req = alice();
        req.phone = "+15551110001";
        let err = register(&conn, req).unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[test]
    fn test_invalid_email_rejected() {
        let conn = setup_db();
        let mut req = alice();
        req.email = "not-an-email";
        let err = register(&conn, req).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn test_short_password_rejected() {
        let conn = setup_db();
        let mut req = alice();
        req.password = "short";
        let err = register(&conn, req).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn test_update_profile() {
        let conn = setup_db();
        let user = register(&conn, alice()).unwrap();

        let updated = update_profile(&conn, &user.id, Some("Alice B"), None).unwrap();
        assert_eq!(updated.name, "Alice B");
        assert_eq!(updated.phone, "+15551110000");

        let err = update_profile(&conn, "ghost", Some("Nobody"), None).unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
