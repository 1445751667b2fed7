use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    // Найти пользователя по email
    pub async fn find_by_email(email: &str, pool: &sqlx::PgPool) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            "SELECT id, email, name, password_hash, created_at FROM users WHERE email = $1"
        )
        .bind(email)
        .fetch_optional(pool)
        .await
    }

    pub fn verify_password(&self, password: &str) -> bool {
        bcrypt::verify(password, &self.password_hash).unwrap_or(false)
    }
}

/// Тело `POST /api/auth/register`.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewUser {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(min = 8))]
    pub password: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_roundtrip_through_bcrypt() {
        let user = User {
            id: Uuid::new_v4(),
            email: "host@example.com".into(),
            name: "Host".into(),
            password_hash: bcrypt::hash("correct horse", 4).unwrap(),
            created_at: Utc::now(),
        };
        assert!(user.verify_password("correct horse"));
        assert!(!user.verify_password("battery staple"));

        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password_hash").is_none());
    }

    #[test]
    fn registration_rules() {
        let ok = NewUser { email: "a@b.io".into(), name: "A".into(), password: "12345678".into() };
        assert!(ok.validate().is_ok());

        let bad = NewUser { email: "nope".into(), name: "".into(), password: "short".into() };
        let errors = bad.validate().unwrap_err();
        assert_eq!(errors.field_errors().len(), 3);
    }
}
