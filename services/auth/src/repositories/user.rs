//! User repository for database operations

use anyhow::Result;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString};
use sqlx::{PgPool, Row, postgres::PgRow};
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::models::{NewUser, Role, User};

const USER_COLUMNS: &str = "id, username, email, phone, first_name, last_name, role, status, \
     profile_picture, password_hash, email_verified, last_login_at, created_at, updated_at";

/// Errors raised while creating a user
#[derive(Debug, Error)]
pub enum CreateUserError {
    /// A unique column (email, username or phone) is already taken
    #[error("A user with this {0} already exists.")]
    Duplicate(&'static str),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<sqlx::Error> for CreateUserError {
    fn from(err: sqlx::Error) -> Self {
        if let Some(db_err) = err.as_database_error() {
            if db_err.is_unique_violation() {
                let field = match db_err.constraint() {
                    Some(c) if c.contains("username") => "username",
                    Some(c) if c.contains("phone") => "phone",
                    _ => "email",
                };
                return CreateUserError::Duplicate(field);
            }
        }
        CreateUserError::Other(err.into())
    }
}

/// Hash a plain text password with argon2 and a fresh salt
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut rand::thread_rng());
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {}", e))?
        .to_string();
    Ok(hash)
}

/// Verify a plain text password against a stored hash
pub fn verify_password(user: &User, password: &str) -> Result<bool> {
    let parsed_hash = PasswordHash::new(&user.password_hash)
        .map_err(|e| anyhow::anyhow!("Failed to parse password hash: {}", e))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

fn user_from_row(row: &PgRow) -> Result<User> {
    let role: String = row.try_get("role")?;
    let status: String = row.try_get("status")?;

    Ok(User {
        id: row.try_get("id")?,
        username: row.try_get("username")?,
        email: row.try_get("email")?,
        phone: row.try_get("phone")?,
        first_name: row.try_get("first_name")?,
        last_name: row.try_get("last_name")?,
        role: role.parse()?,
        status: status.parse()?,
        profile_picture: row.try_get("profile_picture")?,
        password_hash: row.try_get("password_hash")?,
        email_verified: row.try_get("email_verified")?,
        last_login_at: row.try_get("last_login_at")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

/// User repository
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    /// Create a new user repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a new user together with the profile its role requires
    ///
    /// Both rows are written in one transaction: a client always has a
    /// client profile and a stylist always has a stylist profile.
    pub async fn create(&self, new_user: &NewUser) -> Result<User, CreateUserError> {
        info!("Creating new {} user: {}", new_user.role, new_user.username);

        let password_hash = hash_password(&new_user.password)?;

        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(&format!(
            r#"
            INSERT INTO users (id, username, email, phone, profile_picture, role, password_hash)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(&new_user.username)
        .bind(&new_user.email)
        .bind(&new_user.phone)
        .bind(&new_user.profile_picture)
        .bind(new_user.role.as_str())
        .bind(&password_hash)
        .fetch_one(&mut *tx)
        .await?;

        let user = user_from_row(&row)?;

        match user.role {
            Role::Client => {
                sqlx::query("INSERT INTO client_profiles (user_id) VALUES ($1)")
                    .bind(user.id)
                    .execute(&mut *tx)
                    .await?;
            }
            Role::Stylist => {
                sqlx::query("INSERT INTO stylist_profiles (user_id) VALUES ($1)")
                    .bind(user.id)
                    .execute(&mut *tx)
                    .await?;
            }
            Role::Admin => {}
        }

        tx.commit().await?;

        info!("Created user {} with {} profile", user.id, user.role);
        Ok(user)
    }

    /// Find a user by email (the login key)
    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let row = sqlx::query(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(user_from_row).transpose()
    }

    /// Find a user by ID
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(user_from_row).transpose()
    }

    /// Replace a user's password
    pub async fn update_password(&self, id: Uuid, new_password: &str) -> Result<()> {
        info!("Updating password for user: {}", id);

        let password_hash = hash_password(new_password)?;
        sqlx::query("UPDATE users SET password_hash = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(&password_hash)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Record a successful sign-in
    pub async fn touch_last_login(&self, id: Uuid) -> Result<()> {
        sqlx::query("UPDATE users SET last_login_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserStatus;
    use chrono::Utc;
    use common::database::{DatabaseConfig, init_pool, run_migrations};

    fn user_with_password(password: &str) -> User {
        User {
            id: Uuid::new_v4(),
            username: "jane".to_string(),
            email: "jane@example.com".to_string(),
            phone: None,
            first_name: None,
            last_name: None,
            role: Role::Client,
            status: UserStatus::Active,
            profile_picture: None,
            password_hash: hash_password(password).unwrap(),
            email_verified: false,
            last_login_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_hash_and_verify() {
        let user = user_with_password("Velvet-Orchid-7");
        assert!(verify_password(&user, "Velvet-Orchid-7").unwrap());
        assert!(!verify_password(&user, "velvet-orchid-7").unwrap());
    }

    #[test]
    fn test_hashes_are_salted() {
        assert_ne!(
            hash_password("same-password").unwrap(),
            hash_password("same-password").unwrap()
        );
    }

    #[test]
    fn test_verify_rejects_corrupt_hash() {
        let mut user = user_with_password("whatever1");
        user.password_hash = "not-a-phc-string".to_string();
        assert!(verify_password(&user, "whatever1").is_err());
    }

    async fn migrated_pool() -> Result<PgPool, Box<dyn std::error::Error>> {
        let config = DatabaseConfig::from_env()?;
        let pool = init_pool(&config).await?;
        run_migrations(&pool).await?;
        Ok(pool)
    }

    fn new_user(role: Role, tag: &str) -> NewUser {
        NewUser {
            username: format!("user_{tag}"),
            email: format!("{tag}@example.com"),
            password: "Velvet-Orchid-7".to_string(),
            phone: None,
            profile_picture: None,
            role,
        }
    }

    async fn profile_rows(
        pool: &PgPool,
        table: &str,
        email: &str,
    ) -> Result<i64, Box<dyn std::error::Error>> {
        let row = sqlx::query(&format!(
            "SELECT COUNT(*) AS n FROM {table} p JOIN users u ON u.id = p.user_id \
             WHERE u.email = $1"
        ))
        .bind(email)
        .fetch_one(pool)
        .await?;
        Ok(row.try_get("n")?)
    }

    #[tokio::test]
    #[ignore = "requires a running PostgreSQL"]
    async fn test_create_writes_one_profile_per_role() -> Result<(), Box<dyn std::error::Error>> {
        let pool = migrated_pool().await?;
        let repository = UserRepository::new(pool.clone());

        for (role, own, other) in [
            (Role::Client, "client_profiles", "stylist_profiles"),
            (Role::Stylist, "stylist_profiles", "client_profiles"),
        ] {
            let tag = Uuid::new_v4().simple().to_string();
            let user = repository.create(&new_user(role, &tag)).await?;
            assert_eq!(user.role, role);
            assert_eq!(profile_rows(&pool, own, &user.email).await?, 1);
            assert_eq!(profile_rows(&pool, other, &user.email).await?, 0);
        }

        Ok(())
    }

    #[tokio::test]
    #[ignore = "requires a running PostgreSQL"]
    async fn test_duplicate_email_leaves_no_profile_behind() -> Result<(), Box<dyn std::error::Error>>
    {
        let pool = migrated_pool().await?;
        let repository = UserRepository::new(pool.clone());

        let tag = Uuid::new_v4().simple().to_string();
        let first = repository.create(&new_user(Role::Client, &tag)).await?;

        let mut again = new_user(Role::Stylist, &tag);
        again.username = format!("other_{tag}");
        let result = repository.create(&again).await;
        assert!(matches!(result, Err(CreateUserError::Duplicate("email"))));

        let row = sqlx::query("SELECT COUNT(*) AS n FROM users WHERE email = $1")
            .bind(&first.email)
            .fetch_one(&pool)
            .await?;
        assert_eq!(row.try_get::<i64, _>("n")?, 1);
        assert_eq!(profile_rows(&pool, "client_profiles", &first.email).await?, 1);
        assert_eq!(profile_rows(&pool, "stylist_profiles", &first.email).await?, 0);

        Ok(())
    }
}
