//! Integration tests for the infrastructure components
//!
//! These tests verify that PostgreSQL (with the embedded migrations) and
//! Redis are properly configured and reachable. They need live servers, so
//! they only run with `--ignored`.

use common::{
    cache::{RedisConfig, RedisPool},
    database::{DatabaseConfig, health_check, init_pool, run_migrations},
    token::{Claims, TokenRevocation, TokenType, unix_now},
};
use sqlx::Row;
use uuid::Uuid;

#[tokio::test]
#[ignore = "requires PostgreSQL and Redis"]
async fn test_infrastructure_integration() -> Result<(), Box<dyn std::error::Error>> {
    let db_config = DatabaseConfig::from_env()?;
    let pool = init_pool(&db_config).await?;
    assert!(health_check(&pool).await?, "Database health check failed");

    run_migrations(&pool).await?;

    // Every table the services rely on must exist after migrating
    for table in [
        "users",
        "client_profiles",
        "stylist_profiles",
        "wardrobe_items",
    ] {
        let row = sqlx::query("SELECT to_regclass($1) IS NOT NULL AS present")
            .bind(format!("public.{}", table))
            .fetch_one(&pool)
            .await?;
        let present: bool = row.get("present");
        assert!(present, "missing table {}", table);
    }

    let redis_config = RedisConfig::from_env()?;
    let redis_pool = RedisPool::new(&redis_config).await?;
    assert!(
        redis_pool.health_check().await?,
        "Redis health check failed"
    );

    let test_key = "integration_test_key";
    redis_pool.set(test_key, "integration_test_value", Some(10)).await?;
    assert_eq!(
        redis_pool.get(test_key).await?,
        Some("integration_test_value".to_string())
    );
    redis_pool.delete(test_key).await?;
    assert_eq!(redis_pool.get(test_key).await?, None);

    Ok(())
}

fn claims_for(user_id: Uuid) -> Claims {
    let now = unix_now();
    Claims {
        sub: user_id,
        roles: vec!["client".to_string()],
        iat: now,
        exp: now + 60,
        jti: Uuid::new_v4(),
        token_type: TokenType::Access,
    }
}

#[tokio::test]
#[ignore = "requires Redis"]
async fn test_revoke_all_covers_same_second_tokens() -> Result<(), Box<dyn std::error::Error>> {
    let redis_pool = RedisPool::new(&RedisConfig::from_env()?).await?;
    let revocation = TokenRevocation::new(redis_pool);
    let user_id = Uuid::new_v4();

    let before = claims_for(user_id);
    revocation.revoke_all(user_id, 60).await?;
    let after = claims_for(user_id);

    assert!(revocation.ensure_active(&before).await.is_err());
    assert!(revocation.ensure_active(&after).await.is_ok());

    Ok(())
}
