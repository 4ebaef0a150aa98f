use std::str::FromStr;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
    pub refresh_ttl_minutes: i64,
}

/// Inclusive bounds enforced on recipe input.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
pub struct RecipeLimits {
    pub cooking_time_min: i32,
    pub cooking_time_max: i32,
    pub amount_min: i32,
    pub amount_max: i32,
}

impl Default for RecipeLimits {
    fn default() -> Self {
        Self {
            cooking_time_min: 1,
            cooking_time_max: 1440,
            amount_min: 1,
            amount_max: 10_000,
        }
    }
}

impl RecipeLimits {
    pub fn check(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.cooking_time_min >= 1 && self.cooking_time_min <= self.cooking_time_max,
            "cooking time bounds must satisfy 1 <= min <= max"
        );
        anyhow::ensure!(
            self.amount_min >= 1 && self.amount_min <= self.amount_max,
            "ingredient amount bounds must satisfy 1 <= min <= max"
        );
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub jwt: JwtConfig,
    pub minio_endpoint: String,
    pub minio_bucket: String,
    pub minio_access_key: String,
    pub minio_secret_key: String,
    pub minio_region: String,
    pub image_url_ttl_secs: u64,
    pub page_size: i64,
    pub limits: RecipeLimits,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "foodgram".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "foodgram-users".into()),
            ttl_minutes: env_or("JWT_TTL_MINUTES", 60)?,
            refresh_ttl_minutes: env_or("JWT_REFRESH_TTL_MINUTES", 60 * 24 * 14)?,
        };
        let defaults = RecipeLimits::default();
        let limits = RecipeLimits {
            cooking_time_min: env_or("COOKING_TIME_MIN", defaults.cooking_time_min)?,
            cooking_time_max: env_or("COOKING_TIME_MAX", defaults.cooking_time_max)?,
            amount_min: env_or("INGREDIENT_AMOUNT_MIN", defaults.amount_min)?,
            amount_max: env_or("INGREDIENT_AMOUNT_MAX", defaults.amount_max)?,
        };
        limits.check()?;

        Ok(Self {
            database_url,
            max_connections: env_or("DATABASE_MAX_CONNECTIONS", 10)?,
            jwt,
            minio_endpoint: std::env::var("MINIO_ENDPOINT")?,
            minio_bucket: std::env::var("MINIO_BUCKET")?,
            minio_access_key: std::env::var("MINIO_ACCESS_KEY")?,
            minio_secret_key: std::env::var("MINIO_SECRET_KEY")?,
            minio_region: std::env::var("MINIO_REGION").unwrap_or_else(|_| "us-east-1".into()),
            image_url_ttl_secs: env_or("IMAGE_URL_TTL_SECS", 30 * 60)?,
            page_size: env_or("PAGE_SIZE", 6)?,
            limits,
        })
    }
}

/// `default` when the variable is unset; a present value must parse.
fn env_or<T: FromStr>(key: &str, default: T) -> anyhow::Result<T> {
    match std::env::var(key) {
        Ok(v) => v
            .trim()
            .parse::<T>()
            .map_err(|_| anyhow::anyhow!("{key} has invalid value {v:?}")),
        Err(std::env::VarError::NotPresent) => Ok(default),
        Err(e) => Err(anyhow::anyhow!("{key}: {e}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_limits_are_valid() {
        assert!(RecipeLimits::default().check().is_ok());
    }

    #[test]
    fn limits_reject_zero_minimum() {
        let limits = RecipeLimits {
            amount_min: 0,
            ..RecipeLimits::default()
        };
        assert!(limits.check().is_err());
    }

    #[test]
    fn limits_reject_inverted_range() {
        let limits = RecipeLimits {
            cooking_time_min: 50,
            cooking_time_max: 10,
            ..RecipeLimits::default()
        };
        assert!(limits.check().is_err());
    }

    #[test]
    fn env_or_falls_back_only_when_unset() {
        assert_eq!(env_or("FOODGRAM_TEST_SURELY_UNSET", 42_i64).unwrap(), 42);

        std::env::set_var("FOODGRAM_TEST_COOKING_TIME_MAX", " 90 ");
        assert_eq!(env_or("FOODGRAM_TEST_COOKING_TIME_MAX", 1440_i32).unwrap(), 90);
    }

    #[test]
    fn env_or_rejects_garbage() {
        std::env::set_var("FOODGRAM_TEST_AMOUNT_MAX", "abc");
        let err = env_or("FOODGRAM_TEST_AMOUNT_MAX", 10_000_i32).unwrap_err();
        assert!(err.to_string().contains("FOODGRAM_TEST_AMOUNT_MAX"));
    }
}
