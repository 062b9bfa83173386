use anyhow::{Context, Result};
use chrono::NaiveTime;
use dotenvy::dotenv;
use std::env;
use std::str::FromStr;
use std::time::Duration;

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub server_addr: String,

    // Rate limiting
    pub rate_attendance_per_min: u32,
    pub rate_protected_per_min: u32,

    pub api_prefix: String,

    pub log_dir: String,
    pub log_level: tracing::Level,

    pub face_api: FaceApiConfig,
    pub shift: ShiftConfig,
    pub identity_cache_ttl: Duration,
}

/// Settings for the external face recognition service.
#[derive(Clone, Debug)]
pub struct FaceApiConfig {
    pub base_url: String,
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
    /// When false every call fails without touching the network.
    pub enabled: bool,
    pub max_retries: usize,
    pub retry_backoff: Duration,
}

impl Default for FaceApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".to_string(),
            connect_timeout: Duration::from_secs(5),
            read_timeout: Duration::from_secs(60),
            enabled: true,
            max_retries: 2,
            retry_backoff: Duration::from_millis(500),
        }
    }
}

/// Working day boundaries used to flag late check-ins.
#[derive(Clone, Copy, Debug)]
pub struct ShiftConfig {
    pub start: NaiveTime,
    pub grace_minutes: i64,
}

impl Default for ShiftConfig {
    fn default() -> Self {
        Self {
            start: NaiveTime::from_hms_opt(9, 0, 0).unwrap_or(NaiveTime::MIN),
            grace_minutes: 0,
        }
    }
}

impl ShiftConfig {
    pub fn is_late(&self, at: NaiveTime) -> bool {
        let (deadline, wrapped) = self
            .start
            .overflowing_add_signed(chrono::Duration::minutes(self.grace_minutes));
        // a grace period running past midnight never marks anyone late
        wrapped == 0 && at > deadline
    }
}

fn required(key: &str) -> Result<String> {
    env::var(key).with_context(|| format!("{key} must be set"))
}

fn parsed_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} has an invalid value: {raw:?}")),
        Err(_) => Ok(default),
    }
}

fn seconds_or(key: &str, default: Duration) -> Result<Duration> {
    let secs: f64 = parsed_or(key, default.as_secs_f64())?;
    positive_seconds(secs).with_context(|| format!("{key} must be a positive number"))
}

fn positive_seconds(secs: f64) -> Option<Duration> {
    Duration::try_from_secs_f64(secs)
        .ok()
        .filter(|d| !d.is_zero())
}

impl FaceApiConfig {
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        Ok(Self {
            base_url: env::var("FACE_API_BASE_URL")
                .unwrap_or(defaults.base_url)
                .trim_end_matches('/')
                .to_string(),
            connect_timeout: seconds_or("FACE_API_CONNECT_TIMEOUT", defaults.connect_timeout)?,
            read_timeout: seconds_or("FACE_API_READ_TIMEOUT", defaults.read_timeout)?,
            enabled: parsed_or("FACE_API_ENABLED", defaults.enabled)?,
            max_retries: parsed_or("FACE_API_MAX_RETRIES", defaults.max_retries)?,
            retry_backoff: Duration::from_millis(parsed_or(
                "FACE_API_RETRY_BACKOFF_MS",
                defaults.retry_backoff.as_millis() as u64,
            )?),
        })
    }
}

impl ShiftConfig {
    pub fn from_env() -> Result<Self> {
        let start = match env::var("SHIFT_START") {
            Ok(raw) => NaiveTime::parse_from_str(raw.trim(), "%H:%M")
                .with_context(|| format!("SHIFT_START must look like 09:00, got {raw:?}"))?,
            Err(_) => Self::default().start,
        };

        Ok(Self {
            start,
            grace_minutes: parsed_or("LATE_GRACE_MINUTES", 0)?,
        })
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        Ok(Self {
            server_addr: required("SERVER_ADDR")?,
            database_url: required("DATABASE_URL")?,
            jwt_secret: required("JWT_SECRET")?,

            rate_attendance_per_min: parsed_or("RATE_ATTENDANCE_PER_MIN", 30)?,
            rate_protected_per_min: parsed_or("RATE_PROTECTED_PER_MIN", 1000)?,

            api_prefix: env::var("API_PREFIX").unwrap_or_else(|_| "/api".to_string()),

            log_dir: env::var("LOG_DIR").unwrap_or_else(|_| "logs".to_string()),
            log_level: parsed_or("LOG_LEVEL", tracing::Level::DEBUG)?,

            face_api: FaceApiConfig::from_env()?,
            shift: ShiftConfig::from_env()?,
            identity_cache_ttl: Duration::from_secs(parsed_or("IDENTITY_CACHE_TTL_SECS", 300)?),
        })
    }
}

#[cfg(test)]
impl Config {
    pub fn for_tests(jwt_secret: &str) -> Self {
        Self {
            database_url: "mysql://localhost/hrm_test".to_string(),
            jwt_secret: jwt_secret.to_string(),
            server_addr: "127.0.0.1:0".to_string(),
            rate_attendance_per_min: 30,
            rate_protected_per_min: 1000,
            api_prefix: "/api".to_string(),
            log_dir: "logs".to_string(),
            log_level: tracing::Level::DEBUG,
            face_api: FaceApiConfig::default(),
            shift: ShiftConfig::default(),
            identity_cache_ttl: Duration::from_secs(300),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn on_time_at_shift_start() {
        let shift = ShiftConfig::default();
        assert!(!shift.is_late(at(9, 0)));
        assert!(shift.is_late(at(9, 1)));
    }

    #[test]
    fn grace_period_extends_deadline() {
        let shift = ShiftConfig {
            start: at(9, 0),
            grace_minutes: 15,
        };
        assert!(!shift.is_late(at(9, 15)));
        assert!(shift.is_late(at(9, 16)));
    }

    #[test]
    fn grace_past_midnight_is_never_late() {
        let shift = ShiftConfig {
            start: at(23, 50),
            grace_minutes: 30,
        };
        assert!(!shift.is_late(at(23, 59)));
    }

    #[test]
    fn timeouts_must_be_positive() {
        assert_eq!(positive_seconds(2.5), Some(Duration::from_millis(2500)));
        assert_eq!(positive_seconds(0.0), None);
        assert_eq!(positive_seconds(-1.0), None);
        assert_eq!(positive_seconds(f64::NAN), None);
    }

    #[test]
    fn face_api_defaults() {
        let cfg = FaceApiConfig::default();
        assert!(cfg.enabled);
        assert_eq!(cfg.max_retries, 2);
        assert_eq!(cfg.connect_timeout, Duration::from_secs(5));
        assert_eq!(cfg.read_timeout, Duration::from_secs(60));
    }
}
