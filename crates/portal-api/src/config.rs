use std::path::PathBuf;
use std::str::FromStr;

/// Secret shipped as the default. Fine for a laptop, not for a shared deployment.
pub const PLACEHOLDER_SECRET: &str = "dev-secret-change-me";

/// Longest accepted session lifetime: one hundred years.
pub const MAX_SESSION_TTL_HOURS: u32 = 24 * 365 * 100;

#[derive(Debug, Clone)]
pub struct Config {
    /// HMAC key for the session cookie.
    pub session_secret: String,
    pub db_path: PathBuf,
    /// Human-readable deployment label, e.g. "Kubernetes (3 replicas)".
    pub run_mode: String,
    pub hostname: String,
    pub host: String,
    pub port: u16,
    pub session_ttl_hours: u32,
    /// Password given to the seeded `admin` account.
    pub admin_password: String,
    /// `/crash` also sends SIGTERM to the parent process (e.g. a pre-fork master).
    pub crash_signals_parent: bool,
}

#[derive(Debug, thiserror::Error)]
#[error("{key} must be {expected}, got {value:?}")]
pub struct ConfigError {
    pub key: &'static str,
    pub expected: &'static str,
    pub value: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from any key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let text = |key: &str, default: &str| get(key).unwrap_or_else(|| default.to_string());

        let port: u16 = parse(get("PORTAL_PORT"), "PORTAL_PORT", 5000, "a port number")?;

        let session_ttl_hours: u32 = parse(
            get("PORTAL_SESSION_TTL_HOURS"),
            "PORTAL_SESSION_TTL_HOURS",
            12,
            "a positive number of hours",
        )?;
        if session_ttl_hours == 0 || session_ttl_hours > MAX_SESSION_TTL_HOURS {
            return Err(ConfigError {
                key: "PORTAL_SESSION_TTL_HOURS",
                expected: "between 1 and 876000 hours",
                value: session_ttl_hours.to_string(),
            });
        }

        let crash_signals_parent = match get("PORTAL_CRASH_PARENT") {
            None => false,
            Some(raw) => parse_flag(&raw).ok_or(ConfigError {
                key: "PORTAL_CRASH_PARENT",
                expected: "a boolean",
                value: raw,
            })?,
        };

        Ok(Self {
            session_secret: text("PORTAL_SECRET", PLACEHOLDER_SECRET),
            db_path: text("PORTAL_DB_PATH", "portal.db").into(),
            run_mode: text("PORTAL_RUN_MODE", "Traditional (Ubuntu)"),
            hostname: get("PORTAL_HOSTNAME").unwrap_or_else(system_hostname),
            host: text("PORTAL_HOST", "0.0.0.0"),
            port,
            session_ttl_hours,
            admin_password: text("PORTAL_ADMIN_PASSWORD", "Admin@123"),
            crash_signals_parent,
        })
    }

    pub fn uses_placeholder_secret(&self) -> bool {
        self.session_secret == PLACEHOLDER_SECRET
    }
}

fn parse<T: FromStr>(
    raw: Option<String>,
    key: &'static str,
    default: T,
    expected: &'static str,
) -> Result<T, ConfigError> {
    match raw {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|_| ConfigError {
            key,
            expected,
            value,
        }),
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn system_hostname() -> String {
    #[cfg(unix)]
    {
        if let Ok(name) = nix::unistd::gethostname() {
            if let Some(name) = name.to_str() {
                return name.to_string();
            }
        }
    }

    std::env::var("HOSTNAME")
        .or_else(|_| std::env::var("COMPUTERNAME"))
        .unwrap_or_else(|_| "unknown".into())
}
