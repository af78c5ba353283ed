use std::fmt;
use std::time::Duration;

use thiserror::Error;

use crate::model::{Geometry, MonitoredPage};

pub const DEFAULT_THRESHOLD: f64 = 0.0;
pub const DEFAULT_WIDTH: u32 = 1280;
pub const DEFAULT_HEIGHT: u32 = 1024;
pub const DEFAULT_SCALE: f64 = 1.0;
pub const DEFAULT_FUZZ_PERCENT: u8 = 0;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("environment variable {0} is missing or empty")]
    Missing(&'static str),
    #[error("environment variable {var} has invalid value {value:?}: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// Mail submission settings. `host:port` is split at load time.
#[derive(Clone, PartialEq, Eq)]
pub struct SmtpSettings {
    pub user: String,
    pub password: String,
    pub host: String,
    pub port: u16,
    pub from: String,
    pub to: String,
}

impl fmt::Debug for SmtpSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmtpSettings")
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("from", &self.from)
            .field("to", &self.to)
            .finish()
    }
}

/// Monitoring parameters, loaded once before the first scan and never mutated.
#[derive(Clone, Debug, PartialEq)]
pub struct ScanConfig {
    pub pages: Vec<MonitoredPage>,
    pub interval: Duration,
    /// Change fraction in `[0, 1]` that must be exceeded to alert.
    pub threshold: f64,
    pub geometry: Geometry,
    pub scale: f64,
    pub fuzz_percent: u8,
    pub smtp: SmtpSettings,
}

impl ScanConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load from an arbitrary variable source. Empty values count as absent.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &'static str| -> Option<String> {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let require = |name: &'static str| get(name).ok_or(ConfigError::Missing(name));

        let pages = parse_pages(&require("PAGES")?)?;

        let interval_secs: u64 = parse_var("INTERVAL", &require("INTERVAL")?)?;
        if interval_secs == 0 {
            return Err(invalid("INTERVAL", "0", "must be a positive number of seconds"));
        }

        let threshold = match get("THRESHOLD") {
            Some(v) => {
                let t: f64 = parse_var("THRESHOLD", &v)?;
                if !(0.0..=1.0).contains(&t) {
                    return Err(invalid("THRESHOLD", &v, "must be a fraction between 0 and 1"));
                }
                t
            }
            None => DEFAULT_THRESHOLD,
        };

        let width = optional_dimension("WIDTH", get("WIDTH"), DEFAULT_WIDTH)?;
        let height = optional_dimension("HEIGHT", get("HEIGHT"), DEFAULT_HEIGHT)?;

        let scale = match get("SCALE") {
            Some(v) => {
                let s: f64 = parse_var("SCALE", &v)?;
                if !s.is_finite() || s <= 0.0 {
                    return Err(invalid("SCALE", &v, "must be a positive number"));
                }
                s
            }
            None => DEFAULT_SCALE,
        };

        let fuzz_percent = match get("FUZZ") {
            Some(v) => {
                let f: u8 = parse_var("FUZZ", &v)?;
                if f > 100 {
                    return Err(invalid("FUZZ", &v, "must be a percentage between 0 and 100"));
                }
                f
            }
            None => DEFAULT_FUZZ_PERCENT,
        };

        let smtp_host = require("SMTP_HOST")?;
        let (host, port) = split_host_port(&smtp_host)?;

        let smtp = SmtpSettings {
            user: require("SMTP_USER")?,
            password: require("SMTP_PASSWORD")?,
            host,
            port,
            from: require("SMTP_FROM")?,
            to: require("SMTP_TO")?,
        };

        Ok(Self {
            pages,
            interval: Duration::from_secs(interval_secs),
            threshold,
            geometry: Geometry { width, height },
            scale,
            fuzz_percent,
            smtp,
        })
    }
}

fn invalid(var: &'static str, value: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        var,
        value: value.to_string(),
        reason: reason.into(),
    }
}

fn parse_var<T>(var: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: fmt::Display,
{
    value.parse::<T>().map_err(|e| invalid(var, value, e.to_string()))
}

fn optional_dimension(var: &'static str, value: Option<String>, default: u32) -> Result<u32, ConfigError> {
    match value {
        Some(v) => {
            let n: u32 = parse_var(var, &v)?;
            if n == 0 {
                return Err(invalid(var, &v, "must be a positive number of pixels"));
            }
            Ok(n)
        }
        None => Ok(default),
    }
}

/// Comma separated, trimmed, empties and duplicates dropped (first one wins).
fn parse_pages(raw: &str) -> Result<Vec<MonitoredPage>, ConfigError> {
    let mut pages: Vec<MonitoredPage> = Vec::new();
    for url in raw.split(',').map(str::trim).filter(|u| !u.is_empty()) {
        if pages.iter().any(|p| p.url == url) {
            continue;
        }
        pages.push(MonitoredPage::new(url));
    }
    if pages.is_empty() {
        return Err(invalid("PAGES", raw, "no page URLs listed"));
    }
    Ok(pages)
}

fn split_host_port(raw: &str) -> Result<(String, u16), ConfigError> {
    let (host, port) = raw
        .rsplit_once(':')
        .ok_or_else(|| invalid("SMTP_HOST", raw, "expected host:port"))?;
    let host = host.trim_start_matches('[').trim_end_matches(']');
    if host.is_empty() {
        return Err(invalid("SMTP_HOST", raw, "host is empty"));
    }
    let port: u16 = port
        .parse()
        .map_err(|e: std::num::ParseIntError| invalid("SMTP_HOST", raw, format!("bad port: {e}")))?;
    Ok((host.to_string(), port))
}
