use std::env;
use std::time::Duration;

use anyhow::{Result, anyhow, bail};
use chrono_tz::Tz;

use crate::gemini::DEFAULT_API_HOSTNAME;

pub const DEFAULT_TIMEZONE: Tz = chrono_tz::Asia::Kuala_Lumpur;
pub const DEFAULT_IMAGE_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_TEXT_MODEL: &str = "models/gemini-flash-latest";
pub const DEFAULT_MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

#[derive(Clone, Debug)]
pub struct AppConfig {
    // Missing keys are reported when an extraction is attempted, not
    // at start up
    pub gemini_api_key: Option<String>,
    pub gemini_api_hostname: String,
    pub gemini_model: String,
    pub supports_image: bool,
    pub timezone: Tz,
    pub request_timeout: Option<Duration>,
    pub max_body_bytes: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            gemini_api_key: None,
            gemini_api_hostname: DEFAULT_API_HOSTNAME.to_string(),
            gemini_model: DEFAULT_IMAGE_MODEL.to_string(),
            supports_image: true,
            timezone: DEFAULT_TIMEZONE,
            request_timeout: None,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

impl AppConfig {
    /// Read the config from the process environment. Call
    /// `dotenvy::dotenv()` first to pick up a `.env` file.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build the config from any variable source. Blank values are
    /// treated the same as unset ones.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let gemini_api_key = var("GEMINI_API_KEY").or_else(|| var("GOOGLE_API_KEY"));
        let gemini_api_hostname =
            var("TIMETABLE_GEMINI_HOST").unwrap_or_else(|| DEFAULT_API_HOSTNAME.to_string());
        let supports_image = match var("TIMETABLE_SUPPORTS_IMAGE") {
            Some(value) => parse_bool("TIMETABLE_SUPPORTS_IMAGE", &value)?,
            None => true,
        };
        // Each variant has the model it was tuned against
        let gemini_model = var("TIMETABLE_GEMINI_MODEL").unwrap_or_else(|| {
            if supports_image {
                DEFAULT_IMAGE_MODEL.to_string()
            } else {
                DEFAULT_TEXT_MODEL.to_string()
            }
        });
        let timezone = match var("TIMETABLE_TIMEZONE") {
            Some(name) => name
                .parse::<Tz>()
                .map_err(|e| anyhow!("Invalid TIMETABLE_TIMEZONE {:?}: {}", name, e))?,
            None => DEFAULT_TIMEZONE,
        };
        let request_timeout = var("TIMETABLE_REQUEST_TIMEOUT_SECS")
            .map(|value| {
                value
                    .parse::<u64>()
                    .map(Duration::from_secs)
                    .map_err(|e| anyhow!("Invalid TIMETABLE_REQUEST_TIMEOUT_SECS {:?}: {}", value, e))
            })
            .transpose()?;
        let max_body_bytes = match var("TIMETABLE_MAX_BODY_BYTES") {
            Some(value) => value
                .parse::<usize>()
                .map_err(|e| anyhow!("Invalid TIMETABLE_MAX_BODY_BYTES {:?}: {}", value, e))?,
            None => DEFAULT_MAX_BODY_BYTES,
        };

        if gemini_api_key.is_none() {
            tracing::warn!("GEMINI_API_KEY or GOOGLE_API_KEY not found, extraction will fail");
        }

        Ok(Self {
            gemini_api_key,
            gemini_api_hostname,
            gemini_model,
            supports_image,
            timezone,
            request_timeout,
            max_body_bytes,
        })
    }
}

fn parse_bool(name: &str, value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => bail!("Invalid {} {:?}, expected true or false", name, value),
    }
}
