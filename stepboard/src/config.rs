use std::env;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::warn;

use crate::api::normalize_base;
use crate::constants::{
    DEFAULT_API_BASE, DEFAULT_REFRESH_MS, DEFAULT_REQUEST_TIMEOUT_MS, DEFAULT_ROW_HEIGHT,
    DEFAULT_VIEWPORT_HEIGHT,
};
use crate::geometry::Geometry;
use crate::handoff::Handoff;

#[derive(Clone, Debug)]
pub struct Config {
    pub api_base: String,
    pub request_timeout: Duration,
    pub session_path: Option<PathBuf>,
    pub login_code: Option<String>,
    pub refresh_interval: Duration,
    pub geometry: Geometry,
    pub once: bool,
    pub handoff: Option<Handoff>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let api_base = match read_env_first(&["STEPBOARD_API_BASE"]) {
            Some(base) => base,
            None => {
                warn!("STEPBOARD_API_BASE not set; defaulting to {}", DEFAULT_API_BASE);
                DEFAULT_API_BASE.to_string()
            }
        };
        normalize_base(&api_base)
            .with_context(|| format!("invalid STEPBOARD_API_BASE {}", api_base))?;

        let request_timeout = Duration::from_millis(
            read_env_first(&["STEPBOARD_TIMEOUT_MS"])
                .and_then(|value| value.parse::<u64>().ok())
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_MS),
        );

        let refresh_interval = Duration::from_millis(
            read_env_first(&["STEPBOARD_REFRESH_MS"])
                .and_then(|value| value.parse::<u64>().ok())
                .filter(|ms| *ms > 0)
                .unwrap_or(DEFAULT_REFRESH_MS),
        );

        let geometry = Geometry {
            list_height: read_env_first(&["STEPBOARD_VIEWPORT_HEIGHT"])
                .and_then(|value| value.parse::<f64>().ok())
                .unwrap_or(DEFAULT_VIEWPORT_HEIGHT),
            row_height: read_env_first(&["STEPBOARD_ROW_HEIGHT"])
                .and_then(|value| value.parse::<f64>().ok())
                .unwrap_or(DEFAULT_ROW_HEIGHT),
        };

        let once = env::var("STEPBOARD_ONCE")
            .map(|value| {
                let trimmed = value.trim();
                !trimmed.is_empty() && trimmed != "0"
            })
            .unwrap_or(false);

        let handoff = read_env_first(&["STEPBOARD_CONTEST_ID"]).and_then(|contest_id| {
            let contest_type = read_env_first(&["STEPBOARD_CONTEST_TYPE"]);
            let contest_status = read_env_first(&["STEPBOARD_CONTEST_STATUS"]);
            let goto_ended = read_env_first(&["STEPBOARD_GOTO_ENDED"]);
            let handoff = Handoff::parse(
                &contest_id,
                contest_type.as_deref(),
                contest_status.as_deref(),
                goto_ended.as_deref(),
            );
            if handoff.is_none() {
                warn!(%contest_id, "ignoring malformed STEPBOARD_CONTEST_ID");
            }
            handoff
        });

        Ok(Self {
            api_base,
            request_timeout,
            session_path: read_env_first(&["STEPBOARD_SESSION_PATH"]).map(PathBuf::from),
            login_code: read_env_first(&["STEPBOARD_LOGIN_CODE"]),
            refresh_interval,
            geometry,
            once,
            handoff,
        })
    }
}

pub fn read_env_first(keys: &[&str]) -> Option<String> {
    for key in keys {
        if let Ok(value) = env::var(key) {
            let trimmed = value.trim().to_string();
            if !trimmed.is_empty() {
                return Some(trimmed);
            }
        }
    }
    None
}
