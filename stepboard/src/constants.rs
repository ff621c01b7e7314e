pub(crate) const DEFAULT_API_BASE: &str = "http://localhost:8080/api/user";
pub(crate) const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;
pub(crate) const DEFAULT_REFRESH_MS: u64 = 30_000;
pub(crate) const MAX_REFRESH_BACKOFF_MS: u64 = 30_000;

pub(crate) const ONGOING_PAGE_SIZE: u32 = 30;
pub(crate) const ENDED_PAGE_SIZE: u32 = 10;
pub(crate) const ENDED_RANKING_SIZE: u32 = 100;

/// Rows assumed to fit on the first screen when the list cannot be measured.
pub const DEFAULT_FIRST_SCREEN_COUNT: usize = 8;

pub(crate) const DEFAULT_JOIN_COUNT: u32 = 3;
pub(crate) const DEFAULT_PRIZE_MULTIPLIER: f64 = 1.0;

pub(crate) const DEFAULT_PRIZE_TITLE: &str = "Prize";
pub(crate) const DEFAULT_PRIZE_IMAGE: &str = "/assets/prize_sample.jpg";

// Terminal geometry used when the host does not report one.
pub(crate) const DEFAULT_VIEWPORT_HEIGHT: f64 = 400.0;
pub(crate) const DEFAULT_ROW_HEIGHT: f64 = 50.0;
