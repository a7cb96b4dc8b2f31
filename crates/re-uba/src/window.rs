//! WindowBuilder: explicit `[start, end]` windows sized from configuration,
//! never an implicit rolling window (`spec.md` §4.12).

use re_records::Window;

use crate::error::{Result, UbaError};

/// Builds an explicit observation window from an RFC3339 start timestamp and
/// a fixed size in days, read from `UBA_DRIFT_OBSERVATION_WINDOW_DAYS`
/// (`spec.md` §6 environment variables) rather than computed implicitly.
pub struct WindowBuilder {
    size_days: i64,
}

impl WindowBuilder {
    pub fn new(size_days: i64) -> Self {
        Self { size_days }
    }

    /// Reads `UBA_DRIFT_OBSERVATION_WINDOW_DAYS`, defaulting to 7.
    pub fn from_env() -> Self {
        let size_days = std::env::var("UBA_DRIFT_OBSERVATION_WINDOW_DAYS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(7);
        Self::new(size_days)
    }

    /// Build `[start, start + size_days]` from an explicit start timestamp.
    /// Both ends are caller-visible inputs, never silently recomputed.
    pub fn build(&self, start: &str) -> Result<Window> {
        let start_dt = chrono::DateTime::parse_from_rfc3339(start)
            .map_err(|_| UbaError::InvalidWindow {
                start: start.to_string(),
                end: String::new(),
            })?;
        let end_dt = start_dt + chrono::Duration::days(self.size_days);
        let end = end_dt.to_rfc3339_opts(chrono::SecondsFormat::Millis, true);
        Ok(Window::new(start, end))
    }

    /// Validate a window built elsewhere, e.g. when replaying a recorded
    /// delta's `window_start`/`window_end` pair.
    pub fn validate(window: &Window) -> Result<()> {
        let start = chrono::DateTime::parse_from_rfc3339(&window.start)
            .map_err(|_| UbaError::InvalidWindow {
                start: window.start.clone(),
                end: window.end.clone(),
            })?;
        let end = chrono::DateTime::parse_from_rfc3339(&window.end)
            .map_err(|_| UbaError::InvalidWindow {
                start: window.start.clone(),
                end: window.end.clone(),
            })?;
        if end <= start {
            return Err(UbaError::InvalidWindow {
                start: window.start.clone(),
                end: window.end.clone(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_window_of_configured_size() {
        let builder = WindowBuilder::new(7);
        let window = builder.build("2026-01-01T00:00:00.000Z").unwrap();
        assert_eq!(window.start, "2026-01-01T00:00:00.000Z");
        assert_eq!(window.end, "2026-01-08T00:00:00.000Z");
        WindowBuilder::validate(&window).unwrap();
    }

    #[test]
    fn rejects_malformed_start_timestamp() {
        let builder = WindowBuilder::new(7);
        assert!(builder.build("not-a-timestamp").is_err());
    }

    #[test]
    fn rejects_non_increasing_window() {
        let window = Window::new("2026-01-08T00:00:00.000Z", "2026-01-01T00:00:00.000Z");
        assert!(WindowBuilder::validate(&window).is_err());
    }
}
