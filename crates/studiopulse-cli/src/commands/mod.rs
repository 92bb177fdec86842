pub mod export;
pub mod monitor;
pub mod server;
pub mod simulate;

use std::path::Path;
use std::time::Duration;

use studiopulse_core::{Dashboard, DashboardConfig};

/// Options shared by every subcommand.
pub struct GlobalOpts<'a> {
    pub config: Option<&'a str>,
    pub seed: Option<u64>,
}

/// Install env_logger. `RUST_LOG` overrides `default_filter`.
pub fn init_logging(default_filter: &str) {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp_millis()
        .init();
}

/// Load the config file if one was given, else the built-in defaults.
pub fn load_config(path: Option<&str>) -> DashboardConfig {
    let Some(path) = path else {
        return DashboardConfig::default();
    };
    DashboardConfig::from_path(Path::new(path)).unwrap_or_else(|e| {
        eprintln!("Error loading config: {e}");
        std::process::exit(1);
    })
}

/// Build a dashboard from the global options. Exits on a bad config.
pub fn make_dashboard(opts: &GlobalOpts<'_>) -> Dashboard {
    let config = load_config(opts.config);
    let dashboard = match opts.seed {
        Some(seed) => Dashboard::seeded(config, seed),
        None => Dashboard::from_os_rng(config),
    };
    dashboard.unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        std::process::exit(1);
    })
}

/// Parse a duration string like "5m", "30s", "1h", "100ms".
/// A bare number is taken as seconds.
pub fn parse_duration(s: &str) -> Result<Duration, String> {
    let s = s.trim();

    let (numeric, multiplier) = if let Some(rest) = s.strip_suffix("ms") {
        (rest, 1u64)
    } else if let Some(rest) = s.strip_suffix('s') {
        (rest, 1000)
    } else if let Some(rest) = s.strip_suffix('m') {
        (rest, 60_000)
    } else if let Some(rest) = s.strip_suffix('h') {
        (rest, 3_600_000)
    } else {
        (s, 1000)
    };

    let value: u64 = numeric
        .trim()
        .parse()
        .map_err(|_| format!("invalid duration: {s}"))?;
    value
        .checked_mul(multiplier)
        .map(Duration::from_millis)
        .ok_or_else(|| format!("duration too large: {s}"))
}

/// Parse a clock speed multiplier. Must be finite and positive.
pub fn parse_speed(s: &str) -> Result<f64, String> {
    let speed: f64 = s
        .trim()
        .parse()
        .map_err(|_| format!("invalid speed: {s}"))?;
    if speed.is_finite() && speed > 0.0 {
        Ok(speed)
    } else {
        Err(format!("speed must be a positive finite number: {s}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_duration_units() {
        assert_eq!(parse_duration("100ms"), Ok(Duration::from_millis(100)));
        assert_eq!(parse_duration("30s"), Ok(Duration::from_secs(30)));
        assert_eq!(parse_duration("5m"), Ok(Duration::from_secs(300)));
        assert_eq!(parse_duration("2h"), Ok(Duration::from_secs(7200)));
        assert_eq!(parse_duration(" 45 "), Ok(Duration::from_secs(45)));
    }

    #[test]
    fn parse_duration_rejects_garbage() {
        assert!(parse_duration("soon").is_err());
        assert!(parse_duration("-5s").is_err());
        assert!(parse_duration("").is_err());
    }

    #[test]
    fn parse_speed_accepts_positive_finite() {
        assert_eq!(parse_speed("1.0"), Ok(1.0));
        assert_eq!(parse_speed(" 8 "), Ok(8.0));
    }

    #[test]
    fn parse_speed_rejects_non_finite() {
        assert!(parse_speed("NaN").is_err());
        assert!(parse_speed("inf").is_err());
        assert!(parse_speed("-2").is_err());
        assert!(parse_speed("0").is_err());
        assert!(parse_speed("fast").is_err());
    }

    #[test]
    fn load_config_defaults_without_path() {
        assert_eq!(load_config(None), DashboardConfig::default());
    }
}
