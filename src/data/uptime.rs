use std::time::Duration;

use anyhow::{bail, Result};

/// Parse uptime strings like "0:02:00", "01:00:00" or "12:4:33.5"
///
/// Exactly three colon-separated numeric parts are accepted. Anything else
/// ("N/A", "2 days, 3:04:05", "") is an error the caller is expected to skip.
pub fn parse_uptime(s: &str) -> Result<Duration> {
    let parts: Vec<&str> = s.trim().split(':').collect();
    if parts.len() != 3 {
        bail!("Unknown uptime format: {}", s);
    }

    let hours: f64 = parts[0].trim().parse()?;
    let minutes: f64 = parts[1].trim().parse()?;
    let seconds: f64 = parts[2].trim().parse()?;

    let total = hours * 3600.0 + minutes * 60.0 + seconds;
    if !total.is_finite() || total < 0.0 {
        bail!("Uptime out of range: {}", s);
    }

    Ok(Duration::from_secs_f64(total))
}
