//! Progress tracking for transfers

use std::time::{Duration, Instant};

/// Byte-level progress of a single transfer
#[derive(Debug, Clone)]
pub struct Progress {
    /// Total size in bytes, 0 when unknown
    pub total_size: u64,
    /// Bytes transferred so far
    pub downloaded_size: u64,
    /// Transfer speed in bytes per second
    pub speed: Option<f64>,
    /// Estimated time remaining
    pub eta: Option<Duration>,
    pub start_time: Instant,
}

impl Progress {
    pub fn new(total_size: u64) -> Self {
        Self {
            total_size,
            downloaded_size: 0,
            speed: None,
            eta: None,
            start_time: Instant::now(),
        }
    }

    /// Record the running byte count
    pub fn update(&mut self, downloaded_size: u64) {
        self.downloaded_size = downloaded_size;

        let elapsed = self.start_time.elapsed();
        if elapsed.as_millis() > 0 {
            let speed = downloaded_size as f64 / elapsed.as_secs_f64();
            self.speed = Some(speed);

            if speed > 0.0 && self.total_size > downloaded_size {
                let remaining_bytes = self.total_size - downloaded_size;
                self.eta = Some(Duration::from_secs_f64(remaining_bytes as f64 / speed));
            }
        }
    }

    /// Whole percent transferred, capped at 99 until the transfer is finalized.
    ///
    /// Unknown totals report 0; the runner publishes 100 only once the file is
    /// in place.
    pub fn percent(&self) -> u8 {
        if self.total_size == 0 {
            return 0;
        }
        let percent = self.downloaded_size.saturating_mul(100) / self.total_size;
        percent.min(99) as u8
    }

    pub fn is_complete(&self) -> bool {
        self.total_size > 0 && self.downloaded_size >= self.total_size
    }

    pub fn speed_string(&self) -> String {
        match self.speed {
            Some(speed) => format!("{}/s", format_bytes(speed as u64)),
            None => "Unknown".to_string(),
        }
    }
}

/// Format bytes as human-readable string
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    const THRESHOLD: f64 = 1024.0;

    if bytes == 0 {
        return "0 B".to_string();
    }

    let bytes_f64 = bytes as f64;
    let exp = (bytes_f64.ln() / THRESHOLD.ln()).floor() as usize;
    let exp = exp.min(UNITS.len() - 1);

    if exp == 0 {
        format!("{} {}", bytes, UNITS[exp])
    } else {
        format!("{:.1} {}", bytes_f64 / THRESHOLD.powi(exp as i32), UNITS[exp])
    }
}

/// Format a duration compactly, e.g. `2h45m`, `3m5s`, `42s`
pub fn format_duration(duration: Duration) -> String {
    let total_seconds = duration.as_secs();
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    let mut out = String::new();
    if hours > 0 {
        out.push_str(&format!("{}h", hours));
    }
    if minutes > 0 {
        out.push_str(&format!("{}m", minutes));
    }
    if seconds > 0 || out.is_empty() {
        out.push_str(&format!("{}s", seconds));
    }
    out
}
