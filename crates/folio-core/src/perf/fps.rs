#![forbid(unsafe_code)]

//! Development-only frame rate sampling.

use std::time::Duration;

/// Minimum interval between two samples.
pub const SAMPLE_WINDOW: Duration = Duration::from_secs(1);

/// Frame rate below which a warning is logged.
pub const LOW_FPS: u32 = 50;

/// Hostnames on which sampling is enabled.
pub const DEV_HOSTS: [&str; 2] = ["localhost", "127.0.0.1"];

/// Whether `hostname` is a local development host.
#[must_use]
pub fn is_dev_host(hostname: &str) -> bool {
    DEV_HOSTS.contains(&hostname)
}

/// Counts frames and reports the rate roughly once per second.
#[derive(Debug, Clone)]
pub struct FpsSampler {
    frames: u32,
    window_start: Duration,
}

impl FpsSampler {
    #[must_use]
    pub const fn new(now: Duration) -> Self {
        Self {
            frames: 0,
            window_start: now,
        }
    }

    /// Record one frame; returns the rounded rate when a window closes.
    pub fn frame(&mut self, now: Duration) -> Option<u32> {
        self.frames = self.frames.saturating_add(1);
        let elapsed = now.saturating_sub(self.window_start);
        if elapsed < SAMPLE_WINDOW {
            return None;
        }
        let fps = (f64::from(self.frames) / elapsed.as_secs_f64()).round() as u32;
        self.frames = 0;
        self.window_start = now;
        Some(fps)
    }
}
