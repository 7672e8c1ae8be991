// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants

use std::time::Duration;

/// How many processors a chain may hold before further additions are refused
///
/// The guard trips when the chain length is already *greater* than this value,
/// so a chain can reach `PROCESSOR_MAX_COUNT + 1` entries.
pub const PROCESSOR_MAX_COUNT: usize = 10;

/// Status text shown once the kill switch has been tripped
pub const DISABLED_MESSAGE: &str = "Velvet is disabled. Cannot continue.";

/// Bytes per interleaved RGBA pixel
pub const CHANNELS: usize = 4;

/// Names of the processors every registry ships with
pub mod processors {
    /// sRGB-encoded luminance
    pub const GRAYSCALE: &str = "grayscale";

    /// Spatially varying pattern driven by the pixel index
    pub const MODULUS: &str = "modulus";

    /// Processors enabled when none are requested on the command line
    pub const DEFAULT_ACTIVE: &[&str] = &[GRAYSCALE];
}

/// Capture defaults
pub mod capture {
    use super::Duration;

    /// Preferred capture width, the device picks the nearest it supports
    pub const DEFAULT_WIDTH: u32 = 1280;

    /// Preferred capture height
    pub const DEFAULT_HEIGHT: u32 = 720;

    /// Device opened when none is configured
    pub const DEFAULT_DEVICE: &str = "/dev/video0";

    /// Memory-mapped buffers requested from the driver
    pub const BUFFER_COUNT: u32 = 4;

    /// Frames buffered between the capture thread and the pipeline
    pub const CHANNEL_CAPACITY: usize = 4;

    /// Back-off after a failed dequeue
    pub const RETRY_DELAY: Duration = Duration::from_millis(10);

    /// How long `open` waits for the capture thread to map its buffers
    pub const START_TIMEOUT: Duration = Duration::from_secs(5);

    /// Log every Nth captured frame
    pub const FRAME_LOG_INTERVAL: u64 = 60;
}

/// Loop scheduling
pub mod timing {
    use super::Duration;

    /// Display refresh rate assumed when none is configured
    pub const DEFAULT_REFRESH_RATE_HZ: u32 = 60;

    /// Log pipeline statistics every Nth tick
    pub const FRAME_LOG_INTERVAL: u64 = 30;

    /// Interval between two refreshes at the given rate
    pub fn refresh_interval(rate_hz: u32) -> Duration {
        Duration::from_secs_f64(1.0 / rate_hz.max(1) as f64)
    }
}

/// Supported still-image sources and snapshot output
pub mod file_formats {
    /// Supported image file extensions
    pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "bmp", "webp"];

    /// Extension used for saved snapshots
    pub const SNAPSHOT_EXTENSION: &str = "png";

    /// Check if a file extension is a supported image format
    pub fn is_image_extension(ext: &str) -> bool {
        IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str())
    }
}

/// Application information utilities
pub mod app_info {
    /// Application name, used for config and snapshot directories
    pub const APP_NAME: &str = "velvet";

    /// Get the application version from build-time environment
    pub fn version() -> &'static str {
        env!("GIT_VERSION")
    }
}
