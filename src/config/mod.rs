use crate::utils::validation::MAX_FILE_SIZE;
use std::env;
use std::time::Duration;

/// Server configuration for the upload endpoint
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: "0.0.0.0")
    pub host: String,

    /// Bind port (default: 3001)
    pub port: u16,

    /// Maximum document size in bytes (default: 10 MiB)
    pub max_file_size: u64,

    /// Simulated processing time before the response is sent (default: 2000 ms)
    pub processing_delay: Duration,

    /// Extra body bytes allowed for multipart framing (default: 1 MiB)
    pub multipart_overhead: usize,

    /// Formatter implementation: "passthrough" (default: "passthrough")
    pub formatter_type: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3001,
            max_file_size: MAX_FILE_SIZE,
            processing_delay: Duration::from_millis(2000),
            multipart_overhead: 1024 * 1024, // 1 MiB
            formatter_type: "passthrough".to_string(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let default = Self::default();

        Self {
            host: env::var("HOST").unwrap_or(default.host),

            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.port),

            max_file_size: env::var("MAX_FILE_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.max_file_size),

            processing_delay: env::var("PROCESSING_DELAY_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(default.processing_delay),

            multipart_overhead: env::var("MULTIPART_OVERHEAD")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.multipart_overhead),

            formatter_type: env::var("FORMATTER").unwrap_or(default.formatter_type),
        }
    }

    /// Create config for development and tests (no simulated delay)
    pub fn development() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            processing_delay: Duration::ZERO,
            ..Self::default()
        }
    }

    /// Request body ceiling: document limit plus multipart framing.
    pub fn body_limit(&self) -> usize {
        usize::try_from(self.max_file_size)
            .unwrap_or(usize::MAX)
            .saturating_add(self.multipart_overhead)
    }
}

/// Client configuration: endpoint, limits and cosmetic timings
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Upload endpoint (default: "http://localhost:3001/api/upload")
    pub upload_url: String,

    /// Maximum document size accepted by `select_file` (default: 10 MiB)
    pub max_file_size: u64,

    /// Pause between the 200 response and the success panel (default: 500 ms)
    pub success_delay: Duration,

    /// Pause between "download started" and "download complete" (default: 2000 ms)
    pub download_notice_delay: Duration,

    /// How long a toast stays visible (default: 3000 ms)
    pub toast_duration: Duration,

    /// Bytes per body chunk; one progress event per chunk (default: 64 KiB)
    pub chunk_size: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            upload_url: "http://localhost:3001/api/upload".to_string(),
            max_file_size: MAX_FILE_SIZE,
            success_delay: Duration::from_millis(500),
            download_notice_delay: Duration::from_millis(2000),
            toast_duration: Duration::from_millis(3000),
            chunk_size: 64 * 1024, // 64 KiB
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let default = Self::default();

        Self {
            upload_url: env::var("ABNT_UPLOAD_URL").unwrap_or(default.upload_url),

            max_file_size: env::var("MAX_FILE_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.max_file_size),

            chunk_size: env::var("UPLOAD_CHUNK_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|&size: &usize| size > 0)
                .unwrap_or(default.chunk_size),

            ..default
        }
    }

    /// Config with every cosmetic delay removed
    pub fn immediate() -> Self {
        Self {
            success_delay: Duration::ZERO,
            download_notice_delay: Duration::ZERO,
            ..Self::default()
        }
    }
}
