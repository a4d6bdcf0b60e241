//! Configuration management for the image server.
//!
//! This module provides a configuration system that supports:
//! - Command-line arguments via clap
//! - Environment variables with `VIP_` prefix
//! - Sensible defaults for all optional settings
//!
//! # Example
//!
//! ```ignore
//! use vip::config::Config;
//!
//! let config = Config::parse();
//! println!("Listening on {}", config.bind_address());
//! ```
//!
//! # Environment Variables
//!
//! - `VIP_HOST` - Server bind address (default: 0.0.0.0)
//! - `VIP_PORT` - Server port (default: 8080)
//! - `VIP_S3_ENDPOINT` - Custom S3 endpoint for S3-compatible services
//! - `VIP_S3_REGION` - AWS region (default: us-east-1)
//! - `VIP_MAX_WIDTH` - Largest width a client may request (default: 720)
//! - `VIP_CACHE_SIZE` - Variant cache size in bytes (default: 64 MiB)
//! - `VIP_JPEG_QUALITY` - JPEG encode quality (default: 75)
//! - `VIP_WRITE_BACK_CONCURRENCY` - Concurrent background writes (default: 8)
//! - `VIP_CACHE_MAX_AGE` - HTTP cache max-age seconds (default: 3600)
//! - `VIP_CORS_ORIGINS` - Allowed CORS origins, comma-separated

use clap::Parser;

use crate::fetch::{DEFAULT_MAX_WIDTH, DEFAULT_VARIANT_CACHE_CAPACITY, DEFAULT_WRITE_BACK_CONCURRENCY};
use crate::transform::{DEFAULT_JPEG_QUALITY, MAX_JPEG_QUALITY, MIN_JPEG_QUALITY};

// =============================================================================
// Default Values
// =============================================================================

/// Default server host.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default server port.
pub const DEFAULT_PORT: u16 = 8080;

/// Default AWS region.
pub const DEFAULT_REGION: &str = "us-east-1";

/// Default HTTP cache max-age in seconds (1 hour).
pub const DEFAULT_CACHE_MAX_AGE: u32 = 3600;

// =============================================================================
// CLI Arguments
// =============================================================================

/// vip - A read-through image variant server.
///
/// Serves resized and cropped variants of images stored in S3 or
/// S3-compatible storage, persisting each variant next to its original.
#[derive(Parser, Debug, Clone)]
#[command(name = "vip")]
#[command(author, version, about, long_about = None)]
pub struct Config {
    // =========================================================================
    // Server Configuration
    // =========================================================================
    /// Host address to bind the server to.
    #[arg(long, default_value = DEFAULT_HOST, env = "VIP_HOST")]
    pub host: String,

    /// Port to listen on.
    #[arg(short, long, default_value_t = DEFAULT_PORT, env = "VIP_PORT")]
    pub port: u16,

    // =========================================================================
    // S3 Configuration
    // =========================================================================
    /// Custom S3 endpoint URL for S3-compatible services (MinIO, etc.).
    ///
    /// When set, path-style addressing is used.
    #[arg(long, env = "VIP_S3_ENDPOINT")]
    pub s3_endpoint: Option<String>,

    /// AWS region for S3.
    #[arg(long, default_value = DEFAULT_REGION, env = "VIP_S3_REGION")]
    pub s3_region: String,

    // =========================================================================
    // Image Configuration
    // =========================================================================
    /// Largest width a client may request; larger widths are clamped.
    #[arg(long, default_value_t = DEFAULT_MAX_WIDTH, env = "VIP_MAX_WIDTH")]
    pub max_width: u32,

    /// JPEG quality for re-encoded variants (1-100).
    #[arg(long, default_value_t = DEFAULT_JPEG_QUALITY, env = "VIP_JPEG_QUALITY")]
    pub jpeg_quality: u8,

    /// Maximum number of variant writes running in the background.
    #[arg(
        long,
        default_value_t = DEFAULT_WRITE_BACK_CONCURRENCY,
        env = "VIP_WRITE_BACK_CONCURRENCY"
    )]
    pub write_back_concurrency: usize,

    // =========================================================================
    // Cache Configuration
    // =========================================================================
    /// Size of the in-process variant cache in bytes.
    #[arg(long, default_value_t = DEFAULT_VARIANT_CACHE_CAPACITY, env = "VIP_CACHE_SIZE")]
    pub cache_size: usize,

    /// HTTP Cache-Control max-age in seconds.
    #[arg(long, default_value_t = DEFAULT_CACHE_MAX_AGE, env = "VIP_CACHE_MAX_AGE")]
    pub cache_max_age: u32,

    // =========================================================================
    // CORS Configuration
    // =========================================================================
    /// Allowed CORS origins (comma-separated).
    ///
    /// If not specified, allows any origin.
    #[arg(long, env = "VIP_CORS_ORIGINS", value_delimiter = ',')]
    pub cors_origins: Option<Vec<String>>,

    // =========================================================================
    // Logging Configuration
    // =========================================================================
    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,

    /// Disable request tracing.
    #[arg(long, default_value_t = false)]
    pub no_tracing: bool,
}

impl Config {
    /// Validate the configuration and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_width == 0 {
            return Err("max_width must be greater than 0".to_string());
        }

        if self.cache_size == 0 {
            return Err("cache_size must be greater than 0".to_string());
        }

        if self.write_back_concurrency == 0 {
            return Err("write_back_concurrency must be greater than 0".to_string());
        }

        if !(MIN_JPEG_QUALITY..=MAX_JPEG_QUALITY).contains(&self.jpeg_quality) {
            return Err(format!(
                "jpeg_quality must be between {} and {}",
                MIN_JPEG_QUALITY, MAX_JPEG_QUALITY
            ));
        }

        if matches!(&self.s3_endpoint, Some(endpoint) if endpoint.is_empty()) {
            return Err("s3_endpoint must not be empty when set".to_string());
        }

        Ok(())
    }

    /// Get the server bind address as "host:port".
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

// =============================================================================
// Tests
// =============================================================================
