//! Shared constants for scribe.

/// Default HTTP port for `scribe serve`.
pub const DEFAULT_PORT: u16 = 3000;

/// Default bind address for `scribe serve`.
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default record lifetime in hours.
///
/// Deployments that keep transcriptions for a month set `store.ttl_hours`
/// to 720 instead.
pub const DEFAULT_TTL_HOURS: u64 = 24;

/// TTL above which config validation warns.
pub const LONG_TTL_HOURS: u64 = 30 * 24;

/// Largest accepted audio upload (25 MiB).
pub const MAX_FILE_SIZE: u64 = 25 * 1024 * 1024;

/// Default interval between background sweeps.
pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 300;

/// Extra request body allowance on top of the file for multipart framing.
pub const MULTIPART_OVERHEAD_BYTES: usize = 1024 * 1024;

/// MIME types accepted for upload.
pub const ALLOWED_MIME_TYPES: &[&str] = &[
    "audio/mpeg",
    "audio/wav",
    "audio/mp3",
    "audio/m4a",
    "audio/ogg",
    "audio/webm",
    "audio/x-mpeg-3",
    "audio/x-wav",
];

/// Config file looked up in the working directory when `--config` is absent.
pub const CONFIG_FILE: &str = "scribe.toml";
