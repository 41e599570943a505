use super::RequestsLoggingLevel;

/// Default archive limit, matching a 500 MB storage bucket.
pub const DEFAULT_MAX_ARCHIVE_BYTES: usize = 500 * 1024 * 1024;

#[derive(Clone)]
pub struct ServerConfig {
    pub requests_logging_level: RequestsLoggingLevel,
    pub port: u16,
    pub frontend_dir_path: Option<String>,
    /// Request body limit of the archive upload routes.
    pub max_archive_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            requests_logging_level: RequestsLoggingLevel::Path,
            port: 3001,
            frontend_dir_path: None,
            max_archive_bytes: DEFAULT_MAX_ARCHIVE_BYTES,
        }
    }
}
