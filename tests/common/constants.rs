//! Shared constants for end-to-end tests
//!
//! When test data changes (user credentials, archive contents, etc.),
//! update only this file.

// ============================================================================
// Test User Credentials
// ============================================================================

/// Admin test user handle
pub const ADMIN_USER: &str = "admin";

/// Admin test user password
pub const ADMIN_PASS: &str = "adminpass123";

// ============================================================================
// Test Archive Contents
// ============================================================================

/// Minimal bytes that `infer` recognizes as MP3 (ID3 tag header)
pub const MP3_BYTES: &[u8] = b"ID3\x03\x00\x00\x00\x00\x00\x00fake-audio";

/// Minimal bytes that `infer` recognizes as PNG
pub const PNG_BYTES: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];

/// CD metadata sent with uploads
pub const CD_TITLE: &str = "First Album";
pub const CD_ARTIST: &str = "The Test Band";
pub const CD_GENRE: &str = "Rock";

// ============================================================================
// Test Timeouts and Configuration
// ============================================================================

/// Maximum time to wait for server to become ready (milliseconds)
pub const SERVER_READY_TIMEOUT_MS: u64 = 5000;

/// Timeout for individual HTTP requests (seconds)
pub const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Polling interval when waiting for server ready (milliseconds)
pub const SERVER_READY_POLL_INTERVAL_MS: u64 = 50;

/// Archive size limit of the test server
pub const TEST_MAX_ARCHIVE_BYTES: usize = 1024 * 1024;
