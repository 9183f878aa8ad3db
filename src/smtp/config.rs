//! Per-session settings

use std::time::Duration;

use crate::smtp::error::SmtpLimits;

/// Product name announced in the greeting
pub const DEFAULT_PRODUCT: &str = "Maillennia ESMTP";

/// Upper bound on a single blocking read, and so on how long a session can
/// go without looking at the shutdown signal
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(1);

/// Error replies tolerated before the session is dropped
pub const DEFAULT_HARD_ERROR_COUNT: usize = 10;

#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Name the server announces in its greeting and HELO replies
    pub hostname: String,
    pub product: String,
    pub read_timeout: Duration,
    /// Longest accepted command line, CRLF included
    pub max_line_length: usize,
    /// Zero disables the limit
    pub hard_error_count: usize,
}

impl SessionConfig {
    pub fn new(hostname: &str) -> Self {
        Self {
            hostname: hostname.to_owned(),
            product: DEFAULT_PRODUCT.to_owned(),
            read_timeout: DEFAULT_READ_TIMEOUT,
            max_line_length: SmtpLimits::COMMAND_LINE_MAX_LENGTH,
            hard_error_count: DEFAULT_HARD_ERROR_COUNT,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::new("localhost")
    }
}
