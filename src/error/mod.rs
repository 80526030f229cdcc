//! Error handling for the network analyzer
//!
//! Per-metric failures (`ToolAbsent`, `ParseMiss`, `Timeout`, `Unreachable`)
//! are recovered inside the collectors and turned into absent fields. Only
//! `Config` errors abort a run before collection starts.

use thiserror::Error;

/// Custom error types for the network analyzer
#[derive(Error, Debug)]
pub enum AppError {
    /// Invalid interface name, malformed option or contradictory flags
    #[error("Configuration error: {0}")]
    Config(String),

    /// A required external utility is not installed or not permitted
    #[error("Tool not available: {0}")]
    ToolAbsent(String),

    /// An extractor could not find an expected field
    #[error("Parse miss: {0}")]
    ParseMiss(String),

    /// A command or network probe exceeded its budget
    #[error("Timeout error: {0}")]
    Timeout(String),

    /// A network peer could not be reached
    #[error("Unreachable: {0}")]
    Unreachable(String),

    /// I/O errors (file operations, process spawning)
    #[error("I/O error: {0}")]
    Io(String),

    /// Parsing errors for structured data (JSON, addresses, numbers)
    #[error("Parsing error: {0}")]
    Parse(String),

    /// The run was cancelled by the user or the run-level timeout
    #[error("Cancelled: {0}")]
    Cancelled(String),

    /// Generic internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Constructors, one per category
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config(message.into())
    }

    pub fn tool_absent<S: Into<String>>(message: S) -> Self {
        Self::ToolAbsent(message.into())
    }

    pub fn parse_miss<S: Into<String>>(message: S) -> Self {
        Self::ParseMiss(message.into())
    }

    pub fn timeout<S: Into<String>>(message: S) -> Self {
        Self::Timeout(message.into())
    }

    pub fn unreachable<S: Into<String>>(message: S) -> Self {
        Self::Unreachable(message.into())
    }

    pub fn io<S: Into<String>>(message: S) -> Self {
        Self::Io(message.into())
    }

    pub fn parse<S: Into<String>>(message: S) -> Self {
        Self::Parse(message.into())
    }

    pub fn cancelled<S: Into<String>>(message: S) -> Self {
        Self::Cancelled(message.into())
    }

    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal(message.into())
    }

    /// Get error category for logging and reporting
    pub fn category(&self) -> &'static str {
        match self {
            Self::Config(_) => "CONFIG",
            Self::ToolAbsent(_) => "TOOL",
            Self::ParseMiss(_) => "PARSE_MISS",
            Self::Timeout(_) => "TIMEOUT",
            Self::Unreachable(_) => "UNREACHABLE",
            Self::Io(_) => "IO",
            Self::Parse(_) => "PARSE",
            Self::Cancelled(_) => "CANCELLED",
            Self::Internal(_) => "INTERNAL",
        }
    }

    /// Whether the error only degrades a single metric.
    ///
    /// Degraded metrics become absent fields; the run carries on.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::ToolAbsent(_) | Self::ParseMiss(_) | Self::Timeout(_) | Self::Unreachable(_) => true,
            Self::Config(_) | Self::Io(_) | Self::Parse(_) | Self::Cancelled(_) | Self::Internal(_) => false,
        }
    }

    /// Get user-friendly error message with suggestions
    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::Config(msg) => {
                format!("Configuration problem: {}\n\nSuggestion: Check the interface name (e.g. en0), the --iperf3 address and your .env file.", msg)
            }
            Self::ToolAbsent(msg) => {
                format!("Required tool is missing: {}\n\nSuggestion: This analyzer relies on macOS network utilities (ifconfig, netstat, networksetup, scutil).", msg)
            }
            Self::ParseMiss(msg) => {
                format!("Unexpected command output: {}\n\nSuggestion: Run with --debug to see the raw output that could not be parsed.", msg)
            }
            Self::Timeout(msg) => {
                format!("Operation timed out: {}\n\nSuggestion: Increase the timeout with --timeout or check your network connection.", msg)
            }
            Self::Unreachable(msg) => {
                format!("Network peer unreachable: {}\n\nSuggestion: Check your internet connection or try --mode offline.", msg)
            }
            Self::Io(msg) => {
                format!("File or process operation failed: {}\n\nSuggestion: Check file permissions and disk space.", msg)
            }
            Self::Parse(msg) => {
                format!("Failed to parse data: {}\n\nSuggestion: Check the format of your input data or configuration values.", msg)
            }
            Self::Cancelled(msg) => {
                format!("Analysis cancelled: {}\n\nPartial results may have been reported.", msg)
            }
            Self::Internal(msg) => {
                format!("Internal error: {}\n\nThis is likely a bug. Please report this issue with the error details.", msg)
            }
        }
    }

    /// Get exit code for this error type
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) | Self::Parse(_) => 1,
            Self::Unreachable(_) | Self::ToolAbsent(_) => 2,
            Self::Timeout(_) => 3,
            Self::Io(_) => 5,
            Self::ParseMiss(_) => 6,
            Self::Cancelled(_) => 130,
            Self::Internal(_) => 99,
        }
    }

    /// Same error with `prefix: ` in front of its message
    pub fn prefixed(self, prefix: &str) -> Self {
        let wrap = |message: String| format!("{}: {}", prefix, message);
        match self {
            Self::Config(m) => Self::Config(wrap(m)),
            Self::ToolAbsent(m) => Self::ToolAbsent(wrap(m)),
            Self::ParseMiss(m) => Self::ParseMiss(wrap(m)),
            Self::Timeout(m) => Self::Timeout(wrap(m)),
            Self::Unreachable(m) => Self::Unreachable(wrap(m)),
            Self::Io(m) => Self::Io(wrap(m)),
            Self::Parse(m) => Self::Parse(wrap(m)),
            Self::Cancelled(m) => Self::Cancelled(wrap(m)),
            Self::Internal(m) => Self::Internal(wrap(m)),
        }
    }

    /// Format error for console display with color coding
    pub fn format_for_console(&self, use_color: bool) -> String {
        let category = self.category();
        let message = self.to_string();

        if use_color {
            use colored::Colorize;
            match self {
                Self::Config(_) | Self::Parse(_) => {
                    format!("[{}] {}", category.red().bold(), message.red())
                }
                Self::Unreachable(_) | Self::ToolAbsent(_) => {
                    format!("[{}] {}", category.yellow().bold(), message.yellow())
                }
                Self::Timeout(_) | Self::Cancelled(_) => {
                    format!("[{}] {}", category.blue().bold(), message.blue())
                }
                Self::Io(_) | Self::ParseMiss(_) => {
                    format!("[{}] {}", category.cyan().bold(), message.cyan())
                }
                Self::Internal(_) => {
                    format!("[{}] {}", category.bright_red().bold(), message.bright_red())
                }
            }
        } else {
            format!("[{}] {}", category, message)
        }
    }
}

// Standard library error conversions
impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        if error.kind() == std::io::ErrorKind::NotFound {
            Self::tool_absent(error.to_string())
        } else {
            Self::io(error.to_string())
        }
    }
}

impl From<url::ParseError> for AppError {
    fn from(error: url::ParseError) -> Self {
        Self::parse(format!("URL parse error: {}", error))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(error: serde_json::Error) -> Self {
        Self::parse(format!("JSON parse error: {}", error))
    }
}

impl From<reqwest::Error> for AppError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::timeout(error.to_string())
        } else if error.is_decode() {
            Self::parse(error.to_string())
        } else {
            Self::unreachable(error.to_string())
        }
    }
}

impl From<trust_dns_resolver::error::ResolveError> for AppError {
    fn from(error: trust_dns_resolver::error::ResolveError) -> Self {
        use trust_dns_resolver::error::ResolveErrorKind;
        match error.kind() {
            ResolveErrorKind::Timeout => Self::timeout(error.to_string()),
            _ => Self::unreachable(error.to_string()),
        }
    }
}

impl From<dotenv::Error> for AppError {
    fn from(error: dotenv::Error) -> Self {
        Self::config(format!("Environment file error: {}", error))
    }
}

impl From<std::net::AddrParseError> for AppError {
    fn from(error: std::net::AddrParseError) -> Self {
        Self::parse(format!("IP address parse error: {}", error))
    }
}

/// Custom Result type for the application
pub type Result<T> = std::result::Result<T, AppError>;

/// Adds context to a failure without changing its category, so exit codes
/// stay meaningful
pub trait ErrorContext<T> {
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;

    fn context(self, message: &'static str) -> Result<T>;
}

impl<T, E> ErrorContext<T> for std::result::Result<T, E>
where
    E: Into<AppError>,
{
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.into().prefixed(&f()))
    }

    fn context(self, message: &'static str) -> Result<T> {
        self.with_context(|| message.to_string())
    }
}

/// Error reporter for user feedback on fatal errors
pub struct ErrorReporter {
    pub use_color: bool,
    pub verbose: bool,
}

impl ErrorReporter {
    /// Create a new error reporter
    pub fn new(use_color: bool, verbose: bool) -> Self {
        Self { use_color, verbose }
    }

    /// Report an error to the user
    pub fn report_error(&self, error: &AppError) {
        eprintln!("{}", error.format_for_console(self.use_color));

        if self.verbose {
            eprintln!();
            eprintln!("{}", error.user_friendly_message());
        }
    }
}

impl Default for ErrorReporter {
    fn default() -> Self {
        Self::new(true, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let config_error = AppError::config("Unknown interface 'en9'");
        assert_eq!(config_error.category(), "CONFIG");
        assert!(!config_error.is_recoverable());
        assert_eq!(config_error.exit_code(), 1);

        let absent = AppError::tool_absent("airport");
        assert_eq!(absent.category(), "TOOL");
        assert!(absent.is_recoverable());
        assert_eq!(absent.exit_code(), 2);
    }

    #[test]
    fn test_error_display() {
        let error = AppError::config("Test configuration error");
        let display = error.to_string();
        assert!(display.contains("Configuration error"));
        assert!(display.contains("Test configuration error"));
    }

    #[test]
    fn test_error_categories() {
        let errors = [
            AppError::config("config"),
            AppError::tool_absent("tool"),
            AppError::parse_miss("miss"),
            AppError::timeout("timeout"),
            AppError::unreachable("unreachable"),
            AppError::io("io"),
            AppError::parse("parse"),
            AppError::cancelled("cancelled"),
            AppError::internal("internal"),
        ];

        let expected_categories = [
            "CONFIG", "TOOL", "PARSE_MISS", "TIMEOUT", "UNREACHABLE",
            "IO", "PARSE", "CANCELLED", "INTERNAL",
        ];

        for (error, expected) in errors.iter().zip(expected_categories.iter()) {
            assert_eq!(error.category(), *expected);
        }
    }

    #[test]
    fn test_per_metric_failures_are_recoverable() {
        assert!(AppError::tool_absent("test").is_recoverable());
        assert!(AppError::parse_miss("test").is_recoverable());
        assert!(AppError::timeout("test").is_recoverable());
        assert!(AppError::unreachable("test").is_recoverable());

        assert!(!AppError::config("test").is_recoverable());
        assert!(!AppError::internal("test").is_recoverable());
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(AppError::config("test").exit_code(), 1);
        assert_eq!(AppError::unreachable("test").exit_code(), 2);
        assert_eq!(AppError::timeout("test").exit_code(), 3);
        assert_eq!(AppError::io("test").exit_code(), 5);
        assert_eq!(AppError::cancelled("test").exit_code(), 130);
        assert_eq!(AppError::internal("test").exit_code(), 99);
    }

    #[test]
    fn test_user_friendly_messages() {
        let error = AppError::config("Invalid interface name");
        let message = error.user_friendly_message();
        assert!(message.contains("Configuration problem"));
        assert!(message.contains("Suggestion:"));
        assert!(message.contains("Invalid interface name"));
    }

    #[test]
    fn test_error_conversions() {
        let missing = std::io::Error::new(std::io::ErrorKind::NotFound, "No such file");
        let app_error: AppError = missing.into();
        assert_eq!(app_error.category(), "TOOL");

        let denied = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let app_error: AppError = denied.into();
        assert_eq!(app_error.category(), "IO");

        let addr_error = "not-an-ip".parse::<std::net::IpAddr>().unwrap_err();
        let app_error: AppError = addr_error.into();
        assert_eq!(app_error.category(), "PARSE");
    }

    #[test]
    fn test_error_context() {
        let result: Result<i32> = Err(AppError::unreachable("api.ipify.org"));
        let with_context = result.context("While fetching public IP");

        let error = with_context.unwrap_err();
        assert_eq!(error.category(), "UNREACHABLE");
        assert_eq!(error.to_string(), "Unreachable: While fetching public IP: api.ipify.org");

        let json: Result<serde_json::Value> = serde_json::from_str("{").context("Replay capture");
        assert_eq!(json.unwrap_err().category(), "PARSE");
    }

    #[test]
    fn test_console_format_without_color() {
        let error = AppError::timeout("networkQuality");
        assert_eq!(error.format_for_console(false), "[TIMEOUT] Timeout error: networkQuality");
    }
}
