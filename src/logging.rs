use std::fmt;
use std::fmt::Formatter;
use tracing_subscriber::EnvFilter;

#[derive(Debug)]
pub struct LoggingError(pub String);
impl fmt::Display for LoggingError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "LoggingError: {}", self.0)
    }
}

/// Installs the global subscriber, log records from the log macros are forwarded to it
///
/// # Arguments
///
/// * 'level' - default filter, RUST_LOG takes precedence when set
pub fn setup_logger(level: &str) -> Result<(), LoggingError> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .map_err(|e| LoggingError(e.to_string()))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .map_err(|e| LoggingError(e.to_string()))
}
