use serde_json::Value;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Installs the global subscriber. Logs go to stderr so that stdout carries
/// only the JSON result.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Logger struct for handling structured logging
pub struct Logger {
    run_id: String,
}

impl Logger {
    /// Create a new Logger instance
    ///
    /// # Arguments
    ///
    /// * `run_id` - A unique identifier for the current invocation
    pub fn new(run_id: String) -> Self {
        Self { run_id }
    }

    /// Log an info message
    ///
    /// # Arguments
    ///
    /// * `message` - The log message
    /// * `data` - Optional additional data to include in the log
    pub fn info(&self, message: &str, data: Option<Value>) {
        self.log("INFO", message, data);
    }

    /// Log a warning message
    pub fn warn(&self, message: &str, data: Option<Value>) {
        self.log("WARN", message, data);
    }

    /// Log an error message
    pub fn error(&self, message: &str, data: Option<Value>) {
        self.log("ERROR", message, data);
    }

    fn log(&self, level: &str, message: &str, data: Option<Value>) {
        let data = data.map(|d| d.to_string()).unwrap_or_default();

        match level {
            "WARN" => warn!(run_id = %self.run_id, data = %data, "{}", message),
            "ERROR" => error!(run_id = %self.run_id, data = %data, "{}", message),
            _ => info!(run_id = %self.run_id, data = %data, "{}", message),
        }
    }
}

/// Macro to create a JSON object for additional log data
///
/// Usage: log_data!("key1" => "value1", "key2" => 42)
#[macro_export]
macro_rules! log_data {
    ($($key:expr => $value:expr),*) => {
        Some(serde_json::json!({ $($key: $value),* }))
    };
}
