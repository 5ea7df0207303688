use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Automation call failed: {0}")]
    Automation(String),

    #[error("Automation host error: {0}")]
    Host(String),

    #[error("Window system error: {0}")]
    Window(String),

    #[error("Failed to launch IDE: {0}")]
    Launch(String),

    #[error("Gave up waiting for {what} after {polls} polls")]
    PollExhausted { what: String, polls: u32 },

    #[error("Migration report error: {0}")]
    Report(String),

    #[error("Operator prompt failed: {0}")]
    Prompt(String),

    #[error("Run cancelled by operator")]
    Cancelled,

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl AppError {
    /// Operator cancellation escapes every retry loop and error boundary.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, AppError::Cancelled)
    }
}

impl From<dialoguer::Error> for AppError {
    fn from(e: dialoguer::Error) -> Self {
        AppError::Prompt(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
