use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScheduleError {
    #[error("Browser error: {0}")]
    Browser(String),
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Selector error: {0}")]
    Selector(String),
    #[error("Calendar error: {0}")]
    Calendar(String),
    #[error("No {team} {age_group} Academy Division events found (try adjusting selectors or wait for fixtures).")]
    NoEvents { team: String, age_group: String },
    #[error("{0}")]
    Other(String),
}

impl ScheduleError {
    /// Process exit status for this failure.
    pub fn exit_code(&self) -> u8 {
        match self {
            ScheduleError::NoEvents { .. } => 2,
            _ => 1,
        }
    }
}

impl From<chromiumoxide::error::CdpError> for ScheduleError {
    fn from(e: chromiumoxide::error::CdpError) -> Self {
        ScheduleError::Browser(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ScheduleError>;
