use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Data unavailable: {0}")]
    DataUnavailable(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Email delivery error: {0}")]
    Email(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Scheduler error: {0}")]
    Scheduler(String),
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AppError::Email(format!("timed out: {}", err))
        } else {
            AppError::Email(err.to_string())
        }
    }
}

impl From<tokio_cron_scheduler::JobSchedulerError> for AppError {
    fn from(err: tokio_cron_scheduler::JobSchedulerError) -> Self {
        AppError::Scheduler(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
