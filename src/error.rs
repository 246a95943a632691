use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("API error: {0}")]
    Api(#[from] api::ApiError),
}

pub type Result<T> = std::result::Result<T, ServerError>;
