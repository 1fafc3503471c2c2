use thiserror::Error;

#[derive(Error, Debug)]
pub enum CovidError {
    #[error("invalid query: {message}")]
    InvalidQuery { message: String },

    #[error("transport failure: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("upstream request failed with status {status}: {body}")]
    UpstreamRequest { status: u16, body: String },

    #[error("malformed response: {message}")]
    MalformedResponse { message: String },

    #[error("date sequences diverge: {message}")]
    Misaligned { message: String },

    #[error("CSV processing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("configuration error: {message}")]
    Config { message: String },
}

pub type Result<T> = std::result::Result<T, CovidError>;
