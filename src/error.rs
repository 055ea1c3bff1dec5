use thiserror::Error;

#[derive(Error, Debug)]
pub enum IndexerError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed receipt on input line {line}: {source}")]
    MalformedReceipt {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Postgres database error: {0}")]
    Postgres(#[from] tokio_postgres::Error),
}

/// Failure to decode a base58 value from the input stream.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("invalid base58: {0}")]
    Base58(#[from] bs58::decode::Error),
    #[error("expected {expected} bytes, got {actual}")]
    Length { expected: usize, actual: usize },
}

pub type IndexerResult<T> = Result<T, IndexerError>;
