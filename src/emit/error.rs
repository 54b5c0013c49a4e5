use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SinkParseError {
    #[error("file sink must be 'file:<path>' with a non-empty path")]
    EmptyPath,
    #[error("tcp sink must be 'tcp:<host>:<port>' with a non-empty host without ':'")]
    BadHost,
    #[error("tcp port must be 1..65535, got '{0}'")]
    BadPort(String),
    #[error("unsupported output '{0}', expected 'stdout', 'file:<path>' or 'tcp:<host>:<port>'")]
    Unsupported(String),
}

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("connect to {0} timed out")]
    ConnectTimeout(String),
}
