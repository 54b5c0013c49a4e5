use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;

use crate::emit::error::{SinkError, SinkParseError};

const TCP_CONNECT_TIMEOUT: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sink {
    Stdout,
    File(PathBuf),
    Tcp { host: String, port: u16 },
}

impl FromStr for Sink {
    type Err = SinkParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "stdout" {
            return Ok(Sink::Stdout);
        }
        if let Some(path) = s.strip_prefix("file:") {
            if path.is_empty() {
                return Err(SinkParseError::EmptyPath);
            }
            return Ok(Sink::File(PathBuf::from(path)));
        }
        if let Some(rest) = s.strip_prefix("tcp:") {
            let (host, port) = rest.rsplit_once(':').ok_or(SinkParseError::BadHost)?;
            if host.is_empty() || host.contains(':') {
                return Err(SinkParseError::BadHost);
            }
            let digits = !port.is_empty() && port.bytes().all(|b| b.is_ascii_digit());
            let port = match port.parse::<u16>() {
                Ok(p) if digits && p > 0 => p,
                _ => return Err(SinkParseError::BadPort(port.to_string())),
            };
            return Ok(Sink::Tcp {
                host: host.to_string(),
                port,
            });
        }
        Err(SinkParseError::Unsupported(s.to_string()))
    }
}

impl fmt::Display for Sink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sink::Stdout => write!(f, "stdout"),
            Sink::File(path) => write!(f, "file:{}", path.display()),
            Sink::Tcp { host, port } => write!(f, "tcp:{}:{}", host, port),
        }
    }
}

impl Sink {
    /// Writes `line` plus a newline.
    pub async fn deliver(&self, line: &str) -> Result<(), SinkError> {
        let payload = format!("{}\n", line);
        match self {
            Sink::Stdout => {
                let mut out = tokio::io::stdout();
                out.write_all(payload.as_bytes()).await?;
                out.flush().await?;
            }
            Sink::File(path) => {
                let mut file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .await?;
                file.write_all(payload.as_bytes()).await?;
                file.flush().await?;
            }
            Sink::Tcp { host, port } => {
                let addr = format!("{}:{}", host, port);
                let mut stream = tokio::time::timeout(TCP_CONNECT_TIMEOUT, TcpStream::connect(&addr))
                    .await
                    .map_err(|_| SinkError::ConnectTimeout(addr.clone()))??;
                stream.write_all(payload.as_bytes()).await?;
                stream.shutdown().await?;
            }
        }
        Ok(())
    }
}
