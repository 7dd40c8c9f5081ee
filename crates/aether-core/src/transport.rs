//! Stream-socket transport to the prediction daemon.
//!
//! The one-shot path (`request_line` / `predict` / `ping`) opens a fresh
//! connection per call: connect, send one frame, read one line, close.
//! Every failure is silent (`None`); the daemon being down must never
//! surface as an error to the host.
//!
//! The streaming path (`connect_stream`) hands a long-lived connection to
//! the worker, with low-latency socket options applied.

use std::fmt;
use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpStream;
#[cfg(unix)]
use std::os::unix::net::UnixStream;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tracing::debug;

use crate::config;
use crate::protocol::{
    self, DaemonRequest, PredictRequest, PredictResult, RequestBody, ResponseBody,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DaemonEndpoint {
    Unix(PathBuf),
    Tcp(String, u16),
}

impl fmt::Display for DaemonEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DaemonEndpoint::Unix(path) => write!(f, "unix:{}", path.display()),
            DaemonEndpoint::Tcp(host, port) => write!(f, "{host}:{port}"),
        }
    }
}

/// Prediction request seam. Lets sessions run against a stub in tests and
/// against [`DaemonTransport`] in production.
pub trait PredictClient: Send + Sync {
    fn predict(&self, request: PredictRequest) -> Option<PredictResult>;

    fn ping(&self) -> bool {
        false
    }
}

pub struct DaemonTransport {
    endpoint: DaemonEndpoint,
    next_id: AtomicU64,
}

impl DaemonTransport {
    pub fn new(endpoint: DaemonEndpoint) -> Self {
        Self {
            endpoint,
            next_id: AtomicU64::new(0),
        }
    }

    pub fn from_env() -> Self {
        Self::new(config::daemon_endpoint_from_env())
    }

    pub fn endpoint(&self) -> &DaemonEndpoint {
        &self.endpoint
    }

    /// Send one frame, return the first response line. The frame may or may
    /// not carry its own newline terminator.
    pub fn request_line(&self, frame: &str) -> Option<String> {
        let stream = connect(&self.endpoint)?;
        exchange(stream, frame)
    }
}

impl PredictClient for DaemonTransport {
    fn predict(&self, request: PredictRequest) -> Option<PredictResult> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let frame = DaemonRequest {
            id: id.to_string(),
            body: RequestBody::Predict(request),
        };
        let line = protocol::encode_line(&frame).ok()?;
        let reply = self.request_line(&line)?;
        match protocol::decode_response(&reply) {
            Ok(response) => match response.body {
                ResponseBody::Predict(result) => Some(result),
                ResponseBody::Error(error) => {
                    debug!(code = ?error.code, "daemon returned error frame");
                    None
                }
                ResponseBody::Pong => None,
            },
            Err(error) => {
                debug!(%error, "undecodable daemon response");
                None
            }
        }
    }

    fn ping(&self) -> bool {
        let Ok(line) = protocol::encode_line(&DaemonRequest::ping()) else {
            return false;
        };
        match self.request_line(&line) {
            Some(reply) => matches!(
                protocol::decode_response(&reply),
                Ok(response) if response.body == ResponseBody::Pong
            ),
            None => false,
        }
    }
}

fn exchange<S: Read + Write>(mut stream: S, frame: &str) -> Option<String> {
    stream.write_all(frame.as_bytes()).ok()?;
    if !frame.ends_with('\n') {
        stream.write_all(b"\n").ok()?;
    }
    let mut reader = BufReader::new(stream);
    let mut line = String::new();
    let read = reader.read_line(&mut line).ok()?;
    if read == 0 {
        return None;
    }
    while line.ends_with('\n') || line.ends_with('\r') {
        line.pop();
    }
    if line.is_empty() {
        None
    } else {
        Some(line)
    }
}

// ---------------------------------------------------------------------------
// Streaming connections for the worker
// ---------------------------------------------------------------------------

pub(crate) enum Stream {
    Tcp(TcpStream),
    #[cfg(unix)]
    Unix(UnixStream),
}

impl Read for Stream {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match self {
            Stream::Tcp(stream) => stream.read(buf),
            #[cfg(unix)]
            Stream::Unix(stream) => stream.read(buf),
        }
    }
}

impl Write for Stream {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match self {
            Stream::Tcp(stream) => stream.write(buf),
            #[cfg(unix)]
            Stream::Unix(stream) => stream.write(buf),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match self {
            Stream::Tcp(stream) => stream.flush(),
            #[cfg(unix)]
            Stream::Unix(stream) => stream.flush(),
        }
    }
}

fn connect(endpoint: &DaemonEndpoint) -> Option<Stream> {
    match endpoint {
        DaemonEndpoint::Tcp(host, port) => {
            let stream = TcpStream::connect((host.as_str(), *port)).ok()?;
            let _ = stream.set_nodelay(true);
            Some(Stream::Tcp(stream))
        }
        #[cfg(unix)]
        DaemonEndpoint::Unix(path) => UnixStream::connect(path).ok().map(Stream::Unix),
        #[cfg(not(unix))]
        DaemonEndpoint::Unix(_) => None,
    }
}

/// Connect for streaming use: bounded reads so the worker can poll the
/// socket and its stop flag in turn.
pub(crate) fn connect_stream(
    endpoint: &DaemonEndpoint,
    read_timeout: Duration,
) -> Option<Stream> {
    let stream = connect(endpoint)?;
    let ok = match &stream {
        Stream::Tcp(tcp) => tcp.set_read_timeout(Some(read_timeout)).is_ok(),
        #[cfg(unix)]
        Stream::Unix(unix) => unix.set_read_timeout(Some(read_timeout)).is_ok(),
    };
    ok.then_some(stream)
}
