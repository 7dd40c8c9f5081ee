//! Background transport worker for the streaming engine protocol.
//!
//! One thread owns the socket: it drains the outbox in enqueue order, polls
//! for response bytes with a short timeout, reassembles newline-delimited
//! frames, and hands decoded suggestions to the registered callback in
//! receive order. Request/response matching by id is the caller's job.
//!
//! The worker never blocks shutdown: reconnect backoff sleeps in short
//! chunks and the stop flag is observed every iteration.

use std::collections::VecDeque;
use std::io::{ErrorKind, Read, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use tracing::{info, warn};

use crate::protocol::{self, CancelRequest, EngineRequest, EngineResponse, SuggestRequest,
    SuggestionResponse};
use crate::settings::settings;
use crate::transport::{connect_stream, DaemonEndpoint, Stream};

pub type SuggestionCallback = Box<dyn Fn(SuggestionResponse) + Send + 'static>;

struct Shared {
    outbox: Mutex<VecDeque<String>>,
    endpoint: Mutex<DaemonEndpoint>,
    stop: AtomicBool,
}

pub struct PredictionWorker {
    shared: Arc<Shared>,
    handle: Option<thread::JoinHandle<()>>,
}

impl PredictionWorker {
    pub fn start(endpoint: DaemonEndpoint, callback: SuggestionCallback) -> Self {
        let shared = Arc::new(Shared {
            outbox: Mutex::new(VecDeque::new()),
            endpoint: Mutex::new(endpoint),
            stop: AtomicBool::new(false),
        });
        let handle = thread::Builder::new()
            .name("aether-transport".into())
            .spawn({
                let shared = Arc::clone(&shared);
                move || worker_loop(shared, callback)
            })
            .expect("failed to spawn transport worker");
        Self {
            shared,
            handle: Some(handle),
        }
    }

    /// Swap the endpoint; takes effect on the next (re)connect.
    pub fn set_endpoint(&self, endpoint: DaemonEndpoint) {
        if let Ok(mut current) = self.shared.endpoint.lock() {
            *current = endpoint;
        }
    }

    pub fn send_suggest(&self, request: SuggestRequest) {
        if let Ok(line) = protocol::encode_line(&EngineRequest::Suggest(request)) {
            self.enqueue(line);
        }
    }

    /// Fire-and-forget: the worker does not wait for a cancel ack.
    pub fn send_cancel(&self, request_id: String) {
        if let Ok(line) = protocol::encode_line(&EngineRequest::Cancel(CancelRequest {
            request_id,
        })) {
            self.enqueue(line);
        }
    }

    fn enqueue(&self, line: String) {
        if let Ok(mut outbox) = self.shared.outbox.lock() {
            outbox.push_back(line);
        }
    }

    pub fn stop(&mut self) {
        self.shared.stop.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
        if let Ok(mut outbox) = self.shared.outbox.lock() {
            outbox.clear();
        }
    }
}

impl Drop for PredictionWorker {
    fn drop(&mut self) {
        self.stop();
    }
}

fn worker_loop(shared: Arc<Shared>, callback: SuggestionCallback) {
    let transport = &settings().transport;
    let poll = Duration::from_millis(transport.poll_interval_ms);
    let backoff_chunk = Duration::from_millis(transport.reconnect_chunk_ms);
    let backoff_chunks =
        (transport.reconnect_budget_ms / transport.reconnect_chunk_ms.max(1)).max(1);

    let mut stream: Option<Stream> = None;
    let mut pending: Vec<u8> = Vec::with_capacity(4096);
    let mut recv_buf = [0u8; 2048];

    loop {
        if shared.stop.load(Ordering::SeqCst) {
            break;
        }

        if stream.is_none() {
            let endpoint = match shared.endpoint.lock() {
                Ok(endpoint) => endpoint.clone(),
                Err(_) => break,
            };
            match connect_stream(&endpoint, poll) {
                Some(connected) => {
                    info!(%endpoint, "transport connected");
                    pending.clear();
                    stream = Some(connected);
                }
                None => {
                    for _ in 0..backoff_chunks {
                        if shared.stop.load(Ordering::SeqCst) {
                            break;
                        }
                        thread::sleep(backoff_chunk);
                    }
                    continue;
                }
            }
        }

        // Drain the outbox in enqueue order.
        let mut send_failed = false;
        loop {
            let frame = {
                let Ok(mut outbox) = shared.outbox.lock() else {
                    break;
                };
                match outbox.pop_front() {
                    Some(frame) => frame,
                    None => break,
                }
            };
            let Some(connected) = stream.as_mut() else {
                break;
            };
            if connected.write_all(frame.as_bytes()).is_err() {
                warn!("transport send failed; reconnecting");
                send_failed = true;
                break;
            }
        }
        if send_failed {
            stream = None;
            continue;
        }

        // Poll for response bytes; the read timeout doubles as the loop tick.
        let Some(connected) = stream.as_mut() else {
            continue;
        };
        match connected.read(&mut recv_buf) {
            Ok(0) => {
                warn!("transport closed by peer; reconnecting");
                stream = None;
            }
            Ok(read) => {
                pending.extend_from_slice(&recv_buf[..read]);
                deliver_complete_lines(&mut pending, &callback);
            }
            Err(error)
                if error.kind() == ErrorKind::WouldBlock
                    || error.kind() == ErrorKind::TimedOut => {}
            Err(error) => {
                warn!(%error, "transport read failed; reconnecting");
                stream = None;
            }
        }
    }
}

fn deliver_complete_lines(pending: &mut Vec<u8>, callback: &SuggestionCallback) {
    while let Some(newline) = pending.iter().position(|&byte| byte == b'\n') {
        let line: Vec<u8> = pending.drain(..=newline).collect();
        let line = &line[..line.len() - 1];
        let Ok(text) = std::str::from_utf8(line) else {
            continue;
        };
        match protocol::decode_engine_response(text) {
            Ok(EngineResponse::Suggestion(response)) => callback(response),
            Err(_) => {
                // Unknown or malformed frame: no result for anyone.
            }
        }
    }
}
