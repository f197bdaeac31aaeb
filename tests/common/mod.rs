//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::Instant;

use chainio::engine::{
    Broadcaster, ConfirmationPoller, EngineError, EngineResult, FeeParams, SubmissionHandle,
    TxReceipt, TxRequest,
};

/// Broadcaster that replays a script of outcomes, then repeats `fallback`.
pub struct ScriptedBroadcaster {
    script: Mutex<VecDeque<EngineResult<SubmissionHandle>>>,
    fallback: EngineResult<SubmissionHandle>,
    calls: AtomicU32,
    fees: Mutex<Vec<FeeParams>>,
    times: Mutex<Vec<Instant>>,
}

impl ScriptedBroadcaster {
    pub fn new(
        script: Vec<EngineResult<SubmissionHandle>>,
        fallback: EngineResult<SubmissionHandle>,
    ) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            fallback,
            calls: AtomicU32::new(0),
            fees: Mutex::new(Vec::new()),
            times: Mutex::new(Vec::new()),
        })
    }

    pub fn always_failing() -> Arc<Self> {
        Self::new(Vec::new(), Err(rejected()))
    }

    pub fn accepting(hash: &str) -> Arc<Self> {
        Self::new(Vec::new(), Ok(SubmissionHandle::new(hash)))
    }

    /// Fail `failures` times, then accept.
    pub fn failing_then_accepting(failures: usize, hash: &str) -> Arc<Self> {
        Self::new(
            (0..failures).map(|_| Err(rejected())).collect(),
            Ok(SubmissionHandle::new(hash)),
        )
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    /// Fees seen by each attempt, in order.
    pub fn fees(&self) -> Vec<FeeParams> {
        self.fees.lock().unwrap().clone()
    }

    /// When each attempt started.
    pub fn times(&self) -> Vec<Instant> {
        self.times.lock().unwrap().clone()
    }
}

#[async_trait]
impl Broadcaster for ScriptedBroadcaster {
    fn backend(&self) -> &'static str {
        "scripted"
    }

    async fn send(
        &self,
        _request: &TxRequest,
        fee: &mut FeeParams,
    ) -> EngineResult<SubmissionHandle> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.fees.lock().unwrap().push(fee.clone());
        self.times.lock().unwrap().push(Instant::now());
        let next = self.script.lock().unwrap().pop_front();
        next.unwrap_or_else(|| self.fallback.clone())
    }
}

pub fn rejected() -> EngineError {
    EngineError::Broadcast("mempool full".to_string())
}

/// Poller that finds the transaction on the `found_at`-th lookup.
pub struct ScriptedPoller {
    found_at: Option<u32>,
    code: u32,
    calls: AtomicU32,
}

impl ScriptedPoller {
    pub fn finds_on(lookup: u32, code: u32) -> Arc<Self> {
        Arc::new(Self {
            found_at: Some(lookup),
            code,
            calls: AtomicU32::new(0),
        })
    }

    pub fn never_finds() -> Arc<Self> {
        Arc::new(Self {
            found_at: None,
            code: 0,
            calls: AtomicU32::new(0),
        })
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ConfirmationPoller for ScriptedPoller {
    async fn status(&self, handle: &SubmissionHandle) -> EngineResult<Option<TxReceipt>> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        match self.found_at {
            Some(n) if call >= n => Ok(Some(TxReceipt {
                tx_hash: handle.to_string(),
                height: 100 + call as u64,
                code: self.code,
                log: if self.code == 0 {
                    String::new()
                } else {
                    "out of gas".to_string()
                },
                data: Vec::new(),
                gas_used: 21_000,
            })),
            _ => Ok(None),
        }
    }
}

/// A request received by the mock HTTP backend.
#[derive(Debug, Clone)]
pub struct MockRequest {
    pub method: String,
    pub path: String,
    pub body: String,
}

impl MockRequest {
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.body).unwrap_or(serde_json::Value::Null)
    }
}

/// Start a programmable mock HTTP backend on an ephemeral port.
///
/// `handler` maps each request to a status code and body.
pub async fn start_programmable_backend<F>(handler: F) -> SocketAddr
where
    F: Fn(&MockRequest) -> (u16, String) + Send + Sync + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handler = Arc::new(handler);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((socket, _)) => {
                    let handler = handler.clone();
                    tokio::spawn(async move {
                        serve_connection(socket, handler.as_ref()).await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

async fn serve_connection<F>(mut socket: TcpStream, handler: &F)
where
    F: Fn(&MockRequest) -> (u16, String),
{
    let Some(request) = read_request(&mut socket).await else {
        return;
    };
    let (status, body) = handler(&request);

    let status_text = match status {
        200 => "200 OK",
        400 => "400 Bad Request",
        404 => "404 Not Found",
        429 => "429 Too Many Requests",
        500 => "500 Internal Server Error",
        503 => "503 Service Unavailable",
        _ => "200 OK",
    };

    let response = format!(
        "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status_text,
        body.len(),
        body
    );
    let _ = socket.write_all(response.as_bytes()).await;
    let _ = socket.shutdown().await;
}

async fn read_request(socket: &mut TcpStream) -> Option<MockRequest> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let header_end = loop {
        if let Some(pos) = find(&buf, b"\r\n\r\n") {
            break pos + 4;
        }
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let mut lines = head.lines();
    let mut request_line = lines.next()?.split_whitespace();
    let method = request_line.next()?.to_string();
    let path = request_line.next()?.to_string();

    let content_length = lines
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse::<usize>().ok())
        .unwrap_or(0);

    while buf.len() < header_end + content_length {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    let end = (header_end + content_length).min(buf.len());
    let body = String::from_utf8_lossy(&buf[header_end..end]).to_string();

    Some(MockRequest { method, path, body })
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

/// Wrap a JSON-RPC result in a response echoing the request id.
pub fn rpc_result(request: &MockRequest, result: serde_json::Value) -> (u16, String) {
    let id = request.json()["id"].clone();
    (
        200,
        serde_json::json!({ "jsonrpc": "2.0", "id": id, "result": result }).to_string(),
    )
}

/// JSON-RPC error response echoing the request id.
pub fn rpc_error(request: &MockRequest, code: i64, message: &str) -> (u16, String) {
    let id = request.json()["id"].clone();
    (
        200,
        serde_json::json!({
            "jsonrpc": "2.0",
            "id": id,
            "error": { "code": code, "message": message }
        })
        .to_string(),
    )
}
