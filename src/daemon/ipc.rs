//! IPC protocol types and codec.
//!
//! Protocol: newline-delimited JSON (ndjson) over a Unix socket.
//!
//! Request format: `{"op": "items", ...}\n`
//! Response format: `{"ok": ...}\n` or `{"err": {"code": "...", "message": "..."}}\n`
//!
//! Payload shapes match the JSON bodies of the HTTP surface one-for-one
//! (`Page`, item rows, ack-only statuses), so an HTTP gateway can map routes
//! onto ops without reshaping anything.

use std::fs;
use std::io::{BufRead, BufReader, Write};
use std::os::unix::fs::PermissionsExt;
use std::os::unix::net::UnixStream;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::{CoreError, Item, ItemId, Page};
use crate::error::{Effect, Transience};

// =============================================================================
// Request - All IPC requests
// =============================================================================

/// IPC request (query or mutation).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Request {
    // === Queries ===
    /// One page of the filtered, ordered list (`GET /api/items`).
    Items {
        page: u32,
        size: u32,
        #[serde(default)]
        search: Option<String>,
    },

    /// All selected items, unpaginated (`GET /api/items/selected`).
    Selected,

    /// Filtered total only.
    Count {
        #[serde(default)]
        search: Option<String>,
    },

    /// Current custom order (diagnostics/bootstrapping).
    Order,

    // === Mutations ===
    /// Flip one item's selection (`POST /api/items/{id}/toggle`).
    Toggle { id: ItemId },

    /// Install a complete new order (`POST /api/items/reorder`).
    Reorder { order: Vec<ItemId> },

    /// Drop the custom order (`POST /api/items/reset-order`).
    ResetOrder,

    /// Replace the whole selection (batched cache replay).
    SetSelection { ids: Vec<ItemId> },

    // === Control ===
    /// Health check.
    Ping,

    /// Orderly shutdown (flushes persisted state).
    Shutdown,
}

// =============================================================================
// Response - IPC responses
// =============================================================================

/// IPC response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Response {
    Ok { ok: ResponsePayload },
    Err { err: ErrorPayload },
}

impl Response {
    /// Create a success response.
    pub fn ok(payload: ResponsePayload) -> Self {
        Response::Ok { ok: payload }
    }

    /// Create an error response.
    pub fn err(error: impl Into<ErrorPayload>) -> Self {
        Response::Err { err: error.into() }
    }
}

/// Successful response payload.
///
/// Variants are structurally distinct, so untagged decoding is unambiguous;
/// content-free acks all collapse into `Done` and callers rely on knowing
/// which op they sent.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResponsePayload {
    /// Page of items.
    Page(Page),

    /// Unpaginated item list.
    Items(Vec<Item>),

    /// Toggle outcome.
    Toggled { id: ItemId, selected: bool },

    /// Count result.
    #[serde(rename_all = "camelCase")]
    Count { total_count: u64 },

    /// Current custom order.
    Order { order: Vec<ItemId> },

    /// Selection replaced; how many submitted ids matched the store.
    SelectionReplaced { applied: usize },

    /// Content-free success (reorder, reset, ping, shutdown).
    Done,
}

/// Error response payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl From<CoreError> for ErrorPayload {
    fn from(e: CoreError) -> Self {
        let details = serde_json::json!({
            "retryable": e.transience().is_retryable(),
            "effect": e.effect().as_str(),
        });
        ErrorPayload {
            code: e.code().to_string(),
            message: e.to_string(),
            details: Some(details),
        }
    }
}

impl From<IpcError> for ErrorPayload {
    fn from(e: IpcError) -> Self {
        let details = serde_json::json!({
            "retryable": e.transience().is_retryable(),
            "effect": e.effect().as_str(),
        });
        ErrorPayload {
            code: e.code().to_string(),
            message: e.to_string(),
            details: Some(details),
        }
    }
}

// =============================================================================
// IpcError
// =============================================================================

/// IPC-specific errors.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum IpcError {
    #[error("parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("client disconnected")]
    Disconnected,

    #[error("daemon unavailable: {0}")]
    DaemonUnavailable(String),

    /// The daemon answered, but with an error payload.
    #[error("{code}: {message}")]
    Remote { code: String, message: String },

    /// The daemon answered with a payload the caller cannot use.
    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),
}

impl IpcError {
    pub fn code(&self) -> &str {
        match self {
            IpcError::Parse(_) => "parse_error",
            IpcError::Io(_) => "io_error",
            IpcError::Disconnected => "disconnected",
            IpcError::DaemonUnavailable(_) => "daemon_unavailable",
            IpcError::Remote { code, .. } => code,
            IpcError::UnexpectedResponse(_) => "unexpected_response",
        }
    }

    /// Whether retrying the IPC operation may succeed.
    pub fn transience(&self) -> Transience {
        match self {
            IpcError::DaemonUnavailable(_) | IpcError::Io(_) | IpcError::Disconnected => {
                Transience::Retryable
            }
            IpcError::Parse(_) | IpcError::UnexpectedResponse(_) => Transience::Permanent,
            IpcError::Remote { .. } => Transience::Unknown,
        }
    }

    /// What we know about side effects when this IPC error is returned.
    pub fn effect(&self) -> Effect {
        match self {
            IpcError::Io(_) | IpcError::Disconnected | IpcError::Remote { .. } => Effect::Unknown,
            IpcError::DaemonUnavailable(_)
            | IpcError::Parse(_)
            | IpcError::UnexpectedResponse(_) => Effect::None,
        }
    }
}

// =============================================================================
// Codec - Encoding/decoding
// =============================================================================

/// Encode a response to bytes (newline-terminated).
pub fn encode_response(resp: &Response) -> Result<Vec<u8>, IpcError> {
    let mut bytes = serde_json::to_vec(resp)?;
    bytes.push(b'\n');
    Ok(bytes)
}

/// Decode a request from a line.
pub fn decode_request(line: &str) -> Result<Request, IpcError> {
    Ok(serde_json::from_str(line)?)
}

// =============================================================================
// Socket path
// =============================================================================

/// Get the directory that will contain the daemon socket.
pub fn socket_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("XDG_RUNTIME_DIR") {
        PathBuf::from(dir).join("lineup")
    } else if let Ok(home) = std::env::var("HOME") {
        PathBuf::from(home).join(".lineup")
    } else {
        std::env::temp_dir().join("lineup")
    }
}

/// Ensure the socket directory exists and is user-private.
pub fn ensure_socket_dir() -> Result<PathBuf, IpcError> {
    let dir = socket_dir();
    fs::create_dir_all(&dir)?;

    let mode = fs::metadata(&dir)?.permissions().mode() & 0o777;
    if mode != 0o700 {
        fs::set_permissions(&dir, fs::Permissions::from_mode(0o700))?;
    }

    Ok(dir)
}

/// Get the daemon socket path.
pub fn socket_path() -> PathBuf {
    socket_dir().join("daemon.sock")
}

// =============================================================================
// Client - Send requests to the daemon
// =============================================================================

/// Send one request to the daemon at `socket` and wait for its response.
pub fn send_request_to(socket: &Path, request: &Request) -> Result<Response, IpcError> {
    let stream = UnixStream::connect(socket).map_err(|e| {
        IpcError::DaemonUnavailable(format!("connect {}: {e}", socket.display()))
    })?;
    send_request_on(stream, request)
}

/// Send one request to the daemon at the default socket location.
pub fn send_request(request: &Request) -> Result<Response, IpcError> {
    send_request_to(&socket_path(), request)
}

fn send_request_on(stream: UnixStream, request: &Request) -> Result<Response, IpcError> {
    let mut writer = stream.try_clone()?;
    let mut line = serde_json::to_vec(request)?;
    line.push(b'\n');
    writer.write_all(&line)?;
    writer.flush()?;

    let mut reader = BufReader::new(stream);
    let mut buf = String::new();
    if reader.read_line(&mut buf)? == 0 {
        return Err(IpcError::Disconnected);
    }
    Ok(serde_json::from_str(buf.trim_end())?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_decodes_from_gateway_shapes() {
        let req = decode_request(r#"{"op":"items","page":0,"size":20}"#).unwrap();
        assert!(matches!(
            req,
            Request::Items {
                page: 0,
                size: 20,
                search: None
            }
        ));

        let req = decode_request(r#"{"op":"reorder","order":[3,1]}"#).unwrap();
        match req {
            Request::Reorder { order } => {
                assert_eq!(order, vec![ItemId::new(3), ItemId::new(1)]);
            }
            other => panic!("unexpected request: {other:?}"),
        }
    }

    #[test]
    fn page_payload_uses_http_field_names() {
        let response = Response::ok(ResponsePayload::Page(Page {
            items: Vec::new(),
            total_count: 7,
            has_more: true,
        }));
        let bytes = encode_response(&response).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert_eq!(
            text,
            "{\"ok\":{\"items\":[],\"totalCount\":7,\"hasMore\":true}}\n"
        );
    }

    #[test]
    fn ack_and_error_round_trip() {
        let ok = Response::ok(ResponsePayload::Done);
        let bytes = encode_response(&ok).unwrap();
        let parsed: Response = serde_json::from_slice(&bytes).unwrap();
        assert!(matches!(
            parsed,
            Response::Ok {
                ok: ResponsePayload::Done
            }
        ));

        let err = Response::err(CoreError::EmptyOrder);
        let bytes = encode_response(&err).unwrap();
        let parsed: Response = serde_json::from_slice(&bytes).unwrap();
        match parsed {
            Response::Err { err } => {
                assert_eq!(err.code, "invalid_request");
                let details = err.details.unwrap();
                assert_eq!(details["retryable"], false);
            }
            other => panic!("unexpected response: {other:?}"),
        }
    }

    #[test]
    fn toggled_payload_round_trips() {
        let response = Response::ok(ResponsePayload::Toggled {
            id: ItemId::new(5),
            selected: true,
        });
        let bytes = encode_response(&response).unwrap();
        let parsed: Response = serde_json::from_slice(&bytes).unwrap();
        match parsed {
            Response::Ok {
                ok: ResponsePayload::Toggled { id, selected },
            } => {
                assert_eq!(id, ItemId::new(5));
                assert!(selected);
            }
            other => panic!("unexpected response: {other:?}"),
        }
    }
}
