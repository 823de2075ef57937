//! Server thread loops.
//!
//! Two thread groups:
//! - Socket acceptor - accepts connections, spawns a handler per client
//! - State thread - owns the Daemon, processes requests sequentially
//!
//! The state thread is THE serialization point: every query and mutation
//! crosses it, so callers always observe a consistent snapshot and a
//! mutation's persist completes before its response is sent.

use std::io::{BufRead, BufReader, Write};
use std::os::unix::net::{UnixListener, UnixStream};

use crossbeam::channel::{Receiver, Sender};
use tracing::{error, info};

use super::core::Daemon;
use super::ipc::{ErrorPayload, Request, Response, decode_request, encode_response};
use crate::store::StateStore;

/// Message sent from socket handlers to the state thread.
pub struct RequestMessage {
    pub request: Request,
    pub respond: Sender<Response>,
}

/// Run the state thread loop.
///
/// Returns after serving a shutdown request, or when every handler hung up.
pub fn run_state_loop<S: StateStore>(mut daemon: Daemon<S>, req_rx: Receiver<RequestMessage>) {
    loop {
        match req_rx.recv() {
            Ok(RequestMessage { request, respond }) => {
                let is_shutdown = matches!(request, Request::Shutdown);
                let response = daemon.handle_request(request);
                let _ = respond.send(response);

                if is_shutdown {
                    info!("state thread exiting on shutdown request");
                    return;
                }
            }
            Err(_) => {
                // Channel closed - time to exit
                return;
            }
        }
    }
}

/// Run the socket acceptor.
///
/// Accepts connections and spawns a handler thread for each.
pub fn run_socket_thread(listener: UnixListener, req_tx: Sender<RequestMessage>) {
    for stream in listener.incoming() {
        match stream {
            Ok(stream) => {
                let req_tx = req_tx.clone();
                std::thread::spawn(move || handle_client(stream, req_tx));
            }
            Err(e) => {
                error!("accept error: {e}");
            }
        }
    }
}

/// Handle a single client connection.
///
/// Reads requests, sends to the state thread, waits for the response, writes
/// it back.
fn handle_client(stream: UnixStream, req_tx: Sender<RequestMessage>) {
    let reader = match stream.try_clone() {
        Ok(reader) => reader,
        Err(e) => {
            error!("failed to clone stream: {e}");
            return;
        }
    };
    let reader = BufReader::new(reader);
    let mut writer = stream;

    for line in reader.lines() {
        let line = match line {
            Ok(line) => line,
            Err(_) => break, // Client disconnected
        };

        if line.trim().is_empty() {
            continue;
        }

        let request = match decode_request(&line) {
            Ok(request) => request,
            Err(e) => {
                let response = Response::err(ErrorPayload {
                    code: "parse_error".into(),
                    message: e.to_string(),
                    details: None,
                });
                if write_response(&mut writer, &response).is_err() {
                    break;
                }
                continue;
            }
        };

        let is_shutdown = matches!(request, Request::Shutdown);

        // Send to state thread, wait for response
        let (respond_tx, respond_rx) = crossbeam::channel::bounded(1);
        if req_tx
            .send(RequestMessage {
                request,
                respond: respond_tx,
            })
            .is_err()
        {
            break; // State thread exited
        }

        let response = match respond_rx.recv() {
            Ok(response) => response,
            Err(_) => break, // State thread exited
        };

        if write_response(&mut writer, &response).is_err() {
            break;
        }

        // If shutdown, close connection
        if is_shutdown {
            break;
        }
    }
}

fn write_response(writer: &mut UnixStream, response: &Response) -> std::io::Result<()> {
    let bytes = match encode_response(response) {
        Ok(bytes) => bytes,
        Err(e) => {
            let message = e.to_string().replace('"', "\\\"");
            format!("{{\"err\":{{\"code\":\"internal\",\"message\":\"{message}\"}}}}\n")
                .into_bytes()
        }
    };
    writer.write_all(&bytes)?;
    writer.flush()
}
