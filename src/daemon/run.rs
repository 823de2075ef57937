//! Daemon bootstrap: init, serve, shutdown-flush.

use std::fs;
use std::os::unix::net::UnixListener;
use std::path::{Path, PathBuf};

use crossbeam::channel::unbounded;
use tracing::info;

use super::core::Daemon;
use super::ipc::{IpcError, ensure_socket_dir, socket_path};
use super::server::{RequestMessage, run_socket_thread, run_state_loop};
use crate::config::Config;
use crate::core::ListEngine;
use crate::store::JsonStateStore;
use crate::{Error, Result};

/// Options for a daemon run.
pub struct RunOptions {
    pub config: Config,
    /// Socket path override; defaults to the XDG runtime location.
    pub socket: Option<PathBuf>,
}

/// Run the daemon until a shutdown request arrives.
///
/// Binds the socket, builds the engine (generating the universe and loading
/// persisted state), then serves. The shutdown request flushes both blobs
/// before this returns.
pub fn run(options: RunOptions) -> Result<()> {
    let socket = match options.socket {
        Some(path) => {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).map_err(|e| Error::Ipc(IpcError::Io(e)))?;
            }
            path
        }
        None => {
            ensure_socket_dir().map_err(Error::Ipc)?;
            socket_path()
        }
    };
    remove_stale_socket(&socket)?;

    let store = JsonStateStore::open(&options.config.data_dir).map_err(Error::Persist)?;
    let engine = ListEngine::open(options.config.item_count, store);
    let daemon = Daemon::new(engine);

    let listener = UnixListener::bind(&socket).map_err(|e| Error::Ipc(IpcError::Io(e)))?;
    info!(socket = %socket.display(), "listening");

    let (req_tx, req_rx) = unbounded::<RequestMessage>();
    std::thread::spawn(move || run_socket_thread(listener, req_tx));
    run_state_loop(daemon, req_rx);

    let _ = fs::remove_file(&socket);
    info!("daemon stopped");
    Ok(())
}

/// A leftover socket file from a previous run would make bind fail; nothing
/// can be listening on it once we got this far.
fn remove_stale_socket(path: &Path) -> Result<()> {
    if path.exists() {
        fs::remove_file(path).map_err(|e| Error::Ipc(IpcError::Io(e)))?;
    }
    Ok(())
}
