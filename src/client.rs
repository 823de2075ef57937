//! Client-side reorder protocol and cache replay.
//!
//! The drag-and-drop client removes the moved row from its old position,
//! reinserts it relative to the drop target, then submits the complete
//! visible id sequence wholesale; the server never computes diffs. This
//! module holds that computation plus the startup replay of a client's
//! cached order/selection mirror.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::core::{Item, ItemId, Page};
use crate::daemon::ipc::{IpcError, Request, Response, ResponsePayload, send_request_to};

// =============================================================================
// Reorder protocol
// =============================================================================

/// Which half of the drop target's bounding box the pointer landed in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DropHalf {
    /// Upper half: insert before the target.
    Upper,
    /// Lower half: insert after the target.
    Lower,
}

impl DropHalf {
    /// Classify a pointer offset within a box of the given height.
    pub fn from_pointer(offset: f64, height: f64) -> Self {
        if offset > height / 2.0 {
            DropHalf::Lower
        } else {
            DropHalf::Upper
        }
    }
}

/// Reinsert the dragged row and return the complete new visible sequence.
///
/// Mirrors the DOM mutation: the dragged element is removed first, so the
/// insertion index shifts down by one when the dragged row preceded the
/// target. `None` when an index is out of bounds or the row was dropped on
/// itself.
pub fn reinsert(
    visible: &[ItemId],
    dragged: usize,
    target: usize,
    half: DropHalf,
) -> Option<Vec<ItemId>> {
    if dragged >= visible.len() || target >= visible.len() || dragged == target {
        return None;
    }

    let mut order = visible.to_vec();
    let moved = order.remove(dragged);

    let mut insert_at = match half {
        DropHalf::Upper => target,
        DropHalf::Lower => target + 1,
    };
    if dragged < target {
        insert_at -= 1;
    }

    order.insert(insert_at, moved);
    Some(order)
}

// =============================================================================
// Cache replay
// =============================================================================

/// A client's best-effort local mirror of order and selection.
///
/// Loss or staleness of this cache never corrupts server state: replay skips
/// what the server rejects, and unknown ids are ignored server-side.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CachedState {
    #[serde(default)]
    pub order: Vec<ItemId>,

    #[serde(default)]
    pub selected: Vec<ItemId>,
}

/// Outcome of a replay pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReplaySummary {
    /// The cached order was accepted by the server.
    pub order_restored: bool,
    /// How many cached ids the server matched, when the selection was pushed.
    pub selection_applied: Option<usize>,
}

/// Replay a cached mirror against a running daemon.
///
/// Order first, then selection, each best-effort: a failure is logged and
/// skipped rather than aborting startup.
pub fn replay(socket: &Path, cached: &CachedState) -> ReplaySummary {
    let mut summary = ReplaySummary::default();

    if !cached.order.is_empty() {
        match send_request_to(
            socket,
            &Request::Reorder {
                order: cached.order.clone(),
            },
        ) {
            Ok(Response::Ok { .. }) => summary.order_restored = true,
            Ok(Response::Err { err }) => {
                warn!(code = %err.code, "cached order rejected: {}", err.message);
            }
            Err(e) => warn!("cached order replay failed: {e}"),
        }
    }

    if !cached.selected.is_empty() {
        match send_request_to(
            socket,
            &Request::SetSelection {
                ids: cached.selected.clone(),
            },
        ) {
            Ok(Response::Ok {
                ok: ResponsePayload::SelectionReplaced { applied },
            }) => summary.selection_applied = Some(applied),
            Ok(Response::Ok { .. }) => summary.selection_applied = None,
            Ok(Response::Err { err }) => {
                warn!(code = %err.code, "cached selection rejected: {}", err.message);
            }
            Err(e) => warn!("cached selection replay failed: {e}"),
        }
    }

    summary
}

// =============================================================================
// Initial view bootstrap
// =============================================================================

/// The first screenful of a fresh client.
#[derive(Clone, Debug)]
pub enum InitialView {
    /// Bootstrapped from a non-empty selection set.
    Selected(Vec<Item>),
    /// Page 0 of the full list (no selection).
    Page(Page),
}

/// Decide the initial view: a non-empty selection bootstraps the list,
/// otherwise page 0 of the full list.
pub fn initial_view(socket: &Path, page_size: u32) -> Result<InitialView, IpcError> {
    let selected = match send_request_to(socket, &Request::Selected)? {
        Response::Ok {
            ok: ResponsePayload::Items(items),
        } => items,
        Response::Ok { ok } => {
            return Err(IpcError::UnexpectedResponse(format!("{ok:?}")));
        }
        Response::Err { err } => {
            return Err(IpcError::Remote {
                code: err.code,
                message: err.message,
            });
        }
    };

    if !selected.is_empty() {
        return Ok(InitialView::Selected(selected));
    }

    match send_request_to(
        socket,
        &Request::Items {
            page: 0,
            size: page_size,
            search: None,
        },
    )? {
        Response::Ok {
            ok: ResponsePayload::Page(page),
        } => Ok(InitialView::Page(page)),
        Response::Ok { ok } => Err(IpcError::UnexpectedResponse(format!("{ok:?}"))),
        Response::Err { err } => Err(IpcError::Remote {
            code: err.code,
            message: err.message,
        }),
    }
}
