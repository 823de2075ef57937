//! Daemon state and request dispatch.

use tracing::warn;

use super::ipc::{Request, Response, ResponsePayload};
use crate::core::ListEngine;
use crate::store::StateStore;

/// Daemon-held state.
///
/// All request handling goes through [`Daemon::handle_request`], which the
/// server calls from the single state thread; mutations therefore never
/// interleave and queries always observe a consistent snapshot.
pub struct Daemon<S> {
    engine: ListEngine<S>,
}

impl<S: StateStore> Daemon<S> {
    pub fn new(engine: ListEngine<S>) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &ListEngine<S> {
        &self.engine
    }

    /// Handle one request. Every failure maps to an error payload; nothing
    /// here is fatal to the process.
    pub fn handle_request(&mut self, request: Request) -> Response {
        match request {
            Request::Items { page, size, search } => {
                match self.engine.query(page, size, search.as_deref()) {
                    Ok(page) => Response::ok(ResponsePayload::Page(page)),
                    Err(e) => Response::err(e),
                }
            }

            Request::Selected => Response::ok(ResponsePayload::Items(self.engine.selected_items())),

            Request::Count { search } => Response::ok(ResponsePayload::Count {
                total_count: self.engine.total_count(search.as_deref()),
            }),

            Request::Order => Response::ok(ResponsePayload::Order {
                order: self.engine.current_order(),
            }),

            Request::Toggle { id } => match self.engine.toggle(id) {
                Ok(selected) => Response::ok(ResponsePayload::Toggled { id, selected }),
                Err(e) => Response::err(e),
            },

            Request::Reorder { order } => match self.engine.replace_order(order) {
                Ok(()) => Response::ok(ResponsePayload::Done),
                Err(e) => Response::err(e),
            },

            Request::ResetOrder => match self.engine.reset_order() {
                Ok(()) => Response::ok(ResponsePayload::Done),
                Err(e) => Response::err(e),
            },

            Request::SetSelection { ids } => match self.engine.replace_selection(&ids) {
                Ok(applied) => Response::ok(ResponsePayload::SelectionReplaced { applied }),
                Err(e) => Response::err(e),
            },

            Request::Ping => Response::ok(ResponsePayload::Done),

            Request::Shutdown => {
                if let Err(e) = self.engine.flush() {
                    warn!("shutdown flush failed: {e}");
                }
                Response::ok(ResponsePayload::Done)
            }
        }
    }
}
