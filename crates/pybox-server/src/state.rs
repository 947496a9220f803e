//! Shared request-handler state
//!
//! Everything here is read-only once the server is up: the policy set is
//! frozen at startup and the sandbox holds only configuration. Requests
//! share nothing mutable, so the whole thing sits behind one `Arc`.

use pybox_analyzer::ImportPolicy;
use pybox_sandbox::Sandbox;
use pybox_store::FsStore;

pub struct AppState {
    pub policy: ImportPolicy,
    pub sandbox: Sandbox,
    pub store: FsStore,
}
