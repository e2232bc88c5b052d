//! Shared application state passed to every HTTP handler.

use std::sync::Arc;

use sa_domain::config::Config;
use sa_runner::Runner;

use crate::runtime::session_lock::LaneLock;

/// The app name every `SessionKey` is scoped under (Section 3). A single
/// deployment of this gateway binary serves one app.
pub const APP_NAME: &str = "serialagent";

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub runner: Arc<Runner>,
    pub lane_lock: Arc<LaneLock>,
}
