//! `SessionKey` — the `(AppName, UserID, SessionID)` triple Section 3 names.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionKey {
    pub app_name: String,
    pub user_id: String,
    pub session_id: String,
}

impl SessionKey {
    pub fn new(app_name: impl Into<String>, user_id: impl Into<String>, session_id: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
            user_id: user_id.into(),
            session_id: session_id.into(),
        }
    }

    /// A single string form, used as the map key by in-memory and
    /// file-based backends alike.
    pub fn flatten(&self) -> String {
        format!("{}::{}::{}", self.app_name, self.user_id, self.session_id)
    }
}
