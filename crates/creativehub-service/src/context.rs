//! Request context carrying the acting user and their role.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use creativehub_core::types::UserId;

/// Context for the current request.
///
/// Built by the surrounding caller after authentication and passed into
/// service methods so every write knows *who* is acting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestContext {
    /// The acting user's ID.
    pub user_id: UserId,
    /// The user's role as issued by the authentication layer.
    pub role: String,
    /// When the request was received.
    pub request_time: DateTime<Utc>,
}

impl RequestContext {
    /// Creates a new request context.
    pub fn new(user_id: UserId, role: impl Into<String>) -> Self {
        Self {
            user_id,
            role: role.into(),
            request_time: Utc::now(),
        }
    }

    /// Returns whether the current user is an admin.
    pub fn is_admin(&self) -> bool {
        self.role.eq_ignore_ascii_case("admin")
    }
}
