use serde::Serialize;

use crate::query::QueryKey;

/// Reads a dashboard client renders and should refetch when told to. The
/// wallet balance is only read server-side for funds checks.
pub const DASHBOARD_KEYS: [QueryKey; 2] = [QueryKey::Challenges, QueryKey::AdminEscrow];

/// Messages pushed to connected dashboard clients.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum WsMessage {
    /// A cached read changed server-side; refetch it.
    #[serde(rename = "invalidated")]
    Invalidated(QueryKey),
}

impl WsMessage {
    /// The message for an invalidation, if dashboards care about the key.
    pub fn for_invalidation(key: QueryKey) -> Option<Self> {
        DASHBOARD_KEYS
            .contains(&key)
            .then_some(WsMessage::Invalidated(key))
    }
}
