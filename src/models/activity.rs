use serde::{Deserialize, Serialize};

/// Activity model
/// A timestamped note attached to a lead (call made, email sent, etc).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Activity {
    pub id: Option<i64>,
    pub lead_id: i64,
    pub note: String,
    pub entry_ts: i64,
    pub created_ts: i64,
}
