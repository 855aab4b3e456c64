use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::ctr::ConfidenceEstimate;
use crate::util::require_non_empty;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    pub user_id: String,
    #[serde(default)]
    pub ua: String,
    /// Event time in epoch milliseconds; unset means "when it was recorded".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ts: Option<i64>,
}

impl UserRecord {
    pub fn validate(&self) -> Result<()> {
        require_non_empty("user_id", &self.user_id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    pub user_id: String,
    pub session_id: String,
    #[serde(default)]
    pub referrer: String,
    /// Event time in epoch milliseconds; unset means "when it was recorded".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ts: Option<i64>,
}

impl SessionRecord {
    pub fn validate(&self) -> Result<()> {
        require_non_empty("user_id", &self.user_id)?;
        require_non_empty("session_id", &self.session_id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchRecord {
    pub user_id: String,
    pub session_id: String,
    #[serde(default, alias = "q")]
    pub query_text: String,
    #[serde(default)]
    pub result_count: i64,
    /// Event time in epoch milliseconds; unset means "when it was recorded".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ts: Option<i64>,
}

impl SearchRecord {
    pub fn validate(&self) -> Result<()> {
        require_non_empty("user_id", &self.user_id)?;
        require_non_empty("session_id", &self.session_id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImpressionRecord {
    pub user_id: String,
    pub session_id: String,
    pub variant: String,
    pub placement: String,
    pub creative_id: String,
    pub visible_ms: i64,
    pub viewport_w: i64,
    pub viewport_h: i64,
    #[serde(default)]
    pub ua: String,
    #[serde(default)]
    pub ip: String,
    /// Event time in epoch milliseconds; unset means "when it was recorded".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ts: Option<i64>,
}

impl ImpressionRecord {
    pub fn validate(&self) -> Result<()> {
        require_non_empty("user_id", &self.user_id)?;
        require_non_empty("session_id", &self.session_id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClickRecord {
    pub user_id: String,
    pub session_id: String,
    pub variant: String,
    pub placement: String,
    pub creative_id: String,
    #[serde(default)]
    pub ua: String,
    #[serde(default)]
    pub ip: String,
    /// Event time in epoch milliseconds; unset means "when it was recorded".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ts: Option<i64>,
}

impl ClickRecord {
    pub fn validate(&self) -> Result<()> {
        require_non_empty("user_id", &self.user_id)?;
        require_non_empty("session_id", &self.session_id)
    }
}

/// One line of an NDJSON event file.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventLine {
    User(UserRecord),
    Session(SessionRecord),
    Search(SearchRecord),
    Impression(ImpressionRecord),
    Click(ClickRecord),
}

/// Grouped counts over the valid-session population.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventCount {
    pub variant: String,
    pub placement: String,
    pub creative_id: String,
    pub impressions: u64,
    pub clicks: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CtrRow {
    pub variant: String,
    pub placement: String,
    pub creative_id: String,
    pub impressions: u64,
    pub clicks: u64,
    pub ctr: f64,
    pub ci_lower: f64,
    pub ci_upper: f64,
    pub clicks_exceed_impressions: bool,
}

impl CtrRow {
    pub fn from_count(count: EventCount, estimate: ConfidenceEstimate) -> Self {
        Self {
            clicks_exceed_impressions: count.clicks > count.impressions,
            variant: count.variant,
            placement: count.placement,
            creative_id: count.creative_id,
            impressions: count.impressions,
            clicks: count.clicks,
            ctr: estimate.point,
            ci_lower: estimate.lower,
            ci_upper: estimate.upper,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CtrReport {
    pub generated_at: String,
    pub valid_sessions: u64,
    pub z: f64,
    pub rows: Vec<CtrRow>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AssignmentResponse<'a> {
    pub ok: bool,
    pub user_id: &'a str,
    pub variant: &'a str,
    pub placement: &'a str,
}
