use serde::{Deserialize, Serialize};
use crate::utils::duration::round_to_days;

/// Pipeline stage (kanban board column)
///
/// Every lead sits in exactly one stage at a time. `Lost` is terminal in
/// practice (nothing is expected to move out of it), but no transition is
/// forbidden - see [`Stage::can_transition_to`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Lead,
    Quotation,
    Negotiation,
    CloseWon,
    Lost,
}

impl Stage {
    /// All stages in board display order
    pub const ALL: [Stage; 5] = [
        Stage::Lead,
        Stage::Quotation,
        Stage::Negotiation,
        Stage::CloseWon,
        Stage::Lost,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Lead => "lead",
            Stage::Quotation => "quotation",
            Stage::Negotiation => "negotiation",
            Stage::CloseWon => "close_won",
            Stage::Lost => "lost",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "lead" => Some(Stage::Lead),
            "quotation" => Some(Stage::Quotation),
            "negotiation" => Some(Stage::Negotiation),
            "close_won" | "close-won" | "won" => Some(Stage::CloseWon),
            "lost" => Some(Stage::Lost),
            _ => None,
        }
    }

    /// Human-readable column header
    pub fn label(&self) -> &'static str {
        match self {
            Stage::Lead => "Lead",
            Stage::Quotation => "Quotation",
            Stage::Negotiation => "Negotiation",
            Stage::CloseWon => "Close Won",
            Stage::Lost => "Lost",
        }
    }

    /// Index of this stage in board display order
    pub fn ordinal(&self) -> usize {
        match self {
            Stage::Lead => 0,
            Stage::Quotation => 1,
            Stage::Negotiation => 2,
            Stage::CloseWon => 3,
            Stage::Lost => 4,
        }
    }

    /// Whether a move from this stage to `target` is allowed.
    ///
    /// The pipeline imposes no workflow: any stage can move to any other.
    /// A stricter rule (e.g. forbidding moves out of Lost) only needs to
    /// change this one predicate.
    pub fn can_transition_to(&self, _target: Stage) -> bool {
        true
    }
}

/// Lead model
///
/// Mirrors a row in the `leads` table. `stage` and `position` are owned by
/// the board repo and must only change through a board move; the duration
/// counters (`lead_days` etc.) record whole days spent in each stage the
/// lead has passed through, credited when the lead leaves that stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lead {
    pub id: Option<i64>,
    pub uuid: String,
    pub contact: String,
    pub company: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub deal_value: Option<i64>,
    pub source: Option<String>,
    pub note: Option<String>,
    pub stage: Stage,
    pub position: i64,
    pub stage_changed_ts: i64,
    pub lead_days: i64,
    pub quotation_days: i64,
    pub negotiation_days: i64,
    pub close_won_days: i64,
    pub created_ts: i64,
    pub modified_ts: i64,
}

impl Lead {
    /// Create a new lead (not yet persisted, position assigned on insert)
    pub fn new(contact: String, company: String) -> Self {
        let now = chrono::Utc::now().timestamp();
        Self {
            id: None,
            uuid: uuid::Uuid::new_v4().to_string(),
            contact,
            company,
            email: None,
            phone: None,
            deal_value: None,
            source: None,
            note: None,
            stage: Stage::Lead,
            position: 0,
            stage_changed_ts: now,
            lead_days: 0,
            quotation_days: 0,
            negotiation_days: 0,
            close_won_days: 0,
            created_ts: now,
            modified_ts: now,
        }
    }

    /// Days accumulated in a given stage, or None for stages that keep no
    /// counter (`Lost`).
    pub fn stage_days(&self, stage: Stage) -> Option<i64> {
        match stage {
            Stage::Lead => Some(self.lead_days),
            Stage::Quotation => Some(self.quotation_days),
            Stage::Negotiation => Some(self.negotiation_days),
            Stage::CloseWon => Some(self.close_won_days),
            Stage::Lost => None,
        }
    }

    /// Credit the time spent in the current stage and reset the clock.
    ///
    /// Must run exactly once per stage change, before `stage` is
    /// overwritten: it reads the current stage to pick the counter. Elapsed
    /// time is rounded to whole days (half up). Leaving `Lost` bills
    /// nothing. Counters only ever grow, even when a lead revisits a stage.
    pub fn accrue_stage_time(&mut self, now_ts: i64) {
        let days = round_to_days(now_ts - self.stage_changed_ts);
        match self.stage {
            Stage::Lead => self.lead_days += days,
            Stage::Quotation => self.quotation_days += days,
            Stage::Negotiation => self.negotiation_days += days,
            Stage::CloseWon => self.close_won_days += days,
            Stage::Lost => {}
        }
        self.stage_changed_ts = now_ts;
    }
}
