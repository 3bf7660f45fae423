use rusqlite::{Connection, TransactionBehavior};
use crate::models::{Lead, Stage};
use crate::repo::LeadRepo;
use anyhow::Result;
use thiserror::Error;

/// Typed failures of the board move operation.
///
/// `NotFound` and `InvalidPosition` are terminal for the request;
/// `Conflict` means the move lost the race for the write lock and may be
/// retried whole, from a fresh read. A conflicted move never lands
/// partially.
#[derive(Debug, Error)]
pub enum MoveError {
    #[error("Lead {0} not found")]
    NotFound(i64),
    #[error("Position {position} is out of range for stage '{stage}' (valid range 0..={max})")]
    InvalidPosition {
        stage: &'static str,
        position: i64,
        max: i64,
    },
    #[error("Move conflicted with a concurrent board update; retry the move")]
    Conflict,
}

/// Requested change for one lead: a target stage, a target position,
/// or both. Absent stage means "stay"; absent position on a stage change
/// means "append to the end of the target stage".
#[derive(Debug, Clone, Copy, Default)]
pub struct MoveRequest {
    pub stage: Option<Stage>,
    pub position: Option<i64>,
}

/// Board repository: the stage/position ordering engine
///
/// Within each stage, lead positions form the dense sequence 0..N-1 with
/// no gaps or duplicates. Every mutation that could disturb that - a
/// reorder, a stage change, the shifts around either - runs inside one
/// immediate transaction, so concurrent movers serialize on SQLite's
/// write lock and observers only ever see completed moves.
pub struct BoardRepo;

impl BoardRepo {
    /// Apply a stage and/or position change to one lead.
    ///
    /// Returns the updated lead. The whole move (all sibling shifts plus
    /// the lead's own write, plus dwell-time billing on a stage change) is
    /// atomic: it lands entirely or not at all.
    pub fn move_lead(conn: &mut Connection, lead_id: i64, request: MoveRequest) -> Result<Lead> {
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(busy_to_conflict)?;

        let lead = Self::apply_move(&tx, lead_id, request)?;

        tx.commit().map_err(busy_to_conflict)?;
        Ok(lead)
    }

    /// Move logic, callable on an open transaction
    fn apply_move(tx: &Connection, lead_id: i64, request: MoveRequest) -> Result<Lead> {
        let mut lead = LeadRepo::get_by_id(tx, lead_id)?
            .ok_or(MoveError::NotFound(lead_id))?;

        let old_stage = lead.stage;
        let old_position = lead.position;
        let new_stage = request.stage.unwrap_or(old_stage);

        if !old_stage.can_transition_to(new_stage) {
            anyhow::bail!(
                "Moving a lead from {} to {} is not allowed",
                old_stage.as_str(),
                new_stage.as_str()
            );
        }

        if new_stage == old_stage {
            // Reorder within the stage, or nothing to do at all
            let new_position = match request.position {
                Some(p) if p != old_position => p,
                _ => return Ok(lead), // no-op: no writes
            };

            let count = LeadRepo::count_in_stage(tx, old_stage)?;
            if new_position < 0 || new_position >= count {
                return Err(MoveError::InvalidPosition {
                    stage: old_stage.as_str(),
                    position: new_position,
                    max: count - 1,
                }
                .into());
            }

            // Single-element remove-and-reinsert: only the window between
            // the two positions shifts.
            if old_position < new_position {
                // Moving later: the window slides up one slot
                tx.execute(
                    "UPDATE leads SET position = position - 1
                     WHERE stage = ?1 AND position > ?2 AND position <= ?3",
                    rusqlite::params![old_stage.as_str(), old_position, new_position],
                )?;
            } else {
                // Moving earlier: the window slides down one slot
                tx.execute(
                    "UPDATE leads SET position = position + 1
                     WHERE stage = ?1 AND position >= ?2 AND position < ?3",
                    rusqlite::params![old_stage.as_str(), new_position, old_position],
                )?;
            }

            lead.position = new_position;
            log::debug!(
                "reordered lead {} in {}: {} -> {}",
                lead_id,
                old_stage.as_str(),
                old_position,
                new_position
            );
        } else {
            // Stage change: close the gap in the old stage, open a slot in
            // the new one, and bill the time spent in the old stage.
            let target_count = LeadRepo::count_in_stage(tx, new_stage)?;

            let new_position = match request.position {
                Some(p) => {
                    if p < 0 || p > target_count {
                        return Err(MoveError::InvalidPosition {
                            stage: new_stage.as_str(),
                            position: p,
                            max: target_count,
                        }
                        .into());
                    }
                    p
                }
                None => target_count, // append
            };

            tx.execute(
                "UPDATE leads SET position = position - 1
                 WHERE stage = ?1 AND position > ?2",
                rusqlite::params![old_stage.as_str(), old_position],
            )?;

            if new_position < target_count {
                tx.execute(
                    "UPDATE leads SET position = position + 1
                     WHERE stage = ?1 AND position >= ?2",
                    rusqlite::params![new_stage.as_str(), new_position],
                )?;
            }

            // Reads the old stage to pick the counter, so it must run
            // before the stage field changes.
            let now = chrono::Utc::now().timestamp();
            lead.accrue_stage_time(now);

            lead.stage = new_stage;
            lead.position = new_position;
            log::debug!(
                "moved lead {}: {}[{}] -> {}[{}]",
                lead_id,
                old_stage.as_str(),
                old_position,
                new_stage.as_str(),
                new_position
            );
        }

        LeadRepo::store_board_state(tx, &lead)?;
        Ok(lead)
    }

    /// All leads grouped by stage for board display.
    ///
    /// Every stage is present, in pipeline order, even when empty; each
    /// column is ascending by position. A plain snapshot read - moves in
    /// flight are either fully visible or not at all.
    pub fn board(conn: &Connection) -> Result<Vec<(Stage, Vec<Lead>)>> {
        let leads = LeadRepo::list_by_position(conn)?;

        let mut columns: Vec<(Stage, Vec<Lead>)> =
            Stage::ALL.iter().map(|s| (*s, Vec::new())).collect();

        for lead in leads {
            columns[lead.stage.ordinal()].1.push(lead);
        }

        Ok(columns)
    }
}

/// Map lock-acquisition failures to the retryable conflict error
fn busy_to_conflict(e: rusqlite::Error) -> anyhow::Error {
    match e.sqlite_error_code() {
        Some(rusqlite::ErrorCode::DatabaseBusy) | Some(rusqlite::ErrorCode::DatabaseLocked) => {
            MoveError::Conflict.into()
        }
        _ => e.into(),
    }
}
