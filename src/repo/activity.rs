use rusqlite::Connection;
use crate::models::Activity;
use crate::repo::LeadRepo;
use anyhow::{Context, Result};

/// Activity repository for database operations
///
/// Manages lead activities (timestamped notes): calls made, emails sent,
/// meeting outcomes. Activities are display data only - they carry no
/// ordering invariants and never touch stage or position.
pub struct ActivityRepo;

impl ActivityRepo {
    /// Create a new activity for a lead
    pub fn create(conn: &Connection, lead_id: i64, note: String) -> Result<Activity> {
        // The lead must exist
        LeadRepo::get_by_id(conn, lead_id)?
            .ok_or_else(|| anyhow::anyhow!("Lead {} not found", lead_id))?;

        let now = chrono::Utc::now().timestamp();

        conn.execute(
            "INSERT INTO lead_activities (lead_id, note, entry_ts, created_ts) VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![lead_id, note, now, now],
        )
        .context("Failed to create activity")?;

        let id = conn.last_insert_rowid();

        Ok(Activity {
            id: Some(id),
            lead_id,
            note,
            entry_ts: now,
            created_ts: now,
        })
    }

    /// Get all activities for a lead, ordered by entry_ts (oldest first)
    pub fn get_by_lead(conn: &Connection, lead_id: i64) -> Result<Vec<Activity>> {
        let mut stmt = conn.prepare(
            "SELECT id, lead_id, note, entry_ts, created_ts
             FROM lead_activities
             WHERE lead_id = ?1
             ORDER BY entry_ts ASC, id ASC"
        )?;

        let rows = stmt.query_map([lead_id], |row| {
            Ok(Activity {
                id: Some(row.get(0)?),
                lead_id: row.get(1)?,
                note: row.get(2)?,
                entry_ts: row.get(3)?,
                created_ts: row.get(4)?,
            })
        })?;

        let mut activities = Vec::new();
        for row in rows {
            activities.push(row?);
        }
        Ok(activities)
    }

    /// Delete an activity by id. Returns true if a row was removed.
    pub fn delete(conn: &Connection, activity_id: i64) -> Result<bool> {
        let deleted = conn.execute(
            "DELETE FROM lead_activities WHERE id = ?1",
            [activity_id],
        )?;
        Ok(deleted > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbConnection;

    #[test]
    fn test_create_and_list() {
        let conn = DbConnection::connect_in_memory().unwrap();
        let lead = LeadRepo::create(&conn, "Ana", "Acme").unwrap();
        let lead_id = lead.id.unwrap();

        ActivityRepo::create(&conn, lead_id, "Intro call".to_string()).unwrap();
        ActivityRepo::create(&conn, lead_id, "Sent pricing".to_string()).unwrap();

        let activities = ActivityRepo::get_by_lead(&conn, lead_id).unwrap();
        assert_eq!(activities.len(), 2);
        assert_eq!(activities[0].note, "Intro call");
        assert_eq!(activities[1].note, "Sent pricing");
    }

    #[test]
    fn test_create_for_missing_lead_fails() {
        let conn = DbConnection::connect_in_memory().unwrap();
        assert!(ActivityRepo::create(&conn, 9, "hello".to_string()).is_err());
    }

    #[test]
    fn test_delete() {
        let conn = DbConnection::connect_in_memory().unwrap();
        let lead = LeadRepo::create(&conn, "Ana", "Acme").unwrap();
        let activity = ActivityRepo::create(&conn, lead.id.unwrap(), "note".to_string()).unwrap();

        assert!(ActivityRepo::delete(&conn, activity.id.unwrap()).unwrap());
        assert!(!ActivityRepo::delete(&conn, activity.id.unwrap()).unwrap());
        assert!(ActivityRepo::get_by_lead(&conn, lead.id.unwrap()).unwrap().is_empty());
    }
}
