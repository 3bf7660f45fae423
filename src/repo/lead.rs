use rusqlite::{Connection, OptionalExtension, Row};
use crate::models::{Lead, Stage};
use anyhow::{Context, Result};

/// Columns selected for every lead read, in `read_lead` order
const LEAD_COLUMNS: &str =
    "id, uuid, contact, company, email, phone, deal_value, source, note,
     stage, position, stage_changed_ts,
     lead_days, quotation_days, negotiation_days, close_won_days,
     created_ts, modified_ts";

fn read_lead(row: &Row) -> rusqlite::Result<Lead> {
    Ok(Lead {
        id: Some(row.get(0)?),
        uuid: row.get(1)?,
        contact: row.get(2)?,
        company: row.get(3)?,
        email: row.get(4)?,
        phone: row.get(5)?,
        deal_value: row.get(6)?,
        source: row.get(7)?,
        note: row.get(8)?,
        stage: Stage::from_str(&row.get::<_, String>(9)?).unwrap_or(Stage::Lead),
        position: row.get(10)?,
        stage_changed_ts: row.get(11)?,
        lead_days: row.get(12)?,
        quotation_days: row.get(13)?,
        negotiation_days: row.get(14)?,
        close_won_days: row.get(15)?,
        created_ts: row.get(16)?,
        modified_ts: row.get(17)?,
    })
}

/// Field edits applied by `LeadRepo::update`. `None` leaves a field alone;
/// for nullable fields, `Some(None)` clears it.
#[derive(Debug, Default)]
pub struct LeadPatch {
    pub contact: Option<String>,
    pub company: Option<String>,
    pub email: Option<Option<String>>,
    pub phone: Option<Option<String>>,
    pub deal_value: Option<Option<i64>>,
    pub source: Option<Option<String>>,
    pub note: Option<Option<String>>,
}

impl LeadPatch {
    pub fn is_empty(&self) -> bool {
        self.contact.is_none()
            && self.company.is_none()
            && self.email.is_none()
            && self.phone.is_none()
            && self.deal_value.is_none()
            && self.source.is_none()
            && self.note.is_none()
    }
}

/// Lead repository for database operations
///
/// Owns plain record access: create (appended to the end of its stage),
/// read, descriptive-field update, and delete. Stage and position changes
/// go through `BoardRepo::move_lead` - nothing here reorders a stage
/// except `delete`, which compacts the slot the removed lead vacates.
pub struct LeadRepo;

impl LeadRepo {
    /// Create a new lead with full field support, appended to the end of
    /// the target stage
    pub fn create_full(
        conn: &Connection,
        contact: &str,
        company: &str,
        email: Option<String>,
        phone: Option<String>,
        deal_value: Option<i64>,
        source: Option<String>,
        note: Option<String>,
        stage: Stage,
    ) -> Result<Lead> {
        let mut lead = Lead::new(contact.to_string(), company.to_string());
        lead.email = email;
        lead.phone = phone;
        lead.deal_value = deal_value;
        lead.source = source;
        lead.note = note;
        lead.stage = stage;

        // Count and insert must see the same board state
        let tx = conn.unchecked_transaction()?;

        lead.position = Self::count_in_stage(&tx, stage)?;

        tx.execute(
            "INSERT INTO leads (uuid, contact, company, email, phone, deal_value, source, note,
                    stage, position, stage_changed_ts,
                    lead_days, quotation_days, negotiation_days, close_won_days,
                    created_ts, modified_ts)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, 0, 0, 0, 0, ?12, ?13)",
            rusqlite::params![
                lead.uuid,
                lead.contact,
                lead.company,
                lead.email,
                lead.phone,
                lead.deal_value,
                lead.source,
                lead.note,
                lead.stage.as_str(),
                lead.position,
                lead.stage_changed_ts,
                lead.created_ts,
                lead.modified_ts,
            ],
        )
        .with_context(|| format!("Failed to create lead: {}", contact))?;

        let id = tx.last_insert_rowid();
        tx.commit()?;

        Ok(Lead {
            id: Some(id),
            ..lead
        })
    }

    /// Create a new lead (simplified version for backward compatibility)
    pub fn create(conn: &Connection, contact: &str, company: &str) -> Result<Lead> {
        Self::create_full(conn, contact, company, None, None, None, None, None, Stage::Lead)
    }

    /// Get lead by ID
    pub fn get_by_id(conn: &Connection, id: i64) -> Result<Option<Lead>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM leads WHERE id = ?1",
            LEAD_COLUMNS
        ))?;

        let lead = stmt.query_row([id], read_lead).optional()?;
        Ok(lead)
    }

    /// List all leads ordered by id
    pub fn list_all(conn: &Connection) -> Result<Vec<Lead>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM leads ORDER BY id",
            LEAD_COLUMNS
        ))?;

        let rows = stmt.query_map([], read_lead)?;

        let mut leads = Vec::new();
        for row in rows {
            leads.push(row?);
        }
        Ok(leads)
    }

    /// List all leads ordered by position (board read path)
    pub fn list_by_position(conn: &Connection) -> Result<Vec<Lead>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM leads ORDER BY position ASC, id ASC",
            LEAD_COLUMNS
        ))?;

        let rows = stmt.query_map([], read_lead)?;

        let mut leads = Vec::new();
        for row in rows {
            leads.push(row?);
        }
        Ok(leads)
    }

    /// Number of leads currently in a stage
    pub fn count_in_stage(conn: &Connection, stage: Stage) -> Result<i64> {
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM leads WHERE stage = ?1",
            [stage.as_str()],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Update descriptive fields on a lead. Stage and position are not
    /// accepted here; see `BoardRepo::move_lead`.
    pub fn update(conn: &Connection, id: i64, patch: &LeadPatch) -> Result<()> {
        if patch.is_empty() {
            return Ok(());
        }

        // Build dynamic update
        let mut sets = Vec::new();
        let mut params: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();

        if let Some(contact) = &patch.contact {
            sets.push("contact = ?");
            params.push(Box::new(contact.clone()));
        }
        if let Some(company) = &patch.company {
            sets.push("company = ?");
            params.push(Box::new(company.clone()));
        }
        if let Some(email) = &patch.email {
            sets.push("email = ?");
            params.push(Box::new(email.clone()));
        }
        if let Some(phone) = &patch.phone {
            sets.push("phone = ?");
            params.push(Box::new(phone.clone()));
        }
        if let Some(deal_value) = &patch.deal_value {
            sets.push("deal_value = ?");
            params.push(Box::new(*deal_value));
        }
        if let Some(source) = &patch.source {
            sets.push("source = ?");
            params.push(Box::new(source.clone()));
        }
        if let Some(note) = &patch.note {
            sets.push("note = ?");
            params.push(Box::new(note.clone()));
        }

        sets.push("modified_ts = ?");
        params.push(Box::new(chrono::Utc::now().timestamp()));

        // Number the parameters
        let mut numbered_sets = Vec::new();
        for (i, set) in sets.iter().enumerate() {
            numbered_sets.push(set.replace('?', &format!("?{}", i + 1)));
        }
        let id_param = params.len() + 1;
        let sql = format!(
            "UPDATE leads SET {} WHERE id = ?{}",
            numbered_sets.join(", "),
            id_param
        );
        params.push(Box::new(id));

        let param_refs: Vec<&dyn rusqlite::types::ToSql> = params.iter().map(|p| p.as_ref()).collect();
        let updated = conn.execute(&sql, param_refs.as_slice())
            .with_context(|| format!("Failed to update lead id={}", id))?;

        if updated == 0 {
            anyhow::bail!("No lead found with id={}", id);
        }

        Ok(())
    }

    /// Persist the board-owned fields of a lead after a move
    /// (stage, position, transition clock, duration counters)
    pub fn store_board_state(conn: &Connection, lead: &Lead) -> Result<()> {
        let id = lead.id
            .ok_or_else(|| anyhow::anyhow!("Cannot store board state for an unsaved lead"))?;
        conn.execute(
            "UPDATE leads SET stage = ?1, position = ?2, stage_changed_ts = ?3,
                    lead_days = ?4, quotation_days = ?5, negotiation_days = ?6, close_won_days = ?7,
                    modified_ts = ?8
             WHERE id = ?9",
            rusqlite::params![
                lead.stage.as_str(),
                lead.position,
                lead.stage_changed_ts,
                lead.lead_days,
                lead.quotation_days,
                lead.negotiation_days,
                lead.close_won_days,
                chrono::Utc::now().timestamp(),
                id,
            ],
        )?;
        Ok(())
    }

    /// Delete a lead and compact the stage it vacates.
    /// Activities are removed with it; siblings after the vacated slot
    /// shift up by one so the stage stays gap-free.
    pub fn delete(conn: &Connection, id: i64) -> Result<Lead> {
        let tx = conn.unchecked_transaction()?;

        let lead = Self::get_by_id(&tx, id)?
            .ok_or_else(|| anyhow::anyhow!("Lead {} not found", id))?;

        tx.execute("DELETE FROM lead_activities WHERE lead_id = ?1", [id])?;
        tx.execute("DELETE FROM leads WHERE id = ?1", [id])?;

        // Close the gap left behind
        tx.execute(
            "UPDATE leads SET position = position - 1 WHERE stage = ?1 AND position > ?2",
            rusqlite::params![lead.stage.as_str(), lead.position],
        )?;

        tx.commit()?;
        Ok(lead)
    }
}
