// Output formatting utilities

use crate::models::{Activity, Lead, Stage};
use crate::utils::date::format_date;
use crate::utils::duration::{format_age, format_days};
use std::io::IsTerminal;

// ANSI escape codes for terminal formatting
const ANSI_BOLD: &str = "\x1b[1m";
const ANSI_RESET: &str = "\x1b[0m";

const ANSI_FG_GREEN: &str = "\x1b[32m";
const ANSI_FG_YELLOW: &str = "\x1b[33m";
const ANSI_FG_BLUE: &str = "\x1b[34m";
const ANSI_FG_MAGENTA: &str = "\x1b[35m";
const ANSI_FG_BRIGHT_BLACK: &str = "\x1b[90m";

/// Check if stdout is a terminal (TTY)
pub fn is_tty() -> bool {
    std::io::stdout().is_terminal()
}

/// Get terminal width dynamically
///
/// Uses the `terminal_size` crate for reliable detection, with fallback to
/// COLUMNS environment variable and a sensible default.
pub fn get_terminal_width() -> usize {
    // Try terminal_size crate first (most reliable, works after resize)
    if let Some((terminal_size::Width(w), _)) = terminal_size::terminal_size() {
        if w > 0 {
            return w as usize;
        }
    }

    // Fallback to COLUMNS environment variable (set by most shells)
    if let Ok(cols) = std::env::var("COLUMNS") {
        if let Ok(width) = cols.parse::<usize>() {
            if width > 0 && width < 10000 { // Sanity check
                return width;
            }
        }
    }

    // Default fallback - reasonable default for most terminals
    120
}

/// Apply bold formatting if in TTY mode
fn bold_if_tty(text: &str, is_tty: bool) -> String {
    if is_tty {
        format!("{}{}{}", ANSI_BOLD, text, ANSI_RESET)
    } else {
        text.to_string()
    }
}

/// Per-stage accent color for board headers
fn stage_color(stage: Stage) -> &'static str {
    match stage {
        Stage::Lead => ANSI_FG_BLUE,
        Stage::Quotation => ANSI_FG_YELLOW,
        Stage::Negotiation => ANSI_FG_MAGENTA,
        Stage::CloseWon => ANSI_FG_GREEN,
        Stage::Lost => ANSI_FG_BRIGHT_BLACK,
    }
}

fn colorize(text: &str, color: &str, tty: bool) -> String {
    if tty {
        format!("{}{}{}", color, text, ANSI_RESET)
    } else {
        text.to_string()
    }
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else if max <= 1 {
        "…".to_string()
    } else {
        let cut: String = text.chars().take(max - 1).collect();
        format!("{}…", cut)
    }
}

fn format_value(deal_value: Option<i64>) -> String {
    match deal_value {
        Some(v) => format!("${}", v),
        None => "-".to_string(),
    }
}

/// Format the flat lead table for `list`
pub fn format_lead_table(leads: &[Lead], tty: bool) -> String {
    if leads.is_empty() {
        return "No leads found.\n".to_string();
    }

    let now = chrono::Utc::now().timestamp();
    let width = get_terminal_width();
    // Fixed columns: ID(4) Stage(12) Pos(4) Value(10) Age(5) + separators
    let name_width = ((width.saturating_sub(45)) / 2).clamp(12, 32);

    let mut out = String::new();
    let header = format!(
        "{:<4} {:<name_width$} {:<name_width$} {:<12} {:>4} {:>10} {:>5}",
        "ID", "Contact", "Company", "Stage", "Pos", "Value", "Age",
        name_width = name_width,
    );
    out.push_str(&bold_if_tty(&header, tty));
    out.push('\n');

    for lead in leads {
        let stage_text = colorize(lead.stage.label(), stage_color(lead.stage), tty);
        // Padding is computed on the uncolored label so ANSI codes don't
        // skew the column.
        let stage_pad = " ".repeat(12usize.saturating_sub(lead.stage.label().len()));
        out.push_str(&format!(
            "{:<4} {:<name_width$} {:<name_width$} {}{} {:>4} {:>10} {:>5}\n",
            lead.id.map_or("-".to_string(), |id| id.to_string()),
            truncate(&lead.contact, name_width),
            truncate(&lead.company, name_width),
            stage_text,
            stage_pad,
            lead.position,
            format_value(lead.deal_value),
            format_age(now - lead.created_ts),
            name_width = name_width,
        ));
    }

    out
}

/// Format the kanban board for `board`: one section per stage, leads
/// ascending by position. Empty stages still get a header.
pub fn format_board(columns: &[(Stage, Vec<Lead>)], tty: bool) -> String {
    let mut out = String::new();

    for (stage, leads) in columns {
        let header = format!("{} ({})", stage.label(), leads.len());
        out.push_str(&colorize(&bold_if_tty(&header, tty), stage_color(*stage), tty));
        out.push('\n');

        if leads.is_empty() {
            out.push_str("  (empty)\n");
        } else {
            for lead in leads {
                out.push_str(&format!(
                    "  {}. [#{}] {} - {} ({})\n",
                    lead.position,
                    lead.id.map_or("-".to_string(), |id| id.to_string()),
                    lead.contact,
                    lead.company,
                    format_value(lead.deal_value),
                ));
            }
        }
        out.push('\n');
    }

    out
}

/// Format the detail view for `show`
pub fn format_lead_detail(lead: &Lead, activities: &[Activity], tty: bool) -> String {
    let mut out = String::new();

    let title = format!(
        "Lead #{}: {}",
        lead.id.map_or("-".to_string(), |id| id.to_string()),
        lead.contact
    );
    out.push_str(&bold_if_tty(&title, tty));
    out.push('\n');

    out.push_str(&format!("  Company:  {}\n", lead.company));
    if let Some(email) = &lead.email {
        out.push_str(&format!("  Email:    {}\n", email));
    }
    if let Some(phone) = &lead.phone {
        out.push_str(&format!("  Phone:    {}\n", phone));
    }
    out.push_str(&format!("  Value:    {}\n", format_value(lead.deal_value)));
    if let Some(source) = &lead.source {
        out.push_str(&format!("  Source:   {}\n", source));
    }
    if let Some(note) = &lead.note {
        out.push_str(&format!("  Note:     {}\n", note));
    }

    let stage_text = colorize(lead.stage.label(), stage_color(lead.stage), tty);
    out.push_str(&format!(
        "  Stage:    {} (position {}, since {})\n",
        stage_text,
        lead.position,
        format_date(lead.stage_changed_ts)
    ));
    out.push_str(&format!("  Created:  {}\n", format_date(lead.created_ts)));

    out.push_str("\n  Time in stage:\n");
    for stage in Stage::ALL {
        if let Some(days) = lead.stage_days(stage) {
            out.push_str(&format!(
                "    {:<12} {}\n",
                stage.label(),
                format_days(days)
            ));
        }
    }

    if !activities.is_empty() {
        out.push_str("\n  Activity:\n");
        for activity in activities {
            out.push_str(&format!(
                "    [{}] {} {}\n",
                activity.id.map_or("-".to_string(), |id| id.to_string()),
                format_date(activity.entry_ts),
                activity.note
            ));
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_lead(contact: &str, stage: Stage, position: i64) -> Lead {
        let mut lead = Lead::new(contact.to_string(), "Acme".to_string());
        lead.id = Some(1);
        lead.stage = stage;
        lead.position = position;
        lead
    }

    #[test]
    fn test_table_contains_columns() {
        let leads = vec![sample_lead("Ana Soto", Stage::Lead, 0)];
        let table = format_lead_table(&leads, false);
        assert!(table.contains("Contact"));
        assert!(table.contains("Ana Soto"));
        assert!(table.contains("Acme"));
        // No ANSI codes when not a TTY
        assert!(!table.contains("\x1b["));
    }

    #[test]
    fn test_table_empty() {
        assert_eq!(format_lead_table(&[], false), "No leads found.\n");
    }

    #[test]
    fn test_board_shows_empty_stages() {
        let columns: Vec<(Stage, Vec<Lead>)> =
            Stage::ALL.iter().map(|s| (*s, Vec::new())).collect();
        let board = format_board(&columns, false);
        for stage in Stage::ALL {
            assert!(board.contains(stage.label()));
        }
        assert!(board.contains("(empty)"));
    }

    #[test]
    fn test_detail_lists_duration_counters() {
        let lead = sample_lead("Ana", Stage::Quotation, 1);
        let detail = format_lead_detail(&lead, &[], false);
        assert!(detail.contains("Time in stage"));
        assert!(detail.contains("Quotation"));
        // Lost keeps no counter and is not listed
        assert!(!detail.contains("Lost"));
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a-rather-long-name", 10), "a-rather-…");
    }
}
