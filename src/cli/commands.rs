use clap::{Parser, Subcommand};
use crate::db::DbConnection;
use crate::repo::{ActivityRepo, BoardRepo, LeadPatch, LeadRepo, MoveError, MoveRequest};
use crate::cli::parser::{parse_lead_args, join_contact};
use crate::cli::output::{format_board, format_lead_detail, format_lead_table, is_tty};
use crate::cli::error::{
    user_error, validate_deal_value, validate_lead_id, validate_non_empty, validate_stage,
};
use crate::cli::abbrev;
use crate::models::Stage;
use anyhow::{Context, Result};

/// How many times a conflicted move is retried before giving up.
/// Each retry re-runs the whole move against fresh state.
const MOVE_RETRY_LIMIT: usize = 3;

#[derive(Parser)]
#[command(name = "pipetrack")]
#[command(about = "Sales Pipeline Tracker - A command-line sales pipeline and lead tracking tool")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Add a new lead
    Add {
        /// Contact name and fields (e.g., "Ana Soto company=Acme value=25000")
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
    /// List leads
    List {
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
    /// Show the pipeline board (leads grouped by stage)
    Board {
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
    /// Show detailed summary of a lead
    Show {
        /// Lead ID
        target: String,
    },
    /// Move a lead to another stage and/or board position
    Move {
        /// Lead ID
        target: String,
        /// Target stage (omit to stay in the current stage)
        stage: Option<String>,
        /// Target position within the stage (omit to append on a stage change)
        #[arg(long = "to", allow_hyphen_values = true)]
        to: Option<i64>,
    },
    /// Modify a lead's descriptive fields
    Modify {
        /// Lead ID
        target: String,
        /// Modification arguments (contact name words, field=value tokens)
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
    /// Log an activity on a lead
    Log {
        /// Lead ID
        target: String,
        /// Activity note text
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        note: Vec<String>,
        /// Delete activity by ID
        #[arg(long)]
        delete: Option<String>,
    },
    /// Permanently delete a lead
    Delete {
        /// Lead ID
        target: String,
        /// Skip confirmation
        #[arg(short = 'y', long)]
        yes: bool,
    },
}

pub fn run() -> Result<()> {
    let _ = env_logger::try_init();
    // No-op outside Windows
    let _ = enable_ansi_support::enable_ansi_support();

    // Get raw args
    let mut args: Vec<String> = std::env::args().skip(1).collect();

    // Check for version flag early (before any processing)
    if args.iter().any(|a| a == "--version" || a == "-V") {
        let cli = Cli::try_parse_from(std::env::args());
        match cli {
            Ok(_) => return Ok(()), // Version was printed by clap
            Err(_e) => {
                println!("pipetrack {}", env!("CARGO_PKG_VERSION"));
                return Ok(());
            }
        }
    }

    // Expand command abbreviations before processing
    args = match abbrev::expand_command_abbreviations(args) {
        Ok(expanded) => expanded,
        Err(e) => {
            user_error(&e);
        }
    };

    // A bare lead ID defaults to show (pipetrack 3 -> pipetrack show 3)
    if args.len() == 1 && validate_lead_id(&args[0]).is_ok() {
        args.insert(0, "show".to_string());
    }

    // Check for help requests or empty args (before clap parsing)
    let is_help_request = args.is_empty() ||
        args.iter().any(|a| a == "--help" || a == "-h" || a == "help");

    if is_help_request {
        // Let clap handle the help (will exit after printing)
        match Cli::try_parse() {
            Ok(_) => return Ok(()),
            Err(e) => {
                e.print()?;
                return Ok(());
            }
        }
    }

    // Use clap parsing with expanded args
    let clap_args = std::iter::once("pipetrack".to_string())
        .chain(args.iter().cloned())
        .collect::<Vec<_>>();
    let cli = match Cli::try_parse_from(clap_args) {
        Ok(cli) => cli,
        Err(e) => {
            e.print()?;
            return Ok(());
        }
    };

    handle_command(cli)
}

fn handle_command(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Add { args } => handle_add(args),
        Commands::List { json } => handle_list(json),
        Commands::Board { json } => handle_board(json),
        Commands::Show { target } => handle_show(target),
        Commands::Move { target, stage, to } => handle_move(target, stage, to),
        Commands::Modify { target, args } => handle_modify(target, args),
        Commands::Log { target, note, delete } => {
            if let Some(activity_id) = delete {
                handle_log_delete(target, activity_id)
            } else {
                handle_log(target, note)
            }
        }
        Commands::Delete { target, yes } => handle_delete(target, yes),
    }
}

fn handle_add(args: Vec<String>) -> Result<()> {
    let parsed = match parse_lead_args(&args) {
        Ok(parsed) => parsed,
        Err(e) => user_error(&e.to_string()),
    };

    let contact = join_contact(&parsed.contact);
    if let Err(e) = validate_non_empty(&contact, "Contact name") {
        user_error(&e);
    }

    let company = match parsed.company {
        Some(company) => company,
        None => user_error("Company is required (company=...)"),
    };
    if let Err(e) = validate_non_empty(&company, "Company") {
        user_error(&e);
    }

    let deal_value = match parsed.value.as_deref() {
        Some("none") | None => None,
        Some(raw) => match validate_deal_value(raw) {
            Ok(value) => Some(value),
            Err(e) => user_error(&e),
        },
    };

    let stage = match parsed.stage.as_deref() {
        Some(raw) => match validate_stage(raw) {
            Ok(stage) => stage,
            Err(e) => user_error(&e),
        },
        None => Stage::Lead,
    };

    let conn = DbConnection::connect()?;
    let lead = LeadRepo::create_full(
        &conn,
        &contact,
        &company,
        parsed.email.filter(|v| v != "none"),
        parsed.phone.filter(|v| v != "none"),
        deal_value,
        parsed.source.filter(|v| v != "none"),
        parsed.note.filter(|v| v != "none"),
        stage,
    )
    .context("Failed to create lead")?;

    println!(
        "Created lead {}: {} ({}[{}])",
        lead.id.unwrap_or(0),
        lead.contact,
        lead.stage.as_str(),
        lead.position
    );
    Ok(())
}

fn handle_list(json: bool) -> Result<()> {
    let conn = DbConnection::connect()?;
    let leads = LeadRepo::list_all(&conn)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&leads)?);
    } else {
        print!("{}", format_lead_table(&leads, is_tty()));
    }
    Ok(())
}

fn handle_board(json: bool) -> Result<()> {
    let conn = DbConnection::connect()?;
    let columns = BoardRepo::board(&conn)?;

    if json {
        let mut map = serde_json::Map::new();
        for (stage, leads) in &columns {
            map.insert(stage.as_str().to_string(), serde_json::to_value(leads)?);
        }
        println!("{}", serde_json::to_string_pretty(&map)?);
    } else {
        print!("{}", format_board(&columns, is_tty()));
    }
    Ok(())
}

fn handle_show(target: String) -> Result<()> {
    let id = match validate_lead_id(&target) {
        Ok(id) => id,
        Err(e) => user_error(&e),
    };

    let conn = DbConnection::connect()?;
    let lead = match LeadRepo::get_by_id(&conn, id)? {
        Some(lead) => lead,
        None => user_error(&format!("Lead {} not found", id)),
    };
    let activities = ActivityRepo::get_by_lead(&conn, id)?;

    print!("{}", format_lead_detail(&lead, &activities, is_tty()));
    Ok(())
}

fn handle_move(target: String, stage: Option<String>, to: Option<i64>) -> Result<()> {
    let id = match validate_lead_id(&target) {
        Ok(id) => id,
        Err(e) => user_error(&e),
    };

    let stage = match stage.as_deref() {
        Some(raw) => match validate_stage(raw) {
            Ok(stage) => Some(stage),
            Err(e) => user_error(&e),
        },
        None => None,
    };

    if stage.is_none() && to.is_none() {
        user_error("Nothing to move: give a target stage, --to <position>, or both.");
    }

    let request = MoveRequest { stage, position: to };
    let mut conn = DbConnection::connect()?;

    let mut attempts = 0;
    let lead = loop {
        match BoardRepo::move_lead(&mut conn, id, request) {
            Ok(lead) => break lead,
            Err(e) => {
                if matches!(e.downcast_ref::<MoveError>(), Some(MoveError::Conflict))
                    && attempts < MOVE_RETRY_LIMIT
                {
                    attempts += 1;
                    log::debug!("move of lead {} conflicted, retry {}/{}", id, attempts, MOVE_RETRY_LIMIT);
                    continue;
                }
                match e.downcast_ref::<MoveError>() {
                    Some(MoveError::NotFound(_)) | Some(MoveError::InvalidPosition { .. }) => {
                        user_error(&e.to_string())
                    }
                    _ => return Err(e),
                }
            }
        }
    };

    println!(
        "Moved lead {} to {}[{}]",
        id,
        lead.stage.as_str(),
        lead.position
    );
    Ok(())
}

fn handle_modify(target: String, args: Vec<String>) -> Result<()> {
    let id = match validate_lead_id(&target) {
        Ok(id) => id,
        Err(e) => user_error(&e),
    };

    let parsed = match parse_lead_args(&args) {
        Ok(parsed) => parsed,
        Err(e) => user_error(&e.to_string()),
    };

    if parsed.stage.is_some() {
        user_error("Stage is changed on the board. Use 'pipetrack move <id> <stage>' instead.");
    }

    let mut patch = LeadPatch::default();

    if !parsed.contact.is_empty() {
        patch.contact = Some(join_contact(&parsed.contact));
    }
    if let Some(company) = parsed.company {
        if company == "none" || company.trim().is_empty() {
            user_error("Company cannot be empty");
        }
        patch.company = Some(company);
    }
    if let Some(email) = parsed.email {
        patch.email = Some(if email == "none" { None } else { Some(email) });
    }
    if let Some(phone) = parsed.phone {
        patch.phone = Some(if phone == "none" { None } else { Some(phone) });
    }
    if let Some(value) = parsed.value {
        patch.deal_value = Some(if value == "none" {
            None
        } else {
            match validate_deal_value(&value) {
                Ok(v) => Some(v),
                Err(e) => user_error(&e),
            }
        });
    }
    if let Some(source) = parsed.source {
        patch.source = Some(if source == "none" { None } else { Some(source) });
    }
    if let Some(note) = parsed.note {
        patch.note = Some(if note == "none" { None } else { Some(note) });
    }

    if patch.is_empty() {
        user_error("Nothing to modify. Give new field values (e.g., company=Acme).");
    }

    let conn = DbConnection::connect()?;
    if LeadRepo::get_by_id(&conn, id)?.is_none() {
        user_error(&format!("Lead {} not found", id));
    }

    LeadRepo::update(&conn, id, &patch)?;
    println!("Modified lead {}", id);
    Ok(())
}

fn handle_log(target: String, note: Vec<String>) -> Result<()> {
    let id = match validate_lead_id(&target) {
        Ok(id) => id,
        Err(e) => user_error(&e),
    };

    let note = note.join(" ");
    if let Err(e) = validate_non_empty(&note, "Activity note") {
        user_error(&e);
    }

    let conn = DbConnection::connect()?;
    match ActivityRepo::create(&conn, id, note) {
        Ok(activity) => {
            println!("Logged activity {} on lead {}", activity.id.unwrap_or(0), id);
            Ok(())
        }
        Err(e) if e.to_string().contains("not found") => user_error(&e.to_string()),
        Err(e) => Err(e),
    }
}

fn handle_log_delete(target: String, activity_id: String) -> Result<()> {
    let lead_id = match validate_lead_id(&target) {
        Ok(id) => id,
        Err(e) => user_error(&e),
    };
    let activity_id = match activity_id.parse::<i64>() {
        Ok(id) if id > 0 => id,
        _ => user_error(&format!("Invalid activity ID: '{}'", activity_id)),
    };

    let conn = DbConnection::connect()?;
    if ActivityRepo::delete(&conn, activity_id)? {
        println!("Deleted activity {} from lead {}", activity_id, lead_id);
        Ok(())
    } else {
        user_error(&format!("Activity {} not found", activity_id));
    }
}

fn handle_delete(target: String, yes: bool) -> Result<()> {
    let id = match validate_lead_id(&target) {
        Ok(id) => id,
        Err(e) => user_error(&e),
    };

    let conn = DbConnection::connect()?;
    let lead = match LeadRepo::get_by_id(&conn, id)? {
        Some(lead) => lead,
        None => user_error(&format!("Lead {} not found", id)),
    };

    if !yes && !confirm(&format!("Delete lead {}: {} ({})?", id, lead.contact, lead.company)) {
        println!("Cancelled.");
        return Ok(());
    }

    LeadRepo::delete(&conn, id)?;
    println!("Deleted lead {}: {}", id, lead.contact);
    Ok(())
}

/// Ask a y/N question on stdin
fn confirm(question: &str) -> bool {
    use std::io::Write;

    print!("{} (y/N) ", question);
    let _ = std::io::stdout().flush();

    let mut answer = String::new();
    if std::io::stdin().read_line(&mut answer).is_err() {
        return false;
    }
    matches!(answer.trim(), "y" | "Y" | "yes")
}
