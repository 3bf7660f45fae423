// Command abbreviation matching for the Pipetrack CLI

/// Find all commands that start with the given prefix (case-insensitive)
pub fn find_matching_commands<'a>(prefix: &str, commands: &'a [&str]) -> Vec<&'a str> {
    let prefix_lower = prefix.to_lowercase();
    commands.iter()
        .filter(|cmd| cmd.to_lowercase().starts_with(&prefix_lower))
        .copied()
        .collect()
}

/// Find a unique command match for the given prefix
/// Returns Ok(command) if exactly one match, Err(matches) if ambiguous, Err(empty) if no match
/// Note: Exact matches take precedence over prefix matches (e.g., "log" matches "log" not "logout")
pub fn find_unique_command<'a>(prefix: &str, commands: &'a [&str]) -> Result<&'a str, Vec<&'a str>> {
    // First check for exact match (case-insensitive)
    let prefix_lower = prefix.to_lowercase();
    for cmd in commands {
        if cmd.to_lowercase() == prefix_lower {
            return Ok(*cmd);
        }
    }

    // Then check for prefix matches
    let matches = find_matching_commands(prefix, commands);

    if matches.is_empty() {
        Err(Vec::new())
    } else if matches.len() == 1 {
        Ok(matches[0])
    } else {
        Err(matches)
    }
}

/// Top-level commands in Pipetrack
pub const TOP_LEVEL_COMMANDS: &[&str] = &[
    "add", "list", "board", "show", "move", "modify", "log", "delete",
];

/// Lead subcommands (used with the <id> <subcommand> pattern)
pub const LEAD_SUBCOMMANDS: &[&str] = &[
    "show", "move", "modify", "log", "delete",
];

/// Expand command abbreviations in argument list
/// Returns expanded args or error message
pub fn expand_command_abbreviations(args: Vec<String>) -> Result<Vec<String>, String> {
    if args.is_empty() {
        return Ok(args);
    }

    let mut expanded = Vec::new();
    let mut i = 0;

    while i < args.len() {
        let arg = &args[i];

        // Check if this is a top-level command (not a flag, not a number)
        if i == 0 && !arg.starts_with('-') && arg.parse::<i64>().is_err() {
            match find_unique_command(arg, TOP_LEVEL_COMMANDS) {
                Ok(full_cmd) => {
                    expanded.push(full_cmd.to_string());
                    i += 1;
                    continue;
                }
                Err(matches) => {
                    if matches.is_empty() {
                        // No match - pass through and let clap report it
                        expanded.push(arg.clone());
                        i += 1;
                        continue;
                    } else {
                        // Ambiguous command
                        let match_list = matches.join(", ");
                        return Err(format!(
                            "Ambiguous command '{}'. Did you mean one of: {}?",
                            arg, match_list
                        ));
                    }
                }
            }
        }

        // Check if this is a lead ID followed by a subcommand
        // Pattern: pipetrack <id> <subcommand> ...
        if i == 0 && !arg.starts_with('-') && arg.parse::<i64>().is_ok() {
            if i + 1 < args.len() {
                let next_arg = &args[i + 1];
                if !next_arg.starts_with('-') {
                    match find_unique_command(next_arg, LEAD_SUBCOMMANDS) {
                        Ok(full_subcmd) => {
                            // Normalize id-first syntax to <subcommand> <id>
                            expanded.push(full_subcmd.to_string());
                            expanded.push(arg.clone());
                            i += 2;
                            continue;
                        }
                        Err(matches) => {
                            if matches.is_empty() {
                                expanded.push(arg.clone());
                                i += 1;
                                continue;
                            } else {
                                let match_list = matches.join(", ");
                                return Err(format!(
                                    "Ambiguous subcommand '{}'. Did you mean one of: {}?",
                                    next_arg, match_list
                                ));
                            }
                        }
                    }
                }
            }
        }

        // Not a command to expand, pass through
        expanded.push(arg.clone());
        i += 1;
    }

    Ok(expanded)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_matching_commands() {
        let commands = &["list", "log", "board"];
        assert_eq!(find_matching_commands("l", commands), vec!["list", "log"]);
        assert_eq!(find_matching_commands("li", commands), vec!["list"]);
        assert_eq!(find_matching_commands("b", commands), vec!["board"]);
        assert!(find_matching_commands("x", commands).is_empty());
    }

    #[test]
    fn test_find_unique_command_exact_wins() {
        let commands = &["log", "logout"];
        assert_eq!(find_unique_command("log", commands), Ok("log"));
    }

    #[test]
    fn test_expand_top_level() {
        let args = vec!["bo".to_string()];
        assert_eq!(
            expand_command_abbreviations(args).unwrap(),
            vec!["board".to_string()]
        );
    }

    #[test]
    fn test_expand_ambiguous_is_error() {
        // "l" matches both list and log
        let args = vec!["l".to_string()];
        assert!(expand_command_abbreviations(args).is_err());
    }

    #[test]
    fn test_expand_id_first_syntax() {
        let args = vec!["3".to_string(), "mov".to_string(), "quotation".to_string()];
        assert_eq!(
            expand_command_abbreviations(args).unwrap(),
            vec!["move".to_string(), "3".to_string(), "quotation".to_string()]
        );
    }

    #[test]
    fn test_expand_passes_unknown_through() {
        let args = vec!["frobnicate".to_string()];
        assert_eq!(
            expand_command_abbreviations(args).unwrap(),
            vec!["frobnicate".to_string()]
        );
    }
}
