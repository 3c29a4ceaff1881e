//! The `recallkit validate` command.

use std::path::PathBuf;

use anyhow::Result;

pub fn execute(session_path: PathBuf) -> Result<()> {
    let sessions = recallkit_core::parser::load_sessions(&session_path)?;

    let mut total_warnings = 0;

    for session in &sessions {
        println!(
            "Session: {} / {} ({} trials)",
            session.participant,
            session.experiment,
            session.trials.len()
        );

        let warnings = recallkit_core::parser::validate_session(session);
        for w in &warnings {
            let prefix = w
                .trial
                .map(|n| format!("  [trial {n}]"))
                .unwrap_or_else(|| "  ".to_string());
            println!("{prefix} WARNING: {}", w.message);
        }
        total_warnings += warnings.len();
    }

    if sessions.is_empty() {
        println!("No session files found.");
    } else if total_warnings == 0 {
        println!("All sessions valid.");
    } else {
        println!("\n{total_warnings} warning(s) found.");
    }

    Ok(())
}
