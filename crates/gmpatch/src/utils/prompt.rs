//! Interactive prompts for apply runs and scope selection.

use crate::errors::CliError;
use crate::println_pad;
use crate::utils::config::ToolConfig;
use crate::utils::validate_scope_name;
use colored::Colorize;
use gmpatch_core::{ApplyPrompt, WarningChoice};
use inquire::{Confirm, Select};
use miette::IntoDiagnostic;

/// Console-backed [`ApplyPrompt`]. A declined or interrupted prompt reads as
/// the safe answer (abort, do not commit).
#[derive(Debug, Default)]
pub struct InquirePrompt;

impl ApplyPrompt for InquirePrompt {
    fn patch_trouble(&mut self, file_name: &str, detail: &str) -> WarningChoice {
        println_pad!(
            "{} {} {}",
            "⚠ Patch problem in".bright_yellow().bold(),
            file_name.bright_white().bold(),
            format!("({detail})").dimmed()
        );

        let keep_going = Confirm::new("Continue applying and commit with a warning?")
            .with_default(true)
            .prompt()
            .unwrap_or(false);

        if keep_going {
            WarningChoice::Continue
        } else {
            WarningChoice::Abort
        }
    }

    fn confirm_commit(&mut self, warnings: &[String]) -> bool {
        println_pad!(
            "{}",
            format!("{} warning(s) accumulated during this run:", warnings.len())
                .bright_yellow()
                .bold()
        );
        for warning in warnings {
            println_pad!("  {} {}", "•".bright_yellow(), warning.bright_white());
        }

        Confirm::new("Commit the patched archive anyway?")
            .with_default(false)
            .prompt()
            .unwrap_or(false)
    }
}

/// The scope a command operates on: the explicit flag when given, the only
/// configured scope when there is one, otherwise an interactive pick.
pub fn select_scope(config: &ToolConfig, flag: Option<String>) -> miette::Result<String> {
    if let Some(scope) = flag {
        validate_scope_name(&scope)?;
        if !config.scopes.contains(&scope) {
            return Err(CliError::UnknownScope { name: scope }.into());
        }
        return Ok(scope);
    }

    match config.scopes.as_slice() {
        [] => Err(CliError::UnknownScope {
            name: "<none configured>".to_string(),
        }
        .into()),
        [only] => Ok(only.clone()),
        scopes => Select::new("Select a scope:", scopes.to_vec())
            .prompt()
            .into_diagnostic(),
    }
}
