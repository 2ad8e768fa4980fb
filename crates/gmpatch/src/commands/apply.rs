use colored::Colorize;
use gmpatch_core::{
    apply_patches, ApplyPrompt, ArchiveCodec, AutoContinue, JsonCodec, ScopeLayout,
};

use crate::errors::CliError;
use crate::println_pad;
use crate::utils::config::load_config;
use crate::utils::prompt::{select_scope, InquirePrompt};

#[derive(Debug, Clone)]
pub struct ApplyPatchSetArgs {
    pub config_path: Option<String>,
    pub scope: Option<String>,
    pub yes: bool,
}

pub fn apply_patch_set(args: ApplyPatchSetArgs) -> miette::Result<()> {
    let config = load_config(args.config_path)?;
    let scope = select_scope(&config, args.scope)?;

    let vanilla_path = config.vanilla_archive_path();
    if !vanilla_path.as_std_path().exists() {
        return Err(CliError::VanillaMissing { path: vanilla_path }.into());
    }

    // Always start from the pristine copy so repeated applies are equivalent.
    let codec = JsonCodec;
    let mut archive = codec.load(&vanilla_path).map_err(CliError::from_engine)?;

    let layout = ScopeLayout::new(&config.output_dir, &scope);
    println_pad!(
        "{} {} {} {}",
        "🔧 Applying scope".bright_blue().bold(),
        scope.bright_cyan().bold(),
        "onto".bright_blue().bold(),
        archive.display_name.bright_cyan().bold()
    );

    let mut interactive = InquirePrompt;
    let mut auto = AutoContinue;
    let prompt: &mut dyn ApplyPrompt = if args.yes { &mut auto } else { &mut interactive };

    let report = apply_patches(&mut archive, &layout, prompt).map_err(CliError::from_engine)?;

    if !report.committed {
        let reason = report
            .aborted
            .unwrap_or_else(|| "aborted".to_string());
        println_pad!(
            "{} {}",
            "✖ Nothing written:".bright_red().bold(),
            reason.bright_white()
        );
        return Ok(());
    }

    let active_path = config.active_archive_path();
    codec
        .save(&archive, &active_path)
        .map_err(CliError::from_engine)?;

    println_pad!(
        "{}\n{} {}",
        "Patched archive committed!".bright_green().bold(),
        "Location:".bright_green(),
        active_path.as_str().bright_white().bold()
    );
    println_pad!(
        "   {} {} objects, {} new code, {} scripts, {} patched, {} sprites",
        "•".bright_cyan(),
        report.objects_added.to_string().bright_white().bold(),
        report.new_code.to_string().bright_white().bold(),
        report.scripts_added.to_string().bright_white().bold(),
        report.patched.to_string().bright_white().bold(),
        report.sprites_added.to_string().bright_white().bold()
    );
    if report.skipped_patches > 0 {
        println_pad!(
            "   {} {} patch(es) skipped (target entry not in this archive)",
            "•".dimmed(),
            report.skipped_patches.to_string().bright_white()
        );
    }
    for warning in &report.warnings {
        println_pad!("   {} {}", "⚠".bright_yellow(), warning.bright_white());
    }

    Ok(())
}
