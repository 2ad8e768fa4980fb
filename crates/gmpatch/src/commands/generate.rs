use colored::Colorize;
use gmpatch_core::{
    generate_patches, ArchiveCodec, FileKind, ImportSession, JsonCodec, ScopeLayout,
};

use crate::errors::CliError;
use crate::println_pad;
use crate::utils::config::load_config;
use crate::utils::prompt::select_scope;

#[derive(Debug, Clone)]
pub struct GeneratePatchSetArgs {
    pub config_path: Option<String>,
    pub scope: Option<String>,
}

pub fn generate_patch_set(args: GeneratePatchSetArgs) -> miette::Result<()> {
    let config = load_config(args.config_path)?;
    let scope = select_scope(&config, args.scope)?;

    let vanilla_path = config.vanilla_archive_path();
    if !vanilla_path.as_std_path().exists() {
        return Err(CliError::VanillaMissing { path: vanilla_path }.into());
    }

    let codec = JsonCodec;
    let vanilla = codec.load(&vanilla_path).map_err(CliError::from_engine)?;
    let modded = codec
        .load(&config.active_archive_path())
        .map_err(CliError::from_engine)?;

    println_pad!(
        "{} {} {} {}",
        "🔍 Diffing".bright_blue().bold(),
        modded.display_name.bright_cyan().bold(),
        "against vanilla into scope".bright_blue().bold(),
        scope.bright_cyan().bold()
    );

    let mut session = ImportSession::new();
    let report = generate_patches(&vanilla, &modded, &mut session).map_err(CliError::from_engine)?;

    // Hand-edited source files survive regeneration.
    let layout = ScopeLayout::new(&config.output_dir, &scope);
    session
        .flush(&layout, &[FileKind::Code])
        .map_err(CliError::from_engine)?;

    println_pad!(
        "{} {}",
        "📁 Patch set written to:".bright_yellow(),
        layout.root().as_str().bright_white().bold()
    );
    println_pad!(
        "   {} {} patched, {} new code, {} scripts, {} sprites, {} objects",
        "•".bright_cyan(),
        report.patched.to_string().bright_white().bold(),
        report.new_code.to_string().bright_white().bold(),
        report.scripts.to_string().bright_white().bold(),
        report.sprites.to_string().bright_white().bold(),
        report.objects.to_string().bright_white().bold()
    );

    for warning in &report.warnings {
        println_pad!("   {} {}", "⚠".bright_yellow(), warning.bright_white());
    }

    Ok(())
}
