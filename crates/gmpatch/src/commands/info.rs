use colored::Colorize;
use gmpatch_core::{ArchiveCodec, JsonCodec, ScopeLayout};
use miette::IntoDiagnostic;

use crate::errors::CliError;
use crate::println_pad;
use crate::utils::config::load_config;

#[derive(Debug, Clone)]
pub struct InfoArchiveArgs {
    pub config_path: Option<String>,
}

pub fn info_archive(args: InfoArchiveArgs) -> miette::Result<()> {
    let config = load_config(args.config_path)?;

    let codec = JsonCodec;
    let archive = codec
        .load(&config.active_archive_path())
        .map_err(CliError::from_engine)?;

    println_pad!(
        "{} {}",
        "📦 Archive:".bright_blue().bold(),
        archive.display_name.bright_cyan().bold()
    );
    println_pad!(
        "{} {}",
        "🗂️ Location:".bright_green(),
        config.active_archive_path().as_str().bright_white().bold()
    );
    println_pad!(
        "   {} {} code entries ({} root), {} scripts, {} sprites, {} objects, {} texture pages",
        "•".bright_cyan(),
        archive.code.len().to_string().bright_white().bold(),
        archive.root_code().count().to_string().bright_white(),
        archive.scripts.len().to_string().bright_white().bold(),
        archive.sprites.len().to_string().bright_white().bold(),
        archive.objects.len().to_string().bright_white().bold(),
        archive.texture_pages.len().to_string().bright_white().bold()
    );

    println_pad!("\n{}", "🏗️  Scopes:".bright_magenta().bold());
    for scope in &config.scopes {
        let layout = ScopeLayout::new(&config.output_dir, scope);
        let staged = count_matches(&format!("{}/**/*.*", layout.root()))?;
        let patches = count_matches(&format!("{}/Code/*.gml.patch", layout.root()))?;

        println_pad!(
            "   {} {} {}",
            "•".bright_cyan(),
            scope.bright_cyan().bold(),
            format!("({staged} files, {patches} patches)").dimmed()
        );
    }

    Ok(())
}

fn count_matches(pattern: &str) -> miette::Result<usize> {
    let paths = glob::glob(pattern).into_diagnostic()?;
    Ok(paths.filter_map(|p| p.ok()).filter(|p| p.is_file()).count())
}
