use camino::Utf8Path;
use colored::Colorize;

use crate::errors::CliError;
use crate::println_pad;
use crate::utils::config::load_config;

/// Which direction to copy between the active archive and its side copies.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum DataMode {
    /// Replace the active archive with the vanilla copy
    LoadVanilla,
    /// Snapshot the active archive as the vanilla copy
    UpdateVanilla,
    /// Replace the active archive with the backup copy
    LoadBackup,
    /// Snapshot the active archive as the backup copy
    UpdateBackup,
}

#[derive(Debug, Clone)]
pub struct ManageDataFilesArgs {
    pub config_path: Option<String>,
    pub mode: DataMode,
}

pub fn manage_data_files(args: ManageDataFilesArgs) -> miette::Result<()> {
    let config = load_config(args.config_path)?;

    let active = config.active_archive_path();
    let vanilla = config.vanilla_archive_path();
    let backup = config.backup_archive_path();

    let (from, to) = match args.mode {
        DataMode::LoadVanilla => (&vanilla, &active),
        DataMode::UpdateVanilla => (&active, &vanilla),
        DataMode::LoadBackup => (&backup, &active),
        DataMode::UpdateBackup => (&active, &backup),
    };

    copy_archive(from, to)?;

    println_pad!(
        "{} {} {} {}",
        "💾 Copied".bright_green().bold(),
        from.as_str().bright_white().bold(),
        "->".bright_green(),
        to.as_str().bright_white().bold()
    );

    Ok(())
}

fn copy_archive(from: &Utf8Path, to: &Utf8Path) -> miette::Result<()> {
    if !from.as_std_path().exists() {
        return Err(CliError::ArchiveMissing {
            path: from.to_owned(),
        }
        .into());
    }

    std::fs::copy(from.as_std_path(), to.as_std_path()).map_err(CliError::from)?;
    Ok(())
}
