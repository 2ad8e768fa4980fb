use camino::{Utf8Path, Utf8PathBuf};
use colored::Colorize;
use gmpatch_core::{FileKind, ScopeLayout};
use inquire::Text;
use miette::IntoDiagnostic;

use crate::errors::CliError;
use crate::println_pad;
use crate::utils::config::{ToolConfig, CONFIG_FILE_NAME};

#[derive(Debug, Clone)]
pub struct InitProjectArgs {
    pub game_dir: Option<String>,
    pub output_dir: Option<String>,
}

pub fn init_project(args: InitProjectArgs) -> miette::Result<()> {
    let game_dir = match args.game_dir {
        Some(dir) => Utf8PathBuf::from(dir),
        None => prompt_game_dir()?,
    };
    let output_dir = Utf8PathBuf::from(args.output_dir.unwrap_or_else(|| "patches".to_string()));

    let config = ToolConfig {
        game_dir,
        output_dir,
        ..ToolConfig::default()
    };

    if !config.active_archive_path().as_std_path().exists() {
        return Err(CliError::ArchiveMissing {
            path: config.active_archive_path(),
        }
        .into());
    }

    println_pad!(
        "{} {}",
        "🚀 Initializing patch project for:".bright_blue().bold(),
        config.active_archive_path().as_str().bright_cyan().bold()
    );

    let config_path = Utf8Path::new(CONFIG_FILE_NAME);
    config.save(config_path)?;

    for scope in &config.scopes {
        let layout = ScopeLayout::new(&config.output_dir, scope);
        for kind in FileKind::ALL {
            std::fs::create_dir_all(layout.dir(kind).as_std_path())
                .map_err(CliError::from)?;
        }
    }

    println_pad!(
        "{}\n{} {}",
        "Project initialized successfully!".bright_green().bold(),
        "Config:".bright_green(),
        config_path.as_str().bright_white().bold()
    );

    Ok(())
}

fn prompt_game_dir() -> miette::Result<Utf8PathBuf> {
    let dir = Text::new("Enter the directory containing the game's archive file:")
        .with_placeholder(".")
        .prompt()
        .into_diagnostic()?;

    Ok(Utf8PathBuf::from(dir))
}
