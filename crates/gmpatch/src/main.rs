use clap::builder::{styling::AnsiColor, Styles};
use clap::ColorChoice;
use clap::{CommandFactory, FromArgMatches, Parser, Subcommand};
use commands::{
    apply_patch_set, generate_patch_set, info_archive, init_project, manage_data_files,
    ApplyPatchSetArgs, DataMode, GeneratePatchSetArgs, InfoArchiveArgs, InitProjectArgs,
    ManageDataFilesArgs,
};
use miette::Result;

mod commands;
mod errors;
mod utils;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Set up a patch project and its configuration file
    Init {
        /// The directory containing the game's archive file
        #[arg(short, long)]
        game_dir: Option<String>,

        /// The directory patch scopes are written to
        #[arg(short, long)]
        output_dir: Option<String>,
    },
    /// Diff the modded archive against vanilla and write the patch set
    Generate {
        /// The path to the project config file
        #[arg(short, long)]
        config_path: Option<String>,

        /// The scope to write generated files into
        #[arg(short, long)]
        scope: Option<String>,
    },
    /// Apply a scope's patch set onto the vanilla archive
    Apply {
        /// The path to the project config file
        #[arg(short, long)]
        config_path: Option<String>,

        /// The scope whose patch set is applied
        #[arg(short, long)]
        scope: Option<String>,

        /// Answer every prompt with its non-interactive default
        #[arg(short, long, default_value_t = false)]
        yes: bool,
    },
    /// Show information about the archive and the on-disk patch set
    Info {
        /// The path to the project config file
        #[arg(short, long)]
        config_path: Option<String>,
    },
    /// Manage the vanilla and backup copies of the archive file
    Data {
        /// The path to the project config file
        #[arg(short, long)]
        config_path: Option<String>,

        /// Which copy operation to run
        #[arg(value_enum)]
        mode: DataMode,
    },
}

fn parse_args() -> Args {
    // Configure colored/styled help output
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default().bold())
        .usage(AnsiColor::Green.on_default().bold())
        .literal(AnsiColor::Cyan.on_default())
        .placeholder(AnsiColor::Blue.on_default());

    let matches = Args::command()
        .styles(styles)
        .color(ColorChoice::Auto)
        .get_matches();

    Args::from_arg_matches(&matches).expect("failed to parse arguments")
}

fn main() -> Result<()> {
    let args = parse_args();

    match args.command {
        Commands::Init {
            game_dir,
            output_dir,
        } => init_project(InitProjectArgs {
            game_dir,
            output_dir,
        }),
        Commands::Generate { config_path, scope } => {
            generate_patch_set(GeneratePatchSetArgs { config_path, scope })
        }
        Commands::Apply {
            config_path,
            scope,
            yes,
        } => apply_patch_set(ApplyPatchSetArgs {
            config_path,
            scope,
            yes,
        }),
        Commands::Info { config_path } => info_archive(InfoArchiveArgs { config_path }),
        Commands::Data { config_path, mode } => {
            manage_data_files(ManageDataFilesArgs { config_path, mode })
        }
    }
}
