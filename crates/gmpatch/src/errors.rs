use camino::Utf8PathBuf;
use gmpatch_core::CollisionKind;
use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic)]
pub enum CliError {
    #[error("Configuration file not found")]
    #[diagnostic(
        code(config::not_found),
        help("Run `gmpatch init` to create a gmpatch.config.json in your project directory")
    )]
    ConfigNotFound { search_path: Utf8PathBuf },

    #[error("Configuration file error")]
    #[diagnostic(
        code(config::parse_error),
        help("Check your gmpatch.config.json file for syntax errors")
    )]
    ConfigParseError {
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid scope name: {name}")]
    #[diagnostic(
        code(scope::invalid_name),
        help("Scope names must be alphanumeric and contain no spaces or special characters")
    )]
    InvalidScopeName { name: String },

    #[error("Unknown scope: {name}")]
    #[diagnostic(
        code(scope::unknown),
        help("Add the scope to the `scopes` list in gmpatch.config.json first")
    )]
    UnknownScope { name: String },

    #[error("Archive file not found: {path}")]
    #[diagnostic(
        code(archive::not_found),
        help("Check the `gameDir` and `archiveName` settings in gmpatch.config.json")
    )]
    ArchiveMissing { path: Utf8PathBuf },

    #[error("Vanilla archive copy not found: {path}")]
    #[diagnostic(
        code(archive::vanilla_missing),
        help("Run `gmpatch data update-vanilla` while the active archive is unmodified")
    )]
    VanillaMissing { path: Utf8PathBuf },

    #[error("Code entry '{entry}' is an object event with no matching game object")]
    #[diagnostic(
        code(apply::manual_attach_required),
        help(
            "Add a GameObjects/ definition for the object (or attach the event by hand) \
             and re-run the apply"
        )
    )]
    ManualAttachRequired { entry: String },

    #[error(transparent)]
    #[diagnostic(code(engine::error))]
    Engine {
        #[from]
        source: gmpatch_core::Error,
    },

    #[error("IO operation failed")]
    #[diagnostic(code(io::operation_failed))]
    IoError {
        #[from]
        source: std::io::Error,
    },
}

impl CliError {
    /// Lift a core error, promoting the cases that deserve dedicated
    /// diagnostics and help text.
    pub fn from_engine(err: gmpatch_core::Error) -> Self {
        match err {
            gmpatch_core::Error::Collision {
                kind: CollisionKind::UnattachedEvent,
                entry,
            } => Self::ManualAttachRequired { entry },
            gmpatch_core::Error::ArchiveNotFound(path) => Self::ArchiveMissing { path },
            other => Self::Engine { source: other },
        }
    }
}
