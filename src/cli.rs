use clap::{ArgAction, Parser, Subcommand};
use std::convert::Infallible;
use std::path::PathBuf;
use std::str::FromStr;

/// Prefix marking a folder argument as an asset identifier.
pub const ID_PREFIX: &str = "uuid:";

/// A folder named by path, or by the identifier in its sidecar
/// (`uuid:<id>`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Path(PathBuf),
    Id(String),
}
impl FromStr for Target {
    type Err = Infallible;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.strip_prefix(ID_PREFIX) {
            Some(id) if !id.is_empty() => Self::Id(id.to_owned()),
            _ => Self::Path(PathBuf::from(s)),
        })
    }
}

/// Find assets nothing refers to, move them aside, and bring them back.
#[derive(Debug, Parser)]
#[command(name = "unref", version, about)]
pub struct Cli {
    /// Configuration file (TOML, YAML or JSON)
    #[arg(long, global = true, env = "UNREF_CONFIG", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Game project root, used to resolve asset identifiers
    #[arg(long, global = true, value_name = "DIR")]
    pub project: Option<PathBuf>,

    /// More log output (repeat for more)
    #[arg(short, long, global = true, action = ArgAction::Count, conflicts_with = "quiet")]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Report which assets in a folder are used
    ///
    /// Folders may be given as paths or as `uuid:<id>`. References are
    /// searched for under the configured search root, or else the nearest
    /// enclosing `assets` folder.
    Scan {
        folder: Target,
        /// Search for references here instead of the configured search root
        #[arg(long, value_name = "DIR")]
        search: Option<Target>,
        /// Print the full result as JSON
        #[arg(long)]
        json: bool,
        /// Only list unused assets
        #[arg(long)]
        unused_only: bool,
    },
    /// Scan a folder and move its unused assets into quarantine
    Move {
        folder: Target,
        #[arg(long, value_name = "DIR")]
        search: Option<Target>,
        /// Replace an existing quarantine without asking
        #[arg(short, long)]
        yes: bool,
    },
    /// Move quarantined assets back into a folder
    Restore { folder: Target },
    /// Permanently delete a folder's quarantine
    Purge {
        folder: Target,
        /// Don't ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },
    /// Rewrite asset identifiers using a JSON map of old to new
    Replace {
        folder: Target,
        #[arg(long, value_name = "FILE")]
        map: PathBuf,
    },
    /// Print the effective configuration
    Config,
}

impl Command {
    /// The folder the command acts on, if it takes one.
    pub fn folder(&self) -> Option<&Target> {
        match self {
            Self::Scan { folder, .. }
            | Self::Move { folder, .. }
            | Self::Restore { folder }
            | Self::Purge { folder, .. }
            | Self::Replace { folder, .. } => Some(folder),
            Self::Config => None,
        }
    }
}
