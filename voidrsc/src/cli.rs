use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "voidrsc",
    about = "Inspect, extract and patch Void engine resource containers.",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    #[command(visible_aliases = ["l", "ls"], about = "List the entries of a container")]
    List(ListArgs),

    #[command(visible_alias = "x", about = "Export entries to a directory")]
    Export(ExportArgs),

    #[command(visible_alias = "e", about = "Print an .entities entry as JSON")]
    Entities(EntitiesArgs),

    #[command(about = "Replace the data of an entry in place")]
    Insert(InsertArgs),
}

#[derive(Debug, clap::Args)]
pub struct ArchiveArgs {
    /// Path to any .index or .resources file of the container
    pub archive: PathBuf,

    /// Use exactly the given index generation instead of the latest one
    #[arg(long)]
    pub exact: bool,

    /// Path to the shared resource file (defaults to shared_2_3.sharedrsc next to the archive)
    #[arg(long, value_name = "PATH")]
    pub shared: Option<PathBuf>,
}

#[derive(Debug, clap::Args)]
pub struct ListArgs {
    #[command(flatten)]
    pub archive: ArchiveArgs,

    /// Output in JSON format
    #[arg(short = 'j', long)]
    pub json: bool,

    /// Only list entries of this resource type
    #[arg(short = 't', long = "type", value_name = "TYPE")]
    pub kind: Option<String>,

    /// Only list entries whose source or destination contains this text
    #[arg(short = 's', long, value_name = "TEXT")]
    pub search: Option<String>,
}

#[derive(Debug, clap::Args)]
pub struct ExportArgs {
    #[command(flatten)]
    pub archive: ArchiveArgs,

    /// Output directory
    #[arg(short = 'o', long = "output", default_value = ".")]
    pub output: PathBuf,

    /// Read and decompress entries without writing anything
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Suppress output
    #[arg(short = 'q', long)]
    pub quiet: bool,

    /// Only export entries whose source or destination contains any of these (exports all if none specified)
    #[arg(value_name = "FILTER")]
    pub filters: Vec<String>,
}

#[derive(Debug, clap::Args)]
pub struct EntitiesArgs {
    #[command(flatten)]
    pub archive: ArchiveArgs,

    /// Entry id, destination or source path of the .entities entry
    pub entry: String,

    /// Only print the entity with this id
    #[arg(long, value_name = "ID")]
    pub id: Option<String>,

    /// Print compact JSON on a single line
    #[arg(long)]
    pub compact: bool,
}

#[derive(Debug, clap::Args)]
pub struct InsertArgs {
    #[command(flatten)]
    pub archive: ArchiveArgs,

    /// Entry id, destination or source path of the entry to replace
    pub entry: String,

    /// File holding the new, uncompressed data
    pub file: PathBuf,
}
