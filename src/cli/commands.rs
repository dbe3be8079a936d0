use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "onetree", about = concat!("onetree v", env!("CARGO_PKG_VERSION"), " - browse notebook hierarchy snapshots"), version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Config file (default: ./onetree.toml if present)
    #[arg(short = 'c', long = "config", global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the hierarchy as an indented tree
    Tree(SnapshotArgs),
    /// Count items of each kind
    Stats(SnapshotArgs),
    /// List pages with their paths
    Pages(PagesArgs),
    /// Find items whose name matches a regex
    Find(FindArgs),
    /// Write the hierarchy, or one item's subtree, back out as XML
    Export(ExportArgs),
}

#[derive(Args)]
pub struct SnapshotArgs {
    /// Hierarchy snapshot XML file
    pub file: PathBuf,
}

#[derive(Args)]
pub struct PagesArgs {
    /// Hierarchy snapshot XML file
    pub file: PathBuf,
    /// Only pages below the item with this id
    #[arg(long)]
    pub section: Option<String>,
}

#[derive(Args)]
pub struct FindArgs {
    /// Hierarchy snapshot XML file
    pub file: PathBuf,
    /// Regex matched against item names
    pub pattern: String,
}

#[derive(Args)]
pub struct ExportArgs {
    /// Hierarchy snapshot XML file
    pub file: PathBuf,
    /// Export only the item with this id
    #[arg(long)]
    pub id: Option<String>,
}
