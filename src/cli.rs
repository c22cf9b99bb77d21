use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct Cli {
    /// Book root holding `src/` and `build/`.
    #[arg(long, global = true, default_value = ".")]
    pub root: PathBuf,

    /// Preferences file (default: `$WCT_CONFIG`, then `~/.config/wct/config.json`).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log at debug level. `RUST_LOG` overrides.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Append a new chapter.
    #[command(visible_alias = "cc")]
    ChapterCreate(ChapterCreateArgs),

    /// Move a chapter to another position, renumbering those in between.
    #[command(visible_alias = "cm")]
    ChapterMove(ChapterMoveArgs),

    /// Delete a chapter and its images, renumbering those after it.
    #[command(visible_alias = "cd")]
    ChapterDelete(ChapterIndexArgs),

    /// Open a chapter in the configured editor and preview programs.
    #[command(visible_alias = "ce")]
    ChapterEdit(ChapterIndexArgs),

    /// Change a chapter's title.
    #[command(visible_alias = "cr")]
    ChapterRename(ChapterRenameArgs),

    /// Print chapters in reading order.
    #[command(visible_alias = "cl")]
    ChapterList,

    /// Concatenate chapters into `build/` and copy images next to it.
    #[command(visible_alias = "bc")]
    BookCompile,

    ConfigList,
    ConfigGet(ConfigGetArgs),
    ConfigSet(ConfigSetArgs),

    /// Finish a chapter move that was interrupted.
    Resume,
}

#[derive(Debug, Args)]
pub struct ChapterCreateArgs {
    pub title: String,
}

#[derive(Debug, Args)]
pub struct ChapterMoveArgs {
    pub from: usize,
    pub to: usize,

    /// Print the renames instead of applying them.
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Debug, Args)]
pub struct ChapterIndexArgs {
    pub index: usize,
}

#[derive(Debug, Args)]
pub struct ChapterRenameArgs {
    pub index: usize,
    pub title: String,
}

#[derive(Debug, Args)]
pub struct ConfigGetArgs {
    /// One of `editor`, `preview`, `language`.
    pub key: String,
}

#[derive(Debug, Args)]
pub struct ConfigSetArgs {
    /// One of `editor`, `preview`, `language`.
    pub key: String,

    /// New value; omit to clear.
    pub value: Option<String>,
}
