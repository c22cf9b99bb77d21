use std::path::Path;

use anyhow::Context as _;

use crate::cli::{Cli, Command};
use crate::config::PreferencesStore;
use crate::engine::RenumberEngine;
use crate::naming::Layout;
use crate::plan::PlanJournal;
use crate::storage::LocalFs;

pub fn run(cli: Cli) -> anyhow::Result<()> {
    let store = || PreferencesStore::locate(cli.config.as_deref());

    match cli.command {
        Command::ConfigList => {
            for line in store()?.list().context("config list")? {
                println!("{line}");
            }
        }
        Command::ConfigGet(args) => {
            println!("{}", store()?.get(&args.key).context("config get")?);
        }
        Command::ConfigSet(args) => {
            store()?
                .set(&args.key, args.value.as_deref())
                .context("config set")?;
        }
        Command::Resume => {
            let engine = engine_for(&cli.root);
            engine.index().ensure_layout().context("prepare book layout")?;
            let applied = engine.resume().context("resume")?;
            tracing::info!(applied, "resume finished");
            engine.index().verify().context("check chapter tree")?;
        }
        Command::ChapterCreate(args) => {
            let engine = open_book(&cli.root)?;
            engine
                .create_chapter(&args.title)
                .context("chapter create")?;
        }
        Command::ChapterMove(args) => {
            let engine = open_book(&cli.root)?;
            if args.dry_run {
                let plan = engine
                    .plan_chapter_move(args.from, args.to)
                    .context("chapter move")?;
                for step in &plan.steps {
                    println!("{} -> {}", step.from.display(), step.to.display());
                }
            } else {
                engine
                    .move_chapter(args.from, args.to)
                    .context("chapter move")?;
            }
        }
        Command::ChapterDelete(args) => {
            let engine = open_book(&cli.root)?;
            engine
                .delete_chapter(args.index)
                .context("chapter delete")?;
        }
        Command::ChapterRename(args) => {
            let engine = open_book(&cli.root)?;
            engine
                .rename_chapter(args.index, &args.title)
                .context("chapter rename")?;
        }
        Command::ChapterList => {
            let engine = open_book(&cli.root)?;
            for chapter in engine.list_chapters().context("chapter list")? {
                println!("{chapter}");
            }
        }
        Command::ChapterEdit(args) => {
            let engine = open_book(&cli.root)?;
            let path = engine
                .index()
                .chapter_file_path(args.index)
                .context("chapter edit")?;
            let preferences = store()?.load()?;
            crate::launcher::edit(&preferences, &path)?;
            if let Err(err) = crate::launcher::preview(&preferences, &path) {
                tracing::warn!("{err:#}");
            }
        }
        Command::BookCompile => {
            let engine = open_book(&cli.root)?;
            let chapters = engine.index().chapter_paths().context("book compile")?;
            let out = crate::compile::compile(engine.layout(), &chapters).context("book compile")?;
            let preferences = store()?.load()?;
            if let Err(err) = crate::launcher::preview(&preferences, &out) {
                tracing::warn!("{err:#}");
            }
        }
    }

    Ok(())
}

fn engine_for(root: &Path) -> RenumberEngine<LocalFs> {
    let layout = Layout::new(root);
    let journal = PlanJournal::new(layout.journal_path());
    RenumberEngine::new(LocalFs, layout).with_journal(journal)
}

/// Prepares the book layout and refuses to touch a tree that is mid-move or
/// out of step.
fn open_book(root: &Path) -> anyhow::Result<RenumberEngine<LocalFs>> {
    let engine = engine_for(root);
    engine
        .index()
        .ensure_layout()
        .context("prepare book layout")?;
    PlanJournal::new(engine.layout().journal_path()).ensure_idle()?;
    let count = engine.index().verify().context("check chapter tree")?;
    tracing::debug!(root = %root.display(), count, "opened book");
    Ok(engine)
}
