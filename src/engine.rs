//! Create, move, delete and rename chapters while keeping documents and image
//! folders numbered `[0, N)` in lockstep.
//!
//! Each operation reads the current state through [`ChapterIndex`], computes
//! what to rename, and issues backend calls one at a time. A failure aborts
//! the operation where it stands; with a [`PlanJournal`] configured, an
//! interrupted move can be finished later with [`RenumberEngine::resume`].

use std::path::PathBuf;

use crate::error::{BookError, Result};
use crate::index::ChapterIndex;
use crate::naming::{self, Layout};
use crate::plan::{self, PlanJournal, RenamePlan};
use crate::storage::StorageBackend;

pub struct RenumberEngine<B: StorageBackend> {
    backend: B,
    layout: Layout,
    journal: Option<PlanJournal>,
}

impl<B: StorageBackend> RenumberEngine<B> {
    pub fn new(backend: B, layout: Layout) -> Self {
        Self {
            backend,
            layout,
            journal: None,
        }
    }

    #[must_use]
    pub fn with_journal(mut self, journal: PlanJournal) -> Self {
        self.journal = Some(journal);
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn index(&self) -> ChapterIndex<'_, B> {
        ChapterIndex::new(&self.backend, &self.layout)
    }

    /// Appends a chapter at index `N` and returns that index.
    pub fn create_chapter(&self, title: &str) -> Result<usize> {
        let index = self.index().chapter_count()?;
        tracing::info!(index, title, "create chapter");

        self.backend.create_file(
            &self.layout.chapter_path_for(index, title),
            &format!("## {title}"),
        )?;
        self.backend
            .create_directory(&self.layout.images_path(index))?;
        Ok(index)
    }

    /// The renames [`Self::move_chapter`] would issue, without issuing them.
    pub fn plan_chapter_move(&self, from: usize, to: usize) -> Result<RenamePlan> {
        if from == to {
            return Ok(RenamePlan::default());
        }
        let index = self.index();
        let count = index.chapter_count()?;
        for requested in [from, to] {
            if requested >= count {
                return Err(BookError::NotFound { index: requested });
            }
        }
        let documents = index.chapters()?;
        plan::plan_move(&self.layout, &documents, from, to)
    }

    /// Puts chapter `from` at slot `to`; chapters in between shift by one.
    pub fn move_chapter(&self, from: usize, to: usize) -> Result<()> {
        if from == to {
            return Ok(());
        }
        let plan = self.plan_chapter_move(from, to)?;
        tracing::info!(from, to, renames = plan.len(), "move chapter");
        self.apply(&format!("chapter-move {from} {to}"), &plan)
    }

    /// Moves chapter `index` to the tail, then removes its document and its
    /// image folder. Nested directories inside the folder are left alone and
    /// make the final removal fail.
    pub fn delete_chapter(&self, index: usize) -> Result<()> {
        let count = self.index().chapter_count()?;
        if index >= count {
            return Err(BookError::NotFound { index });
        }
        let last = count - 1;
        tracing::info!(index, last, "delete chapter");

        if index != last {
            self.move_chapter(index, last)?;
        }

        let document = self.index().chapter_file_path(last)?;
        tracing::debug!(path = %document.display(), "remove document");
        self.backend.remove_file(&document)?;

        let folder = self.layout.images_path(last);
        for file in self.index().images_files_of(last)? {
            let path = folder.join(&file.name);
            tracing::debug!(path = %path.display(), "remove image");
            self.backend.remove_file(&path)?;
        }
        self.backend.remove_directory(&folder)?;
        Ok(())
    }

    /// Gives chapter `index` a new title. The image folder is untouched.
    pub fn rename_chapter(&self, index: usize, new_title: &str) -> Result<PathBuf> {
        let old = self.index().chapter_file_path(index)?;
        let new = self.layout.chapter_path_for(index, new_title);
        tracing::info!(index, title = new_title, "rename chapter");
        if old != new {
            self.backend.rename(&old, &new)?;
        }
        Ok(new)
    }

    /// Document names without their extension, in index order.
    pub fn list_chapters(&self) -> Result<Vec<String>> {
        Ok(self
            .index()
            .chapters()?
            .iter()
            .map(|chapter| naming::strip_extension(&chapter.file_name).to_owned())
            .collect())
    }

    /// Finishes a plan that was interrupted after some of its steps ran.
    ///
    /// Returns the number of renames applied now.
    pub fn resume(&self) -> Result<usize> {
        let journal = self.journal.as_ref().ok_or(BookError::NoPendingPlan)?;
        let mut pending = journal.load()?.ok_or(BookError::NoPendingPlan)?;
        tracing::info!(
            operation = %pending.operation,
            completed = pending.completed,
            total = pending.steps.len(),
            "resume plan"
        );

        let mut applied = 0;
        for step in pending.remaining().to_vec() {
            let source = self.backend.exists(&step.from)?;
            let target = self.backend.exists(&step.to)?;
            match (source, target) {
                (true, false) => {
                    tracing::debug!(from = %step.from.display(), to = %step.to.display(), "rename");
                    self.backend.rename(&step.from, &step.to)?;
                    applied += 1;
                }
                (false, true) => {
                    tracing::debug!(to = %step.to.display(), "rename already applied");
                }
                _ => {
                    return Err(BookError::Inconsistent(format!(
                        "cannot resume rename {} -> {}",
                        step.from.display(),
                        step.to.display()
                    )));
                }
            }
            pending.completed += 1;
            journal.store(&pending)?;
        }
        journal.finish()?;
        Ok(applied)
    }

    fn apply(&self, operation: &str, plan: &RenamePlan) -> Result<()> {
        let Some(journal) = &self.journal else {
            for step in &plan.steps {
                tracing::debug!(from = %step.from.display(), to = %step.to.display(), "rename");
                self.backend.rename(&step.from, &step.to)?;
            }
            return Ok(());
        };

        let mut pending = journal.begin(operation, plan)?;
        for step in &plan.steps {
            tracing::debug!(from = %step.from.display(), to = %step.to.display(), "rename");
            self.backend.rename(&step.from, &step.to)?;
            pending.completed += 1;
            journal.store(&pending)?;
        }
        journal.finish()
    }
}
