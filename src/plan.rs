//! Rename plans for moving a chapter, and the journal that makes them resumable.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{BookError, Result};
use crate::index::find_chapter;
use crate::naming::{ChapterName, Layout};

/// Suffix for a document parked while its final name is still taken.
pub const DOCUMENT_STAGING_SUFFIX: &str = "renumber";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenameStep {
    pub from: PathBuf,
    pub to: PathBuf,
}

impl RenameStep {
    pub fn new(from: impl Into<PathBuf>, to: impl Into<PathBuf>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenamePlan {
    pub steps: Vec<RenameStep>,
}

impl RenamePlan {
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }
}

/// Computes the renames that move chapter `from` to slot `to`.
///
/// Chapters strictly between the two shift one slot toward `from`. `documents`
/// is the document snapshot taken before any rename.
pub fn plan_move(
    layout: &Layout,
    documents: &[ChapterName],
    from: usize,
    to: usize,
) -> Result<RenamePlan> {
    if from == to {
        return Ok(RenamePlan::default());
    }
    let start = from.min(to);
    let end = from.max(to);
    let shift = |i: usize| {
        if i == from {
            to
        } else if from < to {
            i - 1
        } else {
            i + 1
        }
    };

    let mut steps = Vec::new();

    let mut taken: HashSet<String> = documents
        .iter()
        .map(|chapter| chapter.file_name.clone())
        .collect();
    let mut parked = Vec::new();
    for i in start..=end {
        let chapter = find_chapter(documents, i)?;
        let target = chapter.renumbered(shift(i));
        taken.remove(&chapter.file_name);
        if taken.contains(&target) {
            let staging = format!("{}.{DOCUMENT_STAGING_SUFFIX}", chapter.file_name);
            steps.push(RenameStep::new(
                layout.chapter_path(&chapter.file_name),
                layout.chapter_path(&staging),
            ));
            parked.push((staging, target));
        } else {
            steps.push(RenameStep::new(
                layout.chapter_path(&chapter.file_name),
                layout.chapter_path(&target),
            ));
            taken.insert(target);
        }
    }
    for (staging, target) in parked {
        steps.push(RenameStep::new(
            layout.chapter_path(&staging),
            layout.chapter_path(&target),
        ));
    }

    let sentinel = layout.images_sentinel_path(from);
    steps.push(RenameStep::new(layout.images_path(from), sentinel.clone()));
    let others: Box<dyn Iterator<Item = usize>> = if from < to {
        Box::new(start..=end)
    } else {
        Box::new((start..=end).rev())
    };
    for i in others.filter(|&i| i != from) {
        steps.push(RenameStep::new(
            layout.images_path(i),
            layout.images_path(shift(i)),
        ));
    }
    steps.push(RenameStep::new(sentinel, layout.images_path(to)));

    Ok(RenamePlan { steps })
}

/// A plan persisted before its first rename.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingPlan {
    pub operation: String,
    pub created_at: DateTime<Utc>,
    pub steps: Vec<RenameStep>,
    pub completed: usize,
}

impl PendingPlan {
    pub fn remaining(&self) -> &[RenameStep] {
        self.steps.get(self.completed..).unwrap_or_default()
    }
}

/// JSON file recording the plan in flight and how far it got.
#[derive(Debug, Clone)]
pub struct PlanJournal {
    path: PathBuf,
}

impl PlanJournal {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn load(&self) -> Result<Option<PendingPlan>> {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(BookError::io("read journal", &self.path, err)),
        };
        let pending = serde_json::from_slice(&bytes)
            .map_err(|err| BookError::Journal(format!("parse {}: {err}", self.path.display())))?;
        Ok(Some(pending))
    }

    /// Fails with [`BookError::PendingPlan`] if a previous plan never finished.
    pub fn ensure_idle(&self) -> Result<()> {
        if self.path.exists() {
            return Err(BookError::PendingPlan {
                path: self.path.clone(),
            });
        }
        Ok(())
    }

    pub fn begin(&self, operation: &str, plan: &RenamePlan) -> Result<PendingPlan> {
        self.ensure_idle()?;
        let pending = PendingPlan {
            operation: operation.to_owned(),
            created_at: Utc::now(),
            steps: plan.steps.clone(),
            completed: 0,
        };
        self.store(&pending)?;
        Ok(pending)
    }

    pub fn store(&self, pending: &PendingPlan) -> Result<()> {
        write_json_atomic(&self.path, pending)
    }

    pub fn finish(&self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(BookError::io("remove journal", &self.path, err)),
        }
    }
}

fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let tmp_path = path.with_extension(format!("tmp.{}", uuid::Uuid::new_v4().simple()));
    let data = serde_json::to_vec_pretty(value)
        .map_err(|err| BookError::Journal(format!("serialize: {err}")))?;
    std::fs::write(&tmp_path, &data).map_err(|err| BookError::io("write journal", &tmp_path, err))?;
    std::fs::rename(&tmp_path, path).map_err(|err| BookError::io("rename journal", path, err))?;
    Ok(())
}
