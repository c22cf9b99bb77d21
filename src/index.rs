//! Read-only queries over a book's documents and image folders.

use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::error::{BookError, Result};
use crate::naming::{self, ChapterName, Layout};
use crate::storage::{DirEntry, StorageBackend};

pub struct ChapterIndex<'a, B: StorageBackend> {
    backend: &'a B,
    layout: &'a Layout,
}

impl<'a, B: StorageBackend> ChapterIndex<'a, B> {
    pub fn new(backend: &'a B, layout: &'a Layout) -> Self {
        Self { backend, layout }
    }

    /// Creates `src/` and then `src/images/` when they are missing.
    pub fn ensure_layout(&self) -> Result<()> {
        let root = self.layout.root();
        let has_src = self
            .backend
            .read_directory(root)?
            .iter()
            .any(|entry| entry.is_dir && entry.name == naming::SRC_FOLDER);
        if !has_src {
            tracing::info!(path = %self.layout.src_dir().display(), "create documents dir");
            self.backend.create_directory(&self.layout.src_dir())?;
        }

        let has_images = self
            .backend
            .read_directory(&self.layout.src_dir())?
            .iter()
            .any(|entry| entry.is_dir && entry.name == naming::IMAGES_FOLDER);
        if !has_images {
            tracing::info!(path = %self.layout.images_dir().display(), "create images dir");
            self.backend.create_directory(&self.layout.images_dir())?;
        }
        Ok(())
    }

    /// Regular files in `src/` carrying the document extension, in backend order.
    pub fn list_chapter_files(&self) -> Result<Vec<DirEntry>> {
        let entries = self.backend.read_directory(&self.layout.src_dir())?;
        Ok(entries
            .into_iter()
            .filter(|entry| entry.is_file && self.layout.is_chapter_document(&entry.name))
            .collect())
    }

    /// Chapter documents parsed and sorted by index.
    ///
    /// Any document that does not follow `<index>-<title>.<ext>` is an error.
    pub fn chapters(&self) -> Result<Vec<ChapterName>> {
        let mut chapters = self
            .list_chapter_files()?
            .into_iter()
            .map(|entry| {
                ChapterName::parse(&entry.name, self.layout.extension())
                    .ok_or(BookError::MalformedName { name: entry.name })
            })
            .collect::<Result<Vec<_>>>()?;
        chapters.sort_by(|a, b| {
            a.index
                .cmp(&b.index)
                .then_with(|| a.file_name.cmp(&b.file_name))
        });
        Ok(chapters)
    }

    /// Document paths in reading order.
    pub fn chapter_paths(&self) -> Result<Vec<PathBuf>> {
        Ok(self
            .chapters()?
            .iter()
            .map(|chapter| self.layout.chapter_path(&chapter.file_name))
            .collect())
    }

    pub fn image_folders(&self) -> Result<Vec<DirEntry>> {
        match self.backend.read_directory(&self.layout.images_dir()) {
            Ok(entries) => Ok(entries.into_iter().filter(|entry| entry.is_dir).collect()),
            Err(err) if err.is_missing_path() => Ok(Vec::new()),
            Err(err) => Err(err),
        }
    }

    /// The number of image folders; the folder tree is authoritative.
    pub fn chapter_count(&self) -> Result<usize> {
        Ok(self.image_folders()?.len())
    }

    /// The path of the single document whose prefix is `index`.
    pub fn chapter_file_path(&self, index: usize) -> Result<PathBuf> {
        let chapters = self.chapters()?;
        let chapter = find_chapter(&chapters, index)?;
        Ok(self.layout.chapter_path(&chapter.file_name))
    }

    /// Regular files inside the image folder of `index`.
    pub fn images_files_of(&self, index: usize) -> Result<Vec<DirEntry>> {
        let entries = self
            .backend
            .read_directory(&self.layout.images_path(index))?;
        Ok(entries.into_iter().filter(|entry| entry.is_file).collect())
    }

    /// Checks that documents and image folders both cover exactly `[0, N)`.
    ///
    /// Returns `N`.
    pub fn verify(&self) -> Result<usize> {
        let mut folder_indices = Vec::new();
        for folder in self.image_folders()? {
            let index = naming::parse_folder_index(&folder.name)
                .ok_or(BookError::MalformedName { name: folder.name })?;
            folder_indices.push(index);
        }
        folder_indices.sort_unstable();
        let count = folder_indices.len();
        if let Some((position, index)) = folder_indices
            .iter()
            .enumerate()
            .find(|(position, index)| position != *index)
        {
            return Err(BookError::Inconsistent(format!(
                "image folder {} found where {} was expected",
                naming::pad(*index),
                naming::pad(position)
            )));
        }

        let chapters = self.chapters()?;
        let by_index = group_by_index(&chapters);
        for (index, names) in &by_index {
            if names.len() > 1 {
                return Err(BookError::AmbiguousIndex {
                    index: *index,
                    names: names.iter().map(|name| name.to_string()).collect(),
                });
            }
            if *index >= count {
                return Err(BookError::Inconsistent(format!(
                    "document {} has no image folder ({count} folders)",
                    names[0]
                )));
            }
        }
        if let Some(missing) = (0..count).find(|index| !by_index.contains_key(index)) {
            return Err(BookError::Inconsistent(format!(
                "image folder {} has no document",
                naming::pad(missing)
            )));
        }

        Ok(count)
    }
}

fn group_by_index(chapters: &[ChapterName]) -> BTreeMap<usize, Vec<&str>> {
    let mut by_index: BTreeMap<usize, Vec<&str>> = BTreeMap::new();
    for chapter in chapters {
        by_index
            .entry(chapter.index)
            .or_default()
            .push(chapter.file_name.as_str());
    }
    by_index
}

/// Picks the one chapter at `index` out of a sorted snapshot.
pub fn find_chapter(chapters: &[ChapterName], index: usize) -> Result<&ChapterName> {
    let mut matches = chapters.iter().filter(|chapter| chapter.index == index);
    let Some(first) = matches.next() else {
        return Err(BookError::NotFound { index });
    };
    let rest: Vec<&ChapterName> = matches.collect();
    if !rest.is_empty() {
        let names = std::iter::once(first)
            .chain(rest)
            .map(|chapter| chapter.file_name.clone())
            .collect();
        return Err(BookError::AmbiguousIndex { index, names });
    }
    Ok(first)
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;
    use crate::storage::{MemoryBackend, StorageCall};

    fn book(titles: &[&str]) -> (MemoryBackend, Layout) {
        let layout = Layout::new(".");
        let backend = MemoryBackend::new(".");
        backend.seed_dir(layout.images_dir());
        for (index, title) in titles.iter().enumerate() {
            backend.seed_file(layout.chapter_path_for(index, title), &format!("## {title}"));
            backend.seed_dir(layout.images_path(index));
        }
        (backend, layout)
    }

    #[test]
    fn ensure_layout_is_a_no_op_on_a_ready_book() -> anyhow::Result<()> {
        let (backend, layout) = book(&[]);
        ChapterIndex::new(&backend, &layout).ensure_layout()?;

        assert_eq!(
            backend.calls(),
            vec![
                StorageCall::ReadDirectory(PathBuf::from(".")),
                StorageCall::ReadDirectory(PathBuf::from("./src")),
            ]
        );
        Ok(())
    }

    #[test]
    fn ensure_layout_creates_src_then_images() -> anyhow::Result<()> {
        let layout = Layout::new(".");
        let backend = MemoryBackend::new(".");
        ChapterIndex::new(&backend, &layout).ensure_layout()?;

        assert_eq!(
            backend.mutations(),
            vec![
                StorageCall::CreateDirectory(PathBuf::from("./src")),
                StorageCall::CreateDirectory(PathBuf::from("./src/images")),
            ]
        );
        Ok(())
    }

    #[test]
    fn ensure_layout_creates_only_missing_images() -> anyhow::Result<()> {
        let layout = Layout::new(".");
        let backend = MemoryBackend::new(".");
        backend.seed_dir("./src");
        ChapterIndex::new(&backend, &layout).ensure_layout()?;

        assert_eq!(
            backend.mutations(),
            vec![StorageCall::CreateDirectory(PathBuf::from("./src/images"))]
        );
        Ok(())
    }

    #[test]
    fn chapter_files_skip_folders_and_other_extensions() -> anyhow::Result<()> {
        let (backend, layout) = book(&["Intro"]);
        backend.seed_file("./src/notes.txt", "");
        backend.seed_dir("./src/drafts.md");

        let files = ChapterIndex::new(&backend, &layout).list_chapter_files()?;
        let names: Vec<&str> = files.iter().map(|entry| entry.name.as_str()).collect();
        assert_eq!(names, vec!["00-Intro.md"]);
        Ok(())
    }

    #[test]
    fn chapters_sort_numerically_past_two_digits() -> anyhow::Result<()> {
        let layout = Layout::new(".");
        let backend = MemoryBackend::new(".");
        backend.seed_file("./src/100-Hundred.md", "");
        backend.seed_file("./src/99-NinetyNine.md", "");
        backend.seed_file("./src/05-Five.md", "");

        let chapters = ChapterIndex::new(&backend, &layout).chapters()?;
        let indices: Vec<usize> = chapters.iter().map(|chapter| chapter.index).collect();
        assert_eq!(indices, vec![5, 99, 100]);
        Ok(())
    }

    #[test]
    fn chapters_reject_unparseable_documents() {
        let (backend, layout) = book(&["Intro"]);
        backend.seed_file("./src/dummy.md", "");

        let err = ChapterIndex::new(&backend, &layout)
            .chapters()
            .expect_err("dummy.md has no index");
        assert!(matches!(err, BookError::MalformedName { name } if name == "dummy.md"));
    }

    #[test]
    fn chapter_count_is_zero_without_images_dir() -> anyhow::Result<()> {
        let layout = Layout::new(".");
        let backend = MemoryBackend::new(".");
        assert_eq!(ChapterIndex::new(&backend, &layout).chapter_count()?, 0);
        Ok(())
    }

    #[test]
    fn chapter_count_follows_image_folders() -> anyhow::Result<()> {
        let (backend, layout) = book(&["A", "B", "C"]);
        backend.seed_file("./src/images/stray.png", "");
        assert_eq!(ChapterIndex::new(&backend, &layout).chapter_count()?, 3);
        Ok(())
    }

    #[test]
    fn chapter_file_path_matches_prefix() -> anyhow::Result<()> {
        let (backend, layout) = book(&["Zero", "dummy"]);
        let index = ChapterIndex::new(&backend, &layout);

        assert_eq!(
            index.chapter_file_path(1)?,
            PathBuf::from("./src/01-dummy.md")
        );
        assert!(matches!(
            index.chapter_file_path(2),
            Err(BookError::NotFound { index: 2 })
        ));
        Ok(())
    }

    #[test]
    fn chapter_file_path_flags_duplicate_prefixes() {
        let (backend, layout) = book(&["Zero", "One"]);
        backend.seed_file("./src/01-Other.md", "");

        let err = ChapterIndex::new(&backend, &layout)
            .chapter_file_path(1)
            .expect_err("two documents claim 01");
        assert!(matches!(err, BookError::AmbiguousIndex { index: 1, ref names } if names.len() == 2));
    }

    #[test]
    fn images_files_skip_nested_folders() -> anyhow::Result<()> {
        let (backend, layout) = book(&["A", "B"]);
        backend.seed_file("./src/images/01/a.png", "");
        backend.seed_file("./src/images/01/b.png", "");
        backend.seed_dir("./src/images/01/raw");

        let files = ChapterIndex::new(&backend, &layout).images_files_of(1)?;
        assert_eq!(files.len(), 2);
        assert!(backend.calls().contains(&StorageCall::ReadDirectory(
            Path::new("./src/images/01").to_path_buf()
        )));
        Ok(())
    }

    #[test]
    fn verify_accepts_a_dense_book() -> anyhow::Result<()> {
        let (backend, layout) = book(&["A", "B", "C"]);
        assert_eq!(ChapterIndex::new(&backend, &layout).verify()?, 3);
        Ok(())
    }

    #[test]
    fn verify_reports_folder_without_document() {
        let (backend, layout) = book(&["A", "B"]);
        backend.seed_dir(layout.images_path(2));

        let err = ChapterIndex::new(&backend, &layout)
            .verify()
            .expect_err("folder 02 has no document");
        assert!(matches!(err, BookError::Inconsistent(msg) if msg.contains("02")));
    }

    #[test]
    fn verify_reports_gaps_in_folders() {
        let (backend, layout) = book(&["A"]);
        backend.seed_dir(layout.images_path(2));
        backend.seed_file(layout.chapter_path_for(1, "B"), "");

        let err = ChapterIndex::new(&backend, &layout)
            .verify()
            .expect_err("folder 01 is missing");
        assert!(matches!(err, BookError::Inconsistent(_)));
    }

    #[test]
    fn verify_reports_leftover_sentinel_folder() {
        let (backend, layout) = book(&["A", "B"]);
        backend.seed_dir(layout.images_sentinel_path(1));

        let err = ChapterIndex::new(&backend, &layout)
            .verify()
            .expect_err("01x is not an index");
        assert!(matches!(err, BookError::MalformedName { name } if name == "01x"));
    }

    #[test]
    fn verify_reports_duplicate_documents() {
        let (backend, layout) = book(&["A", "B"]);
        backend.seed_file("./src/00-Again.md", "");

        let err = ChapterIndex::new(&backend, &layout)
            .verify()
            .expect_err("00 is claimed twice");
        assert!(matches!(err, BookError::AmbiguousIndex { index: 0, .. }));
    }
}
