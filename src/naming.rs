//! Canonical names and paths for chapter documents and image folders.
//!
//! Nothing here touches the filesystem.

use std::path::{Path, PathBuf};

pub const DEFAULT_EXTENSION: &str = "md";
pub const SRC_FOLDER: &str = "src";
pub const IMAGES_FOLDER: &str = "images";
pub const BUILD_FOLDER: &str = "build";
pub const BUILD_STEM: &str = "build";
pub const JOURNAL_FILE: &str = ".wct-plan.json";

/// Suffix appended to an image folder name while it is parked during a move.
pub const IMAGES_SENTINEL_SUFFIX: &str = "x";

/// Renders an index with a minimum width of two digits.
#[must_use]
pub fn pad(index: usize) -> String {
    format!("{index:02}")
}

/// Replaces the leading index digits of `file_name` with `pad(new_index)`.
///
/// Everything after the digit run is kept byte for byte.
#[must_use]
pub fn change_index(file_name: &str, new_index: usize) -> String {
    let digits = leading_digits(file_name);
    format!("{}{}", pad(new_index), &file_name[digits..])
}

/// Drops the text after the last `.`, or returns the name unchanged if it has none.
#[must_use]
pub fn strip_extension(file_name: &str) -> &str {
    match file_name.rsplit_once('.') {
        Some((stem, _)) => stem,
        None => file_name,
    }
}

fn leading_digits(name: &str) -> usize {
    name.bytes().take_while(u8::is_ascii_digit).count()
}

/// Parses an image folder name (`"07"`) into its index.
#[must_use]
pub fn parse_folder_index(name: &str) -> Option<usize> {
    if name.len() < 2 || leading_digits(name) != name.len() {
        return None;
    }
    name.parse().ok()
}

/// A chapter document name decomposed as `<index>-<title>.<ext>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterName {
    pub index: usize,
    pub title: String,
    pub file_name: String,
}

impl ChapterName {
    /// Returns `None` unless `file_name` is at least two index digits, a dash,
    /// a title, and exactly `.<extension>`.
    #[must_use]
    pub fn parse(file_name: &str, extension: &str) -> Option<Self> {
        let stem = file_name
            .strip_suffix(extension)
            .and_then(|rest| rest.strip_suffix('.'))?;
        let digits = leading_digits(stem);
        if digits < 2 {
            return None;
        }
        let title = stem[digits..].strip_prefix('-')?;
        let index = stem[..digits].parse().ok()?;
        Some(Self {
            index,
            title: title.to_owned(),
            file_name: file_name.to_owned(),
        })
    }

    /// The document name this chapter would carry at `new_index`.
    #[must_use]
    pub fn renumbered(&self, new_index: usize) -> String {
        change_index(&self.file_name, new_index)
    }
}

/// Where a book lives on disk and which document extension it uses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    root: PathBuf,
    extension: String,
}

impl Layout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_extension(root, DEFAULT_EXTENSION)
    }

    pub fn with_extension(root: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            extension: extension.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    pub fn src_dir(&self) -> PathBuf {
        self.root.join(SRC_FOLDER)
    }

    pub fn images_dir(&self) -> PathBuf {
        self.src_dir().join(IMAGES_FOLDER)
    }

    pub fn build_dir(&self) -> PathBuf {
        self.root.join(BUILD_FOLDER)
    }

    pub fn build_file(&self) -> PathBuf {
        self.build_dir()
            .join(format!("{BUILD_STEM}.{}", self.extension))
    }

    pub fn journal_path(&self) -> PathBuf {
        self.root.join(JOURNAL_FILE)
    }

    pub fn chapter_file_name(&self, index: usize, title: &str) -> String {
        format!("{}-{title}.{}", pad(index), self.extension)
    }

    pub fn chapter_path(&self, file_name: &str) -> PathBuf {
        self.src_dir().join(file_name)
    }

    pub fn chapter_path_for(&self, index: usize, title: &str) -> PathBuf {
        self.chapter_path(&self.chapter_file_name(index, title))
    }

    pub fn images_path(&self, index: usize) -> PathBuf {
        self.images_dir().join(pad(index))
    }

    pub fn images_sentinel_path(&self, index: usize) -> PathBuf {
        self.images_dir()
            .join(format!("{}{IMAGES_SENTINEL_SUFFIX}", pad(index)))
    }

    pub fn is_chapter_document(&self, file_name: &str) -> bool {
        file_name
            .rsplit_once('.')
            .is_some_and(|(_, ext)| ext == self.extension)
    }
}
