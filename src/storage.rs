//! Directory and file primitives the renumbering engine is written against.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fs::OpenOptions;
use std::io::{ErrorKind, Write as _};
use std::path::{Path, PathBuf};

use crate::error::{BookError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    pub is_file: bool,
    pub is_dir: bool,
}

pub trait StorageBackend {
    fn read_directory(&self, path: &Path) -> Result<Vec<DirEntry>>;
    fn exists(&self, path: &Path) -> Result<bool>;
    /// Fails if `path` already exists or its parent is missing.
    fn create_file(&self, path: &Path, content: &str) -> Result<()>;
    fn create_directory(&self, path: &Path) -> Result<()>;
    /// Fails if `to` already exists.
    fn rename(&self, from: &Path, to: &Path) -> Result<()>;
    fn remove_file(&self, path: &Path) -> Result<()>;
    /// Fails with [`BookError::NonEmptyDirectory`] if anything is left inside.
    fn remove_directory(&self, path: &Path) -> Result<()>;
}

/// The real filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFs;

fn map_io(op: &'static str, path: &Path, err: std::io::Error) -> BookError {
    match err.kind() {
        ErrorKind::AlreadyExists => BookError::AlreadyExists {
            path: path.to_path_buf(),
        },
        ErrorKind::DirectoryNotEmpty => BookError::NonEmptyDirectory {
            path: path.to_path_buf(),
        },
        _ => BookError::io(op, path, err),
    }
}

impl StorageBackend for LocalFs {
    fn read_directory(&self, path: &Path) -> Result<Vec<DirEntry>> {
        let mut entries = Vec::new();
        for entry in std::fs::read_dir(path).map_err(|err| map_io("read dir", path, err))? {
            let entry = entry.map_err(|err| map_io("read dir entry", path, err))?;
            let file_type = entry
                .file_type()
                .map_err(|err| map_io("read file type", &entry.path(), err))?;
            entries.push(DirEntry {
                name: entry.file_name().to_string_lossy().into_owned(),
                is_file: file_type.is_file(),
                is_dir: file_type.is_dir(),
            });
        }
        Ok(entries)
    }

    fn exists(&self, path: &Path) -> Result<bool> {
        match std::fs::symlink_metadata(path) {
            Ok(_) => Ok(true),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(false),
            Err(err) => Err(map_io("stat", path, err)),
        }
    }

    fn create_file(&self, path: &Path, content: &str) -> Result<()> {
        let mut file = OpenOptions::new()
            .create_new(true)
            .write(true)
            .open(path)
            .map_err(|err| map_io("create file", path, err))?;
        file.write_all(content.as_bytes())
            .map_err(|err| map_io("write file", path, err))?;
        file.flush().map_err(|err| map_io("flush file", path, err))?;
        Ok(())
    }

    fn create_directory(&self, path: &Path) -> Result<()> {
        std::fs::create_dir(path).map_err(|err| map_io("create dir", path, err))
    }

    fn rename(&self, from: &Path, to: &Path) -> Result<()> {
        // std::fs::rename replaces files and empty directories on unix.
        if self.exists(to)? {
            return Err(BookError::AlreadyExists {
                path: to.to_path_buf(),
            });
        }
        std::fs::rename(from, to).map_err(|err| map_io("rename", from, err))
    }

    fn remove_file(&self, path: &Path) -> Result<()> {
        std::fs::remove_file(path).map_err(|err| map_io("remove file", path, err))
    }

    fn remove_directory(&self, path: &Path) -> Result<()> {
        std::fs::remove_dir(path).map_err(|err| map_io("remove dir", path, err))
    }
}

/// One call made against a [`MemoryBackend`], in the order it was issued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageCall {
    ReadDirectory(PathBuf),
    Exists(PathBuf),
    CreateFile(PathBuf, String),
    CreateDirectory(PathBuf),
    Rename(PathBuf, PathBuf),
    RemoveFile(PathBuf),
    RemoveDirectory(PathBuf),
}

impl StorageCall {
    pub fn is_mutation(&self) -> bool {
        !matches!(self, Self::ReadDirectory(_) | Self::Exists(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Node {
    File(String),
    Dir,
}

/// In-memory tree that records every call. Paths are compared verbatim, so
/// callers should stick to one spelling of the root (e.g. `.`).
#[derive(Debug, Default)]
pub struct MemoryBackend {
    nodes: RefCell<BTreeMap<PathBuf, Node>>,
    calls: RefCell<Vec<StorageCall>>,
}

impl MemoryBackend {
    /// A tree holding only the root directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let backend = Self::default();
        backend.nodes.borrow_mut().insert(root.into(), Node::Dir);
        backend
    }

    /// Inserts a directory (and any missing ancestors) without recording a call.
    pub fn seed_dir(&self, path: impl AsRef<Path>) {
        let mut nodes = self.nodes.borrow_mut();
        for ancestor in path.as_ref().ancestors() {
            if ancestor.as_os_str().is_empty() {
                break;
            }
            nodes.entry(ancestor.to_path_buf()).or_insert(Node::Dir);
        }
    }

    /// Inserts a file (and any missing ancestors) without recording a call.
    pub fn seed_file(&self, path: impl AsRef<Path>, content: &str) {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            self.seed_dir(parent);
        }
        self.nodes
            .borrow_mut()
            .insert(path.to_path_buf(), Node::File(content.to_owned()));
    }

    pub fn calls(&self) -> Vec<StorageCall> {
        self.calls.borrow().clone()
    }

    pub fn mutations(&self) -> Vec<StorageCall> {
        self.calls
            .borrow()
            .iter()
            .filter(|call| call.is_mutation())
            .cloned()
            .collect()
    }

    pub fn read_file(&self, path: impl AsRef<Path>) -> Option<String> {
        match self.nodes.borrow().get(path.as_ref()) {
            Some(Node::File(content)) => Some(content.clone()),
            _ => None,
        }
    }

    pub fn is_dir(&self, path: impl AsRef<Path>) -> bool {
        matches!(self.nodes.borrow().get(path.as_ref()), Some(Node::Dir))
    }

    fn record(&self, call: StorageCall) {
        self.calls.borrow_mut().push(call);
    }

    fn missing(op: &'static str, path: &Path) -> BookError {
        BookError::io(op, path, std::io::Error::from(ErrorKind::NotFound))
    }

    fn require_parent_dir(&self, op: &'static str, path: &Path) -> Result<()> {
        let parent = path.parent().unwrap_or(Path::new(""));
        if !self.is_dir(parent) {
            return Err(Self::missing(op, parent));
        }
        Ok(())
    }

    fn children_of(nodes: &BTreeMap<PathBuf, Node>, dir: &Path) -> Vec<PathBuf> {
        nodes
            .keys()
            .filter(|path| path.parent() == Some(dir))
            .cloned()
            .collect()
    }
}

impl StorageBackend for MemoryBackend {
    fn read_directory(&self, path: &Path) -> Result<Vec<DirEntry>> {
        self.record(StorageCall::ReadDirectory(path.to_path_buf()));
        let nodes = self.nodes.borrow();
        if nodes.get(path) != Some(&Node::Dir) {
            return Err(Self::missing("read dir", path));
        }
        let entries = Self::children_of(&nodes, path)
            .into_iter()
            .map(|child| {
                let node = &nodes[&child];
                DirEntry {
                    name: child
                        .file_name()
                        .map(|name| name.to_string_lossy().into_owned())
                        .unwrap_or_default(),
                    is_file: matches!(node, Node::File(_)),
                    is_dir: matches!(node, Node::Dir),
                }
            })
            .collect();
        Ok(entries)
    }

    fn exists(&self, path: &Path) -> Result<bool> {
        self.record(StorageCall::Exists(path.to_path_buf()));
        Ok(self.nodes.borrow().contains_key(path))
    }

    fn create_file(&self, path: &Path, content: &str) -> Result<()> {
        self.record(StorageCall::CreateFile(
            path.to_path_buf(),
            content.to_owned(),
        ));
        self.require_parent_dir("create file", path)?;
        let mut nodes = self.nodes.borrow_mut();
        if nodes.contains_key(path) {
            return Err(BookError::AlreadyExists {
                path: path.to_path_buf(),
            });
        }
        nodes.insert(path.to_path_buf(), Node::File(content.to_owned()));
        Ok(())
    }

    fn create_directory(&self, path: &Path) -> Result<()> {
        self.record(StorageCall::CreateDirectory(path.to_path_buf()));
        self.require_parent_dir("create dir", path)?;
        let mut nodes = self.nodes.borrow_mut();
        if nodes.contains_key(path) {
            return Err(BookError::AlreadyExists {
                path: path.to_path_buf(),
            });
        }
        nodes.insert(path.to_path_buf(), Node::Dir);
        Ok(())
    }

    fn rename(&self, from: &Path, to: &Path) -> Result<()> {
        self.record(StorageCall::Rename(from.to_path_buf(), to.to_path_buf()));
        self.require_parent_dir("rename", to)?;
        let mut nodes = self.nodes.borrow_mut();
        if !nodes.contains_key(from) {
            return Err(Self::missing("rename", from));
        }
        if nodes.contains_key(to) {
            return Err(BookError::AlreadyExists {
                path: to.to_path_buf(),
            });
        }
        let moved: Vec<PathBuf> = nodes
            .keys()
            .filter(|path| path.starts_with(from))
            .cloned()
            .collect();
        for old in moved {
            let Some(node) = nodes.remove(&old) else {
                continue;
            };
            let suffix = old.strip_prefix(from).unwrap_or(Path::new(""));
            let new = if suffix.as_os_str().is_empty() {
                to.to_path_buf()
            } else {
                to.join(suffix)
            };
            nodes.insert(new, node);
        }
        Ok(())
    }

    fn remove_file(&self, path: &Path) -> Result<()> {
        self.record(StorageCall::RemoveFile(path.to_path_buf()));
        let mut nodes = self.nodes.borrow_mut();
        match nodes.remove(path) {
            Some(Node::File(_)) => Ok(()),
            Some(Node::Dir) => {
                nodes.insert(path.to_path_buf(), Node::Dir);
                Err(BookError::io(
                    "remove file",
                    path,
                    std::io::Error::from(ErrorKind::IsADirectory),
                ))
            }
            None => Err(Self::missing("remove file", path)),
        }
    }

    fn remove_directory(&self, path: &Path) -> Result<()> {
        self.record(StorageCall::RemoveDirectory(path.to_path_buf()));
        let mut nodes = self.nodes.borrow_mut();
        if nodes.get(path) != Some(&Node::Dir) {
            return Err(Self::missing("remove dir", path));
        }
        if !Self::children_of(&nodes, path).is_empty() {
            return Err(BookError::NonEmptyDirectory {
                path: path.to_path_buf(),
            });
        }
        nodes.remove(path);
        Ok(())
    }
}
