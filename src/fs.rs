use std::cell::RefCell;
use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

/// File system operations the object types need. The interpreter runs
/// against the real file system; tests run against an in-memory one.
pub trait FileSystem {
    fn exists(&self, path: &Path) -> bool;
    fn is_file(&self, path: &Path) -> bool;
    fn is_dir(&self, path: &Path) -> bool;
    fn rename(&self, from: &Path, to: &Path) -> io::Result<()>;
    fn copy(&self, from: &Path, to: &Path) -> io::Result<()>;
    fn remove(&self, path: &Path) -> io::Result<()>;
    fn list_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>>;
}

pub struct OsFileSystem;

impl FileSystem for OsFileSystem {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        std::fs::rename(from, to)
    }

    fn copy(&self, from: &Path, to: &Path) -> io::Result<()> {
        std::fs::copy(from, to).map(|_| ())
    }

    fn remove(&self, path: &Path) -> io::Result<()> {
        if path.is_dir() {
            std::fs::remove_dir_all(path)
        } else {
            std::fs::remove_file(path)
        }
    }

    fn list_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        let mut entries = Vec::new();
        for entry in std::fs::read_dir(path)? {
            entries.push(entry?.path());
        }
        entries.sort();
        Ok(entries)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntryKind {
    File,
    Dir,
}

/// In-memory file system used by tests. Paths are stored normalized;
/// creating an entry creates its parent directories.
#[derive(Default)]
pub struct MemoryFileSystem {
    entries: RefCell<BTreeMap<PathBuf, EntryKind>>,
}

impl MemoryFileSystem {
    pub fn new() -> Self {
        let fs = Self {
            entries: RefCell::new(BTreeMap::new()),
        };
        fs.entries
            .borrow_mut()
            .insert(PathBuf::from("/"), EntryKind::Dir);
        fs
    }

    pub fn add_file(&self, path: impl AsRef<Path>) {
        let path = path.as_ref().to_path_buf();
        self.add_parents(&path);
        self.entries.borrow_mut().insert(path, EntryKind::File);
    }

    pub fn add_dir(&self, path: impl AsRef<Path>) {
        let path = path.as_ref().to_path_buf();
        self.add_parents(&path);
        self.entries.borrow_mut().insert(path, EntryKind::Dir);
    }

    fn add_parents(&self, path: &Path) {
        let mut entries = self.entries.borrow_mut();
        let mut current = path.parent();
        while let Some(dir) = current {
            entries.insert(dir.to_path_buf(), EntryKind::Dir);
            current = dir.parent();
        }
    }

    fn kind_of(&self, path: &Path) -> Option<EntryKind> {
        self.entries.borrow().get(path).copied()
    }

    fn missing(path: &Path) -> io::Error {
        io::Error::new(
            io::ErrorKind::NotFound,
            format!("no such entry: {}", path.display()),
        )
    }
}

impl FileSystem for MemoryFileSystem {
    fn exists(&self, path: &Path) -> bool {
        self.kind_of(path).is_some()
    }

    fn is_file(&self, path: &Path) -> bool {
        self.kind_of(path) == Some(EntryKind::File)
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.kind_of(path) == Some(EntryKind::Dir)
    }

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        let kind = self.kind_of(from).ok_or_else(|| Self::missing(from))?;
        let mut entries = self.entries.borrow_mut();
        entries.remove(from);
        if kind == EntryKind::Dir {
            // Move children along with the directory.
            let moved: Vec<(PathBuf, EntryKind)> = entries
                .iter()
                .filter(|(p, _)| p.starts_with(from))
                .map(|(p, k)| (p.clone(), *k))
                .collect();
            for (old, k) in moved {
                entries.remove(&old);
                if let Ok(rest) = old.strip_prefix(from) {
                    entries.insert(to.join(rest), k);
                }
            }
        }
        entries.insert(to.to_path_buf(), kind);
        drop(entries);
        self.add_parents(to);
        Ok(())
    }

    fn copy(&self, from: &Path, to: &Path) -> io::Result<()> {
        if self.kind_of(from) != Some(EntryKind::File) {
            return Err(Self::missing(from));
        }
        self.add_parents(to);
        self.entries
            .borrow_mut()
            .insert(to.to_path_buf(), EntryKind::File);
        Ok(())
    }

    fn remove(&self, path: &Path) -> io::Result<()> {
        let kind = self.kind_of(path).ok_or_else(|| Self::missing(path))?;
        let mut entries = self.entries.borrow_mut();
        if kind == EntryKind::Dir {
            entries.retain(|p, _| !p.starts_with(path));
        }
        entries.remove(path);
        Ok(())
    }

    fn list_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        if self.kind_of(path) != Some(EntryKind::Dir) {
            return Err(Self::missing(path));
        }
        let entries = self.entries.borrow();
        Ok(entries
            .keys()
            .filter(|p| p.parent() == Some(path) && p.as_path() != path)
            .cloned()
            .collect())
    }
}
