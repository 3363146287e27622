//! Generation and slot tables: which files make up a container on disk.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Highest generation id; patches override every numbered generation.
pub const PATCH_GENERATION: u16 = 6;

/// Slot id of the resource file shared between all containers. Entries select it
/// by setting the top bit of their second flag word (`0x8000 >> 2`).
pub const SHARED_SLOT: u16 = 0x8000 >> 2;

pub const SHARED_RESOURCE_NAME: &str = "shared_2_3.sharedrsc";

pub(crate) const INDEX_EXTENSION: &str = "index";
pub(crate) const RESOURCES_EXTENSION: &str = "resources";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableFile {
    pub path: PathBuf,
    /// `None` if the file did not exist when the table was last stat'ed.
    pub size: Option<u64>,
}

impl TableFile {
    fn new(path: PathBuf) -> TableFile {
        TableFile { path, size: None }
    }

    #[inline(always)]
    pub fn exists(&self) -> bool {
        self.size.is_some()
    }
}

/// Maps a small integer id to a file and its size.
#[derive(Debug, Clone, Default)]
pub struct FileTable {
    files: BTreeMap<u16, TableFile>,
}

fn file_name_for(name: &str, id: u16, extension: &str) -> String {
    match id {
        0 => format!("{}.{}", name, extension),
        PATCH_GENERATION => format!("{}_patch.{}", name, extension),
        n => format!("{}_{:03}.{}", name, n, extension),
    }
}

impl FileTable {
    /// The index generations of container `name`: base, `_001` to `_005`, then `_patch`.
    pub fn generations(dir: &Path, name: &str) -> FileTable {
        Self::numbered(dir, name, INDEX_EXTENSION)
    }

    /// The resource slots of container `name`, plus the shared resource file.
    pub fn slots(dir: &Path, name: &str) -> FileTable {
        let mut table = Self::numbered(dir, name, RESOURCES_EXTENSION);
        table.insert(SHARED_SLOT, dir.join(SHARED_RESOURCE_NAME));
        table
    }

    fn numbered(dir: &Path, name: &str, extension: &str) -> FileTable {
        let files = (0..=PATCH_GENERATION)
            .map(|id| {
                let path = dir.join(file_name_for(name, id, extension));
                (id, TableFile::new(path))
            })
            .collect();
        FileTable { files }
    }

    /// Adds or replaces the file for `id`. The new file is not stat'ed until [`FileTable::stat`].
    pub fn insert<P: Into<PathBuf>>(&mut self, id: u16, path: P) {
        self.files.insert(id, TableFile::new(path.into()));
    }

    /// Records the current size of every file. Missing files are kept with no size.
    pub fn stat(&mut self) -> std::io::Result<()> {
        for file in self.files.values_mut() {
            file.size = match std::fs::metadata(&file.path) {
                Ok(meta) if meta.is_file() => Some(meta.len()),
                Ok(_) => None,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
                Err(e) => return Err(e),
            };
        }
        Ok(())
    }

    #[inline(always)]
    pub fn get(&self, id: u16) -> Option<&TableFile> {
        self.files.get(&id)
    }

    #[inline(always)]
    pub fn path(&self, id: u16) -> Option<&Path> {
        self.get(id).map(|f| f.path.as_path())
    }

    /// The highest id whose file exists.
    pub fn latest(&self) -> Option<u16> {
        self.files
            .iter()
            .rev()
            .find(|(_, f)| f.exists())
            .map(|(id, _)| *id)
    }

    /// Finds the id of the file with the same file name as `path`.
    pub fn find<P: AsRef<Path>>(&self, path: P) -> Option<u16> {
        let file_name = path.as_ref().file_name()?;
        self.files
            .iter()
            .find(|(_, f)| f.path.file_name() == Some(file_name))
            .map(|(id, _)| *id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (u16, &TableFile)> {
        self.files.iter().map(|(id, f)| (*id, f))
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generation_names() {
        let table = FileTable::generations(Path::new("base"), "game1");
        let names = table
            .iter()
            .map(|(_, f)| f.path.file_name().unwrap().to_str().unwrap().to_string())
            .collect::<Vec<_>>();
        assert_eq!(
            names,
            vec![
                "game1.index",
                "game1_001.index",
                "game1_002.index",
                "game1_003.index",
                "game1_004.index",
                "game1_005.index",
                "game1_patch.index",
            ]
        );
    }

    #[test]
    fn shared_slot() {
        let table = FileTable::slots(Path::new("base"), "game2");
        assert_eq!(SHARED_SLOT, 8192);
        assert_eq!(
            table.path(SHARED_SLOT),
            Some(Path::new("base").join("shared_2_3.sharedrsc").as_path())
        );
        assert_eq!(table.find("game2_patch.resources"), Some(PATCH_GENERATION));
        assert_eq!(table.find("game3.resources"), None);
    }

    #[test]
    fn latest_existing() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("game1.index"), b"a").unwrap();
        std::fs::write(dir.path().join("game1_003.index"), b"abc").unwrap();

        let mut table = FileTable::generations(dir.path(), "game1");
        assert_eq!(table.latest(), None);
        table.stat().unwrap();
        assert_eq!(table.latest(), Some(3));
        assert_eq!(table.get(3).unwrap().size, Some(3));
        assert_eq!(table.get(1).unwrap().size, None);
    }
}
