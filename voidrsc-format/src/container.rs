use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::io::{BufReader, Read, Seek, SeekFrom, Write};
use std::path::{Component, Path, PathBuf};

use crate::compression::{deflate, inflate};
use crate::entities::{self, Entities};
use crate::entry::ResourceEntry;
use crate::error::{ExportError, LoadEntitiesError, OpenError, ReadError, WriteError};
use crate::header::IndexHeader;
use crate::layout::{FileTable, SHARED_SLOT};
use crate::table::read_entry_table;

/// Where to find a container and which of its files to use.
#[derive(Debug, Clone)]
pub struct ContainerOptions {
    pub dir: PathBuf,
    /// The container name, e.g. `game1`.
    pub name: String,
    /// Use exactly this index generation rather than the latest one that exists.
    pub exact_index: Option<PathBuf>,
    /// Resource files replacing or extending the default slot table.
    pub slots: BTreeMap<u16, PathBuf>,
}

impl ContainerOptions {
    pub fn new<P: Into<PathBuf>, S: Into<String>>(dir: P, name: S) -> Self {
        Self {
            dir: dir.into(),
            name: name.into(),
            exact_index: None,
            slots: BTreeMap::new(),
        }
    }

    /// Derives the directory and container name from the path of any of its
    /// `.index` or `.resources` files, e.g. `base/game1_003.index` is container `game1` in `base`.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, OpenError> {
        let path = path.as_ref();
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .and_then(|s| s.split('_').next())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| OpenError::InvalidPath(path.to_path_buf()))?;

        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };

        Ok(Self::new(dir, name))
    }

    pub fn exact_index<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.exact_index = Some(path.into());
        self
    }

    pub fn slot<P: Into<PathBuf>>(mut self, id: u16, path: P) -> Self {
        self.slots.insert(id, path.into());
        self
    }

    pub fn shared_resource<P: Into<PathBuf>>(self, path: P) -> Self {
        self.slot(SHARED_SLOT, path)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ExportOptions {
    /// Read and decompress every entry, but do not write anything.
    pub dry_run: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportStatus {
    /// The entry has no data or no destination.
    Empty,
    /// The destination file already exists and was left untouched.
    Exists,
    /// The entry was read successfully, nothing was written.
    DryRun { bytes: u64 },
    Written { bytes: u64 },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExportStats {
    pub files_written: u64,
    pub files_skipped: u64,
    pub bytes_written: u64,
}

impl std::ops::AddAssign for ExportStats {
    fn add_assign(&mut self, other: Self) {
        self.files_written += other.files_written;
        self.files_skipped += other.files_skipped;
        self.bytes_written += other.bytes_written;
    }
}

impl ExportStats {
    /// Counts one exported entry.
    pub fn record(&mut self, status: ExportStatus) {
        match status {
            ExportStatus::Written { bytes } | ExportStatus::DryRun { bytes } => {
                self.files_written += 1;
                self.bytes_written += bytes;
            }
            ExportStatus::Empty | ExportStatus::Exists => self.files_skipped += 1,
        }
    }
}

/// A container: the active generation of `<name>.index` plus the resource files its entries point into.
///
/// Files are only held open for the duration of a single operation.
#[derive(Debug)]
pub struct ResourceContainer {
    dir: PathBuf,
    name: String,
    generation: u16,
    generations: FileTable,
    slots: FileTable,
    header: IndexHeader,
    entries: Vec<ResourceEntry>,
}

impl ResourceContainer {
    /// Opens the container that `path` belongs to, using its latest index generation.
    #[inline]
    pub fn open<P: AsRef<Path>>(path: P) -> Result<ResourceContainer, OpenError> {
        Self::with_options(ContainerOptions::from_path(path)?)
    }

    /// Opens the container using exactly the index generation at `path`.
    pub fn open_exact<P: AsRef<Path>>(path: P) -> Result<ResourceContainer, OpenError> {
        let path = path.as_ref();
        Self::with_options(ContainerOptions::from_path(path)?.exact_index(path))
    }

    pub fn with_options(options: ContainerOptions) -> Result<ResourceContainer, OpenError> {
        let ContainerOptions {
            dir,
            name,
            exact_index,
            slots: slot_overrides,
        } = options;

        let mut generations = FileTable::generations(&dir, &name);
        generations
            .stat()
            .map_err(|e| OpenError::ReadFailed(e, dir.clone()))?;

        let generation = match exact_index {
            Some(path) => {
                let id = generations
                    .find(&path)
                    .ok_or_else(|| OpenError::UnknownGeneration(path.clone()))?;
                match generations.get(id) {
                    Some(file) if file.exists() => id,
                    _ => return Err(OpenError::MissingIndex(path)),
                }
            }
            None => generations.latest().ok_or_else(|| OpenError::NoIndex {
                dir: dir.clone(),
                name: name.clone(),
            })?,
        };

        let mut slots = FileTable::slots(&dir, &name);
        for (id, path) in slot_overrides {
            slots.insert(id, path);
        }
        slots
            .stat()
            .map_err(|e| OpenError::ReadFailed(e, dir.clone()))?;

        let index_path = generations
            .path(generation)
            .ok_or_else(|| OpenError::NoIndex {
                dir: dir.clone(),
                name: name.clone(),
            })?
            .to_path_buf();

        let file =
            File::open(&index_path).map_err(|e| OpenError::ReadFailed(e, index_path.clone()))?;
        let mut reader = BufReader::new(file);
        let (header, entries) = read_entry_table(&mut reader, &index_path, &slots)?;

        tracing::debug!(
            %name,
            generation,
            records = header.entry_count,
            entries = entries.len(),
            "opened container"
        );

        Ok(ResourceContainer {
            dir,
            name,
            generation,
            generations,
            slots,
            header,
            entries,
        })
    }

    #[inline(always)]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    #[inline(always)]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The id of the active index generation.
    #[inline(always)]
    pub fn generation(&self) -> u16 {
        self.generation
    }

    pub fn index_path(&self) -> &Path {
        // The active generation is always in the table, see `with_options`.
        self.generations
            .path(self.generation)
            .unwrap_or_else(|| Path::new(""))
    }

    #[inline(always)]
    pub fn generations(&self) -> &FileTable {
        &self.generations
    }

    #[inline(always)]
    pub fn slots(&self) -> &FileTable {
        &self.slots
    }

    #[inline(always)]
    pub fn header(&self) -> &IndexHeader {
        &self.header
    }

    /// Entries with data, in index order. Deleted entries are not included.
    #[inline(always)]
    pub fn entries(&self) -> &[ResourceEntry] {
        &self.entries
    }

    #[inline(always)]
    pub fn entry(&self, index: usize) -> Option<&ResourceEntry> {
        self.entries.get(index)
    }

    /// Entries whose source or destination path contains `query`.
    pub fn search<'a>(&'a self, query: &'a str) -> impl Iterator<Item = &'a ResourceEntry> + 'a {
        self.entries
            .iter()
            .filter(move |e| e.source.contains(query) || e.destination.contains(query))
    }

    fn slot_path(&self, entry: &ResourceEntry) -> Option<&Path> {
        self.slots.path(entry.slot())
    }

    /// Reads the entry's data exactly as stored, without decompressing it.
    pub fn read_raw(&self, entry: &ResourceEntry) -> Result<Vec<u8>, ReadError> {
        if entry.stored_size == 0 {
            return Ok(vec![]);
        }

        let path = self
            .slot_path(entry)
            .ok_or(ReadError::UnknownSlot(entry.id))?;

        let mut file = File::open(path).map_err(|e| ReadError::ReadFailed(e, path.to_path_buf()))?;
        file.seek(SeekFrom::Start(entry.offset))
            .map_err(|e| ReadError::ReadFailed(e, path.to_path_buf()))?;

        let mut data = vec![0u8; entry.stored_size as usize];
        file.read_exact(&mut data)
            .map_err(|e| ReadError::ReadFailed(e, path.to_path_buf()))?;

        Ok(data)
    }

    /// Reads the entry's data, decompressing it if needed.
    pub fn read(&self, entry: &ResourceEntry) -> Result<Vec<u8>, ReadError> {
        let data = self.read_raw(entry)?;
        if data.is_empty() || !entry.is_compressed() {
            return Ok(data);
        }

        let data = inflate(&data, entry.size as usize)
            .map_err(|e| ReadError::Decompress(e, entry.id))?;

        if data.len() != entry.size as usize {
            return Err(ReadError::SizeMismatch {
                id: entry.id,
                expected: entry.size,
                actual: data.len(),
            });
        }

        tracing::trace!(%entry, stored = entry.stored_size, size = data.len(), "read entry");
        Ok(data)
    }

    /// Reads the entry and parses it as an `.entities` document.
    pub fn load_entities(&self, entry: &ResourceEntry) -> Result<Entities, LoadEntitiesError> {
        let data = self.read(entry)?;
        Ok(entities::parse(&data)?)
    }

    /// Replaces the data of the entry at `index` in place.
    ///
    /// Compressed entries are recompressed. The result is zero-padded to the entry's
    /// stored size and fails if it does not fit; entries are never moved or resized
    /// on disk. If the declared size changes, the entry's index record is rewritten.
    ///
    /// On failure the entry is left as it was, in memory and on disk.
    pub fn write(&mut self, index: usize, data: &[u8]) -> Result<(), WriteError> {
        let entry = self.entries.get(index).ok_or(WriteError::NoSuchEntry(index))?;
        let id = entry.id;
        let stored_size = entry.stored_size;

        let (mut payload, size) = if entry.is_compressed() {
            let size = u32::try_from(data.len()).map_err(|_| WriteError::Overflow {
                id,
                size: data.len(),
            })?;
            // The compressed flag is derived from the sizes, so they must stay different.
            if size == stored_size {
                return Err(WriteError::AmbiguousSize {
                    id,
                    size: data.len(),
                });
            }
            let payload = deflate(data).map_err(|e| WriteError::Compress(e, id))?;
            (payload, size)
        } else {
            (data.to_vec(), entry.size)
        };

        if payload.len() > stored_size as usize {
            return Err(WriteError::TooLarge {
                id,
                size: payload.len(),
                stored_size,
            });
        }
        payload.resize(stored_size as usize, 0);

        let path = self
            .slot_path(entry)
            .ok_or(WriteError::UnknownSlot(id))?
            .to_path_buf();
        let offset = entry.offset;

        let mut updated = entry.clone();
        updated.size = size;
        updated.stored_size = stored_size;
        let record_changed = updated != *entry;

        // Both files are opened before either is written to.
        let mut index_file = if record_changed {
            Some(self.open_record(&updated)?)
        } else {
            None
        };

        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&path)
            .map_err(|e| WriteError::WriteFailed(e, path.clone()))?;
        file.seek(SeekFrom::Start(offset))
            .map_err(|e| WriteError::WriteFailed(e, path.clone()))?;
        let mut previous = vec![0u8; stored_size as usize];
        file.read_exact(&mut previous)
            .map_err(|e| WriteError::WriteFailed(e, path.clone()))?;

        overwrite(&mut file, offset, &payload)
            .map_err(|e| WriteError::WriteFailed(e, path.clone()))?;

        if let Some(index_file) = index_file.as_mut() {
            if let Err(e) = self.write_record(index_file, &updated) {
                if let Err(restore) = overwrite(&mut file, offset, &previous) {
                    tracing::error!(
                        id,
                        error = %restore,
                        path = %path.display(),
                        "failed to restore entry data"
                    );
                }
                return Err(e);
            }
        }

        self.entries[index] = updated;

        tracing::debug!(id, size, stored_size, path = %path.display(), "wrote entry");
        Ok(())
    }

    /// Opens the active index for rewriting `entry`'s record.
    fn open_record(&self, entry: &ResourceEntry) -> Result<File, WriteError> {
        let path = self.index_path();
        let mut file = OpenOptions::new()
            .write(true)
            .open(path)
            .map_err(|e| WriteError::IndexUpdateFailed(e, path.to_path_buf()))?;
        file.seek(SeekFrom::Start(entry.index_offset))
            .map_err(|e| WriteError::IndexUpdateFailed(e, path.to_path_buf()))?;
        Ok(file)
    }

    fn write_record(&self, file: &mut File, entry: &ResourceEntry) -> Result<(), WriteError> {
        let path = self.index_path();

        let mut record = Vec::with_capacity(entry.record_len());
        entry
            .write_to(&mut record)
            .map_err(|e| WriteError::IndexUpdateFailed(e, path.to_path_buf()))?;
        file.write_all(&record)
            .map_err(|e| WriteError::IndexUpdateFailed(e, path.to_path_buf()))?;

        tracing::trace!(%entry, offset = entry.index_offset, "rewrote index record");
        Ok(())
    }

    #[inline]
    pub fn export<P: AsRef<Path>>(
        &self,
        entry: &ResourceEntry,
        output_path: P,
    ) -> Result<ExportStatus, ExportError> {
        self.export_with_options(entry, output_path, ExportOptions::default())
    }

    /// Writes the entry's decompressed data to its destination path below `output_path`.
    /// Existing files are never overwritten.
    pub fn export_with_options<P: AsRef<Path>>(
        &self,
        entry: &ResourceEntry,
        output_path: P,
        options: ExportOptions,
    ) -> Result<ExportStatus, ExportError> {
        if entry.stored_size == 0 || entry.destination.is_empty() {
            return Ok(ExportStatus::Empty);
        }

        let relative = relative_destination(&entry.destination)
            .ok_or_else(|| ExportError::UnsafePath(entry.destination.clone()))?;
        let target = output_path.as_ref().join(relative);

        if target.exists() {
            tracing::trace!(path = %target.display(), "export target exists, skipping");
            return Ok(ExportStatus::Exists);
        }

        let data = self.read(entry)?;
        let bytes = data.len() as u64;

        if options.dry_run {
            return Ok(ExportStatus::DryRun { bytes });
        }

        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| ExportError::CreateDirFailed(e, parent.to_path_buf()))?;
        }
        std::fs::write(&target, &data)
            .map_err(|e| ExportError::CreateFileFailed(e, target.clone()))?;

        Ok(ExportStatus::Written { bytes })
    }

    /// Exports every entry, stopping at the first failure.
    pub fn export_all<P: AsRef<Path>>(
        &self,
        output_path: P,
        options: ExportOptions,
    ) -> Result<ExportStats, ExportError> {
        let output_path = output_path.as_ref();
        let mut stats = ExportStats::default();

        for entry in self.entries.iter() {
            stats.record(self.export_with_options(entry, output_path, options)?);
        }

        tracing::debug!(
            name = %self.name,
            written = stats.files_written,
            skipped = stats.files_skipped,
            bytes = stats.bytes_written,
            "exported container"
        );
        Ok(stats)
    }
}

impl std::fmt::Display for ResourceContainer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Container({}, generation {}, {} entries)",
            self.name,
            self.generation,
            self.entries.len()
        )
    }
}

fn overwrite(file: &mut File, offset: u64, data: &[u8]) -> std::io::Result<()> {
    file.seek(SeekFrom::Start(offset))?;
    file.write_all(data)
}

/// Destinations use `/` separators and must stay below the export root.
fn relative_destination(destination: &str) -> Option<PathBuf> {
    let mut out = PathBuf::new();

    for part in destination.split(['/', '\\']) {
        match part {
            "" | "." => {}
            ".." => return None,
            part => {
                let mut components = Path::new(part).components();
                match (components.next(), components.next()) {
                    (Some(Component::Normal(c)), None) => out.push(c),
                    _ => return None,
                }
            }
        }
    }

    if destination.starts_with(['/', '\\']) || out.as_os_str().is_empty() {
        return None;
    }

    Some(out)
}
