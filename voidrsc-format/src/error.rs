use std::path::PathBuf;

use crate::entities::ParseError;

#[derive(Debug, thiserror::Error)]
pub enum OpenError {
    #[error("No index generation found for container '{name}' in '{}'", .dir.display())]
    NoIndex { dir: PathBuf, name: String },

    #[error("Index does not exist. Path: '{}'", .0.display())]
    MissingIndex(PathBuf),

    #[error("Not an index generation of this container. Path: '{}'", .0.display())]
    UnknownGeneration(PathBuf),

    #[error("Cannot derive a container name from path. Path: '{}'", .0.display())]
    InvalidPath(PathBuf),

    #[error("Invalid index magic {magic:02x?}. Is this a valid .index file? Path: '{}'", .path.display())]
    InvalidMagic { magic: [u8; 4], path: PathBuf },

    #[error("Invalid entry record #{index} in '{}'", .path.display())]
    InvalidRecord {
        index: u32,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Entry {id} refers to unknown resource slot {slot}")]
    UnknownSlot { id: u32, slot: u16 },

    #[error(
        "Entry {id} does not fit its resource file: {offset:#x} + {stored_size:#x} > {file_size:#x}. Path: '{}'",
        .path.display()
    )]
    OutOfBounds {
        id: u32,
        offset: u64,
        stored_size: u32,
        file_size: u64,
        path: PathBuf,
    },

    #[error("Failed to read container file. Path: '{}'", .1.display())]
    ReadFailed(#[source] std::io::Error, PathBuf),
}

#[derive(Debug, thiserror::Error)]
pub enum ReadError {
    #[error("Entry {0} refers to an unknown resource slot")]
    UnknownSlot(u32),

    #[error("Failed to read resource file. Path: '{}'", .1.display())]
    ReadFailed(#[source] std::io::Error, PathBuf),

    #[error("Decompressing entry {1} failed, check for corrupt files")]
    Decompress(#[source] std::io::Error, u32),

    #[error("Entry {id} decompressed to {actual} bytes, expected {expected}")]
    SizeMismatch { id: u32, expected: u32, actual: usize },
}

#[derive(Debug, thiserror::Error)]
pub enum WriteError {
    #[error("No entry at position {0}")]
    NoSuchEntry(usize),

    #[error("Entry {0} refers to an unknown resource slot")]
    UnknownSlot(u32),

    #[error("Compressing data for entry {1} failed")]
    Compress(#[source] std::io::Error, u32),

    #[error("Data for entry {id} is too large: {size} > {stored_size}")]
    TooLarge { id: u32, size: usize, stored_size: u32 },

    #[error("Data for entry {id} is {size} bytes, equal to its stored size; it would no longer read as compressed")]
    AmbiguousSize { id: u32, size: usize },

    #[error("Data for entry {id} is too large to be described by an index record: {size} bytes")]
    Overflow { id: u32, size: usize },

    #[error("Failed to write resource file. Path: '{}'", .1.display())]
    WriteFailed(#[source] std::io::Error, PathBuf),

    #[error("Failed to update index record. Path: '{}'", .1.display())]
    IndexUpdateFailed(#[source] std::io::Error, PathBuf),
}

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("Refusing to export outside of the output directory. Destination: '{0}'")]
    UnsafePath(String),

    #[error("Reading entry failed")]
    Read(#[from] ReadError),

    #[error("Creating directory failed. Path: '{}'", .1.display())]
    CreateDirFailed(#[source] std::io::Error, PathBuf),

    #[error("Creating file failed. Path: '{}'", .1.display())]
    CreateFileFailed(#[source] std::io::Error, PathBuf),
}

#[derive(Debug, thiserror::Error)]
pub enum LoadEntitiesError {
    #[error("Reading entry failed")]
    Read(#[from] ReadError),

    #[error("Parsing entities failed")]
    Parse(#[from] ParseError),
}
