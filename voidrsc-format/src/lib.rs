//! Herein lies the brains of the Void engine resource formats.
//!
//! Use [ResourceContainer][ResourceContainer] to read and patch `.index` / `.resources`
//! containers, and [entities::parse][entities::parse] to turn an `.entities` payload
//! into a structured document.

mod compression;
mod container;
pub mod entities;
mod entry;
mod error;
mod header;
mod layout;
mod table;

pub use compression::{deflate, inflate, Compression, WINDOW_BITS};
pub use container::{
    ContainerOptions, ExportOptions, ExportStats, ExportStatus, ResourceContainer,
};
pub use entry::ResourceEntry;
pub use error::{ExportError, LoadEntitiesError, OpenError, ReadError, WriteError};
pub use header::{IndexHeader, INDEX_MAGIC};
pub use layout::{FileTable, TableFile, PATCH_GENERATION, SHARED_SLOT};
