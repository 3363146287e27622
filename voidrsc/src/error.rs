use std::path::PathBuf;

use miette::Diagnostic;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error, Diagnostic)]
pub enum Error {
    #[error("Cannot open container `{}`", .path.display())]
    #[diagnostic(help("Pass the path of one of the container's .index or .resources files"))]
    OpenArchive {
        path: PathBuf,
        #[source]
        source: voidrsc_format::OpenError,
    },

    #[error("No entry matches `{query}`")]
    #[diagnostic(help("Use `voidrsc list --search` to find entries"))]
    EntryNotFound { query: String },

    #[error("Cannot read entry `{destination}`")]
    ReadEntry {
        destination: String,
        #[source]
        source: voidrsc_format::ReadError,
    },

    #[error("Cannot write entry `{destination}`")]
    #[diagnostic(help(
        "Entries are patched in place, the new data must fit the space the entry already has"
    ))]
    WriteEntry {
        destination: String,
        #[source]
        source: voidrsc_format::WriteError,
    },

    #[error("Cannot export entry `{destination}`")]
    Export {
        destination: String,
        #[source]
        source: voidrsc_format::ExportError,
    },

    #[error("Cannot load entities from `{destination}`")]
    #[diagnostic(help("Is this an .entities entry?"))]
    LoadEntities {
        destination: String,
        #[source]
        source: voidrsc_format::LoadEntitiesError,
    },

    #[error("No entity `{id}` in `{destination}`")]
    EntityNotFound { id: String, destination: String },

    #[error("Cannot open file `{}`", .path.display())]
    OpenFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot create directory `{}`", .path.display())]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot serialize output")]
    Serialize {
        #[source]
        source: serde_json::Error,
    },
}
