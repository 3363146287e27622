use voidrsc_format::{ContainerOptions, ResourceContainer, ResourceEntry};

use crate::cli::ArchiveArgs;
use crate::error::{Error, Result};

/// Opens the container the archive arguments point at.
pub fn open_container(args: &ArchiveArgs) -> Result<ResourceContainer> {
    let open_error = |source| Error::OpenArchive {
        path: args.archive.clone(),
        source,
    };

    let mut options = ContainerOptions::from_path(&args.archive).map_err(open_error)?;
    if args.exact {
        options = options.exact_index(&args.archive);
    }
    if let Some(shared) = &args.shared {
        options = options.shared_resource(shared);
    }

    ResourceContainer::with_options(options).map_err(open_error)
}

/// Finds an entry by id, then by destination, then by source path.
pub fn find_entry(container: &ResourceContainer, query: &str) -> Result<usize> {
    let entries = container.entries();
    let by_id = query
        .parse::<u32>()
        .ok()
        .and_then(|id| entries.iter().position(|e| e.id == id));

    by_id
        .or_else(|| entries.iter().position(|e| e.destination == query))
        .or_else(|| entries.iter().position(|e| e.source == query))
        .ok_or_else(|| Error::EntryNotFound {
            query: query.to_string(),
        })
}

pub fn matches_any(entry: &ResourceEntry, filters: &[String]) -> bool {
    filters.is_empty()
        || filters
            .iter()
            .any(|f| entry.source.contains(f.as_str()) || entry.destination.contains(f.as_str()))
}

/// Format file size in human-readable form
pub fn format_size(bytes: u64) -> String {
    use humansize::{FormatSize, BINARY};
    bytes.format_size(BINARY)
}

/// Space saved by compression, in percent.
pub fn ratio(stored_size: u64, size: u64) -> f64 {
    if size == 0 {
        0.0
    } else {
        100.0 - (stored_size as f64 / size as f64 * 100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: u32, destination: &str) -> ResourceEntry {
        ResourceEntry {
            id,
            kind: "rawdata".into(),
            source: format!("art/{}", destination),
            destination: destination.into(),
            offset: 0,
            size: 4,
            stored_size: 4,
            reserved: [0; 6],
            flags: [0, 0],
            index_offset: 0,
        }
    }

    #[test]
    fn filters() {
        let e = entry(1, "maps/game/hub.entities");
        assert!(matches_any(&e, &[]));
        assert!(matches_any(&e, &["nope".into(), "hub".into()]));
        assert!(matches_any(&e, &["art/".into()]));
        assert!(!matches_any(&e, &["decls".into()]));
    }

    #[test]
    fn ratios() {
        assert_eq!(ratio(0, 0), 0.0);
        assert_eq!(ratio(25, 100), 75.0);
        assert_eq!(ratio(100, 100), 0.0);
    }
}
