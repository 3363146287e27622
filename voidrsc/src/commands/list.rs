use serde::Serialize;
use voidrsc_format::{ResourceContainer, ResourceEntry};

use crate::cli::ListArgs;
use crate::error::{Error, Result};
use crate::util::{format_size, open_container, ratio};

#[derive(Serialize)]
struct JsonEntry<'a> {
    id: u32,
    #[serde(rename = "type")]
    kind: &'a str,
    source: &'a str,
    destination: &'a str,
    offset: u64,
    size: u32,
    stored_size: u32,
    compression: String,
    slot: u16,
}

impl<'a> From<&'a ResourceEntry> for JsonEntry<'a> {
    fn from(entry: &'a ResourceEntry) -> Self {
        JsonEntry {
            id: entry.id,
            kind: &entry.kind,
            source: &entry.source,
            destination: &entry.destination,
            offset: entry.offset,
            size: entry.size,
            stored_size: entry.stored_size,
            compression: entry.compression().to_string(),
            slot: entry.slot(),
        }
    }
}

pub fn run(args: ListArgs) -> Result<()> {
    let container = open_container(&args.archive)?;

    let entries: Vec<&ResourceEntry> = container
        .entries()
        .iter()
        .filter(|e| args.kind.as_deref().map_or(true, |k| e.kind == k))
        .filter(|e| {
            args.search
                .as_deref()
                .map_or(true, |q| e.source.contains(q) || e.destination.contains(q))
        })
        .collect();

    if args.json {
        list_json(&entries)
    } else {
        list_table(&container, &entries);
        Ok(())
    }
}

fn list_table(container: &ResourceContainer, entries: &[&ResourceEntry]) {
    println!(
        "Container: {} (index: {})",
        container.name(),
        container.index_path().display()
    );
    println!();
    println!(
        "{:>8}  {:>12}  {:>12}  {:>6}  {:16}  Destination",
        "Id", "Stored", "Size", "Ratio", "Type"
    );
    println!("{}", "-".repeat(80));

    let mut total_stored = 0u64;
    let mut total_size = 0u64;

    for entry in entries {
        let stored = u64::from(entry.stored_size);
        let size = u64::from(entry.size);

        println!(
            "{:>8}  {:>12}  {:>12}  {:>5.1}%  {:16}  {}",
            entry.id,
            format_size(stored),
            format_size(size),
            ratio(stored, size),
            entry.kind,
            entry.destination
        );

        total_stored += stored;
        total_size += size;
    }

    println!("{}", "-".repeat(80));
    println!(
        "{:>8}  {:>12}  {:>12}  {:>5.1}%  Total",
        entries.len(),
        format_size(total_stored),
        format_size(total_size),
        ratio(total_stored, total_size)
    );
}

fn list_json(entries: &[&ResourceEntry]) -> Result<()> {
    let entries: Vec<JsonEntry> = entries.iter().map(|e| JsonEntry::from(*e)).collect();
    let json =
        serde_json::to_string_pretty(&entries).map_err(|source| Error::Serialize { source })?;
    println!("{}", json);
    Ok(())
}
