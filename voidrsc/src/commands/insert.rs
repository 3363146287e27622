use crate::cli::InsertArgs;
use crate::error::{Error, Result};
use crate::util::{find_entry, format_size, open_container};

pub fn run(args: InsertArgs) -> Result<()> {
    let mut container = open_container(&args.archive)?;
    let index = find_entry(&container, &args.entry)?;

    let data = std::fs::read(&args.file).map_err(|source| Error::OpenFile {
        path: args.file.clone(),
        source,
    })?;

    let destination = container.entries()[index].destination.clone();
    container
        .write(index, &data)
        .map_err(|source| Error::WriteEntry {
            destination: destination.clone(),
            source,
        })?;

    let entry = &container.entries()[index];
    println!(
        "Wrote {} to {} ({}, stored in {})",
        format_size(data.len() as u64),
        destination,
        entry.compression(),
        format_size(u64::from(entry.stored_size))
    );

    Ok(())
}
