//! Reading the entry table of an index generation.

use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use crate::entry::ResourceEntry;
use crate::error::OpenError;
use crate::header::IndexHeader;
use crate::layout::FileTable;

/// id, three string lengths, offset, two sizes, reserved bytes and flags.
const MIN_RECORD_LEN: u64 = 4 + 3 * 4 + 8 + 4 + 4 + 6 + 2 + 2;

/// Reads the header and every entry record of an index, checking each record against
/// the resource files in `slots` as soon as it is read.
///
/// Deleted records are validated too but left out of the returned list.
pub(crate) fn read_entry_table<R: Read + Seek>(
    reader: &mut R,
    path: &Path,
    slots: &FileTable,
) -> Result<(IndexHeader, Vec<ResourceEntry>), OpenError> {
    let header = IndexHeader::read_from(reader)
        .map_err(|e| OpenError::ReadFailed(e, path.to_path_buf()))?;

    if !header.is_valid() {
        return Err(OpenError::InvalidMagic {
            magic: header.magic_bytes,
            path: path.to_path_buf(),
        });
    }

    // The count is untrusted; every record takes at least `MIN_RECORD_LEN` bytes.
    let remaining =
        remaining_len(reader).map_err(|e| OpenError::ReadFailed(e, path.to_path_buf()))?;
    let capacity = (remaining / MIN_RECORD_LEN).min(u64::from(header.entry_count));

    let mut entries = Vec::with_capacity(capacity as usize);
    for index in 0..header.entry_count {
        let entry = ResourceEntry::read_from(reader).map_err(|source| OpenError::InvalidRecord {
            index,
            path: path.to_path_buf(),
            source,
        })?;
        tracing::trace!(index, %entry, slot = entry.slot(), "read entry record");

        check_bounds(&entry, slots)?;

        if entry.is_deleted() {
            continue;
        }
        entries.push(entry);
    }

    tracing::debug!(
        path = %path.display(),
        records = header.entry_count,
        kept = entries.len(),
        "read entry table"
    );

    Ok((header, entries))
}

fn remaining_len<S: Seek>(reader: &mut S) -> std::io::Result<u64> {
    let position = reader.stream_position()?;
    let end = reader.seek(SeekFrom::End(0))?;
    reader.seek(SeekFrom::Start(position))?;
    Ok(end.saturating_sub(position))
}

/// An entry's data must lie entirely within its resource file. Missing files count as empty.
pub(crate) fn check_bounds(entry: &ResourceEntry, slots: &FileTable) -> Result<(), OpenError> {
    let file = slots.get(entry.slot()).ok_or(OpenError::UnknownSlot {
        id: entry.id,
        slot: entry.slot(),
    })?;
    let file_size = file.size.unwrap_or(0);

    match entry.end() {
        Some(end) if end <= file_size => Ok(()),
        _ => Err(OpenError::OutOfBounds {
            id: entry.id,
            offset: entry.offset,
            stored_size: entry.stored_size,
            file_size,
            path: file.path.clone(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn huge_entry_count_on_short_index() {
        let mut data = vec![];
        IndexHeader::new(u32::MAX).write_to(&mut data).unwrap();
        let slots = FileTable::slots(Path::new("."), "game1");

        let result = read_entry_table(&mut Cursor::new(data), Path::new("game1.index"), &slots);
        assert!(matches!(
            result,
            Err(OpenError::InvalidRecord { index: 0, .. })
        ));
    }

    #[test]
    fn remaining_keeps_position() {
        let mut cursor = Cursor::new(vec![0u8; 100]);
        cursor.set_position(36);
        assert_eq!(remaining_len(&mut cursor).unwrap(), 64);
        assert_eq!(cursor.position(), 36);
    }
}
