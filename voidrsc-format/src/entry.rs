use std::io::{Read, Seek, Write};
use std::path::Path;

use byteorder::{BigEndian, LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::compression::Compression;

/// One archived resource, as described by a record in the active `.index` generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceEntry {
    pub id: u32,

    /// The logical resource type, e.g. `entities` or `image`.
    pub kind: String,

    /// The path of the asset this resource was built from.
    pub source: String,

    /// The path the resource is exported to, relative to an export root.
    pub destination: String,

    /// The position of the data in its resource file.
    pub offset: u64,

    /// The length of the data once decompressed.
    pub size: u32,

    /// The exact length of the data as stored, including any padding.
    pub stored_size: u32,

    /// Unknown, always null so far. Preserved when the record is rewritten.
    pub reserved: [u8; 6],

    pub flags: [u16; 2],

    /// The position of this record in the index file.
    pub index_offset: u64,
}

fn read_string<R: Read>(reader: &mut R) -> std::io::Result<String> {
    let len = reader.read_u32::<LittleEndian>()? as u64;
    let mut buf = vec![];
    reader.take(len).read_to_end(&mut buf)?;
    if buf.len() as u64 != len {
        return Err(std::io::Error::new(
            std::io::ErrorKind::UnexpectedEof,
            "string runs past the end of the index",
        ));
    }
    String::from_utf8(buf)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
}

fn write_string<W: Write>(writer: &mut W, value: &str) -> std::io::Result<()> {
    writer.write_u32::<LittleEndian>(value.len() as u32)?;
    writer.write_all(value.as_bytes())
}

impl ResourceEntry {
    /// Reads a record from `reader`, which must be positioned at its start.
    pub fn read_from<R: Read + Seek>(reader: &mut R) -> std::io::Result<ResourceEntry> {
        let index_offset = reader.stream_position()?;
        let id = reader.read_u32::<BigEndian>()?;
        let kind = read_string(reader)?;
        let source = read_string(reader)?;
        let destination = read_string(reader)?;
        let offset = reader.read_u64::<BigEndian>()?;
        let size = reader.read_u32::<BigEndian>()?;
        let stored_size = reader.read_u32::<BigEndian>()?;
        let mut reserved = [0u8; 6];
        reader.read_exact(&mut reserved)?;
        let flags = [
            reader.read_u16::<BigEndian>()?,
            reader.read_u16::<BigEndian>()?,
        ];

        Ok(ResourceEntry {
            id,
            kind,
            source,
            destination,
            offset,
            size,
            stored_size,
            reserved,
            flags,
            index_offset,
        })
    }

    /// Writes the record in the same layout it was read from.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        writer.write_u32::<BigEndian>(self.id)?;
        write_string(writer, &self.kind)?;
        write_string(writer, &self.source)?;
        write_string(writer, &self.destination)?;
        writer.write_u64::<BigEndian>(self.offset)?;
        writer.write_u32::<BigEndian>(self.size)?;
        writer.write_u32::<BigEndian>(self.stored_size)?;
        writer.write_all(&self.reserved)?;
        writer.write_u16::<BigEndian>(self.flags[0])?;
        writer.write_u16::<BigEndian>(self.flags[1])
    }

    /// The length of the record on disk.
    pub fn record_len(&self) -> usize {
        4 + 3 * 4
            + self.kind.len()
            + self.source.len()
            + self.destination.len()
            + 8
            + 4
            + 4
            + 6
            + 2
            + 2
    }

    /// The id of the resource file holding this entry's data.
    #[inline(always)]
    pub fn slot(&self) -> u16 {
        self.flags[1] >> 2
    }

    #[inline(always)]
    pub fn is_compressed(&self) -> bool {
        self.size != self.stored_size
    }

    #[inline(always)]
    pub fn compression(&self) -> Compression {
        if self.is_compressed() {
            Compression::Zlib
        } else {
            Compression::Stored
        }
    }

    /// Deleted entries keep their record but have no data.
    #[inline(always)]
    pub fn is_deleted(&self) -> bool {
        self.size == 0 || self.stored_size == 0
    }

    /// The end of the data in the resource file. `None` if it overflows.
    #[inline(always)]
    pub fn end(&self) -> Option<u64> {
        self.offset.checked_add(self.stored_size as u64)
    }

    pub fn is_entities(&self) -> bool {
        self.destination_suffix() == Some("entities")
    }

    pub fn source_file_name(&self) -> Option<&str> {
        Path::new(&self.source).file_name()?.to_str()
    }

    pub fn destination_file_name(&self) -> Option<&str> {
        Path::new(&self.destination).file_name()?.to_str()
    }

    pub fn destination_suffix(&self) -> Option<&str> {
        Path::new(&self.destination).extension()?.to_str()
    }
}

impl std::fmt::Display for ResourceEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Entry({}, {}, {})", self.id, self.source, self.destination)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn entry() -> ResourceEntry {
        ResourceEntry {
            id: 0x0102_0304,
            kind: "entities".into(),
            source: "maps/game/dunwall/dunwall.map".into(),
            destination: "generated/maps/dunwall.entities".into(),
            offset: 0x10,
            size: 512,
            stored_size: 128,
            reserved: [0; 6],
            flags: [0, 0x8000],
            index_offset: 0,
        }
    }

    #[test]
    fn record_layout() {
        let mut buf = vec![];
        entry().write_to(&mut buf).unwrap();
        assert_eq!(buf.len(), entry().record_len());

        // id is big-endian, string lengths little-endian
        assert_eq!(&buf[..4], &[1, 2, 3, 4]);
        assert_eq!(&buf[4..8], &[8, 0, 0, 0]);
        assert_eq!(&buf[8..16], b"entities");

        let tail = &buf[buf.len() - 26..];
        assert_eq!(&tail[..8], &0x10u64.to_be_bytes());
        assert_eq!(&tail[8..12], &512u32.to_be_bytes());
        assert_eq!(&tail[12..16], &128u32.to_be_bytes());
        assert_eq!(&tail[22..24], &[0x00, 0x00]);
        assert_eq!(&tail[24..], &[0x80, 0x00]);
    }

    #[test]
    fn read_back() {
        let mut buf = vec![0xAAu8; 3];
        entry().write_to(&mut buf).unwrap();

        let mut cursor = Cursor::new(buf);
        cursor.set_position(3);
        let read = ResourceEntry::read_from(&mut cursor).unwrap();
        assert_eq!(read.index_offset, 3);
        assert_eq!(read, ResourceEntry { index_offset: 3, ..entry() });
    }

    #[test]
    fn derived_fields() {
        let e = entry();
        assert_eq!(e.slot(), crate::layout::SHARED_SLOT);
        assert!(e.is_compressed());
        assert_eq!(e.compression(), Compression::Zlib);
        assert!(e.is_entities());
        assert_eq!(e.destination_file_name(), Some("dunwall.entities"));
        assert_eq!(e.end(), Some(0x10 + 128));

        let stored = ResourceEntry { size: 128, flags: [0, 3 << 2], ..entry() };
        assert!(!stored.is_compressed());
        assert_eq!(stored.slot(), 3);

        let deleted = ResourceEntry { size: 0, stored_size: 0, ..entry() };
        assert!(deleted.is_deleted());
    }

    #[test]
    fn oversized_string_length() {
        let mut buf = vec![0, 0, 0, 1];
        buf.extend_from_slice(&u32::MAX.to_le_bytes());
        buf.extend_from_slice(b"short");
        let err = ResourceEntry::read_from(&mut Cursor::new(buf)).unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn invalid_utf8_name() {
        let mut buf = vec![0, 0, 0, 1];
        buf.extend_from_slice(&[2, 0, 0, 0, 0xff, 0xfe]);
        let err = ResourceEntry::read_from(&mut Cursor::new(buf)).unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::InvalidData);
    }
}
