use std::io::{Read, Write};

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};

// `.index` files start with 0x05, `.resources` with 0x04. `master.index` uses 0x04 too.
pub const INDEX_MAGIC: &[u8; 4] = b"\x05SER";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexHeader {
    pub magic_bytes: [u8; 4],
    /// Unknown, appears to be padding. Kept so the header can be written back verbatim.
    pub reserved: [u8; 28],
    pub entry_count: u32,
}

impl IndexHeader {
    pub const SIZE: usize = 36;

    pub fn new(entry_count: u32) -> IndexHeader {
        IndexHeader {
            magic_bytes: *INDEX_MAGIC,
            reserved: [0; 28],
            entry_count,
        }
    }

    #[inline(always)]
    pub fn is_valid(&self) -> bool {
        &self.magic_bytes == INDEX_MAGIC
    }

    pub fn read_from<R: Read>(reader: &mut R) -> std::io::Result<IndexHeader> {
        let mut magic_bytes = [0u8; 4];
        reader.read_exact(&mut magic_bytes)?;
        let mut reserved = [0u8; 28];
        reader.read_exact(&mut reserved)?;
        let entry_count = reader.read_u32::<BigEndian>()?;

        Ok(IndexHeader {
            magic_bytes,
            reserved,
            entry_count,
        })
    }

    pub fn write_to<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        writer.write_all(&self.magic_bytes)?;
        writer.write_all(&self.reserved)?;
        writer.write_u32::<BigEndian>(self.entry_count)
    }
}
