//! Compression support for resource payloads.
//!
//! Compressed payloads are zlib streams deflated with a 2^10 byte window. Reads
//! accept any window size.

use std::fmt;
use std::io::{Error, ErrorKind, Result};

use flate2::{Compress, Decompress, FlushCompress, FlushDecompress, Status};

/// The zlib `windowBits` used when compressing payloads.
pub const WINDOW_BITS: u8 = 10;

const MIN_BUFFER: usize = 0x4000;

#[derive(Clone, Copy, Eq, PartialEq, Default)]
pub enum Compression {
    #[default]
    Stored,
    Zlib,
}

impl fmt::Display for Compression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Compression::Stored => "stored",
            Compression::Zlib => "zlib",
        };

        write!(f, "{}", s)
    }
}

impl fmt::Debug for Compression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl Compression {
    pub fn compress(self, data: &[u8]) -> Result<Vec<u8>> {
        match self {
            Compression::Stored => Ok(data.to_vec()),
            Compression::Zlib => deflate(data),
        }
    }

    /// `size_hint` is the expected decompressed length, used to size the output buffer.
    pub fn decompress(self, data: &[u8], size_hint: usize) -> Result<Vec<u8>> {
        match self {
            Compression::Stored => Ok(data.to_vec()),
            Compression::Zlib => inflate(data, size_hint),
        }
    }
}

/// Compress `data` into a zlib stream with the engine's window size.
pub fn deflate(data: &[u8]) -> Result<Vec<u8>> {
    let mut compressor =
        Compress::new_with_window_bits(flate2::Compression::default(), true, WINDOW_BITS);
    let mut output = Vec::with_capacity((data.len() / 2).max(MIN_BUFFER));

    loop {
        let consumed = compressor.total_in() as usize;
        let status = compressor
            .compress_vec(&data[consumed..], &mut output, FlushCompress::Finish)
            .map_err(|e| Error::new(ErrorKind::Other, e))?;

        match status {
            Status::StreamEnd => break,
            Status::Ok | Status::BufError => output.reserve(output.capacity().max(MIN_BUFFER)),
        }
    }

    Ok(output)
}

/// Decompress a zlib stream. Bytes following the end of the stream (slot padding) are ignored.
pub fn inflate(data: &[u8], size_hint: usize) -> Result<Vec<u8>> {
    let mut decompressor = Decompress::new(true);
    let mut output = Vec::with_capacity(size_hint.max(MIN_BUFFER));

    loop {
        let consumed = decompressor.total_in() as usize;
        let produced = decompressor.total_out();
        let status = decompressor
            .decompress_vec(&data[consumed..], &mut output, FlushDecompress::Finish)
            .map_err(|e| Error::new(ErrorKind::InvalidData, e))?;

        match status {
            Status::StreamEnd => break,
            Status::Ok | Status::BufError => {
                let progressed = decompressor.total_in() as usize != consumed
                    || decompressor.total_out() != produced;

                if output.len() == output.capacity() {
                    output.reserve(output.capacity().max(MIN_BUFFER));
                } else if !progressed {
                    return Err(Error::new(
                        ErrorKind::UnexpectedEof,
                        "zlib stream ended before its end marker",
                    ));
                }
            }
        }
    }

    Ok(output)
}
