//! A smart pointer over memory-mapped or in-memory binary data (§6.3).
//!
//! Reading a large object file byte-by-byte through `std::fs::File` would
//! mean either loading the whole thing up front or seeking constantly as
//! `gimli` walks back and forth across sections. `ByteView` maps the file
//! once and hands out a `&[u8]` that lives as long as the mapping.

use std::fs::File;
use std::io;
use std::ops::Deref;
use std::sync::Arc;

use memmap2::Mmap;

#[derive(Debug)]
enum Backing {
    Mmap(Mmap),
    Buf(Vec<u8>),
}

impl Deref for Backing {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        match self {
            Backing::Mmap(mmap) => mmap,
            Backing::Buf(buf) => buf,
        }
    }
}

/// A cheaply-cloneable handle to a byte buffer, backed by a memory-mapped
/// file or, if mapping fails on an empty file, an owned empty buffer.
#[derive(Clone, Debug)]
pub struct ByteView {
    backing: Arc<Backing>,
}

impl ByteView {
    /// Memory-maps an already-open file handle.
    pub fn map_file(file: File) -> Result<Self, io::Error> {
        let backing = match unsafe { Mmap::map(&file) } {
            Ok(mmap) => Backing::Mmap(mmap),
            // mmap rejects zero-length files; treat that as an empty buffer
            // rather than an error.
            Err(err) if err.kind() == io::ErrorKind::InvalidInput => Backing::Buf(Vec::new()),
            Err(err) => return Err(err),
        };

        Ok(ByteView {
            backing: Arc::new(backing),
        })
    }

    #[cfg(test)]
    pub fn from_vec(buffer: Vec<u8>) -> Self {
        ByteView {
            backing: Arc::new(Backing::Buf(buffer)),
        }
    }
}

impl Deref for ByteView {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.backing
    }
}

impl AsRef<[u8]> for ByteView {
    fn as_ref(&self) -> &[u8] {
        &self.backing
    }
}
