//! The DWARF access layer (§6.3): turns the raw bytes of an ELF file into a
//! `gimli::Dwarf` ready for the classifier and coverage analyzer to walk.
//!
//! This deliberately knows nothing about DIEs or coverage; its only job is
//! section discovery, decompression, and endian-aware slicing. Sections are
//! handed to `gimli` as `EndianArcSlice`: most sections merely borrow the
//! mapped file, but compressed ones need an owned, decompressed buffer, and
//! ref-counting lets both live behind the same reader type.
use std::sync::Arc;

use flate2::{Decompress, FlushDecompress};
use gimli::{EndianArcSlice, RunTimeEndian};
use goblin::elf::Elf;
use goblin::elf::section_header::{SHT_NOBITS, SectionHeader};

use crate::error::ReaderError;

pub type Reader = EndianArcSlice<RunTimeEndian>;
pub type Dwarf = gimli::Dwarf<Reader>;
pub type Unit = gimli::Unit<Reader>;

const SHF_COMPRESSED: u64 = goblin::elf::section_header::SHF_COMPRESSED as u64;
const ELFCOMPRESS_ZLIB: u32 = 1;

/// Parses `data` as an ELF file and assembles a `gimli::Dwarf` over its debug
/// sections, transparently decompressing `SHF_COMPRESSED` and legacy
/// `.zdebug_*` sections.
pub fn load(data: &[u8]) -> Result<Dwarf, ReaderError> {
    let elf = Elf::parse(data).map_err(ReaderError::MalformedElf)?;
    let endian = if elf.little_endian {
        RunTimeEndian::Little
    } else {
        RunTimeEndian::Big
    };

    gimli::Dwarf::load(|id| -> Result<Reader, ReaderError> {
        let bytes: Arc<[u8]> = match find_section(&elf, data, id.name()) {
            Some((false, bytes)) => Arc::from(bytes),
            Some((true, bytes)) => {
                let decompressed = decompress_section(bytes).ok_or_else(|| ReaderError::Decompress {
                    section: id.name().to_string(),
                })?;
                Arc::from(decompressed)
            }
            None => Arc::from(&[][..]),
        };
        Ok(EndianArcSlice::new(bytes, endian))
    })
}

fn find_section<'data>(
    elf: &Elf<'_>,
    data: &'data [u8],
    name: &str,
) -> Option<(bool, &'data [u8])> {
    for header in &elf.section_headers {
        if header.sh_type == SHT_NOBITS {
            continue;
        }

        let section_name = elf.shdr_strtab.get_at(header.sh_name)?;
        if section_name.is_empty() {
            continue;
        }

        let offset = header.sh_offset as usize;
        if offset == 0 {
            // dsymutil-style stripped section headers keep their entry but
            // zero the offset; no real section starts at file offset 0.
            continue;
        }

        let (compressed, stripped_name) = match section_name.strip_prefix(".z") {
            Some(rest) => (true, rest),
            None => (header_compressed(header), &section_name[1..]),
        };

        if stripped_name != name {
            continue;
        }

        let size = header.sh_size as usize;
        let bytes = data.get(offset..offset + size)?;
        return Some((compressed, bytes));
    }

    None
}

fn header_compressed(header: &SectionHeader) -> bool {
    header.sh_flags & SHF_COMPRESSED != 0
}

/// Decompresses a `SHF_COMPRESSED`/`.zdebug_*` section body.
fn decompress_section(section_data: &[u8]) -> Option<Vec<u8>> {
    let (size, compressed) = if let Some(rest) = section_data.strip_prefix(b"ZLIB") {
        // Legacy GNU header: 4-byte magic + 8-byte big-endian decompressed size.
        if rest.len() < 8 {
            return None;
        }
        let mut size_bytes = [0u8; 8];
        size_bytes.copy_from_slice(&rest[..8]);
        (u64::from_be_bytes(size_bytes), &rest[8..])
    } else {
        // ELF gABI SHF_COMPRESSED header: Elf{32,64}_Chdr.
        let (ch_type, ch_size, header_len) = parse_chdr(section_data)?;
        if ch_type != ELFCOMPRESS_ZLIB {
            return None;
        }
        (ch_size, &section_data[header_len..])
    };

    let mut decompressed = Vec::with_capacity(size as usize);
    Decompress::new(true)
        .decompress_vec(compressed, &mut decompressed, FlushDecompress::Finish)
        .ok()?;
    Some(decompressed)
}

/// Reads the fixed-size 64-bit `Elf64_Chdr` prefix (`ch_type`, `ch_size`,
/// `ch_addralign`). 32-bit ELF uses the narrower `Elf32_Chdr`; both agree on
/// the first two fields' meaning once widened, which is all we need here.
fn parse_chdr(data: &[u8]) -> Option<(u32, u64, usize)> {
    if data.len() >= 24 {
        let ch_type = u32::from_ne_bytes(data[0..4].try_into().ok()?);
        let ch_size = u64::from_ne_bytes(data[8..16].try_into().ok()?);
        return Some((ch_type, ch_size, 24));
    }
    if data.len() >= 12 {
        let ch_type = u32::from_ne_bytes(data[0..4].try_into().ok()?);
        let ch_size = u32::from_ne_bytes(data[4..8].try_into().ok()?) as u64;
        return Some((ch_type, ch_size, 12));
    }
    None
}
