//! ELF lookup inside Solana program accounts

use goblin::elf::{Elf, header::{EM_BPF, ET_DYN, ET_EXEC}};
use log::{debug, info, warn};

use crate::errors::{InspectorError, InspectorResult};

const ELF_MAGIC: &[u8; 4] = b"\x7FELF";

/// Size of the upgradeable loader's programdata header:
/// 4-byte state tag, 8-byte slot, 1-byte option tag, 32-byte authority
pub const PROGRAMDATA_HEADER_LEN: usize = 45;

/// Code section located inside account data
#[derive(Debug, Clone, Copy)]
pub struct TextSection<'a> {
    /// Virtual address of the section
    pub address: u64,
    /// Offset of the section within the account buffer
    pub file_offset: usize,
    /// Section bytes
    pub data: &'a [u8],
}

/// Check whether a buffer starts with the ELF magic
pub fn is_elf(data: &[u8]) -> bool {
    data.starts_with(ELF_MAGIC)
}

/// Find the start of an ELF image in account data
pub fn find_elf_start(data: &[u8]) -> InspectorResult<usize> {
    // Programdata header first, then the legacy 8-byte prefix, then a bare image
    for &offset in &[PROGRAMDATA_HEADER_LEN, 8, 0] {
        if data.len() >= offset + ELF_MAGIC.len() && is_elf(&data[offset..]) {
            debug!("Found ELF header at offset {}", offset);
            return Ok(offset);
        }
    }

    if let Some(offset) = data.windows(ELF_MAGIC.len()).position(|w| w == ELF_MAGIC) {
        info!("Found ELF header at offset {} by scanning", offset);
        return Ok(offset);
    }

    Err(InspectorError::Elf("No ELF header found in account data".to_string()))
}

/// Locate the `.text` section of the program image in account data
pub fn text_section(data: &[u8]) -> InspectorResult<TextSection<'_>> {
    let start = find_elf_start(data)?;
    let image = &data[start..];

    let elf = Elf::parse(image)
        .map_err(|e| InspectorError::Elf(format!("Failed to parse ELF file: {}", e)))?;

    if elf.header.e_machine != EM_BPF {
        warn!("ELF file is not a BPF program (machine type: {})", elf.header.e_machine);
    }
    if elf.header.e_type != ET_EXEC && elf.header.e_type != ET_DYN {
        warn!("ELF file is not an executable or shared object (type: {})", elf.header.e_type);
    }

    let header = elf
        .section_headers
        .iter()
        .find(|header| elf.shdr_strtab.get_at(header.sh_name) == Some(".text"))
        .ok_or_else(|| InspectorError::Elf("Failed to find .text section".to_string()))?;

    let offset = header.sh_offset as usize;
    let size = header.sh_size as usize;
    let end = offset
        .checked_add(size)
        .filter(|end| *end <= image.len())
        .ok_or_else(|| InspectorError::Elf(format!(
            ".text section ({} bytes at {:#x}) extends past the end of the image",
            size, offset
        )))?;

    debug!(".text section: {} bytes at address {:#x}", size, header.sh_addr);

    Ok(TextSection {
        address: header.sh_addr,
        file_offset: start + offset,
        data: &image[offset..end],
    })
}
