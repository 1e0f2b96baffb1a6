// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2026.

//! Flash view of an application image
//!
//! Raw binaries are used as is. ELF files are flattened from their file-backed
//! `PT_LOAD` segments by physical address, with gaps filled with 0x00.

use anyhow::{anyhow, bail, Context, Result};
use goblin::elf::{program_header::PT_LOAD, Elf};

const ELF_MAGIC: &[u8; 4] = b"\x7fELF";

/// Refuse to produce images larger than any STM32L4 flash
const MAX_IMAGE_LEN: u64 = 2 * 1024 * 1024;

/// A loadable chunk at a physical address
#[derive(Debug, Clone, Copy)]
pub struct Segment<'a> {
    pub paddr: u64,
    pub data: &'a [u8],
}

/// Flattened image and the physical address of its first byte
#[derive(Debug)]
pub struct FlatImage {
    pub base: Option<u64>,
    pub bytes: Vec<u8>,
}

pub fn load(bytes: &[u8]) -> Result<FlatImage> {
    if bytes.len() >= 4 && &bytes[..4] == ELF_MAGIC {
        let elf = Elf::parse(bytes).context("parse ELF")?;
        let segments = elf_segments(&elf, bytes)?;
        flatten(&segments)
    } else {
        Ok(FlatImage {
            base: None,
            bytes: bytes.to_vec(),
        })
    }
}

fn elf_segments<'a>(elf: &Elf<'_>, bytes: &'a [u8]) -> Result<Vec<Segment<'a>>> {
    let mut segments = Vec::new();
    for ph in elf.program_headers.iter().filter(|ph| ph.p_type == PT_LOAD && ph.p_filesz > 0) {
        let start = ph.p_offset as usize;
        let end = start
            .checked_add(ph.p_filesz as usize)
            .ok_or_else(|| anyhow!("overflow in PT_LOAD size"))?;
        let data = bytes
            .get(start..end)
            .ok_or_else(|| anyhow!("PT_LOAD at 0x{:08x} extends beyond file", ph.p_paddr))?;
        segments.push(Segment {
            paddr: ph.p_paddr,
            data,
        });
    }
    if segments.is_empty() {
        bail!("ELF has no file-backed PT_LOAD segments");
    }
    Ok(segments)
}

pub fn flatten(segments: &[Segment<'_>]) -> Result<FlatImage> {
    let mut sorted = segments.to_vec();
    sorted.sort_by_key(|s| s.paddr);

    let Some(first) = sorted.first() else {
        return Ok(FlatImage {
            base: None,
            bytes: Vec::new(),
        });
    };
    let base = first.paddr;

    let mut bytes = Vec::new();
    for seg in &sorted {
        let offset = seg.paddr - base;
        if offset < bytes.len() as u64 {
            bail!("PT_LOAD at 0x{:08x} overlaps the previous segment", seg.paddr);
        }
        let end = offset + seg.data.len() as u64;
        if end > MAX_IMAGE_LEN {
            bail!(
                "image spans 0x{base:08x}..0x{:08x}, larger than {MAX_IMAGE_LEN} bytes",
                base + end
            );
        }
        bytes.resize(offset as usize, 0x00);
        bytes.extend_from_slice(seg.data);
    }

    Ok(FlatImage {
        base: Some(base),
        bytes,
    })
}

impl FlatImage {
    /// ELF base that differs from where the bootloader expects the image
    pub fn misplaced(&self, app_start: u32) -> Option<u64> {
        self.base.filter(|&base| base != u64::from(app_start))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_binary_passes_through() {
        let raw = [0x00, 0x80, 0x01, 0x20, 0xC1, 0x11, 0x01, 0x08];
        let flat = load(&raw).unwrap();
        assert_eq!(flat.base, None);
        assert_eq!(flat.bytes, raw);
    }

    #[test]
    fn segments_are_sorted_and_gaps_zero_filled() {
        let text = [1u8, 2, 3, 4];
        let data = [9u8, 9];
        let flat = flatten(&[
            Segment {
                paddr: 0x0801_1008,
                data: &data,
            },
            Segment {
                paddr: 0x0801_1000,
                data: &text,
            },
        ])
        .unwrap();
        assert_eq!(flat.base, Some(0x0801_1000));
        assert_eq!(flat.bytes, [1, 2, 3, 4, 0, 0, 0, 0, 9, 9]);
    }

    #[test]
    fn overlapping_segments_are_rejected() {
        let a = [0u8; 8];
        let b = [0u8; 4];
        let res = flatten(&[
            Segment {
                paddr: 0x1000,
                data: &a,
            },
            Segment {
                paddr: 0x1004,
                data: &b,
            },
        ]);
        assert!(res.is_err());
    }

    #[test]
    fn segments_far_apart_are_rejected() {
        // Initialised data placed at its RAM address instead of its load address
        let a = [0u8; 4];
        let res = flatten(&[
            Segment {
                paddr: 0x0801_1000,
                data: &a,
            },
            Segment {
                paddr: 0x2000_0000,
                data: &a,
            },
        ]);
        assert!(res.is_err());
    }

    #[test]
    fn truncated_elf_is_an_error() {
        let mut bytes = Vec::from(&ELF_MAGIC[..]);
        bytes.extend_from_slice(&[1, 1, 1]);
        assert!(load(&bytes).is_err());
    }

    /// Little-endian ARM ELF32 executable with the given
    /// `(p_paddr, p_vaddr, file bytes, p_memsz)` loadable segments
    fn elf32(segments: &[(u32, u32, &[u8], u32)]) -> Vec<u8> {
        const EHDR: usize = 52;
        const PHDR: usize = 32;
        let mut out = Vec::new();
        out.extend_from_slice(&[0x7f, b'E', b'L', b'F', 1, 1, 1, 0, 0, 0, 0, 0, 0, 0, 0, 0]);
        out.extend_from_slice(&2u16.to_le_bytes()); // ET_EXEC
        out.extend_from_slice(&40u16.to_le_bytes()); // EM_ARM
        out.extend_from_slice(&1u32.to_le_bytes());
        out.extend_from_slice(&0x0801_1001u32.to_le_bytes());
        out.extend_from_slice(&(EHDR as u32).to_le_bytes());
        out.extend_from_slice(&0u32.to_le_bytes());
        out.extend_from_slice(&0x0500_0000u32.to_le_bytes());
        out.extend_from_slice(&(EHDR as u16).to_le_bytes());
        out.extend_from_slice(&(PHDR as u16).to_le_bytes());
        out.extend_from_slice(&(segments.len() as u16).to_le_bytes());
        out.extend_from_slice(&40u16.to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes());

        let mut offset = EHDR + PHDR * segments.len();
        for &(paddr, vaddr, data, memsz) in segments {
            for word in [
                PT_LOAD,
                offset as u32,
                vaddr,
                paddr,
                data.len() as u32,
                memsz,
                5,
                4,
            ] {
                out.extend_from_slice(&word.to_le_bytes());
            }
            offset += data.len();
        }
        for &(_, _, data, _) in segments {
            out.extend_from_slice(data);
        }
        out
    }

    #[test]
    fn elf_is_flattened_by_load_address() {
        let text = [0x00u8, 0x80, 0x01, 0x20, 0xC1, 0x11, 0x01, 0x08];
        let data = [0xD0u8, 0xD1, 0xD2, 0xD3];
        let elf = elf32(&[
            (0x0801_1000, 0x0801_1000, &text[..], 8),
            // .data runs from RAM but is loaded from flash after a gap
            (0x0801_1010, 0x2000_0000, &data[..], 4),
            // .bss has nothing in the file
            (0x2000_0004, 0x2000_0004, &[], 0x100),
        ]);

        let flat = load(&elf).unwrap();
        assert_eq!(flat.base, Some(0x0801_1000));
        let mut expected = text.to_vec();
        expected.extend_from_slice(&[0; 8]);
        expected.extend_from_slice(&data);
        assert_eq!(flat.bytes, expected);
        assert_eq!(flat.misplaced(0x0801_1000), None);
    }

    #[test]
    fn elf_linked_elsewhere_is_reported() {
        let text = [0xAAu8; 8];
        let flat = load(&elf32(&[(0x0800_0000, 0x0800_0000, &text[..], 8)])).unwrap();
        assert_eq!(flat.misplaced(0x0801_1000), Some(0x0800_0000));

        let raw = load(&text).unwrap();
        assert_eq!(raw.misplaced(0x0801_1000), None);
    }

    #[test]
    fn elf_without_file_backed_segments_is_an_error() {
        let elf = elf32(&[(0x2000_0000, 0x2000_0000, &[], 0x100)]);
        assert!(load(&elf).is_err());
    }
}
