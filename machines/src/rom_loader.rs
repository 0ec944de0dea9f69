//! ROM images for the Color Computer.
//!
//! A [`RomSet`] is a bag of named files, read from a directory, a single
//! image file or byte slices in tests. A [`RomRegion`] says which files make
//! up one contiguous region and where each lands. Entries may carry a CRC32
//! that is checked on load.

use std::collections::HashMap;
use std::path::Path;

// ---------------------------------------------------------------------------
// CRC-32 (private)
// ---------------------------------------------------------------------------

/// Reflected polynomial 0xEDB88320 lookup table.
const CRC32_TABLE: [u32; 256] = {
    let mut table = [0u32; 256];
    let mut i = 0u32;
    while i < 256 {
        let mut crc = i;
        let mut j = 0;
        while j < 8 {
            if crc & 1 != 0 {
                crc = (crc >> 1) ^ 0xEDB8_8320;
            } else {
                crc >>= 1;
            }
            j += 1;
        }
        table[i as usize] = crc;
        i += 1;
    }
    table
};

fn crc32(data: &[u8]) -> u32 {
    let mut crc: u32 = 0xFFFF_FFFF;
    for &byte in data {
        let index = ((crc ^ byte as u32) & 0xFF) as usize;
        crc = (crc >> 8) ^ CRC32_TABLE[index];
    }
    crc ^ 0xFFFF_FFFF
}

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors raised while reading or assembling ROM images.
#[derive(Debug)]
pub enum RomLoadError {
    /// File not found, permission denied and the like.
    Io(std::io::Error),

    /// A file the region needs is not in the set.
    MissingFile(String),

    /// The file is not one of the sizes the region accepts.
    SizeMismatch {
        file: String,
        expected: usize,
        actual: usize,
    },

    /// The file's CRC32 does not match the entry.
    ChecksumMismatch {
        file: String,
        expected: u32,
        actual: u32,
    },
}

impl std::fmt::Display for RomLoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::MissingFile(name) => write!(f, "missing ROM file: {name}"),
            Self::SizeMismatch {
                file,
                expected,
                actual,
            } => write!(f, "ROM {file}: expected {expected} bytes, got {actual}"),
            Self::ChecksumMismatch {
                file,
                expected,
                actual,
            } => write!(
                f,
                "ROM {file}: CRC32 expected 0x{expected:08X}, got 0x{actual:08X}"
            ),
        }
    }
}

impl std::error::Error for RomLoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for RomLoadError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

// ---------------------------------------------------------------------------
// RomSet
// ---------------------------------------------------------------------------

/// Named ROM files.
#[derive(Debug, Default)]
pub struct RomSet {
    files: HashMap<String, Vec<u8>>,
}

impl RomSet {
    /// Every regular file in `path` (not recursive), keyed by file name.
    pub fn from_directory(path: &Path) -> Result<Self, RomLoadError> {
        let mut files = HashMap::new();
        for entry in std::fs::read_dir(path)? {
            let file_path = entry?.path();
            if file_path.is_file()
                && let Some(name) = file_path.file_name()
            {
                let data = std::fs::read(&file_path)?;
                files.insert(name.to_string_lossy().into_owned(), data);
            }
        }
        Ok(Self { files })
    }

    /// A single image file, stored under `name` whatever it is called on
    /// disk.
    pub fn from_file(path: &Path, name: &str) -> Result<Self, RomLoadError> {
        let mut set = Self::default();
        set.insert(name, std::fs::read(path)?);
        Ok(set)
    }

    /// A directory is read as a set; a file becomes the entry `name`.
    pub fn from_path(path: &Path, name: &str) -> Result<Self, RomLoadError> {
        if path.is_dir() {
            Self::from_directory(path)
        } else if path.is_file() {
            Self::from_file(path, name)
        } else {
            Err(RomLoadError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("ROM path not found: {}", path.display()),
            )))
        }
    }

    /// Build a set from (file name, data) pairs.
    pub fn from_slices(entries: &[(&str, &[u8])]) -> Self {
        let mut set = Self::default();
        for (name, data) in entries {
            set.insert(name, data.to_vec());
        }
        set
    }

    pub fn insert(&mut self, name: &str, data: Vec<u8>) {
        self.files.insert(name.to_string(), data);
    }

    pub fn get(&self, name: &str) -> Option<&[u8]> {
        self.files.get(name).map(|v| v.as_slice())
    }

    pub fn require(&self, name: &str) -> Result<&[u8], RomLoadError> {
        self.get(name)
            .ok_or_else(|| RomLoadError::MissingFile(name.to_string()))
    }

    pub fn file_names(&self) -> Vec<&str> {
        self.files.keys().map(|s| s.as_str()).collect()
    }
}

// ---------------------------------------------------------------------------
// RomEntry / RomRegion
// ---------------------------------------------------------------------------

/// One file within a region.
pub struct RomEntry {
    /// File name in the set.
    pub name: &'static str,
    /// Largest accepted size in bytes.
    pub size: usize,
    /// Where the file lands within the region.
    pub offset: usize,
    /// Smallest accepted size. Shorter images are repeated to fill `size`,
    /// the way a smaller chip is mirrored by partial decoding.
    pub min_size: usize,
    /// Expected CRC32 of a full-size image, if one is known.
    pub crc32: Option<u32>,
    /// A region can still be assembled without this file.
    pub optional: bool,
}

/// A contiguous block of ROM assembled from one or more files.
pub struct RomRegion {
    pub size: usize,
    pub entries: &'static [RomEntry],
}

impl RomRegion {
    /// Assemble the region, checking sizes and checksums.
    pub fn load(&self, rom_set: &RomSet) -> Result<Vec<u8>, RomLoadError> {
        self.load_inner(rom_set, true)
    }

    /// Assemble the region, checking sizes only. For patched or homebrew
    /// images.
    pub fn load_skip_checksums(&self, rom_set: &RomSet) -> Result<Vec<u8>, RomLoadError> {
        self.load_inner(rom_set, false)
    }

    fn load_inner(&self, rom_set: &RomSet, verify_checksums: bool) -> Result<Vec<u8>, RomLoadError> {
        let mut region = vec![0xFFu8; self.size];

        for entry in self.entries {
            debug_assert!(
                entry.offset + entry.size <= self.size,
                "RomEntry '{}' exceeds region bounds",
                entry.name,
            );

            let data = match rom_set.get(entry.name) {
                Some(data) => data,
                None if entry.optional => continue,
                None => return Err(RomLoadError::MissingFile(entry.name.to_string())),
            };

            if data.len() < entry.min_size.max(1) || data.len() > entry.size {
                return Err(RomLoadError::SizeMismatch {
                    file: entry.name.to_string(),
                    expected: entry.size,
                    actual: data.len(),
                });
            }

            if verify_checksums
                && data.len() == entry.size
                && let Some(expected_crc) = entry.crc32
            {
                let actual_crc = crc32(data);
                if actual_crc != expected_crc {
                    return Err(RomLoadError::ChecksumMismatch {
                        file: entry.name.to_string(),
                        expected: expected_crc,
                        actual: actual_crc,
                    });
                }
            }

            let target = &mut region[entry.offset..entry.offset + entry.size];
            for chunk in target.chunks_mut(data.len()) {
                chunk.copy_from_slice(&data[..chunk.len()]);
            }
        }

        Ok(region)
    }
}

// ---------------------------------------------------------------------------
// Color Computer 3
// ---------------------------------------------------------------------------

/// Name the internal image is stored under when loaded from a single file.
pub const COCO3_ROM_NAME: &str = "coco3.rom";

/// Name of the optional cartridge image.
pub const CARTRIDGE_ROM_NAME: &str = "cart.rom";

/// Internal ROM: Extended Color BASIC and Super Extended BASIC, seen at
/// $8000-$FEFF. Images down to 8 KB are accepted and mirrored.
pub static COCO3_ROM: RomRegion = RomRegion {
    size: 0x8000,
    entries: &[RomEntry {
        name: COCO3_ROM_NAME,
        size: 0x8000,
        offset: 0,
        min_size: 0x2000,
        crc32: None,
        optional: false,
    }],
};

/// Cartridge port, $C000-$FEFF when fitted.
pub static CARTRIDGE_ROM: RomRegion = RomRegion {
    size: 0x4000,
    entries: &[RomEntry {
        name: CARTRIDGE_ROM_NAME,
        size: 0x4000,
        offset: 0,
        min_size: 0x800,
        crc32: None,
        optional: true,
    }],
};

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
