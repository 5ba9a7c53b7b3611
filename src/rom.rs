use crate::emulator::machine::LoadError;
use log::warn;
use std::{fs::File, io::Read, path::Path};

pub const ROM_EXTENSIONS: [&str; 3] = ["z64", "n64", "v64"];

/// Raw contents of a cartridge dump. The bytes are taken as they are; no
/// header, byte order or checksum is looked at.
#[derive(Clone, Debug, PartialEq)]
pub struct RomImage {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl RomImage {
    pub fn new(name: &str, bytes: Vec<u8>) -> RomImage {
        RomImage {
            name: name.to_string(),
            bytes,
        }
    }

    pub fn read(path: &Path) -> Result<RomImage, LoadError> {
        if !has_rom_extension(path) {
            warn!(
                "{} does not have a known ROM extension ({}), loading anyway",
                path.display(),
                ROM_EXTENSIONS.join(", ")
            );
        }
        let mut file = File::open(path)?;
        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes)?;
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(RomImage { name, bytes })
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

pub fn has_rom_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            ROM_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
        .unwrap_or(false)
}
