//! APK (zip) iteration over `classes.dex`, `classes2.dex`, … (spec.md §6).
//!
//! Grounded in `nova-archive::Archive::read`'s pattern of opening a
//! `zip::ZipArchive` and treating `ZipError::FileNotFound` as "absent" rather
//! than an error.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use zip::ZipArchive;

use crate::error::{Error, Result};

/// Read every `classes.dex`, `classes2.dex`, `classes3.dex`, … entry from
/// `apk_path` in order, stopping at the first missing index (spec.md §6).
pub fn read_dex_entries(apk_path: impl AsRef<Path>) -> Result<Vec<(String, Vec<u8>)>> {
    let file = File::open(apk_path)?;
    let mut archive = ZipArchive::new(file)?;
    read_dex_entries_from(&mut archive)
}

fn read_dex_entries_from<R: Read + std::io::Seek>(archive: &mut ZipArchive<R>) -> Result<Vec<(String, Vec<u8>)>> {
    let mut out = Vec::new();
    let mut index = 1_u32;
    loop {
        let name = if index == 1 {
            "classes.dex".to_string()
        } else {
            format!("classes{index}.dex")
        };
        match archive.by_name(&name) {
            Ok(mut entry) => {
                let mut buf = Vec::new();
                entry.read_to_end(&mut buf)?;
                out.push((name, buf));
            }
            Err(zip::result::ZipError::FileNotFound) => break,
            Err(err) => return Err(Error::Zip(err)),
        }
        index += 1;
    }

    if out.is_empty() {
        return Err(Error::NoDexEntries);
    }
    Ok(out)
}
