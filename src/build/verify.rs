use super::version::VersionTuple;
use crate::checksum::Checksum;
use std::{
    fs,
    path::{Path, PathBuf},
};

/// `VS_FIXEDFILEINFO.dwSignature`, little endian.
const FIXED_FILE_INFO_SIGNATURE: [u8; 4] = [0xBD, 0x04, 0xEF, 0xFE];

#[derive(Debug)]
pub struct Artifact {
    pub path: PathBuf,
    pub size: u64,
    pub checksum: Option<Checksum>,
    pub file_version: Option<VersionTuple>,
    pub product_version: Option<VersionTuple>,
}

pub fn artifact_path(dist_dir: &Path, executable: &str) -> PathBuf {
    if cfg!(windows) {
        dist_dir.join(format!("{}.exe", executable))
    } else {
        dist_dir.join(executable)
    }
}

/// Inspects the packaged executable. A missing artifact is reported and
/// `None` returned; nothing here fails the build.
pub fn verify(dist_dir: &Path, executable: &str, expected: &VersionTuple) -> Option<Artifact> {
    let path = artifact_path(dist_dir, executable);

    let bytes = match fs::read(&path) {
        Ok(bytes) => bytes,
        Err(err) => {
            log::warn!("Expected output {} is missing: {}", path.display(), err);
            return None;
        }
    };

    let checksum = match Checksum::create(bytes.as_slice()) {
        Ok(checksum) => Some(checksum),
        Err(err) => {
            log::warn!("Cannot hash {}: {}", path.display(), err);
            None
        }
    };

    let (file_version, product_version) = match read_fixed_versions(&bytes) {
        Some((file, product)) => (Some(file), Some(product)),
        None => (None, None),
    };

    let artifact = Artifact {
        path,
        size: bytes.len() as u64,
        checksum,
        file_version,
        product_version,
    };

    report(&artifact, expected);
    Some(artifact)
}

fn report(artifact: &Artifact, expected: &VersionTuple) {
    log::info!(
        "Built {} ({} bytes)",
        artifact.path.display(),
        artifact.size
    );

    if let Some(checksum) = &artifact.checksum {
        log::info!("Checksum {}", checksum);
    }

    match (&artifact.file_version, &artifact.product_version) {
        (Some(file), Some(product)) => {
            log::info!("Embedded file version {}, product version {}", file, product);
            if file != expected {
                log::warn!("Embedded file version {} differs from {}", file, expected);
            }
        }
        _ => log::warn!(
            "No version resource found in {}",
            artifact.path.display()
        ),
    }
}

/// Finds the first `VS_FIXEDFILEINFO` block and returns its file and product
/// versions.
pub fn read_fixed_versions(bytes: &[u8]) -> Option<(VersionTuple, VersionTuple)> {
    let start = bytes
        .windows(FIXED_FILE_INFO_SIGNATURE.len())
        .position(|window| *window == FIXED_FILE_INFO_SIGNATURE)?;

    // signature, struct version, then four version dwords
    let block = bytes.get(start..start + 24)?;
    let dword = |offset: usize| {
        u32::from_le_bytes([
            block[offset],
            block[offset + 1],
            block[offset + 2],
            block[offset + 3],
        ])
    };

    let file = from_dwords(dword(8), dword(12));
    let product = from_dwords(dword(16), dword(20));

    Some((file, product))
}

fn from_dwords(ms: u32, ls: u32) -> VersionTuple {
    VersionTuple::new(
        (ms >> 16) as u16,
        (ms & 0xFFFF) as u16,
        (ls >> 16) as u16,
        (ls & 0xFFFF) as u16,
    )
}
