use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use std::{
    fmt::Display,
    fs::File,
    io::{self, Read},
    path::Path,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Checksum {
    value: String,
}

impl Checksum {
    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn create(mut reader: impl Read) -> Result<Self> {
        let mut hasher = Sha256::new();
        let _ = io::copy(&mut reader, &mut hasher)?;
        let hash = hasher.finalize();

        let encoded = hex::encode(hash);

        Ok(Checksum { value: encoded })
    }

    pub fn of_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("Cannot open {} for hashing", path.display()))?;

        Checksum::create(file)
    }
}

impl Display for Checksum {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "sha256:{}", self.value())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};
    use tempdir::TempDir;

    #[test]
    fn should_create_checksum() -> Result<(), Box<dyn std::error::Error>> {
        let dir = TempDir::new("checksum")?;

        let file_path = dir.path().join("test.txt");
        File::create(&file_path)?.write_all(b"Hello, world!")?;

        let checksum = Checksum::of_file(&file_path)?;

        assert_eq!(
            checksum.value(),
            "315f5bdb76d078c43b8ac0064e4a0164612b1fce77c869345bfc94c75894edd3"
        );

        dir.close()?;
        Ok(())
    }

    #[test]
    fn should_create_checksum_from_reader() -> Result<()> {
        let checksum = Checksum::create(Cursor::new(b"Hello, world!"))?;

        assert_eq!(
            checksum.to_string(),
            "sha256:315f5bdb76d078c43b8ac0064e4a0164612b1fce77c869345bfc94c75894edd3"
        );
        Ok(())
    }

    #[test]
    fn should_fail_for_missing_file() {
        assert!(Checksum::of_file("does/not/exist.bin").is_err());
    }
}
