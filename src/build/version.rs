use semver::Version;
use serde::Serialize;
use std::{fmt::Display, str::FromStr};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum VersionError {
    #[error("version '{0}' must look like major.minor.patch or major.minor.patch.build")]
    Malformed(String),
    #[error("version component '{0}' does not fit in 16 bits")]
    OutOfRange(String),
}

/// Four component version as stored in a Windows version resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VersionTuple {
    pub major: u16,
    pub minor: u16,
    pub patch: u16,
    pub build: u16,
}

impl VersionTuple {
    pub fn new(major: u16, minor: u16, patch: u16, build: u16) -> Self {
        VersionTuple {
            major,
            minor,
            patch,
            build,
        }
    }

    /// Expands `major.minor.patch` with a zero build number and passes
    /// `major.minor.patch.build` through.
    pub fn parse(value: &str) -> Result<Self, VersionError> {
        let value = value.trim();
        let parts: Vec<&str> = value.split('.').collect();

        match parts.as_slice() {
            [major, minor, patch] => {
                let version = Version::parse(value)
                    .map_err(|_| VersionError::Malformed(value.to_owned()))?;

                if !version.pre.is_empty() || !version.build.is_empty() {
                    return Err(VersionError::Malformed(value.to_owned()));
                }

                Ok(VersionTuple::new(
                    component(major, version.major)?,
                    component(minor, version.minor)?,
                    component(patch, version.patch)?,
                    0,
                ))
            }
            [major, minor, patch, build] => Ok(VersionTuple::new(
                numeric(major)?,
                numeric(minor)?,
                numeric(patch)?,
                numeric(build)?,
            )),
            _ => Err(VersionError::Malformed(value.to_owned())),
        }
    }

    pub fn as_array(&self) -> [u16; 4] {
        [self.major, self.minor, self.patch, self.build]
    }
}

fn component(raw: &str, value: u64) -> Result<u16, VersionError> {
    u16::try_from(value).map_err(|_| VersionError::OutOfRange(raw.to_owned()))
}

/// Leading zeros are rejected, matching the three component form.
fn numeric(raw: &str) -> Result<u16, VersionError> {
    let leading_zero = raw.len() > 1 && raw.starts_with('0');

    if raw.is_empty() || leading_zero || !raw.chars().all(|c| c.is_ascii_digit()) {
        return Err(VersionError::Malformed(raw.to_owned()));
    }

    let value = raw
        .parse::<u64>()
        .map_err(|_| VersionError::OutOfRange(raw.to_owned()))?;

    component(raw, value)
}

impl FromStr for VersionTuple {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        VersionTuple::parse(s)
    }
}

impl Display for VersionTuple {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}.{}.{}.{}",
            self.major, self.minor, self.patch, self.build
        )
    }
}
