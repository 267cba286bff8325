pub mod descriptor;
pub mod form;
pub mod interrupt;
pub mod pyinstaller;
mod template;
pub mod verify;
pub mod version;

use self::{
    interrupt::Interrupts,
    pyinstaller::{relay, PyInstaller},
    verify::Artifact,
    version::{VersionError, VersionTuple},
};
use crate::config::BuildConfig;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

const DEFAULT_PROJECT: &str = "StreamNook";
const DEFAULT_ORGANIZATION: &str = "StreamNook";
const DEFAULT_DESCRIPTION: &str = "Twitch stream viewer with embedded chat";
const DEFAULT_REPO_URL: &str = "https://github.com/winters27/StreamNook";
const DEFAULT_VERSION: &str = "1.0.0";
const DEFAULT_ENTRY: &str = "main.py";
const DEFAULT_ICON: &str = "assets/icon.ico";
const DEFAULT_ASSETS_DIR: &str = "assets";

/// Everything the packaging tool needs to know about the application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildParameters {
    pub project: String,
    pub organization: String,
    pub description: String,
    pub repo_url: String,
    pub executable: String,
    pub version: String,
    pub entry: PathBuf,
    pub icon: PathBuf,
    pub data: Vec<DataMapping>,
}

impl Default for BuildParameters {
    fn default() -> Self {
        BuildParameters {
            project: DEFAULT_PROJECT.to_owned(),
            organization: DEFAULT_ORGANIZATION.to_owned(),
            description: DEFAULT_DESCRIPTION.to_owned(),
            repo_url: DEFAULT_REPO_URL.to_owned(),
            executable: DEFAULT_PROJECT.to_owned(),
            version: DEFAULT_VERSION.to_owned(),
            entry: PathBuf::from(DEFAULT_ENTRY),
            icon: PathBuf::from(DEFAULT_ICON),
            data: vec![DataMapping::new(DEFAULT_ASSETS_DIR, DEFAULT_ASSETS_DIR)],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataMapping {
    pub source: PathBuf,
    pub destination: String,
}

impl DataMapping {
    pub fn new(source: impl Into<PathBuf>, destination: impl Into<String>) -> Self {
        DataMapping {
            source: source.into(),
            destination: destination.into(),
        }
    }

    /// Parses the `source=destination` form used by the interactive form.
    pub fn parse(value: &str) -> Option<Self> {
        let (source, destination) = value.split_once('=')?;
        let (source, destination) = (source.trim(), destination.trim());

        if source.is_empty() || destination.is_empty() {
            return None;
        }

        Some(DataMapping::new(source, destination))
    }
}

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("required field '{0}' is empty")]
    MissingField(&'static str),
    #[error("{what} not found: {}", path.display())]
    NotFound { what: &'static str, path: PathBuf },
    #[error(transparent)]
    InvalidVersion(#[from] VersionError),
    #[error("PyInstaller executable not found, install it with `pip install pyinstaller`")]
    ToolNotFound,
    #[error("PyInstaller failed with exit code {}", code.map_or("unknown".to_owned(), |c| c.to_string()))]
    ToolFailed { code: Option<i32> },
    #[error("cannot run PyInstaller")]
    Spawn(#[source] std::io::Error),
    #[error("build cancelled")]
    Cancelled,
}

impl BuildParameters {
    /// Checks the parameters before anything is written or spawned and
    /// returns the expanded version tuple.
    pub fn validate(&self) -> Result<VersionTuple, BuildError> {
        let required = [
            ("project", self.project.trim().is_empty()),
            ("executable", self.executable.trim().is_empty()),
            ("version", self.version.trim().is_empty()),
            ("entry", self.entry.as_os_str().is_empty()),
            ("icon", self.icon.as_os_str().is_empty()),
        ];

        if let Some((field, _)) = required.iter().find(|(_, empty)| *empty) {
            return Err(BuildError::MissingField(*field));
        }

        check_exists("entry script", &self.entry)?;
        check_exists("icon", &self.icon)?;

        for mapping in &self.data {
            check_exists("data source", &mapping.source)?;
        }

        let version = VersionTuple::parse(&self.version)?;

        Ok(version)
    }
}

#[derive(Debug, Clone, Copy)]
pub enum Execution<'a> {
    /// Wait for the tool, for automation.
    Blocking,
    /// Run the tool as a background task that Ctrl-C cancels.
    Background(&'a Interrupts),
}

/// Validates, writes the version descriptor into `work_dir`, runs PyInstaller
/// and inspects the result. Returns the artifact when it could be found.
pub async fn build(
    params: &BuildParameters,
    config: &BuildConfig,
    work_dir: &Path,
    execution: Execution<'_>,
) -> Result<Option<Artifact>> {
    let version = params.validate()?;
    log::info!("Building {} {}", params.project, version);

    let pyinstaller = PyInstaller::locate(config.pyinstaller.as_deref())?
        .hidden_imports(config.hidden_imports.iter().cloned())
        .collect_submodules(config.collect_submodules.iter().cloned())
        .upx_dir(config.upx_dir.clone())
        .current_dir(work_dir);

    descriptor::write(params, &version, work_dir)?;
    // the tool runs inside work_dir
    let descriptor = Path::new(descriptor::DESCRIPTOR_FILE_NAME);

    match execution {
        Execution::Blocking => pyinstaller.run(params, descriptor).await?,
        Execution::Background(interrupts) => {
            let mut task = pyinstaller.spawn(params, descriptor)?;
            let attached = interrupts.attach(task.cancel.clone());

            while let Some(event) = task.events.recv().await {
                relay(&event);
            }

            drop(attached);
            task.finish().await?;
        }
    }

    let dist_dir = work_dir.join(&config.dist_dir);
    let artifact = tokio::task::spawn_blocking({
        let executable = params.executable.clone();
        move || verify::verify(&dist_dir, &executable, &version)
    })
    .await
    .context("Cannot inspect the build output")?;

    Ok(artifact)
}

fn check_exists(what: &'static str, path: &Path) -> Result<(), BuildError> {
    if path.exists() {
        Ok(())
    } else {
        Err(BuildError::NotFound {
            what,
            path: path.to_path_buf(),
        })
    }
}
