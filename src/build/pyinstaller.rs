use super::{BuildError, BuildParameters};
use itertools::Itertools;
use std::{
    io,
    path::{Path, PathBuf},
    process::Stdio,
};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    process::{Child, Command},
    sync::mpsc,
    task::JoinHandle,
};
use tokio_stream::{wrappers::LinesStream, StreamExt};
use tokio_util::sync::CancellationToken;

const DEFAULT_PYINSTALLER_BIN_NAME: &str = "pyinstaller";
const EVENT_CHANNEL_CAPACITY: usize = 256;

#[cfg(windows)]
const ADD_DATA_SEPARATOR: &str = ";";
#[cfg(not(windows))]
const ADD_DATA_SEPARATOR: &str = ":";

const STATIC_FLAGS: [&str; 5] = ["--noconfirm", "--clean", "--onefile", "--windowed", "--strip"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildEvent {
    Output(String),
    Finished(Option<i32>),
}

/// A packaging run executing in the background.
///
/// Output lines arrive on `events` until the process exits; `finish` yields
/// the final result. Cancelling the token kills the process.
pub struct BuildTask {
    pub events: mpsc::Receiver<BuildEvent>,
    pub cancel: CancellationToken,
    handle: JoinHandle<Result<(), BuildError>>,
}

impl BuildTask {
    pub async fn finish(self) -> Result<(), BuildError> {
        drop(self.events);

        match self.handle.await {
            Ok(result) => result,
            Err(err) => Err(BuildError::Spawn(io::Error::new(io::ErrorKind::Other, err))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PyInstaller {
    program: PathBuf,
    hidden_imports: Vec<String>,
    collect_submodules: Vec<String>,
    upx_dir: Option<PathBuf>,
    current_dir: Option<PathBuf>,
}

impl PyInstaller {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        PyInstaller {
            program: program.into(),
            hidden_imports: vec![],
            collect_submodules: vec![],
            upx_dir: None,
            current_dir: None,
        }
    }

    /// Uses the configured executable, otherwise looks `pyinstaller` up on PATH.
    pub fn locate(configured: Option<&Path>) -> Result<Self, BuildError> {
        if let Some(path) = configured {
            if !path.exists() {
                return Err(BuildError::NotFound {
                    what: "PyInstaller executable",
                    path: path.to_path_buf(),
                });
            }
            return Ok(PyInstaller::new(path));
        }

        match which::which(DEFAULT_PYINSTALLER_BIN_NAME) {
            Ok(path) => {
                log::debug!("Found PyInstaller at: {}", path.display());
                Ok(PyInstaller::new(path))
            }
            Err(error) => {
                log::debug!("PyInstaller lookup failed: {:?}", error);
                Err(BuildError::ToolNotFound)
            }
        }
    }

    pub fn hidden_imports(mut self, modules: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.hidden_imports = modules.into_iter().map(Into::into).collect();
        self
    }

    pub fn collect_submodules(
        mut self,
        packages: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.collect_submodules = packages.into_iter().map(Into::into).collect();
        self
    }

    pub fn upx_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.upx_dir = dir;
        self
    }

    /// Directory the tool runs in; `dist/` and `build/` land there.
    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }

    pub fn args(&self, params: &BuildParameters, descriptor: &Path) -> Vec<String> {
        let mut args: Vec<String> = STATIC_FLAGS.iter().map(|f| f.to_string()).collect();

        for module in &self.hidden_imports {
            args.push("--hidden-import".to_owned());
            args.push(module.to_owned());
        }

        for package in &self.collect_submodules {
            args.push("--collect-submodules".to_owned());
            args.push(package.to_owned());
        }

        if let Some(upx_dir) = &self.upx_dir {
            args.push("--upx-dir".to_owned());
            args.push(upx_dir.display().to_string());
        }

        for mapping in &params.data {
            args.push("--add-data".to_owned());
            args.push(format!(
                "{}{}{}",
                mapping.source.display(),
                ADD_DATA_SEPARATOR,
                mapping.destination
            ));
        }

        args.extend([
            "--icon".to_owned(),
            params.icon.display().to_string(),
            "--version-file".to_owned(),
            descriptor.display().to_string(),
            "--name".to_owned(),
            params.executable.to_owned(),
            params.entry.display().to_string(),
        ]);

        args
    }

    /// Starts the packaging process as a single background task.
    pub fn spawn(&self, params: &BuildParameters, descriptor: &Path) -> Result<BuildTask, BuildError> {
        let args = self.args(params, descriptor);
        log::info!("Running {} {}", self.program.display(), args.iter().join(" "));

        let mut command = Command::new(&self.program);
        if let Some(dir) = &self.current_dir {
            command.current_dir(dir);
        }

        let child = command
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(BuildError::Spawn)?;

        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(drive(child, tx, cancel.clone()));

        Ok(BuildTask {
            events: rx,
            cancel,
            handle,
        })
    }

    /// Runs the packaging process to completion, relaying its output to the log.
    pub async fn run(&self, params: &BuildParameters, descriptor: &Path) -> Result<(), BuildError> {
        let mut task = self.spawn(params, descriptor)?;

        while let Some(event) = task.events.recv().await {
            relay(&event);
        }

        task.finish().await
    }
}

pub fn relay(event: &BuildEvent) {
    match event {
        BuildEvent::Output(line) => log::info!(target: "pyinstaller", "{}", line),
        BuildEvent::Finished(Some(code)) => log::debug!("PyInstaller exited with code {}", code),
        BuildEvent::Finished(None) => log::debug!("PyInstaller terminated by signal"),
    }
}

async fn drive(
    mut child: Child,
    events: mpsc::Sender<BuildEvent>,
    cancel: CancellationToken,
) -> Result<(), BuildError> {
    let (stdout, stderr) = match (child.stdout.take(), child.stderr.take()) {
        (Some(stdout), Some(stderr)) => (stdout, stderr),
        _ => {
            return Err(BuildError::Spawn(io::Error::new(
                io::ErrorKind::Other,
                "process output was not captured",
            )))
        }
    };

    let mut lines = LinesStream::new(BufReader::new(stdout).lines())
        .merge(LinesStream::new(BufReader::new(stderr).lines()));

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return kill(&mut child).await,
            line = lines.next() => match line {
                Some(Ok(line)) => {
                    // a dropped receiver only means nobody is watching
                    let _ = events.send(BuildEvent::Output(line)).await;
                }
                Some(Err(err)) => log::warn!("Cannot read PyInstaller output: {}", err),
                None => break,
            },
        }
    }

    let status = tokio::select! {
        biased;
        _ = cancel.cancelled() => return kill(&mut child).await,
        status = child.wait() => status.map_err(BuildError::Spawn)?,
    };

    let _ = events.send(BuildEvent::Finished(status.code())).await;

    if status.success() {
        Ok(())
    } else {
        Err(BuildError::ToolFailed {
            code: status.code(),
        })
    }
}

async fn kill(child: &mut Child) -> Result<(), BuildError> {
    log::warn!("Cancelling PyInstaller");
    if let Err(err) = child.kill().await {
        log::warn!("Cannot kill PyInstaller: {}", err);
    }
    Err(BuildError::Cancelled)
}
