use crate::{
    github::{
        self,
        download::{download, Downloaded},
        AssetDescriptor, AssetResolver, ResolvedAsset,
    },
    http::HttpClient,
};
use anyhow::{anyhow, bail, Context, Result};
use std::{
    collections::BTreeMap,
    fmt::Display,
    path::{Path, PathBuf},
    process::{ExitStatus, Stdio},
};
use tokio::{io::AsyncWriteExt, process::Command};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KnownFolder {
    MpvConfig,
    StreamlinkPlugins,
    Downloads,
}

impl KnownFolder {
    pub fn path(&self) -> Result<PathBuf> {
        let path = match self {
            KnownFolder::MpvConfig => dirs::config_dir().map(|dir| dir.join("mpv")),
            KnownFolder::StreamlinkPlugins => {
                dirs::data_dir().map(|dir| dir.join("streamlink").join("plugins"))
            }
            KnownFolder::Downloads => dirs::download_dir().or_else(dirs::home_dir),
        };

        path.ok_or_else(|| anyhow!("Cannot determine the {} folder", self))
    }
}

impl Display for KnownFolder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            KnownFolder::MpvConfig => "mpv configuration",
            KnownFolder::StreamlinkPlugins => "Streamlink plugin",
            KnownFolder::Downloads => "downloads",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionBinding {
    /// Resolve and save an asset from the setup asset table.
    Download { label: String, asset: String },
    OpenFolder { label: String, folder: KnownFolder },
    CopyText { label: String, text: String },
    /// Write a file into a known folder unless it already exists.
    WriteFile {
        label: String,
        folder: KnownFolder,
        file_name: String,
        contents: String,
    },
}

impl ActionBinding {
    pub fn label(&self) -> &str {
        match self {
            ActionBinding::Download { label, .. }
            | ActionBinding::OpenFolder { label, .. }
            | ActionBinding::CopyText { label, .. }
            | ActionBinding::WriteFile { label, .. } => label,
        }
    }
}

#[derive(Debug)]
pub enum Outcome {
    Downloaded(Downloaded),
    OpenedPage(String),
    OpenedFolder(PathBuf),
    Copied,
    Wrote(PathBuf),
    AlreadyExists(PathBuf),
}

impl Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Outcome::Downloaded(downloaded) => write!(
                f,
                "Saved {} ({} bytes, {})",
                downloaded.path.display(),
                downloaded.size,
                downloaded.checksum
            ),
            Outcome::OpenedPage(url) => write!(f, "Opened {} in the browser", url),
            Outcome::OpenedFolder(path) => write!(f, "Opened {}", path.display()),
            Outcome::Copied => write!(f, "Copied to the clipboard"),
            Outcome::Wrote(path) => write!(f, "Wrote {}", path.display()),
            Outcome::AlreadyExists(path) => write!(f, "{} already exists, left untouched", path.display()),
        }
    }
}

/// Operating system helpers the wizard relies on.
pub trait Desktop {
    async fn open(&self, target: &str) -> Result<()>;
    async fn copy(&self, text: &str) -> Result<()>;
}

pub struct SystemDesktop;

impl Desktop for SystemDesktop {
    async fn open(&self, target: &str) -> Result<()> {
        #[cfg(target_os = "windows")]
        let program = "explorer";
        #[cfg(target_os = "macos")]
        let program = "open";
        #[cfg(not(any(target_os = "windows", target_os = "macos")))]
        let program = "xdg-open";

        let status = run(program, &[target], None).await?;

        // explorer reports 1 even when the window opened
        if !status.success() && !cfg!(target_os = "windows") {
            bail!("{} {} exited with {}", program, target, status);
        }
        Ok(())
    }

    async fn copy(&self, text: &str) -> Result<()> {
        let candidates: &[(&str, &[&str])] = if cfg!(target_os = "windows") {
            &[("clip", &[])]
        } else if cfg!(target_os = "macos") {
            &[("pbcopy", &[])]
        } else {
            &[("wl-copy", &[]), ("xclip", &["-selection", "clipboard"])]
        };

        let (program, args) = candidates
            .iter()
            .find(|(program, _)| which::which(program).is_ok())
            .ok_or_else(|| anyhow!("No clipboard tool found"))?;

        let status = run(program, args, Some(text)).await?;
        if !status.success() {
            bail!("{} exited with {}", program, status);
        }
        Ok(())
    }
}

/// Runs `program` to completion, feeding `input` to its stdin when given.
async fn run(program: &str, args: &[&str], input: Option<&str>) -> Result<ExitStatus> {
    let mut child = Command::new(program)
        .args(args)
        .stdin(if input.is_some() { Stdio::piped() } else { Stdio::null() })
        .stdout(Stdio::null())
        .kill_on_drop(true)
        .spawn()
        .with_context(|| format!("Cannot run {}", program))?;

    if let (Some(input), Some(mut stdin)) = (input, child.stdin.take()) {
        stdin.write_all(input.as_bytes()).await?;
        // closing stdin lets the tool finish
        drop(stdin);
    }

    let status = child
        .wait()
        .await
        .with_context(|| format!("Cannot wait for {}", program))?;
    Ok(status)
}

pub struct ActionContext<R, D> {
    resolver: R,
    desktop: D,
    client: HttpClient,
    assets: BTreeMap<String, AssetDescriptor>,
    download_dir: PathBuf,
}

impl<R: AssetResolver, D: Desktop> ActionContext<R, D> {
    pub fn new(
        resolver: R,
        desktop: D,
        assets: BTreeMap<String, AssetDescriptor>,
        download_dir: impl Into<PathBuf>,
    ) -> Self {
        ActionContext {
            resolver,
            desktop,
            client: HttpClient::new(),
            assets,
            download_dir: download_dir.into(),
        }
    }

    pub async fn perform(&self, binding: &ActionBinding) -> Result<Outcome> {
        match binding {
            ActionBinding::Download { asset, .. } => self.download(asset).await,
            ActionBinding::OpenFolder { folder, .. } => {
                let path = folder.path()?;
                tokio::fs::create_dir_all(&path)
                    .await
                    .with_context(|| format!("Cannot create {}", path.display()))?;
                self.desktop.open(&path.display().to_string()).await?;
                Ok(Outcome::OpenedFolder(path))
            }
            ActionBinding::CopyText { text, .. } => {
                self.desktop.copy(text).await?;
                Ok(Outcome::Copied)
            }
            ActionBinding::WriteFile {
                folder,
                file_name,
                contents,
                ..
            } => write_once(&folder.path()?, file_name, contents).await,
        }
    }

    async fn download(&self, key: &str) -> Result<Outcome> {
        let descriptor = self
            .assets
            .get(key)
            .ok_or_else(|| anyhow!("No asset named '{}' is configured", key))?;

        match github::resolve(&self.resolver, descriptor).await {
            ResolvedAsset::Direct(url) => {
                match download(&self.client, &url, &self.download_dir).await {
                    Ok(downloaded) => Ok(Outcome::Downloaded(downloaded)),
                    Err(err) => {
                        log::warn!("{:#}, opening the link in the browser instead", err);
                        self.open_page(url).await
                    }
                }
            }
            ResolvedAsset::ReleasesPage(url) => self.open_page(url).await,
        }
    }

    async fn open_page(&self, url: String) -> Result<Outcome> {
        self.desktop.open(&url).await?;
        Ok(Outcome::OpenedPage(url))
    }
}

async fn write_once(dir: &Path, file_name: &str, contents: &str) -> Result<Outcome> {
    let path = dir.join(file_name);

    if tokio::fs::try_exists(&path).await.unwrap_or(false) {
        return Ok(Outcome::AlreadyExists(path));
    }

    tokio::fs::create_dir_all(dir)
        .await
        .with_context(|| format!("Cannot create {}", dir.display()))?;
    tokio::fs::write(&path, contents)
        .await
        .with_context(|| format!("Cannot write {}", path.display()))?;

    Ok(Outcome::Wrote(path))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use mockito::Server;
    use std::sync::Mutex;
    use tempdir::TempDir;

    #[derive(Default)]
    pub struct RecordingDesktop {
        pub opened: Mutex<Vec<String>>,
        pub copied: Mutex<Vec<String>>,
    }

    impl Desktop for &RecordingDesktop {
        async fn open(&self, target: &str) -> Result<()> {
            self.opened.lock().unwrap().push(target.to_owned());
            Ok(())
        }

        async fn copy(&self, text: &str) -> Result<()> {
            self.copied.lock().unwrap().push(text.to_owned());
            Ok(())
        }
    }

    pub struct StaticResolver(pub ResolvedAsset);

    impl AssetResolver for StaticResolver {
        async fn resolve_asset(&self, _repo: &str, _pattern: &str) -> ResolvedAsset {
            self.0.clone()
        }
    }

    fn assets() -> BTreeMap<String, AssetDescriptor> {
        let mut assets = BTreeMap::new();
        assets.insert("plugin".to_owned(), AssetDescriptor::pattern("owner/plugin", "*.py"));
        assets
    }

    fn download_binding() -> ActionBinding {
        ActionBinding::Download {
            label: "Download plugin".to_owned(),
            asset: "plugin".to_owned(),
        }
    }

    #[tokio::test]
    async fn should_download_resolved_asset() -> Result<()> {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/owner/plugin/releases/download/v1/twitch.py")
            .with_body("plugin")
            .create_async()
            .await;
        let dir = TempDir::new("wizard")?;
        let desktop = RecordingDesktop::default();
        let url = format!("{}/owner/plugin/releases/download/v1/twitch.py", server.url());
        let context = ActionContext::new(
            StaticResolver(ResolvedAsset::Direct(url)),
            &desktop,
            assets(),
            dir.path(),
        );

        let outcome = context.perform(&download_binding()).await?;

        assert!(matches!(outcome, Outcome::Downloaded(ref d) if d.path == dir.path().join("twitch.py")));
        assert!(desktop.opened.lock().unwrap().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn should_open_releases_page_when_unresolved() -> Result<()> {
        let dir = TempDir::new("wizard")?;
        let desktop = RecordingDesktop::default();
        let page = "https://github.com/owner/plugin/releases".to_owned();
        let context = ActionContext::new(
            StaticResolver(ResolvedAsset::ReleasesPage(page.clone())),
            &desktop,
            assets(),
            dir.path(),
        );

        let outcome = context.perform(&download_binding()).await?;

        assert!(matches!(outcome, Outcome::OpenedPage(ref url) if *url == page));
        assert_eq!(*desktop.opened.lock().unwrap(), vec![page]);
        Ok(())
    }

    #[tokio::test]
    async fn should_open_link_when_download_fails() -> Result<()> {
        let mut server = Server::new_async().await;
        let _mock = server.mock("GET", "/gone.py").with_status(500).create_async().await;
        let dir = TempDir::new("wizard")?;
        let desktop = RecordingDesktop::default();
        let url = format!("{}/gone.py", server.url());
        let context = ActionContext::new(
            StaticResolver(ResolvedAsset::Direct(url.clone())),
            &desktop,
            assets(),
            dir.path(),
        );

        let outcome = context.perform(&download_binding()).await?;

        assert!(matches!(outcome, Outcome::OpenedPage(_)));
        assert_eq!(*desktop.opened.lock().unwrap(), vec![url]);
        Ok(())
    }

    #[tokio::test]
    async fn should_fail_for_unknown_asset() -> Result<()> {
        let dir = TempDir::new("wizard")?;
        let desktop = RecordingDesktop::default();
        let context = ActionContext::new(
            StaticResolver(ResolvedAsset::Direct("unused".to_owned())),
            &desktop,
            BTreeMap::new(),
            dir.path(),
        );

        assert!(context.perform(&download_binding()).await.is_err());
        Ok(())
    }

    #[tokio::test]
    async fn should_copy_text() -> Result<()> {
        let dir = TempDir::new("wizard")?;
        let desktop = RecordingDesktop::default();
        let context = ActionContext::new(
            StaticResolver(ResolvedAsset::Direct("unused".to_owned())),
            &desktop,
            assets(),
            dir.path(),
        );
        let binding = ActionBinding::CopyText {
            label: "Copy".to_owned(),
            text: "--twitch-proxy-playlist-fallback".to_owned(),
        };

        let outcome = context.perform(&binding).await?;

        assert!(matches!(outcome, Outcome::Copied));
        assert_eq!(
            *desktop.copied.lock().unwrap(),
            vec!["--twitch-proxy-playlist-fallback".to_owned()]
        );
        Ok(())
    }

    #[tokio::test]
    async fn should_write_file_only_once() -> Result<()> {
        let dir = TempDir::new("wizard")?;
        let target = dir.path().join("mpv");

        let first = write_once(&target, "mpv.conf", "profile=high-quality\n").await?;
        let second = write_once(&target, "mpv.conf", "something else").await?;

        assert!(matches!(first, Outcome::Wrote(_)));
        assert!(matches!(second, Outcome::AlreadyExists(_)));
        assert_eq!(
            std::fs::read_to_string(target.join("mpv.conf"))?,
            "profile=high-quality\n"
        );
        Ok(())
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn should_feed_input_and_wait_for_tool() -> Result<()> {
        let status = run("cat", &[], Some("--twitch-proxy-playlist-fallback")).await?;

        assert!(status.success());
        Ok(())
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn should_report_tool_exit_status() -> Result<()> {
        let status = run("false", &[], None).await?;

        assert_eq!(status.code(), Some(1));
        Ok(())
    }

    #[tokio::test]
    async fn should_fail_for_missing_tool() {
        assert!(run("nooksmith-missing-opener", &["x"], None).await.is_err());
    }

    #[test]
    fn should_expose_binding_labels() {
        assert_eq!(download_binding().label(), "Download plugin");
    }
}
