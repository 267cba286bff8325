use crate::{
    build::BuildParameters,
    github::AssetDescriptor,
    wizard::{catalog, Step},
};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, path::Path, path::PathBuf};

const DEFAULT_CONFIG_FILE_NAME: &str = "nooksmith.yaml";
const DEFAULT_GITHUB_URL: &str = "https://github.com";
const DEFAULT_DIST_DIR: &str = "dist";

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub build: BuildConfig,
    #[serde(default)]
    pub setup: SetupConfig,
}

impl Config {
    /// Reads the given file, or `nooksmith.yaml` from the working directory
    /// when present. Without either the built-in defaults apply.
    pub async fn load(path: Option<&Path>) -> Result<Config> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => {
                let default = PathBuf::from(DEFAULT_CONFIG_FILE_NAME);
                if !default.is_file() {
                    log::debug!("no {} found, using defaults", DEFAULT_CONFIG_FILE_NAME);
                    return Ok(Config::default());
                }
                default
            }
        };

        let config_string = tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("Cannot read config file {}", path.display()))?;

        Config::parse(&config_string)
    }

    pub fn parse(config_string: &str) -> Result<Config> {
        let config = serde_yaml::from_str::<Config>(config_string)?;

        Ok(config)
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BuildConfig {
    #[serde(flatten)]
    pub parameters: BuildParameters,
    #[serde(default = "BuildConfig::default_hidden_imports")]
    pub hidden_imports: Vec<String>,
    #[serde(default = "BuildConfig::default_collect_submodules")]
    pub collect_submodules: Vec<String>,
    pub pyinstaller: Option<PathBuf>,
    pub upx_dir: Option<PathBuf>,
    #[serde(default = "BuildConfig::default_dist_dir")]
    pub dist_dir: PathBuf,
}

impl BuildConfig {
    fn default_hidden_imports() -> Vec<String> {
        vec!["shiboken6".to_owned(), "psutil".to_owned()]
    }

    fn default_collect_submodules() -> Vec<String> {
        vec!["PySide6.QtSvg".to_owned()]
    }

    fn default_dist_dir() -> PathBuf {
        PathBuf::from(DEFAULT_DIST_DIR)
    }

    /// Command line values win over the config file.
    pub fn with_overrides(mut self, version: Option<String>, upx_dir: Option<PathBuf>) -> Self {
        if let Some(version) = version {
            self.parameters.version = version;
        }
        if upx_dir.is_some() {
            self.upx_dir = upx_dir;
        }
        self
    }
}

impl Default for BuildConfig {
    fn default() -> Self {
        BuildConfig {
            parameters: BuildParameters::default(),
            hidden_imports: BuildConfig::default_hidden_imports(),
            collect_submodules: BuildConfig::default_collect_submodules(),
            pyinstaller: None,
            upx_dir: None,
            dist_dir: BuildConfig::default_dist_dir(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SetupConfig {
    #[serde(default = "SetupConfig::default_github_url")]
    pub github_url: String,
    pub download_dir: Option<PathBuf>,
    #[serde(default = "catalog::default_assets")]
    pub assets: BTreeMap<String, AssetDescriptor>,
    pub steps: Option<Vec<Step>>,
}

impl SetupConfig {
    fn default_github_url() -> String {
        DEFAULT_GITHUB_URL.to_owned()
    }
}

impl Default for SetupConfig {
    fn default() -> Self {
        SetupConfig {
            github_url: SetupConfig::default_github_url(),
            download_dir: None,
            assets: catalog::default_assets(),
            steps: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        build::{descriptor, tests::parameters_in},
        github::AssetMatch,
    };
    use tempdir::TempDir;

    #[test]
    fn should_fill_defaults_for_empty_config() -> Result<()> {
        let config = Config::parse("{}")?;

        assert_eq!(config.build.parameters.project, "StreamNook");
        assert_eq!(config.build.dist_dir, PathBuf::from("dist"));
        assert_eq!(config.setup.github_url, "https://github.com");
        assert!(config.setup.assets.contains_key("chatterino"));
        assert!(config.setup.steps.is_none());
        Ok(())
    }

    #[test]
    fn should_parse_partial_build_section() -> Result<()> {
        let yaml = r#"
build:
  project: Demo
  executable: demo
  version: 0.4.2
  entry: app.py
  icon: app.ico
  data:
    - source: assets
      destination: assets
  upx_dir: C:/tools/upx
"#;
        let config = Config::parse(yaml)?;
        let params = &config.build.parameters;

        assert_eq!(params.project, "Demo");
        assert_eq!(params.executable, "demo");
        assert_eq!(params.version, "0.4.2");
        assert_eq!(params.entry, PathBuf::from("app.py"));
        assert_eq!(params.data.len(), 1);
        assert_eq!(config.build.upx_dir, Some(PathBuf::from("C:/tools/upx")));
        assert_eq!(config.build.hidden_imports, vec!["shiboken6", "psutil"]);
        Ok(())
    }

    #[test]
    fn should_parse_asset_descriptors() -> Result<()> {
        let yaml = r#"
setup:
  github_url: http://localhost:1234
  assets:
    player:
      repo: owner/player
      match:
        direct: https://example.com/player.7z
    chat:
      repo: owner/chat
      match:
        pattern: "Chat*.exe"
"#;
        let config = Config::parse(yaml)?;

        assert_eq!(config.setup.github_url, "http://localhost:1234");
        assert_eq!(config.setup.assets.len(), 2);
        assert_eq!(
            config.setup.assets["player"].asset_match,
            AssetMatch::Direct("https://example.com/player.7z".to_owned())
        );
        assert!(matches!(
            config.setup.assets["chat"].asset_match,
            AssetMatch::Pattern(ref p) if p == "Chat*.exe"
        ));
        Ok(())
    }

    #[test]
    fn should_keep_config_values_without_overrides() -> Result<()> {
        let config = Config::parse("build:\n  version: 0.4.2\n  upx_dir: upx\n")?;

        let build = config.build.with_overrides(None, None);

        assert_eq!(build.parameters.version, "0.4.2");
        assert_eq!(build.upx_dir, Some(PathBuf::from("upx")));
        Ok(())
    }

    #[test]
    fn should_embed_overridden_version_in_descriptor() -> Result<()> {
        let dir = TempDir::new("overrides")?;
        let mut config = Config::parse("build:\n  version: 9.9.9\n")?;
        config.build.parameters = BuildParameters {
            version: "9.9.9".to_owned(),
            ..parameters_in(dir.path())
        };

        let build = config
            .build
            .with_overrides(Some("2.3.1".to_owned()), Some(PathBuf::from("tools/upx")));
        let version = build.parameters.validate()?;
        let path = descriptor::write(&build.parameters, &version, dir.path())?;

        assert_eq!(build.upx_dir, Some(PathBuf::from("tools/upx")));
        let descriptor = std::fs::read_to_string(path)?;
        assert!(descriptor.contains("filevers=(2, 3, 1, 0)"));
        assert!(descriptor.contains("prodvers=(2, 3, 1, 0)"));
        assert!(!descriptor.contains("9, 9, 9"));
        Ok(())
    }

    #[tokio::test]
    async fn should_fail_for_explicit_missing_file() {
        let result = Config::load(Some(Path::new("missing/nooksmith.yaml"))).await;

        assert!(result.is_err());
    }
}
