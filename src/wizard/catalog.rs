use super::{
    actions::{ActionBinding, KnownFolder},
    Catalog, Step,
};
use crate::{config::SetupConfig, github::AssetDescriptor};
use std::collections::BTreeMap;

const MPV_DOWNLOAD_URL: &str =
    "https://sourceforge.net/projects/mpv-player-windows/files/latest/download";

const STREAMLINK_ARGS: &str = "--twitch-proxy-playlist=https://lb-na.cdn-perfprod.com,https://eu.luminous.dev --twitch-proxy-playlist-fallback";

const MPV_CONF: &str = r#"# --- High-Quality Preset ---
# Use the built-in high-quality profile as a base
profile=high-quality

# --- Upscaling ---
# Use a high-quality, sharp upscaler. Good for 720p/1080p streams on a 1440p+ monitor.
scale=ewa_lanczossharp
cscale=ewa_lanczossharp

# --- Debanding / Artifact Reduction ---
# This is the key setting to reduce "blockiness" and color banding.
deband=yes

# --- Hardware Decoding ---
# Use D3D11 hardware decoding for best performance on Windows
hwdec=d3D11va
gpu-api=d3D11
"#;

pub fn default_assets() -> BTreeMap<String, AssetDescriptor> {
    BTreeMap::from([
        (
            "mpv".to_owned(),
            AssetDescriptor::direct("shinchiro/mpv-winbuild-cmake", MPV_DOWNLOAD_URL),
        ),
        (
            "streamlink".to_owned(),
            AssetDescriptor::pattern("streamlink/windows-builds", "streamlink-*-x86_64.exe"),
        ),
        (
            "chatterino".to_owned(),
            AssetDescriptor::pattern("Chatterino/chatterino2", "Chatterino*Installer.exe"),
        ),
        (
            "plugin".to_owned(),
            AssetDescriptor::pattern("2bc4/streamlink-ttvlol", "twitch.py"),
        ),
    ])
}

pub fn default_steps() -> Vec<Step> {
    vec![
        Step::new(
            "Welcome",
            "This wizard installs the applications StreamNook relies on: the mpv \
             player, Streamlink, Chatterino and the Streamlink Twitch plugin.\n\
             Downloads are saved to your download folder. Run each installer once \
             it finishes.",
            &[],
        ),
        Step::new(
            "Install mpv",
            "mpv plays the streams. Download the latest Windows build and extract it \
             to C:\\Program Files\\mpv so that mpv.exe sits at \
             C:\\Program Files\\mpv\\mpv.exe.",
            &["download-mpv"],
        ),
        Step::new(
            "Install Streamlink",
            "Streamlink fetches the stream for the player. Download the installer and \
             keep the default location (C:\\Program Files\\Streamlink).",
            &["download-streamlink"],
        ),
        Step::new(
            "Install Chatterino",
            "Chatterino shows the chat next to the video. Download the installer and \
             keep the default location (C:\\Program Files\\Chatterino).",
            &["download-chatterino"],
        ),
        Step::new(
            "Install the Twitch plugin",
            "The ttvlol plugin routes playlists through ad-free proxies. Download \
             twitch.py and move it into the Streamlink plugin folder, then copy the \
             recommended Streamlink arguments into StreamNook's settings.",
            &["download-plugin", "open-plugins", "copy-streamlink-args"],
        ),
        Step::new(
            "Configure mpv",
            "Write a high quality mpv.conf into the mpv configuration folder. An \
             existing file is left untouched.",
            &["write-mpv-conf", "open-mpv-config"],
        ),
        Step::new(
            "Finished",
            "Everything is in place. Start StreamNook and pick a channel.",
            &[],
        ),
    ]
}

pub fn default_bindings() -> BTreeMap<String, ActionBinding> {
    let download = |asset: &str, label: &str| ActionBinding::Download {
        label: label.to_owned(),
        asset: asset.to_owned(),
    };

    BTreeMap::from([
        ("download-mpv".to_owned(), download("mpv", "Download mpv")),
        (
            "download-streamlink".to_owned(),
            download("streamlink", "Download Streamlink"),
        ),
        (
            "download-chatterino".to_owned(),
            download("chatterino", "Download Chatterino"),
        ),
        (
            "download-plugin".to_owned(),
            download("plugin", "Download the Twitch plugin"),
        ),
        (
            "open-plugins".to_owned(),
            ActionBinding::OpenFolder {
                label: "Open the Streamlink plugin folder".to_owned(),
                folder: KnownFolder::StreamlinkPlugins,
            },
        ),
        (
            "copy-streamlink-args".to_owned(),
            ActionBinding::CopyText {
                label: "Copy the Streamlink arguments".to_owned(),
                text: STREAMLINK_ARGS.to_owned(),
            },
        ),
        (
            "write-mpv-conf".to_owned(),
            ActionBinding::WriteFile {
                label: "Write mpv.conf".to_owned(),
                folder: KnownFolder::MpvConfig,
                file_name: "mpv.conf".to_owned(),
                contents: MPV_CONF.to_owned(),
            },
        ),
        (
            "open-mpv-config".to_owned(),
            ActionBinding::OpenFolder {
                label: "Open the mpv configuration folder".to_owned(),
                folder: KnownFolder::MpvConfig,
            },
        ),
        (
            "open-downloads".to_owned(),
            ActionBinding::OpenFolder {
                label: "Open the download folder".to_owned(),
                folder: KnownFolder::Downloads,
            },
        ),
    ])
}

/// Steps from the config replace the built-in sequence; bindings are fixed.
pub fn catalog(config: &SetupConfig) -> Catalog {
    let steps = config.steps.clone().unwrap_or_else(default_steps);

    Catalog::new(steps, default_bindings())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_bind_every_default_action() {
        let bindings = default_bindings();

        for step in default_steps() {
            for tag in &step.actions {
                assert!(bindings.contains_key(tag), "unbound action {}", tag);
            }
        }
    }

    #[test]
    fn should_download_only_configured_assets() {
        let assets = default_assets();

        for binding in default_bindings().values() {
            if let ActionBinding::Download { asset, .. } = binding {
                assert!(assets.contains_key(asset), "unknown asset {}", asset);
            }
        }
    }

    #[test]
    fn should_end_with_finish_step() {
        let catalog = catalog(&SetupConfig::default());
        let steps = &catalog.steps;

        assert_eq!(steps.len(), 7);
        assert_eq!(steps[0].title, "Welcome");
        assert!(steps[steps.len() - 1].actions.is_empty());
    }

    #[test]
    fn should_prefer_configured_steps() {
        let config = SetupConfig {
            steps: Some(vec![Step::new("Only", "One step", &["open-downloads"])]),
            ..SetupConfig::default()
        };

        let catalog = catalog(&config);

        assert_eq!(catalog.steps.len(), 1);
        assert_eq!(catalog.start().map(|state| state.total()), Some(1));
    }

    #[test]
    fn should_ship_high_quality_mpv_preset() {
        let Some(ActionBinding::WriteFile { contents, .. }) = default_bindings().remove("write-mpv-conf")
        else {
            panic!("write-mpv-conf is not a file binding");
        };

        assert!(contents.contains("profile=high-quality"));
        assert!(contents.contains("deband=yes"));
    }
}
