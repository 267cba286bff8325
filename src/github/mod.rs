pub mod download;
mod links;
mod scraper;
pub mod tag;

pub use scraper::ReleaseScraper;

use serde::{Deserialize, Serialize};
use std::{fmt::Display, future::Future};

/// Where a wizard download comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetDescriptor {
    pub repo: String,
    #[serde(rename = "match", with = "serde_yaml::with::singleton_map")]
    pub asset_match: AssetMatch,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetMatch {
    /// A fixed download URL.
    Direct(String),
    /// A glob matched against the file names of the latest release assets.
    Pattern(String),
}

impl AssetDescriptor {
    pub fn direct(repo: impl Into<String>, url: impl Into<String>) -> Self {
        AssetDescriptor {
            repo: repo.into(),
            asset_match: AssetMatch::Direct(url.into()),
        }
    }

    pub fn pattern(repo: impl Into<String>, pattern: impl Into<String>) -> Self {
        AssetDescriptor {
            repo: repo.into(),
            asset_match: AssetMatch::Pattern(pattern.into()),
        }
    }
}

/// Result of an asset lookup. Never carries an empty URL: when nothing
/// downloadable was found the releases page is returned for the user to open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedAsset {
    Direct(String),
    ReleasesPage(String),
}

impl ResolvedAsset {
    pub fn url(&self) -> &str {
        match self {
            ResolvedAsset::Direct(url) | ResolvedAsset::ReleasesPage(url) => url,
        }
    }

    pub fn is_direct(&self) -> bool {
        matches!(self, ResolvedAsset::Direct(_))
    }
}

impl Display for ResolvedAsset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.url())
    }
}

/// Finds the download URL of a repository's latest release asset.
/// Implementations degrade instead of failing.
pub trait AssetResolver {
    fn resolve_asset(
        &self,
        repo: &str,
        pattern: &str,
    ) -> impl Future<Output = ResolvedAsset> + Send;
}

pub async fn resolve(resolver: &impl AssetResolver, descriptor: &AssetDescriptor) -> ResolvedAsset {
    match &descriptor.asset_match {
        AssetMatch::Direct(url) => ResolvedAsset::Direct(url.to_owned()),
        AssetMatch::Pattern(pattern) => resolver.resolve_asset(&descriptor.repo, pattern).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedResolver;

    impl AssetResolver for FixedResolver {
        async fn resolve_asset(&self, repo: &str, pattern: &str) -> ResolvedAsset {
            ResolvedAsset::Direct(format!("https://example.com/{}/{}", repo, pattern))
        }
    }

    #[tokio::test]
    async fn should_return_direct_url_without_resolving() {
        let descriptor = AssetDescriptor::direct("mpv-player/mpv", "https://example.com/mpv.7z");

        let resolved = resolve(&FixedResolver, &descriptor).await;

        assert_eq!(resolved, ResolvedAsset::Direct("https://example.com/mpv.7z".to_owned()));
    }

    #[tokio::test]
    async fn should_delegate_patterns_to_resolver() {
        let descriptor = AssetDescriptor::pattern("owner/repo", "*.exe");

        let resolved = resolve(&FixedResolver, &descriptor).await;

        assert_eq!(resolved.url(), "https://example.com/owner/repo/*.exe");
        assert!(resolved.is_direct());
    }

    #[test]
    fn should_expose_releases_page_url() {
        let resolved = ResolvedAsset::ReleasesPage("https://github.com/o/r/releases".to_owned());

        assert!(!resolved.is_direct());
        assert_eq!(resolved.to_string(), "https://github.com/o/r/releases");
    }
}
