use super::{links, tag::Tag, AssetResolver, ResolvedAsset};
use crate::http::{self, Headers, HttpClient, ResponseHandler};
use reqwest::header::LOCATION;

/// Resolves assets by reading the public release pages of a GitHub-like host.
pub struct ReleaseScraper {
    base_url: String,
    client: HttpClient,
}

impl ReleaseScraper {
    pub fn new(base_url: impl Into<String>) -> Result<Self, http::Error> {
        Ok(ReleaseScraper {
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            client: HttpClient::without_redirects()?,
        })
    }

    pub fn releases_page(&self, repo: &str) -> String {
        format!("{}/{}/releases", self.base_url, repo)
    }

    async fn latest_tag(&self, repo: &str) -> Option<Tag> {
        let url = format!("{}/latest", self.releases_page(repo));

        let response = match self.client.get(&url).default_headers().send().await {
            Ok(response) => response,
            Err(err) => {
                log::warn!("Cannot reach {}: {}", url, err);
                return None;
            }
        };

        let location = response
            .headers()
            .get(LOCATION)
            .and_then(|value| value.to_str().ok());

        match location.and_then(Tag::from_location) {
            Some(tag) => {
                log::debug!("latest release of {} is {}", repo, tag.value());
                Some(tag)
            }
            None => {
                log::warn!(
                    "{} did not redirect to a release tag (status {})",
                    url,
                    response.status()
                );
                None
            }
        }
    }

    async fn fetch(&self, url: &str) -> Option<String> {
        let result = match self.client.get(url).default_headers().send().await {
            Ok(response) => response.handle().await,
            Err(err) => {
                log::warn!("Cannot reach {}: {}", url, err);
                return None;
            }
        };

        match result {
            Ok(markup) => Some(markup),
            Err(err) => {
                log::debug!("Skipping {}: {}", url, err);
                None
            }
        }
    }
}

impl AssetResolver for ReleaseScraper {
    async fn resolve_asset(&self, repo: &str, pattern: &str) -> ResolvedAsset {
        let releases_page = self.releases_page(repo);

        let Some(tag) = self.latest_tag(repo).await else {
            return ResolvedAsset::ReleasesPage(releases_page);
        };

        let pages = [
            format!("{}/tag/{}", releases_page, tag.value()),
            format!("{}/expanded_assets/{}", releases_page, tag.value()),
        ];

        let mut markup = String::new();
        for page in &pages {
            if let Some(body) = self.fetch(page).await {
                markup.push_str(&body);
            }
        }

        let links = links::extract(&markup, &self.base_url);
        log::debug!("found {} release links for {}", links.len(), repo);

        match links::pick(&links, pattern) {
            Some(url) => {
                log::info!("Resolved {} to {}", repo, links::file_name(url));
                ResolvedAsset::Direct(url.to_owned())
            }
            None => {
                log::warn!(
                    "No asset of {} matches '{}', falling back to the releases page",
                    repo,
                    pattern
                );
                ResolvedAsset::ReleasesPage(releases_page)
            }
        }
    }
}
