use glob::{MatchOptions, Pattern};
use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::Regex;

const DOWNLOAD_PATH_SEGMENT: &str = "/releases/download/";
const EXECUTABLE_EXTENSIONS: [&str; 2] = [".exe", ".msi"];

static HREF_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)href\s*=\s*["']([^"']+)["']"#).unwrap());

const CASE_INSENSITIVE: MatchOptions = MatchOptions {
    case_sensitive: false,
    require_literal_separator: false,
    require_literal_leading_dot: false,
};

/// Collects release download links from markup in document order, made
/// absolute against `base_url` and without duplicates.
pub fn extract(markup: &str, base_url: &str) -> Vec<String> {
    let base_url = base_url.trim_end_matches('/');

    HREF_REGEX
        .captures_iter(markup)
        .filter_map(|captures| captures.get(1))
        .map(|href| href.as_str().replace("&amp;", "&"))
        .filter(|href| href.contains(DOWNLOAD_PATH_SEGMENT))
        .map(|href| {
            if href.starts_with('/') {
                format!("{}{}", base_url, href)
            } else {
                href
            }
        })
        .unique()
        .collect()
}

pub fn file_name(link: &str) -> &str {
    let path = link.split(['?', '#']).next().unwrap_or(link);
    path.rsplit('/').next().unwrap_or(path)
}

/// Chooses a link: the first whose file name matches `pattern`, then the
/// first executable installer, then the first executable.
pub fn pick<'a>(links: &'a [String], pattern: &str) -> Option<&'a str> {
    by_pattern(links, pattern)
        .or_else(|| {
            links
                .iter()
                .find(|link| is_executable(link) && link.to_lowercase().contains("installer"))
        })
        .or_else(|| links.iter().find(|link| is_executable(link)))
        .map(String::as_str)
}

fn by_pattern<'a>(links: &'a [String], pattern: &str) -> Option<&'a String> {
    match Pattern::new(pattern) {
        Ok(glob) => links
            .iter()
            .find(|link| glob.matches_with(file_name(link), CASE_INSENSITIVE)),
        Err(err) => {
            log::warn!("Ignoring invalid asset pattern '{}': {}", pattern, err);
            None
        }
    }
}

fn is_executable(link: &str) -> bool {
    let name = file_name(link).to_lowercase();
    EXECUTABLE_EXTENSIONS.iter().any(|ext| name.ends_with(ext))
}
