use super::links;
use crate::{
    checksum::Checksum,
    http::{ensure_success, Headers, HttpClient},
};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::{fs::File, io::AsyncWriteExt};
use tokio_stream::StreamExt;

const FALLBACK_FILE_NAME: &str = "download.bin";
const PARTIAL_SUFFIX: &str = ".part";

#[derive(Debug)]
pub struct Downloaded {
    pub path: PathBuf,
    pub size: u64,
    pub checksum: Checksum,
}

/// Streams `url` into `dir`, named after the last segment of the final URL.
pub async fn download(client: &HttpClient, url: &str, dir: &Path) -> Result<Downloaded> {
    log::info!("Downloading {}", url);

    let response = client
        .get(url)
        .default_headers()
        .send()
        .await
        .with_context(|| format!("Cannot download {}", url))?;
    let response = ensure_success(response)?;

    let name = file_name_for(response.url().as_str())
        .or_else(|| file_name_for(url))
        .unwrap_or_else(|| FALLBACK_FILE_NAME.to_owned());

    tokio::fs::create_dir_all(dir)
        .await
        .with_context(|| format!("Cannot create {}", dir.display()))?;
    let path = dir.join(&name);
    let partial = dir.join(format!("{}{}", name, PARTIAL_SUFFIX));

    let size = match stream_into(response, &partial).await {
        Ok(size) => size,
        Err(err) => {
            if let Err(remove_err) = tokio::fs::remove_file(&partial).await {
                log::debug!("Cannot remove {}: {}", partial.display(), remove_err);
            }
            return Err(err);
        }
    };

    tokio::fs::rename(&partial, &path)
        .await
        .with_context(|| format!("Cannot move the download to {}", path.display()))?;

    let checksum = Checksum::of_file(&path)?;
    log::info!("Saved {} ({} bytes, {})", path.display(), size, checksum);

    Ok(Downloaded {
        path,
        size,
        checksum,
    })
}

/// Writes the body to `path` and returns its size.
async fn stream_into(response: reqwest::Response, path: &Path) -> Result<u64> {
    let mut file = File::create(path)
        .await
        .with_context(|| format!("Cannot create {}", path.display()))?;

    let mut size = 0u64;
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.context("Download interrupted")?;
        size += chunk.len() as u64;
        file.write_all(&chunk).await?;
    }
    file.flush().await?;

    Ok(size)
}

fn file_name_for(url: &str) -> Option<String> {
    let name = links::file_name(url);

    let valid = !name.is_empty()
        && name != "download"
        && !name.contains(['\\', ':', '*', '?', '"', '<', '>', '|']);

    valid.then(|| name.to_owned())
}
