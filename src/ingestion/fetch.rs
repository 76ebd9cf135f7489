//! HTTP fetching with an optional filesystem cache.
//!
//! Regulation sources change rarely; caching downloaded pages lets repeated
//! ingestion runs skip the network entirely.

use std::path::{Path, PathBuf};

use reqwest::Client;
use tokio::fs;
use url::Url;

use crate::types::RagError;

/// Disk cache mapping URLs to deterministic file names under one root.
#[derive(Clone, Debug)]
pub struct DocumentCache {
    root: PathBuf,
}

impl DocumentCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Cache file for a URL: sanitized host and path segments joined with
    /// underscores, `.html` appended when the path carries no extension.
    pub fn cache_path(&self, url: &Url) -> PathBuf {
        let mut parts: Vec<String> = Vec::new();
        if let Some(host) = url.host_str() {
            parts.push(sanitize(host));
        }
        parts.extend(
            url.path()
                .split('/')
                .filter(|segment| !segment.is_empty())
                .map(sanitize),
        );
        if parts.is_empty() {
            parts.push("index".to_string());
        }

        let mut file_name = parts.join("_");
        // Look at the URL path, not the joined name: host names carry dots.
        if Path::new(url.path()).extension().is_none() {
            file_name.push_str(".html");
        }
        self.root.join(file_name)
    }
}

/// A fetched page, flagged when it was served from the cache.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub url: Url,
    pub html: String,
    pub from_cache: bool,
}

/// Builds the HTTP client used by the ingestion path.
pub fn http_client(user_agent: &str) -> Result<Client, RagError> {
    Ok(Client::builder()
        .user_agent(user_agent)
        .use_rustls_tls()
        .build()?)
}

/// Fetches `url`, reading from and populating `cache` when one is given.
pub async fn fetch_page(
    client: &Client,
    url: &Url,
    cache: Option<&DocumentCache>,
) -> Result<FetchedPage, RagError> {
    if let Some(cache) = cache {
        let path = cache.cache_path(url);
        if path.exists() {
            let html = fs::read_to_string(&path).await?;
            return Ok(FetchedPage {
                url: url.clone(),
                html,
                from_cache: true,
            });
        }

        let html = fetch_from_network(client, url).await?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&path, &html).await?;
        return Ok(FetchedPage {
            url: url.clone(),
            html,
            from_cache: false,
        });
    }

    let html = fetch_from_network(client, url).await?;
    Ok(FetchedPage {
        url: url.clone(),
        html,
        from_cache: false,
    })
}

async fn fetch_from_network(client: &Client, url: &Url) -> Result<String, RagError> {
    let response = client.get(url.clone()).send().await?.error_for_status()?;
    Ok(response.text().await?)
}

fn sanitize(input: &str) -> String {
    input
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect()
}
