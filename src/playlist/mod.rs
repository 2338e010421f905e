use anyhow::Context;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

use crate::{DatasetError, Result};

static WATCH_ID_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"watch\?v=([a-zA-Z0-9_-]+)").expect("valid watch id pattern"));

const WATCH_URL_PREFIX: &str = "https://www.youtube.com/watch?v=";

/// Resolves playlist pages to the videos they list
///
/// Only ids present in the first HTML payload are found; continuation pages
/// loaded by the browser are not followed.
pub struct PlaylistResolver {
    client: reqwest::Client,
}

impl PlaylistResolver {
    pub fn new(user_agent: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { client })
    }

    /// Fetch `playlist_url` and return the watch URLs found on the page
    pub async fn resolve(&self, playlist_url: &str) -> Result<Vec<String>> {
        crate::fetcher::validate_url(playlist_url)?;
        tracing::info!("Fetching playlist page: {}", playlist_url);

        let response = self
            .client
            .get(playlist_url)
            .send()
            .await
            .map_err(|e| DatasetError::PlaylistFetchFailed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(DatasetError::PlaylistFetchFailed(format!("HTTP {}", response.status())).into());
        }

        let html = response
            .text()
            .await
            .map_err(|e| DatasetError::PlaylistFetchFailed(e.to_string()))?;

        let urls = extract_video_urls(&html);
        tracing::info!("Found {} videos in playlist", urls.len());
        Ok(urls)
    }
}

/// Collect unique watch URLs from page HTML, in first-seen order
pub fn extract_video_urls(html: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    WATCH_ID_REGEX
        .captures_iter(html)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str())
        .filter(|id| seen.insert(*id))
        .map(|id| format!("{}{}", WATCH_URL_PREFIX, id))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dedups_in_first_seen_order() {
        let html = r#"<a href="/watch?v=abc&list=PL1">one</a>
            <a href="/watch?v=xyz&list=PL1">two</a>
            <a href="/watch?v=abc&index=3">again</a>"#;

        assert_eq!(
            extract_video_urls(html),
            vec![
                "https://www.youtube.com/watch?v=abc".to_string(),
                "https://www.youtube.com/watch?v=xyz".to_string(),
            ]
        );
    }

    #[test]
    fn test_ids_with_dash_and_underscore() {
        let html = r#"{"url":"/watch?v=a_B-9zz&list=x"}"#;
        assert_eq!(
            extract_video_urls(html),
            vec!["https://www.youtube.com/watch?v=a_B-9zz".to_string()]
        );
    }

    #[test]
    fn test_page_without_videos() {
        assert!(extract_video_urls("<html><body>empty</body></html>").is_empty());
        assert!(extract_video_urls("watch?v=").is_empty());
    }

    #[tokio::test]
    async fn test_rejects_non_http_urls() {
        let resolver = PlaylistResolver::new("test-agent").unwrap();
        assert!(resolver.resolve("ftp://example.com/playlist").await.is_err());
    }
}
