//! Artifact Crawler
//!
//! The archive endpoint answers a GET with either a single file download or
//! an HTML directory index, and only the response headers tell which. HEAD
//! is not an option: the endpoint handles it slowly and unreliably for large
//! objects. So every node is probed with a streaming GET:
//!
//! - a content-disposition header means "file": the true filename is taken
//!   from the header (the archive may have stored the object renamed or
//!   recompressed), the probe connection is discarded unread, and a second
//!   fresh GET supplies the body that is yielded;
//! - otherwise the body is a directory index whose anchors are pushed onto
//!   an explicit work stack and visited depth-first, in link order.

use crate::error::{ensure_success, ArgoError};
use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::Stream;
use futures::TryStreamExt;
use reqwest::header::CONTENT_DISPOSITION;
use reqwest::Url;
use std::pin::Pin;

/// Parent-directory link in a listing; never followed.
const PARENT_LINK: &str = "..";

/// A single-use stream of artifact bytes.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, ArgoError>> + Send>>;

/// One resolved artifact: its logical path and the bytes behind it.
pub struct ArtifactStreamItem {
    /// Logical path; final segment comes from the download headers, so it
    /// may differ from the declared path
    pub resolved_path: String,
    /// The transferable body; dropped streams are closed
    pub stream: ByteStream,
}

impl std::fmt::Debug for ArtifactStreamItem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArtifactStreamItem")
            .field("resolved_path", &self.resolved_path)
            .finish_non_exhaustive()
    }
}

/// A finite, non-restartable sequence of artifact stream items.
#[async_trait]
pub trait ArtifactFeed: Send {
    /// Next item, or `None` once the feed is exhausted.
    async fn next_item(&mut self) -> Option<Result<ArtifactStreamItem, ArgoError>>;
}

#[derive(Debug, Clone)]
pub(crate) struct PendingEntry {
    pub(crate) url: Url,
    pub(crate) path: String,
}

/// Depth-first crawler over the archive endpoint.
pub struct ArtifactCrawler {
    http: reqwest::Client,
    token: String,
    stack: Vec<PendingEntry>,
}

impl ArtifactCrawler {
    pub(crate) fn new(http: reqwest::Client, token: String, entries: Vec<PendingEntry>) -> Self {
        // Entries pop in push order reversed, so reverse here to visit the
        // descriptor list front to back.
        let mut stack = entries;
        stack.reverse();
        Self { http, token, stack }
    }

    /// Entries not yet visited, next first.
    pub(crate) fn pending(&self) -> impl Iterator<Item = &PendingEntry> {
        self.stack.iter().rev()
    }

    /// Probe one pending entry; a file yields an item, a directory pushes
    /// its children.
    async fn visit(&mut self, entry: PendingEntry) -> Result<Option<ArtifactStreamItem>, ArgoError> {
        let probe = self
            .http
            .get(entry.url.clone())
            .bearer_auth(&self.token)
            .send()
            .await?;
        let probe = ensure_success(probe)?;

        let disposition = match probe.headers().get(CONTENT_DISPOSITION) {
            Some(value) => Some(
                value
                    .to_str()
                    .map_err(|_| {
                        ArgoError::BadDisposition("header is not valid ascii".to_string())
                    })?
                    .to_string(),
            ),
            None => None,
        };

        if let Some(header) = disposition {
            let file_name = disposition_filename(&header)?;
            let resolved_path = replace_final_segment(&entry.path, &file_name);
            // The probe was opened only for its headers; discard it unread.
            drop(probe);
            tracing::info!("Yielding file from {} as {}", entry.url, resolved_path);

            let download = self
                .http
                .get(entry.url.clone())
                .bearer_auth(&self.token)
                .send()
                .await?;
            let download = ensure_success(download)?;
            let stream = download.bytes_stream().map_err(ArgoError::from);
            Ok(Some(ArtifactStreamItem {
                resolved_path,
                stream: Box::pin(stream),
            }))
        } else {
            tracing::info!("Listing directory {}", entry.url);
            let listing = probe.text().await?;
            let links = parse_directory_links(&listing);
            for href in links.iter().rev() {
                let url = join_listing_url(&entry.url, href)?;
                let path = join_artifact_path(&entry.path, href);
                self.stack.push(PendingEntry { url, path });
            }
            Ok(None)
        }
    }
}

#[async_trait]
impl ArtifactFeed for ArtifactCrawler {
    async fn next_item(&mut self) -> Option<Result<ArtifactStreamItem, ArgoError>> {
        while let Some(entry) = self.stack.pop() {
            match self.visit(entry).await {
                Ok(Some(item)) => return Some(Ok(item)),
                Ok(None) => {}
                Err(error) => return Some(Err(error)),
            }
        }
        None
    }
}

/// Anchor targets of a directory index, parent link excluded, in link order.
///
/// Kept synchronous: the parsed DOM is not `Send` and must not live across
/// an await point.
fn parse_directory_links(listing: &str) -> Vec<String> {
    let document = scraper::Html::parse_document(listing);
    let Ok(selector) = scraper::Selector::parse("a") else {
        return Vec::new();
    };
    document
        .select(&selector)
        .filter_map(|anchor| anchor.value().attr("href"))
        .filter(|href| *href != PARENT_LINK)
        .map(str::to_string)
        .collect()
}

/// Filename carried by a content-disposition header.
fn disposition_filename(header: &str) -> Result<String, ArgoError> {
    let (_, rest) = header
        .split_once("filename=")
        .ok_or_else(|| ArgoError::BadDisposition(header.to_string()))?;
    let name = rest.split(';').next().unwrap_or(rest).trim().trim_matches('"');
    if name.is_empty() {
        return Err(ArgoError::BadDisposition(header.to_string()));
    }
    Ok(name.to_string())
}

/// Swap the final path segment for the header-derived filename, keeping the
/// prefix.
fn replace_final_segment(path: &str, file_name: &str) -> String {
    match path.rfind('/') {
        Some(index) => format!("{}/{}", &path[..index], file_name),
        None => file_name.to_string(),
    }
}

/// Join a listing URL with one of its link targets.
fn join_listing_url(url: &Url, href: &str) -> Result<Url, ArgoError> {
    let mut base = url.clone();
    // Without a trailing separator the joiner would replace the final
    // segment instead of descending into it.
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base.join(href)
        .map_err(|error| ArgoError::Url(format!("{url} + {href}: {error}")))
}

/// Logical path an artifact descriptor is crawled under: the step id joined
/// with the declared path, leading slash dropped.
pub(crate) fn artifact_url_path(step_id: &str, declared_path: &str) -> String {
    join_artifact_path(step_id, declared_path.trim_start_matches('/'))
}

/// Join a logical artifact path with a link target.
fn join_artifact_path(base: &str, href: &str) -> String {
    if href.starts_with('/') || base.is_empty() {
        return href.to_string();
    }
    if base.ends_with('/') {
        format!("{base}{href}")
    } else {
        format!("{base}/{href}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn disposition_filename_unquotes() {
        assert_eq!(
            disposition_filename("attachment; filename=\"results.zip\"").unwrap(),
            "results.zip"
        );
    }

    #[test]
    fn disposition_filename_accepts_bare_names() {
        assert_eq!(
            disposition_filename("attachment; filename=plain.txt").unwrap(),
            "plain.txt"
        );
    }

    #[test]
    fn disposition_filename_stops_at_next_parameter() {
        assert_eq!(
            disposition_filename("attachment; filename=\"a.zip\"; size=3").unwrap(),
            "a.zip"
        );
    }

    #[test]
    fn disposition_without_filename_is_rejected() {
        assert!(disposition_filename("attachment").is_err());
        assert!(disposition_filename("attachment; filename=\"\"").is_err());
    }

    #[test]
    fn replace_final_segment_keeps_prefix() {
        assert_eq!(replace_final_segment("a/b/c.txt", "c.zip"), "a/b/c.zip");
        assert_eq!(replace_final_segment("c.txt", "c.zip"), "c.zip");
        assert_eq!(replace_final_segment("a/b/", "c.zip"), "a/b/c.zip");
        assert_eq!(replace_final_segment("/c.txt", "c.zip"), "/c.zip");
    }

    #[test]
    fn artifact_paths_join_like_the_archive() {
        assert_eq!(join_artifact_path("step/out", "b"), "step/out/b");
        assert_eq!(join_artifact_path("step/out/", "b"), "step/out/b");
        assert_eq!(join_artifact_path("step", "/abs"), "/abs");
        assert_eq!(join_artifact_path("", "x"), "x");
    }

    #[test]
    fn descriptor_paths_are_rooted_at_the_step() {
        assert_eq!(
            artifact_url_path("step", "/outputs/x.csv"),
            "step/outputs/x.csv"
        );
        assert_eq!(artifact_url_path("step", "main.log"), "step/main.log");
    }

    #[test]
    fn listing_urls_descend_into_the_segment() {
        let base = Url::parse("http://engine/artifact-files/ns/workflows/run/step/outputs/art")
            .unwrap();
        let joined = join_listing_url(&base, "child.txt").unwrap();
        assert_eq!(
            joined.as_str(),
            "http://engine/artifact-files/ns/workflows/run/step/outputs/art/child.txt"
        );
    }

    #[test]
    fn anchors_are_listed_without_the_parent_link() {
        let listing = concat!(
            "<html><body>",
            "<a href=\"..\">..</a>",
            "<a href=\"a.txt\">a.txt</a>",
            "<a href=\"b/\">b/</a>",
            "</body></html>",
        );
        assert_eq!(parse_directory_links(listing), vec!["a.txt", "b/"]);
    }

    #[test]
    fn anchors_without_href_are_ignored() {
        let listing = "<html><body><a name=\"top\">top</a><a href=\"x\">x</a></body></html>";
        assert_eq!(parse_directory_links(listing), vec!["x"]);
    }
}
