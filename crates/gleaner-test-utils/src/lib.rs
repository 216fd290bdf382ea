//! Shared test fixtures
//!
//! - [`ScriptedFeed`], an in-memory artifact feed for driving the saga
//! - [`ArtifactTreeServer`], a local HTTP server that mimics the engine's
//!   archive endpoint (content-disposition downloads, HTML directory
//!   indexes) for crawler tests
//! - run-document fixture helpers

use bytes::Bytes;
use gleaner_argo::{ArgoError, ArtifactFeed, ArtifactStreamItem, RunDocument};
use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::oneshot;
use warp::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use warp::http::Response;
use warp::Filter;

/// Parse a JSON fixture into a run document.
///
/// Panics on malformed fixtures; for tests only.
#[must_use]
pub fn parse_run(value: serde_json::Value) -> RunDocument {
    serde_json::from_value(value).expect("fixture run document must parse")
}

/// A pre-scripted [`ArtifactFeed`] serving in-memory items.
#[derive(Default)]
pub struct ScriptedFeed {
    items: VecDeque<Result<ArtifactStreamItem, ArgoError>>,
}

impl ScriptedFeed {
    /// Empty feed.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one file item with the given resolved path and content.
    pub fn push_file(&mut self, resolved_path: &str, content: &[u8]) {
        // Split into two chunks so consumers see a real multi-chunk stream.
        let middle = content.len() / 2;
        let chunks: Vec<Result<Bytes, ArgoError>> = vec![
            Ok(Bytes::copy_from_slice(&content[..middle])),
            Ok(Bytes::copy_from_slice(&content[middle..])),
        ];
        self.items.push_back(Ok(ArtifactStreamItem {
            resolved_path: resolved_path.to_string(),
            stream: Box::pin(futures::stream::iter(chunks)),
        }));
    }

    /// Append one feed-level error.
    pub fn push_error(&mut self, error: ArgoError) {
        self.items.push_back(Err(error));
    }
}

#[async_trait::async_trait]
impl ArtifactFeed for ScriptedFeed {
    async fn next_item(&mut self) -> Option<Result<ArtifactStreamItem, ArgoError>> {
        self.items.pop_front()
    }
}

/// One node of a served artifact tree.
#[derive(Debug, Clone)]
pub enum TreeNode {
    /// A downloadable file; `attachment_name` is what the
    /// content-disposition header reports, which may differ from the name
    /// the file is linked under
    File {
        /// Filename carried by the content-disposition header
        attachment_name: String,
        /// Served bytes
        bytes: Vec<u8>,
    },
    /// A directory listing, entries in link order
    Dir(Vec<(String, TreeNode)>),
}

impl TreeNode {
    /// File node.
    #[must_use]
    pub fn file(attachment_name: &str, bytes: &[u8]) -> Self {
        Self::File {
            attachment_name: attachment_name.to_string(),
            bytes: bytes.to_vec(),
        }
    }

    /// Directory node.
    #[must_use]
    pub fn dir(entries: Vec<(&str, TreeNode)>) -> Self {
        Self::Dir(
            entries
                .into_iter()
                .map(|(name, node)| (name.to_string(), node))
                .collect(),
        )
    }
}

enum ServedEntry {
    File { attachment_name: String, bytes: Vec<u8> },
    Listing(String),
}

fn flatten(prefix: &str, node: &TreeNode, map: &mut HashMap<String, ServedEntry>) {
    match node {
        TreeNode::File {
            attachment_name,
            bytes,
        } => {
            map.insert(
                prefix.to_string(),
                ServedEntry::File {
                    attachment_name: attachment_name.clone(),
                    bytes: bytes.clone(),
                },
            );
        }
        TreeNode::Dir(entries) => {
            let mut listing = String::from("<html><body><a href=\"..\">..</a>");
            for (name, child) in entries {
                let href = match child {
                    TreeNode::Dir(_) => format!("{name}/"),
                    TreeNode::File { .. } => name.clone(),
                };
                listing.push_str(&format!("<a href=\"{href}\">{href}</a>"));
                flatten(&format!("{prefix}/{name}"), child, map);
            }
            listing.push_str("</body></html>");
            map.insert(prefix.to_string(), ServedEntry::Listing(listing));
        }
    }
}

/// Local stand-in for the engine's archive endpoint.
///
/// Serves one [`TreeNode`] mounted under a fixed path prefix: files answer
/// with a content-disposition header, directories with an HTML index whose
/// first link is the parent directory. Shuts down when dropped.
pub struct ArtifactTreeServer {
    addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
}

impl ArtifactTreeServer {
    /// Serve `root` under `mount` (e.g.
    /// `artifact-files/ns/workflows/run-1/step/outputs/art`) on an
    /// ephemeral local port. Must be called inside a tokio runtime.
    #[must_use]
    pub fn start(mount: &str, root: TreeNode) -> Self {
        let mut entries = HashMap::new();
        flatten(mount.trim_matches('/'), &root, &mut entries);
        let entries = Arc::new(entries);

        let route = warp::get()
            .and(warp::path::full())
            .map(move |full: warp::path::FullPath| {
                let key = full.as_str().trim_matches('/').to_string();
                let response = match entries.get(&key) {
                    Some(ServedEntry::File {
                        attachment_name,
                        bytes,
                    }) => Response::builder()
                        .header(
                            CONTENT_DISPOSITION,
                            format!("attachment; filename=\"{attachment_name}\""),
                        )
                        .body(bytes.clone()),
                    Some(ServedEntry::Listing(html)) => Response::builder()
                        .header(CONTENT_TYPE, "text/html")
                        .body(html.clone().into_bytes()),
                    None => Response::builder().status(404).body(Vec::new()),
                };
                response.expect("static response must build")
            });

        let (shutdown, rx) = oneshot::channel::<()>();
        let (addr, server) = warp::serve(route).bind_with_graceful_shutdown(
            ([127, 0, 0, 1], 0),
            async {
                rx.await.ok();
            },
        );
        tokio::spawn(server);
        Self {
            addr,
            shutdown: Some(shutdown),
        }
    }

    /// Base URL of the running server.
    #[must_use]
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }
}

impl Drop for ArtifactTreeServer {
    fn drop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            shutdown.send(()).ok();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::TryStreamExt;

    #[tokio::test]
    async fn scripted_feed_yields_in_push_order() {
        let mut feed = ScriptedFeed::new();
        feed.push_file("step/a.txt", b"alpha");
        feed.push_file("step/b.txt", b"beta");

        let first = feed.next_item().await.unwrap().unwrap();
        assert_eq!(first.resolved_path, "step/a.txt");
        let chunks: Vec<Bytes> = first.stream.try_collect().await.unwrap();
        let bytes: Vec<u8> = chunks.concat();
        assert_eq!(bytes, b"alpha");

        let second = feed.next_item().await.unwrap().unwrap();
        assert_eq!(second.resolved_path, "step/b.txt");
        assert!(feed.next_item().await.is_none());
    }

    #[test]
    fn flatten_lists_children_and_parent_link() {
        let mut map = HashMap::new();
        flatten(
            "mount",
            &TreeNode::dir(vec![
                ("a.txt", TreeNode::file("a.txt", b"a")),
                ("b", TreeNode::dir(vec![("c.txt", TreeNode::file("c.txt", b"c"))])),
            ]),
            &mut map,
        );
        let ServedEntry::Listing(listing) = &map["mount"] else {
            panic!("mount must be a listing");
        };
        assert!(listing.contains("<a href=\"..\">"));
        assert!(listing.contains("<a href=\"a.txt\">"));
        assert!(listing.contains("<a href=\"b/\">"));
        assert!(map.contains_key("mount/b/c.txt"));
    }
}
