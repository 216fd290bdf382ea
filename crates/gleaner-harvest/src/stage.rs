//! Transient staging of artifact streams
//!
//! Artifact bytes are written to a named temp file before upload; the
//! repository's multipart encoding then streams from disk instead of
//! holding the object in memory. The temp file is deleted when the staged
//! artifact drops, whichever exit path takes it there.

use crate::error::HarvestError;
use futures::TryStreamExt;
use gleaner_argo::ArtifactStreamItem;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// Final segment of a slash-separated path.
#[must_use]
pub fn final_segment(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// One artifact staged to local storage.
#[derive(Debug)]
pub struct StagedArtifact {
    /// Logical path the bytes came from
    pub resolved_path: String,
    /// Staged copy; deleted on drop
    pub file: NamedTempFile,
    /// Staged size in bytes
    pub size: u64,
    /// Sniffed media type; `None` when sniffing found nothing
    pub media_type: Option<String>,
}

/// Outcome of staging one stream item.
#[derive(Debug)]
pub enum StagedOutcome {
    /// Bytes staged, ready for upload
    Staged(StagedArtifact),
    /// Stream exceeded the size limit; staged copy already discarded
    TooLarge {
        /// Logical path of the oversized artifact
        resolved_path: String,
        /// Bytes seen before the transfer was cut off
        bytes_seen: u64,
    },
}

/// Stage one stream item, cutting the transfer off past `max_bytes`.
///
/// The stream is consumed (or abandoned and thereby closed) in every case.
pub async fn stage_item(
    item: ArtifactStreamItem,
    max_bytes: u64,
) -> Result<StagedOutcome, HarvestError> {
    let ArtifactStreamItem {
        resolved_path,
        stream,
    } = item;
    let mut stream = stream;

    let mut file = tempfile::Builder::new()
        .prefix(&format!("gleaner-artifact-{}-", final_segment(&resolved_path)))
        .tempfile()?;
    tracing::debug!(
        "Staging {} to {}",
        resolved_path,
        file.path().display()
    );

    let mut size: u64 = 0;
    while let Some(chunk) = stream.try_next().await? {
        size += chunk.len() as u64;
        if size > max_bytes {
            // Dropping the stream closes the connection and dropping the
            // temp file deletes the partial copy.
            tracing::warn!(
                "Artifact {} exceeds the {} byte limit, skipping",
                resolved_path,
                max_bytes
            );
            return Ok(StagedOutcome::TooLarge {
                resolved_path,
                bytes_seen: size,
            });
        }
        file.write_all(&chunk)?;
    }
    file.flush()?;

    let media_type = sniff_media_type(&resolved_path, file.path());
    Ok(StagedOutcome::Staged(StagedArtifact {
        resolved_path,
        file,
        size,
        media_type,
    }))
}

/// Magic-byte sniff of the staged copy. Failure is non-fatal; the type is
/// simply recorded as unknown.
fn sniff_media_type(resolved_path: &str, staged: &Path) -> Option<String> {
    match infer::get_from_path(staged) {
        Ok(Some(kind)) => Some(kind.mime_type().to_string()),
        Ok(None) => None,
        Err(error) => {
            tracing::warn!("Failed to sniff content type of {resolved_path}: {error}");
            None
        }
    }
}
