//! Embedded artwork extraction for local files.
//!
//! Bridges for local players report `data.path`; the cover is read from the
//! file's tags with lofty and handed to the overlay as a data URL.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use lofty::file::TaggedFileExt;
use thiserror::Error;

use crate::domain::ArtworkSource;

#[derive(Debug, Error)]
pub enum ArtworkError {
    #[error("failed to read tags from {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: lofty::error::LoftyError,
    },

    #[error("{0} has no embedded picture")]
    NoPicture(PathBuf),
}

/// Read the first embedded picture, preferring the primary tag.
pub fn read_embedded_cover(path: &Path) -> Result<(Vec<u8>, String), ArtworkError> {
    let tagged_file = lofty::read_from_path(path).map_err(|source| ArtworkError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let picture = tagged_file
        .primary_tag()
        .and_then(|tag| tag.pictures().first())
        .or_else(|| {
            tagged_file
                .tags()
                .iter()
                .find_map(|tag| tag.pictures().first())
        })
        .ok_or_else(|| ArtworkError::NoPicture(path.to_path_buf()))?;

    let mime = picture
        .mime_type()
        .map(|mime| mime.as_str().to_string())
        .unwrap_or_else(|| "image/jpeg".to_string());

    Ok((picture.data().to_vec(), mime))
}

pub fn to_data_url(bytes: &[u8], mime: &str) -> String {
    format!("data:{};base64,{}", mime, STANDARD.encode(bytes))
}

/// [`ArtworkSource`] backed by the local filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct EmbeddedArtworkSource;

#[async_trait]
impl ArtworkSource for EmbeddedArtworkSource {
    async fn cover_for(&self, path: &str) -> Option<String> {
        let path = PathBuf::from(path);
        let result = tokio::task::spawn_blocking(move || read_embedded_cover(&path)).await;

        match result {
            Ok(Ok((bytes, mime))) => Some(to_data_url(&bytes, &mime)),
            Ok(Err(e)) => {
                tracing::debug!("No local artwork: {}", e);
                None
            }
            Err(e) => {
                tracing::warn!("Artwork extraction task failed: {}", e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_data_url() {
        // テスト項目: 画像バイト列が data URL に変換される
        // given (前提条件):
        let bytes = b"png";

        // when (操作):
        let url = to_data_url(bytes, "image/png");

        // then (期待する結果):
        assert_eq!(url, "data:image/png;base64,cG5n");
    }

    #[tokio::test]
    async fn test_missing_file_yields_no_cover() {
        // テスト項目: 読めないファイルはカバー無しとして扱われる
        // given (前提条件):
        let source = EmbeddedArtworkSource;

        // when (操作):
        let cover = source.cover_for("/nonexistent/encore/track.mp3").await;

        // then (期待する結果):
        assert!(cover.is_none());
    }
}
