//! File → base64 payload + media type.
//!
//! No size or type checks happen here; anything readable is encoded.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use ledgerscan_core::{ExtractionError, StagedFile};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

use crate::media::media_type_for;

/// Inline image payload: bare base64 content (no `data:` prefix) and its media type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedImage {
    pub data: String,
    pub media_type: String,
}

#[derive(Error, Debug)]
pub enum EncodeError {
    #[error("could not read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl From<EncodeError> for ExtractionError {
    fn from(err: EncodeError) -> Self {
        match err {
            EncodeError::Read { path, source } => ExtractionError::Encode {
                path,
                message: source.to_string(),
            },
        }
    }
}

pub fn encode_bytes(bytes: &[u8], media_type: impl Into<String>) -> EncodedImage {
    EncodedImage {
        data: STANDARD.encode(bytes),
        media_type: media_type.into(),
    }
}

pub async fn encode_file(file: &StagedFile) -> Result<EncodedImage, EncodeError> {
    let bytes = tokio::fs::read(file.path())
        .await
        .map_err(|source| EncodeError::Read {
            path: file.path.clone(),
            source,
        })?;

    let media_type = file
        .media_type
        .clone()
        .unwrap_or_else(|| media_type_for(file.path()).to_string());

    Ok(encode_bytes(&bytes, media_type))
}

/// Encode every file, keeping input order. Stops at the first unreadable file.
pub async fn encode_all(files: &[StagedFile]) -> Result<Vec<EncodedImage>, EncodeError> {
    let mut out = Vec::with_capacity(files.len());
    for f in files {
        out.push(encode_file(f).await?);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_encode_bytes_has_no_data_uri_prefix() {
        let img = encode_bytes(b"hello", "image/png");
        assert_eq!(img.data, "aGVsbG8=");
        assert!(!img.data.starts_with("data:"));
        assert_eq!(img.media_type, "image/png");
    }

    #[tokio::test]
    async fn test_encode_file_uses_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("page.jpg");
        std::fs::File::create(&path)
            .unwrap()
            .write_all(&[0xff, 0xd8, 0xff])
            .unwrap();

        let img = encode_file(&StagedFile::new(&path)).await.unwrap();
        assert_eq!(img.media_type, "image/jpeg");
        assert_eq!(img.data, "/9j/");
    }

    #[tokio::test]
    async fn test_declared_media_type_wins() {
        let mut f = tempfile::Builder::new().suffix(".bin").tempfile().unwrap();
        f.write_all(b"abc").unwrap();

        let staged = StagedFile::new(f.path()).with_media_type("image/webp");
        let img = encode_file(&staged).await.unwrap();
        assert_eq!(img.media_type, "image/webp");
        assert_eq!(img.data, "YWJj");
    }

    #[tokio::test]
    async fn test_missing_file_is_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("gone.png");

        let err = encode_file(&StagedFile::new(&missing)).await.unwrap_err();
        assert!(matches!(err, EncodeError::Read { .. }));

        let converted: ExtractionError = err.into();
        assert!(matches!(converted, ExtractionError::Encode { path, .. } if path == missing));
    }

    #[tokio::test]
    async fn test_encode_all_keeps_order() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.png");
        let b = dir.path().join("b.gif");
        std::fs::write(&a, b"A").unwrap();
        std::fs::write(&b, b"B").unwrap();

        let out = encode_all(&[StagedFile::new(&b), StagedFile::new(&a)])
            .await
            .unwrap();
        assert_eq!(
            out,
            vec![encode_bytes(b"B", "image/gif"), encode_bytes(b"A", "image/png")]
        );
    }
}
