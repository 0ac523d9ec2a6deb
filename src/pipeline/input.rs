//! Input: the uploaded resume as the pipeline sees it.
//!
//! An [`UploadedDocument`] is the raw file plus its declared media type and
//! original name. It is built either from bytes already in memory (a
//! multipart upload) or by awaiting a read from disk. When the declared type
//! is missing or generic (`application/octet-stream`) it is guessed from the
//! file extension, then from the leading bytes.

use crate::error::ReviewError;
use std::path::Path;
use tracing::debug;

/// Media type of PDF documents.
pub const PDF_MEDIA_TYPE: &str = "application/pdf";

const GENERIC_MEDIA_TYPE: &str = "application/octet-stream";

/// A user-supplied resume file.
#[derive(Clone, PartialEq, Eq)]
pub struct UploadedDocument {
    content: Vec<u8>,
    media_type: String,
    name: String,
}

impl std::fmt::Debug for UploadedDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadedDocument")
            .field("name", &self.name)
            .field("media_type", &self.media_type)
            .field("len", &self.content.len())
            .finish()
    }
}

impl UploadedDocument {
    /// Wrap bytes received from an upload.
    ///
    /// An empty or generic `media_type` is replaced by a guess from `name`
    /// and `content`; if nothing can be guessed the generic type is kept.
    pub fn new(
        content: impl Into<Vec<u8>>,
        media_type: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        let content = content.into();
        let name = name.into();
        let declared = media_type.into().trim().to_string();

        let media_type = if declared.is_empty() || declared.eq_ignore_ascii_case(GENERIC_MEDIA_TYPE) {
            guess_media_type(&name, &content).unwrap_or_else(|| GENERIC_MEDIA_TYPE.to_string())
        } else {
            declared
        };

        Self {
            content,
            media_type,
            name,
        }
    }

    /// Read a resume from disk.
    ///
    /// The media type is guessed from the extension, then from the content.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, ReviewError> {
        let path = path.as_ref();
        let content = tokio::fs::read(path).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ReviewError::FileNotFound {
                path: path.to_path_buf(),
            },
            std::io::ErrorKind::PermissionDenied => ReviewError::PermissionDenied {
                path: path.to_path_buf(),
            },
            _ => ReviewError::ReadFailed {
                name: path.display().to_string(),
                detail: e.to_string(),
            },
        })?;

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        let doc = Self::new(content, "", name);
        debug!(
            "Read '{}' ({} bytes, {})",
            doc.name,
            doc.content.len(),
            doc.media_type
        );
        Ok(doc)
    }

    pub fn content(&self) -> &[u8] {
        &self.content
    }

    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// Whether the declared media type indicates a PDF.
    ///
    /// Accepts `application/pdf` (parameters ignored) and the bare `pdf`
    /// some browsers report.
    pub fn is_pdf(&self) -> bool {
        let essence = self
            .media_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim();
        essence.eq_ignore_ascii_case(PDF_MEDIA_TYPE) || essence.eq_ignore_ascii_case("pdf")
    }

    /// Consume the document, returning its bytes.
    pub fn into_content(self) -> Vec<u8> {
        self.content
    }
}

/// Guess a media type from a file name, falling back to magic bytes.
pub fn guess_media_type(name: &str, content: &[u8]) -> Option<String> {
    from_extension(name).or_else(|| from_magic(content))
}

fn from_extension(name: &str) -> Option<String> {
    let ext = Path::new(name).extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "pdf" => Some(PDF_MEDIA_TYPE.to_string()),
        "heic" => Some("image/heic".to_string()),
        "heif" => Some("image/heif".to_string()),
        _ => image::ImageFormat::from_extension(&ext).map(|f| f.to_mime_type().to_string()),
    }
}

fn from_magic(content: &[u8]) -> Option<String> {
    if content.starts_with(b"%PDF") {
        return Some(PDF_MEDIA_TYPE.to_string());
    }
    image::guess_format(content)
        .ok()
        .map(|f| f.to_mime_type().to_string())
}
