use std::path::{Path, PathBuf};

use bytes::Bytes;

use crate::{document::format_size_mb, error::KnowledgeBaseError};

/// A document kind the backend accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileType {
    /// MIME type
    pub key: &'static str,
    /// Human-readable label
    pub label: &'static str,
}

pub const SUPPORTED_FILE_TYPES: [FileType; 4] = [
    FileType {
        key: "text/plain",
        label: "Text file (.txt)",
    },
    FileType {
        key: "application/pdf",
        label: "PDF file (.pdf)",
    },
    FileType {
        key: "application/msword",
        label: "Word document (.doc)",
    },
    FileType {
        key: "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        label: "Word document (.docx)",
    },
];

impl FileType {
    pub fn lookup(mime_type: &str) -> Option<&'static FileType> {
        SUPPORTED_FILE_TYPES.iter().find(|t| t.key == mime_type)
    }
}

/// Where an upload's content comes from.
#[derive(Debug, Clone)]
pub enum UploadSource {
    Bytes(Bytes),
    /// Read lazily; `size` comes from file metadata.
    Path { path: PathBuf, size: u64 },
}

/// One file selected for upload.
#[derive(Debug, Clone)]
pub struct UploadFile {
    name: String,
    source: UploadSource,
    mime_type: Option<String>,
}

impl UploadFile {
    /// In-memory file. The MIME type is guessed from the name's extension.
    pub fn from_bytes(name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        let name = name.into();
        let mime_type = guess_mime(Path::new(&name));
        Self {
            name,
            source: UploadSource::Bytes(data.into()),
            mime_type,
        }
    }

    /// File on disk. Only its metadata is read here.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, KnowledgeBaseError> {
        let path = path.as_ref();
        let metadata = tokio::fs::metadata(path).await?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        Ok(Self {
            name,
            source: UploadSource::Path {
                path: path.to_path_buf(),
                size: metadata.len(),
            },
            mime_type: guess_mime(path),
        })
    }

    #[must_use]
    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mime_type(&self) -> Option<&str> {
        self.mime_type.as_deref()
    }

    pub fn source(&self) -> &UploadSource {
        &self.source
    }

    /// Size in bytes, known without reading the content.
    pub fn size(&self) -> u64 {
        match &self.source {
            UploadSource::Bytes(data) => data.len() as u64,
            UploadSource::Path { size, .. } => *size,
        }
    }

    pub fn size_mb(&self) -> String {
        format_size_mb(self.size())
    }

    /// Load the content to send.
    pub(crate) async fn read(&self) -> Result<Bytes, KnowledgeBaseError> {
        match &self.source {
            UploadSource::Bytes(data) => Ok(data.clone()),
            UploadSource::Path { path, .. } => Ok(Bytes::from(tokio::fs::read(path).await?)),
        }
    }
}

fn guess_mime(path: &Path) -> Option<String> {
    mime_guess::from_path(path)
        .first()
        .map(|mime| mime.essence_str().to_string())
}

/// Summary of a pending selection. Name, type and size are filled in only
/// when exactly one file is selected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileSelection {
    pub count: usize,
    pub file_name: String,
    pub file_type: String,
    /// Megabytes with two decimals
    pub file_size_mb: String,
}

impl FileSelection {
    pub fn summarize(files: &[UploadFile]) -> Self {
        match files {
            [file] => Self {
                count: 1,
                file_name: file.name().to_string(),
                file_type: file.mime_type().unwrap_or_default().to_string(),
                file_size_mb: file.size_mb(),
            },
            _ => Self {
                count: files.len(),
                ..Self::default()
            },
        }
    }

    /// Label of the selected file's type, when it is a supported kind.
    pub fn type_label(&self) -> Option<&'static str> {
        FileType::lookup(&self.file_type).map(|t| t.label)
    }
}
