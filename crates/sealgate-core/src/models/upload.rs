use std::path::Path;

/// An uploaded file as received from a transport layer
///
/// The client-supplied name may still carry directory components; screening
/// works with the base name and the extension derived from it.
#[derive(Debug, Clone)]
pub struct FileUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl FileUpload {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        FileUpload {
            file_name: file_name.into(),
            bytes,
        }
    }

    /// Final path component of the client-supplied name.
    pub fn base_name(&self) -> &str {
        self.file_name
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or(&self.file_name)
    }

    /// Extension of the base name, lower-cased, with its leading dot.
    /// Empty string when the name has no extension.
    pub fn extension(&self) -> String {
        Path::new(self.base_name())
            .extension()
            .and_then(|e| e.to_str())
            .filter(|e| !e.is_empty())
            .map(|e| format!(".{}", e.to_lowercase()))
            .unwrap_or_default()
    }

    pub fn is_pdf(&self) -> bool {
        self.extension() == ".pdf"
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}
