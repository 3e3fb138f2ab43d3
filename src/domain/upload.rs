use std::path::Path;

/// One file of an upload batch as handed over by the HTTP layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    /// Client-supplied file name; only its extension is used.
    pub original_name: String,
    pub bytes: Vec<u8>,
    /// Size reported by the multipart parser.
    pub size: u64,
}

impl UploadedFile {
    pub fn new(original_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let size = bytes.len() as u64;
        Self {
            original_name: original_name.into(),
            bytes,
            size,
        }
    }

    /// Lower-cased extension of the original name, without the leading dot.
    pub fn extension(&self) -> Option<String> {
        Path::new(&self.original_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .filter(|ext| !ext.is_empty())
            .map(str::to_ascii_lowercase)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_is_lower_cased() {
        let file = UploadedFile::new("DSC_0001.JPG", vec![1, 2, 3]);
        assert_eq!(file.extension().as_deref(), Some("jpg"));
        assert_eq!(file.size, 3);
    }

    #[test]
    fn missing_extension_is_none() {
        assert_eq!(UploadedFile::new("README", vec![]).extension(), None);
        assert_eq!(UploadedFile::new("trailing.", vec![]).extension(), None);
    }
}
