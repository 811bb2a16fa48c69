//! Local text file loading.

use std::path::Path;

use super::{Document, FetchError};

/// Read a UTF-8 text file as a [`Document`].
///
/// The file stem stands in for the title; the author is unknown and left
/// empty.
pub fn read_local_document(path: &Path) -> Result<Document, FetchError> {
    let text = std::fs::read_to_string(path)?;
    let title = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    Ok(Document {
        text,
        title,
        author: String::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn reads_text_and_derives_title_from_stem() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("走れメロス.txt");
        let mut file = std::fs::File::create(&path).expect("create");
        write!(file, "メロスは激怒した。").expect("write");

        let doc = read_local_document(&path).unwrap();
        assert_eq!(doc.text, "メロスは激怒した。");
        assert_eq!(doc.title, "走れメロス");
        assert!(doc.author.is_empty());
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = read_local_document(Path::new("/nonexistent/novel.txt")).unwrap_err();
        assert!(matches!(err, FetchError::Io(_)));
    }
}
