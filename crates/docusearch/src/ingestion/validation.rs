//! Upload checks and filename sanitization

use crate::error::{Error, Result};

/// Magic bytes every PDF starts with
const PDF_MAGIC: &[u8] = b"%PDF-";

/// Longest stem kept after sanitization
const MAX_STEM_CHARS: usize = 200;

/// Validate one uploaded file and return its sanitized filename
pub fn validate_upload(filename: &str, data: &[u8], max_file_size: usize) -> Result<String> {
    if filename.is_empty() {
        return Err(Error::validation("No filename provided"));
    }
    if filename.contains("..") || filename.contains('/') || filename.contains('\\') {
        return Err(Error::validation("Invalid filename: path traversal detected"));
    }
    if filename.contains('\0') {
        return Err(Error::validation("Invalid filename: null byte detected"));
    }
    if !filename.to_lowercase().ends_with(".pdf") {
        return Err(Error::validation(format!("Only PDF files are allowed: {}", filename)));
    }

    if data.is_empty() {
        return Err(Error::validation(format!("File is empty: {}", filename)));
    }
    if data.len() > max_file_size {
        return Err(Error::PayloadTooLarge(format!(
            "{} exceeds the maximum file size of {}MB",
            filename,
            max_file_size / (1024 * 1024)
        )));
    }
    if !data.starts_with(PDF_MAGIC) {
        return Err(Error::validation(format!(
            "File does not look like a PDF: {}",
            filename
        )));
    }

    sanitize_filename(filename)
}

/// Strip characters that are unsafe in filenames and bound the stem length
pub fn sanitize_filename(filename: &str) -> Result<String> {
    let base = filename.rsplit(['/', '\\']).next().unwrap_or(filename);
    let cleaned: String = base
        .chars()
        .filter(|c| !matches!(c, '<' | '>' | ':' | '"' | '|' | '?' | '*') && !c.is_control())
        .collect();
    let cleaned = cleaned.trim();

    let (stem, ext) = match cleaned.rsplit_once('.') {
        Some((stem, ext)) => (stem.trim(), format!(".{}", ext)),
        None => (cleaned, String::new()),
    };

    if stem.is_empty() {
        return Err(Error::validation("Filename is empty after sanitization"));
    }

    let stem: String = stem.chars().take(MAX_STEM_CHARS).collect();
    Ok(format!("{}{}", stem, ext))
}

#[cfg(test)]
mod tests {
    use super::*;

    const MB: usize = 1024 * 1024;

    #[test]
    fn test_valid_upload() {
        let name = validate_upload("attention.pdf", b"%PDF-1.7 ...", MB).unwrap();
        assert_eq!(name, "attention.pdf");
    }

    #[test]
    fn test_rejections() {
        assert!(matches!(
            validate_upload("notes.txt", b"%PDF-1.7", MB),
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            validate_upload("../x.pdf", b"%PDF-1.7", MB),
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            validate_upload("fake.pdf", b"PK\x03\x04", MB),
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            validate_upload("empty.pdf", b"", MB),
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            validate_upload("big.pdf", b"%PDF-1.7 0123456789", 10),
            Err(Error::PayloadTooLarge(_))
        ));
    }

    #[test]
    fn test_sanitize_strips_unsafe_characters() {
        assert_eq!(
            sanitize_filename("what?is:<this>\u{7}.pdf").unwrap(),
            "whatisthis.pdf"
        );
        assert!(sanitize_filename("???.pdf").is_err());
        assert_eq!(sanitize_filename("C:\\papers\\bert.pdf").unwrap(), "bert.pdf");
    }

    #[test]
    fn test_sanitize_bounds_stem() {
        let long = format!("{}.pdf", "a".repeat(300));
        let name = sanitize_filename(&long).unwrap();
        assert_eq!(name.len(), MAX_STEM_CHARS + 4);
        assert!(name.ends_with(".pdf"));
    }
}
