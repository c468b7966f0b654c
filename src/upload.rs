//! Upload validation: the one gate every marksheet passes before it goes
//! anywhere near the webhook.
//!
//! The same rules run on both sides of the network boundary. The CLI front-end
//! calls [`validate`] before it opens a connection, the browser page gets the
//! accepted types and limit injected from [`ACCEPTED_MIME_TYPES`] and
//! [`MAX_UPLOAD_BYTES`], and the relay calls [`validate`] again on whatever
//! actually arrived. Type is checked before size.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use thiserror::Error;

/// Largest accepted upload: 10 MiB.
pub const MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

/// Content types the extraction webhook understands.
pub const ACCEPTED_MIME_TYPES: [&str; 4] =
    ["image/jpeg", "image/png", "image/webp", "application/pdf"];

/// Why an upload was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Invalid file type '{content_type}'. Only JPEG, PNG, WebP, and PDF are allowed.")]
    InvalidFileType { content_type: String },

    #[error("File too large. Maximum size is {}.", describe_limit(.limit))]
    FileTooLarge { size: u64, limit: u64 },

    #[error("No file uploaded")]
    MissingFile,

    #[error("Only one marksheet may be uploaded per request")]
    MultipleFiles,
}

/// A content type that passed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AcceptedType {
    Jpeg,
    Png,
    Webp,
    Pdf,
}

impl AcceptedType {
    /// Match a declared MIME type. Parameters (`; charset=...`) and case are ignored.
    pub fn from_mime(content_type: &str) -> Option<Self> {
        let essence = content_type
            .split(';')
            .next()
            .unwrap_or("")
            .trim()
            .to_ascii_lowercase();
        match essence.as_str() {
            "image/jpeg" => Some(AcceptedType::Jpeg),
            "image/png" => Some(AcceptedType::Png),
            "image/webp" => Some(AcceptedType::Webp),
            "application/pdf" => Some(AcceptedType::Pdf),
            _ => None,
        }
    }

    /// Guess the type from a file extension, the way a browser fills in `File.type`.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "jpg" | "jpeg" => Some(AcceptedType::Jpeg),
            "png" => Some(AcceptedType::Png),
            "webp" => Some(AcceptedType::Webp),
            "pdf" => Some(AcceptedType::Pdf),
            _ => None,
        }
    }

    pub fn mime(self) -> &'static str {
        match self {
            AcceptedType::Jpeg => "image/jpeg",
            AcceptedType::Png => "image/png",
            AcceptedType::Webp => "image/webp",
            AcceptedType::Pdf => "application/pdf",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            AcceptedType::Jpeg => "jpg",
            AcceptedType::Png => "png",
            AcceptedType::Webp => "webp",
            AcceptedType::Pdf => "pdf",
        }
    }

    /// Images get an inline preview; PDFs get a document glyph.
    pub fn is_image(self) -> bool {
        !matches!(self, AcceptedType::Pdf)
    }
}

impl fmt::Display for AcceptedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mime())
    }
}

/// Human form of an upload limit: whole MiB (`10MB`) from 1 MiB up, bytes below.
pub fn describe_limit(limit: &u64) -> String {
    const MIB: u64 = 1024 * 1024;
    let limit = *limit;
    if limit >= MIB {
        format!("{}MB", limit / MIB)
    } else {
        format!("{limit} bytes")
    }
}

/// Validate a candidate upload against the default 10 MiB limit.
pub fn validate(content_type: &str, size: u64) -> Result<AcceptedType, ValidationError> {
    validate_with_limit(content_type, size, MAX_UPLOAD_BYTES)
}

/// Validate a candidate upload against an explicit size limit.
pub fn validate_with_limit(
    content_type: &str,
    size: u64,
    limit: u64,
) -> Result<AcceptedType, ValidationError> {
    let kind = check_type(content_type)?;
    check_size(size, limit)?;
    Ok(kind)
}

/// Type half of [`validate`]; the relay runs it before reading any file bytes.
pub fn check_type(content_type: &str) -> Result<AcceptedType, ValidationError> {
    AcceptedType::from_mime(content_type).ok_or_else(|| ValidationError::InvalidFileType {
        content_type: content_type.to_string(),
    })
}

/// Size half of [`validate`].
pub fn check_size(size: u64, limit: u64) -> Result<(), ValidationError> {
    if size > limit {
        return Err(ValidationError::FileTooLarge { size, limit });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_every_listed_type() {
        for mime in ACCEPTED_MIME_TYPES {
            let kind = validate(mime, 1024).expect("listed type must pass");
            assert_eq!(kind.mime(), mime);
        }
    }

    #[test]
    fn rejects_unlisted_types() {
        for mime in ["text/plain", "image/gif", "application/octet-stream", ""] {
            let err = validate(mime, 10).unwrap_err();
            assert!(
                matches!(err, ValidationError::InvalidFileType { .. }),
                "{mime} should be rejected, got {err:?}"
            );
        }
    }

    #[test]
    fn mime_parameters_and_case_are_ignored() {
        assert_eq!(AcceptedType::from_mime("Image/PNG"), Some(AcceptedType::Png));
        assert_eq!(
            AcceptedType::from_mime("application/pdf; name=sheet.pdf"),
            Some(AcceptedType::Pdf)
        );
    }

    #[test]
    fn size_limit_is_inclusive() {
        assert!(validate("image/png", MAX_UPLOAD_BYTES).is_ok());
        let err = validate("image/png", MAX_UPLOAD_BYTES + 1).unwrap_err();
        assert_eq!(
            err,
            ValidationError::FileTooLarge {
                size: MAX_UPLOAD_BYTES + 1,
                limit: MAX_UPLOAD_BYTES
            }
        );
        assert!(err.to_string().contains("Maximum size is 10MB"));
    }

    #[test]
    fn sub_mebibyte_limit_is_reported_in_bytes() {
        let err = validate_with_limit("image/png", 2048, 1024).unwrap_err();
        assert_eq!(err.to_string(), "File too large. Maximum size is 1024 bytes.");
        assert_eq!(describe_limit(&MAX_UPLOAD_BYTES), "10MB");
    }

    #[test]
    fn type_is_checked_before_size() {
        let err = validate("text/plain", MAX_UPLOAD_BYTES * 2).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidFileType { .. }));
    }

    #[test]
    fn extension_guessing() {
        assert_eq!(
            AcceptedType::from_path(Path::new("scan.JPG")),
            Some(AcceptedType::Jpeg)
        );
        assert_eq!(
            AcceptedType::from_path(Path::new("/tmp/sheet.pdf")),
            Some(AcceptedType::Pdf)
        );
        assert_eq!(AcceptedType::from_path(Path::new("notes.txt")), None);
        assert_eq!(AcceptedType::from_path(Path::new("no_extension")), None);
    }

    #[test]
    fn only_pdf_lacks_an_image_preview() {
        assert!(AcceptedType::Webp.is_image());
        assert!(!AcceptedType::Pdf.is_image());
    }
}
