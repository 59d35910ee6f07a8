//! Upload validation: filename sanitization, extension/MIME allow-lists,
//! size limits, and magic-byte content sniffing.

use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;

/// Common validation errors for audio uploads
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("File too large: {size} bytes (max: {max} bytes)")]
    FileTooLarge { size: usize, max: usize },

    #[error("Invalid file extension: {extension} (allowed: {allowed:?})")]
    InvalidExtension {
        extension: String,
        allowed: Vec<String>,
    },

    #[error("Invalid content type: {content_type} (allowed: {allowed:?})")]
    InvalidContentType {
        content_type: String,
        allowed: Vec<String>,
    },

    #[error("Invalid filename: {0}")]
    InvalidFilename(String),

    #[error("Invalid audio file format")]
    InvalidAudioContent,

    #[error("Empty file")]
    EmptyFile,
}

fn unsafe_chars() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // anything outside word chars, dot, dash (spaces included: object keys stay shell-safe)
    RE.get_or_init(|| Regex::new(r"[^\w.\-]").unwrap())
}

/// Sanitize a client-supplied filename: strip path components and NUL bytes,
/// replace unsafe characters with `_`, neutralize a leading `.` or `-`,
/// and cap the length at 255 bytes.
pub fn sanitize_filename(filename: &str) -> String {
    let base_name = Path::new(filename)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("");

    let base_name = base_name.replace('\0', "");
    let mut sanitized = unsafe_chars().replace_all(&base_name, "_").into_owned();

    if sanitized.starts_with('.') || sanitized.starts_with('-') {
        sanitized.replace_range(0..1, "_");
    }

    if sanitized.len() > 255 {
        let mut cut = 255;
        while !sanitized.is_char_boundary(cut) {
            cut -= 1;
        }
        sanitized.truncate(cut);
    }

    sanitized
}

/// Magic-byte prefixes accepted as audio content.
/// MPEG frame-sync variants cover untagged MP3 streams.
const AUDIO_SIGNATURES: &[(&[u8], &str)] = &[
    (b"ID3", "MP3"),
    (b"RIFF", "WAV"),
    (&[0xff, 0xfb], "MP3"),
    (&[0xff, 0xf3], "MP3"),
    (&[0xff, 0xf2], "MP3"),
    (&[0xff, 0xe3], "MP3"),
];

/// Audio upload validator
///
/// Validation logic shared by the upload-URL grant and the synchronous
/// multipart endpoints, decoupled from storage details.
pub struct AudioValidator {
    max_file_size: usize,
    allowed_extensions: Vec<String>,
    allowed_content_types: Vec<String>,
}

impl AudioValidator {
    pub fn new(
        max_file_size: usize,
        allowed_extensions: Vec<String>,
        allowed_content_types: Vec<String>,
    ) -> Self {
        Self {
            max_file_size,
            allowed_extensions,
            allowed_content_types,
        }
    }

    /// Validator with the service defaults (40 MB, mp3/wav/m4a).
    pub fn with_defaults() -> Self {
        Self::new(
            earshot_core::constants::MAX_UPLOAD_BYTES,
            earshot_core::constants::ALLOWED_AUDIO_EXTENSIONS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            earshot_core::constants::ALLOWED_AUDIO_CONTENT_TYPES
                .iter()
                .map(|s| s.to_string())
                .collect(),
        )
    }

    pub fn max_file_size(&self) -> usize {
        self.max_file_size
    }

    pub fn validate_file_size(&self, size: usize) -> Result<(), ValidationError> {
        if size == 0 {
            return Err(ValidationError::EmptyFile);
        }

        if size > self.max_file_size {
            return Err(ValidationError::FileTooLarge {
                size,
                max: self.max_file_size,
            });
        }

        Ok(())
    }

    pub fn validate_extension(&self, filename: &str) -> Result<(), ValidationError> {
        let extension = Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .ok_or_else(|| ValidationError::InvalidFilename(filename.to_string()))?;

        if !self.allowed_extensions.contains(&extension) {
            return Err(ValidationError::InvalidExtension {
                extension,
                allowed: self.allowed_extensions.clone(),
            });
        }

        Ok(())
    }

    pub fn validate_content_type(&self, content_type: &str) -> Result<(), ValidationError> {
        let normalized = content_type.to_lowercase();

        if !self
            .allowed_content_types
            .iter()
            .any(|ct| ct == &normalized)
        {
            return Err(ValidationError::InvalidContentType {
                content_type: content_type.to_string(),
                allowed: self.allowed_content_types.clone(),
            });
        }

        Ok(())
    }

    /// Validate content starts with a known audio signature.
    pub fn validate_magic_bytes(&self, content: &[u8]) -> Result<(), ValidationError> {
        for (signature, _) in AUDIO_SIGNATURES {
            if content.starts_with(signature) {
                return Ok(());
            }
        }

        // MP4 containers (m4a) carry "ftyp" at offset 4
        if content.len() >= 8 && &content[4..8] == b"ftyp" {
            return Ok(());
        }

        Err(ValidationError::InvalidAudioContent)
    }

    /// Sanitize the filename and run the metadata checks (extension, MIME).
    /// Returns the sanitized filename the caller must use from here on.
    pub fn validate_upload_request(
        &self,
        filename: &str,
        content_type: &str,
    ) -> Result<String, ValidationError> {
        let sanitized = sanitize_filename(filename);
        if sanitized.is_empty() {
            return Err(ValidationError::InvalidFilename(filename.to_string()));
        }

        self.validate_extension(&sanitized)?;
        self.validate_content_type(content_type)?;

        Ok(sanitized)
    }

    /// Full validation for an in-band upload: metadata checks plus size and
    /// magic-byte sniffing of the received bytes.
    pub fn validate_upload(
        &self,
        filename: &str,
        content_type: &str,
        content: &[u8],
    ) -> Result<String, ValidationError> {
        let sanitized = self.validate_upload_request(filename, content_type)?;
        self.validate_file_size(content.len())?;
        self.validate_magic_bytes(content)?;
        Ok(sanitized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_validator() -> AudioValidator {
        AudioValidator::with_defaults()
    }

    #[test]
    fn sanitize_strips_path_components() {
        assert_eq!(sanitize_filename("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_filename("/tmp/evil.mp3"), "evil.mp3");
    }

    #[test]
    fn sanitize_replaces_special_characters() {
        assert_eq!(sanitize_filename("My File!.mp3"), "My_File_.mp3");
        assert_eq!(sanitize_filename("a;b&c.mp3"), "a_b_c.mp3");
    }

    #[test]
    fn sanitize_neutralizes_leading_dot_and_dash() {
        assert_eq!(sanitize_filename(".hidden.mp3"), "_hidden.mp3");
        assert_eq!(sanitize_filename("-rf.mp3"), "_rf.mp3");
    }

    #[test]
    fn sanitize_removes_null_bytes() {
        assert_eq!(sanitize_filename("evil\u{1}.mp3"), "evil_.mp3");
    }

    #[test]
    fn sanitize_caps_length() {
        let long = format!("{}.mp3", "a".repeat(300));
        assert!(sanitize_filename(&long).len() <= 255);
    }

    #[test]
    fn extension_allow_list() {
        let v = test_validator();
        assert!(v.validate_extension("song.mp3").is_ok());
        assert!(v.validate_extension("song.WAV").is_ok());
        assert!(v.validate_extension("song.flac").is_err());
        assert!(v.validate_extension("noextension").is_err());
    }

    #[test]
    fn content_type_allow_list() {
        let v = test_validator();
        assert!(v.validate_content_type("audio/mpeg").is_ok());
        assert!(v.validate_content_type("AUDIO/MP3").is_ok());
        assert!(v.validate_content_type("video/mp4").is_err());
    }

    #[test]
    fn magic_bytes_accept_known_audio() {
        let v = test_validator();
        assert!(v.validate_magic_bytes(b"ID3\x04rest-of-mp3").is_ok());
        assert!(v.validate_magic_bytes(b"RIFFxxxxWAVE").is_ok());
        assert!(v.validate_magic_bytes(&[0xff, 0xfb, 0x90, 0x00]).is_ok());
        assert!(v.validate_magic_bytes(b"\x00\x00\x00\x20ftypM4A ").is_ok());
    }

    #[test]
    fn magic_bytes_reject_non_audio() {
        let v = test_validator();
        assert!(v.validate_magic_bytes(b"%PDF-1.4").is_err());
        assert!(v.validate_magic_bytes(b"MZ\x90\x00").is_err());
        assert!(v.validate_magic_bytes(b"").is_err());
    }

    #[test]
    fn size_limits() {
        let v = AudioValidator::new(
            10,
            vec!["mp3".to_string()],
            vec!["audio/mpeg".to_string()],
        );
        assert!(v.validate_file_size(10).is_ok());
        assert!(matches!(
            v.validate_file_size(11),
            Err(ValidationError::FileTooLarge { .. })
        ));
        assert!(matches!(
            v.validate_file_size(0),
            Err(ValidationError::EmptyFile)
        ));
    }

    #[test]
    fn upload_request_returns_sanitized_name() {
        let v = test_validator();
        let name = v.validate_upload_request("My File!.mp3", "audio/mp3").unwrap();
        assert_eq!(name, "My_File_.mp3");
    }
}
