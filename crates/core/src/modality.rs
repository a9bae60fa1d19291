//! Input modality of an indexed item

use serde::{Deserialize, Serialize};
use std::path::Path;

/// File extensions accepted as image input
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "bmp", "webp"];

/// File extensions accepted as audio input
pub const AUDIO_EXTENSIONS: &[&str] = &["mp3", "wav", "flac", "ogg", "m4a"];

/// The kind of input an embedding was derived from
///
/// Ordering is only used for deterministic grouping in stats output.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Modality {
    /// Still image (CLIP image tower)
    Image,
    /// Audio clip (CLAP audio tower)
    Audio,
    /// Free text
    Text,
    /// Unclassified
    #[default]
    Unknown,
}

impl Modality {
    /// All modalities that can have an encoder
    pub const ENCODABLE: [Modality; 3] = [Modality::Image, Modality::Audio, Modality::Text];

    /// Human-readable name for display
    pub fn name(&self) -> &'static str {
        match self {
            Modality::Image => "image",
            Modality::Audio => "audio",
            Modality::Text => "text",
            Modality::Unknown => "unknown",
        }
    }

    /// Parse from string (case-insensitive)
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "image" | "img" => Some(Modality::Image),
            "audio" => Some(Modality::Audio),
            "text" => Some(Modality::Text),
            "unknown" => Some(Modality::Unknown),
            _ => None,
        }
    }

    /// Infer the modality from a file extension
    ///
    /// Returns `None` for unsupported or missing extensions.
    pub fn from_extension(ext: &str) -> Option<Self> {
        let ext = ext.to_lowercase();
        if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
            Some(Modality::Image)
        } else if AUDIO_EXTENSIONS.contains(&ext.as_str()) {
            Some(Modality::Audio)
        } else {
            None
        }
    }

    /// Infer the modality from a path's extension
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Modality::from_extension)
    }

    /// Whether this modality is backed by a file on disk
    pub fn is_file_based(&self) -> bool {
        matches!(self, Modality::Image | Modality::Audio)
    }
}

impl std::fmt::Display for Modality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_case_insensitive() {
        assert_eq!(Modality::parse("IMAGE"), Some(Modality::Image));
        assert_eq!(Modality::parse(" audio "), Some(Modality::Audio));
        assert_eq!(Modality::parse("Text"), Some(Modality::Text));
        assert_eq!(Modality::parse("video"), None);
    }

    #[test]
    fn test_from_extension() {
        assert_eq!(Modality::from_extension("JPG"), Some(Modality::Image));
        assert_eq!(Modality::from_extension("webp"), Some(Modality::Image));
        assert_eq!(Modality::from_extension("mp3"), Some(Modality::Audio));
        assert_eq!(Modality::from_extension("flac"), Some(Modality::Audio));
        assert_eq!(Modality::from_extension("exe"), None);
    }

    #[test]
    fn test_from_path() {
        assert_eq!(
            Modality::from_path(Path::new("static/cat.png")),
            Some(Modality::Image)
        );
        assert_eq!(
            Modality::from_path(Path::new("sounds/meow.wav")),
            Some(Modality::Audio)
        );
        assert_eq!(Modality::from_path(Path::new("README")), None);
    }

    #[test]
    fn test_serde_lowercase() {
        let json = serde_json::to_string(&Modality::Audio).unwrap();
        assert_eq!(json, "\"audio\"");
        let parsed: Modality = serde_json::from_str("\"image\"").unwrap();
        assert_eq!(parsed, Modality::Image);
    }
}
