//! Attachment references.
//!
//! Media is stored by the backend and referenced here by relative path
//! only; the kind is inferred from the file extension rather than stored.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Extensions rendered inline as images.
const IMAGE_EXTENSIONS: [&str; 6] = ["jpg", "jpeg", "png", "gif", "bmp", "webp"];

/// Extensions rendered inline as video.
const VIDEO_EXTENSIONS: [&str; 7] = ["mp4", "avi", "mov", "wmv", "flv", "webm", "mkv"];

/// Inferred kind of an attachment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
    Other,
}

impl MediaKind {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Video => "video",
            Self::Other => "other",
        }
    }

    /// Returns `true` for kinds accepted at submission time.
    #[must_use]
    pub const fn is_submittable(self) -> bool {
        matches!(self, Self::Image | Self::Video)
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A reference to one stored attachment, by backend-relative path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MediaRef {
    path: String,
}

impl MediaRef {
    /// Wrap a backend-relative path (e.g. `/uploads/1700000000-pothole.jpg`).
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }

    /// The backend-relative path.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The final path segment, for display and download names.
    #[must_use]
    pub fn file_name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }

    /// Infer the kind from the file extension (case-insensitive).
    #[must_use]
    pub fn kind(&self) -> MediaKind {
        let ext = self
            .path
            .rsplit('.')
            .next()
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
            MediaKind::Image
        } else if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
            MediaKind::Video
        } else {
            MediaKind::Other
        }
    }
}

impl fmt::Display for MediaRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::{MediaKind, MediaRef};

    #[test]
    fn image_extensions_are_detected() {
        for ext in ["jpg", "JPEG", "png", "webp"] {
            let m = MediaRef::new(format!("/uploads/photo.{ext}"));
            assert_eq!(m.kind(), MediaKind::Image, "extension {ext}");
        }
    }

    #[test]
    fn video_extensions_are_detected() {
        for ext in ["mp4", "MOV", "webm"] {
            let m = MediaRef::new(format!("/uploads/clip.{ext}"));
            assert_eq!(m.kind(), MediaKind::Video, "extension {ext}");
        }
    }

    #[test]
    fn unknown_extensions_fall_back_to_other() {
        assert_eq!(MediaRef::new("/uploads/report.pdf").kind(), MediaKind::Other);
        assert_eq!(MediaRef::new("/uploads/noext").kind(), MediaKind::Other);
    }

    #[test]
    fn only_image_and_video_are_submittable() {
        assert!(MediaKind::Image.is_submittable());
        assert!(MediaKind::Video.is_submittable());
        assert!(!MediaKind::Other.is_submittable());
    }

    #[test]
    fn file_name_strips_directories() {
        let m = MediaRef::new("/uploads/2026/pothole.jpg");
        assert_eq!(m.file_name(), "pothole.jpg");
    }

    #[test]
    fn serde_is_transparent() {
        let m = MediaRef::new("/uploads/a.png");
        let json = serde_json::to_string(&m).expect("serialize");
        assert_eq!(json, "\"/uploads/a.png\"");
        let back: MediaRef = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, m);
    }
}
