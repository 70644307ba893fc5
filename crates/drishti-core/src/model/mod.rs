//! Core data model: the issue record, its status enumeration, media
//! attachments, and the public display code.

pub mod issue;
pub mod media;
pub mod public_code;

pub use issue::{Issue, ParseStatusError, ReporterSnapshot, Status};
pub use media::{MediaKind, MediaRef};
pub use public_code::{ParsePublicCodeError, PublicCode};
