//! Intake of untrusted uploaded parts.
//!
//! [`validate`] takes one multipart section (its declared disposition type,
//! declared filename and byte stream) and either produces an [`AcceptedFile`]
//! or a [`RejectionReason`]. It never touches storage: assigning an id and a
//! timestamp and persisting the record is the caller's job.
//!
//! The extension check looks at the filename only. No magic-byte sniffing is
//! done, so an accepted `.png` is not guaranteed to be a PNG.

use std::fmt;

use actix_web::web::Bytes;
use futures_util::{Stream, StreamExt};
use log::{debug, warn};
use thiserror::Error;

pub const FORM_DATA: &str = "form-data";

/// Size and extension limits applied to every part.
#[derive(Debug, Clone)]
pub struct IntakePolicy {
    pub max_size_bytes: usize,
    /// Lowercase suffixes including the leading dot, e.g. `.jpg`.
    permitted_extensions: Vec<String>,
}

impl IntakePolicy {
    pub const DEFAULT_MAX_SIZE_BYTES: usize = 10 * 1_048_576;
    pub const DEFAULT_EXTENSIONS: [&'static str; 3] = [".jpg", ".png", ".pdf"];

    /// Extensions are normalized to lowercase with a leading dot, so `PNG`,
    /// `.png` and `.Png` all mean the same thing.
    pub fn new<I, S>(max_size_bytes: usize, permitted_extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let permitted_extensions = permitted_extensions
            .into_iter()
            .map(|ext| normalize_extension(ext.as_ref()))
            .filter(|ext| ext.len() > 1)
            .collect();

        Self {
            max_size_bytes,
            permitted_extensions,
        }
    }

    pub fn permitted_extensions(&self) -> &[String] {
        &self.permitted_extensions
    }

    pub fn permits_file_name(&self, file_name: &str) -> bool {
        match extension_of(file_name) {
            Some(ext) => self.permitted_extensions.iter().any(|p| *p == ext),
            None => false,
        }
    }
}

impl Default for IntakePolicy {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MAX_SIZE_BYTES, Self::DEFAULT_EXTENSIONS)
    }
}

/// A part that passed every check. Ownership of `content` moves to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceptedFile {
    pub display_name: String,
    pub size_bytes: usize,
    pub content: Vec<u8>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RejectionReason {
    #[error("part is not form-data (disposition type `{0}`)")]
    MalformedRequest(String),
    #[error("part declares no file name")]
    NoFileNameProvided,
    #[error("file extension not permitted, allowed: {}", .permitted.join(", "))]
    UnsupportedExtension { permitted: Vec<String> },
    #[error("file exceeds the {limit} byte limit")]
    SizeLimitExceeded { limit: usize },
    #[error("file is empty")]
    EmptyFile,
    #[error("upload stream interrupted: {0}")]
    StreamInterrupted(String),
}

/// Vets one multipart section.
///
/// The stream is read chunk by chunk and abandoned as soon as the running
/// total passes `policy.max_size_bytes`; the buffer never grows past the
/// limit. On any rejection the partial buffer is dropped. The read bound is
/// counted in source chunks: the chunk that crosses the limit is pulled from
/// the stream whole, then discarded without being buffered.
pub async fn validate<S, E>(
    mut part_stream: S,
    declared_file_name: Option<&str>,
    declared_disposition_type: &str,
    policy: &IntakePolicy,
) -> Result<AcceptedFile, RejectionReason>
where
    S: Stream<Item = Result<Bytes, E>> + Unpin,
    E: fmt::Display,
{
    if !declared_disposition_type.eq_ignore_ascii_case(FORM_DATA) {
        return Err(RejectionReason::MalformedRequest(
            declared_disposition_type.to_string(),
        ));
    }

    let file_name = match declared_file_name {
        Some(name) if !name.is_empty() => name,
        _ => return Err(RejectionReason::NoFileNameProvided),
    };

    if !policy.permits_file_name(file_name) {
        return Err(RejectionReason::UnsupportedExtension {
            permitted: policy.permitted_extensions.clone(),
        });
    }

    let mut buffer: Vec<u8> = Vec::new();
    while let Some(chunk) = part_stream.next().await {
        let chunk = chunk.map_err(|err| RejectionReason::StreamInterrupted(err.to_string()))?;

        if buffer.len() + chunk.len() > policy.max_size_bytes {
            warn!(
                "aborting part read at {} bytes, limit is {}",
                buffer.len() + chunk.len(),
                policy.max_size_bytes
            );
            return Err(RejectionReason::SizeLimitExceeded {
                limit: policy.max_size_bytes,
            });
        }
        buffer.extend_from_slice(&chunk);
    }

    if buffer.is_empty() {
        return Err(RejectionReason::EmptyFile);
    }

    let display_name = escape_html(file_name);
    debug!("accepted part {} ({} bytes)", display_name, buffer.len());

    Ok(AcceptedFile {
        display_name,
        size_bytes: buffer.len(),
        content: buffer,
    })
}

/// Escapes `&`, `<`, `>` and both quote characters.
pub fn escape_html(input: &str) -> String {
    html_escape::encode_quoted_attribute(input).into_owned()
}

/// Lowercased suffix of the last path segment, dot included.
fn extension_of(file_name: &str) -> Option<String> {
    let last_segment = file_name.rsplit(['/', '\\']).next().unwrap_or(file_name);
    let (_, ext) = last_segment.rsplit_once('.')?;
    if ext.is_empty() {
        return None;
    }
    Some(format!(".{}", ext.to_lowercase()))
}

fn normalize_extension(ext: &str) -> String {
    let ext = ext.trim().to_lowercase();
    if ext.starts_with('.') {
        ext
    } else {
        format!(".{}", ext)
    }
}
