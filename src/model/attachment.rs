//! Binary attachments
//!
//! An attachment's record unit holds its metadata and content; on save the
//! content is additionally materialized as a plain file at `path/name` so
//! the web layer can serve it directly. The record unit is authoritative,
//! the materialized file is derived output.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::{Changes, Entity, RecordKind, RecordMeta};
use crate::alloc::RecordId;
use crate::constraint::{rules, UniquenessError, ValidationError};

/// A binary attachment, optionally referencing an owning post.
///
/// `name` must be unique among attachments sharing the same `path`.
/// `post_id` is advisory only: it may reference a post that no longer
/// exists (or never did) without failing the save.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub name: String,
    pub path: PathBuf,
    #[serde(with = "content_encoding")]
    pub content: Vec<u8>,
    /// SHA-256 hex digest of `content`, refreshed on every save.
    #[serde(default)]
    pub checksum: String,
    #[serde(default)]
    pub post_id: Option<RecordId>,
}

impl Attachment {
    /// A new, unsaved attachment.
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>, content: Vec<u8>) -> Self {
        Self {
            meta: RecordMeta::unsaved(),
            name: name.into(),
            path: path.into(),
            content,
            checksum: String::new(),
            post_id: None,
        }
    }

    /// Associates the attachment with an owning post.
    pub fn with_post(mut self, post_id: RecordId) -> Self {
        self.post_id = Some(post_id);
        self
    }

    /// Where the binary content is materialized on disk.
    pub fn content_path(&self) -> PathBuf {
        self.path.join(&self.name)
    }

    /// SHA-256 hex digest of the given bytes.
    pub fn compute_checksum(data: &[u8]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(data);
        format!("{:x}", hasher.finalize())
    }
}

impl Entity for Attachment {
    const KIND: RecordKind = RecordKind::Attachment;
    const CHECKS_PEERS: bool = true;

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut RecordMeta {
        &mut self.meta
    }

    fn prepare(&mut self) {
        self.checksum = Self::compute_checksum(&self.content);
    }

    fn validate(&self) -> Result<(), ValidationError> {
        rules::check_required(
            Self::KIND,
            &[
                ("name", !self.name.trim().is_empty()),
                ("path", !self.path.as_os_str().is_empty()),
            ],
        )
    }

    fn check_peers(&self, peers: &[Self]) -> Result<(), UniquenessError> {
        rules::attachment_name_free(self, peers)
    }

    fn artifact_path(&self) -> Option<PathBuf> {
        Some(self.content_path())
    }

    /// Writes the content file: temp sibling first, fsync, then rename over
    /// the final name, so readers only ever see a complete file.
    fn materialize(&self) -> io::Result<()> {
        fs::create_dir_all(&self.path)?;
        let final_path = self.content_path();
        let tmp_path = self.path.join(format!(".{}.tmp", self.name));

        if let Err(e) = stream_to(&tmp_path, &self.content) {
            let _ = fs::remove_file(&tmp_path);
            return Err(e);
        }
        fs::rename(&tmp_path, &final_path)
    }

    fn discard_artifacts(&self) -> io::Result<()> {
        match fs::remove_file(self.content_path()) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        }
    }
}

/// Streams `content` into `path` through a buffered writer and fsyncs.
fn stream_to(path: &Path, content: &[u8]) -> io::Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    io::copy(&mut &content[..], &mut writer)?;
    writer.flush()?;
    writer.into_inner().map_err(|e| e.into_error())?.sync_all()
}

/// Attachment content as base64 inside the JSON payload; raw bytes are not
/// representable in JSON strings.
mod content_encoding {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD
            .decode(encoded.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}

/// Field changes for partial attachment updates.
///
/// `post_id` is doubly optional: `None` leaves the reference alone,
/// `Some(None)` clears it, `Some(Some(id))` points it at a post.
#[derive(Debug, Clone, Default)]
pub struct AttachmentChanges {
    pub name: Option<String>,
    pub path: Option<PathBuf>,
    pub content: Option<Vec<u8>>,
    pub post_id: Option<Option<RecordId>>,
}

impl AttachmentChanges {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn content(mut self, content: Vec<u8>) -> Self {
        self.content = Some(content);
        self
    }

    pub fn post_id(mut self, post_id: Option<RecordId>) -> Self {
        self.post_id = Some(post_id);
        self
    }
}

impl Changes<Attachment> for AttachmentChanges {
    fn apply(self, attachment: &mut Attachment) {
        if let Some(name) = self.name {
            attachment.name = name;
        }
        if let Some(path) = self.path {
            attachment.path = path;
        }
        if let Some(content) = self.content {
            attachment.content = content;
        }
        if let Some(post_id) = self.post_id {
            attachment.post_id = post_id;
        }
    }
}
