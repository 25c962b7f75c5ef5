//! Request-scoped upload buffers.
//!
//! An [`UploadedDocument`] is opened as soon as the `file` part of a form is seen and is
//! released by `Drop`, so every exit path of a request (rejection, extraction failure,
//! timeout, success) gives it back exactly once. The shared [`UploadLedger`] counts both
//! sides.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use tracing::debug;

/// Filename used in user-facing messages when the part carried none.
pub const UNNAMED_UPLOAD: &str = "uploaded file";

#[derive(Debug, Default)]
pub struct UploadLedger {
    acquired: AtomicU64,
    released: AtomicU64,
}

impl UploadLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a new upload for the current request.
    pub fn open(
        self: &Arc<Self>,
        filename: Option<&str>,
        content_type: Option<&str>,
    ) -> UploadedDocument {
        self.acquired.fetch_add(1, Ordering::SeqCst);
        UploadedDocument {
            filename: filename.map(str::to_string),
            content_type: content_type.map(str::to_string),
            data: Bytes::new(),
            ledger: Arc::clone(self),
        }
    }

    pub fn acquired(&self) -> u64 {
        self.acquired.load(Ordering::SeqCst)
    }

    pub fn released(&self) -> u64 {
        self.released.load(Ordering::SeqCst)
    }

    /// Uploads opened but not yet released.
    pub fn in_flight(&self) -> u64 {
        self.acquired().saturating_sub(self.released())
    }
}

/// The file part of one request: declared metadata plus the buffered body.
#[derive(Debug)]
pub struct UploadedDocument {
    filename: Option<String>,
    content_type: Option<String>,
    data: Bytes,
    ledger: Arc<UploadLedger>,
}

impl UploadedDocument {
    /// Filename for messages, falling back to [`UNNAMED_UPLOAD`].
    pub fn display_name(&self) -> &str {
        self.filename
            .as_deref()
            .filter(|name| !name.is_empty())
            .unwrap_or(UNNAMED_UPLOAD)
    }

    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    pub fn set_data(&mut self, data: Bytes) {
        self.data = data;
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl Drop for UploadedDocument {
    fn drop(&mut self) {
        self.ledger.released.fetch_add(1, Ordering::SeqCst);
        debug!(
            filename = self.display_name(),
            bytes = self.data.len(),
            "Upload released"
        );
    }
}
