//! The file collection view.
//!
//! Owns the query key (page + canonical filter), the list's load state
//! machine, and the page-level error banner. Loads are guarded by a
//! monotonically increasing token: a response that arrives for a superseded
//! request is discarded, so out-of-order completions can never corrupt the
//! displayed list (last-request-wins).
//!
//! Delete and download are independent operations. A delete settles into
//! either an invalidated list (success) or a banner (failure); a download
//! failure is only ever logged.

use crate::{errors::ApiError, filters::CanonicalFilter, models::file::FileRecord};
use chrono::Local;
use std::fmt::Write as _;

/// Load state of the collection: `Idle → Loading → {Ready, Failed}`, with
/// `Ready` re-entering `Loading` on any key change.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadState {
    Idle,
    Loading,
    Ready(Vec<FileRecord>),
    Failed,
}

/// Token identifying one load request. Only the newest token may settle the
/// view; see [`FileListView::finish_load`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadToken(u64);

#[derive(Debug)]
pub struct FileListView {
    page: u32,
    filter: CanonicalFilter,
    state: LoadState,
    banner: Option<String>,
    latest: u64,
}

impl Default for FileListView {
    fn default() -> Self {
        Self::new()
    }
}

impl FileListView {
    pub fn new() -> Self {
        Self {
            page: 1,
            filter: CanonicalFilter::default(),
            state: LoadState::Idle,
            banner: None,
            latest: 0,
        }
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn filter(&self) -> &CanonicalFilter {
        &self.filter
    }

    pub fn state(&self) -> &LoadState {
        &self.state
    }

    pub fn banner(&self) -> Option<&str> {
        self.banner.as_deref()
    }

    /// Drop the rendered list and retire any in-flight request.
    fn invalidate(&mut self) {
        self.latest += 1;
        self.state = LoadState::Idle;
    }

    /// Adopt a newly applied canonical filter. Always resets pagination to
    /// the first page; re-applying the identical key changes nothing.
    pub fn apply_filter(&mut self, filter: CanonicalFilter) {
        if filter == self.filter && self.page == 1 {
            return;
        }
        self.filter = filter;
        self.page = 1;
        self.invalidate();
    }

    /// Move to `page` under the current filter.
    pub fn set_page(&mut self, page: u32) {
        let page = page.max(1);
        if page == self.page {
            return;
        }
        self.page = page;
        self.invalidate();
    }

    /// Start a load for the current key. The returned token must be handed
    /// back to [`FileListView::finish_load`].
    pub fn begin_load(&mut self) -> LoadToken {
        self.latest += 1;
        self.state = LoadState::Loading;
        LoadToken(self.latest)
    }

    /// Settle a load. Returns false (and leaves the view untouched) when the
    /// token was superseded by a newer request or an invalidation.
    pub fn finish_load(
        &mut self,
        token: LoadToken,
        result: Result<Vec<FileRecord>, ApiError>,
    ) -> bool {
        if token.0 != self.latest {
            tracing::debug!("discarding stale load response");
            return false;
        }
        self.state = match result {
            Ok(records) => LoadState::Ready(records),
            Err(err) => {
                tracing::warn!("failed to load files: {err}");
                LoadState::Failed
            }
        };
        true
    }

    /// Settle a delete. On success the banner clears and the list is
    /// invalidated so the caller re-loads; returns true in that case. On
    /// failure the message becomes the page-level banner and the rendered
    /// list stays as it was, so the user can retry.
    pub fn delete_settled(&mut self, result: Result<(), ApiError>) -> bool {
        match result {
            Ok(()) => {
                self.banner = None;
                self.invalidate();
                true
            }
            Err(err) => {
                self.banner = Some(err.to_string());
                false
            }
        }
    }

    /// Render the whole view: banner (if any), then placeholder / failure
    /// notice / empty notice / record list.
    pub fn render(&self) -> String {
        let mut out = String::new();
        if let LoadState::Failed = self.state {
            out.push_str("Failed to load files. Please try again.");
            return out;
        }
        if let Some(banner) = &self.banner {
            let _ = writeln!(out, "! {banner}");
            out.push('\n');
        }
        match &self.state {
            LoadState::Idle | LoadState::Loading => out.push_str("Loading files..."),
            LoadState::Ready(records) if records.is_empty() => {
                out.push_str("No files\nGet started by uploading a file");
            }
            LoadState::Ready(records) => {
                let blocks: Vec<String> = records.iter().map(render_record).collect();
                out.push_str(&blocks.join("\n\n"));
            }
            LoadState::Failed => {}
        }
        out
    }
}

/// Bytes to kilobytes, two decimal places.
pub fn format_size_kb(bytes: i64) -> String {
    format!("{:.2} KB", bytes as f64 / 1024.0)
}

/// The duplicate-metadata line for a record, when it has one.
///
/// A reference row always says so, whatever its own count claims; an
/// original shared by N uploads is referenced N-1 times.
pub fn reference_note(record: &FileRecord) -> Option<String> {
    if record.is_reference {
        Some("Reference to original file".to_string())
    } else if record.reference_count > 1 {
        Some(format!("Referenced {} times", record.reference_count - 1))
    } else {
        None
    }
}

/// One record as a text block: filename, type and size, upload time in the
/// local timezone, and the reference note when present.
pub fn render_record(record: &FileRecord) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", record.original_filename);
    let _ = writeln!(
        out,
        "  {} \u{2022} {}",
        record.file_type,
        format_size_kb(record.size)
    );
    let _ = write!(
        out,
        "  Uploaded {}",
        record
            .uploaded_at
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M:%S")
    );
    if let Some(note) = reference_note(record) {
        let _ = write!(out, "\n  {note}");
    }
    out
}
