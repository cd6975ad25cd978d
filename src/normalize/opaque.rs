//! Opaque capture rendering
//!
//! Handles the `RawOpaque` shape: no structured decomposition is attempted,
//! the record carries only a bounded free-text rendering of the capture.

use super::Extraction;
use crate::raw::RawResult;
use crate::types::NormalizedRecord;

pub(super) fn extract(
    server: &'static str,
    raw: &dyn RawResult,
    max_render_len: usize,
) -> Extraction {
    let mut record = NormalizedRecord::empty(server);
    record.result_value = Some(truncate(raw.render(), max_render_len));
    Extraction::clean(record)
}

fn truncate(rendered: String, max_len: usize) -> String {
    if rendered.chars().count() <= max_len {
        return rendered;
    }
    let mut preview: String = rendered.chars().take(max_len).collect();
    preview.push_str("...");
    preview
}
