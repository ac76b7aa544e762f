//! Filter form state and its normalization into the listing query.
//!
//! Two layers, mirroring the draft/canonical split the server expects:
//! - [`DraftFilter`] is the raw form: nine string fields, edited freely,
//!   never sent to the network.
//! - [`CanonicalFilter`] is the sparse, type-coerced record produced on an
//!   explicit apply. A key is present iff the user supplied a non-empty
//!   value for it; absence means "no constraint", not "constraint = default".
//!
//! [`FilterForm`] ties the two together and owns the panel/shortcut state.

use tracing::warn;

/// The nine filterable fields of the listing endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterField {
    Search,
    FileType,
    MinSize,
    MaxSize,
    StartDate,
    EndDate,
    IsReference,
    MinReferenceCount,
    MaxReferenceCount,
}

/// Uncommitted form state. Every field defaults to the empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DraftFilter {
    pub search: String,
    pub file_type: String,
    pub min_size: String,
    pub max_size: String,
    pub start_date: String,
    pub end_date: String,
    pub is_reference: String,
    pub min_reference_count: String,
    pub max_reference_count: String,
}

impl DraftFilter {
    /// Write one field. No validation, no coercion, no I/O.
    pub fn set(&mut self, field: FilterField, value: impl Into<String>) {
        let value = value.into();
        match field {
            FilterField::Search => self.search = value,
            FilterField::FileType => self.file_type = value,
            FilterField::MinSize => self.min_size = value,
            FilterField::MaxSize => self.max_size = value,
            FilterField::StartDate => self.start_date = value,
            FilterField::EndDate => self.end_date = value,
            FilterField::IsReference => self.is_reference = value,
            FilterField::MinReferenceCount => self.min_reference_count = value,
            FilterField::MaxReferenceCount => self.max_reference_count = value,
        }
    }
}

/// Normalized filter driving the listing query. Sparse: `None` fields place
/// no constraint and emit no query parameter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CanonicalFilter {
    pub search: Option<String>,
    pub file_type: Option<String>,
    pub min_size: Option<u64>,
    pub max_size: Option<u64>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub is_reference: Option<bool>,
    pub min_reference_count: Option<u64>,
    pub max_reference_count: Option<u64>,
}

impl CanonicalFilter {
    /// True when no field places a constraint — "no filtering".
    pub fn is_empty(&self) -> bool {
        *self == CanonicalFilter::default()
    }

    /// Translate to query parameters under the server's naming convention.
    ///
    /// All nine fields are forwarded, `max_size` and `is_reference` included.
    pub fn to_query_params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(search) = &self.search {
            params.push(("search", search.clone()));
        }
        if let Some(file_type) = &self.file_type {
            params.push(("file_type", file_type.clone()));
        }
        if let Some(min_size) = self.min_size {
            params.push(("min_size", min_size.to_string()));
        }
        if let Some(max_size) = self.max_size {
            params.push(("max_size", max_size.to_string()));
        }
        if let Some(start_date) = &self.start_date {
            params.push(("start_date", start_date.clone()));
        }
        if let Some(end_date) = &self.end_date {
            params.push(("end_date", end_date.clone()));
        }
        if let Some(is_reference) = self.is_reference {
            params.push(("is_reference", is_reference.to_string()));
        }
        if let Some(min) = self.min_reference_count {
            params.push(("min_reference_count", min.to_string()));
        }
        if let Some(max) = self.max_reference_count {
            params.push(("max_reference_count", max.to_string()));
        }
        params
    }
}

/// Trim a draft value; `None` when nothing remains.
fn non_empty(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    if trimmed.is_empty() { None } else { Some(trimmed) }
}

/// Parse a numeric draft field. `"0"` is a real constraint and survives as
/// `Some(0)`. Unparseable non-empty input is dropped with a warning rather
/// than silently rewritten into a different constraint.
fn parse_numeric(field: &'static str, value: &str) -> Option<u64> {
    let raw = non_empty(value)?;
    match raw.parse::<u64>() {
        Ok(n) => Some(n),
        Err(_) => {
            warn!("ignoring non-numeric {} filter value {:?}", field, raw);
            None
        }
    }
}

/// Normalize a draft into its canonical form.
///
/// A field appears in the output iff its trimmed draft value is non-empty.
/// Numeric fields are parsed here, not before; `is_reference` becomes a
/// boolean only from the literal `"true"` — any other non-empty entry means
/// `false`, and the empty string means unset.
pub fn normalize(draft: &DraftFilter) -> CanonicalFilter {
    CanonicalFilter {
        search: non_empty(&draft.search).map(str::to_string),
        file_type: non_empty(&draft.file_type).map(str::to_string),
        min_size: parse_numeric("min_size", &draft.min_size),
        max_size: parse_numeric("max_size", &draft.max_size),
        start_date: non_empty(&draft.start_date).map(str::to_string),
        end_date: non_empty(&draft.end_date).map(str::to_string),
        is_reference: non_empty(&draft.is_reference).map(|v| v == "true"),
        min_reference_count: parse_numeric("min_reference_count", &draft.min_reference_count),
        max_reference_count: parse_numeric("max_reference_count", &draft.max_reference_count),
    }
}

/// The filter panel controller: draft edits, explicit apply/clear, and the
/// derived active-filter state.
#[derive(Debug, Default)]
pub struct FilterForm {
    draft: DraftFilter,
    applied: CanonicalFilter,
    panel_expanded: bool,
}

impl FilterForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn draft(&self) -> &DraftFilter {
        &self.draft
    }

    pub fn applied(&self) -> &CanonicalFilter {
        &self.applied
    }

    /// Write one draft field. Nothing is validated or emitted until apply.
    pub fn update_field(&mut self, field: FilterField, value: impl Into<String>) {
        self.draft.set(field, value);
    }

    pub fn panel_expanded(&self) -> bool {
        self.panel_expanded
    }

    pub fn toggle_panel(&mut self) {
        self.panel_expanded = !self.panel_expanded;
    }

    /// Normalize the draft, record it as the applied filter, collapse the
    /// panel, and hand the canonical filter back — exactly once per call.
    /// The empty filter is a valid result and is emitted like any other.
    pub fn apply(&mut self) -> CanonicalFilter {
        self.applied = normalize(&self.draft);
        self.panel_expanded = false;
        self.applied.clone()
    }

    /// Enter inside the search field. Equivalent to [`FilterForm::apply`].
    pub fn submit_search(&mut self) -> CanonicalFilter {
        self.apply()
    }

    /// Reset every draft field to empty and unconditionally emit the empty
    /// canonical filter, whether or not filters were previously active.
    pub fn clear(&mut self) -> CanonicalFilter {
        self.draft = DraftFilter::default();
        self.applied = CanonicalFilter::default();
        self.applied.clone()
    }

    /// Derived, never stored: true iff the most recently applied canonical
    /// filter is non-empty.
    pub fn has_active_filters(&self) -> bool {
        !self.applied.is_empty()
    }

    /// The clear-filters shortcut is shown only while filters are active and
    /// the panel is collapsed.
    pub fn show_clear_shortcut(&self) -> bool {
        self.has_active_filters() && !self.panel_expanded
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_draft_normalizes_to_empty_filter() {
        let canonical = normalize(&DraftFilter::default());
        assert!(canonical.is_empty());
        assert!(canonical.to_query_params().is_empty());
    }

    #[test]
    fn only_non_empty_fields_are_included() {
        let mut draft = DraftFilter::default();
        draft.set(FilterField::Search, "report");
        draft.set(FilterField::FileType, "application/pdf");
        let canonical = normalize(&draft);
        assert_eq!(canonical.search.as_deref(), Some("report"));
        assert_eq!(canonical.file_type.as_deref(), Some("application/pdf"));
        assert_eq!(canonical.min_size, None);
        assert_eq!(canonical.is_reference, None);
    }

    #[test]
    fn values_are_trimmed() {
        let mut draft = DraftFilter::default();
        draft.set(FilterField::Search, "  quarterly  ");
        draft.set(FilterField::StartDate, " 2024-01-15 ");
        let canonical = normalize(&draft);
        assert_eq!(canonical.search.as_deref(), Some("quarterly"));
        assert_eq!(canonical.start_date.as_deref(), Some("2024-01-15"));
    }

    #[test]
    fn whitespace_only_counts_as_absent() {
        let mut draft = DraftFilter::default();
        draft.set(FilterField::MinSize, "   ");
        draft.set(FilterField::Search, "\t");
        let canonical = normalize(&draft);
        assert!(canonical.is_empty());
    }

    #[test]
    fn zero_is_an_explicit_constraint_not_absent() {
        let mut draft = DraftFilter::default();
        draft.set(FilterField::MinSize, "0");
        let canonical = normalize(&draft);
        assert_eq!(canonical.min_size, Some(0));
        assert_eq!(
            canonical.to_query_params(),
            vec![("min_size", "0".to_string())]
        );
    }

    #[test]
    fn numeric_fields_parse_to_numbers_at_apply_time() {
        let mut draft = DraftFilter::default();
        draft.set(FilterField::MinSize, "1024");
        draft.set(FilterField::MaxSize, "4096");
        draft.set(FilterField::MinReferenceCount, "2");
        draft.set(FilterField::MaxReferenceCount, "9");
        let canonical = normalize(&draft);
        assert_eq!(canonical.min_size, Some(1024));
        assert_eq!(canonical.max_size, Some(4096));
        assert_eq!(canonical.min_reference_count, Some(2));
        assert_eq!(canonical.max_reference_count, Some(9));
    }

    #[test]
    fn non_numeric_input_is_dropped() {
        let mut draft = DraftFilter::default();
        draft.set(FilterField::MinSize, "lots");
        let canonical = normalize(&draft);
        assert_eq!(canonical.min_size, None);
    }

    #[test]
    fn is_reference_true_only_from_the_literal_string() {
        let mut draft = DraftFilter::default();
        draft.set(FilterField::IsReference, "true");
        assert_eq!(normalize(&draft).is_reference, Some(true));

        draft.set(FilterField::IsReference, "false");
        assert_eq!(normalize(&draft).is_reference, Some(false));

        draft.set(FilterField::IsReference, "yes");
        assert_eq!(normalize(&draft).is_reference, Some(false));

        draft.set(FilterField::IsReference, "");
        assert_eq!(normalize(&draft).is_reference, None);
    }

    #[test]
    fn query_params_use_server_naming_and_forward_all_nine() {
        let mut draft = DraftFilter::default();
        draft.set(FilterField::Search, "a");
        draft.set(FilterField::FileType, "image/png");
        draft.set(FilterField::MinSize, "1");
        draft.set(FilterField::MaxSize, "2");
        draft.set(FilterField::StartDate, "2024-01-01");
        draft.set(FilterField::EndDate, "2024-12-31");
        draft.set(FilterField::IsReference, "true");
        draft.set(FilterField::MinReferenceCount, "3");
        draft.set(FilterField::MaxReferenceCount, "4");

        let params = normalize(&draft).to_query_params();
        let names: Vec<&str> = params.iter().map(|(name, _)| *name).collect();
        assert_eq!(
            names,
            vec![
                "search",
                "file_type",
                "min_size",
                "max_size",
                "start_date",
                "end_date",
                "is_reference",
                "min_reference_count",
                "max_reference_count",
            ]
        );
        assert!(params.contains(&("is_reference", "true".to_string())));
        assert!(params.contains(&("max_size", "2".to_string())));
    }

    #[test]
    fn apply_with_empty_draft_emits_empty_filter_and_deactivates() {
        let mut form = FilterForm::new();
        form.update_field(FilterField::Search, "x");
        form.apply();
        assert!(form.has_active_filters());

        form.update_field(FilterField::Search, "");
        let canonical = form.apply();
        assert!(canonical.is_empty());
        assert!(!form.has_active_filters());
    }

    #[test]
    fn apply_collapses_panel() {
        let mut form = FilterForm::new();
        form.toggle_panel();
        assert!(form.panel_expanded());
        form.apply();
        assert!(!form.panel_expanded());
    }

    #[test]
    fn submit_search_is_equivalent_to_apply() {
        let mut a = FilterForm::new();
        let mut b = FilterForm::new();
        a.update_field(FilterField::Search, "budget");
        b.update_field(FilterField::Search, "budget");
        assert_eq!(a.submit_search(), b.apply());
        assert!(a.has_active_filters());
    }

    #[test]
    fn clear_resets_draft_and_emits_empty_regardless_of_prior_state() {
        let mut form = FilterForm::new();
        assert!(form.clear().is_empty());

        form.update_field(FilterField::Search, "x");
        form.update_field(FilterField::MinSize, "10");
        form.apply();
        assert!(form.has_active_filters());

        let cleared = form.clear();
        assert!(cleared.is_empty());
        assert_eq!(*form.draft(), DraftFilter::default());
        assert!(!form.has_active_filters());
    }

    #[test]
    fn active_filters_track_the_last_applied_filter_only() {
        let mut form = FilterForm::new();
        form.update_field(FilterField::FileType, "text/plain");
        // Draft edits alone do not activate anything.
        assert!(!form.has_active_filters());
        form.apply();
        assert!(form.has_active_filters());
    }

    #[test]
    fn clear_shortcut_hidden_while_panel_is_expanded() {
        let mut form = FilterForm::new();
        form.update_field(FilterField::Search, "x");
        form.apply();
        assert!(form.show_clear_shortcut());
        form.toggle_panel();
        assert!(!form.show_clear_shortcut());
    }
}
