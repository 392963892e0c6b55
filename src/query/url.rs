//! Serializes a [`QueryState`] into the Data Library URL grammar.

use crate::query::state::QueryState;

/// Concatenates every tag segment in application order.
///
/// Aggregation and analysis segments end in `/`, so the leading `/` of whatever
/// follows them is dropped. The result has no data-format suffix; the fetch stage appends it with
/// [`with_data_suffix`].
pub fn generate(state: &QueryState) -> String {
    let mut url = String::new();
    for tag in state.tags() {
        let segment = tag.segment();
        let segment = if url.ends_with('/') {
            segment.strip_prefix('/').unwrap_or(segment.as_str())
        } else {
            segment.as_str()
        };
        url.push_str(segment);
    }
    url
}

/// Appends the file-format selector (for example `data.nc`) to a generated query.
pub fn with_data_suffix(query: &str, suffix: &str) -> String {
    format!(
        "{}/{}",
        query.trim_end_matches('/'),
        suffix.trim_start_matches('/')
    )
}

/// Plain decimal rendering: shortest round-trip digits, never an exponent,
/// integral values without a fraction and no negative zero.
pub(crate) fn format_decimal(value: f64) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    // f64's Display never switches to scientific notation.
    format!("{}", value)
}
