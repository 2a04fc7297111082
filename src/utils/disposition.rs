//! `Content-Disposition` helpers shared by the server response and the client.

/// Name used when a response does not announce a filename.
pub const DEFAULT_RESULT_FILENAME: &str = "documento-abnt";

/// Builds `attachment; filename="<filename>"`.
///
/// The filename is expected to have been through
/// [`sanitize_filename`](crate::utils::validation::sanitize_filename).
pub fn attachment(filename: &str) -> String {
    format!("attachment; filename=\"{}\"", filename)
}

/// Extracts the quoted value after `filename="`.
///
/// The match is greedy: everything up to the last quote on the header
/// counts, and at least one character is required.
pub fn filename_from_header(value: &str) -> Option<String> {
    const MARKER: &str = "filename=\"";

    let start = value.find(MARKER)? + MARKER.len();
    let rest = &value[start..];
    let end = rest.rfind('"')?;
    if end == 0 {
        return None;
    }

    Some(rest[..end].to_string())
}

/// Same as [`filename_from_header`] but falls back to [`DEFAULT_RESULT_FILENAME`].
pub fn filename_or_default(value: Option<&str>) -> String {
    value
        .and_then(filename_from_header)
        .unwrap_or_else(|| DEFAULT_RESULT_FILENAME.to_string())
}
