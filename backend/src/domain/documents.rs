//! Filename hygiene for uploaded documents and invoices.

/// Extensions accepted for document and invoice uploads.
pub const ALLOWED_EXTENSIONS: [&str; 11] = [
    "pdf", "doc", "docx", "png", "jpg", "jpeg", "gif", "svg", "webp", "xlsx", "xls",
];

/// Check whether a filename carries an allowed extension.
#[must_use]
pub fn allowed_file(filename: &str) -> bool {
    filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
        .is_some_and(|ext| ALLOWED_EXTENSIONS.contains(&ext.as_str()))
}

/// Strip any directory components, keeping just the final path segment.
///
/// Stored records may carry `/static/documents/x.pdf`, `documents/x.pdf`, or
/// a bare name; serving and deletion always compare on the basename.
#[must_use]
pub fn basename(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

/// Sanitise a client-supplied filename to a safe single path component.
///
/// Keeps ASCII alphanumerics, dash, underscore, and dot; collapses everything
/// else to underscores and refuses names that reduce to nothing or to dot
/// runs only.
#[must_use]
pub fn sanitize_filename(raw: &str) -> Option<String> {
    let name = basename(raw);
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.' {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_matches('.').to_owned();
    if cleaned.is_empty() || cleaned.chars().all(|c| c == '.' || c == '_') {
        return None;
    }
    Some(cleaned)
}

/// Normalise a stored document path to its public `static/documents/*` form.
/// Full http(s) URLs pass through untouched; empty input stays empty.
#[must_use]
pub fn normalize_doc_path(path: &str) -> String {
    let path = path.trim();
    if path.is_empty() {
        return String::new();
    }
    if path.starts_with("http://") || path.starts_with("https://") {
        return path.to_owned();
    }
    let name = basename(path);
    if name.is_empty() {
        return String::new();
    }
    format!("static/documents/{name}")
}
