//! Output artifact names

use crate::constants::{DEFAULT_ASSEMBLY_NAME, DEFAULT_MERGE_NAME};

/// Replace every character outside `[A-Za-z0-9_-]` with `_`
pub fn sanitize_identifier(identifier: &str) -> String {
    identifier
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Sanitized identifier, or `default` when the identifier is blank
pub fn document_identifier(identifier: &str, default: &str) -> String {
    let trimmed = identifier.trim();
    if trimmed.is_empty() {
        default.to_string()
    } else {
        sanitize_identifier(trimmed)
    }
}

/// `{identifier}.pdf` for an assembled document
pub fn assembly_file_name(identifier: &str) -> String {
    let identifier = document_identifier(identifier, DEFAULT_ASSEMBLY_NAME);
    format!("{}.pdf", identifier)
}

/// `{identifier}.pdf` for a merged document
pub fn merge_file_name(identifier: &str) -> String {
    let identifier = document_identifier(identifier, DEFAULT_MERGE_NAME);
    format!("{}.pdf", identifier)
}

/// `page-{n}.png` for the page at zero-based `page_index`
pub fn page_file_name(page_index: usize) -> String {
    format!("page-{}.png", page_index + 1)
}

pub fn compressed_file_name(original: &str) -> String {
    format!("compressed-{}", original)
}
