//! Record-set keys and the key-to-file-name policy shared by file-backed stores.

use crate::StorageError;

/// Company profile record (single object).
pub const COMPANY_INFO_KEY: &str = "constructionApp_companyInfo";
/// Client list record.
pub const CLIENTS_KEY: &str = "constructionApp_clients";
/// Work item list record.
pub const WORK_ITEMS_KEY: &str = "constructionApp_workItems";
/// Invoice list record.
pub const INVOICES_KEY: &str = "constructionApp_invoices";
/// Estimate list record.
pub const ESTIMATES_KEY: &str = "constructionApp_estimates";
/// Unit lookup list record.
pub const UNITS_KEY: &str = "constructionApp_units";
/// Category lookup list record.
pub const CATEGORIES_KEY: &str = "constructionApp_categories";
/// Company stamp image record (data URL string).
pub const STAMP_IMAGE_KEY: &str = "constructionApp_stampImage";

/// Every record-set key the application persists.
pub const RECORD_SET_KEYS: [&str; 8] = [
    COMPANY_INFO_KEY,
    CLIENTS_KEY,
    WORK_ITEMS_KEY,
    INVOICES_KEY,
    ESTIMATES_KEY,
    UNITS_KEY,
    CATEGORIES_KEY,
    STAMP_IMAGE_KEY,
];

/// Name shared by the legacy all-keys document and the sandboxed shared document.
pub const STORE_DOCUMENT_FILE: &str = "store.json";
/// Fixed file name of the derived spreadsheet mirror.
pub const MIRROR_FILE_NAME: &str = "latest.xlsx";

const RECORD_FILE_EXTENSION: &str = ".json";

/// Validates that `key` can be stored as `<key>.json`.
///
/// # Errors
///
/// Returns [`StorageError::InvalidKey`] for empty keys, keys with path separators or other
/// unsupported characters, dot-prefixed keys, and the key reserved by the legacy document.
pub fn validate_record_key(key: &str) -> Result<(), StorageError> {
    let well_formed = !key.is_empty()
        && !key.starts_with('.')
        && key
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '.' | '_' | '-'));
    if !well_formed || record_file_name_unchecked(key) == STORE_DOCUMENT_FILE {
        return Err(StorageError::InvalidKey(key.to_string()));
    }
    Ok(())
}

/// Returns the per-key file name for `key`.
///
/// # Errors
///
/// Returns an error when `key` fails [`validate_record_key`].
pub fn record_file_name(key: &str) -> Result<String, StorageError> {
    validate_record_key(key)?;
    Ok(record_file_name_unchecked(key))
}

/// Recovers a record key from a per-key file name, if it is one.
pub fn record_key_from_file_name(file_name: &str) -> Option<&str> {
    let key = file_name.strip_suffix(RECORD_FILE_EXTENSION)?;
    validate_record_key(key).ok().map(|()| key)
}

/// Validates a plain file name (no directories) for binary writes, defaulting blanks to the
/// mirror file name.
///
/// # Errors
///
/// Returns [`StorageError::InvalidFileName`] when the trimmed name contains a separator or is
/// a relative path component.
pub fn plain_file_name(name: &str) -> Result<&str, StorageError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Ok(MIRROR_FILE_NAME);
    }
    if trimmed == "."
        || trimmed == ".."
        || trimmed.contains(['/', '\\'])
        || trimmed.chars().any(char::is_control)
    {
        return Err(StorageError::InvalidFileName(name.to_string()));
    }
    Ok(trimmed)
}

fn record_file_name_unchecked(key: &str) -> String {
    format!("{key}{RECORD_FILE_EXTENSION}")
}
