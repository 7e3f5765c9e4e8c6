use uuid::Uuid;

/// Extension used when the upload carries no filename at all.
pub const FALLBACK_EXTENSION: &str = "file";

/// Extract the storage extension from an uploaded filename.
///
/// Lower-cased text after the last `.`; a filename without a dot yields the
/// whole name; no filename yields [`FALLBACK_EXTENSION`].
pub fn file_extension(filename: Option<&str>) -> String {
    match filename {
        Some(name) if !name.is_empty() => name
            .rsplit('.')
            .next()
            .unwrap_or(FALLBACK_EXTENSION)
            .to_lowercase(),
        _ => FALLBACK_EXTENSION.to_owned(),
    }
}

/// Derive a fresh storage key for a patient's upload:
/// `{patientId}/{uuid}.{ext}`.
///
/// The embedded UUID is generated per call, never derived from the content,
/// so repeated uploads of the same file get distinct keys.
pub fn derive_blob_key(patient_id: &str, filename: Option<&str>) -> String {
    let ext = file_extension(filename);
    format!("{patient_id}/{}.{ext}", Uuid::new_v4())
}
