/// Artifact naming
///
/// Names are `<prefix>_<uuid>.<ext>` with a random 128-bit v4 UUID, so two
/// concurrent requests for the same inputs never share a name and names
/// cannot be predicted from request content.
use uuid::Uuid;

use super::ArtifactKind;
use crate::error::ArtifactError;

pub fn unique_name(kind: ArtifactKind, extension: &str) -> String {
    format!("{}_{}.{}", kind.prefix(), Uuid::new_v4().simple(), extension)
}

/// Reject anything that could address a file outside the artifact area.
///
/// A valid name is a single path component of ASCII letters, digits,
/// '_', '-' and '.', not starting with '.', never containing "..".
pub fn validate_name(name: &str) -> Result<(), ArtifactError> {
    let allowed = |c: char| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.');

    if name.is_empty()
        || name.len() > 255
        || name.starts_with('.')
        || name.contains("..")
        || !name.chars().all(allowed)
    {
        return Err(ArtifactError::InvalidName(name.to_string()));
    }
    Ok(())
}

/// Media type implied by an artifact name's extension
pub fn media_type_for(name: &str) -> String {
    mime_guess::from_path(name)
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}

/// Reduce a caller-supplied file name to a safe extension
pub fn sanitized_extension(file_name: &str) -> String {
    file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext)
        .filter(|ext| !ext.is_empty() && ext.len() <= 8 && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(str::to_ascii_lowercase)
        .unwrap_or_else(|| "bin".to_string())
}
