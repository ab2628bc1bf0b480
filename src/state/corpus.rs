use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::ImageFormat;
use tracing::{debug, warn};
use walkdir::WalkDir;

use super::data::ImageRef;
use crate::config::Config;
use crate::error::ImageError;

/// The ImageStore resolves identifiers against the read-only corpus.
/// It is the only component that reads the corpus directory.
#[derive(Clone)]
pub struct ImageStore {
    config: Arc<Config>,
}

impl ImageStore {
    pub fn new(config: Arc<Config>) -> Self {
        Self { config }
    }

    /// Root directory of the corpus
    pub fn root(&self) -> &Path {
        &self.config.corpus_dir
    }

    /// List image identifiers in directory-listing order.
    /// Only top-level files with a recognized extension are returned.
    pub fn list_available(&self) -> Result<Vec<String>, ImageError> {
        let root = self.root();
        let mut images = Vec::new();

        for entry in WalkDir::new(root).min_depth(1).max_depth(1) {
            let entry = entry.map_err(|e| ImageError::Io {
                path: root.to_path_buf(),
                source: e.into(),
            })?;

            if !entry.file_type().is_file() {
                continue;
            }

            let filename = entry.file_name().to_string_lossy().to_string();
            if self.config.has_image_extension(&filename) {
                images.push(filename);
            }
        }

        debug!(count = images.len(), "listed corpus");
        Ok(images)
    }

    /// Canonical on-disk location of an identifier, without decoding it.
    ///
    /// Fails with `NotFound` for anything `list_available` would not
    /// return: path separators, hidden names, unknown extensions, or
    /// a missing file.
    pub fn path_for(&self, id: &str) -> Result<PathBuf, ImageError> {
        if !is_plain_file_name(id) || !self.config.has_image_extension(id) {
            return Err(ImageError::NotFound(id.to_string()));
        }

        let path = self.root().join(id);
        if !path.is_file() {
            return Err(ImageError::NotFound(id.to_string()));
        }
        Ok(path)
    }

    /// Read and decode an identifier into an `ImageRef`
    pub fn resolve(&self, id: &str) -> Result<ImageRef, ImageError> {
        let path = self.path_for(id)?;
        let bytes = std::fs::read(&path).map_err(|source| ImageError::Io {
            path: path.clone(),
            source,
        })?;
        decode_bytes(id, &bytes)
    }
}

/// Decode an in-memory encoded image under a given identifier
pub fn decode_bytes(id: &str, bytes: &[u8]) -> Result<ImageRef, ImageError> {
    let decode_error = |reason: String| ImageError::Decode {
        id: id.to_string(),
        reason,
    };

    if bytes.is_empty() {
        return Err(decode_error("file is empty".to_string()));
    }

    let format = image::guess_format(bytes).map_err(|e| decode_error(e.to_string()))?;
    let pixels = image::load_from_memory_with_format(bytes, format).map_err(|e| {
        warn!(image_id = id, error = %e, "failed to decode image");
        decode_error(e.to_string())
    })?;

    Ok(ImageRef {
        id: id.to_string(),
        pixels,
        format,
    })
}

/// A single path component that is not hidden and not a traversal
fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('.')
        && !name.contains(['/', '\\', '\0'])
        && Path::new(name).file_name().map(|f| f == name).unwrap_or(false)
}

/// Encoding used when writing a derivative of an image in `format`.
/// Formats without an encoder fall back to PNG.
pub fn output_format_for(format: ImageFormat) -> ImageFormat {
    match format {
        ImageFormat::Jpeg => ImageFormat::Jpeg,
        _ => ImageFormat::Png,
    }
}
