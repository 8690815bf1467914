use std::path::{Path, PathBuf};

use crate::assets::decode::{parse_data_url, read_source};
use crate::assets::thumbnail::make_thumbnail;
use crate::foundation::error::{EneftyError, EneftyResult};

/// Where a variant's pixels come from.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum VariantSource {
    /// Image file on disk.
    Path(PathBuf),
    /// Inline `data:` URL carrying base64 image bytes.
    Embedded(String),
}

impl VariantSource {
    /// Interpret a stored source reference. Strings starting with `data:` are embedded data,
    /// everything else is a filesystem path.
    pub fn parse(reference: &str) -> Self {
        if reference.starts_with("data:") {
            Self::Embedded(reference.to_string())
        } else {
            Self::Path(PathBuf::from(reference))
        }
    }

    /// Render the source back into its stored reference form.
    pub fn to_reference(&self) -> String {
        match self {
            Self::Path(p) => p.to_string_lossy().into_owned(),
            Self::Embedded(url) => url.clone(),
        }
    }
}

/// One selectable image of a layer. Immutable once created.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Variant {
    source: VariantSource,
    name: String,
    thumb: String,
}

impl Variant {
    /// Assemble a variant from already-known parts (no IO).
    pub fn new(source: VariantSource, name: impl Into<String>, thumb: impl Into<String>) -> Self {
        Self {
            source,
            name: name.into(),
            thumb: thumb.into(),
        }
    }

    /// Load an image file, naming the variant after the file and precomputing its preview.
    pub fn from_path(path: impl AsRef<Path>) -> EneftyResult<Self> {
        let path = path.as_ref();
        let source = VariantSource::Path(path.to_path_buf());
        let bytes = read_source(&source)?;
        let thumb = make_thumbnail(&bytes)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| {
                EneftyError::validation(format!("'{}' has no file name", path.display()))
            })?;
        Ok(Self::new(source, name, thumb))
    }

    /// Build a variant from an inline `data:` URL.
    pub fn from_data_url(url: impl Into<String>, name: impl Into<String>) -> EneftyResult<Self> {
        let url = url.into();
        let bytes = parse_data_url(&url)?;
        let thumb = make_thumbnail(&bytes)?;
        Ok(Self::new(VariantSource::Embedded(url), name, thumb))
    }

    /// Source reference.
    pub fn source(&self) -> &VariantSource {
        &self.source
    }

    /// Display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Small PNG preview as a data URL (may be empty for sources built without one).
    pub fn thumb(&self) -> &str {
        &self.thumb
    }
}

#[cfg(test)]
#[path = "../../tests/unit/stack/variant.rs"]
mod tests;
