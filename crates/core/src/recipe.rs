//! Reproducible description of a LIC render.
//!
//! A [`Recipe`] captures everything needed to recreate an image: the named
//! field and its parameters, the sampled box, the LIC settings, optional
//! shading and the colouring choices.

use crate::convolve::LicParams;
use crate::error::LicError;
use crate::pipeline::BoxSpec;
use crate::shade::ShadeParams;
use serde::{Deserialize, Serialize};

/// Everything needed to reproduce one render.
///
/// Two identical recipes fed to the same binary produce bit-identical output.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Recipe {
    /// Registered field name, e.g. `"vortex"`.
    pub field: String,
    /// Field parameters, interpreted by the field registry.
    #[serde(default = "empty_object")]
    pub params: serde_json::Value,
    #[serde(default)]
    pub domain: BoxSpec,
    #[serde(default)]
    pub lic: LicParams,
    #[serde(default)]
    pub shade: Option<ShadeParams>,
    #[serde(default = "default_colormap")]
    pub colormap: String,
    /// Blend the colormapped field magnitude over the texture.
    #[serde(default)]
    pub overlay: bool,
}

fn empty_object() -> serde_json::Value {
    serde_json::Value::Object(serde_json::Map::new())
}

fn default_colormap() -> String {
    "gray".to_string()
}

impl Recipe {
    /// A recipe with default box, LIC settings and colouring.
    pub fn new(field: &str) -> Self {
        Self {
            field: field.to_string(),
            params: empty_object(),
            domain: BoxSpec::default(),
            lic: LicParams::default(),
            shade: None,
            colormap: default_colormap(),
            overlay: false,
        }
    }

    /// Validates the box, the LIC settings and the shading.
    pub fn validate(&self) -> Result<(), LicError> {
        if self.field.is_empty() {
            return Err(LicError::UnknownField(String::new()));
        }
        self.domain.validate()?;
        self.lic.validate()?;
        if let Some(shade) = &self.shade {
            shade.validate()?;
        }
        Ok(())
    }
}
