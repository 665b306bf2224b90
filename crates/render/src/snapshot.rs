//! PNG output of a rendered [`LicImage`].
//!
//! Feature-gated behind `png` (default on) so library users that encode
//! pixels themselves do not pull in the `image` crate. The pixel conversion
//! lives in [`crate::pixel`] (always available).

use lic_core::{LicError, LicImage};
use std::path::Path;
use tracing::debug;

use crate::pixel::{lic_to_rgba, RenderOptions};

/// Writes `lic` as an RGBA PNG.
///
/// Returns `LicError::InvalidDimensions` if the image dimensions overflow
/// `u32`, or `LicError::Io` on write failure.
pub fn write_png(lic: &LicImage, opts: &RenderOptions, path: &Path) -> Result<(), LicError> {
    let rgba = lic_to_rgba(lic, opts)?;
    let (rows, cols) = lic.image.shape();
    let w = u32::try_from(cols).map_err(|_| LicError::InvalidDimensions)?;
    let h = u32::try_from(rows).map_err(|_| LicError::InvalidDimensions)?;
    let img = image::RgbaImage::from_raw(w, h, rgba)
        .ok_or_else(|| LicError::Io("RGBA buffer size mismatch".into()))?;
    img.save(path).map_err(|e| LicError::Io(e.to_string()))?;
    debug!(path = %path.display(), w, h, "png written");
    Ok(())
}
