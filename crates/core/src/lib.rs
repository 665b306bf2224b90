#![deny(unsafe_code)]
//! Core of the LIC workspace.
//!
//! Resolves a working precision for mixed-width inputs, resamples mesh data
//! onto a uniform grid, traces streamlines through the resampled field and
//! convolves a noise texture along them. Also provides hillshade relief,
//! analytic field sources, the `Xorshift64` PRNG, `Recipe` and parameter
//! helpers.

pub mod convolve;
pub mod error;
pub mod field_source;
pub mod grid;
pub mod kernel;
pub mod noise_texture;
pub mod params;
pub mod pipeline;
pub mod precision;
pub mod prng;
pub mod recipe;
pub mod regrid;
pub mod shade;
pub mod stream;

pub use convolve::{convolve_pixel, lic_dyn, line_integral_convolution, LicParams};
pub use error::LicError;
pub use field_source::FieldSource;
pub use grid::{meshgrid, DynGrid, Grid, Indexing};
pub use kernel::KernelShape;
pub use noise_texture::noise_texture;
pub use pipeline::{render, AxisSpacing, BoxSpec, LicImage};
pub use precision::{resolve, Operand, Precision, Real, Scalar};
pub use prng::Xorshift64;
pub use recipe::Recipe;
pub use regrid::{regrid, Bounds, DynResampled, RegridInput, Resampled};
pub use shade::{hillshade, ShadeParams};
pub use stream::{Direction, Integrator, Streamline, Termination, Tracer};
