//! Named colormaps sampled by linear interpolation between sRGB stops.

use lic_core::LicError;

/// All recognised colormap names.
const COLORMAP_NAMES: &[&str] = &["gray", "inferno", "viridis", "ocean"];

const GRAY: &[[u8; 3]] = &[[0x00, 0x00, 0x00], [0xff, 0xff, 0xff]];

const INFERNO: &[[u8; 3]] = &[
    [0x00, 0x00, 0x04],
    [0x42, 0x0a, 0x68],
    [0x93, 0x26, 0x67],
    [0xdd, 0x51, 0x3a],
    [0xfc, 0xa5, 0x0a],
    [0xfc, 0xff, 0xa4],
];

const VIRIDIS: &[[u8; 3]] = &[
    [0x44, 0x01, 0x54],
    [0x3b, 0x52, 0x8b],
    [0x21, 0x91, 0x8c],
    [0x5e, 0xc9, 0x62],
    [0xfd, 0xe7, 0x25],
];

const OCEAN: &[[u8; 3]] = &[
    [0x00, 0x1f, 0x3f],
    [0x00, 0x33, 0x66],
    [0x00, 0x5f, 0x73],
    [0x0a, 0x93, 0x96],
    [0x94, 0xd2, 0xbd],
];

/// A colormap: evenly spaced colour stops, `sample(0.0)` is the first.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Colormap {
    name: &'static str,
    stops: &'static [[u8; 3]],
}

impl Colormap {
    pub fn gray() -> Self {
        Self {
            name: "gray",
            stops: GRAY,
        }
    }

    /// Black through purple and orange to pale yellow.
    pub fn inferno() -> Self {
        Self {
            name: "inferno",
            stops: INFERNO,
        }
    }

    /// Purple through teal to yellow.
    pub fn viridis() -> Self {
        Self {
            name: "viridis",
            stops: VIRIDIS,
        }
    }

    /// Deep blues to cyan.
    pub fn ocean() -> Self {
        Self {
            name: "ocean",
            stops: OCEAN,
        }
    }

    /// Looks a colormap up by name.
    ///
    /// Returns `LicError::UnknownColormap` if the name is not recognised.
    pub fn from_name(name: &str) -> Result<Self, LicError> {
        match name {
            "gray" | "grey" => Ok(Self::gray()),
            "inferno" => Ok(Self::inferno()),
            "viridis" => Ok(Self::viridis()),
            "ocean" => Ok(Self::ocean()),
            _ => Err(LicError::UnknownColormap(name.to_string())),
        }
    }

    pub fn list_names() -> &'static [&'static str] {
        COLORMAP_NAMES
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Colour at `t`, clamped to `[0, 1]`, as linear-interpolated sRGB in `[0, 1]`.
    ///
    /// Returns `None` for NaN.
    pub fn sample(&self, t: f64) -> Option<[f64; 3]> {
        if t.is_nan() {
            return None;
        }
        let t = t.clamp(0.0, 1.0);
        let n = self.stops.len();
        let scaled = t * (n - 1) as f64;
        let idx = (scaled as usize).min(n - 2);
        let frac = scaled - idx as f64;
        let (a, b) = (self.stops[idx], self.stops[idx + 1]);
        Some(std::array::from_fn(|k| {
            let lo = f64::from(a[k]) / 255.0;
            let hi = f64::from(b[k]) / 255.0;
            lo + frac * (hi - lo)
        }))
    }
}

impl Default for Colormap {
    fn default() -> Self {
        Self::gray()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_listed_name_resolves() {
        for name in Colormap::list_names() {
            assert_eq!(Colormap::from_name(name).unwrap().name(), *name);
        }
        assert!(matches!(
            Colormap::from_name("jet"),
            Err(LicError::UnknownColormap(_))
        ));
    }

    #[test]
    fn gray_is_identity() {
        let g = Colormap::gray();
        assert_eq!(g.sample(0.0), Some([0.0, 0.0, 0.0]));
        assert_eq!(g.sample(1.0), Some([1.0, 1.0, 1.0]));
        let [r, gg, b] = g.sample(0.25).unwrap();
        assert!((r - 0.25).abs() < 1e-12 && r == gg && gg == b);
    }

    #[test]
    fn sample_clamps_and_rejects_nan() {
        let v = Colormap::viridis();
        assert_eq!(v.sample(-3.0), v.sample(0.0));
        assert_eq!(v.sample(7.0), v.sample(1.0));
        assert_eq!(v.sample(f64::NAN), None);
    }

    #[test]
    fn endpoints_match_first_and_last_stops() {
        let m = Colormap::inferno();
        let first = m.sample(0.0).unwrap();
        let last = m.sample(1.0).unwrap();
        assert!((first[2] - 4.0 / 255.0).abs() < 1e-12);
        assert!((last[0] - 252.0 / 255.0).abs() < 1e-12);
    }
}
