//! Resampling of scattered mesh data onto a uniform image-aligned grid.
//!
//! The input mesh is given by two coordinate arrays `xx`, `yy` that need not
//! be uniform, or even axis-aligned. Their finite points are Delaunay
//! triangulated and values are interpolated barycentrically inside each
//! triangle, so every output point inside the convex hull of the input
//! points gets a value. Points outside the hull are NaN; nothing is ever
//! extrapolated.
//!
//! Output layout: every resampled array has shape `(size, size)`; row `j`
//! holds `yo[j]` and column `i` holds `xo[i]`.

use crate::error::LicError;
use crate::grid::{DynGrid, Grid};
use crate::precision::{bound_operand, resolve, Operand, Precision, Real, Scalar};
use crate::params::param_scalar;
use delaunator::{triangulate, Point};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, instrument};

/// Upper limit on spatial bins per axis in the triangle index.
const MAX_BINS_PER_AXIS: usize = 1024;

/// Optional clipping window in coordinate space. Unset sides use the data extent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Bounds {
    pub xmin: Option<Scalar>,
    pub xmax: Option<Scalar>,
    pub ymin: Option<Scalar>,
    pub ymax: Option<Scalar>,
}

impl Bounds {
    /// No explicit bounds.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn xmin(mut self, v: impl Into<Scalar>) -> Self {
        self.xmin = Some(v.into());
        self
    }

    pub fn xmax(mut self, v: impl Into<Scalar>) -> Self {
        self.xmax = Some(v.into());
        self
    }

    pub fn ymin(mut self, v: impl Into<Scalar>) -> Self {
        self.ymin = Some(v.into());
        self
    }

    pub fn ymax(mut self, v: impl Into<Scalar>) -> Self {
        self.ymax = Some(v.into());
        self
    }

    /// Reads `xmin`, `xmax`, `ymin`, `ymax` from a JSON object; missing keys stay unset.
    pub fn from_json(params: &Value) -> Self {
        Self {
            xmin: param_scalar(params, "xmin"),
            xmax: param_scalar(params, "xmax"),
            ymin: param_scalar(params, "ymin"),
            ymax: param_scalar(params, "ymax"),
        }
    }

    fn operands(&self) -> [Operand; 4] {
        [
            bound_operand(self.xmin),
            bound_operand(self.xmax),
            bound_operand(self.ymin),
            bound_operand(self.ymax),
        ]
    }
}

/// Everything the regridder consumes. Arrays are borrowed; outputs never alias them.
#[derive(Debug, Clone, Copy)]
pub struct RegridInput<'a> {
    pub xx: &'a DynGrid,
    pub yy: &'a DynGrid,
    pub v1: &'a DynGrid,
    pub v2: &'a DynGrid,
    pub field: Option<&'a DynGrid>,
    pub bounds: Bounds,
    /// Length of each output axis.
    pub size: usize,
}

impl RegridInput<'_> {
    /// Precision operands of every array and every bound.
    pub fn operands(&self) -> Vec<Operand> {
        let mut ops = vec![
            Operand::Array(self.xx.precision()),
            Operand::Array(self.yy.precision()),
            Operand::Array(self.v1.precision()),
            Operand::Array(self.v2.precision()),
        ];
        if let Some(f) = self.field {
            ops.push(Operand::Array(f.precision()));
        }
        ops.extend(self.bounds.operands());
        ops
    }

    /// Checks that every array shares the shape of `xx` and that a cell fits.
    pub fn validate(&self) -> Result<(), LicError> {
        if self.size == 0 || self.size.checked_mul(self.size).is_none() {
            return Err(LicError::InvalidSize(self.size));
        }
        let (rows, cols) = self.xx.shape();
        let named = [
            ("yy", Some(self.yy)),
            ("v1", Some(self.v1)),
            ("v2", Some(self.v2)),
            ("field", self.field),
        ];
        for (name, grid) in named {
            let Some(grid) = grid else { continue };
            let (r, c) = grid.shape();
            if (r, c) != (rows, cols) {
                return Err(LicError::InvalidShape {
                    name: name.to_string(),
                    rows: r,
                    cols: c,
                    expected_rows: rows,
                    expected_cols: cols,
                });
            }
        }
        if rows < 2 || cols < 2 {
            return Err(LicError::MeshTooSmall { rows, cols });
        }
        Ok(())
    }
}

/// Uniform-grid resampling result at one precision.
#[derive(Debug, Clone, PartialEq)]
pub struct Resampled<T> {
    /// Strictly increasing x axis, `size` long.
    pub xo: Vec<T>,
    /// Strictly increasing y axis, `size` long.
    pub yo: Vec<T>,
    pub v1o: Grid<T>,
    pub v2o: Grid<T>,
    /// Present iff a scalar field was supplied.
    pub fieldo: Option<Grid<T>>,
}

/// Resampling result tagged with its resolved precision.
#[derive(Debug, Clone, PartialEq)]
pub enum DynResampled {
    Single(Resampled<f32>),
    Double(Resampled<f64>),
}

impl DynResampled {
    pub fn precision(&self) -> Precision {
        match self {
            DynResampled::Single(_) => Precision::Single,
            DynResampled::Double(_) => Precision::Double,
        }
    }

    /// Output axis length.
    pub fn size(&self) -> usize {
        match self {
            DynResampled::Single(r) => r.xo.len(),
            DynResampled::Double(r) => r.xo.len(),
        }
    }

    /// Resampled scalar field, if one was supplied.
    pub fn field(&self) -> Option<DynGrid> {
        match self {
            DynResampled::Single(r) => r.fieldo.clone().map(DynGrid::Single),
            DynResampled::Double(r) => r.fieldo.clone().map(DynGrid::Double),
        }
    }
}

/// Resamples `v1`, `v2` and the optional `field` onto a uniform grid.
///
/// Shapes are validated first, then the working precision is resolved from
/// every array and explicit bound, then the axis ranges are fixed. Output
/// points outside the input mesh are NaN.
#[instrument(skip_all, fields(size = input.size, mesh = ?input.xx.shape()))]
pub fn regrid(input: &RegridInput<'_>) -> Result<DynResampled, LicError> {
    input.validate()?;
    let precision = resolve(input.operands())?;
    debug!(%precision, "resolved working precision");
    match precision {
        Precision::Single => resample::<f32>(input).map(DynResampled::Single),
        Precision::Double => resample::<f64>(input).map(DynResampled::Double),
    }
}

fn resample<T: Real>(input: &RegridInput<'_>) -> Result<Resampled<T>, LicError> {
    let xx = input.xx.cast::<T>();
    let yy = input.yy.cast::<T>();

    let (xlo, xhi) = axis_range(&xx, input.bounds.xmin, input.bounds.xmax, 'x')?;
    let (ylo, yhi) = axis_range(&yy, input.bounds.ymin, input.bounds.ymax, 'y')?;
    let xo = linspace(xlo, xhi, input.size, 'x')?;
    let yo = linspace(ylo, yhi, input.size, 'y')?;
    debug!(%xlo, %xhi, %ylo, %yhi, "output ranges");

    let mesh = TriMesh::new(&xx, &yy);
    debug!(triangles = mesh.triangles.len(), "mesh triangulated");

    let n = input.size;
    let hits: Vec<Option<Hit<T>>> = (0..n * n)
        .into_par_iter()
        .map(|k| mesh.locate(xo[k % n], yo[k / n]))
        .collect();

    let v1o = interpolate_all(&hits, &input.v1.cast::<T>(), n)?;
    let v2o = interpolate_all(&hits, &input.v2.cast::<T>(), n)?;
    let fieldo = input
        .field
        .map(|f| interpolate_all(&hits, &f.cast::<T>(), n))
        .transpose()?;

    Ok(Resampled {
        xo,
        yo,
        v1o,
        v2o,
        fieldo,
    })
}

/// Effective `[lo, hi]` of one axis: explicit bounds win, else the finite data extent.
fn axis_range<T: Real>(
    coords: &Grid<T>,
    lo: Option<Scalar>,
    hi: Option<Scalar>,
    axis: char,
) -> Result<(T, T), LicError> {
    let extent = coords.finite_range();
    let pick = |bound: Option<Scalar>, fallback: Option<T>| -> T {
        match bound {
            Some(s) => T::cast_f64(s.value()),
            None => fallback.unwrap_or_else(T::nan),
        }
    };
    let lo = pick(lo, extent.map(|e| e.0));
    let hi = pick(hi, extent.map(|e| e.1));
    if !(lo.is_finite() && hi.is_finite() && lo < hi) {
        return Err(LicError::DegenerateRange {
            axis,
            lo: lo.as_f64(),
            hi: hi.as_f64(),
        });
    }
    Ok((lo, hi))
}

/// `n` evenly spaced values from `lo` to `hi` inclusive.
///
/// Fails with `DegenerateRange` when the precision cannot represent `n`
/// distinct values in the range.
fn linspace<T: Real>(lo: T, hi: T, n: usize, axis: char) -> Result<Vec<T>, LicError> {
    if n == 1 {
        return Ok(vec![lo]);
    }
    let span = hi - lo;
    let last = T::cast_f64((n - 1) as f64);
    let mut values: Vec<T> = (0..n)
        .map(|i| lo + span * (T::cast_f64(i as f64) / last))
        .collect();
    values[n - 1] = hi;
    if values.windows(2).any(|w| w[1] <= w[0]) {
        return Err(LicError::DegenerateRange {
            axis,
            lo: lo.as_f64(),
            hi: hi.as_f64(),
        });
    }
    Ok(values)
}

fn interpolate_all<T: Real>(
    hits: &[Option<Hit<T>>],
    values: &Grid<T>,
    n: usize,
) -> Result<Grid<T>, LicError> {
    let data = hits
        .par_iter()
        .map(|hit| hit.map_or_else(T::nan, |h| h.interpolate(values.data())))
        .collect();
    Grid::from_vec(n, n, data)
}

/// Barycentric location of a query point inside one triangle.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Hit<T> {
    vertices: [usize; 3],
    weights: [T; 3],
}

impl<T: Real> Hit<T> {
    fn interpolate(&self, values: &[T]) -> T {
        self.vertices
            .iter()
            .zip(self.weights.iter())
            .fold(T::zero(), |acc, (&v, &w)| acc + w * values[v])
    }
}

#[derive(Debug, Clone, Copy)]
struct Triangle {
    vertices: [usize; 3],
}

/// Delaunay triangulation of the input points with a uniform bin index over
/// triangle bounding boxes.
struct TriMesh<'a, T> {
    xs: &'a [T],
    ys: &'a [T],
    triangles: Vec<Triangle>,
    bins: Vec<Vec<u32>>,
    bins_x: usize,
    bins_y: usize,
    origin: (f64, f64),
    bin_size: (f64, f64),
}

impl<'a, T: Real> TriMesh<'a, T> {
    fn new(xx: &'a Grid<T>, yy: &'a Grid<T>) -> Self {
        let xs = xx.data();
        let ys = yy.data();

        // Triangulate finite points only; `ids` maps back to mesh indices.
        let ids: Vec<usize> = (0..xs.len())
            .filter(|&i| xs[i].is_finite() && ys[i].is_finite())
            .collect();
        let points: Vec<Point> = ids
            .iter()
            .map(|&i| Point {
                x: xs[i].as_f64(),
                y: ys[i].as_f64(),
            })
            .collect();
        let triangles = triangulate(&points)
            .triangles
            .chunks_exact(3)
            .map(|t| [ids[t[0]], ids[t[1]], ids[t[2]]])
            .filter(|&vertices| is_usable(xs, ys, vertices))
            .map(|vertices| Triangle { vertices })
            .collect();

        let mut mesh = Self {
            xs,
            ys,
            triangles,
            bins: Vec::new(),
            bins_x: 0,
            bins_y: 0,
            origin: (0.0, 0.0),
            bin_size: (1.0, 1.0),
        };
        mesh.build_index();
        mesh
    }

    fn bbox(&self, tri: &Triangle) -> (f64, f64, f64, f64) {
        let [a, b, c] = tri.vertices.map(|v| (self.xs[v].as_f64(), self.ys[v].as_f64()));
        (
            a.0.min(b.0).min(c.0),
            a.0.max(b.0).max(c.0),
            a.1.min(b.1).min(c.1),
            a.1.max(b.1).max(c.1),
        )
    }

    fn build_index(&mut self) {
        if self.triangles.is_empty() {
            return;
        }
        let (x0, x1, y0, y1) = self.triangles.iter().map(|t| self.bbox(t)).fold(
            (f64::INFINITY, f64::NEG_INFINITY, f64::INFINITY, f64::NEG_INFINITY),
            |acc, b| (acc.0.min(b.0), acc.1.max(b.1), acc.2.min(b.2), acc.3.max(b.3)),
        );
        let per_axis = ((self.triangles.len() as f64).sqrt().ceil() as usize)
            .clamp(1, MAX_BINS_PER_AXIS);
        self.bins_x = per_axis;
        self.bins_y = per_axis;
        self.origin = (x0, y0);
        self.bin_size = (
            ((x1 - x0) / per_axis as f64).max(f64::MIN_POSITIVE),
            ((y1 - y0) / per_axis as f64).max(f64::MIN_POSITIVE),
        );
        self.bins = vec![Vec::new(); per_axis * per_axis];

        for (i, tri) in self.triangles.iter().enumerate() {
            let (bx0, bx1, by0, by1) = self.bbox(tri);
            let (c0, r0) = self.bin_of(bx0, by0);
            let (c1, r1) = self.bin_of(bx1, by1);
            for r in r0..=r1 {
                for c in c0..=c1 {
                    self.bins[r * self.bins_x + c].push(i as u32);
                }
            }
        }
    }

    fn bin_of(&self, x: f64, y: f64) -> (usize, usize) {
        let clamp = |v: f64, n: usize| -> usize {
            if v.is_nan() || v <= 0.0 {
                0
            } else {
                (v.floor() as usize).min(n - 1)
            }
        };
        (
            clamp((x - self.origin.0) / self.bin_size.0, self.bins_x),
            clamp((y - self.origin.1) / self.bin_size.1, self.bins_y),
        )
    }

    /// First triangle containing `(px, py)`, with its barycentric weights.
    fn locate(&self, px: T, py: T) -> Option<Hit<T>> {
        if self.bins.is_empty() {
            return None;
        }
        let (c, r) = self.bin_of(px.as_f64(), py.as_f64());
        self.bins[r * self.bins_x + c]
            .iter()
            .find_map(|&i| self.barycentric(&self.triangles[i as usize], px, py))
    }

    fn barycentric(&self, tri: &Triangle, px: T, py: T) -> Option<Hit<T>> {
        let [a, b, c] = tri.vertices;
        let (xa, ya) = (self.xs[a], self.ys[a]);
        let (xb, yb) = (self.xs[b], self.ys[b]);
        let (xc, yc) = (self.xs[c], self.ys[c]);

        let denom = (yb - yc) * (xa - xc) + (xc - xb) * (ya - yc);
        let l1 = ((yb - yc) * (px - xc) + (xc - xb) * (py - yc)) / denom;
        let l2 = ((yc - ya) * (px - xc) + (xa - xc) * (py - yc)) / denom;
        let l3 = T::one() - l1 - l2;

        // Points on shared edges and on the hull boundary round to tiny negatives.
        let tol = -T::epsilon() * T::cast_f64(64.0);
        if l1 >= tol && l2 >= tol && l3 >= tol {
            Some(Hit {
                vertices: tri.vertices,
                weights: [l1, l2, l3],
            })
        } else {
            None
        }
    }
}

/// A triangle is usable if its vertices are finite and it has non-zero area
/// at the working precision.
fn is_usable<T: Real>(xs: &[T], ys: &[T], [a, b, c]: [usize; 3]) -> bool {
    let finite = [a, b, c]
        .iter()
        .all(|&v| xs[v].is_finite() && ys[v].is_finite());
    if !finite {
        return false;
    }
    let cross = (xs[b] - xs[a]) * (ys[c] - ys[a]) - (xs[c] - xs[a]) * (ys[b] - ys[a]);
    cross != T::zero() && cross.is_finite()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{meshgrid, Indexing};

    fn linspace_f64(lo: f64, hi: f64, n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| lo + (hi - lo) * i as f64 / (n - 1) as f64)
            .collect()
    }

    /// Mesh over `[0, 10] x [0, 20]` with a linear field `v1 = x + 2y`, `v2 = x - y`.
    fn linear_mesh(indexing: Indexing) -> (DynGrid, DynGrid, DynGrid, DynGrid) {
        let xv = linspace_f64(0.0, 10.0, 6);
        let yv = linspace_f64(0.0, 20.0, 5);
        let (xx, yy) = meshgrid(&xv, &yv, indexing).unwrap();
        let v1 = Grid::from_fn(xx.rows(), xx.cols(), |r, c| xx.get(r, c) + 2.0 * yy.get(r, c))
            .unwrap();
        let v2 =
            Grid::from_fn(xx.rows(), xx.cols(), |r, c| xx.get(r, c) - yy.get(r, c)).unwrap();
        (xx.into(), yy.into(), v1.into(), v2.into())
    }

    fn input<'a>(
        mesh: &'a (DynGrid, DynGrid, DynGrid, DynGrid),
        bounds: Bounds,
        size: usize,
    ) -> RegridInput<'a> {
        RegridInput {
            xx: &mesh.0,
            yy: &mesh.1,
            v1: &mesh.2,
            v2: &mesh.3,
            field: None,
            bounds,
            size,
        }
    }

    fn double(r: DynResampled) -> Resampled<f64> {
        match r {
            DynResampled::Double(r) => r,
            DynResampled::Single(_) => panic!("expected double precision output"),
        }
    }

    #[test]
    fn linear_field_is_reproduced_exactly() {
        let mesh = linear_mesh(Indexing::Xy);
        let out = double(regrid(&input(&mesh, Bounds::new(), 7)).unwrap());
        for j in 0..7 {
            for i in 0..7 {
                let (x, y) = (out.xo[i], out.yo[j]);
                let v1 = out.v1o.get(j, i);
                let v2 = out.v2o.get(j, i);
                assert!((v1 - (x + 2.0 * y)).abs() < 1e-9, "v1 at ({x}, {y}) = {v1}");
                assert!((v2 - (x - y)).abs() < 1e-9, "v2 at ({x}, {y}) = {v2}");
            }
        }
    }

    #[test]
    fn ij_and_xy_meshes_agree() {
        let xy = linear_mesh(Indexing::Xy);
        let ij = linear_mesh(Indexing::Ij);
        let a = double(regrid(&input(&xy, Bounds::new(), 9)).unwrap());
        let b = double(regrid(&input(&ij, Bounds::new(), 9)).unwrap());
        assert_eq!(a.xo, b.xo);
        assert_eq!(a.yo, b.yo);
        for (va, vb) in a.v1o.data().iter().zip(b.v1o.data()) {
            assert!((va - vb).abs() < 1e-9);
        }
    }

    #[test]
    fn axes_span_data_extent_without_bounds() {
        let mesh = linear_mesh(Indexing::Xy);
        let out = double(regrid(&input(&mesh, Bounds::new(), 4)).unwrap());
        assert_eq!(out.xo.first().copied(), Some(0.0));
        assert_eq!(out.xo.last().copied(), Some(10.0));
        assert_eq!(out.yo.first().copied(), Some(0.0));
        assert_eq!(out.yo.last().copied(), Some(20.0));
        assert!(out.xo.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn explicit_bounds_outside_data_give_nan() {
        let mesh = linear_mesh(Indexing::Xy);
        let bounds = Bounds::new().xmin(-10).xmax(10).ymin(0).ymax(20);
        let out = double(regrid(&input(&mesh, bounds, 5)).unwrap());
        assert_eq!(out.xo, vec![-10.0, -5.0, 0.0, 5.0, 10.0]);
        for j in 0..5 {
            assert!(out.v1o.get(j, 0).is_nan());
            assert!(out.v1o.get(j, 1).is_nan());
            assert!(out.v2o.get(j, 1).is_nan());
            assert!(out.v1o.get(j, 2).is_finite());
            assert!(out.v1o.get(j, 4).is_finite());
        }
    }

    #[test]
    fn bounds_inside_data_zoom_in() {
        let mesh = linear_mesh(Indexing::Xy);
        let bounds = Bounds::new().xmin(2.0).xmax(4.0).ymin(5.0).ymax(6.0);
        let out = double(regrid(&input(&mesh, bounds, 3)).unwrap());
        assert_eq!(out.xo, vec![2.0, 3.0, 4.0]);
        assert_eq!(out.yo, vec![5.0, 5.5, 6.0]);
        assert_eq!(out.v1o.nan_count(), 0);
    }

    #[test]
    fn degenerate_axis_is_rejected() {
        let mesh = linear_mesh(Indexing::Xy);
        let bounds = Bounds::new().xmin(3.0).xmax(3.0);
        let err = regrid(&input(&mesh, bounds, 4)).unwrap_err();
        assert!(matches!(err, LicError::DegenerateRange { axis: 'x', .. }));

        let inverted = Bounds::new().ymin(5.0).ymax(1.0);
        let err = regrid(&input(&mesh, inverted, 4)).unwrap_err();
        assert!(matches!(err, LicError::DegenerateRange { axis: 'y', .. }));
    }

    #[test]
    fn zero_size_is_rejected() {
        let mesh = linear_mesh(Indexing::Xy);
        let err = regrid(&input(&mesh, Bounds::new(), 0)).unwrap_err();
        assert!(matches!(err, LicError::InvalidSize(0)));
    }

    #[test]
    fn size_whose_square_overflows_is_rejected() {
        let mesh = linear_mesh(Indexing::Xy);
        let size = usize::MAX / 2;
        let err = regrid(&input(&mesh, Bounds::new(), size)).unwrap_err();
        assert!(matches!(err, LicError::InvalidSize(s) if s == size));
    }

    #[test]
    fn size_one_yields_lower_bound() {
        let mesh = linear_mesh(Indexing::Xy);
        let out = double(regrid(&input(&mesh, Bounds::new(), 1)).unwrap());
        assert_eq!(out.xo, vec![0.0]);
        assert_eq!(out.yo, vec![0.0]);
        assert_eq!(out.v1o.shape(), (1, 1));
        assert!((out.v1o.get(0, 0)).abs() < 1e-12);
    }

    #[test]
    fn mismatched_shapes_fail_before_work() {
        let mesh = linear_mesh(Indexing::Xy);
        let bad: DynGrid = Grid::filled(3, 3, 0.0_f64).unwrap().into();
        let mut inp = input(&mesh, Bounds::new(), 4);
        inp.v2 = &bad;
        let err = regrid(&inp).unwrap_err();
        match err {
            LicError::InvalidShape { name, .. } => assert_eq!(name, "v2"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn single_row_mesh_is_too_small() {
        let xx: DynGrid = Grid::from_vec(1, 3, vec![0.0_f32, 1.0, 2.0]).unwrap().into();
        let yy: DynGrid = Grid::filled(1, 3, 0.0_f32).unwrap().into();
        let inp = RegridInput {
            xx: &xx,
            yy: &yy,
            v1: &xx,
            v2: &yy,
            field: None,
            bounds: Bounds::new(),
            size: 2,
        };
        assert!(matches!(
            regrid(&inp),
            Err(LicError::MeshTooSmall { rows: 1, cols: 3 })
        ));
    }

    #[test]
    fn non_uniform_mesh_interpolates_linearly() {
        let xv = [0.0, 0.1, 0.5, 2.0, 5.0];
        let yv = [-1.0, 0.0, 4.0];
        let (xx, yy) = meshgrid(&xv, &yv, Indexing::Xy).unwrap();
        let v1 = xx.map(|x| 3.0 * x);
        let v2 = yy.map(|y| -y);
        let (xx, yy, v1, v2): (DynGrid, DynGrid, DynGrid, DynGrid) =
            (xx.into(), yy.into(), v1.into(), v2.into());
        let out = double(
            regrid(&RegridInput {
                xx: &xx,
                yy: &yy,
                v1: &v1,
                v2: &v2,
                field: None,
                bounds: Bounds::new(),
                size: 11,
            })
            .unwrap(),
        );
        for (j, &y) in out.yo.iter().enumerate() {
            for (i, &x) in out.xo.iter().enumerate() {
                assert!((out.v1o.get(j, i) - 3.0 * x).abs() < 1e-9);
                assert!((out.v2o.get(j, i) + y).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn rotated_mesh_leaves_corners_nan() {
        // A square rotated by 45 degrees: output corners lie outside its hull.
        let n = 5;
        let (u, v) = meshgrid(&linspace_f64(-1.0, 1.0, n), &linspace_f64(-1.0, 1.0, n), Indexing::Xy)
            .unwrap();
        let s = std::f64::consts::FRAC_1_SQRT_2;
        let xx = Grid::from_fn(n, n, |r, c| s * (u.get(r, c) - v.get(r, c))).unwrap();
        let yy = Grid::from_fn(n, n, |r, c| s * (u.get(r, c) + v.get(r, c))).unwrap();
        let ones = Grid::filled(n, n, 1.0_f64).unwrap();
        let (xx, yy, ones): (DynGrid, DynGrid, DynGrid) = (xx.into(), yy.into(), ones.into());
        let out = double(
            regrid(&RegridInput {
                xx: &xx,
                yy: &yy,
                v1: &ones,
                v2: &ones,
                field: Some(&ones),
                bounds: Bounds::new(),
                size: 9,
            })
            .unwrap(),
        );
        let fieldo = out.fieldo.unwrap();
        for (j, i) in [(0, 0), (0, 8), (8, 0), (8, 8)] {
            assert!(fieldo.get(j, i).is_nan(), "corner ({j}, {i}) should be NaN");
        }
        assert!((fieldo.get(4, 4) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn points_inside_the_hull_between_bent_rows_are_interpolated() {
        // 3x3 mesh whose middle column is lifted by 1.5: the quads leave a
        // notch above the bottom edge that is still inside the hull.
        let xx = Grid::from_fn(3, 3, |_, c| c as f64).unwrap();
        let yy = Grid::from_fn(3, 3, |r, c| r as f64 + if c == 1 { 1.5 } else { 0.0 }).unwrap();
        let v1 = Grid::from_fn(3, 3, |r, c| xx.get(r, c) + 2.0 * yy.get(r, c)).unwrap();
        let (xx, yy, v1): (DynGrid, DynGrid, DynGrid) = (xx.into(), yy.into(), v1.into());
        let out = double(
            regrid(&RegridInput {
                xx: &xx,
                yy: &yy,
                v1: &v1,
                v2: &v1,
                field: None,
                bounds: Bounds::new(),
                size: 5,
            })
            .unwrap(),
        );
        assert_eq!(out.xo, vec![0.0, 0.5, 1.0, 1.5, 2.0]);
        assert_eq!(out.yo, vec![0.0, 0.875, 1.75, 2.625, 3.5]);

        // (1, 0.875) lies below every quad but above the hull's bottom edge.
        let notch = out.v1o.get(1, 2);
        assert!((notch - 2.75).abs() < 1e-9, "got {notch}");
        for (j, i) in [(0, 1), (0, 2), (0, 3)] {
            assert!(out.v1o.get(j, i).is_finite(), "({j}, {i}) should be inside the hull");
        }
        // (0, 3.5) is above the hull edge from (0, 2) to (1, 3.5).
        assert!(out.v1o.get(4, 0).is_nan());
        assert!(out.v1o.get(4, 4).is_nan());
    }

    #[test]
    fn nan_coordinates_are_left_out_of_the_triangulation() {
        let mesh = linear_mesh(Indexing::Xy);
        let mut xx = mesh.0.to_f64();
        xx.set(2, 2, f64::NAN);
        let xx: DynGrid = xx.into();
        let mut inp = input(&mesh, Bounds::new(), 9);
        inp.xx = &xx;
        let out = double(regrid(&inp).unwrap());
        assert_eq!(out.v1o.nan_count(), 0);
        for j in 0..9 {
            for i in 0..9 {
                let expected = out.xo[i] + 2.0 * out.yo[j];
                assert!((out.v1o.get(j, i) - expected).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn nan_values_propagate_without_spreading() {
        let mesh = linear_mesh(Indexing::Xy);
        let mut v1 = mesh.2.to_f64();
        v1.set(0, 0, f64::NAN);
        let v1: DynGrid = v1.into();
        let mut inp = input(&mesh, Bounds::new(), 11);
        inp.v1 = &v1;
        let out = double(regrid(&inp).unwrap());
        assert!(out.v1o.get(0, 0).is_nan());
        assert!(out.v1o.get(10, 10).is_finite());
        assert_eq!(out.v2o.nan_count(), 0);
    }

    #[test]
    fn bounds_from_json_keeps_integer_neutral() {
        let b = Bounds::from_json(&serde_json::json!({"xmin": 1, "xmax": 10.0}));
        assert_eq!(b.xmin, Some(Scalar::Int(1)));
        assert_eq!(b.xmax, Some(Scalar::F64(10.0)));
        assert_eq!(b.ymin, None);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn outputs_have_requested_shape(size in 1_usize..12, nx in 2_usize..6, ny in 2_usize..6) {
                let xv = linspace_f64(-3.0, 7.0, nx);
                let yv = linspace_f64(1.0, 2.0, ny);
                let (xx, yy) = meshgrid(&xv, &yv, Indexing::Xy).unwrap();
                let (xx, yy): (DynGrid, DynGrid) = (xx.into(), yy.into());
                let out = double(regrid(&RegridInput {
                    xx: &xx, yy: &yy, v1: &xx, v2: &yy, field: Some(&xx),
                    bounds: Bounds::new(), size,
                }).unwrap());
                prop_assert_eq!(out.xo.len(), size);
                prop_assert_eq!(out.yo.len(), size);
                prop_assert_eq!(out.v1o.shape(), (size, size));
                prop_assert_eq!(out.fieldo.unwrap().shape(), (size, size));
            }

            #[test]
            fn points_left_of_the_hull_are_nan(shift in 0.5_f64..50.0) {
                let mesh = linear_mesh(Indexing::Xy);
                let bounds = Bounds::new().xmin(-shift).xmax(-shift / 2.0);
                let out = double(regrid(&input(&mesh, bounds, 4)).unwrap());
                prop_assert_eq!(out.v1o.nan_count(), 16);
                prop_assert_eq!(out.v2o.nan_count(), 16);
            }
        }
    }
}
