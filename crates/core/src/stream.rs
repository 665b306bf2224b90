//! Fixed-step streamline tracing through a uniform vector field.
//!
//! Positions are continuous grid coordinates: cell `(col, row)` covers
//! `[col, col + 1) x [row, row + 1)` and traces start at the cell centre.
//! `v1` is the column (x) component and `v2` the row (y) component, both in
//! grid units. The field is sampled bilinearly between cell centres.
//!
//! Each direction runs its own two-state machine: it starts `Advancing` and
//! moves one-way to `Terminated` when the step would leave the domain, when
//! the sampled vector is (near-)zero or NaN, or when the step budget runs out.

use crate::error::LicError;
use crate::grid::Grid;
use crate::precision::Real;
use serde::{Deserialize, Serialize};

/// Fixed-step integration scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Integrator {
    /// One direction sample per step.
    #[default]
    Euler,
    /// Classic fourth-order Runge-Kutta on the unit direction field.
    Rk4,
}

/// Which way along the flow a trace runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

impl Direction {
    fn sign<T: Real>(self) -> T {
        match self {
            Direction::Forward => T::one(),
            Direction::Backward => -T::one(),
        }
    }
}

/// Why a direction stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// The next position lay outside the grid; it was clamped onto the edge.
    LeftDomain,
    /// The sampled vector was zero, subnormal or NaN.
    Stagnant,
    /// `max_steps` steps were taken.
    BudgetExhausted,
}

/// Per-direction trace state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceState {
    Advancing,
    Terminated(Termination),
}

/// One visited position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathPoint<T> {
    pub x: T,
    pub y: T,
    pub col: usize,
    pub row: usize,
    /// Unit direction of the step that reached this point.
    pub direction: [T; 2],
}

/// Both halves of a traced streamline, start point excluded.
#[derive(Debug, Clone, PartialEq)]
pub struct Streamline<T> {
    pub forward: Vec<PathPoint<T>>,
    pub backward: Vec<PathPoint<T>>,
    pub forward_end: Termination,
    pub backward_end: Termination,
}

enum Step<T> {
    Moved(PathPoint<T>),
    Clamped(Option<PathPoint<T>>),
    Stalled,
}

/// Traces streamlines through a borrowed `(v1, v2)` field.
#[derive(Debug, Clone, Copy)]
pub struct Tracer<'a, T> {
    v1: &'a Grid<T>,
    v2: &'a Grid<T>,
    step_length: T,
    max_steps: usize,
    integrator: Integrator,
}

impl<'a, T: Real> Tracer<'a, T> {
    /// Creates a tracer; `v1` and `v2` must share a shape and `step_length`
    /// must be finite and positive.
    pub fn new(
        v1: &'a Grid<T>,
        v2: &'a Grid<T>,
        step_length: T,
        max_steps: usize,
        integrator: Integrator,
    ) -> Result<Self, LicError> {
        v1.ensure_same_shape(v2)?;
        if !(step_length.is_finite() && step_length > T::zero()) {
            return Err(LicError::parameter(
                "step_length",
                format!("must be finite and positive, got {step_length}"),
            ));
        }
        Ok(Self {
            v1,
            v2,
            step_length,
            max_steps,
            integrator,
        })
    }

    /// Maximum steps per direction.
    pub fn max_steps(&self) -> usize {
        self.max_steps
    }

    /// `(rows, cols)` of the traced field.
    pub fn shape(&self) -> (usize, usize) {
        self.v1.shape()
    }

    /// Bilinear sample of the field at `(x, y)`; `None` if any corner is NaN.
    ///
    /// Positions within half a cell of the edge reuse the outermost centres.
    pub fn sample(&self, x: T, y: T) -> Option<[T; 2]> {
        let (rows, cols) = self.v1.shape();
        let half = T::cast_f64(0.5);
        let (c0, c1, tx) = corners(x - half, cols);
        let (r0, r1, ty) = corners(y - half, rows);

        let lerp2 = |g: &Grid<T>| {
            let top = g.get(r0, c0) + (g.get(r0, c1) - g.get(r0, c0)) * tx;
            let bottom = g.get(r1, c0) + (g.get(r1, c1) - g.get(r1, c0)) * tx;
            top + (bottom - top) * ty
        };
        let v = [lerp2(self.v1), lerp2(self.v2)];
        (v[0].is_finite() && v[1].is_finite()).then_some(v)
    }

    /// Unit direction at `(x, y)` scaled by `sign`, or `None` when stagnant.
    fn unit(&self, x: T, y: T, sign: T) -> Option<[T; 2]> {
        let [vx, vy] = self.sample(x, y)?;
        let mag = vx.hypot(vy);
        if !(mag > stagnation_threshold::<T>()) {
            return None;
        }
        Some([sign * vx / mag, sign * vy / mag])
    }

    fn direction(&self, x: T, y: T, sign: T) -> Option<[T; 2]> {
        match self.integrator {
            Integrator::Euler => self.unit(x, y, sign),
            Integrator::Rk4 => {
                let h = self.step_length;
                let half = h * T::cast_f64(0.5);
                let two = T::cast_f64(2.0);
                let k1 = self.unit(x, y, sign)?;
                let k2 = self.unit(x + half * k1[0], y + half * k1[1], sign)?;
                let k3 = self.unit(x + half * k2[0], y + half * k2[1], sign)?;
                let k4 = self.unit(x + h * k3[0], y + h * k3[1], sign)?;
                let dx = k1[0] + two * k2[0] + two * k3[0] + k4[0];
                let dy = k1[1] + two * k2[1] + two * k3[1] + k4[1];
                let mag = dx.hypot(dy);
                if !(mag > stagnation_threshold::<T>()) {
                    return None;
                }
                Some([dx / mag, dy / mag])
            }
        }
    }

    fn step(&self, x: T, y: T, sign: T) -> Step<T> {
        let Some(direction) = self.direction(x, y, sign) else {
            return Step::Stalled;
        };
        let (rows, cols) = self.v1.shape();
        let (w, h) = (T::cast_f64(cols as f64), T::cast_f64(rows as f64));
        let nx = x + self.step_length * direction[0];
        let ny = y + self.step_length * direction[1];

        let inside = nx >= T::zero() && nx <= w && ny >= T::zero() && ny <= h;
        if inside {
            return Step::Moved(point(nx, ny, cols, rows, direction));
        }

        let cx = nx.max(T::zero()).min(w);
        let cy = ny.max(T::zero()).min(h);
        let clamped = point(cx, cy, cols, rows, direction);
        let here = point(x, y, cols, rows, direction);
        if (clamped.col, clamped.row) == (here.col, here.row) {
            Step::Clamped(None)
        } else {
            Step::Clamped(Some(clamped))
        }
    }

    /// Walks one direction from the centre of `(col, row)`, calling
    /// `visit(k, point)` for step `k = 1, 2, ...`. Returns why it stopped.
    ///
    /// # Panics
    ///
    /// Panics if `(col, row)` is outside the grid.
    pub fn walk<F>(&self, col: usize, row: usize, dir: Direction, mut visit: F) -> Termination
    where
        F: FnMut(usize, &PathPoint<T>),
    {
        let (rows, cols) = self.v1.shape();
        assert!(col < cols && row < rows, "start cell outside the grid");
        let half = T::cast_f64(0.5);
        let sign = dir.sign::<T>();
        let mut x = T::cast_f64(col as f64) + half;
        let mut y = T::cast_f64(row as f64) + half;
        let mut state = TraceState::Advancing;
        let mut taken = 0usize;

        loop {
            if let TraceState::Terminated(reason) = state {
                return reason;
            }
            if taken == self.max_steps {
                state = TraceState::Terminated(Termination::BudgetExhausted);
                continue;
            }
            state = match self.step(x, y, sign) {
                Step::Moved(p) => {
                    taken += 1;
                    visit(taken, &p);
                    x = p.x;
                    y = p.y;
                    TraceState::Advancing
                }
                Step::Clamped(edge) => {
                    if let Some(p) = edge {
                        taken += 1;
                        visit(taken, &p);
                    }
                    TraceState::Terminated(Termination::LeftDomain)
                }
                Step::Stalled => TraceState::Terminated(Termination::Stagnant),
            };
        }
    }

    /// Traces both directions from `(col, row)` and collects the paths.
    pub fn trace(&self, col: usize, row: usize) -> Streamline<T> {
        let mut forward = Vec::new();
        let mut backward = Vec::new();
        let forward_end = self.walk(col, row, Direction::Forward, |_, p| forward.push(*p));
        let backward_end = self.walk(col, row, Direction::Backward, |_, p| backward.push(*p));
        Streamline {
            forward,
            backward,
            forward_end,
            backward_end,
        }
    }
}

/// Magnitudes at or below this are treated as zero.
fn stagnation_threshold<T: Real>() -> T {
    T::epsilon() * T::epsilon()
}

/// Neighbouring centre indices and the fractional offset for one axis.
fn corners<T: Real>(f: T, n: usize) -> (usize, usize, T) {
    let max = T::cast_f64((n - 1) as f64);
    let f = f.max(T::zero()).min(max);
    let i0 = f.floor().to_usize().unwrap_or(0).min(n - 1);
    let i1 = (i0 + 1).min(n - 1);
    (i0, i1, f - T::cast_f64(i0 as f64))
}

fn point<T: Real>(x: T, y: T, cols: usize, rows: usize, direction: [T; 2]) -> PathPoint<T> {
    let col = x.floor().to_usize().unwrap_or(0).min(cols - 1);
    let row = y.floor().to_usize().unwrap_or(0).min(rows - 1);
    PathPoint {
        x,
        y,
        col,
        row,
        direction,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uniform(rows: usize, cols: usize, vx: f64, vy: f64) -> (Grid<f64>, Grid<f64>) {
        (
            Grid::filled(rows, cols, vx).unwrap(),
            Grid::filled(rows, cols, vy).unwrap(),
        )
    }

    #[test]
    fn uniform_flow_moves_along_rows() {
        let (v1, v2) = uniform(5, 20, 2.0, 0.0);
        let tracer = Tracer::new(&v1, &v2, 1.0, 4, Integrator::Euler).unwrap();
        let line = tracer.trace(10, 2);
        let cols: Vec<usize> = line.forward.iter().map(|p| p.col).collect();
        assert_eq!(cols, vec![11, 12, 13, 14]);
        let back: Vec<usize> = line.backward.iter().map(|p| p.col).collect();
        assert_eq!(back, vec![9, 8, 7, 6]);
        assert!(line.forward.iter().all(|p| p.row == 2));
        assert_eq!(line.forward_end, Termination::BudgetExhausted);
        assert_eq!(line.backward_end, Termination::BudgetExhausted);
    }

    #[test]
    fn direction_is_unit_and_signed() {
        let (v1, v2) = uniform(4, 4, 3.0, 4.0);
        let tracer = Tracer::new(&v1, &v2, 0.5, 1, Integrator::Euler).unwrap();
        let line = tracer.trace(1, 1);
        let [fx, fy] = line.forward[0].direction;
        assert!((fx - 0.6).abs() < 1e-12 && (fy - 0.8).abs() < 1e-12);
        let [bx, by] = line.backward[0].direction;
        assert!((bx + 0.6).abs() < 1e-12 && (by + 0.8).abs() < 1e-12);
    }

    #[test]
    fn zero_field_terminates_immediately() {
        let (v1, v2) = uniform(3, 3, 0.0, 0.0);
        let tracer = Tracer::new(&v1, &v2, 1.0, 10, Integrator::Euler).unwrap();
        let line = tracer.trace(1, 1);
        assert!(line.forward.is_empty() && line.backward.is_empty());
        assert_eq!(line.forward_end, Termination::Stagnant);
        assert_eq!(line.backward_end, Termination::Stagnant);
    }

    #[test]
    fn nan_field_is_stagnant_not_an_error() {
        let (v1, v2) = uniform(3, 3, f64::NAN, 1.0);
        let tracer = Tracer::new(&v1, &v2, 1.0, 10, Integrator::Euler).unwrap();
        assert_eq!(
            tracer.walk(1, 1, Direction::Forward, |_, _| {}),
            Termination::Stagnant
        );
        assert_eq!(tracer.sample(1.5, 1.5), None);
    }

    #[test]
    fn boundary_clamps_and_terminates() {
        let (v1, v2) = uniform(3, 6, 1.0, 0.0);
        let tracer = Tracer::new(&v1, &v2, 1.0, 50, Integrator::Euler).unwrap();
        let line = tracer.trace(3, 1);
        // 3.5 -> 4.5 -> 5.5 -> clamp at 6.0, still inside cell 5.
        assert_eq!(line.forward.len(), 2);
        assert_eq!(line.forward_end, Termination::LeftDomain);
        assert!(line.forward.iter().all(|p| p.x <= 6.0 && p.col < 6));
        assert_eq!(line.backward_end, Termination::LeftDomain);
        assert_eq!(line.backward.last().unwrap().col, 0);
    }

    #[test]
    fn clamped_step_into_new_cell_is_recorded() {
        let (v1, v2) = uniform(3, 6, 1.0, 0.0);
        let tracer = Tracer::new(&v1, &v2, 2.0, 50, Integrator::Euler).unwrap();
        let line = tracer.trace(3, 1);
        // 3.5 -> 5.5 -> 7.5 clamps to 6.0 which is in the same cell as 5.5.
        assert_eq!(line.forward.len(), 1);
        let back = tracer.trace(2, 1).backward;
        // 2.5 -> 0.5 -> clamps to 0.0, same cell as 0.5.
        assert_eq!(back.len(), 1);
        let tracer = Tracer::new(&v1, &v2, 1.5, 50, Integrator::Euler).unwrap();
        let back = tracer.trace(2, 1).backward;
        // 2.5 -> 1.0 -> clamps to 0.0, a new cell.
        assert_eq!(back.len(), 2);
        assert_eq!(back[1].x, 0.0);
        assert_eq!(back[1].col, 0);
    }

    #[test]
    fn edge_start_pointing_outward_stops_without_visits() {
        let (v1, v2) = uniform(2, 2, 0.0, -1.0);
        let tracer = Tracer::new(&v1, &v2, 1.0, 5, Integrator::Euler).unwrap();
        let count = std::cell::Cell::new(0);
        let end = tracer.walk(0, 0, Direction::Forward, |_, _| count.set(count.get() + 1));
        assert_eq!(end, Termination::LeftDomain);
        assert_eq!(count.get(), 0);
    }

    #[test]
    fn rk4_follows_circles_better_than_euler() {
        let n = 41;
        let c = n as f64 / 2.0;
        let v1 = Grid::from_fn(n, n, |r, _| -(r as f64 + 0.5 - c)).unwrap();
        let v2 = Grid::from_fn(n, n, |_, col| col as f64 + 0.5 - c).unwrap();
        let radius_drift = |integrator| {
            let tracer = Tracer::new(&v1, &v2, 0.5, 60, integrator).unwrap();
            let line = tracer.trace(30, 20);
            let start = ((30.5 - c).powi(2) + (20.5 - c).powi(2)).sqrt();
            let last = line.forward.last().unwrap();
            (((last.x - c).powi(2) + (last.y - c).powi(2)).sqrt() - start).abs()
        };
        let euler = radius_drift(Integrator::Euler);
        let rk4 = radius_drift(Integrator::Rk4);
        assert!(rk4 < euler, "rk4 drift {rk4} should beat euler drift {euler}");
    }

    #[test]
    fn sample_is_bilinear_between_centres() {
        let v1 = Grid::from_vec(1, 2, vec![0.0, 1.0]).unwrap();
        let v2 = Grid::from_vec(1, 2, vec![0.0, 0.0]).unwrap();
        let tracer = Tracer::new(&v1, &v2, 1.0, 1, Integrator::Euler).unwrap();
        assert_eq!(tracer.sample(0.5, 0.5), Some([0.0, 0.0]));
        assert_eq!(tracer.sample(1.0, 0.5), Some([0.5, 0.0]));
        assert_eq!(tracer.sample(1.5, 0.5), Some([1.0, 0.0]));
        // Outer half cells reuse the edge centre.
        assert_eq!(tracer.sample(0.1, 0.9), Some([0.0, 0.0]));
        assert_eq!(tracer.sample(2.0, 0.0), Some([1.0, 0.0]));
    }

    #[test]
    fn invalid_construction_is_rejected() {
        let (v1, _) = uniform(3, 3, 1.0, 0.0);
        let other = Grid::filled(3, 4, 0.0).unwrap();
        assert!(matches!(
            Tracer::new(&v1, &other, 1.0, 3, Integrator::Euler),
            Err(LicError::DimensionMismatch { .. })
        ));
        assert!(matches!(
            Tracer::new(&v1, &v1, 0.0, 3, Integrator::Euler),
            Err(LicError::InvalidParameter { .. })
        ));
        assert!(Tracer::new(&v1, &v1, f64::NAN, 3, Integrator::Euler).is_err());
    }

    #[test]
    fn single_precision_traces_like_double() {
        let v1 = Grid::filled(4, 8, 1.0_f32).unwrap();
        let v2 = Grid::filled(4, 8, 0.0_f32).unwrap();
        let tracer = Tracer::new(&v1, &v2, 1.0_f32, 3, Integrator::Euler).unwrap();
        let line = tracer.trace(2, 1);
        assert_eq!(line.forward.len(), 3);
        assert_eq!(line.backward.len(), 2);
        assert_eq!(line.backward_end, Termination::LeftDomain);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn paths_stay_inside_the_grid(
                vx in -5.0_f64..5.0,
                vy in -5.0_f64..5.0,
                step in 0.1_f64..3.0,
                col in 0_usize..8,
                row in 0_usize..6,
            ) {
                let v1 = Grid::from_fn(6, 8, |r, c| vx + (r as f64 - c as f64) * 0.3).unwrap();
                let v2 = Grid::filled(6, 8, vy).unwrap();
                let tracer = Tracer::new(&v1, &v2, step, 20, Integrator::Euler).unwrap();
                let line = tracer.trace(col, row);
                for p in line.forward.iter().chain(line.backward.iter()) {
                    prop_assert!(p.x >= 0.0 && p.x <= 8.0);
                    prop_assert!(p.y >= 0.0 && p.y <= 6.0);
                    prop_assert!(p.col < 8 && p.row < 6);
                }
                prop_assert!(line.forward.len() <= 20 && line.backward.len() <= 20);
            }
        }
    }
}
