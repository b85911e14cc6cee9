//! Batched interpolation of rectilinear grids.
//!
//! Cells are found by bisection on each axis, then a separable kernel is
//! applied: 1 tap per axis for nearest, 2 for linear, 4 for cubic. Queries
//! outside the axis coverage yield NaN rather than an error.

use std::fmt;
use std::str::FromStr;

use crate::grid::GridField;
use crate::reconcile::QueryBatch;

/// Resampling kernel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Interpolation {
    Nearest,
    /// Bilinear.
    #[default]
    Linear,
    /// Bicubic convolution (Keys, a = -0.5).
    Cubic,
}

impl Interpolation {
    /// Nodes per axis read by the kernel.
    pub fn window(self) -> usize {
        match self {
            Interpolation::Nearest => 1,
            Interpolation::Linear => 2,
            Interpolation::Cubic => 4,
        }
    }
}

impl fmt::Display for Interpolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Interpolation::Nearest => write!(f, "nearest"),
            Interpolation::Linear => write!(f, "linear"),
            Interpolation::Cubic => write!(f, "cubic"),
        }
    }
}

impl FromStr for Interpolation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "nearest" => Ok(Interpolation::Nearest),
            "linear" | "bilinear" => Ok(Interpolation::Linear),
            "cubic" | "bicubic" => Ok(Interpolation::Cubic),
            other => Err(format!("unknown interpolation {other:?}")),
        }
    }
}

/// Interpolates `grid` at every point of `batch`, preserving order.
pub fn interpolate(grid: &GridField, batch: &QueryBatch, method: Interpolation) -> Vec<f64> {
    let (nx, ny) = grid.shape();

    batch
        .iter()
        .map(|(x, y)| {
            let (Some((i, tx)), Some((j, ty))) = (locate(grid.x(), x), locate(grid.y(), y))
            else {
                return f64::NAN;
            };
            let cols = Taps::new(method, i, tx, nx);
            let rows = Taps::new(method, j, ty, ny);
            combine(&cols, &rows, |col, row| grid.node(col, row))
        })
        .collect()
}

/// Cell of `v` on an ascending `axis`: lower node index and fraction in [0, 1].
pub(crate) fn locate(axis: &[f64], v: f64) -> Option<(usize, f64)> {
    let n = axis.len();
    if n == 0 || v.is_nan() {
        return None;
    }
    if n == 1 {
        return (v == axis[0]).then_some((0, 0.0));
    }
    if v < axis[0] || v > axis[n - 1] {
        return None;
    }

    let upper = axis.partition_point(|&a| a <= v);
    let i = upper.saturating_sub(1).min(n - 2);
    let t = (v - axis[i]) / (axis[i + 1] - axis[i]);
    Some((i, t))
}

/// Cell of a fractional index `p` on `n` evenly spaced nodes `0..n`.
pub(crate) fn locate_index(p: f64, n: usize) -> Option<(usize, f64)> {
    if n == 0 || p.is_nan() || p < 0.0 || p > (n - 1) as f64 {
        return None;
    }
    if n == 1 {
        return Some((0, 0.0));
    }
    let i = (p.floor() as usize).min(n - 2);
    Some((i, p - i as f64))
}

/// Node indices and weights of a 1D kernel, clamped to the axis.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Taps {
    nodes: [usize; 4],
    weights: [f64; 4],
    len: usize,
}

impl Taps {
    pub fn new(method: Interpolation, i: usize, t: f64, n: usize) -> Self {
        let last = n.saturating_sub(1);
        match method {
            Interpolation::Nearest => {
                let node = if t < 0.5 { i } else { (i + 1).min(last) };
                Self {
                    nodes: [node, 0, 0, 0],
                    weights: [1.0, 0.0, 0.0, 0.0],
                    len: 1,
                }
            }
            Interpolation::Linear => Self {
                nodes: [i, (i + 1).min(last), 0, 0],
                weights: [1.0 - t, t, 0.0, 0.0],
                len: 2,
            },
            Interpolation::Cubic => Self {
                nodes: [
                    i.saturating_sub(1),
                    i,
                    (i + 1).min(last),
                    (i + 2).min(last),
                ],
                weights: [keys(1.0 + t), keys(t), keys(1.0 - t), keys(2.0 - t)],
                len: 4,
            },
        }
    }

    /// First and last node touched.
    pub fn span(&self) -> (usize, usize) {
        let nodes = &self.nodes[..self.len];
        let lo = nodes.iter().copied().min().unwrap_or(0);
        let hi = nodes.iter().copied().max().unwrap_or(0);
        (lo, hi)
    }

    /// Non-zero taps only, so a NaN neighbour cannot spoil an exact node hit.
    fn iter(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.nodes[..self.len]
            .iter()
            .copied()
            .zip(self.weights[..self.len].iter().copied())
            .filter(|&(_, w)| w != 0.0)
    }
}

/// Weighted sum of `value(col, row)` over the tensor product of two kernels.
pub(crate) fn combine(cols: &Taps, rows: &Taps, value: impl Fn(usize, usize) -> f64) -> f64 {
    let mut acc = 0.0;
    for (row, w_row) in rows.iter() {
        for (col, w_col) in cols.iter() {
            acc += w_row * w_col * value(col, row);
        }
    }
    acc
}

/// Keys cubic convolution kernel with a = -0.5.
#[inline]
fn keys(x: f64) -> f64 {
    const A: f64 = -0.5;

    let x = x.abs();
    if x <= 1.0 {
        ((A + 2.0) * x - (A + 3.0)) * x * x + 1.0
    } else if x < 2.0 {
        ((A * x - 5.0 * A) * x + 8.0 * A) * x - 4.0 * A
    } else {
        0.0
    }
}
