//! Stencil families and their boundary closures.
//!
//! Every family implements [`Stencil`]; [`AnyStencil`] is the closed set the
//! assembler and configuration layer work with.

pub mod e2;
pub mod e4;
pub mod free;
pub mod tuned;
pub mod uniform;
pub mod weights;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::StencilError;
pub use crate::traits::Stencil;

pub use e2::E2;
pub use e4::E4;
pub use free::FreeCoefficient;
pub use tuned::Tuned;
pub use uniform::Uniform;

/// How the solution is constrained at a boundary face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BoundaryKind {
    /// Face value is prescribed.
    Dirichlet,
    /// Outward normal derivative is prescribed.
    Neumann,
    /// Face value is an unknown that also receives a derivative row.
    Floating,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DerivativeOrder {
    First,
    Second,
}

impl DerivativeOrder {
    pub fn degree(self) -> i32 {
        match self {
            DerivativeOrder::First => 1,
            DerivativeOrder::Second => 2,
        }
    }

    /// Sign picked up by the coefficients under `x -> -x`.
    pub fn mirror_sign(self) -> f64 {
        match self {
            DerivativeOrder::First => -1.0,
            DerivativeOrder::Second => 1.0,
        }
    }
}

/// Dimensions of a closure block: radius `p`, `r` rows, `t` columns and
/// `nextra` extra coefficients per row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StencilShape {
    pub p: usize,
    pub r: usize,
    pub t: usize,
    pub nextra: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StencilFamily {
    #[serde(rename = "E2")]
    E2,
    #[serde(rename = "E4")]
    E4,
    #[serde(rename = "E6-uniform")]
    E6Uniform,
    #[serde(rename = "E8-uniform")]
    E8Uniform,
    #[serde(rename = "free")]
    Free,
}

impl StencilFamily {
    pub fn name(self) -> &'static str {
        match self {
            StencilFamily::E2 => "E2",
            StencilFamily::E4 => "E4",
            StencilFamily::E6Uniform => "E6-uniform",
            StencilFamily::E8Uniform => "E8-uniform",
            StencilFamily::Free => "free",
        }
    }
}

impl fmt::Display for StencilFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for StencilFamily {
    type Err = StencilError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "E2" => Ok(StencilFamily::E2),
            "E4" => Ok(StencilFamily::E4),
            "E6-uniform" => Ok(StencilFamily::E6Uniform),
            "E8-uniform" => Ok(StencilFamily::E8Uniform),
            "free" => Ok(StencilFamily::Free),
            other => Err(StencilError::UnknownFamily(other.to_string())),
        }
    }
}

/// Which stencil to build. `radius` only applies to the free family.
/// `tuning` moves the first-derivative closures of any family; it is empty
/// or holds one coefficient per near-face row.
#[derive(Debug, Clone, PartialEq)]
pub struct StencilSelection {
    pub order: DerivativeOrder,
    pub family: StencilFamily,
    pub radius: usize,
    pub tuning: Vec<f64>,
}

impl StencilSelection {
    pub fn new(order: DerivativeOrder, family: StencilFamily) -> Self {
        Self {
            order,
            family,
            radius: 1,
            tuning: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AnyStencil {
    E2(Tuned<E2>),
    E4(Tuned<E4>),
    Uniform(Tuned<Uniform>),
    Free(FreeCoefficient),
}

impl AnyStencil {
    pub fn from_selection(selection: &StencilSelection) -> Result<Self, StencilError> {
        let order = selection.order;
        let tuning = selection.tuning.clone();
        let stencil = match selection.family {
            StencilFamily::E2 => AnyStencil::E2(Tuned::new(E2::new(order), tuning)?),
            StencilFamily::E4 => AnyStencil::E4(Tuned::new(E4::new(order), tuning)?),
            StencilFamily::E6Uniform => {
                AnyStencil::Uniform(Tuned::new(Uniform::new(order, 3)?, tuning)?)
            }
            StencilFamily::E8Uniform => {
                AnyStencil::Uniform(Tuned::new(Uniform::new(order, 4)?, tuning)?)
            }
            StencilFamily::Free => {
                if order != DerivativeOrder::First {
                    return Err(StencilError::UnsupportedOrder {
                        family: "free",
                        order,
                    });
                }
                AnyStencil::Free(FreeCoefficient::new(selection.radius, tuning)?)
            }
        };
        log::debug!(
            "selected {} stencil (order {:?}, radius {}, width {}, tuning {:?})",
            stencil.name(),
            order,
            stencil.radius(),
            stencil.width(),
            selection.tuning
        );
        Ok(stencil)
    }
}

impl Stencil for AnyStencil {
    fn name(&self) -> &'static str {
        match self {
            AnyStencil::E2(s) => s.name(),
            AnyStencil::E4(s) => s.name(),
            AnyStencil::Uniform(s) => s.name(),
            AnyStencil::Free(s) => s.name(),
        }
    }

    fn order(&self) -> DerivativeOrder {
        match self {
            AnyStencil::E2(s) => s.order(),
            AnyStencil::E4(s) => s.order(),
            AnyStencil::Uniform(s) => s.order(),
            AnyStencil::Free(s) => s.order(),
        }
    }

    fn radius(&self) -> usize {
        match self {
            AnyStencil::E2(s) => s.radius(),
            AnyStencil::E4(s) => s.radius(),
            AnyStencil::Uniform(s) => s.radius(),
            AnyStencil::Free(s) => s.radius(),
        }
    }

    fn width(&self) -> usize {
        match self {
            AnyStencil::E2(s) => s.width(),
            AnyStencil::E4(s) => s.width(),
            AnyStencil::Uniform(s) => s.width(),
            AnyStencil::Free(s) => s.width(),
        }
    }

    fn supports(&self, kind: BoundaryKind) -> bool {
        match self {
            AnyStencil::E2(s) => s.supports(kind),
            AnyStencil::E4(s) => s.supports(kind),
            AnyStencil::Uniform(s) => s.supports(kind),
            AnyStencil::Free(s) => s.supports(kind),
        }
    }

    fn interior_row(&self, out: &mut [f64]) {
        match self {
            AnyStencil::E2(s) => s.interior_row(out),
            AnyStencil::E4(s) => s.interior_row(out),
            AnyStencil::Uniform(s) => s.interior_row(out),
            AnyStencil::Free(s) => s.interior_row(out),
        }
    }

    fn lagrange_row(&self, psi: f64, index: usize, row: &mut [f64]) -> Result<(), StencilError> {
        match self {
            AnyStencil::E2(s) => s.lagrange_row(psi, index, row),
            AnyStencil::E4(s) => s.lagrange_row(psi, index, row),
            AnyStencil::Uniform(s) => s.lagrange_row(psi, index, row),
            AnyStencil::Free(s) => s.lagrange_row(psi, index, row),
        }
    }

    fn neumann_row(
        &self,
        psi: f64,
        index: usize,
        row: &mut [f64],
        extra: &mut f64,
    ) -> Result<(), StencilError> {
        match self {
            AnyStencil::E2(s) => s.neumann_row(psi, index, row, extra),
            AnyStencil::E4(s) => s.neumann_row(psi, index, row, extra),
            AnyStencil::Uniform(s) => s.neumann_row(psi, index, row, extra),
            AnyStencil::Free(s) => s.neumann_row(psi, index, row, extra),
        }
    }
}

/// Shared checks for stencil implementations: polynomial exactness of
/// closure blocks evaluated through the public `nbs` entry point.
#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    /// Applies a closure block to samples of `x^q` and compares with the
    /// exact derivative at each row's evaluation point.
    ///
    /// Left faces sit at 0 with fluid at `psi + k`; right faces sit at
    /// `L = 2` with fluid at `L - psi - k`. The returned value is the
    /// worst absolute error over rows and `q <= degree`.
    pub fn closure_error<S: Stencil>(
        stencil: &S,
        kind: BoundaryKind,
        psi: f64,
        right: bool,
        degree: i32,
    ) -> f64 {
        let shape = stencil.query(kind).expect("supported kind");
        let StencilShape { r, t, nextra, .. } = shape;
        let h = 0.5;
        let mut out = vec![0.0; r * t];
        let mut extra = vec![0.0; r * nextra];
        stencil
            .nbs(h, kind, psi, right, &mut out, &mut extra)
            .expect("nbs should succeed");

        let d = stencil.order().degree();
        let length = 2.0;
        // Local node positions in units of h, left-canonical.
        let node = |j: usize| -> f64 {
            if j == 0 {
                0.0
            } else {
                psi + (j - 1) as f64
            }
        };
        let row_node = |i: usize| -> f64 {
            match kind {
                BoundaryKind::Floating => node(i),
                _ => psi + i as f64,
            }
        };
        let coord = |local: f64| -> f64 {
            if right {
                length - local * h
            } else {
                local * h
            }
        };

        let mut worst: f64 = 0.0;
        for q in 0..=degree {
            let f = |x: f64| x.powi(q);
            let df = |x: f64| -> f64 {
                match d {
                    1 if q >= 1 => q as f64 * x.powi(q - 1),
                    2 if q >= 2 => (q * (q - 1)) as f64 * x.powi(q - 2),
                    _ => 0.0,
                }
            };
            let first = |x: f64| if q >= 1 { q as f64 * x.powi(q - 1) } else { 0.0 };
            let face = coord(0.0);
            let outward_slope = if right { first(face) } else { -first(face) };

            for i in 0..r {
                // Right blocks are stored in increasing coordinate order.
                let li = if right { r - 1 - i } else { i };
                let mut acc = 0.0;
                for j in 0..t {
                    let lj = if right { t - 1 - j } else { j };
                    acc += out[i * t + j] * f(coord(node(lj)));
                }
                if nextra == 1 {
                    acc += extra[i] * outward_slope;
                }
                let exact = df(coord(row_node(li)));
                worst = worst.max((acc - exact).abs() / exact.abs().max(1.0));
            }
        }
        worst
    }
}
