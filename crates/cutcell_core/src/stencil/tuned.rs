//! Tunable first-derivative closures for the E2, E4 and uniform families.
//!
//! A tuned stencil widens every closure block by one column. Lagrange rows
//! keep their base weights on the first `2p + 1` nodes and move along the
//! divided-difference null vector of all `2p + 2` nodes by `tuning[index]`,
//! so they stay exact to degree `2p`. Neumann rows are padded with a zero.

use crate::error::StencilError;
use crate::stencil::weights;
use crate::stencil::{BoundaryKind, DerivativeOrder, Stencil};

#[derive(Debug, Clone, PartialEq)]
pub struct Tuned<S> {
    base: S,
    tuning: Vec<f64>,
}

impl<S: Stencil> Tuned<S> {
    /// `tuning` is empty (the base stencil, unchanged) or holds one
    /// coefficient per near-face row, `radius` of them.
    pub fn new(base: S, tuning: Vec<f64>) -> Result<Self, StencilError> {
        if !tuning.is_empty() {
            if base.order() != DerivativeOrder::First {
                return Err(StencilError::TuningUnsupported {
                    family: base.name(),
                    order: base.order(),
                });
            }
            if tuning.len() != base.radius() {
                return Err(StencilError::InvalidTuning {
                    expected: base.radius(),
                    got: tuning.len(),
                });
            }
        }
        Ok(Self { base, tuning })
    }

    pub fn untuned(base: S) -> Self {
        Self {
            base,
            tuning: Vec::new(),
        }
    }

    pub fn is_tuned(&self) -> bool {
        !self.tuning.is_empty()
    }
}

impl<S: Stencil> Stencil for Tuned<S> {
    fn name(&self) -> &'static str {
        self.base.name()
    }

    fn order(&self) -> DerivativeOrder {
        self.base.order()
    }

    fn radius(&self) -> usize {
        self.base.radius()
    }

    fn width(&self) -> usize {
        self.base.width() + usize::from(self.is_tuned())
    }

    fn supports(&self, kind: BoundaryKind) -> bool {
        self.base.supports(kind)
    }

    fn interior_row(&self, out: &mut [f64]) {
        self.base.interior_row(out)
    }

    fn lagrange_row(&self, psi: f64, index: usize, row: &mut [f64]) -> Result<(), StencilError> {
        if !self.is_tuned() {
            return self.base.lagrange_row(psi, index, row);
        }
        let t = self.width();
        self.base.lagrange_row(psi, index, &mut row[..t - 1])?;
        row[t - 1] = 0.0;
        if let Some(&c) = self.tuning.get(index) {
            weights::tune_row(psi, c, &mut row[..t]);
        }
        Ok(())
    }

    fn neumann_row(
        &self,
        psi: f64,
        index: usize,
        row: &mut [f64],
        extra: &mut f64,
    ) -> Result<(), StencilError> {
        if !self.is_tuned() {
            return self.base.neumann_row(psi, index, row, extra);
        }
        let t = self.width();
        self.base.neumann_row(psi, index, &mut row[..t - 1], extra)?;
        row[t - 1] = 0.0;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stencil::testing::closure_error;
    use crate::stencil::{Uniform, E2, E4};

    const KINDS: [BoundaryKind; 3] = [
        BoundaryKind::Floating,
        BoundaryKind::Dirichlet,
        BoundaryKind::Neumann,
    ];

    fn tuning(radius: usize) -> Vec<f64> {
        (0..radius).map(|i| 0.4 - 0.3 * i as f64).collect()
    }

    fn check_degree<S: Stencil>(stencil: &S, tolerance: f64) {
        let degree = 2 * stencil.radius() as i32;
        for kind in KINDS {
            for psi in [0.15, 0.6, 1.0] {
                for right in [false, true] {
                    let err = closure_error(stencil, kind, psi, right, degree);
                    assert!(
                        err < tolerance,
                        "{} {kind:?} psi={psi} right={right}: {err}",
                        stencil.name()
                    );
                }
            }
        }
    }

    #[test]
    fn tuned_closures_keep_interior_degree() {
        let first = DerivativeOrder::First;
        check_degree(&Tuned::new(E2::new(first), tuning(1)).expect("e2"), 1e-11);
        check_degree(&Tuned::new(E4::new(first), tuning(2)).expect("e4"), 1e-10);
        for radius in [3, 4] {
            let base = Uniform::new(first, radius).expect("uniform");
            check_degree(&Tuned::new(base, tuning(radius)).expect("uniform"), 1e-7);
        }
    }

    #[test]
    fn tuning_widens_the_block_by_one_column() {
        let plain = Tuned::untuned(E4::new(DerivativeOrder::First));
        let tuned = Tuned::new(E4::new(DerivativeOrder::First), vec![0.2, 0.1]).expect("valid");
        assert_eq!(plain.width(), 5);
        assert_eq!(tuned.width(), 6);
        assert_eq!(tuned.query_max().t, 6);

        let mut a = [0.0; 6];
        let mut b = [0.0; 6];
        for index in 0..=2 {
            plain.lagrange_row(0.4, index, &mut a[..5]).expect("row");
            tuned.lagrange_row(0.4, index, &mut b).expect("row");
            let moved = a.iter().zip(&b).any(|(x, y)| (x - y).abs() > 1e-12);
            assert_eq!(moved, index < 2, "row {index}");
        }
    }

    #[test]
    fn interior_row_survives_tuning_at_unit_psi() {
        let stencil = Tuned::new(E4::new(DerivativeOrder::First), vec![1.0, -1.0]).expect("valid");
        let mut interior = [0.0; 5];
        stencil.interior_row(&mut interior);
        let mut row = [0.0; 6];
        stencil.lagrange_row(1.0, 2, &mut row).expect("row");
        for (a, b) in row[..5].iter().zip(&interior) {
            assert!((a - b).abs() < 1e-13);
        }
        assert_eq!(row[5], 0.0);
    }

    #[test]
    fn tuning_is_validated() {
        assert_eq!(
            Tuned::new(E2::new(DerivativeOrder::First), vec![0.1, 0.2]),
            Err(StencilError::InvalidTuning {
                expected: 1,
                got: 2
            })
        );
        assert_eq!(
            Tuned::new(E4::new(DerivativeOrder::Second), vec![0.1, 0.2]),
            Err(StencilError::TuningUnsupported {
                family: "E4",
                order: DerivativeOrder::Second
            })
        );
        let empty = Tuned::new(E4::new(DerivativeOrder::Second), Vec::new()).expect("no tuning");
        assert!(!empty.is_tuned());
        assert_eq!(empty.width(), 5);
    }
}
