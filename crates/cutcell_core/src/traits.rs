use crate::error::StencilError;
use crate::stencil::{BoundaryKind, DerivativeOrder, StencilShape};

/// Smallest cut fraction handed to the closure kernels. Dirichlet and
/// Floating weights grow like `1/psi`, so an exact zero is lifted to this.
pub const MIN_PSI: f64 = 1e-10;

/// A finite-difference stencil with boundary closures that depend
/// continuously on the cut fraction `psi` of the nearest face.
///
/// Implementors provide unscaled rows (unit spacing, face on the left at
/// local coordinate 0, fluid point `k` at `psi + k`). The provided methods
/// handle validation, spacing scaling and mirroring for right-hand faces.
pub trait Stencil {
    /// Family name used in error messages.
    fn name(&self) -> &'static str;

    fn order(&self) -> DerivativeOrder;

    /// Half-width `p` of the interior stencil.
    fn radius(&self) -> usize;

    /// Number of columns of a closure block. Defaults to `2p + 1`.
    fn width(&self) -> usize {
        2 * self.radius() + 1
    }

    fn supports(&self, _kind: BoundaryKind) -> bool {
        true
    }

    /// Writes the `2p + 1` central coefficients for unit spacing.
    fn interior_row(&self, out: &mut [f64]);

    /// Derivative at node `index` of `{0, psi, psi + 1, ...}` using the face
    /// value and the fluid values. `row` has `width()` entries.
    fn lagrange_row(&self, psi: f64, index: usize, row: &mut [f64]) -> Result<(), StencilError>;

    /// Derivative at fluid point `index` using fluid values and the outward
    /// normal derivative at the face, whose coefficient goes to `extra`.
    fn neumann_row(
        &self,
        psi: f64,
        index: usize,
        row: &mut [f64],
        extra: &mut f64,
    ) -> Result<(), StencilError>;

    /// Block dimensions for a boundary kind, or `None` if unsupported.
    fn query(&self, kind: BoundaryKind) -> Option<StencilShape> {
        if !self.supports(kind) {
            return None;
        }
        let p = self.radius();
        let t = self.width();
        Some(match kind {
            BoundaryKind::Floating => StencilShape { p, r: p + 1, t, nextra: 0 },
            BoundaryKind::Dirichlet => StencilShape { p, r: p, t, nextra: 0 },
            BoundaryKind::Neumann => StencilShape { p, r: p, t, nextra: 1 },
        })
    }

    /// Largest block over all kinds; used to size scratch buffers.
    fn query_max(&self) -> StencilShape {
        let p = self.radius();
        StencilShape {
            p,
            r: p + 1,
            t: self.width(),
            nextra: 1,
        }
    }

    /// Central coefficients scaled by `h^-d`. Returns the number written.
    fn interior(&self, h: f64, out: &mut [f64]) -> Result<usize, StencilError> {
        let n = 2 * self.radius() + 1;
        if out.len() < n {
            return Err(StencilError::BufferTooSmall {
                needed: n,
                got: out.len(),
            });
        }
        self.interior_row(&mut out[..n]);
        let scale = h.powi(-self.order().degree());
        out[..n].iter_mut().for_each(|w| *w *= scale);
        Ok(n)
    }

    /// Near-boundary block for a face at fraction `psi`.
    ///
    /// `out` receives `r x t` row-major weights, `extra` the `r x nextra`
    /// coefficients of the outward normal derivative. With `right` set the
    /// block is mirrored so rows and columns run in increasing coordinate
    /// and the face is the last column.
    fn nbs(
        &self,
        h: f64,
        kind: BoundaryKind,
        psi: f64,
        right: bool,
        out: &mut [f64],
        extra: &mut [f64],
    ) -> Result<StencilShape, StencilError> {
        let shape = self
            .query(kind)
            .ok_or(StencilError::UnsupportedKind {
                family: self.name(),
                kind,
            })?;
        if !(0.0..=1.0).contains(&psi) {
            return Err(StencilError::PsiOutOfRange(psi));
        }
        let StencilShape { r, t, nextra, .. } = shape;
        if out.len() < r * t {
            return Err(StencilError::BufferTooSmall {
                needed: r * t,
                got: out.len(),
            });
        }
        if extra.len() < r * nextra {
            return Err(StencilError::BufferTooSmall {
                needed: r * nextra,
                got: extra.len(),
            });
        }

        let psi = psi.max(MIN_PSI);
        let out = &mut out[..r * t];
        let extra = &mut extra[..r * nextra];
        for (i, row) in out.chunks_exact_mut(t).enumerate() {
            match kind {
                BoundaryKind::Floating => self.lagrange_row(psi, i, row)?,
                BoundaryKind::Dirichlet => self.lagrange_row(psi, i + 1, row)?,
                BoundaryKind::Neumann => self.neumann_row(psi, i, row, &mut extra[i])?,
            }
        }

        let degree = self.order().degree();
        let weight_scale = h.powi(-degree);
        let extra_scale = h.powi(1 - degree);
        out.iter_mut().for_each(|w| *w *= weight_scale);
        extra.iter_mut().for_each(|e| *e *= extra_scale);

        if right {
            let sign = self.order().mirror_sign();
            out.reverse();
            extra.reverse();
            out.iter_mut().for_each(|w| *w *= sign);
            extra.iter_mut().for_each(|e| *e *= sign);
        }
        Ok(shape)
    }
}
