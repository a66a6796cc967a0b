//! Generic finite-difference weight kernels shared by the stencil families.

use nalgebra::{DMatrix, DVector};

use crate::error::StencilError;

/// Fornberg's recursion: weights for the `order`-th derivative at `x0`
/// from values at `nodes`. `out` must have `nodes.len()` entries.
pub fn fornberg(x0: f64, nodes: &[f64], order: usize, out: &mut [f64]) {
    let n = nodes.len();
    debug_assert_eq!(out.len(), n);
    if n == 0 {
        return;
    }
    let m = order;
    // c[j][k]: weight of node j for derivative k.
    let mut c = vec![vec![0.0; m + 1]; n];
    let mut c1 = 1.0;
    let mut c4 = nodes[0] - x0;
    c[0][0] = 1.0;
    for i in 1..n {
        let mn = i.min(m);
        let mut c2 = 1.0;
        let c5 = c4;
        c4 = nodes[i] - x0;
        for j in 0..i {
            let c3 = nodes[i] - nodes[j];
            c2 *= c3;
            if j == i - 1 {
                for k in (1..=mn).rev() {
                    c[i][k] = c1 * (k as f64 * c[i - 1][k - 1] - c5 * c[i - 1][k]) / c2;
                }
                c[i][0] = -c1 * c5 * c[i - 1][0] / c2;
            }
            for k in (1..=mn).rev() {
                c[j][k] = (c4 * c[j][k] - k as f64 * c[j][k - 1]) / c3;
            }
            c[j][0] = c4 * c[j][0] / c3;
        }
        c1 = c2;
    }
    for (w, cj) in out.iter_mut().zip(&c) {
        *w = cj[m];
    }
}

/// Central `2p + 1` point weights for unit spacing.
pub fn central(radius: usize, order: usize, out: &mut [f64]) {
    let nodes: Vec<f64> = (0..=2 * radius).map(|k| k as f64 - radius as f64).collect();
    fornberg(0.0, &nodes, order, out);
}

/// Hermite closure: weights on `nodes` plus one coefficient for the outward
/// normal derivative at a face located at 0 on the low side, reproducing the
/// `order`-th derivative at `x0` for polynomials of degree `nodes.len()`.
///
/// The moment system is solved in the scaled coordinate `x / scale` to keep
/// the matrix well conditioned.
pub fn hermite_closure(
    x0: f64,
    nodes: &[f64],
    order: usize,
    scale: f64,
    row: &mut [f64],
    extra: &mut f64,
) -> Result<(), StencilError> {
    let n = nodes.len() + 1;
    let eta0 = x0 / scale;
    let mut a = DMatrix::<f64>::zeros(n, n);
    let mut rhs = DVector::<f64>::zeros(n);

    // Monomials centred at the evaluation point.
    for q in 0..n {
        for (j, &x) in nodes.iter().enumerate() {
            a[(q, j)] = (x / scale - eta0).powi(q as i32);
        }
        // Outward normal at a low-side face points towards -x.
        a[(q, n - 1)] = if q == 0 {
            0.0
        } else {
            -(q as f64) * (-eta0).powi(q as i32 - 1)
        };
    }
    rhs[order] = factorial(order);

    let solution = a
        .lu()
        .solve(&rhs)
        .ok_or(StencilError::SingularClosure { psi: x0 })?;

    let d = order as i32;
    let weight_scale = scale.powi(-d);
    for (w, s) in row.iter_mut().zip(solution.iter()) {
        *w = s * weight_scale;
    }
    *extra = solution[n - 1] * scale * weight_scale;
    Ok(())
}

/// Null vector of every difference rule of degree `nodes.len() - 2`:
/// `nu_j = 1 / prod_{m != j} (x_j - x_m)`.
pub fn divided_difference_null(nodes: &[f64], out: &mut [f64]) {
    for (j, w) in out.iter_mut().enumerate() {
        let prod: f64 = nodes
            .iter()
            .enumerate()
            .filter(|&(m, _)| m != j)
            .map(|(_, &xm)| nodes[j] - xm)
            .product();
        *w = 1.0 / prod;
    }
}

/// Adds `c` times the divided-difference null vector of the closure nodes
/// `{0, psi, psi + 1, ...}` (one per entry of `row`) to `row`.
pub fn tune_row(psi: f64, c: f64, row: &mut [f64]) {
    if c == 0.0 {
        return;
    }
    let nodes: Vec<f64> = std::iter::once(0.0)
        .chain((0..row.len() - 1).map(|k| psi + k as f64))
        .collect();
    let mut null = vec![0.0; row.len()];
    divided_difference_null(&nodes, &mut null);
    for (w, nu) in row.iter_mut().zip(&null) {
        *w += c * nu;
    }
}

fn factorial(n: usize) -> f64 {
    (1..=n).map(|k| k as f64).product()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fornberg_matches_classic_central_weights() {
        let mut w = [0.0; 5];
        central(2, 1, &mut w);
        let expected = [1.0 / 12.0, -2.0 / 3.0, 0.0, 2.0 / 3.0, -1.0 / 12.0];
        for (a, b) in w.iter().zip(expected) {
            assert!((a - b).abs() < 1e-14);
        }

        central(2, 2, &mut w);
        let expected = [-1.0 / 12.0, 4.0 / 3.0, -5.0 / 2.0, 4.0 / 3.0, -1.0 / 12.0];
        for (a, b) in w.iter().zip(expected) {
            assert!((a - b).abs() < 1e-14);
        }
    }

    #[test]
    fn fornberg_one_sided_first_derivative() {
        let mut w = [0.0; 3];
        fornberg(0.0, &[0.0, 1.0, 2.0], 1, &mut w);
        assert!((w[0] + 1.5).abs() < 1e-14);
        assert!((w[1] - 2.0).abs() < 1e-14);
        assert!((w[2] + 0.5).abs() < 1e-14);
    }

    #[test]
    fn hermite_closure_is_exact_for_quadratics() {
        // Nodes 0.7, 1.7 plus the face slope reproduce degree 2.
        let nodes = [0.7, 1.7];
        let mut row = [0.0; 2];
        let mut extra = 0.0;
        hermite_closure(0.7, &nodes, 1, 2.0, &mut row, &mut extra).expect("solvable");
        for q in 0..=2 {
            let f = |x: f64| x.powi(q);
            let df = |x: f64| if q == 0 { 0.0 } else { q as f64 * x.powi(q - 1) };
            let outward = -df(0.0);
            let approx = row[0] * f(0.7) + row[1] * f(1.7) + extra * outward;
            assert!((approx - df(0.7)).abs() < 1e-12, "q = {q}");
        }
    }

    #[test]
    fn divided_difference_null_annihilates_low_degree() {
        let nodes: [f64; 4] = [0.0, 0.4, 1.4, 2.4];
        let mut nu = [0.0; 4];
        divided_difference_null(&nodes, &mut nu);
        for q in 0..3 {
            let sum: f64 = nodes.iter().zip(&nu).map(|(x, w)| w * x.powi(q)).sum();
            assert!(sum.abs() < 1e-12, "degree {q}");
        }
        let cubic: f64 = nodes.iter().zip(&nu).map(|(x, w)| w * x.powi(3)).sum();
        assert!((cubic - 1.0).abs() < 1e-12);
    }

    #[test]
    fn tune_row_keeps_lower_moments() {
        let mut row = [0.0; 4];
        fornberg(0.4, &[0.0, 0.4, 1.4], 1, &mut row[..3]);
        let before = row;
        tune_row(0.4, 0.75, &mut row);
        let nodes: [f64; 4] = [0.0, 0.4, 1.4, 2.4];
        for q in 0..3 {
            let moment = |r: &[f64]| -> f64 {
                r.iter().zip(&nodes).map(|(w, x)| w * x.powi(q)).sum()
            };
            assert!((moment(&row) - moment(&before)).abs() < 1e-12, "degree {q}");
        }
        assert!((row[3] - 0.75 / (2.4 * 2.0 * 1.0)).abs() < 1e-12);

        let mut untouched = before;
        tune_row(0.4, 0.0, &mut untouched);
        assert_eq!(untouched, before);
    }
}
