//! Small dense eigen kernels for projected matrices.
//!
//! All matrices are column-major with an explicit leading dimension, so the
//! kernels can work directly inside the solver's `workl` buffer.

use num_complex::Complex64;

const MAX_SWEEPS: usize = 30;

/// `|a|` with the sign of `b`.
fn sign(a: f64, b: f64) -> f64 {
    if b >= 0.0 {
        a.abs()
    } else {
        -a.abs()
    }
}

/// Eigen-decomposition of a symmetric tridiagonal matrix by implicit QL.
///
/// `d` holds the diagonal and becomes the eigenvalues in ascending order.
/// `e[i]` couples rows `i` and `i + 1` and is destroyed. `z` (`n x n`,
/// leading dimension `ldz`) must hold the identity on entry and receives the
/// eigenvectors as columns. Returns `false` if an eigenvalue needed more than
/// thirty sweeps.
pub(crate) fn tridiagonal_ql(d: &mut [f64], e: &mut [f64], z: &mut [f64], n: usize, ldz: usize) -> bool {
    if n == 0 {
        return true;
    }
    e[n - 1] = 0.0;
    for l in 0..n {
        let mut sweeps = 0;
        loop {
            let mut m = l;
            while m < n - 1 {
                let dd = d[m].abs() + d[m + 1].abs();
                if e[m].abs() + dd == dd {
                    break;
                }
                m += 1;
            }
            if m == l {
                break;
            }
            if sweeps == MAX_SWEEPS {
                return false;
            }
            sweeps += 1;

            let mut g = (d[l + 1] - d[l]) / (2.0 * e[l]);
            let mut r = g.hypot(1.0);
            g = d[m] - d[l] + e[l] / (g + sign(r, g));
            let (mut s, mut c, mut p) = (1.0, 1.0, 0.0);
            let mut underflow = false;
            let mut i = m;
            while i > l {
                i -= 1;
                let f = s * e[i];
                let b = c * e[i];
                r = f.hypot(g);
                e[i + 1] = r;
                if r == 0.0 {
                    d[i + 1] -= p;
                    e[m] = 0.0;
                    underflow = true;
                    break;
                }
                s = f / r;
                c = g / r;
                g = d[i + 1] - p;
                r = (d[i] - g) * s + 2.0 * c * b;
                p = s * r;
                d[i + 1] = g + p;
                g = c * r - b;
                for row in 0..n {
                    let zi = z[row + i * ldz];
                    let zi1 = z[row + (i + 1) * ldz];
                    z[row + (i + 1) * ldz] = s * zi + c * zi1;
                    z[row + i * ldz] = c * zi - s * zi1;
                }
            }
            if underflow {
                continue;
            }
            d[l] -= p;
            e[l] = g;
            e[m] = 0.0;
        }
    }

    // selection sort, moving eigenvector columns along
    for i in 0..n {
        let k = (i..n)
            .min_by(|&a, &b| d[a].total_cmp(&d[b]))
            .unwrap_or(i);
        if k != i {
            d.swap(i, k);
            for row in 0..n {
                z.swap(row + i * ldz, row + k * ldz);
            }
        }
    }
    true
}

/// Eigenvalues of an upper Hessenberg matrix by shifted QR (Francis double step).
///
/// `h` is `n x n` with leading dimension `ldh` and is left untouched.
/// Complex conjugate pairs come out in adjacent slots. Returns `false` when
/// the iteration does not settle.
pub(crate) fn hessenberg_eigenvalues(h: &[f64], n: usize, ldh: usize, wr: &mut [f64], wi: &mut [f64]) -> bool {
    if n == 0 {
        return true;
    }
    // 1-based row-major working copy keeps the index arithmetic readable
    let dim = n + 1;
    let at = |i: usize, j: usize| i * dim + j;
    let mut a = vec![0.0; dim * dim];
    for j in 0..n {
        for i in 0..n.min(j + 2) {
            a[at(i + 1, j + 1)] = h[i + j * ldh];
        }
    }

    let mut anorm = 0.0;
    for i in 1..=n {
        for j in i.saturating_sub(1).max(1)..=n {
            anorm += a[at(i, j)].abs();
        }
    }

    let mut nn = n;
    let mut t = 0.0;
    while nn >= 1 {
        let mut its = 0;
        loop {
            let mut l = nn;
            while l >= 2 {
                let mut s = a[at(l - 1, l - 1)].abs() + a[at(l, l)].abs();
                if s == 0.0 {
                    s = anorm;
                }
                if a[at(l, l - 1)].abs() + s == s {
                    a[at(l, l - 1)] = 0.0;
                    break;
                }
                l -= 1;
            }

            let mut x = a[at(nn, nn)];
            if l == nn {
                wr[nn - 1] = x + t;
                wi[nn - 1] = 0.0;
                nn -= 1;
            } else {
                let mut y = a[at(nn - 1, nn - 1)];
                let mut w = a[at(nn, nn - 1)] * a[at(nn - 1, nn)];
                if l == nn - 1 {
                    let p = 0.5 * (y - x);
                    let q = p * p + w;
                    let mut z = q.abs().sqrt();
                    x += t;
                    if q >= 0.0 {
                        z = p + sign(z, p);
                        wr[nn - 2] = x + z;
                        wr[nn - 1] = x + z;
                        if z != 0.0 {
                            wr[nn - 1] = x - w / z;
                        }
                        wi[nn - 2] = 0.0;
                        wi[nn - 1] = 0.0;
                    } else {
                        wr[nn - 2] = x + p;
                        wr[nn - 1] = x + p;
                        wi[nn - 2] = -z;
                        wi[nn - 1] = z;
                    }
                    nn -= 2;
                } else {
                    if its == MAX_SWEEPS {
                        return false;
                    }
                    if its == 10 || its == 20 {
                        // exceptional shift
                        t += x;
                        for i in 1..=nn {
                            a[at(i, i)] -= x;
                        }
                        let s = a[at(nn, nn - 1)].abs() + a[at(nn - 1, nn - 2)].abs();
                        x = 0.75 * s;
                        y = x;
                        w = -0.4375 * s * s;
                    }
                    its += 1;

                    let (mut p, mut q, mut r);
                    let mut m = nn - 2;
                    loop {
                        let z = a[at(m, m)];
                        r = x - z;
                        let s = y - z;
                        p = (r * s - w) / a[at(m + 1, m)] + a[at(m, m + 1)];
                        q = a[at(m + 1, m + 1)] - z - r - s;
                        r = a[at(m + 2, m + 1)];
                        let s = p.abs() + q.abs() + r.abs();
                        p /= s;
                        q /= s;
                        r /= s;
                        if m == l {
                            break;
                        }
                        let u = a[at(m, m - 1)].abs() * (q.abs() + r.abs());
                        let v = p.abs() * (a[at(m - 1, m - 1)].abs() + z.abs() + a[at(m + 1, m + 1)].abs());
                        if u + v == v {
                            break;
                        }
                        m -= 1;
                    }

                    for i in m + 2..=nn {
                        a[at(i, i - 2)] = 0.0;
                        if i != m + 2 {
                            a[at(i, i - 3)] = 0.0;
                        }
                    }

                    for k in m..nn {
                        if k != m {
                            p = a[at(k, k - 1)];
                            q = a[at(k + 1, k - 1)];
                            r = if k != nn - 1 { a[at(k + 2, k - 1)] } else { 0.0 };
                            x = p.abs() + q.abs() + r.abs();
                            if x != 0.0 {
                                p /= x;
                                q /= x;
                                r /= x;
                            }
                        }
                        let s = sign((p * p + q * q + r * r).sqrt(), p);
                        if s == 0.0 {
                            continue;
                        }
                        if k == m {
                            if l != m {
                                a[at(k, k - 1)] = -a[at(k, k - 1)];
                            }
                        } else {
                            a[at(k, k - 1)] = -s * x;
                        }
                        p += s;
                        x = p / s;
                        y = q / s;
                        let z = r / s;
                        q /= p;
                        r /= p;
                        for j in k..=nn {
                            let mut pp = a[at(k, j)] + q * a[at(k + 1, j)];
                            if k != nn - 1 {
                                pp += r * a[at(k + 2, j)];
                                a[at(k + 2, j)] -= pp * z;
                            }
                            a[at(k + 1, j)] -= pp * y;
                            a[at(k, j)] -= pp * x;
                        }
                        let mmin = nn.min(k + 3);
                        for i in l..=mmin {
                            let mut pp = x * a[at(i, k)] + y * a[at(i, k + 1)];
                            if k != nn - 1 {
                                pp += z * a[at(i, k + 2)];
                                a[at(i, k + 2)] -= pp * r;
                            }
                            a[at(i, k + 1)] -= pp * q;
                            a[at(i, k)] -= pp;
                        }
                    }
                }
            }
            if l + 1 >= nn {
                break;
            }
        }
    }
    wr[..n].iter().chain(&wi[..n]).all(|v| v.is_finite())
}

/// Eigenvector of the Hessenberg matrix `h` for the eigenvalue `lambda`,
/// by inverse iteration on a slightly perturbed shift.
///
/// The result has unit 2-norm. `None` if the solve produced non-finite values.
pub(crate) fn hessenberg_eigenvector(h: &[f64], n: usize, ldh: usize, lambda: Complex64) -> Option<Vec<Complex64>> {
    if n == 0 {
        return Some(Vec::new());
    }
    let hnorm = (0..n)
        .flat_map(|j| (0..n.min(j + 2)).map(move |i| (i, j)))
        .map(|(i, j)| h[i + j * ldh].abs())
        .fold(0.0_f64, f64::max)
        .max(f64::MIN_POSITIVE);
    let eps = f64::EPSILON * hnorm;
    let shift = lambda + Complex64::new(eps, 0.0);

    // row-major LU of (H - shift I) with partial pivoting
    let mut lu = vec![Complex64::new(0.0, 0.0); n * n];
    for j in 0..n {
        for i in 0..n.min(j + 2) {
            lu[i * n + j] = Complex64::new(h[i + j * ldh], 0.0);
        }
        lu[j * n + j] -= shift;
    }
    let mut perm: Vec<usize> = (0..n).collect();
    for col in 0..n {
        let pivot = (col..n)
            .max_by(|&a, &b| lu[a * n + col].norm().total_cmp(&lu[b * n + col].norm()))
            .unwrap_or(col);
        if pivot != col {
            for j in 0..n {
                lu.swap(col * n + j, pivot * n + j);
            }
            perm.swap(col, pivot);
        }
        if lu[col * n + col].norm() == 0.0 {
            lu[col * n + col] = Complex64::new(eps, 0.0);
        }
        let diag = lu[col * n + col];
        for row in col + 1..n {
            let factor = lu[row * n + col] / diag;
            lu[row * n + col] = factor;
            for j in col + 1..n {
                let delta = factor * lu[col * n + j];
                lu[row * n + j] -= delta;
            }
        }
    }

    let mut y = vec![Complex64::new(1.0, 0.0); n];
    for _ in 0..3 {
        let mut b: Vec<Complex64> = perm.iter().map(|&p| y[p]).collect();
        for row in 0..n {
            for j in 0..row {
                let delta = lu[row * n + j] * b[j];
                b[row] -= delta;
            }
        }
        for row in (0..n).rev() {
            for j in row + 1..n {
                let delta = lu[row * n + j] * b[j];
                b[row] -= delta;
            }
            b[row] /= lu[row * n + row];
        }
        let scale = b.iter().map(|c| c.norm()).fold(0.0_f64, f64::max);
        if !scale.is_finite() || scale == 0.0 {
            return None;
        }
        y = b.into_iter().map(|c| c / scale).collect();
    }

    // rotate so the largest component is real, then normalize
    let big = y
        .iter()
        .copied()
        .max_by(|a, b| a.norm().total_cmp(&b.norm()))
        .unwrap_or(Complex64::new(1.0, 0.0));
    let phase = big.conj() / big.norm();
    let norm = y.iter().map(|c| c.norm_sqr()).sum::<f64>().sqrt();
    Some(y.into_iter().map(|c| c * phase / norm).collect())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn identity(n: usize) -> Vec<f64> {
        let mut z = vec![0.0; n * n];
        for i in 0..n {
            z[i + i * n] = 1.0;
        }
        z
    }

    #[test]
    fn ql_on_path_laplacian() {
        // tridiag(-1, 2, -1) of size 3: 2 - sqrt2, 2, 2 + sqrt2
        let mut d = vec![2.0, 2.0, 2.0];
        let mut e = vec![-1.0, -1.0, 0.0];
        let mut z = identity(3);
        assert!(tridiagonal_ql(&mut d, &mut e, &mut z, 3, 3));
        let s = 2f64.sqrt();
        for (got, want) in d.iter().zip([2.0 - s, 2.0, 2.0 + s]) {
            assert!((got - want).abs() < 1e-12, "{got} vs {want}");
        }
        // middle eigenvector is (1, 0, -1)/sqrt2 up to sign
        assert!(z[1 + 3].abs() < 1e-12);
        assert!((z[3].abs() - 1.0 / s).abs() < 1e-12);
    }

    #[test]
    fn ql_already_diagonal() {
        let mut d = vec![3.0, -1.0];
        let mut e = vec![0.0, 0.0];
        let mut z = identity(2);
        assert!(tridiagonal_ql(&mut d, &mut e, &mut z, 2, 2));
        assert_eq!(d, vec![-1.0, 3.0]);
        assert_eq!(z, vec![0.0, 1.0, 1.0, 0.0]);
    }

    #[test]
    fn hqr_triangular() {
        // column-major upper triangular
        let h = [1.0, 0.0, 0.0, 2.0, 4.0, 0.0, 3.0, 5.0, 6.0];
        let mut wr = [0.0; 3];
        let mut wi = [0.0; 3];
        assert!(hessenberg_eigenvalues(&h, 3, 3, &mut wr, &mut wi));
        let mut got = wr.to_vec();
        got.sort_by(f64::total_cmp);
        for (g, w) in got.iter().zip([1.0, 4.0, 6.0]) {
            assert!((g - w).abs() < 1e-12);
        }
        assert!(wi.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn hqr_rotation_gives_conjugate_pair() {
        // [[0, -1], [1, 0]]
        let h = [0.0, 1.0, -1.0, 0.0];
        let mut wr = [0.0; 2];
        let mut wi = [0.0; 2];
        assert!(hessenberg_eigenvalues(&h, 2, 2, &mut wr, &mut wi));
        assert!(wr.iter().all(|v| v.abs() < 1e-12));
        assert!((wi[0] + wi[1]).abs() < 1e-12);
        assert!((wi[0].abs() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn hqr_full_hessenberg() {
        // [[4, 1, 2], [3, 5, 1], [0, 2, 6]]: trace 15, det 4*(30-2) - 1*(18-0) + 2*(6-0) = 106
        let h = [4.0, 3.0, 0.0, 1.0, 5.0, 2.0, 2.0, 1.0, 6.0];
        let mut wr = [0.0; 3];
        let mut wi = [0.0; 3];
        assert!(hessenberg_eigenvalues(&h, 3, 3, &mut wr, &mut wi));
        let eig: Vec<Complex64> = wr.iter().zip(&wi).map(|(&r, &i)| Complex64::new(r, i)).collect();
        let trace: Complex64 = eig.iter().sum();
        let det: Complex64 = eig.iter().product();
        assert!((trace.re - 15.0).abs() < 1e-9 && trace.im.abs() < 1e-9);
        assert!((det.re - 106.0).abs() < 1e-8 && det.im.abs() < 1e-8);
    }

    #[test]
    fn inverse_iteration_finds_eigenvector() {
        // [[2, 1], [0, 3]], eigenvalue 3 has eigenvector (1, 1)
        let h = [2.0, 0.0, 1.0, 3.0];
        let y = hessenberg_eigenvector(&h, 2, 2, Complex64::new(3.0, 0.0)).unwrap();
        let r = 1.0 / 2f64.sqrt();
        assert!((y[0].re - r).abs() < 1e-10 && (y[1].re - r).abs() < 1e-10);
        assert!(y.iter().all(|c| c.im.abs() < 1e-12));
    }

    #[test]
    fn inverse_iteration_complex() {
        let h = [0.0, 1.0, -1.0, 0.0];
        let lambda = Complex64::new(0.0, 1.0);
        let y = hessenberg_eigenvector(&h, 2, 2, lambda).unwrap();
        // H y = lambda y
        let hy0 = -y[1];
        let hy1 = y[0];
        assert!((hy0 - lambda * y[0]).norm() < 1e-10);
        assert!((hy1 - lambda * y[1]).norm() < 1e-10);
    }
}
