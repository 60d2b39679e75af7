//! Symmetric back end: restarted Lanczos with full reorthogonalization.

use faer::Mat;
use rand::prelude::*;

use super::{
    dense, fill_random, norm, orthogonalize, random_orthogonal, select_symmetric, Backend, Counters, Mode, Problem,
    Step, Which, Workspace,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Start,
    Expanding,
    Done,
}

/// `workl` layout for `k = ncv`: diagonal, off-diagonal, Ritz values,
/// bounds and scratch (`k` each), then the `k x k` Ritz vectors of the
/// tridiagonal matrix.
struct Layout {
    k: usize,
}

impl Layout {
    fn diag(&self) -> usize {
        0
    }
    fn offdiag(&self) -> usize {
        self.k
    }
    fn ritz(&self) -> usize {
        2 * self.k
    }
    fn bounds(&self) -> usize {
        3 * self.k
    }
    fn scratch(&self) -> usize {
        4 * self.k
    }
    fn z(&self) -> usize {
        5 * self.k
    }
}

pub(super) struct Lanczos {
    p: Problem,
    layout: Layout,
    rng: StdRng,
    state: State,
    j: usize,
    tnorm: f64,
    wanted: Vec<usize>,
    counters: Counters,
}

impl Lanczos {
    pub(super) fn new(p: Problem) -> Self {
        Self {
            layout: Layout { k: p.ncv },
            rng: StdRng::seed_from_u64(p.seed),
            state: State::Start,
            j: 0,
            tnorm: 0.0,
            wanted: Vec::new(),
            counters: Counters::default(),
            p,
        }
    }

    fn validate(&self) -> Result<(), i32> {
        let p = &self.p;
        if p.n == 0 {
            return Err(-1);
        }
        if p.nev == 0 {
            return Err(-2);
        }
        if p.ncv <= p.nev || p.ncv > p.n {
            return Err(-3);
        }
        if p.max_iter == 0 {
            return Err(-4);
        }
        if !matches!(
            p.which,
            Which::LargestAlgebraic
                | Which::SmallestAlgebraic
                | Which::LargestMagnitude
                | Which::SmallestMagnitude
                | Which::BothEnds
        ) {
            return Err(-5);
        }
        if p.lworkl < super::symmetric_lworkl(p.ncv) {
            return Err(-7);
        }
        if matches!(p.mode, Mode::RegularInverse | Mode::Buckling | Mode::Cayley) {
            return Err(-11);
        }
        if p.which == Which::BothEnds && p.nev == 1 {
            return Err(-13);
        }
        Ok(())
    }

    /// Normalize `resid` into the first basis vector and ask for its product.
    fn begin_cycle(&mut self, ws: &mut Workspace<'_>) -> Step {
        let n = self.p.n;
        let mut rnorm = norm(ws.resid);
        if rnorm <= f64::MIN_POSITIVE {
            fill_random(&mut self.rng, ws.resid);
            rnorm = norm(ws.resid);
        }
        for (vi, ri) in ws.v[..n].iter_mut().zip(ws.resid.iter()) {
            *vi = ri / rnorm;
        }
        ws.workd[..n].copy_from_slice(&ws.v[..n]);
        self.j = 0;
        self.state = State::Expanding;
        Step::Apply { input: 0, output: n }
    }

    /// Fold `OP v_j` (in `workd[n..2n]`) into the factorization.
    fn absorb(&mut self, ws: &mut Workspace<'_>) -> Step {
        let (n, ldv, k) = (self.p.n, self.p.ldv, self.p.ncv);
        let j = self.j;
        self.counters.op_applications += 1;

        let scratch = self.layout.scratch();
        let w = &mut ws.workd[n..2 * n];
        let coeffs = &mut ws.workl[scratch..scratch + k];
        if orthogonalize(ws.v, ldv, n, j + 1, w, coeffs) {
            self.counters.reorthogonalizations += 1;
        }
        let alpha = coeffs[j];
        let beta = norm(w);
        self.tnorm = self.tnorm.max(alpha.abs() + beta);
        let breakdown = beta <= f64::EPSILON * self.tnorm;
        ws.workl[self.layout.diag() + j] = alpha;
        ws.workl[self.layout.offdiag() + j] = if breakdown { 0.0 } else { beta };

        if j + 1 == k {
            return self.analyze(ws);
        }

        let (basis, rest) = ws.v.split_at_mut((j + 1) * ldv);
        let next = &mut rest[..n];
        if breakdown {
            log::trace!("lanczos breakdown at step {j}, continuing with a random direction");
            let coeffs = &mut ws.workl[scratch..scratch + k];
            if !random_orthogonal(&mut self.rng, basis, ldv, n, j + 1, next, coeffs) {
                return Step::Failed(-9999);
            }
        } else {
            for (ni, wi) in next.iter_mut().zip(ws.workd[n..2 * n].iter()) {
                *ni = wi / beta;
            }
        }
        ws.workd[..n].copy_from_slice(next);
        self.j = j + 1;
        Step::Apply { input: 0, output: n }
    }

    /// Diagonalize the tridiagonal matrix, test convergence, restart if needed.
    fn analyze(&mut self, ws: &mut Workspace<'_>) -> Step {
        let k = self.p.ncv;
        let l = &self.layout;
        self.counters.iterations += 1;

        let (head, z) = ws.workl.split_at_mut(l.z());
        let (tri, rest) = head.split_at_mut(l.ritz());
        let (ritz, rest) = rest.split_at_mut(k);
        let (bounds, scratch) = rest.split_at_mut(k);
        ritz.copy_from_slice(&tri[..k]);
        scratch[..k].copy_from_slice(&tri[k..2 * k]);
        let z = &mut z[..k * k];
        z.fill(0.0);
        for i in 0..k {
            z[i + i * k] = 1.0;
        }
        if !dense::tridiagonal_ql(ritz, &mut scratch[..k], z, k, k) {
            return Step::Failed(-8);
        }

        let beta = tri[k + k - 1];
        for (i, b) in bounds.iter_mut().enumerate() {
            *b = (beta * z[(k - 1) + i * k]).abs();
        }
        self.wanted = select_symmetric(ritz, self.p.which, self.p.nev);
        let nconv = self
            .wanted
            .iter()
            .filter(|&&i| self.p.converged(bounds[i], ritz[i].abs()))
            .count();
        self.counters.converged = nconv;
        log::trace!(
            "lanczos cycle {}: {nconv}/{} converged, residual {beta:e}",
            self.counters.iterations,
            self.p.nev
        );

        if nconv >= self.p.nev {
            self.state = State::Done;
            return Step::Converged;
        }
        if self.counters.iterations >= self.p.max_iter {
            return Step::Failed(1);
        }

        // restart from the sum of the wanted Ritz vectors
        let (n, ldv) = (self.p.n, self.p.ldv);
        ws.resid.fill(0.0);
        for &i in &self.wanted {
            for c in 0..k {
                let coeff = z[c + i * k];
                if coeff == 0.0 {
                    continue;
                }
                let col = &ws.v[c * ldv..c * ldv + n];
                for (r, vc) in ws.resid.iter_mut().zip(col) {
                    *r += coeff * vc;
                }
            }
        }
        self.begin_cycle(ws)
    }

    /// Wanted eigenvalues and optionally their eigenvectors.
    pub(super) fn extract(&self, ws: &Workspace<'_>, want_vectors: bool) -> Result<(Vec<f64>, Option<Mat<f64>>), i32> {
        if self.state != State::Done {
            return Err(-14);
        }
        let (n, k, ldv) = (self.p.n, self.p.ncv, self.p.ldv);
        let ritz = &ws.workl[self.layout.ritz()..self.layout.ritz() + k];
        let z = &ws.workl[self.layout.z()..self.layout.z() + k * k];

        let values = self
            .wanted
            .iter()
            .map(|&i| match self.p.mode {
                Mode::ShiftInvert if ritz[i] == 0.0 => Err(-14),
                Mode::ShiftInvert => Ok(self.p.sigma + 1.0 / ritz[i]),
                _ => Ok(ritz[i]),
            })
            .collect::<Result<Vec<f64>, i32>>()?;

        let vectors = want_vectors.then(|| {
            let mut m = Mat::<f64>::zeros(n, self.wanted.len());
            for (col, &i) in self.wanted.iter().enumerate() {
                for c in 0..k {
                    let coeff = z[c + i * k];
                    for r in 0..n {
                        m[(r, col)] += coeff * ws.v[r + c * ldv];
                    }
                }
                let len = (0..n).map(|r| m[(r, col)] * m[(r, col)]).sum::<f64>().sqrt();
                if len > 0.0 {
                    for r in 0..n {
                        m[(r, col)] /= len;
                    }
                }
            }
            m
        });
        Ok((values, vectors))
    }
}

impl Backend for Lanczos {
    fn step(&mut self, ws: &mut Workspace<'_>) -> Step {
        match self.state {
            State::Start => {
                if let Err(code) = self.validate() {
                    return Step::Failed(code);
                }
                if self.p.start {
                    if norm(ws.resid) == 0.0 {
                        return Step::Failed(-9);
                    }
                } else {
                    fill_random(&mut self.rng, ws.resid);
                }
                self.begin_cycle(ws)
            }
            State::Expanding => self.absorb(ws),
            State::Done => Step::Converged,
        }
    }

    fn counters(&self) -> Counters {
        self.counters
    }
}
