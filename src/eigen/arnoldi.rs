//! Non-symmetric back end: restarted Arnoldi with full reorthogonalization.

use faer::Mat;
use num_complex::Complex64;
use rand::prelude::*;

use super::{
    dense, fill_random, norm, orthogonalize, random_orthogonal, select_nonsymmetric, Backend, Counters, Mode, Problem,
    Step, Which, Workspace,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Start,
    Expanding,
    Done,
}

/// `workl` layout for `k = ncv`: Hessenberg matrix, real and imaginary
/// parts of its eigenvectors (`k x k` each), then eigenvalue real parts,
/// imaginary parts and bounds (`k` each).
#[derive(Debug, Clone, Copy)]
struct Layout {
    k: usize,
}

impl Layout {
    fn h(self) -> usize {
        0
    }
    fn yre(self) -> usize {
        self.k * self.k
    }
    fn yim(self) -> usize {
        2 * self.k * self.k
    }
    fn wr(self) -> usize {
        3 * self.k * self.k
    }
    fn wi(self) -> usize {
        self.wr() + self.k
    }
}

pub(super) struct Arnoldi {
    p: Problem,
    layout: Layout,
    rng: StdRng,
    state: State,
    j: usize,
    hnorm: f64,
    rnorm: f64,
    wanted: Vec<usize>,
    counters: Counters,
}

impl Arnoldi {
    pub(super) fn new(p: Problem) -> Self {
        Self {
            layout: Layout { k: p.ncv },
            rng: StdRng::seed_from_u64(p.seed),
            state: State::Start,
            j: 0,
            hnorm: 0.0,
            rnorm: 0.0,
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
        if p.ncv < p.nev + 2 || p.ncv > p.n {
            return Err(-3);
        }
        if p.max_iter == 0 {
            return Err(-4);
        }
        if matches!(
            p.which,
            Which::LargestAlgebraic | Which::SmallestAlgebraic | Which::BothEnds
        ) {
            return Err(-5);
        }
        if p.lworkl < super::nonsymmetric_lworkl(p.ncv) {
            return Err(-7);
        }
        match p.mode {
            Mode::Regular | Mode::ShiftInvert => Ok(()),
            Mode::RegularInverse => Err(-11),
            Mode::Buckling | Mode::Cayley => Err(-10),
        }
    }

    fn begin_cycle(&mut self, ws: &mut Workspace<'_>) -> Step {
        let (n, k) = (self.p.n, self.p.ncv);
        let mut rnorm = norm(ws.resid);
        if rnorm <= f64::MIN_POSITIVE {
            fill_random(&mut self.rng, ws.resid);
            rnorm = norm(ws.resid);
        }
        for (vi, ri) in ws.v[..n].iter_mut().zip(ws.resid.iter()) {
            *vi = ri / rnorm;
        }
        ws.workl[self.layout.h()..self.layout.h() + k * k].fill(0.0);
        ws.workd[..n].copy_from_slice(&ws.v[..n]);
        self.j = 0;
        self.state = State::Expanding;
        Step::Apply { input: 0, output: n }
    }

    fn absorb(&mut self, ws: &mut Workspace<'_>) -> Step {
        let (n, ldv, k) = (self.p.n, self.p.ldv, self.p.ncv);
        let j = self.j;
        self.counters.op_applications += 1;

        let col = self.layout.h() + j * k;
        let w = &mut ws.workd[n..2 * n];
        let h = &mut ws.workl[col..col + k];
        if orthogonalize(ws.v, ldv, n, j + 1, w, h) {
            self.counters.reorthogonalizations += 1;
        }
        let beta = norm(w);
        self.hnorm = self.hnorm.max(h[..=j].iter().map(|x| x.abs()).sum::<f64>() + beta);
        let breakdown = beta <= f64::EPSILON * self.hnorm;
        let beta = if breakdown { 0.0 } else { beta };

        if j + 1 == k {
            self.rnorm = beta;
            return self.analyze(ws);
        }
        h[j + 1] = beta;

        let (basis, rest) = ws.v.split_at_mut((j + 1) * ldv);
        let next = &mut rest[..n];
        if breakdown {
            log::trace!("arnoldi breakdown at step {j}, continuing with a random direction");
            let wr = self.layout.wr();
            let scratch = &mut ws.workl[wr..wr + k];
            if !random_orthogonal(&mut self.rng, basis, ldv, n, j + 1, next, scratch) {
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

    fn analyze(&mut self, ws: &mut Workspace<'_>) -> Step {
        let (n, ldv, k) = (self.p.n, self.p.ldv, self.p.ncv);
        self.counters.iterations += 1;

        let (h, rest) = ws.workl.split_at_mut(k * k);
        let (yre, rest) = rest.split_at_mut(k * k);
        let (yim, rest) = rest.split_at_mut(k * k);
        let (wr, rest) = rest.split_at_mut(k);
        let (wi, rest) = rest.split_at_mut(k);
        let bounds = &mut rest[..k];

        if !dense::hessenberg_eigenvalues(h, k, k, wr, wi) {
            return Step::Failed(-8);
        }
        for i in 0..k {
            let Some(y) = dense::hessenberg_eigenvector(h, k, k, Complex64::new(wr[i], wi[i])) else {
                return Step::Failed(-8);
            };
            for (c, yc) in y.iter().enumerate() {
                yre[c + i * k] = yc.re;
                yim[c + i * k] = yc.im;
            }
            bounds[i] = self.rnorm * y[k - 1].norm();
        }

        let partner = |i: usize| if wi[i] < 0.0 { i + 1 } else { i - 1 };
        self.wanted = select_nonsymmetric(wr, wi, self.p.which, self.p.nev, partner);
        let nconv = self
            .wanted
            .iter()
            .filter(|&&i| self.p.converged(bounds[i], wr[i].hypot(wi[i])))
            .count();
        self.counters.converged = nconv;
        log::trace!(
            "arnoldi cycle {}: {nconv}/{} converged, residual {:e}",
            self.counters.iterations,
            self.wanted.len(),
            self.rnorm
        );

        if nconv >= self.wanted.len() {
            self.state = State::Done;
            return Step::Converged;
        }
        if self.counters.iterations >= self.p.max_iter {
            return Step::Failed(1);
        }

        // restart from the real and imaginary parts of the wanted Ritz vectors
        ws.resid.fill(0.0);
        for &i in &self.wanted {
            for c in 0..k {
                let coeff = yre[c + i * k] + yim[c + i * k];
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

    pub(super) fn extract(&self, ws: &Workspace<'_>, want_vectors: bool) -> Result<(Mat<f64>, Option<Mat<f64>>), i32> {
        if self.state != State::Done {
            return Err(-14);
        }
        let (n, k, ldv) = (self.p.n, self.p.ncv, self.p.ldv);
        let l = self.layout;
        let wr = &ws.workl[l.wr()..l.wr() + k];
        let wi = &ws.workl[l.wi()..l.wi() + k];
        let yre = &ws.workl[l.yre()..l.yre() + k * k];
        let yim = &ws.workl[l.yim()..l.yim() + k * k];
        let sigma = Complex64::new(self.p.sigma, self.p.sigma_imag);

        let count = self.wanted.len();
        let mut values = Mat::<f64>::zeros(count, 2);
        for (row, &i) in self.wanted.iter().enumerate() {
            let theta = Complex64::new(wr[i], wi[i]);
            let lambda = match self.p.mode {
                Mode::ShiftInvert if theta.norm() == 0.0 => return Err(-14),
                Mode::ShiftInvert => sigma + theta.inv(),
                _ => theta,
            };
            values[(row, 0)] = lambda.re;
            values[(row, 1)] = lambda.im;
        }

        if !want_vectors {
            return Ok((values, None));
        }
        let combine = |y: &[f64], i: usize, r: usize| -> f64 {
            (0..k).map(|c| y[c + i * k] * ws.v[r + c * ldv]).sum()
        };
        let mut vectors = Mat::<f64>::zeros(n, count);
        let mut col = 0;
        while col < count {
            let i = self.wanted[col];
            if wi[i] == 0.0 {
                for r in 0..n {
                    vectors[(r, col)] = combine(yre, i, r);
                }
                let len = (0..n).map(|r| vectors[(r, col)].powi(2)).sum::<f64>().sqrt();
                if len > 0.0 {
                    for r in 0..n {
                        vectors[(r, col)] /= len;
                    }
                }
                col += 1;
                continue;
            }
            // conjugate pair: real part in `col`, imaginary part in `col + 1`
            for r in 0..n {
                vectors[(r, col)] = combine(yre, i, r);
                vectors[(r, col + 1)] = combine(yim, i, r);
            }
            let len = (0..n)
                .map(|r| vectors[(r, col)].powi(2) + vectors[(r, col + 1)].powi(2))
                .sum::<f64>()
                .sqrt();
            if len > 0.0 {
                for r in 0..n {
                    vectors[(r, col)] /= len;
                    vectors[(r, col + 1)] /= len;
                }
            }
            col += 2;
        }
        Ok((values, Some(vectors)))
    }
}

impl Backend for Arnoldi {
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
