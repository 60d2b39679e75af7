//! Reverse-communication eigensolver for large sparse operators.
//!
//! The caller never hands over a matrix. Instead it supplies a [`MatVec`]
//! that computes `y = OP x`, and the solver drives it until `nev` Ritz values
//! of the projected problem have converged.
//!
//! Two back ends share one driver:
//!
//! - [`solve_symmetric`]: Lanczos with full reorthogonalization and explicit
//!   restarts. The projected matrix is tridiagonal and is diagonalized by
//!   implicit QL.
//! - [`solve_nonsymmetric`]: Arnoldi with full reorthogonalization. The
//!   projected matrix is upper Hessenberg; its eigenvalues come from shifted
//!   QR and its eigenvectors from inverse iteration.
//!
//! Each back end is a state machine. A call to its `step` either asks the
//! driver to apply the operator between two slices of the `workd` buffer, or
//! reports that the iteration has finished. The driver owns the callback,
//! polls the optional [`Interrupt`] between steps, and turns the back end's
//! integer status into a typed [`SolverDiagnostic`].
//!
//! # Workspace
//!
//! | buffer  | length                                   |
//! |---------|------------------------------------------|
//! | `v`     | `ldv * ncv`, column-major basis          |
//! | `workd` | `3 n`, operator input at 0, output at `n` |
//! | `workl` | `ncv (ncv + 8)` symmetric, `3 ncv (ncv + 2)` otherwise |
//! | `resid` | `n`, start vector and restart vector     |
//!
//! Repeated solves can reuse an [`EigenStorage`] to avoid reallocating.
//!
//! # Spectral transformation
//!
//! With [`Mode::ShiftInvert`] the operator is expected to compute
//! `inv(A - sigma I) x`. [`Which`] then refers to eigenvalues `theta` of that
//! operator, and the results are mapped back with `lambda = sigma + 1 / theta`.
//! Modes that need a mass matrix `B` are rejected, since only the identity is
//! supported.

mod arnoldi;
mod dense;
mod diagnostic;
mod lanczos;

pub use diagnostic::SolverDiagnostic;

use faer::Mat;
use rand::prelude::*;

use crate::error::{Error, Result};
use crate::interrupt::{self, Interrupt};

/// The operator the solver iterates with: `output = OP input`.
///
/// Both slices have length `n`. Closures with the matching signature
/// implement this trait.
pub trait MatVec {
    /// Apply the operator. An `Err` aborts the solve with
    /// [`Error::OperatorFailure`].
    fn apply(&mut self, output: &mut [f64], input: &[f64]) -> Result<()>;
}

impl<F> MatVec for F
where
    F: FnMut(&mut [f64], &[f64]) -> Result<()>,
{
    fn apply(&mut self, output: &mut [f64], input: &[f64]) -> Result<()> {
        self(output, input)
    }
}

/// Which part of the spectrum to compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Which {
    /// Largest algebraic values (symmetric only).
    LargestAlgebraic,
    /// Smallest algebraic values (symmetric only).
    SmallestAlgebraic,
    /// Largest magnitude.
    LargestMagnitude,
    /// Smallest magnitude.
    SmallestMagnitude,
    /// Half from each end of the spectrum (symmetric only).
    BothEnds,
    /// Largest real part (non-symmetric only).
    LargestReal,
    /// Smallest real part (non-symmetric only).
    SmallestReal,
    /// Largest imaginary part in magnitude (non-symmetric only).
    LargestImaginary,
    /// Smallest imaginary part in magnitude (non-symmetric only).
    SmallestImaginary,
}

/// Spectral transformation the operator implements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Mode {
    /// `OP = A`.
    #[default]
    Regular,
    /// `OP = inv(M) A`; needs a mass matrix.
    RegularInverse,
    /// `OP = inv(A - sigma I)`.
    ShiftInvert,
    /// Buckling transformation; needs a mass matrix.
    Buckling,
    /// Cayley transformation; needs a mass matrix.
    Cayley,
}

/// Parameters of a solve, plus the counters the solver writes back.
///
/// Zero `ldv` and `lworkl` mean "derive from `n` and `ncv`"; the derived
/// values are used for the solve but not stored.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EigenOptions {
    /// Problem dimension.
    pub n: usize,
    /// Number of eigenvalues wanted.
    pub nev: usize,
    /// Number of basis vectors (`nev < ncv <= n` symmetric,
    /// `nev + 2 <= ncv <= n` otherwise).
    pub ncv: usize,
    /// Spectrum selector. `None` means largest algebraic for symmetric
    /// problems and largest magnitude otherwise.
    pub which: Option<Which>,
    /// Relative accuracy of Ritz values; `0` means machine precision.
    pub tol: f64,
    /// Maximum number of restart cycles.
    pub max_iter: usize,
    /// Spectral transformation.
    pub mode: Mode,
    /// Real part of the shift.
    pub sigma: f64,
    /// Imaginary part of the shift (non-symmetric only).
    pub sigma_imag: f64,
    /// Leading dimension of the basis; `0` means `n`.
    pub ldv: usize,
    /// Length of `workl`; `0` means the minimum for `ncv`.
    pub lworkl: usize,
    /// Seed for random start and breakdown vectors.
    pub seed: u64,
    /// Checked between solver steps.
    #[cfg_attr(feature = "serde", serde(skip))]
    pub interrupt: Option<Interrupt>,

    /// Output: restart cycles performed.
    pub iterations: usize,
    /// Output: converged Ritz values.
    pub converged: usize,
    /// Output: operator applications.
    pub op_applications: usize,
    /// Output: Gram-Schmidt refinement passes.
    pub reorthogonalizations: usize,
    /// Output: raw back end status (`0` success, `1` iteration budget, negative errors).
    pub info: i32,
}

impl Default for EigenOptions {
    fn default() -> Self {
        Self {
            n: 0,
            nev: 1,
            ncv: 3,
            which: None,
            tol: 0.0,
            max_iter: 3000,
            mode: Mode::Regular,
            sigma: 0.0,
            sigma_imag: 0.0,
            ldv: 0,
            lworkl: 0,
            seed: 1,
            interrupt: None,
            iterations: 0,
            converged: 0,
            op_applications: 0,
            reorthogonalizations: 0,
            info: 0,
        }
    }
}

impl EigenOptions {
    /// Defaults for an `n`-dimensional problem.
    pub fn new(n: usize) -> Self {
        Self {
            n,
            ..Self::default()
        }
    }

    /// Number of eigenvalues wanted.
    pub fn with_nev(mut self, nev: usize) -> Self {
        self.nev = nev;
        self
    }

    /// Number of basis vectors.
    pub fn with_ncv(mut self, ncv: usize) -> Self {
        self.ncv = ncv;
        self
    }

    /// Spectrum selector.
    pub fn with_which(mut self, which: Which) -> Self {
        self.which = Some(which);
        self
    }

    /// Relative accuracy.
    pub fn with_tol(mut self, tol: f64) -> Self {
        self.tol = tol;
        self
    }

    /// Restart budget.
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Shift-invert around `sigma`; the operator must apply `inv(A - sigma I)`.
    pub fn with_shift_invert(mut self, sigma: f64) -> Self {
        self.mode = Mode::ShiftInvert;
        self.sigma = sigma;
        self
    }

    /// Seed for random vectors.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Cancellation flag.
    pub fn with_interrupt(mut self, interrupt: Interrupt) -> Self {
        self.interrupt = Some(interrupt);
        self
    }

    fn record(&mut self, counters: Counters, info: i32) {
        self.iterations = counters.iterations;
        self.converged = counters.converged;
        self.op_applications = counters.op_applications;
        self.reorthogonalizations = counters.reorthogonalizations;
        self.info = info;
    }
}

fn symmetric_lworkl(ncv: usize) -> usize {
    ncv * (ncv + 8)
}

fn nonsymmetric_lworkl(ncv: usize) -> usize {
    3 * ncv * (ncv + 2)
}

/// Preallocated buffers for repeated solves up to a given size.
#[derive(Debug, Clone)]
pub struct EigenStorage {
    max_n: usize,
    max_ncv: usize,
    max_ldv: usize,
    symmetric: bool,
    v: Vec<f64>,
    workd: Vec<f64>,
    workl: Vec<f64>,
    resid: Vec<f64>,
}

impl EigenStorage {
    /// Buffers for problems with `n <= max_n`, `ncv <= max_ncv` and
    /// `ldv <= max_ldv`.
    pub fn new(max_n: usize, max_ncv: usize, max_ldv: usize, symmetric: bool) -> Result<Self> {
        let lworkl = if symmetric {
            symmetric_lworkl(max_ncv)
        } else {
            nonsymmetric_lworkl(max_ncv)
        };
        Ok(Self {
            max_n,
            max_ncv,
            max_ldv,
            symmetric,
            v: zeroed(max_ldv * max_ncv)?,
            workd: zeroed(3 * max_n)?,
            workl: zeroed(lworkl)?,
            resid: zeroed(max_n)?,
        })
    }

    /// Whether the buffers are laid out for the symmetric solver.
    pub fn is_symmetric(&self) -> bool {
        self.symmetric
    }

    fn check(&self, p: &Problem, symmetric: bool) -> Result<()> {
        if self.symmetric && !symmetric {
            return Err(Error::InsufficientStorage {
                what: "non-symmetric workspace",
                required: nonsymmetric_lworkl(p.ncv),
                available: self.workl.len(),
            });
        }
        let limits = [
            ("n", p.n, self.max_n),
            ("ncv", p.ncv, self.max_ncv),
            ("ldv", p.ldv, self.max_ldv),
            ("lworkl", p.lworkl, self.workl.len()),
        ];
        for (what, required, available) in limits {
            if required > available {
                return Err(Error::InsufficientStorage {
                    what,
                    required,
                    available,
                });
            }
        }
        Ok(())
    }
}

fn zeroed(len: usize) -> Result<Vec<f64>> {
    let mut v = Vec::new();
    v.try_reserve_exact(len).map_err(|_| Error::OutOfMemory {
        context: "allocating eigensolver workspace",
    })?;
    v.resize(len, 0.0);
    Ok(v)
}

/// Eigenpairs of a symmetric operator, most wanted first.
#[derive(Debug, Clone)]
pub struct SymmetricEigen {
    /// `nev` eigenvalues.
    pub values: Vec<f64>,
    /// `n x nev` unit eigenvectors, when requested.
    pub vectors: Option<Mat<f64>>,
}

/// Eigenpairs of a non-symmetric operator.
///
/// Row `j` of `values` holds the real and imaginary part of one eigenvalue.
/// A complex conjugate pair occupies rows `j` and `j + 1`, and then vector
/// columns `j` and `j + 1` hold the real and imaginary part of the
/// eigenvector belonging to row `j`. One extra row is returned when the
/// `nev`-th value would otherwise split a pair.
#[derive(Debug, Clone)]
pub struct NonSymmetricEigen {
    /// `k x 2` eigenvalues, `k` is `nev` or `nev + 1`.
    pub values: Mat<f64>,
    /// `n x k` eigenvectors, when requested.
    pub vectors: Option<Mat<f64>>,
}

/// Options resolved against their defaults.
#[derive(Debug, Clone)]
struct Problem {
    n: usize,
    nev: usize,
    ncv: usize,
    ldv: usize,
    lworkl: usize,
    which: Which,
    tol: f64,
    max_iter: usize,
    mode: Mode,
    sigma: f64,
    sigma_imag: f64,
    seed: u64,
    start: bool,
}

impl Problem {
    fn resolve(options: &EigenOptions, symmetric: bool, start: bool) -> Result<Self> {
        let ldv = if options.ldv == 0 { options.n } else { options.ldv };
        if ldv < options.n {
            return Err(Error::invalid("ldv", format!("{ldv} is smaller than n = {}", options.n)));
        }
        let lworkl = match options.lworkl {
            0 if symmetric => symmetric_lworkl(options.ncv),
            0 => nonsymmetric_lworkl(options.ncv),
            given => given,
        };
        let which = options.which.unwrap_or(if symmetric {
            Which::LargestAlgebraic
        } else {
            Which::LargestMagnitude
        });
        Ok(Self {
            n: options.n,
            nev: options.nev,
            ncv: options.ncv,
            ldv,
            lworkl,
            which,
            tol: if options.tol > 0.0 { options.tol } else { f64::EPSILON },
            max_iter: options.max_iter,
            mode: options.mode,
            sigma: options.sigma,
            sigma_imag: options.sigma_imag,
            seed: options.seed,
            start,
        })
    }

    /// Convergence test shared by both back ends.
    fn converged(&self, bound: f64, magnitude: f64) -> bool {
        bound <= self.tol * f64::EPSILON.powf(2.0 / 3.0).max(magnitude)
    }
}

/// What the driver should do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    /// Compute `workd[output..output + n] = OP workd[input..input + n]`.
    Apply { input: usize, output: usize },
    /// `nev` Ritz values converged; results can be extracted.
    Converged,
    /// Stopped with a status code.
    Failed(i32),
}

#[derive(Debug, Clone, Copy, Default)]
struct Counters {
    iterations: usize,
    converged: usize,
    op_applications: usize,
    reorthogonalizations: usize,
}

struct Workspace<'a> {
    v: &'a mut [f64],
    workd: &'a mut [f64],
    workl: &'a mut [f64],
    resid: &'a mut [f64],
}

trait Backend {
    fn step(&mut self, ws: &mut Workspace<'_>) -> Step;
    fn counters(&self) -> Counters;
}

/// Owned buffers when the caller passes no storage.
struct Buffers {
    v: Vec<f64>,
    workd: Vec<f64>,
    workl: Vec<f64>,
    resid: Vec<f64>,
}

impl Buffers {
    fn for_problem(p: &Problem) -> Result<Self> {
        Ok(Self {
            v: zeroed(p.ldv * p.ncv)?,
            workd: zeroed(3 * p.n)?,
            workl: zeroed(p.lworkl)?,
            resid: zeroed(p.n)?,
        })
    }
}

fn workspace<'a>(
    storage: Option<&'a mut EigenStorage>,
    owned: &'a mut Option<Buffers>,
    p: &Problem,
    symmetric: bool,
) -> Result<Workspace<'a>> {
    let (v, workd, workl, resid) = match storage {
        Some(s) => {
            s.check(p, symmetric)?;
            (&mut s.v, &mut s.workd, &mut s.workl, &mut s.resid)
        }
        None => {
            let b = owned.insert(Buffers::for_problem(p)?);
            (&mut b.v, &mut b.workd, &mut b.workl, &mut b.resid)
        }
    };
    Ok(Workspace {
        v: &mut v[..p.ldv * p.ncv],
        workd: &mut workd[..3 * p.n],
        workl: &mut workl[..p.lworkl],
        resid: &mut resid[..p.n],
    })
}

fn load_start(ws: &mut Workspace<'_>, start: Option<&[f64]>, n: usize) -> Result<()> {
    if let Some(start) = start {
        if start.len() != n {
            return Err(Error::invalid(
                "start",
                format!("length {} does not match n = {n}", start.len()),
            ));
        }
        ws.resid.copy_from_slice(start);
    }
    Ok(())
}

/// Run a back end until it converges or fails, returning its status.
fn drive(
    backend: &mut impl Backend,
    op: &mut impl MatVec,
    ws: &mut Workspace<'_>,
    n: usize,
    interrupt: Option<&Interrupt>,
) -> Result<i32> {
    loop {
        interrupt::poll(interrupt)?;
        match backend.step(ws) {
            Step::Apply { input, output } => {
                let (x, y) = if input < output {
                    let (lo, hi) = ws.workd.split_at_mut(output);
                    (&lo[input..input + n], &mut hi[..n])
                } else {
                    let (lo, hi) = ws.workd.split_at_mut(input);
                    (&hi[..n], &mut lo[output..output + n])
                };
                op.apply(y, x)
                    .map_err(|e| Error::OperatorFailure(Box::new(e)))?;
            }
            Step::Converged => return Ok(0),
            Step::Failed(code) => return Ok(code),
        }
    }
}

/// Compute `nev` eigenpairs of a symmetric operator.
///
/// `start`, when given, is the initial residual vector (length `n`, non-zero);
/// otherwise a random vector seeded by `options.seed` is used. Counters and
/// the raw status are written back into `options` on success and on solver
/// failure.
///
/// # Errors
///
/// - [`Error::Solver`] for invalid parameters or when the iteration budget
///   runs out ([`SolverDiagnostic::MaxIterations`]).
/// - [`Error::InsufficientStorage`] when `storage` is too small.
/// - [`Error::OperatorFailure`] when `op` fails.
/// - [`Error::Interrupted`] when the interrupt flag is raised.
pub fn solve_symmetric(
    mut op: impl MatVec,
    options: &mut EigenOptions,
    storage: Option<&mut EigenStorage>,
    start: Option<&[f64]>,
    want_vectors: bool,
) -> Result<SymmetricEigen> {
    let p = Problem::resolve(options, true, start.is_some())?;
    let mut owned = None;
    let mut ws = workspace(storage, &mut owned, &p, true)?;
    load_start(&mut ws, start, p.n)?;

    let mut solver = lanczos::Lanczos::new(p.clone());
    let interrupt = options.interrupt.clone();
    let status = drive(&mut solver, &mut op, &mut ws, p.n, interrupt.as_ref())?;
    options.record(solver.counters(), status);
    log::debug!(
        "symmetric solve n={} nev={} ncv={}: status {status}, {} cycles, {} products",
        p.n,
        p.nev,
        p.ncv,
        options.iterations,
        options.op_applications
    );
    if status != 0 {
        return Err(SolverDiagnostic::from_symmetric_iteration(status).into());
    }

    let (values, vectors) = solver.extract(&ws, want_vectors).map_err(|code| {
        options.info = code;
        Error::Solver(SolverDiagnostic::from_symmetric_extraction(code))
    })?;
    Ok(SymmetricEigen { values, vectors })
}

/// Compute `nev` eigenpairs of a non-symmetric operator.
///
/// See [`NonSymmetricEigen`] for the layout of complex results. Errors are
/// the same as for [`solve_symmetric`]; storage built for the symmetric
/// solver is rejected with [`Error::InsufficientStorage`].
pub fn solve_nonsymmetric(
    mut op: impl MatVec,
    options: &mut EigenOptions,
    storage: Option<&mut EigenStorage>,
    start: Option<&[f64]>,
    want_vectors: bool,
) -> Result<NonSymmetricEigen> {
    let p = Problem::resolve(options, false, start.is_some())?;
    let mut owned = None;
    let mut ws = workspace(storage, &mut owned, &p, false)?;
    load_start(&mut ws, start, p.n)?;

    let mut solver = arnoldi::Arnoldi::new(p.clone());
    let interrupt = options.interrupt.clone();
    let status = drive(&mut solver, &mut op, &mut ws, p.n, interrupt.as_ref())?;
    options.record(solver.counters(), status);
    log::debug!(
        "non-symmetric solve n={} nev={} ncv={}: status {status}, {} cycles, {} products",
        p.n,
        p.nev,
        p.ncv,
        options.iterations,
        options.op_applications
    );
    if status != 0 {
        return Err(SolverDiagnostic::from_nonsymmetric_iteration(status).into());
    }

    let (values, vectors) = solver.extract(&ws, want_vectors).map_err(|code| {
        options.info = code;
        Error::Solver(SolverDiagnostic::from_nonsymmetric_extraction(code))
    })?;
    Ok(NonSymmetricEigen { values, vectors })
}

// Dense helpers shared by the back ends.

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

fn norm(a: &[f64]) -> f64 {
    dot(a, a).sqrt()
}

fn fill_random(rng: &mut StdRng, out: &mut [f64]) {
    for x in out.iter_mut() {
        *x = rng.random_range(-1.0..1.0);
    }
}

/// One classical Gram-Schmidt pass of `w` against the first `cols` columns
/// of `v`, adding the coefficients to `h`.
fn project(v: &[f64], ldv: usize, n: usize, cols: usize, w: &mut [f64], h: &mut [f64]) {
    for (c, hc) in h[..cols].iter_mut().enumerate() {
        let basis = &v[c * ldv..c * ldv + n];
        let coeff = dot(basis, w);
        for (wi, bi) in w.iter_mut().zip(basis) {
            *wi -= coeff * bi;
        }
        *hc += coeff;
    }
}

/// Orthogonalize `w` against the basis with one DGKS refinement step.
///
/// `h[..cols]` is overwritten with the projection coefficients. Returns
/// whether the refinement pass ran.
fn orthogonalize(v: &[f64], ldv: usize, n: usize, cols: usize, w: &mut [f64], h: &mut [f64]) -> bool {
    h[..cols].fill(0.0);
    let before = norm(w);
    project(v, ldv, n, cols, w, h);
    let after = norm(w);
    let refine = after < 0.717 * before;
    if refine {
        project(v, ldv, n, cols, w, h);
    }
    refine
}

/// Random unit vector orthogonal to the first `cols` basis columns.
fn random_orthogonal(
    rng: &mut StdRng,
    v: &[f64],
    ldv: usize,
    n: usize,
    cols: usize,
    out: &mut [f64],
    scratch: &mut [f64],
) -> bool {
    for _ in 0..3 {
        fill_random(rng, out);
        let before = norm(out);
        orthogonalize(v, ldv, n, cols, out, scratch);
        project(v, ldv, n, cols, out, scratch);
        let after = norm(out);
        if after > before * 1e-6 {
            out.iter_mut().for_each(|x| *x /= after);
            return true;
        }
    }
    false
}

/// Symmetric selection: indices of the wanted Ritz values, most wanted first.
fn select_symmetric(ritz: &[f64], which: Which, nev: usize) -> Vec<usize> {
    let mut order: Vec<usize> = (0..ritz.len()).collect();
    match which {
        Which::LargestAlgebraic => order.sort_by(|&a, &b| ritz[b].total_cmp(&ritz[a])),
        Which::SmallestAlgebraic | Which::BothEnds => order.sort_by(|&a, &b| ritz[a].total_cmp(&ritz[b])),
        Which::LargestMagnitude => order.sort_by(|&a, &b| ritz[b].abs().total_cmp(&ritz[a].abs())),
        Which::SmallestMagnitude => order.sort_by(|&a, &b| ritz[a].abs().total_cmp(&ritz[b].abs())),
        _ => {}
    }
    if which == Which::BothEnds {
        // nev / 2 from the low end, the rest from the high end; ascending
        let low = nev / 2;
        let high = nev - low;
        let mut picked: Vec<usize> = order[..low].to_vec();
        picked.extend_from_slice(&order[order.len() - high..]);
        return picked;
    }
    order.truncate(nev);
    order
}

/// Non-symmetric selection; conjugate pairs stay together with the member
/// of positive imaginary part first. `partner(i)` gives the conjugate slot.
fn select_nonsymmetric(wr: &[f64], wi: &[f64], which: Which, nev: usize, partner: impl Fn(usize) -> usize) -> Vec<usize> {
    let key = |i: usize| -> f64 {
        match which {
            Which::LargestMagnitude | Which::SmallestMagnitude => wr[i].hypot(wi[i]),
            Which::LargestReal | Which::SmallestReal => wr[i],
            _ => wi[i].abs(),
        }
    };
    let descending = matches!(
        which,
        Which::LargestMagnitude | Which::LargestReal | Which::LargestImaginary
    );
    let mut order: Vec<usize> = (0..wr.len()).collect();
    order.sort_by(|&a, &b| {
        let ord = key(a).total_cmp(&key(b));
        if descending {
            ord.reverse()
        } else {
            ord
        }
    });

    let mut picked = Vec::with_capacity(nev + 1);
    let mut taken = vec![false; wr.len()];
    for i in order {
        if picked.len() >= nev {
            break;
        }
        if taken[i] {
            continue;
        }
        if wi[i] == 0.0 {
            taken[i] = true;
            picked.push(i);
            continue;
        }
        let j = partner(i);
        let (pos, neg) = if wi[i] > 0.0 { (i, j) } else { (j, i) };
        taken[pos] = true;
        taken[neg] = true;
        picked.push(pos);
        picked.push(neg);
    }
    picked
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn diagonal(entries: Vec<f64>) -> impl FnMut(&mut [f64], &[f64]) -> Result<()> {
        move |y: &mut [f64], x: &[f64]| -> Result<()> {
            for ((yi, xi), d) in y.iter_mut().zip(x).zip(&entries) {
                *yi = d * xi;
            }
            Ok(())
        }
    }

    #[test]
    fn identity_operator() {
        let mut opts = EigenOptions::new(5);
        let res = solve_symmetric(
            |y: &mut [f64], x: &[f64]| -> Result<()> {
                y.copy_from_slice(x);
                Ok(())
            },
            &mut opts,
            None,
            None,
            true,
        )
        .unwrap();
        assert_eq!(res.values.len(), 1);
        assert!((res.values[0] - 1.0).abs() < 1e-12);
        let v = res.vectors.unwrap();
        assert_eq!((v.nrows(), v.ncols()), (5, 1));
        let len: f64 = (0..5).map(|i| v[(i, 0)] * v[(i, 0)]).sum();
        assert!((len - 1.0).abs() < 1e-10);
        assert_eq!(opts.info, 0);
        assert!(opts.op_applications >= 1);
    }

    #[test]
    fn diagonal_extremes() {
        let d: Vec<f64> = (1..=10).map(f64::from).collect();
        let mut opts = EigenOptions::new(10).with_nev(2).with_ncv(6);
        let res = solve_symmetric(diagonal(d.clone()), &mut opts, None, None, true).unwrap();
        assert!((res.values[0] - 10.0).abs() < 1e-8, "{:?}", res.values);
        assert!((res.values[1] - 9.0).abs() < 1e-8);
        let v = res.vectors.unwrap();
        assert!((v[(9, 0)].abs() - 1.0).abs() < 1e-6);

        let mut opts = EigenOptions::new(10)
            .with_nev(1)
            .with_ncv(5)
            .with_which(Which::SmallestAlgebraic);
        let res = solve_symmetric(diagonal(d), &mut opts, None, None, false).unwrap();
        assert!((res.values[0] - 1.0).abs() < 1e-8);
        assert!(res.vectors.is_none());
    }

    #[test]
    fn both_ends() {
        let d = vec![-3.0, 1.0, 2.0, 5.0, 0.5, 4.0];
        let mut opts = EigenOptions::new(6)
            .with_nev(2)
            .with_ncv(6)
            .with_which(Which::BothEnds);
        let res = solve_symmetric(diagonal(d), &mut opts, None, None, false).unwrap();
        assert!((res.values[0] + 3.0).abs() < 1e-8);
        assert!((res.values[1] - 5.0).abs() < 1e-8);
    }

    #[test]
    fn parameter_errors_are_typed() {
        let mut opts = EigenOptions::new(4).with_ncv(7);
        let err = solve_symmetric(diagonal(vec![1.0; 4]), &mut opts, None, None, false).unwrap_err();
        assert_eq!(err, Error::Solver(SolverDiagnostic::TooFewLanczosVectors));
        assert_eq!(opts.info, -3);

        let mut opts = EigenOptions::new(4).with_which(Which::LargestReal);
        let err = solve_symmetric(diagonal(vec![1.0; 4]), &mut opts, None, None, false).unwrap_err();
        assert_eq!(err, Error::Solver(SolverDiagnostic::InvalidWhich));

        let mut opts = EigenOptions::new(4).with_max_iter(0);
        let err = solve_symmetric(diagonal(vec![1.0; 4]), &mut opts, None, None, false).unwrap_err();
        assert_eq!(err, Error::Solver(SolverDiagnostic::MaxIterNotPositive));

        let mut opts = EigenOptions::new(4);
        opts.mode = Mode::Buckling;
        let err = solve_symmetric(diagonal(vec![1.0; 4]), &mut opts, None, None, false).unwrap_err();
        assert_eq!(err, Error::Solver(SolverDiagnostic::ModeNeedsBMatrix));

        let mut opts = EigenOptions::new(4);
        let zero = [0.0; 4];
        let err = solve_symmetric(diagonal(vec![1.0; 4]), &mut opts, None, Some(&zero), false).unwrap_err();
        assert_eq!(err, Error::Solver(SolverDiagnostic::ZeroStartVector));
    }

    #[test]
    fn storage_limits() {
        let mut storage = EigenStorage::new(4, 3, 4, true).unwrap();
        let mut opts = EigenOptions::new(6);
        let err = solve_symmetric(diagonal(vec![1.0; 6]), &mut opts, Some(&mut storage), None, false).unwrap_err();
        assert!(matches!(err, Error::InsufficientStorage { what: "n", .. }));

        let mut opts = EigenOptions::new(4);
        let err = solve_nonsymmetric(diagonal(vec![1.0; 4]), &mut opts, Some(&mut storage), None, false).unwrap_err();
        assert!(matches!(err, Error::InsufficientStorage { .. }));

        let mut opts = EigenOptions::new(4);
        let res = solve_symmetric(diagonal(vec![1.0, 2.0, 3.0, 4.0]), &mut opts, Some(&mut storage), None, false).unwrap();
        assert!((res.values[0] - 4.0).abs() < 1e-8);
    }

    #[test]
    fn operator_failure_propagates() {
        let mut opts = EigenOptions::new(4);
        let err = solve_symmetric(
            |_: &mut [f64], _: &[f64]| -> Result<()> { Err(Error::invalid("op", "boom")) },
            &mut opts,
            None,
            None,
            false,
        )
        .unwrap_err();
        assert!(matches!(err, Error::OperatorFailure(_)));
    }

    #[test]
    fn interrupt_stops_the_solve() {
        let flag = Interrupt::new();
        flag.trigger();
        let mut opts = EigenOptions::new(4).with_interrupt(flag);
        let err = solve_symmetric(diagonal(vec![1.0; 4]), &mut opts, None, None, false).unwrap_err();
        assert_eq!(err, Error::Interrupted);
    }

    #[test]
    fn shift_invert_maps_back() {
        // A = diag(1, 2, 4, 8), sigma = 3: OP = diag(1 / (d - 3))
        let d = [1.0, 2.0, 4.0, 8.0];
        let inv: Vec<f64> = d.iter().map(|x| 1.0 / (x - 3.0)).collect();
        let mut opts = EigenOptions::new(4)
            .with_nev(2)
            .with_ncv(4)
            .with_which(Which::LargestMagnitude)
            .with_shift_invert(3.0);
        let res = solve_symmetric(diagonal(inv), &mut opts, None, None, false).unwrap();
        let mut got = res.values.clone();
        got.sort_by(f64::total_cmp);
        assert!((got[0] - 2.0).abs() < 1e-8, "{got:?}");
        assert!((got[1] - 4.0).abs() < 1e-8);
    }

    #[test]
    fn rotation_gives_conjugate_pair() {
        // 4x4 block diagonal: rotation by 90 degrees scaled by 2, then diag(1, 0.5)
        let op = |y: &mut [f64], x: &[f64]| -> Result<()> {
            y[0] = -2.0 * x[1];
            y[1] = 2.0 * x[0];
            y[2] = x[2];
            y[3] = 0.5 * x[3];
            Ok(())
        };
        let mut opts = EigenOptions::new(4).with_nev(1).with_ncv(4);
        let res = solve_nonsymmetric(op, &mut opts, None, None, true).unwrap();
        // nev = 1 would split the pair, so both members come back
        assert_eq!(res.values.nrows(), 2);
        assert!(res.values[(0, 0)].abs() < 1e-8);
        assert!((res.values[(0, 1)] - 2.0).abs() < 1e-8);
        assert!((res.values[(1, 1)] + 2.0).abs() < 1e-8);
        let v = res.vectors.unwrap();
        assert_eq!(v.ncols(), 2);
        // A (re + i im) = 2i (re + i im)  =>  A re = -2 im
        let (re0, re1) = (v[(0, 0)], v[(1, 0)]);
        let (im0, im1) = (v[(0, 1)], v[(1, 1)]);
        assert!((-2.0 * re1 + 2.0 * im0).abs() < 1e-6);
        assert!((2.0 * re0 + 2.0 * im1).abs() < 1e-6);
    }

    #[test]
    fn nonsymmetric_real_spectrum() {
        // upper triangular, eigenvalues 3, 2, 1, 0.5, 0.25
        let op = |y: &mut [f64], x: &[f64]| -> Result<()> {
            let d = [3.0, 2.0, 1.0, 0.5, 0.25];
            for i in 0..5 {
                y[i] = d[i] * x[i] + if i + 1 < 5 { x[i + 1] } else { 0.0 };
            }
            Ok(())
        };
        let mut opts = EigenOptions::new(5).with_nev(2).with_ncv(5);
        let res = solve_nonsymmetric(op, &mut opts, None, None, false).unwrap();
        assert_eq!(res.values.nrows(), 2);
        assert!((res.values[(0, 0)] - 3.0).abs() < 1e-8);
        assert!((res.values[(1, 0)] - 2.0).abs() < 1e-8);
        assert!(res.values[(0, 1)].abs() < 1e-12);
    }

    #[test]
    fn nonsymmetric_ncv_range() {
        let mut opts = EigenOptions::new(5).with_nev(2).with_ncv(3);
        let err = solve_nonsymmetric(diagonal(vec![1.0; 5]), &mut opts, None, None, false).unwrap_err();
        assert_eq!(err, Error::Solver(SolverDiagnostic::TooFewLanczosVectors));
    }

    #[test]
    fn selection_keeps_pairs() {
        // values: i, -i, 1, -1 (pair in slots 0/1 with negative first)
        let wr = [0.0, 0.0, 1.0, -1.0];
        let wi = [-1.0, 1.0, 0.0, 0.0];
        let partner = |i: usize| if wi[i] < 0.0 { i + 1 } else { i - 1 };
        let picked = select_nonsymmetric(&wr, &wi, Which::LargestImaginary, 1, partner);
        assert_eq!(picked, vec![1, 0]);
        let picked = select_nonsymmetric(&wr, &wi, Which::LargestReal, 1, partner);
        assert_eq!(picked, vec![2]);
    }
}
