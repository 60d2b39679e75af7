use std::fmt;

/// Typed status reported by the iteration back ends.
///
/// The back ends speak in small integer codes (negative for errors, `1` for
/// an exhausted iteration budget). Iteration and extraction use different
/// code ranges, and so do the symmetric and non-symmetric solvers, which is
/// why there is one translation function per entry point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SolverDiagnostic {
    /// `n` must be positive.
    DimensionNotPositive,
    /// `nev` must be positive.
    NevNotPositive,
    /// `ncv` is outside its admissible range for `nev` and `n`.
    TooFewLanczosVectors,
    /// The iteration budget must be positive.
    MaxIterNotPositive,
    /// The eigenvalue selector does not apply to this problem type.
    InvalidWhich,
    /// The B matrix type is not recognized.
    InvalidBMatrix,
    /// `lworkl` is too small for `ncv`.
    WorkListTooSmall,
    /// The dense eigenproblem on the projected matrix failed.
    ProjectedEigenFailed,
    /// The starting vector is zero.
    ZeroStartVector,
    /// Unknown spectral transformation mode.
    InvalidMode,
    /// The mode needs a B matrix, only the identity is supported.
    ModeNeedsBMatrix,
    /// Only exact shifts are supported.
    InvalidShiftStrategy,
    /// `BothEnds` needs `nev > 1`.
    BothEndsNeedsTwo,
    /// No Krylov basis could be built; the start vector may be in the null space.
    NoFactorization,
    /// The Ritz values could not be reproduced on extraction.
    ExtractionFailed,
    /// Unknown selection of Ritz vectors to compute.
    InvalidHowMany,
    /// Schur vectors are not available for this selection.
    HowManyNotImplemented,
    /// Number of converged values differs between iteration and extraction.
    ConvergedCountMismatch,
    /// The Schur form of the projected matrix could not be computed.
    SchurFailed,
    /// Eigenvectors of the projected matrix could not be computed.
    EigenvectorFailed,
    /// The iteration budget ran out before `nev` values converged.
    MaxIterations,
    /// A code with no known meaning.
    Unknown(i32),
}

impl SolverDiagnostic {
    /// Status of the symmetric iteration phase.
    pub fn from_symmetric_iteration(code: i32) -> Self {
        use SolverDiagnostic::*;
        match code {
            1 => MaxIterations,
            -1 => DimensionNotPositive,
            -2 => NevNotPositive,
            -3 => TooFewLanczosVectors,
            -4 => MaxIterNotPositive,
            -5 => InvalidWhich,
            -6 => InvalidBMatrix,
            -7 => WorkListTooSmall,
            -8 => ProjectedEigenFailed,
            -9 => ZeroStartVector,
            -10 => InvalidMode,
            -11 => ModeNeedsBMatrix,
            -12 => InvalidShiftStrategy,
            -13 => BothEndsNeedsTwo,
            -9999 => NoFactorization,
            other => Unknown(other),
        }
    }

    /// Status of the symmetric extraction phase.
    pub fn from_symmetric_extraction(code: i32) -> Self {
        use SolverDiagnostic::*;
        match code {
            -1 => DimensionNotPositive,
            -2 => NevNotPositive,
            -3 => TooFewLanczosVectors,
            -5 => InvalidWhich,
            -6 => InvalidBMatrix,
            -7 => WorkListTooSmall,
            -8 => ProjectedEigenFailed,
            -9 => ZeroStartVector,
            -10 => InvalidMode,
            -11 => ModeNeedsBMatrix,
            -12 => BothEndsNeedsTwo,
            -14 => ExtractionFailed,
            -15 => InvalidHowMany,
            -16 => HowManyNotImplemented,
            -17 => ConvergedCountMismatch,
            other => Unknown(other),
        }
    }

    /// Status of the non-symmetric iteration phase.
    pub fn from_nonsymmetric_iteration(code: i32) -> Self {
        use SolverDiagnostic::*;
        match code {
            1 => MaxIterations,
            -1 => DimensionNotPositive,
            -2 => NevNotPositive,
            -3 => TooFewLanczosVectors,
            -4 => MaxIterNotPositive,
            -5 => InvalidWhich,
            -6 => InvalidBMatrix,
            -7 => WorkListTooSmall,
            -8 => ProjectedEigenFailed,
            -9 => ZeroStartVector,
            -10 => InvalidMode,
            -11 => ModeNeedsBMatrix,
            -12 => InvalidShiftStrategy,
            -9999 => NoFactorization,
            other => Unknown(other),
        }
    }

    /// Status of the non-symmetric extraction phase.
    pub fn from_nonsymmetric_extraction(code: i32) -> Self {
        use SolverDiagnostic::*;
        match code {
            -1 => DimensionNotPositive,
            -2 => NevNotPositive,
            -3 => TooFewLanczosVectors,
            -5 => InvalidWhich,
            -6 => InvalidBMatrix,
            -7 => WorkListTooSmall,
            -8 => SchurFailed,
            -9 => EigenvectorFailed,
            -10 => InvalidMode,
            -11 => ModeNeedsBMatrix,
            -12 => HowManyNotImplemented,
            -13 => InvalidHowMany,
            -14 => ExtractionFailed,
            -15 => ConvergedCountMismatch,
            other => Unknown(other),
        }
    }
}

impl fmt::Display for SolverDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use SolverDiagnostic::*;
        let msg = match self {
            DimensionNotPositive => "problem dimension must be positive",
            NevNotPositive => "number of requested eigenvalues must be positive",
            TooFewLanczosVectors => "ncv out of range (too few or too many basis vectors)",
            MaxIterNotPositive => "maximum number of iterations must be positive",
            InvalidWhich => "eigenvalue selector is not valid for this problem",
            InvalidBMatrix => "invalid B matrix type",
            WorkListTooSmall => "work list too small",
            ProjectedEigenFailed => "eigen-decomposition of the projected matrix failed",
            ZeroStartVector => "starting vector is zero",
            InvalidMode => "invalid spectral transformation mode",
            ModeNeedsBMatrix => "mode requires a B matrix",
            InvalidShiftStrategy => "only exact shifts are supported",
            BothEndsNeedsTwo => "both-ends selection needs at least two eigenvalues",
            NoFactorization => "could not build a Krylov factorization",
            ExtractionFailed => "Ritz values could not be reproduced during extraction",
            InvalidHowMany => "invalid Ritz vector selection",
            HowManyNotImplemented => "Schur vector selection not implemented",
            ConvergedCountMismatch => "converged counts differ between iteration and extraction",
            SchurFailed => "Schur form of the projected matrix failed",
            EigenvectorFailed => "eigenvectors of the projected matrix failed",
            MaxIterations => "maximum number of iterations reached",
            Unknown(code) => return write!(f, "unknown solver status {code}"),
        };
        f.write_str(msg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tables_differ_where_ranges_differ() {
        assert_eq!(
            SolverDiagnostic::from_symmetric_iteration(-12),
            SolverDiagnostic::InvalidShiftStrategy
        );
        assert_eq!(
            SolverDiagnostic::from_symmetric_extraction(-12),
            SolverDiagnostic::BothEndsNeedsTwo
        );
        assert_eq!(
            SolverDiagnostic::from_nonsymmetric_extraction(-8),
            SolverDiagnostic::SchurFailed
        );
        assert_eq!(
            SolverDiagnostic::from_symmetric_extraction(-8),
            SolverDiagnostic::ProjectedEigenFailed
        );
        assert_eq!(
            SolverDiagnostic::from_nonsymmetric_iteration(-13),
            SolverDiagnostic::Unknown(-13)
        );
        assert_eq!(
            SolverDiagnostic::from_symmetric_iteration(1),
            SolverDiagnostic::MaxIterations
        );
    }

    #[test]
    fn display_is_readable() {
        assert_eq!(
            SolverDiagnostic::Unknown(-42).to_string(),
            "unknown solver status -42"
        );
        assert!(SolverDiagnostic::ZeroStartVector.to_string().contains("zero"));
    }
}
