use std::fmt;

/// flag appended to the final invocation of every schedule
pub const ENSEMBLE_FLAG: &str = "--ensemble";

/// position of an invocation within a schedule
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunKind {
    /// one of the plain repetitions, 1-based for log output
    Repetition(u32),
    /// the final run, carries the ensemble flag
    Ensemble,
}

impl fmt::Display for RunKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Repetition(index) => write!(f, "run {index}"),
            Self::Ensemble => write!(f, "ensemble run"),
        }
    }
}

/// a single planned invocation of the target program
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Invocation {
    pub kind: RunKind,
    pub args: Vec<String>,
}

impl Invocation {
    pub fn is_ensemble(&self) -> bool {
        self.kind == RunKind::Ensemble
    }
}

/// build the full schedule for a request: `runs` plain repetitions with the
/// forwarded arguments, then exactly one ensemble invocation
///
/// `runs == 0` is legal and yields an ensemble-only schedule
pub fn build(runs: u32, args: &[String]) -> Vec<Invocation> {
    let mut schedule = Vec::with_capacity(runs as usize + 1);

    for index in 1..=runs {
        schedule.push(Invocation {
            kind: RunKind::Repetition(index),
            args: args.to_vec(),
        });
    }

    let mut ensemble_args = args.to_vec();
    ensemble_args.push(ENSEMBLE_FLAG.to_string());
    schedule.push(Invocation {
        kind: RunKind::Ensemble,
        args: ensemble_args,
    });

    schedule
}
