use crate::problem::ProblemIdentifier;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verdict {
    Ok,
    WrongAnswer,
    TimeLimitExceeded,
    MemoryLimitExceeded,
    RuntimeError,
    CompilationError,
    Partial,
    Skipped,
    Failed,
    PresentationError,
    IdlenessLimitExceeded,
    SecurityViolated,
    Crashed,
    InputPreparationCrashed,
    Challenged,
    Rejected,
    Testing,
    /// In queue, the judge has not reported anything yet.
    Waiting,
    Unknown,
}

impl Verdict {
    /// Maps the verdict field of the public api. A missing field means the
    /// submission is still queued.
    pub fn from_api(verdict: Option<&str>) -> Self {
        match verdict {
            None => Verdict::Waiting,
            Some("OK") => Verdict::Ok,
            Some("WRONG_ANSWER") => Verdict::WrongAnswer,
            Some("TIME_LIMIT_EXCEEDED") => Verdict::TimeLimitExceeded,
            Some("MEMORY_LIMIT_EXCEEDED") => Verdict::MemoryLimitExceeded,
            Some("RUNTIME_ERROR") => Verdict::RuntimeError,
            Some("COMPILATION_ERROR") => Verdict::CompilationError,
            Some("PARTIAL") => Verdict::Partial,
            Some("SKIPPED") => Verdict::Skipped,
            Some("FAILED") => Verdict::Failed,
            Some("PRESENTATION_ERROR") => Verdict::PresentationError,
            Some("IDLENESS_LIMIT_EXCEEDED") => Verdict::IdlenessLimitExceeded,
            Some("SECURITY_VIOLATED") => Verdict::SecurityViolated,
            Some("CRASHED") => Verdict::Crashed,
            Some("INPUT_PREPARATION_CRASHED") => Verdict::InputPreparationCrashed,
            Some("CHALLENGED") => Verdict::Challenged,
            Some("REJECTED") => Verdict::Rejected,
            Some("TESTING") => Verdict::Testing,
            Some(_) => Verdict::Unknown,
        }
    }
    pub fn is_terminal(self) -> bool {
        !matches!(self, Verdict::Testing | Verdict::Waiting)
    }
    pub fn is_accepted(self) -> bool {
        self == Verdict::Ok
    }
}
impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Verdict::Ok => "Accepted",
            Verdict::WrongAnswer => "Wrong answer",
            Verdict::TimeLimitExceeded => "Time limit exceeded",
            Verdict::MemoryLimitExceeded => "Memory limit exceeded",
            Verdict::RuntimeError => "Runtime error",
            Verdict::CompilationError => "Compilation error",
            Verdict::Partial => "Partial result",
            Verdict::Skipped => "Skipped",
            Verdict::Failed => "Judgement failed",
            Verdict::PresentationError => "Presentation error",
            Verdict::IdlenessLimitExceeded => "Idleness limit exceeded",
            Verdict::SecurityViolated => "Security violated",
            Verdict::Crashed => "Crashed",
            Verdict::InputPreparationCrashed => "Input preparation crashed",
            Verdict::Challenged => "Hacked",
            Verdict::Rejected => "Rejected",
            Verdict::Testing => "Running",
            Verdict::Waiting => "In queue",
            Verdict::Unknown => "Unknown verdict",
        })
    }
}

/// Snapshot of one remote submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionRecord {
    pub id: u64,
    pub problem: ProblemIdentifier,
    pub verdict: Verdict,
    pub passed_test_count: Option<u32>,
    pub time_ms: Option<u64>,
    pub memory_bytes: Option<u64>,
    /// Unix seconds.
    pub creation_time: i64,
    pub language: String,
    pub author_handle: String,
}

impl fmt::Display for SubmissionRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} {} {}", self.id, self.problem, self.verdict)?;
        if self.verdict.is_terminal() && !self.verdict.is_accepted() {
            if let Some(passed) = self.passed_test_count {
                write!(f, " on test {}", passed + 1)?;
            }
        }
        if let Some(t) = self.time_ms {
            write!(f, ", {} ms", t)?;
        }
        if let Some(m) = self.memory_bytes {
            write!(f, ", {} KB", m / 1024)?;
        }
        Ok(())
    }
}
