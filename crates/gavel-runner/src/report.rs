use gavel_core::ActionResult;

/// A formatted review: message plus the Verified vote it carries.
///
/// Always computed for a finished check, whether or not voting is enabled;
/// the event loop decides if it gets transmitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    /// Human-readable review message, linking to the console log.
    pub message: String,
    /// Verified vote: +1 for a pass, -1 for a fail.
    pub vote: i32,
}

/// Turn a check result into the review message and vote.
///
/// The `run_tests.sh:` prefix is a fixed convention; reviewers grep for it.
///
/// # Examples
///
/// ```
/// use gavel_core::{ActionResult, Verdict};
/// use gavel_runner::report;
///
/// let result = ActionResult {
///     exit_code: 0,
///     verdict: Verdict::Pass,
///     artifact_url: "http://logs.example.com/42/3/console.log".into(),
/// };
/// let report = report::format(&result);
/// assert_eq!(
///     report.message,
///     "run_tests.sh: SUCCESS: http://logs.example.com/42/3/console.log"
/// );
/// assert_eq!(report.vote, 1);
/// ```
pub fn format(result: &ActionResult) -> Report {
    Report {
        message: format!("run_tests.sh: {}: {}", result.verdict, result.artifact_url),
        vote: result.verdict.vote(),
    }
}
