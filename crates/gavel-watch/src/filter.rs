//! The watch-policy predicate: which events warrant a check run.

use gavel_core::{Event, WatchPolicy};

/// Decide whether `event` warrants running the check.
///
/// Matches when the project is watched AND either:
/// - the event is a new patchset, or
/// - the event is a comment whose final line (after stripping one trailing
///   newline) is exactly the recheck word. The word appearing mid-comment
///   is not enough.
///
/// Pure and deterministic; all the interesting cases live in the tests
/// below.
///
/// # Examples
///
/// ```
/// use gavel_core::{Event, WatchPolicy};
/// use gavel_watch::filter;
///
/// let policy = WatchPolicy {
///     projects: vec!["demo".into()],
///     recheck_word: "recheck".into(),
///     voting: false,
/// };
/// let event: Event = serde_json::from_str(r#"{
///     "type": "comment-added",
///     "change": {"project": "demo", "number": "42"},
///     "patchSet": {"number": "3", "ref": "refs/changes/42/3",
///                  "author": {"email": "a@b.com"}},
///     "comment": "CI hiccup\nrecheck"
/// }"#).unwrap();
/// assert!(filter::matches(&event, &policy));
/// ```
pub fn matches(event: &Event, policy: &WatchPolicy) -> bool {
    let watched = event.project().is_some_and(|p| policy.watches(p));
    if !watched {
        return false;
    }

    match event {
        Event::PatchsetCreated { .. } => true,
        Event::CommentAdded { comment, .. } => {
            last_line(comment) == policy.recheck_word
        }
        Event::Other => false,
    }
}

/// Final line of a comment, with at most one trailing newline stripped.
fn last_line(comment: &str) -> &str {
    let trimmed = comment.strip_suffix('\n').unwrap_or(comment);
    trimmed.rsplit('\n').next().unwrap_or(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use gavel_core::{Author, Change, PatchSet};

    fn policy() -> WatchPolicy {
        WatchPolicy {
            projects: vec!["demo".into()],
            recheck_word: "recheck".into(),
            voting: false,
        }
    }

    fn change(project: &str) -> Change {
        Change {
            project: project.into(),
            number: "42".into(),
        }
    }

    fn patch_set() -> PatchSet {
        PatchSet {
            number: "3".into(),
            ref_id: "refs/changes/42/3".into(),
            author: Author {
                email: "a@b.com".into(),
            },
        }
    }

    fn comment_added(project: &str, comment: &str) -> Event {
        Event::CommentAdded {
            change: change(project),
            patch_set: patch_set(),
            comment: comment.into(),
        }
    }

    fn patchset_created(project: &str) -> Event {
        Event::PatchsetCreated {
            change: change(project),
            patch_set: patch_set(),
        }
    }

    #[test]
    fn patchset_created_on_watched_project_matches() {
        assert!(matches(&patchset_created("demo"), &policy()));
    }

    #[test]
    fn patchset_created_on_unwatched_project_never_matches() {
        assert!(!matches(&patchset_created("other"), &policy()));
    }

    #[test]
    fn recheck_as_final_line_matches() {
        assert!(matches(&comment_added("demo", "CI flaked\n\nrecheck"), &policy()));
        assert!(matches(&comment_added("demo", "please\nrecheck\n"), &policy()));
    }

    #[test]
    fn single_line_recheck_matches() {
        assert!(matches(&comment_added("demo", "recheck"), &policy()));
        assert!(matches(&comment_added("demo", "recheck\n"), &policy()));
    }

    #[test]
    fn recheck_mid_comment_does_not_match() {
        assert!(!matches(
            &comment_added("demo", "can you recheck this?\nthanks"),
            &policy()
        ));
        assert!(!matches(&comment_added("demo", "recheck\nplease"), &policy()));
    }

    #[test]
    fn last_line_must_equal_the_word_verbatim() {
        assert!(!matches(&comment_added("demo", "fix\nrecheck please"), &policy()));
        assert!(!matches(&comment_added("demo", "fix\nRecheck"), &policy()));
        assert!(!matches(&comment_added("demo", "fix\nrecheck "), &policy()));
        assert!(!matches(&comment_added("demo", "fix\nrechecked"), &policy()));
    }

    #[test]
    fn unwatched_project_forces_false_regardless_of_comment() {
        assert!(!matches(&comment_added("other", "recheck"), &policy()));
    }

    #[test]
    fn empty_comment_does_not_match() {
        assert!(!matches(&comment_added("demo", ""), &policy()));
        assert!(!matches(&comment_added("demo", "\n"), &policy()));
    }

    #[test]
    fn other_event_kinds_never_match() {
        assert!(!matches(&Event::Other, &policy()));
    }

    #[test]
    fn custom_recheck_word_is_honored() {
        let mut policy = policy();
        policy.recheck_word = "retest".into();
        assert!(matches(&comment_added("demo", "retest"), &policy));
        assert!(!matches(&comment_added("demo", "recheck"), &policy));
    }
}
