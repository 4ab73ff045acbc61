use std::fmt;

use serde::de::{self, Deserializer, Visitor};
use serde::Deserialize;

/// One notification from the Gerrit event stream.
///
/// Decoded straight from a `gerrit stream-events` JSON line. Only the two
/// kinds the bot reacts to carry data; everything else collapses into
/// [`Event::Other`] and is filtered out.
///
/// # Examples
///
/// ```
/// use gavel_core::Event;
///
/// let line = r#"{
///     "type": "patchset-created",
///     "change": {"project": "demo", "number": "42"},
///     "patchSet": {"number": "3", "ref": "refs/changes/42/3",
///                  "author": {"email": "a@b.com"}}
/// }"#;
/// let event: Event = serde_json::from_str(line).unwrap();
/// assert_eq!(event.project(), Some("demo"));
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Event {
    /// A reviewer commented on a change.
    CommentAdded {
        change: Change,
        #[serde(rename = "patchSet")]
        patch_set: PatchSet,
        comment: String,
    },
    /// A new revision of a change was uploaded.
    PatchsetCreated {
        change: Change,
        #[serde(rename = "patchSet")]
        patch_set: PatchSet,
    },
    /// Any event kind the bot does not react to.
    #[serde(other)]
    Other,
}

impl Event {
    /// The change this event belongs to, if it carries one.
    pub fn change(&self) -> Option<&Change> {
        match self {
            Event::CommentAdded { change, .. } | Event::PatchsetCreated { change, .. } => {
                Some(change)
            }
            Event::Other => None,
        }
    }

    /// The patchset this event belongs to, if it carries one.
    pub fn patch_set(&self) -> Option<&PatchSet> {
        match self {
            Event::CommentAdded { patch_set, .. } | Event::PatchsetCreated { patch_set, .. } => {
                Some(patch_set)
            }
            Event::Other => None,
        }
    }

    /// The project the event happened on, if it carries one.
    pub fn project(&self) -> Option<&str> {
        self.change().map(|c| c.project.as_str())
    }

    /// Event kind name, for log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            Event::CommentAdded { .. } => "comment-added",
            Event::PatchsetCreated { .. } => "patchset-created",
            Event::Other => "other",
        }
    }
}

/// The change a stream event refers to.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Change {
    /// Owning project.
    pub project: String,
    /// Change number. A string on the wire in older Gerrit releases and an
    /// integer in newer ones; both decode to the string form.
    #[serde(deserialize_with = "number_from_wire")]
    pub number: String,
}

/// One uploaded revision of a change.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PatchSet {
    /// Patchset number within the change.
    #[serde(deserialize_with = "number_from_wire")]
    pub number: String,
    /// Git ref the patchset lives under (`refs/changes/...`).
    #[serde(rename = "ref")]
    pub ref_id: String,
    /// Who uploaded it.
    pub author: Author,
}

/// Uploader identity attached to a patchset.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Author {
    pub email: String,
}

/// Pass/Fail outcome of the external check.
///
/// # Examples
///
/// ```
/// use gavel_core::Verdict;
///
/// assert_eq!(Verdict::from_exit_code(0), Verdict::Pass);
/// assert_eq!(Verdict::from_exit_code(2), Verdict::Fail);
/// assert_eq!(Verdict::Pass.vote(), 1);
/// assert_eq!(Verdict::Fail.vote(), -1);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Pass,
    Fail,
}

impl Verdict {
    /// Exit code 0 passes; every other status fails, with no distinction
    /// between different nonzero codes or signal deaths.
    pub fn from_exit_code(code: i32) -> Self {
        if code == 0 {
            Verdict::Pass
        } else {
            Verdict::Fail
        }
    }

    /// The Verified vote this verdict maps to.
    pub fn vote(self) -> i32 {
        match self {
            Verdict::Pass => 1,
            Verdict::Fail => -1,
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Pass => write!(f, "SUCCESS"),
            Verdict::Fail => write!(f, "FAILED"),
        }
    }
}

/// Outcome of one external check run, consumed by the report formatter and
/// discarded once the vote is out.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionResult {
    /// Raw exit status of the run script (-1 when killed by a signal).
    pub exit_code: i32,
    /// Derived pass/fail verdict.
    pub verdict: Verdict,
    /// Where the run's console log is expected to be served from.
    pub artifact_url: String,
}

fn number_from_wire<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    struct WireNumber;

    impl Visitor<'_> for WireNumber {
        type Value = String;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a string or integer")
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<String, E> {
            Ok(v.to_owned())
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<String, E> {
            Ok(v.to_string())
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<String, E> {
            Ok(v.to_string())
        }
    }

    deserializer.deserialize_any(WireNumber)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_patch_set() -> PatchSet {
        PatchSet {
            number: "3".into(),
            ref_id: "refs/changes/42/3".into(),
            author: Author {
                email: "a@b.com".into(),
            },
        }
    }

    #[test]
    fn decode_comment_added() {
        let line = r#"{
            "type": "comment-added",
            "change": {"project": "demo", "number": "42"},
            "patchSet": {"number": "3", "ref": "refs/changes/42/3",
                         "author": {"email": "a@b.com"}},
            "comment": "Looks good\n\nrecheck"
        }"#;
        let event: Event = serde_json::from_str(line).unwrap();
        match event {
            Event::CommentAdded {
                change,
                patch_set,
                comment,
            } => {
                assert_eq!(change.project, "demo");
                assert_eq!(change.number, "42");
                assert_eq!(patch_set, sample_patch_set());
                assert_eq!(comment, "Looks good\n\nrecheck");
            }
            other => panic!("wrong variant: {other:?}"),
        }
    }

    #[test]
    fn decode_patchset_created_with_integer_numbers() {
        // Newer Gerrit sends numbers as JSON integers.
        let line = r#"{
            "type": "patchset-created",
            "change": {"project": "demo", "number": 42},
            "patchSet": {"number": 3, "ref": "refs/changes/42/3",
                         "author": {"email": "a@b.com"}}
        }"#;
        let event: Event = serde_json::from_str(line).unwrap();
        let change = event.change().unwrap();
        let patch_set = event.patch_set().unwrap();
        assert_eq!(change.number, "42");
        assert_eq!(patch_set.number, "3");
        assert_eq!(event.kind(), "patchset-created");
    }

    #[test]
    fn unknown_event_types_decode_to_other() {
        for kind in ["ref-updated", "change-merged", "reviewer-added"] {
            let line = format!(r#"{{"type": "{kind}", "refUpdate": {{}}}}"#);
            let event: Event = serde_json::from_str(&line).unwrap();
            assert_eq!(event, Event::Other);
            assert_eq!(event.project(), None);
        }
    }

    #[test]
    fn comment_added_without_patchset_is_an_error() {
        // Malformed shapes surface as decode errors; the event loop logs
        // and drops them.
        let line = r#"{"type": "comment-added", "change": {"project": "demo", "number": "1"}}"#;
        assert!(serde_json::from_str::<Event>(line).is_err());
    }

    #[test]
    fn verdict_collapses_all_nonzero_codes() {
        assert_eq!(Verdict::from_exit_code(0), Verdict::Pass);
        for code in [1, 2, 77, 127, 255, -1] {
            assert_eq!(Verdict::from_exit_code(code), Verdict::Fail);
        }
    }

    #[test]
    fn verdict_displays_report_labels() {
        assert_eq!(Verdict::Pass.to_string(), "SUCCESS");
        assert_eq!(Verdict::Fail.to_string(), "FAILED");
    }
}
