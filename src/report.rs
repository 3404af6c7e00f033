//! Serialization of run results onto the output stream.
//!
//! Exactly one JSON record is emitted per invocation: the outcome of a
//! completed run, or a failure record when the run aborted. Logging goes to
//! stderr so stdout carries nothing but the record.

use std::io::{self, Write};

use serde::Serialize;

use crate::reconcile::Outcome;

/// Record emitted when a run aborts on a fatal condition.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct FailureRecord {
    /// Human-readable description of the fatal condition.
    pub msg: String,
    /// Always `false`: an aborted run reports no converged change.
    pub changed: bool,
}

impl FailureRecord {
    /// Builds a failure record from a rendered error message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            msg: message.into(),
            changed: false,
        }
    }
}

/// Writes the outcome record for a completed run, newline terminated.
///
/// # Errors
///
/// Returns any error raised while writing to `target`.
pub fn write_outcome(mut target: impl Write, outcome: &Outcome) -> io::Result<()> {
    serde_json::to_writer(&mut target, outcome)?;
    writeln!(target)
}

/// Writes the failure record for an aborted run, newline terminated.
///
/// # Errors
///
/// Returns any error raised while writing to `target`.
pub fn write_failure(mut target: impl Write, record: &FailureRecord) -> io::Result<()> {
    serde_json::to_writer(&mut target, record)?;
    writeln!(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::AttachMode;
    use crate::reconcile::Lifecycle;

    fn base_outcome() -> Outcome {
        Outcome {
            name: String::from("pd"),
            zone: String::from("us-central1-b"),
            state: Lifecycle::Present,
            size_gb: None,
            attached_to_instance: None,
            attached_mode: None,
            detach_only: None,
            detached_from_instance: None,
            changed: false,
        }
    }

    fn render(outcome: &Outcome) -> String {
        let mut buf = Vec::new();
        write_outcome(&mut buf, outcome).expect("write should succeed");
        String::from_utf8(buf).expect("utf8")
    }

    #[test]
    fn outcome_omits_absent_optional_fields() {
        let rendered = render(&base_outcome());

        assert_eq!(
            rendered,
            "{\"name\":\"pd\",\"zone\":\"us-central1-b\",\"state\":\"present\",\"changed\":false}\n"
        );
    }

    #[test]
    fn outcome_includes_attachment_fields_when_present() {
        let mut outcome = base_outcome();
        outcome.size_gb = Some(10);
        outcome.attached_to_instance = Some(String::from("web1"));
        outcome.attached_mode = Some(AttachMode::ReadOnly);
        outcome.changed = true;
        let rendered = render(&outcome);

        assert!(rendered.contains("\"size_gb\":10"), "rendered: {rendered}");
        assert!(
            rendered.contains("\"attached_to_instance\":\"web1\""),
            "rendered: {rendered}"
        );
        assert!(
            rendered.contains("\"attached_mode\":\"READ_ONLY\""),
            "rendered: {rendered}"
        );
        assert!(rendered.contains("\"changed\":true"), "rendered: {rendered}");
    }

    #[test]
    fn failure_record_always_reports_unchanged() {
        let mut buf = Vec::new();
        write_failure(&mut buf, &FailureRecord::new("instance web1 not found"))
            .expect("write should succeed");
        let rendered = String::from_utf8(buf).expect("utf8");

        assert_eq!(
            rendered,
            "{\"msg\":\"instance web1 not found\",\"changed\":false}\n"
        );
    }
}
