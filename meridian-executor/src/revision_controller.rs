//! Revision Controller (C8): a pure function of state, consulted after a
//! `paper`-workflow node completes, before the router is asked again.

use meridian_state::{ArtifactValue, MessageRole, StateMessage, TaskState};

/// Examine `compliance_report.needs_revision` and `revision_round`. If
/// revision is needed and the round budget has room: routes back to
/// `writer`, increments `revision_round`, appends a synthesised user
/// message summarising the failed items, and removes `compliance_report`
/// from `artifacts` so `PaperRouter`'s presence-based staging sees it as
/// missing again and routes `writer -> compliance` once the revision pass
/// completes, rather than finding every stage already present and ending
/// the workflow without ever re-checking compliance. Otherwise leaves
/// `state` untouched so the router proceeds normally (typically to `END`).
///
/// Returns `true` if it took control of routing this round.
pub fn advance(state: &mut TaskState) -> bool {
    let Some(ArtifactValue::ComplianceReport(report)) = state.artifacts.get("compliance_report")
    else {
        return false;
    };

    if !report.needs_revision || state.revision_round >= state.max_revisions {
        return false;
    }

    let failed_items = report.failed_items.clone();
    state.revision_round += 1;
    state.next_agent = Some("writer".to_string());
    state.artifacts.remove("compliance_report");
    state.messages.push(StateMessage::text(
        MessageRole::User,
        format!(
            "Compliance review failed {} item(s): {}. Please revise the affected sections.",
            failed_items.len(),
            failed_items.join(", ")
        ),
    ));
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use meridian_state::ComplianceReport;

    fn state_with_report(needs_revision: bool, failed: Vec<&str>, round: u32, max: u32) -> TaskState {
        let mut state = TaskState::new(max);
        state.revision_round = round;
        state.artifacts.insert(
            "compliance_report".to_string(),
            ArtifactValue::ComplianceReport(ComplianceReport {
                needs_revision,
                failed_items: failed.into_iter().map(String::from).collect(),
                score: 0.5,
            }),
        );
        state
    }

    #[test]
    fn no_compliance_report_yields_no_op() {
        let mut state = TaskState::new(3);
        assert!(!advance(&mut state));
        assert_eq!(state.revision_round, 0);
    }

    #[test]
    fn compliant_report_yields_no_op() {
        let mut state = state_with_report(false, vec![], 0, 3);
        assert!(!advance(&mut state));
    }

    #[test]
    fn failing_report_within_budget_routes_to_writer() {
        let mut state = state_with_report(true, vec!["citations"], 0, 3);
        assert!(advance(&mut state));
        assert_eq!(state.revision_round, 1);
        assert_eq!(state.next_agent.as_deref(), Some("writer"));
        assert_eq!(state.messages.len(), 1);
    }

    #[test]
    fn failing_report_at_budget_yields_no_op() {
        let mut state = state_with_report(true, vec!["citations"], 3, 3);
        assert!(!advance(&mut state));
        assert_eq!(state.revision_round, 3);
    }

    #[test]
    fn revision_round_never_exceeds_max() {
        let mut state = state_with_report(true, vec!["a"], 2, 3);
        advance(&mut state);
        assert_eq!(state.revision_round, 3);
        let second_report = ComplianceReport {
            needs_revision: true,
            failed_items: vec!["b".into()],
            score: 0.4,
        };
        state
            .artifacts
            .insert("compliance_report".to_string(), ArtifactValue::ComplianceReport(second_report));
        advance(&mut state);
        assert_eq!(state.revision_round, 3);
    }
}
