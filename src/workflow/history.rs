// History replay - drift detection between the audit trail and stored status
//
// Double submissions are tolerated by the workflow, so a trail may contain
// duplicated or missing steps. Replaying it through the transition graph
// shows where it stops matching.

use serde::{Deserialize, Serialize};
use statig::prelude::*;
use uuid::Uuid;

use super::guard;
use super::types::{AuditEntry, ContentId, ContentItem, ValidationStatus};

/// One recorded move fed to the replay machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplayStep {
    pub to: ValidationStatus,
}

#[derive(Debug, Default)]
pub struct HistoryReplay;

#[state_machine(initial = "State::draft()")]
impl HistoryReplay {
    #[state]
    fn draft(event: &ReplayStep) -> Outcome<State> {
        advance(ValidationStatus::Draft, event)
    }

    #[state]
    fn pending_editor(event: &ReplayStep) -> Outcome<State> {
        advance(ValidationStatus::PendingEditor, event)
    }

    #[state]
    fn pending_admin(event: &ReplayStep) -> Outcome<State> {
        advance(ValidationStatus::PendingAdmin, event)
    }

    #[state]
    fn published(event: &ReplayStep) -> Outcome<State> {
        advance(ValidationStatus::Published, event)
    }

    #[state]
    fn rejected(event: &ReplayStep) -> Outcome<State> {
        advance(ValidationStatus::Rejected, event)
    }
}

/// Follow an edge of the transition table, ignoring roles: the trail only
/// records who acted, and their role may have changed since.
fn advance(from: ValidationStatus, step: &ReplayStep) -> Outcome<State> {
    if guard::rule(from, step.to).is_some() {
        Transition(state_for(step.to))
    } else {
        Handled
    }
}

fn state_for(status: ValidationStatus) -> State {
    match status {
        ValidationStatus::Draft => State::draft(),
        ValidationStatus::PendingEditor => State::pending_editor(),
        ValidationStatus::PendingAdmin => State::pending_admin(),
        ValidationStatus::Published => State::published(),
        ValidationStatus::Rejected => State::rejected(),
    }
}

fn status_of(state: &State) -> ValidationStatus {
    match state {
        State::Draft { .. } => ValidationStatus::Draft,
        State::PendingEditor { .. } => ValidationStatus::PendingEditor,
        State::PendingAdmin { .. } => ValidationStatus::PendingAdmin,
        State::Published { .. } => ValidationStatus::Published,
        State::Rejected { .. } => ValidationStatus::Rejected,
    }
}

/// Shortest legal path from draft to `status`
fn path_from_draft(status: ValidationStatus) -> &'static [ValidationStatus] {
    use ValidationStatus::*;

    match status {
        Draft => &[],
        PendingEditor => &[PendingEditor],
        PendingAdmin => &[PendingEditor, PendingAdmin],
        Published => &[PendingEditor, PendingAdmin, Published],
        Rejected => &[PendingEditor, Rejected],
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum HistoryAnomaly {
    /// The entry starts somewhere other than where the trail left off
    Gap {
        entry_id: Uuid,
        expected_from: ValidationStatus,
        recorded_from: ValidationStatus,
    },
    /// The entry records a move that is not in the workflow
    IllegalStep {
        entry_id: Uuid,
        from: ValidationStatus,
        to: ValidationStatus,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryReport {
    pub content_id: ContentId,
    pub entries: usize,
    pub replayed_status: ValidationStatus,
    pub current_status: ValidationStatus,
    pub anomalies: Vec<HistoryAnomaly>,
}

impl HistoryReport {
    pub fn is_consistent(&self) -> bool {
        self.anomalies.is_empty() && self.replayed_status == self.current_status
    }
}

/// Replay `entries` (oldest first) from draft.
///
/// After a gap the replay resynchronises on the entry's recorded origin so a
/// single lost entry is reported once instead of poisoning the rest.
pub fn replay(entries: &[AuditEntry]) -> (ValidationStatus, Vec<HistoryAnomaly>) {
    let mut machine = HistoryReplay.state_machine();
    let mut anomalies = Vec::new();

    for entry in entries {
        let expected_from = status_of(machine.state());
        if entry.from_status != expected_from {
            anomalies.push(HistoryAnomaly::Gap {
                entry_id: entry.id,
                expected_from,
                recorded_from: entry.from_status,
            });

            machine = HistoryReplay.state_machine();
            for step in path_from_draft(entry.from_status) {
                machine.handle(&ReplayStep { to: *step });
            }
        }

        machine.handle(&ReplayStep { to: entry.to_status });
        if status_of(machine.state()) != entry.to_status {
            anomalies.push(HistoryAnomaly::IllegalStep {
                entry_id: entry.id,
                from: entry.from_status,
                to: entry.to_status,
            });
        }
    }

    (status_of(machine.state()), anomalies)
}

pub fn verify(item: &ContentItem, entries: &[AuditEntry]) -> HistoryReport {
    let (replayed_status, anomalies) = replay(entries);

    HistoryReport {
        content_id: item.id().clone(),
        entries: entries.len(),
        replayed_status,
        current_status: item.validation_status(),
        anomalies,
    }
}
