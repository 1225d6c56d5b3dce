//! SLA compliance computation.
//!
//! Compliance is always derived from timestamps and never stored. The clock
//! for a step starts when the request enters it: at submission for the
//! initial entry, otherwise at the action (approve or resubmit) that moved
//! the request into the step. The first decision at that step stops it.

use std::collections::BTreeMap;

use chrono::Duration;
use serde::Serialize;

use crate::request_status::ActionKind;
use crate::types::Timestamp;

/// Deadline for a step entered at `entered_at`.
pub fn deadline(entered_at: Timestamp, sla_hours: i32) -> Timestamp {
    entered_at + Duration::hours(i64::from(sla_hours))
}

/// Compliant iff the elapsed time does not exceed the configured hours.
pub fn is_compliant(entered_at: Timestamp, acted_at: Timestamp, sla_hours: i32) -> bool {
    acted_at - entered_at <= Duration::hours(i64::from(sla_hours))
}

fn hours_between(from: Timestamp, to: Timestamp) -> f64 {
    (to - from).num_seconds() as f64 / 3600.0
}

// ---------------------------------------------------------------------------
// Current step
// ---------------------------------------------------------------------------

/// SLA state of the step a request is currently waiting at.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum CurrentSla {
    OnTrack {
        deadline: Timestamp,
        remaining_hours: f64,
    },
    Overdue {
        deadline: Timestamp,
        overdue_hours: f64,
    },
}

impl CurrentSla {
    pub fn is_overdue(&self) -> bool {
        matches!(self, CurrentSla::Overdue { .. })
    }
}

/// Evaluate the waiting step against `now`.
pub fn current_state(entered_at: Timestamp, sla_hours: i32, now: Timestamp) -> CurrentSla {
    let deadline = deadline(entered_at, sla_hours);
    if now <= deadline {
        CurrentSla::OnTrack {
            deadline,
            remaining_hours: hours_between(now, deadline),
        }
    } else {
        CurrentSla::Overdue {
            deadline,
            overdue_hours: hours_between(deadline, now),
        }
    }
}

/// When the request entered the step it is waiting at: the latest action
/// timestamp, or the submission timestamp when nobody has acted yet.
pub fn step_entered_at(submitted_at: Timestamp, actions: &[ActionPoint]) -> Timestamp {
    actions
        .iter()
        .map(|a| a.acted_at)
        .max()
        .unwrap_or(submitted_at)
}

// ---------------------------------------------------------------------------
// History
// ---------------------------------------------------------------------------

/// The parts of a `request_actions` row the SLA calculation needs.
#[derive(Debug, Clone, Copy)]
pub struct ActionPoint {
    pub step_number: i32,
    pub action: ActionKind,
    pub acted_at: Timestamp,
}

/// SLA outcome of one decided step entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlaSample {
    pub step_number: i32,
    pub entered_at: Timestamp,
    pub acted_at: Timestamp,
    pub sla_hours: i32,
    pub elapsed_hours: f64,
    pub compliant: bool,
}

/// Walk a request's actions (any order) and produce one sample per decision.
///
/// `sla_hours_for` maps a step number to its configured hours; decisions at
/// steps it does not know are skipped.
pub fn evaluate_history<F>(
    submitted_at: Timestamp,
    actions: &[ActionPoint],
    sla_hours_for: F,
) -> Vec<SlaSample>
where
    F: Fn(i32) -> Option<i32>,
{
    let mut ordered: Vec<&ActionPoint> = actions.iter().collect();
    ordered.sort_by_key(|a| a.acted_at);

    let mut clock = submitted_at;
    let mut samples = Vec::new();
    for action in ordered {
        if action.action.is_decision() {
            if let Some(sla_hours) = sla_hours_for(action.step_number) {
                samples.push(SlaSample {
                    step_number: action.step_number,
                    entered_at: clock,
                    acted_at: action.acted_at,
                    sla_hours,
                    elapsed_hours: hours_between(clock, action.acted_at),
                    compliant: is_compliant(clock, action.acted_at, sla_hours),
                });
            }
        }
        clock = action.acted_at;
    }
    samples
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

/// Compliance figures for one workflow step across many requests.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepSummary {
    pub step_number: i32,
    pub decided: u64,
    pub on_time: u64,
    pub late: u64,
    pub average_elapsed_hours: f64,
    /// Share of on-time decisions in `[0, 1]`.
    pub compliance_rate: f64,
}

/// Aggregate samples per step number, ordered by step.
pub fn summarize(samples: &[SlaSample]) -> Vec<StepSummary> {
    let mut by_step: BTreeMap<i32, (u64, u64, f64)> = BTreeMap::new();
    for s in samples {
        let entry = by_step.entry(s.step_number).or_default();
        entry.0 += 1;
        if s.compliant {
            entry.1 += 1;
        }
        entry.2 += s.elapsed_hours;
    }

    by_step
        .into_iter()
        .map(|(step_number, (decided, on_time, total_hours))| StepSummary {
            step_number,
            decided,
            on_time,
            late: decided - on_time,
            average_elapsed_hours: total_hours / decided as f64,
            compliance_rate: on_time as f64 / decided as f64,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hour: u32) -> Timestamp {
        chrono::Utc.with_ymd_and_hms(2026, 3, 2, 0, 0, 0).unwrap() + Duration::hours(i64::from(hour))
    }

    fn point(step: i32, action: ActionKind, hour: u32) -> ActionPoint {
        ActionPoint {
            step_number: step,
            action,
            acted_at: at(hour),
        }
    }

    #[test]
    fn compliance_boundary_is_inclusive() {
        assert!(is_compliant(at(0), at(24), 24));
        assert!(!is_compliant(at(0), at(24) + Duration::seconds(1), 24));
        assert!(is_compliant(at(0), at(3), 24));
    }

    #[test]
    fn current_state_switches_after_deadline() {
        let state = current_state(at(0), 48, at(10));
        assert_eq!(
            state,
            CurrentSla::OnTrack {
                deadline: at(48),
                remaining_hours: 38.0
            }
        );
        let state = current_state(at(0), 48, at(50));
        assert!(state.is_overdue());
        assert_eq!(
            state,
            CurrentSla::Overdue {
                deadline: at(48),
                overdue_hours: 2.0
            }
        );
    }

    #[test]
    fn entry_time_is_latest_action_or_submission() {
        assert_eq!(step_entered_at(at(0), &[]), at(0));
        let actions = [
            point(1, ActionKind::Approve, 5),
            point(2, ActionKind::RejectWithChanges, 9),
        ];
        assert_eq!(step_entered_at(at(0), &actions), at(9));
    }

    #[test]
    fn history_restarts_clock_at_each_action() {
        let actions = [
            point(2, ActionKind::Approve, 30),
            point(1, ActionKind::Approve, 10),
        ];
        let samples = evaluate_history(at(0), &actions, |step| match step {
            1 => Some(24),
            2 => Some(12),
            _ => None,
        });
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].step_number, 1);
        assert_eq!(samples[0].elapsed_hours, 10.0);
        assert!(samples[0].compliant);
        assert_eq!(samples[1].entered_at, at(10));
        assert_eq!(samples[1].elapsed_hours, 20.0);
        assert!(!samples[1].compliant);
    }

    #[test]
    fn resubmission_restarts_clock_without_a_sample() {
        let actions = [
            point(1, ActionKind::RejectWithChanges, 4),
            point(1, ActionKind::Resubmit, 100),
            point(1, ActionKind::Approve, 110),
        ];
        let samples = evaluate_history(at(0), &actions, |_| Some(24));
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[1].entered_at, at(100));
        assert!(samples[1].compliant);
    }

    #[test]
    fn summary_counts_per_step() {
        let actions = [
            point(1, ActionKind::Approve, 10),
            point(2, ActionKind::Reject, 40),
        ];
        let mut samples = evaluate_history(at(0), &actions, |_| Some(24));
        samples.extend(evaluate_history(at(0), &[point(1, ActionKind::Approve, 30)], |_| {
            Some(24)
        }));

        let summary = summarize(&samples);
        assert_eq!(summary.len(), 2);
        assert_eq!(summary[0].step_number, 1);
        assert_eq!(summary[0].decided, 2);
        assert_eq!(summary[0].on_time, 1);
        assert_eq!(summary[0].late, 1);
        assert_eq!(summary[0].average_elapsed_hours, 20.0);
        assert_eq!(summary[0].compliance_rate, 0.5);
        assert_eq!(summary[1].decided, 1);
        assert_eq!(summary[1].late, 1);
    }

    #[test]
    fn empty_summary() {
        assert!(summarize(&[]).is_empty());
    }
}
