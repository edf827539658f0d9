//! Step planning: which mutations each step applies, and when.

use super::{RunId, Timeline};
use crate::core::StageStatus;
use crate::graph::{Mutation, StageGraph};
use crate::utils::whole_millis;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Identifies one scheduled step: the run it belongs to, its position in the
/// run and its offset from the trigger.
///
/// Offsets may repeat, so the index keeps keys of one run distinct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StepKey {
    /// The owning run.
    pub run_id: RunId,
    /// Zero-based step index; step `k` advances stage `k` to stage `k + 1`.
    pub index: usize,
    /// Delay from the trigger.
    pub offset: Duration,
}

/// A step bound to its place on a run's timeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledStep {
    /// Run, index and offset.
    pub key: StepKey,
    /// The batch applied atomically when the step fires.
    pub mutations: Vec<Mutation>,
}

impl ScheduledStep {
    /// Returns the step's index within its run.
    #[must_use]
    pub fn index(&self) -> usize {
        self.key.index
    }

    /// Returns the offset in whole milliseconds.
    #[must_use]
    pub fn offset_ms(&self) -> u64 {
        whole_millis(self.key.offset)
    }
}

/// Plans the `N - 1` mutation batches that walk a graph of `N` stages from
/// idle to complete.
///
/// Step `k` marks stage `k` succeeded, switches the edge into stage `k` off
/// and the edge out of it on, and marks stage `k + 1` active. The final step
/// instead leaves its outgoing edge off and marks the exit stage succeeded, so
/// a finished run has every stage succeeded and every edge inactive.
#[must_use]
pub fn plan_steps(graph: &StageGraph) -> Vec<Vec<Mutation>> {
    let stages = graph.stages();
    let transitions = graph.transitions();
    let last = transitions.len().saturating_sub(1);

    transitions
        .iter()
        .enumerate()
        .map(|(k, outgoing)| {
            let current = &stages[k];
            let next = &stages[k + 1];
            let is_last = k == last;

            let mut batch = Vec::with_capacity(4);
            batch.push(Mutation::SetStageStatus {
                id: current.id().clone(),
                status: StageStatus::Succeeded,
                label: current.labels().complete.clone(),
            });
            if let Some(incoming) = k.checked_sub(1).map(|i| &transitions[i]) {
                batch.push(Mutation::SetTransitionActive {
                    id: incoming.id().clone(),
                    active: false,
                });
            }
            batch.push(Mutation::SetTransitionActive {
                id: outgoing.id().clone(),
                active: !is_last,
            });
            let next_status = if is_last {
                StageStatus::Succeeded
            } else {
                StageStatus::Active
            };
            batch.push(Mutation::SetStageStatus {
                id: next.id().clone(),
                status: next_status,
                label: next.labels().for_status(next_status).to_string(),
            });
            batch
        })
        .collect()
}

/// Binds planned steps to a run and a timeline.
///
/// Steps beyond the end of the timeline reuse its last offset.
#[must_use]
pub fn schedule_run(run_id: RunId, graph: &StageGraph, timeline: &Timeline) -> Vec<ScheduledStep> {
    let fallback = timeline.last_offset().unwrap_or(Duration::ZERO);
    plan_steps(graph)
        .into_iter()
        .enumerate()
        .map(|(index, mutations)| ScheduledStep {
            key: StepKey {
                run_id,
                index,
                offset: timeline.offsets().get(index).copied().unwrap_or(fallback),
            },
            mutations,
        })
        .collect()
}
