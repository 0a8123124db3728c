//! Declared triggers and the single-branch race between them.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use vaultward_types::AgentState;

/// When a trigger becomes due.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TriggerCondition {
    /// Due once wall-clock time reaches the timestamp.
    Absolute { at: DateTime<Utc> },
    /// Due once the offset has elapsed since the anchoring deposit.
    RelativeToDeposit { offset_ms: u64 },
}

/// A declared condition that authorizes exactly one course of action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerSpec {
    pub id: String,
    /// Lower fires first when several triggers are due in the same cycle.
    pub priority: u32,
    pub condition: TriggerCondition,
}

impl TriggerSpec {
    /// Absolute due time, where one can be computed yet.
    ///
    /// A deposit-relative trigger has no due time until a deposit anchors it.
    pub fn due_at(&self, deposit_at: Option<DateTime<Utc>>) -> Option<DateTime<Utc>> {
        match &self.condition {
            TriggerCondition::Absolute { at } => Some(*at),
            TriggerCondition::RelativeToDeposit { offset_ms } => {
                deposit_at.map(|anchor| anchor + Duration::milliseconds(*offset_ms as i64))
            }
        }
    }

    pub fn is_due(&self, now: DateTime<Utc>, deposit_at: Option<DateTime<Utc>>) -> bool {
        self.due_at(deposit_at).is_some_and(|due| now >= due)
    }
}

/// Triggers due this cycle that have not already fired.
pub fn due_triggers<'a>(
    specs: &'a [TriggerSpec],
    state: &AgentState,
    now: DateTime<Utc>,
) -> Vec<&'a TriggerSpec> {
    specs
        .iter()
        .filter(|spec| !state.has_fired(&spec.id))
        .filter(|spec| spec.is_due(now, state.deposit_confirmed_at))
        .collect()
}

/// The single winner among simultaneously-due triggers.
///
/// Tie-break is ascending priority, then lexical id order; every other due
/// trigger loses the race for this cycle.
pub fn select_winner<'a>(due: &[&'a TriggerSpec]) -> Option<&'a TriggerSpec> {
    due.iter()
        .copied()
        .min_by(|a, b| a.priority.cmp(&b.priority).then_with(|| a.id.cmp(&b.id)))
}
