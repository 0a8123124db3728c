//! The policy gate: augmentation, validation and outcome commits.

use crate::trigger::{due_triggers, select_winner, TriggerSpec};
use alloy_primitives::Address;
use chrono::{DateTime, Duration, Utc};
use serde::de::DeserializeOwned;
use tracing::{info, warn};
use vaultward_types::{
    AgentState, AugmentedSignals, CancelScope, ConfirmDepositArgs, DerivedFacts, PlaceOrderArgs,
    ProposalSubmission, ProposeTransactionsArgs, Signal, ToolCallRequest, VaultAction,
    VaultContext,
};

/// A structured refusal. Not an error: it is reported to the oracle's
/// explanation turn and the cycle continues.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    pub reason: String,
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "rejected: {}", self.reason)
    }
}

/// Outcome of validating one tool call.
#[derive(Debug, Clone)]
pub enum Verdict {
    Accepted(VaultAction),
    Rejected(Rejection),
}

impl Verdict {
    fn reject(reason: impl Into<String>) -> Self {
        Self::Rejected(Rejection {
            reason: reason.into(),
        })
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted(_))
    }
}

/// Per-deployment gate configuration and declared triggers.
pub struct PolicyGate {
    signer: Address,
    vault: Address,
    triggers: Vec<TriggerSpec>,
    reconciliation_timeout: Duration,
}

impl PolicyGate {
    pub fn new(signer: Address, vault: Address, reconciliation_timeout_secs: u64) -> Self {
        Self {
            signer,
            vault,
            triggers: Vec::new(),
            reconciliation_timeout: Duration::seconds(reconciliation_timeout_secs as i64),
        }
    }

    /// Re-derive declared triggers from the (possibly refreshed) rules text.
    pub fn sync_rules(&mut self, rules: &str) {
        self.triggers = crate::timelock::extract_triggers(rules);
    }

    pub fn triggers(&self) -> &[TriggerSpec] {
        &self.triggers
    }

    /// Attach derived facts and due-timer signals to a cycle's raw signals.
    pub fn augment(
        &self,
        mut signals: Vec<Signal>,
        state: &AgentState,
        bond_covered: bool,
        now: DateTime<Utc>,
    ) -> AugmentedSignals {
        for spec in due_triggers(&self.triggers, state, now) {
            if let Some(due_at) = spec.due_at(state.deposit_confirmed_at) {
                signals.push(Signal::Timer {
                    trigger_id: spec.id.clone(),
                    due_at,
                });
            }
        }
        let elapsed_since_deposit_ms = state.deposit_confirmed_at.map(|anchor| {
            (now - anchor).num_milliseconds().max(0) as u64
        });
        AugmentedSignals {
            signals,
            facts: DerivedFacts {
                elapsed_since_deposit_ms,
                bond_covered,
                proposal_pending: state.proposal_pending(),
                cycle: state.cycle,
            },
        }
    }

    /// Validate one tool call against current state and context.
    pub fn validate(
        &self,
        call: &ToolCallRequest,
        state: &AgentState,
        ctx: &VaultContext,
        now: DateTime<Utc>,
    ) -> Verdict {
        let action = match parse_action(call) {
            Ok(action) => action,
            Err(reason) => return Verdict::reject(reason),
        };

        match &action {
            VaultAction::ConfirmDeposit(_) => {
                if state.deposit_confirmed {
                    return Verdict::reject("deposit already confirmed for this flow");
                }
            }
            VaultAction::ProposeTransactions(args) => {
                if let Some(pending) = &state.pending_proposal {
                    return Verdict::reject(format!(
                        "a bonded proposal is already pending (id {})",
                        pending.proposal_id
                    ));
                }
                if args.intents.is_empty() {
                    return Verdict::reject("proposal carries no intents");
                }
                if let Some(rejection) = self.check_trigger(args.trigger_id.as_deref(), state, now)
                {
                    return Verdict::Rejected(rejection);
                }
                if let Some(rejection) = self.check_recipients(args, ctx) {
                    return Verdict::Rejected(rejection);
                }
            }
            VaultAction::PlaceOrder(_) | VaultAction::CancelOrders(_) => {}
        }
        Verdict::Accepted(action)
    }

    /// Trigger-race and time-window rules for a proposal acting on a trigger.
    fn check_trigger(
        &self,
        trigger_id: Option<&str>,
        state: &AgentState,
        now: DateTime<Utc>,
    ) -> Option<Rejection> {
        let trigger_id = trigger_id?;
        if state.has_fired(trigger_id) {
            return Some(Rejection {
                reason: format!("trigger {trigger_id} already fired"),
            });
        }
        let Some(spec) = self.triggers.iter().find(|spec| spec.id == trigger_id) else {
            return Some(Rejection {
                reason: format!("trigger {trigger_id} is not declared by the rules"),
            });
        };
        if !spec.is_due(now, state.deposit_confirmed_at) {
            let due = spec
                .due_at(state.deposit_confirmed_at)
                .map(|at| at.to_rfc3339())
                .unwrap_or_else(|| "an anchoring deposit".to_string());
            return Some(Rejection {
                reason: format!("trigger {trigger_id} is not due until {due}"),
            });
        }
        let due = due_triggers(&self.triggers, state, now);
        match select_winner(&due) {
            Some(winner) if winner.id == spec.id => None,
            Some(winner) => Some(Rejection {
                reason: format!(
                    "trigger {trigger_id} loses this cycle's race to {} (priority {})",
                    winner.id, winner.priority
                ),
            }),
            None => Some(Rejection {
                reason: format!("trigger {trigger_id} is not in the due set"),
            }),
        }
    }

    /// Value may only move to the signer, the vault, or a destination the
    /// rules text names explicitly.
    fn check_recipients(
        &self,
        args: &ProposeTransactionsArgs,
        ctx: &VaultContext,
    ) -> Option<Rejection> {
        let rules = ctx.rules.to_ascii_lowercase();
        for (index, intent) in args.intents.iter().enumerate() {
            let Some(recipient) = intent.value_recipient() else {
                continue;
            };
            if recipient == self.signer || recipient == self.vault {
                continue;
            }
            if rules.contains(&format!("{recipient:#x}")) {
                continue;
            }
            return Some(Rejection {
                reason: format!(
                    "intent {index} routes value to unauthorized recipient {recipient:#x}"
                ),
            });
        }
        None
    }

    /// Commit a confirmed deposit acknowledgement.
    pub fn on_deposit_confirmed(&self, state: &mut AgentState, now: DateTime<Utc>) {
        state.confirm_deposit(now);
        info!("deposit confirmed");
    }

    /// Commit a successfully posted proposal, recording its fired trigger.
    ///
    /// Infallible: the submission transaction has already gone out, so
    /// state is forced to match chain reality regardless of step flags.
    pub fn on_proposal_posted(
        &self,
        state: &mut AgentState,
        submission: ProposalSubmission,
        trigger_id: Option<&str>,
    ) {
        state.record_posted_proposal(submission);
        if let Some(trigger_id) = trigger_id {
            state.record_fired(trigger_id);
        }
    }

    /// Clear a pending proposal whose fate is known. Returns whether state
    /// was cleared.
    ///
    /// `submission_succeeded` is the submission transaction's receipt
    /// status, `None` while no receipt is available. A reverted submission
    /// clears immediately; a landed one clears once the dispute window has
    /// elapsed; otherwise the reconciliation timeout is the backstop.
    pub fn reconcile(
        &self,
        state: &mut AgentState,
        submission_succeeded: Option<bool>,
        liveness_secs: u64,
        now: DateTime<Utc>,
    ) -> bool {
        let Some(pending) = &state.pending_proposal else {
            return false;
        };
        let age = now - pending.submitted_at;
        match submission_succeeded {
            Some(false) => {
                warn!(
                    proposal_id = %pending.proposal_id,
                    tx = %pending.tx,
                    "submission transaction reverted, clearing"
                );
                state.reset_steps();
                return true;
            }
            Some(true) if age >= Duration::seconds(liveness_secs as i64) => {
                info!(
                    proposal_id = %pending.proposal_id,
                    "dispute window elapsed, proposal confirmed"
                );
                state.reset_steps();
                return true;
            }
            _ => {}
        }
        if age < self.reconciliation_timeout {
            return false;
        }
        warn!(
            proposal_id = %pending.proposal_id,
            "pending proposal exceeded the reconciliation window, clearing"
        );
        state.reset_steps();
        true
    }
}

fn parse_args<T: DeserializeOwned>(call: &ToolCallRequest) -> Result<T, String> {
    serde_json::from_value(call.arguments.clone())
        .map_err(|error| format!("malformed arguments for {}: {error}", call.name))
}

/// Resolve a raw tool call into the closed action vocabulary.
fn parse_action(call: &ToolCallRequest) -> Result<VaultAction, String> {
    match call.name.as_str() {
        "confirm_deposit" => parse_args::<ConfirmDepositArgs>(call).map(VaultAction::ConfirmDeposit),
        "propose_transactions" => {
            parse_args::<ProposeTransactionsArgs>(call).map(VaultAction::ProposeTransactions)
        }
        "place_order" => parse_args::<PlaceOrderArgs>(call).map(VaultAction::PlaceOrder),
        "cancel_orders" => parse_args::<CancelScope>(call).map(VaultAction::CancelOrders),
        other => Err(format!("unknown tool {other}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trigger::TriggerCondition;
    use alloy_primitives::{B256, U256};
    use serde_json::json;
    use vaultward_types::ActionIntent;

    fn signer() -> Address {
        Address::repeat_byte(0x51)
    }

    fn vault() -> Address {
        Address::repeat_byte(0xfe)
    }

    fn gate() -> PolicyGate {
        PolicyGate::new(signer(), vault(), 3_600)
    }

    fn ctx(rules: &str) -> VaultContext {
        VaultContext {
            collateral_asset: Address::repeat_byte(0x0c),
            bond_amount: U256::from(500u64),
            oracle_address: Address::repeat_byte(0x0e),
            rules: rules.to_string(),
            liveness_secs: 7200,
            identifier: B256::repeat_byte(0x1d),
        }
    }

    fn submission() -> ProposalSubmission {
        ProposalSubmission {
            proposal_id: B256::repeat_byte(0xab),
            tx: B256::repeat_byte(0x77),
            bond_amount: U256::from(500u64),
            collateral_asset: Address::repeat_byte(0x0c),
            oracle_address: Address::repeat_byte(0x0e),
            submitted_at: Utc::now(),
        }
    }

    fn propose_call(recipient: Address, trigger_id: Option<&str>) -> ToolCallRequest {
        let intent = ActionIntent::NativeTransfer {
            recipient,
            amount: U256::from(5u64),
        };
        ToolCallRequest {
            name: "propose_transactions".to_string(),
            arguments: json!({
                "intents": [serde_json::to_value(intent).unwrap()],
                "explanation": "payout",
                "trigger_id": trigger_id,
            }),
            call_id: "call_1".to_string(),
        }
    }

    #[test]
    fn pending_proposal_blocks_further_proposals() {
        let gate = gate();
        let mut state = AgentState::new(0);
        gate.on_proposal_posted(&mut state, submission(), None);

        let verdict = gate.validate(&propose_call(vault(), None), &state, &ctx(""), Utc::now());
        match verdict {
            Verdict::Rejected(rejection) => assert!(rejection.reason.contains("already pending")),
            Verdict::Accepted(_) => panic!("proposal accepted while one is pending"),
        }

        // confirmation clears the flag set and proposals flow again
        state.reset_steps();
        assert!(gate
            .validate(&propose_call(vault(), None), &state, &ctx(""), Utc::now())
            .is_accepted());
    }

    #[test]
    fn lower_priority_trigger_wins_and_fires_only_once() {
        let mut gate = gate();
        let past = Utc::now() - Duration::hours(1);
        gate.triggers = vec![
            TriggerSpec {
                id: "payout".to_string(),
                priority: 0,
                condition: TriggerCondition::Absolute { at: past },
            },
            TriggerSpec {
                id: "escalate".to_string(),
                priority: 1,
                condition: TriggerCondition::Absolute { at: past },
            },
        ];
        let mut state = AgentState::new(0);
        let now = Utc::now();

        // the priority-1 trigger loses the race
        match gate.validate(&propose_call(vault(), Some("escalate")), &state, &ctx(""), now) {
            Verdict::Rejected(rejection) => assert!(rejection.reason.contains("loses")),
            Verdict::Accepted(_) => panic!("losing trigger was accepted"),
        }
        // the priority-0 trigger is the single firing branch
        assert!(gate
            .validate(&propose_call(vault(), Some("payout")), &state, &ctx(""), now)
            .is_accepted());

        // once fired, the same trigger never refires
        state.record_fired("payout");
        match gate.validate(&propose_call(vault(), Some("payout")), &state, &ctx(""), now) {
            Verdict::Rejected(rejection) => assert!(rejection.reason.contains("already fired")),
            Verdict::Accepted(_) => panic!("emit-once trigger refired"),
        }
    }

    #[test]
    fn relative_trigger_is_rejected_before_its_offset_elapses() {
        let mut gate = gate();
        gate.sync_rules("release five minutes after deposit");
        let mut state = AgentState::new(0);
        let deposit_at = Utc::now();
        state.confirm_deposit(deposit_at);

        let early = deposit_at + Duration::milliseconds(299_999);
        match gate.validate(
            &propose_call(vault(), Some("timelock-0")),
            &state,
            &ctx(""),
            early,
        ) {
            Verdict::Rejected(rejection) => assert!(rejection.reason.contains("not due")),
            Verdict::Accepted(_) => panic!("trigger fired before its offset"),
        }

        let due = deposit_at + Duration::milliseconds(300_000);
        assert!(gate
            .validate(&propose_call(vault(), Some("timelock-0")), &state, &ctx(""), due)
            .is_accepted());
    }

    #[test]
    fn value_may_only_leave_to_signer_vault_or_named_recipients() {
        let gate = gate();
        let state = AgentState::new(0);
        let now = Utc::now();
        let outsider = Address::repeat_byte(0x99);

        match gate.validate(&propose_call(outsider, None), &state, &ctx(""), now) {
            Verdict::Rejected(rejection) => {
                assert!(rejection.reason.contains("unauthorized recipient"))
            }
            Verdict::Accepted(_) => panic!("outsider recipient accepted"),
        }

        assert!(gate
            .validate(&propose_call(signer(), None), &state, &ctx(""), now)
            .is_accepted());

        // the rules text may authorize any destination explicitly
        let rules = format!("refunds go to {outsider:#x} when asked");
        assert!(gate
            .validate(&propose_call(outsider, None), &state, &ctx(&rules), now)
            .is_accepted());
    }

    #[test]
    fn unknown_tools_and_malformed_arguments_are_refusals_not_errors() {
        let gate = gate();
        let state = AgentState::new(0);
        let now = Utc::now();

        let unknown = ToolCallRequest {
            name: "drain_vault".to_string(),
            arguments: json!({}),
            call_id: "c".to_string(),
        };
        assert!(!gate.validate(&unknown, &state, &ctx(""), now).is_accepted());

        let malformed = ToolCallRequest {
            name: "place_order".to_string(),
            arguments: json!({"market": "m", "side": "hold", "price": "1", "size": "2"}),
            call_id: "c".to_string(),
        };
        match gate.validate(&malformed, &state, &ctx(""), now) {
            Verdict::Rejected(rejection) => {
                assert!(rejection.reason.contains("malformed arguments"))
            }
            Verdict::Accepted(_) => panic!("malformed arguments coerced into an action"),
        }
    }

    #[test]
    fn repeated_deposit_confirmation_is_idempotent() {
        let gate = gate();
        let mut state = AgentState::new(0);
        let call = ToolCallRequest {
            name: "confirm_deposit".to_string(),
            arguments: json!({"asset": null}),
            call_id: "c".to_string(),
        };
        assert!(gate
            .validate(&call, &state, &ctx(""), Utc::now())
            .is_accepted());
        gate.on_deposit_confirmed(&mut state, Utc::now());
        assert!(!gate
            .validate(&call, &state, &ctx(""), Utc::now())
            .is_accepted());
    }

    #[test]
    fn stale_pending_proposal_is_reconciled_away() {
        let gate = gate();
        let mut state = AgentState::new(0);
        state.confirm_deposit(Utc::now());
        let mut stale = submission();
        stale.submitted_at = Utc::now() - Duration::hours(2);
        state.record_posted_proposal(stale);

        // no receipt available, so the timeout backstop clears it
        assert!(gate.reconcile(&mut state, None, 7_200, Utc::now()));
        assert!(state.pending_proposal.is_none());
        assert!(!state.deposit_confirmed);

        // nothing to clear the second time around
        assert!(!gate.reconcile(&mut state, None, 7_200, Utc::now()));
    }

    #[test]
    fn reverted_submission_clears_state_before_the_timeout() {
        let gate = gate();
        let mut state = AgentState::new(0);
        state.record_posted_proposal(submission());

        // the submission just happened, well inside every window
        assert!(gate.reconcile(&mut state, Some(false), 7_200, Utc::now()));
        assert!(state.pending_proposal.is_none());

        // the next proposal flows without waiting out the timeout
        assert!(gate
            .validate(&propose_call(vault(), None), &state, &ctx(""), Utc::now())
            .is_accepted());
    }

    #[test]
    fn landed_proposal_clears_once_its_dispute_window_elapses() {
        let gate = gate();
        let mut state = AgentState::new(0);
        let mut landed = submission();
        landed.submitted_at = Utc::now() - Duration::seconds(100);
        state.record_posted_proposal(landed);

        // landed but still inside the dispute window: nothing moves
        assert!(!gate.reconcile(&mut state, Some(true), 7_200, Utc::now()));
        assert!(state.pending_proposal.is_some());

        // window elapsed: confirmed, flags reset together
        assert!(gate.reconcile(&mut state, Some(true), 60, Utc::now()));
        assert!(state.pending_proposal.is_none());
    }

    #[test]
    fn augmentation_attaches_facts_and_due_timers() {
        let mut gate = gate();
        gate.sync_rules("close one minute after deposit");
        let mut state = AgentState::new(0);
        state.cycle = 4;
        let deposit_at = Utc::now() - Duration::minutes(2);
        state.confirm_deposit(deposit_at);

        let augmented = gate.augment(Vec::new(), &state, true, Utc::now());
        assert_eq!(augmented.facts.cycle, 4);
        assert!(augmented.facts.bond_covered);
        assert!(!augmented.facts.proposal_pending);
        assert!(augmented.facts.elapsed_since_deposit_ms.unwrap() >= 120_000);
        assert!(matches!(
            &augmented.signals[0],
            Signal::Timer { trigger_id, .. } if trigger_id == "timelock-0"
        ));
    }
}
