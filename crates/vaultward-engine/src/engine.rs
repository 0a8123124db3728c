//! The cycle driver.

use crate::{EngineConfig, EngineError, Result};
use chrono::Utc;
use tracing::{error, info, warn};
use vaultward_chain::{erc20, Detector, GovernorClient, Ledger, Submitter, SubmitterConfig};
use vaultward_intents::{compile, CompileEnv};
use vaultward_oracle::{DecisionOracle, DecisionRequest, StructuredDecision};
use vaultward_policy::{PolicyGate, Verdict};
use vaultward_types::{
    AgentState, StateError, ToolCallRequest, ToolOutcome, VaultAction, VaultContext,
};
use vaultward_venue::{VenueClient, VenueTransport};

/// What one cycle did, for logging and tests.
#[derive(Debug, Clone)]
pub struct CycleReport {
    pub cycle: u32,
    pub signals: usize,
    pub decision: Option<StructuredDecision>,
    pub outcomes: Vec<ToolOutcome>,
    pub summary: Option<String>,
}

/// Drives detection, decision, gating and execution for one deployment.
pub struct Engine<L, O, V> {
    ledger: L,
    detector: Detector<L>,
    governor: GovernorClient<L>,
    submitter: Submitter<L>,
    oracle: O,
    venue: VenueClient<V>,
    gate: PolicyGate,
    state: AgentState,
    compile_env: CompileEnv,
    config: EngineConfig,
}

impl<L, O, V> Engine<L, O, V>
where
    L: Ledger + Clone,
    O: DecisionOracle,
    V: VenueTransport,
{
    pub fn new(ledger: L, oracle: O, venue: VenueClient<V>, config: EngineConfig) -> Self {
        let detector = Detector::new(
            ledger.clone(),
            config.vault,
            config.tracked_assets.clone(),
            config.watch_native,
        );
        let governor = GovernorClient::new(ledger.clone(), config.module);
        let submitter = Submitter::new(
            ledger.clone(),
            SubmitterConfig {
                module: config.module,
                signer: config.signer,
            },
        );
        let gate = PolicyGate::new(config.signer, config.vault, config.reconciliation_timeout_secs);
        let state = AgentState::new(config.max_cycles);
        let compile_env = CompileEnv {
            router: config.router,
            conditional_tokens: config.conditional_tokens,
        };
        Self {
            ledger,
            detector,
            governor,
            submitter,
            oracle,
            venue,
            gate,
            state,
            compile_env,
            config,
        }
    }

    pub fn state(&self) -> &AgentState {
        &self.state
    }

    /// Run cycles until the configured limit, rescheduling from the tail.
    ///
    /// A failed cycle is logged and the loop continues; nothing short of
    /// the cycle limit stops it.
    pub async fn run(&mut self) -> Result<()> {
        loop {
            match self.run_cycle().await {
                Ok(report) => info!(
                    cycle = report.cycle,
                    signals = report.signals,
                    outcomes = report.outcomes.len(),
                    "cycle complete"
                ),
                Err(EngineError::State(StateError::CycleLimitReached(limit))) => {
                    info!(limit, "cycle limit reached, stopping");
                    return Ok(());
                }
                Err(err) => error!(%err, "cycle failed"),
            }
            tokio::time::sleep(self.config.cycle_delay).await;
        }
    }

    /// One full cycle: snapshot, detect, decide, gate, execute, explain,
    /// reconcile.
    pub async fn run_cycle(&mut self) -> Result<CycleReport> {
        let cycle = self.state.begin_cycle()?;

        let ctx = self.governor.context().await?;
        self.gate.sync_rules(&ctx.rules);

        let detection = self.detector.detect().await?;

        let bond_covered = if ctx.bond_amount.is_zero() {
            true
        } else {
            let balance =
                erc20::balance_of(&self.ledger, ctx.collateral_asset, self.config.signer).await?;
            balance >= ctx.bond_amount
        };

        let augmented =
            self.gate
                .augment(detection.signals, &self.state, bond_covered, Utc::now());
        let signals = augmented.signals.len();

        let reply = self
            .oracle
            .decide(&DecisionRequest {
                rules: ctx.rules.clone(),
                signals: augmented,
                context: ctx.clone(),
            })
            .await?;

        if let Some(decision) = &reply.decision {
            info!(action = %decision.action, rationale = %decision.rationale, "oracle decided without tools");
        }

        let mut outcomes = Vec::with_capacity(reply.tool_calls.len());
        for call in &reply.tool_calls {
            let output = self.execute(call, &ctx).await?;
            outcomes.push(ToolOutcome {
                call_id: call.call_id.clone(),
                output,
            });
        }

        // the summary turn is best-effort; its failure never fails the cycle
        let summary = if outcomes.is_empty() {
            None
        } else {
            match self.oracle.explain(&reply.response_id, &outcomes).await {
                Ok(summary) => {
                    info!(%summary, "cycle summarized");
                    Some(summary)
                }
                Err(err) => {
                    warn!(%err, "summary turn failed");
                    None
                }
            }
        };

        // consult the submission receipt before the timeout backstop; a
        // failed lookup is treated as no receipt yet
        let submission_succeeded = match &self.state.pending_proposal {
            Some(pending) => match self.ledger.transaction_succeeded(pending.tx).await {
                Ok(status) => status,
                Err(err) => {
                    warn!(%err, "receipt lookup failed");
                    None
                }
            },
            None => None,
        };
        self.gate.reconcile(
            &mut self.state,
            submission_succeeded,
            ctx.liveness_secs,
            Utc::now(),
        );

        Ok(CycleReport {
            cycle,
            signals,
            decision: reply.decision,
            outcomes,
            summary,
        })
    }

    /// Gate one tool call and carry out its action.
    ///
    /// Rejections and per-call venue failures come back as output text for
    /// the summary turn. Preflight and submission errors on a bonded
    /// proposal abort the whole cycle before any state is mutated.
    async fn execute(&mut self, call: &ToolCallRequest, ctx: &VaultContext) -> Result<String> {
        let now = Utc::now();
        let action = match self.gate.validate(call, &self.state, ctx, now) {
            Verdict::Accepted(action) => action,
            Verdict::Rejected(rejection) => {
                warn!(tool = %call.name, %rejection, "tool call rejected");
                return Ok(rejection.to_string());
            }
        };

        match action {
            VaultAction::ConfirmDeposit(args) => {
                self.gate.on_deposit_confirmed(&mut self.state, now);
                Ok(match args.asset {
                    Some(asset) => format!("deposit of {asset:#x} confirmed"),
                    None => "deposit confirmed".to_string(),
                })
            }
            VaultAction::ProposeTransactions(args) => {
                let calls = match compile(&args.intents, &self.compile_env) {
                    Ok(calls) => calls,
                    Err(err) => {
                        warn!(%err, "intent batch did not compile");
                        return Ok(format!("failed: {err}"));
                    }
                };
                let submission = self.submitter.submit(&calls, ctx, &args.explanation).await?;
                let output = format!(
                    "proposal {} posted with bond {}",
                    submission.proposal_id, submission.bond_amount
                );
                self.gate
                    .on_proposal_posted(&mut self.state, submission, args.trigger_id.as_deref());
                Ok(output)
            }
            VaultAction::PlaceOrder(order) => match self.venue.place_order(&order).await {
                Ok(outcome) => Ok(format!(
                    "order accepted (HTTP {}, {} attempts): {}",
                    outcome.status, outcome.attempts, outcome.body
                )),
                Err(err) => {
                    warn!(%err, "order placement failed");
                    Ok(format!("failed: {err}"))
                }
            },
            VaultAction::CancelOrders(scope) => match self.venue.cancel_orders(&scope).await {
                Ok(outcome) => Ok(format!(
                    "cancellation accepted (HTTP {}): {}",
                    outcome.status, outcome.body
                )),
                Err(err) => {
                    warn!(%err, "order cancellation failed");
                    Ok(format!("failed: {err}"))
                }
            },
        }
    }
}
