//! Deposit signal detection against a block cursor.
//!
//! Detection is range-atomic: the cursor and the native-balance baseline
//! only move after every query for the range has succeeded, so a failure
//! mid-range is retried in full on the next cycle and no deposit is
//! silently dropped.

use crate::rpc::Ledger;
use crate::Result;
use alloy_primitives::{Address, U256};
use tracing::{debug, info};
use vaultward_types::{BlockCursor, Signal};

/// Result of one detection pass.
#[derive(Debug, Clone)]
pub struct Detection {
    pub signals: Vec<Signal>,
    pub cursor: BlockCursor,
}

/// Polls the ledger for deposits into the vault.
pub struct Detector<L> {
    ledger: L,
    vault: Address,
    tracked_assets: Vec<Address>,
    watch_native: bool,
    cursor: Option<BlockCursor>,
    native_baseline: Option<U256>,
}

impl<L: Ledger> Detector<L> {
    pub fn new(ledger: L, vault: Address, tracked_assets: Vec<Address>, watch_native: bool) -> Self {
        Self {
            ledger,
            vault,
            tracked_assets,
            watch_native,
            cursor: None,
            native_baseline: None,
        }
    }

    /// Last fully-processed block, once primed.
    pub fn cursor(&self) -> Option<BlockCursor> {
        self.cursor
    }

    /// Detect new deposits since the cursor.
    ///
    /// The first invocation primes the cursor and balance baseline and
    /// emits nothing, so a fresh start never replays historical deposits.
    pub async fn detect(&mut self) -> Result<Detection> {
        let head = self.ledger.block_number().await?;

        let Some(cursor) = self.cursor else {
            if self.watch_native {
                self.native_baseline = Some(self.ledger.native_balance(self.vault).await?);
            }
            let primed = BlockCursor::at(head);
            self.cursor = Some(primed);
            info!(head, "detector primed");
            return Ok(Detection {
                signals: Vec::new(),
                cursor: primed,
            });
        };

        if head <= cursor.last_block {
            return Ok(Detection {
                signals: Vec::new(),
                cursor,
            });
        }

        let from_block = cursor.last_block + 1;
        let mut signals = Vec::new();
        for asset in &self.tracked_assets {
            let logs = self
                .ledger
                .transfer_logs(*asset, self.vault, from_block, head)
                .await?;
            for log in logs {
                signals.push(Signal::AssetDeposit {
                    asset: *asset,
                    amount: log.amount,
                    block: log.block,
                    tx: log.tx,
                });
            }
        }

        let mut native_balance = None;
        if self.watch_native {
            let balance = self.ledger.native_balance(self.vault).await?;
            if let Some(baseline) = self.native_baseline {
                if balance > baseline {
                    signals.push(Signal::NativeDeposit {
                        amount: balance - baseline,
                        block: head,
                    });
                }
            }
            native_balance = Some(balance);
        }

        // Every query for the range succeeded; commit cursor and baseline.
        let advanced = cursor.advanced_to(head);
        self.cursor = Some(advanced);
        if let Some(balance) = native_balance {
            self.native_baseline = Some(balance);
        }
        debug!(
            from_block,
            head,
            signals = signals.len(),
            "detection range processed"
        );
        Ok(Detection {
            signals,
            cursor: advanced,
        })
    }
}
