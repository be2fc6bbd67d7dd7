//! In-process deterministic implementation of the validation-bounty contract.
//!
//! `SimChain` models one EVM network holding any number of deployed bounty
//! contracts, with the same observable behaviour the workflow sees through
//! an RPC provider: balances move on escrow and payout, duplicate
//! submissions revert, quorum triggers finalization and the reward split.
//!
//! Two fault switches cover the paths that are awkward to hit on a real
//! network: suppressing creation events (exercising the task-counter
//! fallback) and taking the RPC down entirely.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

use tracing::debug;
use veridoc_core::{payout_split, Address};

use crate::{
    ChainClient, ChainError, CreateTaskCall, SigningContext, SubmitResultCall, TaskCreated,
    TaskInfo, TxReceipt,
};

/// Default platform fee taken off the reward pool at finalization: 2.5%.
pub const DEFAULT_FEE_BPS: u16 = 250;

struct SimTask {
    content_id: String,
    required_validators: u32,
    issuer_wallet: Address,
    reward_pool: u128,
    /// (validator wallet, result cid) in submission order.
    submissions: Vec<(Address, String)>,
    finalized: bool,
}

struct SimContract {
    issuer_bonus: u128,
    fee_bps: u16,
    counter: u64,
    tasks: BTreeMap<u64, SimTask>,
    /// Accumulated platform fees and split dust.
    treasury: u128,
}

#[derive(Default)]
struct Inner {
    balances: HashMap<Address, u128>,
    contracts: HashMap<Address, SimContract>,
    next_contract: u64,
    next_tx: u64,
    suppress_events: bool,
    rpc_down: bool,
}

/// Deterministic in-process chain for tests and local demos.
pub struct SimChain {
    chain_id: u64,
    inner: Mutex<Inner>,
}

impl SimChain {
    pub fn new(chain_id: u64) -> Self {
        Self {
            chain_id,
            inner: Mutex::new(Inner::default()),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>, ChainError> {
        self.inner
            .lock()
            .map_err(|_| ChainError::Rpc("sim chain lock poisoned".into()))
    }

    /// Credit a wallet with native tokens.
    pub fn fund(&self, wallet: &Address, amount: u128) -> Result<(), ChainError> {
        let mut inner = self.lock()?;
        *inner.balances.entry(wallet.clone()).or_default() += amount;
        Ok(())
    }

    /// Deploy a fresh bounty contract and return its address.
    pub fn deploy_contract(
        &self,
        issuer_bonus: u128,
        fee_bps: u16,
    ) -> Result<Address, ChainError> {
        let mut inner = self.lock()?;
        inner.next_contract += 1;
        let address = Address::parse(&format!("0x{:040x}", 0xc0de_0000u64 + inner.next_contract))
            .map_err(|e| ChainError::Rpc(e.to_string()))?;
        inner.contracts.insert(
            address.clone(),
            SimContract {
                issuer_bonus,
                fee_bps,
                counter: 0,
                tasks: BTreeMap::new(),
                treasury: 0,
            },
        );
        debug!(contract = %address, "deployed sim bounty contract");
        Ok(address)
    }

    /// Drop creation events from subsequent receipts, forcing callers onto
    /// the task-counter fallback.
    pub fn set_event_suppression(&self, on: bool) -> Result<(), ChainError> {
        self.lock()?.suppress_events = on;
        Ok(())
    }

    /// Simulate a full RPC outage.
    pub fn set_rpc_down(&self, down: bool) -> Result<(), ChainError> {
        self.lock()?.rpc_down = down;
        Ok(())
    }

    /// Treasury balance (fees plus split dust) held by a contract.
    pub fn treasury(&self, contract: &Address) -> Result<u128, ChainError> {
        let inner = self.lock()?;
        let c = inner
            .contracts
            .get(contract)
            .ok_or_else(|| ChainError::NoCode(contract.clone()))?;
        Ok(c.treasury)
    }

    fn next_tx_hash(inner: &mut Inner) -> String {
        inner.next_tx += 1;
        format!("0x{:064x}", inner.next_tx)
    }

    /// Shared validation for `createTask`, used by simulate and send.
    fn check_create(
        inner: &Inner,
        ctx: &SigningContext,
        call: &CreateTaskCall,
    ) -> Result<(), ChainError> {
        if inner.rpc_down {
            return Err(ChainError::Rpc("connection refused".into()));
        }
        let contract = inner
            .contracts
            .get(&call.contract)
            .ok_or_else(|| ChainError::NoCode(call.contract.clone()))?;
        let balance = inner.balances.get(&ctx.wallet).copied().unwrap_or(0);
        if balance < call.value {
            return Err(ChainError::InsufficientFunds {
                wallet: ctx.wallet.clone(),
                balance,
            });
        }
        if call.required_validators == 0 {
            return Err(ChainError::Reverted(
                "required validator count must be positive".into(),
            ));
        }
        if call.content_id.is_empty() {
            return Err(ChainError::Reverted("empty content id".into()));
        }
        if call.value <= contract.issuer_bonus {
            return Err(ChainError::Reverted(
                "escrow must exceed the issuer bonus".into(),
            ));
        }
        Ok(())
    }

    /// Shared validation for `submitResult`, used by simulate and send.
    fn check_submit(
        inner: &Inner,
        ctx: &SigningContext,
        call: &SubmitResultCall,
    ) -> Result<(), ChainError> {
        if inner.rpc_down {
            return Err(ChainError::Rpc("connection refused".into()));
        }
        let contract = inner
            .contracts
            .get(&call.contract)
            .ok_or_else(|| ChainError::NoCode(call.contract.clone()))?;
        let balance = inner.balances.get(&ctx.wallet).copied().unwrap_or(0);
        if balance == 0 {
            return Err(ChainError::InsufficientFunds {
                wallet: ctx.wallet.clone(),
                balance,
            });
        }
        let task = contract
            .tasks
            .get(&call.task_id)
            .ok_or_else(|| ChainError::Reverted("task does not exist".into()))?;
        if task.finalized {
            return Err(ChainError::Reverted("task already finalized".into()));
        }
        if task.submissions.iter().any(|(w, _)| w == &ctx.wallet) {
            return Err(ChainError::Reverted("validator already submitted".into()));
        }
        Ok(())
    }

    /// Pay out a task that just reached quorum: pro-rata pool split net of
    /// the platform fee to validators, the fixed bonus to the issuer.
    fn finalize(
        balances: &mut HashMap<Address, u128>,
        contract: &mut SimContract,
        task_id: u64,
    ) -> Result<(), ChainError> {
        let task = contract
            .tasks
            .get_mut(&task_id)
            .ok_or_else(|| ChainError::Reverted("task does not exist".into()))?;
        let split = payout_split(
            task.reward_pool,
            task.required_validators,
            contract.fee_bps,
        )
        .map_err(|e| ChainError::Reverted(e.to_string()))?;

        for (wallet, _) in &task.submissions {
            *balances.entry(wallet.clone()).or_default() += split.per_validator;
        }
        *balances.entry(task.issuer_wallet.clone()).or_default() += contract.issuer_bonus;
        contract.treasury += split.platform_fee + split.remainder;
        task.finalized = true;
        debug!(
            task_id,
            per_validator = split.per_validator,
            fee = split.platform_fee,
            "task finalized, rewards distributed"
        );
        Ok(())
    }
}

#[async_trait::async_trait]
impl ChainClient for SimChain {
    async fn chain_id(&self) -> Result<u64, ChainError> {
        let inner = self.lock()?;
        if inner.rpc_down {
            return Err(ChainError::Rpc("connection refused".into()));
        }
        Ok(self.chain_id)
    }

    async fn balance(&self, wallet: &Address) -> Result<u128, ChainError> {
        let inner = self.lock()?;
        if inner.rpc_down {
            return Err(ChainError::Rpc("connection refused".into()));
        }
        Ok(inner.balances.get(wallet).copied().unwrap_or(0))
    }

    async fn has_code(&self, contract: &Address) -> Result<bool, ChainError> {
        let inner = self.lock()?;
        if inner.rpc_down {
            return Err(ChainError::Rpc("connection refused".into()));
        }
        Ok(inner.contracts.contains_key(contract))
    }

    async fn simulate_create_task(
        &self,
        ctx: &SigningContext,
        call: &CreateTaskCall,
    ) -> Result<(), ChainError> {
        let inner = self.lock()?;
        Self::check_create(&inner, ctx, call)
    }

    async fn send_create_task(
        &self,
        ctx: &SigningContext,
        call: &CreateTaskCall,
    ) -> Result<TxReceipt, ChainError> {
        let mut inner = self.lock()?;
        Self::check_create(&inner, ctx, call)?;

        let balance = inner
            .balances
            .get_mut(&ctx.wallet)
            .ok_or_else(|| ChainError::Rpc("missing funding account".into()))?;
        *balance -= call.value;

        let suppress_events = inner.suppress_events;
        let tx_hash = Self::next_tx_hash(&mut inner);
        let contract = inner
            .contracts
            .get_mut(&call.contract)
            .ok_or_else(|| ChainError::NoCode(call.contract.clone()))?;

        let task_id = contract.counter;
        contract.counter += 1;
        contract.tasks.insert(
            task_id,
            SimTask {
                content_id: call.content_id.clone(),
                required_validators: call.required_validators,
                issuer_wallet: call.issuer_wallet.clone(),
                reward_pool: call.value - contract.issuer_bonus,
                submissions: Vec::new(),
                finalized: false,
            },
        );

        let task_created = (!suppress_events).then_some(TaskCreated {
            task_id,
            escrowed: call.value,
        });
        Ok(TxReceipt {
            tx_hash,
            task_created,
        })
    }

    async fn simulate_submit_result(
        &self,
        ctx: &SigningContext,
        call: &SubmitResultCall,
    ) -> Result<(), ChainError> {
        let inner = self.lock()?;
        Self::check_submit(&inner, ctx, call)
    }

    async fn send_submit_result(
        &self,
        ctx: &SigningContext,
        call: &SubmitResultCall,
    ) -> Result<TxReceipt, ChainError> {
        let mut inner = self.lock()?;
        Self::check_submit(&inner, ctx, call)?;

        let tx_hash = Self::next_tx_hash(&mut inner);
        let Inner {
            balances,
            contracts,
            ..
        } = &mut *inner;
        let contract = contracts
            .get_mut(&call.contract)
            .ok_or_else(|| ChainError::NoCode(call.contract.clone()))?;

        let quorum_reached = {
            let task = contract
                .tasks
                .get_mut(&call.task_id)
                .ok_or_else(|| ChainError::Reverted("task does not exist".into()))?;
            task.submissions
                .push((ctx.wallet.clone(), call.result_cid.clone()));
            task.submissions.len() as u32 >= task.required_validators
        };
        if quorum_reached {
            Self::finalize(balances, contract, call.task_id)?;
        }

        Ok(TxReceipt {
            tx_hash,
            task_created: None,
        })
    }

    async fn submission_count(&self, contract: &Address, task_id: u64) -> Result<u32, ChainError> {
        self.task_info(contract, task_id)
            .await
            .map(|info| info.submission_count)
    }

    async fn task_info(&self, contract: &Address, task_id: u64) -> Result<TaskInfo, ChainError> {
        let inner = self.lock()?;
        if inner.rpc_down {
            return Err(ChainError::Rpc("connection refused".into()));
        }
        let c = inner
            .contracts
            .get(contract)
            .ok_or_else(|| ChainError::NoCode(contract.clone()))?;
        let task = c.tasks.get(&task_id).ok_or(ChainError::UnknownTask {
            contract: contract.clone(),
            task_id,
        })?;
        Ok(TaskInfo {
            required_validators: task.required_validators,
            submission_count: task.submissions.len() as u32,
            finalized: task.finalized,
            reward_pool: task.reward_pool,
        })
    }

    async fn task_counter(&self, contract: &Address) -> Result<u64, ChainError> {
        let inner = self.lock()?;
        if inner.rpc_down {
            return Err(ChainError::Rpc("connection refused".into()));
        }
        let c = inner
            .contracts
            .get(contract)
            .ok_or_else(|| ChainError::NoCode(contract.clone()))?;
        Ok(c.counter)
    }
}
