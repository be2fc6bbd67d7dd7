//! Contract registry: one validation-bounty contract per wallet.
//!
//! Deployment itself happens through the actor's wallet provider; this
//! registry only answers "which contract does this wallet use" and pins
//! the answer down the first time it is given. An existing registration
//! always wins over a freshly supplied address, so repeated deployments
//! from stale browser tabs converge on the original contract.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};
use veridoc_core::{Address, ContractRecord};
use veridoc_store::MirrorStore;

use crate::EngineError;

pub struct ContractRegistry<S> {
    store: Arc<S>,
}

impl<S: MirrorStore> ContractRegistry<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Resolve the contract address for a wallet, registering a newly
    /// deployed one if the wallet has none yet.
    ///
    /// - existing registration: returned, any `deployed_address` ignored
    /// - no registration, address supplied: persisted and returned
    /// - no registration, no address: [`EngineError::NoContractConfigured`]
    ///
    /// Races between two registration attempts resolve at the store's
    /// uniqueness constraint; the loser receives the winner's address as a
    /// success, never an error.
    pub async fn resolve_or_register(
        &self,
        wallet: &Address,
        user_id: &str,
        deployed_address: Option<Address>,
    ) -> Result<Address, EngineError> {
        if let Some(existing) = self.store.contract_for_wallet(wallet).await? {
            if let Some(proposed) = &deployed_address {
                if proposed != &existing.contract_address {
                    warn!(
                        wallet = %wallet,
                        proposed = %proposed,
                        existing = %existing.contract_address,
                        "ignoring freshly supplied contract, wallet already registered"
                    );
                }
            }
            return Ok(existing.contract_address);
        }

        let Some(address) = deployed_address else {
            return Err(EngineError::NoContractConfigured(wallet.clone()));
        };

        let record = ContractRecord {
            user_id: user_id.to_string(),
            wallet: wallet.clone(),
            contract_address: address,
            created_at: Utc::now(),
        };
        let stored = self.store.register_contract(record).await?;
        info!(
            wallet = %wallet,
            contract = %stored.contract_address,
            "validation contract registered"
        );
        Ok(stored.contract_address)
    }
}
