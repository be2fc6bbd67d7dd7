//! End-to-end demo of the verification workflow on the in-process chain.
//!
//! Walks one claim through scoring, bucket routing, contract registration,
//! task creation, validator submissions, and settlement, printing the
//! observable state at each step.

use std::sync::Arc;

use chrono::Utc;
use veridoc_chain::{ChainClient, SigningContext, SimChain};
use veridoc_core::{
    escrow_total, format_amount, parse_amount, Address, Bucket, Claim, ClaimStatus,
    ThresholdConfig,
};
use veridoc_engine::{
    ContractRegistry, CreateTaskRequest, Decision, ScoringService, SettlementResolver,
    SubmissionCollector, TaskLifecycleManager,
};
use veridoc_store::{MemoryStore, MirrorStore};

const CHAIN_ID: u64 = 31337;
const DOC: &str = "ipfs://bafybeigdyrzt5sfp7udm7hu76uh7y26nf3efuylqabf3oclgtqy55fbzdi";

fn wallet(n: u64) -> anyhow::Result<Address> {
    Ok(Address::parse(&format!("0x{n:040x}"))?)
}

pub async fn run(validators: u32, reward: u128, bonus: u128, score: f64) -> anyhow::Result<()> {
    let chain = Arc::new(SimChain::new(CHAIN_ID));
    let store = Arc::new(MemoryStore::new());

    let issuer_wallet = wallet(1)?;
    let issuer = SigningContext::new(issuer_wallet.clone(), CHAIN_ID);
    chain.fund(&issuer_wallet, parse_amount("10.0")?)?;

    let deployed = chain.deploy_contract(bonus, 250)?;
    println!("deployed bounty contract at {deployed}");

    store
        .insert_claim(Claim {
            claim_id: "clm-demo".into(),
            patient_id: "pat-demo".into(),
            insurance_id: "ins-demo".into(),
            document_locator: DOC.into(),
            verified: false,
            status: ClaimStatus::Pending,
            issuer_id: Some("issuer-demo".into()),
            created_at: Utc::now(),
        })
        .await?;

    let scoring = ScoringService::new(store.clone());
    scoring.record_score("clm-demo", score).await?;
    let bucket = scoring
        .bucket_for_claim("clm-demo", &ThresholdConfig::default())
        .await?;
    println!("score {score} routes to bucket: {}", bucket.as_str());
    if bucket != Bucket::Manual {
        println!("nothing to validate, stopping here");
        return Ok(());
    }

    let registry = ContractRegistry::new(store.clone());
    let contract = registry
        .resolve_or_register(&issuer_wallet, "issuer-demo", Some(deployed))
        .await?;

    let manager = TaskLifecycleManager::new(store.clone(), chain.clone());
    let task = manager
        .create_task(
            &issuer,
            CreateTaskRequest {
                claim_id: "clm-demo".into(),
                contract_address: contract.clone(),
                document_locator: DOC.into(),
                required_validators: validators,
                issuer_wallet: issuer_wallet.clone(),
                reward_amount: reward,
                issuer_bonus: bonus,
            },
        )
        .await?;
    println!(
        "task {} created, escrowed {} ({} reward + {} bonus), tx {}",
        task.task_id,
        format_amount(escrow_total(reward, bonus)?),
        format_amount(reward),
        format_amount(bonus),
        task.creation_tx
    );

    let collector = SubmissionCollector::new(store.clone(), chain.clone());
    for i in 0..validators {
        let validator_wallet = wallet(100 + u64::from(i))?;
        chain.fund(&validator_wallet, parse_amount("1.0")?)?;
        collector
            .submit_result(
                &SigningContext::new(validator_wallet, CHAIN_ID),
                task.task_id,
                &format!("val-{i}"),
                DOC,
            )
            .await?;
        let (current, required) = manager
            .submission_progress(&contract, task.task_id)
            .await?;
        println!("submission {current}/{required} recorded");
    }

    let resolver = SettlementResolver::new(store.clone(), chain.clone());
    for outcome in resolver
        .bulk_resolve(&["clm-demo".into()], Decision::Approve)
        .await?
    {
        println!("settlement outcome: {outcome:?}");
    }

    for submission in resolver.audit_trail("clm-demo").await? {
        let balance = chain.balance(&submission.wallet).await?;
        println!(
            "validator {} submitted at tx {}, wallet balance now {}",
            submission.validator_id,
            submission.tx_hash,
            format_amount(balance)
        );
    }
    Ok(())
}
