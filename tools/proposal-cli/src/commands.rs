//! Command handlers

use anyhow::{bail, Context, Result};
use governance::history::word_to_hex;
use governance::{ProposalParams, SlotOwnership, VoteChoice};
use serde::Serialize;
use std::fmt::Write as _;

use crate::store::{self, CliConfig, Engine};
use crate::{Choice, Cli, Commands, Outcome};

impl From<Choice> for VoteChoice {
    fn from(choice: Choice) -> Self {
        match choice {
            Choice::Yes => VoteChoice::Yes,
            Choice::No => VoteChoice::No,
        }
    }
}

/// Run one command, returning what should be printed
pub fn run(cli: &Cli) -> Result<String> {
    let now = match cli.now {
        Some(now) => now,
        None => u64::try_from(chrono::Utc::now().timestamp())
            .context("System clock is before the unix epoch")?,
    };

    if let Commands::Init { treasury, force } = &cli.command {
        let config = CliConfig::load(&cli.config)?;
        let treasury = treasury.unwrap_or(config.genesis_treasury);
        store::init_state(&cli.state, config.governance, treasury, *force)?;
        return Ok(format!(
            "Initialised {} with treasury balance {}",
            cli.state.display(),
            treasury
        ));
    }

    let mut engine = store::load_state(&cli.state)?;
    let (output, changed) = execute(&mut engine, &cli.command, now)?;
    if changed {
        store::save_state(&engine, &cli.state)?;
    }
    Ok(output)
}

/// Apply a command to a loaded engine; the flag tells whether state changed
fn execute(engine: &mut Engine, command: &Commands, now: u64) -> Result<(String, bool)> {
    let output = match command {
        Commands::Init { .. } => bail!("State is already initialised"),

        Commands::AssignSlots { owner, slot, all } => {
            if *all {
                let num_slots = engine.config().num_slots;
                engine.slots_mut().assign_all(num_slots, owner);
                format!("Assigned all {} slots to {}", num_slots, owner)
            } else {
                let slot = slot.context("Either --slot or --all is required")?;
                engine.slots_mut().assign(slot, owner.as_str());
                format!("Assigned slot {} to {}", slot, owner)
            }
        }

        Commands::Create {
            beneficiary,
            title,
            documents_link,
            documents_hash,
            period_length,
            periods,
            per_period,
        } => {
            let documents_hash = hex::decode(documents_hash.trim_start_matches("0x"))
                .context("Document hash is not valid hex")?;
            let params = ProposalParams {
                beneficiary: beneficiary.clone(),
                title: title.clone(),
                documents_link: documents_link.clone(),
                documents_hash,
                budget_period_length: *period_length,
                num_periods: *periods,
                budget_per_period: *per_period,
            };
            let id = engine
                .create_proposal(params, now)
                .context("Failed to create proposal")?;
            format!(
                "Created proposal {} ({} unpaid ballot slots, escrow {})",
                id,
                engine.unpaid_slots(id)?,
                engine.escrow_balance(id)
            )
        }

        Commands::PayGas { id, slots } => {
            let count = match slots {
                Some(count) => *count,
                None => engine.unpaid_slots(*id)?,
            };
            let unpaid = engine
                .pay_for_gas(*id, count)
                .with_context(|| format!("Failed to pay gas for ballot {}", id))?;
            format!(
                "Paid gas for {} slots of ballot {}, {} unpaid ({:?})",
                count,
                id,
                unpaid,
                engine.ballot(*id)?.state()
            )
        }

        Commands::Vote {
            id,
            slot,
            caller,
            choice,
        } => {
            engine
                .cast_vote(*id, caller, *slot, (*choice).into(), now)
                .with_context(|| format!("Failed to vote on proposal {}", id))?;
            format!(
                "Slot {} voted {:?} on proposal {}, vote difference {}%",
                slot,
                choice,
                id,
                engine.vote_difference(*id)?
            )
        }

        Commands::VoteUntil {
            id,
            caller,
            outcome,
        } => {
            let cast = match outcome {
                Outcome::Approval => engine.cast_votes_for_approval(*id, caller, now),
                Outcome::Rejection => engine.cast_votes_for_rejection(*id, caller, now),
            }
            .with_context(|| format!("Failed to vote on proposal {}", id))?;
            format!(
                "Cast {} votes on proposal {}, vote difference {}%",
                cast,
                id,
                engine.vote_difference(*id)?
            )
        }

        Commands::Update { id } => {
            let state = engine
                .update_proposal_state(*id, now)
                .with_context(|| format!("Failed to update proposal {}", id))?;
            format!("Proposal {} is {:?}", id, state)
        }

        Commands::Claim { id, caller, amount } => {
            let receipt = engine
                .claim_reward(*id, caller, *amount, now)
                .with_context(|| format!("Failed to claim from proposal {}", id))?;
            format!(
                "Claimed {} from proposal {} ({} forfeited, {} missed periods, {} periods left, {:?})",
                receipt.claimed,
                id,
                receipt.forfeited,
                receipt.missed_periods,
                receipt.remaining_periods,
                receipt.state
            )
        }

        Commands::Show { id } => return Ok((show(engine, *id)?, false)),

        Commands::Balance { account } => {
            return Ok((format!("{}: {}", account, engine.balance(account)), false))
        }

        Commands::List => return Ok((list(engine), false)),
    };
    Ok((output, true))
}

#[derive(Serialize)]
struct ProposalView<'a> {
    id: u64,
    beneficiary: &'a str,
    title: &'a str,
    documents_link: &'a str,
    documents_hash: String,
    state: String,
    created_at: String,
    initial_period_end: String,
    contest_period_end: String,
    remaining_periods: u32,
    budget_per_period: u64,
    next_claim_date: String,
    escrow: u64,
    ballot_state: String,
    unpaid_slots: u32,
    yes_votes: u32,
    no_votes: u32,
    vote_difference: i64,
    history: Vec<i64>,
    history_start_idx: u32,
    history_words: Vec<String>,
}

fn show(engine: &Engine, id: u64) -> Result<String> {
    let proposal = engine.proposal(id)?;
    let ballot = engine.ballot(id)?;
    let history = &proposal.history;

    let view = ProposalView {
        id,
        beneficiary: &proposal.beneficiary,
        title: &proposal.title,
        documents_link: &proposal.documents_link,
        documents_hash: hex::encode(&proposal.documents_hash),
        state: format!("{:?}", proposal.state),
        created_at: format_time(proposal.created_at),
        initial_period_end: format_time(proposal.initial_period_end),
        contest_period_end: format_time(proposal.contest_period_end),
        remaining_periods: proposal.remaining_periods(),
        budget_per_period: proposal.budget.budget_per_period,
        next_claim_date: format_time(proposal.budget.next_claim_date),
        escrow: engine.escrow_balance(id),
        ballot_state: format!("{:?}", ballot.state()),
        unpaid_slots: ballot.unpaid_slots(),
        yes_votes: ballot.vote_count(VoteChoice::Yes),
        no_votes: ballot.vote_count(VoteChoice::No),
        vote_difference: ballot.vote_difference(),
        history: history.differences().collect(),
        history_start_idx: history.start_idx(),
        history_words: history.words().iter().map(word_to_hex).collect(),
    };
    Ok(serde_json::to_string_pretty(&view)?)
}

fn list(engine: &Engine) -> String {
    let mut out = String::new();
    for id in engine.proposal_ids() {
        let (Ok(proposal), Ok(difference)) = (engine.proposal(id), engine.vote_difference(id))
        else {
            continue;
        };
        let _ = writeln!(
            out,
            "{:>5}  {:<10} {:>+4}%  escrow {:<10} {}  {}",
            id,
            format!("{:?}", proposal.state),
            difference,
            engine.escrow_balance(id),
            proposal.beneficiary,
            proposal.title
        );
    }
    let _ = write!(out, "Treasury: {}", engine.treasury_balance());
    let holders: Vec<String> = engine
        .ledger()
        .holders()
        .map(|(name, balance)| format!("{} {}", name, balance))
        .collect();
    if !holders.is_empty() {
        let _ = write!(out, "\nHolders: {}", holders.join(", "));
    }
    let owners = (0..engine.config().num_slots)
        .filter(|slot| engine.slots().owner_of(*slot).is_some())
        .count();
    let _ = write!(out, "\nAssigned slots: {}/{}", owners, engine.config().num_slots);
    out
}

fn format_time(secs: u64) -> String {
    i64::try_from(secs)
        .ok()
        .and_then(|secs| chrono::DateTime::from_timestamp(secs, 0))
        .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| secs.to_string())
}
