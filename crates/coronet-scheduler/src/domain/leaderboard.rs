//! Leaderboard rules as pure functions over proposal snapshots.
//!
//! Everything here is synchronous and side-effect free; the service fetches
//! a snapshot, asks these functions what changed, and writes the answers
//! back through its store port.

use shared_types::{BlockHeight, Proposal, ProposalId, ProposalStatus};

/// Active proposals that waited too long without being crowned.
///
/// The boundary is inclusive: with a window of 5, a proposal created at
/// block 10 survives through block 14 and goes stale at block 15.
pub fn stale_actives<'a>(
    proposals: &'a [Proposal],
    height: BlockHeight,
    expire_after_blocks: u64,
) -> Vec<&'a Proposal> {
    proposals
        .iter()
        .filter(|p| p.status == ProposalStatus::Active)
        .filter(|p| height.saturating_sub(p.creation_block) >= expire_after_blocks)
        .collect()
}

/// The top-voted proposal among those still contending.
///
/// Ties break toward the lowest proposal id, so selection is deterministic
/// across ticks and store backends. Returns `None` when nobody contends or
/// the top candidate falls short of `min_votes_to_lead`.
pub fn select_contender(proposals: &[Proposal], min_votes_to_lead: u64) -> Option<&Proposal> {
    let top = proposals
        .iter()
        .filter(|p| p.status.is_contending())
        .max_by_key(|p| (p.total_votes, std::cmp::Reverse(p.id)))?;

    if top.total_votes < min_votes_to_lead {
        return None;
    }
    Some(top)
}

/// Current leaders that lost the top spot to `winner`.
///
/// Leadership is a one-shot trial: these are eliminated, not returned to
/// open contention.
pub fn losing_leaders(proposals: &[Proposal], winner: ProposalId) -> Vec<&Proposal> {
    proposals
        .iter()
        .filter(|p| p.status == ProposalStatus::Leader && p.id != winner)
        .collect()
}

/// Whether a leader has held the top spot long enough to commit.
///
/// `blocks_as_leader` counts inclusively, so a threshold of 2 with
/// `leader_start_block = 100` first passes at height 101.
pub fn has_survived(proposal: &Proposal, height: BlockHeight) -> bool {
    match proposal.blocks_as_leader(height) {
        Some(blocks) => blocks >= u64::from(proposal.leaderboard_min_blocks),
        None => false,
    }
}
