//! Gas schedule for the DPOS precompile.
//!
//! Every method carries a flat base cost. Batched getters additionally
//! charge [`DPOS_BATCH_GET_METHODS_GAS`] per item actually returned, and
//! `claimAllRewards` charges [`CLAIM_ALL_PER_DELEGATION`] per delegation it
//! settles, so the cost of a call tracks the amount of state it touches.

use crate::abi::IDpos;
use alloy_sol_types::SolCall;

/// Gas cost for registerValidator.
pub const REGISTER_VALIDATOR: u64 = 80_000;

/// Gas cost for delegate.
pub const DELEGATE: u64 = 40_000;

/// Gas cost for undelegate (v1 and v2).
pub const UNDELEGATE: u64 = 60_000;

/// Gas cost for confirmUndelegate (v1 and v2).
pub const CONFIRM_UNDELEGATE: u64 = 60_000;

/// Gas cost for cancelUndelegate (v1 and v2).
pub const CANCEL_UNDELEGATE: u64 = 60_000;

/// Gas cost for reDelegate.
pub const REDELEGATE: u64 = 80_000;

/// Gas cost for claimRewards, and the base cost for claimAllRewards.
pub const CLAIM_REWARDS: u64 = 40_000;

/// Extra gas per settled delegation in claimAllRewards.
pub const CLAIM_ALL_PER_DELEGATION: u64 = 20_000;

/// Gas cost for claimCommissionRewards.
pub const CLAIM_COMMISSION_REWARDS: u64 = 20_000;

/// Gas cost for setCommission.
pub const SET_COMMISSION: u64 = 20_000;

/// Gas cost for setValidatorInfo.
pub const SET_VALIDATOR_INFO: u64 = 20_000;

/// Base gas cost for every getter.
pub const DPOS_GET_METHODS_GAS: u64 = 5_000;

/// Extra gas per item returned by a batched getter.
pub const DPOS_BATCH_GET_METHODS_GAS: u64 = 5_000;

/// Page size of the batched getters, items per batch.
pub const DPOS_GET_METHODS_MAX_RETURN: u64 = 20;

/// Base gas cost for a method selector, `None` for unknown selectors.
///
/// The base cost is also what a reverted call consumes, and what a call
/// must at least bring as its gas limit to be dispatched at all.
pub fn base_cost(selector: [u8; 4]) -> Option<u64> {
    let cost = match selector {
        IDpos::registerValidatorCall::SELECTOR => REGISTER_VALIDATOR,
        IDpos::delegateCall::SELECTOR => DELEGATE,
        IDpos::undelegateCall::SELECTOR | IDpos::undelegateV2Call::SELECTOR => UNDELEGATE,
        IDpos::confirmUndelegateCall::SELECTOR | IDpos::confirmUndelegateV2Call::SELECTOR => {
            CONFIRM_UNDELEGATE
        }
        IDpos::cancelUndelegateCall::SELECTOR | IDpos::cancelUndelegateV2Call::SELECTOR => {
            CANCEL_UNDELEGATE
        }
        IDpos::reDelegateCall::SELECTOR => REDELEGATE,
        IDpos::claimRewardsCall::SELECTOR | IDpos::claimAllRewardsCall::SELECTOR => CLAIM_REWARDS,
        IDpos::claimCommissionRewardsCall::SELECTOR => CLAIM_COMMISSION_REWARDS,
        IDpos::setCommissionCall::SELECTOR => SET_COMMISSION,
        IDpos::setValidatorInfoCall::SELECTOR => SET_VALIDATOR_INFO,
        IDpos::isValidatorEligibleCall::SELECTOR
        | IDpos::getTotalEligibleVotesCountCall::SELECTOR
        | IDpos::getValidatorEligibleVotesCountCall::SELECTOR
        | IDpos::getValidatorCall::SELECTOR
        | IDpos::getValidatorsCall::SELECTOR
        | IDpos::getValidatorsForCall::SELECTOR
        | IDpos::getTotalDelegationCall::SELECTOR
        | IDpos::getDelegationsCall::SELECTOR
        | IDpos::getUndelegationsCall::SELECTOR
        | IDpos::getUndelegationsV2Call::SELECTOR
        | IDpos::getUndelegationV2Call::SELECTOR => DPOS_GET_METHODS_GAS,
        _ => return None,
    };
    Some(cost)
}
