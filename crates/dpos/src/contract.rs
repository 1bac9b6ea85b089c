//! The DPOS precompiled contract.
//!
//! [`DposContract`] is the engine-facing entry point. Calls addressed to
//! [`DPOS_CONTRACT_ADDRESS`] are routed into [`DposContract::run`], which
//! decodes the selector, charges gas, dispatches to the method handler and
//! packages the result (or revert) into a [`CallOutput`]. The engine is
//! expected to move any attached value to the contract account before
//! invoking `run` and to discard state writes when the call reverts or
//! fails; handlers additionally order every method as validate-then-write,
//! so a revert never leaves partial writes behind.
//!
//! Besides the ABI surface the contract exposes two consensus hooks:
//! [`DposContract::apply_genesis`] installs the initial validator set and
//! [`DposContract::distribute_rewards`] mints and books block rewards from
//! the consensus-supplied participation statistics.

use std::sync::Arc;

use alloy_primitives::{address, Address, Bytes, U256};
use alloy_sol_types::{Revert, SolCall, SolError, SolEvent};
use lattice_metrics::dpos::{
    DPOS_DELEGATIONS, DPOS_REWARDS_CLAIMED, DPOS_REWARD_DISTRIBUTIONS, DPOS_TOTAL_STAKE,
    DPOS_UNDELEGATIONS, DPOS_VALIDATORS_DELETED, DPOS_VALIDATORS_REGISTERED,
};
use lattice_storage::{BalanceLedger, StateStore};
use lattice_types::{DposConfig, RewardsStats, MAX_COMMISSION};

use crate::abi::{self, IDpos};
use crate::delegations::{Delegation, DelegationRegistry, REWARDS_PER_STAKE_PRECISION};
use crate::error::{DposError, Result};
use crate::events::LogEntry;
use crate::gas;
use crate::proof::check_registration_proof;
use crate::reader::DposReader;
use crate::rewards::{author_reward, commission_split, split_block_reward};
use crate::storage::{Aggregates, KeyedStorage};
use crate::undelegations::{UndelegationRegistry, UndelegationV1};
use crate::validators::{
    Validator, ValidatorInfo, ValidatorRegistry, MAX_DESCRIPTION_LENGTH, MAX_ENDPOINT_LENGTH,
    VRF_KEY_LENGTH,
};
use crate::yield_curve;

/// Address the DPOS precompile is mounted at.
pub const DPOS_CONTRACT_ADDRESS: Address =
    address!("0000000000000000000000000000000000000100");

/// Page size shared by all batch getters.
const GETTER_PAGE: u32 = gas::DPOS_GET_METHODS_MAX_RETURN as u32;

/// Result of a contract call, as handed back to the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallOutput {
    /// Gas consumed by the call.
    pub gas_used: u64,
    /// ABI-encoded return data, or the encoded revert reason.
    pub bytes: Bytes,
    /// Event logs emitted by the call. Empty on revert.
    pub logs: Vec<LogEntry>,
    /// Whether the call reverted.
    pub reverted: bool,
}

impl CallOutput {
    fn revert(gas_used: u64, reason: &DposError) -> Self {
        let revert = Revert::from(reason.to_string());
        Self {
            gas_used,
            bytes: revert.abi_encode().into(),
            logs: Vec::new(),
            reverted: true,
        }
    }
}

/// Per-call execution context.
#[derive(Debug, Clone, Copy)]
struct CallContext {
    caller: Address,
    value: U256,
    block: u64,
}

/// Which undelegation scheme a withdrawal request goes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UndelegateVersion {
    V1,
    V2,
}

/// The delegated-proof-of-stake registry contract.
///
/// Generic over the state backend `S` and the balance ledger `L` so the
/// engine can plug its trie-backed state in while tests run on the
/// in-memory implementations.
pub struct DposContract<S, L> {
    config: DposConfig,
    validators: ValidatorRegistry<S>,
    delegations: DelegationRegistry<S>,
    undelegations: UndelegationRegistry<S>,
    aggregates: Aggregates<S>,
    reader: DposReader<S>,
    ledger: Arc<L>,
}

impl<S: StateStore, L: BalanceLedger> DposContract<S, L> {
    /// Build the contract over the live state `store` and the balance
    /// `ledger`. `delayed_store` must resolve reads `delegation_delay`
    /// blocks behind the head; the eligibility getters answer from it.
    pub fn new(
        config: DposConfig,
        store: Arc<S>,
        delayed_store: Arc<S>,
        ledger: Arc<L>,
    ) -> Self {
        let storage = KeyedStorage::new(DPOS_CONTRACT_ADDRESS, store);
        Self {
            validators: ValidatorRegistry::new(storage.clone()),
            delegations: DelegationRegistry::new(storage.clone()),
            undelegations: UndelegationRegistry::new(storage.clone()),
            aggregates: Aggregates::new(storage),
            reader: DposReader::new(config.clone(), delayed_store),
            config,
            ledger,
        }
    }

    /// The delayed-state eligibility reader, shared with consensus.
    pub fn reader(&self) -> &DposReader<S> {
        &self.reader
    }

    /// The chain configuration the contract was built with.
    pub fn config(&self) -> &DposConfig {
        &self.config
    }

    /// Install the genesis validator set and its initial delegations.
    ///
    /// Genesis entries are trusted: no registration proofs are checked and
    /// no events are emitted. The contract account is credited with the
    /// total delegated amount so later undelegations can pay out.
    pub fn apply_genesis(&self) -> Result<()> {
        self.config
            .validate()
            .map_err(|e| DposError::Config(e.to_string()))?;

        let mut total_delegated = U256::ZERO;
        let mut total_votes = 0u64;
        for genesis in &self.config.initial_validators {
            let mut validator = Validator::new(genesis.commission, 0);
            let info = ValidatorInfo {
                owner: genesis.owner,
                vrf_key: genesis.vrf_key.clone(),
                description: genesis.description.clone(),
                endpoint: genesis.endpoint.clone(),
            };
            for (delegator, amount) in &genesis.delegations {
                let delegation = Delegation::new(*amount, &validator, 0);
                self.delegations
                    .create_delegation(delegator, &genesis.address, &delegation)?;
                validator.total_stake += *amount;
                total_delegated += *amount;
            }
            total_votes += self.config.eligible_vote_count(&validator.total_stake);
            self.validators
                .create_validator(&genesis.address, &validator, &info)?;
        }

        self.aggregates.set_total_delegated(&total_delegated)?;
        self.aggregates.set_total_eligible_votes(total_votes)?;
        self.ledger
            .add_balance(&DPOS_CONTRACT_ADDRESS, total_delegated)?;

        DPOS_TOTAL_STAKE.set(total_delegated.to::<u128>() as f64);
        tracing::info!(
            validators = self.config.initial_validators.len(),
            total_stake = %total_delegated,
            "applied dpos genesis state"
        );
        Ok(())
    }

    /// Execute a call addressed to the contract.
    ///
    /// Recoverable rejections come back as a reverted [`CallOutput`]
    /// carrying the ABI-encoded reason and the method's base gas. Unknown
    /// selectors, malformed calldata, gas exhaustion and storage failures
    /// are returned as errors and abort the call entirely.
    pub fn run(
        &self,
        input: &[u8],
        gas_limit: u64,
        caller: Address,
        value: U256,
        block: u64,
    ) -> Result<CallOutput> {
        let Some(selector_bytes) = input.get(..4) else {
            return Err(DposError::unknown_method(input));
        };
        let mut selector = [0u8; 4];
        selector.copy_from_slice(selector_bytes);

        let Some(base_gas) = gas::base_cost(selector) else {
            return Err(DposError::unknown_method(&selector));
        };
        if gas_limit < base_gas {
            return Err(DposError::OutOfGas);
        }
        if !value.is_zero() && !abi::is_payable(selector) {
            return Ok(CallOutput::revert(base_gas, &DposError::NonPayableMethod));
        }

        let ctx = CallContext {
            caller,
            value,
            block,
        };
        let mut logs = Vec::new();
        match self.dispatch(selector, input, &ctx, &mut logs) {
            Ok((gas_used, bytes)) => {
                if gas_limit < gas_used {
                    return Err(DposError::OutOfGas);
                }
                Ok(CallOutput {
                    gas_used,
                    bytes,
                    logs,
                    reverted: false,
                })
            }
            Err(err) if err.is_recoverable() => {
                tracing::debug!(%err, %caller, block, "dpos call reverted");
                Ok(CallOutput::revert(base_gas, &err))
            }
            Err(err) => Err(err),
        }
    }

    fn dispatch(
        &self,
        selector: [u8; 4],
        input: &[u8],
        ctx: &CallContext,
        logs: &mut Vec<LogEntry>,
    ) -> Result<(u64, Bytes)> {
        match selector {
            IDpos::registerValidatorCall::SELECTOR => self
                .register_validator(ctx, logs, decode(input)?)
                .map(|bytes| (gas::REGISTER_VALIDATOR, bytes)),
            IDpos::delegateCall::SELECTOR => self
                .delegate(ctx, logs, decode(input)?)
                .map(|bytes| (gas::DELEGATE, bytes)),
            IDpos::undelegateCall::SELECTOR => self
                .undelegate(ctx, logs, decode(input)?)
                .map(|bytes| (gas::UNDELEGATE, bytes)),
            IDpos::undelegateV2Call::SELECTOR => self
                .undelegate_v2(ctx, logs, decode(input)?)
                .map(|bytes| (gas::UNDELEGATE, bytes)),
            IDpos::confirmUndelegateCall::SELECTOR => self
                .confirm_undelegate(ctx, logs, decode(input)?)
                .map(|bytes| (gas::CONFIRM_UNDELEGATE, bytes)),
            IDpos::confirmUndelegateV2Call::SELECTOR => self
                .confirm_undelegate_v2(ctx, logs, decode(input)?)
                .map(|bytes| (gas::CONFIRM_UNDELEGATE, bytes)),
            IDpos::cancelUndelegateCall::SELECTOR => self
                .cancel_undelegate(ctx, logs, decode(input)?)
                .map(|bytes| (gas::CANCEL_UNDELEGATE, bytes)),
            IDpos::cancelUndelegateV2Call::SELECTOR => self
                .cancel_undelegate_v2(ctx, logs, decode(input)?)
                .map(|bytes| (gas::CANCEL_UNDELEGATE, bytes)),
            IDpos::reDelegateCall::SELECTOR => self
                .re_delegate(ctx, logs, decode(input)?)
                .map(|bytes| (gas::REDELEGATE, bytes)),
            IDpos::claimRewardsCall::SELECTOR => self
                .claim_rewards(ctx, logs, decode(input)?)
                .map(|bytes| (gas::CLAIM_REWARDS, bytes)),
            IDpos::claimAllRewardsCall::SELECTOR => {
                decode::<IDpos::claimAllRewardsCall>(input)?;
                self.claim_all_rewards(ctx, logs)
            }
            IDpos::claimCommissionRewardsCall::SELECTOR => self
                .claim_commission_rewards(ctx, logs, decode(input)?)
                .map(|bytes| (gas::CLAIM_COMMISSION_REWARDS, bytes)),
            IDpos::setValidatorInfoCall::SELECTOR => self
                .set_validator_info(ctx, logs, decode(input)?)
                .map(|bytes| (gas::SET_VALIDATOR_INFO, bytes)),
            IDpos::setCommissionCall::SELECTOR => self
                .set_commission(ctx, logs, decode(input)?)
                .map(|bytes| (gas::SET_COMMISSION, bytes)),
            IDpos::isValidatorEligibleCall::SELECTOR => {
                let call = decode::<IDpos::isValidatorEligibleCall>(input)?;
                let eligible = self.reader.is_eligible(&call.validator)?;
                let out = IDpos::isValidatorEligibleCall::abi_encode_returns(&(eligible,));
                Ok((gas::DPOS_GET_METHODS_GAS, out.into()))
            }
            IDpos::getTotalEligibleVotesCountCall::SELECTOR => {
                decode::<IDpos::getTotalEligibleVotesCountCall>(input)?;
                let votes = self.reader.total_eligible_votes_count()?;
                let out = IDpos::getTotalEligibleVotesCountCall::abi_encode_returns(&(votes,));
                Ok((gas::DPOS_GET_METHODS_GAS, out.into()))
            }
            IDpos::getValidatorEligibleVotesCountCall::SELECTOR => {
                let call = decode::<IDpos::getValidatorEligibleVotesCountCall>(input)?;
                let votes = self.reader.get_eligible_votes_count(&call.validator)?;
                let out =
                    IDpos::getValidatorEligibleVotesCountCall::abi_encode_returns(&(votes,));
                Ok((gas::DPOS_GET_METHODS_GAS, out.into()))
            }
            IDpos::getValidatorCall::SELECTOR => self.get_validator(decode(input)?),
            IDpos::getValidatorsCall::SELECTOR => self.get_validators(decode(input)?),
            IDpos::getValidatorsForCall::SELECTOR => self.get_validators_for(decode(input)?),
            IDpos::getTotalDelegationCall::SELECTOR => self.get_total_delegation(decode(input)?),
            IDpos::getDelegationsCall::SELECTOR => self.get_delegations(decode(input)?),
            IDpos::getUndelegationsCall::SELECTOR => self.get_undelegations(decode(input)?),
            IDpos::getUndelegationsV2Call::SELECTOR => self.get_undelegations_v2(decode(input)?),
            IDpos::getUndelegationV2Call::SELECTOR => self.get_undelegation_v2(decode(input)?),
            _ => Err(DposError::unknown_method(&selector)),
        }
    }

    // ========================================================================
    // State-changing methods
    // ========================================================================

    fn register_validator(
        &self,
        ctx: &CallContext,
        logs: &mut Vec<LogEntry>,
        call: IDpos::registerValidatorCall,
    ) -> Result<Bytes> {
        if self.validators.validator_exists(&call.validator)? {
            return Err(DposError::ExistentValidator);
        }
        check_registration_proof(&ctx.caller, &call.validator, &call.proof)?;
        if call.vrf_key.len() != VRF_KEY_LENGTH {
            return Err(DposError::WrongVrfKey);
        }
        if call.commission > MAX_COMMISSION {
            return Err(DposError::CommissionOverflow);
        }
        if call.description.len() > MAX_DESCRIPTION_LENGTH {
            return Err(DposError::MaxDescriptionLengthExceeded);
        }
        if call.endpoint.len() > MAX_ENDPOINT_LENGTH {
            return Err(DposError::MaxEndpointLengthExceeded);
        }
        if ctx.value < self.config.minimum_deposit {
            return Err(DposError::InsufficientDelegation);
        }
        if ctx.value > self.config.validator_maximum_stake {
            return Err(DposError::ValidatorsMaxStakeExceeded);
        }

        let mut validator = Validator::new(call.commission, ctx.block);
        let info = ValidatorInfo {
            owner: ctx.caller,
            vrf_key: call.vrf_key,
            description: call.description,
            endpoint: call.endpoint,
        };
        self.change_validator_stake(&mut validator, ctx.value)?;
        self.validators
            .create_validator(&call.validator, &validator, &info)?;
        let delegation = Delegation::new(ctx.value, &validator, ctx.block);
        self.delegations
            .create_delegation(&ctx.caller, &call.validator, &delegation)?;

        DPOS_VALIDATORS_REGISTERED.inc();
        DPOS_DELEGATIONS.inc();
        emit(logs, &IDpos::ValidatorRegistered {
            validator: call.validator,
        });
        emit(logs, &IDpos::Delegated {
            delegator: ctx.caller,
            validator: call.validator,
            amount: ctx.value,
        });
        tracing::debug!(
            validator = %call.validator,
            owner = %ctx.caller,
            stake = %ctx.value,
            "validator registered"
        );
        Ok(Bytes::new())
    }

    fn delegate(
        &self,
        ctx: &CallContext,
        logs: &mut Vec<LogEntry>,
        call: IDpos::delegateCall,
    ) -> Result<Bytes> {
        let Some(mut validator) = self.validators.get_validator(&call.validator)? else {
            return Err(DposError::NonExistentValidator);
        };
        if validator.total_stake + ctx.value > self.config.validator_maximum_stake {
            return Err(DposError::ValidatorsMaxStakeExceeded);
        }
        match self.delegations.get_delegation(&ctx.caller, &call.validator)? {
            Some(mut delegation) => {
                delegation.settle(&validator, ctx.block);
                delegation.stake += ctx.value;
                self.delegations
                    .modify_delegation(&ctx.caller, &call.validator, &delegation)?;
            }
            None => {
                if ctx.value < self.config.minimum_deposit {
                    return Err(DposError::InsufficientDelegation);
                }
                let delegation = Delegation::new(ctx.value, &validator, ctx.block);
                self.delegations
                    .create_delegation(&ctx.caller, &call.validator, &delegation)?;
            }
        }
        let new_stake = validator.total_stake + ctx.value;
        self.change_validator_stake(&mut validator, new_stake)?;
        self.validators.modify_validator(&call.validator, &validator)?;

        DPOS_DELEGATIONS.inc();
        emit(logs, &IDpos::Delegated {
            delegator: ctx.caller,
            validator: call.validator,
            amount: ctx.value,
        });
        Ok(Bytes::new())
    }

    fn undelegate(
        &self,
        ctx: &CallContext,
        logs: &mut Vec<LogEntry>,
        call: IDpos::undelegateCall,
    ) -> Result<Bytes> {
        if self.config.hardforks.is_cornus_hardfork(ctx.block) {
            return Err(DposError::MethodNotSupported);
        }
        self.undelegate_stake(ctx, logs, &call.validator, call.amount, UndelegateVersion::V1)?;
        emit(logs, &IDpos::Undelegated {
            delegator: ctx.caller,
            validator: call.validator,
            amount: call.amount,
        });
        Ok(Bytes::new())
    }

    fn undelegate_v2(
        &self,
        ctx: &CallContext,
        logs: &mut Vec<LogEntry>,
        call: IDpos::undelegateV2Call,
    ) -> Result<Bytes> {
        if !self.config.hardforks.is_cornus_hardfork(ctx.block) {
            return Err(DposError::MethodNotSupported);
        }
        let undelegation_id = self.undelegate_stake(
            ctx,
            logs,
            &call.validator,
            call.amount,
            UndelegateVersion::V2,
        )?;
        emit(logs, &IDpos::UndelegatedV2 {
            delegator: ctx.caller,
            validator: call.validator,
            undelegation_id,
            amount: call.amount,
        });
        Ok(IDpos::undelegateV2Call::abi_encode_returns(&(undelegation_id,)).into())
    }

    /// Common withdrawal path for both undelegation schemes.
    ///
    /// Returns the freshly assigned undelegation id for
    /// [`UndelegateVersion::V2`] requests; v1 requests are keyed by the
    /// validator address and return zero.
    fn undelegate_stake(
        &self,
        ctx: &CallContext,
        logs: &mut Vec<LogEntry>,
        validator_address: &Address,
        amount: U256,
        version: UndelegateVersion,
    ) -> Result<u64> {
        let Some(mut delegation) =
            self.delegations.get_delegation(&ctx.caller, validator_address)?
        else {
            return Err(DposError::NonExistentDelegation);
        };
        if amount > delegation.stake {
            return Err(DposError::InsufficientDelegation);
        }
        let remaining = delegation.stake - amount;
        if !remaining.is_zero() && remaining < self.config.minimum_deposit {
            return Err(DposError::InsufficientDelegation);
        }
        if version == UndelegateVersion::V1
            && self
                .undelegations
                .undelegation_v1_exists(&ctx.caller, validator_address)?
        {
            return Err(DposError::ExistentUndelegation);
        }

        let mut validator = self.expect_validator(validator_address)?;
        delegation.settle(&validator, ctx.block);
        delegation.stake = remaining;

        let unlock_block = ctx.block + u64::from(self.locking_period(ctx.block));
        let undelegation_id = match version {
            UndelegateVersion::V1 => {
                let undelegation = UndelegationV1 {
                    amount,
                    block: unlock_block,
                };
                self.undelegations
                    .create_undelegation_v1(&ctx.caller, validator_address, &undelegation)?;
                0
            }
            UndelegateVersion::V2 => self.undelegations.create_undelegation_v2(
                &ctx.caller,
                validator_address,
                amount,
                unlock_block,
            )?,
        };
        validator.undelegations_count += 1;

        self.store_or_close_delegation(ctx, logs, validator_address, &delegation)?;
        let new_stake = validator.total_stake - amount;
        self.change_validator_stake(&mut validator, new_stake)?;
        self.save_or_delete_validator(validator_address, &validator, ctx.block)?;

        DPOS_UNDELEGATIONS.inc();
        Ok(undelegation_id)
    }

    fn confirm_undelegate(
        &self,
        ctx: &CallContext,
        logs: &mut Vec<LogEntry>,
        call: IDpos::confirmUndelegateCall,
    ) -> Result<Bytes> {
        let Some(undelegation) = self
            .undelegations
            .get_undelegation_v1(&ctx.caller, &call.validator)?
        else {
            return Err(DposError::NonExistentUndelegation);
        };
        if ctx.block < undelegation.block {
            return Err(DposError::LockedUndelegation);
        }
        self.undelegations
            .remove_undelegation_v1(&ctx.caller, &call.validator)?;
        self.release_undelegation(ctx, &call.validator, undelegation.amount)?;
        emit(logs, &IDpos::UndelegateConfirmed {
            delegator: ctx.caller,
            validator: call.validator,
            amount: undelegation.amount,
        });
        Ok(Bytes::new())
    }

    fn confirm_undelegate_v2(
        &self,
        ctx: &CallContext,
        logs: &mut Vec<LogEntry>,
        call: IDpos::confirmUndelegateV2Call,
    ) -> Result<Bytes> {
        let undelegation = self
            .undelegations
            .get_undelegation_v2(&ctx.caller, call.undelegation_id)?
            .filter(|u| u.validator == call.validator)
            .ok_or(DposError::NonExistentUndelegation)?;
        if ctx.block < undelegation.block {
            return Err(DposError::LockedUndelegation);
        }
        self.undelegations
            .remove_undelegation_v2(&ctx.caller, call.undelegation_id)?;
        self.release_undelegation(ctx, &call.validator, undelegation.amount)?;
        emit(logs, &IDpos::UndelegateConfirmedV2 {
            delegator: ctx.caller,
            validator: call.validator,
            undelegation_id: call.undelegation_id,
            amount: undelegation.amount,
        });
        Ok(Bytes::new())
    }

    fn cancel_undelegate(
        &self,
        ctx: &CallContext,
        logs: &mut Vec<LogEntry>,
        call: IDpos::cancelUndelegateCall,
    ) -> Result<Bytes> {
        let Some(undelegation) = self
            .undelegations
            .get_undelegation_v1(&ctx.caller, &call.validator)?
        else {
            return Err(DposError::NonExistentUndelegation);
        };
        let Some(mut validator) = self.validators.get_validator(&call.validator)? else {
            return Err(DposError::NonExistentValidator);
        };
        self.undelegations
            .remove_undelegation_v1(&ctx.caller, &call.validator)?;
        self.restore_undelegation(ctx, &call.validator, &mut validator, undelegation.amount)?;
        emit(logs, &IDpos::UndelegateCanceled {
            delegator: ctx.caller,
            validator: call.validator,
            amount: undelegation.amount,
        });
        Ok(Bytes::new())
    }

    fn cancel_undelegate_v2(
        &self,
        ctx: &CallContext,
        logs: &mut Vec<LogEntry>,
        call: IDpos::cancelUndelegateV2Call,
    ) -> Result<Bytes> {
        let undelegation = self
            .undelegations
            .get_undelegation_v2(&ctx.caller, call.undelegation_id)?
            .filter(|u| u.validator == call.validator)
            .ok_or(DposError::NonExistentUndelegation)?;
        let Some(mut validator) = self.validators.get_validator(&call.validator)? else {
            return Err(DposError::NonExistentValidator);
        };
        self.undelegations
            .remove_undelegation_v2(&ctx.caller, call.undelegation_id)?;
        self.restore_undelegation(ctx, &call.validator, &mut validator, undelegation.amount)?;
        emit(logs, &IDpos::UndelegateCanceledV2 {
            delegator: ctx.caller,
            validator: call.validator,
            undelegation_id: call.undelegation_id,
            amount: undelegation.amount,
        });
        Ok(Bytes::new())
    }

    fn re_delegate(
        &self,
        ctx: &CallContext,
        logs: &mut Vec<LogEntry>,
        call: IDpos::reDelegateCall,
    ) -> Result<Bytes> {
        if call.validator_from == call.validator_to {
            return Err(DposError::SameValidator);
        }
        let Some(mut from_validator) = self.validators.get_validator(&call.validator_from)?
        else {
            return Err(DposError::NonExistentValidator);
        };
        let Some(mut to_validator) = self.validators.get_validator(&call.validator_to)? else {
            return Err(DposError::NonExistentValidator);
        };
        let Some(mut source) = self
            .delegations
            .get_delegation(&ctx.caller, &call.validator_from)?
        else {
            return Err(DposError::NonExistentDelegation);
        };
        if call.amount.is_zero() {
            return Err(DposError::InvalidRedelegation);
        }
        if call.amount > source.stake {
            return Err(DposError::InsufficientDelegation);
        }
        let remaining = source.stake - call.amount;
        if !remaining.is_zero() && remaining < self.config.minimum_deposit {
            return Err(DposError::InsufficientDelegation);
        }
        if to_validator.total_stake + call.amount > self.config.validator_maximum_stake {
            return Err(DposError::ValidatorsMaxStakeExceeded);
        }
        let destination_exists = self
            .delegations
            .delegation_exists(&ctx.caller, &call.validator_to)?;
        if !destination_exists && call.amount < self.config.minimum_deposit {
            return Err(DposError::InsufficientDelegation);
        }

        source.settle(&from_validator, ctx.block);
        source.stake = remaining;
        self.store_or_close_delegation(ctx, logs, &call.validator_from, &source)?;
        let new_from_stake = from_validator.total_stake - call.amount;
        self.change_validator_stake(&mut from_validator, new_from_stake)?;
        self.save_or_delete_validator(&call.validator_from, &from_validator, ctx.block)?;

        // Pre-fix blocks must replay the historical behavior: the
        // destination's pending rewards were not settled before its stake
        // changed. The correction list compensates affected accounts at the
        // fork block.
        let settle_destination = self.config.hardforks.is_fix_redelegate_hardfork(ctx.block);
        self.credit_delegation(
            &ctx.caller,
            &call.validator_to,
            &to_validator,
            call.amount,
            ctx.block,
            settle_destination,
        )?;
        let new_to_stake = to_validator.total_stake + call.amount;
        self.change_validator_stake(&mut to_validator, new_to_stake)?;
        self.validators
            .modify_validator(&call.validator_to, &to_validator)?;

        emit(logs, &IDpos::Redelegated {
            delegator: ctx.caller,
            from: call.validator_from,
            to: call.validator_to,
            amount: call.amount,
        });
        Ok(Bytes::new())
    }

    fn claim_rewards(
        &self,
        ctx: &CallContext,
        logs: &mut Vec<LogEntry>,
        call: IDpos::claimRewardsCall,
    ) -> Result<Bytes> {
        let Some(mut delegation) = self.delegations.get_delegation(&ctx.caller, &call.validator)?
        else {
            return Err(DposError::NonExistentDelegation);
        };
        let validator = self.expect_validator(&call.validator)?;
        delegation.settle(&validator, ctx.block);
        let amount = delegation.rewards;
        delegation.rewards = U256::ZERO;
        self.delegations
            .modify_delegation(&ctx.caller, &call.validator, &delegation)?;
        self.transfer_out(&ctx.caller, amount)?;

        DPOS_REWARDS_CLAIMED.inc();
        emit(logs, &IDpos::RewardsClaimed {
            account: ctx.caller,
            validator: call.validator,
            amount,
        });
        Ok(Bytes::new())
    }

    fn claim_all_rewards(
        &self,
        ctx: &CallContext,
        logs: &mut Vec<LogEntry>,
    ) -> Result<(u64, Bytes)> {
        let count = self.delegations.get_delegations_count(&ctx.caller)?;
        let gas_used = gas::CLAIM_REWARDS + gas::CLAIM_ALL_PER_DELEGATION * count;

        let (validator_addresses, _) = self
            .delegations
            .get_delegator_validators_addresses(&ctx.caller, 0, u32::MAX)?;
        let mut total = U256::ZERO;
        for validator_address in validator_addresses {
            let mut delegation = self.expect_delegation(&ctx.caller, &validator_address)?;
            let validator = self.expect_validator(&validator_address)?;
            delegation.settle(&validator, ctx.block);
            let amount = delegation.rewards;
            delegation.rewards = U256::ZERO;
            self.delegations
                .modify_delegation(&ctx.caller, &validator_address, &delegation)?;
            if amount.is_zero() {
                continue;
            }
            total += amount;
            DPOS_REWARDS_CLAIMED.inc();
            emit(logs, &IDpos::RewardsClaimed {
                account: ctx.caller,
                validator: validator_address,
                amount,
            });
        }
        self.transfer_out(&ctx.caller, total)?;
        Ok((gas_used, Bytes::new()))
    }

    fn claim_commission_rewards(
        &self,
        ctx: &CallContext,
        logs: &mut Vec<LogEntry>,
        call: IDpos::claimCommissionRewardsCall,
    ) -> Result<Bytes> {
        let Some(mut validator) = self.validators.get_validator(&call.validator)? else {
            return Err(DposError::NonExistentValidator);
        };
        if !self
            .validators
            .check_validator_owner(&ctx.caller, &call.validator)?
        {
            return Err(DposError::WrongOwnerAcc);
        }
        let amount = validator.commission_rewards_pool;
        validator.commission_rewards_pool = U256::ZERO;
        self.transfer_out(&ctx.caller, amount)?;
        self.save_or_delete_validator(&call.validator, &validator, ctx.block)?;

        DPOS_REWARDS_CLAIMED.inc();
        emit(logs, &IDpos::CommissionRewardsClaimed {
            account: ctx.caller,
            validator: call.validator,
            amount,
        });
        Ok(Bytes::new())
    }

    fn set_commission(
        &self,
        ctx: &CallContext,
        logs: &mut Vec<LogEntry>,
        call: IDpos::setCommissionCall,
    ) -> Result<Bytes> {
        let Some(mut validator) = self.validators.get_validator(&call.validator)? else {
            return Err(DposError::NonExistentValidator);
        };
        if !self
            .validators
            .check_validator_owner(&ctx.caller, &call.validator)?
        {
            return Err(DposError::WrongOwnerAcc);
        }
        if call.commission > MAX_COMMISSION {
            return Err(DposError::CommissionOverflow);
        }
        if ctx.block - validator.last_commission_change
            < u64::from(self.config.commission_change_frequency)
        {
            return Err(DposError::ForbiddenCommissionChange);
        }
        if validator.commission.abs_diff(call.commission) > self.config.commission_change_delta {
            return Err(DposError::CommissionOverflow);
        }

        validator.commission = call.commission;
        validator.last_commission_change = ctx.block;
        self.validators.modify_validator(&call.validator, &validator)?;
        emit(logs, &IDpos::CommissionSet {
            validator: call.validator,
            commission: call.commission,
        });
        Ok(Bytes::new())
    }

    fn set_validator_info(
        &self,
        ctx: &CallContext,
        logs: &mut Vec<LogEntry>,
        call: IDpos::setValidatorInfoCall,
    ) -> Result<Bytes> {
        let Some(mut info) = self.validators.get_validator_info(&call.validator)? else {
            return Err(DposError::NonExistentValidator);
        };
        if info.owner != ctx.caller {
            return Err(DposError::WrongOwnerAcc);
        }
        if call.description.len() > MAX_DESCRIPTION_LENGTH {
            return Err(DposError::MaxDescriptionLengthExceeded);
        }
        if call.endpoint.len() > MAX_ENDPOINT_LENGTH {
            return Err(DposError::MaxEndpointLengthExceeded);
        }

        info.description = call.description;
        info.endpoint = call.endpoint;
        self.validators.modify_validator_info(&call.validator, &info)?;
        emit(logs, &IDpos::ValidatorInfoSet {
            validator: call.validator,
        });
        Ok(Bytes::new())
    }

    // ========================================================================
    // Getters
    // ========================================================================

    fn get_validator(&self, call: IDpos::getValidatorCall) -> Result<(u64, Bytes)> {
        let Some(validator) = self.validators.get_validator(&call.validator)? else {
            return Err(DposError::NonExistentValidator);
        };
        let info = self.expect_validator_info(&call.validator)?;
        let out = IDpos::getValidatorCall::abi_encode_returns(&(validator_basic_info(
            &validator, info,
        ),));
        Ok((gas::DPOS_GET_METHODS_GAS, out.into()))
    }

    fn get_validators(&self, call: IDpos::getValidatorsCall) -> Result<(u64, Bytes)> {
        let (addresses, end) = self
            .validators
            .get_validators_addresses(call.batch, GETTER_PAGE)?;
        let validators = self.collect_validator_data(addresses)?;
        let gas_used =
            gas::DPOS_GET_METHODS_GAS + gas::DPOS_BATCH_GET_METHODS_GAS * validators.len() as u64;
        let out = IDpos::getValidatorsCall::abi_encode_returns(&(validators, end));
        Ok((gas_used, out.into()))
    }

    fn get_validators_for(&self, call: IDpos::getValidatorsForCall) -> Result<(u64, Bytes)> {
        let (addresses, end) =
            self.validators
                .get_owner_validators_addresses(&call.owner, call.batch, GETTER_PAGE)?;
        let validators = self.collect_validator_data(addresses)?;
        let gas_used =
            gas::DPOS_GET_METHODS_GAS + gas::DPOS_BATCH_GET_METHODS_GAS * validators.len() as u64;
        let out = IDpos::getValidatorsForCall::abi_encode_returns(&(validators, end));
        Ok((gas_used, out.into()))
    }

    fn get_total_delegation(&self, call: IDpos::getTotalDelegationCall) -> Result<(u64, Bytes)> {
        let count = self.delegations.get_delegations_count(&call.delegator)?;
        let (addresses, _) = self
            .delegations
            .get_delegator_validators_addresses(&call.delegator, 0, u32::MAX)?;
        let mut total = U256::ZERO;
        for address in addresses {
            total += self.expect_delegation(&call.delegator, &address)?.stake;
        }
        let gas_used = gas::DPOS_GET_METHODS_GAS + gas::DPOS_BATCH_GET_METHODS_GAS * count;
        let out = IDpos::getTotalDelegationCall::abi_encode_returns(&(total,));
        Ok((gas_used, out.into()))
    }

    fn get_delegations(&self, call: IDpos::getDelegationsCall) -> Result<(u64, Bytes)> {
        let (addresses, end) = self.delegations.get_delegator_validators_addresses(
            &call.delegator,
            call.batch,
            GETTER_PAGE,
        )?;
        let mut delegations = Vec::with_capacity(addresses.len());
        for address in addresses {
            let delegation = self.expect_delegation(&call.delegator, &address)?;
            let validator = self.expect_validator(&address)?;
            // Report accrued-but-unsettled rewards without mutating state.
            let rewards = delegation.rewards + delegation.pending_rewards(&validator);
            delegations.push(IDpos::DelegationData {
                account: address,
                delegation: IDpos::DelegatorInfo {
                    stake: delegation.stake,
                    rewards,
                },
            });
        }
        let gas_used =
            gas::DPOS_GET_METHODS_GAS + gas::DPOS_BATCH_GET_METHODS_GAS * delegations.len() as u64;
        let out = IDpos::getDelegationsCall::abi_encode_returns(&(delegations, end));
        Ok((gas_used, out.into()))
    }

    fn get_undelegations(&self, call: IDpos::getUndelegationsCall) -> Result<(u64, Bytes)> {
        let (addresses, end) = self.undelegations.get_undelegation_v1_validators(
            &call.delegator,
            call.batch,
            GETTER_PAGE,
        )?;
        let mut undelegations = Vec::with_capacity(addresses.len());
        for validator in addresses {
            let Some(undelegation) = self
                .undelegations
                .get_undelegation_v1(&call.delegator, &validator)?
            else {
                panic!("dpos: v1 undelegation {} -> {validator} missing from index", call.delegator);
            };
            undelegations.push(self.undelegation_data(
                undelegation.amount,
                undelegation.block,
                validator,
            )?);
        }
        let gas_used = gas::DPOS_GET_METHODS_GAS
            + gas::DPOS_BATCH_GET_METHODS_GAS * undelegations.len() as u64;
        let out = IDpos::getUndelegationsCall::abi_encode_returns(&(undelegations, end));
        Ok((gas_used, out.into()))
    }

    fn get_undelegations_v2(&self, call: IDpos::getUndelegationsV2Call) -> Result<(u64, Bytes)> {
        let (ids, end) =
            self.undelegations
                .get_undelegation_v2_ids(&call.delegator, call.batch, GETTER_PAGE)?;
        let mut undelegations = Vec::with_capacity(ids.len());
        for id in ids {
            let Some(undelegation) = self.undelegations.get_undelegation_v2(&call.delegator, id)?
            else {
                panic!("dpos: v2 undelegation {} id {id} missing from index", call.delegator);
            };
            undelegations.push(IDpos::UndelegationV2Data {
                undelegation_data: self.undelegation_data(
                    undelegation.amount,
                    undelegation.block,
                    undelegation.validator,
                )?,
                undelegation_id: id,
            });
        }
        let gas_used = gas::DPOS_GET_METHODS_GAS
            + gas::DPOS_BATCH_GET_METHODS_GAS * undelegations.len() as u64;
        let out = IDpos::getUndelegationsV2Call::abi_encode_returns(&(undelegations, end));
        Ok((gas_used, out.into()))
    }

    fn get_undelegation_v2(&self, call: IDpos::getUndelegationV2Call) -> Result<(u64, Bytes)> {
        let undelegation = self
            .undelegations
            .get_undelegation_v2(&call.delegator, call.undelegation_id)?
            .filter(|u| u.validator == call.validator)
            .ok_or(DposError::NonExistentUndelegation)?;
        let data = IDpos::UndelegationV2Data {
            undelegation_data: self.undelegation_data(
                undelegation.amount,
                undelegation.block,
                undelegation.validator,
            )?,
            undelegation_id: call.undelegation_id,
        };
        let out = IDpos::getUndelegationV2Call::abi_encode_returns(&(data,));
        Ok((gas::DPOS_GET_METHODS_GAS, out.into()))
    }

    // ========================================================================
    // Reward distribution
    // ========================================================================

    /// Mint and book the rewards for one finalized block.
    ///
    /// `stats` is the consensus-observed participation: DAG blocks proposed
    /// and vote weight carried per validator, plus transaction fees. The
    /// minted amount (newly created tokens, excluding fees) is returned so
    /// the engine can reconcile supply. Fees are only booked here; the
    /// engine credits them to the contract account when it collects them,
    /// the same way it moves attached call value before [`Self::run`].
    pub fn distribute_rewards(&self, block: u64, stats: &RewardsStats) -> Result<U256> {
        self.apply_redelegation_corrections(block)?;

        let total_delegated = self.aggregates.total_delegated()?;
        let generated = self
            .aggregates
            .generated_rewards()?
            .unwrap_or(self.config.hardforks.aspen_hf.generated_rewards);
        let total_supply = self.config.initial_total_supply + generated;
        let block_reward =
            yield_curve::block_reward(&self.config, block, total_delegated, total_supply);

        let parts = split_block_reward(&self.config, block_reward);
        let author_bonus =
            author_reward(parts.bonus_reward, stats.total_votes_weight, stats.max_votes_weight);

        let mut minted = U256::ZERO;
        for (validator_address, validator_stats) in &stats.validators {
            let mut reward = U256::ZERO;
            if validator_stats.dag_blocks_count > 0 && stats.total_dag_blocks_count > 0 {
                reward += parts.dag_reward * U256::from(validator_stats.dag_blocks_count)
                    / U256::from(stats.total_dag_blocks_count);
            }
            if validator_stats.vote_weight > 0 && stats.total_votes_weight > 0 {
                reward += parts.vote_reward * U256::from(validator_stats.vote_weight)
                    / U256::from(stats.total_votes_weight);
            }
            if *validator_address == stats.block_author {
                reward += author_bonus;
            }
            let fees = validator_stats.fees_rewards;
            if reward.is_zero() && fees.is_zero() {
                continue;
            }

            let Some(mut validator) = self.validators.get_validator(validator_address)? else {
                tracing::warn!(
                    validator = %validator_address,
                    block,
                    "skipping rewards for deleted validator"
                );
                continue;
            };
            minted += reward;

            let (commission_part, delegators_part) = commission_split(reward, validator.commission);
            // Fees are redistributed, not minted; they go to the operator in
            // full alongside the commission.
            validator.commission_rewards_pool += commission_part + fees;
            if !delegators_part.is_zero() {
                if validator.total_stake.is_zero() {
                    // Nobody left to accrue to; the operator keeps the rest.
                    validator.commission_rewards_pool += delegators_part;
                } else {
                    validator.rewards_per_stake +=
                        delegators_part * *REWARDS_PER_STAKE_PRECISION / validator.total_stake;
                }
            }
            self.validators.modify_validator(validator_address, &validator)?;
        }

        if !minted.is_zero() {
            self.ledger.add_balance(&DPOS_CONTRACT_ADDRESS, minted)?;
        }
        if self.config.hardforks.is_aspen_hardfork_part_one(block) {
            self.aggregates.set_generated_rewards(&(generated + minted))?;
        }

        DPOS_REWARD_DISTRIBUTIONS.inc();
        tracing::debug!(block, minted = %minted, block_reward = %block_reward, "distributed block rewards");
        Ok(minted)
    }

    /// Replay the configured redelegation reward corrections, once.
    ///
    /// The pre-fix redelegation path inflated or lost pending rewards; the
    /// correction list compensates the affected delegations at the fork
    /// block. Delegations that disappeared in the meantime are skipped.
    fn apply_redelegation_corrections(&self, block: u64) -> Result<()> {
        if !self.config.hardforks.is_fix_redelegate_hardfork(block) {
            return Ok(());
        }
        if self.aggregates.redelegations_fix_applied()? {
            return Ok(());
        }

        let mut credited = U256::ZERO;
        for entry in &self.config.hardforks.redelegations {
            let Some(mut delegation) = self
                .delegations
                .get_delegation(&entry.delegator, &entry.validator)?
            else {
                tracing::warn!(
                    delegator = %entry.delegator,
                    validator = %entry.validator,
                    "skipping redelegation correction for missing delegation"
                );
                continue;
            };
            delegation.rewards += entry.amount;
            credited += entry.amount;
            self.delegations
                .modify_delegation(&entry.delegator, &entry.validator, &delegation)?;
        }
        // Back the credited rewards so later claims can pay out.
        if !credited.is_zero() {
            self.ledger.add_balance(&DPOS_CONTRACT_ADDRESS, credited)?;
        }
        self.aggregates.set_redelegations_fix_applied()?;
        if !self.config.hardforks.redelegations.is_empty() {
            tracing::info!(
                corrections = self.config.hardforks.redelegations.len(),
                credited = %credited,
                block,
                "applied redelegation reward corrections"
            );
        }
        Ok(())
    }

    // ========================================================================
    // Internal helpers
    // ========================================================================

    /// Fetch a validator that the state invariants guarantee to exist.
    fn expect_validator(&self, address: &Address) -> Result<Validator> {
        match self.validators.get_validator(address)? {
            Some(validator) => Ok(validator),
            None => panic!("dpos: validator {address} missing for live record"),
        }
    }

    fn expect_validator_info(&self, address: &Address) -> Result<ValidatorInfo> {
        match self.validators.get_validator_info(address)? {
            Some(info) => Ok(info),
            None => panic!("dpos: validator info {address} missing"),
        }
    }

    fn expect_delegation(&self, delegator: &Address, validator: &Address) -> Result<Delegation> {
        match self.delegations.get_delegation(delegator, validator)? {
            Some(delegation) => Ok(delegation),
            None => panic!("dpos: delegation {delegator} -> {validator} missing from index"),
        }
    }

    /// Move a validator to `new_stake`, maintaining the delegated-total and
    /// eligible-votes aggregates. The caller persists the validator record.
    fn change_validator_stake(&self, validator: &mut Validator, new_stake: U256) -> Result<()> {
        let old_votes = self.config.eligible_vote_count(&validator.total_stake);
        let new_votes = self.config.eligible_vote_count(&new_stake);

        let mut total_delegated = self.aggregates.total_delegated()?;
        if new_stake >= validator.total_stake {
            total_delegated += new_stake - validator.total_stake;
        } else {
            total_delegated -= validator.total_stake - new_stake;
        }
        self.aggregates.set_total_delegated(&total_delegated)?;

        if new_votes != old_votes {
            // The aggregate always carries this validator's previous weight.
            let total_votes = self.aggregates.total_eligible_votes()? - old_votes + new_votes;
            self.aggregates.set_total_eligible_votes(total_votes)?;
        }

        validator.total_stake = new_stake;
        DPOS_TOTAL_STAKE.set(total_delegated.to::<u128>() as f64);
        Ok(())
    }

    /// Whether a validator record must be kept alive.
    fn should_keep_validator(&self, validator: &Validator, block: u64) -> bool {
        let keep =
            !validator.total_stake.is_zero() || !validator.commission_rewards_pool.is_zero();
        if self.config.hardforks.is_magnolia_hardfork(block) {
            keep || validator.undelegations_count > 0
        } else {
            keep
        }
    }

    /// Persist a mutated validator, or delete it once nothing keeps the
    /// record alive.
    fn save_or_delete_validator(
        &self,
        address: &Address,
        validator: &Validator,
        block: u64,
    ) -> Result<()> {
        if self.should_keep_validator(validator, block) {
            Ok(self.validators.modify_validator(address, validator)?)
        } else {
            self.validators.delete_validator(address)?;
            DPOS_VALIDATORS_DELETED.inc();
            tracing::debug!(validator = %address, block, "validator deleted");
            Ok(())
        }
    }

    /// Persist a settled delegation, or sweep its rewards and remove it
    /// when the stake dropped to zero.
    fn store_or_close_delegation(
        &self,
        ctx: &CallContext,
        logs: &mut Vec<LogEntry>,
        validator_address: &Address,
        delegation: &Delegation,
    ) -> Result<()> {
        if delegation.stake.is_zero() {
            if !delegation.rewards.is_zero() {
                self.transfer_out(&ctx.caller, delegation.rewards)?;
                DPOS_REWARDS_CLAIMED.inc();
                emit(logs, &IDpos::RewardsClaimed {
                    account: ctx.caller,
                    validator: *validator_address,
                    amount: delegation.rewards,
                });
            }
            Ok(self
                .delegations
                .remove_delegation(&ctx.caller, validator_address)?)
        } else {
            Ok(self
                .delegations
                .modify_delegation(&ctx.caller, validator_address, delegation)?)
        }
    }

    /// Add `amount` to an existing delegation (optionally settling its
    /// rewards first) or open a fresh one checkpointed at the current
    /// accumulator.
    fn credit_delegation(
        &self,
        delegator: &Address,
        validator_address: &Address,
        validator: &Validator,
        amount: U256,
        block: u64,
        settle_existing: bool,
    ) -> Result<()> {
        match self.delegations.get_delegation(delegator, validator_address)? {
            Some(mut delegation) => {
                if settle_existing {
                    delegation.settle(validator, block);
                }
                delegation.stake += amount;
                Ok(self
                    .delegations
                    .modify_delegation(delegator, validator_address, &delegation)?)
            }
            None => {
                let delegation = Delegation::new(amount, validator, block);
                Ok(self
                    .delegations
                    .create_delegation(delegator, validator_address, &delegation)?)
            }
        }
    }

    /// Book a confirmed undelegation: drop it from the validator's pending
    /// count and pay the caller.
    fn release_undelegation(
        &self,
        ctx: &CallContext,
        validator_address: &Address,
        amount: U256,
    ) -> Result<()> {
        if let Some(mut validator) = self.validators.get_validator(validator_address)? {
            // A re-registered validator may predate pending undelegations
            // left behind by a deleted incarnation, so the counter must not
            // underflow.
            validator.undelegations_count = validator.undelegations_count.saturating_sub(1);
            self.save_or_delete_validator(validator_address, &validator, ctx.block)?;
        }
        self.transfer_out(&ctx.caller, amount)
    }

    /// Book a canceled undelegation: return the stake to the delegation and
    /// the validator.
    fn restore_undelegation(
        &self,
        ctx: &CallContext,
        validator_address: &Address,
        validator: &mut Validator,
        amount: U256,
    ) -> Result<()> {
        validator.undelegations_count = validator.undelegations_count.saturating_sub(1);
        self.credit_delegation(&ctx.caller, validator_address, validator, amount, ctx.block, true)?;
        self.change_validator_stake(validator, validator.total_stake + amount)?;
        Ok(self
            .validators
            .modify_validator(validator_address, validator)?)
    }

    /// Locking period for undelegations requested at `block`.
    fn locking_period(&self, block: u64) -> u32 {
        if self.config.hardforks.is_cornus_hardfork(block) {
            self.config.hardforks.cornus_hf.delegation_locking_period
        } else {
            self.config.delegation_locking_period
        }
    }

    /// Pay `amount` out of the contract account.
    fn transfer_out(&self, to: &Address, amount: U256) -> Result<()> {
        if amount.is_zero() {
            return Ok(());
        }
        self.ledger.sub_balance(&DPOS_CONTRACT_ADDRESS, amount)?;
        self.ledger.add_balance(to, amount)?;
        Ok(())
    }

    fn collect_validator_data(
        &self,
        addresses: Vec<Address>,
    ) -> Result<Vec<IDpos::ValidatorData>> {
        let mut validators = Vec::with_capacity(addresses.len());
        for address in addresses {
            let validator = self.expect_validator(&address)?;
            let info = self.expect_validator_info(&address)?;
            validators.push(IDpos::ValidatorData {
                account: address,
                info: validator_basic_info(&validator, info),
            });
        }
        Ok(validators)
    }

    fn undelegation_data(
        &self,
        amount: U256,
        block: u64,
        validator: Address,
    ) -> Result<IDpos::UndelegationData> {
        Ok(IDpos::UndelegationData {
            stake: amount,
            block,
            validator,
            validator_exists: self.validators.validator_exists(&validator)?,
        })
    }
}

fn validator_basic_info(validator: &Validator, info: ValidatorInfo) -> IDpos::ValidatorBasicInfo {
    IDpos::ValidatorBasicInfo {
        total_stake: validator.total_stake,
        commission_reward: validator.commission_rewards_pool,
        commission: validator.commission,
        last_commission_change: validator.last_commission_change,
        undelegations_count: validator.undelegations_count,
        owner: info.owner,
        description: info.description,
        endpoint: info.endpoint,
    }
}

fn decode<C: SolCall>(input: &[u8]) -> Result<C> {
    C::abi_decode(input, true).map_err(|err| DposError::abi_decode(err))
}

fn emit<E: SolEvent>(logs: &mut Vec<LogEntry>, event: &E) {
    logs.push(LogEntry::new(DPOS_CONTRACT_ADDRESS, event));
}
