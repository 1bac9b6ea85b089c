//! Solidity ABI surface of the DPOS precompile.
//!
//! The interface mirrors the on-chain contract callers interact with at
//! [`crate::DPOS_CONTRACT_ADDRESS`]. Calldata is decoded and return data
//! encoded with `alloy-sol-types`; dispatch in the contract matches on the
//! generated four-byte selectors.

use alloy_sol_types::{sol, SolCall};

sol! {
    /// Delegated proof-of-stake registry interface.
    interface IDpos {
        // ====================================================================
        // Events
        // ====================================================================

        /// Stake was delegated to a validator.
        event Delegated(address indexed delegator, address indexed validator, uint256 amount);

        /// Stake was scheduled for withdrawal (v1).
        event Undelegated(address indexed delegator, address indexed validator, uint256 amount);

        /// Stake was scheduled for withdrawal (v2, id-addressed).
        event UndelegatedV2(address indexed delegator, address indexed validator, uint64 indexed undelegation_id, uint256 amount);

        /// A matured v1 undelegation was paid out.
        event UndelegateConfirmed(address indexed delegator, address indexed validator, uint256 amount);

        /// A matured v2 undelegation was paid out.
        event UndelegateConfirmedV2(address indexed delegator, address indexed validator, uint64 indexed undelegation_id, uint256 amount);

        /// A pending v1 undelegation was returned to the validator.
        event UndelegateCanceled(address indexed delegator, address indexed validator, uint256 amount);

        /// A pending v2 undelegation was returned to the validator.
        event UndelegateCanceledV2(address indexed delegator, address indexed validator, uint64 indexed undelegation_id, uint256 amount);

        /// Stake was moved between two validators without a locking period.
        event Redelegated(address indexed delegator, address indexed from, address indexed to, uint256 amount);

        /// Accrued delegator rewards were paid out.
        event RewardsClaimed(address indexed account, address indexed validator, uint256 amount);

        /// Accumulated commission rewards were paid out to the owner.
        event CommissionRewardsClaimed(address indexed account, address indexed validator, uint256 amount);

        /// Validator commission was changed.
        event CommissionSet(address indexed validator, uint16 commission);

        /// A new validator was registered.
        event ValidatorRegistered(address indexed validator);

        /// Validator description or endpoint was updated.
        event ValidatorInfoSet(address indexed validator);

        // ====================================================================
        // Return types
        // ====================================================================

        /// Validator state as reported by the getters.
        struct ValidatorBasicInfo {
            /// Total amount of tokens delegated to the validator.
            uint256 total_stake;
            /// Commission rewards available for the owner to claim.
            uint256 commission_reward;
            /// Commission in basis points (1/100 of a percent).
            uint16 commission;
            /// Block number of the last commission change.
            uint64 last_commission_change;
            /// Number of pending undelegations from this validator.
            uint16 undelegations_count;
            /// Account allowed to change commission and metadata.
            address owner;
            /// Short validator description.
            string description;
            /// Validator website or RPC endpoint.
            string endpoint;
        }

        /// Validator address together with its state.
        struct ValidatorData {
            address account;
            ValidatorBasicInfo info;
        }

        /// Delegation state as reported by the getters.
        struct DelegatorInfo {
            /// Amount of tokens delegated.
            uint256 stake;
            /// Rewards accrued and not yet claimed.
            uint256 rewards;
        }

        /// Validator address together with the caller's delegation to it.
        struct DelegationData {
            address account;
            DelegatorInfo delegation;
        }

        /// Pending v1 undelegation.
        struct UndelegationData {
            /// Amount scheduled for withdrawal.
            uint256 stake;
            /// First block at which the withdrawal can be confirmed.
            uint64 block;
            /// Validator the stake is withdrawn from.
            address validator;
            /// Whether that validator still exists.
            bool validator_exists;
        }

        /// Pending v2 undelegation with its per-delegator id.
        struct UndelegationV2Data {
            UndelegationData undelegation_data;
            uint64 undelegation_id;
        }

        // ====================================================================
        // State-changing methods
        // ====================================================================

        /// Delegate the attached value to a registered validator.
        function delegate(address validator) external payable;

        /// Schedule withdrawal of `amount` from a validator (v1).
        ///
        /// Only one v1 undelegation per (delegator, validator) pair can be
        /// pending at a time. Disabled once v2 undelegations activate.
        function undelegate(address validator, uint256 amount) external;

        /// Schedule withdrawal of `amount` from a validator (v2).
        ///
        /// Multiple pending undelegations per pair are allowed; each gets a
        /// fresh per-delegator id.
        function undelegateV2(address validator, uint256 amount) external returns (uint64 undelegation_id);

        /// Pay out a matured v1 undelegation.
        function confirmUndelegate(address validator) external;

        /// Pay out a matured v2 undelegation.
        function confirmUndelegateV2(address validator, uint64 undelegation_id) external;

        /// Return a pending v1 undelegation to the validator's stake.
        function cancelUndelegate(address validator) external;

        /// Return a pending v2 undelegation to the validator's stake.
        function cancelUndelegateV2(address validator, uint64 undelegation_id) external;

        /// Move stake between validators without a locking period.
        function reDelegate(address validator_from, address validator_to, uint256 amount) external;

        /// Pay out the caller's accrued rewards from one validator.
        function claimRewards(address validator) external;

        /// Pay out the caller's accrued rewards from all validators.
        function claimAllRewards() external;

        /// Pay out a validator's commission pool to its owner.
        function claimCommissionRewards(address validator) external;

        /// Register a new validator and delegate the attached value to it.
        ///
        /// `proof` is a 65-byte recoverable secp256k1 signature of
        /// `keccak256(caller)` under the validator key.
        function registerValidator(
            address validator,
            bytes memory proof,
            bytes memory vrf_key,
            uint16 commission,
            string calldata description,
            string calldata endpoint
        ) external payable;

        /// Replace a validator's description and endpoint.
        function setValidatorInfo(address validator, string calldata description, string calldata endpoint) external;

        /// Change a validator's commission, rate-limited by configuration.
        function setCommission(address validator, uint16 commission) external;

        // ====================================================================
        // Getters
        // ====================================================================

        /// Whether the validator meets the eligibility threshold.
        function isValidatorEligible(address validator) external view returns (bool);

        /// Total vote count across all eligible validators.
        function getTotalEligibleVotesCount() external view returns (uint64);

        /// Vote count of a single validator.
        function getValidatorEligibleVotesCount(address validator) external view returns (uint64);

        /// State of a single validator.
        function getValidator(address validator) external view returns (ValidatorBasicInfo memory validator_info);

        /// Page through all registered validators.
        function getValidators(uint32 batch) external view returns (ValidatorData[] memory validators, bool end);

        /// Page through the validators owned by `owner`.
        function getValidatorsFor(address owner, uint32 batch) external view returns (ValidatorData[] memory validators, bool end);

        /// Sum of the delegator's stake across all validators.
        function getTotalDelegation(address delegator) external view returns (uint256 total_delegation);

        /// Page through the delegator's delegations.
        function getDelegations(address delegator, uint32 batch) external view returns (DelegationData[] memory delegations, bool end);

        /// Page through the delegator's pending v1 undelegations.
        function getUndelegations(address delegator, uint32 batch) external view returns (UndelegationData[] memory undelegations, bool end);

        /// Page through the delegator's pending v2 undelegations.
        function getUndelegationsV2(address delegator, uint32 batch) external view returns (UndelegationV2Data[] memory undelegations_v2, bool end);

        /// Look up a single v2 undelegation by validator and id.
        function getUndelegationV2(address delegator, address validator, uint64 undelegation_id) external view returns (UndelegationV2Data memory undelegation_v2);
    }
}

/// Whether a method accepts attached value.
///
/// Everything except `registerValidator` and `delegate` rejects non-zero
/// call value before dispatch.
pub fn is_payable(selector: [u8; 4]) -> bool {
    matches!(
        selector,
        IDpos::registerValidatorCall::SELECTOR | IDpos::delegateCall::SELECTOR
    )
}
