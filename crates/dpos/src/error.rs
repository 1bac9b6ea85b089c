//! Error types for the DPOS precompile.
//!
//! Errors split into two classes. Recoverable errors describe a rejected
//! call: the transaction reverts, the reason string is ABI-encoded into the
//! output and state changes made by the call are discarded by the engine.
//! Fatal errors (storage failures, gas exhaustion, unknown selectors, ABI
//! decoding failures) abort execution of the call entirely.

use alloy_primitives::hex;
use lattice_storage::StorageError;

/// Result type alias for DPOS precompile operations.
pub type Result<T> = std::result::Result<T, DposError>;

/// Main error type for the DPOS precompile.
///
/// The `Display` rendering of recoverable variants doubles as the revert
/// reason seen by contract callers, so the wording is part of the ABI
/// surface and must stay stable.
#[derive(Debug, thiserror::Error)]
pub enum DposError {
    /// The referenced validator is not registered.
    #[error("Validator does not exist")]
    NonExistentValidator,

    /// Registration targeted an address that already hosts a validator.
    #[error("Validator already registered")]
    ExistentValidator,

    /// The registration proof did not recover to the validator address.
    #[error("Invalid registration proof")]
    WrongProof,

    /// The supplied VRF key has the wrong shape.
    #[error("Invalid VRF key")]
    WrongVrfKey,

    /// The delegation is too small, or would fall below the minimum.
    #[error("Insufficient delegation")]
    InsufficientDelegation,

    /// The operation would push the validator above the stake cap.
    #[error("Validator maximum stake exceeded")]
    ValidatorsMaxStakeExceeded,

    /// The caller has no delegation towards the referenced validator.
    #[error("Delegation does not exist")]
    NonExistentDelegation,

    /// The referenced undelegation does not exist.
    #[error("Undelegation does not exist")]
    NonExistentUndelegation,

    /// The undelegation is still inside its locking period.
    #[error("Undelegation is not yet unlocked")]
    LockedUndelegation,

    /// A v1 undelegation towards this validator is already pending.
    #[error("Undelegation already exists")]
    ExistentUndelegation,

    /// Redelegation names the same validator on both sides.
    #[error("Redelegation to the same validator")]
    SameValidator,

    /// Redelegation of a zero amount.
    #[error("Invalid redelegation")]
    InvalidRedelegation,

    /// The caller is not the owner of the referenced validator.
    #[error("Caller is not the validator owner")]
    WrongOwnerAcc,

    /// Commission change violates the per-period delta or frequency limit.
    #[error("Commission change is forbidden")]
    ForbiddenCommissionChange,

    /// Commission above the 100% ceiling.
    #[error("Commission exceeds the maximum")]
    CommissionOverflow,

    /// Validator description longer than the allowed maximum.
    #[error("Description is too long")]
    MaxDescriptionLengthExceeded,

    /// Validator endpoint longer than the allowed maximum.
    #[error("Endpoint is too long")]
    MaxEndpointLengthExceeded,

    /// The method is not available at the current block height.
    #[error("Method is not supported")]
    MethodNotSupported,

    /// Value was attached to a non-payable method.
    #[error("Method is not payable")]
    NonPayableMethod,

    /// The supplied gas does not cover the cost of the call.
    #[error("Out of gas")]
    OutOfGas,

    /// Calldata selector does not name any DPOS method.
    #[error("no method with id: {0}")]
    UnknownMethod(String),

    /// Calldata arguments could not be decoded.
    #[error("ABI decoding failed: {0}")]
    AbiDecode(String),

    /// The chain configuration failed validation at genesis.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Underlying state storage failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl DposError {
    /// Create an unknown-method error from the leading calldata bytes.
    pub fn unknown_method(selector: &[u8]) -> Self {
        Self::UnknownMethod(format!("0x{}", hex::encode(selector)))
    }

    /// Create an ABI decoding error.
    pub fn abi_decode(err: impl std::fmt::Display) -> Self {
        Self::AbiDecode(err.to_string())
    }

    /// Whether the error reverts the call rather than aborting execution.
    ///
    /// Recoverable errors are surfaced to the caller as an EVM revert with
    /// the error message as reason. Everything else is propagated to the
    /// engine as a hard failure.
    pub fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            Self::OutOfGas
                | Self::UnknownMethod(_)
                | Self::AbiDecode(_)
                | Self::Config(_)
                | Self::Storage(_)
        )
    }
}
