//! Validator registration proofs.
//!
//! Registering a validator requires a recoverable secp256k1 signature of
//! `keccak256(owner address)` under the validator key. Recovery ties the
//! validator address to the registering owner without the validator key
//! ever appearing on chain.

use crate::error::{DposError, Result};
use alloy_primitives::{keccak256, Address};
use k256::ecdsa::{RecoveryId, Signature, VerifyingKey};

/// Length of a registration proof: `r || s || v`.
pub const PROOF_LENGTH: usize = 65;

/// Verify that `proof` signs `keccak256(owner)` and recovers to
/// `validator`.
///
/// The recovery byte accepts both raw parity (0/1) and the Ethereum
/// offset form (27/28). Any malformed or mismatching proof maps to
/// [`DposError::WrongProof`].
pub fn check_registration_proof(owner: &Address, validator: &Address, proof: &[u8]) -> Result<()> {
    if proof.len() != PROOF_LENGTH {
        return Err(DposError::WrongProof);
    }
    let signature = Signature::from_slice(&proof[..64]).map_err(|_| DposError::WrongProof)?;
    let v = proof[64];
    let parity = if v >= 27 { v - 27 } else { v };
    let recovery_id = RecoveryId::from_byte(parity).ok_or(DposError::WrongProof)?;

    let digest = keccak256(owner.as_slice());
    let key = VerifyingKey::recover_from_prehash(digest.as_slice(), &signature, recovery_id)
        .map_err(|_| DposError::WrongProof)?;

    if address_of(&key) != *validator {
        return Err(DposError::WrongProof);
    }
    Ok(())
}

/// EVM address of a secp256k1 key: `keccak256(uncompressed[1..])[12..]`.
pub fn address_of(key: &VerifyingKey) -> Address {
    let encoded = key.to_encoded_point(false);
    let hash = keccak256(&encoded.as_bytes()[1..]);
    Address::from_slice(&hash[12..])
}

#[cfg(test)]
mod tests {
    use super::*;
    use k256::ecdsa::SigningKey;

    fn proof_for(signing_key: &SigningKey, owner: &Address, v_offset: u8) -> Vec<u8> {
        let digest = keccak256(owner.as_slice());
        let (signature, recovery_id) = signing_key
            .sign_prehash_recoverable(digest.as_slice())
            .unwrap();
        let mut proof = signature.to_bytes().to_vec();
        proof.push(recovery_id.to_byte() + v_offset);
        proof
    }

    #[test]
    fn valid_proof_recovers_the_validator() {
        let signing_key = SigningKey::random(&mut rand::thread_rng());
        let validator = address_of(signing_key.verifying_key());
        let owner = Address::with_last_byte(0x01);

        let proof = proof_for(&signing_key, &owner, 0);
        check_registration_proof(&owner, &validator, &proof).unwrap();

        // The Ethereum 27/28 recovery byte form is accepted too.
        let proof = proof_for(&signing_key, &owner, 27);
        check_registration_proof(&owner, &validator, &proof).unwrap();
    }

    #[test]
    fn proof_is_bound_to_the_owner() {
        let signing_key = SigningKey::random(&mut rand::thread_rng());
        let validator = address_of(signing_key.verifying_key());
        let owner = Address::with_last_byte(0x01);
        let other = Address::with_last_byte(0x02);

        let proof = proof_for(&signing_key, &owner, 0);
        assert!(matches!(
            check_registration_proof(&other, &validator, &proof),
            Err(DposError::WrongProof)
        ));
    }

    #[test]
    fn proof_must_recover_to_the_validator() {
        let signing_key = SigningKey::random(&mut rand::thread_rng());
        let owner = Address::with_last_byte(0x01);
        let not_the_validator = Address::with_last_byte(0x03);

        let proof = proof_for(&signing_key, &owner, 0);
        assert!(matches!(
            check_registration_proof(&owner, &not_the_validator, &proof),
            Err(DposError::WrongProof)
        ));
    }

    #[test]
    fn malformed_proofs_are_rejected() {
        let owner = Address::with_last_byte(0x01);
        let validator = Address::with_last_byte(0x02);

        assert!(check_registration_proof(&owner, &validator, &[]).is_err());
        assert!(check_registration_proof(&owner, &validator, &[0u8; 64]).is_err());
        assert!(check_registration_proof(&owner, &validator, &[0u8; 65]).is_err());
        assert!(check_registration_proof(&owner, &validator, &[0u8; 66]).is_err());
    }
}
