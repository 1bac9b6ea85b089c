//! Log records emitted by the DPOS contract.
//!
//! State-changing methods push [`LogEntry`] records into the call output;
//! the engine appends them to the transaction receipt next to the logs of
//! ordinary EVM execution, so indexers see DPOS activity through the same
//! channel as regular contract events.

use alloy_primitives::{Address, B256, LogData};
use alloy_sol_types::SolEvent;

/// A single event log produced during a contract call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    /// Address of the emitting contract.
    pub address: Address,
    /// Topics and ABI-encoded payload.
    pub data: LogData,
}

impl LogEntry {
    /// Encode `event` as a log emitted by `address`.
    pub fn new<E: SolEvent>(address: Address, event: &E) -> Self {
        Self {
            address,
            data: event.encode_log_data(),
        }
    }

    /// The event signature hash, when the log carries topics.
    pub fn topic0(&self) -> Option<&B256> {
        self.data.topics().first()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abi::IDpos;
    use alloy_primitives::{Address, U256};

    #[test]
    fn encodes_indexed_topics_and_payload() {
        let delegator = Address::repeat_byte(0x11);
        let validator = Address::repeat_byte(0x22);
        let entry = LogEntry::new(
            Address::repeat_byte(0xaa),
            &IDpos::Delegated {
                delegator,
                validator,
                amount: U256::from(1_000u64),
            },
        );

        assert_eq!(entry.topic0(), Some(&IDpos::Delegated::SIGNATURE_HASH));
        assert_eq!(entry.data.topics().len(), 3);
        assert_eq!(entry.data.topics()[1], delegator.into_word());
        assert_eq!(entry.data.topics()[2], validator.into_word());
        assert_eq!(entry.data.data.len(), 32);
    }

    #[test]
    fn undelegation_id_is_an_indexed_topic() {
        let entry = LogEntry::new(
            Address::repeat_byte(0xaa),
            &IDpos::UndelegatedV2 {
                delegator: Address::repeat_byte(0x11),
                validator: Address::repeat_byte(0x22),
                undelegation_id: 7,
                amount: U256::from(5u64),
            },
        );

        assert_eq!(entry.topic0(), Some(&IDpos::UndelegatedV2::SIGNATURE_HASH));
        assert_eq!(entry.data.topics().len(), 4);
        assert_eq!(entry.data.topics()[3], B256::with_last_byte(7));
    }
}
