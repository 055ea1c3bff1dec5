use crate::models::Provenance;
use crate::types::{ActionReceipt, BlockHeader, ExecutionOutcome, PublicKey};

const NANOS_PER_MILLI: u64 = 1_000_000;

/// Map the receipt, block header and outcome onto the fields every record carries.
pub fn build_provenance(
    receipt: &ActionReceipt,
    block_header: &BlockHeader,
    outcome: &ExecutionOutcome,
    public_key: &PublicKey,
) -> Provenance {
    Provenance {
        block_time: block_header.timestamp_nanosec / NANOS_PER_MILLI,
        block_height: block_header.height,
        block_hash: block_header.hash.to_base58(),
        predecessor_id: receipt.predecessor_id.clone(),
        receiver_id: receipt.receiver_id.clone(),
        signer_id: receipt.signer_id.clone(),
        signer_public_key: public_key.to_base58(),
        gas_burned: outcome.gas_burnt,
        tokens_burned: outcome.tokens_burnt,
        outcome_id: outcome.id.to_base58(),
        executor_id: outcome.executor_id.clone(),
        outcome_block_hash: outcome.block_hash.to_base58(),
    }
}
