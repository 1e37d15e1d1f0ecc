//! Demo-coin minting against a published token package.

use crate::client::{ExecutionStatus, LedgerClient};
use crate::error::DeployError;
use crate::tx::TransactionIntent;
use crate::tx::schema::{COIN_MINT, CallValues, build_call};
use crate::types::Digest;

/// Mint `amount` demo coins to `recipient` using the treasury capability the
/// publish created. Returns the transaction digest.
pub async fn mint(
    client: &dyn LedgerClient,
    package_id: &str,
    treasury: &str,
    amount: u64,
    recipient: &str,
) -> Result<Digest, DeployError> {
    let values = CallValues::new()
        .object("treasury", treasury)
        .u64("amount", amount)
        .address("recipient", recipient);
    let call = build_call(package_id, &COIN_MINT, &values)?;

    let mut intent = TransactionIntent::new();
    intent.operations.push(call);

    let result = client.submit(&intent).await?;
    if let ExecutionStatus::Failure(error) = &result.status {
        return Err(DeployError::Submission(format!(
            "mint {} failed on-chain: {error}",
            result.digest
        )));
    }

    tracing::info!(digest = %result.digest, amount, recipient, "minted demo coins");
    Ok(result.digest)
}
