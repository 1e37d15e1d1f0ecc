//! JSON-RPC implementation of the ledger client against a fullnode endpoint.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use url::Url;

use crate::changes::ObjectChange;
use crate::client::{EffectsOptions, ExecutionStatus, LedgerClient, TransactionResult};
use crate::error::DeployError;
use crate::signer::Signer;
use crate::tx::TransactionIntent;

/// Which fullnode to talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Mainnet,
    #[default]
    Testnet,
    Devnet,
    Localnet,
}

impl Network {
    /// Public fullnode endpoint for this network.
    pub fn fullnode_url(self) -> Url {
        let raw = match self {
            Network::Mainnet => "https://fullnode.mainnet.sui.io:443",
            Network::Testnet => "https://fullnode.testnet.sui.io:443",
            Network::Devnet => "https://fullnode.devnet.sui.io:443",
            Network::Localnet => "http://127.0.0.1:9000",
        };
        // Static strings above always parse.
        Url::parse(raw).unwrap_or_else(|_| unreachable!("static fullnode url"))
    }

    pub fn parse(name: &str) -> anyhow::Result<Self> {
        match name {
            "mainnet" => Ok(Network::Mainnet),
            "testnet" => Ok(Network::Testnet),
            "devnet" => Ok(Network::Devnet),
            "localnet" => Ok(Network::Localnet),
            other => anyhow::bail!("unknown network: {other}"),
        }
    }
}

/// JSON-RPC client over a fullnode HTTP endpoint.
#[derive(Debug)]
pub struct RpcClient {
    http: reqwest::Client,
    endpoint: Url,
    signer: Signer,
}

impl RpcClient {
    /// Client for one of the well-known networks.
    pub fn new(network: Network, signer: Signer) -> anyhow::Result<Self> {
        Self::with_endpoint(network.fullnode_url(), signer)
    }

    /// Client for an explicit endpoint (custom fullnodes, local test nodes).
    pub fn with_endpoint(endpoint: Url, signer: Signer) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("moor/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|err| anyhow::anyhow!("failed to build HTTP client: {err}"))?;
        Ok(Self {
            http,
            endpoint,
            signer,
        })
    }

    async fn call(&self, method: &str, params: Value) -> Result<Value, DeployError> {
        let body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        });

        let response = self.http.post(self.endpoint.clone()).json(&body).send().await?;
        if !response.status().is_success() {
            return Err(DeployError::Rpc(format!(
                "{method}: HTTP {} from {}",
                response.status(),
                self.endpoint
            )));
        }

        let envelope: RpcEnvelope = response.json().await?;
        match (envelope.result, envelope.error) {
            (Some(result), _) => Ok(result),
            (None, Some(err)) => Err(DeployError::Rpc(format!(
                "{method}: {} (code {})",
                err.message, err.code
            ))),
            (None, None) => Err(DeployError::Rpc(format!("{method}: empty response"))),
        }
    }
}

#[async_trait]
impl LedgerClient for RpcClient {
    async fn submit(&self, intent: &TransactionIntent) -> Result<TransactionResult, DeployError> {
        let payload = intent.to_bytes();
        let signature = self.signer.sign(&payload);

        let params = json!([
            intent,
            [signature],
            EffectsOptions::effects_and_changes(),
            // Wait for local execution so the submission result already
            // carries the change set.
            "WaitForLocalExecution",
        ]);

        let raw = self.call("sui_executeTransactionBlock", params).await?;
        parse_transaction_block(raw)
            .map_err(|err| DeployError::Submission(format!("malformed execution response: {err}")))
    }

    async fn query_effects(
        &self,
        digest: &str,
        options: &EffectsOptions,
    ) -> Result<TransactionResult, DeployError> {
        let params = json!([digest, options]);
        let raw = self.call("sui_getTransactionBlock", params).await?;
        parse_transaction_block(raw)
            .map_err(|err| DeployError::Rpc(format!("malformed effects response: {err}")))
    }

    fn signer_address(&self) -> &str {
        self.signer.address()
    }
}

#[derive(Debug, Deserialize)]
struct RpcEnvelope {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcErrorBody>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorBody {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RpcTransactionBlock {
    digest: String,
    #[serde(default)]
    effects: Option<RpcEffects>,
    #[serde(default)]
    object_changes: Vec<ObjectChange>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RpcEffects {
    status: RpcStatus,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RpcStatus {
    status: String,
    #[serde(default)]
    error: Option<String>,
}

fn parse_transaction_block(raw: Value) -> Result<TransactionResult, serde_json::Error> {
    let block: RpcTransactionBlock = serde_json::from_value(raw)?;
    let status = match block.effects {
        Some(effects) if effects.status.status == "failure" => ExecutionStatus::Failure(
            effects
                .status
                .error
                .unwrap_or_else(|| "execution failed".to_string()),
        ),
        // Effects not requested: trust the digest, treat as success.
        _ => ExecutionStatus::Success,
    };
    Ok(TransactionResult {
        digest: block.digest,
        status,
        object_changes: block.object_changes,
    })
}
