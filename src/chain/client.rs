use anyhow::{anyhow, Result};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};

/// Configuration for the rollup LCD client
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// LCD endpoint URL (e.g., "https://lcd.minimove-2.initia.xyz")
    pub lcd_endpoint: String,
    /// Chain ID (e.g., "minimove-2")
    pub chain_id: String,
    /// Connection timeout in seconds
    pub connection_timeout: u64,
    /// Request timeout in seconds
    pub request_timeout: u64,
    /// Maximum retry attempts for read-only queries
    pub max_retries: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            lcd_endpoint: "https://lcd.minimove-2.initia.xyz".to_string(),
            chain_id: "minimove-2".to_string(),
            connection_timeout: 10,
            request_timeout: 30,
            max_retries: 3,
        }
    }
}

/// REST client for the LCD surface of a Move rollup node
#[derive(Debug, Clone)]
pub struct LcdClient {
    config: ClientConfig,
    http: Client,
}

impl LcdClient {
    /// Create a new client with the given configuration
    pub fn new(config: ClientConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout))
            .connect_timeout(Duration::from_secs(config.connection_timeout))
            .build()?;

        Ok(Self { config, http })
    }

    /// Chain ID this client is configured for
    pub fn chain_id(&self) -> &str {
        &self.config.chain_id
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.lcd_endpoint.trim_end_matches('/'), path)
    }

    /// Broadcast a signed transaction in sync mode.
    ///
    /// Broadcasts are never retried here: a transport error after the request
    /// left the process could mean the transaction is already in the mempool.
    pub async fn broadcast_tx(&self, tx_bytes: &[u8]) -> Result<BroadcastResponse> {
        let url = self.url("/cosmos/tx/v1beta1/txs");
        log::info!("broadcast_tx called with {} bytes", tx_bytes.len());

        let body = serde_json::json!({
            "tx_bytes": BASE64.encode(tx_bytes),
            "mode": "BROADCAST_MODE_SYNC",
        });

        let response = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| anyhow!("Failed to broadcast transaction: {}", e))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(anyhow!("Failed to broadcast transaction: {} {}", status, text));
        }

        let wire: BroadcastTxWire = response
            .json()
            .await
            .map_err(|e| anyhow!("Failed to decode broadcast response: {}", e))?;
        let tx_response = wire
            .tx_response
            .ok_or_else(|| anyhow!("No tx response in broadcast response"))?;

        Ok(BroadcastResponse {
            tx_hash: tx_response.txhash,
            code: tx_response.code,
            raw_log: tx_response.raw_log,
        })
    }

    /// Look up a transaction by hash.
    ///
    /// Returns `Ok(None)` while the node has not indexed the transaction yet;
    /// presence of a `TxInfo` is what confirmation means on the LCD surface.
    pub async fn tx_by_hash(&self, tx_hash: &str) -> Result<Option<TxInfo>> {
        let url = self.url(&format!("/cosmos/tx/v1beta1/txs/{}", tx_hash));

        let response = self
            .with_retry(|| async {
                self.http
                    .get(&url)
                    .send()
                    .await
                    .map_err(|e| anyhow!("Failed to query tx status: {}", e))
            })
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(anyhow!("Failed to query tx status: {} {}", status, text));
        }

        let wire: GetTxWire = response
            .json()
            .await
            .map_err(|e| anyhow!("Failed to decode tx status response: {}", e))?;

        Ok(wire.tx_response)
    }

    /// Execute a read-only Move view function and return its decoded result
    pub async fn view_function(
        &self,
        address: &str,
        module: &str,
        function: &str,
        type_args: &[String],
        args: &[Vec<u8>],
    ) -> Result<Value> {
        let url = self.url(&format!(
            "/initia/move/v1/accounts/{}/modules/{}/view_functions/{}",
            address, module, function
        ));
        let body = serde_json::json!({
            "type_args": type_args,
            "args": args.iter().map(|a| BASE64.encode(a)).collect::<Vec<_>>(),
        });

        log::debug!("Calling view function {}::{} at {}", module, function, address);

        let wire: ViewFunctionWire = self
            .with_retry(|| async {
                let response = self
                    .http
                    .post(&url)
                    .json(&body)
                    .send()
                    .await
                    .map_err(|e| anyhow!("View function request failed: {}", e))?;

                let status = response.status();
                if !status.is_success() {
                    let text = response.text().await.unwrap_or_default();
                    return Err(anyhow!("View function request failed: {} {}", status, text));
                }

                response
                    .json::<ViewFunctionWire>()
                    .await
                    .map_err(|e| anyhow!("Failed to decode view function response: {}", e))
            })
            .await?;

        // The LCD wraps the result in a JSON-encoded string
        serde_json::from_str(&wire.data)
            .map_err(|e| anyhow!("Failed to parse view function result: {}", e))
    }

    /// Read a Move resource stored under an account, decoded into `T`
    pub async fn resource<T: DeserializeOwned>(&self, address: &str, struct_tag: &str) -> Result<T> {
        let url = self.url(&format!(
            "/initia/move/v1/accounts/{}/resources/by_struct_tag",
            address
        ));

        let response = self
            .with_retry(|| async {
                let response = self
                    .http
                    .get(&url)
                    .query(&[("struct_tag", struct_tag)])
                    .send()
                    .await
                    .map_err(|e| anyhow!("Resource request failed: {}", e))?;

                let status = response.status();
                if !status.is_success() {
                    let text = response.text().await.unwrap_or_default();
                    return Err(anyhow!("Resource request failed: {} {}", status, text));
                }

                response
                    .json::<ResourceWire>()
                    .await
                    .map_err(|e| anyhow!("Failed to decode resource response: {}", e))
            })
            .await?;

        log::debug!("Fetched resource {}", response.resource.struct_tag);

        // move_resource is itself a JSON document: {"type": ..., "data": {...}}
        let decoded: MoveResourceWire<T> = serde_json::from_str(&response.resource.move_resource)
            .map_err(|e| anyhow!("Failed to parse move resource: {}", e))?;

        Ok(decoded.data)
    }

    /// Query account information.
    /// Returns default account info (sequence=0, account_number=0) for new accounts.
    pub async fn query_account(&self, address: &str) -> Result<AccountInfo> {
        let url = self.url(&format!("/cosmos/auth/v1beta1/accounts/{}", address));

        let response = self
            .with_retry(|| async {
                self.http
                    .get(&url)
                    .send()
                    .await
                    .map_err(|e| anyhow!("Failed to query account: {}", e))
            })
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            log::info!("Account not found, returning default info for new account: {}", address);
            return Ok(AccountInfo {
                address: address.to_string(),
                account_number: 0,
                sequence: 0,
            });
        }

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(anyhow!("Failed to query account: {} {}", status, text));
        }

        let wire: AccountWire = response
            .json()
            .await
            .map_err(|e| anyhow!("Failed to decode account response: {}", e))?;
        let account = wire.account.ok_or_else(|| anyhow!("Account not found"))?;

        Ok(AccountInfo {
            address: account.address,
            account_number: account.account_number.parse().unwrap_or_default(),
            sequence: account.sequence.parse().unwrap_or_default(),
        })
    }

    /// Get the latest block height from the chain
    pub async fn latest_block_height(&self) -> Result<u64> {
        let url = self.url("/cosmos/base/tendermint/v1beta1/blocks/latest");

        let wire: BlockWire = self
            .with_retry(|| async {
                let response = self
                    .http
                    .get(&url)
                    .send()
                    .await
                    .map_err(|e| anyhow!("Failed to get latest block: {}", e))?;

                let status = response.status();
                if !status.is_success() {
                    let text = response.text().await.unwrap_or_default();
                    return Err(anyhow!("Failed to get latest block: {} {}", status, text));
                }

                response
                    .json::<BlockWire>()
                    .await
                    .map_err(|e| anyhow!("Failed to decode block response: {}", e))
            })
            .await?;

        wire.block
            .header
            .height
            .parse::<u64>()
            .map_err(|e| anyhow!("Failed to parse block height: {}", e))
    }

    /// Get node info for health check and chain ID verification
    pub async fn node_info(&self) -> Result<NodeInfo> {
        let url = self.url("/cosmos/base/tendermint/v1beta1/node_info");

        let wire: NodeInfoWire = self
            .with_retry(|| async {
                let response = self
                    .http
                    .get(&url)
                    .send()
                    .await
                    .map_err(|e| anyhow!("Failed to get node info: {}", e))?;

                let status = response.status();
                if !status.is_success() {
                    let text = response.text().await.unwrap_or_default();
                    return Err(anyhow!("Failed to get node info: {} {}", status, text));
                }

                response
                    .json::<NodeInfoWire>()
                    .await
                    .map_err(|e| anyhow!("Failed to decode node info response: {}", e))
            })
            .await?;

        Ok(NodeInfo {
            chain_id: wire.default_node_info.network,
            node_version: wire.application_version.map(|v| v.version).unwrap_or_default(),
            moniker: wire.default_node_info.moniker,
        })
    }

    /// Check if the node is reachable
    pub async fn health_check(&self) -> Result<bool> {
        let url = self.url("/cosmos/base/tendermint/v1beta1/node_info");

        match self.http.get(&url).send().await {
            Ok(response) => Ok(response.status().is_success()),
            Err(_) => Ok(false),
        }
    }

    /// Wait for the node to become reachable
    pub async fn wait_for_ready(&self, max_attempts: u32) -> Result<()> {
        for i in 0..max_attempts {
            if self.health_check().await? {
                log::info!("Node is reachable");
                return Ok(());
            }

            if i < max_attempts - 1 {
                log::info!("Waiting for node... attempt {}/{}", i + 1, max_attempts);
                tokio::time::sleep(Duration::from_secs(1)).await;
            }
        }

        Err(anyhow!("Node failed to become reachable after {} attempts", max_attempts))
    }

    /// Retry helper for read-only network operations
    async fn with_retry<T, F, Fut>(&self, f: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = Result<T>>,
    {
        let mut retries = 0;
        loop {
            match f().await {
                Ok(result) => return Ok(result),
                Err(e) if retries < self.config.max_retries => {
                    retries += 1;
                    log::debug!("Query failed (attempt {}): {:#}", retries, e);
                    tokio::time::sleep(Duration::from_millis(100 * retries as u64)).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Account information from the chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountInfo {
    pub address: String,
    pub account_number: u64,
    pub sequence: u64,
}

/// Response from transaction broadcast
#[derive(Debug, Clone)]
pub struct BroadcastResponse {
    pub tx_hash: String,
    pub code: u32,
    pub raw_log: String,
}

/// Result of a confirmed transaction, as reported by the LCD
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, Deserialize)]
pub struct TxInfo {
    pub txhash: String,
    #[serde(default)]
    pub height: String,
    #[serde(default)]
    pub code: u32,
    #[serde(default)]
    pub raw_log: String,
    #[serde(default)]
    pub gas_wanted: String,
    #[serde(default)]
    pub gas_used: String,
    #[serde(default)]
    pub timestamp: String,
}

/// Node information for health checks and chain verification
#[derive(Debug, Clone)]
pub struct NodeInfo {
    pub chain_id: String,
    pub node_version: String,
    pub moniker: String,
}

// Wire shapes owned by this client; everything else in the crate sees the
// decoded types above.

#[derive(Deserialize)]
struct BroadcastTxWire {
    tx_response: Option<TxResponseWire>,
}

#[derive(Deserialize)]
struct TxResponseWire {
    txhash: String,
    #[serde(default)]
    code: u32,
    #[serde(default)]
    raw_log: String,
}

#[derive(Deserialize)]
struct GetTxWire {
    tx_response: Option<TxInfo>,
}

#[derive(Deserialize)]
struct ViewFunctionWire {
    data: String,
}

#[derive(Deserialize)]
struct ResourceWire {
    resource: ResourceEntryWire,
}

#[derive(Deserialize)]
struct ResourceEntryWire {
    struct_tag: String,
    move_resource: String,
}

#[derive(Deserialize)]
struct MoveResourceWire<T> {
    data: T,
}

#[derive(Deserialize)]
struct AccountWire {
    account: Option<BaseAccountWire>,
}

#[derive(Deserialize)]
struct BaseAccountWire {
    address: String,
    #[serde(default)]
    account_number: String,
    #[serde(default)]
    sequence: String,
}

#[derive(Deserialize)]
struct BlockWire {
    block: BlockInnerWire,
}

#[derive(Deserialize)]
struct BlockInnerWire {
    header: BlockHeaderWire,
}

#[derive(Deserialize)]
struct BlockHeaderWire {
    height: String,
}

#[derive(Deserialize)]
struct NodeInfoWire {
    default_node_info: DefaultNodeInfoWire,
    application_version: Option<AppVersionWire>,
}

#[derive(Deserialize)]
struct DefaultNodeInfoWire {
    network: String,
    #[serde(default)]
    moniker: String,
}

#[derive(Deserialize)]
struct AppVersionWire {
    version: String,
}
