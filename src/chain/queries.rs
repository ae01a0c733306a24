/// Bridge Query Module - Read operations against the rollup bridge contracts.
/// All of these are view/resource reads; nothing here costs gas.
use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::client::LcdClient;
use super::denom::l2_denom;

/// Account that hosts the framework modules (op_output, coin)
pub const FRAMEWORK_ADDRESS: &str = "0x1";

/// Bridge configuration snapshot stored by the output submission contract.
/// Immutable at read time; compare by value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeConfig {
    pub proposer: String,
    pub challenger: String,
    pub submission_interval: String,
    pub finalization_period: String,
    pub starting_block_number: String,
}

/// On-chain coin metadata merged with the locally derived denomination
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoinInfo {
    pub struct_tag: String,
    pub denom: String,
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

#[derive(Debug, Deserialize)]
struct CoinInfoResource {
    name: String,
    symbol: String,
    decimals: u8,
}

/// Fetch the bridge configuration for `bridge_id` from the output contract.
/// One view call, decoded as-is; the result is not cached.
pub async fn query_bridge_config(client: &LcdClient, bridge_id: &str) -> Result<BridgeConfig> {
    let value = client
        .view_function(
            FRAMEWORK_ADDRESS,
            "op_output",
            "get_config_store",
            &[bridge_id.to_string()],
            &[],
        )
        .await?;

    let config: BridgeConfig = serde_json::from_value(value)?;

    log::debug!(
        "Bridge {} - proposer: {}, submission interval: {}",
        bridge_id,
        config.proposer,
        config.submission_interval
    );

    Ok(config)
}

/// Fetch coin metadata for a Move asset type.
///
/// The resource lives under the account that published the asset module,
/// i.e. the address part of the struct tag. The denomination is derived
/// locally from the raw L2 token identifier and never read from chain.
pub async fn query_coin_info(
    client: &LcdClient,
    struct_tag: &str,
    l2_token: &[u8],
) -> Result<CoinInfo> {
    let address = struct_tag.split("::").next().unwrap_or(struct_tag);

    let resource: CoinInfoResource = client
        .resource(address, &format!("0x1::coin::CoinInfo<{}>", struct_tag))
        .await?;

    Ok(CoinInfo {
        struct_tag: struct_tag.to_string(),
        denom: l2_denom(l2_token),
        name: resource.name,
        symbol: resource.symbol,
        decimals: resource.decimals,
    })
}
