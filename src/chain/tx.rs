/// Transaction submission and confirmation tracking.
///
/// Signing and message construction live behind the `TxSigner` seam; this
/// module only sequences sign -> broadcast -> poll-until-confirmed.
use anyhow::{anyhow, Result};
use serde::Serialize;
use serde_json::Value;
use std::future::Future;
use std::time::Duration;
use tokio::time::{sleep, Instant};

use super::client::{LcdClient, TxInfo};

/// Fixed delay between confirmation polls. No backoff, no jitter.
pub const POLL_INTERVAL: Duration = Duration::from_millis(1000);

/// Default wall-clock budget for a confirmation wait
pub const DEFAULT_CONFIRM_TIMEOUT: Duration = Duration::from_secs(60);

/// An opaque proto-JSON chain message. Construction of concrete message
/// bodies belongs to the caller; this crate only carries them to the signer.
#[derive(Debug, Clone, Serialize)]
pub struct Msg {
    #[serde(rename = "@type")]
    pub type_url: String,
    #[serde(flatten)]
    pub body: Value,
}

impl Msg {
    pub fn new(type_url: impl Into<String>, body: Value) -> Self {
        Self { type_url: type_url.into(), body }
    }
}

/// Account coordinates a signer needs to produce a valid signature
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SigningContext {
    pub chain_id: String,
    pub account_number: u64,
    pub sequence: u64,
}

/// External signing collaborator. Implementations own key material and the
/// transaction encoding; they hand back ready-to-broadcast tx bytes.
pub trait TxSigner {
    /// Bech32 address the signatures belong to
    fn address(&self) -> &str;

    /// Sign `msgs` under `ctx` and return the encoded transaction bytes
    fn sign_tx(&self, msgs: &[Msg], ctx: &SigningContext) -> Result<Vec<u8>>;
}

/// Optional overrides for the account coordinates used when signing.
/// Anything left unset is fetched fresh from the chain at submit time.
#[derive(Debug, Clone, Default)]
pub struct SubmitOptions {
    pub account_number: Option<u64>,
    pub sequence: Option<u64>,
}

/// Sign, broadcast, and wait for confirmation.
///
/// A broadcast the node rejects (non-zero code) fails immediately with the
/// node's raw log as the error message and is never retried. A broadcast the
/// node accepts hands off to [`await_confirmation`] with the default timeout;
/// `Ok(None)` then means "not confirmed within the timeout", which callers
/// must treat as indeterminate rather than failed.
pub async fn submit<S: TxSigner>(
    client: &LcdClient,
    signer: &S,
    msgs: &[Msg],
    options: SubmitOptions,
) -> Result<Option<TxInfo>> {
    let (account_number, sequence) = match (options.account_number, options.sequence) {
        (Some(account_number), Some(sequence)) => (account_number, sequence),
        (account_number, sequence) => {
            // Fetch fresh from chain to avoid sequence drift
            let account = client.query_account(signer.address()).await?;
            (
                account_number.unwrap_or(account.account_number),
                sequence.unwrap_or(account.sequence),
            )
        }
    };

    let ctx = SigningContext {
        chain_id: client.chain_id().to_string(),
        account_number,
        sequence,
    };
    let tx_bytes = signer.sign_tx(msgs, &ctx)?;

    let response = client.broadcast_tx(&tx_bytes).await?;
    if response.code != 0 {
        return Err(anyhow!("{}", response.raw_log));
    }

    log::info!("Broadcast accepted, waiting for confirmation: {}", response.tx_hash);
    Ok(await_confirmation(client, &response.tx_hash, DEFAULT_CONFIRM_TIMEOUT).await)
}

/// Poll the node for a transaction result until it is indexed or `timeout`
/// elapses. `None` means "unconfirmed within timeout" and is not an error;
/// a transaction that never confirms (or a node that stops answering) ends
/// here after the timeout.
pub async fn await_confirmation(
    client: &LcdClient,
    tx_hash: &str,
    timeout: Duration,
) -> Option<TxInfo> {
    poll_until(timeout, POLL_INTERVAL, || async move {
        match client.tx_by_hash(tx_hash).await {
            Ok(found) => found,
            Err(e) => {
                log::debug!("Status query for {} failed, treating as pending: {:#}", tx_hash, e);
                None
            }
        }
    })
    .await
}

/// Fixed-interval polling loop: probe until `Some` or the deadline passes.
/// The first probe happens immediately; a probe that lands a result is the
/// sole success exit.
pub(crate) async fn poll_until<T, F, Fut>(timeout: Duration, interval: Duration, probe: F) -> Option<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Option<T>>,
{
    let started = Instant::now();

    while started.elapsed() < timeout {
        if let Some(found) = probe().await {
            return Some(found);
        }
        sleep(interval).await;
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::client::ClientConfig;
    use mockito::{Matcher, Server};
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    fn test_client(endpoint: &str) -> LcdClient {
        LcdClient::new(ClientConfig {
            lcd_endpoint: endpoint.to_string(),
            chain_id: "test-1".to_string(),
            connection_timeout: 5,
            request_timeout: 5,
            max_retries: 0,
        })
        .unwrap()
    }

    struct StaticSigner {
        address: String,
        seen: Mutex<Option<SigningContext>>,
    }

    impl StaticSigner {
        fn new(address: &str) -> Self {
            Self { address: address.to_string(), seen: Mutex::new(None) }
        }
    }

    impl TxSigner for StaticSigner {
        fn address(&self) -> &str {
            &self.address
        }

        fn sign_tx(&self, _msgs: &[Msg], ctx: &SigningContext) -> Result<Vec<u8>> {
            *self.seen.lock().unwrap() = Some(ctx.clone());
            Ok(vec![1, 2, 3])
        }
    }

    fn withdrawal_msg() -> Msg {
        Msg::new(
            "/opchild.v1.MsgInitiateTokenWithdrawal",
            serde_json::json!({
                "sender": "init1abc",
                "to": "init1def",
                "amount": {"denom": "umin", "amount": "1000"},
            }),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn poll_returns_absent_only_after_deadline() {
        let polls = AtomicU32::new(0);
        let polls_ref = &polls;

        let started = Instant::now();
        let result: Option<()> = poll_until(Duration::from_secs(3), POLL_INTERVAL, move || async move {
            polls_ref.fetch_add(1, Ordering::SeqCst);
            None
        })
        .await;

        assert!(result.is_none());
        // never earlier than the deadline, one probe per interval
        assert!(started.elapsed() >= Duration::from_secs(3));
        assert_eq!(polls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn poll_stops_at_first_result() {
        let polls = AtomicU32::new(0);
        let polls_ref = &polls;

        let started = Instant::now();
        let result = poll_until(Duration::from_secs(60), POLL_INTERVAL, move || async move {
            if polls_ref.fetch_add(1, Ordering::SeqCst) + 1 == 2 {
                Some(42u64)
            } else {
                None
            }
        })
        .await;

        assert_eq!(result, Some(42));
        assert_eq!(polls.load(Ordering::SeqCst), 2);
        assert!(started.elapsed() < Duration::from_secs(60));
    }

    #[tokio::test]
    async fn submit_surfaces_raw_log_and_skips_polling() {
        let mut server = Server::new_async().await;
        let _broadcast_mock = server
            .mock("POST", "/cosmos/tx/v1beta1/txs")
            .with_body(
                serde_json::json!({
                    "tx_response": {"txhash": "DEAD", "code": 5, "raw_log": "insufficient funds"}
                })
                .to_string(),
            )
            .create_async()
            .await;
        let status_mock = server
            .mock("GET", Matcher::Regex("^/cosmos/tx/v1beta1/txs/.+$".into()))
            .expect(0)
            .create_async()
            .await;

        let client = test_client(&server.url());
        let signer = StaticSigner::new("init1abc");
        let options = SubmitOptions { account_number: Some(1), sequence: Some(2) };

        let err = submit(&client, &signer, &[withdrawal_msg()], options).await.unwrap_err();

        assert_eq!(err.to_string(), "insufficient funds");
        status_mock.assert_async().await;
    }

    #[tokio::test]
    async fn submit_returns_confirmed_tx() {
        let mut server = Server::new_async().await;
        let _broadcast_mock = server
            .mock("POST", "/cosmos/tx/v1beta1/txs")
            .with_body(
                serde_json::json!({
                    "tx_response": {"txhash": "ABC123", "code": 0, "raw_log": ""}
                })
                .to_string(),
            )
            .create_async()
            .await;
        let _status_mock = server
            .mock("GET", "/cosmos/tx/v1beta1/txs/ABC123")
            .with_body(
                serde_json::json!({
                    "tx_response": {"txhash": "ABC123", "height": "77", "code": 0}
                })
                .to_string(),
            )
            .create_async()
            .await;

        let client = test_client(&server.url());
        let signer = StaticSigner::new("init1abc");
        let options = SubmitOptions { account_number: Some(1), sequence: Some(2) };

        let info = submit(&client, &signer, &[withdrawal_msg()], options)
            .await
            .unwrap()
            .expect("tx should confirm on first poll");

        assert_eq!(info.txhash, "ABC123");
        assert_eq!(info.height, "77");
    }

    #[tokio::test]
    async fn submit_resolves_missing_account_coordinates_from_chain() {
        let mut server = Server::new_async().await;
        let account_mock = server
            .mock("GET", "/cosmos/auth/v1beta1/accounts/init1abc")
            .with_body(
                serde_json::json!({
                    "account": {
                        "@type": "/cosmos.auth.v1beta1.BaseAccount",
                        "address": "init1abc",
                        "account_number": "7",
                        "sequence": "11"
                    }
                })
                .to_string(),
            )
            .create_async()
            .await;
        let _broadcast_mock = server
            .mock("POST", "/cosmos/tx/v1beta1/txs")
            .with_body(
                serde_json::json!({
                    "tx_response": {"txhash": "DEAD", "code": 9, "raw_log": "out of gas"}
                })
                .to_string(),
            )
            .create_async()
            .await;

        let client = test_client(&server.url());
        let signer = StaticSigner::new("init1abc");

        let err = submit(&client, &signer, &[withdrawal_msg()], SubmitOptions::default())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "out of gas");

        let ctx = signer.seen.lock().unwrap().clone().expect("signer should have run");
        assert_eq!(ctx.account_number, 7);
        assert_eq!(ctx.sequence, 11);
        assert_eq!(ctx.chain_id, "test-1");
        account_mock.assert_async().await;
    }
}
