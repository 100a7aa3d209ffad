use crate::error::{Result, TransactionError};
use crate::rpc::{self, SignatureStatus};
use crate::rpc_config::RpcConfig;
use crate::tx_config::SendOptions;
use futures::stream::BoxStream;
use futures::StreamExt;
use solana_client::nonblocking::pubsub_client::{PubsubClient, PubsubClientError};
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_client::rpc_config::RpcSignatureSubscribeConfig;
use solana_client::rpc_response::{Response, RpcSignatureResult};
use solana_signature::Signature;
use solana_transaction::versioned::VersionedTransaction;
use std::time::Duration;
use tokio::time::{interval, timeout, timeout_at, Instant, MissedTickBehavior};
use tracing::{debug, instrument, warn};

/// Upper bound for unsubscribing and closing the websocket after the wait
const RELEASE_TIMEOUT: Duration = Duration::from_secs(1);

/// Poll `getSignatureStatuses` until `signature` reaches the requested
/// commitment, fails, or `options.timeout()` elapses.
///
/// With `resend_on_poll` the raw transaction is resent after every poll that
/// did not observe confirmation.
pub async fn poll_for_confirmation(
    rpc_client: &RpcClient,
    rpc_config: &RpcConfig,
    transaction: &VersionedTransaction,
    signature: &Signature,
    options: &SendOptions,
) -> Result<()> {
    let wait = options.timeout();
    timeout(
        wait,
        poll_until_landed(rpc_client, rpc_config, transaction, signature, options),
    )
    .await
    .map_err(|_| TransactionError::ConfirmationTimeout(wait))?
}

async fn poll_until_landed(
    rpc_client: &RpcClient,
    rpc_config: &RpcConfig,
    transaction: &VersionedTransaction,
    signature: &Signature,
    options: &SendOptions,
) -> Result<()> {
    let commitment = options.commitment_config();
    let mut ticks = interval(Duration::from_millis(rpc_config.poll_interval_ms.max(1)));
    ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticks.tick().await;
        match rpc::get_signature_status(rpc_client, signature, commitment).await? {
            SignatureStatus::Confirmed => return Ok(()),
            SignatureStatus::Failed(err) => return Err(TransactionError::TransactionFailed(err)),
            SignatureStatus::Pending => {}
        }

        if rpc_config.resend_on_poll {
            // The node rejects duplicates of a processed transaction
            if let Err(err) = rpc::send_raw_transaction(
                rpc_client,
                transaction,
                true,
                options.commitment,
                Some(0),
            )
            .await
            {
                debug!(%signature, error = %err, "resend failed");
            }
        }
    }
}

/// Wait for a `signatureSubscribe` notification for `signature`.
///
/// Connecting, subscribing and waiting share one deadline of
/// `options.timeout()`. Once subscribed, the status is checked once over RPC
/// so a transaction that landed before the subscription still confirms. The
/// subscription and the websocket connection are released on every exit
/// path, including timeout.
#[instrument(skip_all, fields(%signature))]
pub async fn subscribe_for_confirmation(
    rpc_client: &RpcClient,
    websocket_url: &str,
    signature: &Signature,
    options: &SendOptions,
) -> Result<()> {
    let wait = options.timeout();
    let deadline = Instant::now() + wait;
    let pubsub_client = timeout_at(deadline, PubsubClient::new(websocket_url))
        .await
        .map_err(|_| TransactionError::ConfirmationTimeout(wait))??;

    let outcome = {
        let subscription = timeout_at(
            deadline,
            pubsub_client.signature_subscribe(
                signature,
                Some(RpcSignatureSubscribeConfig {
                    commitment: Some(options.commitment_config()),
                    enable_received_notification: Some(false),
                }),
            ),
        )
        .await;

        match subscription {
            Ok(Ok((mut notifications, unsubscribe))) => {
                let outcome = timeout_at(
                    deadline,
                    wait_until_landed(rpc_client, &mut notifications, signature, options),
                )
                .await
                .map_err(|_| TransactionError::ConfirmationTimeout(wait))
                .and_then(|result| result);
                drop(notifications);
                if timeout(RELEASE_TIMEOUT, unsubscribe()).await.is_err() {
                    warn!("signature unsubscribe timed out");
                }
                outcome
            }
            Ok(Err(err)) => Err(err.into()),
            Err(_) => Err(TransactionError::ConfirmationTimeout(wait)),
        }
    };

    match timeout(RELEASE_TIMEOUT, pubsub_client.shutdown()).await {
        Ok(Ok(())) => {}
        Ok(Err(err)) => warn!(error = %err, "failed to shut down pubsub client"),
        Err(_) => warn!("pubsub client shutdown timed out"),
    }
    outcome
}

async fn wait_until_landed(
    rpc_client: &RpcClient,
    notifications: &mut BoxStream<'_, Response<RpcSignatureResult>>,
    signature: &Signature,
    options: &SendOptions,
) -> Result<()> {
    match rpc::get_signature_status(rpc_client, signature, options.commitment_config()).await {
        Ok(SignatureStatus::Confirmed) => return Ok(()),
        Ok(SignatureStatus::Failed(err)) => return Err(TransactionError::TransactionFailed(err)),
        Ok(SignatureStatus::Pending) => {}
        Err(err) => debug!(error = %err, "status check failed, waiting for notification"),
    }
    next_processed(notifications).await
}

async fn next_processed(
    notifications: &mut BoxStream<'_, Response<RpcSignatureResult>>,
) -> Result<()> {
    while let Some(response) = notifications.next().await {
        if let RpcSignatureResult::ProcessedSignature(result) = response.value {
            return match result.err {
                Some(err) => Err(TransactionError::TransactionFailed(format!("{err:?}"))),
                None => Ok(()),
            };
        }
    }
    Err(PubsubClientError::ConnectionClosed(
        "signature subscription ended before confirmation".to_string(),
    )
    .into())
}
