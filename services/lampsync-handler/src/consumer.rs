use std::{sync::Arc, time::Duration};

use futures_util::StreamExt;
use lampsync_common::LampSyncError;
use rdkafka::{
    admin::{AdminClient, AdminOptions, NewTopic, TopicReplication},
    consumer::{CommitMode, Consumer, StreamConsumer},
    ClientConfig, Message,
};
use tracing::{error, info, warn};

use crate::{
    config::Config,
    handler::{Outcome, TelemetryHandler},
    registry::DeviceRegistry,
};

/// Consumes the telemetry queue until the broker stream ends.
///
/// Up to `max_in_flight` messages are handled at once. Offsets are committed per
/// message once it is handled or dropped. An escalated failure leaves its offset
/// uncommitted, so the broker redelivers it after a restart or rebalance unless a
/// later message on the same partition has committed past it.
pub async fn run<R: DeviceRegistry>(
    cfg: &Config,
    handler: Arc<TelemetryHandler<R>>,
) -> Result<(), LampSyncError> {
    info!(
        brokers = %cfg.kafka_brokers,
        queue = %cfg.queue_name,
        group = %cfg.group_id,
        "starting queue consumer"
    );

    ensure_queue(&cfg.kafka_brokers, &cfg.queue_name).await;

    let consumer: StreamConsumer = ClientConfig::new()
        .set("bootstrap.servers", &cfg.kafka_brokers)
        .set("group.id", &cfg.group_id)
        .set("enable.partition.eof", "false")
        .set("session.timeout.ms", "6000")
        .set("enable.auto.commit", "false")
        .create()
        .map_err(|e| LampSyncError::queue(format!("failed to create consumer: {e}")))?;
    consumer
        .subscribe(&[cfg.queue_name.as_str()])
        .map_err(|e| LampSyncError::queue(format!("failed to subscribe to {}: {e}", cfg.queue_name)))?;

    let committer = &consumer;
    consumer
        .stream()
        .for_each_concurrent(cfg.max_in_flight, |msg| {
            let handler = handler.clone();
            async move {
                match msg {
                    Ok(m) => {
                        let result = handle_payload(&handler, m.payload()).await;
                        if !should_commit(&result) {
                            warn!(partition = m.partition(), offset = m.offset(), "leaving offset uncommitted");
                            return;
                        }
                        if let Err(err) = committer.commit_message(&m, CommitMode::Async) {
                            warn!(error = %err, offset = m.offset(), "failed to commit offset");
                        }
                    }
                    Err(err) => {
                        error!(error = %err, "kafka consumer error");
                        tokio::time::sleep(Duration::from_secs(1)).await;
                    }
                }
            }
        })
        .await;

    warn!("queue stream ended");
    Ok(())
}

/// Runs one queue payload through the handler and logs anything escalated.
///
/// Returns `None` when the payload never reached the handler (absent or not UTF-8).
pub async fn handle_payload<R: DeviceRegistry>(
    handler: &TelemetryHandler<R>,
    payload: Option<&[u8]>,
) -> Option<Result<Outcome, LampSyncError>> {
    let Some(bytes) = payload else {
        warn!("dropping queue message without payload");
        return None;
    };
    let raw = match std::str::from_utf8(bytes) {
        Ok(raw) => raw,
        Err(err) => {
            warn!(error = %err, len = bytes.len(), "dropping non-UTF-8 queue message");
            return None;
        }
    };

    let result = handler.handle(raw).await;
    if let Err(err) = &result {
        error!(code = ?err.code(), error = %err, "message processing failed");
    }
    Some(result)
}

/// Escalated failures stay uncommitted; handled, skipped and dropped messages are done.
pub fn should_commit(result: &Option<Result<Outcome, LampSyncError>>) -> bool {
    !matches!(result, Some(Err(_)))
}

/// Creates the queue topic if it does not exist yet (best-effort).
async fn ensure_queue(brokers: &str, queue: &str) {
    let admin: AdminClient<_> = match ClientConfig::new().set("bootstrap.servers", brokers).create() {
        Ok(a) => a,
        Err(err) => {
            warn!(error = %err, "failed to create kafka admin client");
            return;
        }
    };

    let new_topic = NewTopic::new(queue, 1, TopicReplication::Fixed(1));
    match admin.create_topics([&new_topic], &AdminOptions::new()).await {
        Ok(results) => {
            for res in results {
                match res {
                    Ok(name) => info!(%name, "queue ready"),
                    Err((name, err)) => info!(%name, error = %err, "queue create skipped"),
                }
            }
        }
        Err(err) => warn!(error = %err, "create_topics failed"),
    }
}
