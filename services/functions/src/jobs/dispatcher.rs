//! services/functions/src/jobs/dispatcher.rs
//!
//! Feeds change events to the notification writer, one at a time.

use std::time::Duration;

use launchpad_core::ports::ChangeEventSource;
use launchpad_core::NotificationWriter;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Pause after a source error before asking it again.
const SOURCE_ERROR_PAUSE: Duration = Duration::from_secs(1);

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DispatchStats {
    pub received: usize,
    pub notified: usize,
    pub failed: usize,
}

/// Runs until the source closes or `shutdown` is cancelled. A failing event is
/// logged and dropped; it is not redelivered.
pub async fn run_change_events<S>(
    mut source: S,
    writer: NotificationWriter,
    shutdown: CancellationToken,
) -> DispatchStats
where
    S: ChangeEventSource,
{
    let mut stats = DispatchStats::default();

    loop {
        let next = tokio::select! {
            _ = shutdown.cancelled() => break,
            next = source.next_event() => next,
        };

        match next {
            Ok(Some(event)) => {
                stats.received += 1;
                match writer.handle_event(&event).await {
                    Ok(Some(_)) => stats.notified += 1,
                    Ok(None) => {}
                    Err(e) => {
                        stats.failed += 1;
                        error!(
                            "Notification for {:?} on product {} failed: {}",
                            event.kind, event.product_id, e
                        );
                    }
                }
            }
            Ok(None) => {
                info!("Change-event source closed.");
                break;
            }
            Err(e) => {
                error!("Change-event source error: {}", e);
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = tokio::time::sleep(SOURCE_ERROR_PAUSE) => {}
                }
            }
        }
    }

    stats
}
