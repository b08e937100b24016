//! Fan-out of one line to every authenticated connection.

use std::sync::Arc;

use chat_protocol::Origin;
use chat_transport::ConnectionHandle;
use tracing::{debug, warn};

use crate::registry::ConnectionRegistry;

/// Outcome of one broadcast.
#[derive(Debug, Default)]
pub struct Delivery {
    pub delivered: usize,
    /// Recipients whose send failed; the caller evicts them.
    pub failed: Vec<ConnectionHandle>,
}

pub struct Broadcaster {
    registry: Arc<ConnectionRegistry>,
}

impl Broadcaster {
    pub fn new(registry: Arc<ConnectionRegistry>) -> Self {
        Self { registry }
    }

    /// Send `payload`, formatted for `origin`, to a snapshot of the
    /// authenticated connections. The sender gets its own line too.
    /// A failed recipient never stops delivery to the rest.
    pub fn broadcast(&self, origin: Origin<'_>, payload: &str) -> Delivery {
        let line = origin.format(payload);
        let recipients = self.registry.snapshot();
        let mut delivery = Delivery::default();

        for recipient in recipients {
            match recipient.handle.send(line.as_str()) {
                Ok(()) => delivery.delivered += 1,
                Err(e) => {
                    warn!("failed to deliver to {} ({}): {e}", recipient.identity, recipient.handle);
                    delivery.failed.push(recipient.handle);
                }
            }
        }

        debug!(
            "broadcast {:?} to {} recipients ({} failed)",
            line,
            delivery.delivered,
            delivery.failed.len()
        );
        delivery
    }
}
