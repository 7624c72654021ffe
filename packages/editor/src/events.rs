//! Notifications sent to the authoring host.
//!
//! The channel is passed explicitly to every synchronizer; nothing is
//! dispatched globally. Sends are fire-and-forget: a host that is not
//! listening simply misses the event.

use pagekit_common::constants::ASYNC_CONTENT_LOADED_EVENT;
use tokio::sync::broadcast;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostEvent {
    /// A node's model has been injected and rendered; authoring can attach
    AsyncContentLoaded,
}

impl HostEvent {
    pub fn name(&self) -> &'static str {
        match self {
            HostEvent::AsyncContentLoaded => ASYNC_CONTENT_LOADED_EVENT,
        }
    }
}

pub type EventChannel = broadcast::Sender<HostEvent>;

/// Create a host event channel and its first receiver
pub fn event_channel(capacity: usize) -> (EventChannel, broadcast::Receiver<HostEvent>) {
    broadcast::channel(capacity)
}

pub(crate) fn emit(channel: Option<&EventChannel>, event: HostEvent) {
    let Some(channel) = channel else {
        return;
    };

    if channel.send(event).is_err() {
        debug!(event = event.name(), "No host listening for event");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emit_without_receivers_is_silent() {
        let (tx, rx) = event_channel(4);
        drop(rx);
        emit(Some(&tx), HostEvent::AsyncContentLoaded);
        emit(None, HostEvent::AsyncContentLoaded);
    }

    #[test]
    fn test_event_name() {
        assert_eq!(HostEvent::AsyncContentLoaded.name(), "cq-async-content-loaded");
    }
}
