/// Post-commit side effects of an action
///
/// After an action commits, [`ActivityNotifier::record`] first stores a
/// notification for the actor and then publishes the event. A failed
/// notification write is logged and does not stop the publish: the action
/// itself has already committed.

use std::sync::Arc;

use tracing::{debug, error};

use super::activity::ActivityEvent;
use super::broadcaster::{EventBroadcaster, Subscription};
use crate::store::Store;

#[derive(Clone)]
pub struct ActivityNotifier {
    store: Arc<dyn Store>,
    broadcaster: Arc<EventBroadcaster<ActivityEvent>>,
}

impl ActivityNotifier {
    pub fn new(store: Arc<dyn Store>, broadcaster: Arc<EventBroadcaster<ActivityEvent>>) -> Self {
        Self { store, broadcaster }
    }

    /// Writes the actor's notification, then publishes
    ///
    /// # Returns
    ///
    /// Number of live subscribers that received the event
    pub async fn record(&self, event: ActivityEvent) -> usize {
        let actor = event.actor();
        if let Err(e) = self
            .store
            .insert_notification(actor, &event.notification_message())
            .await
        {
            error!(error = %e, user_id = %actor, event = event.event_type(), "Failed to store notification");
        }

        let delivered = self.broadcaster.publish(event.clone());
        debug!(event = event.event_type(), delivered, "Activity published");
        delivered
    }

    pub fn subscribe(&self) -> Subscription<ActivityEvent> {
        self.broadcaster.subscribe()
    }

    pub fn broadcaster(&self) -> &Arc<EventBroadcaster<ActivityEvent>> {
        &self.broadcaster
    }
}
