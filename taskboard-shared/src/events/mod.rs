/// Activity events and live fan-out
///
/// - [`activity`]: the event payloads sent to clients
/// - [`broadcaster`]: generic bounded fan-out with drop-on-full queues
/// - [`notifier`]: durable notification followed by publish

pub mod activity;
pub mod broadcaster;
pub mod notifier;

pub use activity::ActivityEvent;
pub use broadcaster::{EventBroadcaster, Subscription, SubscriptionStream, DEFAULT_QUEUE_CAPACITY};
pub use notifier::ActivityNotifier;
