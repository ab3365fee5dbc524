use common::{
    channel::ChannelId,
    position::{Fix, FusedFix},
};
use strum_macros::EnumDiscriminants;
use tokio::sync::broadcast::error::RecvError;
use tracing::warn;

/// Represents a high-level event in the system.
///
/// Each `Event` wraps an [`EventKind`], which defines the actual type
/// and data carried by the event.
///
/// This structure is designed to be passed through an [`EventBus`]
/// between asynchronous modules.
#[derive(Clone, Debug, PartialEq)]
pub struct Event {
    /// The inner event type and associated data.
    pub kind: EventKind,
}

impl Event {
    /// Returns the payload free type of the event.
    pub fn event_type(&self) -> EventKindType {
        EventKindType::from(&self.kind)
    }
}

/// A fix accepted by one receiver channel.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ChannelFix {
    pub channel: ChannelId,
    pub fix: Fix,
}

/// A thread-safe, reference-counted pointer to a [`ChannelFix`].
pub type ChannelFixPtr = std::sync::Arc<ChannelFix>;

/// A thread-safe, reference-counted pointer to a [`FusedFix`].
///
/// This type alias wraps a [`FusedFix`] inside an [`Arc`](std::sync::Arc),
/// allowing every subscriber to share the same output without copying it.
pub type FusedFixPtr = std::sync::Arc<FusedFix>;

/// Enumerates the different kinds of events that can be emitted
/// and transmitted via the [`EventBus`].
///
/// [`EventKindType`] is the payload free twin of this enum and is used to
/// wait for a specific kind of event.
#[derive(Clone, Debug, PartialEq, EnumDiscriminants)]
#[strum_discriminants(name(EventKindType))]
#[strum_discriminants(derive(Hash))]
pub enum EventKind {
    /// Indicates that a module shall terminate.
    QuitEvent,

    /// A receiver channel accepted and persisted a fix.
    ChannelFixEvent(ChannelFixPtr),

    /// The fused position of one cycle. This is the publish boundary towards
    /// the drive-command subsystem.
    FusedFixEvent(FusedFixPtr),

    /// A fix of the given channel could not be written to its log.
    PersistenceFailureEvent(ChannelId),

    /// The replayed log is exhausted, no further fixes follow.
    ReplayCompleteEvent,
}

/// Returns a reference to the payload of an event if it has the given variant.
///
/// ```rust
/// use module_core::{EventKind, payload_ref};
/// use common::channel::ChannelId;
///
/// let kind = EventKind::PersistenceFailureEvent(ChannelId::A);
/// assert_eq!(payload_ref!(kind, EventKind::PersistenceFailureEvent), Some(&ChannelId::A));
/// ```
#[macro_export]
macro_rules! payload_ref {
    ($kind:expr, $variant:path) => {
        match &$kind {
            $variant(payload) => Some(payload),
            _ => None,
        }
    };
}

/// A simple asynchronous event bus for publishing and subscribing to [`Event`]s.
///
/// The event bus uses a [`tokio::sync::broadcast::channel`] under the hood,
/// allowing multiple receivers to listen for the same stream of events.
///
/// Each published event is cloned and distributed to all active subscribers.
/// If no subscribers exist at the time of publication, the event is discarded silently.
pub struct EventBus {
    /// The broadcast sender used internally to distribute events.
    sender: tokio::sync::broadcast::Sender<Event>,
}

impl EventBus {
    /// Creates a new [`EventBus`] with a fixed buffer capacity of 100 messages.
    ///
    /// When the buffer is full, the oldest messages are dropped automatically
    /// as new ones are published.
    pub fn new() -> Self {
        let (sender, _) = tokio::sync::broadcast::channel(100);
        EventBus { sender }
    }

    /// Subscribes to the event bus and returns a [`tokio::sync::broadcast::Receiver`].
    ///
    /// The returned receiver will receive all future events published after the
    /// subscription is created.
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<Event> {
        self.sender.subscribe()
    }

    /// Publishes an [`Event`] to all active subscribers.
    ///
    /// If no subscribers exist, the event is discarded silently.
    pub fn publish(&self, event: &Event) {
        let _ = self.sender.send(event.clone());
    }

    /// Returns a clone of the sender, e.g. to publish from a signal handler.
    pub fn sender(&self) -> tokio::sync::broadcast::Sender<Event> {
        self.sender.clone()
    }

    /// Creates a [`ModuleCtx`] bound to this [`EventBus`].
    ///
    /// The returned context can be used by modules implementing [`Module`]
    /// to send and receive events within their execution scope.
    pub fn context(&self) -> ModuleCtx {
        ModuleCtx::new(self)
    }
}

/// Provides a default instance of [`EventBus`].
impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Defines the common interface for an asynchronous module
/// that can be executed and communicate via the [`EventBus`].
#[async_trait::async_trait]
pub trait Module {
    /// Runs the module asynchronously until completion.
    ///
    /// This function typically contains the module's main event loop,
    /// reacting to messages received through the [`ModuleCtx`].
    async fn run(&mut self) -> Result<(), ()>;
}

/// Provides a module-scoped context for interacting with the [`EventBus`].
///
/// Each `ModuleCtx` owns both a sender and a receiver, allowing the module
/// to both publish and listen for events concurrently.
pub struct ModuleCtx {
    /// The broadcast sender used to publish events.
    pub sender: tokio::sync::broadcast::Sender<Event>,

    /// The broadcast receiver used to listen for events.
    pub receiver: tokio::sync::broadcast::Receiver<Event>,
}

impl ModuleCtx {
    /// Constructs a new [`ModuleCtx`] from the given [`EventBus`].
    ///
    /// Clones the internal broadcast sender and creates a new receiver.
    pub fn new(event_bus: &EventBus) -> Self {
        ModuleCtx {
            sender: event_bus.sender.clone(),
            receiver: event_bus.subscribe(),
        }
    }

    /// Publishes an event with the given kind.
    ///
    /// Fails only if no module is subscribed to the bus anymore.
    pub fn publish_event(
        &self,
        kind: EventKind,
    ) -> Result<(), tokio::sync::broadcast::error::SendError<Event>> {
        self.sender.send(Event { kind }).map(|_| ())
    }

    /// Waits until a [`EventKind::QuitEvent`] is received or the bus is gone.
    ///
    /// All other events are discarded.
    pub async fn wait_for_quit(&mut self) {
        loop {
            match self.receiver.recv().await {
                Ok(Event {
                    kind: EventKind::QuitEvent,
                })
                | Err(RecvError::Closed) => return,
                Ok(_) => {}
                Err(RecvError::Lagged(missed)) => {
                    warn!("Missed {} events while waiting for quit", missed)
                }
            }
        }
    }
}

pub mod test_helper;
