//! Composition root.
//!
//! Wires repositories, pushers, backends and use cases together in dependency
//! order so the binary and the integration tests build the same graph.

use std::sync::Arc;

use encore_shared::time::Clock;
use tokio::{sync::broadcast, task::JoinHandle};

use crate::{
    config::Settings,
    domain::{ClientRepository, MessagePusher, PlaybackError, Queue, RelayHub},
    infrastructure::{
        DefaultBackendProvider, EmbeddedArtworkSource, InMemoryClientRepository,
        WebSocketMessagePusher,
    },
    ui::state::AppState,
    usecase::{
        AutoAdvanceMonitor, BroadcastEventsUseCase, ChatCommandUseCase, ConnectClientUseCase,
        DisconnectClientUseCase, Notification, Notifier, PlaybackFacade, QueueEngine,
        RelayMessageUseCase,
    },
};

/// Fully wired application, before any background task is started.
pub struct App {
    pub state: AppState,
    pub hub: Arc<RelayHub>,
    monitor: Arc<AutoAdvanceMonitor>,
    events: BroadcastEventsUseCase,
    queue_events: broadcast::Receiver<Queue>,
    notifications: broadcast::Receiver<Notification>,
}

impl App {
    /// Build every component from `settings`.
    ///
    /// # Errors
    ///
    /// Fails only when the HTTP client for the desktop backends cannot be created.
    pub fn build(settings: &Settings, clock: Arc<dyn Clock>) -> Result<Self, PlaybackError> {
        // 1. Repository and MessagePusher
        let repository: Arc<dyn ClientRepository> = Arc::new(InMemoryClientRepository::new());
        let message_pusher: Arc<dyn MessagePusher> = Arc::new(WebSocketMessagePusher::new());
        let hub = Arc::new(RelayHub::new(repository.clone(), message_pusher.clone()));

        // 2. Playback backends
        let provider = Arc::new(DefaultBackendProvider::new(
            hub.clone(),
            settings.playback.request_timeout(),
            settings.youtube_endpoint(),
            settings.cider_endpoint(),
        )?);
        let playback = Arc::new(PlaybackFacade::new(
            provider,
            settings.playback.platform.clone(),
        ));

        // 3. Queue, notifications and the monitor
        let queue = Arc::new(QueueEngine::default());
        let notifier = Notifier::default();
        let queue_events = queue.subscribe();
        let notifications = notifier.subscribe();
        let monitor = Arc::new(AutoAdvanceMonitor::new(
            playback.clone(),
            queue.clone(),
            notifier,
            clock,
            settings.monitor_settings(),
        ));

        // 4. UseCases
        let state = AppState {
            connect_client_usecase: Arc::new(ConnectClientUseCase::new(
                repository.clone(),
                message_pusher.clone(),
            )),
            disconnect_client_usecase: Arc::new(DisconnectClientUseCase::new(
                repository.clone(),
                message_pusher,
            )),
            relay_message_usecase: Arc::new(RelayMessageUseCase::new(
                hub.clone(),
                Arc::new(EmbeddedArtworkSource),
            )),
            chat_command_usecase: Arc::new(ChatCommandUseCase::new(
                settings.chat_settings(),
                queue.clone(),
                playback.clone(),
                monitor.clone(),
            )),
            queue,
            playback,
            monitor: monitor.clone(),
            repository,
        };

        Ok(Self {
            state,
            events: BroadcastEventsUseCase::new(hub.clone()),
            hub,
            monitor,
            queue_events,
            notifications,
        })
    }

    /// Start the monitor loop and the event fan-out.
    ///
    /// The returned handles never finish on their own; abort them on shutdown.
    pub fn start(self) -> (AppState, Vec<JoinHandle<()>>) {
        let monitor = tokio::spawn(self.monitor.run());
        let events = tokio::spawn(self.events.run(self.queue_events, self.notifications));
        (self.state, vec![monitor, events])
    }
}
