use std::sync::Arc;

use futures::Stream;
use tokio::sync::{Mutex, MutexGuard, broadcast};
use tokio_stream::{
    StreamExt,
    wrappers::{BroadcastStream, errors::BroadcastStreamRecvError},
};
use tracing::{info, instrument, warn};
use zbus::{Connection, fdo::DBusProxy};

use super::{
    ConnectError, MprisError,
    binder::BindContext,
    contract::bus_name_for,
    discovery::{self, NameRegistry},
    facet::{BaseFacet, PlayerFacet, PlaylistsFacet, TrackListFacet},
    launcher::{self, PlayerProcess, PlayerProfile},
    monitoring::{FacetStates, PropertyWatch},
    types::{ConnectionState, SessionEvent},
};
use crate::{
    config::{Config, ConfigError},
    services::common::Property,
};

const SESSION_EVENT_CAPACITY: usize = 32;

/// Entry point for controlling MPRIS players.
///
/// Runs one connection sequence at a time and publishes its progress as a
/// watchable [`ConnectionState`]. Process lifecycle events of every session
/// started through this client go to one channel; subscribe with
/// [`MprisClient::session_events`] before calling [`MprisClient::start`] to
/// see all of them.
#[derive(Clone, Debug)]
pub struct MprisClient {
    config: Arc<Config>,
    state: Property<ConnectionState>,
    sequence: Arc<Mutex<()>>,
    events: broadcast::Sender<SessionEvent>,
}

impl MprisClient {
    /// Create a client using `config` for timing and launch profiles.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidConfigField` if `config` does not pass
    /// [`Config::validate`], e.g. a zero poll interval.
    pub fn new(config: Config) -> Result<Self, ConfigError> {
        config.validate()?;

        let (events, _) = broadcast::channel(SESSION_EVENT_CAPACITY);
        Ok(Self {
            config: Arc::new(config),
            state: Property::new(ConnectionState::Idle),
            sequence: Arc::new(Mutex::new(())),
            events,
        })
    }

    /// Progress of the current or last connection sequence.
    pub fn state(&self) -> &Property<ConnectionState> {
        &self.state
    }

    /// Subscribe to process and session lifecycle events.
    pub fn session_events(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Launch the player described by `profile` and connect to it.
    ///
    /// `args_override` replaces the profile's default arguments entirely.
    /// The connection sequence starts right after the process is spawned;
    /// process exit and errors are reported on [`MprisClient::session_events`]
    /// and never fail the sequence.
    ///
    /// # Errors
    ///
    /// Returns `MprisError::UnknownProfile` for an unknown profile,
    /// `MprisError::ConnectionInProgress` if a sequence is already running,
    /// `MprisError::ProcessSpawnFailure` if the process cannot be started,
    /// and `MprisError::Connect` if a required connection step fails.
    #[instrument(skip(self))]
    pub async fn start(
        &self,
        profile: &str,
        args_override: Option<&[String]>,
    ) -> Result<PlayerSession, MprisError> {
        let profile = PlayerProfile::lookup(profile, &self.config.profiles)?;
        let _sequence = self.begin(&profile.name)?;

        let command = profile.resolve(args_override);
        let process = launcher::spawn(&command, self.events.clone())?;

        self.run(profile, Some(process)).await
    }

    /// Connect to an already running player registered as
    /// `org.mpris.MediaPlayer2.<player_name>`.
    ///
    /// # Errors
    ///
    /// Returns `MprisError::ConnectionInProgress` if a sequence is already
    /// running and `MprisError::Connect` if a required connection step fails.
    #[instrument(skip(self))]
    pub async fn connect(&self, player_name: &str) -> Result<PlayerSession, MprisError> {
        let _sequence = self.begin(player_name)?;

        let profile = PlayerProfile::lookup(player_name, &self.config.profiles)
            .unwrap_or_else(|_| PlayerProfile {
                name: player_name.to_string(),
                command: player_name.to_string(),
                default_args: Vec::new(),
                process_name: player_name.to_string(),
            });

        self.run(profile, None).await
    }

    fn begin(&self, player_name: &str) -> Result<MutexGuard<'_, ()>, MprisError> {
        self.sequence
            .try_lock()
            .map_err(|_| MprisError::ConnectionInProgress(player_name.to_string()))
    }

    async fn run(
        &self,
        profile: PlayerProfile,
        process: Option<PlayerProcess>,
    ) -> Result<PlayerSession, MprisError> {
        self.state.set(ConnectionState::AwaitingService);

        let connection = match Connection::session().await {
            Ok(connection) => connection,
            Err(e) => {
                self.state.set(ConnectionState::Failed);
                return Err(e.into());
            }
        };

        let registry = match DBusProxy::new(&connection).await {
            Ok(registry) => registry,
            Err(e) => {
                self.state.set(ConnectionState::Failed);
                close_quietly(connection).await;

                let mut failure = ConnectError::new(&bus_name_for(&profile.name));
                failure.discovery = Some(Box::new(e.into()));
                return Err(failure.into());
            }
        };

        self.run_on(connection, &registry, profile, process).await
    }

    /// Discovery, the four binds and the property watch over `connection`.
    ///
    /// TrackList and Playlists are optional: when only they fail, the
    /// session is still `Ready` and their causes are kept in
    /// [`PlayerSession::partial_failure`].
    pub(crate) async fn run_on(
        &self,
        connection: Connection,
        registry: &dyn NameRegistry,
        profile: PlayerProfile,
        process: Option<PlayerProcess>,
    ) -> Result<PlayerSession, MprisError> {
        let bus_name = bus_name_for(&profile.name);
        self.state.set(ConnectionState::AwaitingService);

        let discovered = discovery::await_service(
            registry,
            &bus_name,
            self.config.session.discovery_timeout(),
            self.config.session.poll_interval(),
        )
        .await;
        if let Err(e) = discovered {
            self.state.set(ConnectionState::Failed);
            close_quietly(connection).await;

            let mut failure = ConnectError::new(&bus_name);
            failure.discovery = Some(Box::new(e));
            return Err(failure.into());
        }

        let ctx = BindContext {
            connection: connection.clone(),
            service: bus_name.clone(),
            call_timeout: self.config.session.call_timeout(),
        };
        let states = FacetStates::new();
        let mut failure = ConnectError::new(&bus_name);

        self.state.set(ConnectionState::BindingBase);
        let base = BaseFacet::bind(&ctx, Arc::clone(&states.base))
            .await
            .map_err(|e| failure.base = Some(Box::new(e)))
            .ok();

        self.state.set(ConnectionState::BindingPlayer);
        let player = PlayerFacet::bind(&ctx, Arc::clone(&states.player))
            .await
            .map_err(|e| failure.player = Some(Box::new(e)))
            .ok();

        self.state.set(ConnectionState::BindingTrackList);
        let track_list = TrackListFacet::bind(&ctx, Arc::clone(&states.track_list))
            .await
            .map_err(|e| failure.track_list = Some(Box::new(e)))
            .ok();

        self.state.set(ConnectionState::BindingPlaylists);
        let playlists = PlaylistsFacet::bind(&ctx, Arc::clone(&states.playlists))
            .await
            .map_err(|e| failure.playlists = Some(Box::new(e)))
            .ok();

        self.state.set(ConnectionState::WatchingProperties);
        let watch = PropertyWatch::attach(&connection, &bus_name, states)
            .await
            .map_err(|e| failure.watch = Some(Box::new(e)))
            .ok();

        match (base, player, watch) {
            (Some(base), Some(player), Some(watch)) => {
                self.state.set(ConnectionState::Ready);
                if failure.is_empty() {
                    info!(service = %bus_name, "player ready");
                } else {
                    warn!(
                        service = %bus_name,
                        "player ready without optional interfaces: {failure}"
                    );
                }

                Ok(PlayerSession {
                    process_name: profile.process_name,
                    player_name: profile.name,
                    bus_name,
                    connection,
                    base,
                    player,
                    track_list,
                    playlists,
                    watch: Some(watch),
                    partial_failure: (!failure.is_empty()).then_some(failure),
                    process,
                    events: self.events.clone(),
                    state: self.state.clone(),
                })
            }
            (_, player, watch) => {
                self.state.set(ConnectionState::Failed);
                warn!(service = %bus_name, "connection sequence failed: {failure}");

                if let Some(player) = player {
                    player.stop_signals();
                }
                if let Some(track_list) = track_list {
                    track_list.stop_signals();
                }
                if let Some(playlists) = playlists {
                    playlists.stop_signals();
                }
                if let Some(watch) = watch {
                    watch.detach();
                }
                close_quietly(connection).await;

                Err(failure.into())
            }
        }
    }
}

async fn close_quietly(connection: Connection) {
    if let Err(e) = connection.close().await {
        warn!("failed to close bus connection: {e}");
    }
}

/// A connected player and its bound facets.
///
/// Base and Player are always bound. TrackList and Playlists are present
/// only when the player exports them.
///
/// Consumed by [`PlayerSession::disconnect`] or [`PlayerSession::stop`].
/// Dropping a session also stops all forwarding.
#[derive(Debug)]
pub struct PlayerSession {
    player_name: String,
    bus_name: String,
    process_name: String,
    connection: Connection,
    base: BaseFacet,
    player: PlayerFacet,
    track_list: Option<TrackListFacet>,
    playlists: Option<PlaylistsFacet>,
    watch: Option<PropertyWatch>,
    partial_failure: Option<ConnectError>,
    process: Option<PlayerProcess>,
    events: broadcast::Sender<SessionEvent>,
    state: Property<ConnectionState>,
}

impl PlayerSession {
    /// Player name the session was opened for, e.g. `vlc`.
    pub fn player_name(&self) -> &str {
        &self.player_name
    }

    /// Full bus name, e.g. `org.mpris.MediaPlayer2.vlc`.
    pub fn bus_name(&self) -> &str {
        &self.bus_name
    }

    /// `org.mpris.MediaPlayer2`
    pub fn base(&self) -> &BaseFacet {
        &self.base
    }

    /// `org.mpris.MediaPlayer2.Player`
    pub fn player(&self) -> &PlayerFacet {
        &self.player
    }

    /// `org.mpris.MediaPlayer2.TrackList`, if the player exports it.
    pub fn track_list(&self) -> Option<&TrackListFacet> {
        self.track_list.as_ref()
    }

    /// `org.mpris.MediaPlayer2.Playlists`, if the player exports it.
    pub fn playlists(&self) -> Option<&PlaylistsFacet> {
        self.playlists.as_ref()
    }

    /// Causes recorded for optional interfaces that could not be bound.
    pub fn partial_failure(&self) -> Option<&ConnectError> {
        self.partial_failure.as_ref()
    }

    /// Process spawned for this session, if it was started rather than
    /// connected to.
    pub fn process(&self) -> Option<&PlayerProcess> {
        self.process.as_ref()
    }

    /// Subscribe to lifecycle events.
    pub fn events(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Lifecycle events as a stream.
    ///
    /// Events missed by a lagging consumer are skipped with a warning.
    pub fn event_stream(&self) -> impl Stream<Item = SessionEvent> + Send + use<> {
        BroadcastStream::new(self.events.subscribe()).filter_map(|event| match event {
            Ok(event) => Some(event),
            Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                warn!(skipped, "session event consumer lagged");
                None
            }
        })
    }

    /// Stop all forwarding and close the bus connection.
    ///
    /// The player process, if any, keeps running.
    ///
    /// # Errors
    ///
    /// Returns `MprisError::TeardownFailure` if the connection does not close
    /// cleanly.
    #[instrument(skip(self), fields(service = %self.bus_name))]
    pub async fn disconnect(mut self) -> Result<(), MprisError> {
        self.player.stop_signals();
        if let Some(track_list) = &self.track_list {
            track_list.stop_signals();
        }
        if let Some(playlists) = &self.playlists {
            playlists.stop_signals();
        }
        if let Some(watch) = self.watch.take() {
            watch.detach();
        }

        self.state.set(ConnectionState::Idle);
        let result = self
            .connection
            .clone()
            .close()
            .await
            .map_err(|e| MprisError::TeardownFailure(e.to_string()));

        info!("disconnected");
        result
    }

    /// Ask the player to quit, optionally `killall` its process, then
    /// disconnect and publish [`SessionEvent::Stop`].
    ///
    /// # Errors
    ///
    /// Returns the `Quit` call's error if it failed, otherwise any teardown
    /// failure.
    #[instrument(skip(self), fields(service = %self.bus_name))]
    pub async fn stop(self, kill_all: bool) -> Result<(), MprisError> {
        let quit = self.base.quit().await;
        if let Err(e) = &quit {
            warn!("Quit failed: {e}");
        }

        if kill_all {
            launcher::kill_all(&self.process_name).await;
        }

        let events = self.events.clone();
        let teardown = self.disconnect().await;
        let _ = events.send(SessionEvent::Stop);

        quit.and(teardown)
    }
}

#[cfg(test)]
mod tests;
