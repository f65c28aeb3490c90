use std::{os::unix::net::UnixStream, time::Duration};

use async_trait::async_trait;
use tokio::time;
use zbus::{Guid, connection, interface};

use super::*;
use crate::{
    config::SessionConfig,
    services::mpris::{FacetEvent, MPRIS_PATH},
};

const PLAYER_NAME: &str = "pilot";
const BUS_NAME: &str = "org.mpris.MediaPlayer2.pilot";

/// Registry that always lists the given names.
struct Listed(&'static [&'static str]);

#[async_trait]
impl NameRegistry for Listed {
    async fn list_names(&self) -> Result<Vec<String>, MprisError> {
        Ok(self.0.iter().map(|name| (*name).to_string()).collect())
    }
}

struct Root;

#[interface(name = "org.mpris.MediaPlayer2")]
impl Root {
    fn raise(&self) {}

    fn quit(&self) {}

    #[zbus(property)]
    fn identity(&self) -> String {
        "Pilot Test Player".to_string()
    }

    #[zbus(property)]
    fn can_quit(&self) -> bool {
        true
    }
}

struct Transport {
    volume: f64,
}

#[interface(name = "org.mpris.MediaPlayer2.Player")]
impl Transport {
    fn play(&self) {}

    fn pause(&self) {}

    #[zbus(property)]
    fn playback_status(&self) -> String {
        "Stopped".to_string()
    }

    #[zbus(property)]
    fn volume(&self) -> f64 {
        self.volume
    }

    #[zbus(property)]
    fn set_volume(&mut self, volume: f64) {
        self.volume = volume;
    }
}

/// A player exporting Base and, optionally, Player over a socket pair.
///
/// Returns the player side first; it must outlive the client side.
async fn peer(with_player: bool) -> (Connection, Connection) {
    let (player_end, client_end) = UnixStream::pair().unwrap();

    let mut player = connection::Builder::async_io_unix_stream(player_end)
        .server(Guid::generate())
        .unwrap()
        .p2p()
        .serve_at(MPRIS_PATH, Root)
        .unwrap();
    if with_player {
        player = player
            .serve_at(MPRIS_PATH, Transport { volume: 1.0 })
            .unwrap();
    }
    let client = connection::Builder::async_io_unix_stream(client_end)
        .p2p()
        .build();

    futures::try_join!(player.build(), client).unwrap()
}

fn profile() -> PlayerProfile {
    PlayerProfile {
        name: PLAYER_NAME.to_string(),
        command: PLAYER_NAME.to_string(),
        default_args: Vec::new(),
        process_name: PLAYER_NAME.to_string(),
    }
}

async fn run(
    client: &MprisClient,
    connection: Connection,
) -> Result<PlayerSession, MprisError> {
    time::timeout(
        Duration::from_secs(10),
        client.run_on(connection, &Listed(&[BUS_NAME]), profile(), None),
    )
    .await
    .unwrap()
}

#[test]
fn overlapping_sequences_are_rejected() {
    let client = MprisClient::new(Config::default()).unwrap();

    let first = client.begin("vlc").unwrap();
    let err = client.begin("vlc").unwrap_err();
    assert!(matches!(err, MprisError::ConnectionInProgress(name) if name == "vlc"));

    drop(first);
    assert!(client.begin("vlc").is_ok());
}

#[test]
fn zero_poll_interval_is_rejected_up_front() {
    let config = Config {
        session: SessionConfig {
            poll_interval_ms: 0,
            ..SessionConfig::default()
        },
        ..Config::default()
    };

    let err = MprisClient::new(config).unwrap_err();

    assert!(matches!(
        err,
        ConfigError::InvalidConfigField { ref field, .. } if field == "session.poll_interval_ms"
    ));
}

#[tokio::test]
async fn unknown_profile_fails_before_anything_runs() {
    let client = MprisClient::new(Config::default()).unwrap();

    let err = client.start("winamp", None).await.unwrap_err();

    assert!(matches!(err, MprisError::UnknownProfile(_)));
    assert_eq!(client.state().get(), ConnectionState::Idle);
}

#[tokio::test]
async fn spawn_failure_is_reported_without_connecting() {
    let config = Config::from_toml_str(
        r#"
        [profiles.ghost]
        command = "mpris-pilot-no-such-player"
    "#,
    )
    .unwrap();
    let client = MprisClient::new(config).unwrap();

    let err = client.start("ghost", None).await.unwrap_err();

    assert!(matches!(err, MprisError::ProcessSpawnFailure { .. }));
    assert_eq!(client.state().get(), ConnectionState::Idle);
}

#[tokio::test]
async fn sequence_guard_is_released_after_failure() {
    let client = MprisClient::new(Config::default()).unwrap();

    let _ = client.start("winamp", None).await;
    assert!(client.begin("winamp").is_ok());
}

#[tokio::test]
async fn player_without_optional_interfaces_is_ready() {
    let (_player, connection) = peer(true).await;
    let client = MprisClient::new(Config::default()).unwrap();

    let session = run(&client, connection).await.unwrap();

    assert_eq!(client.state().get(), ConnectionState::Ready);
    assert_eq!(session.bus_name(), BUS_NAME);
    assert!(session.track_list().is_none());
    assert!(session.playlists().is_none());

    let partial = session.partial_failure().unwrap();
    let steps: Vec<_> = partial.causes().map(|(step, _)| step).collect();
    assert_eq!(steps, ["track_list", "playlists"]);
    assert!(!partial.is_fatal());

    let identity = session.base().cached("Identity").await.unwrap();
    assert_eq!(<&str>::try_from(&*identity).unwrap(), "Pilot Test Player");
    assert_eq!(session.base().identity().await.unwrap(), "Pilot Test Player");

    session.disconnect().await.unwrap();
    assert_eq!(client.state().get(), ConnectionState::Idle);
}

#[tokio::test]
async fn property_writes_come_back_through_the_watch() {
    let (_player, connection) = peer(true).await;
    let client = MprisClient::new(Config::default()).unwrap();
    let session = run(&client, connection).await.unwrap();
    let mut rx = session.player().state().subscribe();

    session.player().set_volume(0.5).await.unwrap();

    let event = time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .unwrap()
        .unwrap();
    let FacetEvent::PropertyChanged { property, new, .. } = event else {
        panic!("expected a property change");
    };
    assert_eq!(property, "Volume");
    assert_eq!(f64::try_from(&*new).unwrap(), 0.5);

    session.disconnect().await.unwrap();
}

#[tokio::test]
async fn stop_quits_and_publishes_stop() {
    let (_player, connection) = peer(true).await;
    let client = MprisClient::new(Config::default()).unwrap();
    let mut events = client.session_events();
    let session = run(&client, connection).await.unwrap();

    session.stop(false).await.unwrap();

    assert_eq!(events.recv().await.unwrap(), SessionEvent::Stop);
    assert_eq!(client.state().get(), ConnectionState::Idle);
}

#[tokio::test]
async fn missing_player_interface_fails_the_sequence() {
    let (_player, connection) = peer(false).await;
    let client = MprisClient::new(Config::default()).unwrap();

    let err = run(&client, connection).await.unwrap_err();

    let MprisError::Connect(failure) = err else {
        panic!("expected a connect error");
    };
    assert!(failure.base.is_none());
    assert!(failure.player.is_some());
    assert!(failure.is_fatal());
    assert_eq!(client.state().get(), ConnectionState::Failed);
}

#[tokio::test]
async fn absent_service_fails_at_discovery() {
    let (_player, connection) = peer(true).await;
    let config = Config {
        session: SessionConfig {
            discovery_timeout_ms: 200,
            poll_interval_ms: 50,
            ..SessionConfig::default()
        },
        ..Config::default()
    };
    let client = MprisClient::new(config).unwrap();

    let err = client
        .run_on(connection, &Listed(&[]), profile(), None)
        .await
        .unwrap_err();

    let MprisError::Connect(failure) = err else {
        panic!("expected a connect error");
    };
    assert!(failure.is_timeout());
    assert!(failure.base.is_none());
    assert_eq!(client.state().get(), ConnectionState::Failed);
}
