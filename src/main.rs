//! mpris-pilot: start a media player, play a URI and report what it does.

use std::{error::Error, path::PathBuf};

use clap::Parser;
use futures::StreamExt;
use mpris_pilot::{
    config::Config,
    services::mpris::{
        BaseFacet, FacetEvent, MprisClient, PlaybackState, PlayerFacet, SessionEvent,
    },
    tracing_config,
};
use tokio::{signal, sync::broadcast};
use tracing::{debug, info, warn};
use zbus::zvariant::Value;

#[derive(Parser)]
#[command(name = "mpris-pilot")]
#[command(about = "Play a URI in an MPRIS2 media player")]
struct Cli {
    /// Media player profile to start
    #[arg(short, long, visible_alias = "mediaplayer", default_value = "vlc")]
    player: String,

    /// URI to play; local files use the "file://" scheme
    #[arg(short, long, required_unless_present = "config_schema")]
    uri: Option<String>,

    /// Configuration file to use instead of the XDG location
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Also write logs to a daily file under ~/.mpris-pilot/logs
    #[arg(long)]
    log_file: bool,

    /// Print the configuration JSON schema and exit
    #[arg(long)]
    config_schema: bool,

    /// Arguments replacing the profile's defaults
    #[arg(last = true)]
    player_args: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if cli.config_schema {
        println!("{}", Config::schema_json()?);
        return Ok(());
    }

    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::load_default()?,
    };

    let _log_guard = if cli.log_file {
        Some(tracing_config::init_with_file(config.general.log_level, None)?)
    } else {
        tracing_config::init(config.general.log_level)?;
        None
    };

    let Some(uri) = cli.uri else {
        return Err("--uri is required".into());
    };

    let client = MprisClient::new(config)?;
    let mut lifecycle = client.session_events();
    let args_override = (!cli.player_args.is_empty()).then_some(cli.player_args.as_slice());

    let session = client.start(&cli.player, args_override).await?;
    tokio::spawn(report_changes(
        session.base().clone(),
        session.player().clone(),
    ));

    session.player().open_uri(&uri).await?;
    session.player().play().await?;

    println!("\nSupported Uri Schemes:");
    println!("{:#?}", session.base().supported_uri_schemes().await?);
    println!("\nSupported Mimetypes:");
    println!("{:#?}", session.base().supported_mime_types().await?);

    tokio::select! {
        result = signal::ctrl_c() => {
            result?;
            info!("interrupted, stopping {}", session.player_name());
            session.stop(false).await?;
        }
        () = wait_for_close(&mut lifecycle) => {
            info!("{} exited", session.player_name());
            session.disconnect().await?;
        }
    }

    Ok(())
}

async fn wait_for_close(events: &mut broadcast::Receiver<SessionEvent>) {
    loop {
        match events.recv().await {
            Ok(SessionEvent::Close { code, signal }) => {
                debug!(?code, ?signal, "player closed");
                return;
            }
            Ok(SessionEvent::Error(e)) => warn!("player process error: {e}"),
            Ok(_) => {}
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!(skipped, "missed player lifecycle events");
            }
            Err(broadcast::error::RecvError::Closed) => return,
        }
    }
}

async fn report_changes(base: BaseFacet, player: PlayerFacet) {
    let mut events = Box::pin(player.state().events());
    let mut metadata_keys = None;

    while let Some(event) = events.next().await {
        let FacetEvent::PropertyChanged { property, new, old } = event else {
            continue;
        };

        match property.as_str() {
            "Metadata" => {
                let Ok(metadata) = player.metadata().await else {
                    continue;
                };
                if metadata_keys != Some(metadata.len()) {
                    metadata_keys = Some(metadata.len());
                    println!("Metadata updated:");
                    println!("{metadata:#?}");
                }
            }
            "PlaybackStatus" if old.as_deref() != Some(&*new) => {
                let Some(status) = as_str(&new).map(PlaybackState::from) else {
                    continue;
                };
                let identity = base.identity().await.unwrap_or_default();
                let url = player
                    .metadata()
                    .await
                    .ok()
                    .and_then(|metadata| {
                        metadata
                            .get("xesam:url")
                            .and_then(|v| as_str(v))
                            .map(str::to_string)
                    })
                    .unwrap_or_default();

                println!(
                    "{identity} is now {} \"{url}\"",
                    status.to_string().to_lowercase()
                );
            }
            _ => {}
        }
    }
}

fn as_str<'a>(value: &'a Value<'_>) -> Option<&'a str> {
    match value {
        Value::Str(s) => Some(s.as_str()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_string_values_read_as_str() {
        let status = Value::from("Playing");

        assert_eq!(as_str(&status), Some("Playing"));
        assert_eq!(as_str(&Value::from(0.5f64)), None);
    }
}
