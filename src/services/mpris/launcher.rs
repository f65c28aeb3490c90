use std::{collections::BTreeMap, fmt, process::Stdio};

use tokio::{process::Command, sync::broadcast, task::JoinHandle};
use tracing::{debug, error, info, instrument, warn};

use super::{MprisError, types::SessionEvent};
use crate::config::ProfileConfig;

/// How to launch one kind of player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerProfile {
    /// Profile name, also the suffix of the player's MPRIS bus name
    pub name: String,
    /// Executable to spawn
    pub command: String,
    /// Arguments used when the caller gives none
    pub default_args: Vec<String>,
    /// Process name matched by `killall`
    pub process_name: String,
}

const BUILTIN: &[(&str, &str, &[&str], &str)] = &[
    ("omxplayer", "omxplayer", &["-o", "hdmi", "--blank"], "omxplayer.bin"),
    ("vlc", "vlc", &["-I", "dummy", "--control", "dbus", "-f"], "vlc"),
    ("totem", "totem", &["--fullscreen", "--replace"], "totem"),
];

impl PlayerProfile {
    /// Built-in profile called `name`.
    pub fn builtin(name: &str) -> Option<Self> {
        BUILTIN
            .iter()
            .find(|(profile, ..)| *profile == name)
            .map(|(profile, command, args, process_name)| Self {
                name: (*profile).to_string(),
                command: (*command).to_string(),
                default_args: args.iter().map(|arg| (*arg).to_string()).collect(),
                process_name: (*process_name).to_string(),
            })
    }

    /// Look `name` up in the configured profiles, then in the built-in ones.
    ///
    /// # Errors
    ///
    /// Returns `MprisError::UnknownProfile` if neither knows the name.
    pub fn lookup(
        name: &str,
        configured: &BTreeMap<String, ProfileConfig>,
    ) -> Result<Self, MprisError> {
        if let Some(profile) = configured.get(name) {
            return Ok(Self {
                name: name.to_string(),
                command: profile.command.clone(),
                default_args: profile.args.clone(),
                process_name: profile
                    .process_name
                    .clone()
                    .unwrap_or_else(|| profile.command.clone()),
            });
        }

        Self::builtin(name).ok_or_else(|| MprisError::UnknownProfile(name.to_string()))
    }

    /// Command line for this profile. An override replaces the defaults.
    pub fn resolve(&self, args_override: Option<&[String]>) -> LaunchCommand {
        LaunchCommand {
            program: self.command.clone(),
            args: args_override.map_or_else(|| self.default_args.clone(), <[String]>::to_vec),
        }
    }
}

/// A fully resolved command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchCommand {
    /// Executable
    pub program: String,
    /// Arguments in order
    pub args: Vec<String>,
}

impl fmt::Display for LaunchCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// A spawned player process.
///
/// The process keeps running when this is dropped; stop it through the
/// player's `Quit` method or [`kill_all`].
#[derive(Debug)]
pub struct PlayerProcess {
    pid: Option<u32>,
    _lifecycle: JoinHandle<()>,
}

impl PlayerProcess {
    /// OS process id, if the process was still running after spawn.
    pub fn pid(&self) -> Option<u32> {
        self.pid
    }
}

/// Spawn `command` with all stdio discarded and report its lifecycle on
/// `events`.
///
/// Publishes `Exit` followed by `Close` once the process ends, or `Error` if
/// waiting on it fails.
///
/// # Errors
///
/// Returns `MprisError::ProcessSpawnFailure` if the process cannot be started.
#[instrument(skip_all, fields(command = %command))]
pub fn spawn(
    command: &LaunchCommand,
    events: broadcast::Sender<SessionEvent>,
) -> Result<PlayerProcess, MprisError> {
    let mut child = Command::new(&command.program)
        .args(&command.args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|e| MprisError::ProcessSpawnFailure {
            command: command.to_string(),
            reason: e.to_string(),
        })?;

    let pid = child.id();
    info!(?pid, "player process started");

    let lifecycle = tokio::spawn(async move {
        match child.wait().await {
            Ok(status) => {
                let code = status.code();
                let signal = exit_signal(&status);
                debug!(?code, ?signal, "player process exited");

                let _ = events.send(SessionEvent::Exit(code));
                let _ = events.send(SessionEvent::Close { code, signal });
            }
            Err(e) => {
                error!("failed to wait on player process: {e}");
                let _ = events.send(SessionEvent::Error(e.to_string()));
            }
        }
    });

    Ok(PlayerProcess {
        pid,
        _lifecycle: lifecycle,
    })
}

#[cfg(unix)]
fn exit_signal(status: &std::process::ExitStatus) -> Option<i32> {
    use std::os::unix::process::ExitStatusExt;
    status.signal()
}

#[cfg(not(unix))]
fn exit_signal(_status: &std::process::ExitStatus) -> Option<i32> {
    None
}

/// Run `killall <process_name>`, logging rather than failing.
#[instrument]
pub async fn kill_all(process_name: &str) {
    let result = Command::new("killall")
        .arg(process_name)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await;

    match result {
        Ok(status) if status.success() => debug!("killall succeeded"),
        Ok(status) => debug!(code = ?status.code(), "killall found nothing to kill"),
        Err(e) => warn!("failed to run killall: {e}"),
    }
}
