//! Playback of a written WAV file through the platform's command-line player.
//!
//! Playback is best effort. Every failure is reported as a
//! [`PlaybackOutcome`] instead of an error, and the file on disk is never
//! touched, so a missing player still leaves the user with a usable WAV.

use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Whether to play the rendered file, and whether to block until it ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackMode {
    Off,
    /// Launch the player and return immediately.
    Start,
    #[default]
    Wait,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackOutcome {
    /// The player ran to completion.
    Played,
    /// The player was launched and left running.
    Started,
    /// Playback was disabled or no player is available.
    SavedOnly,
    Failed(String),
}

impl fmt::Display for PlaybackOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlaybackOutcome::Played => write!(f, "played"),
            PlaybackOutcome::Started => write!(f, "playing in the background"),
            PlaybackOutcome::SavedOnly => write!(f, "saved only, open the file to listen"),
            PlaybackOutcome::Failed(reason) => write!(f, "playback failed: {reason}"),
        }
    }
}

/// An external program that plays a WAV file given as its last argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    pub program: String,
    pub args: Vec<String>,
    /// The program hands the file to another process and exits at once, so
    /// its exit says nothing about when playback ends.
    pub detaches: bool,
}

impl Player {
    pub fn new(program: &str, args: &[&str]) -> Self {
        Player {
            program: program.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
            detaches: false,
        }
    }

    pub fn detached(mut self) -> Self {
        self.detaches = true;
        self
    }

    /// Players to try on this platform, in order of preference.
    pub fn candidates() -> Vec<Player> {
        if cfg!(target_os = "macos") {
            vec![Player::new("afplay", &[])]
        } else if cfg!(windows) {
            vec![Player::new("cmd", &["/C", "start", ""]).detached()]
        } else {
            vec![
                Player::new("aplay", &["-q"]),
                Player::new("paplay", &[]),
                Player::new("ffplay", &["-nodisp", "-autoexit", "-loglevel", "quiet"]),
            ]
        }
    }

    /// First candidate whose program is found on `PATH`.
    pub fn detect() -> Option<Player> {
        Self::candidates()
            .into_iter()
            .find(|p| find_on_path(&p.program).is_some())
    }

    /// Run the player on `path`. With `wait`, block until it exits; a
    /// detaching player that exits cleanly is reported as [`PlaybackOutcome::Started`].
    pub fn run(&self, path: &Path, wait: bool) -> PlaybackOutcome {
        let spawned = Command::new(&self.program)
            .args(&self.args)
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn();
        let mut child = match spawned {
            Ok(child) => child,
            Err(e) => return PlaybackOutcome::Failed(format!("could not start {}: {e}", self.program)),
        };
        debug!(player = %self.program, pid = child.id(), "player started");

        if !wait {
            return PlaybackOutcome::Started;
        }
        loop {
            match child.try_wait() {
                Ok(Some(status)) if status.success() && self.detaches => {
                    return PlaybackOutcome::Started;
                }
                Ok(Some(status)) if status.success() => return PlaybackOutcome::Played,
                Ok(Some(status)) => {
                    return PlaybackOutcome::Failed(format!("{} exited with {status}", self.program));
                }
                Ok(None) => thread::sleep(POLL_INTERVAL),
                Err(e) => return PlaybackOutcome::Failed(format!("waiting on {}: {e}", self.program)),
            }
        }
    }
}

fn find_on_path(program: &str) -> Option<PathBuf> {
    let paths = std::env::var_os("PATH")?;
    std::env::split_paths(&paths).find_map(|dir| {
        let candidate = dir.join(program);
        if candidate.is_file() {
            return Some(candidate);
        }
        let exe = candidate.with_extension("exe");
        exe.is_file().then_some(exe)
    })
}

/// Play `path` according to `mode` with the first available player.
pub fn play(path: &Path, mode: PlaybackMode) -> PlaybackOutcome {
    if mode == PlaybackMode::Off {
        return PlaybackOutcome::SavedOnly;
    }
    if !path.is_file() {
        let outcome = PlaybackOutcome::Failed(format!("{} does not exist", path.display()));
        warn!(%outcome, "nothing to play");
        return outcome;
    }
    let Some(player) = Player::detect() else {
        warn!(path = %path.display(), "no audio player found");
        return PlaybackOutcome::SavedOnly;
    };

    info!(player = %player.program, path = %path.display(), "playing");
    let outcome = player.run(path, mode == PlaybackMode::Wait);
    if let PlaybackOutcome::Failed(reason) = &outcome {
        warn!(player = %player.program, %reason, "playback failed");
    }
    outcome
}
