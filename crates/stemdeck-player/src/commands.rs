//! Interactive commands read from stdin
//!
//! Lines starting with `{` are separation progress events from an external
//! separation job piped into the player; everything else is a command.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use stemdeck_core::mix::FaderTarget;
use stemdeck_core::separation::SeparationEvent;
use stemdeck_core::ChannelId;

pub const HELP: &str = "\
Commands:
  play | pause | toggle | stop
  seek <secs|m:ss>          jump to a position
  ff [secs] | rw [secs]     skip forward / backward
  vol <stem|master> <0-1>   set a gain (a stem fans out to all when locked)
  fade <stem|master> <0-1> [ms]
                            glide a fader to a gain
  mute <stem>               toggle mute
  lock [on|off]             lock all gains together
  open <dir>                load a separation output folder
  resume <file>             reopen the stems of a recent track
  recent                    list recent tracks
  status                    show transport and mix
  help | quit";

/// Default fade length
const DEFAULT_FADE_MS: u64 = 500;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Play,
    Pause,
    Toggle,
    Stop,
    Seek(f64),
    SkipForward(Option<f64>),
    SkipBackward(Option<f64>),
    Volume(FaderTarget, f32),
    Fade { target: FaderTarget, gain: f32, millis: u64 },
    Mute(ChannelId),
    Lock(Option<bool>),
    Open(PathBuf),
    Resume(PathBuf),
    Recent,
    Status,
    Help,
    Quit,
    Separation(SeparationEvent),
}

impl Command {
    /// Parse one input line. Empty lines give `None`.
    pub fn parse(line: &str) -> Result<Option<Self>> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }
        if line.starts_with('{') {
            return Ok(Some(Command::Separation(SeparationEvent::from_json_line(line)?)));
        }

        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };
        let args: Vec<&str> = rest.split_whitespace().collect();

        let command = match word.to_ascii_lowercase().as_str() {
            "play" => Command::Play,
            "pause" => Command::Pause,
            "toggle" | "p" => Command::Toggle,
            "stop" => Command::Stop,
            "seek" => Command::Seek(parse_time(args.first().context("seek needs a position")?)?),
            "ff" => Command::SkipForward(optional_seconds(args.first())?),
            "rw" => Command::SkipBackward(optional_seconds(args.first())?),
            "vol" | "volume" => {
                let [target, gain] = args[..] else { bail!("usage: vol <stem|master> <gain>") };
                Command::Volume(parse_target(target), parse_gain(gain)?)
            }
            "fade" => {
                let (target, gain, millis) = match args[..] {
                    [target, gain] => (target, gain, DEFAULT_FADE_MS),
                    [target, gain, ms] => (target, gain, ms.parse().with_context(|| format!("invalid length {}", ms))?),
                    _ => bail!("usage: fade <stem|master> <gain> [ms]"),
                };
                Command::Fade {
                    target: parse_target(target),
                    gain: parse_gain(gain)?,
                    millis,
                }
            }
            "mute" => Command::Mute(ChannelId::new(*args.first().context("mute needs a stem")?)),
            "lock" => Command::Lock(match args.first().copied() {
                None => None,
                Some("on") => Some(true),
                Some("off") => Some(false),
                Some(other) => bail!("lock takes on or off, not {}", other),
            }),
            "open" if !rest.is_empty() => Command::Open(PathBuf::from(rest)),
            "resume" if !rest.is_empty() => Command::Resume(PathBuf::from(rest)),
            "open" | "resume" => bail!("{} needs a path", word),
            "recent" => Command::Recent,
            "status" | "s" => Command::Status,
            "help" | "?" => Command::Help,
            "quit" | "exit" | "q" => Command::Quit,
            other => bail!("Unknown command '{}' (try help)", other),
        };
        Ok(Some(command))
    }
}

fn parse_target(word: &str) -> FaderTarget {
    if word.eq_ignore_ascii_case("master") {
        FaderTarget::Master
    } else {
        FaderTarget::Channel(ChannelId::new(word))
    }
}

fn parse_gain(word: &str) -> Result<f32> {
    let gain: f32 = word.parse().with_context(|| format!("invalid gain {}", word))?;
    if !gain.is_finite() {
        bail!("invalid gain {}", word);
    }
    Ok(gain)
}

fn optional_seconds(word: Option<&&str>) -> Result<Option<f64>> {
    word.map(|w| parse_time(w)).transpose()
}

/// Seconds as `90`, `90.5` or `1:30`
pub fn parse_time(word: &str) -> Result<f64> {
    let seconds = match word.split_once(':') {
        Some((minutes, seconds)) => {
            let minutes: u64 = minutes.parse().with_context(|| format!("invalid time {}", word))?;
            let seconds: f64 = seconds.parse().with_context(|| format!("invalid time {}", word))?;
            minutes as f64 * 60.0 + seconds
        }
        None => word.parse().with_context(|| format!("invalid time {}", word))?,
    };
    if !seconds.is_finite() {
        bail!("invalid time {}", word);
    }
    Ok(seconds)
}
