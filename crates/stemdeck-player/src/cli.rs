//! Command line arguments

use std::path::PathBuf;

use anyhow::{bail, Context, Result};

pub const USAGE: &str = "\
Usage: stemdeck-player [OPTIONS] [OUTPUT_DIR]

Plays the stems of one separated track from OUTPUT_DIR
(<OUTPUT_DIR>/<name>_<stem>.wav).

Options:
  --input <FILE>     Original track, remembered in the recent list
  --resume <FILE>    Reopen the stems of a previously separated track
  --config <FILE>    Config file (default: <config dir>/stemdeck/config.yaml)
  --list-devices     List audio output devices and exit
  -h, --help         Show this help";

#[derive(Debug, Default, PartialEq)]
pub struct Args {
    pub output_dir: Option<PathBuf>,
    pub input: Option<PathBuf>,
    pub resume: Option<PathBuf>,
    pub config: Option<PathBuf>,
    pub list_devices: bool,
    pub help: bool,
}

impl Args {
    pub fn parse<I>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = String>,
    {
        let mut parsed = Args::default();
        let mut args = args.into_iter();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--input" => parsed.input = Some(value(&mut args, &arg)?),
                "--resume" => parsed.resume = Some(value(&mut args, &arg)?),
                "--config" => parsed.config = Some(value(&mut args, &arg)?),
                "--list-devices" => parsed.list_devices = true,
                "-h" | "--help" => parsed.help = true,
                flag if flag.starts_with('-') => bail!("Unknown option {}\n\n{}", flag, USAGE),
                _ if parsed.output_dir.is_some() => bail!("Only one OUTPUT_DIR may be given"),
                _ => parsed.output_dir = Some(PathBuf::from(arg)),
            }
        }

        if parsed.output_dir.is_some() && parsed.resume.is_some() {
            bail!("OUTPUT_DIR and --resume are mutually exclusive");
        }
        Ok(parsed)
    }
}

fn value(args: &mut impl Iterator<Item = String>, flag: &str) -> Result<PathBuf> {
    args.next()
        .map(PathBuf::from)
        .with_context(|| format!("{} needs a value", flag))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Args> {
        Args::parse(args.iter().map(|s| s.to_string()))
    }

    #[test]
    fn test_output_dir_and_input() {
        let args = parse(&["--input", "/in/song.mp3", "/out/song"]).unwrap();
        assert_eq!(args.output_dir, Some(PathBuf::from("/out/song")));
        assert_eq!(args.input, Some(PathBuf::from("/in/song.mp3")));
        assert!(!args.list_devices);
    }

    #[test]
    fn test_flags() {
        let args = parse(&["--list-devices", "--config", "c.yaml"]).unwrap();
        assert!(args.list_devices);
        assert_eq!(args.config, Some(PathBuf::from("c.yaml")));
        assert!(parse(&["-h"]).unwrap().help);
        assert_eq!(parse(&[]).unwrap(), Args::default());
    }

    #[test]
    fn test_errors() {
        assert!(parse(&["--resume"]).is_err());
        assert!(parse(&["--bogus"]).is_err());
        assert!(parse(&["a", "b"]).is_err());
        assert!(parse(&["/out/song", "--resume", "/in/song.mp3"]).is_err());
    }
}
