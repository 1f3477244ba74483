#![forbid(unsafe_code)]

//! Command-line argument parsing for the demo.
//!
//! Parses args manually. Supports environment variable overrides via the
//! `EPG_DEMO_*` prefix; explicit flags win over the environment.

use std::env;
use std::path::PathBuf;
use std::process;

const VERSION: &str = env!("CARGO_PKG_VERSION");

const HELP_TEXT: &str = "\
EPG Grid Demo - headless program-guide viewport

USAGE:
    epg-demo [OPTIONS]

OPTIONS:
    --channels=N         Mock channel count (default: 100)
    --seed=N             Mock RNG seed (default: 42)
    --date=YYYY-MM-DD    Day to show (default: 2025-04-09)
    --now=HH:MM          Wall time on that day (default: 20:00)
    --size=WxH           Viewport in pixels (default: 1000x600)
    --data=PATH          Load EPG JSON instead of generating mock data
    --config=PATH        Load a TOML or JSON guide config
    --script=STEPS       Gesture script (default: show)
    --cols=N             Pixels per text column (default: 10)
    --threaded           Run the animation side on its own thread in real time
    --help, -h           Show this help message
    --version, -V        Show version

SCRIPT STEPS (separated by ';'):
    show                 Print the current frame
    drag:DX,DY           Drag from the viewport centre and stop
    fling:DX,DY          Drag and release at speed
    tap:X,Y              Tap at a viewport point
    wait:MS              Let MS milliseconds pass
    resize:WxH           Resize the viewport
    day:YYYY-MM-DD       Switch the displayed day

ENVIRONMENT VARIABLES:
    EPG_DEMO_CHANNELS    Override --channels
    EPG_DEMO_SEED        Override --seed
    EPG_DEMO_DATE        Override --date
    EPG_DEMO_NOW         Override --now
    EPG_DEMO_SIZE        Override --size
    EPG_DEMO_DATA        Override --data
    EPG_DEMO_CONFIG      Override --config
    EPG_DEMO_SCRIPT      Override --script
    EPG_LOG              Log filter (falls back to RUST_LOG, then 'warn')";

/// Parsed command-line options.
#[derive(Debug, Clone, PartialEq)]
pub struct Opts {
    /// Mock channel count.
    pub channels: u32,
    /// Mock RNG seed.
    pub seed: u64,
    /// Day to show, `YYYY-MM-DD`.
    pub date: String,
    /// Minutes after midnight of `date`.
    pub now_minutes: i64,
    /// Viewport width.
    pub width: f64,
    /// Viewport height.
    pub height: f64,
    /// EPG JSON to load instead of mock data.
    pub data: Option<PathBuf>,
    /// Guide config file.
    pub config: Option<PathBuf>,
    /// Gesture script.
    pub script: String,
    /// Pixels per text column.
    pub px_per_col: f64,
    /// Run the threaded animation loop.
    pub threaded: bool,
}

impl Default for Opts {
    fn default() -> Self {
        Self {
            channels: 100,
            seed: 42,
            date: "2025-04-09".into(),
            now_minutes: 20 * 60,
            width: 1000.0,
            height: 600.0,
            data: None,
            config: None,
            script: "show".into(),
            px_per_col: 10.0,
            threaded: false,
        }
    }
}

/// What the command line asked for.
#[derive(Debug, Clone, PartialEq)]
pub enum Parsed {
    /// Run the demo.
    Run(Opts),
    /// Print help.
    Help,
    /// Print the version.
    Version,
}

impl Opts {
    /// Parse process arguments and environment. Exits on `--help`,
    /// `--version` and bad input.
    pub fn parse() -> Self {
        let args: Vec<String> = env::args().skip(1).collect();
        match Self::parse_from(args, |key| env::var(key).ok()) {
            Ok(Parsed::Run(opts)) => opts,
            Ok(Parsed::Help) => {
                println!("{HELP_TEXT}");
                process::exit(0);
            }
            Ok(Parsed::Version) => {
                println!("epg-demo {VERSION}");
                process::exit(0);
            }
            Err(msg) => {
                eprintln!("{msg}");
                eprintln!("Run with --help for usage information.");
                process::exit(1);
            }
        }
    }

    /// Parse `args` with environment lookups through `var`.
    ///
    /// Environment variables take precedence over defaults but are
    /// overridden by explicit command-line flags.
    pub fn parse_from<I, F>(args: I, var: F) -> Result<Parsed, String>
    where
        I: IntoIterator<Item = String>,
        F: Fn(&str) -> Option<String>,
    {
        let mut opts = Self::default();

        for (key, flag) in [
            ("EPG_DEMO_CHANNELS", "channels"),
            ("EPG_DEMO_SEED", "seed"),
            ("EPG_DEMO_DATE", "date"),
            ("EPG_DEMO_NOW", "now"),
            ("EPG_DEMO_SIZE", "size"),
            ("EPG_DEMO_DATA", "data"),
            ("EPG_DEMO_CONFIG", "config"),
            ("EPG_DEMO_SCRIPT", "script"),
        ] {
            if let Some(val) = var(key) {
                opts.apply(flag, &val)
                    .map_err(|e| format!("Invalid {key} value: {e}"))?;
            }
        }

        for arg in args {
            match arg.as_str() {
                "--help" | "-h" => return Ok(Parsed::Help),
                "--version" | "-V" => return Ok(Parsed::Version),
                "--threaded" => opts.threaded = true,
                other => {
                    let Some((flag, val)) = other
                        .strip_prefix("--")
                        .and_then(|rest| rest.split_once('='))
                    else {
                        return Err(format!("Unknown argument: {other}"));
                    };
                    opts.apply(flag, val)
                        .map_err(|e| format!("Invalid --{flag} value: {e}"))?;
                }
            }
        }

        Ok(Parsed::Run(opts))
    }

    fn apply(&mut self, flag: &str, val: &str) -> Result<(), String> {
        let bad = || val.to_string();
        match flag {
            "channels" => self.channels = val.parse().map_err(|_| bad())?,
            "seed" => self.seed = val.parse().map_err(|_| bad())?,
            "date" => self.date = val.to_string(),
            "now" => self.now_minutes = parse_clock(val).ok_or_else(bad)?,
            "size" => (self.width, self.height) = parse_size(val).ok_or_else(bad)?,
            "data" => self.data = Some(PathBuf::from(val)),
            "config" => self.config = Some(PathBuf::from(val)),
            "script" => self.script = val.to_string(),
            "cols" => {
                self.px_per_col = val
                    .parse()
                    .ok()
                    .filter(|v: &f64| v.is_finite() && *v > 0.0)
                    .ok_or_else(bad)?;
            }
            _ => return Err(format!("unknown option --{flag}")),
        }
        Ok(())
    }
}

/// `HH:MM` as minutes after midnight.
#[must_use]
pub fn parse_clock(s: &str) -> Option<i64> {
    let (h, m) = s.split_once(':')?;
    let (h, m): (i64, i64) = (h.trim().parse().ok()?, m.trim().parse().ok()?);
    ((0..24).contains(&h) && (0..60).contains(&m)).then_some(h * 60 + m)
}

/// `WxH` as a pair of positive finite numbers.
#[must_use]
pub fn parse_size(s: &str) -> Option<(f64, f64)> {
    let (w, h) = s.split_once(['x', 'X'])?;
    let (w, h): (f64, f64) = (w.trim().parse().ok()?, h.trim().parse().ok()?);
    (w.is_finite() && h.is_finite() && w > 0.0 && h > 0.0).then_some((w, h))
}
