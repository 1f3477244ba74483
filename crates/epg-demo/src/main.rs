#![forbid(unsafe_code)]

//! EPG grid demo binary entry point.

use std::io::{self, Write};

use epg_demo::cli::Opts;
use epg_demo::runner::{Demo, DemoError};
use epg_demo::script;
use tracing_subscriber::EnvFilter;

fn init_logging() {
    let filter = EnvFilter::try_from_env("EPG_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run(opts: &Opts) -> Result<(), DemoError> {
    let steps = script::parse(&opts.script)?;
    let demo = Demo::from_opts(opts)?;
    let stdout = io::stdout();
    let mut out = stdout.lock();
    if opts.threaded {
        demo.run_threaded(&steps, &mut out)?;
    } else {
        demo.run_simulated(&steps, &mut out)?;
    }
    out.flush()?;
    Ok(())
}

fn main() {
    let opts = Opts::parse();
    init_logging();
    if let Err(e) = run(&opts) {
        eprintln!("epg-demo: {e}");
        std::process::exit(1);
    }
}
