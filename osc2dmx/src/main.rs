mod cli;
mod emitter;
mod ingress;
mod supervisor;

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use anyhow::Context;
use clap::Parser;

fn main() -> anyhow::Result<()> {
    let args = cli::Args::parse();

    let level = if args.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    eprintln!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));

    let stop = Arc::new(AtomicBool::new(false));
    let reconnect = Arc::new(AtomicBool::new(args.auto_reconnect));
    {
        let stop = Arc::clone(&stop);
        let reconnect = Arc::clone(&reconnect);
        ctrlc::set_handler(move || {
            reconnect.store(false, Ordering::SeqCst);
            stop.store(true, Ordering::SeqCst);
        })
        .context("cannot install signal handler")?;
    }

    supervisor::Supervisor::new(args, stop, reconnect).run()
}
