mod actions;
mod cli;
mod config;
mod curve;
mod frame;
mod gestures;
mod input;
mod logging;
mod mailbox;
mod motion;
mod sample;
mod scheduler;
mod tracker;

fn main() -> anyhow::Result<()> {
    logging::init();
    cli::run()
}
