//! Binary entry point: resolve the data directory, load the collection, then
//! either run a one-shot CLI command or drive the Ratatui event loop.
use anyhow::Context;
use beer_tracker::cli::{run_command, Command, CommandLine};
use beer_tracker::logging::init_logging;
use beer_tracker::store::InboxReport;
use beer_tracker::{import_inbox, run_app, App, CollectionStore, DataDirs, ImageStore};
use clap::Parser;

fn main() -> anyhow::Result<()> {
    let cli = CommandLine::parse();

    let dirs = DataDirs::resolve(cli.data_dir)?;
    dirs.ensure().context("failed to create data directory")?;

    if let Err(err) = init_logging(&dirs.log_path()) {
        eprintln!("warning: logging disabled: {err:#}");
    }

    let mut store = CollectionStore::load(dirs.archive_path());
    let images = ImageStore::new(dirs.images_dir());

    match cli.command.unwrap_or(Command::Tui) {
        Command::Tui => {
            let inbox = import_inbox(&dirs, &mut store, &images).unwrap_or_else(|err| {
                tracing::warn!(error = %err, "skipping inbox import at startup");
                eprintln!("warning: inbox not imported: {err}");
                InboxReport::default()
            });
            let mut app = App::new(dirs, store, images);
            app.report_inbox(&inbox);
            run_app(&mut app)
        }
        command => run_command(command, &dirs, &mut store, &images),
    }
}
