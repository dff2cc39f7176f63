//! Binary entry point: resolve configuration, start logging, load the two
//! data files, and drive the Ratatui event loop until the user exits.
use anyhow::Context;
use clap::Parser;
use tracing::info;

use city_library::config::{Args, Config};
use city_library::{logging, run_app, App, FlatFileStorage, Library};

fn main() -> anyhow::Result<()> {
    let config = Config::from_args(Args::parse())?;
    logging::init(&config)?;

    let storage = FlatFileStorage::new(&config.data_dir);
    let library = Library::open(storage).with_context(|| {
        format!(
            "failed to load library data from {}",
            config.data_dir.display()
        )
    })?;
    info!(
        data_dir = %config.data_dir.display(),
        books = library.store().book_count(),
        members = library.store().member_count(),
        "library opened"
    );

    let mut app = App::new(library);
    run_app(&mut app)
}
