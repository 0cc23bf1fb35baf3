//! Command line surface. Without a subcommand the TUI starts; the other
//! commands run one store operation and exit.

use std::fs;
use std::path::PathBuf;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};

use crate::models::{clamp_rating, Beer};
use crate::store::{import_from, import_inbox, CollectionStore, DataDirs, ImageStore};

#[derive(Debug, Parser)]
#[command(name = "beer-tracker", version, about = "Keep track of the beers you have tried")]
pub struct CommandLine {
    /// Data directory (defaults to $BEER_TRACKER_HOME, then ~/.beer-tracker).
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Browse and edit beers interactively (default).
    Tui,
    /// Print every beer with its index.
    List,
    Add {
        #[arg(long)]
        name: String,
        #[arg(long, default_value_t = 1)]
        rating: i64,
        #[arg(long)]
        note: Option<String>,
        /// Image file to attach as the beer's photo.
        #[arg(long)]
        photo: Option<PathBuf>,
    },
    Remove {
        index: usize,
    },
    /// Write a shareable .btkr file for one beer.
    Export {
        index: usize,
    },
    /// Import a .btkr file and delete it afterwards.
    Import {
        file: PathBuf,
    },
    /// Import every .btkr file waiting in the inbox directory.
    ImportInbox,
}

/// Run a non-interactive command against an already loaded store.
pub fn run_command(
    command: Command,
    dirs: &DataDirs,
    store: &mut CollectionStore,
    images: &ImageStore,
) -> Result<()> {
    match command {
        Command::Tui => bail!("the TUI is started from main"),
        Command::List => {
            if store.is_empty() {
                println!("No beers yet.");
            }
            for (index, beer) in store.beers().iter().enumerate() {
                println!("{index:>3}  {}  {}", beer.stars(), beer.name);
            }
        }
        Command::Add {
            name,
            rating,
            note,
            photo,
        } => {
            let name = name.trim();
            if name.is_empty() {
                bail!("Beer name is required.");
            }
            let note = note.filter(|note| !note.trim().is_empty());
            let mut beer = Beer::new(name, None, note, clamp_rating(rating));
            if let Some(photo) = photo {
                let bytes = fs::read(&photo)
                    .with_context(|| format!("failed to read {}", photo.display()))?;
                beer.save_image(images, &bytes)
                    .context("failed to attach photo")?;
            }
            let index = store.append(beer);
            store.save().context("failed to save beers")?;
            println!("Added beer {index}.");
        }
        Command::Remove { index } => {
            let beer = store
                .remove(index)
                .ok_or_else(|| anyhow!("No beer at index {index}."))?;
            store.save().context("failed to save beers")?;
            println!("Removed {}.", beer.name);
        }
        Command::Export { index } => {
            let beer = store
                .get(index)
                .ok_or_else(|| anyhow!("No beer at index {index}."))?;
            let path = beer
                .export_to_file(dirs, images)
                .context("failed to export beer")?;
            println!("{}", path.display());
        }
        Command::Import { file } => {
            let index = import_from(&file, store, images)
                .with_context(|| format!("failed to import {}", file.display()))?;
            if let Some(beer) = store.get(index) {
                println!("Imported {}.", beer.name);
            }
        }
        Command::ImportInbox => {
            let report = import_inbox(dirs, store, images).context("failed to read inbox")?;
            for name in &report.imported {
                println!("Imported {name}.");
            }
            for (path, err) in &report.failed {
                eprintln!("Skipped {}: {err}", path.display());
            }
            if report.is_empty() {
                println!("Inbox is empty.");
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (tempfile::TempDir, DataDirs, CollectionStore, ImageStore) {
        let temp = tempfile::tempdir().unwrap();
        let dirs = DataDirs::at(temp.path());
        dirs.ensure().unwrap();
        let store = CollectionStore::load(dirs.archive_path());
        let images = ImageStore::new(dirs.images_dir());
        (temp, dirs, store, images)
    }

    #[test]
    fn parses_global_data_dir_and_subcommand() {
        let cli = CommandLine::try_parse_from(["beer-tracker", "remove", "2", "--data-dir", "/x"])
            .unwrap();
        assert_eq!(cli.data_dir, Some(PathBuf::from("/x")));
        assert!(matches!(cli.command, Some(Command::Remove { index: 2 })));

        let bare = CommandLine::try_parse_from(["beer-tracker"]).unwrap();
        assert!(bare.command.is_none());
    }

    #[test]
    fn add_clamps_rating_and_persists() {
        let (_temp, dirs, mut store, images) = setup();
        let add = Command::Add {
            name: " Tripel ".to_string(),
            rating: 9,
            note: Some("   ".to_string()),
            photo: None,
        };
        run_command(add, &dirs, &mut store, &images).unwrap();

        let reloaded = CollectionStore::try_load(dirs.archive_path()).unwrap();
        assert_eq!(reloaded.beers(), [Beer::new("Tripel", None, None, 5)]);
    }

    #[test]
    fn add_rejects_blank_name() {
        let (_temp, dirs, mut store, images) = setup();
        let add = Command::Add {
            name: "  ".to_string(),
            rating: 3,
            note: None,
            photo: None,
        };
        assert!(run_command(add, &dirs, &mut store, &images).is_err());
        assert!(store.is_empty());
    }

    #[test]
    fn remove_out_of_range_fails() {
        let (_temp, dirs, mut store, images) = setup();
        assert!(run_command(Command::Remove { index: 0 }, &dirs, &mut store, &images).is_err());
    }
}
