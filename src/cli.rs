use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::model::{Curation, GameMode, MIN_EXTENT};

#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Build a vector space from map sources
    Vectorize {
        /// Game mode whose maps are kept
        #[arg(value_enum, ignore_case = true, default_value = "CTF")]
        mode: GameMode,
        /// Element curation defining the vector layout
        #[arg(value_enum, ignore_case = true, default_value = "WALLS")]
        curation: Curation,
        /// Comma-separated source folders under the maps directory
        #[arg(value_delimiter = ',', default_value = "TINY")]
        sources: Vec<String>,
        #[arg(long, default_value = "data/maps")]
        maps_dir: PathBuf,
        #[arg(long, default_value = "data/spaces")]
        spaces_dir: PathBuf,
        /// Maps narrower or shorter than this are skipped
        #[arg(long, default_value_t = MIN_EXTENT)]
        min_extent: f64,
    },
    /// Fit a projection model over a vector space
    Fit {
        /// Space name, e.g. CTF-WALLS-TINY
        space: String,
        #[arg(long, default_value = "data/spaces")]
        spaces_dir: PathBuf,
        #[arg(long, default_value = "data/models")]
        models_dir: PathBuf,
        /// Keep at most this many components
        #[arg(long, value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..))]
        max_components: Option<usize>,
        /// Standardize features before fitting
        #[arg(long)]
        scale: bool,
    },
    /// Print the component coordinates of a map under a model
    Components {
        /// Model file
        model: PathBuf,
        /// Map document
        map: PathBuf,
    },
    /// Print the map vector reconstructed from component coordinates
    Reconstruct {
        /// Model file
        model: PathBuf,
        /// Comma-separated leading components; the rest stay at the mean
        #[arg(value_delimiter = ',', allow_negative_numbers = true)]
        components: Vec<f64>,
    },
}
