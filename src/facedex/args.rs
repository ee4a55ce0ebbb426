use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "facedex")]
#[command(about = "Browse and like images from face-detection indexes", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (defaults to the platform config dir)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Source document, may be repeated. Replaces the configured sources.
    #[arg(short, long = "source", global = true)]
    pub sources: Vec<PathBuf>,

    /// Path substitution applied on load and undone on save, may be repeated
    #[arg(
        long,
        num_args = 2,
        value_names = ["OLD", "NEW"],
        action = ArgAction::Append,
        global = true
    )]
    pub replace: Vec<String>,

    /// Items per page
    #[arg(long, global = true)]
    pub per_page: Option<usize>,

    /// Which source to operate on (0-based)
    #[arg(long, global = true, default_value_t = 0)]
    pub source_index: usize,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List categories with their thumbnail
    #[command(alias = "cats")]
    Categories {
        #[arg(short, long, default_value_t = 1)]
        page: usize,
    },

    /// List images of a category, _favorites, _unfavorites, or everything
    #[command(alias = "ls")]
    List {
        /// Collection name (omit for all images)
        collection: Option<String>,

        #[arg(short, long, default_value_t = 1)]
        page: usize,

        /// Seed for the shuffled virtual collections
        #[arg(long)]
        seed: Option<String>,
    },

    /// Like one or more images by path
    Like {
        #[arg(required = true, num_args = 1..)]
        paths: Vec<String>,
    },

    /// Unlike one or more images by path
    Unlike {
        #[arg(required = true, num_args = 1..)]
        paths: Vec<String>,
    },

    /// Print the file behind CATEGORY/FILENAME
    Resolve { category: String, filename: String },
}
