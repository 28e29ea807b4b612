use clap::Parser;
use std::path::PathBuf;

use crate::types::consts::{DEFAULT_FRAME_DELAY, DEFAULT_MOVIES_DIR, FRAME_HEIGHT, FRAME_WIDTH};

#[derive(Parser, Debug, Clone)]
pub struct PlayArgs {
    /// Movie directory to play (omit to pick one from a menu)
    #[arg(short, long)]
    pub movie_dir: Option<PathBuf>,

    /// Directory holding all generated movies
    #[arg(short, long, default_value = DEFAULT_MOVIES_DIR)]
    pub output_dir: PathBuf,

    /// Delay between frames in seconds
    #[arg(short, long, default_value_t = DEFAULT_FRAME_DELAY)]
    pub delay: f64,

    /// Frame width in characters, border excluded
    #[arg(short = 'W', long, default_value_t = FRAME_WIDTH)]
    pub width: usize,

    /// Frame height in lines, border excluded
    #[arg(short = 'H', long, default_value_t = FRAME_HEIGHT)]
    pub height: usize,
}
