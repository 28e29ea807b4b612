use clap::Parser;
use std::path::PathBuf;

use crate::config::Provider;
use crate::types::consts::{DEFAULT_MOVIES_DIR, DEFAULT_TEMPERATURE, FRAME_HEIGHT, FRAME_WIDTH};

#[derive(Parser, Debug, Clone)]
pub struct GenerateArgs {
    /// LLM provider to generate with
    #[arg(short, long, value_enum, default_value_t = Provider::Ollama)]
    pub provider: Provider,

    /// Model name (defaults to the provider's *_MODEL environment variable)
    #[arg(short, long)]
    pub model: Option<String>,

    /// Base URL for a local OpenAI-compatible endpoint
    #[arg(long)]
    pub base_url: Option<String>,

    /// Topic the story should be about
    #[arg(short, long)]
    pub topic: Option<String>,

    /// Continue frame generation of an existing movie
    #[arg(short, long)]
    pub resume: bool,

    /// Movie directory to resume (defaults to the most recently modified one)
    #[arg(long, requires = "resume")]
    pub movie_dir: Option<PathBuf>,

    /// Directory holding all generated movies
    #[arg(short, long, default_value = DEFAULT_MOVIES_DIR)]
    pub output_dir: PathBuf,

    /// Ask the provider for a JSON-mode completion when it supports one
    #[arg(long)]
    pub json_mode: bool,

    /// Sampling temperature
    #[arg(long, default_value_t = DEFAULT_TEMPERATURE)]
    pub temperature: f32,

    /// Frame width in characters
    #[arg(short = 'W', long, default_value_t = FRAME_WIDTH)]
    pub width: usize,

    /// Frame height in lines, caption footer included
    #[arg(short = 'H', long, default_value_t = FRAME_HEIGHT)]
    pub height: usize,

    /// Seconds to wait between frame requests
    #[arg(long, default_value_t = 1.0)]
    pub request_delay: f64,
}
