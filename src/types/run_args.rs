use clap::Parser;

use crate::types::consts::DEFAULT_FRAME_DELAY;
use crate::types::generate_args::GenerateArgs;

#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    #[command(flatten)]
    pub generate: GenerateArgs,

    /// Delay between frames in seconds
    #[arg(short, long, default_value_t = DEFAULT_FRAME_DELAY)]
    pub delay: f64,
}
