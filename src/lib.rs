//! Generate short ASCII-art movies with an LLM and play them back in the terminal.
//!
//! The pipeline runs in three steps: [`story::StoryGenerator`] asks the model for a
//! JSON story, [`frames::FrameGenerator`] renders each scene frame by frame onto
//! disk, and [`play::Player`] shows the result with fixed framing and timing.

pub mod config;
pub mod error;
pub mod frames;
pub mod llm;
pub mod play;
pub mod render;
pub mod story;
pub mod types;

pub use config::{FrameSettings, LlmOverrides, LlmSettings, PlaybackSettings, Provider};
pub use error::{MovieError, Result};
pub use frames::FrameGenerator;
pub use llm::{ChatClient, ChatMessage, ChatRequest, HttpChatClient, JsonReply, Role};
pub use play::{Movie, Player, Screen, Stage, TerminalScreen, load_movie, play_movie};
pub use story::{GeneratedStory, StoryGenerator};
pub use types::story::{Scene, Story};
