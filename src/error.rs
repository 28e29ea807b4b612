use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MovieError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("LLM request failed: {0}")]
    Llm(String),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("No JSON object found in model output (raw output saved to {raw_path:?})")]
    Extraction { raw_path: PathBuf },

    #[error("Failed to decode model output as JSON: {source} (raw output saved to {raw_path:?})")]
    Decode {
        raw_path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Model returned non-JSON content in JSON mode: {source}")]
    MalformedJson {
        raw: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Story has no usable scenes (raw output saved to {raw_path:?})")]
    EmptyStory { raw_path: PathBuf },

    #[error("IO error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Terminal I/O error: {0}")]
    Terminal(#[from] std::io::Error),

    #[error("Playback error: {0}")]
    Playback(String),

    #[error("Not a movie directory: {0:?}")]
    NotADirectory(PathBuf),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Story file not found: {0:?}")]
    MissingStory(PathBuf),

    #[error(
        "Mismatch between scene directories and story data: found {scene_dirs} scene directories but the story has {story_scenes} scenes"
    )]
    Mismatch {
        scene_dirs: usize,
        story_scenes: usize,
    },

    #[error("No scene directories found in {0:?}")]
    NoScenes(PathBuf),

    #[error("No movies found in {0:?}")]
    NoMovies(PathBuf),
}

impl MovieError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, MovieError>;
