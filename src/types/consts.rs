/// Fewest frames a scene may carry after normalization
pub const MIN_FRAMES: u32 = 5;
/// Most frames a scene may carry after normalization
pub const MAX_FRAMES: u32 = 15;
/// Frame count used when the model omits one
pub const DEFAULT_FRAMES: u32 = 10;
/// Number of blank scenes placed in the story template
pub const TEMPLATE_SCENES: usize = 8;

pub const FRAME_WIDTH: usize = 68;
pub const FRAME_HEIGHT: usize = 14;
/// Separator rule plus caption line
pub const CAPTION_HEIGHT: usize = 2;

pub const DEFAULT_FRAME_DELAY: f64 = 0.6;
pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_MAX_TOKENS: u32 = 4096;

pub const STORY_FILE: &str = "story.json";
pub const RAW_STORY_TEXT_FILE: &str = "raw_story_output.txt";
pub const RAW_STORY_JSON_FILE: &str = "raw_story_output.json";
pub const PROGRESS_FILE: &str = "progress.json";
pub const DEBUG_DIR: &str = "debug_output";
pub const DEFAULT_MOVIES_DIR: &str = "data/movies";
