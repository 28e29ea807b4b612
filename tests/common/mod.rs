#![allow(dead_code)]

use asciireel::{ChatClient, ChatRequest, MovieError, Result, Screen};
use std::cell::{Cell, RefCell};
use std::time::Duration;

pub const TWO_SCENE_STORY: &str = r#"{"title":"Test","synopsis":"S","scenes":[{"name":"A","description":"d","caption":"c","num_frames":5},{"name":"B","description":"d2","caption":"c2","num_frames":5}]}"#;

/// Answers the story prompt with a canned reply and every frame prompt with numbered art.
pub struct ScriptedClient {
    story_reply: String,
    json_mode: bool,
    fail_after_frames: Option<usize>,
    frames_served: Cell<usize>,
    pub prompts: RefCell<Vec<String>>,
}

impl ScriptedClient {
    pub fn new(story_reply: impl Into<String>) -> Self {
        Self {
            story_reply: story_reply.into(),
            json_mode: false,
            fail_after_frames: None,
            frames_served: Cell::new(0),
            prompts: RefCell::new(Vec::new()),
        }
    }

    pub fn with_json_mode(mut self) -> Self {
        self.json_mode = true;
        self
    }

    /// Fails every frame request once `n` frames were served.
    pub fn failing_after(mut self, n: usize) -> Self {
        self.fail_after_frames = Some(n);
        self
    }

    pub fn frame_prompts(&self) -> Vec<String> {
        self.prompts
            .borrow()
            .iter()
            .filter(|p| p.contains("ASCII art animation"))
            .cloned()
            .collect()
    }
}

impl ChatClient for ScriptedClient {
    fn complete_text(&self, request: &ChatRequest) -> Result<String> {
        let prompt = request.last_prompt().unwrap_or_default().to_string();
        self.prompts.borrow_mut().push(prompt.clone());

        if prompt.contains("movie script") {
            return Ok(self.story_reply.clone());
        }

        let served = self.frames_served.get();
        if self.fail_after_frames.is_some_and(|limit| served >= limit) {
            return Err(MovieError::Llm("connection reset".to_string()));
        }
        self.frames_served.set(served + 1);
        Ok(format!("```\n   /\\   art {}\n  /  \\\n```", served + 1))
    }

    fn supports_json_mode(&self) -> bool {
        self.json_mode
    }
}

/// Remembers everything the player did instead of drawing it
#[derive(Default)]
pub struct RecordingScreen {
    pub screens: Vec<Vec<String>>,
    pub prompts: Vec<String>,
    pub holds: Vec<Duration>,
}

impl Screen for RecordingScreen {
    fn show(&mut self, lines: &[String]) -> Result<()> {
        self.screens.push(lines.to_vec());
        Ok(())
    }

    fn acknowledge(&mut self, prompt: &str) -> Result<()> {
        self.prompts.push(prompt.trim().to_string());
        Ok(())
    }

    fn hold(&mut self, duration: Duration) -> Result<()> {
        self.holds.push(duration);
        Ok(())
    }
}
