use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    thread,
    time::Duration,
};
use tracing::{debug, info, warn};

use crate::config::FrameSettings;
use crate::error::{MovieError, Result};
use crate::llm::{ChatClient, ChatRequest};
use crate::render::center;
use crate::types::cleanup_guard::CleanupGuard;
use crate::types::consts::{CAPTION_HEIGHT, PROGRESS_FILE};
use crate::types::info::{FrameId, scene_dir_name};
use crate::types::story::{Scene, Story};

const DEPTH_EXAMPLE: &str = r#"            .        *          .               .
     .            _/\_        .        *
  ~~~~~~~~~~~~~~~/####\~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~
 ::::::::::::::/######\::::::::::::::::::::::::::::::
 %%%%%%%%%%%%%/########\%%%%%%%%%%%%%%%%%%%%%%%%%%%%%"#;

pub fn first_frame_prompt(scene: &Scene, total_frames: u32, settings: &FrameSettings) -> String {
    format!(
        "Generate the first frame of an ASCII art animation for the following scene:\n\
         \n\
         Scene: {name}\n\
         Description: {description}\n\
         Frame 1 of {total_frames}\n\
         The ASCII art should be exactly {height} lines tall and {width} characters wide.\n\
         \n\
         Style guidance:\n\
         - Create depth by varying glyph density: dense characters (#, %, @) for near, solid \
         shapes and sparse ones (., :, ') for distant or faint detail.\n\
         - Layer the picture into a foreground, a midground and a background.\n\
         - Build a detailed initial scene that can be animated in subsequent frames.\n\
         \n\
         For example, layering can look like this:\n\
         {DEPTH_EXAMPLE}\n\
         \n\
         Do not include any caption or text at the bottom of the ASCII art. \
         Only return the frame, nothing else.",
        name = scene.name,
        description = scene.description,
        height = settings.art_height(),
        width = settings.width,
    )
}

pub fn next_frame_prompt(
    scene: &Scene,
    frame_number: u32,
    total_frames: u32,
    previous_frame: &str,
    settings: &FrameSettings,
) -> String {
    format!(
        "Generate the next frame of an ASCII art animation based on the following:\n\
         \n\
         Previous frame:\n\
         {previous_frame}\n\
         \n\
         Scene: {name}\n\
         Description: {description}\n\
         Frame {frame_number} of {total_frames}\n\
         The ASCII art should be exactly {height} lines tall and {width} characters wide.\n\
         Make only subtle changes from the previous frame to create a smooth animation effect.\n\
         Do not include any caption or text at the bottom of the ASCII art. \
         Only return the frame, nothing else.",
        name = scene.name,
        description = scene.description,
        height = settings.art_height(),
        width = settings.width,
    )
}

/// Drops every line that opens or closes a markdown code fence.
pub fn strip_code_fences(response: &str) -> String {
    response
        .lines()
        .filter(|line| !line.trim_start().starts_with("```"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Clips and pads the art to exactly `art_height` lines of `width` characters.
/// Leading rows are kept; only the end is clipped or padded.
pub fn fit_frame_body(art: &str, settings: &FrameSettings) -> String {
    let mut body: Vec<String> = art
        .lines()
        .take(settings.art_height())
        .map(|line| {
            let line = line.replace('\t', "    ").replace('\r', "");
            let clipped: String = line.chars().take(settings.width).collect();
            format!("{clipped:<width$}", width = settings.width)
        })
        .collect();
    body.resize(settings.art_height(), " ".repeat(settings.width));
    body.join("\n")
}

/// Art body, separator rule, centred caption.
pub fn compose_frame(body: &str, scene_number: u32, caption: &str, width: usize) -> String {
    let separator = "-".repeat(width);
    let caption_line = center(&format!("Scene {scene_number}: {caption}"), width);
    format!("{body}\n{separator}\n{caption_line}")
}

/// The art of a saved frame without its caption footer, trailing spaces trimmed.
pub fn frame_body(frame: &str) -> String {
    let lines: Vec<&str> = frame.lines().collect();
    let has_footer = lines.len() >= CAPTION_HEIGHT && {
        let rule = lines[lines.len() - CAPTION_HEIGHT].trim();
        !rule.is_empty() && rule.chars().all(|c| c == '-')
    };
    let art = if has_footer {
        &lines[..lines.len() - CAPTION_HEIGHT]
    } else {
        &lines[..]
    };
    art.iter()
        .map(|l| l.trim_end())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Last frame known to be durably written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressRecord {
    pub scene: u32,
    pub frame: u32,
}

pub fn load_progress(movie_dir: &Path) -> Result<Option<ProgressRecord>> {
    let path = movie_dir.join(PROGRESS_FILE);
    if !path.is_file() {
        return Ok(None);
    }
    let contents = fs::read_to_string(&path).map_err(|e| MovieError::io(&path, e))?;
    match serde_json::from_str(&contents) {
        Ok(record) => Ok(Some(record)),
        Err(e) => {
            warn!("Ignoring unreadable progress record {path:?}: {e}");
            Ok(None)
        }
    }
}

/// Written to a scratch file and renamed, so a reader never sees half a record.
pub fn save_progress(movie_dir: &Path, record: ProgressRecord) -> Result<()> {
    let path = movie_dir.join(PROGRESS_FILE);
    let tmp = movie_dir.join(format!("{PROGRESS_FILE}.tmp"));
    let guard = CleanupGuard::new(tmp.clone());

    fs::write(&tmp, serde_json::to_string(&record)?).map_err(|e| MovieError::io(&tmp, e))?;
    fs::rename(&tmp, &path).map_err(|e| MovieError::io(&path, e))?;
    guard.disarm();
    Ok(())
}

/// Length of the run `frame_001, frame_002, ...` present in `scene_dir`.
pub fn dense_frame_count(scene_dir: &Path, scene_number: u32) -> u32 {
    let mut count = 0;
    while scene_dir
        .join(FrameId::new(scene_number, count + 1).file_name())
        .is_file()
    {
        count += 1;
    }
    count
}

/// First frame number still to be generated for a scene.
pub fn resume_start(
    scene_dir: &Path,
    scene_number: u32,
    num_frames: u32,
    progress: Option<ProgressRecord>,
) -> u32 {
    let from_record = progress.and_then(|record| {
        let done = match record.scene.cmp(&scene_number) {
            std::cmp::Ordering::Greater => num_frames,
            std::cmp::Ordering::Equal => record.frame,
            std::cmp::Ordering::Less => 0,
        };
        let on_disk = dense_frame_count(scene_dir, scene_number);
        if done > on_disk {
            warn!(
                scene = scene_number,
                recorded = done,
                on_disk,
                "Progress record is ahead of the frames on disk; trusting the files"
            );
            None
        } else {
            Some(done)
        }
    });
    from_record.unwrap_or_else(|| dense_frame_count(scene_dir, scene_number)) + 1
}

pub struct FrameGenerator<'a> {
    client: &'a dyn ChatClient,
    settings: FrameSettings,
    request_delay: Duration,
}

impl<'a> FrameGenerator<'a> {
    pub fn new(client: &'a dyn ChatClient, settings: FrameSettings) -> Self {
        Self {
            client,
            settings,
            request_delay: Duration::ZERO,
        }
    }

    /// Pause between consecutive model requests.
    pub fn request_delay(mut self, delay: Duration) -> Self {
        self.request_delay = delay;
        self
    }

    pub fn generate(&self, story: &Story, movie_dir: &Path, resume: bool) -> Result<()> {
        let progress = if resume {
            load_progress(movie_dir)?
        } else {
            None
        };
        let mut requests = 0u32;
        info!(
            "Generating {} frames across {} scenes",
            story.total_frames(),
            story.scenes.len()
        );

        for (index, scene) in story.scenes.iter().enumerate() {
            let scene_number = index as u32 + 1;
            let scene_dir = movie_dir.join(scene_dir_name(scene_number));
            fs::create_dir_all(&scene_dir).map_err(|e| MovieError::io(&scene_dir, e))?;

            info!(
                "Starting Scene {scene_number}: {} ({} frames, caption: {})",
                scene.name, scene.num_frames, scene.caption
            );

            let start = if resume {
                resume_start(&scene_dir, scene_number, scene.num_frames, progress)
            } else {
                1
            };
            if start > scene.num_frames {
                info!("Scene {scene_number} already complete, skipping");
                continue;
            }

            let mut previous = if start > 1 {
                let path = scene_dir.join(FrameId::new(scene_number, start - 1).file_name());
                let saved = fs::read_to_string(&path).map_err(|e| MovieError::io(&path, e))?;
                info!("Resuming Scene {scene_number} at frame {start}");
                Some(frame_body(&saved))
            } else {
                None
            };

            for frame_number in start..=scene.num_frames {
                if requests > 0 && !self.request_delay.is_zero() {
                    thread::sleep(self.request_delay);
                }
                requests += 1;

                let id = FrameId::new(scene_number, frame_number);
                let body = self.generate_body(scene, id, previous.as_deref())?;
                let frame = compose_frame(&body, scene_number, &scene.caption, self.settings.width);
                let path = self.save_frame(&scene_dir, id, &frame)?;
                save_progress(
                    movie_dir,
                    ProgressRecord {
                        scene: scene_number,
                        frame: frame_number,
                    },
                )?;

                info!(
                    "Saved frame {frame_number} of {} for Scene {scene_number} to {path:?}",
                    scene.num_frames
                );
                previous = Some(frame_body(&frame));
            }

            info!("Completed Scene {scene_number}: {}", scene.name);
        }

        info!("All frames generated and saved in {movie_dir:?}");
        Ok(())
    }

    fn generate_body(&self, scene: &Scene, id: FrameId, previous: Option<&str>) -> Result<String> {
        let prompt = match previous {
            Some(previous) if id.frame > 1 => {
                next_frame_prompt(scene, id.frame, scene.num_frames, previous, &self.settings)
            }
            _ => first_frame_prompt(scene, scene.num_frames, &self.settings),
        };
        debug!(scene = id.scene, frame = id.frame, %prompt, "Frame prompt");

        let response = self
            .client
            .complete_text(&ChatRequest::user(prompt))
            .map_err(|e| {
                MovieError::Llm(format!(
                    "generating frame {} for scene {}: {e}",
                    id.frame, id.scene
                ))
            })?;
        Ok(fit_frame_body(&strip_code_fences(&response), &self.settings))
    }

    fn save_frame(&self, scene_dir: &Path, id: FrameId, frame: &str) -> Result<PathBuf> {
        let path = scene_dir.join(id.file_name());
        fs::write(&path, frame).map_err(|e| MovieError::io(&path, e))?;
        Ok(path)
    }
}
