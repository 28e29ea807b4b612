use crossterm::{cursor, execute, terminal};
use std::{
    fs,
    io::{BufRead, Write, stdin, stdout},
    path::{Path, PathBuf},
    time::Duration,
};
use sysx::time::safe_sleep;
use tracing::{info, warn};

use crate::config::PlaybackSettings;
use crate::error::{MovieError, Result};
use crate::render::{BoxLayout, center};
use crate::story::load_story;
use crate::types::info::{FrameId, FrameInfo, SceneInfo, parse_scene_dir_name};
use crate::types::story::{Scene, Story};
use crate::types::terminal_guard::TerminalGuard;

/// A scene directory paired with its story entry
#[derive(Debug, Clone)]
pub struct SceneReel {
    pub number: u32,
    pub scene: Scene,
    pub frames: Vec<FrameInfo>,
}

/// Everything needed to play a movie back, in playback order
#[derive(Debug, Clone)]
pub struct Movie {
    pub dir: PathBuf,
    pub story: Story,
    pub scenes: Vec<SceneReel>,
}

impl Movie {
    pub fn frame_count(&self) -> usize {
        self.scenes.iter().map(|s| s.frames.len()).sum()
    }
}

/// Reads `story.json` and pairs each `scene_NN` directory with scene N of the story.
pub fn load_movie(movie_dir: &Path) -> Result<Movie> {
    let story = load_story(movie_dir)?;
    let discovered = discover_scenes(movie_dir)?;

    if discovered.is_empty() {
        return Err(MovieError::NoScenes(movie_dir.to_path_buf()));
    }

    let mismatch = discovered.len() > story.scenes.len()
        || discovered
            .iter()
            .any(|s| s.number == 0 || s.number as usize > story.scenes.len());
    if mismatch {
        return Err(MovieError::Mismatch {
            scene_dirs: discovered.len(),
            story_scenes: story.scenes.len(),
        });
    }

    let scenes = discovered
        .into_iter()
        .map(|info| SceneReel {
            number: info.number,
            scene: story.scenes[info.number as usize - 1].clone(),
            frames: info.frames,
        })
        .collect();

    Ok(Movie {
        dir: movie_dir.to_path_buf(),
        story,
        scenes,
    })
}

/// Scene directories and their frame files, both in numeric order
fn discover_scenes(movie_dir: &Path) -> Result<Vec<SceneInfo>> {
    let mut scenes: Vec<SceneInfo> = Vec::new();

    let entries = fs::read_dir(movie_dir).map_err(|e| MovieError::io(movie_dir, e))?;
    for entry_res in entries {
        let entry = entry_res.map_err(|e| MovieError::io(movie_dir, e))?;
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }
        let Some(number) = path
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(parse_scene_dir_name)
        else {
            continue;
        };

        let mut current = SceneInfo {
            number,
            frames: Vec::new(),
        };

        for frame_entry_res in fs::read_dir(&path).map_err(|e| MovieError::io(&path, e))? {
            let frame_entry = frame_entry_res.map_err(|e| MovieError::io(&path, e))?;
            let frame_path = frame_entry.path();
            if !frame_path.is_file() {
                continue;
            }
            let parsed = frame_path
                .file_name()
                .and_then(|n| n.to_str())
                .and_then(FrameId::parse_file_name);
            match parsed {
                Some(id) if id.scene == number => current.frames.push(FrameInfo {
                    path: frame_path,
                    number: id.frame,
                }),
                _ => warn!("Skipping unexpected file in scene directory: {frame_path:?}"),
            }
        }
        current.frames.sort_by_key(|f| f.number);
        scenes.push(current);
    }

    scenes.sort_by_key(|s| s.number);
    Ok(scenes)
}

/// Where the player draws and waits
pub trait Screen {
    /// Replaces whatever is on screen with `lines`.
    fn show(&mut self, lines: &[String]) -> Result<()>;
    /// Blocks until the viewer confirms.
    fn acknowledge(&mut self, prompt: &str) -> Result<()>;
    fn hold(&mut self, duration: Duration) -> Result<()>;
}

/// The real terminal, on the alternate screen while it lives
pub struct TerminalScreen {
    _guard: TerminalGuard,
}

impl TerminalScreen {
    pub fn new() -> Self {
        Self {
            _guard: TerminalGuard::new(),
        }
    }
}

impl Default for TerminalScreen {
    fn default() -> Self {
        Self::new()
    }
}

impl Screen for TerminalScreen {
    fn show(&mut self, lines: &[String]) -> Result<()> {
        let mut stdout = stdout();
        execute!(
            stdout,
            terminal::Clear(terminal::ClearType::All),
            cursor::MoveTo(0, 0),
        )?;
        for line in lines {
            write!(stdout, "{line}\r\n")?;
        }
        stdout.flush()?;
        Ok(())
    }

    fn acknowledge(&mut self, prompt: &str) -> Result<()> {
        let mut stdout = stdout();
        write!(stdout, "\r\n{prompt}")?;
        stdout.flush()?;
        let mut line = String::new();
        stdin().lock().read_line(&mut line)?;
        Ok(())
    }

    fn hold(&mut self, duration: Duration) -> Result<()> {
        safe_sleep(duration).map_err(|e| MovieError::Playback(e.to_string()))?;
        Ok(())
    }
}

/// Which screen the player is on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Intro,
    SceneIntro(u32),
    Frame(FrameId),
    Outro,
}

pub struct Player {
    settings: PlaybackSettings,
    layout: BoxLayout,
}

impl Player {
    pub fn new(settings: PlaybackSettings) -> Self {
        Self {
            layout: BoxLayout::for_content(settings.width, settings.height),
            settings,
        }
    }

    pub fn layout(&self) -> BoxLayout {
        self.layout
    }

    /// Intro, then every scene intro followed by its frames, then the outro.
    /// Returns the stages visited, in order.
    pub fn play(&self, movie: &Movie, screen: &mut dyn Screen) -> Result<Vec<Stage>> {
        let centered = |text: &str| center(text, self.layout.width);
        let mut stages = Vec::new();

        info!(
            "Playing {:?} from {:?}: {} scenes, {} frames",
            movie.story.title,
            movie.dir,
            movie.scenes.len(),
            movie.frame_count()
        );

        stages.push(Stage::Intro);
        screen.show(&self.layout.title_box(&movie.story))?;
        screen.acknowledge(&centered("Press Enter to start the movie..."))?;

        for reel in &movie.scenes {
            stages.push(Stage::SceneIntro(reel.number));
            screen.show(&self.layout.scene_intro_box(reel.number, &reel.scene))?;
            screen.acknowledge(&centered("Press Enter to start the scene..."))?;

            for frame in &reel.frames {
                let content = fs::read_to_string(&frame.path)
                    .map_err(|e| MovieError::io(&frame.path, e))?;
                stages.push(Stage::Frame(FrameId::new(reel.number, frame.number)));
                screen.show(&self.layout.frame_box(&content))?;
                screen.hold(self.settings.frame_delay)?;
            }
        }

        stages.push(Stage::Outro);
        screen.show(&self.layout.outro_box(&movie.story.title))?;
        Ok(stages)
    }
}

/// Interactive movie menu; `None` when the viewer quits.
pub fn select_movie<R: BufRead, W: Write>(
    movies: &[String],
    input: &mut R,
    output: &mut W,
) -> Result<Option<String>> {
    writeln!(output, "\nAvailable movies:")?;
    for (i, movie) in movies.iter().enumerate() {
        writeln!(output, "{}. {movie}", i + 1)?;
    }

    loop {
        write!(
            output,
            "\nEnter the number of the movie you want to play (or 'q' to quit): "
        )?;
        output.flush()?;

        let mut choice = String::new();
        if input.read_line(&mut choice)? == 0 {
            return Ok(None);
        }
        let choice = choice.trim();
        if choice.eq_ignore_ascii_case("q") {
            return Ok(None);
        }
        match choice.parse::<usize>() {
            Ok(n) if (1..=movies.len()).contains(&n) => return Ok(Some(movies[n - 1].clone())),
            Ok(_) => writeln!(output, "Invalid selection. Please try again.")?,
            Err(_) => writeln!(output, "Invalid input. Please enter a number or 'q' to quit.")?,
        }
    }
}

/// Loads and plays a movie on the real terminal
pub fn play_movie(movie_dir: &Path, settings: PlaybackSettings) -> Result<()> {
    if !movie_dir.is_dir() {
        return Err(MovieError::NotADirectory(movie_dir.to_path_buf()));
    }
    let movie = load_movie(movie_dir)?;
    let player = Player::new(settings);
    let mut screen = TerminalScreen::new();
    player.play(&movie, &mut screen)?;
    screen.acknowledge(&center("Press Enter to exit...", player.layout().width))?;
    drop(screen);
    println!("\nPlayback finished.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn menu_retries_until_valid_choice() {
        let movies = vec!["alpha".to_string(), "beta".to_string()];
        let mut input = Cursor::new("x\n7\n2\n");
        let mut output = Vec::new();
        let picked = select_movie(&movies, &mut input, &mut output).unwrap();
        assert_eq!(picked.as_deref(), Some("beta"));

        let text = String::from_utf8(output).unwrap();
        assert!(text.contains("1. alpha"));
        assert!(text.contains("Invalid input"));
        assert!(text.contains("Invalid selection"));
    }

    #[test]
    fn non_directory_is_rejected_before_touching_the_terminal() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("movie.txt");
        fs::write(&file, "").unwrap();
        let err = play_movie(&file, PlaybackSettings::default()).unwrap_err();
        assert!(matches!(err, MovieError::NotADirectory(_)));
    }

    #[test]
    fn menu_quits_on_q_or_eof() {
        let movies = vec!["alpha".to_string()];
        let mut out = Vec::new();
        assert_eq!(select_movie(&movies, &mut Cursor::new("Q\n"), &mut out).unwrap(), None);
        assert_eq!(select_movie(&movies, &mut Cursor::new(""), &mut out).unwrap(), None);
    }
}
