use regex::Regex;
use serde_json::{Value, json};
use std::{
    fs,
    path::{Path, PathBuf},
    sync::LazyLock,
    time::SystemTime,
};
use tracing::{debug, info, warn};

use crate::error::{MovieError, Result};
use crate::llm::{ChatClient, ChatRequest};
use crate::types::consts::{
    DEBUG_DIR, DEFAULT_FRAMES, RAW_STORY_JSON_FILE, RAW_STORY_TEXT_FILE, STORY_FILE,
    TEMPLATE_SCENES,
};
use crate::types::story::Story;

/// Greedy: first `{` through last `}` across lines.
static JSON_OBJECT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\{.*\}").expect("static regex"));

/// Unprocessed model reply kept next to the story for diagnosis
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawStory {
    Text(String),
    Json(String),
}

impl RawStory {
    pub fn file_name(&self) -> &'static str {
        match self {
            RawStory::Text(_) => RAW_STORY_TEXT_FILE,
            RawStory::Json(_) => RAW_STORY_JSON_FILE,
        }
    }

    pub fn contents(&self) -> &str {
        match self {
            RawStory::Text(s) | RawStory::Json(s) => s,
        }
    }
}

#[derive(Debug, Clone)]
pub struct GeneratedStory {
    pub story: Story,
    pub raw: RawStory,
}

/// Blank story for the model to fill in.
pub fn story_template(topic: Option<&str>) -> Value {
    let scene = json!({
        "name": "",
        "description": "",
        "caption": "",
        "num_frames": DEFAULT_FRAMES,
    });
    json!({
        "title": "",
        "topic": topic.unwrap_or_default(),
        "synopsis": "",
        "scenes": vec![scene; TEMPLATE_SCENES],
    })
}

pub fn story_prompt(template: &Value) -> String {
    let rendered = serde_json::to_string_pretty(template).unwrap_or_else(|_| template.to_string());

    let mut guidelines = vec!["Provide a catchy title.".to_string()];
    let topic = template["topic"].as_str().unwrap_or_default();
    if !topic.is_empty() {
        guidelines.push(format!(
            "Incorporate the given topic into the story. The topic is: {topic}"
        ));
    }
    guidelines.push("Write a brief synopsis in 2-3 sentences.".to_string());
    guidelines.push(
        "Create 5-8 scenes. For each scene:\n   \
         - Give it a name\n   \
         - Write a brief description in 1-2 sentences\n   \
         - Provide a caption for the ASCII art frame\n   \
         - Specify the number of frames (between 5 and 15)"
            .to_string(),
    );

    let mut prompt = format!(
        "Create a short movie script by filling out this JSON template:\n{rendered}\n\
         Guidelines:\n\nIMPORTANT: Only return valid JSON, nothing else.\n\n"
    );
    for (i, line) in guidelines.iter().enumerate() {
        prompt.push_str(&format!("{}. {line}\n", i + 1));
    }
    prompt.push_str(
        "Fill out the JSON template with your creative story.\n\
         Ensure all fields are filled and the JSON structure is maintained.\n",
    );
    prompt
}

/// First `{` through last `}`; models like to wrap JSON in prose.
pub fn extract_json_object(text: &str) -> Option<&str> {
    JSON_OBJECT.find(text).map(|m| m.as_str())
}

/// Outcome of turning model output into a story, before any file paths are known
#[derive(Debug)]
pub enum StoryParseError {
    NoJsonObject,
    Decode(serde_json::Error),
    NoScenes,
}

pub fn parse_story(text: &str) -> std::result::Result<Story, StoryParseError> {
    let object = extract_json_object(text).ok_or(StoryParseError::NoJsonObject)?;
    let value: Value = serde_json::from_str(object).map_err(StoryParseError::Decode)?;
    story_from_value(value)
}

pub fn story_from_value(value: Value) -> std::result::Result<Story, StoryParseError> {
    let story: Story = serde_json::from_value(value).map_err(StoryParseError::Decode)?;
    let story = story.normalize();
    if story.scenes.is_empty() {
        return Err(StoryParseError::NoScenes);
    }
    Ok(story)
}

fn into_movie_error(err: StoryParseError, raw_path: PathBuf) -> MovieError {
    match err {
        StoryParseError::NoJsonObject => MovieError::Extraction { raw_path },
        StoryParseError::Decode(source) => MovieError::Decode { raw_path, source },
        StoryParseError::NoScenes => MovieError::EmptyStory { raw_path },
    }
}

pub struct StoryGenerator<'a> {
    client: &'a dyn ChatClient,
    debug_dir: PathBuf,
    json_mode: bool,
}

impl<'a> StoryGenerator<'a> {
    /// Raw replies are written into `debug_dir` before they are parsed.
    pub fn new(client: &'a dyn ChatClient, debug_dir: impl Into<PathBuf>) -> Self {
        Self {
            client,
            debug_dir: debug_dir.into(),
            json_mode: false,
        }
    }

    /// Use the provider's native JSON mode when it has one.
    pub fn json_mode(mut self, enabled: bool) -> Self {
        self.json_mode = enabled;
        self
    }

    pub fn generate(&self, topic: Option<&str>) -> Result<GeneratedStory> {
        fs::create_dir_all(&self.debug_dir).map_err(|e| MovieError::io(&self.debug_dir, e))?;

        let template = story_template(topic);
        let prompt = story_prompt(&template);
        debug!(%prompt, "Story prompt");
        let request = ChatRequest::user(prompt);

        if self.json_mode && self.client.supports_json_mode() {
            info!("Requesting story in JSON mode");
            return self.generate_json(&request, topic);
        }

        info!("Requesting story");
        let content = self.client.complete_text(&request)?;
        let raw = RawStory::Text(content);
        let raw_path = save_raw_output(&self.debug_dir, &raw)?;

        let mut story = parse_story(raw.contents()).map_err(|e| into_movie_error(e, raw_path))?;
        fill_topic(&mut story, topic);
        info!(title = %story.title, scenes = story.scenes.len(), "Story generated");
        Ok(GeneratedStory { story, raw })
    }

    fn generate_json(&self, request: &ChatRequest, topic: Option<&str>) -> Result<GeneratedStory> {
        let reply = match self.client.complete_json(request) {
            Ok(reply) => reply,
            Err(MovieError::MalformedJson { raw, source }) => {
                let raw_path = save_raw_output(&self.debug_dir, &RawStory::Json(raw))?;
                return Err(MovieError::Decode { raw_path, source });
            }
            Err(e) => return Err(e),
        };

        let raw = RawStory::Json(reply.raw);
        let raw_path = save_raw_output(&self.debug_dir, &raw)?;

        let mut story = story_from_value(reply.value).map_err(|e| into_movie_error(e, raw_path))?;
        fill_topic(&mut story, topic);
        info!(title = %story.title, scenes = story.scenes.len(), "Story generated");
        Ok(GeneratedStory { story, raw })
    }
}

fn fill_topic(story: &mut Story, topic: Option<&str>) {
    if story.topic.is_none() {
        story.topic = topic.filter(|t| !t.trim().is_empty()).map(str::to_string);
    }
}

pub fn save_raw_output(dir: &Path, raw: &RawStory) -> Result<PathBuf> {
    let path = dir.join(raw.file_name());
    fs::write(&path, raw.contents()).map_err(|e| MovieError::io(&path, e))?;
    info!("Raw model output saved to {path:?}");
    Ok(path)
}

pub fn save_story(story: &Story, movie_dir: &Path) -> Result<PathBuf> {
    let path = movie_dir.join(STORY_FILE);
    let contents = serde_json::to_string_pretty(story)?;
    fs::write(&path, contents).map_err(|e| MovieError::io(&path, e))?;
    info!("Story saved to {path:?}");
    Ok(path)
}

pub fn load_story(movie_dir: &Path) -> Result<Story> {
    let path = movie_dir.join(STORY_FILE);
    if !path.is_file() {
        return Err(MovieError::MissingStory(path));
    }
    let contents = fs::read_to_string(&path).map_err(|e| MovieError::io(&path, e))?;
    Ok(serde_json::from_str(&contents)?)
}

/// Lowercase; keep word characters, whitespace and hyphens; whitespace runs become `_`.
pub fn sanitize_dirname(title: &str) -> String {
    let kept: String = title
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '_' || *c == '-' || c.is_whitespace())
        .collect();
    kept.split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .trim_matches('_')
        .to_lowercase()
}

pub fn create_movie_directory(base_dir: &Path, title: &str) -> Result<PathBuf> {
    let mut name = sanitize_dirname(title);
    if name.is_empty() || name == DEBUG_DIR {
        warn!(%title, "Title does not yield a usable directory name");
        name = "untitled".to_string();
    }
    let movie_dir = base_dir.join(name);
    fs::create_dir_all(&movie_dir).map_err(|e| MovieError::io(&movie_dir, e))?;
    Ok(movie_dir)
}

/// Writes the story and a copy of the raw reply into the movie directory.
pub fn save_movie(movie_dir: &Path, generated: &GeneratedStory) -> Result<PathBuf> {
    save_raw_output(movie_dir, &generated.raw)?;
    save_story(&generated.story, movie_dir)
}

/// Names of movie directories under `base_dir`, sorted
pub fn list_movies(base_dir: &Path) -> Result<Vec<String>> {
    let mut movies = Vec::new();
    let entries = fs::read_dir(base_dir).map_err(|e| MovieError::io(base_dir, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| MovieError::io(base_dir, e))?;
        if !entry.path().is_dir() {
            continue;
        }
        if let Some(name) = entry.file_name().to_str() {
            if name != DEBUG_DIR {
                movies.push(name.to_string());
            }
        }
    }
    movies.sort();
    Ok(movies)
}

/// Most recently modified movie directory, used when resuming without an explicit target
pub fn latest_movie_dir(base_dir: &Path) -> Result<PathBuf> {
    let mut latest: Option<(SystemTime, PathBuf)> = None;
    for name in list_movies(base_dir)? {
        let path = base_dir.join(&name);
        let modified = fs::metadata(&path)
            .and_then(|m| m.modified())
            .map_err(|e| MovieError::io(&path, e))?;
        if latest.as_ref().is_none_or(|(t, _)| modified > *t) {
            latest = Some((modified, path));
        }
    }
    latest
        .map(|(_, path)| path)
        .ok_or_else(|| MovieError::NoMovies(base_dir.to_path_buf()))
}

pub fn debug_dir(base_dir: &Path) -> PathBuf {
    base_dir.join(DEBUG_DIR)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_has_blank_scenes_and_topic() {
        let template = story_template(Some("Space"));
        assert_eq!(template["topic"], "Space");
        let scenes = template["scenes"].as_array().unwrap();
        assert_eq!(scenes.len(), TEMPLATE_SCENES);
        assert!(scenes.iter().all(|s| s["num_frames"] == DEFAULT_FRAMES));
        assert!(scenes.iter().all(|s| s["name"] == ""));
    }

    #[test]
    fn prompt_mentions_topic_only_when_given() {
        let with = story_prompt(&story_template(Some("Deep sea")));
        assert!(with.contains("The topic is: Deep sea"));
        assert!(with.contains("Only return valid JSON"));

        let without = story_prompt(&story_template(None));
        assert!(!without.contains("The topic is"));
        assert!(without.contains("between 5 and 15"));
    }

    #[test]
    fn extraction_is_greedy_and_tolerates_prose() {
        let text = "Here you go:\n{\"a\": {\"b\": 1}}\nEnjoy! {not json}";
        assert_eq!(extract_json_object(text), Some("{\"a\": {\"b\": 1}}\nEnjoy! {not json}"));
        assert_eq!(extract_json_object("no braces here"), None);
    }

    #[test]
    fn parse_story_reports_each_failure() {
        assert!(matches!(parse_story("nothing"), Err(StoryParseError::NoJsonObject)));
        assert!(matches!(parse_story("{ title: }"), Err(StoryParseError::Decode(_))));
        assert!(matches!(
            parse_story(r#"{"title":"T","synopsis":"S","scenes":[{"name":""}]}"#),
            Err(StoryParseError::NoScenes)
        ));
    }

    #[test]
    fn parse_story_from_chatty_reply() {
        let reply = "Sure!\n```json\n{\"title\":\"Moon\",\"synopsis\":\"S\",\"scenes\":[\
            {\"name\":\"Launch\",\"description\":\"d\",\"caption\":\"c\",\"num_frames\":40},\
            {\"name\":\"\",\"description\":\"x\",\"caption\":\"x\",\"num_frames\":5}]}\n```";
        let story = parse_story(reply).unwrap();
        assert_eq!(story.title, "Moon");
        assert_eq!(story.scenes.len(), 1);
        assert_eq!(story.scenes[0].num_frames, 15);
    }

    #[test]
    fn sanitize_dirname_examples() {
        assert_eq!(sanitize_dirname("The Lost  Robot!"), "the_lost_robot");
        assert_eq!(sanitize_dirname("  Sci-Fi: Part 2 "), "sci-fi_part_2");
        assert_eq!(sanitize_dirname("???"), "");
    }

    #[test]
    fn movie_directory_falls_back_for_unusable_titles() {
        let base = tempfile::tempdir().unwrap();
        let dir = create_movie_directory(base.path(), "!!!").unwrap();
        assert!(dir.ends_with("untitled"));
        assert!(dir.is_dir());
    }

    #[test]
    fn list_movies_skips_debug_and_files() {
        let base = tempfile::tempdir().unwrap();
        fs::create_dir(base.path().join("b_movie")).unwrap();
        fs::create_dir(base.path().join("a_movie")).unwrap();
        fs::create_dir(base.path().join(DEBUG_DIR)).unwrap();
        fs::write(base.path().join("notes.txt"), "").unwrap();

        assert_eq!(list_movies(base.path()).unwrap(), vec!["a_movie", "b_movie"]);
        assert!(latest_movie_dir(base.path()).is_ok());
    }

    #[test]
    fn latest_movie_dir_errors_when_empty() {
        let base = tempfile::tempdir().unwrap();
        assert!(matches!(latest_movie_dir(base.path()), Err(MovieError::NoMovies(_))));
    }

    #[test]
    fn load_story_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(load_story(dir.path()), Err(MovieError::MissingStory(_))));
    }
}
