use serde::{Deserialize, Serialize};

use crate::types::consts::{DEFAULT_FRAMES, MAX_FRAMES, MIN_FRAMES};

/// A generated movie script
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Story {
    #[serde(default, deserialize_with = "lenient_text")]
    pub title: String,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_topic"
    )]
    pub topic: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub synopsis: String,
    #[serde(default)]
    pub scenes: Vec<Scene>,
}

/// One narrative unit of a story. Its position in `Story::scenes` is its scene number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scene {
    #[serde(default, deserialize_with = "lenient_text")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub description: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub caption: String,
    #[serde(default = "default_frames", deserialize_with = "lenient_frames")]
    pub num_frames: u32,
}

fn default_frames() -> u32 {
    DEFAULT_FRAMES
}

fn text_of(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s,
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::Bool(b) => b.to_string(),
        _ => String::new(),
    }
}

/// `null`, arrays and objects read as an empty string; scalars as their text.
fn lenient_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    serde_json::Value::deserialize(deserializer).map(text_of)
}

fn lenient_topic<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let text = lenient_text(deserializer)?;
    Ok(Some(text).filter(|t| !t.is_empty()))
}

/// Models sometimes answer `"num_frames": "8"`, `-3` or `12.0`; take anything numeric.
fn lenient_frames<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    let number = match &value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    Ok(number.map_or(DEFAULT_FRAMES, |n| {
        if n.is_nan() {
            DEFAULT_FRAMES
        } else {
            n.round().clamp(0.0, u32::MAX as f64) as u32
        }
    }))
}

/// `max(MIN_FRAMES, min(MAX_FRAMES, n))`
pub fn clamp_frames(n: u32) -> u32 {
    n.clamp(MIN_FRAMES, MAX_FRAMES)
}

impl Story {
    /// Drops unnamed scenes and clamps every frame count into range.
    pub fn normalize(mut self) -> Self {
        self.scenes.retain(|scene| !scene.name.trim().is_empty());
        for scene in &mut self.scenes {
            scene.num_frames = clamp_frames(scene.num_frames);
        }
        self.topic = self.topic.filter(|t| !t.trim().is_empty());
        self
    }

    pub fn total_frames(&self) -> u32 {
        self.scenes.iter().map(|s| s.num_frames).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scene(name: &str, frames: u32) -> Scene {
        Scene {
            name: name.to_string(),
            description: String::new(),
            caption: String::new(),
            num_frames: frames,
        }
    }

    #[test]
    fn clamping_law_holds_across_range() {
        for n in 0..40 {
            assert_eq!(clamp_frames(n), n.max(5).min(15));
        }
    }

    #[test]
    fn normalize_drops_blank_names() {
        let story = Story {
            title: "T".into(),
            topic: Some("  ".into()),
            synopsis: "S".into(),
            scenes: vec![scene("", 8), scene("   ", 8), scene("kept", 99)],
        }
        .normalize();

        assert_eq!(story.scenes.len(), 1);
        assert_eq!(story.scenes[0].name, "kept");
        assert_eq!(story.scenes[0].num_frames, 15);
        assert_eq!(story.topic, None);
    }

    #[test]
    fn missing_or_odd_frame_counts_are_tolerated() {
        let json = r#"{"title":"T","synopsis":"S","scenes":[
            {"name":"a"},
            {"name":"b","num_frames":"7"},
            {"name":"c","num_frames":-4},
            {"name":"d","num_frames":12.6},
            {"name":"e","num_frames":null}
        ]}"#;
        let story: Story = serde_json::from_str(json).unwrap();
        let frames: Vec<u32> = story.normalize().scenes.iter().map(|s| s.num_frames).collect();
        assert_eq!(frames, vec![10, 7, 5, 13, 10]);
    }

    #[test]
    fn null_fields_do_not_sink_the_story() {
        let json = r#"{"title":null,"topic":null,"synopsis":"S","scenes":[
            {"name":"kept","description":null,"caption":"c","num_frames":6},
            {"name":null,"description":"d","caption":"c","num_frames":6},
            {"name":7,"description":["x"],"caption":{"a":1}}
        ]}"#;
        let story = serde_json::from_str::<Story>(json).unwrap().normalize();

        assert_eq!(story.title, "");
        assert_eq!(story.topic, None);
        let names: Vec<&str> = story.scenes.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["kept", "7"]);
        assert_eq!(story.scenes[0].description, "");
        assert_eq!(story.scenes[1].description, "");
        assert_eq!(story.scenes[1].caption, "");
        assert_eq!(story.total_frames(), 16);
    }

    #[test]
    fn topic_is_omitted_when_absent() {
        let story = Story {
            title: "T".into(),
            topic: None,
            synopsis: "S".into(),
            scenes: vec![scene("a", 5)],
        };
        let json = serde_json::to_string(&story).unwrap();
        assert!(!json.contains("topic"));
    }
}
