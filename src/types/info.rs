use std::path::PathBuf;

/// Position of a frame inside a movie, both numbers 1-based
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FrameId {
    pub scene: u32,
    pub frame: u32,
}

impl FrameId {
    pub fn new(scene: u32, frame: u32) -> Self {
        Self { scene, frame }
    }

    /// `scene_NN_frame_NNN.txt`
    pub fn file_name(&self) -> String {
        format!("scene_{:02}_frame_{:03}.txt", self.scene, self.frame)
    }

    /// Parses a name produced by [`FrameId::file_name`]; anything else is `None`.
    pub fn parse_file_name(name: &str) -> Option<Self> {
        let stem = name.strip_suffix(".txt")?;
        let rest = stem.strip_prefix("scene_")?;
        let (scene, frame) = rest.split_once("_frame_")?;
        if scene.len() < 2 || frame.len() < 3 {
            return None;
        }
        Some(Self {
            scene: parse_digits(scene)?,
            frame: parse_digits(frame)?,
        })
    }
}

/// `scene_NN`
pub fn scene_dir_name(scene: u32) -> String {
    format!("scene_{scene:02}")
}

pub fn parse_scene_dir_name(name: &str) -> Option<u32> {
    let digits = name.strip_prefix("scene_")?;
    if digits.len() < 2 {
        return None;
    }
    parse_digits(digits)
}

fn parse_digits(s: &str) -> Option<u32> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

/// Structure for frame path and number
#[derive(Debug, Clone)]
pub struct FrameInfo {
    pub path: PathBuf,
    pub number: u32,
}

/// Structure for a scene directory and its frames
#[derive(Debug, Clone)]
pub struct SceneInfo {
    pub number: u32,
    pub frames: Vec<FrameInfo>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_names_are_zero_padded() {
        assert_eq!(FrameId::new(1, 1).file_name(), "scene_01_frame_001.txt");
        assert_eq!(FrameId::new(12, 105).file_name(), "scene_12_frame_105.txt");
        assert_eq!(scene_dir_name(3), "scene_03");
    }

    #[test]
    fn lexicographic_order_matches_numeric_order() {
        let mut ids = Vec::new();
        for scene in [1, 2, 9, 10, 11, 42, 99] {
            for frame in [1, 2, 9, 10, 99, 100, 101, 998, 999] {
                ids.push(FrameId::new(scene, frame));
            }
        }
        let mut by_name = ids.clone();
        by_name.sort_by_key(|id| id.file_name());
        let mut by_number = ids;
        by_number.sort();
        assert_eq!(by_name, by_number);
    }

    #[test]
    fn parsing_accepts_only_the_canonical_shape() {
        assert_eq!(
            FrameId::parse_file_name("scene_02_frame_010.txt"),
            Some(FrameId::new(2, 10))
        );
        assert_eq!(FrameId::parse_file_name("scene_2_frame_010.txt"), None);
        assert_eq!(FrameId::parse_file_name("scene_02_frame_010.txt.bak"), None);
        assert_eq!(FrameId::parse_file_name("notes.txt"), None);
        assert_eq!(FrameId::parse_file_name("scene_02_frame_+10.txt"), None);
        assert_eq!(parse_scene_dir_name("scene_07"), Some(7));
        assert_eq!(parse_scene_dir_name("scene_x7"), None);
        assert_eq!(parse_scene_dir_name("debug_output"), None);
    }
}
