//! Fixed-size text boxes for the player.
//!
//! Every box is exactly `height` lines of exactly `width` characters, whatever
//! is put inside, so frames never jitter on screen.

use crate::types::story::{Scene, Story};

const BORDER_CORNER: char = '+';
const BORDER_H: char = '-';
const BORDER_V: char = '|';
/// Border plus one column of padding on each side
const SIDE_CHROME: usize = 4;

/// Centre `text` in `width` columns; text that does not fit is returned as is.
pub fn center(text: &str, width: usize) -> String {
    let len = text.chars().count();
    if len >= width {
        return text.to_string();
    }
    let left = (width - len) / 2;
    let right = width - len - left;
    format!("{}{}{}", " ".repeat(left), text, " ".repeat(right))
}

/// Greedy word wrap; words wider than `width` are split.
pub fn wrap(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for word in text.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();
        while word.len() > width {
            if current_len > 0 {
                lines.push(std::mem::take(&mut current));
                current_len = 0;
            }
            lines.push(word.drain(..width).collect());
        }
        if word.is_empty() {
            continue;
        }
        let needed = if current_len == 0 { word.len() } else { current_len + 1 + word.len() };
        if needed > width {
            lines.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if current_len > 0 {
            current.push(' ');
            current_len += 1;
        }
        current.extend(word.iter());
        current_len += word.len();
    }
    if current_len > 0 {
        lines.push(current);
    }
    lines
}

fn clean_line(line: &str) -> String {
    line.replace('\t', "    ").replace('\r', "")
}

/// Exactly `width` characters: clipped or right-padded.
fn fit_line(line: &str, width: usize) -> String {
    let clipped: String = line.chars().take(width).collect();
    format!("{clipped:<width$}")
}

/// Outer dimensions of a bordered box
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoxLayout {
    pub width: usize,
    pub height: usize,
}

impl BoxLayout {
    /// Box that fits `content_width` x `content_height` inside its border.
    pub fn for_content(content_width: usize, content_height: usize) -> Self {
        Self {
            width: content_width.max(1) + SIDE_CHROME,
            height: content_height.max(1) + 2,
        }
    }

    pub fn inner_width(&self) -> usize {
        self.width.saturating_sub(SIDE_CHROME).max(1)
    }

    pub fn inner_height(&self) -> usize {
        self.height.saturating_sub(2).max(1)
    }

    fn border(&self) -> String {
        let mut line = String::with_capacity(self.width);
        line.push(BORDER_CORNER);
        line.extend(std::iter::repeat_n(BORDER_H, self.width.saturating_sub(2)));
        line.push(BORDER_CORNER);
        line
    }

    fn frame(&self, body: Vec<String>) -> Vec<String> {
        let mut out = Vec::with_capacity(self.height);
        out.push(self.border());
        for line in body {
            out.push(format!(
                "{BORDER_V} {} {BORDER_V}",
                fit_line(&line, self.inner_width())
            ));
        }
        out.push(self.border());
        out
    }

    /// Frame art: left-justified, padded at the top when short, truncated when tall.
    pub fn frame_box(&self, content: &str) -> Vec<String> {
        let height = self.inner_height();
        let lines: Vec<String> = content.lines().map(clean_line).take(height).collect();
        let mut body = vec![String::new(); height - lines.len()];
        body.extend(lines);
        self.frame(body)
    }

    /// Prose: each line centred, block centred vertically, truncated when tall.
    pub fn text_box(&self, lines: &[String]) -> Vec<String> {
        let height = self.inner_height();
        let width = self.inner_width();
        let shown = lines.len().min(height);
        let top = (height - shown) / 2;

        let mut body = vec![String::new(); top];
        body.extend(lines.iter().take(shown).map(|l| center(&clean_line(l), width)));
        body.resize(height, String::new());
        self.frame(body)
    }

    fn paragraphs(&self, paragraphs: &[&str]) -> Vec<String> {
        let mut lines = Vec::new();
        for (i, paragraph) in paragraphs.iter().enumerate() {
            if i > 0 {
                lines.push(String::new());
            }
            lines.extend(wrap(paragraph, self.inner_width()));
        }
        lines
    }

    pub fn title_box(&self, story: &Story) -> Vec<String> {
        let title = format!("Movie: {}", story.title);
        let synopsis = format!("Synopsis: {}", story.synopsis);
        self.text_box(&self.paragraphs(&[&title, &synopsis]))
    }

    pub fn scene_intro_box(&self, scene_number: u32, scene: &Scene) -> Vec<String> {
        let heading = format!("Scene {scene_number}: {}", scene.name);
        self.text_box(&self.paragraphs(&[&heading, &scene.description, &scene.caption]))
    }

    pub fn outro_box(&self, title: &str) -> Vec<String> {
        let thanks = format!("Thank you for watching {title}!");
        self.text_box(&self.paragraphs(&["The End", &thanks]))
    }
}
