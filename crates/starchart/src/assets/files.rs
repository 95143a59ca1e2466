use std::collections::BTreeMap;

/// Image used wherever a sprite or frame is missing.
pub const PLACEHOLDER_IMAGE: &str = "images/outfit/unknown.png";

/// Top-level image folders whose names carry a trailing frame index.
const ANIMATED_FOLDERS: [&str; 4] = ["asteroid", "effect", "projectile", "ship"];
/// Resolution variants, stripped from image names.
const RESOLUTION_SUFFIXES: [&str; 3] = ["@2x", "@1x", "@sw"];
/// Blend-mode markers; at most one is stripped.
const MODE_SUFFIXES: [char; 4] = ['-', '+', '^', '~'];
/// Frame indices above this are treated as bogus names.
const MAX_FRAMES: usize = 1024;

/// Lookup from logical asset name to the game files that implement it.
///
/// Built from the flat `data/files.json` list. Image names map to an
/// ordered frame list (one entry for still images); sound names map to a
/// single file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GameFileList {
    images: BTreeMap<String, Vec<String>>,
    sounds: BTreeMap<String, String>,
}

impl GameFileList {
    pub fn new<I, S>(files: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut list = Self::default();
        for file in files {
            let file = file.as_ref();
            match file.strip_prefix("images/") {
                Some(image) => list.add_image(file, image),
                None => list.add_sound(file),
            }
        }
        list
    }

    /// Parse the JSON array form.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let files: Vec<String> = serde_json::from_str(json)?;
        Ok(Self::new(files))
    }

    fn add_image(&mut self, file: &str, relative: &str) {
        let mut base = strip_extension(relative);
        for suffix in RESOLUTION_SUFFIXES {
            if let Some(stripped) = base.strip_suffix(suffix) {
                base = stripped;
            }
        }

        let mut index = 0;
        let folder = base.split('/').next().unwrap_or_default();
        if ANIMATED_FOLDERS.contains(&folder) {
            let stem = base.trim_end_matches(|c: char| c.is_ascii_digit());
            let digits = &base[stem.len()..];
            if !digits.is_empty() {
                match digits.parse::<usize>() {
                    Ok(n) if n < MAX_FRAMES => index = n,
                    _ => {
                        log::warn!("ignoring frame index {digits} of `{file}`");
                        return;
                    }
                }
            }
            base = stem;
        }

        if let Some(stripped) = base.strip_suffix(MODE_SUFFIXES) {
            base = stripped;
        }

        let frames = self.images.entry(base.to_string()).or_default();
        if frames.len() <= index {
            frames.resize(index + 1, PLACEHOLDER_IMAGE.to_string());
        }
        frames[index] = file.to_string();
    }

    fn add_sound(&mut self, file: &str) {
        let base = strip_extension(file);
        let base = base.strip_suffix('~').unwrap_or(base);
        self.sounds.insert(base.to_string(), file.to_string());
    }

    /// Frames of the image called `name`, if any file provides it.
    pub fn frames(&self, name: &str) -> Option<&[String]> {
        self.images.get(name).map(Vec::as_slice)
    }

    /// Frames of `name`, or a single placeholder frame.
    pub fn frames_or(&self, name: &str, placeholder: &str) -> Vec<String> {
        match self.frames(name) {
            Some(frames) => frames.to_vec(),
            None => vec![placeholder.to_string()],
        }
    }

    pub fn sound(&self, name: &str) -> Option<&str> {
        self.sounds.get(name).map(String::as_str)
    }

    pub fn image_count(&self) -> usize {
        self.images.len()
    }

    pub fn sound_count(&self) -> usize {
        self.sounds.len()
    }
}

/// Everything before the first `.`.
fn strip_extension(path: &str) -> &str {
    path.split('.').next().unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn still_image_maps_to_one_frame() {
        let list = GameFileList::new(["images/planet/earth@2x.png", "images/planet/earth.png"]);
        assert_eq!(list.frames("planet/earth").unwrap(), ["images/planet/earth.png"]);
    }

    #[test]
    fn animation_frames_are_ordered_and_padded() {
        let list = GameFileList::new([
            "images/ship/wasp+2.png",
            "images/ship/wasp+0.png",
            "images/ship/wasp+3@2x.png",
        ]);
        let frames = list.frames("ship/wasp").unwrap();
        assert_eq!(
            frames,
            [
                "images/ship/wasp+0.png",
                PLACEHOLDER_IMAGE,
                "images/ship/wasp+2.png",
                "images/ship/wasp+3@2x.png",
            ]
        );
    }

    #[test]
    fn digits_only_parsed_in_animated_folders() {
        let list = GameFileList::new(["images/planet/station1.png", "images/effect/explosion/small~12.png"]);
        assert!(list.frames("planet/station1").is_some());
        let frames = list.frames("effect/explosion/small").unwrap();
        assert_eq!(frames.len(), 13);
        assert_eq!(frames[12], "images/effect/explosion/small~12.png");
    }

    #[test]
    fn only_one_mode_suffix_is_stripped() {
        let list = GameFileList::new(["images/ship/odd+-.png"]);
        assert!(list.frames("ship/odd+").is_some());
    }

    #[test]
    fn oversized_index_is_ignored() {
        let list = GameFileList::new(["images/ship/bogus99999999.png"]);
        assert!(list.frames("ship/bogus").is_none());
    }

    #[test]
    fn sounds_strip_extension_and_tilde() {
        let list = GameFileList::from_json(r#"["sounds/laser~.wav", "sounds/engine.mp3"]"#).unwrap();
        assert_eq!(list.sound("sounds/laser"), Some("sounds/laser~.wav"));
        assert_eq!(list.sound("sounds/engine"), Some("sounds/engine.mp3"));
        assert_eq!(list.sound_count(), 2);
        assert_eq!(list.image_count(), 0);
    }

    #[test]
    fn missing_image_falls_back_to_placeholder() {
        let list = GameFileList::default();
        assert_eq!(list.frames_or("planet/nowhere", PLACEHOLDER_IMAGE), vec![PLACEHOLDER_IMAGE]);
    }
}
