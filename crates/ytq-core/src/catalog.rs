//! Static catalog of download formats.
//!
//! Each entry maps a human-readable label to the downloader's selector
//! expression (`-f`) and, for audio conversions, the post-processing
//! arguments that go with it. Order is the display order: video by
//! container, high resolution video, then audio.

use serde::Serialize;

/// Format id used when nothing else is configured.
pub const DEFAULT_FORMAT_ID: &str = "webm-1080";

/// Grouping shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Category {
    #[serde(rename = "video-webm")]
    VideoWebm,
    #[serde(rename = "video-mp4")]
    VideoMp4,
    #[serde(rename = "high-res")]
    HighRes,
    #[serde(rename = "audio")]
    Audio,
}

impl Category {
    pub fn label(self) -> &'static str {
        match self {
            Category::VideoWebm => "Video (WebM)",
            Category::VideoMp4 => "Video (MP4/AVC)",
            Category::HighRes => "High Res (WebM)",
            Category::Audio => "Audio",
        }
    }
}

/// One selectable format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FormatSpec {
    pub id: &'static str,
    pub category: Category,
    pub label: &'static str,
    /// Media selector passed with `-f`.
    pub selector: &'static str,
    /// Extra post-processing arguments, whitespace separated.
    pub post_args: Option<&'static str>,
}

impl FormatSpec {
    /// Post-processing arguments split into individual argv entries.
    pub fn post_arguments(&self) -> impl Iterator<Item = &'static str> {
        self.post_args.into_iter().flat_map(str::split_whitespace)
    }
}

const fn video(id: &'static str, category: Category, label: &'static str, selector: &'static str) -> FormatSpec {
    FormatSpec {
        id,
        category,
        label,
        selector,
        post_args: None,
    }
}

const fn audio(id: &'static str, label: &'static str, selector: &'static str, post_args: Option<&'static str>) -> FormatSpec {
    FormatSpec {
        id,
        category: Category::Audio,
        label,
        selector,
        post_args,
    }
}

static CATALOG: [FormatSpec; 15] = [
    video("webm-144", Category::VideoWebm, "144p", "bv*[ext=webm][height<=144]+ba*[ext=webm]"),
    video("webm-240", Category::VideoWebm, "240p", "bv*[ext=webm][height<=240]+ba*[ext=webm]"),
    video("webm-360", Category::VideoWebm, "360p", "bv*[ext=webm][height<=360]+ba*[ext=webm]"),
    video("webm-480", Category::VideoWebm, "480p", "bv*[ext=webm][height<=480]+ba*[ext=webm]"),
    video("webm-720", Category::VideoWebm, "720p", "bv*[ext=webm][height<=720]+ba*[ext=webm]"),
    video("webm-1080", Category::VideoWebm, "1080p", "bv*[ext=webm][height<=1080]+ba*[ext=webm]"),
    video(
        "mp4-1080",
        Category::VideoMp4,
        "1080p (MP4)",
        "bv*[vcodec*=avc1][height<=1080]+ba[ext=m4a]/bv*[ext=mp4][height<=1080]+ba[ext=m4a]",
    ),
    video("webm-1440", Category::HighRes, "2K (1440p)", "bv*[ext=webm][height<=1440]+ba*[ext=webm]"),
    video("webm-2160", Category::HighRes, "4K (2160p)", "bv*[ext=webm][height<=2160]+ba*[ext=webm]"),
    video("webm-4320", Category::HighRes, "8K (4320p)", "bv*[ext=webm][height<=4320]+ba*[ext=webm]"),
    audio(
        "mp3",
        "MP3 (192kbps)",
        "ba/bestaudio",
        Some("--extract-audio --audio-format mp3 --audio-quality 192K"),
    ),
    audio("m4a", "M4A (AAC)", "ba*[ext=m4a]/bestaudio[ext=m4a]", None),
    audio("opus", "OPUS (Lossy)", "ba/bestaudio", Some("--extract-audio --audio-format opus")),
    audio("wav", "WAV (Uncompressed)", "ba/bestaudio", Some("--extract-audio --audio-format wav")),
    audio("flac", "FLAC (Lossless)", "ba/bestaudio", Some("--extract-audio --audio-format flac")),
];

/// All formats in display order.
pub fn all() -> &'static [FormatSpec] {
    &CATALOG
}

/// Looks up a format by id (case-insensitive, surrounding whitespace ignored).
pub fn lookup(id: &str) -> Option<&'static FormatSpec> {
    let id = id.trim();
    CATALOG.iter().find(|f| f.id.eq_ignore_ascii_case(id))
}

/// Categories in display order, each with its formats.
pub fn categories() -> Vec<(Category, Vec<&'static FormatSpec>)> {
    let mut out: Vec<(Category, Vec<&'static FormatSpec>)> = Vec::new();
    for spec in CATALOG.iter() {
        match out.last_mut() {
            Some((cat, specs)) if *cat == spec.category => specs.push(spec),
            _ => out.push((spec.category, vec![spec])),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn ids_are_unique() {
        let ids: HashSet<_> = all().iter().map(|f| f.id).collect();
        assert_eq!(ids.len(), all().len());
    }

    #[test]
    fn default_format_exists() {
        let spec = lookup(DEFAULT_FORMAT_ID).expect("default format in catalog");
        assert_eq!(spec.label, "1080p");
        assert_eq!(spec.category, Category::VideoWebm);
    }

    #[test]
    fn lookup_is_case_insensitive() {
        assert_eq!(lookup(" MP3 ").map(|f| f.id), Some("mp3"));
        assert!(lookup("webm-9999").is_none());
        assert!(lookup("").is_none());
    }

    #[test]
    fn categories_keep_display_order() {
        let cats: Vec<_> = categories().into_iter().map(|(c, _)| c).collect();
        assert_eq!(
            cats,
            vec![
                Category::VideoWebm,
                Category::VideoMp4,
                Category::HighRes,
                Category::Audio
            ]
        );
    }

    #[test]
    fn audio_conversions_carry_post_args() {
        let mp3: Vec<_> = lookup("mp3").unwrap().post_arguments().collect();
        assert_eq!(
            mp3,
            vec!["--extract-audio", "--audio-format", "mp3", "--audio-quality", "192K"]
        );
        assert_eq!(lookup("m4a").unwrap().post_arguments().count(), 0);
        assert_eq!(lookup("webm-720").unwrap().post_arguments().count(), 0);
    }
}
