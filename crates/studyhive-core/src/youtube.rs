//! Conversion of YouTube watch links to their embeddable form.

use std::sync::LazyLock;

use regex::Regex;

static YOUTUBE_URL: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(
    r"^(https?://)?(www\.)?(youtube|youtu|youtube-nocookie)\.(com|be)/(watch\?v=|embed/|v/|.+\?v=)?([^&=%?]{11})",
  )
  .expect("static regex is valid")
});

/// Extract the 11-character video id from a YouTube URL.
pub fn video_id(url: &str) -> Option<&str> {
  YOUTUBE_URL
    .captures(url.trim())
    .and_then(|c| c.get(6))
    .map(|m| m.as_str())
}

/// Rewrite a YouTube URL to `https://www.youtube.com/embed/<id>`.
/// URLs that are not recognised are returned unchanged.
pub fn embed_url(url: &str) -> String {
  match video_id(url) {
    Some(id) => format!("https://www.youtube.com/embed/{id}"),
    None => url.to_owned(),
  }
}
