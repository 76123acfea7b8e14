//! YouTube transcript tool.
//!
//! Extracts the video ID from a shared link and fetches the caption track
//! from the public timedtext endpoint. Transcript problems (no captions,
//! unreachable endpoint) come back as explanatory strings rather than
//! errors so a shared link never breaks the conversation.

use async_trait::async_trait;
use nanoclaw_core::error::ToolError;
use nanoclaw_core::tool::{InvocationContext, Tool};
use regex::Regex;
use std::sync::LazyLock;
use tracing::{debug, info};

/// Transcript text is capped so one video cannot flood the context.
const MAX_TRANSCRIPT_CHARS: usize = 16_000;

static VIDEO_ID_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        Regex::new(
            r"(?:youtube\.com/watch\?v=|youtu\.be/|youtube\.com/embed/|youtube\.com/v/)([^&\n?#\s]+)",
        )
        .expect("static regex"),
        Regex::new(r"youtube\.com/shorts/([^&\n?#\s]+)").expect("static regex"),
    ]
});

/// Extract the video ID from any common YouTube URL form, or None if the
/// text contains no recognizable link.
pub fn extract_video_id(text: &str) -> Option<String> {
    VIDEO_ID_PATTERNS
        .iter()
        .find_map(|re| re.captures(text))
        .map(|caps| caps[1].to_string())
}

pub struct YoutubeTranscriptTool {
    client: reqwest::Client,
    /// Caption languages to try, in order.
    languages: Vec<String>,
}

impl YoutubeTranscriptTool {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(20))
            .build()
            .unwrap_or_default();
        Self {
            client,
            languages: vec!["en".into(), "ru".into()],
        }
    }

    async fn fetch_transcript(&self, video_id: &str) -> String {
        for lang in &self.languages {
            let url = format!(
                "https://www.youtube.com/api/timedtext?lang={lang}&v={video_id}"
            );
            debug!(video_id, lang = %lang, "Fetching caption track");
            let Ok(response) = self.client.get(&url).send().await else {
                continue;
            };
            if !response.status().is_success() {
                continue;
            }
            let Ok(body) = response.text().await else {
                continue;
            };
            if body.trim().is_empty() {
                continue;
            }
            let transcript = parse_timedtext(&body);
            if !transcript.is_empty() {
                info!(video_id, lang = %lang, chars = transcript.len(), "Transcript extracted");
                return format!("YouTube Video Transcript (ID: {video_id}):\n\n{transcript}");
            }
        }
        format!("Error: No transcript available for video {video_id}.")
    }
}

impl Default for YoutubeTranscriptTool {
    fn default() -> Self {
        Self::new()
    }
}

/// Pull the caption text out of a timedtext XML document.
fn parse_timedtext(xml: &str) -> String {
    static TEXT_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"<text[^>]*>([^<]*)</text>").expect("static regex"));

    let mut parts: Vec<String> = Vec::new();
    for caps in TEXT_RE.captures_iter(xml) {
        let segment = decode_entities(&caps[1]);
        let segment = segment.trim();
        if !segment.is_empty() {
            parts.push(segment.to_string());
        }
    }

    let mut transcript = parts.join(" ");
    if transcript.len() > MAX_TRANSCRIPT_CHARS {
        let mut cut = MAX_TRANSCRIPT_CHARS;
        while !transcript.is_char_boundary(cut) {
            cut -= 1;
        }
        transcript.truncate(cut);
        transcript.push_str("...\n[Transcript truncated due to length]");
    }
    transcript
}

fn decode_entities(s: &str) -> String {
    s.replace("&amp;#39;", "'")
        .replace("&#39;", "'")
        .replace("&quot;", "\"")
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
}

#[async_trait]
impl Tool for YoutubeTranscriptTool {
    fn name(&self) -> &str {
        "youtube_transcript"
    }

    fn description(&self) -> &str {
        "Extract the transcript of a YouTube video from its URL. Use this when someone shares a YouTube link and you need to understand the content."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "url": {
                    "type": "string",
                    "description": "The YouTube video URL (youtube.com/watch?v=... or youtu.be/...)"
                }
            },
            "required": ["url"]
        })
    }

    async fn execute(
        &self,
        arguments: serde_json::Value,
        _ctx: &InvocationContext,
    ) -> Result<String, ToolError> {
        let url = arguments["url"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'url' argument".into()))?;

        let Some(video_id) = extract_video_id(url) else {
            return Ok(format!("Error: Could not extract video ID from URL: {url}"));
        };

        Ok(self.fetch_transcript(&video_id).await)
    }
}
