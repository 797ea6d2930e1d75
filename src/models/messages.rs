//! Notification text templates.

use serde::{Deserialize, Serialize};
use unicode_segmentation::UnicodeSegmentation;

use super::NotificationEvent;

/// Which sink a message is rendered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkRole {
    Primary,
    Secondary,
}

/// Message templates with `{placeholder}` substitution.
///
/// Supported placeholders:
/// - `video_added`, `video_added_secondary`: `{playlist}`, `{title}`, `{video_id}`, `{views}`, `{url}`
/// - `video_removed`: `{video_id}`
/// - `subscriber_milestone`: `{channel}`, `{channel_id}`, `{threshold}`, `{count}`
/// - `view_milestone`: `{title}`, `{video_id}`, `{threshold}`, `{count}`, `{url}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageTemplates {
    #[serde(default = "defaults::video_added")]
    pub video_added: String,
    #[serde(default = "defaults::video_added_secondary")]
    pub video_added_secondary: String,
    #[serde(default = "defaults::video_removed")]
    pub video_removed: String,
    #[serde(default = "defaults::subscriber_milestone")]
    pub subscriber_milestone: String,
    #[serde(default = "defaults::view_milestone")]
    pub view_milestone: String,
}

impl Default for MessageTemplates {
    fn default() -> Self {
        Self {
            video_added: defaults::video_added(),
            video_added_secondary: defaults::video_added_secondary(),
            video_removed: defaults::video_removed(),
            subscriber_milestone: defaults::subscriber_milestone(),
            view_milestone: defaults::view_milestone(),
        }
    }
}

impl MessageTemplates {
    /// Render the text for an event as posted to the given sink.
    pub fn render(&self, event: &NotificationEvent<'_>, role: SinkRole) -> String {
        match *event {
            NotificationEvent::VideoAdded(video) => {
                let template = match role {
                    SinkRole::Primary => &self.video_added,
                    SinkRole::Secondary => &self.video_added_secondary,
                };
                let views = video.view_count.to_string();
                fill(
                    template,
                    &[
                        ("playlist", video.source_playlist_label.as_str()),
                        ("title", video.title.as_str()),
                        ("video_id", video.id.as_str()),
                        ("views", views.as_str()),
                        ("url", video.url.as_str()),
                    ],
                )
            }
            NotificationEvent::VideoRemoved { video_id } => {
                fill(&self.video_removed, &[("video_id", video_id)])
            }
            NotificationEvent::SubscriberMilestone { channel, threshold } => {
                let threshold = threshold.to_string();
                let count = channel.subscriber_count.to_string();
                fill(
                    &self.subscriber_milestone,
                    &[
                        ("channel", channel.display_name.as_str()),
                        ("channel_id", channel.id.as_str()),
                        ("threshold", threshold.as_str()),
                        ("count", count.as_str()),
                    ],
                )
            }
            NotificationEvent::ViewMilestone { video, threshold } => {
                let threshold = threshold.to_string();
                let count = video.view_count.to_string();
                fill(
                    &self.view_milestone,
                    &[
                        ("title", video.title.as_str()),
                        ("video_id", video.id.as_str()),
                        ("threshold", threshold.as_str()),
                        ("count", count.as_str()),
                        ("url", video.url.as_str()),
                    ],
                )
            }
        }
    }
}

/// Substitute `{name}` tokens in a single left-to-right pass.
///
/// Inserted values are never rescanned. Unknown tokens are kept verbatim.
fn fill(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let token = &rest[open..];

        let value = token[1..].find('}').and_then(|len| {
            let name = &token[1..=len];
            values
                .iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| (*value, len + 2))
        });
        match value {
            Some((value, consumed)) => {
                out.push_str(value);
                rest = &token[consumed..];
            }
            None => {
                out.push('{');
                rest = &token[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// Truncate text to at most `max_chars` grapheme clusters, marking the cut with `…`.
pub fn truncate_graphemes(text: &str, max_chars: usize) -> String {
    if text.graphemes(true).count() <= max_chars {
        return text.to_string();
    }
    if max_chars == 0 {
        return String::new();
    }

    let mut out: String = text.graphemes(true).take(max_chars - 1).collect();
    out.push('…');
    out
}

mod defaults {
    pub fn video_added() -> String {
        "➕ New video detected: [{playlist}] '{title}' ({video_id}) is now monitored. Current views: {views}.".into()
    }
    pub fn video_added_secondary() -> String {
        "New video in {playlist}: {title} {url}".into()
    }
    pub fn video_removed() -> String {
        "🗑️ Video removed: ID {video_id} has been excluded from the playlist.".into()
    }
    pub fn subscriber_milestone() -> String {
        "🎉 Milestone reached: Channel '{channel}' ({channel_id}) surpassed {threshold} subscribers! Current: {count}.".into()
    }
    pub fn view_milestone() -> String {
        "🎉 Milestone reached: Video '{title}' ({video_id}) surpassed {threshold} views! Current: {count}.".into()
    }
}
