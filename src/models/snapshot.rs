//! Snapshot data structures persisted between cycles.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Latest known metrics for a tracked channel.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChannelRecord {
    /// Channel ID (e.g. `UC...`)
    pub id: String,

    /// Name used in notifications
    pub display_name: String,

    /// Subscriber count at `observed_at`
    pub subscriber_count: u64,

    /// When the count was observed
    pub observed_at: DateTime<Utc>,

    /// Whether milestones are also posted to the secondary sink
    #[serde(default)]
    pub notify_secondary: bool,
}

/// Latest known metrics for a video found in a tracked playlist.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VideoRecord {
    /// Video ID
    pub id: String,

    /// Video title as listed in the playlist
    pub title: String,

    /// Short watch URL
    pub url: String,

    /// View count at `observed_at`
    pub view_count: u64,

    /// When the playlist page listing this video was fetched
    pub observed_at: DateTime<Utc>,

    /// Playlist the video was found in
    pub source_playlist_id: String,

    /// Configured label of that playlist
    pub source_playlist_label: String,

    /// Whether events for this video are also posted to the secondary sink
    #[serde(default)]
    pub notify_secondary: bool,
}

impl VideoRecord {
    /// Short watch URL for a video ID.
    pub fn watch_url(video_id: &str) -> String {
        format!("https://youtu.be/{video_id}")
    }
}

/// All tracked records as of one fetch cycle.
///
/// Records are stored in fetch order; ids are unique within each collection.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Snapshot {
    #[serde(default)]
    pub channels: Vec<ChannelRecord>,

    #[serde(default)]
    pub videos: Vec<VideoRecord>,
}

impl Snapshot {
    /// True when both collections are empty (no baseline yet).
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty() && self.videos.is_empty()
    }

    /// Channel records keyed by id.
    pub fn channel_index(&self) -> HashMap<&str, &ChannelRecord> {
        self.channels.iter().map(|c| (c.id.as_str(), c)).collect()
    }

    /// Video records keyed by id.
    pub fn video_index(&self) -> HashMap<&str, &VideoRecord> {
        self.videos.iter().map(|v| (v.id.as_str(), v)).collect()
    }

    /// Most recent observation time across both collections.
    pub fn latest_observation(&self) -> Option<DateTime<Utc>> {
        self.channels
            .iter()
            .map(|c| c.observed_at)
            .chain(self.videos.iter().map(|v| v.observed_at))
            .max()
    }
}
