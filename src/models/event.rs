//! Notification events produced by the diff engine.

use super::{ChannelRecord, VideoRecord};

/// A single notification decided by comparing two snapshots.
///
/// Events borrow from the snapshots they were computed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationEvent<'a> {
    /// A video appeared in a tracked playlist
    VideoAdded(&'a VideoRecord),

    /// A previously tracked video is gone
    VideoRemoved { video_id: &'a str },

    /// A channel crossed a subscriber threshold
    SubscriberMilestone {
        channel: &'a ChannelRecord,
        threshold: u64,
    },

    /// A video crossed a view-count threshold
    ViewMilestone {
        video: &'a VideoRecord,
        threshold: u64,
    },
}

impl NotificationEvent<'_> {
    /// Short machine-friendly name for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::VideoAdded(_) => "video_added",
            Self::VideoRemoved { .. } => "video_removed",
            Self::SubscriberMilestone { .. } => "subscriber_milestone",
            Self::ViewMilestone { .. } => "view_milestone",
        }
    }

    /// ID of the channel or video the event is about.
    pub fn subject_id(&self) -> &str {
        match self {
            Self::VideoAdded(video) => &video.id,
            Self::VideoRemoved { video_id } => video_id,
            Self::SubscriberMilestone { channel, .. } => &channel.id,
            Self::ViewMilestone { video, .. } => &video.id,
        }
    }

    /// Whether the originating entity also posts to the secondary sink.
    ///
    /// Removals carry only an id and never reach the secondary sink.
    pub fn wants_secondary(&self) -> bool {
        match self {
            Self::VideoAdded(video) => video.notify_secondary,
            Self::VideoRemoved { .. } => false,
            Self::SubscriberMilestone { channel, .. } => channel.notify_secondary,
            Self::ViewMilestone { video, .. } => video.notify_secondary,
        }
    }
}
