//! Service layer for the watcher.
//!
//! This module contains the external collaborators:
//! - Metric fetching (`MetricFetcher`, `YouTubeFetcher`)
//! - Notification delivery (`NotificationSink`, `DiscordWebhook`, `SocialPost`)

mod sinks;
mod youtube;

pub use sinks::{
    DiscordWebhook, NotificationSink, SocialPost, primary_from_config, secondary_from_config,
};
pub use youtube::{ChannelStats, MetricFetcher, PlaylistItem, PlaylistPage, YouTubeFetcher};
