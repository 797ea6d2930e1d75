// src/pipeline/collect.rs

//! Builds the current snapshot from the metric fetcher.
//!
//! Fetch failures never abort collection: the affected entity gets a zero
//! metric (or, for a playlist listing, contributes no further videos) and a
//! warning is logged.

use std::collections::HashSet;
use std::time::Duration;

use chrono::Utc;

use crate::models::{ChannelRecord, Config, Snapshot, TrackedSpec, VideoRecord};
use crate::services::{MetricFetcher, PlaylistItem};

/// Collects channel and video records for every configured entity.
pub struct SnapshotCollector<'a> {
    fetcher: &'a dyn MetricFetcher,
    delay: Duration,
}

impl<'a> SnapshotCollector<'a> {
    /// Create a collector pausing `delay` after each metric request.
    pub fn new(fetcher: &'a dyn MetricFetcher, delay: Duration) -> Self {
        Self { fetcher, delay }
    }

    /// Fetch channels, then playlists, in configured order.
    pub async fn collect(&self, config: &Config) -> Snapshot {
        let mut snapshot = Snapshot::default();

        let mut seen_channels = HashSet::new();
        for spec in &config.channels {
            if !seen_channels.insert(spec.id.as_str()) {
                log::debug!("Skipping duplicate channel entry {}", spec.id);
                continue;
            }
            snapshot.channels.push(self.collect_channel(spec).await);
        }
        log::info!("Fetched {} channels", snapshot.channels.len());

        let mut seen_videos = HashSet::new();
        for spec in &config.playlists {
            let items = self.list_playlist(spec).await;
            let mut added = 0;

            for item in items {
                if !seen_videos.insert(item.video_id.clone()) {
                    log::debug!(
                        "Video {} already tracked from another listing, skipping",
                        item.video_id
                    );
                    continue;
                }
                snapshot.videos.push(self.collect_video(spec, item).await);
                added += 1;
            }
            log::info!("Fetched {} videos from playlist {}", added, spec.id);
        }

        snapshot
    }

    async fn collect_channel(&self, spec: &TrackedSpec) -> ChannelRecord {
        log::info!("Fetching channel info for {} ({})", spec.desc, spec.id);

        let record = match self.fetcher.channel_stats(&spec.id).await {
            Ok(stats) => {
                log::info!(
                    "Fetched subscriber_count={} for {}",
                    stats.subscriber_count,
                    spec.id
                );
                let display_name = if spec.desc.trim().is_empty() {
                    stats.title
                } else {
                    spec.desc.clone()
                };
                ChannelRecord {
                    id: spec.id.clone(),
                    display_name,
                    subscriber_count: stats.subscriber_count,
                    observed_at: stats.observed_at,
                    notify_secondary: spec.twitter_enabled,
                }
            }
            Err(e) => {
                log::warn!(
                    "Failed to fetch channel {} ({}), using zero subscriber count",
                    spec.id,
                    e
                );
                let display_name = if spec.desc.trim().is_empty() {
                    spec.id.clone()
                } else {
                    spec.desc.clone()
                };
                ChannelRecord {
                    id: spec.id.clone(),
                    display_name,
                    subscriber_count: 0,
                    observed_at: Utc::now(),
                    notify_secondary: spec.twitter_enabled,
                }
            }
        };

        self.pace().await;
        record
    }

    async fn list_playlist(&self, spec: &TrackedSpec) -> Vec<PlaylistItem> {
        log::info!("Fetching playlist videos for {} ({})", spec.desc, spec.id);

        match self.fetcher.playlist_items(&spec.id).await {
            Ok(items) => items,
            Err((partial, e)) => {
                log::warn!(
                    "Failed to list playlist {} after {} items: {}",
                    spec.id,
                    partial.len(),
                    e
                );
                partial
            }
        }
    }

    async fn collect_video(&self, spec: &TrackedSpec, item: PlaylistItem) -> VideoRecord {
        let view_count = match self.fetcher.video_view_count(&item.video_id).await {
            Ok(count) => {
                log::debug!("View count for {}: {}", item.video_id, count);
                count
            }
            Err(e) => {
                log::warn!(
                    "Failed to fetch views for video {} ({}), using zero view count",
                    item.video_id,
                    e
                );
                0
            }
        };

        self.pace().await;
        VideoRecord {
            url: VideoRecord::watch_url(&item.video_id),
            id: item.video_id,
            title: item.title,
            view_count,
            observed_at: item.observed_at,
            source_playlist_id: spec.id.clone(),
            source_playlist_label: spec.desc.clone(),
            notify_secondary: spec.twitter_enabled,
        }
    }

    async fn pace(&self) {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{AppError, Result};
    use crate::services::{ChannelStats, PlaylistPage};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct StubFetcher {
        channels: HashMap<String, u64>,
        playlists: HashMap<String, Vec<&'static str>>,
        views: HashMap<String, u64>,
        calls: Mutex<Vec<String>>,
    }

    impl StubFetcher {
        fn log(&self, call: String) {
            self.calls.lock().unwrap().push(call);
        }
    }

    #[async_trait]
    impl MetricFetcher for StubFetcher {
        async fn channel_stats(&self, channel_id: &str) -> Result<ChannelStats> {
            self.log(format!("channel:{channel_id}"));
            let count = self
                .channels
                .get(channel_id)
                .ok_or_else(|| AppError::api(channel_id, "no channel data returned"))?;
            Ok(ChannelStats {
                subscriber_count: *count,
                title: format!("Title {channel_id}"),
                observed_at: Utc::now(),
            })
        }

        async fn video_view_count(&self, video_id: &str) -> Result<u64> {
            self.log(format!("video:{video_id}"));
            self.views
                .get(video_id)
                .copied()
                .ok_or_else(|| AppError::api(video_id, "no statistics returned"))
        }

        async fn playlist_page(&self, playlist_id: &str, _: Option<&str>) -> Result<PlaylistPage> {
            self.log(format!("playlist:{playlist_id}"));
            let ids = self
                .playlists
                .get(playlist_id)
                .ok_or_else(|| AppError::api(playlist_id, "playlist not found"))?;
            Ok(PlaylistPage {
                items: ids
                    .iter()
                    .map(|id| PlaylistItem {
                        video_id: id.to_string(),
                        title: format!("Video {id}"),
                        observed_at: Utc::now(),
                    })
                    .collect(),
                next_page_token: None,
            })
        }
    }

    fn spec(id: &str, desc: &str, secondary: bool) -> TrackedSpec {
        TrackedSpec {
            id: id.to_string(),
            desc: desc.to_string(),
            twitter_enabled: secondary,
        }
    }

    #[tokio::test]
    async fn test_collects_in_configured_order() {
        let fetcher = StubFetcher {
            channels: HashMap::from([("UC1".into(), 10), ("UC2".into(), 20)]),
            playlists: HashMap::from([("PLa".into(), vec!["a1", "a2"]), ("PLb".into(), vec!["b1"])]),
            views: HashMap::from([("a1".into(), 1), ("a2".into(), 2), ("b1".into(), 3)]),
            ..StubFetcher::default()
        };
        let config = Config {
            channels: vec![spec("UC2", "Second", false), spec("UC1", "First", true)],
            playlists: vec![spec("PLb", "B", true), spec("PLa", "A", false)],
            ..Config::default()
        };

        let snapshot = SnapshotCollector::new(&fetcher, Duration::ZERO)
            .collect(&config)
            .await;

        let channel_ids: Vec<_> = snapshot.channels.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(channel_ids, vec!["UC2", "UC1"]);
        assert!(snapshot.channels[1].notify_secondary);

        let video_ids: Vec<_> = snapshot.videos.iter().map(|v| v.id.as_str()).collect();
        assert_eq!(video_ids, vec!["b1", "a1", "a2"]);
        assert_eq!(snapshot.videos[0].source_playlist_label, "B");
        assert!(snapshot.videos[0].notify_secondary);
        assert_eq!(snapshot.videos[1].url, "https://youtu.be/a1");

        let calls = fetcher.calls.lock().unwrap().clone();
        assert_eq!(
            calls,
            vec![
                "channel:UC2",
                "channel:UC1",
                "playlist:PLb",
                "video:b1",
                "playlist:PLa",
                "video:a1",
                "video:a2",
            ]
        );
    }

    #[tokio::test]
    async fn test_fetch_failures_fall_back_to_zero() {
        let fetcher = StubFetcher {
            playlists: HashMap::from([("PL1".into(), vec!["v1"])]),
            ..StubFetcher::default()
        };
        let config = Config {
            channels: vec![spec("UCmissing", "Missing", false)],
            playlists: vec![spec("PL1", "Uploads", false), spec("PLmissing", "Gone", false)],
            ..Config::default()
        };

        let snapshot = SnapshotCollector::new(&fetcher, Duration::ZERO)
            .collect(&config)
            .await;

        assert_eq!(snapshot.channels.len(), 1);
        assert_eq!(snapshot.channels[0].subscriber_count, 0);
        assert_eq!(snapshot.channels[0].display_name, "Missing");
        assert_eq!(snapshot.videos.len(), 1);
        assert_eq!(snapshot.videos[0].view_count, 0);
    }

    #[tokio::test]
    async fn test_duplicate_entries_recorded_once() {
        let fetcher = StubFetcher {
            channels: HashMap::from([("UC1".into(), 10)]),
            playlists: HashMap::from([
                ("PLa".into(), vec!["v1", "v2"]),
                ("PLb".into(), vec!["v2", "v3"]),
            ]),
            views: HashMap::from([("v1".into(), 1), ("v2".into(), 2), ("v3".into(), 3)]),
            ..StubFetcher::default()
        };
        let config = Config {
            channels: vec![spec("UC1", "Main", false), spec("UC1", "Main again", false)],
            playlists: vec![spec("PLa", "A", false), spec("PLb", "B", true)],
            ..Config::default()
        };

        let snapshot = SnapshotCollector::new(&fetcher, Duration::ZERO)
            .collect(&config)
            .await;

        assert_eq!(snapshot.channels.len(), 1);
        let video_ids: Vec<_> = snapshot.videos.iter().map(|v| v.id.as_str()).collect();
        assert_eq!(video_ids, vec!["v1", "v2", "v3"]);
        assert_eq!(snapshot.videos[1].source_playlist_id, "PLa");
    }

    #[tokio::test]
    async fn test_blank_label_uses_fetched_title() {
        let fetcher = StubFetcher {
            channels: HashMap::from([("UC1".into(), 10)]),
            ..StubFetcher::default()
        };
        let config = Config {
            channels: vec![spec("UC1", "", false)],
            ..Config::default()
        };

        let snapshot = SnapshotCollector::new(&fetcher, Duration::ZERO)
            .collect(&config)
            .await;
        assert_eq!(snapshot.channels[0].display_name, "Title UC1");
    }

    #[tokio::test]
    async fn test_failed_channel_with_blank_label_uses_id() {
        let fetcher = StubFetcher::default();
        let config = Config {
            channels: vec![spec("UCgone", "  ", false)],
            ..Config::default()
        };

        let snapshot = SnapshotCollector::new(&fetcher, Duration::ZERO)
            .collect(&config)
            .await;
        assert_eq!(snapshot.channels[0].display_name, "UCgone");
        assert_eq!(snapshot.channels[0].subscriber_count, 0);
    }
}
