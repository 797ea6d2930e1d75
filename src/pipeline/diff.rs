//! Diff calculation between two snapshots.
//!
//! Events are produced lazily in a fixed order so the notifier can dispatch
//! each one before the next is computed:
//!
//! 1. Added videos (current order)
//! 2. Removed videos (previous order)
//! 3. Subscriber milestones per channel, thresholds in configured order
//! 4. View milestones per video, thresholds in configured order
//!
//! A threshold `t` is crossed when `previous < t <= current`, with `previous`
//! taken as zero for entities absent from the previous snapshot. A new video
//! can therefore produce both an added event and view milestones in one cycle.

use std::collections::{HashMap, HashSet};

use crate::models::{ChannelRecord, NotificationEvent, Snapshot, ThresholdConfig, VideoRecord};

/// Thresholds crossed going from `previous` to `current`, in configured order.
pub fn crossed_thresholds(
    previous: u64,
    current: u64,
    thresholds: &[u64],
) -> impl Iterator<Item = u64> + '_ {
    thresholds
        .iter()
        .copied()
        .filter(move |&t| previous < t && t <= current)
}

/// Calculator for the events between a previous and a current snapshot.
#[derive(Debug)]
pub struct DiffCalculator<'a> {
    previous: &'a Snapshot,
    current: &'a Snapshot,
    thresholds: &'a ThresholdConfig,
    prev_channels: HashMap<&'a str, &'a ChannelRecord>,
    prev_videos: HashMap<&'a str, &'a VideoRecord>,
    curr_video_ids: HashSet<&'a str>,
}

impl<'a> DiffCalculator<'a> {
    /// Create a calculator over two snapshots.
    pub fn new(
        previous: &'a Snapshot,
        current: &'a Snapshot,
        thresholds: &'a ThresholdConfig,
    ) -> Self {
        Self {
            previous,
            current,
            thresholds,
            prev_channels: previous.channel_index(),
            prev_videos: previous.video_index(),
            curr_video_ids: current.videos.iter().map(|v| v.id.as_str()).collect(),
        }
    }

    /// Videos present now but not before.
    pub fn added(&self) -> impl Iterator<Item = NotificationEvent<'a>> + '_ {
        self.current
            .videos
            .iter()
            .filter(|v| !self.prev_videos.contains_key(v.id.as_str()))
            .map(NotificationEvent::VideoAdded)
    }

    /// Videos present before but not now.
    pub fn removed(&self) -> impl Iterator<Item = NotificationEvent<'a>> + '_ {
        self.previous
            .videos
            .iter()
            .filter(|v| !self.curr_video_ids.contains(v.id.as_str()))
            .map(|v| NotificationEvent::VideoRemoved {
                video_id: v.id.as_str(),
            })
    }

    /// Subscriber thresholds crossed by each current channel.
    pub fn subscriber_milestones(&self) -> impl Iterator<Item = NotificationEvent<'a>> + '_ {
        let thresholds = self.thresholds.subscribers.as_slice();
        self.current.channels.iter().flat_map(move |channel| {
            let previous = self
                .prev_channels
                .get(channel.id.as_str())
                .map_or(0, |c| c.subscriber_count);
            crossed_thresholds(previous, channel.subscriber_count, thresholds).map(
                move |threshold| NotificationEvent::SubscriberMilestone { channel, threshold },
            )
        })
    }

    /// View thresholds crossed by each current video.
    pub fn view_milestones(&self) -> impl Iterator<Item = NotificationEvent<'a>> + '_ {
        let thresholds = self.thresholds.views.as_slice();
        self.current.videos.iter().flat_map(move |video| {
            let previous = self
                .prev_videos
                .get(video.id.as_str())
                .map_or(0, |v| v.view_count);
            crossed_thresholds(previous, video.view_count, thresholds)
                .map(move |threshold| NotificationEvent::ViewMilestone { video, threshold })
        })
    }

    /// All events in dispatch order.
    pub fn events(&self) -> impl Iterator<Item = NotificationEvent<'a>> + '_ {
        self.added()
            .chain(self.removed())
            .chain(self.subscriber_milestones())
            .chain(self.view_milestones())
    }
}

/// Convenience function to collect all events between two snapshots.
pub fn calculate_events<'a>(
    previous: &'a Snapshot,
    current: &'a Snapshot,
    thresholds: &'a ThresholdConfig,
) -> Vec<NotificationEvent<'a>> {
    DiffCalculator::new(previous, current, thresholds)
        .events()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn channel(id: &str, subscribers: u64) -> ChannelRecord {
        ChannelRecord {
            id: id.to_string(),
            display_name: format!("Channel {id}"),
            subscriber_count: subscribers,
            observed_at: Utc::now(),
            notify_secondary: false,
        }
    }

    fn video(id: &str, views: u64) -> VideoRecord {
        VideoRecord {
            id: id.to_string(),
            title: format!("Video {id}"),
            url: VideoRecord::watch_url(id),
            view_count: views,
            observed_at: Utc::now(),
            source_playlist_id: "PL1".to_string(),
            source_playlist_label: "Uploads".to_string(),
            notify_secondary: false,
        }
    }

    fn snapshot(channels: Vec<ChannelRecord>, videos: Vec<VideoRecord>) -> Snapshot {
        Snapshot { channels, videos }
    }

    fn thresholds(subscribers: &[u64], views: &[u64]) -> ThresholdConfig {
        ThresholdConfig {
            subscribers: subscribers.to_vec(),
            views: views.to_vec(),
        }
    }

    fn summarize(events: &[NotificationEvent<'_>]) -> Vec<(&'static str, String)> {
        events
            .iter()
            .map(|e| {
                let detail = match e {
                    NotificationEvent::SubscriberMilestone { threshold, .. }
                    | NotificationEvent::ViewMilestone { threshold, .. } => {
                        format!("{}@{}", e.subject_id(), threshold)
                    }
                    _ => e.subject_id().to_string(),
                };
                (e.kind(), detail)
            })
            .collect()
    }

    #[test]
    fn test_no_changes() {
        let prev = snapshot(vec![channel("UC1", 1500)], vec![video("v1", 10)]);
        let curr = prev.clone();
        let config = thresholds(&[1000], &[100]);

        assert!(calculate_events(&prev, &curr, &config).is_empty());
    }

    #[test]
    fn test_added_video() {
        let prev = snapshot(vec![channel("UC1", 1)], vec![]);
        let curr = snapshot(vec![channel("UC1", 1)], vec![video("v1", 5)]);
        let config = thresholds(&[], &[]);

        let events = calculate_events(&prev, &curr, &config);
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], NotificationEvent::VideoAdded(v) if v.id == "v1"));
    }

    #[test]
    fn test_removed_video() {
        let prev = snapshot(vec![], vec![video("v1", 5)]);
        let curr = snapshot(vec![], vec![]);
        let config = thresholds(&[], &[]);

        let events = calculate_events(&prev, &curr, &config);
        assert_eq!(events, vec![NotificationEvent::VideoRemoved { video_id: "v1" }]);
    }

    #[test]
    fn test_single_threshold_crossing() {
        let prev = snapshot(vec![channel("UC1", 900)], vec![]);
        let curr = snapshot(vec![channel("UC1", 1000)], vec![]);
        let config = thresholds(&[1000], &[]);

        let events = calculate_events(&prev, &curr, &config);
        assert_eq!(
            summarize(&events),
            vec![("subscriber_milestone", "UC1@1000".to_string())]
        );
    }

    #[test]
    fn test_multiple_threshold_crossings_in_config_order() {
        let prev = snapshot(vec![channel("UC1", 900)], vec![]);
        let curr = snapshot(vec![channel("UC1", 2100)], vec![]);
        let config = thresholds(&[1000, 2000], &[]);

        let events = calculate_events(&prev, &curr, &config);
        assert_eq!(
            summarize(&events),
            vec![
                ("subscriber_milestone", "UC1@1000".to_string()),
                ("subscriber_milestone", "UC1@2000".to_string()),
            ]
        );
    }

    #[test]
    fn test_unsorted_thresholds_keep_config_order() {
        let prev = snapshot(vec![channel("UC1", 0)], vec![]);
        let curr = snapshot(vec![channel("UC1", 5000)], vec![]);
        let config = thresholds(&[3000, 1000, 9000, 2000], &[]);

        let events = calculate_events(&prev, &curr, &config);
        assert_eq!(
            summarize(&events),
            vec![
                ("subscriber_milestone", "UC1@3000".to_string()),
                ("subscriber_milestone", "UC1@1000".to_string()),
                ("subscriber_milestone", "UC1@2000".to_string()),
            ]
        );
    }

    #[test]
    fn test_no_spurious_recrossing() {
        let prev = snapshot(vec![channel("UC1", 1500)], vec![]);
        let curr = snapshot(vec![channel("UC1", 1600)], vec![]);
        let config = thresholds(&[1000], &[]);

        assert!(calculate_events(&prev, &curr, &config).is_empty());
    }

    #[test]
    fn test_decrease_never_crosses() {
        let prev = snapshot(vec![channel("UC1", 2100)], vec![]);
        let curr = snapshot(vec![channel("UC1", 900)], vec![]);
        let config = thresholds(&[1000, 2000], &[]);

        assert!(calculate_events(&prev, &curr, &config).is_empty());
    }

    #[test]
    fn test_new_channel_counts_from_zero() {
        let prev = snapshot(vec![channel("UC1", 10)], vec![]);
        let curr = snapshot(vec![channel("UC1", 10), channel("UC2", 1500)], vec![]);
        let config = thresholds(&[1000], &[]);

        let events = calculate_events(&prev, &curr, &config);
        assert_eq!(
            summarize(&events),
            vec![("subscriber_milestone", "UC2@1000".to_string())]
        );
    }

    #[test]
    fn test_new_video_immediate_milestone() {
        let prev = snapshot(vec![channel("UC1", 1)], vec![]);
        let curr = snapshot(vec![channel("UC1", 1)], vec![video("v1", 5000)]);
        let config = thresholds(&[], &[1000]);

        let events = calculate_events(&prev, &curr, &config);
        assert_eq!(
            summarize(&events),
            vec![
                ("video_added", "v1".to_string()),
                ("view_milestone", "v1@1000".to_string()),
            ]
        );
    }

    #[test]
    fn test_exact_threshold_boundary() {
        let prev = snapshot(vec![], vec![video("v1", 999)]);
        let curr = snapshot(vec![], vec![video("v1", 1000)]);
        let config = thresholds(&[], &[1000]);
        assert_eq!(calculate_events(&prev, &curr, &config).len(), 1);

        // Starting exactly on the threshold means it was already crossed
        let prev = snapshot(vec![], vec![video("v1", 1000)]);
        let curr = snapshot(vec![], vec![video("v1", 5000)]);
        assert!(calculate_events(&prev, &curr, &config).is_empty());
    }

    #[test]
    fn test_full_ordering() {
        let prev = snapshot(
            vec![channel("UC1", 900)],
            vec![video("keep", 50), video("gone", 1)],
        );
        let curr = snapshot(
            vec![channel("UC1", 1200)],
            vec![video("new", 20), video("keep", 150)],
        );
        let config = thresholds(&[1000], &[10, 100]);

        let events = calculate_events(&prev, &curr, &config);
        assert_eq!(
            summarize(&events),
            vec![
                ("video_added", "new".to_string()),
                ("video_removed", "gone".to_string()),
                ("subscriber_milestone", "UC1@1000".to_string()),
                ("view_milestone", "new@10".to_string()),
                ("view_milestone", "keep@100".to_string()),
            ]
        );
    }

    #[test]
    fn test_empty_to_full() {
        let prev = Snapshot::default();
        let curr = snapshot(vec![], vec![video("v1", 0), video("v2", 0)]);
        let config = thresholds(&[], &[]);

        let calc = DiffCalculator::new(&prev, &curr, &config);
        assert_eq!(calc.added().count(), 2);
        assert_eq!(calc.removed().count(), 0);
    }

    #[test]
    fn test_crossed_thresholds() {
        let crossed: Vec<u64> = crossed_thresholds(900, 2100, &[500, 1000, 2000, 3000]).collect();
        assert_eq!(crossed, vec![1000, 2000]);
        assert_eq!(crossed_thresholds(0, 0, &[0]).count(), 0);
    }
}
