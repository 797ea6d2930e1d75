// src/services/youtube.rs

//! Metric fetcher backed by the YouTube Data API v3.
//!
//! Only the fields the watcher needs are deserialized; counts arrive as
//! decimal strings and are parsed to integers.

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::error::{AppError, Result};
use crate::models::ApiConfig;
use crate::utils::http::response_timestamp;

/// Channel statistics as of one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelStats {
    pub subscriber_count: u64,
    pub title: String,
    pub observed_at: DateTime<Utc>,
}

/// A video listed in a playlist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistItem {
    pub video_id: String,
    pub title: String,
    /// When the page listing this item was fetched
    pub observed_at: DateTime<Utc>,
}

/// One page of a playlist listing.
#[derive(Debug, Clone, Default)]
pub struct PlaylistPage {
    pub items: Vec<PlaylistItem>,
    pub next_page_token: Option<String>,
}

/// Source of channel and video metrics.
#[async_trait]
pub trait MetricFetcher: Send + Sync {
    /// Subscriber count and title of a channel.
    async fn channel_stats(&self, channel_id: &str) -> Result<ChannelStats>;

    /// View count of a single video.
    async fn video_view_count(&self, video_id: &str) -> Result<u64>;

    /// A single page of a playlist, starting at `page_token`.
    async fn playlist_page(
        &self,
        playlist_id: &str,
        page_token: Option<&str>,
    ) -> Result<PlaylistPage>;

    /// All items of a playlist in listing order, with pagination drained.
    ///
    /// On a failed page, returns the items gathered so far together with the error.
    async fn playlist_items(
        &self,
        playlist_id: &str,
    ) -> std::result::Result<Vec<PlaylistItem>, (Vec<PlaylistItem>, AppError)> {
        let mut items = Vec::new();
        let mut page_token: Option<String> = None;
        let mut seen_tokens = HashSet::new();

        loop {
            let page = match self.playlist_page(playlist_id, page_token.as_deref()).await {
                Ok(page) => page,
                Err(e) => return Err((items, e)),
            };
            items.extend(page.items);

            match page.next_page_token {
                Some(token) if seen_tokens.insert(token.clone()) => page_token = Some(token),
                Some(token) => {
                    log::warn!(
                        "Playlist {} repeated page token {}, stopping pagination",
                        playlist_id,
                        token
                    );
                    break;
                }
                None => break,
            }
        }
        Ok(items)
    }
}

/// `channels.list` response.
#[derive(Debug, Deserialize)]
struct ChannelListResponse {
    #[serde(default)]
    items: Vec<ChannelResource>,
}

#[derive(Debug, Deserialize)]
struct ChannelResource {
    #[serde(default)]
    snippet: Option<TitleSnippet>,
    #[serde(default)]
    statistics: ChannelStatistics,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChannelStatistics {
    subscriber_count: Option<String>,
    #[serde(default)]
    hidden_subscriber_count: bool,
}

/// `videos.list` response.
#[derive(Debug, Deserialize)]
struct VideoListResponse {
    #[serde(default)]
    items: Vec<VideoResource>,
}

#[derive(Debug, Deserialize)]
struct VideoResource {
    #[serde(default)]
    statistics: VideoStatistics,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoStatistics {
    view_count: Option<String>,
}

/// `playlistItems.list` response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlaylistItemListResponse {
    #[serde(default)]
    items: Vec<PlaylistItemResource>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlaylistItemResource {
    #[serde(default)]
    snippet: Option<TitleSnippet>,
    content_details: PlaylistItemContent,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlaylistItemContent {
    video_id: String,
}

#[derive(Debug, Default, Deserialize)]
struct TitleSnippet {
    #[serde(default)]
    title: String,
}

/// Parse an API count string; absent counts read as zero.
fn parse_count(raw: Option<&str>, context: &str) -> Result<u64> {
    match raw {
        None => Ok(0),
        Some(s) => s
            .trim()
            .parse()
            .map_err(|e| AppError::api(context, format!("invalid count '{s}': {e}"))),
    }
}

/// Metric fetcher talking to the YouTube Data API.
pub struct YouTubeFetcher {
    client: Client,
    config: ApiConfig,
}

impl YouTubeFetcher {
    /// Create a fetcher using a shared HTTP client.
    pub fn new(client: Client, config: ApiConfig) -> Self {
        Self { client, config }
    }

    fn endpoint(&self, resource: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), resource)
    }

    /// GET a resource list and decode it, returning the response timestamp too.
    async fn get_json<T: DeserializeOwned>(
        &self,
        resource: &str,
        params: &[(&str, &str)],
    ) -> Result<(T, DateTime<Utc>)> {
        let mut request = self.client.get(self.endpoint(resource)).query(params);
        if let Some(key) = &self.config.api_key {
            request = request.query(&[("key", key.as_str())]);
        }

        let response = request.send().await?.error_for_status()?;
        let observed_at = response_timestamp(response.headers());
        let body = response.json::<T>().await?;
        Ok((body, observed_at))
    }
}

#[async_trait]
impl MetricFetcher for YouTubeFetcher {
    async fn channel_stats(&self, channel_id: &str) -> Result<ChannelStats> {
        let (response, observed_at): (ChannelListResponse, _) = self
            .get_json("channels", &[("part", "statistics,snippet"), ("id", channel_id)])
            .await?;

        let context = format!("channel {channel_id}");
        let channel = response
            .items
            .into_iter()
            .next()
            .ok_or_else(|| AppError::api(&context, "no channel data returned"))?;

        let subscriber_count = if channel.statistics.hidden_subscriber_count {
            0
        } else {
            parse_count(channel.statistics.subscriber_count.as_deref(), &context)?
        };

        Ok(ChannelStats {
            subscriber_count,
            title: channel.snippet.unwrap_or_default().title,
            observed_at,
        })
    }

    async fn video_view_count(&self, video_id: &str) -> Result<u64> {
        let (response, _): (VideoListResponse, _) = self
            .get_json("videos", &[("part", "statistics"), ("id", video_id)])
            .await?;

        let context = format!("video {video_id}");
        let video = response
            .items
            .into_iter()
            .next()
            .ok_or_else(|| AppError::api(&context, "no statistics returned"))?;

        parse_count(video.statistics.view_count.as_deref(), &context)
    }

    async fn playlist_page(
        &self,
        playlist_id: &str,
        page_token: Option<&str>,
    ) -> Result<PlaylistPage> {
        let page_size = self.config.page_size.to_string();
        let mut params = vec![
            ("part", "snippet,contentDetails"),
            ("playlistId", playlist_id),
            ("maxResults", page_size.as_str()),
        ];
        if let Some(token) = page_token {
            params.push(("pageToken", token));
        }

        let (response, observed_at): (PlaylistItemListResponse, _) =
            self.get_json("playlistItems", &params).await?;

        let items = response
            .items
            .into_iter()
            .map(|item| PlaylistItem {
                video_id: item.content_details.video_id,
                title: item.snippet.unwrap_or_default().title,
                observed_at,
            })
            .collect();

        Ok(PlaylistPage {
            items,
            next_page_token: response.next_page_token.filter(|t| !t.is_empty()),
        })
    }
}
