// src/models/mod.rs

//! Domain models for the watcher.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod config;
mod event;
mod messages;
mod snapshot;

// Re-export all public types
pub use config::{
    ApiConfig, Config, NotifyConfig, PathsConfig, ScheduleConfig, SocialConfig, ThresholdConfig,
    TrackedSpec,
};
pub use event::NotificationEvent;
pub use messages::{MessageTemplates, SinkRole, truncate_graphemes};
pub use snapshot::{ChannelRecord, Snapshot, VideoRecord};
