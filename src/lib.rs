// src/lib.rs

//! tubewatch: polls channel and video metrics, diffs them against the last
//! snapshot and posts notifications for changes.

pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod storage;
pub mod utils;
