mod client;
mod links;
mod types;

pub use client::BackendClient;
pub use links::{format_filename, mp3_filename, mp4_filename, Links};
pub use types::{Format, MediaInfo, Subtitle};

use anyhow::Result;
use async_trait::async_trait;

#[async_trait]
pub trait Backend: Send + Sync {
    /// Human-readable name of the backend
    fn name(&self) -> &'static str;

    /// Fetch metadata and available formats for a media URL
    async fn info(&self, url: &str) -> Result<MediaInfo>;

    /// Fetch caption tracks only
    async fn captions(&self, url: &str) -> Result<Vec<Subtitle>>;
}
