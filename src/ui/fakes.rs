//! In-memory `Backend` and `Desktop` for controller and shell tests.

use crate::backend::{Backend, Format, MediaInfo, Subtitle};
use crate::desktop::Desktop;
use anyhow::Result;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Answers every lookup with three formats and one subtitle. URLs containing
/// "slow" take 100ms, everything else 10ms.
#[derive(Default)]
pub(crate) struct FakeBackend {
    pub calls: AtomicUsize,
    pub urls: Mutex<Vec<String>>,
    pub fail: bool,
}

fn media_for(url: &str) -> MediaInfo {
    MediaInfo {
        title: Some(format!("Title of {url}")),
        channel: Some("Someone".to_string()),
        thumbnail: Some("https://i.example.com/t.jpg".to_string()),
        formats: Some(
            (0..3)
                .map(|i| Format {
                    format_id: Some(i.to_string()),
                    quality: Some(format!("{}p", 360 * (i + 1))),
                    ext: Some("webm".to_string()),
                    url: Some(format!("https://cdn.example.com/{i}")),
                    ..Default::default()
                })
                .collect(),
        ),
        subtitles: Some(vec![Subtitle {
            lang: Some("en".to_string()),
            ext: Some("vtt".to_string()),
            url: Some("https://cdn.example.com/en.vtt".to_string()),
        }]),
        ..Default::default()
    }
}

impl FakeBackend {
    fn record(&self, url: &str) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.urls.lock().push(url.to_string());
    }
}

#[async_trait]
impl Backend for FakeBackend {
    fn name(&self) -> &'static str {
        "fake"
    }

    async fn info(&self, url: &str) -> Result<MediaInfo> {
        self.record(url);
        let delay = if url.contains("slow") { 100 } else { 10 };
        tokio::time::sleep(Duration::from_millis(delay)).await;
        if self.fail {
            anyhow::bail!("Backend returned HTTP 400 Bad Request");
        }
        Ok(media_for(url))
    }

    async fn captions(&self, url: &str) -> Result<Vec<Subtitle>> {
        self.record(url);
        if self.fail {
            anyhow::bail!("Backend returned HTTP 400 Bad Request");
        }
        Ok(vec![Subtitle {
            lang: Some("de".to_string()),
            ext: Some("srt".to_string()),
            url: Some(format!("{url}/de.srt")),
        }])
    }
}

#[derive(Default)]
pub(crate) struct FakeDesktop {
    pub copies: Mutex<Vec<String>>,
    pub opened: Mutex<Vec<String>>,
    pub alerts: Mutex<Vec<String>>,
    pub clipboard_broken: bool,
}

#[async_trait]
impl Desktop for FakeDesktop {
    async fn copy_text(&self, text: &str) -> Result<()> {
        if self.clipboard_broken {
            anyhow::bail!("no clipboard");
        }
        self.copies.lock().push(text.to_string());
        Ok(())
    }

    async fn open_url(&self, url: &str) -> Result<()> {
        self.opened.lock().push(url.to_string());
        Ok(())
    }

    async fn alert(&self, message: &str) {
        self.alerts.lock().push(message.to_string());
    }
}
