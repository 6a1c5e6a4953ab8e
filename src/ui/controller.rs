use super::page::{ListArea, Page, SubtitleRow};
use super::tabs::Tab;
use crate::backend::{mp3_filename, mp4_filename, Backend, Links};
use crate::desktop::Desktop;
use anyhow::{Context, Result};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

pub const COPIED_STATUS_TTL: Duration = Duration::from_millis(1500);
pub const CLEARED_STATUS_TTL: Duration = Duration::from_millis(800);

/// Source of the last successful lookup; the MP4/MP3 actions work from it.
#[derive(Debug, Clone)]
struct MergeTarget {
    source_url: String,
    title: Option<String>,
}

/// A lookup whose loading state is already on the page.
#[derive(Debug)]
pub struct PendingFetch {
    url: String,
    generation: u64,
}

pub struct Controller {
    backend: Arc<dyn Backend>,
    desktop: Arc<dyn Desktop>,
    links: Links,
    page: Arc<Mutex<Page>>,
    status_generation: Arc<AtomicU64>,
    info_generation: AtomicU64,
    captions_generation: AtomicU64,
    merge_target: Mutex<Option<MergeTarget>>,
}

impl Controller {
    pub fn new(
        backend: Arc<dyn Backend>,
        desktop: Arc<dyn Desktop>,
        links: Links,
        default_height: u32,
    ) -> Self {
        info!("Page controller initialized with {} backend", backend.name());

        Self {
            backend,
            desktop,
            links,
            page: Arc::new(Mutex::new(Page::new(default_height))),
            status_generation: Arc::new(AtomicU64::new(0)),
            info_generation: AtomicU64::new(0),
            captions_generation: AtomicU64::new(0),
            merge_target: Mutex::new(None),
        }
    }

    pub fn snapshot(&self) -> Page {
        self.page.lock().clone()
    }

    pub fn set_url_input(&self, text: &str) {
        self.page.lock().url_input = text.to_string();
    }

    pub fn url_input(&self) -> String {
        self.page.lock().url_input.clone()
    }

    pub fn select_tab(&self, id: &str) -> Result<Tab> {
        self.page.lock().tabs.select_id(id)
    }

    pub fn select_height(&self, height: u32) -> Result<()> {
        self.page.lock().select_height(height)
    }

    /// Replaces the status line. Pending timed clears no longer apply.
    pub fn set_status(&self, text: &str) {
        let mut page = self.page.lock();
        page.status = text.to_string();
        self.status_generation.fetch_add(1, Ordering::SeqCst);
    }

    /// Shows a status line that clears itself after `ttl` unless replaced first.
    pub fn flash_status(&self, text: &str, ttl: Duration) {
        let generation = {
            let mut page = self.page.lock();
            page.status = text.to_string();
            self.status_generation.fetch_add(1, Ordering::SeqCst) + 1
        };

        let page = Arc::clone(&self.page);
        let status_generation = Arc::clone(&self.status_generation);
        tokio::spawn(async move {
            tokio::time::sleep(ttl).await;
            let mut page = page.lock();
            if status_generation.load(Ordering::SeqCst) == generation {
                page.status.clear();
            }
        });
    }

    /// Validates the input and puts the page into its loading state. The
    /// request itself runs in `finish_fetch`.
    pub async fn begin_fetch(&self, raw_url: &str) -> Option<PendingFetch> {
        let url = raw_url.trim().to_string();
        if url.is_empty() {
            self.desktop.alert("Paste a valid URL").await;
            return None;
        }

        let generation = self.info_generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.captions_generation.fetch_add(1, Ordering::SeqCst);

        self.set_status("Fetching info...");
        self.page.lock().show_loading();
        Some(PendingFetch { url, generation })
    }

    pub async fn finish_fetch(&self, pending: PendingFetch) {
        let PendingFetch { url, generation } = pending;
        let result = self.backend.info(&url).await;

        if self.info_generation.load(Ordering::SeqCst) != generation {
            debug!("Discarding superseded info response for {}", url);
            return;
        }

        match result {
            Ok(media) => {
                info!("Loaded info for {}: {}", url, media.title());
                self.status_generation.fetch_add(1, Ordering::SeqCst);
                self.page.lock().show_info(&url, &media, &self.links);
                *self.merge_target.lock() = Some(MergeTarget {
                    source_url: url,
                    title: media.title.clone(),
                });
            }
            Err(e) => {
                warn!("Failed to fetch info for {}: {:#}", url, e);
                self.status_generation.fetch_add(1, Ordering::SeqCst);
                self.page.lock().show_error();
            }
        }
    }

    pub async fn fetch_info(&self, raw_url: &str) {
        if let Some(pending) = self.begin_fetch(raw_url).await {
            self.finish_fetch(pending).await;
        }
    }

    pub async fn begin_captions(&self, raw_url: &str) -> Option<PendingFetch> {
        let url = raw_url.trim().to_string();
        if url.is_empty() {
            self.desktop.alert("Paste a valid URL").await;
            return None;
        }

        let generation = self.captions_generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.set_status("Fetching captions...");
        self.page.lock().subtitles = ListArea::Message("Loading...".to_string());
        Some(PendingFetch { url, generation })
    }

    pub async fn finish_captions(&self, pending: PendingFetch) {
        let PendingFetch { url, generation } = pending;
        let result = self.backend.captions(&url).await;

        if self.captions_generation.load(Ordering::SeqCst) != generation {
            debug!("Discarding superseded captions response for {}", url);
            return;
        }

        self.status_generation.fetch_add(1, Ordering::SeqCst);
        let mut page = self.page.lock();
        page.status.clear();
        match result {
            Ok(subtitles) => {
                info!("Loaded {} caption tracks for {}", subtitles.len(), url);
                page.subtitles =
                    ListArea::Rows(subtitles.iter().map(SubtitleRow::build).collect());
            }
            Err(e) => {
                warn!("Failed to fetch captions for {}: {:#}", url, e);
                page.subtitles = ListArea::Message("Error fetching captions".to_string());
            }
        }
    }

    /// Returns the opened link, or `None` before any successful lookup.
    pub async fn grab_mp4(&self, height: u32) -> Option<String> {
        let target = self.merge_target.lock().clone();
        let Some(target) = target else {
            debug!("MP4 requested before any lookup");
            return None;
        };

        let filename = mp4_filename(target.title.as_deref());
        let link = self
            .links
            .grab_mp4(&target.source_url, height, &filename)
            .to_string();
        self.open(&link).await;
        Some(link)
    }

    pub async fn grab_mp3(&self) -> Option<String> {
        let target = self.merge_target.lock().clone();
        let Some(target) = target else {
            debug!("MP3 requested before any lookup");
            return None;
        };

        let filename = mp3_filename(target.title.as_deref());
        let link = self.links.grab_mp3(&target.source_url, &filename).to_string();
        self.open(&link).await;
        Some(link)
    }

    pub async fn open_direct(&self, index: usize) -> Result<()> {
        let url = {
            let page = self.page.lock();
            let row = page.formats.row(index).context("No such format row")?;
            row.direct_url.clone().context("Format has no direct link")?
        };
        self.open(&url).await;
        Ok(())
    }

    pub async fn open_server(&self, index: usize) -> Result<()> {
        let url = {
            let page = self.page.lock();
            let row = page.formats.row(index).context("No such format row")?;
            row.server_url.clone()
        };
        self.open(&url).await;
        Ok(())
    }

    pub async fn open_subtitle(&self, index: usize) -> Result<()> {
        let url = {
            let page = self.page.lock();
            let row = page.subtitles.row(index).context("No such subtitle row")?;
            row.url.clone().context("Subtitle has no link")?
        };
        self.open(&url).await;
        Ok(())
    }

    pub fn copy_format(&self, index: usize) -> Result<()> {
        let url = {
            let page = self.page.lock();
            let row = page.formats.row(index).context("No such format row")?;
            row.direct_url.clone().context("Format has no direct link")?
        };
        self.copy_to_clipboard(&url);
        Ok(())
    }

    pub fn copy_subtitle(&self, index: usize) -> Result<()> {
        let url = {
            let page = self.page.lock();
            let row = page.subtitles.row(index).context("No such subtitle row")?;
            row.url.clone().context("Subtitle has no link")?
        };
        self.copy_to_clipboard(&url);
        Ok(())
    }

    /// Fire-and-forget; the status claims success even when the clipboard is unavailable.
    pub fn copy_to_clipboard(&self, text: &str) {
        let desktop = Arc::clone(&self.desktop);
        let text = text.to_string();
        tokio::spawn(async move {
            if let Err(e) = desktop.copy_text(&text).await {
                debug!("Clipboard write ignored: {:#}", e);
            }
        });

        self.flash_status("Copied to clipboard", COPIED_STATUS_TTL);
    }

    pub fn clear(&self) {
        self.page.lock().clear();
        self.flash_status("Cleared", CLEARED_STATUS_TTL);
    }

    async fn open(&self, url: &str) {
        if let Err(e) = self.desktop.open_url(url).await {
            warn!("Failed to open {}: {:#}", url, e);
        }
    }
}

#[cfg(test)]
impl Controller {
    pub async fn fetch_captions(&self, raw_url: &str) {
        if let Some(pending) = self.begin_captions(raw_url).await {
            self.finish_captions(pending).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::fakes::{FakeBackend, FakeDesktop};
    use crate::ui::page::FetchState;
    use std::collections::HashMap;
    use url::Url;

    fn controller_with(
        backend: FakeBackend,
        desktop: FakeDesktop,
    ) -> (Controller, Arc<FakeBackend>, Arc<FakeDesktop>) {
        let backend = Arc::new(backend);
        let desktop = Arc::new(desktop);
        let controller = Controller::new(
            backend.clone(),
            desktop.clone(),
            Links::new("http://localhost:8000").unwrap(),
            1080,
        );
        (controller, backend, desktop)
    }

    fn controller() -> (Controller, Arc<FakeBackend>, Arc<FakeDesktop>) {
        controller_with(FakeBackend::default(), FakeDesktop::default())
    }

    fn query(link: &str) -> HashMap<String, String> {
        Url::parse(link).unwrap().query_pairs().into_owned().collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_url_alerts_without_request() {
        let (controller, backend, desktop) = controller();

        controller.fetch_info("").await;
        controller.fetch_info("   \t ").await;

        assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
        assert_eq!(desktop.alerts.lock().len(), 2);
        assert_eq!(desktop.alerts.lock()[0], "Paste a valid URL");
        assert_eq!(controller.snapshot().state, FetchState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_success_renders_page() {
        let (controller, backend, _desktop) = controller();

        controller.fetch_info("  https://youtu.be/abc  ").await;

        assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
        let page = controller.snapshot();
        assert_eq!(page.state, FetchState::Loaded);
        assert_eq!(page.title, "Title of https://youtu.be/abc");
        assert_eq!(page.meta, "Someone");
        assert!(page.thumbnail.visible);
        assert_eq!(page.status, "");
        assert_eq!(page.formats.rows().len(), 3);
        assert_eq!(page.subtitles.rows().len(), 1);

        let params = query(&page.formats.rows()[0].server_url);
        assert_eq!(params["url"], "https://youtu.be/abc");
        assert_eq!(params["filename"], "Title of https://youtu.be/abc.webm");
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_shows_loading_state() {
        let (controller, _backend, _desktop) = controller();
        let controller = Arc::new(controller);

        let task = {
            let controller = Arc::clone(&controller);
            tokio::spawn(async move { controller.fetch_info("https://slow.example/v").await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;

        let page = controller.snapshot();
        assert_eq!(page.state, FetchState::Loading);
        assert_eq!(page.status, "Fetching info...");
        assert_eq!(page.formats.message(), Some("Loading..."));
        assert!(!page.thumbnail.visible);

        task.await.unwrap();
        assert_eq!(controller.snapshot().state, FetchState::Loaded);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_failure_shows_error() {
        let (controller, _backend, _desktop) = controller_with(
            FakeBackend {
                fail: true,
                ..Default::default()
            },
            FakeDesktop::default(),
        );

        controller.fetch_info("https://youtu.be/abc").await;

        let page = controller.snapshot();
        assert_eq!(page.state, FetchState::Error);
        assert_eq!(page.formats.message(), Some("Error fetching info"));
        assert_eq!(page.status, "");
        assert!(controller.grab_mp3().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_latest_fetch_wins() {
        let (controller, backend, _desktop) = controller();

        tokio::join!(
            controller.fetch_info("https://slow.example/first"),
            controller.fetch_info("https://fast.example/second"),
        );

        assert_eq!(backend.calls.load(Ordering::SeqCst), 2);
        let page = controller.snapshot();
        assert_eq!(page.title, "Title of https://fast.example/second");
        assert_eq!(page.state, FetchState::Loaded);

        let link = controller.grab_mp3().await.unwrap();
        assert_eq!(query(&link)["url"], "https://fast.example/second");
    }

    #[tokio::test(start_paused = true)]
    async fn test_grab_links_after_lookup() {
        let (controller, _backend, desktop) = controller();
        assert!(controller.grab_mp4(720).await.is_none());
        assert!(desktop.opened.lock().is_empty());

        controller.fetch_info("https://youtu.be/abc").await;

        let mp4 = controller.grab_mp4(720).await.unwrap();
        let params = query(&mp4);
        assert!(mp4.starts_with("http://localhost:8000/api/grab_mp4?"));
        assert_eq!(params["height"], "720");
        assert_eq!(params["filename"], "Title of https://youtu.be/abc.mp4");

        let mp3 = controller.grab_mp3().await.unwrap();
        assert_eq!(query(&mp3)["filename"], "Title of https://youtu.be/abc.mp3");

        assert_eq!(*desktop.opened.lock(), vec![mp4, mp3]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_row_actions() {
        let (controller, _backend, desktop) = controller();
        controller.fetch_info("https://youtu.be/abc").await;

        controller.open_direct(1).await.unwrap();
        controller.open_server(1).await.unwrap();
        controller.open_subtitle(0).await.unwrap();
        assert!(controller.open_direct(3).await.is_err());
        assert!(controller.open_subtitle(1).await.is_err());

        let opened = desktop.opened.lock().clone();
        assert_eq!(opened[0], "https://cdn.example.com/1");
        assert!(opened[1].starts_with("http://localhost:8000/api/download?"));
        assert_eq!(opened[2], "https://cdn.example.com/en.vtt");
    }

    #[tokio::test(start_paused = true)]
    async fn test_copy_status_expires() {
        let (controller, _backend, desktop) = controller();
        controller.fetch_info("https://youtu.be/abc").await;

        controller.copy_format(2).unwrap();
        assert_eq!(controller.snapshot().status, "Copied to clipboard");

        tokio::time::sleep(Duration::from_millis(1499)).await;
        assert_eq!(controller.snapshot().status, "Copied to clipboard");
        assert_eq!(*desktop.copies.lock(), vec!["https://cdn.example.com/2".to_string()]);

        tokio::time::sleep(Duration::from_millis(2)).await;
        assert_eq!(controller.snapshot().status, "");
    }

    #[tokio::test(start_paused = true)]
    async fn test_copy_without_clipboard_still_reports() {
        let (controller, _backend, desktop) = controller_with(
            FakeBackend::default(),
            FakeDesktop {
                clipboard_broken: true,
                ..Default::default()
            },
        );

        controller.copy_to_clipboard("https://cdn.example.com/x");
        assert_eq!(controller.snapshot().status, "Copied to clipboard");

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(desktop.copies.lock().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_timer_does_not_wipe_newer_status() {
        let (controller, _backend, _desktop) = controller();

        controller.clear();
        assert_eq!(controller.snapshot().status, "Cleared");

        tokio::time::sleep(Duration::from_millis(500)).await;
        controller.copy_to_clipboard("x");

        tokio::time::sleep(Duration::from_millis(400)).await;
        assert_eq!(controller.snapshot().status, "Copied to clipboard");

        tokio::time::sleep(Duration::from_millis(1200)).await;
        assert_eq!(controller.snapshot().status, "");
    }

    #[tokio::test(start_paused = true)]
    async fn test_clear_resets_page() {
        let (controller, _backend, _desktop) = controller();
        controller.set_url_input("https://youtu.be/abc");
        controller.fetch_info(&controller.url_input()).await;

        controller.clear();

        let page = controller.snapshot();
        assert!(page.formats.is_empty());
        assert!(page.subtitles.is_empty());
        assert!(!page.thumbnail.visible);
        assert_eq!(page.title, "");
        assert_eq!(page.meta, "");
        assert_eq!(page.url_input, "");
        assert_eq!(page.status, "Cleared");

        tokio::time::sleep(Duration::from_millis(801)).await;
        assert_eq!(controller.snapshot().status, "");
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_captions() {
        let (controller, _backend, _desktop) = controller();
        controller.fetch_info("https://youtu.be/abc").await;

        controller.fetch_captions("https://youtu.be/abc").await;

        let page = controller.snapshot();
        assert_eq!(page.formats.rows().len(), 3);
        assert_eq!(page.subtitles.rows().len(), 1);
        assert_eq!(page.subtitles.rows()[0].lang, "de");
        assert_eq!(page.status, "");
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_captions_failure() {
        let (controller, _backend, desktop) = controller_with(
            FakeBackend {
                fail: true,
                ..Default::default()
            },
            FakeDesktop::default(),
        );

        controller.fetch_captions(" ").await;
        assert_eq!(desktop.alerts.lock().len(), 1);

        controller.fetch_captions("https://youtu.be/abc").await;
        assert_eq!(
            controller.snapshot().subtitles.message(),
            Some("Error fetching captions")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_begin_fetch_loads_before_request() {
        let (controller, backend, _desktop) = controller();

        let pending = controller.begin_fetch(" https://youtu.be/abc ").await.unwrap();
        let page = controller.snapshot();
        assert_eq!(page.state, FetchState::Loading);
        assert_eq!(page.status, "Fetching info...");
        assert_eq!(backend.calls.load(Ordering::SeqCst), 0);

        controller.finish_fetch(pending).await;
        assert_eq!(*backend.urls.lock(), vec!["https://youtu.be/abc".to_string()]);
        assert_eq!(controller.snapshot().state, FetchState::Loaded);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_pending_fetch_is_dropped() {
        let (controller, _backend, _desktop) = controller();

        let first = controller.begin_fetch("https://youtu.be/first").await.unwrap();
        let second = controller.begin_fetch("https://youtu.be/second").await.unwrap();
        controller.finish_fetch(second).await;
        controller.finish_fetch(first).await;

        assert_eq!(controller.snapshot().title, "Title of https://youtu.be/second");
    }

    #[test]
    fn test_select_tab_and_height() {
        let (controller, _backend, _desktop) = controller();
        assert_eq!(controller.select_tab("merge").unwrap(), Tab::Merge);
        assert!(controller.select_tab("nope").is_err());
        assert!(controller.snapshot().tabs.is_active(Tab::Merge));

        controller.select_height(480).unwrap();
        assert_eq!(controller.snapshot().height, 480);
    }
}
