use super::tabs::TabBar;
use crate::backend::{format_filename, Format, Links, MediaInfo, Subtitle};
use crate::config::QUALITY_HEIGHTS;
use crate::utils::{format_duration, format_size};

/// Only the first formats returned by the backend are shown.
pub const MAX_FORMAT_ROWS: usize = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchState {
    Idle,
    Loading,
    Loaded,
    Error,
}

/// A list area holds either rows or a single placeholder line.
#[derive(Debug, Clone, PartialEq)]
pub enum ListArea<T> {
    Rows(Vec<T>),
    Message(String),
}

impl<T> Default for ListArea<T> {
    fn default() -> Self {
        ListArea::Rows(Vec::new())
    }
}

impl<T> ListArea<T> {
    pub fn rows(&self) -> &[T] {
        match self {
            ListArea::Rows(rows) => rows.as_slice(),
            ListArea::Message(_) => &[],
        }
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            ListArea::Message(text) => Some(text.as_str()),
            ListArea::Rows(_) => None,
        }
    }

    pub fn row(&self, index: usize) -> Option<&T> {
        self.rows().get(index)
    }
}

#[cfg(test)]
impl<T> ListArea<T> {
    pub fn is_empty(&self) -> bool {
        matches!(self, ListArea::Rows(rows) if rows.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FormatRow {
    pub quality: String,
    pub ext: String,
    pub size: String,
    /// Resolution, frame rate and bitrate, whichever the backend reported.
    pub detail: String,
    pub direct_url: Option<String>,
    pub server_url: String,
}

impl FormatRow {
    pub fn build(format: &Format, source_url: &str, title: Option<&str>, links: &Links) -> Self {
        let filename = format_filename(title, format.ext.as_deref());
        let server_url = links.download(source_url, format.format_id(), &filename);

        Self {
            quality: format.quality().to_string(),
            ext: format.ext().to_string(),
            size: format.filesize.map(format_size).unwrap_or_default(),
            detail: format_detail(format),
            direct_url: format.direct_url().map(|s| s.to_string()),
            server_url: server_url.to_string(),
        }
    }
}

fn format_detail(format: &Format) -> String {
    let mut parts = Vec::new();
    match (format.width, format.height) {
        (Some(w), Some(h)) => parts.push(format!("{}x{}", w, h)),
        (None, Some(h)) => parts.push(format!("{}p", h)),
        _ => {}
    }
    if let Some(fps) = format.fps.filter(|f| *f > 0.0) {
        parts.push(format!("{}fps", fps.round()));
    }
    if let Some(kbps) = format.vbr.or(format.abr).filter(|b| *b > 0.0) {
        parts.push(format!("{}k", kbps.round()));
    }
    parts.join(" ")
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubtitleRow {
    pub lang: String,
    pub ext: String,
    pub url: Option<String>,
}

impl SubtitleRow {
    pub fn build(subtitle: &Subtitle) -> Self {
        Self {
            lang: subtitle.lang().to_string(),
            ext: subtitle.ext().to_string(),
            url: subtitle.direct_url().map(|s| s.to_string()),
        }
    }
}

pub fn render_formats(
    formats: &[Format],
    source_url: &str,
    title: Option<&str>,
    links: &Links,
) -> Vec<FormatRow> {
    formats
        .iter()
        .take(MAX_FORMAT_ROWS)
        .map(|f| FormatRow::build(f, source_url, title, links))
        .collect()
}

pub fn render_subtitles(subtitles: &[Subtitle]) -> Vec<SubtitleRow> {
    subtitles.iter().map(SubtitleRow::build).collect()
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Thumbnail {
    pub src: Option<String>,
    pub visible: bool,
}

/// Everything the user sees. Lives from startup to exit.
#[derive(Debug, Clone)]
pub struct Page {
    pub url_input: String,
    pub status: String,
    pub title: String,
    pub meta: String,
    pub note: String,
    pub thumbnail: Thumbnail,
    pub formats: ListArea<FormatRow>,
    pub subtitles: ListArea<SubtitleRow>,
    pub tabs: TabBar,
    pub height: u32,
    pub state: FetchState,
}

impl Page {
    pub fn new(default_height: u32) -> Self {
        Self {
            url_input: String::new(),
            status: String::new(),
            title: String::new(),
            meta: String::new(),
            note: String::new(),
            thumbnail: Thumbnail::default(),
            formats: ListArea::default(),
            subtitles: ListArea::default(),
            tabs: TabBar::default(),
            height: default_height,
            state: FetchState::Idle,
        }
    }

    fn reset_details(&mut self) {
        self.thumbnail.visible = false;
        self.title.clear();
        self.meta.clear();
        self.note.clear();
    }

    pub fn show_loading(&mut self) {
        self.formats = ListArea::Message("Loading...".to_string());
        self.subtitles = ListArea::default();
        self.reset_details();
        self.state = FetchState::Loading;
    }

    pub fn show_error(&mut self) {
        self.formats = ListArea::Message("Error fetching info".to_string());
        self.status.clear();
        self.state = FetchState::Error;
    }

    pub fn show_info(&mut self, source_url: &str, info: &MediaInfo, links: &Links) {
        self.title = info.title().to_string();
        self.meta = match info.duration {
            Some(seconds) if !info.channel().is_empty() => {
                format!("{} · {}", info.channel(), format_duration(seconds))
            }
            Some(seconds) => format_duration(seconds),
            None => info.channel().to_string(),
        };
        self.note = info.note.clone().unwrap_or_default();
        if let Some(src) = info.thumbnail() {
            self.thumbnail = Thumbnail {
                src: Some(src.to_string()),
                visible: true,
            };
        }
        self.status.clear();

        self.formats = ListArea::Rows(render_formats(
            info.formats(),
            source_url,
            info.title.as_deref(),
            links,
        ));
        self.subtitles = ListArea::Rows(render_subtitles(info.subtitles()));
        self.state = FetchState::Loaded;
    }

    pub fn clear(&mut self) {
        self.url_input.clear();
        self.formats = ListArea::default();
        self.subtitles = ListArea::default();
        self.reset_details();
        self.state = FetchState::Idle;
    }

    pub fn select_height(&mut self, height: u32) -> anyhow::Result<()> {
        if !QUALITY_HEIGHTS.contains(&height) {
            anyhow::bail!(
                "Unsupported height {} (choose one of {:?})",
                height,
                QUALITY_HEIGHTS
            );
        }
        self.height = height;
        Ok(())
    }
}
