use anyhow::{Context, Result};
use url::Url;

pub const INFO_PATH: &str = "/api/info";
pub const DOWNLOAD_PATH: &str = "/api/download";
pub const GRAB_MP4_PATH: &str = "/api/grab_mp4";
pub const GRAB_MP3_PATH: &str = "/api/grab_mp3";
pub const CAPTIONS_PATH: &str = "/api/captions";
pub const HEALTH_PATH: &str = "/health";

/// Builds backend endpoint URLs. A path prefix on the base is preserved.
#[derive(Debug, Clone)]
pub struct Links {
    base: Url,
}

impl Links {
    pub fn new(base: &str) -> Result<Self> {
        let base = Url::parse(base.trim())
            .with_context(|| format!("Invalid backend base URL: {}", base))?;
        if base.cannot_be_a_base() {
            anyhow::bail!("Backend base URL cannot carry paths: {}", base);
        }
        Ok(Self { base })
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    pub fn endpoint(&self, path: &str) -> Url {
        let mut url = self.base.clone();
        let joined = format!("{}{}", self.base.path().trim_end_matches('/'), path);
        url.set_path(&joined);
        url.set_query(None);
        url.set_fragment(None);
        url
    }

    pub fn info(&self) -> Url {
        self.endpoint(INFO_PATH)
    }

    pub fn health(&self) -> Url {
        self.endpoint(HEALTH_PATH)
    }

    pub fn captions(&self, source_url: &str) -> Url {
        self.with_query(CAPTIONS_PATH, &[("url", source_url)])
    }

    pub fn download(&self, source_url: &str, format_id: &str, filename: &str) -> Url {
        self.with_query(
            DOWNLOAD_PATH,
            &[
                ("url", source_url),
                ("format_id", format_id),
                ("filename", filename),
            ],
        )
    }

    pub fn grab_mp4(&self, source_url: &str, height: u32, filename: &str) -> Url {
        self.with_query(
            GRAB_MP4_PATH,
            &[
                ("url", source_url),
                ("height", &height.to_string()),
                ("filename", filename),
            ],
        )
    }

    pub fn grab_mp3(&self, source_url: &str, filename: &str) -> Url {
        self.with_query(GRAB_MP3_PATH, &[("url", source_url), ("filename", filename)])
    }

    fn with_query(&self, path: &str, pairs: &[(&str, &str)]) -> Url {
        let mut url = self.endpoint(path);
        url.query_pairs_mut().extend_pairs(pairs);
        url
    }
}

fn or_default<'a>(value: Option<&'a str>, fallback: &'a str) -> &'a str {
    value.filter(|v| !v.is_empty()).unwrap_or(fallback)
}

/// Relay filename: `<title or "video">.<ext or "mp4">`.
pub fn format_filename(title: Option<&str>, ext: Option<&str>) -> String {
    format!("{}.{}", or_default(title, "video"), or_default(ext, "mp4"))
}

pub fn mp4_filename(title: Option<&str>) -> String {
    format!("{}.mp4", or_default(title, "video"))
}

pub fn mp3_filename(title: Option<&str>) -> String {
    format!("{}.mp3", or_default(title, "audio"))
}
