use serde::{Deserialize, Deserializer, Serialize};

/// Result of `POST /api/info`. Every field may be missing or `null`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MediaInfo {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub channel: Option<String>,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub formats: Option<Vec<Format>>,
    #[serde(default)]
    pub subtitles: Option<Vec<Subtitle>>,
}

impl MediaInfo {
    pub fn title(&self) -> &str {
        self.title.as_deref().unwrap_or_default()
    }

    pub fn channel(&self) -> &str {
        self.channel.as_deref().unwrap_or_default()
    }

    pub fn thumbnail(&self) -> Option<&str> {
        non_empty(self.thumbnail.as_deref())
    }

    pub fn formats(&self) -> &[Format] {
        self.formats.as_deref().unwrap_or_default()
    }

    pub fn subtitles(&self) -> &[Subtitle] {
        self.subtitles.as_deref().unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Format {
    #[serde(default)]
    pub format_id: Option<String>,
    #[serde(default)]
    pub quality: Option<String>,
    #[serde(default)]
    pub ext: Option<String>,
    #[serde(default, deserialize_with = "lenient_bytes")]
    pub filesize: Option<u64>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub fps: Option<f64>,
    #[serde(default)]
    pub abr: Option<f64>,
    #[serde(default)]
    pub vbr: Option<f64>,
}

impl Format {
    pub fn quality(&self) -> &str {
        self.quality.as_deref().unwrap_or_default()
    }

    pub fn ext(&self) -> &str {
        self.ext.as_deref().unwrap_or_default()
    }

    pub fn format_id(&self) -> &str {
        self.format_id.as_deref().unwrap_or_default()
    }

    pub fn direct_url(&self) -> Option<&str> {
        non_empty(self.url.as_deref())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Subtitle {
    #[serde(default)]
    pub lang: Option<String>,
    #[serde(default)]
    pub ext: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

impl Subtitle {
    pub fn lang(&self) -> &str {
        self.lang.as_deref().unwrap_or_default()
    }

    pub fn ext(&self) -> &str {
        self.ext.as_deref().unwrap_or_default()
    }

    pub fn direct_url(&self) -> Option<&str> {
        non_empty(self.url.as_deref())
    }
}

/// Result of `GET /api/captions`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Captions {
    #[serde(default)]
    pub subtitles: Option<Vec<Subtitle>>,
}

/// Result of `GET /health`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Health {
    #[serde(default)]
    pub ok: bool,
    #[serde(default)]
    pub app: String,
    #[serde(default)]
    pub version: String,
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|s| !s.is_empty())
}

// The backend falls back to an approximate size, which is not always an integer.
fn lenient_bytes<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| match v {
        serde_json::Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f.round() as u64)),
        _ => None,
    }))
}
