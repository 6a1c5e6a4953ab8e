use anyhow::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Formats,
    Subtitles,
    Merge,
}

impl Tab {
    pub const ALL: [Tab; 3] = [Tab::Formats, Tab::Subtitles, Tab::Merge];

    /// Identifier shared by the tab and its section.
    pub fn id(self) -> &'static str {
        match self {
            Tab::Formats => "formats",
            Tab::Subtitles => "subtitles",
            Tab::Merge => "merge",
        }
    }

    pub fn section_id(self) -> String {
        format!("sec-{}", self.id())
    }

    pub fn label(self) -> &'static str {
        match self {
            Tab::Formats => "Formats",
            Tab::Subtitles => "Subtitles",
            Tab::Merge => "MP4 / MP3",
        }
    }

    pub fn from_id(id: &str) -> Option<Tab> {
        Tab::ALL.into_iter().find(|tab| tab.id() == id)
    }
}

/// Tab strip plus sections. Exactly one pair is active at any time.
#[derive(Debug, Clone)]
pub struct TabBar {
    active: Tab,
}

impl Default for TabBar {
    fn default() -> Self {
        Self {
            active: Tab::Formats,
        }
    }
}

impl TabBar {
    pub fn is_active(&self, tab: Tab) -> bool {
        self.active == tab
    }

    pub fn is_section_active(&self, section_id: &str) -> bool {
        self.active.section_id() == section_id
    }

    pub fn select(&mut self, tab: Tab) {
        self.active = tab;
    }

    pub fn select_id(&mut self, id: &str) -> Result<Tab> {
        let tab = Tab::from_id(id).ok_or_else(|| {
            let known: Vec<&str> = Tab::ALL.iter().map(|t| t.id()).collect();
            anyhow::anyhow!("Unknown tab '{}' (expected one of: {})", id, known.join(", "))
        })?;
        self.select(tab);
        Ok(tab)
    }
}
