mod system;

pub use system::SystemDesktop;

use anyhow::Result;
use async_trait::async_trait;

/// Side effects the page hands off to the host environment.
#[async_trait]
pub trait Desktop: Send + Sync {
    /// Write text to the system clipboard
    async fn copy_text(&self, text: &str) -> Result<()>;

    /// Open a URL in a new browser tab or window
    async fn open_url(&self, url: &str) -> Result<()>;

    /// Show a blocking message to the user
    async fn alert(&self, message: &str);
}
