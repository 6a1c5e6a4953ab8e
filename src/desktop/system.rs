use super::Desktop;
use crate::config::DesktopConfig;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, info, warn};

/// Desktop integration through the platform's clipboard and URL-opener tools.
pub struct SystemDesktop {
    clipboard_commands: Vec<Vec<String>>,
    open_commands: Vec<Vec<String>>,
}

impl SystemDesktop {
    pub fn new(config: &DesktopConfig) -> Self {
        let clipboard_commands = match &config.clipboard_command {
            Some(argv) if !argv.is_empty() => vec![argv.clone()],
            _ => default_clipboard_commands(),
        };
        let open_commands = match &config.open_command {
            Some(argv) if !argv.is_empty() => vec![argv.clone()],
            _ => default_open_commands(),
        };

        Self {
            clipboard_commands,
            open_commands,
        }
    }

    /// True when at least one clipboard tool and one opener are on PATH.
    pub async fn test_availability(&self) -> bool {
        let clipboard = Self::any_available(&self.clipboard_commands).await;
        let opener = Self::any_available(&self.open_commands).await;

        if !clipboard {
            warn!("❌ No clipboard tool found, copy actions will be ignored");
        }
        if !opener {
            warn!("❌ No URL opener found, download actions will be ignored");
        }
        clipboard && opener
    }

    async fn any_available(commands: &[Vec<String>]) -> bool {
        for argv in commands {
            let program = &argv[0];
            match Command::new("which").arg(program).output().await {
                Ok(output) if output.status.success() => {
                    info!("✅ {} is available", program);
                    return true;
                }
                _ => debug!("{} not found on PATH", program),
            }
        }
        false
    }

    async fn pipe_to(argv: &[String], text: &str) -> Result<()> {
        let (program, args) = argv.split_first().context("Empty clipboard command")?;

        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .with_context(|| format!("Failed to spawn {}", program))?;

        let mut stdin = child.stdin.take().context("Failed to get clipboard stdin")?;
        stdin
            .write_all(text.as_bytes())
            .await
            .context("Failed to write to clipboard")?;
        drop(stdin);

        let status = child.wait().await.context("Failed to wait for clipboard")?;
        if !status.success() {
            anyhow::bail!("{} exited with {}", program, status);
        }
        Ok(())
    }

    async fn run_with_arg(argv: &[String], arg: &str) -> Result<()> {
        let (program, args) = argv.split_first().context("Empty open command")?;

        let status = Command::new(program)
            .args(args)
            .arg(arg)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .with_context(|| format!("Failed to spawn {}", program))?;

        if !status.success() {
            anyhow::bail!("{} exited with {}", program, status);
        }
        Ok(())
    }
}

#[async_trait]
impl Desktop for SystemDesktop {
    async fn copy_text(&self, text: &str) -> Result<()> {
        let mut errors = Vec::new();

        for argv in &self.clipboard_commands {
            match Self::pipe_to(argv, text).await {
                Ok(()) => {
                    debug!("Copied {} bytes with {}", text.len(), argv[0]);
                    return Ok(());
                }
                Err(e) => errors.push(format!("{e}")),
            }
        }

        Err(anyhow::anyhow!("Clipboard unavailable: {}", errors.join(". ")))
    }

    async fn open_url(&self, url: &str) -> Result<()> {
        let mut errors = Vec::new();

        for argv in &self.open_commands {
            match Self::run_with_arg(argv, url).await {
                Ok(()) => {
                    info!("Opened {} with {}", url, argv[0]);
                    return Ok(());
                }
                Err(e) => {
                    warn!("{} failed: {}", argv[0], e);
                    errors.push(format!("{e}"));
                }
            }
        }

        Err(anyhow::anyhow!(
            "Could not open {}: {}",
            url,
            errors.join(". ")
        ))
    }

    async fn alert(&self, message: &str) {
        eprintln!("⚠️  {}", message);
    }
}

fn argv(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|s| s.to_string()).collect()
}

fn default_clipboard_commands() -> Vec<Vec<String>> {
    if cfg!(target_os = "macos") {
        vec![argv(&["pbcopy"])]
    } else if cfg!(target_os = "windows") {
        vec![argv(&["clip"])]
    } else {
        vec![
            argv(&["wl-copy"]),
            argv(&["xclip", "-selection", "clipboard"]),
            argv(&["xsel", "--clipboard", "--input"]),
        ]
    }
}

fn default_open_commands() -> Vec<Vec<String>> {
    open_commands_for(std::env::consts::OS)
}

// cmd.exe splits on `&`, which every query string carries, so Windows goes through rundll32.
fn open_commands_for(os: &str) -> Vec<Vec<String>> {
    match os {
        "macos" => vec![argv(&["open"])],
        "windows" => vec![argv(&["rundll32", "url.dll,FileProtocolHandler"])],
        _ => vec![argv(&["xdg-open"])],
    }
}
