use super::controller::Controller;
use super::render::render;
use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, error, info};

const HELP: &str = "\
Commands:
  fetch [URL]        look up URL (or the current input)
  url TEXT           set the URL input without fetching
  captions [URL]     reload caption tracks only
  tab NAME           switch to formats | subtitles | merge
  direct N           open format N's direct link
  server N           download format N through the server
  copy N             copy format N's direct link
  sub N              download subtitle N
  subcopy N          copy subtitle N's link
  height H           select the MP4 quality
  mp4 [H]            server-side merge to MP4
  mp3                server-side extraction to MP3
  clear              reset the page
  show               redraw the page
  help               this text
  quit               exit";

#[derive(Debug, Clone, PartialEq)]
pub enum ShellCommand {
    Fetch(Option<String>),
    SetUrl(String),
    Captions(Option<String>),
    Tab(String),
    Direct(usize),
    Server(usize),
    Copy(usize),
    Subtitle(usize),
    SubtitleCopy(usize),
    Height(u32),
    Mp4(Option<u32>),
    Mp3,
    Clear,
    Show,
    Help,
    Quit,
}

impl ShellCommand {
    pub fn parse(line: &str) -> Result<Option<ShellCommand>> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }

        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };
        let arg = (!rest.is_empty()).then(|| rest.to_string());

        let command = match word.to_ascii_lowercase().as_str() {
            "fetch" | "go" => ShellCommand::Fetch(arg),
            "url" => ShellCommand::SetUrl(rest.to_string()),
            "captions" => ShellCommand::Captions(arg),
            "tab" => ShellCommand::Tab(required(arg, "tab name")?),
            "direct" => ShellCommand::Direct(row_number(rest)?),
            "server" => ShellCommand::Server(row_number(rest)?),
            "copy" => ShellCommand::Copy(row_number(rest)?),
            "sub" => ShellCommand::Subtitle(row_number(rest)?),
            "subcopy" => ShellCommand::SubtitleCopy(row_number(rest)?),
            "height" => ShellCommand::Height(height(rest)?),
            "mp4" => ShellCommand::Mp4(if rest.is_empty() {
                None
            } else {
                Some(height(rest)?)
            }),
            "mp3" => ShellCommand::Mp3,
            "clear" => ShellCommand::Clear,
            "show" => ShellCommand::Show,
            "help" | "?" => ShellCommand::Help,
            "quit" | "exit" => ShellCommand::Quit,
            // A bare URL is the same as pasting it and pressing Go.
            _ if word.starts_with("http://") || word.starts_with("https://") => {
                ShellCommand::Fetch(Some(line.to_string()))
            }
            other => anyhow::bail!("Unknown command '{}', type 'help'", other),
        };

        Ok(Some(command))
    }
}

fn required(arg: Option<String>, what: &str) -> Result<String> {
    arg.with_context(|| format!("Missing {}", what))
}

/// Rows are shown 1-based; the controller indexes from zero.
fn row_number(raw: &str) -> Result<usize> {
    let n: usize = raw
        .parse()
        .with_context(|| format!("Expected a row number, got '{}'", raw))?;
    n.checked_sub(1).context("Row numbers start at 1")
}

fn height(raw: &str) -> Result<u32> {
    raw.trim_end_matches('p')
        .parse()
        .with_context(|| format!("Expected a height like 720, got '{}'", raw))
}

pub struct Shell {
    controller: Arc<Controller>,
}

impl Shell {
    pub fn new(controller: Arc<Controller>) -> Self {
        Self { controller }
    }

    pub async fn run(self) -> Result<()> {
        info!("Shell starting...");
        println!("{}", render(&self.controller.snapshot()));
        println!("Type 'help' for commands.");

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            let line = match lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => {
                    info!("Input closed");
                    return Ok(());
                }
                Err(source) => {
                    error!(?source, "Error reading input");
                    return Err(source).context("Failed to read input");
                }
            };

            match ShellCommand::parse(&line) {
                Ok(Some(ShellCommand::Quit)) => return Ok(()),
                Ok(Some(command)) => self.dispatch(command).await,
                Ok(None) => {}
                Err(e) => eprintln!("{e}"),
            }
        }
    }

    /// Handles one UI event and redraws.
    pub async fn dispatch(&self, command: ShellCommand) {
        debug!(?command, "Dispatching");
        let controller = &self.controller;

        let outcome: Result<()> = match command {
            ShellCommand::Fetch(url) => {
                if let Some(url) = url {
                    controller.set_url_input(&url);
                }
                if let Some(pending) = controller.begin_fetch(&controller.url_input()).await {
                    let task_controller = Arc::clone(controller);
                    tokio::spawn(async move {
                        task_controller.finish_fetch(pending).await;
                        println!("{}", render(&task_controller.snapshot()));
                    });
                }
                Ok(())
            }
            ShellCommand::SetUrl(url) => {
                controller.set_url_input(&url);
                Ok(())
            }
            ShellCommand::Captions(url) => {
                let url = url.unwrap_or_else(|| controller.url_input());
                if let Some(pending) = controller.begin_captions(&url).await {
                    let task_controller = Arc::clone(controller);
                    tokio::spawn(async move {
                        task_controller.finish_captions(pending).await;
                        println!("{}", render(&task_controller.snapshot()));
                    });
                }
                Ok(())
            }
            ShellCommand::Tab(name) => controller.select_tab(&name).map(|_| ()),
            ShellCommand::Direct(index) => controller.open_direct(index).await,
            ShellCommand::Server(index) => controller.open_server(index).await,
            ShellCommand::Copy(index) => controller.copy_format(index),
            ShellCommand::Subtitle(index) => controller.open_subtitle(index).await,
            ShellCommand::SubtitleCopy(index) => controller.copy_subtitle(index),
            ShellCommand::Height(height) => controller.select_height(height),
            ShellCommand::Mp4(height) => {
                let selected = match height {
                    Some(height) => controller.select_height(height).map(|_| height),
                    None => Ok(controller.snapshot().height),
                };
                match selected {
                    Ok(height) => {
                        report_grab(controller.grab_mp4(height).await);
                        Ok(())
                    }
                    Err(e) => Err(e),
                }
            }
            ShellCommand::Mp3 => {
                report_grab(controller.grab_mp3().await);
                Ok(())
            }
            ShellCommand::Clear => {
                controller.clear();
                Ok(())
            }
            ShellCommand::Show => Ok(()),
            ShellCommand::Help => {
                println!("{HELP}");
                return;
            }
            ShellCommand::Quit => return,
        };

        if let Err(e) = outcome {
            eprintln!("{e:#}");
        }
        println!("{}", render(&controller.snapshot()));
    }
}

fn report_grab(link: Option<String>) {
    match link {
        Some(link) => println!("Opening {}", link),
        None => eprintln!("Fetch a URL first"),
    }
}
