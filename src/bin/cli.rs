// Terminal front end: a line-oriented chat session over `Studio`.

use anyhow::{Context, Result};
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::info;

use muse::core::config::AppConfig;
use muse::core::models::{EnhanceMode, Role};
use muse::studio::{Notification, Studio};
use muse::styles::{STYLES, StyleModifier, style_by_id};

const HELP: &str = "\
Commands:
  <text>                     chat, or request an image (\"draw ...\")
  /style <id>                select an image style (/styles to list)
  /attach <image-ref>        attach an image URL or data URL to the next message
  /enhance <url> [mode]      upscale | enhance | restore
  /video <image-url> [text]  animate an image into a short video
  /gallery                   list generated images
  /clear                     start a new conversation
  /quit                      exit
Press Ctrl-C while a request runs to cancel it.";

#[derive(Debug, PartialEq, Eq)]
enum Command<'a> {
    Message(&'a str),
    Style(&'a str),
    Styles,
    Attach(&'a str),
    Enhance(&'a str, Option<&'a str>),
    Video(&'a str, &'a str),
    Gallery,
    Clear,
    Help,
    Quit,
    Empty,
}

impl<'a> Command<'a> {
    fn parse(line: &'a str) -> Self {
        let line = line.trim();
        let Some(rest) = line.strip_prefix('/') else {
            return if line.is_empty() {
                Self::Empty
            } else {
                Self::Message(line)
            };
        };

        let (name, args) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
        let args = args.trim();
        match name {
            "style" => Self::Style(args),
            "styles" => Self::Styles,
            "attach" => Self::Attach(args),
            "enhance" => {
                let (url, mode) = args.split_once(char::is_whitespace).unwrap_or((args, ""));
                let mode = mode.trim();
                Self::Enhance(url, (!mode.is_empty()).then_some(mode))
            }
            "video" => {
                let (url, text) = args.split_once(char::is_whitespace).unwrap_or((args, ""));
                Self::Video(url, text.trim())
            }
            "gallery" => Self::Gallery,
            "clear" => Self::Clear,
            "quit" | "exit" => Self::Quit,
            _ => Self::Help,
        }
    }
}

/// Cancels its token on Ctrl-C until dropped.
struct CtrlCGuard {
    token: CancellationToken,
    watcher: JoinHandle<()>,
}

impl CtrlCGuard {
    fn new() -> Self {
        let token = CancellationToken::new();
        let watched = token.clone();
        let watcher = tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                watched.cancel();
            }
        });
        Self { token, watcher }
    }
}

impl Drop for CtrlCGuard {
    fn drop(&mut self) {
        self.watcher.abort();
    }
}

fn notify(notification: &Notification) {
    match notification {
        Notification::Success(msg) => println!("✔ {msg}"),
        Notification::Error(msg) => eprintln!("✖ {msg}"),
    }
}

fn print_styles(selected: Option<&StyleModifier>) {
    for style in STYLES {
        let marker = if selected.is_some_and(|s| s.id == style.id) { "*" } else { " " };
        println!("{marker} {} {:<16} {}", style.preview, style.id, style.display_name);
    }
}

async fn send(
    studio: &mut Studio,
    text: &str,
    image: Option<&str>,
    style: Option<&StyleModifier>,
) -> Result<()> {
    let guard = CtrlCGuard::new();
    let mut printed = 0;
    let failure = studio
        .send_message(text, image, style, &guard.token, |snapshot| {
            print!("{}", &snapshot[printed..]);
            let _ = std::io::stdout().flush();
            printed = snapshot.len();
        })
        .await;

    if printed > 0 {
        println!();
    }
    if let Some(notification) = failure {
        notify(&notification);
    }

    // Image replies and failures arrive as whole turns.
    if let Some(last) = studio.conversation().turns().last()
        && last.role == Role::Assistant
        && printed == 0
    {
        println!("{}", last.content);
        for url in &last.images {
            println!("  🖼  {url}");
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    muse::setup_logging();

    let config = AppConfig::from_env().context("Failed to load configuration")?;
    let mut studio = Studio::from_config(&config).context("Failed to initialise clients")?;
    info!("Muse studio ready");
    println!("{HELP}");

    let mut style: Option<&'static StyleModifier> = None;
    let mut attached: Option<String> = None;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("> ");
        std::io::stdout().flush()?;
        // Once a request has run, SIGINT is owned by tokio; treat it as quit at the prompt.
        let next = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => None,
        };
        let Some(line) = next else {
            println!();
            break;
        };

        match Command::parse(&line) {
            Command::Empty => {}
            Command::Message(text) => {
                let image = attached.take();
                send(&mut studio, text, image.as_deref(), style).await?;
            }
            Command::Style(id) => match style_by_id(id) {
                Some(selected) => {
                    style = (!selected.is_none()).then_some(selected);
                    println!("Style: {} {}", selected.preview, selected.display_name);
                }
                None => eprintln!("Unknown style '{id}'. Use /styles to list them."),
            },
            Command::Styles => print_styles(style),
            Command::Attach(image) if image.is_empty() => eprintln!("Usage: /attach <image-ref>"),
            Command::Attach(image) => {
                attached = Some(image.to_string());
                println!("Image attached to the next message.");
            }
            Command::Enhance(url, mode) => {
                let mode = match mode.map(str::parse::<EnhanceMode>).transpose() {
                    Ok(mode) => mode.unwrap_or_default(),
                    Err(e) => {
                        eprintln!("{e}");
                        continue;
                    }
                };
                match studio.enhance_image(url, mode).await {
                    Ok(enhanced) => {
                        notify(&Notification::Success("Image enhanced successfully!".into()));
                        println!("  🖼  {enhanced}");
                    }
                    Err(e) => {
                        if let Some(n) = Notification::from_error(&e) {
                            notify(&n);
                        }
                    }
                }
            }
            Command::Video(url, text) => {
                println!("Generating video... (Ctrl-C to cancel)");
                let guard = CtrlCGuard::new();
                match studio.animate_image(url, text, &guard.token).await {
                    Ok(video) => {
                        notify(&Notification::Success("Video generated successfully!".into()));
                        println!("  🎬 {video}");
                    }
                    Err(e) => match Notification::from_error(&e) {
                        Some(n) => notify(&n),
                        None => println!("Video generation cancelled."),
                    },
                }
            }
            Command::Gallery => {
                for item in studio.conversation().gallery() {
                    let style = item.style_label.as_deref().unwrap_or("-");
                    println!("{} [{style}] {}", item.url, item.prompt);
                }
            }
            Command::Clear => {
                studio.clear();
                attached = None;
                println!("New conversation started.");
            }
            Command::Help => println!("{HELP}"),
            Command::Quit => break,
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!(Command::parse("  hello there "), Command::Message("hello there"));
        assert_eq!(Command::parse(""), Command::Empty);
        assert_eq!(Command::parse("/style anime"), Command::Style("anime"));
        assert_eq!(
            Command::parse("/enhance https://x/a.png upscale"),
            Command::Enhance("https://x/a.png", Some("upscale"))
        );
        assert_eq!(
            Command::parse("/enhance https://x/a.png"),
            Command::Enhance("https://x/a.png", None)
        );
        assert_eq!(
            Command::parse("/video https://x/a.png make it rain"),
            Command::Video("https://x/a.png", "make it rain")
        );
        assert_eq!(Command::parse("/quit"), Command::Quit);
        assert_eq!(Command::parse("/nope"), Command::Help);
    }
}
