use std::error::Error;
use std::fs::File;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use log::{info, warn};
use pjax::core::config::{self, CliOverrides, ResolvedConfig};
use pjax::core::request::{fragment_id, same_document};
use pjax::core::{Action, ClickEvent, Effect, IgnoreReason};
use pjax::dom::parse_document;
use pjax::{Browser, Fetcher, HeadlessBrowser, HttpFetcher, Pjax};
use serde::Serialize;
use simplelog::{ConfigBuilder, LevelFilter, WriteLogger};
use url::Url;

#[derive(Parser)]
#[command(
    name = "pjax",
    about = "Drive pjax transitions against a live site from the terminal"
)]
struct Args {
    /// Page to open
    url: Url,

    /// Steps to run in order: an href to click, `back`, `forward` or `reload`
    steps: Vec<String>,

    /// Print one JSON object per step
    #[arg(long)]
    json: bool,

    /// Config file to use instead of ~/.pjax/config.toml
    #[arg(long)]
    config: Option<PathBuf>,

    /// Leave every click to the browser
    #[arg(long)]
    disabled: bool,

    /// Milliseconds before the loading indicator shows (0 turns it off)
    #[arg(long)]
    load_indicator_delay_ms: Option<u64>,

    /// Selector of a fixed header to scroll clear of
    #[arg(long)]
    scroll_offset_selector: Option<String>,

    /// Element id an empty `data-scroll-to-id` scrolls to
    #[arg(long)]
    default_main_id: Option<String>,

    /// Log file
    #[arg(long, default_value = "pjax.log")]
    log_file: PathBuf,
}

/// What a step did, as printed.
#[derive(Serialize)]
struct StepReport {
    step: String,
    outcome: String,
    url: String,
    title: String,
    history_len: usize,
    scroll_y: f64,
    hard_reloads: usize,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    dotenv::dotenv().ok();

    let log_config = ConfigBuilder::new().set_time_format_rfc3339().build();
    if let Ok(log_file) = File::create(&args.log_file) {
        let _ = WriteLogger::init(LevelFilter::Debug, log_config, log_file);
    }

    let file_config = match &args.config {
        Some(path) => config::load_config_from(path)?,
        None => config::load_config().unwrap_or_else(|e| {
            warn!("Using defaults: {}", e);
            Default::default()
        }),
    };
    let overrides = CliOverrides {
        disabled: args.disabled.then_some(true),
        load_indicator_delay_ms: args.load_indicator_delay_ms,
        scroll_offset_selector: args.scroll_offset_selector.clone(),
        default_main_id: args.default_main_id.clone(),
    };
    let config = config::resolve(&file_config, &overrides);
    info!("pjax starting at {} with {:?}", args.url, config);

    let fetcher: Arc<dyn Fetcher> = Arc::new(HttpFetcher::from_config(&config)?);
    let browser = open(fetcher.as_ref(), &args.url).await?;
    let mut pjax = Pjax::new(config.clone(), fetcher.clone(), browser);

    print_report(&pjax, "open", "loaded".to_string(), args.json).await?;

    for step in &args.steps {
        let outcome = match step.as_str() {
            "back" | "forward" => {
                let moved = {
                    let mut browser = pjax.browser().lock().await;
                    if step == "back" {
                        browser.go_back()
                    } else {
                        browser.go_forward()
                    }
                };
                if moved {
                    match pjax.handle(Action::PopState).await {
                        Some(outcome) => outcome.to_string(),
                        None => "same document, nothing to load".to_string(),
                    }
                } else {
                    "no history entry".to_string()
                }
            }
            "reload" => pjax.reload().await.to_string(),
            href => {
                let anchor = pjax.browser().lock().await.find_link(href);
                match anchor {
                    None => format!("no link to {href} on this page"),
                    Some(anchor) => {
                        let target = anchor.href.clone();
                        let effect = pjax.dispatch(Action::Click(ClickEvent::primary(anchor))).await;
                        match effect {
                            Effect::Transition(request) => {
                                pjax.transition(request).await.to_string()
                            }
                            Effect::Ignore(reason) => {
                                pjax = follow_natively(pjax, &config, &fetcher, reason, &target)
                                    .await?;
                                format!("left to the browser: {reason}")
                            }
                        }
                    }
                }
            }
        };

        // A failed transition asks the browser for a real reload.
        let reload = pjax.browser().lock().await.take_pending_reload();
        if reload {
            let location = pjax.browser().lock().await.location();
            pjax = navigate(pjax, &config, &fetcher, &location, false).await?;
        }
        pjax.browser().lock().await.run_frames();

        print_report(&pjax, step, outcome, args.json).await?;
    }

    Ok(())
}

/// Full page load of `url` in a fresh headless browser.
async fn open(fetcher: &dyn Fetcher, url: &Url) -> Result<HeadlessBrowser, Box<dyn Error>> {
    let response = fetcher.fetch(url).await?;
    if !response.is_success() {
        return Err(format!("{} answered HTTP {}", response.url, response.status).into());
    }
    Ok(HeadlessBrowser::load(response.url, &response.body))
}

/// What a browser does with a click pjax stays out of.
async fn follow_natively(
    pjax: Pjax<HeadlessBrowser>,
    config: &ResolvedConfig,
    fetcher: &Arc<dyn Fetcher>,
    reason: IgnoreReason,
    target: &Url,
) -> Result<Pjax<HeadlessBrowser>, Box<dyn Error>> {
    let location = pjax.browser().lock().await.location();
    match reason {
        IgnoreReason::OtherBrowsingContext => Ok(pjax),
        _ if same_document(target, &location) => {
            {
                let mut browser = pjax.browser().lock().await;
                let title = browser.title();
                browser.push_state(&title, target);
                if let Some(id) = fragment_id(target) {
                    browser.scroll_into_view(&id);
                }
            }
            Ok(pjax)
        }
        _ => navigate(pjax, config, fetcher, target, true).await,
    }
}

/// Loads `url` from scratch. The page's pjax instance starts over with it.
async fn navigate(
    pjax: Pjax<HeadlessBrowser>,
    config: &ResolvedConfig,
    fetcher: &Arc<dyn Fetcher>,
    url: &Url,
    push: bool,
) -> Result<Pjax<HeadlessBrowser>, Box<dyn Error>> {
    let response = fetcher.fetch(url).await?;
    let mut browser = pjax.into_browser();
    if push {
        browser.push_state("", &response.url);
    }
    browser.replace_document(parse_document(&response.body));
    Ok(Pjax::new(config.clone(), fetcher.clone(), browser))
}

async fn print_report(
    pjax: &Pjax<HeadlessBrowser>,
    step: &str,
    outcome: String,
    json: bool,
) -> Result<(), Box<dyn Error>> {
    let browser = pjax.browser().lock().await;
    let report = StepReport {
        step: step.to_string(),
        outcome,
        url: browser.location().to_string(),
        title: browser.title(),
        history_len: browser.history_len(),
        scroll_y: browser.scroll_position().1,
        hard_reloads: browser.reloads(),
    };

    if json {
        println!("{}", serde_json::to_string(&report)?);
    } else {
        println!(
            "{:<10} {}\n           {} {:?} (history {}, y={})",
            report.step, report.outcome, report.url, report.title, report.history_len, report.scroll_y
        );
    }
    Ok(())
}
