use anyhow::Result;
use log::debug;

use crate::{
    cache::{Clock, Storage},
    observe::CollectingHook,
    platform::{PlatformDetector, PlatformGuess, Signals, UserAgentDetector},
    render::{Page, render_platform, render_stats},
    runtime::Runtime,
    source::{RegistrySource, RepoSource},
    stats::StatsFetcher,
};

use super::config::{Config, Settings};

/// Fetch every statistic and print the rendered page. With browser signals
/// the detection banner and smart download are filled in as well.
#[tracing::instrument(skip(runtime, settings))]
pub async fn stats<R: Runtime + 'static>(
    runtime: R,
    settings: &Settings,
    signals: Option<&Signals>,
    json: bool,
) -> Result<()> {
    let config = Config::new(runtime, settings)?;
    let guess = signals.map(|signals| UserAgentDetector.detect(signals));
    let output = run(&config.fetcher, guess.as_ref(), json).await?;
    print!("{}", output);
    report_fallbacks(&config.hook);
    Ok(())
}

pub(crate) async fn run<G: RepoSource, D: RegistrySource, S: Storage, C: Clock>(
    fetcher: &StatsFetcher<G, D, S, C>,
    guess: Option<&PlatformGuess>,
    json: bool,
) -> Result<String> {
    let stats = fetcher.gather().await;
    debug!("Gathered stats for {}", fetcher.repo());

    let mut page = Page::standard();
    render_stats(&mut page, &stats);
    if let Some(guess) = guess {
        debug!("Rendering platform {:?}", guess);
        render_platform(&mut page, guess);
    }

    if json {
        Ok(format!("{}\n", serde_json::to_string_pretty(&page)?))
    } else {
        Ok(page.to_string())
    }
}

/// Tell the user which values are placeholders.
pub(crate) fn report_fallbacks(hook: &CollectingHook) {
    let failures = hook.failures();
    if failures.is_empty() {
        return;
    }
    let sources: Vec<&str> = failures.iter().map(|f| f.source.as_str()).collect();
    eprintln!(
        "Note: showing fallback values for {} (run with -v for details)",
        sources.join(", ")
    );
}
