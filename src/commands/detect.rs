use anyhow::Result;
use log::debug;

use crate::platform::{PlatformDetector, PlatformGuess, RELEASES_PAGE_URL, Signals};

/// Guess the platform for the given browser signals and print the
/// recommended download.
#[tracing::instrument(skip(detector))]
pub fn detect<D: PlatformDetector>(detector: &D, signals: &Signals) -> Result<()> {
    let guess = detector.detect(signals);
    debug!("Detected {:?}", guess);
    print!("{}", describe(&guess));
    Ok(())
}

pub(crate) fn describe(guess: &PlatformGuess) -> String {
    if !guess.is_known() {
        return format!(
            "Could not detect the platform.\nAll downloads: {}\n",
            RELEASES_PAGE_URL
        );
    }
    format!(
        "Detected platform: {}\nRecommended download: {}\n",
        guess.display(),
        guess.download_url()
    )
}
