//! User interaction (confirmation prompts).

use anyhow::Result;

use super::RealRuntime;

use std::io::{self, BufRead, Write};

/// Prompt on `output` and read a yes/no answer from `input`.
pub(crate) fn confirm_with_io<R: BufRead, W: Write>(
    prompt: &str,
    input: &mut R,
    output: &mut W,
) -> Result<bool> {
    write!(output, "{} [y/N] ", prompt)?;
    output.flush()?;

    let mut line = String::new();
    input.read_line(&mut line)?;

    let answer = line.trim().to_lowercase();
    Ok(matches!(answer.as_str(), "y" | "yes"))
}

impl RealRuntime {
    pub(crate) fn confirm_impl(&self, prompt: &str) -> Result<bool> {
        let stdin = io::stdin();
        let mut stdout = io::stdout();
        confirm_with_io(prompt, &mut stdin.lock(), &mut stdout)
    }
}
