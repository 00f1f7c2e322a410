//! Progress indicators with CI fallback

use super::context::UiContext;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

/// A task spinner with CI fallback
pub struct TaskSpinner {
    spinner: Option<cliclack::ProgressBar>,
    interactive: bool,
}

impl TaskSpinner {
    pub fn new(ctx: &UiContext) -> Self {
        Self {
            spinner: None,
            interactive: ctx.use_fancy_output(),
        }
    }

    /// Start the spinner with a message
    pub fn start(&mut self, message: &str) {
        if self.interactive {
            let spinner = cliclack::spinner();
            spinner.start(message);
            self.spinner = Some(spinner);
        } else {
            println!("{} {}", style("...").dim(), message);
        }
    }

    /// Stop with success message
    pub fn stop(&mut self, message: &str) {
        if let Some(spinner) = self.spinner.take() {
            spinner.stop(message);
        } else if self.interactive {
            println!("{} {}", style("✓").green(), message);
        } else {
            println!("{} {}", style("[OK]").green(), message);
        }
    }

    /// Stop with error message
    pub fn stop_error(&mut self, message: &str) {
        if let Some(spinner) = self.spinner.take() {
            spinner.error(message);
        } else if self.interactive {
            println!("{} {}", style("✗").red(), message);
        } else {
            println!("{} {}", style("[FAIL]").red(), message);
        }
    }
}

/// Progress bar for a single image build.
///
/// Understands BuildKit (`#7 [2/5] RUN ...`) and legacy builder
/// (`Step 2/5 : RUN ...`) step lines. In CI every output line is echoed so
/// the job log keeps the full build transcript.
pub struct BuildProgress {
    bar: Option<ProgressBar>,
}

impl BuildProgress {
    pub fn new(ctx: &UiContext, label: &str) -> Self {
        let bar = if ctx.use_fancy_output() {
            let bar = ProgressBar::new(0);
            let template = ProgressStyle::default_bar().template(
                "  {spinner:.cyan} Building {prefix}  {bar:20.cyan/dim} {pos}/{len} {msg:.dim}  {elapsed:.dim}",
            );
            if let Ok(template) = template {
                bar.set_style(
                    template
                        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ ")
                        .progress_chars("━╸─"),
                );
            }
            bar.set_prefix(label.to_string());
            bar.enable_steady_tick(std::time::Duration::from_millis(120));
            Some(bar)
        } else {
            println!("Building {}...", label);
            None
        };
        Self { bar }
    }

    /// Process a build output line
    pub fn on_line(&self, line: String) {
        let Some(ref bar) = self.bar else {
            println!("  {}", line);
            return;
        };

        if let Some((n, total, instruction)) = parse_step_line(&line) {
            bar.set_length(total);
            bar.set_position(n);
            bar.set_message(instruction.to_string());
        } else {
            let trimmed = line.trim();
            if !trimmed.is_empty() && !is_build_noise(trimmed) {
                bar.set_message(truncate(trimmed, 60));
            }
        }
    }

    /// Finish and clear the progress bar.
    pub fn finish(&self) {
        if let Some(ref bar) = self.bar {
            bar.disable_steady_tick();
            bar.finish_and_clear();
        }
    }
}

fn truncate(line: &str, max: usize) -> String {
    if line.chars().count() <= max {
        return line.to_string();
    }
    let head: String = line.chars().take(max.saturating_sub(3)).collect();
    format!("{}...", head)
}

/// BuildKit bookkeeping lines that carry no useful progress text.
fn is_build_noise(line: &str) -> bool {
    let Some(rest) = line.strip_prefix('#') else {
        return line.starts_with("--->") || line.starts_with("Removing intermediate");
    };
    let body = rest
        .split_once(' ')
        .map(|(_, body)| body.trim())
        .unwrap_or_default();
    body.is_empty()
        || body.starts_with("DONE")
        || body.starts_with("CACHED")
        || body.starts_with("sha256:")
        || body.starts_with("writing image")
        || body.starts_with("naming to")
        || body.starts_with("transferring")
}

/// Parse a build step line into `(step, total, instruction)`.
fn parse_step_line(line: &str) -> Option<(u64, u64, &str)> {
    parse_buildkit_step(line).or_else(|| parse_legacy_step(line))
}

/// `#7 [2/5] RUN ...`, `#7 [linux/arm64 2/5] RUN ...`, `#7 [stage 2/5] ...`
fn parse_buildkit_step(line: &str) -> Option<(u64, u64, &str)> {
    let rest = line.strip_prefix('#')?;
    let (_, rest) = rest.split_once(' ')?;
    let rest = rest.strip_prefix('[')?;
    let (inside, instruction) = rest.split_once(']')?;
    let counter = inside.split_whitespace().last()?;
    let (n, total) = split_counter(counter)?;
    Some((n, total, instruction.trim()))
}

/// `Step 2/5 : RUN ...`
fn parse_legacy_step(line: &str) -> Option<(u64, u64, &str)> {
    let rest = line.strip_prefix("Step ")?;
    let (counter, instruction) = rest.split_once(':')?;
    let (n, total) = split_counter(counter.trim())?;
    Some((n, total, instruction.trim()))
}

fn split_counter(counter: &str) -> Option<(u64, u64)> {
    let (n, total) = counter.split_once('/')?;
    Some((n.parse().ok()?, total.parse().ok()?))
}
