//! Run output: cliclack log lines on a terminal, tagged plain lines in CI

use super::context::UiContext;
use console::{style, StyledObject};

/// Plain-mode line: `[TAG] message`, indented under the current section
fn tagged(indent: bool, tag: StyledObject<&str>, message: &str) {
    let pad = if indent { "  " } else { "" };
    println!("{}{} {}", pad, tag, message);
}

/// Run banner
pub fn intro(ctx: &UiContext, title: &str) {
    let banner = style(title).cyan().bold();
    if ctx.use_fancy_output() {
        cliclack::intro(banner).ok();
    } else {
        println!("{}", banner);
    }
}

/// Final line of a successful run
pub fn outro_success(ctx: &UiContext, message: &str) {
    if ctx.use_fancy_output() {
        cliclack::outro(style(message).green().bold()).ok();
        return;
    }
    println!();
    tagged(false, style("[OK]").green(), message);
}

/// Header for a group of jobs, e.g. "Building rootless images..."
pub fn section(ctx: &UiContext, title: &str) {
    println!();
    let header = style(title).bold();
    if ctx.use_fancy_output() {
        cliclack::log::info(header).ok();
    } else {
        println!("{}", header);
    }
}

/// A finished job
pub fn step_ok(ctx: &UiContext, message: &str) {
    if ctx.use_fancy_output() {
        cliclack::log::success(message).ok();
    } else {
        tagged(true, style("[OK]").green(), message);
    }
}

/// The job that aborted the run
pub fn step_error(ctx: &UiContext, message: &str) {
    if ctx.use_fancy_output() {
        cliclack::log::error(message).ok();
    } else {
        tagged(true, style("[FAIL]").red(), message);
    }
}

/// Run parameter shown under the banner
pub fn key_value(ctx: &UiContext, key: &str, value: &str) {
    let key = if ctx.use_fancy_output() {
        style(key).dim()
    } else {
        style(key)
    };
    println!("  {}: {}", key, value);
}
