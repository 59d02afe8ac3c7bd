//! Output functions for consistent CLI formatting

use super::context::UiContext;
use console::{style, Style};

fn tag(ctx: &UiContext, glyph: &'static str, plain: &'static str, style: Style) -> String {
    let text = if ctx.is_interactive() { glyph } else { plain };
    style.apply_to(text).to_string()
}

/// Bold title line
pub fn heading(_ctx: &UiContext, title: &str) {
    println!("{}", style(title).cyan().bold());
}

/// Blank line followed by a section title
pub fn section(_ctx: &UiContext, title: &str) {
    println!();
    println!("{}", style(title).bold());
}

pub fn step_ok(ctx: &UiContext, message: &str) {
    println!("  {} {}", tag(ctx, "✓", "[OK]", Style::new().green()), message);
}

pub fn step_ok_detail(ctx: &UiContext, message: &str, detail: &str) {
    println!(
        "  {} {} ({})",
        tag(ctx, "✓", "[OK]", Style::new().green()),
        message,
        style(detail).dim()
    );
}

pub fn step_warn(ctx: &UiContext, message: &str) {
    println!("  {} {}", tag(ctx, "⚠", "[WARN]", Style::new().yellow()), message);
}

pub fn step_warn_hint(ctx: &UiContext, message: &str, hint: &str) {
    println!(
        "  {} {} - {}",
        tag(ctx, "⚠", "[WARN]", Style::new().yellow()),
        message,
        style(hint).dim()
    );
}

pub fn step_info(ctx: &UiContext, message: &str) {
    println!("  {} {}", tag(ctx, "•", "[INFO]", Style::new().cyan()), message);
}

/// Dimmed hint line
pub fn remark(_ctx: &UiContext, message: &str) {
    println!("  {}", style(message).dim());
}

pub fn key_value(_ctx: &UiContext, key: &str, value: &str) {
    println!("  {}: {}", style(key).dim(), value);
}

/// Key-value pair colored green when `ok`, yellow otherwise
pub fn key_value_status(_ctx: &UiContext, key: &str, value: &str, ok: bool) {
    let value_style = if ok {
        Style::new().green()
    } else {
        Style::new().yellow()
    };
    println!("  {}: {}", style(key).dim(), value_style.apply_to(value));
}
