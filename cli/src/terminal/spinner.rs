use colored::*;
use indicatif::ProgressStyle;
use tracing::{Span, info_span};
use tracing_indicatif::span_ext::IndicatifSpanExt;

use crate::terminal::colors;

pub fn style() -> ProgressStyle {
    ProgressStyle::with_template("{spinner:.blue} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_strings(&[
            "▁▁▁▁▁",
            "▁▂▂▂▁",
            "▁▄▂▄▁",
            "▂▄▆▄▂",
            "▄▆█▆▄",
            "▂▄▆▄▂",
            "▁▄▂▄▁",
            "▁▂▂▂▁",
        ])
}

/// A span that shows a spinner for as long as it is entered.
pub fn sweep_span(network: &str, addresses: u64) -> Span {
    let span = info_span!("sweep", indicatif.pb_show = true);
    span.pb_set_message(
        &format!(
            "Pinging {} on {}...",
            format!("{addresses} addresses").green().bold(),
            network.color(colors::IPV4_ADDR)
        )
        .color(colors::TEXT_DEFAULT)
        .to_string(),
    );
    span
}
