use std::fmt::Debug;

use colored::*;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_indicatif::IndicatifLayer;
use tracing_indicatif::filter::IndicatifFilter;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::filter_fn;
use tracing_subscriber::fmt::format::{self, Writer};
use tracing_subscriber::fmt::{self as fmt_layer, FmtContext, FormatEvent};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::Layer;

use crate::terminal::print::PRINT_TARGET;
use crate::terminal::spinner;

pub struct DescryFormatter;

/// Pulls the `raw_msg` field out of [`crate::terminal::print::print`] events.
#[derive(Default)]
struct RawMessage(Option<String>);

impl Visit for RawMessage {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "raw_msg" {
            self.0 = Some(value.to_string());
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn Debug) {
        if field.name() == "raw_msg" {
            self.0 = Some(format!("{value:?}"));
        }
    }
}

impl<S, N> FormatEvent<S, N> for DescryFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> format::FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> std::fmt::Result {
        let meta = event.metadata();

        if meta.target() == PRINT_TARGET {
            let mut raw = RawMessage::default();
            event.record(&mut raw);
            if let Some(msg) = raw.0 {
                return writeln!(writer, "{msg}");
            }
        }

        let (symbol, color_func): (&str, fn(ColoredString) -> ColoredString) = match *meta.level() {
            Level::TRACE => ("[ ]", |s| s.dimmed()),
            Level::DEBUG => ("[?]", |s| s.blue()),
            Level::INFO => ("[+]", |s| s.green().bold()),
            Level::WARN => ("[*]", |s| s.yellow().bold()),
            Level::ERROR => ("[-]", |s| s.red().bold()),
        };

        write!(writer, "{} ", color_func(symbol.into()))?;

        ctx.field_format().format_fields(writer.by_ref(), event)?;

        writeln!(writer)
    }
}

/// Installs the global subscriber: program output to stdout, log lines to stderr, both
/// routed around the sweep spinner.
///
/// Log verbosity is `info` (`warn` when quiet) unless `RUST_LOG` says otherwise. Program
/// output is never filtered.
pub fn init(quiet: u8, no_color: bool) {
    if no_color {
        colored::control::set_override(false);
    }

    let default_level = if quiet > 0 { "warn" } else { "info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let indicatif_layer = IndicatifLayer::new().with_progress_style(spinner::style());

    let output = fmt_layer::layer()
        .event_format(DescryFormatter)
        .with_writer(indicatif_layer.get_stdout_writer())
        .with_filter(filter_fn(|meta| meta.target() == PRINT_TARGET));

    let logs = fmt_layer::layer()
        .event_format(DescryFormatter)
        .with_writer(indicatif_layer.get_stderr_writer())
        .with_filter(filter_fn(|meta| meta.target() != PRINT_TARGET))
        .with_filter(env_filter);

    tracing_subscriber::registry()
        .with(output)
        .with(logs)
        .with(indicatif_layer.with_filter(IndicatifFilter::new(false)))
        .init();
}
