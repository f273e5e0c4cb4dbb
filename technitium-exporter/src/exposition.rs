//! Prometheus text exposition format.

use std::collections::BTreeMap;
use std::io::Write;

use crate::collector::CollectorStats;
use crate::config::ScrapeContext;
use crate::model::{MetricSample, definition};

/// Render one scrape plus the exporter's own statistics.
///
/// Samples are grouped by metric name (sorted) with `# HELP` and `# TYPE`
/// lines per name; sample order within a name is preserved.
pub fn render(samples: &[MetricSample], stats: &CollectorStats, ctx: &ScrapeContext) -> String {
    let mut output = Vec::with_capacity(samples.len() * 100);

    let mut by_name: BTreeMap<&str, Vec<&MetricSample>> = BTreeMap::new();
    for sample in samples {
        by_name.entry(sample.name).or_default().push(sample);
    }

    for (name, series) in &by_name {
        if let Some(def) = definition(name) {
            writeln!(output, "# HELP {} {}", name, escape_help(def.help)).ok();
            writeln!(output, "# TYPE {} {}", name, def.kind.as_str()).ok();
        } else {
            writeln!(output, "# TYPE {} untyped", name).ok();
        }

        for sample in series {
            write_sample(&mut output, sample);
        }
    }

    // Exporter statistics
    writeln!(output).ok();
    writeln!(
        output,
        "# HELP technitium_exporter_scrapes_total Scrapes served by the exporter"
    )
    .ok();
    writeln!(output, "# TYPE technitium_exporter_scrapes_total counter").ok();
    let scrapes = exporter_sample(
        "technitium_exporter_scrapes_total",
        Vec::new(),
        stats.scrapes_total,
        ctx,
    );
    write_sample(&mut output, &scrapes);

    writeln!(
        output,
        "# HELP technitium_exporter_endpoint_failures_total Failed upstream calls per endpoint"
    )
    .ok();
    writeln!(
        output,
        "# TYPE technitium_exporter_endpoint_failures_total counter"
    )
    .ok();
    for (endpoint, failures) in &stats.endpoint_failures {
        let sample = exporter_sample(
            "technitium_exporter_endpoint_failures_total",
            vec![("endpoint", endpoint.as_str().to_string())],
            *failures,
            ctx,
        );
        write_sample(&mut output, &sample);
    }

    String::from_utf8(output).unwrap_or_default()
}

fn write_sample(output: &mut Vec<u8>, sample: &MetricSample) {
    writeln!(
        output,
        "{}{} {}",
        sample.name,
        format_labels(&sample.labels),
        format_value(sample.value)
    )
    .ok();
}

/// Counter line for the exporter's own statistics, labelled like a scrape sample.
fn exporter_sample(
    name: &'static str,
    labels: Vec<(&'static str, String)>,
    value: u64,
    ctx: &ScrapeContext,
) -> MetricSample {
    MetricSample {
        name,
        labels,
        value: value as f64,
    }
    .with_context_labels(ctx)
}

/// Escape special characters in label values.
fn escape_label_value(value: &str) -> String {
    let mut result = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => result.push_str("\\\\"),
            '"' => result.push_str("\\\""),
            '\n' => result.push_str("\\n"),
            _ => result.push(c),
        }
    }
    result
}

fn escape_help(help: &str) -> String {
    help.replace('\\', "\\\\").replace('\n', "\\n")
}

/// Format a floating point value for Prometheus.
fn format_value(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value.is_infinite() {
        if value.is_sign_positive() {
            "+Inf".to_string()
        } else {
            "-Inf".to_string()
        }
    } else if value.fract() == 0.0 {
        format!("{:.0}", value)
    } else {
        format!("{}", value)
    }
}

/// Format labels for Prometheus exposition format.
fn format_labels(labels: &[(&str, String)]) -> String {
    if labels.is_empty() {
        return String::new();
    }

    let parts: Vec<String> = labels
        .iter()
        .map(|(k, v)| format!("{}=\"{}\"", k, escape_label_value(v)))
        .collect();

    format!("{{{}}}", parts.join(","))
}
