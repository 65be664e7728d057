//! Prometheus text exposition format (version 0.0.4).

use std::fmt::Write;

use crate::metrics::{Descriptor, Sample};

/// Content type of the rendered output.
pub const CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Render samples, grouped by metric family in first-seen order.
///
/// Each family gets `# HELP` and `# TYPE ... gauge` headers followed by one
/// line per sample.
pub fn render(samples: &[Sample]) -> String {
    let mut output = String::with_capacity(samples.len() * 96);
    render_into(&mut output, samples);
    output
}

/// Append rendered samples to an existing buffer.
pub fn render_into(output: &mut String, samples: &[Sample]) {
    let mut families: Vec<(&'static Descriptor, Vec<&Sample>)> = Vec::new();
    for sample in samples {
        match families
            .iter_mut()
            .find(|(desc, _)| std::ptr::eq(*desc, sample.descriptor))
        {
            Some((_, members)) => members.push(sample),
            None => families.push((sample.descriptor, vec![sample])),
        }
    }

    for (desc, members) in families {
        writeln!(output, "# HELP {} {}", desc.name, escape_help(desc.help)).ok();
        writeln!(output, "# TYPE {} gauge", desc.name).ok();
        for sample in members {
            writeln!(
                output,
                "{}{} {}",
                desc.name,
                format_labels(sample),
                format_value(sample.value)
            )
            .ok();
        }
    }
}

fn format_labels(sample: &Sample) -> String {
    if sample.label_values.is_empty() {
        return String::new();
    }

    let parts: Vec<String> = sample
        .labels()
        .map(|(k, v)| format!("{}=\"{}\"", k, escape_label_value(v)))
        .collect();

    format!("{{{}}}", parts.join(","))
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

/// Escape HELP text: only backslash and newline are special there.
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
