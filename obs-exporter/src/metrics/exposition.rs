//! Prometheus text exposition format (version 0.0.4).

use std::fmt::Write;

/// `Content-Type` of a rendered scrape.
pub const TEXT_FORMAT: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Label carrying the OBS metric name inside each family.
pub const METRIC_LABEL: &str = "metric";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    Gauge,
    Counter,
}

impl MetricKind {
    fn as_str(self) -> &'static str {
        match self {
            Self::Gauge => "gauge",
            Self::Counter => "counter",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    /// Value of the `metric` label.
    pub metric: String,
    pub value: f64,
}

/// One named family of samples sharing a type and help text.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricFamily {
    pub name: String,
    pub help: String,
    pub kind: MetricKind,
    pub samples: Vec<Sample>,
}

impl MetricFamily {
    pub fn gauge(name: impl Into<String>, help: impl Into<String>) -> Self {
        Self::new(name, help, MetricKind::Gauge)
    }

    pub fn counter(name: impl Into<String>, help: impl Into<String>) -> Self {
        Self::new(name, help, MetricKind::Counter)
    }

    fn new(name: impl Into<String>, help: impl Into<String>, kind: MetricKind) -> Self {
        Self {
            name: name.into(),
            help: help.into(),
            kind,
            samples: Vec::new(),
        }
    }

    pub fn add_metric(&mut self, metric: impl Into<String>, value: f64) {
        self.samples.push(Sample {
            metric: metric.into(),
            value,
        });
    }

    /// Name used on the wire. Counters get the conventional `_total` suffix.
    pub fn exposed_name(&self) -> String {
        match self.kind {
            MetricKind::Counter if !self.name.ends_with("_total") => {
                format!("{}_total", self.name)
            }
            _ => self.name.clone(),
        }
    }
}

/// Render families in the text exposition format.
pub fn render(families: &[MetricFamily]) -> String {
    let mut output = String::new();

    for family in families {
        let name = family.exposed_name();
        let _ = writeln!(output, "# HELP {} {}", name, escape_help(&family.help));
        let _ = writeln!(output, "# TYPE {} {}", name, family.kind.as_str());

        for sample in &family.samples {
            let _ = writeln!(
                output,
                "{}{{{}=\"{}\"}} {}",
                name,
                METRIC_LABEL,
                escape_label_value(&sample.metric),
                format_value(sample.value)
            );
        }
    }

    output
}

fn format_value(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value.is_infinite() {
        if value > 0.0 { "+Inf" } else { "-Inf" }.to_string()
    } else {
        value.to_string()
    }
}

fn escape_help(help: &str) -> String {
    help.replace('\\', "\\\\").replace('\n', "\\n")
}

fn escape_label_value(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_gauge_family() {
        let mut gauge = MetricFamily::gauge("obsgauge", "OBS metrics gauge");
        gauge.add_metric("obsConnection", 1.0);
        gauge.add_metric("outputCongestion", 0.4);

        let output = render(&[gauge]);
        assert_eq!(
            output,
            "# HELP obsgauge OBS metrics gauge\n\
             # TYPE obsgauge gauge\n\
             obsgauge{metric=\"obsConnection\"} 1\n\
             obsgauge{metric=\"outputCongestion\"} 0.4\n"
        );
    }

    #[test]
    fn test_render_counter_uses_total_suffix() {
        let mut counter = MetricFamily::counter("obscounter", "OBS metrics counter");
        counter.add_metric("renderTotalFrames", 36000.0);

        let output = render(&[counter]);
        assert!(output.contains("# TYPE obscounter_total counter\n"));
        assert!(output.contains("obscounter_total{metric=\"renderTotalFrames\"} 36000\n"));
    }

    #[test]
    fn test_render_empty() {
        assert_eq!(render(&[]), "");
    }

    #[test]
    fn test_special_values_and_escaping() {
        assert_eq!(format_value(f64::NAN), "NaN");
        assert_eq!(format_value(f64::INFINITY), "+Inf");
        assert_eq!(format_value(f64::NEG_INFINITY), "-Inf");
        assert_eq!(escape_label_value("a\"b\\c\nd"), "a\\\"b\\\\c\\nd");
    }
}
