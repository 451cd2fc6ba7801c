//! Text and HDR plot reports

use hdrhistogram::Histogram;

use crate::core::metrics::{Metrics, Summary};

/// Human-readable summary followed by the bucket histogram
pub fn text_report(metrics: &Metrics) -> String {
    let summary = metrics.summary();
    let mut out = summary_lines(&summary);
    out.push('\n');
    out.push_str(&metrics.buckets().render());
    out
}

fn summary_lines(s: &Summary) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{:<14}{:<34}{}, {:.2}, {:.2}\n",
        "Requests", "[total, rate, throughput]", s.requests, s.rate, s.throughput
    ));
    out.push_str(&format!(
        "{:<14}{:<34}{:?}, {:?}, {:?}\n",
        "Duration", "[total, attack, wait]", s.duration, s.attack, s.wait
    ));
    out.push_str(&format!(
        "{:<14}{:<34}{:?}, {:?}, {:?}, {:?}, {:?}, {:?}, {:?}\n",
        "Latencies",
        "[min, mean, 50, 90, 95, 99, max]",
        s.latency_min,
        s.latency_mean,
        s.latency_p50,
        s.latency_p90,
        s.latency_p95,
        s.latency_p99,
        s.latency_max
    ));
    out.push_str(&format!(
        "{:<14}{:<34}{}, {:.2}\n",
        "Bytes In", "[total, mean]", s.bytes_in_total, s.bytes_in_mean
    ));
    out.push_str(&format!(
        "{:<14}{:<34}{}, {:.2}\n",
        "Bytes Out", "[total, mean]", s.bytes_out_total, s.bytes_out_mean
    ));
    out.push_str(&format!("{:<14}{:<34}{:.2}%\n", "Success", "[ratio]", s.success_ratio * 100.0));

    let codes: Vec<String> = s.status_codes.iter().map(|(code, n)| format!("{code}:{n}")).collect();
    out.push_str(&format!("{:<14}{:<34}{}\n", "Status Codes", "[code:count]", codes.join("  ")));

    out.push_str("Error Set:\n");
    for error in &s.errors {
        out.push_str(error);
        out.push('\n');
    }
    out
}

/// Quantiles at which the plot is sampled: five steps per halving of the
/// remaining distance to 1.0
fn plot_quantiles() -> Vec<f64> {
    let mut quantiles = Vec::new();
    let mut lower = 0.0;
    let mut width = 0.5;
    while width > 1e-6 {
        let step = width / 5.0;
        for i in 0..5 {
            quantiles.push(lower + step * i as f64);
        }
        lower += width;
        width /= 2.0;
    }
    quantiles.push(1.0);
    quantiles
}

/// HDR percentile distribution, one line per plotted quantile
pub fn hdr_plot(latencies: &Histogram<u64>) -> String {
    let mut out = format!(
        "{:>12} {:>14} {:>12} {:>18}\n",
        "Value(ms)", "Percentile", "TotalCount", "1/(1-Percentile)"
    );
    if latencies.is_empty() {
        return out;
    }

    for q in plot_quantiles() {
        let value = latencies.value_at_quantile(q);
        let total = latencies.count_between(0, value);
        let inverse = if q >= 1.0 {
            "inf".to_string()
        } else {
            format!("{:.2}", 1.0 / (1.0 - q))
        };
        out.push_str(&format!(
            "{:>12.6} {:>14.6} {:>12} {:>18}\n",
            value as f64 / 1000.0,
            q,
            total,
            inverse
        ));
    }
    out
}
