//! Fixed-bucket latency histogram

use std::time::Duration;

/// Lower bounds of the latency buckets. The last bucket is open ended.
pub const LATENCY_BUCKETS: [Duration; 10] = [
    Duration::from_micros(1),
    Duration::from_micros(500),
    Duration::from_millis(1),
    Duration::from_millis(10),
    Duration::from_millis(100),
    Duration::from_millis(500),
    Duration::from_secs(1),
    Duration::from_secs(10),
    Duration::from_secs(30),
    Duration::from_secs(60),
];

const BAR_WIDTH: f64 = 40.0;

#[derive(Debug, Clone)]
pub struct LatencyBuckets {
    bounds: Vec<Duration>,
    counts: Vec<u64>,
    total: u64,
}

/// One rendered bucket
#[derive(Debug, Clone, PartialEq)]
pub struct BucketRow {
    pub lower: Duration,
    pub upper: Option<Duration>,
    pub count: u64,
    pub ratio: f64,
}

impl Default for LatencyBuckets {
    fn default() -> Self {
        Self::new(&LATENCY_BUCKETS)
    }
}

impl LatencyBuckets {
    pub fn new(bounds: &[Duration]) -> Self {
        Self {
            bounds: bounds.to_vec(),
            counts: vec![0; bounds.len()],
            total: 0,
        }
    }

    /// Count `latency` in the last bucket whose lower bound it reaches.
    /// Anything faster than the first bound lands in the first bucket.
    pub fn add(&mut self, latency: Duration) {
        if self.bounds.is_empty() {
            return;
        }
        let index = self.bounds.partition_point(|bound| *bound <= latency).saturating_sub(1);
        self.counts[index] += 1;
        self.total += 1;
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn rows(&self) -> Vec<BucketRow> {
        self.bounds
            .iter()
            .zip(&self.counts)
            .enumerate()
            .map(|(i, (lower, count))| BucketRow {
                lower: *lower,
                upper: self.bounds.get(i + 1).copied(),
                count: *count,
                ratio: if self.total == 0 {
                    0.0
                } else {
                    *count as f64 / self.total as f64
                },
            })
            .collect()
    }

    /// Table of `Bucket  #  %  Histogram`
    pub fn render(&self) -> String {
        let mut out = format!("{:<22}{:<8}{:<9}{}\n", "Bucket", "#", "%", "Histogram");
        for row in self.rows() {
            let range = match row.upper {
                Some(upper) => format!("[{:?}, {:?}]", row.lower, upper),
                None => format!("[{:?}, +Inf]", row.lower),
            };
            let bar = "#".repeat((row.ratio * BAR_WIDTH).round() as usize);
            out.push_str(&format!(
                "{:<22}{:<8}{:<9}{}\n",
                range,
                row.count,
                format!("{:.2}%", row.ratio * 100.0),
                bar
            ));
        }
        out
    }
}
