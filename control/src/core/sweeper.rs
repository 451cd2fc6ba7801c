//! Liveness sweep over the instance directory
//!
//! Runs synchronously on every instance write and every snapshot, so no
//! background clock is needed to keep snapshots free of stale entries.

use chrono::{DateTime, Utc};
use shared::InstanceRecord;
use std::collections::BTreeMap;
use std::time::Duration;

/// Instances silent for longer than this are evicted
pub const INSTANCE_TTL: Duration = Duration::from_secs(60);

/// Refresh `time_since_last_ping_ms` on every instance and evict those older
/// than `ttl`. Returns the evicted names.
///
/// A ping from the future (clock skew) counts as zero elapsed and is kept.
pub fn sweep(instances: &mut BTreeMap<String, InstanceRecord>, now: DateTime<Utc>, ttl: Duration) -> Vec<String> {
    let ttl_ms = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
    let mut expired = Vec::new();

    for (name, instance) in instances.iter_mut() {
        let elapsed = instance
            .last_ping
            .map(|ping| (now - ping).num_milliseconds())
            .unwrap_or(0);

        if elapsed < 0 {
            instance.time_since_last_ping_ms = 0;
            continue;
        }
        instance.time_since_last_ping_ms = elapsed;
        if elapsed > ttl_ms {
            expired.push(name.clone());
        }
    }

    // collected first, removed after iteration
    for name in &expired {
        instances.remove(name);
    }
    expired
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;

    fn pinged(name: &str, at: DateTime<Utc>) -> (String, InstanceRecord) {
        let mut instance = InstanceRecord::new(name);
        instance.last_ping = Some(at);
        (name.to_string(), instance)
    }

    #[test]
    fn evicts_only_expired_instances() {
        let now = Utc::now();
        let mut instances: BTreeMap<_, _> = [
            pinged("fresh", now - ChronoDuration::seconds(1)),
            pinged("edge", now - ChronoDuration::seconds(60)),
            pinged("stale", now - ChronoDuration::seconds(61)),
        ]
        .into_iter()
        .collect();

        let evicted = sweep(&mut instances, now, INSTANCE_TTL);

        assert_eq!(evicted, vec!["stale".to_string()]);
        assert!(instances.contains_key("fresh"));
        assert!(instances.contains_key("edge"));
        assert_eq!(instances["fresh"].time_since_last_ping_ms, 1000);
        assert_eq!(instances["edge"].time_since_last_ping_ms, 60_000);
    }

    #[test]
    fn future_pings_clamp_to_zero() {
        let now = Utc::now();
        let mut instances: BTreeMap<_, _> = [pinged("skewed", now + ChronoDuration::seconds(30))]
            .into_iter()
            .collect();

        let evicted = sweep(&mut instances, now, INSTANCE_TTL);

        assert!(evicted.is_empty());
        assert_eq!(instances["skewed"].time_since_last_ping_ms, 0);
    }

    #[test]
    fn empty_directory_is_fine() {
        let mut instances = BTreeMap::new();
        assert!(sweep(&mut instances, Utc::now(), INSTANCE_TTL).is_empty());
    }
}
