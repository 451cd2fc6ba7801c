//! Instance naming

use std::sync::OnceLock;
use uuid::Uuid;

static GENERATED_NAME: OnceLock<String> = OnceLock::new();

/// Return `explicit` when it is non-empty, otherwise a name generated once
/// per process as `<host>-<pid>-<8 hex chars>`.
pub fn instance_name(explicit: Option<&str>) -> String {
    match explicit {
        Some(name) if !name.trim().is_empty() => name.trim().to_string(),
        _ => GENERATED_NAME.get_or_init(generate_name).clone(),
    }
}

fn generate_name() -> String {
    let host = std::env::var("HOSTNAME")
        .or_else(|_| std::env::var("COMPUTERNAME"))
        .ok()
        .filter(|h| !h.is_empty())
        .unwrap_or_else(|| "localhost".to_string());
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{}-{}-{}", host, std::process::id(), &suffix[..8])
}
