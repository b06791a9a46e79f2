//! Config validation: unknown-key detection with Levenshtein suggestions.
//!
//! The raw TOML is first parsed into `toml::Value`, the key tree is walked and
//! compared against the known field names, and a warning with a "did you
//! mean?" suggestion is emitted for each stranger. Serde deserialization runs
//! afterwards; warnings never break an existing config.

use std::collections::BTreeSet;

/// A non-fatal config warning (typo, unsupported key).
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    pub field: String,
    pub message: String,
    pub suggestion: Option<String>,
}

impl std::fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(ref s) = self.suggestion {
            write!(f, " (did you mean '{s}'?)")?;
        }
        Ok(())
    }
}

/// Every valid dotted key path of `IntelConfig`.
///
/// Maintained by hand; a new field in intel_config.rs must be added here too.
pub fn known_config_keys() -> BTreeSet<&'static str> {
    [
        // [analysis]
        "analysis",
        "analysis.url",
        "analysis.api_key",
        "analysis.timeout_secs",
        "analysis.health_check_interval_secs",
        "analysis.min_request_gap_ms",
        // [store]
        "store",
        "store.error_capacity",
        // [events]
        "events",
        "events.channel_capacity",
        // [server]
        "server",
        "server.addr",
        "server.cors_origins",
    ]
    .into_iter()
    .collect()
}

/// Recursively collect dotted key paths from a TOML table.
pub fn walk_toml_keys(value: &toml::Value, prefix: &str) -> Vec<String> {
    let mut keys = Vec::new();
    if let Some(table) = value.as_table() {
        for (k, v) in table {
            let path = if prefix.is_empty() {
                k.clone()
            } else {
                format!("{prefix}.{k}")
            };
            keys.push(path.clone());
            if v.is_table() {
                keys.extend(walk_toml_keys(v, &path));
            }
        }
    }
    keys
}

fn levenshtein(a: &str, b: &str) -> usize {
    let b_len = b.chars().count();
    if a.is_empty() {
        return b_len;
    }
    if b_len == 0 {
        return a.chars().count();
    }

    let mut prev: Vec<usize> = (0..=b_len).collect();
    let mut curr = vec![0; b_len + 1];

    for (i, ca) in a.chars().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.chars().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b_len]
}

/// Closest known key within edit distance 3, ties broken alphabetically.
pub fn suggest_correction(unknown: &str, known: &BTreeSet<&str>) -> Option<String> {
    let mut best: Option<(&str, usize)> = None;
    for &k in known {
        let dist = levenshtein(unknown, k);
        if dist > 3 {
            continue;
        }
        match best {
            Some((_, best_dist)) if dist >= best_dist => {}
            _ => best = Some((k, dist)),
        }
    }
    best.map(|(k, _)| k.to_string())
}

/// Warnings for every key in `raw_toml` that `IntelConfig` does not know.
pub fn validate_unknown_keys(raw_toml: &str) -> Vec<ValidationWarning> {
    let Ok(value) = raw_toml.parse::<toml::Value>() else {
        // parse errors are reported by serde later
        return Vec::new();
    };

    let known = known_config_keys();
    walk_toml_keys(&value, "")
        .into_iter()
        .filter(|key| !known.contains(key.as_str()))
        .map(|key| ValidationWarning {
            suggestion: suggest_correction(&key, &known),
            message: format!("Unknown config key '{key}'"),
            field: key,
        })
        .collect()
}
