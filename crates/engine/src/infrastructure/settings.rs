//! Engine settings.
//!
//! Defaults are compiled in; `from_env` applies `CHARBUILD_*` overrides and
//! ignores (with a warning) values that do not parse.

use charbuild_domain::ContentSourceId;
use serde::{Deserialize, Serialize};

pub const DEFAULT_SETTLE_MAX_PASSES: u32 = 10;
pub const DEFAULT_MAX_ENTITIES_PER_SOURCE: usize = 1000;

/// What `adjust`/`set` do with a variable that was never created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VivifyPolicy {
    /// Fail the write with `UnknownVariable`.
    #[default]
    Reject,
    /// Create the variable at its type's zero value, then apply the write.
    Zero,
}

impl std::fmt::Display for VivifyPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VivifyPolicy::Reject => write!(f, "reject"),
            VivifyPolicy::Zero => write!(f, "zero"),
        }
    }
}

impl std::str::FromStr for VivifyPolicy {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reject" | "strict" | "fail" => Ok(VivifyPolicy::Reject),
            "zero" | "vivify" | "auto" => Ok(VivifyPolicy::Zero),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    pub vivify_policy: VivifyPolicy,
    /// Follow-up passes over newly granted content before giving up.
    pub settle_max_passes: u32,
    /// Cap on rows read from one content source per query.
    pub max_entities_per_source: usize,
    pub enabled_content_sources: Vec<ContentSourceId>,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            vivify_policy: VivifyPolicy::default(),
            settle_max_passes: DEFAULT_SETTLE_MAX_PASSES,
            max_entities_per_source: DEFAULT_MAX_ENTITIES_PER_SOURCE,
            enabled_content_sources: Vec::new(),
        }
    }
}

impl EngineSettings {
    /// Defaults with environment overrides applied.
    ///
    /// Supported environment variables:
    /// - CHARBUILD_VIVIFY_POLICY: `reject` or `zero`
    /// - CHARBUILD_SETTLE_MAX_PASSES: follow-up pass cap (1-100)
    /// - CHARBUILD_MAX_ENTITIES_PER_SOURCE: per-source row cap (1-1000)
    /// - CHARBUILD_CONTENT_SOURCES: comma-separated content source ids
    pub fn from_env() -> Self {
        Self::default().with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from any key lookup (the environment in production).
    pub fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(val) = lookup("CHARBUILD_VIVIFY_POLICY") {
            match val.parse::<VivifyPolicy>() {
                Ok(policy) => {
                    self.vivify_policy = policy;
                    tracing::info!(policy = %policy, "Applied CHARBUILD_VIVIFY_POLICY");
                }
                Err(()) => tracing::warn!(val = %val, "CHARBUILD_VIVIFY_POLICY is not reject|zero, ignoring"),
            }
        }

        if let Some(val) = lookup("CHARBUILD_SETTLE_MAX_PASSES") {
            match val.trim().parse::<u32>() {
                Ok(passes) if (1..=100).contains(&passes) => {
                    self.settle_max_passes = passes;
                    tracing::info!(passes, "Applied CHARBUILD_SETTLE_MAX_PASSES");
                }
                Ok(passes) => tracing::warn!(passes, "CHARBUILD_SETTLE_MAX_PASSES out of range [1, 100], ignoring"),
                Err(_) => tracing::warn!(val = %val, "CHARBUILD_SETTLE_MAX_PASSES is not a valid u32, ignoring"),
            }
        }

        if let Some(val) = lookup("CHARBUILD_MAX_ENTITIES_PER_SOURCE") {
            match val.trim().parse::<usize>() {
                Ok(cap) if (1..=DEFAULT_MAX_ENTITIES_PER_SOURCE).contains(&cap) => {
                    self.max_entities_per_source = cap;
                    tracing::info!(cap, "Applied CHARBUILD_MAX_ENTITIES_PER_SOURCE");
                }
                Ok(cap) => tracing::warn!(cap, "CHARBUILD_MAX_ENTITIES_PER_SOURCE out of range [1, 1000], ignoring"),
                Err(_) => tracing::warn!(val = %val, "CHARBUILD_MAX_ENTITIES_PER_SOURCE is not a valid number, ignoring"),
            }
        }

        if let Some(val) = lookup("CHARBUILD_CONTENT_SOURCES") {
            let parsed: Result<Vec<ContentSourceId>, _> = val
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::parse::<ContentSourceId>)
                .collect();
            match parsed {
                Ok(sources) => {
                    tracing::info!(count = sources.len(), "Applied CHARBUILD_CONTENT_SOURCES");
                    self.enabled_content_sources = sources;
                }
                Err(e) => tracing::warn!(val = %val, error = %e, "CHARBUILD_CONTENT_SOURCES is not a list of ids, ignoring"),
            }
        }

        self
    }
}
