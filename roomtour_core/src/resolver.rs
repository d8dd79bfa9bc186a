use crate::config::{MappingRule, TourConfig};
use crate::error::ConfigError;

/// Which resolution step produced a target image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Rule index whose name pattern matched.
    Pattern(usize),
    /// Rule index whose `fallback_index` equals the ordinal.
    FallbackIndex(usize),
    /// Catalogue index `ordinal % len`.
    Modulo(usize),
}

impl Resolution {
    pub fn label(self) -> &'static str {
        match self {
            Resolution::Pattern(_) => "pattern",
            Resolution::FallbackIndex(_) => "fallback-index",
            Resolution::Modulo(_) => "modulo",
        }
    }
}

#[derive(Debug, Clone)]
struct CompiledRule {
    patterns: Vec<String>,
    fallback_index: Option<usize>,
    target_image: String,
}

/// Maps a floor node to the panorama it opens. Resolution is a pure function
/// of `(node name, ordinal)` and the tables captured at construction; the
/// non-empty catalogue makes it total.
#[derive(Debug, Clone)]
pub struct HotspotTargetResolver {
    rules: Vec<CompiledRule>,
    available: Vec<String>,
}

impl HotspotTargetResolver {
    pub fn new(rules: &[MappingRule], available: &[String]) -> Result<Self, ConfigError> {
        if available.is_empty() {
            return Err(ConfigError::NoPanoramas);
        }
        let rules = rules
            .iter()
            .map(|rule| CompiledRule {
                patterns: rule
                    .name_patterns
                    .iter()
                    .map(|pattern| pattern.to_lowercase())
                    .collect(),
                fallback_index: rule.fallback_index,
                target_image: rule.target_image.clone(),
            })
            .collect();
        Ok(Self {
            rules,
            available: available.to_vec(),
        })
    }

    pub fn from_config(config: &TourConfig) -> Result<Self, ConfigError> {
        Self::new(&config.mapping_rules, &config.available_panoramas)
    }

    pub fn resolve(&self, node_name: &str, ordinal: usize) -> &str {
        self.resolve_with_reason(node_name, ordinal).0
    }

    pub fn resolve_with_reason(&self, node_name: &str, ordinal: usize) -> (&str, Resolution) {
        let lower = node_name.to_lowercase();
        if let Some((idx, rule)) = self.rules.iter().enumerate().find(|(_, rule)| {
            rule.patterns
                .iter()
                .any(|pattern| lower.contains(pattern.as_str()))
        }) {
            return (rule.target_image.as_str(), Resolution::Pattern(idx));
        }

        if let Some((idx, rule)) = self
            .rules
            .iter()
            .enumerate()
            .find(|(_, rule)| rule.fallback_index == Some(ordinal))
        {
            return (rule.target_image.as_str(), Resolution::FallbackIndex(idx));
        }

        let slot = ordinal % self.available.len();
        (self.available[slot].as_str(), Resolution::Modulo(slot))
    }
}
