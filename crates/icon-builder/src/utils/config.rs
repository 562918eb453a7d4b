//! Optional toml configuration.
//!
//! ```toml
//! [cdn]
//! descriptor_url = "https://binaries.eveonline.com/eveclient_TQ.json"
//! request_timeout_secs = 60
//!
//! [rules]
//! reaction_groups = [1888, 1889, 1890, 4097]
//!
//! [rules.tech_overlays]
//! "2" = "res:/ui/texture/icons/73_16_242.png"
//! "14" = ""   # removes the badge for meta group 14
//! ```
//!
//! Keys that are left out keep their built-in value.

use crate::errors::CliError;
use camino::Utf8Path;
use icon_cache::CdnEndpoints;
use icon_export::BuildRules;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub cdn: CdnEndpoints,
    pub rules: RulesConfig,
}

/// Overrides for the classification tables.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct RulesConfig {
    pub blueprint_category: Option<u32>,
    pub relic_category: Option<u32>,
    pub skin_category: Option<u32>,
    pub skin_categories: Option<BTreeSet<u32>>,
    pub reaction_groups: Option<BTreeSet<u32>>,
    pub force_icon_groups: Option<BTreeSet<u32>>,
    pub default_meta_group: Option<u32>,
    pub skin_icon_template: Option<String>,
    /// Meta group (as a string, toml keys are strings) -> badge resource.
    /// An empty value removes the entry.
    pub tech_overlays: BTreeMap<String, String>,
}

impl RulesConfig {
    /// Apply the overrides on top of `rules`.
    pub fn apply(&self, mut rules: BuildRules) -> Result<BuildRules, CliError> {
        if let Some(category) = self.blueprint_category {
            rules.blueprint_category = category;
        }
        if let Some(category) = self.relic_category {
            rules.relic_category = category;
        }
        if let Some(category) = self.skin_category {
            rules.skin_category = category;
        }
        if let Some(categories) = &self.skin_categories {
            rules.skin_categories = categories.clone();
        }
        if let Some(groups) = &self.reaction_groups {
            rules.reaction_groups = groups.clone();
        }
        if let Some(groups) = &self.force_icon_groups {
            rules.force_icon_groups = groups.clone();
        }
        if let Some(meta_group) = self.default_meta_group {
            rules.default_meta_group = meta_group;
        }
        if let Some(template) = &self.skin_icon_template {
            rules.skin_icon_template = template.clone();
        }

        for (key, resource) in &self.tech_overlays {
            let meta_group: u32 = key.trim().parse().map_err(|_| {
                CliError::invalid_config(format!("tech overlay key '{key}' is not a meta group id"))
            })?;
            if resource.is_empty() {
                rules.tech_overlays.remove(&meta_group);
            } else {
                rules.tech_overlays.insert(meta_group, resource.clone());
            }
        }

        Ok(rules)
    }
}

/// Load the config file. Without a path the defaults are used.
pub fn load_config(path: Option<&Utf8Path>) -> Result<AppConfig, CliError> {
    let Some(path) = path else {
        return Ok(AppConfig::default());
    };

    if !path.as_std_path().exists() {
        return Err(CliError::ConfigNotFound {
            path: path.to_path_buf(),
        });
    }

    let content = std::fs::read_to_string(path.as_std_path())?;
    let config = toml::from_str(&content).map_err(|source| CliError::ConfigParse {
        path: path.to_path_buf(),
        source,
    })?;

    tracing::debug!("Loaded configuration from {}", path);
    Ok(config)
}
