//! Lookup tables that steer item classification.
//!
//! Nothing here is global: the engine receives a [`BuildRules`] at construction so
//! tests can run against small fixtures and deployments can override single
//! entries from the config file. [`BuildRules::default`] is the production table.

use crate::data::{CategoryId, GroupId, MetaGroupId};
use std::collections::{BTreeMap, BTreeSet};

/// Background and overlay art used by the blueprint-style composites.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlueprintArt {
    pub bpo_background: String,
    pub bpo_overlay: String,
    pub bpc_background: String,
    pub bpc_overlay: String,
    pub reaction_background: String,
    pub relic_background: String,
    pub relic_overlay: String,
}

impl Default for BlueprintArt {
    fn default() -> Self {
        Self {
            bpo_background: "res:/ui/texture/icons/bpo.png".to_string(),
            bpo_overlay: "res:/ui/texture/icons/bpo_overlay.png".to_string(),
            bpc_background: "res:/ui/texture/icons/bpc.png".to_string(),
            bpc_overlay: "res:/ui/texture/icons/bpc_overlay.png".to_string(),
            reaction_background: "res:/ui/texture/icons/reaction.png".to_string(),
            relic_background: "res:/ui/texture/icons/relic.png".to_string(),
            relic_overlay: "res:/ui/texture/icons/relic_overlay.png".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildRules {
    /// Category of manufacturing and reaction blueprints.
    pub blueprint_category: CategoryId,
    /// Category of relics (ancient blueprints), also handled by the blueprint path.
    pub relic_category: CategoryId,
    /// Category whose items get icons from their skin material.
    pub skin_category: CategoryId,
    /// Categories dropped when skins are skipped.
    pub skin_categories: BTreeSet<CategoryId>,
    /// Blueprint groups composited onto the reaction background.
    pub reaction_groups: BTreeSet<GroupId>,
    /// Groups that have 3D graphics but should still use their 2D icon.
    pub force_icon_groups: BTreeSet<GroupId>,
    /// Meta group -> tech badge resource. Meta groups without an entry get no badge.
    pub tech_overlays: BTreeMap<MetaGroupId, String>,
    /// Meta group assumed when an item has none.
    pub default_meta_group: MetaGroupId,
    /// Skin icon path, `{material}` is replaced by the material id.
    pub skin_icon_template: String,
    pub art: BlueprintArt,
}

impl Default for BuildRules {
    fn default() -> Self {
        let tech_overlays = [
            (2, "res:/ui/texture/icons/73_16_242.png"),
            (3, "res:/ui/texture/icons/73_16_245.png"),
            (4, "res:/ui/texture/icons/73_16_246.png"),
            (5, "res:/ui/texture/icons/73_16_248.png"),
            (6, "res:/ui/texture/icons/73_16_247.png"),
            (14, "res:/ui/texture/icons/73_16_243.png"),
            (15, "res:/ui/texture/icons/itemoverlay/abyssal.png"),
            (17, "res:/ui/texture/icons/itemoverlay/nes.png"),
            (19, "res:/ui/texture/icons/itemoverlay/timelimited.png"),
            (52, "res:/ui/texture/shared/structureoverlayfaction.png"),
            (53, "res:/ui/texture/shared/structureoverlayt2.png"),
            (54, "res:/ui/texture/shared/structureoverlay.png"),
        ]
        .into_iter()
        .map(|(id, path)| (id, path.to_string()))
        .collect();

        Self {
            blueprint_category: 9,
            relic_category: 34,
            skin_category: 91,
            skin_categories: [91, 2118].into_iter().collect(),
            reaction_groups: [1888, 1889, 1890, 4097].into_iter().collect(),
            force_icon_groups: [12, 340, 448, 479, 548, 649, 711, 4168].into_iter().collect(),
            tech_overlays,
            default_meta_group: 1,
            skin_icon_template: "res:/ui/texture/classes/skins/icons/{material}.png".to_string(),
            art: BlueprintArt::default(),
        }
    }
}

impl BuildRules {
    /// Tech badge for an item's meta group, if it has one.
    pub fn tech_overlay(&self, meta_group: Option<MetaGroupId>) -> Option<&str> {
        self.tech_overlays
            .get(&meta_group.unwrap_or(self.default_meta_group))
            .map(String::as_str)
    }

    /// Whether the category goes through blueprint classification.
    pub fn is_blueprint_like(&self, category: CategoryId) -> bool {
        category == self.blueprint_category || category == self.relic_category
    }

    pub fn is_relic(&self, category: CategoryId) -> bool {
        category == self.relic_category
    }

    pub fn is_reaction(&self, group: GroupId) -> bool {
        self.reaction_groups.contains(&group)
    }

    pub fn forces_icon(&self, group: GroupId) -> bool {
        self.force_icon_groups.contains(&group)
    }

    pub fn skin_icon(&self, material: u32) -> String {
        self.skin_icon_template
            .replace("{material}", &material.to_string())
    }

    pub fn is_skin_category(&self, category: CategoryId) -> bool {
        self.skin_categories.contains(&category)
    }

    /// Texture paths derived from a graphic folder.
    pub fn graphic_texture(folder: &str, graphic_id: u32, suffix: &str) -> String {
        format!("{folder}/{graphic_id}_{suffix}")
    }
}
