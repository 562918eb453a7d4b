//! Read-only catalog view consumed by the build.
//!
//! The catalog loader lives outside this crate; it hands over an [`IconBuildData`]
//! that is never mutated here. The struct deserializes from JSON so a loader can be
//! as simple as dumping its tables:
//!
//! ```json
//! {
//!   "types": { "587": { "groupId": 25, "iconId": 7, "graphicId": 46, "metaGroupId": 1 } },
//!   "groupCategories": { "25": 6 },
//!   "iconFiles": { "7": "res:/ui/texture/icons/7_64_1.png" },
//!   "graphicsFolders": { "46": "res:/dx9/model/ship/minmatar/frigate/mf1" },
//!   "skinMaterials": {}
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

pub type TypeId = u32;
pub type GroupId = u32;
pub type CategoryId = u32;
pub type IconId = u32;
pub type GraphicId = u32;
pub type MetaGroupId = u32;

/// Icon-relevant columns of one item type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeInfo {
    pub group_id: GroupId,
    #[serde(default)]
    pub icon_id: Option<IconId>,
    #[serde(default)]
    pub graphic_id: Option<GraphicId>,
    #[serde(default)]
    pub meta_group_id: Option<MetaGroupId>,
}

/// Catalog tables the icon build reads.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IconBuildData {
    /// Item type -> group, icon, graphic and meta group.
    pub types: BTreeMap<TypeId, TypeInfo>,
    /// Group -> category.
    pub group_categories: HashMap<GroupId, CategoryId>,
    /// Icon id -> logical resource path.
    pub icon_files: BTreeMap<IconId, String>,
    /// Graphic id -> texture folder (logical path prefix).
    pub graphics_folders: HashMap<GraphicId, String>,
    /// SKIN type -> material id.
    pub skin_materials: HashMap<TypeId, u32>,
}

impl IconBuildData {
    pub fn category_of(&self, group_id: GroupId) -> Option<CategoryId> {
        self.group_categories.get(&group_id).copied()
    }

    pub fn icon_file(&self, icon_id: Option<IconId>) -> Option<&str> {
        icon_id
            .and_then(|id| self.icon_files.get(&id))
            .map(String::as_str)
    }

    /// Graphic id with its texture folder, trailing slashes removed.
    pub fn graphic_folder(&self, graphic_id: Option<GraphicId>) -> Option<(GraphicId, &str)> {
        let id = graphic_id?;
        let folder = self.graphics_folders.get(&id)?;
        Some((id, folder.trim_end_matches('/')))
    }
}
