//! Icon variants and the naming rules attached to them.
//!
//! Every naming decision goes through this module:
//!
//! | kind | name tag | extension | archive entry | web link |
//! |------|----------|-----------|---------------|----------|
//! | `icon` | | `png` | `{id}_64.png` | `{id}_icon.png` |
//! | `bp` | `bp;` | `png` | | `{id}_bp.png` |
//! | `bpc` | `bpc;` | `png` | `{id}_bpc_64.png` | `{id}_bpc.png` |
//! | `reaction` | `reaction;` | `png` | | `{id}_reaction.png` |
//! | `relic` | `relic;` | `png` | | `{id}_relic.png` |
//! | `render` | | `jpg` | `{id}_512.jpg` | `{id}_render.jpg` |
//!
//! A derived filename is the name tag followed by the content hashes of the source
//! resources joined with `;`, then the extension. The same sources therefore always
//! produce the same filename, whichever item asked for it.

use crate::data::TypeId;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum IconKind {
    #[serde(rename = "icon")]
    Icon,
    #[serde(rename = "bp")]
    Blueprint,
    #[serde(rename = "bpc")]
    BlueprintCopy,
    #[serde(rename = "reaction")]
    Reaction,
    #[serde(rename = "relic")]
    Relic,
    #[serde(rename = "render")]
    Render,
}

impl IconKind {
    pub const ALL: [IconKind; 6] = [
        IconKind::Icon,
        IconKind::Blueprint,
        IconKind::BlueprintCopy,
        IconKind::Reaction,
        IconKind::Relic,
        IconKind::Render,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            IconKind::Icon => "icon",
            IconKind::Blueprint => "bp",
            IconKind::BlueprintCopy => "bpc",
            IconKind::Reaction => "reaction",
            IconKind::Relic => "relic",
            IconKind::Render => "render",
        }
    }

    /// Prefix distinguishing composites that share source hashes.
    fn name_tag(self) -> Option<&'static str> {
        match self {
            IconKind::Icon | IconKind::Render => None,
            IconKind::Blueprint => Some("bp"),
            IconKind::BlueprintCopy => Some("bpc"),
            IconKind::Reaction => Some("reaction"),
            IconKind::Relic => Some("relic"),
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            IconKind::Render => "jpg",
            _ => "png",
        }
    }

    /// Content-addressed filename for this kind built from source hashes.
    pub fn derived_filename<S: AsRef<str>>(self, source_hashes: &[S]) -> String {
        let mut parts: Vec<&str> = Vec::with_capacity(source_hashes.len() + 1);
        if let Some(tag) = self.name_tag() {
            parts.push(tag);
        }
        parts.extend(source_hashes.iter().map(AsRef::as_ref));
        format!("{}.{}", parts.join(";"), self.extension())
    }

    /// Entry name in the convention archive, `None` for kinds it leaves out.
    pub fn archive_name(self, type_id: TypeId) -> Option<String> {
        match self {
            IconKind::Icon => Some(format!("{type_id}_64.png")),
            IconKind::BlueprintCopy => Some(format!("{type_id}_bpc_64.png")),
            IconKind::Render => Some(format!("{type_id}_512.jpg")),
            _ => None,
        }
    }

    /// Link file name in the web directory.
    pub fn link_name(self, type_id: TypeId) -> String {
        format!("{}_{}.{}", type_id, self.as_str(), self.extension())
    }
}

impl fmt::Display for IconKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
