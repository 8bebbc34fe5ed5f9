// Asset id -> structures claiming it.
//
// The index is rebuilt from scratch whenever the catalog changes and never
// patched in place. When several structures claim the same asset, entries keep
// catalog order and the first one is the primary match: it alone decides the
// feature's color.

use std::collections::HashMap;
use std::sync::Arc;

use crate::geojson_features::Feature;
use crate::structures::{Member, Structure};

/// A structure together with the member entry that named the asset. Both are
/// borrowed from the shared structure, never copied.
#[derive(Clone, Debug)]
pub struct Membership {
    pub structure: Arc<Structure>,
    member_pos: usize,
}

impl Membership {
    pub fn member(&self) -> &Member {
        &self.structure.members[self.member_pos]
    }
}

#[derive(Clone, Debug, Default)]
pub struct MemberIndex {
    entries: HashMap<String, Vec<Membership>>,
}

impl MemberIndex {
    pub fn build(structures: &[Arc<Structure>]) -> MemberIndex {
        let mut entries: HashMap<String, Vec<Membership>> = HashMap::new();
        for structure in structures {
            for (member_pos, member) in structure.members.iter().enumerate() {
                let Some(asset_id) = member.asset_id() else {
                    continue;
                };
                entries.entry(asset_id).or_default().push(Membership {
                    structure: Arc::clone(structure),
                    member_pos,
                });
            }
        }
        MemberIndex { entries }
    }

    pub fn lookup(&self, asset_id: &str) -> &[Membership] {
        self.entries
            .get(asset_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn matches(&self, feature: &Feature, id_fields: &[String]) -> &[Membership] {
        match feature.asset_id(id_fields) {
            Some(asset_id) => self.lookup(&asset_id),
            None => &[],
        }
    }

    /// First structure (catalog order) claiming the feature's asset.
    pub fn primary_match(&self, feature: &Feature, id_fields: &[String]) -> Option<&Membership> {
        self.matches(feature, id_fields).first()
    }

    /// Whether any structure claiming the feature's asset has `structure_id`,
    /// not just the primary one.
    pub fn is_member_of(&self, feature: &Feature, id_fields: &[String], structure_id: &str) -> bool {
        self.matches(feature, id_fields)
            .iter()
            .any(|m| m.structure.is(structure_id))
    }

    /// Number of distinct asset ids claimed by at least one structure.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
