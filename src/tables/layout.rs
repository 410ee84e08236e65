use crate::types::Tag;
use std::collections::{BTreeMap, BTreeSet};

/// An adjustment to a glyph's placement and advance
///
/// Each present field may carry a VariationIndex into the GDEF variation
/// store, standing where a static font would put a device table.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ValueRecord {
    pub xPlacement: Option<i16>,
    pub yPlacement: Option<i16>,
    pub xAdvance: Option<i16>,
    pub yAdvance: Option<i16>,
    pub xPlacementVariation: Option<u32>,
    pub yPlacementVariation: Option<u32>,
    pub xAdvanceVariation: Option<u32>,
    pub yAdvanceVariation: Option<u32>,
}

/// An attachment point, optionally varied through the GDEF variation store
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Anchor {
    pub xCoordinate: i16,
    pub yCoordinate: i16,
    pub xVariation: Option<u32>,
    pub yVariation: Option<u32>,
}

/// The payload of one lookup subtable
#[derive(Debug, Clone, PartialEq)]
pub enum LookupSubtable {
    /// A single-substitution mapping (GSUB lookup type 1).
    SingleSubst(BTreeMap<String, String>),
    /// Single-glyph positioning adjustments (GPOS lookup type 1).
    SinglePos(BTreeMap<String, ValueRecord>),
    /// Cursive entry/exit attachment (GPOS lookup type 3).
    CursivePos(BTreeMap<String, (Option<Anchor>, Option<Anchor>)>),
}

/// A layout lookup
#[derive(Debug, Clone, PartialEq)]
pub struct Lookup {
    pub lookup_type: u16,
    pub flags: u16,
    pub subtables: Vec<LookupSubtable>,
}

/// The list of lookups a feature applies
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FeatureTable {
    pub lookup_indices: Vec<u16>,
}

/// A feature record: a tag plus the feature table it selects
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRecord {
    pub featureTag: Tag,
    pub feature: FeatureTable,
}

/// One condition within a feature-variation record's condition set
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// Format 1: the location on one axis must fall within a range.
    Format1 {
        axis_index: u16,
        filter_range_min_value: f32,
        filter_range_max_value: f32,
    },
    /// A format this library does not understand; preserved untouched.
    Unsupported { format: u16 },
}

/// The substitution half of a feature-variation record: replacement feature
/// tables for the given feature indices
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureTableSubstitution {
    pub version: u32,
    pub substitutions: Vec<(u16, FeatureTable)>,
}

/// A feature-variation record: while all conditions hold, the substitutions
/// apply
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVariationRecord {
    pub condition_set: Vec<Condition>,
    pub substitution: FeatureTableSubstitution,
}

/// Shared model of the GSUB and GPOS tables
///
/// Scripts are not modelled; every feature in the feature list is considered
/// reachable.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LayoutTable {
    pub features: Vec<FeatureRecord>,
    pub lookups: Vec<Lookup>,
    pub feature_variations: Option<Vec<FeatureVariationRecord>>,
}

impl LayoutTable {
    /// Drop lookups no longer reachable from any feature (including the
    /// alternate feature tables inside feature variations), renumbering the
    /// survivors.
    pub fn prune_lookups(&mut self) {
        let mut referenced: BTreeSet<u16> = BTreeSet::new();
        for feature in &self.features {
            referenced.extend(feature.feature.lookup_indices.iter().copied());
        }
        if let Some(records) = &self.feature_variations {
            for record in records {
                for (_, feature) in &record.substitution.substitutions {
                    referenced.extend(feature.lookup_indices.iter().copied());
                }
            }
        }

        let mut new_index: BTreeMap<u16, u16> = BTreeMap::new();
        for (new, old) in referenced.iter().enumerate() {
            new_index.insert(*old, new as u16);
        }
        self.lookups = self
            .lookups
            .iter()
            .enumerate()
            .filter(|(ix, _)| referenced.contains(&(*ix as u16)))
            .map(|(_, lookup)| lookup.clone())
            .collect();

        let remap = |indices: &mut Vec<u16>| {
            for ix in indices.iter_mut() {
                *ix = new_index[ix];
            }
        };
        for feature in self.features.iter_mut() {
            remap(&mut feature.feature.lookup_indices);
        }
        if let Some(records) = self.feature_variations.as_mut() {
            for record in records.iter_mut() {
                for (_, feature) in record.substitution.substitutions.iter_mut() {
                    remap(&mut feature.lookup_indices);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tag;

    fn lookup() -> Lookup {
        Lookup {
            lookup_type: 1,
            flags: 0,
            subtables: vec![],
        }
    }

    #[test]
    fn test_prune_lookups() {
        let mut table = LayoutTable {
            features: vec![FeatureRecord {
                featureTag: tag!("liga"),
                feature: FeatureTable {
                    lookup_indices: vec![2],
                },
            }],
            lookups: vec![lookup(), lookup(), lookup(), lookup()],
            feature_variations: Some(vec![FeatureVariationRecord {
                condition_set: vec![],
                substitution: FeatureTableSubstitution {
                    version: 0x00010000,
                    substitutions: vec![(
                        0,
                        FeatureTable {
                            lookup_indices: vec![3],
                        },
                    )],
                },
            }]),
        };
        table.prune_lookups();
        assert_eq!(table.lookups.len(), 2);
        assert_eq!(table.features[0].feature.lookup_indices, vec![0]);
        let records = table.feature_variations.as_ref().unwrap();
        assert_eq!(records[0].substitution.substitutions[0].1.lookup_indices, vec![1]);
    }
}
