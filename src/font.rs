use crate::tables;
use crate::types::Tag;
use std::collections::BTreeMap;

/// One of the tables the instancer knows how to transform, or `Unknown` for
/// anything else (carried through untouched as raw bytes)
#[derive(Debug, PartialEq, Clone)]
pub enum Table {
    Avar(tables::avar::avar),
    Cvar(tables::cvar::cvar),
    Cvt(tables::cvt::cvt),
    Fvar(tables::fvar::fvar),
    Gdef(tables::GDEF::GDEF),
    Glyf(tables::glyf::glyf),
    Gpos(tables::layout::LayoutTable),
    Gsub(tables::layout::LayoutTable),
    Gvar(tables::gvar::gvar),
    Hhea(tables::hhea::hhea),
    Hmtx(tables::hmtx::hmtx),
    Hvar(tables::HVAR::HVAR),
    Mvar(tables::MVAR::MVAR),
    Name(tables::name::name),
    Os2(tables::os2::os2),
    Post(tables::post::post),
    Stat(tables::STAT::STAT),
    Vhea(tables::vhea::vhea),
    Vmtx(tables::hmtx::vmtx),
    Vvar(tables::VVAR::VVAR),
    Unknown(Vec<u8>),
}

/// An OpenType font: a map of table tags to tables
///
/// The font is the unit of ownership for an instancing run; cloning it
/// produces a fully independent deep copy.
#[derive(Debug, PartialEq, Clone, Default)]
pub struct Font {
    pub tables: BTreeMap<Tag, Table>,
}

macro_rules! table_accessors {
    ($(($getter:ident, $getter_mut:ident, $tag:literal, $variant:ident, $ty:ty)),* $(,)?) => {
        impl Font {
            $(
                #[doc = concat!("The font's `", $tag, "` table, if present.")]
                pub fn $getter(&self) -> Option<&$ty> {
                    match self.tables.get(&crate::tag!($tag)) {
                        Some(Table::$variant(table)) => Some(table),
                        _ => None,
                    }
                }

                pub fn $getter_mut(&mut self) -> Option<&mut $ty> {
                    match self.tables.get_mut(&crate::tag!($tag)) {
                        Some(Table::$variant(table)) => Some(table),
                        _ => None,
                    }
                }
            )*
        }
    };
}

table_accessors!(
    (avar, avar_mut, "avar", Avar, tables::avar::avar),
    (cvar, cvar_mut, "cvar", Cvar, tables::cvar::cvar),
    (cvt, cvt_mut, "cvt ", Cvt, tables::cvt::cvt),
    (fvar, fvar_mut, "fvar", Fvar, tables::fvar::fvar),
    (gdef, gdef_mut, "GDEF", Gdef, tables::GDEF::GDEF),
    (glyf, glyf_mut, "glyf", Glyf, tables::glyf::glyf),
    (gpos, gpos_mut, "GPOS", Gpos, tables::layout::LayoutTable),
    (gsub, gsub_mut, "GSUB", Gsub, tables::layout::LayoutTable),
    (gvar, gvar_mut, "gvar", Gvar, tables::gvar::gvar),
    (hhea, hhea_mut, "hhea", Hhea, tables::hhea::hhea),
    (hmtx, hmtx_mut, "hmtx", Hmtx, tables::hmtx::hmtx),
    (hvar, hvar_mut, "HVAR", Hvar, tables::HVAR::HVAR),
    (mvar, mvar_mut, "MVAR", Mvar, tables::MVAR::MVAR),
    (name, name_mut, "name", Name, tables::name::name),
    (os2, os2_mut, "OS/2", Os2, tables::os2::os2),
    (post, post_mut, "post", Post, tables::post::post),
    (stat, stat_mut, "STAT", Stat, tables::STAT::STAT),
    (vhea, vhea_mut, "vhea", Vhea, tables::vhea::vhea),
    (vmtx, vmtx_mut, "vmtx", Vmtx, tables::hmtx::vmtx),
    (vvar, vvar_mut, "VVAR", Vvar, tables::VVAR::VVAR),
);

impl Font {
    pub fn new() -> Self {
        Font {
            tables: BTreeMap::new(),
        }
    }

    pub fn contains(&self, tag: Tag) -> bool {
        self.tables.contains_key(&tag)
    }

    pub fn insert(&mut self, tag: Tag, table: Table) -> Option<Table> {
        self.tables.insert(tag, table)
    }

    pub fn remove(&mut self, tag: Tag) -> Option<Table> {
        self.tables.remove(&tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tag;

    #[test]
    fn test_typed_accessors() {
        let mut font = Font::new();
        font.insert(tag!("fvar"), Table::Fvar(Default::default()));
        assert!(font.fvar().is_some());
        assert!(font.gvar().is_none());
        assert!(font.contains(tag!("fvar")));
        font.fvar_mut().unwrap().axes.clear();
        font.remove(tag!("fvar"));
        assert!(!font.contains(tag!("fvar")));
    }
}
