//! OpenType Variations common structures
//!
//! These are shared between the tuple variation stores (`gvar`/`cvar`) and
//! the item variation stores used by `MVAR`, `HVAR`, `VVAR` and `GDEF`.

/// Item Variation Store (used in `MVAR`, `HVAR`, `VVAR`, `GDEF`)
mod itemvariationstore;
/// Utilities for Interpolation of Unreferenced Points
pub mod iup;
/// Structs to store locations and design-space regions
mod locations;
/// A tuple variation: a designspace region plus a delta payload
mod tuplevariation;

pub use itemvariationstore::{
    variation_index, ItemVariationData, ItemVariationStore, RegionAxisCoordinates,
};
pub use locations::{support_scalar, Location, Support};
pub use tuplevariation::{Delta, TupleVariation};
