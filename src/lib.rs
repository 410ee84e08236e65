//! Fully or partially instance an OpenType variable font.
//!
//! A variable font packs a whole family of designs into one file: the glyph
//! outlines, metrics and layout values of the default instance, plus sets of
//! *deltas* that are interpolated across the font's design space. This crate
//! takes such a font, already parsed into the in-memory model in
//! [`tables`], and *instances* it: each axis may be pinned to a single
//! coordinate, restricted to a sub-range, or left alone.
//!
//! Pinning every axis produces a static font; pinning or restricting only
//! some of them produces a smaller variable font whose remaining design
//! space behaves exactly like the corresponding slice of the original.
//!
//! ```no_run
//! use fontinstancer::instancer::{instantiate_variable_font, Options, UserAxisLimits};
//! # let mut font = fontinstancer::font::Font::new();
//! let limits = UserAxisLimits::parse(&["wght=400:700", "wdth=85"])?;
//! instantiate_variable_font(&mut font, limits, &Options::default())?;
//! # Ok::<(), fontinstancer::error::Error>(())
//! ```
//!
//! Reading and writing the binary tables is left to the caller; this crate
//! only transforms the in-memory representation.

#![allow(non_camel_case_types, non_snake_case)]

pub mod error;
/// The font object: a map of table tags to tables
pub mod font;
/// The instancer itself
pub mod instancer;
/// Data models for the OpenType tables the instancer touches
pub mod tables;
/// OpenType tags and fixed-point number handling
pub mod types;

/// OpenType Variations common tables
pub mod otvar;

pub use crate::error::{Error, Result};
pub use crate::font::{Font, Table};
pub use crate::instancer::{instantiate_variable_font, instantiated, Options};
