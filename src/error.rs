use crate::types::Tag;
use thiserror::Error;

/// Everything that can go wrong while instancing a font.
///
/// All of these fail the transformation as a whole; recoverable
/// data-integrity problems (a malformed avar segment map, an unknown STAT
/// axis-value format) are logged instead and leave the offending record
/// unchanged.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    #[error("cannot limit '{0}': axis not present in fvar")]
    UnknownAxis(Tag),

    #[error("range minimum ({minimum:?}) must be <= maximum ({maximum:?})")]
    InvalidRange { minimum: f32, maximum: f32 },

    #[error("axis range values must be normalized to the -1..=1 range, got {minimum:?}..{maximum:?}")]
    RangeNotNormalized { minimum: f32, maximum: f32 },

    #[error("expected a normalized range straddling 0, got {minimum:?}..{maximum:?}")]
    RangeExcludesZero { minimum: f32, maximum: f32 },

    #[error("unsupported range {tag}={minimum:?}:{maximum:?}; the default position ({default:?}) must lie within the range")]
    RangeExcludesDefault {
        tag: Tag,
        minimum: f32,
        maximum: f32,
        default: f32,
    },

    #[error("missing required table {0}")]
    MissingTable(Tag),

    #[error("font has a 'gvar' table but no 'glyf' table")]
    GvarWithoutGlyf,

    #[error("instancing CFF2-flavoured variable fonts is not implemented")]
    Cff2Unsupported,

    #[error("invalid limit format: {0:?} (expected TAG=value, TAG=min:max or TAG=drop)")]
    InvalidLimit(String),

    #[error("multiple limits specified for axis '{0}'")]
    DuplicateLimit(Tag),
}

pub type Result<T> = std::result::Result<T, Error>;
