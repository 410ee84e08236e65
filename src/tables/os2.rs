/// Represents a font's OS/2 (OS/2 and Windows Metrics) table
///
/// Only the fields touched by instancing are modelled: the class fields set
/// from a pinned `wght`/`wdth` location, and the metrics the `MVAR` table
/// can address.
#[derive(Debug, PartialEq, Clone, Default)]
pub struct os2 {
    pub usWeightClass: u16,
    pub usWidthClass: u16,
    pub sTypoAscender: i16,
    pub sTypoDescender: i16,
    pub sTypoLineGap: i16,
    pub usWinAscent: u16,
    pub usWinDescent: u16,
    pub sxHeight: i16,
    pub sCapHeight: i16,
    pub ySubscriptXSize: i16,
    pub ySubscriptYSize: i16,
    pub ySubscriptXOffset: i16,
    pub ySubscriptYOffset: i16,
    pub ySuperscriptXSize: i16,
    pub ySuperscriptYSize: i16,
    pub ySuperscriptXOffset: i16,
    pub ySuperscriptYOffset: i16,
    pub yStrikeoutSize: i16,
    pub yStrikeoutPosition: i16,
}
