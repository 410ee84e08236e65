/// Represents a font's post (PostScript) table
#[derive(Debug, PartialEq, Clone, Default)]
pub struct post {
    pub italicAngle: f32,
    pub underlinePosition: i16,
    pub underlineThickness: i16,
}
