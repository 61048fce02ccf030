/// Byte/word order used when splitting a [`crate::Cell`] into chunks or
/// recomposing chunks into a wider cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Endianess {
    Big,
    Little,
}
