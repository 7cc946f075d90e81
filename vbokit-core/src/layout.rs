//! Interleaved vertex attribute layouts.
//!
//! A [`VertexLayout`] is an ordered list of [`AttributeLayout`]s with byte
//! offsets inside one vertex record and the record stride. Offsets are either
//! all assigned automatically (packed in declaration order) or all given
//! explicitly; mixing both is rejected.

use std::fmt;

use crate::error::{Error, Result};

/// Role of an attribute in the vertex record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Semantics {
    /// Opaque data the builder zero-fills
    String,
    Position,
    Normal,
    Color,
    TexCoord,
}

/// Scalar element type of an attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarType {
    F32,
    U8,
    U16,
    U32,
}

impl ScalarType {
    pub fn size(self) -> usize {
        match self {
            ScalarType::F32 | ScalarType::U32 => 4,
            ScalarType::U16 => 2,
            ScalarType::U8 => 1,
        }
    }

    /// Single-letter pack code (`f`, `B`, `H`, `I`)
    pub fn code(self) -> char {
        match self {
            ScalarType::F32 => 'f',
            ScalarType::U8 => 'B',
            ScalarType::U16 => 'H',
            ScalarType::U32 => 'I',
        }
    }

    /// Write `value` converted to this type into `out`, little-endian
    pub(crate) fn write(self, value: f32, out: &mut [u8]) {
        match self {
            ScalarType::F32 => out.copy_from_slice(&value.to_le_bytes()),
            ScalarType::U8 => out.copy_from_slice(&[value as u8]),
            ScalarType::U16 => out.copy_from_slice(&(value as u16).to_le_bytes()),
            ScalarType::U32 => out.copy_from_slice(&(value as u32).to_le_bytes()),
        }
    }
}

/// One attribute of an interleaved vertex
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttributeLayout {
    pub semantics: Semantics,
    pub value_type: ScalarType,
    pub elements: usize,
    /// Byte offset in the record; `None` until assigned
    pub offset: Option<usize>,
}

impl AttributeLayout {
    pub fn new(semantics: Semantics, value_type: ScalarType, elements: usize) -> Self {
        Self {
            semantics,
            value_type,
            elements,
            offset: None,
        }
    }

    /// Attribute pinned at an explicit byte offset
    pub fn at(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn size(&self) -> usize {
        self.value_type.size() * self.elements
    }

    pub fn pack_format(&self) -> String {
        format!("{}{}", self.elements, self.value_type.code())
    }

    /// Offset after layout resolution
    pub fn byte_offset(&self) -> usize {
        self.offset.unwrap_or(0)
    }
}

/// Validated attribute list with resolved offsets and stride
#[derive(Debug, Clone, PartialEq)]
pub struct VertexLayout {
    attributes: Vec<AttributeLayout>,
    stride: usize,
}

impl VertexLayout {
    /// Resolve offsets and use the packed size as stride
    pub fn new(attributes: Vec<AttributeLayout>) -> Result<Self> {
        Self::build(attributes, None)
    }

    /// Resolve offsets with a caller-chosen stride (e.g. a file record size)
    pub fn with_stride(attributes: Vec<AttributeLayout>, stride: usize) -> Result<Self> {
        Self::build(attributes, Some(stride))
    }

    fn build(mut attributes: Vec<AttributeLayout>, stride: Option<usize>) -> Result<Self> {
        if attributes.is_empty() {
            return Err(Error::layout("layout has no attributes"));
        }
        for a in &attributes {
            if a.elements == 0 {
                return Err(Error::layout(format!(
                    "{:?} attribute has zero elements",
                    a.semantics
                )));
            }
        }

        let explicit = attributes.iter().filter(|a| a.offset.is_some()).count();
        if explicit != 0 && explicit != attributes.len() {
            return Err(Error::layout(format!(
                "{} of {} attributes have explicit offsets; give all or none",
                explicit,
                attributes.len()
            )));
        }

        let packed: usize = attributes.iter().map(AttributeLayout::size).sum();
        if explicit == 0 {
            let mut offset = 0;
            for a in &mut attributes {
                a.offset = Some(offset);
                offset += a.size();
            }
        }

        let stride = stride.unwrap_or(packed);
        check_ranges(&attributes, stride)?;

        Ok(Self { attributes, stride })
    }

    pub fn attributes(&self) -> &[AttributeLayout] {
        &self.attributes
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Total scalar count of one vertex
    pub fn element_count(&self) -> usize {
        self.attributes.iter().map(|a| a.elements).sum()
    }

    pub fn find(&self, semantics: Semantics) -> Option<&AttributeLayout> {
        self.attributes.iter().find(|a| a.semantics == semantics)
    }

    /// Pack format of the whole record, e.g. `3f3f4f2f`
    pub fn pack_format(&self) -> String {
        self.attributes.iter().map(AttributeLayout::pack_format).collect()
    }
}

impl fmt::Display for VertexLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (stride {})", self.pack_format(), self.stride)
    }
}

/// Every attribute must sit inside the stride and not overlap another
fn check_ranges(attributes: &[AttributeLayout], stride: usize) -> Result<()> {
    let mut ranges = Vec::with_capacity(attributes.len());
    for a in attributes {
        let (start, end) = (a.byte_offset(), a.byte_offset() + a.size());
        if end > stride {
            return Err(Error::layout(format!(
                "{:?} attribute spans bytes {}..{} beyond stride {}",
                a.semantics, start, end, stride
            )));
        }
        ranges.push((start, end));
    }

    ranges.sort_unstable();
    for pair in ranges.windows(2) {
        if pair[1].0 < pair[0].1 {
            return Err(Error::layout(format!(
                "attributes overlap at bytes {}..{}",
                pair[1].0, pair[0].1
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pnt() -> Vec<AttributeLayout> {
        vec![
            AttributeLayout::new(Semantics::Position, ScalarType::F32, 3),
            AttributeLayout::new(Semantics::Normal, ScalarType::F32, 3),
            AttributeLayout::new(Semantics::TexCoord, ScalarType::F32, 2),
        ]
    }

    #[test]
    fn test_auto_offsets_and_stride() {
        let layout = VertexLayout::new(pnt()).unwrap();
        assert_eq!(layout.stride(), 32);
        let offsets: Vec<usize> = layout.attributes().iter().map(|a| a.byte_offset()).collect();
        assert_eq!(offsets, vec![0, 12, 24]);
        assert_eq!(layout.element_count(), 8);
        assert_eq!(layout.pack_format(), "3f3f2f");
    }

    #[test]
    fn test_explicit_offsets_are_kept() {
        let attributes = vec![
            AttributeLayout::new(Semantics::Position, ScalarType::F32, 3).at(0),
            AttributeLayout::new(Semantics::Normal, ScalarType::F32, 3).at(12),
            AttributeLayout::new(Semantics::TexCoord, ScalarType::F32, 2).at(24),
        ];
        let layout = VertexLayout::with_stride(attributes, 38).unwrap();
        assert_eq!(layout.stride(), 38);
        assert_eq!(layout.attributes()[2].offset, Some(24));
    }

    #[test]
    fn test_mixed_offsets_rejected() {
        let mut attributes = pnt();
        attributes[1].offset = Some(16);
        assert!(matches!(
            VertexLayout::new(attributes),
            Err(Error::LayoutMismatch(_))
        ));
    }

    #[test]
    fn test_attribute_beyond_stride_rejected() {
        assert!(VertexLayout::with_stride(pnt(), 30).is_err());
    }

    #[test]
    fn test_overlap_rejected() {
        let attributes = vec![
            AttributeLayout::new(Semantics::Position, ScalarType::F32, 3).at(0),
            AttributeLayout::new(Semantics::Normal, ScalarType::F32, 3).at(8),
        ];
        assert!(VertexLayout::new(attributes).is_err());
    }

    #[test]
    fn test_type_sizes() {
        assert_eq!(ScalarType::U8.size(), 1);
        assert_eq!(ScalarType::U16.size(), 2);
        assert_eq!(
            AttributeLayout::new(Semantics::Color, ScalarType::U8, 4).size(),
            4
        );
        assert_eq!(
            AttributeLayout::new(Semantics::Color, ScalarType::U8, 4).pack_format(),
            "4B"
        );
    }
}
