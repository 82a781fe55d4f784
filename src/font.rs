//! Font descriptors, trait-union transforms and text measurement.
//!
//! A [`Font`] is a descriptor, not a loaded face: family name, point
//! size and a set of style traits. Transforms produce new descriptors
//! that add a trait while keeping the ones already present, which is
//! what nested inline styling needs (bold inside italic, either inside
//! code). Measurement is an injected capability so hosts with real font
//! metrics can supply their own.

use bitflags::bitflags;
use unicode_width::UnicodeWidthStr;

bitflags! {
    /// Style traits carried by a font descriptor.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct FontTraits: u8 {
        const BOLD = 1;
        const ITALIC = 1 << 1;
        const MONOSPACE = 1 << 2;
        const LIGHT = 1 << 3;
    }
}

/// A font descriptor: family, point size and style traits.
#[derive(Debug, Clone, PartialEq)]
pub struct Font {
    pub family: String,
    pub size: f32,
    pub traits: FontTraits,
}

impl Font {
    pub fn new(family: impl Into<String>, size: f32) -> Self {
        Self {
            family: family.into(),
            size,
            traits: FontTraits::empty(),
        }
    }

    /// A monospaced font descriptor.
    pub fn monospace(family: impl Into<String>, size: f32) -> Self {
        Self {
            family: family.into(),
            size,
            traits: FontTraits::MONOSPACE,
        }
    }

    /// Add the italic trait, keeping all other traits and the size.
    pub fn italic(&self) -> Self {
        Self {
            traits: self.traits | FontTraits::ITALIC,
            ..self.clone()
        }
    }

    /// Add the bold trait, keeping all other traits and the size.
    ///
    /// Bold and light are mutually exclusive: a light font is
    /// normalized before the bold trait is added.
    pub fn bold(&self) -> Self {
        Self {
            traits: (self.traits - FontTraits::LIGHT) | FontTraits::BOLD,
            ..self.clone()
        }
    }

    /// Bold at an explicit size, discarding the prior size.
    pub fn bold_sized(&self, size: f32) -> Self {
        let mut font = self.bold();
        font.size = size;
        font
    }

    /// Same descriptor at a different size.
    pub fn sized(&self, size: f32) -> Self {
        Self {
            size,
            ..self.clone()
        }
    }

    pub fn is_bold(&self) -> bool {
        self.traits.contains(FontTraits::BOLD)
    }

    pub fn is_italic(&self) -> bool {
        self.traits.contains(FontTraits::ITALIC)
    }

    pub fn is_monospace(&self) -> bool {
        self.traits.contains(FontTraits::MONOSPACE)
    }
}

/// Text measurement capability: the rendered width of a run in points.
pub trait TextMeasurer {
    fn width(&self, text: &str, font: &Font) -> f32;
}

/// Deterministic default measurer.
///
/// Treats every display column as half the point size, which keeps list
/// margin arithmetic stable without loading any font data. Wide (CJK)
/// graphemes count as two columns.
#[derive(Debug, Clone, Copy, Default)]
pub struct CharCellMetrics;

impl TextMeasurer for CharCellMetrics {
    fn width(&self, text: &str, font: &Font) -> f32 {
        let columns = if text.is_ascii() {
            text.chars().filter(|&c| c != '\n' && c != '\r').count()
        } else {
            text.width()
        };
        columns as f32 * (font.size / 2.0)
    }
}
