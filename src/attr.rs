//! Attribute values and the attributed-text run buffer.
//!
//! An [`AttributedText`] is an ordered sequence of runs, each a substring
//! with one [`Attributes`] set. Ranges are byte offsets into the
//! concatenated plain text and must lie on `char` boundaries; every range
//! handed out by the buffer itself satisfies that. Adjacent runs with
//! equal attributes coalesce, so a run is always the maximal substring
//! sharing one attribute set.

use std::fmt;
use std::ops::Range;

use serde::Deserialize;
use serde::de;
use smallvec::SmallVec;

use crate::font::Font;
use crate::kind::MarkdownKind;

/// RGBA color with normalized 0.0-1.0 components.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self::new(r, g, b, 1.0)
    }

    pub fn from_rgb_u8(r: u8, g: u8, b: u8) -> Self {
        Self::new(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0, 1.0)
    }

    /// Parse `#RGB` or `#RRGGBB`; the leading `#` is optional.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim_start_matches('#');
        match hex.len() {
            3 => {
                let r = u8::from_str_radix(&hex[0..1].repeat(2), 16).ok()?;
                let g = u8::from_str_radix(&hex[1..2].repeat(2), 16).ok()?;
                let b = u8::from_str_radix(&hex[2..3].repeat(2), 16).ok()?;
                Some(Self::from_rgb_u8(r, g, b))
            }
            6 => {
                let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
                let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
                let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
                Some(Self::from_rgb_u8(r, g, b))
            }
            _ => None,
        }
    }

    pub const BLACK: Self = Self::rgb(0.0, 0.0, 0.0);
    pub const GRAY: Self = Self::rgb(0.5, 0.5, 0.5);
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: de::Deserializer<'de>,
    {
        let hex = String::deserialize(deserializer)?;
        Color::from_hex(&hex)
            .ok_or_else(|| de::Error::custom(format!("invalid hex color: {hex:?}")))
    }
}

/// How a host typesetting layer should break lines in a paragraph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineBreakMode {
    #[default]
    WordWrapping,
    CharWrapping,
    Clipping,
}

/// A left-aligned tab stop, in points from the leading margin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TabStop {
    pub location: f32,
}

/// Paragraph layout: spacing, indentation and tab geometry.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParagraphStyle {
    pub spacing_before: f32,
    pub spacing_after: f32,
    /// Left margin for every line after the first (hang indent).
    pub head_indent: f32,
    /// Left margin for the first line only.
    pub first_line_head_indent: f32,
    pub tab_stops: Vec<TabStop>,
    pub line_break: LineBreakMode,
}

impl ParagraphStyle {
    /// The same geometry shifted right by `amount`: both indents and
    /// every tab stop move. Used to re-seat a nested list inside the
    /// content column of its containing list.
    pub fn indented_by(&self, amount: f32) -> Self {
        Self {
            head_indent: self.head_indent + amount,
            first_line_head_indent: self.first_line_head_indent + amount,
            tab_stops: self
                .tab_stops
                .iter()
                .map(|t| TabStop {
                    location: t.location + amount,
                })
                .collect(),
            ..self.clone()
        }
    }
}

/// The attribute set carried by one run.
///
/// `font`, `color` and `paragraph` are optional so that a parent node
/// can fill in only what a child has not already claimed; the finished
/// document resolves any remainder to the base style.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Attributes {
    pub kind: MarkdownKind,
    pub font: Option<Font>,
    pub color: Option<Color>,
    pub paragraph: Option<ParagraphStyle>,
    pub link: Option<String>,
}

/// One maximal substring sharing a single attribute set.
#[derive(Debug, Clone, PartialEq)]
pub struct Run {
    pub text: String,
    pub attrs: Attributes,
}

/// The attributed-text buffer: ordered runs, built incrementally.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttributedText {
    runs: SmallVec<[Run; 4]>,
}

impl AttributedText {
    pub fn new() -> Self {
        Self::default()
    }

    /// A buffer holding one run.
    pub fn run(text: impl Into<String>, attrs: Attributes) -> Self {
        let mut buf = Self::new();
        buf.push(text, attrs);
        buf
    }

    /// A buffer holding one unattributed run.
    pub fn plain(text: impl Into<String>) -> Self {
        Self::run(text, Attributes::default())
    }

    /// Append a run, coalescing with the tail when attributes match.
    pub fn push(&mut self, text: impl Into<String>, attrs: Attributes) {
        let text = text.into();
        if text.is_empty() {
            return;
        }
        match self.runs.last_mut() {
            Some(last) if last.attrs == attrs => last.text.push_str(&text),
            _ => self.runs.push(Run { text, attrs }),
        }
    }

    /// Insert a run at the start of the buffer.
    pub fn insert_front(&mut self, text: impl Into<String>, attrs: Attributes) {
        let text = text.into();
        if text.is_empty() {
            return;
        }
        match self.runs.first_mut() {
            Some(first) if first.attrs == attrs => first.text.insert_str(0, &text),
            _ => self.runs.insert(0, Run { text, attrs }),
        }
    }

    /// Append another buffer, coalescing at the seam. The empty buffer
    /// is the identity of this operation.
    pub fn extend(&mut self, other: AttributedText) {
        for run in other.runs {
            self.push(run.text, run.attrs);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    /// Total length in bytes of the plain text.
    pub fn len(&self) -> usize {
        self.runs.iter().map(|r| r.text.len()).sum()
    }

    pub fn runs(&self) -> &[Run] {
        &self.runs
    }

    /// The concatenated text without attributes.
    pub fn plain_text(&self) -> String {
        self.runs.iter().map(|r| r.text.as_str()).collect()
    }

    /// The attributes in effect at a byte position.
    pub fn attributes_at(&self, pos: usize) -> Option<&Attributes> {
        let mut offset = 0;
        for run in &self.runs {
            if pos < offset + run.text.len() {
                return Some(&run.attrs);
            }
            offset += run.text.len();
        }
        None
    }

    /// Byte ranges whose attributes satisfy `pred`; contiguous matching
    /// runs are reported as one range.
    pub fn ranges_where<F>(&self, mut pred: F) -> Vec<Range<usize>>
    where
        F: FnMut(&Attributes) -> bool,
    {
        let mut out: Vec<Range<usize>> = Vec::new();
        let mut offset = 0;
        for run in &self.runs {
            let end = offset + run.text.len();
            if pred(&run.attrs) {
                match out.last_mut() {
                    Some(last) if last.end == offset => last.end = end,
                    _ => out.push(offset..end),
                }
            }
            offset = end;
        }
        out
    }

    /// Ranges tagged with exactly this kind set.
    pub fn ranges_of(&self, kind: MarkdownKind) -> Vec<Range<usize>> {
        self.ranges_where(|a| a.kind == kind)
    }

    /// Ranges whose kind set contains this one.
    pub fn ranges_containing(&self, kind: MarkdownKind) -> Vec<Range<usize>> {
        self.ranges_where(|a| a.kind.contains(kind))
    }

    /// Snapshot of every run matching `pred`, as (range, attributes)
    /// pairs. Taken before a range-wide overwrite so the matching
    /// attributes can be re-applied afterwards.
    pub fn snapshot_where<F>(&self, mut pred: F) -> Vec<(Range<usize>, Attributes)>
    where
        F: FnMut(&Attributes) -> bool,
    {
        let mut out = Vec::new();
        let mut offset = 0;
        for run in &self.runs {
            let end = offset + run.text.len();
            if pred(&run.attrs) {
                out.push((offset..end, run.attrs.clone()));
            }
            offset = end;
        }
        out
    }

    /// Transform the attributes of every run in `range` in place,
    /// splitting boundary runs first and re-coalescing afterwards.
    pub fn apply<F>(&mut self, range: Range<usize>, mut f: F)
    where
        F: FnMut(&mut Attributes),
    {
        let end = range.end.min(self.len());
        if range.start >= end {
            return;
        }
        self.split_at(range.start);
        self.split_at(end);

        let mut offset = 0;
        for run in self.runs.iter_mut() {
            if offset >= end {
                break;
            }
            if offset >= range.start {
                f(&mut run.attrs);
            }
            offset += run.text.len();
        }
        self.coalesce();
    }

    /// Transform every run in the buffer.
    pub fn apply_all<F>(&mut self, f: F)
    where
        F: FnMut(&mut Attributes),
    {
        self.apply(0..self.len(), f);
    }

    /// Union a kind flag over a range.
    pub fn add_kind(&mut self, range: Range<usize>, kind: MarkdownKind) {
        self.apply(range, |a| a.kind |= kind);
    }

    /// Overwrite the full attribute set over a range. This is the only
    /// operation that may clear kind flags.
    pub fn set_attributes(&mut self, range: Range<usize>, attrs: &Attributes) {
        self.apply(range, |a| *a = attrs.clone());
    }

    // Splits the run containing `pos` so that a run boundary falls
    // exactly there. `pos` must lie on a char boundary.
    fn split_at(&mut self, pos: usize) {
        let mut offset = 0;
        for i in 0..self.runs.len() {
            let len = self.runs[i].text.len();
            if pos > offset && pos < offset + len {
                let tail = self.runs[i].text.split_off(pos - offset);
                let attrs = self.runs[i].attrs.clone();
                self.runs.insert(i + 1, Run { text: tail, attrs });
                return;
            }
            offset += len;
        }
    }

    // Merge adjacent runs whose attributes compare equal.
    fn coalesce(&mut self) {
        let mut i = 0;
        while i + 1 < self.runs.len() {
            if self.runs[i].attrs == self.runs[i + 1].attrs {
                let next = self.runs.remove(i + 1);
                self.runs[i].text.push_str(&next.text);
            } else {
                i += 1;
            }
        }
    }
}

impl fmt::Display for AttributedText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for run in &self.runs {
            write!(f, "{}", run.text)?;
        }
        Ok(())
    }
}
