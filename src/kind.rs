use bitflags::bitflags;

bitflags! {
    /// Bit-set tagging which markdown construct produced a styled range.
    ///
    /// Flags combine by union: a range can be bold, italic and inside a
    /// heading at the same time. The empty set is the identity and is
    /// contained in every set, including itself. Once a flag is on a
    /// range it is only ever added to, never cleared; the one exception
    /// is the full attribute overwrite that restyles a link.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct MarkdownKind: u16 {
        const H1 = 1;
        const H2 = 1 << 1;
        const H3 = 1 << 2;
        const BOLD = 1 << 3;
        const ITALIC = 1 << 4;
        const CODE = 1 << 5;
        const ORDERED_LIST = 1 << 6;
        const UNORDERED_LIST = 1 << 7;
        const QUOTE = 1 << 8;
        const LINK = 1 << 9;
    }
}

impl MarkdownKind {
    /// Union of both list flags, for scanning nested list ranges.
    pub const ANY_LIST: Self = Self::ORDERED_LIST.union(Self::UNORDERED_LIST);

    /// The flag for a heading level. Levels above 3 saturate at H3.
    pub fn heading(level: u8) -> Self {
        match level {
            0 | 1 => Self::H1,
            2 => Self::H2,
            _ => Self::H3,
        }
    }

    /// True if any heading flag is set.
    pub fn is_heading(&self) -> bool {
        self.intersects(Self::H1 | Self::H2 | Self::H3)
    }

    /// True if either list flag is set.
    pub fn is_list(&self) -> bool {
        self.intersects(Self::ANY_LIST)
    }
}
