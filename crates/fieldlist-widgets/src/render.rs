//! Rendering seam between the field list and the host UI.
//!
//! The field list decides *what* to mount and *where*; a [`RowRenderer`]
//! decides how it looks. Every mounted row is positioned absolutely at its
//! precomputed top offset inside a content box of `total_height`.

use std::fmt::Write as _;

use crate::virtualized::Section;

/// Control offered next to a field row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldAction {
    /// Displayed field the user may remove.
    Remove,
    /// Displayed default field; no remove control.
    Pinned,
    /// Hidden field the user may add.
    Add,
}

impl FieldAction {
    #[must_use]
    pub const fn glyph(self) -> &'static str {
        match self {
            Self::Remove => "x",
            Self::Pinned => " ",
            Self::Add => "+",
        }
    }
}

/// Receives mounted rows from [`FieldList::render`](crate::field_list::FieldList::render).
pub trait RowRenderer {
    /// Called once per render with the full scroll content height.
    fn begin(&mut self, total_height: u32);

    fn section_title(&mut self, top: u32, height: u32, section: Section);

    fn spacer(&mut self, top: u32, height: u32);

    fn field(&mut self, top: u32, height: u32, name: &str, section: Section, action: FieldAction);

    /// Called instead of any row when the filtered list is empty.
    fn empty_state(&mut self);
}

/// Plain-text renderer: one line per mounted row.
///
/// Lines look like `@   32 [x] timestamp`, with the top offset first.
#[derive(Debug, Default, Clone)]
pub struct TextRenderer {
    total_height: u32,
    lines: Vec<String>,
}

impl TextRenderer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn total_height(&self) -> u32 {
        self.total_height
    }

    #[must_use]
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// All lines joined with newlines.
    #[must_use]
    pub fn output(&self) -> String {
        let mut out = String::new();
        for line in &self.lines {
            let _ = writeln!(out, "{line}");
        }
        out
    }
}

impl RowRenderer for TextRenderer {
    fn begin(&mut self, total_height: u32) {
        self.total_height = total_height;
        self.lines.clear();
    }

    fn section_title(&mut self, top: u32, _height: u32, section: Section) {
        self.lines.push(format!("@{top:>5} == {} ==", section.title()));
    }

    fn spacer(&mut self, top: u32, _height: u32) {
        self.lines.push(format!("@{top:>5}"));
    }

    fn field(
        &mut self,
        top: u32,
        _height: u32,
        name: &str,
        _section: Section,
        action: FieldAction,
    ) {
        self.lines.push(format!("@{top:>5} [{}] {name}", action.glyph()));
    }

    fn empty_state(&mut self) {
        self.lines.push("(no fields)".to_string());
    }
}
