//! Formatting options.
//!
//! A plain value, cheap to clone, with `Default` giving the house style.
//! The engine reads it; nothing here is interpreted lazily.

use crate::align::{AlignFlags, WrapMode};

/// How indentation text is rendered.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum IndentStyle {
    /// Tabs up to the last full tab stop, spaces for the remainder.
    Tabs,
    Spaces,
    /// Tabs for whole indent units, spaces for continuation columns.
    Mixed,
}

/// Options consumed by the formatting pass.
#[derive(Clone, Debug)]
pub struct FormatConfig {
    /// Maximum line width in columns.
    pub page_width: u32,
    pub indent_style: IndentStyle,
    /// Columns per logical indent level.
    pub indent_size: u32,
    /// Columns per tab stop, used for column accounting and `Tabs`/`Mixed`
    /// rendering.
    pub tab_size: u32,
    /// Extra indent units applied to wrapped continuation lines.
    pub continuation_indent: u32,
    /// Blank lines kept between constructs; anything beyond is collapsed.
    pub blank_lines_to_preserve: u32,

    /// Wrap layout for call argument lists.
    pub wrap_arguments: WrapMode,
    /// Wrap layout for function parameter lists.
    pub wrap_parameters: WrapMode,
    /// Indent placement for wrapped argument fragments. Empty means the
    /// continuation indent.
    pub wrap_indent_arguments: AlignFlags,
    /// Indent placement for wrapped parameter fragments.
    pub wrap_indent_parameters: AlignFlags,

    pub space_before_comma: bool,
    pub space_after_comma: bool,
    pub space_around_binary_operators: bool,
    pub space_between_empty_parens: bool,

    /// Comment text that disables formatting until the matching on-marker.
    pub format_off_marker: String,
    pub format_on_marker: String,
}

impl Default for FormatConfig {
    fn default() -> Self {
        FormatConfig {
            page_width: 80,
            indent_style: IndentStyle::Spaces,
            indent_size: 4,
            tab_size: 4,
            continuation_indent: 2,
            blank_lines_to_preserve: 1,
            wrap_arguments: WrapMode::CompactSplit,
            wrap_parameters: WrapMode::CompactSplit,
            wrap_indent_arguments: AlignFlags::empty(),
            wrap_indent_parameters: AlignFlags::empty(),
            space_before_comma: false,
            space_after_comma: true,
            space_around_binary_operators: true,
            space_between_empty_parens: false,
            format_off_marker: "cedar-format: off".to_owned(),
            format_on_marker: "cedar-format: on".to_owned(),
        }
    }
}

impl FormatConfig {
    /// Indentation columns added per wrapped line.
    pub(crate) fn continuation_columns(&self) -> u32 {
        self.continuation_indent * self.indent_size
    }
}
