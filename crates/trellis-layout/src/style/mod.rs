//! Resolved box style consumed by layout.
//!
//! The cascade lives outside this crate. What arrives here is one
//! [`ComputedStyle`] per box: logical sizes and edges, the float/clear/position
//! scheme, and the text properties that drive line breaking and line box
//! construction. Every field has a CSS initial value as its default, so a
//! serialized document only needs to spell out what differs.

mod values;
mod writing_mode;

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

pub use values::{Length, Sides};
pub use writing_mode::{BaselineType, Direction, DominantBaseline, UnicodeBidi, WritingMode};

/// [§ 9.5.1 Positioning the float: the 'float' property](https://www.w3.org/TR/CSS2/visuren.html#float-position)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum Float {
    /// "The box is not floated."
    #[default]
    None,
    /// "The element generates a block box that is floated to the left."
    Left,
    /// "The element generates a block box that is floated to the right."
    Right,
}

/// [§ 9.5.2 Controlling flow next to floats: the 'clear' property](https://www.w3.org/TR/CSS2/visuren.html#flow-control)
///
/// "This property indicates which sides of an element's box(es) may not
/// be adjacent to an earlier floating box."
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum Clear {
    /// "No constraint on the box's position with respect to floats."
    #[default]
    None,
    /// "Requires that the top border edge of the box be below the bottom
    /// outer edge of any left-floating boxes."
    Left,
    /// "...below the bottom outer edge of any right-floating boxes."
    Right,
    /// "...below the bottom outer edge of any right-floating and
    /// left-floating boxes."
    Both,
}

/// [§ 9.3.1 Choosing a positioning scheme: 'position' property](https://www.w3.org/TR/CSS2/visuren.html#choose-position)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum Position {
    /// "The box is a normal box, laid out according to the normal flow."
    #[default]
    Static,
    /// "The box's position is calculated according to the normal flow.
    /// Then the box is offset relative to its normal position."
    Relative,
    /// "The box's position (and possibly size) is specified with the 'top',
    /// 'right', 'bottom', and 'left' properties."
    Absolute,
    /// "The box's position is calculated according to the 'absolute' model,
    /// but in addition, the box is fixed with respect to some reference."
    Fixed,
}

impl Position {
    /// Absolute and fixed boxes are taken out of flow.
    #[must_use]
    pub const fn is_out_of_flow(self) -> bool {
        matches!(self, Self::Absolute | Self::Fixed)
    }
}

/// [§ 6.1 Text Alignment](https://www.w3.org/TR/css-text-3/#text-align-property)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum TextAlign {
    /// "Inline-level content is aligned to the start edge of the line box."
    #[default]
    Start,
    /// "Inline-level content is aligned to the end edge of the line box."
    End,
    /// "Inline-level content is aligned to the line-left edge of the line box."
    Left,
    /// "Inline-level content is aligned to the line-right edge of the line box."
    Right,
    /// "Inline-level content is centered within the line box."
    Center,
    /// "Text is justified according to the method specified by the
    /// text-justify property."
    Justify,
}

/// [§ 6.4 Justification Method](https://www.w3.org/TR/css-text-3/#text-justify-property)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TextJustify {
    /// "The UA determines the justification algorithm to follow."
    /// Treated as `inter-word`.
    #[default]
    Auto,
    /// "Justification turns off."
    None,
    /// "Justification adjusts spacing at word separators only."
    InterWord,
    /// "Justification adjusts spacing between each typographic character
    /// unit."
    InterCharacter,
}

/// [§ 3 White Space and Wrapping](https://www.w3.org/TR/css-text-3/#white-space-property)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum WhiteSpace {
    /// Collapse spaces and newlines; wrap.
    #[default]
    Normal,
    /// Preserve everything; never wrap.
    Pre,
    /// Collapse; never wrap.
    Nowrap,
    /// Preserve; wrap, with trailing spaces hanging.
    PreWrap,
    /// Collapse spaces, preserve newlines; wrap.
    PreLine,
    /// Like `pre-wrap`, but preserved spaces take up space at line end.
    BreakSpaces,
}

impl WhiteSpace {
    /// Spaces and tabs collapse into single spaces.
    #[must_use]
    pub const fn collapses_spaces(self) -> bool {
        matches!(self, Self::Normal | Self::Nowrap | Self::PreLine)
    }

    /// Segment breaks are kept as forced line breaks.
    #[must_use]
    pub const fn preserves_newlines(self) -> bool {
        matches!(
            self,
            Self::Pre | Self::PreWrap | Self::PreLine | Self::BreakSpaces
        )
    }

    /// Soft wrap opportunities are honored.
    #[must_use]
    pub const fn allows_wrap(self) -> bool {
        !matches!(self, Self::Pre | Self::Nowrap)
    }
}

/// [§ 5.2 Breaking Rules for Letters](https://www.w3.org/TR/css-text-3/#word-break-property)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WordBreak {
    /// "Words break according to their customary rules."
    #[default]
    Normal,
    /// "Breaking is allowed within words."
    BreakAll,
    /// "Breaking is forbidden within words."
    KeepAll,
}

/// [§ 5.5 Overflow Wrapping](https://www.w3.org/TR/css-text-3/#overflow-wrap-property)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OverflowWrap {
    /// "Lines may break only at allowed break points."
    #[default]
    Normal,
    /// "An otherwise unbreakable sequence of characters may be broken at an
    /// arbitrary point if there are no otherwise-acceptable break points."
    Anywhere,
    /// Same as `anywhere`, but does not affect min-content sizing.
    BreakWord,
}

/// [§ 5.4 Hyphenation Control](https://www.w3.org/TR/css-text-3/#hyphens-property)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Hyphens {
    /// "Words are not hyphenated, even if characters inside the word
    /// explicitly define hyphenation opportunities."
    None,
    /// "Words are only hyphenated where there are characters inside the
    /// word that explicitly suggest hyphenation opportunities."
    #[default]
    Manual,
    /// "Words may be broken at hyphenation opportunities determined
    /// automatically by a language-appropriate hyphenation resource."
    Auto,
}

/// A font as seen by layout: enough to ask the metrics provider for widths
/// and vertical metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Font {
    /// Used font size in pixels.
    pub size: f32,
    /// Family name handed to the metrics provider; `None` for its default.
    pub family: Option<String>,
}

impl Default for Font {
    fn default() -> Self {
        Self {
            size: 16.0,
            family: None,
        }
    }
}

/// [§ 10.8.1 Leading and half-leading](https://www.w3.org/TR/CSS2/visudet.html#propdef-line-height)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LineHeight {
    /// "Tells user agents to set the used value to a 'reasonable' value
    /// based on the font of the element."
    #[default]
    Normal,
    /// "The used value of the property is this number multiplied by the
    /// element's font size."
    Number(f32),
    /// "The specified length is used in the calculation of the line box height."
    Px(f32),
}

/// [§ 10.8.1 'vertical-align'](https://www.w3.org/TR/CSS2/visudet.html#propdef-vertical-align)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VerticalAlign {
    /// "Align the baseline of the box with the baseline of the parent box."
    #[default]
    Baseline,
    /// "Lower the baseline of the box to the proper position for subscripts
    /// of the parent's box."
    Sub,
    /// "Raise the baseline of the box to the proper position for
    /// superscripts of the parent's box."
    Super,
    /// "Align the top of the box with the top of the parent's content area."
    TextTop,
    /// "Align the bottom of the box with the bottom of the parent's content area."
    TextBottom,
    /// "Align the vertical midpoint of the box with the baseline of the
    /// parent box plus half the x-height of the parent."
    Middle,
    /// "Align the top of the aligned subtree with the top of the line box."
    Top,
    /// "Align the bottom of the aligned subtree with the bottom of the line box."
    Bottom,
    /// "Raise (positive value) or lower (negative value) the box by this distance."
    Length(f32),
}

impl VerticalAlign {
    /// `top` and `bottom` align against the finished line box rather than
    /// the parent's baseline.
    #[must_use]
    pub const fn is_line_relative(self) -> bool {
        matches!(self, Self::Top | Self::Bottom)
    }
}

/// [§ 3.1 Breaks Between Boxes](https://www.w3.org/TR/css-break-3/#break-between)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BreakBetween {
    /// "Neither force nor forbid a break before/after the principal box."
    #[default]
    Auto,
    /// "Avoid a break before/after the principal box."
    Avoid,
    /// "Always force a page break before/after the principal box."
    Page,
    /// "Always force a column break before/after the principal box."
    Column,
}

/// [§ 3.2 Breaks Within Boxes](https://www.w3.org/TR/css-break-3/#break-within)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BreakInside {
    /// "Impose no additional breaking constraints within the box."
    #[default]
    Auto,
    /// "Avoid breaks within the box."
    Avoid,
}

/// [§ 3 Scrolling and Clipping: the overflow-x, overflow-y, and overflow properties](https://www.w3.org/TR/css-overflow-3/#overflow-properties)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum OverflowMode {
    /// "There is no special handling of overflow."
    #[default]
    Visible,
    /// "This value indicates that the box's content is clipped to its
    /// padding box and that the UA must not provide any scrolling user
    /// interface."
    Hidden,
    /// "Like hidden, but also forbids all scrolling."
    Clip,
    /// "The box is a scroll container."
    Scroll,
    /// Scroll container whose scrollbars appear on demand.
    Auto,
}

impl OverflowMode {
    /// Anything other than `visible` clips its contents' ink.
    #[must_use]
    pub const fn clips(self) -> bool {
        !matches!(self, Self::Visible)
    }
}

/// [§ 4.4 box-sizing](https://www.w3.org/TR/css-box-4/#box-sizing)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BoxSizing {
    /// Sizes specify the content box.
    #[default]
    ContentBox,
    /// Sizes include padding and border.
    BorderBox,
}

/// A box or text shadow. Only its extent matters to layout.
///
/// [§ 6.1 Drop Shadows: the box-shadow property](https://www.w3.org/TR/css-backgrounds-3/#box-shadow)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Shadow {
    /// Horizontal offset.
    pub offset_x: f32,
    /// Vertical offset.
    pub offset_y: f32,
    /// Blur radius (ink extends by the full radius).
    pub blur: f32,
    /// Spread distance.
    pub spread: f32,
    /// Inset shadows paint inside the border box and never overflow it.
    pub inset: bool,
}

/// [§ 4 Outline](https://www.w3.org/TR/css-ui-4/#outline-props)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Outline {
    /// Outline thickness.
    pub width: f32,
    /// Gap between the border edge and the outline.
    pub offset: f32,
}

/// Which side of the base text an annotation sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AnnotationPosition {
    /// Above the base text (block-start side).
    #[default]
    Over,
    /// Below the base text (block-end side).
    Under,
}

/// A ruby-like annotation attached to an inline box.
///
/// [§ 3 Ruby Layout](https://www.w3.org/TR/css-ruby-1/#ruby-layout)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Annotation {
    /// Annotation text.
    pub text: String,
    /// Side of the base the annotation occupies.
    #[serde(default)]
    pub position: AnnotationPosition,
    /// Font size of the annotation; defaults to half the base size.
    #[serde(default)]
    pub font_size: Option<f32>,
}

/// [§ 2 Line Grid](https://drafts.csswg.org/css-line-grid/#line-grid)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LineGridMode {
    /// "Line grid used by the parent is also used for this element."
    #[default]
    MatchParent,
    /// "A new line grid is created for this element."
    Create,
}

/// [§ 3 Line Snap](https://drafts.csswg.org/css-line-grid/#line-snap)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LineSnap {
    /// "Line boxes do not snap to the grid."
    #[default]
    None,
    /// "The dominant baseline snaps with the matching baseline on the line grid."
    Baseline,
    /// "Line boxes are centered within the line grid units they occupy."
    Contain,
}

/// Resolved style of one box.
///
/// Sizes and edges are flow-relative; layout maps them onto physical sides
/// with the containing block's writing mode and direction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ComputedStyle {
    /// Logical width (inline size).
    pub width: Length,
    /// Logical height (block size).
    pub height: Length,
    /// `min-inline-size`; `auto` behaves as zero.
    pub min_width: Length,
    /// `max-inline-size`; `auto` means none.
    pub max_width: Length,
    /// `min-block-size`; `auto` behaves as zero.
    pub min_height: Length,
    /// `max-block-size`; `auto` means none.
    pub max_height: Length,
    /// Margins; `auto` participates in the width constraint equation.
    pub margin: Sides<Length>,
    /// Padding; percentages refer to the containing block's inline size.
    pub padding: Sides<Length>,
    /// Used border widths.
    pub border_width: Sides<f32>,
    /// Whether sizes include padding and border.
    pub box_sizing: BoxSizing,
    /// `float`
    pub float: Float,
    /// `clear`
    pub clear: Clear,
    /// `position`
    pub position: Position,
    /// `inset-*` offsets for relative and absolute positioning.
    pub inset: Sides<Length>,
    /// `text-align`
    pub text_align: TextAlign,
    /// `text-justify`
    pub text_justify: TextJustify,
    /// `text-indent`, applied to the first line of the block.
    pub text_indent: Length,
    /// `direction`
    pub direction: Direction,
    /// `unicode-bidi`
    pub unicode_bidi: UnicodeBidi,
    /// `white-space`
    pub white_space: WhiteSpace,
    /// `word-break`
    pub word_break: WordBreak,
    /// `overflow-wrap`
    pub overflow_wrap: OverflowWrap,
    /// `hyphens`
    pub hyphens: Hyphens,
    /// `hyphenate-limit-lines`: the most consecutive hyphenated lines;
    /// `None` for no limit.
    pub hyphenate_limit_lines: Option<u32>,
    /// `writing-mode`
    pub writing_mode: WritingMode,
    /// `dominant-baseline`
    pub dominant_baseline: DominantBaseline,
    /// Font used for text and the line strut.
    pub font: Font,
    /// `line-height`
    pub line_height: LineHeight,
    /// `vertical-align`
    pub vertical_align: VerticalAlign,
    /// `break-before`
    pub break_before: BreakBetween,
    /// `break-after`
    pub break_after: BreakBetween,
    /// `break-inside`
    pub break_inside: BreakInside,
    /// `overflow`
    pub overflow: OverflowMode,
    /// `box-shadow` layers.
    pub box_shadow: Vec<Shadow>,
    /// `text-shadow` layers.
    pub text_shadow: Vec<Shadow>,
    /// `outline`
    pub outline: Outline,
    /// Ruby-like annotation attached to this inline.
    pub annotation: Option<Annotation>,
    /// `line-grid`
    pub line_grid: LineGridMode,
    /// `line-snap`
    pub line_snap: LineSnap,
}

impl Default for ComputedStyle {
    fn default() -> Self {
        Self {
            width: Length::Auto,
            height: Length::Auto,
            min_width: Length::Auto,
            max_width: Length::Auto,
            min_height: Length::Auto,
            max_height: Length::Auto,
            margin: Sides::ZERO,
            padding: Sides::ZERO,
            border_width: Sides::all(0.0),
            box_sizing: BoxSizing::ContentBox,
            float: Float::None,
            clear: Clear::None,
            position: Position::Static,
            inset: Sides::all(Length::Auto),
            text_align: TextAlign::Start,
            text_justify: TextJustify::Auto,
            text_indent: Length::ZERO,
            direction: Direction::Ltr,
            unicode_bidi: UnicodeBidi::Normal,
            white_space: WhiteSpace::Normal,
            word_break: WordBreak::Normal,
            overflow_wrap: OverflowWrap::Normal,
            hyphens: Hyphens::Manual,
            hyphenate_limit_lines: None,
            writing_mode: WritingMode::HorizontalTb,
            dominant_baseline: DominantBaseline::Auto,
            font: Font::default(),
            line_height: LineHeight::Normal,
            vertical_align: VerticalAlign::Baseline,
            break_before: BreakBetween::Auto,
            break_after: BreakBetween::Auto,
            break_inside: BreakInside::Auto,
            overflow: OverflowMode::Visible,
            box_shadow: Vec::new(),
            text_shadow: Vec::new(),
            outline: Outline::default(),
            annotation: None,
            line_grid: LineGridMode::MatchParent,
            line_snap: LineSnap::None,
        }
    }
}

impl ComputedStyle {
    /// [§ 7 Inheritance](https://www.w3.org/TR/css-cascade-4/#inheriting)
    ///
    /// Style for an anonymous box wrapping inline content of `parent`:
    /// inherited text properties are copied, everything else is initial.
    #[must_use]
    pub fn anonymous_from(parent: &Self) -> Self {
        Self {
            text_align: parent.text_align,
            text_justify: parent.text_justify,
            direction: parent.direction,
            white_space: parent.white_space,
            word_break: parent.word_break,
            overflow_wrap: parent.overflow_wrap,
            hyphens: parent.hyphens,
            hyphenate_limit_lines: parent.hyphenate_limit_lines,
            writing_mode: parent.writing_mode,
            dominant_baseline: parent.dominant_baseline,
            font: parent.font.clone(),
            line_height: parent.line_height,
            line_snap: parent.line_snap,
            ..Self::default()
        }
    }

    /// True for `float: left|right`.
    #[must_use]
    pub const fn is_floating(&self) -> bool {
        !matches!(self.float, Float::None)
    }

    /// True for `position: absolute|fixed`.
    #[must_use]
    pub const fn is_out_of_flow_positioned(&self) -> bool {
        self.position.is_out_of_flow()
    }

    /// [§ 9.4.1 Block formatting contexts](https://www.w3.org/TR/CSS2/visuren.html#block-formatting)
    ///
    /// "Floats, absolutely positioned elements, block containers (such as
    /// inline-blocks, table-cells, and table-captions) that are not block
    /// boxes, and block boxes with 'overflow' other than 'visible' (except
    /// when that value has been propagated to the viewport) establish new
    /// block formatting contexts for their contents."
    ///
    /// Box-kind conditions are checked by the tree; this covers the style ones.
    #[must_use]
    pub const fn establishes_bfc(&self) -> bool {
        self.is_floating() || self.is_out_of_flow_positioned() || self.overflow.clips()
    }

    /// `break-inside: avoid`
    #[must_use]
    pub const fn avoids_break_inside(&self) -> bool {
        matches!(self.break_inside, BreakInside::Avoid)
    }
}
