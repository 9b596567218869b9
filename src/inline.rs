//! Flattening of nested inline markup into runs of styled text.
//!
//! A text-bearing block such as a paragraph may contain arbitrarily nested
//! inline elements (`<b>`, `<i>`, `<code>`, ...).  Rather than produce a tree,
//! [`compose_inline`] walks the subtree once and emits a flat list of
//! [`StyledRun`]s, each carrying the union of the styles of every enclosing
//! inline element.

use std::fmt;

use crate::blocks::DEFAULT_MAX_DEPTH;
use crate::dom::{collapse_whitespace, Element, Node};
use crate::{tree_map_reduce, TreeMapResult};

/// One inline style attribute.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum InlineStyle {
    /// Bold text (`<b>`, `<strong>`).
    Bold,
    /// Italic text (`<i>`, `<em>`).
    Italic,
    /// Underlined text (`<u>`).
    Underline,
    /// Struck-out text (`<s>`, `<strike>`, `<del>`).
    Strikethrough,
    /// Raised text (`<sup>`).
    Superscript,
    /// Lowered text (`<sub>`).
    Subscript,
    /// Monospace text on a shaded background (`<code>`).
    Code,
}

/// Inline tags and the style each one adds.
const INLINE_STYLES: &[(&str, InlineStyle)] = &[
    ("b", InlineStyle::Bold),
    ("strong", InlineStyle::Bold),
    ("i", InlineStyle::Italic),
    ("em", InlineStyle::Italic),
    ("u", InlineStyle::Underline),
    ("s", InlineStyle::Strikethrough),
    ("strike", InlineStyle::Strikethrough),
    ("del", InlineStyle::Strikethrough),
    ("sup", InlineStyle::Superscript),
    ("sub", InlineStyle::Subscript),
    ("code", InlineStyle::Code),
];

impl InlineStyle {
    /// Every style, in the order a [`StyleSet`] iterates them.
    pub const ALL: [InlineStyle; 7] = [
        InlineStyle::Bold,
        InlineStyle::Italic,
        InlineStyle::Underline,
        InlineStyle::Strikethrough,
        InlineStyle::Superscript,
        InlineStyle::Subscript,
        InlineStyle::Code,
    ];

    /// The style added by an inline element with tag `tag`, if any.
    pub fn for_tag(tag: &str) -> Option<InlineStyle> {
        INLINE_STYLES
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(tag))
            .map(|&(_, style)| style)
    }

    fn bit(self) -> u8 {
        1 << (self as u8)
    }
}

/// A set of [`InlineStyle`]s.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct StyleSet(u8);

impl StyleSet {
    /// The set with no styles.
    pub const fn empty() -> StyleSet {
        StyleSet(0)
    }

    /// This set plus `style`.
    #[must_use]
    pub fn with(self, style: InlineStyle) -> StyleSet {
        StyleSet(self.0 | style.bit())
    }

    /// Returns true if `style` is in the set.
    pub fn contains(self, style: InlineStyle) -> bool {
        self.0 & style.bit() != 0
    }

    /// Returns true if the set has no styles.
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Iterate over the styles in the set, in the order of [`InlineStyle::ALL`].
    pub fn iter(self) -> impl Iterator<Item = InlineStyle> {
        InlineStyle::ALL
            .into_iter()
            .filter(move |&style| self.contains(style))
    }
}

impl fmt::Debug for StyleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl FromIterator<InlineStyle> for StyleSet {
    fn from_iter<I: IntoIterator<Item = InlineStyle>>(iter: I) -> Self {
        iter.into_iter().fold(StyleSet::empty(), StyleSet::with)
    }
}

/// A piece of text with one set of styles.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StyledRun {
    text: String,
    style: StyleSet,
}

impl StyledRun {
    /// Create a run.
    pub fn new(text: impl Into<String>, style: StyleSet) -> StyledRun {
        StyledRun {
            text: text.into(),
            style,
        }
    }

    /// The text of the run.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The styles which apply to the whole run.
    pub fn style(&self) -> StyleSet {
        self.style
    }

    /// Returns true if this run is a forced line break (from `<br>`).
    pub fn is_line_break(&self) -> bool {
        self.text == "\n"
    }
}

/// The body of a text-bearing block: styled runs in document order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StyledText {
    runs: Vec<StyledRun>,
}

impl StyledText {
    /// A body with a single unstyled run (or no runs if `text` is empty).
    pub fn plain(text: impl Into<String>) -> StyledText {
        let text = text.into();
        let runs = if text.is_empty() {
            Vec::new()
        } else {
            vec![StyledRun::new(text, StyleSet::empty())]
        };
        StyledText { runs }
    }

    /// The runs, in order.
    pub fn runs(&self) -> &[StyledRun] {
        &self.runs
    }

    /// Iterate over the runs.
    pub fn iter(&self) -> std::slice::Iter<'_, StyledRun> {
        self.runs.iter()
    }

    /// Returns true if there is no text at all.
    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    /// The text with all styling dropped.
    pub fn to_plain_string(&self) -> String {
        self.runs.iter().map(StyledRun::text).collect()
    }
}

impl From<Vec<StyledRun>> for StyledText {
    fn from(runs: Vec<StyledRun>) -> Self {
        StyledText { runs }
    }
}

impl<'a> IntoIterator for &'a StyledText {
    type Item = &'a StyledRun;
    type IntoIter = std::slice::Iter<'a, StyledRun>;

    fn into_iter(self) -> Self::IntoIter {
        self.runs.iter()
    }
}

/// Accumulates runs while walking an element.  Whitespace is collapsed
/// across run boundaries; runs left empty are never added.
struct StyledTextBuilder {
    runs: Vec<StyledRun>,
    at_space: bool,
}

impl StyledTextBuilder {
    fn new() -> StyledTextBuilder {
        StyledTextBuilder {
            runs: Vec::new(),
            at_space: true,
        }
    }

    fn push_text(&mut self, text: &str, style: StyleSet) {
        let mut collapsed = String::new();
        collapse_whitespace(text, &mut collapsed, &mut self.at_space);
        if !collapsed.is_empty() {
            self.runs.push(StyledRun::new(collapsed, style));
        }
    }

    fn push_break(&mut self, style: StyleSet) {
        self.trim_end();
        self.runs.push(StyledRun::new("\n", style));
        self.at_space = true;
    }

    /// Drop trailing spaces back to the last line break.
    fn trim_end(&mut self) {
        while let Some(last) = self.runs.last_mut() {
            if last.is_line_break() {
                break;
            }
            let len = last.text.trim_end_matches(' ').len();
            last.text.truncate(len);
            if !last.text.is_empty() {
                break;
            }
            self.runs.pop();
        }
    }

    fn finish(mut self) -> StyledText {
        self.trim_end();
        StyledText { runs: self.runs }
    }
}

/// A node waiting to be composed, with the styles of its enclosing elements.
struct InlineItem {
    node: Node,
    style: StyleSet,
}

/// Flatten the children of `element` into styled runs.
pub fn compose_inline(element: &Element) -> StyledText {
    compose_inline_with_depth(element, DEFAULT_MAX_DEPTH)
}

/// Flatten the children of `element`, ignoring anything nested more than
/// `max_depth` levels below it.
pub(crate) fn compose_inline_with_depth(element: &Element, max_depth: usize) -> StyledText {
    let mut builder = StyledTextBuilder::new();
    let top = InlineItem {
        node: Node::Element(element.clone()),
        style: StyleSet::empty(),
    };
    tree_map_reduce(&mut builder, top, |builder, item, depth| {
        compose_node(builder, item, depth, max_depth)
    });
    builder.finish()
}

fn compose_node<'a>(
    builder: &mut StyledTextBuilder,
    item: InlineItem,
    depth: usize,
    max_depth: usize,
) -> TreeMapResult<'a, StyledTextBuilder, InlineItem, ()> {
    let element = match item.node {
        Node::Text(text) => {
            builder.push_text(&text, item.style);
            return TreeMapResult::Finished(());
        }
        Node::Element(element) => element,
    };
    if depth > max_depth {
        html_trace!("compose_inline: dropping <{}> at depth {}", element.tag_name(), depth);
        return TreeMapResult::Nothing;
    }
    // The element being composed only contributes its children.
    let style = if depth == 0 {
        item.style
    } else if element.is("br") {
        builder.push_break(item.style);
        return TreeMapResult::Finished(());
    } else {
        match InlineStyle::for_tag(element.tag_name()) {
            Some(added) => item.style.with(added),
            None => item.style,
        }
    };
    TreeMapResult::PendingChildren {
        children: element
            .children()
            .into_iter()
            .map(|node| InlineItem { node, style })
            .collect(),
        cons: Box::new(|_: &mut StyledTextBuilder, _: Vec<()>| Some(())),
    }
}
