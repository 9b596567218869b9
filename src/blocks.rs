//! Classification of HTML elements into render blocks.
//!
//! [`render`] walks an element tree and maps each element to one of a fixed
//! set of block policies, looked up by tag name in a table.  Elements whose
//! tag isn't in the table are rendered as generic containers (if they have
//! element children) or generic leaves (if they only have text).

use crate::dom::Element;
use crate::inline::{compose_inline_with_depth, StyledText};
use crate::{tree_map_reduce, TreeMapResult};

/// How deeply nested elements are followed by default.
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// The largest depth limit accepted.  Larger limits are lowered to this, as
/// the derived `Drop`, `Clone`, `PartialEq` and `Debug` of a [`RenderBlock`]
/// recurse once per level of nesting.
pub const MAX_DEPTH_LIMIT: usize = 1024;

/// The marker shown before a list item.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ListMarker {
    /// An unordered list bullet.
    Bullet,
    /// The 1-based position in an ordered list.
    Number(usize),
}

/// The kind of a [`RenderBlock::Rule`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RuleKind {
    /// A full-width horizontal line (`<hr>`).
    Divider,
    /// A blank line (`<br>` at block level).
    Spacer,
}

/// One cell of a table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TableCell {
    /// The flattened text of the cell.
    pub text: String,
    /// Whether this is a header (`<th>`) cell.
    pub header: bool,
}

impl TableCell {
    /// Create a cell.
    pub fn new(text: impl Into<String>, header: bool) -> TableCell {
        TableCell {
            text: text.into(),
            header,
        }
    }
}

/// One row of a table.  Rows may have different numbers of cells.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TableRow {
    /// The cells, in document order.
    pub cells: Vec<TableCell>,
}

/// A rendered block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RenderBlock {
    /// A paragraph of styled text.
    Paragraph(StyledText),
    /// A heading, with level 1 to 6.
    Heading(u8, StyledText),
    /// A block container (`<div>`).
    Container(Vec<RenderBlock>),
    /// A bulleted list; the children are list items.
    UnorderedList(Vec<RenderBlock>),
    /// A numbered list; the children are list items.
    OrderedList(Vec<RenderBlock>),
    /// A list item.  Items collected by a list carry a marker.
    ListItem(Option<ListMarker>, StyledText),
    /// A hyperlink: target and text.
    Link(String, String),
    /// An image which isn't displayed: source and alternative text.
    ImagePlaceholder(String, String),
    /// A divider or spacer.
    Rule(RuleKind),
    /// A quoted section.
    Blockquote(Vec<RenderBlock>),
    /// Preformatted text, exactly as written.
    Preformatted(String),
    /// A code fragment.
    InlineCode(String),
    /// A table, as rows of cells.
    Table(Vec<TableRow>),
    /// Text from an element with no element children.
    GenericLeaf(StyledText),
    /// The children of an element with no special handling.
    GenericContainer(Vec<RenderBlock>),
}

impl RenderBlock {
    /// An empty generic container, used for elements with nothing to show.
    pub fn empty() -> RenderBlock {
        RenderBlock::GenericContainer(Vec::new())
    }

    /// The nested blocks, for the container variants.
    pub fn children(&self) -> &[RenderBlock] {
        use RenderBlock::*;
        match self {
            Container(cs) | UnorderedList(cs) | OrderedList(cs) | Blockquote(cs)
            | GenericContainer(cs) => cs,
            _ => &[],
        }
    }

    /// The total number of blocks in this tree, including this one.
    pub fn node_count(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![self];
        while let Some(block) = stack.pop() {
            count += 1;
            stack.extend(block.children());
        }
        count
    }
}

/// How an element is turned into a block.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Policy {
    Paragraph,
    Heading(u8),
    Container,
    Span,
    UnorderedList,
    OrderedList,
    ListItem,
    Link,
    Image,
    Rule(RuleKind),
    Blockquote,
    Preformatted,
    InlineCode,
    Table,
}

const POLICIES: &[(&str, Policy)] = &[
    ("p", Policy::Paragraph),
    ("h1", Policy::Heading(1)),
    ("h2", Policy::Heading(2)),
    ("h3", Policy::Heading(3)),
    ("h4", Policy::Heading(4)),
    ("h5", Policy::Heading(5)),
    ("h6", Policy::Heading(6)),
    ("div", Policy::Container),
    ("span", Policy::Span),
    ("ul", Policy::UnorderedList),
    ("ol", Policy::OrderedList),
    ("li", Policy::ListItem),
    ("a", Policy::Link),
    ("img", Policy::Image),
    ("br", Policy::Rule(RuleKind::Spacer)),
    ("hr", Policy::Rule(RuleKind::Divider)),
    ("blockquote", Policy::Blockquote),
    ("pre", Policy::Preformatted),
    ("code", Policy::InlineCode),
    ("table", Policy::Table),
];

fn policy_for(element: &Element) -> Option<Policy> {
    POLICIES
        .iter()
        .find(|(tag, _)| element.is(tag))
        .map(|&(_, policy)| policy)
}

/// Render an element and its subtree.
pub fn render(element: &Element) -> RenderBlock {
    render_with_depth(element, DEFAULT_MAX_DEPTH)
}

/// Render an element and its subtree, treating anything nested more than
/// `max_depth` levels below `element` as empty.  `max_depth` is capped at
/// [`MAX_DEPTH_LIMIT`].
pub fn render_with_depth(element: &Element, max_depth: usize) -> RenderBlock {
    let max_depth = max_depth.min(MAX_DEPTH_LIMIT);
    tree_map_reduce(&mut (), element.clone(), |_, element, depth| {
        process_element(element, depth, max_depth)
    })
    .unwrap_or_else(RenderBlock::empty)
}

/// Render the child elements of `element`, then combine them with `f`.
fn pending<'a, F>(element: &Element, f: F) -> TreeMapResult<'a, (), Element, RenderBlock>
where
    F: Fn(Vec<RenderBlock>) -> RenderBlock + 'static,
{
    TreeMapResult::PendingChildren {
        children: element.child_elements(),
        cons: Box::new(move |_: &mut (), cs: Vec<RenderBlock>| Some(f(cs))),
    }
}

fn process_element<'a>(
    element: Element,
    depth: usize,
    max_depth: usize,
) -> TreeMapResult<'a, (), Element, RenderBlock> {
    use RenderBlock::*;
    use TreeMapResult::Finished;

    if depth > max_depth {
        html_trace!("render: truncating <{}> at depth {}", element.tag_name(), depth);
        return Finished(RenderBlock::empty());
    }
    // Depth budget left for lookups below this element.
    let remaining = max_depth - depth;
    let policy = policy_for(&element);
    html_trace_quiet!("render: <{}> -> {:?}", element.tag_name(), policy);

    let block = match policy {
        Some(Policy::Paragraph) => Paragraph(compose_inline_with_depth(&element, remaining)),
        Some(Policy::Heading(level)) => {
            Heading(level, compose_inline_with_depth(&element, remaining))
        }
        Some(Policy::Span) => GenericLeaf(compose_inline_with_depth(&element, remaining)),
        Some(Policy::ListItem) => ListItem(None, compose_inline_with_depth(&element, remaining)),
        Some(Policy::Container) => return pending(&element, Container),
        Some(Policy::Blockquote) => return pending(&element, Blockquote),
        Some(Policy::UnorderedList) => {
            UnorderedList(list_items(&element, remaining, |_| ListMarker::Bullet))
        }
        Some(Policy::OrderedList) => {
            OrderedList(list_items(&element, remaining, |i| ListMarker::Number(i + 1)))
        }
        Some(Policy::Link) => Link(element.attr("href"), element.text()),
        Some(Policy::Image) => ImagePlaceholder(element.attr("src"), element.attr("alt")),
        Some(Policy::Rule(kind)) => Rule(kind),
        Some(Policy::Preformatted) => Preformatted(element.whole_text()),
        Some(Policy::InlineCode) => InlineCode(element.text()),
        Some(Policy::Table) => Table(table_rows(&element, remaining)),
        None => {
            if element.has_child_elements() {
                return pending(&element, GenericContainer);
            }
            let text = element.own_text();
            if text.is_empty() {
                RenderBlock::empty()
            } else {
                GenericLeaf(StyledText::plain(text))
            }
        }
    };
    Finished(block)
}

/// Collect every `li` below a list, at any depth, in document order.
fn list_items(
    list: &Element,
    max_depth: usize,
    marker: impl Fn(usize) -> ListMarker,
) -> Vec<RenderBlock> {
    list.select_with_depth(&["li"], max_depth)
        .enumerate()
        .map(|(i, (li, depth))| {
            RenderBlock::ListItem(
                Some(marker(i)),
                compose_inline_with_depth(&li, max_depth - depth),
            )
        })
        .collect()
}

fn table_rows(table: &Element, max_depth: usize) -> Vec<TableRow> {
    table
        .select_with_depth(&["tr"], max_depth)
        .map(|(tr, depth)| TableRow {
            cells: tr
                .select_with_depth(&["td", "th"], max_depth - depth)
                .map(|(cell, _)| TableCell::new(cell.text(), cell.is("th")))
                .collect(),
        })
        .collect()
}
