//! A read-only view of a parsed HTML document.
//!
//! The document is parsed with `html5ever` into a `markup5ever_rcdom` tree;
//! [`Element`] and [`Node`] wrap handles into that tree and expose only the
//! lookups needed to classify and flatten it.  All traversals here use an
//! explicit stack, so arbitrarily deep documents don't exhaust the call stack.

use std::fmt;
use std::io;

use html5ever::driver::ParseOpts;
use html5ever::parse_document;
use html5ever::tendril::TendrilSink;
use html5ever::tree_builder::TreeBuilderOpts;
use markup5ever_rcdom::{Handle, NodeData, RcDom};

use crate::Result;

fn parse_opts() -> ParseOpts {
    ParseOpts {
        tree_builder: TreeBuilderOpts {
            drop_doctype: true,
            ..Default::default()
        },
        ..Default::default()
    }
}

/// A parsed HTML document.
#[derive(Clone)]
pub struct Document {
    document: Handle,
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("root", &self.root())
            .finish()
    }
}

impl Document {
    /// Read and parse a UTF-8 HTML document from `input`.
    pub fn parse(mut input: impl io::Read) -> Result<Document> {
        let dom = parse_document(RcDom::default(), parse_opts())
            .from_utf8()
            .read_from(&mut input)?;
        Ok(Document {
            document: dom.document.clone(),
        })
    }

    /// Parse an HTML document held in memory.
    pub fn parse_str(html: &str) -> Document {
        let dom = parse_document(RcDom::default(), parse_opts()).one(html);
        Document {
            document: dom.document.clone(),
        }
    }

    /// The root element (normally `<html>`).
    pub fn root(&self) -> Option<Element> {
        self.document
            .children
            .borrow()
            .iter()
            .find_map(|child| Element::new(child.clone(), &self.document))
    }

    /// The `<body>` element, if there is one.
    pub fn body(&self) -> Option<Element> {
        self.root()?
            .child_elements()
            .into_iter()
            .find(|child| child.is("body"))
    }

    /// The normalized text of the first `<title>` element, or an empty
    /// string if the document has none.
    pub fn title(&self) -> String {
        Walk::new(&self.document, usize::MAX)
            .filter_map(|item| Element::new(item.handle, &self.document))
            .find(|element| element.is("title"))
            .map(|title| title.text())
            .unwrap_or_default()
    }
}

/// A child of an element: either another element or a run of character data.
#[derive(Clone, Debug)]
pub enum Node {
    /// A nested element.
    Element(Element),
    /// Raw character data.
    Text(String),
}

impl Node {
    fn new(handle: &Handle, document: &Handle) -> Option<Node> {
        match handle.data {
            NodeData::Element { .. } => Some(Node::Element(Element {
                handle: handle.clone(),
                document: document.clone(),
            })),
            NodeData::Text { ref contents } => Some(Node::Text(String::from(&**contents.borrow()))),
            _ => None,
        }
    }
}

/// An element in a parsed document.
///
/// Each element holds on to its document's root node, so it stays usable
/// after the [`Document`] it came from is dropped.
#[derive(Clone)]
pub struct Element {
    handle: Handle,
    // Dropping the last reference to the root detaches every node's children.
    document: Handle,
}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}>", self.tag_name())
    }
}

impl Element {
    fn new(handle: Handle, document: &Handle) -> Option<Element> {
        if matches!(handle.data, NodeData::Element { .. }) {
            Some(Element {
                handle,
                document: document.clone(),
            })
        } else {
            None
        }
    }

    /// The element's local name.
    pub fn tag_name(&self) -> &str {
        match self.handle.data {
            NodeData::Element { ref name, .. } => &*name.local,
            _ => "",
        }
    }

    /// Whether this element's tag is `tag`, ignoring ASCII case.
    pub fn is(&self, tag: &str) -> bool {
        self.tag_name().eq_ignore_ascii_case(tag)
    }

    /// The value of attribute `name`, or an empty string if it is missing.
    pub fn attr(&self, name: &str) -> String {
        if let NodeData::Element { ref attrs, .. } = self.handle.data {
            for attr in attrs.borrow().iter() {
                let local: &str = &attr.name.local;
                if local.eq_ignore_ascii_case(name) {
                    return String::from(&*attr.value);
                }
            }
        }
        String::new()
    }

    /// The element and text children, in document order.  Comments and
    /// processing instructions are skipped.
    pub fn children(&self) -> Vec<Node> {
        self.handle
            .children
            .borrow()
            .iter()
            .filter_map(|child| Node::new(child, &self.document))
            .collect()
    }

    /// The element children, in document order.
    pub fn child_elements(&self) -> Vec<Element> {
        self.handle
            .children
            .borrow()
            .iter()
            .filter_map(|child| Element::new(child.clone(), &self.document))
            .collect()
    }

    /// Returns true if any child is an element.
    pub fn has_child_elements(&self) -> bool {
        self.handle
            .children
            .borrow()
            .iter()
            .any(|child| matches!(child.data, NodeData::Element { .. }))
    }

    /// The text of the direct text children only, with whitespace collapsed
    /// and trimmed.
    pub fn own_text(&self) -> String {
        let mut text = TextAccumulator::default();
        for child in self.handle.children.borrow().iter() {
            if let NodeData::Text { ref contents } = child.data {
                text.push(&contents.borrow(), false);
            }
        }
        text.finish()
    }

    /// The text of all descendants, with whitespace collapsed and trimmed.
    /// Text inside `<pre>` keeps its whitespace and a `<br>` counts as a space.
    pub fn text(&self) -> String {
        let mut text = TextAccumulator::default();
        for item in Walk::new(&self.handle, usize::MAX) {
            match item.handle.data {
                NodeData::Text { ref contents } => text.push(&contents.borrow(), item.in_pre),
                NodeData::Element { ref name, .. } if &*name.local == "br" => {
                    text.push(" ", item.in_pre)
                }
                _ => {}
            }
        }
        text.finish()
    }

    /// The text of all descendants exactly as written, with each `<br>` as a
    /// newline.
    pub fn whole_text(&self) -> String {
        let mut text = String::new();
        for item in Walk::new(&self.handle, usize::MAX) {
            match item.handle.data {
                NodeData::Text { ref contents } => text.push_str(&contents.borrow()),
                NodeData::Element { ref name, .. } if &*name.local == "br" => text.push('\n'),
                _ => {}
            }
        }
        text
    }

    /// Returns true if some descendant text is not whitespace.
    pub fn has_text(&self) -> bool {
        Walk::new(&self.handle, usize::MAX).any(|item| match item.handle.data {
            NodeData::Text { ref contents } => contents.borrow().chars().any(|c| !c.is_whitespace()),
            _ => false,
        })
    }

    /// All descendant elements (not including this one) in document order.
    pub fn descendants(&self) -> impl Iterator<Item = Element> {
        self.descendants_with_depth(usize::MAX)
            .map(|(element, _)| element)
    }

    /// The descendant elements whose tag is one of `tags`, in document order.
    pub fn select<'t>(&self, tags: &'t [&'t str]) -> impl Iterator<Item = Element> + 't {
        self.select_with_depth(tags, usize::MAX)
            .map(|(element, _)| element)
    }

    /// Like [`select`](Element::select), but only looking `max_depth` levels
    /// down, and yielding each match's depth below this element.
    pub(crate) fn select_with_depth<'t>(
        &self,
        tags: &'t [&'t str],
        max_depth: usize,
    ) -> impl Iterator<Item = (Element, usize)> + 't {
        self.descendants_with_depth(max_depth)
            .filter(move |(element, _)| tags.iter().any(|tag| element.is(tag)))
    }

    fn descendants_with_depth(&self, max_depth: usize) -> impl Iterator<Item = (Element, usize)> {
        let document = self.document.clone();
        Walk::new(&self.handle, max_depth)
            .skip(1)
            .filter_map(move |item| Element::new(item.handle, &document).map(|e| (e, item.depth)))
    }
}

/// One node visited by a [`Walk`].
struct WalkItem {
    handle: Handle,
    depth: usize,
    in_pre: bool,
}

/// Pre-order traversal of a subtree, including its root.
struct Walk {
    stack: Vec<WalkItem>,
    max_depth: usize,
}

impl Walk {
    fn new(root: &Handle, max_depth: usize) -> Walk {
        Walk {
            stack: vec![WalkItem {
                handle: root.clone(),
                depth: 0,
                in_pre: is_pre(root),
            }],
            max_depth,
        }
    }
}

fn is_pre(handle: &Handle) -> bool {
    matches!(handle.data, NodeData::Element { ref name, .. } if &*name.local == "pre")
}

impl Iterator for Walk {
    type Item = WalkItem;

    fn next(&mut self) -> Option<WalkItem> {
        let item = self.stack.pop()?;
        if item.depth < self.max_depth {
            for child in item.handle.children.borrow().iter().rev() {
                self.stack.push(WalkItem {
                    handle: child.clone(),
                    depth: item.depth + 1,
                    in_pre: item.in_pre || is_pre(child),
                });
            }
        }
        Some(item)
    }
}

/// Collapse runs of whitespace in `text` to single spaces, appending to `out`.
/// `at_space` tracks whether `out` currently ends in whitespace (or is at a
/// position where leading whitespace should be dropped).
pub(crate) fn collapse_whitespace(text: &str, out: &mut String, at_space: &mut bool) {
    for c in text.chars() {
        if c.is_whitespace() {
            if !*at_space {
                out.push(' ');
                *at_space = true;
            }
        } else {
            out.push(c);
            *at_space = false;
        }
    }
}

/// Builds up normalized text from a sequence of text nodes.
struct TextAccumulator {
    text: String,
    at_space: bool,
}

impl Default for TextAccumulator {
    fn default() -> Self {
        TextAccumulator {
            text: String::new(),
            at_space: true,
        }
    }
}

impl TextAccumulator {
    fn push(&mut self, text: &str, verbatim: bool) {
        if verbatim {
            self.text.push_str(text);
            self.at_space = self.text.ends_with(char::is_whitespace);
        } else {
            collapse_whitespace(text, &mut self.text, &mut self.at_space);
        }
    }

    fn finish(self) -> String {
        self.text.trim().to_string()
    }
}
