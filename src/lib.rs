//! Convert HTML to a tree of styled text blocks.
//!
//! This crate classifies the elements of an HTML document into a closed set
//! of block types (paragraphs, headings, lists, tables, links, ...) and
//! flattens nested inline markup such as `<b><i>..</i></b>` into runs of text
//! tagged with a set of styles.  The resulting [`RenderBlock`] tree can be
//! handed to any presentation layer; a simple one which wraps the blocks into
//! lines of (optionally annotated) text is included in [`render`].
//!
//! # Examples
//!
//! ```rust
//! # use html2blocks::from_read;
//! let html = b"
//!        <ul>
//!          <li>Item one</li>
//!          <li>Item <b>two</b></li>
//!        </ul>";
//! assert_eq!(from_read(&html[..], 20).unwrap(),
//!            "\
//! * Item one
//! * Item **two**
//! ");
//! ```
//!
//! The block tree itself is available from [`parse`]:
//!
//! ```rust
//! # use html2blocks::{parse, RenderBlock};
//! let tree = parse(&b"<a href=\"https://x.test\">Click</a>"[..]).unwrap();
//! assert_eq!(
//!     tree.blocks(),
//!     &RenderBlock::GenericContainer(vec![RenderBlock::Link(
//!         "https://x.test".into(),
//!         "Click".into()
//!     )])
//! );
//! ```
//!
//! A small demonstration program is included under `demos/`:
//!
//! ```sh
//! $ cargo run --example html2blocks -- --tree foo.html
//! [...]
//! ```

#![deny(missing_docs)]

#[macro_use]
mod macros;

pub mod blocks;
pub mod dom;
pub mod inline;
pub mod render;

pub use blocks::{
    render, render_with_depth, ListMarker, RenderBlock, RuleKind, TableCell, TableRow,
    DEFAULT_MAX_DEPTH, MAX_DEPTH_LIMIT,
};
pub use inline::{compose_inline, InlineStyle, StyleSet, StyledRun, StyledText};
pub use render::text_renderer::{
    PlainDecorator, RichAnnotation, RichDecorator, TaggedLine, TaggedString, TextDecorator,
};

use render::text_renderer::TextRenderer;
use std::io;

/// Errors from reading or laying out a document.
#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// The output width was too narrow to render to.
    #[error("Output width not wide enough.")]
    TooNarrow,
    /// An error from the underlying reader.
    #[error("I/O error")]
    IoError(#[from] io::Error),
}

impl PartialEq for Error {
    fn eq(&self, other: &Error) -> bool {
        use Error::*;
        match (self, other) {
            (TooNarrow, TooNarrow) => true,
            (IoError(a), IoError(b)) => a.kind() == b.kind(),
            _ => false,
        }
    }
}

impl Eq for Error {}

/// Result type for this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// A reducer which combines results from mapping children into
/// the result for the current node.  Takes a context and a
/// vector of results and returns a new result (or nothing).
type ResultReducer<'a, C, R> = dyn Fn(&mut C, Vec<R>) -> Option<R> + 'a;

/// The result of trying to process one node.
pub(crate) enum TreeMapResult<'a, C, N, R> {
    /// A completed result.
    Finished(R),
    /// Deferred completion - can be turned into a result
    /// once the vector of children are processed.
    PendingChildren {
        children: Vec<N>,
        cons: Box<ResultReducer<'a, C, R>>,
    },
    /// Nothing (e.g. a comment or other ignored node).
    Nothing,
}

/// Walk a tree without native recursion.
///
/// `process_node` is called on each node in document order along with its
/// depth below `top` (which is at depth 0), and either finishes it directly
/// or asks for its children to be processed first.
pub(crate) fn tree_map_reduce<'a, C, N, R, M>(
    context: &mut C,
    top: N,
    mut process_node: M,
) -> Option<R>
where
    M: FnMut(&mut C, N, usize) -> TreeMapResult<'a, C, N, R>,
{
    /// A node partially decoded, waiting for its children to
    /// be processed.
    struct PendingNode<'a, C, R, N> {
        /// How to make the node once finished
        construct: Box<ResultReducer<'a, C, R>>,
        /// Children already processed
        children: Vec<R>,
        /// Iterator of child nodes not yet processed
        to_process: std::vec::IntoIter<N>,
    }

    let mut pending_stack = vec![PendingNode {
        // We only expect one child, which we'll just return.
        construct: Box::new(|_, mut cs| cs.pop()),
        children: Vec::new(),
        to_process: vec![top].into_iter(),
    }];
    loop {
        let depth = pending_stack.len().saturating_sub(1);
        let Some(pending) = pending_stack.last_mut() else {
            break None;
        };
        // Get the next child node to process
        if let Some(h) = pending.to_process.next() {
            match process_node(context, h, depth) {
                TreeMapResult::Finished(result) => {
                    pending.children.push(result);
                }
                TreeMapResult::PendingChildren { children, cons } => {
                    pending_stack.push(PendingNode {
                        construct: cons,
                        children: Vec::new(),
                        to_process: children.into_iter(),
                    });
                }
                TreeMapResult::Nothing => {}
            };
        } else {
            // No more children, so finally construct the parent.
            let Some(completed) = pending_stack.pop() else {
                break None;
            };
            let reduced = (completed.construct)(context, completed.children);
            match (reduced, pending_stack.last_mut()) {
                (Some(node), Some(parent)) => parent.children.push(node),
                // Finished the whole stack!
                (Some(node), None) => break Some(node),
                // Finished the stack, and have nothing
                (None, None) => break None,
                (None, Some(_)) => {}
            }
        }
    }
}

pub mod config {
    //! Configure the HTML to block translation using the `Config` type, which
    //! can be constructed using one of the functions in this module.

    use crate::blocks::{render_with_depth, RenderBlock, DEFAULT_MAX_DEPTH, MAX_DEPTH_LIMIT};
    use crate::dom::{Document, Element};
    use crate::render::text_renderer::{
        PlainDecorator, RichDecorator, TaggedLine, TextDecorator,
    };
    use crate::{RenderTree, Result};

    /// Configure the HTML processing.
    pub struct Config<D: TextDecorator> {
        decorator: D,
        max_depth: usize,
    }

    impl<D: TextDecorator> Config<D> {
        /// Limit how deeply nested elements are followed.  Anything nested
        /// more deeply is rendered as an empty container.  Limits above
        /// [`MAX_DEPTH_LIMIT`] are lowered to it.
        pub fn max_depth(mut self, depth: usize) -> Self {
            self.max_depth = depth.min(MAX_DEPTH_LIMIT);
            self
        }

        /// Render a single element (and its subtree) into a block.
        pub fn render_element(&self, element: &Element) -> RenderBlock {
            render_with_depth(element, self.max_depth)
        }

        /// Render the body of a parsed document.
        pub fn render_document(&self, document: &Document) -> RenderTree {
            let root = document.body().or_else(|| document.root());
            RenderTree(match root {
                Some(element) => self.render_element(&element),
                None => RenderBlock::empty(),
            })
        }

        /// Reads HTML from `input` and returns the block tree for its body.
        pub fn tree_from_read<R: std::io::Read>(&self, input: R) -> Result<RenderTree> {
            let document = Document::parse(input)?;
            Ok(self.render_document(&document))
        }

        /// Reads HTML from `input`, and returns a `String` with text wrapped to
        /// `width` columns.
        pub fn string_from_read<R: std::io::Read>(self, input: R, width: usize) -> Result<String> {
            let tree = self.tree_from_read(input)?;
            Ok(tree.render(width, self.decorator)?.into_string())
        }

        /// Reads HTML from `input`, and returns text wrapped to `width` columns.
        /// The text is returned as a `Vec<TaggedLine<_>>`; the annotations are vectors
        /// of the provided text decorator's `Annotation`.  The "outer" annotation comes first in
        /// the `Vec`.
        pub fn lines_from_read<R: std::io::Read>(
            self,
            input: R,
            width: usize,
        ) -> Result<Vec<TaggedLine<Vec<D::Annotation>>>> {
            let tree = self.tree_from_read(input)?;
            Ok(tree.render(width, self.decorator)?.into_lines())
        }
    }

    /// Return a Config initialized with a `RichDecorator`.
    pub fn rich() -> Config<RichDecorator> {
        with_decorator(RichDecorator::new())
    }

    /// Return a Config initialized with a `PlainDecorator`.
    pub fn plain() -> Config<PlainDecorator> {
        with_decorator(PlainDecorator::new())
    }

    /// Return a Config initialized with a custom decorator.
    pub fn with_decorator<D: TextDecorator>(decorator: D) -> Config<D> {
        Config {
            decorator,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// The block structure of an HTML document, which can be laid out as text
/// using a [`TextDecorator`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderTree(RenderBlock);

impl RenderTree {
    /// Wrap an already rendered block.
    pub fn new(block: RenderBlock) -> RenderTree {
        RenderTree(block)
    }

    /// The root block of the document.
    pub fn blocks(&self) -> &RenderBlock {
        &self.0
    }

    /// Consume this and return the root block.
    pub fn into_blocks(self) -> RenderBlock {
        self.0
    }

    /// Lay out this document using the given `decorator` and wrap it to `width` columns.
    pub fn render<D: TextDecorator>(&self, width: usize, decorator: D) -> Result<RenderedText<D>> {
        let mut renderer = TextRenderer::new(width, decorator)?;
        renderer.render_block(&self.0)?;
        Ok(RenderedText(renderer))
    }

    /// Lay out this document as plain text using the [`PlainDecorator`].
    pub fn render_plain(&self, width: usize) -> Result<RenderedText<PlainDecorator>> {
        self.render(width, PlainDecorator::new())
    }

    /// Lay out this document as rich text using the [`RichDecorator`].
    pub fn render_rich(&self, width: usize) -> Result<RenderedText<RichDecorator>> {
        self.render(width, RichDecorator::new())
    }
}

/// A rendered HTML document.
pub struct RenderedText<D: TextDecorator>(TextRenderer<D>);

impl<D: TextDecorator> RenderedText<D> {
    /// Convert the rendered HTML document to a string.
    pub fn into_string(self) -> String {
        self.0.into_string()
    }

    /// Convert the rendered HTML document to a vector of lines with the annotations created by the
    /// decorator.
    pub fn into_lines(self) -> Vec<TaggedLine<Vec<D::Annotation>>> {
        self.0.into_lines()
    }
}

/// Reads and parses HTML from `input` and prepares a render tree.
pub fn parse(input: impl io::Read) -> Result<RenderTree> {
    config::plain().tree_from_read(input)
}

/// Reads HTML from `input`, decorates it using `decorator`, and
/// returns a `String` with text wrapped to `width` columns.
pub fn from_read_with_decorator<R, D>(input: R, width: usize, decorator: D) -> Result<String>
where
    R: io::Read,
    D: TextDecorator,
{
    config::with_decorator(decorator).string_from_read(input, width)
}

/// Reads HTML from `input`, and returns a `String` with text wrapped to
/// `width` columns.
pub fn from_read<R>(input: R, width: usize) -> Result<String>
where
    R: io::Read,
{
    config::plain().string_from_read(input, width)
}

/// Reads HTML from `input`, and returns text wrapped to `width` columns.
/// The text is returned as a `Vec<TaggedLine<_>>`; the annotations are vectors
/// of `RichAnnotation`.  The "outer" annotation comes first in the `Vec`.
pub fn from_read_rich<R>(input: R, width: usize) -> Result<Vec<TaggedLine<Vec<RichAnnotation>>>>
where
    R: io::Read,
{
    config::rich().lines_from_read(input, width)
}

#[cfg(test)]
mod tests;
