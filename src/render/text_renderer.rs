//! Layout of render blocks as lines of text.
//!
//! This module implements helpers and concrete types for turning a
//! [`RenderBlock`] tree into wrapped lines, with the styling either spelled
//! out in the text ([`PlainDecorator`]) or attached as annotations
//! ([`RichDecorator`]).

use std::fmt::Debug;
use std::mem;

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::blocks::{ListMarker, RenderBlock, RuleKind, TableRow};
use crate::inline::{InlineStyle, StyledText};
use crate::{Error, Result};

/// A wrapper around a String with extra metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaggedString<T> {
    /// The wrapped text.
    pub s: String,
    /// The metadata.
    pub tag: T,
}

/// A line of tagged text (composed of a set of `TaggedString`s).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaggedLine<T> {
    v: Vec<TaggedString<T>>,
}

impl<T> Default for TaggedLine<T> {
    fn default() -> Self {
        TaggedLine { v: Vec::new() }
    }
}

impl<T: Debug + Eq + PartialEq + Clone> TaggedLine<T> {
    /// Create an empty `TaggedLine`.
    pub fn new() -> TaggedLine<T> {
        TaggedLine { v: Vec::new() }
    }

    /// Create a new TaggedLine from a string and tag.
    pub fn from_string(s: String, tag: &T) -> TaggedLine<T> {
        let mut line = TaggedLine::new();
        line.push(TaggedString {
            s,
            tag: tag.clone(),
        });
        line
    }

    /// Join the line into a String ignoring the tags.
    pub fn into_string(self) -> String {
        self.v.into_iter().map(|ts| ts.s).collect()
    }

    /// Return true if the line has no text.
    pub fn is_empty(&self) -> bool {
        self.v.is_empty()
    }

    /// Add a new fragment to the line.  Empty fragments are dropped, and a
    /// fragment with the same tag as the last one is merged into it.
    pub fn push(&mut self, ts: TaggedString<T>) {
        if ts.s.is_empty() {
            return;
        }
        match self.v.last_mut() {
            Some(last) if last.tag == ts.tag => last.s.push_str(&ts.s),
            _ => self.v.push(ts),
        }
    }

    /// Add a string with a particular tag.
    pub fn push_str(&mut self, s: &str, tag: &T) {
        self.push(TaggedString {
            s: s.into(),
            tag: tag.clone(),
        });
    }

    /// Add a new fragment to the start of the line
    pub fn insert_front(&mut self, ts: TaggedString<T>) {
        if ts.s.is_empty() {
            return;
        }
        match self.v.first_mut() {
            Some(first) if first.tag == ts.tag => first.s.insert_str(0, &ts.s),
            _ => self.v.insert(0, ts),
        }
    }

    /// Add text with a particular tag to self
    pub fn push_char(&mut self, c: char, tag: &T) {
        match self.v.last_mut() {
            Some(last) if last.tag == *tag => last.s.push(c),
            _ => self.v.push(TaggedString {
                s: c.to_string(),
                tag: tag.clone(),
            }),
        }
    }

    /// Move all the fragments of `tl` onto the end of self.
    fn consume(&mut self, tl: TaggedLine<T>) {
        for ts in tl.v {
            self.push(ts);
        }
    }

    /// Iterator over (string, tag) pairs
    pub fn iter(&self) -> impl Iterator<Item = (&str, &T)> + '_ {
        self.v.iter().map(|ts| (ts.s.as_str(), &ts.tag))
    }

    /// Return the width of the line in cells
    pub fn width(&self) -> usize {
        self.v.iter().map(|ts| ts.s.width()).sum()
    }

    /// Pad this line to width with spaces (or if already at least this wide, do
    /// nothing).
    pub fn pad_to(&mut self, width: usize, tag: &T) {
        let my_width = self.width();
        if width > my_width {
            self.push_str(&" ".repeat(width - my_width), tag);
        }
    }
}

/// A type to build up wrapped text, allowing extra metadata for
/// spans.
#[derive(Debug)]
struct WrappedBlock<T> {
    width: usize,
    text: Vec<TaggedLine<T>>,
    line: TaggedLine<T>,
    linelen: usize,
    spacetag: Option<T>, // Tag for the whitespace before the current word
    word: TaggedLine<T>, // The current word (with no whitespace).
    wordlen: usize,
}

impl<T: Clone + Eq + Debug + Default> WrappedBlock<T> {
    fn new(width: usize) -> WrappedBlock<T> {
        WrappedBlock {
            width,
            text: Vec::new(),
            line: TaggedLine::new(),
            linelen: 0,
            spacetag: None,
            word: TaggedLine::new(),
            wordlen: 0,
        }
    }

    fn flush_word(&mut self) {
        html_trace_quiet!("flush_word: word={:?}, linelen={}", self.word, self.linelen);
        if self.word.is_empty() {
            return;
        }
        let word = mem::take(&mut self.word);
        let wordlen = mem::replace(&mut self.wordlen, 0);
        let space_needed = wordlen + usize::from(self.linelen > 0);
        if space_needed <= self.width.saturating_sub(self.linelen) {
            if self.linelen > 0 {
                let tag = self.spacetag.take().unwrap_or_default();
                self.line.push_char(' ', &tag);
                self.linelen += 1;
            }
            self.line.consume(word);
            self.linelen += wordlen;
        } else {
            self.flush_line();
            if wordlen <= self.width {
                self.line = word;
                self.linelen = wordlen;
            } else {
                // Too long for any line; split it wherever it overflows.
                for (s, tag) in word.iter() {
                    for c in s.chars() {
                        let c_w = c.width().unwrap_or(0);
                        if self.linelen + c_w > self.width && self.linelen > 0 {
                            self.flush_line();
                        }
                        self.line.push_char(c, tag);
                        self.linelen += c_w;
                    }
                }
            }
        }
        self.spacetag = None;
    }

    fn flush_line(&mut self) {
        if !self.line.is_empty() {
            self.text.push(mem::take(&mut self.line));
            self.linelen = 0;
        }
    }

    /// End the current line even if it is empty.
    fn force_line_break(&mut self) {
        self.flush_word();
        self.text.push(mem::take(&mut self.line));
        self.linelen = 0;
    }

    /// Consume self and return vector of lines including annotations.
    fn into_lines(mut self) -> Vec<TaggedLine<T>> {
        self.flush_word();
        self.flush_line();
        self.text
    }

    fn add_text(&mut self, text: &str, tag: &T) {
        html_trace!("WrappedBlock::add_text({}), {:?}", text, tag);
        for c in text.chars() {
            if c.is_whitespace() {
                // Whitespace is mostly ignored, except to terminate words.
                self.flush_word();
                self.spacetag = Some(tag.clone());
            } else if let Some(charwidth) = c.width() {
                self.word.push_char(c, tag);
                self.wordlen += charwidth;
            }
        }
    }
}

/// Allow decorating/styling text.
pub trait TextDecorator {
    /// An annotation which can be added to text, and which will
    /// be attached to spans of text.
    type Annotation: Eq + PartialEq + Debug + Clone + Default;

    /// Return an annotation and rendering prefix for a link.
    fn decorate_link_start(&mut self, url: &str) -> (String, Self::Annotation);

    /// Return a suffix for after a link.
    fn decorate_link_end(&mut self) -> String;

    /// Return an annotation and rendering prefix for text in an inline style.
    fn decorate_style_start(&mut self, style: InlineStyle) -> (String, Self::Annotation);

    /// Return a suffix for after text in an inline style.
    fn decorate_style_end(&mut self, style: InlineStyle) -> String;

    /// Return an annotation for the text of a heading.
    fn decorate_heading(&mut self, level: u8) -> Self::Annotation;

    /// Return an annotation for the text of a table header cell.
    fn decorate_table_header(&mut self) -> Self::Annotation;

    /// Return an annotation for the first line of preformatted text.
    fn decorate_preformat_first(&mut self) -> Self::Annotation;

    /// Return an annotation for a continuation line when a preformatted
    /// line doesn't fit.
    fn decorate_preformat_cont(&mut self) -> Self::Annotation;

    /// Return an annotation and rendering text for an image placeholder.
    fn decorate_image(&mut self, src: &str, alt: &str) -> (String, Self::Annotation);

    /// The prefix for the first line of a heading.
    fn header_prefix(&self, level: u8) -> String {
        format!("{} ", "#".repeat(level.into()))
    }

    /// The prefix for each line of a block quote.
    fn quote_prefix(&self) -> String {
        "> ".into()
    }

    /// The prefix for the first line of an unordered list item.
    fn unordered_item_prefix(&self) -> String;

    /// The prefix for the first line of item `i` (1-based) of an ordered list.
    fn ordered_item_prefix(&self, i: usize) -> String {
        format!("{}. ", i)
    }

    /// Finish with a document, and return extra lines (eg footnotes)
    /// to add to the rendered text.
    fn finalise(self) -> Vec<TaggedLine<Self::Annotation>>;
}

/// A decorator for use with `TextRenderer` which outputs plain UTF-8 text
/// with no annotations.  Markup is rendered as text characters or footnotes.
#[derive(Clone, Debug, Default)]
pub struct PlainDecorator {
    links: Vec<String>,
}

impl PlainDecorator {
    /// Create a new `PlainDecorator`.
    pub fn new() -> PlainDecorator {
        PlainDecorator { links: Vec::new() }
    }

    fn markers(style: InlineStyle) -> (&'static str, &'static str) {
        match style {
            InlineStyle::Bold => ("**", "**"),
            InlineStyle::Italic => ("*", "*"),
            InlineStyle::Underline => ("_", "_"),
            InlineStyle::Strikethrough => ("~~", "~~"),
            InlineStyle::Superscript => ("^{", "}"),
            InlineStyle::Subscript => ("_{", "}"),
            InlineStyle::Code => ("`", "`"),
        }
    }
}

impl TextDecorator for PlainDecorator {
    type Annotation = ();

    fn decorate_link_start(&mut self, url: &str) -> (String, Self::Annotation) {
        self.links.push(url.to_string());
        ("[".to_string(), ())
    }

    fn decorate_link_end(&mut self) -> String {
        format!("][{}]", self.links.len())
    }

    fn decorate_style_start(&mut self, style: InlineStyle) -> (String, Self::Annotation) {
        (PlainDecorator::markers(style).0.to_string(), ())
    }

    fn decorate_style_end(&mut self, style: InlineStyle) -> String {
        PlainDecorator::markers(style).1.to_string()
    }

    fn decorate_heading(&mut self, _level: u8) -> Self::Annotation {}

    fn decorate_table_header(&mut self) -> Self::Annotation {}

    fn decorate_preformat_first(&mut self) -> Self::Annotation {}

    fn decorate_preformat_cont(&mut self) -> Self::Annotation {}

    fn decorate_image(&mut self, src: &str, alt: &str) -> (String, Self::Annotation) {
        let title = if alt.is_empty() { src } else { alt };
        (format!("[Image: {}]", title), ())
    }

    fn unordered_item_prefix(&self) -> String {
        "* ".into()
    }

    fn finalise(self) -> Vec<TaggedLine<()>> {
        self.links
            .into_iter()
            .enumerate()
            .map(|(idx, s)| TaggedLine::from_string(format!("[{}] {}", idx + 1, s), &()))
            .collect()
    }
}

/// A decorator to generate rich text (styled) rather than
/// pure text output.
#[derive(Clone, Debug, Default)]
pub struct RichDecorator {}

/// Annotation type for "rich" text.  Text is associated with a set of
/// these.
#[derive(PartialEq, Eq, Clone, Debug, Default)]
#[non_exhaustive]
pub enum RichAnnotation {
    /// Normal text.
    #[default]
    Default,
    /// A link with the target.
    Link(String),
    /// An image placeholder, with the image source.
    Image(String),
    /// Strong text, also used for headings and table headers.
    Strong,
    /// Emphasised text.
    Emphasis,
    /// Underlined text.
    Underline,
    /// Struck-out text.
    Strikeout,
    /// Superscript text.
    Superscript,
    /// Subscript text.
    Subscript,
    /// Code
    Code,
    /// Preformatted; true if a continuation line for an overly-long line.
    Preformat(bool),
}

impl RichDecorator {
    /// Create a new `RichDecorator`.
    pub fn new() -> RichDecorator {
        RichDecorator {}
    }
}

impl TextDecorator for RichDecorator {
    type Annotation = RichAnnotation;

    fn decorate_link_start(&mut self, url: &str) -> (String, Self::Annotation) {
        (String::new(), RichAnnotation::Link(url.to_string()))
    }

    fn decorate_link_end(&mut self) -> String {
        String::new()
    }

    fn decorate_style_start(&mut self, style: InlineStyle) -> (String, Self::Annotation) {
        let annotation = match style {
            InlineStyle::Bold => RichAnnotation::Strong,
            InlineStyle::Italic => RichAnnotation::Emphasis,
            InlineStyle::Underline => RichAnnotation::Underline,
            InlineStyle::Strikethrough => RichAnnotation::Strikeout,
            InlineStyle::Superscript => RichAnnotation::Superscript,
            InlineStyle::Subscript => RichAnnotation::Subscript,
            InlineStyle::Code => RichAnnotation::Code,
        };
        (String::new(), annotation)
    }

    fn decorate_style_end(&mut self, _style: InlineStyle) -> String {
        String::new()
    }

    fn decorate_heading(&mut self, _level: u8) -> Self::Annotation {
        RichAnnotation::Strong
    }

    fn decorate_table_header(&mut self) -> Self::Annotation {
        RichAnnotation::Strong
    }

    fn decorate_preformat_first(&mut self) -> Self::Annotation {
        RichAnnotation::Preformat(false)
    }

    fn decorate_preformat_cont(&mut self) -> Self::Annotation {
        RichAnnotation::Preformat(true)
    }

    fn decorate_image(&mut self, src: &str, alt: &str) -> (String, Self::Annotation) {
        let title = if alt.is_empty() { src } else { alt };
        (title.to_string(), RichAnnotation::Image(src.to_string()))
    }

    fn unordered_item_prefix(&self) -> String {
        "• ".into()
    }

    fn finalise(self) -> Vec<TaggedLine<RichAnnotation>> {
        Vec::new()
    }
}

/// Text put in front of the lines of a nested block.
#[derive(Debug)]
struct Prefix {
    /// Used once, for the next line output.
    first: Option<String>,
    /// Used for every other line.
    rest: String,
    /// The number of output lines when this prefix was pushed.
    start: usize,
}

/// Work left to do while laying out a block tree.
enum Step<'b> {
    Render(&'b RenderBlock),
    Item(String, &'b StyledText),
    PopPrefix,
    StartBlock,
}

/// A renderer which lays out render blocks as lines of text, with
/// annotations depending on a decorator.
pub struct TextRenderer<D: TextDecorator> {
    width: usize,
    decorator: D,
    lines: Vec<TaggedLine<Vec<D::Annotation>>>,
    prefixes: Vec<Prefix>,
    /// Set at the end of a block, meaning a blank line should be added
    /// before any more output.
    pending_blank: bool,
}

impl<D: TextDecorator> TextRenderer<D> {
    /// Construct a new empty TextRenderer.
    pub fn new(width: usize, decorator: D) -> Result<TextRenderer<D>> {
        html_trace!("new({})", width);
        if width == 0 {
            return Err(Error::TooNarrow);
        }
        Ok(TextRenderer {
            width,
            decorator,
            lines: Vec::new(),
            prefixes: Vec::new(),
            pending_blank: false,
        })
    }

    /// The width available for text inside the current prefixes.
    fn inner_width(&self) -> Result<usize> {
        let used: usize = self.prefixes.iter().map(|p| p.rest.width()).sum();
        match self.width.checked_sub(used) {
            Some(w) if w > 0 => Ok(w),
            _ => Err(Error::TooNarrow),
        }
    }

    /// Separate what follows from any output since the enclosing prefix.
    fn start_block(&mut self) {
        let start = self.prefixes.last().map_or(0, |p| p.start);
        if self.lines.len() > start {
            self.pending_blank = true;
        }
    }

    fn flush_blank(&mut self) {
        if mem::take(&mut self.pending_blank) {
            self.blank_line();
        }
    }

    /// An empty line, apart from any quote markers.
    fn blank_line(&mut self) {
        let prefix: String = self.prefixes.iter().map(|p| p.rest.as_str()).collect();
        self.lines
            .push(TaggedLine::from_string(prefix.trim_end().to_string(), &Vec::new()));
    }

    /// Push a prefix; `first` is padded to the width of `rest`.
    fn push_prefix(&mut self, first: Option<String>, rest: String) {
        self.flush_blank();
        let first = first.map(|mut s| {
            let pad = rest.width().saturating_sub(s.width());
            s.push_str(&" ".repeat(pad));
            s
        });
        self.prefixes.push(Prefix {
            first,
            rest,
            start: self.lines.len(),
        });
    }

    /// Add a finished line of output, behind the current prefixes.
    fn emit(&mut self, mut line: TaggedLine<Vec<D::Annotation>>) {
        self.flush_blank();
        for prefix in self.prefixes.iter_mut().rev() {
            let s = prefix.first.take().unwrap_or_else(|| prefix.rest.clone());
            line.insert_front(TaggedString { s, tag: Vec::new() });
        }
        self.lines.push(line);
    }

    /// A line holding only the current prefixes, without trailing spaces.
    fn emit_bare_prefix(&mut self) {
        self.flush_blank();
        let mut prefix = String::new();
        for p in self.prefixes.iter_mut() {
            prefix.push_str(&p.first.take().unwrap_or_else(|| p.rest.clone()));
        }
        self.lines
            .push(TaggedLine::from_string(prefix.trim_end().to_string(), &Vec::new()));
    }

    /// Lay out a block tree.
    pub fn render_block(&mut self, top: &RenderBlock) -> Result<()> {
        let mut steps = vec![Step::Render(top)];
        while let Some(step) = steps.pop() {
            match step {
                Step::Render(block) => self.render_one(block, &mut steps)?,
                Step::Item(prefix, body) => {
                    let rest = " ".repeat(prefix.width());
                    self.push_prefix(Some(prefix), rest);
                    self.render_styled(body, Vec::new())?;
                    if self.prefixes.last().is_some_and(|p| p.first.is_some()) {
                        // Nothing was written, so the marker goes on a line of its own.
                        self.emit_bare_prefix();
                    }
                    self.prefixes.pop();
                }
                Step::PopPrefix => {
                    self.prefixes.pop();
                }
                Step::StartBlock => self.start_block(),
            }
        }
        Ok(())
    }

    /// Render one block, queueing anything which has to wait for its
    /// children onto `steps`.
    fn render_one<'b>(&mut self, block: &'b RenderBlock, steps: &mut Vec<Step<'b>>) -> Result<()> {
        use RenderBlock::*;
        html_trace_quiet!("render_one: {:?}", block);
        match block {
            Container(children) | GenericContainer(children) => {
                steps.extend(children.iter().rev().map(Step::Render));
            }
            Paragraph(text) => {
                self.start_block();
                self.render_styled(text, Vec::new())?;
                self.start_block();
            }
            Heading(level, text) => {
                self.start_block();
                let prefix = self.decorator.header_prefix(*level);
                let rest = " ".repeat(prefix.width());
                self.push_prefix(Some(prefix), rest);
                let tag = vec![self.decorator.decorate_heading(*level)];
                self.render_styled(text, tag)?;
                self.prefixes.pop();
                self.start_block();
            }
            UnorderedList(items) | OrderedList(items) => {
                self.start_block();
                steps.push(Step::StartBlock);
                let prefixes = self.item_prefixes(items);
                for (item, prefix) in items.iter().zip(prefixes).rev() {
                    steps.push(match (item, prefix) {
                        (ListItem(_, body), Some(prefix)) => Step::Item(prefix, body),
                        _ => Step::Render(item),
                    });
                }
            }
            ListItem(marker, body) => {
                let prefix = self.marker_prefix(marker.unwrap_or(ListMarker::Bullet));
                steps.push(Step::Item(prefix, body));
            }
            Link(href, text) => {
                self.start_block();
                let (start, ann) = self.decorator.decorate_link_start(href);
                let end = self.decorator.decorate_link_end();
                self.render_text(&[start.as_str(), text.as_str(), end.as_str()], vec![ann])?;
                self.start_block();
            }
            ImagePlaceholder(src, alt) => {
                self.start_block();
                let (text, ann) = self.decorator.decorate_image(src, alt);
                self.render_text(&[text.as_str()], vec![ann])?;
                self.start_block();
            }
            Rule(RuleKind::Divider) => {
                self.start_block();
                let width = self.inner_width()?;
                self.emit(TaggedLine::from_string("─".repeat(width), &Vec::new()));
                self.start_block();
            }
            Rule(RuleKind::Spacer) => {
                // Stands in for the blank line the previous block asked for.
                self.pending_blank = false;
                self.blank_line();
            }
            Blockquote(children) => {
                self.start_block();
                let prefix = self.decorator.quote_prefix();
                self.push_prefix(None, prefix);
                steps.push(Step::StartBlock);
                steps.push(Step::PopPrefix);
                steps.extend(children.iter().rev().map(Step::Render));
            }
            Preformatted(text) => {
                self.start_block();
                self.render_pre(text)?;
                self.start_block();
            }
            InlineCode(text) => {
                let (start, ann) = self.decorator.decorate_style_start(InlineStyle::Code);
                let end = self.decorator.decorate_style_end(InlineStyle::Code);
                self.render_text(&[start.as_str(), text.as_str(), end.as_str()], vec![ann])?;
            }
            Table(rows) => {
                self.start_block();
                self.render_table(rows)?;
                self.start_block();
            }
            GenericLeaf(text) => self.render_styled(text, Vec::new())?,
        }
        Ok(())
    }

    fn marker_prefix(&self, marker: ListMarker) -> String {
        match marker {
            ListMarker::Bullet => self.decorator.unordered_item_prefix(),
            ListMarker::Number(i) => self.decorator.ordered_item_prefix(i),
        }
    }

    /// The prefix for each list item, padded to a common width.  Entries
    /// which aren't list items get `None`.
    fn item_prefixes(&self, items: &[RenderBlock]) -> Vec<Option<String>> {
        let prefixes: Vec<Option<String>> = items
            .iter()
            .map(|item| match item {
                RenderBlock::ListItem(marker, _) => {
                    Some(self.marker_prefix(marker.unwrap_or(ListMarker::Bullet)))
                }
                _ => None,
            })
            .collect();
        let widest = prefixes.iter().flatten().map(|p| p.width()).max().unwrap_or(0);
        prefixes
            .into_iter()
            .map(|p| {
                p.map(|mut p| {
                    let pad = widest - p.width();
                    p.push_str(&" ".repeat(pad));
                    p
                })
            })
            .collect()
    }

    /// Wrap a styled body and emit it, with `base` annotations on all of it.
    fn render_styled(&mut self, text: &StyledText, base: Vec<D::Annotation>) -> Result<()> {
        let mut wrapped = WrappedBlock::new(self.inner_width()?);
        for run in text {
            if run.is_line_break() {
                wrapped.force_line_break();
                continue;
            }
            let mut tag = base.clone();
            let body = run.text().trim_start();
            if body.len() < run.text().len() {
                wrapped.add_text(" ", &tag);
            }
            let trimmed = body.trim_end();
            if !trimmed.is_empty() {
                let styles: Vec<InlineStyle> = run.style().iter().collect();
                for &style in &styles {
                    let (start, ann) = self.decorator.decorate_style_start(style);
                    tag.push(ann);
                    wrapped.add_text(&start, &tag);
                }
                wrapped.add_text(trimmed, &tag);
                for &style in styles.iter().rev() {
                    let end = self.decorator.decorate_style_end(style);
                    wrapped.add_text(&end, &tag);
                }
            }
            if trimmed.len() < body.len() {
                wrapped.add_text(" ", &base);
            }
        }
        for line in wrapped.into_lines() {
            self.emit(line);
        }
        Ok(())
    }

    /// Wrap some pieces of text which share the same annotations.
    fn render_text(&mut self, pieces: &[&str], tag: Vec<D::Annotation>) -> Result<()> {
        let mut wrapped = WrappedBlock::new(self.inner_width()?);
        for piece in pieces {
            wrapped.add_text(piece, &tag);
        }
        for line in wrapped.into_lines() {
            self.emit(line);
        }
        Ok(())
    }

    fn render_pre(&mut self, text: &str) -> Result<()> {
        let width = self.inner_width()?;
        let tag_first = vec![self.decorator.decorate_preformat_first()];
        let tag_cont = vec![self.decorator.decorate_preformat_cont()];
        for line in text.lines() {
            for (i, piece) in split_to_width(line, width).into_iter().enumerate() {
                let tag = if i == 0 { &tag_first } else { &tag_cont };
                self.emit(TaggedLine::from_string(piece, tag));
            }
        }
        Ok(())
    }

    fn render_table(&mut self, rows: &[TableRow]) -> Result<()> {
        const SEPARATOR: &str = " │ ";
        let width = self.inner_width()?;
        let columns = rows.iter().map(|row| row.cells.len()).max().unwrap_or(0);
        if columns == 0 {
            return Ok(());
        }
        let borders = SEPARATOR.width() * (columns - 1);
        let col_width = width.saturating_sub(borders) / columns;
        let header_tag = vec![self.decorator.decorate_table_header()];

        for (row_index, row) in rows.iter().enumerate() {
            if row_index > 0 {
                self.emit(TaggedLine::from_string("─".repeat(width), &Vec::new()));
            }
            if col_width == 0 {
                html_trace!("render_table: {} columns don't fit in {}", columns, width);
                // Too narrow for columns; stack the cells instead.
                for cell in &row.cells {
                    let tag = if cell.header { header_tag.clone() } else { Vec::new() };
                    self.render_text(&[cell.text.as_str()], tag)?;
                }
                continue;
            }
            let cell_lines: Vec<Vec<TaggedLine<Vec<D::Annotation>>>> = (0..columns)
                .map(|col| match row.cells.get(col) {
                    Some(cell) => {
                        let tag = if cell.header { header_tag.clone() } else { Vec::new() };
                        let mut wrapped = WrappedBlock::new(col_width);
                        wrapped.add_text(&cell.text, &tag);
                        wrapped.into_lines()
                    }
                    None => Vec::new(),
                })
                .collect();
            let height = cell_lines.iter().map(Vec::len).max().unwrap_or(0).max(1);
            for line_index in 0..height {
                let mut line = TaggedLine::new();
                for (col, lines) in cell_lines.iter().enumerate() {
                    if col > 0 {
                        line.push_str(SEPARATOR, &Vec::new());
                    }
                    if let Some(cell_line) = lines.get(line_index) {
                        line.consume(cell_line.clone());
                    }
                    if col + 1 < columns {
                        line.pad_to((col + 1) * col_width + col * SEPARATOR.width(), &Vec::new());
                    }
                }
                self.emit(line);
            }
        }
        Ok(())
    }

    /// Consumes this renderer and return a multiline `String` with the result.
    pub fn into_string(self) -> String {
        let mut result = String::new();
        for line in self.into_lines() {
            result.push_str(&line.into_string());
            result.push('\n');
        }
        html_trace!("into_string({:?})", result);
        result
    }

    /// Returns a `Vec` of `TaggedLine`s with the rendered text.
    pub fn into_lines(mut self) -> Vec<TaggedLine<Vec<D::Annotation>>> {
        // And add the links
        let trailer = self.decorator.finalise();
        if !trailer.is_empty() {
            if !self.lines.is_empty() {
                self.lines.push(TaggedLine::new());
            }
            for line in trailer {
                // Hard wrap
                let text = line.into_string().replace('\n', " ");
                for piece in split_to_width(&text, self.width) {
                    self.lines.push(TaggedLine::from_string(piece, &Vec::new()));
                }
            }
        }
        self.lines
    }
}

/// Split `text` into pieces no wider than `width` cells.  A character wider
/// than `width` gets a piece to itself.
fn split_to_width(text: &str, width: usize) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut piece = String::new();
    let mut pos = 0;
    for c in text.chars() {
        let c_width = c.width().unwrap_or(0);
        if pos + c_width > width && !piece.is_empty() {
            pieces.push(mem::take(&mut piece));
            pos = 0;
        }
        piece.push(c);
        pos += c_width;
    }
    pieces.push(piece);
    pieces
}
