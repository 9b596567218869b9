use crate::blocks::{ListMarker, RenderBlock, RuleKind, TableCell, TableRow};
use crate::config::{self, Config};
use crate::dom::Document;
use crate::inline::{compose_inline, InlineStyle, StyleSet, StyledRun, StyledText};
use crate::render::text_renderer::{PlainDecorator, RichAnnotation, RichDecorator, TaggedLine};
use crate::{
    from_read, from_read_rich, from_read_with_decorator, parse, render, render_with_depth, Error,
    RenderTree,
};

/// Like assert_eq!(), but prints out the results normally as well
macro_rules! assert_eq_str {
    ($a:expr, $b:expr) => {
        if $a != $b {
            println!("<<<\n{}===\n{}>>>", $a, $b);
            assert_eq!($a, $b);
        }
    };
}
#[track_caller]
fn test_html(input: &[u8], expected: &str, width: usize) {
    let output = from_read(input, width).unwrap();
    assert_eq_str!(output, expected);
}
#[track_caller]
fn test_html_conf<F>(input: &[u8], expected: &str, width: usize, conf: F)
where
    F: Fn(Config<PlainDecorator>) -> Config<PlainDecorator>,
{
    let result = conf(config::plain())
        .string_from_read(input, width)
        .unwrap();
    assert_eq_str!(result, expected);
}
#[track_caller]
fn test_html_err(input: &[u8], expected: Error, width: usize) {
    let result = from_read(input, width);
    match result {
        Err(e) => assert_eq!(e, expected),
        Ok(text) => panic!("Expected error, got: [[{}]]", text),
    }
}
/// The blocks for the document body.
#[track_caller]
fn test_blocks(input: &str) -> Vec<RenderBlock> {
    match parse(input.as_bytes()).unwrap().into_blocks() {
        RenderBlock::GenericContainer(blocks) => blocks,
        other => panic!("Unexpected body block: {:?}", other),
    }
}
/// The block for the first element of the body.
#[track_caller]
fn test_block(input: &str) -> RenderBlock {
    test_blocks(input).remove(0)
}

fn run(text: &str, styles: &[InlineStyle]) -> StyledRun {
    StyledRun::new(text, styles.iter().copied().collect())
}

fn runs(block: &RenderBlock) -> &[StyledRun] {
    match block {
        RenderBlock::Paragraph(text)
        | RenderBlock::Heading(_, text)
        | RenderBlock::ListItem(_, text)
        | RenderBlock::GenericLeaf(text) => text.runs(),
        other => panic!("No styled text in {:?}", other),
    }
}

fn element_count(html: &str) -> usize {
    Document::parse_str(html).body().unwrap().descendants().count() + 1
}

#[test]
fn test_nested_styles_commute() {
    use InlineStyle::*;
    let bi = test_block("<p><b><i>X</i></b></p>");
    let ib = test_block("<p><i><b>X</b></i></p>");
    assert_eq!(runs(&bi), &[run("X", &[Bold, Italic])]);
    assert_eq!(runs(&bi), runs(&ib));
}

#[test]
fn test_style_aliases() {
    use InlineStyle::*;
    let p = test_block(
        "<p><strong>a</strong><em>b</em><u>c</u><del>d</del><strike>e</strike>\
         <sup>f</sup><sub>g</sub><code>h</code></p>",
    );
    assert_eq!(
        runs(&p),
        &[
            run("a", &[Bold]),
            run("b", &[Italic]),
            run("c", &[Underline]),
            run("d", &[Strikethrough]),
            run("e", &[Strikethrough]),
            run("f", &[Superscript]),
            run("g", &[Subscript]),
            run("h", &[Code]),
        ]
    );
}

#[test]
fn test_style_scope_ends_with_element() {
    use InlineStyle::*;
    let p = test_block("<p>a <b>b <i>c</i> d</b> e</p>");
    assert_eq!(
        runs(&p),
        &[
            run("a ", &[]),
            run("b ", &[Bold]),
            run("c", &[Bold, Italic]),
            run(" d", &[Bold]),
            run(" e", &[]),
        ]
    );
}

#[test]
fn test_adjacent_runs_not_merged() {
    let p = test_block("<p><b>a</b><b>b</b></p>");
    let bold = StyleSet::empty().with(InlineStyle::Bold);
    assert_eq!(
        runs(&p),
        &[StyledRun::new("a", bold), StyledRun::new("b", bold)]
    );
}

#[test]
fn test_line_break_run_keeps_style() {
    let p = test_block("<p><i>one<br>two</i></p>");
    let italic = StyleSet::empty().with(InlineStyle::Italic);
    assert_eq!(
        runs(&p),
        &[
            StyledRun::new("one", italic),
            StyledRun::new("\n", italic),
            StyledRun::new("two", italic),
        ]
    );
    assert!(runs(&p)[1].is_line_break());
}

#[test]
fn test_whitespace_collapsed_across_runs() {
    let p = test_block("<p>\n   lots   of\n\t<b>  space </b>  here  </p>");
    assert_eq!(
        runs(&p),
        &[
            run("lots of ", &[]),
            run("space ", &[InlineStyle::Bold]),
            run("here", &[]),
        ]
    );
}

#[test]
fn test_unknown_inline_is_transparent() {
    let p = test_block("<p><b><font>x</font></b></p>");
    assert_eq!(runs(&p), &[run("x", &[InlineStyle::Bold])]);
}

#[test]
fn test_compose_inline_on_element() {
    let doc = Document::parse_str("<p>a<sup>2</sup></p>");
    let p = doc.body().unwrap().child_elements().remove(0);
    let text = compose_inline(&p);
    assert_eq!(text.to_plain_string(), "a2");
    assert_eq!(text.runs().len(), 2);
}

#[test]
fn test_headings() {
    for level in 1..=6u8 {
        let html = format!("<h{0}>Title <em>{0}</em></h{0}>", level);
        match test_block(&html) {
            RenderBlock::Heading(l, text) => {
                assert_eq!(l, level);
                assert_eq!(text.to_plain_string(), format!("Title {}", level));
            }
            other => panic!("Not a heading: {:?}", other),
        }
    }
}

#[test]
fn test_ordered_markers_ignore_value() {
    let ol = test_block(r#"<ol start="5"><li>a</li><li value="10">b</li></ol>"#);
    assert_eq!(
        ol,
        RenderBlock::OrderedList(vec![
            RenderBlock::ListItem(Some(ListMarker::Number(1)), StyledText::plain("a")),
            RenderBlock::ListItem(Some(ListMarker::Number(2)), StyledText::plain("b")),
        ])
    );
}

#[test]
fn test_unordered_list_collects_nested_items() {
    let ul = test_block("<ul><li>a</li><div><li>b</li></div></ul>");
    assert_eq!(
        ul,
        RenderBlock::UnorderedList(vec![
            RenderBlock::ListItem(Some(ListMarker::Bullet), StyledText::plain("a")),
            RenderBlock::ListItem(Some(ListMarker::Bullet), StyledText::plain("b")),
        ])
    );
}

#[test]
fn test_empty_lists() {
    assert_eq!(test_block("<ul></ul>"), RenderBlock::UnorderedList(vec![]));
    assert_eq!(test_block("<ol> </ol>"), RenderBlock::OrderedList(vec![]));
}

#[test]
fn test_standalone_list_item() {
    assert_eq!(
        test_block("<li>x</li>"),
        RenderBlock::ListItem(None, StyledText::plain("x"))
    );
}

#[test]
fn test_table_cells() {
    let table = test_block("<table><tr><th>A</th><td>B</td></tr></table>");
    assert_eq!(
        table,
        RenderBlock::Table(vec![TableRow {
            cells: vec![TableCell::new("A", true), TableCell::new("B", false)],
        }])
    );
}

#[test]
fn test_table_ragged_rows_kept() {
    let table = test_block(
        "<table><thead><tr><th>h</th></tr></thead>\
         <tbody><tr><td>1</td><td> 2 </td><td>3</td></tr></tbody></table>",
    );
    match table {
        RenderBlock::Table(rows) => {
            assert_eq!(rows.len(), 2);
            assert_eq!(rows[0].cells.len(), 1);
            assert_eq!(rows[1].cells.len(), 3);
            assert_eq!(rows[1].cells[1], TableCell::new("2", false));
        }
        other => panic!("Not a table: {:?}", other),
    }
}

#[test]
fn test_unknown_tag_leaf() {
    assert_eq!(
        test_block("<marquee>hi</marquee>"),
        RenderBlock::GenericLeaf(StyledText::plain("hi"))
    );
}

#[test]
fn test_unknown_tag_with_children() {
    assert_eq!(
        test_block("<section><p>a</p></section>"),
        RenderBlock::GenericContainer(vec![RenderBlock::Paragraph(StyledText::plain("a"))])
    );
}

#[test]
fn test_empty_elements() {
    assert_eq!(test_block("<div></div>"), RenderBlock::Container(vec![]));
    assert_eq!(test_block("<section> </section>"), RenderBlock::empty());
}

#[test]
fn test_div_drops_direct_text() {
    assert_eq!(
        test_block("<div>loose <p>kept</p> text</div>"),
        RenderBlock::Container(vec![RenderBlock::Paragraph(StyledText::plain("kept"))])
    );
}

#[test]
fn test_link() {
    assert_eq!(
        test_block(r#"<a href="https://x.test">Click</a>"#),
        RenderBlock::Link("https://x.test".into(), "Click".into())
    );
    assert_eq!(
        test_block("<a><b>no</b> target</a>"),
        RenderBlock::Link(String::new(), "no target".into())
    );
}

#[test]
fn test_image_and_rules() {
    assert_eq!(
        test_blocks(r#"<img src="i.png" alt="pic"><img><hr><br>"#),
        vec![
            RenderBlock::ImagePlaceholder("i.png".into(), "pic".into()),
            RenderBlock::ImagePlaceholder(String::new(), String::new()),
            RenderBlock::Rule(RuleKind::Divider),
            RenderBlock::Rule(RuleKind::Spacer),
        ]
    );
}

#[test]
fn test_pre_code_and_quote() {
    assert_eq!(
        test_blocks("<pre>  a\n    b</pre><code> x  y </code><blockquote>q<p>r</p></blockquote>"),
        vec![
            RenderBlock::Preformatted("  a\n    b".into()),
            RenderBlock::InlineCode("x y".into()),
            RenderBlock::Blockquote(vec![RenderBlock::Paragraph(StyledText::plain("r"))]),
        ]
    );
}

#[test]
fn test_span_keeps_styles() {
    let span = test_block("<span>a <b>b</b></span>");
    assert_eq!(
        span,
        RenderBlock::GenericLeaf(StyledText::from(vec![
            run("a ", &[]),
            run("b", &[InlineStyle::Bold]),
        ]))
    );
}

#[test]
fn test_render_is_deterministic() {
    let html = "<div><h2>T</h2><ul><li>x <i>y</i></li></ul><table><tr><td>1</td></tr></table></div>";
    let doc = Document::parse_str(html);
    let body = doc.body().unwrap();
    assert_eq!(render(&body), render(&body));
    assert_eq!(parse(html.as_bytes()).unwrap(), parse(html.as_bytes()).unwrap());
}

#[test]
fn test_node_count_linear() {
    let html = "<div><p>a</p><div><span>b</span><ol><li>1</li><li>2</li></ol></div>\
                <marquee><blink>c</blink></marquee><table><tr><td>x</td></tr></table></div>";
    let tree = parse(html.as_bytes()).unwrap();
    assert!(tree.blocks().node_count() <= element_count(html));
}

#[test]
fn test_depth_truncation() {
    let doc = Document::parse_str("<div><div><div><div><p>deep</p></div></div></div></div>");
    let body = doc.body().unwrap();
    let full = render(&body);
    let cut = render_with_depth(&body, 3);
    assert_ne!(full, cut);
    assert_eq!(
        cut,
        RenderBlock::GenericContainer(vec![RenderBlock::Container(vec![
            RenderBlock::Container(vec![RenderBlock::Container(vec![RenderBlock::empty()])])
        ])])
    );
}

#[test]
fn test_config_max_depth() {
    let html = b"<div><div><p>deep</p></div></div><p>top</p>";
    test_html_conf(html, "top\n", 80, |conf| conf.max_depth(2));
    test_html_conf(html, "deep\n\ntop\n", 80, |conf| conf.max_depth(3));
}

#[test]
fn test_config_max_depth_is_capped() {
    let depth = 3000;
    let html = format!("{}x{}", "<div>".repeat(depth), "</div>".repeat(depth));
    let conf = config::plain().max_depth(usize::MAX);
    let block = conf.render_document(&Document::parse_str(&html)).into_blocks();
    assert_eq!(block.node_count(), crate::MAX_DEPTH_LIMIT + 2);
    drop(block);
    assert!(conf.string_from_read(html.as_bytes(), 80).is_ok());
}

#[test]
fn test_inline_depth_truncation() {
    let html = "<p>a<b>b<i>c<u>d</u></i></b></p>";
    let doc = Document::parse_str(html);
    let p = doc.body().unwrap().child_elements().remove(0);
    assert_eq!(
        render_with_depth(&p, 1),
        RenderBlock::Paragraph(StyledText::from(vec![
            run("a", &[]),
            run("b", &[InlineStyle::Bold]),
        ]))
    );
}

#[test]
fn test_very_deep_nesting() {
    let depth = 5000;
    let html = format!("{}x{}", "<div>".repeat(depth), "</div>".repeat(depth));
    let tree = parse(html.as_bytes()).unwrap();
    assert!(tree.blocks().node_count() <= crate::DEFAULT_MAX_DEPTH + 2);
    let text = tree.render_plain(80).unwrap().into_string();
    assert_eq!(text, "");

    let html = format!("<p>{}x{}</p>", "<b>".repeat(depth), "</b>".repeat(depth));
    assert!(from_read(html.as_bytes(), 80).is_ok());
}

#[test]
fn test_title_and_body() {
    let doc = Document::parse_str(
        "<html><head><title>A  <b>title</b></title></head><body><p>text</p></body></html>",
    );
    assert_eq!(doc.title(), "A <b>title</b>");
    let tree = config::plain().render_document(&doc);
    assert_eq!(
        tree,
        RenderTree::new(RenderBlock::GenericContainer(vec![RenderBlock::Paragraph(
            StyledText::plain("text")
        )]))
    );
}

#[test]
fn test_para() {
    test_html(b"<p>Hello <b>world</b></p>", "Hello **world**\n", 80);
}

#[test]
fn test_paras() {
    test_html(b"<p>One</p><p>Two</p>", "One\n\nTwo\n", 80);
}

#[test]
fn test_wrap() {
    test_html(b"<p>one two three</p>", "one two\nthree\n", 7);
}

#[test]
fn test_styles_plain() {
    test_html(
        b"<p><i>it</i> <s>gone</s> <code>x</code> H<sub>2</sub>O</p>",
        "*it* ~~gone~~ `x` H_{2}O\n",
        80,
    );
}

#[test]
fn test_br_in_para() {
    test_html(b"<p>one<br>two</p>", "one\ntwo\n", 80);
}

#[test]
fn test_lists() {
    test_html(b"<ul><li>One</li><li>Two</li></ul>", "* One\n* Two\n", 80);
    test_html(b"<ol><li>a</li><li>b</li></ol>", "1. a\n2. b\n", 80);
}

#[test]
fn test_empty_list_item_keeps_marker() {
    test_html(b"<ul><li></li><li>b</li></ul>", "*\n* b\n", 80);
    test_html(b"<ol><li>a</li><li> </li><li>c</li></ol>", "1. a\n2.\n3. c\n", 80);
    test_html(b"<blockquote><ul><li></li></ul></blockquote>", "> *\n", 80);
}

#[test]
fn test_block_br_is_one_blank_line() {
    test_html(b"<p>a</p><br><p>b</p>", "a\n\n\nb\n", 80);
    test_html(b"<p>a</p><p>b</p>", "a\n\nb\n", 80);
}

#[test]
fn test_list_wrap_and_padding() {
    let items: String = (1..=10).map(|i| format!("<li>i{}</li>", i)).collect();
    let html = format!("<ol>{}</ol>", items);
    let output = from_read(html.as_bytes(), 80).unwrap();
    assert!(output.starts_with("1.  i1\n2.  i2\n"));
    assert!(output.ends_with("10. i10\n"));

    test_html(b"<ul><li>aaa bbb</li></ul>", "* aaa\n  bbb\n", 6);
}

#[test]
fn test_heading() {
    test_html(b"<h1>Title</h1><p>Body</p>", "# Title\n\nBody\n", 80);
    test_html(b"<h3>x</h3>", "### x\n", 80);
}

#[test]
fn test_link_footnote() {
    test_html(
        br#"<p>See</p><a href="https://x.test">Click</a>"#,
        "See\n\n[Click][1]\n\n[1] https://x.test\n",
        80,
    );
}

#[test]
fn test_image() {
    test_html(br#"<img src="a.png" alt="A cat">"#, "[Image: A cat]\n", 80);
    test_html(br#"<img src="a.png">"#, "[Image: a.png]\n", 80);
}

#[test]
fn test_table() {
    test_html(
        b"<table><tr><td>A</td><td>B</td></tr><tr><td>1</td><td>2</td></tr></table>",
        "A    │ B\n───────────\n1    │ 2\n",
        11,
    );
}

#[test]
fn test_table_too_narrow_stacks_cells() {
    test_html(
        b"<table><tr><td>A</td><td>B</td></tr></table>",
        "A\nB\n",
        3,
    );
}

#[test]
fn test_blockquote() {
    test_html(b"<blockquote><p>quoted</p></blockquote>", "> quoted\n", 80);
    test_html(
        b"<p>a</p><blockquote><p>b</p><p>c</p></blockquote><p>d</p>",
        "a\n\n> b\n>\n> c\n\nd\n",
        80,
    );
}

#[test]
fn test_hr() {
    test_html(b"<p>a</p><hr><p>b</p>", "a\n\n─────\n\nb\n", 5);
}

#[test]
fn test_pre() {
    test_html(b"<pre>  a\n    b</pre>", "  a\n    b\n", 80);
    test_html(b"<pre>abcdef</pre>", "abcd\nef\n", 4);
}

#[test]
fn test_unknown_and_empty() {
    test_html(b"<marquee>hi</marquee>", "hi\n", 80);
    test_html(b"<div></div>", "", 80);
}

#[test]
fn test_too_narrow() {
    test_html_err(b"<p>x</p>", Error::TooNarrow, 0);
    test_html_err(b"<blockquote><p>x</p></blockquote>", Error::TooNarrow, 2);
}

#[test]
fn test_read_error() {
    struct Failing;
    impl std::io::Read for Failing {
        fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
            Err(std::io::Error::new(std::io::ErrorKind::Other, "boom"))
        }
    }
    assert_eq!(
        parse(Failing).unwrap_err(),
        Error::IoError(std::io::Error::new(std::io::ErrorKind::Other, "other"))
    );
}

#[test]
fn test_read_rich() {
    let html: &[u8] = b"<p><strong>bold</strong></p>";
    let lines = from_read_rich(html, 80).unwrap();
    let tag = vec![RichAnnotation::Strong];
    let line = TaggedLine::from_string("bold".to_owned(), &tag);
    assert_eq!(vec![line], lines);
}

#[test]
fn test_rich_image_without_alt() {
    let lines = from_read_rich(&br#"<img src="x.png">"#[..], 80).unwrap();
    let tag = vec![RichAnnotation::Image("x.png".to_owned())];
    assert_eq!(lines, vec![TaggedLine::from_string("x.png".to_owned(), &tag)]);

    let lines = from_read_rich(&br#"<img src="x.png" alt="X">"#[..], 80).unwrap();
    assert_eq!(lines, vec![TaggedLine::from_string("X".to_owned(), &tag)]);
}

#[test]
fn test_rich_heading() {
    use RichAnnotation::*;
    let lines = from_read_rich(&b"<h2>T</h2>"[..], 80).unwrap();
    assert_eq!(lines.len(), 1);
    assert_eq!(
        lines[0].iter().collect::<Vec<_>>(),
        vec![("## ", &vec![]), ("T", &vec![Strong])]
    );
}

#[test]
fn test_rich_link_and_list() {
    use RichAnnotation::*;
    let lines = from_read_rich(&br#"<ul><li>x</li></ul><a href="u">L</a>"#[..], 80).unwrap();
    assert_eq!(
        lines,
        vec![
            TaggedLine::from_string("• x".into(), &vec![]),
            TaggedLine::new(),
            TaggedLine::from_string("L".into(), &vec![Link("u".into())]),
        ]
    );
}

#[test]
fn test_pre_rich() {
    use RichAnnotation::*;
    assert_eq!(
        config::rich()
            .lines_from_read(&b"<pre>testlong</pre>"[..], 4)
            .unwrap(),
        [
            TaggedLine::from_string("test".into(), &vec![Preformat(false)]),
            TaggedLine::from_string("long".into(), &vec![Preformat(true)])
        ]
    );
}

#[test]
fn test_render_tree_reuse() {
    let tree = parse(&b"<p>one two</p>"[..]).unwrap();
    assert_eq!(tree.render_plain(80).unwrap().into_string(), "one two\n");
    assert_eq!(tree.render_plain(3).unwrap().into_string(), "one\ntwo\n");
    assert_eq!(tree.render_rich(80).unwrap().into_lines().len(), 1);
}

#[test]
fn test_custom_decorator() {
    let text =
        from_read_with_decorator(&b"<p><b>x</b> <a href=\"u\">y</a></p>"[..], 80, RichDecorator::new())
            .unwrap();
    assert_eq_str!(text, "x y\n");
}
