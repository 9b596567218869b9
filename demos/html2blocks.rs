use argparse::{ArgumentParser, Store, StoreOption, StoreTrue};
use html2blocks::dom::Document;
use html2blocks::render::text_renderer::RichAnnotation;
use html2blocks::{config, RenderBlock};
use std::io;
use std::io::Write;

/// Print the block tree, one block per line, indented by depth.
fn dump_tree(block: &RenderBlock) -> String {
    use RenderBlock::*;
    let mut result = String::new();
    let mut stack = vec![(block, 0)];
    while let Some((block, depth)) = stack.pop() {
        let desc = match block {
            Paragraph(text) => format!("Paragraph {:?}", text.to_plain_string()),
            Heading(level, text) => format!("Heading({}) {:?}", level, text.to_plain_string()),
            ListItem(marker, text) => format!("ListItem({:?}) {:?}", marker, text.to_plain_string()),
            GenericLeaf(text) => format!("GenericLeaf {:?}", text.to_plain_string()),
            Container(_) => "Container".into(),
            UnorderedList(_) => "UnorderedList".into(),
            OrderedList(_) => "OrderedList".into(),
            Blockquote(_) => "Blockquote".into(),
            GenericContainer(_) => "GenericContainer".into(),
            other => format!("{:?}", other),
        };
        result.push_str(&"  ".repeat(depth));
        result.push_str(&desc);
        result.push('\n');
        stack.extend(block.children().iter().rev().map(|c| (c, depth + 1)));
    }
    result
}

/// Show rich annotations as bracketed tags around each span.
fn show_rich(lines: Vec<html2blocks::TaggedLine<Vec<RichAnnotation>>>) -> String {
    let mut result = String::new();
    for line in lines {
        for (s, tags) in line.iter() {
            if tags.is_empty() {
                result.push_str(s);
            } else {
                result.push_str(&format!("{:?}[{}]", tags, s));
            }
        }
        result.push('\n');
    }
    result
}

fn translate<R>(input: R, width: usize, depth: usize, tree: bool, rich: bool) -> String
where
    R: io::Read,
{
    let document = Document::parse(input).expect("Failed to read input");
    let title = document.title();
    let conf = config::plain().max_depth(depth);
    let render_tree = conf.render_document(&document);
    let body = if tree {
        dump_tree(render_tree.blocks())
    } else if rich {
        show_rich(
            render_tree
                .render_rich(width)
                .expect("Failed to render")
                .into_lines(),
        )
    } else {
        render_tree
            .render_plain(width)
            .expect("Failed to render")
            .into_string()
    };
    if title.is_empty() {
        body
    } else {
        format!("== {} ==\n\n{}", title, body)
    }
}

fn main() {
    env_logger::init();

    let mut infile: Option<String> = None;
    let mut outfile: Option<String> = None;
    let mut width: usize = 80;
    let mut depth: usize = html2blocks::DEFAULT_MAX_DEPTH;
    let mut tree = false;
    let mut rich = false;

    {
        let mut ap = ArgumentParser::new();
        ap.refer(&mut infile).add_argument(
            "infile",
            StoreOption,
            "Input HTML file (default is standard input)",
        );
        ap.refer(&mut width).add_option(
            &["-w", "--width"],
            Store,
            "Column width to format to (default is 80)",
        );
        ap.refer(&mut outfile).add_option(
            &["-o", "--output"],
            StoreOption,
            "Output file (default is standard output)",
        );
        ap.refer(&mut depth).add_option(
            &["--depth"],
            Store,
            "Maximum element nesting to follow",
        );
        ap.refer(&mut tree).add_option(
            &["-t", "--tree"],
            StoreTrue,
            "Print the block tree instead of laying it out",
        );
        ap.refer(&mut rich).add_option(
            &["-r", "--rich"],
            StoreTrue,
            "Show rich text annotations",
        );
        ap.parse_args_or_exit();
    }

    let data = match infile {
        None => {
            let stdin = io::stdin();
            translate(&mut stdin.lock(), width, depth, tree, rich)
        }
        Some(name) => {
            let mut file = std::fs::File::open(name).expect("Tried to open file");
            translate(&mut file, width, depth, tree, rich)
        }
    };

    match outfile {
        None => {
            print!("{}", data);
        }
        Some(name) => {
            let mut file = std::fs::File::create(name).expect("Tried to create file");
            write!(file, "{}", data).unwrap();
        }
    };
}
