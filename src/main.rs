use std::fs;
use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use richmark::{AttributedText, StyleSheet};

#[derive(Parser)]
#[command(name = "richmark")]
#[command(about = "Render Markdown files to attributed rich text")]
struct Cli {
    /// Input Markdown file
    input: PathBuf,

    /// Stylesheet TOML file (defaults apply if missing)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print the document tree instead of the rendered runs
    #[arg(long)]
    tree: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let markdown = match fs::read_to_string(&cli.input) {
        Ok(content) => content,
        Err(e) => {
            eprintln!("Error reading {}: {}", cli.input.display(), e);
            std::process::exit(1);
        }
    };

    let style = match &cli.config {
        Some(path) => StyleSheet::load(path),
        None => StyleSheet::default(),
    };

    let doc = match richmark::parse(&markdown) {
        Ok(doc) => doc,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    if cli.tree {
        print!("{doc}");
        return;
    }

    let renderer = richmark::Renderer::new(
        &style,
        &richmark::CharCellMetrics,
        &richmark::SchemeVerifier,
    );
    print_runs(&renderer.render_document(&doc));
}

fn print_runs(buf: &AttributedText) {
    for run in buf.runs() {
        let mut parts = Vec::new();
        if !run.attrs.kind.is_empty() {
            parts.push(format!("{:?}", run.attrs.kind));
        }
        if let Some(font) = &run.attrs.font {
            parts.push(format!("{} {}pt {:?}", font.family, font.size, font.traits));
        }
        if let Some(link) = &run.attrs.link {
            parts.push(format!("link={link}"));
        }
        if let Some(paragraph) = &run.attrs.paragraph {
            parts.push(format!(
                "indent={}/{}",
                paragraph.first_line_head_indent, paragraph.head_indent
            ));
        }
        println!("{:?}  [{}]", run.text, parts.join(", "));
    }
}
