//! Trellis CLI
//!
//! Lays out a JSON box tree document and prints the resulting geometry.

use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use owo_colors::OwoColorize;
use serde_json::{Value, json};
use trellis_layout::{
    ApproximateFontMetrics, BoxId, BoxTree, FixedWidthMetrics, FontMetrics, Fragmentation,
    LayoutConfig, LayoutOutput, Rect, layout, parse_document,
};

/// Block and line layout for JSON box trees
#[derive(Parser, Debug)]
#[command(name = "trellis")]
#[command(author, version, about, long_about = None)]
#[command(after_help = r#"EXAMPLES:
    trellis page.json                     Print the laid-out box tree
    trellis page.json --width 400         Lay out against a 400px viewport
    trellis page.json --pages 600         Break the flow into 600px pages
    trellis page.json --config cfg.json   Load settings from a file
    trellis page.json --json              Dump rectangles, lines and stats as JSON"#)]
struct Cli {
    /// Box tree document (JSON)
    document: PathBuf,

    /// Layout configuration file (JSON); flags below override it
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Viewport width
    #[arg(long)]
    width: Option<f32>,

    /// Viewport height
    #[arg(long)]
    height: Option<f32>,

    /// Paginate with pages of this height
    #[arg(long, value_name = "HEIGHT", conflicts_with = "columns")]
    pages: Option<f32>,

    /// Flow into this many columns, each as tall as the viewport
    #[arg(long, value_name = "COUNT")]
    columns: Option<u32>,

    /// Gap between pages or columns
    #[arg(long, default_value_t = 0.0)]
    gap: f32,

    /// Enable the legacy margin quirks
    #[arg(long)]
    quirks: bool,

    /// Measure every character with this fixed advance instead of the
    /// approximate proportional metrics
    #[arg(long, value_name = "PX")]
    advance: Option<f32>,

    /// Print JSON instead of a tree
    #[arg(long)]
    json: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let config = load_config(&cli)?;
    let source = fs::read_to_string(&cli.document)
        .with_context(|| format!("reading {}", cli.document.display()))?;
    let mut tree = parse_document(&source, &config)
        .with_context(|| format!("decoding {}", cli.document.display()))?;

    let fixed;
    let metrics: &dyn FontMetrics = match cli.advance {
        Some(advance) => {
            fixed = FixedWidthMetrics::new(advance);
            &fixed
        }
        None => &ApproximateFontMetrics,
    };
    let output = layout(&mut tree, &config, metrics)?;
    log::info!(
        "{} boxes laid out over {} page(s)",
        output.stats.boxes_laid_out,
        output.stats.pages.max(1)
    );

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&dump(&tree, &output))?);
    } else {
        print_layout(&tree, &config, &output);
    }
    Ok(())
}

/// Start from the config file (or defaults) and apply command-line overrides.
fn load_config(cli: &Cli) -> anyhow::Result<LayoutConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            let json = fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            LayoutConfig::from_json(&json)
                .with_context(|| format!("loading config {}", path.display()))?
        }
        None => LayoutConfig::default(),
    };
    if let Some(width) = cli.width {
        config.viewport.width = width;
    }
    if let Some(height) = cli.height {
        config.viewport.height = height;
    }
    if let Some(height) = cli.pages {
        config.fragmentation = Fragmentation::Pages {
            height,
            gap: cli.gap,
        };
    }
    if let Some(count) = cli.columns {
        config.fragmentation = Fragmentation::Columns {
            count,
            gap: cli.gap,
            height: config.viewport.height,
        };
    }
    config.quirks_mode |= cli.quirks;
    config.validate()?;
    Ok(config)
}

/// Print the box tree with border boxes and overflow.
fn print_layout(tree: &BoxTree, config: &LayoutConfig, output: &LayoutOutput) {
    let heading = format!(
        "=== Layout Tree (viewport: {}x{}) ===",
        config.viewport.width, config.viewport.height
    );
    println!("{}\n", heading.bold());

    if let Some(root) = tree.root() {
        print_layout_box(tree, root, 0);
    }

    if !output.fragments.is_empty() {
        println!("{}", "=== Fragments ===".bold());
        for (index, rect) in output.fragments.iter().enumerate() {
            println!("  {index}: {}", format_rect(*rect));
        }
        println!();
    }

    let stats = output.stats;
    println!("{}", "=== Stats ===".bold());
    println!(
        "  boxes={} lines={} relayouts={} floats={} struts={} pages={}",
        stats.boxes_laid_out,
        stats.lines_built,
        stats.relayouts,
        stats.floats_placed,
        stats.pagination_struts,
        stats.pages
    );
}

/// Recursively print a layout box with its dimensions
fn print_layout_box(tree: &BoxTree, id: BoxId, depth: usize) {
    let indent = "  ".repeat(depth);
    let node = &tree[id];

    let label = match (node.text(), &node.name) {
        (Some(text), _) => {
            let preview: String = text.chars().take(30).collect();
            let suffix = if text.chars().count() > 30 { "..." } else { "" };
            format!("text(\"{}{suffix}\")", preview.replace('\n', "\\n"))
        }
        (None, Some(name)) => format!("<{name}> {}", node.kind.label()),
        (None, None) if node.anonymous => format!("anonymous {}", node.kind.label()),
        (None, None) => node.kind.label().to_string(),
    };
    println!("{indent}[{}] {}", label.cyan(), id.dimmed());

    if !node.is_laid_out() {
        println!("{indent}  {}", "not laid out".yellow());
        return;
    }
    println!("{indent}  frame: {}", format_rect(node.frame()));

    let margin = &node.dimensions.margin;
    if !margin.is_zero() {
        println!(
            "{indent}  margin: t={:.1} r={:.1} b={:.1} l={:.1}",
            margin.top, margin.right, margin.bottom, margin.left
        );
    }
    if node.has_overflow() {
        println!(
            "{indent}  overflow: layout {} visual {}",
            format_rect(node.layout_overflow_rect()),
            format_rect(node.visual_overflow_rect())
        );
    }
    if let Some(strut) = node.rare_data().map(|rare| rare.pagination_strut)
        && strut > 0.0
    {
        println!("{indent}  {}", format!("pagination strut: {strut:.1}").yellow());
    }
    if !node.lines.is_empty() {
        let arena = tree.inline_boxes();
        for (index, root) in arena.lines(node.lines).enumerate() {
            if let Some(line) = arena[root].root_line() {
                println!(
                    "{indent}  line {index}: top={:.1} height={:.1} baseline={:.1}",
                    line.line_top,
                    line.line_height(),
                    line.baseline
                );
            }
        }
    }

    for child in tree.children(id) {
        print_layout_box(tree, *child, depth + 1);
    }
}

fn format_rect(rect: Rect) -> String {
    format!(
        "x={:.1} y={:.1} w={:.1} h={:.1}",
        rect.x, rect.y, rect.width, rect.height
    )
}

/// Everything a pass produced, as one JSON value.
fn dump(tree: &BoxTree, output: &LayoutOutput) -> Value {
    let arena = tree.inline_boxes();
    let boxes: Vec<Value> = tree
        .root()
        .map(|root| tree.descendants(root))
        .unwrap_or_default()
        .into_iter()
        .filter(|id| tree[*id].is_laid_out())
        .map(|id| {
            let node = &tree[id];
            let lines: Vec<_> = arena
                .lines(node.lines)
                .filter_map(|root| arena.snapshot(root))
                .collect();
            json!({
                "id": id,
                "kind": node.kind.label(),
                "name": node.name,
                "parent": node.parent(),
                "frame": node.frame(),
                "layout-overflow": node.layout_overflow_rect(),
                "visual-overflow": node.visual_overflow_rect(),
                "margin-values": node.margin_values(),
                "rare": node.rare_data(),
                "lines": lines,
            })
        })
        .collect();
    json!({
        "output": output,
        "boxes": boxes,
    })
}
