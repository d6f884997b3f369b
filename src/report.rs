use std::fs::OpenOptions;
use std::io::BufWriter;
use std::path::Path;

use anyhow::Context as _;
use chrono::Local;
use serde::Serialize;

use crate::context::TableStyle;
use crate::record::{Article, Status};

const HEADERS: [&str; 5] = ["Status", "Project", "Title", "GEO", "Date"];
const WIDTHS: [usize; 5] = [9, 15, 40, 5, 10];

#[derive(Debug, PartialEq)]
pub(crate) struct Summary {
    pub total: usize,
    pub published: usize,
    pub pending: usize,
    pub avg_score: Option<f64>,
}

/// Absent scores are excluded from the average, never counted as zero.
pub(crate) fn summarize(articles: &[Article]) -> Summary {
    let scores: Vec<u32> = articles.iter().filter_map(|a| a.geo_score).collect();
    Summary {
        total: articles.len(),
        published: articles.iter().filter(|a| a.status == Status::Published).count(),
        pending: articles.iter().filter(|a| a.status == Status::Pending).count(),
        avg_score: if scores.is_empty() {
            None
        } else {
            Some(scores.iter().sum::<u32>() as f64 / scores.len() as f64)
        },
    }
}

pub(crate) fn format_avg(avg: Option<f64>) -> String {
    match avg {
        Some(avg) => format!("{avg:.1}"),
        None => "—".to_string(),
    }
}

pub(crate) fn print_table(articles: &[Article], style: TableStyle) {
    if articles.is_empty() {
        println!("No articles found.");
        return;
    }

    match style {
        TableStyle::Fancy => print_fancy(articles),
        TableStyle::Plain => print_plain(articles),
    }

    let summary = summarize(articles);
    println!(
        "\nSummary: {} total | {} published | {} pending | avg GEO: {}",
        summary.total,
        summary.published,
        summary.pending,
        format_avg(summary.avg_score)
    );
}

fn cells(article: &Article) -> [String; 5] {
    [
        article.status.to_string(),
        clip(&article.project, WIDTHS[1]),
        clip(&article.title, WIDTHS[2]),
        article
            .geo_score
            .map(|s| s.to_string())
            .unwrap_or_else(|| "—".to_string()),
        article
            .published_date
            .map(|d| d.to_string())
            .unwrap_or_else(|| "—".to_string()),
    ]
}

fn clip(text: &str, width: usize) -> String {
    text.chars().take(width).collect()
}

fn print_plain(articles: &[Article]) {
    let header: Vec<String> = HEADERS
        .iter()
        .zip(WIDTHS)
        .map(|(h, w)| format!("{h:<w$}"))
        .collect();
    println!("{}", header.join(" "));
    println!("{}", "-".repeat(WIDTHS.iter().sum::<usize>() + WIDTHS.len() - 1));
    for article in articles {
        let row: Vec<String> = cells(article)
            .iter()
            .zip(WIDTHS)
            .map(|(c, w)| format!("{c:<w$}"))
            .collect();
        println!("{}", row.join(" "));
    }
}

fn print_fancy(articles: &[Article]) {
    println!("{}", rule('┌', '┬', '┐'));
    println!("{}", fancy_row(&HEADERS.map(String::from)));
    println!("{}", rule('├', '┼', '┤'));
    for article in articles {
        println!("{}", fancy_row(&cells(article)));
    }
    println!("{}", rule('└', '┴', '┘'));
}

fn rule(left: char, mid: char, right: char) -> String {
    let mut line = String::new();
    line.push(left);
    for (i, width) in WIDTHS.iter().enumerate() {
        line.push_str(&"─".repeat(width + 2));
        line.push(if i + 1 == WIDTHS.len() { right } else { mid });
    }
    line
}

fn fancy_row(cells: &[String; 5]) -> String {
    let mut line = String::from("│");
    for (cell, width) in cells.iter().zip(WIDTHS) {
        line.push_str(&format!(" {:<w$} │", cell, w = width));
    }
    line
}

#[derive(Serialize)]
struct Export<'a> {
    generated: String,
    total: usize,
    published: usize,
    pending: usize,
    articles: &'a [Article],
}

/// Full JSON export, to a file when `output` is given, otherwise to stdout.
pub(crate) fn export_json(articles: &[Article], output: Option<&Path>) -> anyhow::Result<()> {
    let summary = summarize(articles);
    let export = Export {
        generated: Local::now().to_rfc3339(),
        total: summary.total,
        published: summary.published,
        pending: summary.pending,
        articles,
    };

    match output {
        Some(path) => {
            let fd = OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(path)
                .with_context(|| format!("while opening {:?}", path))?;
            let writer = BufWriter::new(fd);
            serde_json::to_writer_pretty(writer, &export)?;
            println!("JSON exported to: {}", path.display());
        }
        None => println!("{}", serde_json::to_string_pretty(&export)?),
    }
    Ok(())
}
