use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use anyhow::Context as _;
use log::warn;

use crate::context::Context;
use crate::record::{sort_articles, Article};
use crate::renderer;
use crate::scan;

const INDEX_HEADER: &str = "# Published Articles\n\n\
    This index is auto-generated by `pressroom archive` and `pressroom reindex`.\n\n\
    ---\n\n";

/// One `## ` section of the index document, ending with a blank line.
pub(crate) fn index_section(article: &Article) -> String {
    let slug = article
        .record_path
        .parent()
        .and_then(|p| p.file_name())
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let date = article
        .published_date
        .map(|d| d.to_string())
        .unwrap_or_else(|| "—".to_string());
    let badge = article
        .geo_score
        .map(|s| format!(" (GEO: {s}/100)"))
        .unwrap_or_default();

    let mut section = String::new();
    let _ = writeln!(section, "## {date}: {}{badge}\n", article.title);
    let _ = writeln!(section, "- **Project**: {}", article.project);
    if let Some(ref url) = article.publish_url {
        let _ = writeln!(section, "- **Published**: [{}]({url})", article.title);
    }
    let _ = writeln!(section, "- **Source**: [source/{slug}/](source/{slug}/)");
    if let Some(name) = article.pdf_path.as_deref().and_then(Path::file_name) {
        let name = name.to_string_lossy();
        let _ = writeln!(section, "- **PDF**: [{name}](pdfs/{name})");
    }
    if let Some(ref url) = article.pages_url {
        let _ = writeln!(section, "- **Pages**: {url}");
    }
    section.push('\n');
    section
}

/// Inserts a new section before the first existing `## ` boundary, keeping
/// the header block intact. Creates the index with a fixed header when it
/// does not exist yet.
pub(crate) fn prepend_section(index_path: &Path, section: &str) -> anyhow::Result<()> {
    let content = if index_path.exists() {
        fs::read_to_string(index_path)
            .with_context(|| format!("while reading {:?}", index_path))?
    } else {
        INDEX_HEADER.to_string()
    };

    let lines: Vec<&str> = content.lines().collect();
    let boundary = lines
        .iter()
        .position(|line| line.starts_with("## "))
        .unwrap_or(lines.len());

    let mut out = String::new();
    for line in &lines[..boundary] {
        out.push_str(line);
        out.push('\n');
    }
    out.push_str(section);
    for line in &lines[boundary..] {
        out.push_str(line);
        out.push('\n');
    }

    fs::write(index_path, out).with_context(|| format!("while writing {:?}", index_path))?;
    Ok(())
}

/// The repair path: rebuilds INDEX.md in full from the metadata records and
/// regenerates the HTML dashboard, ignoring whatever the incremental updates
/// left behind.
pub(crate) fn regenerate(ctx: &Context) -> anyhow::Result<()> {
    let mut articles = scan::scan_published(ctx);
    if articles.is_empty() {
        warn!("no metadata records under {:?}", ctx.source_dir());
        return Ok(());
    }
    articles.sort_by(sort_articles);

    let mut out = String::new();
    let _ = writeln!(out, "# Published Articles\n");
    let _ = writeln!(
        out,
        "This index is auto-generated from metadata records in `published/source/`.\n"
    );
    let _ = writeln!(out, "**Total articles**: {}\n", articles.len());
    let _ = writeln!(out, "---\n");
    for article in &articles {
        out.push_str(&index_section(article));
    }

    fs::create_dir_all(ctx.published_dir())?;
    fs::write(ctx.index_path(), out)
        .with_context(|| format!("while writing {:?}", ctx.index_path()))?;
    println!(
        "INDEX.md regenerated: {} ({} articles)",
        ctx.index_path().display(),
        articles.len()
    );

    renderer::render_dashboard(ctx, &articles)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::TableStyle;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn record_json(title: &str, date: &str) -> String {
        format!(
            r#"{{"title":"{title}","project":"demo","publish_url":"https://example.com/{title}",
                "geo_score":90,"published_date":"{date}","archived_date":"x",
                "source_file":"a.md","pdf_path":"published/pdfs/{title}.pdf",
                "source_dir":"published/source/{title}"}}"#
        )
    }

    fn write_record(base: &Path, slug: &str, json: &str) {
        let dir = base.join("published").join("source").join(slug);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("metadata.json"), json).unwrap();
    }

    #[test]
    fn regenerate_emits_one_section_per_record_in_date_order() {
        let tmp = TempDir::new().unwrap();
        write_record(tmp.path(), "first", &record_json("first", "2024-01-01"));
        write_record(tmp.path(), "second", &record_json("second", "2024-06-01"));
        write_record(tmp.path(), "third", &record_json("third", "2023-11-11"));

        let ctx = Context::new(tmp.path().to_path_buf(), tmp.path().join(".."), TableStyle::Plain);
        regenerate(&ctx).unwrap();

        let index = fs::read_to_string(ctx.index_path()).unwrap();
        let sections: Vec<&str> = index
            .lines()
            .filter(|l| l.starts_with("## "))
            .collect();
        assert_eq!(sections.len(), 3);
        assert!(sections[0].starts_with("## 2024-06-01"));
        assert!(sections[1].starts_with("## 2024-01-01"));
        assert!(sections[2].starts_with("## 2023-11-11"));
        assert!(index.contains("**Total articles**: 3"));
    }

    #[test]
    fn prepend_creates_header_then_keeps_it() {
        let tmp = TempDir::new().unwrap();
        let index_path = tmp.path().join("INDEX.md");

        let first = section_for("older", "2024-01-01", tmp.path());
        let second = section_for("newer", "2024-02-01", tmp.path());
        prepend_section(&index_path, &first).unwrap();
        prepend_section(&index_path, &second).unwrap();

        let content = fs::read_to_string(&index_path).unwrap();
        assert!(content.starts_with("# Published Articles"));
        assert_eq!(content.matches("# Published Articles").count(), 1);
        let newer_at = content.find("## 2024-02-01: newer").unwrap();
        let older_at = content.find("## 2024-01-01: older").unwrap();
        assert!(newer_at < older_at, "new section must come first");
    }

    fn section_for(title: &str, date: &str, base: &Path) -> String {
        let article = Article {
            title: title.to_string(),
            project: "demo".to_string(),
            status: crate::record::Status::Published,
            publish_url: Some(format!("https://example.com/{title}")),
            pages_url: None,
            published_date: Some(date.parse().unwrap()),
            geo_score: Some(88),
            source_path: None,
            pdf_path: Some(PathBuf::from(format!("published/pdfs/{title}.pdf"))),
            record_path: base.join("published/source").join(title).join("metadata.json"),
        };
        index_section(&article)
    }

    #[test]
    fn section_links_use_slug_and_pdf_name() {
        let tmp = TempDir::new().unwrap();
        let section = section_for("demo_article", "2024-03-03", tmp.path());
        assert!(section.contains("## 2024-03-03: demo_article (GEO: 88/100)"));
        assert!(section.contains("[source/demo_article/](source/demo_article/)"));
        assert!(section.contains("[demo_article.pdf](pdfs/demo_article.pdf)"));
    }
}
