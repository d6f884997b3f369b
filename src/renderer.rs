use std::fs;
use std::path::Path;

use anyhow::Context as _;
use chrono::Local;
use handlebars::Handlebars;
use log::warn;
use maud::{html, Markup};
use serde::Serialize;

use crate::context::Context;
use crate::record::Article;
use crate::report::{format_avg, summarize};

const DASHBOARD_TEMPLATE: &str = "dashboard";

/// Registers the dashboard template when the file exists. A missing or broken
/// template leaves the registry empty; rendering then degrades to a warning.
pub(crate) fn build_renderer(template_path: &Path) -> Handlebars<'static> {
    let mut handlebars = Handlebars::new();
    if template_path.is_file() {
        if let Err(error) = handlebars.register_template_file(DASHBOARD_TEMPLATE, template_path) {
            warn!("ignoring broken dashboard template {:?}: {error}", template_path);
        }
    }
    handlebars
}

#[derive(Serialize, Debug)]
struct DashboardData {
    total_count: usize,
    published_count: usize,
    pending_count: usize,
    avg_geo: String,
    generated: String,
    table_rows: String,
}

pub(crate) fn render_dashboard(ctx: &Context, articles: &[Article]) -> anyhow::Result<()> {
    if !ctx.handlebars.has_template(DASHBOARD_TEMPLATE) {
        warn!(
            "dashboard template not found: {:?} (skipping HTML output)",
            ctx.template_path()
        );
        return Ok(());
    }

    let summary = summarize(articles);
    let data = DashboardData {
        total_count: summary.total,
        published_count: summary.published,
        pending_count: summary.pending,
        avg_geo: format_avg(summary.avg_score),
        generated: Local::now().format("%Y-%m-%d %H:%M").to_string(),
        table_rows: table_rows(articles).into_string(),
    };

    let html = ctx
        .handlebars
        .render(DASHBOARD_TEMPLATE, &data)
        .context("while rendering dashboard")?;
    fs::create_dir_all(ctx.published_dir())?;
    let out_path = ctx.dashboard_path();
    fs::write(&out_path, html).with_context(|| format!("while writing {:?}", out_path))?;
    println!("HTML dashboard generated: {}", out_path.display());
    Ok(())
}

fn table_rows(articles: &[Article]) -> Markup {
    html! {
        @for article in articles {
            tr class={ "status-" (article.status.as_str()) } {
                td data-status=(article.status.as_str()) { (article.status.as_str()) }
                td data-project=(article.project) { (article.project) }
                td data-title=(article.title) { (article.title) }
                td { @if let Some(score) = article.geo_score { (score) } @else { "—" } }
                td { @if let Some(date) = article.published_date { (date.to_string()) } @else { "—" } }
                td { @if let Some(ref url) = article.publish_url { a href=(url) target="_blank" { "View" } } @else { "—" } }
                td { @if let Some(ref url) = article.pages_url { a href=(url) target="_blank" { "View" } } @else { "—" } }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::TableStyle;
    use crate::record::Status;
    use chrono::NaiveDate;
    use std::path::PathBuf;
    use tempfile::TempDir;

    const TEMPLATE: &str = "<html>{{total_count}}/{{published_count}}/{{pending_count}} \
                            avg {{avg_geo}} at {{generated}}<table>{{{table_rows}}}</table></html>";

    fn article(title: &str, status: Status) -> Article {
        Article {
            title: title.to_string(),
            project: "demo".to_string(),
            status,
            publish_url: Some("https://example.com/a".to_string()),
            pages_url: None,
            published_date: NaiveDate::from_ymd_opt(2024, 1, 1),
            geo_score: Some(90),
            source_path: None,
            pdf_path: None,
            record_path: PathBuf::from("unused"),
        }
    }

    #[test]
    fn dashboard_substitutes_counts_and_rows() {
        let tmp = TempDir::new().unwrap();
        let template_dir = tmp.path().join("templates");
        fs::create_dir_all(&template_dir).unwrap();
        fs::write(template_dir.join("dashboard.hbs"), TEMPLATE).unwrap();

        let ctx = Context::new(tmp.path().to_path_buf(), tmp.path().join(".."), TableStyle::Plain);
        let articles = vec![article("One", Status::Published), article("Two", Status::Pending)];
        render_dashboard(&ctx, &articles).unwrap();

        let html = fs::read_to_string(ctx.dashboard_path()).unwrap();
        assert!(html.contains("2/1/1"));
        assert!(html.contains("avg 90.0"));
        assert!(html.contains("class=\"status-published\""));
        assert!(html.contains("<a href=\"https://example.com/a\""));
    }

    #[test]
    fn missing_template_degrades_without_output() {
        let tmp = TempDir::new().unwrap();
        let ctx = Context::new(tmp.path().to_path_buf(), tmp.path().join(".."), TableStyle::Plain);
        render_dashboard(&ctx, &[article("One", Status::Published)]).unwrap();
        assert!(!ctx.dashboard_path().exists());
    }

    #[test]
    fn rows_escape_markup_in_titles() {
        let mut a = article("<script>", Status::Published);
        a.title = "<script>".to_string();
        let rows = table_rows(&[a]).into_string();
        assert!(rows.contains("&lt;script&gt;"));
        assert!(!rows.contains("<script>"));
    }
}
