use std::collections::VecDeque;
use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};

use log::warn;
use regex::Regex;

use crate::context::Context;
use crate::record::{parse_score, sort_articles, Article, RecordFile, Status};

const MARKER_PREFIX: &str = "PUBLISH_INFO_";

#[derive(Debug, Default, Clone)]
pub(crate) struct Filters {
    pub status: Option<Status>,
    pub project: Option<String>,
}

/// Published records plus pending markers, filtered and sorted. Malformed
/// inputs are skipped with a warning; a scan never aborts as a whole.
pub(crate) fn collect(ctx: &Context, filters: &Filters) -> Vec<Article> {
    let mut articles = scan_published(ctx);
    articles.extend(scan_pending(&ctx.projects_root));

    if let Some(status) = filters.status {
        articles.retain(|a| a.status == status);
    }
    if let Some(ref project) = filters.project {
        let wanted = project.to_lowercase();
        articles.retain(|a| a.project.to_lowercase() == wanted);
    }

    articles.sort_by(sort_articles);
    articles
}

/// One `metadata.json` per record directory under `published/source/`.
pub(crate) fn scan_published(ctx: &Context) -> Vec<Article> {
    let root = ctx.source_dir();
    let mut articles = vec![];
    let entries = match fs::read_dir(&root) {
        Ok(entries) => entries,
        Err(_) => return articles,
    };

    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(error) => {
                warn!("unreadable entry under {:?}: {error}", root);
                continue;
            }
        };
        let metadata_path = entry.path().join("metadata.json");
        if !metadata_path.is_file() {
            continue;
        }
        match load_record(&metadata_path) {
            Ok(article) => articles.push(article),
            Err(error) => warn!("skipping invalid metadata {:?}: {error:#}", metadata_path),
        }
    }

    articles
}

fn load_record(path: &Path) -> anyhow::Result<Article> {
    let fd = File::open(path)?;
    let reader = BufReader::new(fd);
    let record: RecordFile = serde_json::from_reader(reader)?;
    Ok(record.into_article(path.to_path_buf()))
}

/// Breadth-first walk of the projects root for `PUBLISH_INFO_*.md` markers.
/// Names containing "template" are excluded regardless of content.
pub(crate) fn scan_pending(projects_root: &Path) -> Vec<Article> {
    let mut articles = vec![];
    if !projects_root.is_dir() {
        return articles;
    }

    let mut q = VecDeque::new();
    q.push_back(projects_root.to_path_buf());
    while let Some(dir) = q.pop_front() {
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(error) => {
                warn!("skipping unreadable directory {:?}: {error}", dir);
                continue;
            }
        };
        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(error) => {
                    warn!("unreadable entry under {:?}: {error}", dir);
                    continue;
                }
            };
            let path = entry.path();
            if path.is_dir() {
                q.push_back(path);
                continue;
            }
            let name = entry.file_name().to_string_lossy().to_string();
            if !name.starts_with(MARKER_PREFIX) || !name.ends_with(".md") {
                continue;
            }
            if name.to_lowercase().contains("template") {
                continue;
            }
            match parse_marker(&path) {
                Ok(article) => articles.push(article),
                Err(error) => warn!("skipping invalid marker {:?}: {error:#}", path),
            }
        }
    }

    articles
}

/// Each field comes from its own regex and is independently optional; the
/// presence of one never implies the presence of another.
fn parse_marker(path: &Path) -> anyhow::Result<Article> {
    let content = fs::read_to_string(path)?;

    let title = Regex::new(r"(?m)^#\s+Publishing Info:\s*(.+?)\s*$")
        .unwrap()
        .captures(&content)
        .map(|caps| caps[1].to_string())
        .unwrap_or_else(|| "Unknown".to_string());

    let project = path
        .parent()
        .and_then(|p| p.parent())
        .and_then(|p| p.file_name())
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "Unknown".to_string());

    let geo_score = Regex::new(r"\*\*GEO Score:\*\*\s*(\d+)")
        .unwrap()
        .captures(&content)
        .and_then(|caps| parse_score(&caps[1]));

    let pages_url = Regex::new(r"https://[A-Za-z0-9-]+\.github\.io/[^\s)]+")
        .unwrap()
        .find(&content)
        .map(|m| m.as_str().to_string());

    let source_path = Regex::new(r"(?m)\*\*Article:\*\*\s*(\S.*?)\s*$")
        .unwrap()
        .captures(&content)
        .and_then(|caps| path.parent().map(|dir| dir.join(&caps[1])));

    Ok(Article {
        title,
        project,
        status: Status::Pending,
        publish_url: None,
        pages_url,
        published_date: None,
        geo_score,
        source_path,
        pdf_path: None,
        record_path: path.to_path_buf(),
    })
}
