use std::fs::{self, OpenOptions};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context as _};
use chrono::Local;
use fs_extra::dir::CopyOptions;

use crate::context::Context;
use crate::index;
use crate::pdf;
use crate::record::{slugify, RecordFile};

#[derive(Debug)]
pub(crate) struct ArchiveRequest {
    pub source: PathBuf,
    pub publish_url: String,
    pub project: String,
    pub title: String,
    pub geo_score: Option<u32>,
    pub pages_url: Option<String>,
}

/// Archive one published article: copy the source and its asset directories
/// into a slugged record directory, snapshot the PDF, write `metadata.json`,
/// and prepend a section to INDEX.md. A missing source file is the only
/// fatal input error and nothing is written before it is checked.
pub(crate) fn archive(ctx: &Context, req: ArchiveRequest) -> anyhow::Result<()> {
    if !req.source.is_file() {
        bail!("source file not found: {}", req.source.display());
    }

    let slug = slugify(&req.title);
    let today = Local::now().date_naive();
    let (record_dir, record_name) = allocate_record_dir(&ctx.source_dir(), &slug);

    fs::create_dir_all(&record_dir)
        .with_context(|| format!("while creating {:?}", record_dir))?;
    fs::create_dir_all(ctx.pdf_dir())?;

    let draft_dest = record_dir.join("draft.md");
    fs::copy(&req.source, &draft_dest)
        .with_context(|| format!("while copying {:?}", req.source))?;
    println!("source copied: {}", draft_dest.display());

    // Sibling figures/ and grandparent visualizations/ travel with the draft.
    if let Some(parent) = req.source.parent() {
        copy_assets(&parent.join("figures"), &record_dir.join("figures"))?;
        if let Some(grandparent) = parent.parent() {
            copy_assets(
                &grandparent.join("visualizations"),
                &record_dir.join("visualizations"),
            )?;
        }
    }

    let pdf_name = format!("{}_{record_name}.pdf", today.format("%Y-%m-%d"));
    pdf::snapshot(&req.publish_url, &ctx.pdf_dir().join(&pdf_name))?;

    let record = RecordFile {
        title: req.title,
        project: req.project,
        publish_url: req.publish_url,
        pages_url: req.pages_url,
        geo_score: req.geo_score,
        published_date: today,
        archived_date: Local::now().to_rfc3339(),
        source_file: req.source,
        pdf_path: PathBuf::from("published/pdfs").join(&pdf_name),
        source_dir: PathBuf::from("published/source").join(&record_name),
    };

    let metadata_path = record_dir.join("metadata.json");
    let fd = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(&metadata_path)
        .with_context(|| format!("while opening {:?}", metadata_path))?;
    serde_json::to_writer_pretty(BufWriter::new(fd), &record)?;
    println!("metadata saved: {}", metadata_path.display());

    let article = record.into_article(metadata_path);
    index::prepend_section(&ctx.index_path(), &index::index_section(&article))?;
    println!("index updated: {}", ctx.index_path().display());

    Ok(())
}

/// Re-archiving never overwrites: when the slugged directory already holds a
/// record, a numeric suffix picks the next free name.
fn allocate_record_dir(source_root: &Path, slug: &str) -> (PathBuf, String) {
    let mut name = slug.to_string();
    let mut n = 2;
    while source_root.join(&name).join("metadata.json").exists() {
        name = format!("{slug}_{n}");
        n += 1;
    }
    (source_root.join(&name), name)
}

fn copy_assets(src: &Path, dest: &Path) -> anyhow::Result<()> {
    if !src.is_dir() {
        return Ok(());
    }
    let mut cp_opts = CopyOptions::new();
    cp_opts.copy_inside = true;
    cp_opts.content_only = true;
    cp_opts.overwrite = true;
    fs_extra::dir::copy(src, dest, &cp_opts)
        .with_context(|| format!("while copying {:?}", src))?;
    println!("assets copied: {}", dest.display());
    Ok(())
}
