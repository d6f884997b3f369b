use std::path::PathBuf;

use crate::renderer;

/// How the tracker table is drawn. Chosen once in `main` (box-drawing on a
/// terminal, plain fixed-width otherwise) and carried here instead of being
/// probed again at render time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TableStyle {
    Fancy,
    Plain,
}

#[derive(Debug)]
pub(crate) struct Context {
    pub base_dir: PathBuf,
    pub projects_root: PathBuf,

    pub table_style: TableStyle,

    pub handlebars: handlebars::Handlebars<'static>,
}

impl Context {
    pub fn new(base_dir: PathBuf, projects_root: PathBuf, table_style: TableStyle) -> Self {
        let handlebars = renderer::build_renderer(&base_dir.join("templates").join("dashboard.hbs"));
        Self {
            base_dir,
            projects_root,
            table_style,
            handlebars,
        }
    }

    pub fn published_dir(&self) -> PathBuf {
        self.base_dir.join("published")
    }

    pub fn source_dir(&self) -> PathBuf {
        self.published_dir().join("source")
    }

    pub fn pdf_dir(&self) -> PathBuf {
        self.published_dir().join("pdfs")
    }

    pub fn index_path(&self) -> PathBuf {
        self.published_dir().join("INDEX.md")
    }

    pub fn dashboard_path(&self) -> PathBuf {
        self.published_dir().join("index.html")
    }

    pub fn template_path(&self) -> PathBuf {
        self.base_dir.join("templates").join("dashboard.hbs")
    }
}
