use std::cmp::Ordering;
use std::fmt;
use std::path::PathBuf;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub(crate) enum Status {
    Published,
    Pending,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Published => "published",
            Status::Pending => "pending",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Schema of `metadata.json`, written once at archive time and read-only
/// afterwards. `geo_score` tolerates both integer and `"N/M"` string forms.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub(crate) struct RecordFile {
    pub title: String,
    pub project: String,
    pub publish_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pages_url: Option<String>,
    #[serde(default, deserialize_with = "deserialize_score")]
    pub geo_score: Option<u32>,
    pub published_date: NaiveDate,
    pub archived_date: String,
    pub source_file: PathBuf,
    pub pdf_path: PathBuf,
    pub source_dir: PathBuf,
}

impl RecordFile {
    pub fn into_article(self, record_path: PathBuf) -> Article {
        Article {
            title: self.title,
            project: self.project,
            status: Status::Published,
            publish_url: Some(self.publish_url),
            pages_url: self.pages_url,
            published_date: Some(self.published_date),
            geo_score: self.geo_score,
            source_path: Some(self.source_file),
            pdf_path: Some(self.pdf_path),
            record_path,
        }
    }
}

/// Merged view over published records and pending markers. Every field that a
/// marker may lack is independently optional.
#[derive(Serialize, Debug, Clone)]
pub(crate) struct Article {
    pub title: String,
    pub project: String,
    pub status: Status,
    pub publish_url: Option<String>,
    pub pages_url: Option<String>,
    pub published_date: Option<NaiveDate>,
    pub geo_score: Option<u32>,
    pub source_path: Option<PathBuf>,
    pub pdf_path: Option<PathBuf>,
    pub record_path: PathBuf,
}

fn deserialize_score<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Number(n) => n.as_u64().map(|n| n as u32),
        Value::String(s) => parse_score(&s),
        _ => None,
    })
}

/// Accepts "97" and "97/100" forms; anything else is treated as absent.
pub(crate) fn parse_score(raw: &str) -> Option<u32> {
    raw.split('/').next()?.trim().parse().ok()
}

/// Filesystem-safe identifier derived from a title: lowercase, whitespace and
/// hyphen runs become a single underscore, everything else outside [a-z0-9]
/// is dropped, truncated to 50 bytes.
pub(crate) fn slugify(title: &str) -> String {
    let lower = title.to_lowercase();
    let cleaned = regex::Regex::new(r"[^a-z0-9\s\-_]")
        .unwrap()
        .replace_all(&lower, "");
    let mut slug = regex::Regex::new(r"[\s\-]+")
        .unwrap()
        .replace_all(cleaned.trim(), "_")
        .into_owned();
    slug.truncate(50);
    if slug.is_empty() {
        slug.push_str("untitled");
    }
    slug
}

/// Published before pending; within a status, publish date descending with
/// undated entries last; undated ties order by title.
pub(crate) fn sort_articles(a: &Article, b: &Article) -> Ordering {
    match (a.status, b.status) {
        (Status::Published, Status::Pending) => Ordering::Less,
        (Status::Pending, Status::Published) => Ordering::Greater,
        _ => match (a.published_date, b.published_date) {
            (Some(ref a_date), Some(ref b_date)) => b_date.cmp(a_date),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => a.title.cmp(&b.title),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article(title: &str, status: Status, date: Option<&str>) -> Article {
        Article {
            title: title.to_string(),
            project: "demo".to_string(),
            status,
            publish_url: None,
            pages_url: None,
            published_date: date.map(|d| d.parse().unwrap()),
            geo_score: None,
            source_path: None,
            pdf_path: None,
            record_path: PathBuf::from("unused"),
        }
    }

    #[test]
    fn slug_is_lowercase_ascii_and_bounded() {
        let long = "long ".repeat(40);
        let titles = [
            "Hello, World!",
            "  Spaced   out  Title ",
            "Ünïcödé — em-dash & symbols ©",
            "MiXeD CaSe-with-hyphens",
            long.as_str(),
        ];
        for title in titles {
            let slug = slugify(title);
            assert!(slug.len() <= 50, "{slug:?}");
            assert!(
                slug.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_'),
                "{slug:?}"
            );
        }
    }

    #[test]
    fn slug_collapses_separators() {
        assert_eq!(slugify("Hello, World!"), "hello_world");
        assert_eq!(slugify("C++ & Rust"), "c_rust");
        assert_eq!(slugify("pre-trained  models"), "pre_trained_models");
    }

    #[test]
    fn slug_of_pure_symbols_is_nonempty() {
        assert_eq!(slugify("!!! ???"), "untitled");
    }

    #[test]
    fn score_parses_plain_and_fraction_forms() {
        assert_eq!(parse_score("97"), Some(97));
        assert_eq!(parse_score("97/100"), Some(97));
        assert_eq!(parse_score(" 88 / 100"), Some(88));
        assert_eq!(parse_score(""), None);
        assert_eq!(parse_score("high"), None);
    }

    #[test]
    fn record_file_accepts_string_and_numeric_scores() {
        let json = |score: &str| {
            format!(
                r#"{{"title":"t","project":"p","publish_url":"u",
                    "geo_score":{score},
                    "published_date":"2024-01-01","archived_date":"x",
                    "source_file":"a","pdf_path":"b","source_dir":"c"}}"#
            )
        };
        let rec: RecordFile = serde_json::from_str(&json("97")).unwrap();
        assert_eq!(rec.geo_score, Some(97));
        let rec: RecordFile = serde_json::from_str(&json("\"88/100\"")).unwrap();
        assert_eq!(rec.geo_score, Some(88));
        let rec: RecordFile = serde_json::from_str(&json("\"\"")).unwrap();
        assert_eq!(rec.geo_score, None);
    }

    #[test]
    fn published_sorts_before_undated_pending() {
        let mut articles = vec![
            article("b", Status::Pending, None),
            article("a", Status::Published, Some("2024-01-01")),
        ];
        articles.sort_by(sort_articles);
        assert_eq!(articles[0].status, Status::Published);
        assert_eq!(articles[1].status, Status::Pending);
    }

    #[test]
    fn dates_descend_and_undated_sort_last() {
        let mut articles = vec![
            article("old", Status::Published, Some("2023-05-01")),
            article("undated", Status::Published, None),
            article("new", Status::Published, Some("2024-02-02")),
        ];
        articles.sort_by(sort_articles);
        let titles: Vec<&str> = articles.iter().map(|a| a.title.as_str()).collect();
        assert_eq!(titles, ["new", "old", "undated"]);
    }
}
