use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use walkdir::WalkDir;

use crate::locale::Locale;

pub const META_FILE: &str = "meta.yaml";
pub const BODY_FILE: &str = "index.md";
pub const BODY_FILE_EN: &str = "index.en.md";

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid front-matter in {}: {source}", path.display())]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("invalid date `{value}` in {}", path.display())]
    InvalidDate { path: PathBuf, value: String },
    #[error("post `{post}` references demo file {} which could not be read: {source}", file.display())]
    DemoFile {
        post: String,
        file: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(
        "posts in {} and {} both publish to `{path}`",
        first.display(),
        second.display()
    )]
    DuplicatePath {
        path: String,
        first: PathBuf,
        second: PathBuf,
    },
    #[error("failed to walk posts directory: {0}")]
    Walk(#[from] walkdir::Error),
}

/// `meta.yaml` as written by hand. Everything except `title` and `date`
/// may be left out.
#[derive(Debug, Deserialize)]
struct RawPostMeta {
    title: String,
    #[serde(default)]
    title_en: String,
    #[serde(default)]
    has_en: bool,
    path: Option<String>,
    date: String,
    #[serde(default, rename = "abstract")]
    summary: String,
    #[serde(default, rename = "abstract_en")]
    summary_en: String,
    #[serde(default)]
    requirements: Vec<String>,
    #[serde(default)]
    references: Vec<(String, String)>,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    environment: Vec<(String, String)>,
    #[serde(default)]
    draft: bool,
    #[serde(rename = "codeDemo")]
    code_demo: Option<RawCodeDemo>,
}

#[derive(Debug, Deserialize)]
struct RawCodeDemo {
    #[serde(default)]
    root: String,
    #[serde(default)]
    codes: Vec<RawCodeDemoEntry>,
}

#[derive(Debug, Deserialize)]
struct RawCodeDemoEntry {
    key: String,
    path: String,
    entry: Option<String>,
    files: Vec<String>,
    #[serde(default)]
    template: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CodeDemoFile {
    pub path: String,
    pub data: String,
}

/// A named bundle of source files rendered as a sandbox wherever the post
/// body references its key.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CodeDemoEntry {
    pub key: String,
    pub path: String,
    pub entry: String,
    pub template: String,
    pub files: Vec<CodeDemoFile>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PostMeta {
    pub title: String,
    pub title_en: String,
    pub has_en: bool,
    /// `/`-separated location of the post under `/blog`
    pub path: String,
    pub date: NaiveDateTime,
    pub summary: String,
    pub summary_en: String,
    pub requirements: Vec<String>,
    pub references: Vec<(String, String)>,
    pub tags: Vec<String>,
    pub environment: Vec<(String, String)>,
    pub draft: bool,
    pub codes: Vec<CodeDemoEntry>,
    #[serde(skip)]
    pub source_dir: PathBuf,
}

impl PostMeta {
    pub fn slug(&self) -> Vec<String> {
        self.path
            .split('/')
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }

    pub fn href(&self, locale: Locale) -> String {
        format!("{}/blog/{}", locale.prefix(), self.slug().join("/"))
    }

    pub fn title_for(&self, locale: Locale) -> &str {
        if locale == Locale::En && !self.title_en.is_empty() {
            &self.title_en
        } else {
            &self.title
        }
    }

    pub fn summary_for(&self, locale: Locale) -> &str {
        if locale == Locale::En && !self.summary_en.is_empty() {
            &self.summary_en
        } else {
            &self.summary
        }
    }

    pub fn demo_map(&self) -> HashMap<&str, &CodeDemoEntry> {
        self.codes.iter().map(|c| (c.key.as_str(), c)).collect()
    }

    /// File holding the body for `locale`. English falls back to the
    /// default body unless the post declares `has_en`.
    pub fn body_path(&self, locale: Locale) -> PathBuf {
        if locale == Locale::En && self.has_en {
            self.source_dir.join(BODY_FILE_EN)
        } else {
            self.source_dir.join(BODY_FILE)
        }
    }

    pub fn read_body(&self, locale: Locale) -> Result<String, LoadError> {
        let path = self.body_path(locale);
        std::fs::read_to_string(&path).map_err(|source| LoadError::Io { path, source })
    }
}

#[derive(Debug, Clone)]
pub struct Post {
    pub meta: PostMeta,
    pub locale: Locale,
    pub body: String,
}

pub fn parse_meta(posts_dir: &Path, post_dir: &Path, yaml: &str) -> Result<PostMeta, LoadError> {
    let meta_path = post_dir.join(META_FILE);
    let raw: RawPostMeta = serde_yaml::from_str(yaml).map_err(|source| LoadError::Yaml {
        path: meta_path.clone(),
        source,
    })?;

    let date = parse_date(&raw.date).ok_or_else(|| LoadError::InvalidDate {
        path: meta_path.clone(),
        value: raw.date.clone(),
    })?;

    let path = raw
        .path
        .unwrap_or_else(|| default_post_path(posts_dir, post_dir));

    let mut codes = Vec::new();
    if let Some(demo) = raw.code_demo {
        for code in demo.codes {
            let mut files = Vec::with_capacity(code.files.len());
            for file_path in &code.files {
                let file = post_dir
                    .join(demo.root.trim_start_matches('/'))
                    .join(code.path.trim_start_matches('/'))
                    .join(file_path.trim_start_matches('/'));
                let data = std::fs::read_to_string(&file).map_err(|source| LoadError::DemoFile {
                    post: path.clone(),
                    file: file.clone(),
                    source,
                })?;
                files.push(CodeDemoFile {
                    path: file_path.clone(),
                    data,
                });
            }
            codes.push(CodeDemoEntry {
                key: code.key,
                path: code.path,
                entry: code.entry.unwrap_or_default(),
                template: code.template,
                files,
            });
        }
    }

    Ok(PostMeta {
        title: raw.title,
        title_en: raw.title_en,
        has_en: raw.has_en,
        path,
        date,
        summary: raw.summary,
        summary_en: raw.summary_en,
        requirements: raw.requirements,
        references: raw.references,
        tags: raw.tags,
        environment: raw.environment,
        draft: raw.draft,
        codes,
        source_dir: post_dir.to_path_buf(),
    })
}

/// Reads the front-matter of the post stored in `post_dir`, or `None` if
/// the directory is not a post.
pub fn load_meta(posts_dir: &Path, post_dir: &Path) -> Result<Option<PostMeta>, LoadError> {
    let meta_path = post_dir.join(META_FILE);
    if !meta_path.is_file() {
        return Ok(None);
    }

    let yaml = std::fs::read_to_string(&meta_path).map_err(|source| LoadError::Io {
        path: meta_path.clone(),
        source,
    })?;

    parse_meta(posts_dir, post_dir, &yaml).map(Some)
}

/// Every directory below `posts_dir` holding a `meta.yaml`, newest first.
pub fn load_posts<P: AsRef<Path>>(posts_dir: P) -> Result<Vec<PostMeta>, LoadError> {
    let posts_dir = posts_dir.as_ref();
    log::info!("Scanning posts in {}", posts_dir.display());

    let mut posts = Vec::new();
    let mut seen: HashMap<String, PathBuf> = HashMap::new();
    for entry in WalkDir::new(posts_dir).min_depth(1).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_dir() {
            continue;
        }

        if let Some(meta) = load_meta(posts_dir, entry.path())? {
            log::debug!("Found post {} ({})", meta.path, entry.path().display());

            // `/a/` and `a` publish to the same URL
            let path = meta.slug().join("/");
            if let Some(first) = seen.get(&path) {
                return Err(LoadError::DuplicatePath {
                    path,
                    first: first.clone(),
                    second: meta.source_dir,
                });
            }
            seen.insert(path, meta.source_dir.clone());
            posts.push(meta);
        }
    }

    sort_posts(&mut posts);
    Ok(posts)
}

/// Looks a post up by its slug, treating the slug as a directory below
/// `posts_dir`.
pub fn load_post<P: AsRef<Path>>(
    posts_dir: P,
    slug: &[String],
    locale: Locale,
) -> Result<Option<Post>, LoadError> {
    let posts_dir = posts_dir.as_ref();
    let post_dir = slug.iter().fold(posts_dir.to_path_buf(), |dir, s| dir.join(s));

    let Some(meta) = load_meta(posts_dir, &post_dir)? else {
        return Ok(None);
    };
    let body = meta.read_body(locale)?;

    Ok(Some(Post { meta, locale, body }))
}

pub fn sort_posts(posts: &mut [PostMeta]) {
    posts.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| a.path.cmp(&b.path)));
}

fn default_post_path(posts_dir: &Path, post_dir: &Path) -> String {
    match post_dir.strip_prefix(posts_dir) {
        Ok(relative) => relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().to_string())
            .collect::<Vec<_>>()
            .join("/"),
        Err(_) => post_dir
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default(),
    }
}

fn parse_date(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_local());
    }

    for fmt in [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M:%S",
        "%Y/%m/%d %H:%M:%S",
    ] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt);
        }
    }

    ["%Y-%m-%d", "%Y/%m/%d"]
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_post(root: &Path, rel: &str, meta: &str, body: &str) -> PathBuf {
        let dir = root.join(rel);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(META_FILE), meta).unwrap();
        fs::write(dir.join(BODY_FILE), body).unwrap();
        dir
    }

    #[test]
    fn test_defaults_for_optional_fields() {
        let tmp = TempDir::new().unwrap();
        let dir = write_post(tmp.path(), "hello", "title: Hello\ndate: 2023-01-05\n", "# Hi");

        let meta = load_meta(tmp.path(), &dir).unwrap().unwrap();
        assert_eq!(meta.title, "Hello");
        assert_eq!(meta.path, "hello");
        assert!(!meta.has_en);
        assert!(!meta.draft);
        assert!(meta.tags.is_empty());
        assert!(meta.codes.is_empty());
        assert_eq!(meta.date.format("%Y-%m-%d").to_string(), "2023-01-05");
    }

    #[test]
    fn test_not_a_post_without_meta() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("assets")).unwrap();
        assert!(load_meta(tmp.path(), &tmp.path().join("assets")).unwrap().is_none());
    }

    #[test]
    fn test_posts_sorted_newest_first() {
        let tmp = TempDir::new().unwrap();
        write_post(tmp.path(), "old", "title: Old\ndate: 2020-05-01\n", "");
        write_post(tmp.path(), "new", "title: New\ndate: 2023-02-01 10:30\n", "");
        write_post(tmp.path(), "mid", "title: Mid\ndate: 2021-07-15T08:00:00+08:00\n", "");

        let posts = load_posts(tmp.path()).unwrap();
        let titles: Vec<_> = posts.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["New", "Mid", "Old"]);
    }

    #[test]
    fn test_nested_posts_get_multi_segment_slug() {
        let tmp = TempDir::new().unwrap();
        write_post(tmp.path(), "release/draggable", "title: Drag\ndate: 2022-03-01\n", "");

        let posts = load_posts(tmp.path()).unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].path, "release/draggable");
        assert_eq!(posts[0].slug(), vec!["release", "draggable"]);
        assert_eq!(posts[0].href(Locale::En), "/en/blog/release/draggable");
    }

    #[test]
    fn test_duplicate_paths_name_both_posts() {
        let tmp = TempDir::new().unwrap();
        let first = write_post(tmp.path(), "a", "title: A\ndate: 2023-01-01\npath: same\n", "");
        let second = write_post(tmp.path(), "b", "title: B\ndate: 2023-01-02\npath: /same/\n", "");

        match load_posts(tmp.path()) {
            Err(LoadError::DuplicatePath { path, first: a, second: b }) => {
                assert_eq!(path, "same");
                assert_eq!(a, first);
                assert_eq!(b, second);
            }
            other => panic!("expected a duplicate path error, got {other:?}"),
        }
    }

    #[test]
    fn test_explicit_path_overrides_directory() {
        let tmp = TempDir::new().unwrap();
        let dir = write_post(
            tmp.path(),
            "2022-reactor",
            "title: Reactor\ndate: 2022-01-01\npath: /reactor-pattern/\n",
            "",
        );
        let meta = load_meta(tmp.path(), &dir).unwrap().unwrap();
        assert_eq!(meta.slug(), vec!["reactor-pattern"]);
        assert_eq!(meta.href(Locale::Cn), "/blog/reactor-pattern");
    }

    #[test]
    fn test_code_demo_files_are_loaded() {
        let tmp = TempDir::new().unwrap();
        let meta = r#"
title: Draggable
date: 2022-03-01
codeDemo:
  root: demos
  codes:
    - key: simple-drag-list
      path: simple-drag-list
      template: react
      files:
        - /App.js
        - /drag-list.js
"#;
        let dir = write_post(tmp.path(), "draggable", meta, "");
        let demo_dir = dir.join("demos/simple-drag-list");
        fs::create_dir_all(&demo_dir).unwrap();
        fs::write(demo_dir.join("App.js"), "export default App;").unwrap();
        fs::write(demo_dir.join("drag-list.js"), "export const list = [];").unwrap();

        let meta = load_meta(tmp.path(), &dir).unwrap().unwrap();
        assert_eq!(meta.codes.len(), 1);
        let demo = &meta.codes[0];
        assert_eq!(demo.template, "react");
        assert_eq!(demo.entry, "");
        assert_eq!(demo.files[0].path, "/App.js");
        assert_eq!(demo.files[0].data, "export default App;");
        assert!(meta.demo_map().contains_key("simple-drag-list"));
    }

    #[test]
    fn test_missing_demo_file_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let meta = r#"
title: Broken
date: 2022-03-01
codeDemo:
  root: demos
  codes:
    - key: gone
      path: gone
      files: [index.js]
"#;
        let dir = write_post(tmp.path(), "broken", meta, "");
        let err = load_meta(tmp.path(), &dir).unwrap_err();
        assert!(matches!(err, LoadError::DemoFile { ref post, .. } if post == "broken"));
    }

    #[test]
    fn test_invalid_date() {
        let tmp = TempDir::new().unwrap();
        let dir = write_post(tmp.path(), "bad", "title: Bad\ndate: someday\n", "");
        let err = load_meta(tmp.path(), &dir).unwrap_err();
        assert!(matches!(err, LoadError::InvalidDate { ref value, .. } if value == "someday"));
    }

    #[test]
    fn test_references_and_environment_pairs() {
        let tmp = TempDir::new().unwrap();
        let meta = r#"
title: Refs
date: 2022-03-01
references:
  - [MDN, "https://developer.mozilla.org"]
environment:
  - [node, "18.0"]
"#;
        let dir = write_post(tmp.path(), "refs", meta, "");
        let meta = load_meta(tmp.path(), &dir).unwrap().unwrap();
        assert_eq!(
            meta.references,
            vec![("MDN".to_string(), "https://developer.mozilla.org".to_string())]
        );
        assert_eq!(meta.environment[0].0, "node");
    }

    #[test]
    fn test_load_post_picks_localized_body() {
        let tmp = TempDir::new().unwrap();
        let dir = write_post(
            tmp.path(),
            "bilingual",
            "title: 双语\ntitle_en: Bilingual\nhas_en: true\ndate: 2022-03-01\n",
            "中文正文",
        );
        fs::write(dir.join(BODY_FILE_EN), "English body").unwrap();
        write_post(tmp.path(), "cn-only", "title: 中文\ndate: 2022-03-01\n", "只有中文");

        let slug = vec!["bilingual".to_string()];
        let en = load_post(tmp.path(), &slug, Locale::En).unwrap().unwrap();
        assert_eq!(en.body, "English body");
        assert_eq!(en.meta.title_for(Locale::En), "Bilingual");
        let cn = load_post(tmp.path(), &slug, Locale::Cn).unwrap().unwrap();
        assert_eq!(cn.body, "中文正文");

        let fallback = load_post(tmp.path(), &["cn-only".to_string()], Locale::En)
            .unwrap()
            .unwrap();
        assert_eq!(fallback.body, "只有中文");
        assert_eq!(fallback.meta.title_for(Locale::En), "中文");

        assert!(load_post(tmp.path(), &["nope".to_string()], Locale::Cn).unwrap().is_none());
    }

    #[test]
    fn test_equal_dates_ordered_by_path() {
        let tmp = TempDir::new().unwrap();
        write_post(tmp.path(), "b", "title: B\ndate: 2022-03-01\n", "");
        write_post(tmp.path(), "a", "title: A\ndate: 2022-03-01\n", "");
        let posts = load_posts(tmp.path()).unwrap();
        assert_eq!(posts[0].path, "a");
        assert_eq!(posts[1].path, "b");
    }
}
