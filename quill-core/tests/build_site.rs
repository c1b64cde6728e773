use std::fs;
use std::path::Path;

use quill_core::config::Config;
use quill_core::{BuildError, SiteBuilder};
use tempfile::TempDir;

const CONFIG: &str = r#"
[site]
title = "Notes"
host = "blog.example.com"

[tags.fe]
cn = "前端"
en = "FrontEnd"

[[materials]]
title = "Tools"
subtitle = "一些工具"
subtitle_en = "Some tools"

[[materials.sections]]
section = "Web"

[[materials.sections.items]]
title = "Squoosh"
description = "图片压缩"
description_en = "Image compression"
link = "https://squoosh.app"
"#;

fn write(path: &Path, contents: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

fn fixture() -> (TempDir, Config) {
    let root = TempDir::new().unwrap();
    let posts = root.path().join("posts");

    write(
        &posts.join("reactor/meta.yaml"),
        r#"
title: 反应器
title_en: Reactor
has_en: true
date: 2023-01-05
abstract: 中文摘要
abstract_en: English abstract
tags: [fe]
references:
  - [MDN, "https://developer.mozilla.org"]
codeDemo:
  root: demo
  codes:
    - key: counter
      path: counter
      files: [App.js]
      template: react
"#,
    );
    write(
        &posts.join("reactor/index.md"),
        "## 准备\n\n```yaml:codeDemo\nkey: counter\n```\n",
    );
    write(
        &posts.join("reactor/index.en.md"),
        "## Setup\n\nInline $a+b$ math.\n\n```rust\nfn main() {}\n```\n",
    );
    write(
        &posts.join("reactor/demo/counter/App.js"),
        "export default function App() {}\n",
    );

    write(
        &posts.join("release/draggable/meta.yaml"),
        "title: 拖拽\ndate: 2022-11-20\n",
    );
    write(&posts.join("release/draggable/index.md"), "正文\n");

    write(&root.path().join("static/style.css"), "body {}\n");

    let config: Config = toml::from_str(CONFIG).unwrap();
    (root, config)
}

#[test]
fn builds_every_page_for_both_locales() {
    let (root, config) = fixture();
    let out = root.path().join("out");

    let site = SiteBuilder::new()
        .posts_dir(root.path().join("posts"))
        .output_dir(&out)
        .static_dir(root.path().join("static"))
        .config(config)
        .build()
        .unwrap();
    let report = site.render_all().unwrap();

    assert_eq!(report.posts, 2);
    assert_eq!(report.pages, 8);
    assert_eq!(report.static_files, 1);

    for page in [
        "index.html",
        "materials/index.html",
        "blog/reactor/index.html",
        "blog/release/draggable/index.html",
        "en/index.html",
        "en/materials/index.html",
        "en/blog/reactor/index.html",
        "en/blog/release/draggable/index.html",
        "sitemap.xml",
        "robots.txt",
        "style.css",
    ] {
        assert!(out.join(page).is_file(), "missing {page}");
    }

    let home = fs::read_to_string(out.join("index.html")).unwrap();
    assert!(home.contains("反应器"));
    assert!(home.contains("2023年1月5日"));
    assert!(home.contains("前端"));
    // Newest first
    assert!(home.find("反应器").unwrap() < home.find("拖拽").unwrap());

    let en_home = fs::read_to_string(out.join("en/index.html")).unwrap();
    assert!(en_home.contains("Reactor"));
    assert!(en_home.contains("FrontEnd"));
    assert!(en_home.contains("English abstract"));

    let cn_post = fs::read_to_string(out.join("blog/reactor/index.html")).unwrap();
    assert!(cn_post.contains("class=\"code-demo\""));
    // Live preview: the frame plus the client that reads the payload into it
    assert!(cn_post.contains("<iframe class=\"code-demo-preview\""));
    assert!(cn_post.contains("\"files\":{\"/App.js\":{\"code\":"));
    assert!(cn_post.contains("loadSandpackClient"));
    assert!(cn_post.contains("<title>反应器 | Notes</title>"));

    let en_post = fs::read_to_string(out.join("en/blog/reactor/index.html")).unwrap();
    assert!(en_post.contains("<h2 id=\"setup\" class=\"heading h2\">Setup</h2>"));
    assert!(en_post.contains("<span class=\"latex inline\">\\(a+b\\)</span>"));
    assert!(en_post.contains("data-language=\"rust\""));
    assert!(en_post.contains("<title>Reactor | Notes</title>"));

    // Monolingual posts fall back to the default body
    let en_draggable =
        fs::read_to_string(out.join("en/blog/release/draggable/index.html")).unwrap();
    assert!(en_draggable.contains("正文"));

    let materials = fs::read_to_string(out.join("en/materials/index.html")).unwrap();
    assert!(materials.contains("Some tools"));
    assert!(materials.contains("Image compression"));

    let sitemap = fs::read_to_string(out.join("sitemap.xml")).unwrap();
    assert!(sitemap.contains("<loc>https://blog.example.com/en/blog/reactor</loc>"));
    assert!(sitemap.contains("<loc>https://blog.example.com/blog/release/draggable</loc>"));
    assert!(!sitemap.contains("https://blog.example.com/en/blog/release/draggable"));
    assert!(sitemap.contains("<lastmod>2023-01-05</lastmod>"));

    let robots = fs::read_to_string(out.join("robots.txt")).unwrap();
    assert!(robots.contains("Sitemap: https://blog.example.com/sitemap.xml"));
}

#[test]
fn missing_demo_file_fails_the_build() {
    let (root, config) = fixture();
    fs::remove_file(root.path().join("posts/reactor/demo/counter/App.js")).unwrap();

    let result = SiteBuilder::new()
        .posts_dir(root.path().join("posts"))
        .config(config)
        .build();

    match result {
        Err(BuildError::Load(err)) => assert!(err.to_string().contains("reactor")),
        Err(other) => panic!("unexpected error {other}"),
        Ok(_) => panic!("build should fail"),
    }
}

#[test]
fn duplicate_post_paths_fail_the_build() {
    let (root, config) = fixture();
    write(
        &root.path().join("posts/reactor-copy/meta.yaml"),
        "title: 副本\ndate: 2023-02-01\npath: reactor\n",
    );
    write(&root.path().join("posts/reactor-copy/index.md"), "副本");

    let result = SiteBuilder::new()
        .posts_dir(root.path().join("posts"))
        .config(config)
        .build();

    match result {
        Err(BuildError::Load(err)) => {
            let message = err.to_string();
            assert!(message.contains("reactor-copy"), "{message}");
            assert!(message.contains("`reactor`"), "{message}");
        }
        Err(other) => panic!("unexpected error {other}"),
        Ok(_) => panic!("build should fail"),
    }
}

#[test]
fn theme_overrides_templates() {
    let (root, config) = fixture();
    let out = root.path().join("out");
    write(
        &root.path().join("theme/materials.html"),
        "materials of {{ site.title }}",
    );

    SiteBuilder::new()
        .posts_dir(root.path().join("posts"))
        .output_dir(&out)
        .theme_dir(root.path().join("theme"))
        .config(config)
        .build()
        .unwrap()
        .render_all()
        .unwrap();

    let materials = fs::read_to_string(out.join("materials/index.html")).unwrap();
    assert_eq!(materials, "materials of Notes");
}
