use std::collections::{HashMap, HashSet};
use std::path::Path;

use pulldown_cmark::{Alignment, CodeBlockKind, Event, Options, Parser, Tag};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::highlight::Highlighter;
use crate::posts::CodeDemoEntry;

pub const DEFAULT_CODE_LANGUAGE: &str = "js";

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("invalid `{kind}` block: {source}")]
    EmbedYaml {
        kind: &'static str,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("code demo `{key}` is not declared in the post's codeDemo list")]
    UnknownDemo { key: String },
    #[error("failed to serialize code demo `{key}`: {source}")]
    DemoPayload {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum PageElement {
    Heading { level: u32, id: String, content: Vec<InlineElement> },
    Paragraph { content: Vec<InlineElement> },
    CodeBlock { language: Option<String>, content: String },
    Math { tex: String },
    CodeDemo { key: String },
    Stackblitz { id: String, open_file: Option<String> },
    CodeSandbox { url: String, height: Option<String> },
    List { items: Vec<ListItem>, ordered: bool, start: Option<u64> },
    BlockQuote { content: Vec<PageElement> },
    Table {
        alignments: Vec<Alignment>,
        headers: Vec<Vec<InlineElement>>,
        rows: Vec<Vec<Vec<InlineElement>>>,
    },
    HorizontalRule,
    Html { content: String },
}

#[derive(Debug, Clone, PartialEq)]
pub enum InlineElement {
    Text(String),
    Code(String),
    Math { tex: String, display: bool },
    Link { url: String, title: Option<String>, content: Vec<InlineElement> },
    Image { alt: String, url: String, title: Option<String> },
    Emphasis(Vec<InlineElement>),
    Strong(Vec<InlineElement>),
    Strikethrough(Vec<InlineElement>),
    Html(String),
    SoftBreak,
    HardBreak,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ListItem {
    pub content: Vec<InlineElement>,
    /// Paragraphs of loose lists and nested lists
    pub blocks: Vec<PageElement>,
    pub checked: Option<bool>, // For task lists
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TocEntry {
    pub depth: u32,
    pub text: String,
    pub id: String,
}

#[derive(Deserialize)]
struct CodeDemoRef {
    key: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StackblitzEmbed {
    id: String,
    open_file: Option<String>,
}

#[derive(Deserialize)]
struct CodeSandboxEmbed {
    url: String,
    height: Option<Dimension>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Dimension {
    Pixels(u64),
    Css(String),
}

impl Dimension {
    fn into_string(self) -> String {
        match self {
            Dimension::Pixels(px) => px.to_string(),
            Dimension::Css(css) => css,
        }
    }
}

pub fn parse_markdown(content: &str) -> Result<Vec<PageElement>, RenderError> {
    let options = Options::ENABLE_TABLES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS
        | Options::ENABLE_MATH;
    let parser = Parser::new_ext(content, options);

    let mut tree = TreeBuilder::default();
    for event in parser {
        tree.push_event(event)?;
    }

    Ok(tree.elements)
}

/// Headings up to depth 3 at the top level of the document.
pub fn table_of_contents(elements: &[PageElement]) -> Vec<TocEntry> {
    elements
        .iter()
        .filter_map(|el| match el {
            PageElement::Heading { level, id, content } if *level <= 3 => Some(TocEntry {
                depth: *level,
                text: plain_text(content),
                id: id.clone(),
            }),
            _ => None,
        })
        .collect()
}

pub fn plain_text(elements: &[InlineElement]) -> String {
    let mut text = String::new();

    for element in elements {
        match element {
            InlineElement::Text(s) | InlineElement::Code(s) => text.push_str(s),
            InlineElement::Math { tex, .. } => text.push_str(tex),
            InlineElement::Image { alt, .. } => text.push_str(alt),
            InlineElement::Link { content, .. }
            | InlineElement::Emphasis(content)
            | InlineElement::Strong(content)
            | InlineElement::Strikethrough(content) => text.push_str(&plain_text(content)),
            InlineElement::SoftBreak | InlineElement::HardBreak => text.push(' '),
            InlineElement::Html(_) => {}
        }
    }

    text
}

#[derive(Debug)]
enum FrameKind {
    Heading(u32, Option<String>),
    Paragraph,
    CodeBlock(Option<String>),
    HtmlBlock,
    List(Option<u64>),
    ListItem,
    BlockQuote,
    Table(Vec<Alignment>),
    TableHead,
    TableRow,
    TableCell,
    Emphasis,
    Strong,
    Strikethrough,
    Link(String, Option<String>),  // url, title
    Image(String, Option<String>), // url, title
    /// Containers without their own element; children pass through
    Transparent,
}

#[derive(Debug)]
struct Frame {
    kind: FrameKind,
    inline: Vec<InlineElement>,
    blocks: Vec<PageElement>,
    items: Vec<ListItem>,
    header: Vec<Vec<InlineElement>>,
    rows: Vec<Vec<Vec<InlineElement>>>,
    cells: Vec<Vec<InlineElement>>,
    raw: String,
    checked: Option<bool>,
}

impl Frame {
    fn from_tag(tag: Tag) -> Self {
        let kind = match tag {
            Tag::Heading { level, id, .. } => {
                FrameKind::Heading(level as u32, id.map(|id| id.to_string()))
            }
            Tag::Paragraph => FrameKind::Paragraph,
            Tag::CodeBlock(CodeBlockKind::Fenced(info)) => {
                FrameKind::CodeBlock(info.split_whitespace().next().map(str::to_string))
            }
            Tag::CodeBlock(CodeBlockKind::Indented) => FrameKind::CodeBlock(None),
            Tag::HtmlBlock => FrameKind::HtmlBlock,
            Tag::List(start) => FrameKind::List(start),
            Tag::Item => FrameKind::ListItem,
            Tag::BlockQuote(_) => FrameKind::BlockQuote,
            Tag::Table(alignments) => FrameKind::Table(alignments),
            Tag::TableHead => FrameKind::TableHead,
            Tag::TableRow => FrameKind::TableRow,
            Tag::TableCell => FrameKind::TableCell,
            Tag::Emphasis => FrameKind::Emphasis,
            Tag::Strong => FrameKind::Strong,
            Tag::Strikethrough => FrameKind::Strikethrough,
            Tag::Link { dest_url, title, .. } => {
                FrameKind::Link(dest_url.to_string(), non_empty(&title))
            }
            Tag::Image { dest_url, title, .. } => {
                FrameKind::Image(dest_url.to_string(), non_empty(&title))
            }
            _ => FrameKind::Transparent,
        };

        Self {
            kind,
            inline: Vec::new(),
            blocks: Vec::new(),
            items: Vec::new(),
            header: Vec::new(),
            rows: Vec::new(),
            cells: Vec::new(),
            raw: String::new(),
            checked: None,
        }
    }

    fn collects_raw_text(&self) -> bool {
        matches!(self.kind, FrameKind::CodeBlock(_) | FrameKind::HtmlBlock)
    }
}

fn non_empty(s: &str) -> Option<String> {
    if s.is_empty() { None } else { Some(s.to_string()) }
}

#[derive(Default)]
struct TreeBuilder {
    stack: Vec<Frame>,
    elements: Vec<PageElement>,
    slugger: Slugger,
}

impl TreeBuilder {
    fn push_event(&mut self, event: Event) -> Result<(), RenderError> {
        match event {
            Event::Start(tag) => self.stack.push(Frame::from_tag(tag)),
            Event::End(_) => {
                if let Some(frame) = self.stack.pop() {
                    self.finish(frame)?;
                }
            }
            Event::Text(text) => match self.stack.last_mut() {
                Some(frame) if frame.collects_raw_text() => frame.raw.push_str(&text),
                _ => self.push_inline(InlineElement::Text(text.to_string())),
            },
            Event::Code(code) => {
                let element = match code.strip_prefix("$$").and_then(|c| c.strip_suffix("$$")) {
                    Some(tex) => InlineElement::Math {
                        tex: tex.to_string(),
                        display: false,
                    },
                    None => InlineElement::Code(code.to_string()),
                };
                self.push_inline(element);
            }
            Event::InlineMath(tex) => self.push_inline(InlineElement::Math {
                tex: tex.to_string(),
                display: false,
            }),
            Event::DisplayMath(tex) => self.push_inline(InlineElement::Math {
                tex: tex.to_string(),
                display: true,
            }),
            Event::Html(html) => match self.stack.last_mut() {
                Some(frame) if frame.collects_raw_text() => frame.raw.push_str(&html),
                _ => self.push_block(PageElement::Html {
                    content: html.to_string(),
                }),
            },
            Event::InlineHtml(html) => self.push_inline(InlineElement::Html(html.to_string())),
            Event::SoftBreak => self.push_inline(InlineElement::SoftBreak),
            Event::HardBreak => self.push_inline(InlineElement::HardBreak),
            Event::Rule => self.push_block(PageElement::HorizontalRule),
            Event::TaskListMarker(checked) => {
                if let Some(frame) = self.stack.last_mut() {
                    frame.checked = Some(checked);
                }
            }
            _ => {}
        }

        Ok(())
    }

    fn push_inline(&mut self, element: InlineElement) {
        if let Some(frame) = self.stack.last_mut() {
            frame.inline.push(element);
        }
    }

    fn push_block(&mut self, element: PageElement) {
        match self.stack.last_mut() {
            Some(frame) => frame.blocks.push(element),
            None => self.elements.push(element),
        }
    }

    fn finish(&mut self, frame: Frame) -> Result<(), RenderError> {
        match frame.kind {
            FrameKind::Emphasis => self.push_inline(InlineElement::Emphasis(frame.inline)),
            FrameKind::Strong => self.push_inline(InlineElement::Strong(frame.inline)),
            FrameKind::Strikethrough => {
                self.push_inline(InlineElement::Strikethrough(frame.inline))
            }
            FrameKind::Link(url, title) => self.push_inline(InlineElement::Link {
                url,
                title,
                content: frame.inline,
            }),
            FrameKind::Image(url, title) => self.push_inline(InlineElement::Image {
                alt: plain_text(&frame.inline),
                url,
                title,
            }),
            FrameKind::ListItem => {
                if let Some(parent) = self.stack.last_mut() {
                    parent.items.push(ListItem {
                        content: frame.inline,
                        blocks: frame.blocks,
                        checked: frame.checked,
                    });
                }
            }
            FrameKind::TableCell => {
                if let Some(parent) = self.stack.last_mut() {
                    parent.cells.push(frame.inline);
                }
            }
            FrameKind::TableHead => {
                if let Some(parent) = self.stack.last_mut() {
                    parent.header = frame.cells;
                }
            }
            FrameKind::TableRow => {
                if let Some(parent) = self.stack.last_mut() {
                    parent.rows.push(frame.cells);
                }
            }
            FrameKind::Table(alignments) => self.push_block(PageElement::Table {
                alignments,
                headers: frame.header,
                rows: frame.rows,
            }),
            FrameKind::Heading(level, id) => {
                let id = match id {
                    Some(id) => self.slugger.reserve(id),
                    None => self.slugger.slugify(&plain_text(&frame.inline)),
                };
                self.push_block(PageElement::Heading {
                    level,
                    id,
                    content: frame.inline,
                });
            }
            FrameKind::Paragraph => {
                if !frame.inline.is_empty() {
                    self.push_block(PageElement::Paragraph {
                        content: frame.inline,
                    });
                }
            }
            FrameKind::CodeBlock(language) => {
                let element = code_block_element(language, frame.raw)?;
                self.push_block(element);
            }
            FrameKind::HtmlBlock => self.push_block(PageElement::Html { content: frame.raw }),
            FrameKind::List(start) => self.push_block(PageElement::List {
                items: frame.items,
                ordered: start.is_some(),
                start,
            }),
            FrameKind::BlockQuote => self.push_block(PageElement::BlockQuote {
                content: frame.blocks,
            }),
            FrameKind::Transparent => {
                for element in frame.inline {
                    self.push_inline(element);
                }
                for element in frame.blocks {
                    self.push_block(element);
                }
            }
        }

        Ok(())
    }
}

/// Fenced blocks tagged `yaml:<embed>` carry embed options instead of code.
fn code_block_element(language: Option<String>, content: String) -> Result<PageElement, RenderError> {
    match language.as_deref() {
        Some("yaml:codeDemo") => {
            let demo: CodeDemoRef = parse_embed("codeDemo", &content)?;
            Ok(PageElement::CodeDemo { key: demo.key })
        }
        Some("yaml:stackblitz") => {
            let embed: StackblitzEmbed = parse_embed("stackblitz", &content)?;
            Ok(PageElement::Stackblitz {
                id: embed.id,
                open_file: embed.open_file,
            })
        }
        Some("yaml:codeSandbox") => {
            let embed: CodeSandboxEmbed = parse_embed("codeSandbox", &content)?;
            Ok(PageElement::CodeSandbox {
                url: embed.url,
                height: embed.height.map(Dimension::into_string),
            })
        }
        Some("math") => Ok(PageElement::Math {
            tex: content.trim_end().to_string(),
        }),
        _ => Ok(PageElement::CodeBlock { language, content }),
    }
}

fn parse_embed<T: for<'de> Deserialize<'de>>(kind: &'static str, yaml: &str) -> Result<T, RenderError> {
    serde_yaml::from_str(yaml).map_err(|source| RenderError::EmbedYaml { kind, source })
}

/// Unique heading anchors within one document.
#[derive(Default)]
struct Slugger {
    generated: HashSet<String>,
}

impl Slugger {
    fn slugify(&mut self, text: &str) -> String {
        let base = slug::slugify(text);
        let base = if base.is_empty() { "section".to_string() } else { base };
        self.reserve(base)
    }

    fn reserve(&mut self, base: String) -> String {
        let mut candidate = base.clone();
        let mut counter = 1;
        while self.generated.contains(&candidate) {
            candidate = format!("{}-{}", base, counter);
            counter += 1;
        }
        self.generated.insert(candidate.clone());
        candidate
    }
}

/// Turns an element tree into HTML for one post.
pub struct PostRenderer<'a> {
    demos: HashMap<&'a str, &'a CodeDemoEntry>,
    highlighter: &'a Highlighter,
}

impl<'a> PostRenderer<'a> {
    pub fn new(demos: HashMap<&'a str, &'a CodeDemoEntry>, highlighter: &'a Highlighter) -> Self {
        Self { demos, highlighter }
    }

    pub fn render(&self, elements: &[PageElement]) -> Result<String, RenderError> {
        let mut html = String::new();
        for element in elements {
            self.render_element(element, &mut html)?;
        }
        Ok(html)
    }

    fn render_element(&self, element: &PageElement, html: &mut String) -> Result<(), RenderError> {
        match element {
            PageElement::Heading { level, id, content } => {
                html.push_str(&format!(
                    "<h{0} id=\"{1}\" class=\"heading h{0}\">{2}</h{0}>\n",
                    level,
                    html_escape::encode_double_quoted_attribute(id),
                    render_inline(content)
                ));
            }
            PageElement::Paragraph { content } => {
                html.push_str(&format!("<p class=\"paragraph\">{}</p>\n", render_inline(content)));
            }
            PageElement::CodeBlock { language, content } => {
                let language = language.as_deref().unwrap_or(DEFAULT_CODE_LANGUAGE);
                html.push_str(&self.highlighter.highlight(content, language));
            }
            PageElement::Math { tex } => {
                html.push_str(&format!(
                    "<div class=\"latex block\">\\[{}\\]</div>\n",
                    html_escape::encode_text(tex)
                ));
            }
            PageElement::CodeDemo { key } => {
                let demo = self
                    .demos
                    .get(key.as_str())
                    .ok_or_else(|| RenderError::UnknownDemo { key: key.clone() })?;
                html.push_str(&self.render_code_demo(demo)?);
            }
            PageElement::Stackblitz { id, open_file } => {
                let mut src = format!(
                    "https://stackblitz.com/edit/{}?embed=1&view=editor",
                    query_value(id)
                );
                if let Some(file) = open_file {
                    src.push_str(&format!("&file={}", query_value(file)));
                }
                html.push_str(&format!(
                    "<iframe class=\"stackblitz\" src=\"{}\" title=\"StackBlitz project {}\" loading=\"lazy\"></iframe>\n",
                    html_escape::encode_double_quoted_attribute(&src),
                    html_escape::encode_double_quoted_attribute(id)
                ));
            }
            PageElement::CodeSandbox { url, height } => {
                let height_attr = height
                    .as_ref()
                    .map(|h| format!(" height=\"{}\"", html_escape::encode_double_quoted_attribute(h)))
                    .unwrap_or_default();
                let src = format!("{}?theme-id=light&default-tab=js,result", url);
                html.push_str(&format!(
                    "<iframe class=\"code-sandbox\"{} style=\"width: 100%\" scrolling=\"no\" title=\"CodeSandbox embed\" src=\"{}\" frameborder=\"no\" allowtransparency=\"true\" allowfullscreen=\"true\"></iframe>\n",
                    height_attr,
                    html_escape::encode_double_quoted_attribute(&src)
                ));
            }
            PageElement::List { items, ordered, start } => {
                let tag = if *ordered { "ol" } else { "ul" };
                let start_attr = match start {
                    Some(n) if *ordered && *n != 1 => format!(" start=\"{}\"", n),
                    _ => String::new(),
                };
                html.push_str(&format!("<{}{} class=\"list\">\n", tag, start_attr));
                for item in items {
                    self.render_list_item(item, html)?;
                }
                html.push_str(&format!("</{}>\n", tag));
            }
            PageElement::BlockQuote { content } => {
                html.push_str("<blockquote class=\"block-quote\">\n");
                for child in content {
                    self.render_element(child, html)?;
                }
                html.push_str("</blockquote>\n");
            }
            PageElement::Table {
                alignments,
                headers,
                rows,
            } => html.push_str(&render_table(alignments, headers, rows)),
            PageElement::HorizontalRule => html.push_str("<hr />\n"),
            PageElement::Html { content } => {
                html.push_str(content);
                if !content.ends_with('\n') {
                    html.push('\n');
                }
            }
        }

        Ok(())
    }

    fn render_list_item(&self, item: &ListItem, html: &mut String) -> Result<(), RenderError> {
        html.push_str("<li>");
        if let Some(checked) = item.checked {
            html.push_str(if checked {
                "<input type=\"checkbox\" checked disabled/> "
            } else {
                "<input type=\"checkbox\" disabled/> "
            });
        }
        html.push_str(&render_inline(&item.content));
        if !item.blocks.is_empty() {
            html.push('\n');
            for block in &item.blocks {
                self.render_element(block, html)?;
            }
        }
        html.push_str("</li>\n");
        Ok(())
    }

    /// Sources are rendered statically as tabs. `post.html` reads the JSON
    /// payload (a sandpack sandbox setup) and mounts the live preview into
    /// the `code-demo-preview` frame.
    fn render_code_demo(&self, demo: &CodeDemoEntry) -> Result<String, RenderError> {
        let files: serde_json::Map<String, serde_json::Value> = demo
            .files
            .iter()
            .map(|f| (sandbox_path(&f.path), serde_json::json!({ "code": f.data })))
            .collect();
        let mut payload = serde_json::json!({
            "template": demo.template,
            "files": files,
        });
        if !demo.entry.is_empty() {
            payload["entry"] = serde_json::Value::String(sandbox_path(&demo.entry));
        }
        let payload = serde_json::to_string(&payload)
            .map_err(|source| RenderError::DemoPayload {
                key: demo.key.clone(),
                source,
            })?
            .replace("</", "<\\/");

        let mut html = format!(
            "<div class=\"code-demo\" data-key=\"{}\" data-template=\"{}\">\n",
            html_escape::encode_double_quoted_attribute(&demo.key),
            html_escape::encode_double_quoted_attribute(&demo.template)
        );
        for (index, file) in demo.files.iter().enumerate() {
            let language = Path::new(&file.path)
                .extension()
                .map(|ext| ext.to_string_lossy().to_string())
                .unwrap_or_else(|| DEFAULT_CODE_LANGUAGE.to_string());
            html.push_str(&format!(
                "<details class=\"code-demo-file\"{}><summary>{}</summary>\n{}</details>\n",
                if index == 0 { " open" } else { "" },
                html_escape::encode_text(&file.path),
                self.highlighter.highlight(&file.data, &language)
            ));
        }
        html.push_str(&format!(
            "<iframe class=\"code-demo-preview\" title=\"Live demo {}\" loading=\"lazy\"></iframe>\n",
            html_escape::encode_double_quoted_attribute(&demo.key)
        ));
        html.push_str(&format!(
            "<script type=\"application/json\" class=\"code-demo-payload\">{}</script>\n</div>\n",
            payload
        ));

        Ok(html)
    }
}

fn query_value(value: &str) -> String {
    url::form_urlencoded::byte_serialize(value.as_bytes()).collect()
}

/// Sandbox file names are absolute within the sandbox.
fn sandbox_path(path: &str) -> String {
    format!("/{}", path.trim_start_matches('/'))
}

fn render_inline(elements: &[InlineElement]) -> String {
    let mut html = String::new();

    for element in elements {
        match element {
            InlineElement::Text(text) => html.push_str(&html_escape::encode_text(text)),
            InlineElement::Code(code) => {
                html.push_str(&format!(
                    "<code class=\"codespan\">{}</code>",
                    html_escape::encode_text(code)
                ));
            }
            InlineElement::Math { tex, display: false } => {
                html.push_str(&format!(
                    "<span class=\"latex inline\">\\({}\\)</span>",
                    html_escape::encode_text(tex)
                ));
            }
            InlineElement::Math { tex, display: true } => {
                html.push_str(&format!(
                    "<span class=\"latex block\">\\[{}\\]</span>",
                    html_escape::encode_text(tex)
                ));
            }
            InlineElement::Link { url, title, content } => {
                let title_attr = title
                    .as_ref()
                    .map(|t| format!(" title=\"{}\"", html_escape::encode_double_quoted_attribute(t)))
                    .unwrap_or_default();
                html.push_str(&format!(
                    "<a class=\"link\" href=\"{}\"{} target=\"_blank\" rel=\"noreferrer\">{}</a>",
                    html_escape::encode_double_quoted_attribute(url),
                    title_attr,
                    render_inline(content)
                ));
            }
            InlineElement::Image { alt, url, title } => {
                let title_attr = title
                    .as_ref()
                    .map(|t| format!(" title=\"{}\"", html_escape::encode_double_quoted_attribute(t)))
                    .unwrap_or_default();
                let alt = if alt.is_empty() { url } else { alt };
                html.push_str(&format!(
                    "<span class=\"image-container\"><img class=\"image\" src=\"{}\" alt=\"{}\"{} loading=\"lazy\"/></span>",
                    html_escape::encode_double_quoted_attribute(url),
                    html_escape::encode_double_quoted_attribute(alt),
                    title_attr
                ));
            }
            InlineElement::Emphasis(content) => {
                html.push_str(&format!("<em>{}</em>", render_inline(content)));
            }
            InlineElement::Strong(content) => {
                html.push_str(&format!("<strong class=\"strong\">{}</strong>", render_inline(content)));
            }
            InlineElement::Strikethrough(content) => {
                html.push_str(&format!("<del>{}</del>", render_inline(content)));
            }
            InlineElement::Html(raw) => html.push_str(raw),
            InlineElement::SoftBreak => html.push('\n'),
            InlineElement::HardBreak => html.push_str("<br />"),
        }
    }

    html
}

fn render_table(
    alignments: &[Alignment],
    headers: &[Vec<InlineElement>],
    rows: &[Vec<Vec<InlineElement>>],
) -> String {
    let style = |index: usize| match alignments.get(index) {
        Some(Alignment::Left) => " style=\"text-align: left\"",
        Some(Alignment::Center) => " style=\"text-align: center\"",
        Some(Alignment::Right) => " style=\"text-align: right\"",
        _ => "",
    };

    let mut html = String::from("<table class=\"custom-table\">\n");

    if !headers.is_empty() {
        html.push_str("<thead>\n<tr>\n");
        for (index, header) in headers.iter().enumerate() {
            html.push_str(&format!("<th{}>{}</th>\n", style(index), render_inline(header)));
        }
        html.push_str("</tr>\n</thead>\n");
    }

    if !rows.is_empty() {
        html.push_str("<tbody>\n");
        for row in rows {
            html.push_str("<tr>\n");
            for (index, cell) in row.iter().enumerate() {
                html.push_str(&format!("<td{}>{}</td>\n", style(index), render_inline(cell)));
            }
            html.push_str("</tr>\n");
        }
        html.push_str("</tbody>\n");
    }

    html.push_str("</table>\n");
    html
}
