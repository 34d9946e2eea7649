//! Markdown → HTML for post bodies.
//!
//! pulldown-cmark parses and serializes; in between, the event stream is
//! rewritten so every element is substituted with the blog's styled variant.
//! The mapping is a plain table from [`ElementKind`] to class:
//!
//! | element    | rendered as                                                    |
//! |------------|----------------------------------------------------------------|
//! | `h1`..`h4` | `class="post-heading"`                                         |
//! | `table`    | `class="table table-striped table-bordered ... shadow-box"`    |
//! | `thead`    | `class="thead-dark"`                                           |
//! | `pre`      | `class="blog-pre"`                                             |
//! | `ul`       | `class="blog-ul"`                                              |
//! | `p`        | `class="blog-p"`                                               |
//! | `hr`       | `class="blog-hr"`                                              |
//! | `code`     | `class="blog-code"` unless highlighted                         |
//!
//! Substituted start tags become `Event::Html` carrying the classed markup;
//! their end tags, and everything without a substitution, are left for
//! `push_html`. Fenced code whose info string starts with a word
//! (```` ```js ````) goes to the [`Highlighter`] with one trailing newline
//! stripped. Images become popup-viewer triggers. Links open in a new tab.
//! Raw HTML in the source is kept unless `markdown.allow_raw_html` is off, in
//! which case it is turned into text and escaped.

use crate::config::MarkdownConfig;
use crate::highlight::{Highlighter, SyntectHighlighter};
use crate::popup::PopupImage;
use pulldown_cmark::html::push_html;
use pulldown_cmark::{
    Alignment, CodeBlockKind, Event, HeadingLevel, LinkType, Options, Parser, Tag, TagEnd,
};
use pulldown_cmark_escape::{escape_href, escape_html, escape_html_body_text};

/// Elements that get a substituted class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    Heading(u8),
    Table,
    TableHead,
    Pre,
    UnorderedList,
    Paragraph,
    Rule,
    Code,
}

const TABLE_CLASS: &str =
    "table table-striped table-bordered table-responsive-sm blog-table shadow-box";

/// Element kind → class attribute.
pub const SUBSTITUTIONS: &[(ElementKind, &str)] = &[
    (ElementKind::Heading(1), "post-heading"),
    (ElementKind::Heading(2), "post-heading"),
    (ElementKind::Heading(3), "post-heading"),
    (ElementKind::Heading(4), "post-heading"),
    (ElementKind::Table, TABLE_CLASS),
    (ElementKind::TableHead, "thead-dark"),
    (ElementKind::Pre, "blog-pre"),
    (ElementKind::UnorderedList, "blog-ul"),
    (ElementKind::Paragraph, "blog-p"),
    (ElementKind::Rule, "blog-hr"),
    (ElementKind::Code, "blog-code"),
];

pub fn class_for(kind: ElementKind) -> Option<&'static str> {
    SUBSTITUTIONS
        .iter()
        .find(|(k, _)| *k == kind)
        .map(|(_, class)| *class)
}

/// Renderer switches, normally taken from `[markdown]` in config.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    pub allow_raw_html: bool,
    pub links_new_tab: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            allow_raw_html: true,
            links_new_tab: true,
        }
    }
}

impl From<&MarkdownConfig> for RenderOptions {
    fn from(config: &MarkdownConfig) -> Self {
        Self {
            allow_raw_html: config.allow_raw_html,
            links_new_tab: config.external_links_new_tab,
        }
    }
}

/// Render with the stock [`SyntectHighlighter`].
pub fn render(markdown: &str, options: &RenderOptions) -> String {
    render_with(markdown, options, &SyntectHighlighter)
}

/// Render a post body to an HTML fragment wrapped in `div.post-markdown`.
pub fn render_with(
    markdown: &str,
    options: &RenderOptions,
    highlighter: &dyn Highlighter,
) -> String {
    let parser = Parser::new_ext(
        markdown,
        Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH,
    );

    let events = substitute_elements(parser, options, highlighter);

    let mut body = String::with_capacity(markdown.len() * 2);
    push_html(&mut body, events.into_iter());
    format!(r#"<div class="post-markdown">{body}</div>"#)
}

/// Language tag of a fenced block: the leading word characters of the info
/// string. `None` for indented blocks and untagged fences.
pub fn fence_language(kind: &CodeBlockKind) -> Option<String> {
    let CodeBlockKind::Fenced(info) = kind else {
        return None;
    };
    let first = info.split_whitespace().next().unwrap_or_default();
    let lang: String = first
        .chars()
        .take_while(|c| c.is_alphanumeric() || *c == '_')
        .collect();
    (!lang.is_empty()).then_some(lang)
}

// Writing into a `String` cannot fail, so the escapers' results are dropped.

/// Element content: `&`, `<` and `>` escaped.
pub(crate) fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let _ = escape_html_body_text(&mut out, text);
    out
}

/// Attribute values: quotes escaped as well.
pub(crate) fn escape_attr(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let _ = escape_html(&mut out, text);
    out
}

fn escape_url(url: &str) -> String {
    let mut out = String::with_capacity(url.len());
    let _ = escape_href(&mut out, url);
    out
}

fn heading_number(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

fn class_attr(kind: ElementKind) -> String {
    class_for(kind)
        .map(|class| format!(r#" class="{class}""#))
        .unwrap_or_default()
}

fn html_event<'a>(markup: String) -> Event<'a> {
    Event::Html(markup.into())
}

struct FencedCode {
    language: String,
    text: String,
}

struct ImageAlt {
    src: String,
    title: String,
    alt: String,
    depth: usize,
}

/// Event rewriter state. Table cells are written here too, since the class
/// on `<table>` means `push_html` never sees the column alignments.
struct Substitution<'o> {
    options: &'o RenderOptions,
    highlighter: &'o dyn Highlighter,
    alignments: Vec<Alignment>,
    cell_index: usize,
    in_table_head: bool,
    code: Option<FencedCode>,
    image: Option<ImageAlt>,
}

fn substitute_elements<'a>(
    parser: Parser<'a>,
    options: &RenderOptions,
    highlighter: &dyn Highlighter,
) -> Vec<Event<'a>> {
    let mut state = Substitution {
        options,
        highlighter,
        alignments: Vec::new(),
        cell_index: 0,
        in_table_head: false,
        code: None,
        image: None,
    };
    parser.filter_map(|event| state.rewrite(event)).collect()
}

impl Substitution<'_> {
    fn rewrite<'a>(&mut self, event: Event<'a>) -> Option<Event<'a>> {
        if self.image.is_some() {
            return self.image_event(event);
        }
        if self.code.is_some() {
            return self.code_event(event);
        }

        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(tag) => self.end(tag),
            Event::Code(text) => Some(html_event(format!(
                "<code{}>{}</code>",
                class_attr(ElementKind::Code),
                escape_text(&text)
            ))),
            Event::Html(raw) | Event::InlineHtml(raw) if !self.options.allow_raw_html => {
                Some(Event::Text(raw))
            }
            Event::Rule => Some(html_event(format!(
                "<hr{} />\n",
                class_attr(ElementKind::Rule)
            ))),
            other => Some(other),
        }
    }

    fn start<'a>(&mut self, tag: Tag<'a>) -> Option<Event<'a>> {
        let markup = match tag {
            Tag::Paragraph => format!("<p{}>", class_attr(ElementKind::Paragraph)),
            Tag::Heading { level, .. }
                if class_for(ElementKind::Heading(heading_number(level))).is_some() =>
            {
                let n = heading_number(level);
                format!("<h{n}{}>", class_attr(ElementKind::Heading(n)))
            }
            Tag::List(None) => format!("<ul{}>\n", class_attr(ElementKind::UnorderedList)),
            Tag::CodeBlock(kind) => match fence_language(&kind) {
                Some(language) => {
                    self.code = Some(FencedCode {
                        language,
                        text: String::new(),
                    });
                    return None;
                }
                None => format!(
                    "<pre{}><code{}>",
                    class_attr(ElementKind::Pre),
                    class_attr(ElementKind::Code)
                ),
            },
            Tag::Table(alignments) => {
                self.alignments = alignments;
                format!("<table{}>", class_attr(ElementKind::Table))
            }
            Tag::TableHead => {
                self.in_table_head = true;
                self.cell_index = 0;
                format!("<thead{}><tr>", class_attr(ElementKind::TableHead))
            }
            Tag::TableRow => {
                self.cell_index = 0;
                return Some(Event::Start(Tag::TableRow));
            }
            Tag::TableCell => {
                let cell = if self.in_table_head { "th" } else { "td" };
                let align = match self.alignments.get(self.cell_index) {
                    Some(Alignment::Left) => r#" style="text-align: left""#,
                    Some(Alignment::Center) => r#" style="text-align: center""#,
                    Some(Alignment::Right) => r#" style="text-align: right""#,
                    _ => "",
                };
                format!("<{cell}{align}>")
            }
            Tag::Link {
                link_type,
                dest_url,
                title,
                ..
            } if self.options.links_new_tab => {
                let scheme = if link_type == LinkType::Email { "mailto:" } else { "" };
                let title = if title.is_empty() {
                    String::new()
                } else {
                    format!(r#" title="{}""#, escape_attr(&title))
                };
                format!(
                    r#"<a href="{scheme}{}"{title} target="_blank" rel="noopener noreferrer">"#,
                    escape_url(&dest_url)
                )
            }
            Tag::Image {
                dest_url, title, ..
            } => {
                self.image = Some(ImageAlt {
                    src: dest_url.to_string(),
                    title: title.to_string(),
                    alt: String::new(),
                    depth: 0,
                });
                return None;
            }
            other => return Some(Event::Start(other)),
        };
        Some(html_event(markup))
    }

    fn end<'a>(&mut self, tag: TagEnd) -> Option<Event<'a>> {
        match tag {
            TagEnd::TableHead => self.in_table_head = false,
            TagEnd::TableCell => {
                let cell = if self.in_table_head { "th" } else { "td" };
                self.cell_index += 1;
                return Some(html_event(format!("</{cell}>")));
            }
            TagEnd::Table => self.alignments.clear(),
            _ => {}
        }
        Some(Event::End(tag))
    }

    /// Inside an image only text survives, flattened into the alt attribute.
    fn image_event<'a>(&mut self, event: Event<'a>) -> Option<Event<'a>> {
        let image = self.image.as_mut()?;
        let finished = match event {
            Event::Text(text) | Event::Code(text) | Event::InlineHtml(text) => {
                image.alt.push_str(&text);
                false
            }
            Event::SoftBreak | Event::HardBreak => {
                image.alt.push(' ');
                false
            }
            Event::Start(_) => {
                image.depth += 1;
                false
            }
            Event::End(_) if image.depth > 0 => {
                image.depth -= 1;
                false
            }
            Event::End(_) => true,
            _ => false,
        };
        if !finished {
            return None;
        }

        let image = self.image.take()?;
        let popup = PopupImage::new(
            &image.src,
            Some(image.alt.as_str()),
            Some(image.title.as_str()),
        );
        Some(html_event(popup.render_trigger().into_string()))
    }

    /// Tagged fences are buffered whole and handed to the highlighter.
    fn code_event<'a>(&mut self, event: Event<'a>) -> Option<Event<'a>> {
        match event {
            Event::Text(text) => {
                if let Some(code) = self.code.as_mut() {
                    code.text.push_str(&text);
                }
                None
            }
            Event::End(TagEnd::CodeBlock) => {
                let code = self.code.take()?;
                let text = code.text.strip_suffix('\n').unwrap_or(&code.text);
                Some(html_event(format!(
                    "<pre{}>{}</pre>\n",
                    class_attr(ElementKind::Pre),
                    self.highlighter.highlight(text, &code.language)
                )))
            }
            _ => None,
        }
    }
}
