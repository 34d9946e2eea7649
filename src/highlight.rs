//! Build-time syntax highlighting for fenced code blocks.
//!
//! The markdown renderer hands every fenced block that carries a language tag
//! to a [`Highlighter`]. The stock [`SyntectHighlighter`] looks the tag up in
//! syntect's default syntax set and emits class-based spans (`hl-` prefixed
//! scope atoms); colors live in the stylesheet (a11y-dark palette). Tags with
//! no matching syntax still get the wrapper, with the code as escaped text.
//!
//! The output is phrasing content; the renderer places it inside its own
//! `<pre class="blog-pre">`:
//!
//! ```html
//! <code class="code-highlight language-js" data-language="js">
//!   <span class="hl-source hl-js"><span class="hl-storage hl-type hl-js">const</span> x = ...
//! </code>
//! ```

use crate::markdown::{escape_attr, escape_text};
use std::sync::LazyLock;
use syntect::html::{ClassStyle, ClassedHTMLGenerator};
use syntect::parsing::{SyntaxReference, SyntaxSet};
use syntect::util::LinesWithEndings;

/// Renders a code block for a given language tag.
pub trait Highlighter {
    /// `code` is the raw block text, `language` the tag from the fence.
    fn highlight(&self, code: &str, language: &str) -> String;
}

const CLASS_STYLE: ClassStyle = ClassStyle::SpacedPrefixed { prefix: "hl-" };

static SYNTAXES: LazyLock<SyntaxSet> = LazyLock::new(SyntaxSet::load_defaults_newlines);

/// Class-based highlighter over syntect's bundled syntaxes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SyntectHighlighter;

impl SyntectHighlighter {
    fn syntax_for(language: &str) -> Option<&'static SyntaxReference> {
        SYNTAXES.find_syntax_by_token(language)
    }

    fn classed_html(code: &str, syntax: &SyntaxReference) -> Result<String, syntect::Error> {
        let mut generator =
            ClassedHTMLGenerator::new_with_class_style(syntax, &SYNTAXES, CLASS_STYLE);
        for line in LinesWithEndings::from(code) {
            generator.parse_html_for_line_which_includes_newline(line)?;
        }
        Ok(generator.finalize())
    }
}

impl Highlighter for SyntectHighlighter {
    fn highlight(&self, code: &str, language: &str) -> String {
        let body = match Self::syntax_for(language) {
            Some(syntax) => Self::classed_html(code, syntax).unwrap_or_else(|e| {
                log::warn!("Highlighting {language} block failed: {e}");
                escape_text(code)
            }),
            None => escape_text(code),
        };

        let lang = escape_attr(language);
        format!(r#"<code class="code-highlight language-{lang}" data-language="{lang}">{body}</code>"#)
    }
}
