//! Popup image viewer.
//!
//! Every image in a post body is rendered as a clickable thumbnail that opens
//! a full-width overlay. The viewer is a two-state machine:
//!
//! ```text
//!            activate
//!   Closed ───────────▶ Open
//!      ▲                  │
//!      └──── activate ────┘
//! ```
//!
//! Pages are static, so the build always renders the closed state. The
//! embedded `static/popup.js` replays the same transition in the browser:
//! clicking a `.pop-image` fills the shared `#pop-image-viewer` dialog from the
//! image's `data-popup-*` attributes and opens it; clicking the image or CLOSE
//! closes it again.

use crate::types::https_url;
use maud::{Markup, html};

/// Dialog title when an image has neither a title nor alt text.
pub const FALLBACK_TITLE: &str = "Image";

/// Id of the page-level overlay the script drives.
pub const VIEWER_ID: &str = "pop-image-viewer";

/// Viewer state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PopupState {
    #[default]
    Closed,
    Open,
}

impl PopupState {
    /// The single transition: toggle.
    pub fn activate(self) -> Self {
        match self {
            PopupState::Closed => PopupState::Open,
            PopupState::Open => PopupState::Closed,
        }
    }

    pub fn is_open(self) -> bool {
        self == PopupState::Open
    }

    fn as_str(self) -> &'static str {
        match self {
            PopupState::Closed => "closed",
            PopupState::Open => "open",
        }
    }
}

/// One popup-capable image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PopupImage {
    src: String,
    alt: String,
    title: String,
    state: PopupState,
}

impl PopupImage {
    /// `src` is normalized (`//host/x.png` → `https://host/x.png`). The dialog
    /// title is `title`, else `alt`, else [`FALLBACK_TITLE`].
    pub fn new(src: &str, alt: Option<&str>, title: Option<&str>) -> Self {
        let alt = alt.unwrap_or_default().to_string();
        let title = title
            .filter(|t| !t.is_empty())
            .or(Some(alt.as_str()).filter(|a| !a.is_empty()))
            .unwrap_or(FALLBACK_TITLE)
            .to_string();
        Self {
            src: https_url(src),
            alt,
            title,
            state: PopupState::Closed,
        }
    }

    pub fn src(&self) -> &str {
        &self.src
    }

    pub fn alt(&self) -> &str {
        &self.alt
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn state(&self) -> PopupState {
        self.state
    }

    pub fn activate(&mut self) -> PopupState {
        self.state = self.state.activate();
        self.state
    }

    /// Inline thumbnail that opens the viewer.
    pub fn render_trigger(&self) -> Markup {
        html! {
            img.pop-image
                src=(self.src)
                alt=(self.alt)
                title=(self.title)
                width="1920"
                height="1080"
                loading="lazy"
                data-popup-src=(self.src)
                data-popup-title=(self.title)
                data-popup-state=(self.state.as_str());
        }
    }

    /// Full-width overlay for this image in its current state.
    pub fn render_overlay(&self) -> Markup {
        html! {
            dialog.pop-image-dialog id=(VIEWER_ID) open[self.state.is_open()] aria-label=(self.title) {
                h2.pop-image-title { (self.title) }
                div.pop-image-body {
                    img.pop-image-full src=(self.src) alt=(self.alt);
                }
                form method="dialog" {
                    button.pop-image-close type="submit" { "CLOSE" }
                }
            }
        }
    }
}

/// Closed, empty overlay rendered once per page for the script to fill.
pub fn viewer_shell() -> Markup {
    PopupImage::new("", None, None).render_overlay()
}
