use std::sync::Arc;

use focusfeed_core_types::{Role, SelectorTable};
use page_port::DocumentPort;
use tracing::debug;

use crate::errors::Result;

pub const STYLE_MARKER: &str = "focusfeed-style";
const STYLE_SELECTOR: &str = "style#focusfeed-style";

const PLACEHOLDER_CSS: &str = "\
.focusfeed-placeholder {
  display: flex;
  align-items: center;
  justify-content: center;
  box-sizing: border-box;
  border: 1px dashed rgba(127, 127, 127, 0.4);
  border-radius: 12px;
  background: rgba(127, 127, 127, 0.08);
  overflow: hidden;
}
.focusfeed-placeholder-label {
  font: 12px/1.4 Roboto, Arial, sans-serif;
  color: rgba(127, 127, 127, 0.9);
  padding: 8px;
  text-align: center;
}
.focusfeed-topic-header {
  margin: 0 0 12px;
  padding: 8px 12px;
  border-radius: 12px;
  background: rgba(127, 127, 127, 0.08);
}
.focusfeed-topic-header h2 {
  margin: 0;
  font: 500 14px/1.4 Roboto, Arial, sans-serif;
}
";

/// Stylesheet text: placeholder and header rules, then the hidden categories.
pub fn stylesheet(selectors: &SelectorTable) -> String {
    let mut css = PLACEHOLDER_CSS.to_string();
    let hidden = selectors.group(Role::HiddenCategory);
    if !hidden.is_empty() {
        css.push_str(&format!("{hidden} {{ display: none !important; }}\n"));
    }
    css
}

/// Owns the single stylesheet the pipeline adds to the page.
pub struct StyleInjector {
    document: Arc<dyn DocumentPort>,
    css: String,
}

impl StyleInjector {
    pub fn new(document: Arc<dyn DocumentPort>, selectors: &SelectorTable) -> Self {
        Self {
            document,
            css: stylesheet(selectors),
        }
    }

    pub fn is_injected(&self) -> bool {
        self.document
            .query_all(STYLE_SELECTOR)
            .is_ok_and(|found| !found.is_empty())
    }

    /// Insert the stylesheet. A second call is a no-op.
    pub fn inject(&self) -> Result<bool> {
        if self.is_injected() {
            return Ok(false);
        }
        let node = self.document.insert_style(STYLE_MARKER, &self.css)?;
        debug!(target: "focus.styles", %node, "stylesheet injected");
        Ok(true)
    }

    pub fn remove(&self) -> Result<usize> {
        let removed = self.document.remove_style(STYLE_MARKER)?;
        if removed > 0 {
            debug!(target: "focus.styles", removed, "stylesheet removed");
        }
        Ok(removed)
    }
}
