//! The start-file document editor contract and its default implementation.
//!
//! The injector edits start files through [`DocumentEditor`], obtained from
//! a [`DocumentEditorFactory`]. The edit primitive only supports prepending
//! at the document head; callers wanting a specific final order must insert
//! in reverse. [`HtmlEditorFactory`] provides the default text-splicing
//! implementation for HTML start files.

use std::io::{Read, Write};

use crate::error::{FeatureError, FeatureResult};

/// Edits a loaded start-file document in memory.
pub trait DocumentEditor: Send {
    /// Prepend a script reference as the first child of the document head.
    fn prepend_script(&mut self, url: &str);

    /// Prepend a stylesheet reference as the first child of the document
    /// head.
    fn prepend_stylesheet(&mut self, url: &str);

    /// Write the edited document to `output`.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error when the write fails.
    fn write_to(&self, output: &mut dyn Write) -> std::io::Result<()>;
}

/// Produces a [`DocumentEditor`] from raw start-file content.
pub trait DocumentEditorFactory: Send + Sync {
    /// Load a document from the given input.
    ///
    /// # Errors
    ///
    /// Returns [`FeatureError::Editor`] when the input cannot be read.
    fn load_from(&self, input: &mut dyn Read) -> FeatureResult<Box<dyn DocumentEditor>>;
}

/// The default editor factory for HTML start files.
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlEditorFactory;

impl DocumentEditorFactory for HtmlEditorFactory {
    fn load_from(&self, input: &mut dyn Read) -> FeatureResult<Box<dyn DocumentEditor>> {
        let mut text = String::new();
        input
            .read_to_string(&mut text)
            .map_err(|e| FeatureError::Editor(e.to_string()))?;
        Ok(Box::new(HtmlHeadEditor::new(text)))
    }
}

/// Splices references into an HTML document's `<head>`.
///
/// Works on the raw text rather than a parsed DOM, so the rest of the
/// author's document survives byte-for-byte. A missing `<head>` is created:
/// after the `<html>` open tag when there is one, otherwise at the start of
/// the document.
struct HtmlHeadEditor {
    text: String,
    /// Byte offset of the head's first-child position. Every prepend
    /// inserts here, so later prepends land before earlier ones.
    insert_at: usize,
}

impl HtmlHeadEditor {
    fn new(mut text: String) -> Self {
        let insert_at = if let Some(after_head) = find_tag_end(&text, "head") {
            after_head
        } else if let Some(after_html) = find_tag_end(&text, "html") {
            text.insert_str(after_html, "<head></head>");
            after_html.saturating_add("<head>".len())
        } else {
            text.insert_str(0, "<head></head>");
            "<head>".len()
        };

        Self { text, insert_at }
    }

    fn insert(&mut self, fragment: &str) {
        self.text.insert_str(self.insert_at, fragment);
    }
}

impl DocumentEditor for HtmlHeadEditor {
    fn prepend_script(&mut self, url: &str) {
        self.insert(&format!(
            r#"<script type="text/javascript" src="{url}"></script>"#
        ));
    }

    fn prepend_stylesheet(&mut self, url: &str) {
        self.insert(&format!(
            r#"<link rel="stylesheet" type="text/css" href="{url}">"#
        ));
    }

    fn write_to(&self, output: &mut dyn Write) -> std::io::Result<()> {
        output.write_all(self.text.as_bytes())
    }
}

/// Byte offset just past the `>` of the first `<tag ...>` open tag, matched
/// ASCII case-insensitively. `<header>` does not match `head`.
fn find_tag_end(text: &str, tag: &str) -> Option<usize> {
    let lower = text.to_ascii_lowercase();
    let needle = format!("<{tag}");
    let mut from = 0;

    while let Some(rel) = lower.get(from..)?.find(&needle) {
        let start = from.saturating_add(rel);
        let name_end = start.saturating_add(needle.len());

        let boundary = lower
            .get(name_end..)
            .and_then(|rest| rest.chars().next());
        if matches!(boundary, Some(c) if c == '>' || c == '/' || c.is_ascii_whitespace()) {
            let close = lower.get(start..)?.find('>')?;
            return Some(start.saturating_add(close).saturating_add(1));
        }

        from = name_end;
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edited(input: &str, edits: impl FnOnce(&mut dyn DocumentEditor)) -> String {
        let factory = HtmlEditorFactory;
        let mut editor = factory.load_from(&mut input.as_bytes()).unwrap();
        edits(editor.as_mut());
        let mut out = Vec::new();
        editor.write_to(&mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn script_is_prepended_inside_head() {
        let out = edited(
            "<html><head><title>t</title></head><body/></html>",
            |editor| editor.prepend_script("/f?x=1"),
        );
        assert_eq!(
            out,
            r#"<html><head><script type="text/javascript" src="/f?x=1"></script><title>t</title></head><body/></html>"#
        );
    }

    #[test]
    fn later_prepends_come_first() {
        let out = edited("<html><head></head></html>", |editor| {
            editor.prepend_script("b.js");
            editor.prepend_script("a.js");
        });
        let a = out.find("a.js").unwrap();
        let b = out.find("b.js").unwrap();
        assert!(a < b);
    }

    #[test]
    fn stylesheet_reference_is_a_link_element() {
        let out = edited("<html><head></head></html>", |editor| {
            editor.prepend_stylesheet("style.css");
        });
        assert!(out.contains(r#"<link rel="stylesheet" type="text/css" href="style.css">"#));
    }

    #[test]
    fn head_is_created_after_html_when_missing() {
        let out = edited("<html><body>hi</body></html>", |editor| {
            editor.prepend_script("a.js");
        });
        assert!(out.starts_with("<html><head><script"));
        assert!(out.contains("</head><body>hi</body>"));
    }

    #[test]
    fn head_is_created_at_document_start_without_html() {
        let out = edited("<body>hi</body>", |editor| editor.prepend_script("a.js"));
        assert!(out.starts_with("<head><script"));
    }

    #[test]
    fn head_matching_is_case_insensitive_and_skips_header() {
        let out = edited(
            "<HTML><header>nope</header><HEAD></HEAD></HTML>",
            |editor| editor.prepend_script("a.js"),
        );
        assert!(out.contains("<HEAD><script"));
        assert!(out.contains("<header>nope</header>"));
    }

    #[test]
    fn head_with_attributes_is_found() {
        let out = edited(r#"<html><head lang="en"></head></html>"#, |editor| {
            editor.prepend_script("a.js")
        });
        assert!(out.contains(r#"<head lang="en"><script"#));
    }
}
