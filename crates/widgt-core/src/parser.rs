//! Parser for widget `config.xml` manifests.
//!
//! Accepts a namespace-qualified subset of the W3C Widgets packaging
//! vocabulary and produces a [`WidgetManifest`]. Parsing is lenient the way
//! the packaging spec demands: malformed optional attributes degrade to
//! unset values, and child elements that fail their own validity rules are
//! skipped rather than failing the document.

use std::io::Read;

use roxmltree::{Document, Node};
use tracing::debug;

use crate::error::{ManifestError, ManifestResult};
use crate::manifest::{
    AccessRequest, Author, Content, Description, FeatureParameter, FeatureRequest, Icon, License,
    Name, Preference, WidgetManifest,
};

/// The W3C widget packaging namespace.
pub const WIDGET_NS: &str = "http://www.w3.org/ns/widgets";

/// The XML namespace, for `xml:lang` attributes.
const XML_NS: &str = "http://www.w3.org/XML/1998/namespace";

/// Parser for widget manifest documents.
pub struct ManifestParser;

impl ManifestParser {
    /// Parse a manifest from a reader.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError::Parse`] when the input cannot be read, and
    /// otherwise behaves as [`parse`](Self::parse).
    pub fn parse_reader(mut reader: impl Read) -> ManifestResult<WidgetManifest> {
        let mut text = String::new();
        reader
            .read_to_string(&mut text)
            .map_err(|e| ManifestError::Parse(format!("failed to read manifest input: {e}")))?;
        Self::parse(&text)
    }

    /// Parse a manifest document.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError::InvalidManifest`] when the document is empty
    /// or its root is not a `widget` element in the widget namespace, and
    /// [`ManifestError::Parse`] when the input is not well-formed XML.
    pub fn parse(text: &str) -> ManifestResult<WidgetManifest> {
        if text.trim().is_empty() {
            return Err(ManifestError::InvalidManifest("empty document".to_owned()));
        }

        let document = Document::parse(text)
            .map_err(|e| ManifestError::Parse(format!("manifest is not well-formed XML: {e}")))?;

        let root = document.root_element();
        if root.tag_name().name() != "widget" || root.tag_name().namespace() != Some(WIDGET_NS) {
            return Err(ManifestError::InvalidManifest(format!(
                "unexpected root element, expected {{{WIDGET_NS}}}widget, got {}",
                root.tag_name().name()
            )));
        }

        let mut manifest = WidgetManifest {
            widget_id: optional_attribute(root, "id"),
            version: optional_attribute(root, "version"),
            height: integer_attribute(root, "height"),
            width: integer_attribute(root, "width"),
            default_locale: attribute(root, "defaultlocale"),
            ..WidgetManifest::default()
        };

        parse_view_modes(root, &mut manifest);

        for child in root.children().filter(|n| is_widget_element(*n)) {
            match child.tag_name().name() {
                "name" => parse_name(child, &mut manifest),
                "description" => manifest.descriptions.push(Description {
                    text: element_text(child),
                    lang: language(child),
                }),
                "author" => {
                    if manifest.author.is_none() {
                        manifest.author = Some(Author {
                            email: attribute(child, "email"),
                            href: attribute(child, "href"),
                            text: element_text(child),
                        });
                    }
                },
                "icon" => parse_icon(child, &mut manifest),
                "content" => parse_content(child, &mut manifest),
                "license" => manifest.licenses.push(License {
                    href: attribute(child, "href"),
                    text: element_text(child),
                    lang: language(child),
                }),
                "feature" => parse_feature(child, &mut manifest),
                "preference" => manifest.preferences.push(Preference {
                    name: attribute(child, "name"),
                    value: attribute(child, "value"),
                    readonly: attribute(child, "readonly") == "true",
                    lang: language(child),
                }),
                "access" => parse_access(child, &mut manifest),
                other => debug!(element = other, "skipping unrecognized manifest element"),
            }
        }

        Ok(manifest)
    }
}

fn parse_view_modes(root: Node<'_, '_>, manifest: &mut WidgetManifest) {
    let value = attribute(root, "viewmodes");
    if value.is_empty() {
        return;
    }
    for segment in value.trim().split(',') {
        manifest.view_modes.push(segment.to_owned());
    }
}

fn parse_name(node: Node<'_, '_>, manifest: &mut WidgetManifest) {
    let name = Name {
        short: attribute(node, "short"),
        text: element_text(node),
        lang: language(node),
    };

    // A name with neither a short label nor text carries no information.
    if name.short.is_empty() && name.text.is_empty() {
        return;
    }

    manifest.names.push(name);
}

fn parse_icon(node: Node<'_, '_>, manifest: &mut WidgetManifest) {
    let icon = Icon {
        src: attribute(node, "src"),
        lang: language(node),
    };
    if icon.src.is_empty() {
        return;
    }
    manifest.icons.push(icon);
}

fn parse_content(node: Node<'_, '_>, manifest: &mut WidgetManifest) {
    let content = Content {
        src: attribute(node, "src"),
        mime_type: attribute(node, "type"),
        encoding: attribute(node, "encoding"),
        lang: language(node),
    };
    if content.src.is_empty() {
        return;
    }
    manifest.contents.push(content);
}

fn parse_feature(node: Node<'_, '_>, manifest: &mut WidgetManifest) {
    let mut feature = FeatureRequest {
        name: attribute(node, "name"),
        required: attribute(node, "required") != "false",
        params: Vec::new(),
        lang: language(node),
    };

    for param in node
        .children()
        .filter(|n| is_widget_element(*n) && n.tag_name().name() == "param")
    {
        feature.params.push(FeatureParameter {
            name: attribute(param, "name"),
            value: attribute(param, "value"),
        });
    }

    manifest.features.push(feature);
}

fn parse_access(node: Node<'_, '_>, manifest: &mut WidgetManifest) {
    let origin = attribute(node, "origin");
    if origin.is_empty() {
        return;
    }
    manifest.access_requests.push(AccessRequest {
        origin,
        subdomains: attribute(node, "subdomains") == "true",
    });
}

fn is_widget_element(node: Node<'_, '_>) -> bool {
    node.is_element() && node.tag_name().namespace() == Some(WIDGET_NS)
}

/// The value of an attribute, or the empty string when absent.
fn attribute(node: Node<'_, '_>, name: &str) -> String {
    node.attribute(name).unwrap_or_default().to_owned()
}

/// The value of an attribute, or `None` when absent or empty.
fn optional_attribute(node: Node<'_, '_>, name: &str) -> Option<String> {
    node.attribute(name)
        .filter(|value| !value.is_empty())
        .map(ToOwned::to_owned)
}

/// The integer value of an attribute; unparsable values yield `None`, not
/// an error.
fn integer_attribute(node: Node<'_, '_>, name: &str) -> Option<i32> {
    node.attribute(name).and_then(|value| value.parse().ok())
}

/// The element's `xml:lang` tag, or the empty string when unspecified.
fn language(node: Node<'_, '_>) -> String {
    node.attribute((XML_NS, "lang")).unwrap_or_default().to_owned()
}

/// The concatenated, trimmed text content of an element.
fn element_text(node: Node<'_, '_>) -> String {
    node.descendants()
        .filter(|n| n.is_text())
        .filter_map(|n| n.text())
        .collect::<String>()
        .trim()
        .to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"<widget xmlns="http://www.w3.org/ns/widgets" id="http://example.org/clock" version="1.0"/>"#;

    #[test]
    fn parses_root_attributes() {
        let manifest = ManifestParser::parse(MINIMAL).unwrap();
        assert_eq!(manifest.widget_id.as_deref(), Some("http://example.org/clock"));
        assert_eq!(manifest.version.as_deref(), Some("1.0"));
        assert!(manifest.height.is_none());
        assert!(manifest.default_locale.is_empty());
    }

    #[test]
    fn empty_document_is_invalid() {
        let err = ManifestParser::parse("  \n ").unwrap_err();
        assert!(matches!(err, ManifestError::InvalidManifest(_)));
    }

    #[test]
    fn wrong_root_element_is_invalid() {
        let err = ManifestParser::parse(r#"<unit xmlns="http://www.w3.org/ns/widgets"/>"#)
            .unwrap_err();
        assert!(matches!(err, ManifestError::InvalidManifest(_)));
    }

    #[test]
    fn wrong_namespace_is_invalid() {
        let err = ManifestParser::parse(r#"<widget xmlns="http://example.org/ns"/>"#).unwrap_err();
        assert!(matches!(err, ManifestError::InvalidManifest(_)));
    }

    #[test]
    fn malformed_xml_is_a_parse_failure() {
        let err = ManifestParser::parse("<widget").unwrap_err();
        assert!(matches!(err, ManifestError::Parse(_)));
    }

    #[test]
    fn unparsable_dimensions_yield_none() {
        let text = r#"<widget xmlns="http://www.w3.org/ns/widgets" height="tall" width="200"/>"#;
        let manifest = ManifestParser::parse(text).unwrap();
        assert!(manifest.height.is_none());
        assert_eq!(manifest.width, Some(200));
    }

    #[test]
    fn view_modes_are_a_raw_comma_split() {
        let text = r#"<widget xmlns="http://www.w3.org/ns/widgets" viewmodes="windowed,floating,windowed"/>"#;
        let manifest = ManifestParser::parse(text).unwrap();
        assert_eq!(manifest.view_modes, ["windowed", "floating", "windowed"]);
    }

    #[test]
    fn empty_name_is_dropped() {
        let text = r#"<widget xmlns="http://www.w3.org/ns/widgets"><name/><name short="c"/><name>Clock</name></widget>"#;
        let manifest = ManifestParser::parse(text).unwrap();
        assert_eq!(manifest.names.len(), 2);
        assert_eq!(manifest.names[0].short, "c");
        assert_eq!(manifest.names[1].text, "Clock");
    }

    #[test]
    fn lang_attribute_is_read_from_the_xml_namespace() {
        let text = r#"<widget xmlns="http://www.w3.org/ns/widgets"><name xml:lang="en-GB">Clock</name></widget>"#;
        let manifest = ManifestParser::parse(text).unwrap();
        assert_eq!(manifest.names[0].lang, "en-GB");
    }

    #[test]
    fn content_without_src_is_skipped() {
        let text = r#"<widget xmlns="http://www.w3.org/ns/widgets"><content/><content src="index.html" type="text/html"/></widget>"#;
        let manifest = ManifestParser::parse(text).unwrap();
        assert_eq!(manifest.contents.len(), 1);
        assert_eq!(manifest.contents[0].src, "index.html");
        assert_eq!(manifest.contents[0].mime_type, "text/html");
    }

    #[test]
    fn access_without_origin_is_skipped() {
        let text = r#"<widget xmlns="http://www.w3.org/ns/widgets"><access subdomains="true"/><access origin="https://example.org"/></widget>"#;
        let manifest = ManifestParser::parse(text).unwrap();
        assert_eq!(manifest.access_requests.len(), 1);
        assert!(!manifest.access_requests[0].subdomains);
    }

    #[test]
    fn feature_required_is_false_only_for_the_literal_false() {
        let text = r#"<widget xmlns="http://www.w3.org/ns/widgets">
            <feature name="a" required="false"/>
            <feature name="b" required="no"/>
            <feature name="c"/>
        </widget>"#;
        let manifest = ManifestParser::parse(text).unwrap();
        assert!(!manifest.features[0].required);
        assert!(manifest.features[1].required);
        assert!(manifest.features[2].required);
    }

    #[test]
    fn feature_params_are_kept_in_document_order() {
        let text = r#"<widget xmlns="http://www.w3.org/ns/widgets">
            <feature name="geo"><param name="accuracy" value="high"/><param name="age" value="60"/></feature>
        </widget>"#;
        let manifest = ManifestParser::parse(text).unwrap();
        let params = &manifest.features[0].params;
        assert_eq!(params.len(), 2);
        assert_eq!(params[0].name, "accuracy");
        assert_eq!(params[1].value, "60");
    }

    #[test]
    fn only_the_first_author_is_kept() {
        let text = r#"<widget xmlns="http://www.w3.org/ns/widgets">
            <author email="a@example.org">First</author>
            <author>Second</author>
        </widget>"#;
        let manifest = ManifestParser::parse(text).unwrap();
        let author = manifest.author.unwrap();
        assert_eq!(author.email, "a@example.org");
        assert_eq!(author.text, "First");
    }

    #[test]
    fn preference_readonly_parses_the_literal_true_only() {
        let text = r#"<widget xmlns="http://www.w3.org/ns/widgets">
            <preference name="skin" value="dark" readonly="true"/>
            <preference name="tz" value="utc" readonly="yes"/>
        </widget>"#;
        let manifest = ManifestParser::parse(text).unwrap();
        assert!(manifest.preferences[0].readonly);
        assert!(!manifest.preferences[1].readonly);
    }

    #[test]
    fn elements_outside_the_widget_namespace_are_ignored() {
        let text = r#"<widget xmlns="http://www.w3.org/ns/widgets" xmlns:x="http://example.org/x">
            <x:name>Nope</x:name>
            <name>Clock</name>
        </widget>"#;
        let manifest = ManifestParser::parse(text).unwrap();
        assert_eq!(manifest.names.len(), 1);
        assert_eq!(manifest.names[0].text, "Clock");
    }

    #[test]
    fn parse_reader_reads_the_full_stream() {
        let manifest = ManifestParser::parse_reader(MINIMAL.as_bytes()).unwrap();
        assert_eq!(manifest.widget_id.as_deref(), Some("http://example.org/clock"));
    }
}
