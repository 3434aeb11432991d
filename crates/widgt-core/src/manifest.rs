//! The widget manifest entity graph.
//!
//! A [`WidgetManifest`] is the parsed form of a package's `config.xml`. The
//! manifest exclusively owns all of its child elements; locale-aware
//! children carry a `lang` tag where the empty string means "no locale /
//! default fallback".

use serde::{Deserialize, Serialize};

use crate::locale::{LocaleAware, LocaleMatcher, LocaleTag};

/// A parsed widget manifest.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WidgetManifest {
    /// The widget's identifier, usually an IRI. Optional for authors.
    pub widget_id: Option<String>,
    /// The widget version string. Optional for authors.
    pub version: Option<String>,
    /// Preferred viewport height in CSS pixels.
    pub height: Option<i32>,
    /// Preferred viewport width in CSS pixels.
    pub width: Option<i32>,
    /// The author's preferred fallback locale; empty when unset.
    pub default_locale: String,
    /// Preferred view modes in author order. This is the raw comma split of
    /// the `viewmodes` attribute: duplicates and empty segments survive.
    pub view_modes: Vec<String>,
    /// The widget author, when declared.
    pub author: Option<Author>,
    /// Localized human-readable names.
    pub names: Vec<Name>,
    /// Localized descriptions.
    pub descriptions: Vec<Description>,
    /// Localized icons.
    pub icons: Vec<Icon>,
    /// Localized start-file declarations.
    pub contents: Vec<Content>,
    /// Localized preference defaults.
    pub preferences: Vec<Preference>,
    /// Features the widget requests at runtime.
    pub features: Vec<FeatureRequest>,
    /// Localized license blocks.
    pub licenses: Vec<License>,
    /// Network access requests. Not locale-aware.
    pub access_requests: Vec<AccessRequest>,
}

impl WidgetManifest {
    /// Produce a reduced manifest localized to `locale`.
    ///
    /// Every locale-aware collection is independently reduced to its single
    /// best match (exact, then bare-language partial, then unlocalized
    /// fallback), so each holds at most one entry. Scalar fields, the
    /// author, view modes, and access requests are copied verbatim.
    #[must_use]
    pub fn localized_to(&self, locale: &LocaleTag) -> WidgetManifest {
        let matcher = LocaleMatcher::new(locale.clone());

        WidgetManifest {
            widget_id: self.widget_id.clone(),
            version: self.version.clone(),
            height: self.height,
            width: self.width,
            default_locale: self.default_locale.clone(),
            view_modes: self.view_modes.clone(),
            author: self.author.clone(),
            names: reduce(&matcher, &self.names),
            descriptions: reduce(&matcher, &self.descriptions),
            icons: reduce(&matcher, &self.icons),
            contents: reduce(&matcher, &self.contents),
            preferences: reduce(&matcher, &self.preferences),
            features: reduce(&matcher, &self.features),
            licenses: reduce(&matcher, &self.licenses),
            access_requests: self.access_requests.clone(),
        }
    }
}

fn reduce<T: LocaleAware + Clone>(matcher: &LocaleMatcher, items: &[T]) -> Vec<T> {
    matcher.best_match(items).cloned().into_iter().collect()
}

/// The people or organization attributed with the widget's creation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Author {
    /// Contact email address; empty when unset.
    pub email: String,
    /// A URL associated with the author; empty when unset.
    pub href: String,
    /// The author's display text.
    pub text: String,
}

/// A localized human-readable widget name.
///
/// A name with neither a short label nor text content never enters the
/// manifest; the parser drops it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Name {
    /// Abbreviated name for space-constrained contexts; empty when unset.
    pub short: String,
    /// The full name text.
    pub text: String,
    /// Locale tag; empty means unlocalized.
    pub lang: String,
}

/// A localized widget description.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Description {
    /// The description text.
    pub text: String,
    /// Locale tag; empty means unlocalized.
    pub lang: String,
}

/// A localized widget icon. The parser never admits an icon with an empty
/// source.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Icon {
    /// Path to the icon file, relative to the package root.
    pub src: String,
    /// Locale tag; empty means unlocalized.
    pub lang: String,
}

/// A localized start-file declaration. The parser never admits a content
/// entry with an empty source.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Content {
    /// Path to the start file, relative to the package root.
    pub src: String,
    /// Declared media type; empty when unset.
    pub mime_type: String,
    /// Declared character encoding; empty when unset.
    pub encoding: String,
    /// Locale tag; empty means unlocalized.
    pub lang: String,
}

/// A localized preference default exposed to the widget at runtime.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Preference {
    /// The preference key.
    pub name: String,
    /// The default value.
    pub value: String,
    /// Whether the widget may overwrite the value. True only for the
    /// literal attribute value `"true"`.
    pub readonly: bool,
    /// Locale tag; empty means unlocalized.
    pub lang: String,
}

/// A runtime feature the widget requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureRequest {
    /// The feature identifier, usually an IRI.
    pub name: String,
    /// Whether the widget claims it cannot run without the feature. True
    /// unless the attribute is the literal `"false"`.
    pub required: bool,
    /// Feature parameters in document order.
    pub params: Vec<FeatureParameter>,
    /// Locale tag; empty means unlocalized.
    pub lang: String,
}

impl Default for FeatureRequest {
    fn default() -> Self {
        Self {
            name: String::new(),
            required: true,
            params: Vec::new(),
            lang: String::new(),
        }
    }
}

/// A name/value parameter on a feature request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeatureParameter {
    /// The parameter name.
    pub name: String,
    /// The parameter value.
    pub value: String,
}

/// A localized license block.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct License {
    /// A URL pointing at the full license; empty when unset.
    pub href: String,
    /// Inline license text.
    pub text: String,
    /// Locale tag; empty means unlocalized.
    pub lang: String,
}

/// A network access request. The parser never admits a request with an
/// empty origin.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccessRequest {
    /// The origin the widget wants to reach.
    pub origin: String,
    /// Whether subdomains of the origin are included.
    pub subdomains: bool,
}

macro_rules! locale_aware {
    ($($ty:ty),+ $(,)?) => {
        $(impl LocaleAware for $ty {
            fn locale(&self) -> &str {
                &self.lang
            }
        })+
    };
}

locale_aware!(Name, Description, Icon, Content, Preference, FeatureRequest, License);
