//! Domain primitive types used across the twinpack workspace.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::{LOADER_ROOT, SERVICE_ENTRY, VIEW_ENTRY};

/// Which half of the dual-process app is being compiled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProcessKind {
    /// Sandboxed logic process with no rendering capability.
    Service,
    /// Rendering process talking to the service over the bridge.
    View,
}

impl ProcessKind {
    /// Key of the single entry in the produced entry map.
    #[must_use]
    pub const fn entry_key(self) -> &'static str {
        match self {
            Self::Service => SERVICE_ENTRY,
            Self::View => VIEW_ENTRY,
        }
    }

    /// Returns `true` for the service process.
    #[must_use]
    pub const fn is_service(self) -> bool {
        matches!(self, Self::Service)
    }

    /// Returns `true` for the view process.
    #[must_use]
    pub const fn is_view(self) -> bool {
        matches!(self, Self::View)
    }
}

impl fmt::Display for ProcessKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Service => write!(f, "service"),
            Self::View => write!(f, "view"),
        }
    }
}

/// Bundler build mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BuildMode {
    /// Optimized output.
    Production,
    /// Unoptimized output with source maps where the target allows.
    #[default]
    Development,
}

impl BuildMode {
    /// Parses a `NODE_ENV`-style value. Anything but `production` is development.
    #[must_use]
    pub fn from_node_env(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("production") {
            Self::Production
        } else {
            Self::Development
        }
    }
}

impl fmt::Display for BuildMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Production => write!(f, "production"),
            Self::Development => write!(f, "development"),
        }
    }
}

/// Identifier of a module rule.
///
/// Rules the compositor owns form a closed set. Rules contributed by the host
/// that the compositor never touches are carried through as [`RuleId::Host`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RuleId {
    /// Component script blocks.
    ScriptBlock,
    /// Auxiliary filter-dialect blocks.
    FilterDialect,
    /// The application main entry.
    MainEntry,
    /// Component template blocks.
    TemplateBlock,
    /// Single-file components.
    #[serde(rename = "vue")]
    Component,
    /// Vector graphics.
    Svg,
    /// Raster images.
    Images,
    /// Audio and video.
    Media,
    /// Web fonts.
    Fonts,
    /// A host rule outside the closed set.
    #[serde(untagged)]
    Host(String),
}

impl RuleId {
    /// Stable name of the rule.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::ScriptBlock => "script-block",
            Self::FilterDialect => "filter-dialect",
            Self::MainEntry => "main-entry",
            Self::TemplateBlock => "template-block",
            Self::Component => "vue",
            Self::Svg => "svg",
            Self::Images => "images",
            Self::Media => "media",
            Self::Fonts => "fonts",
            Self::Host(name) => name,
        }
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifier of a loader (one stage) inside a rule.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LoaderId {
    /// Extracts the fixed script of a component for the view process.
    ViewScript,
    /// Resolves `usingComponents` declarations.
    UsingComponents,
    /// Compiles the auxiliary filter dialect.
    FilterDialect,
    /// Wraps the view main entry with boot code.
    ViewMain,
    /// Wraps the service main entry with boot code.
    #[serde(rename = "wrap-loader")]
    WrapMain,
    /// Drops filter modules from template output.
    FilterModulesTemplate,
    /// Injects page metadata into templates.
    PageMeta,
    /// The single-file component compiler.
    #[serde(rename = "vue-loader")]
    ComponentLoader,
    /// On-disk cache in front of the component compiler.
    #[serde(rename = "cache-loader")]
    CacheLoader,
    /// Inlines small assets, falls back to file emission.
    #[serde(rename = "url-loader")]
    UrlLoader,
    /// Emits assets as files.
    #[serde(rename = "file-loader")]
    FileLoader,
    /// A host loader outside the closed set.
    #[serde(untagged)]
    Host(String),
}

impl LoaderId {
    /// Stable name of the loader.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::ViewScript => "view-script",
            Self::UsingComponents => "using-components",
            Self::FilterDialect => "filter-dialect",
            Self::ViewMain => "view-main",
            Self::WrapMain => "wrap-loader",
            Self::FilterModulesTemplate => "filter-modules-template",
            Self::PageMeta => "page-meta",
            Self::ComponentLoader => "vue-loader",
            Self::CacheLoader => "cache-loader",
            Self::UrlLoader => "url-loader",
            Self::FileLoader => "file-loader",
            Self::Host(name) => name,
        }
    }

    /// Module specifier the bundler loads for this stage.
    #[must_use]
    pub fn specifier(&self) -> String {
        match self {
            Self::ViewScript => format!("{LOADER_ROOT}/webpack-uni-app-loader/view/script"),
            Self::UsingComponents => format!("{LOADER_ROOT}/webpack-uni-app-loader/using-components"),
            Self::FilterDialect => format!("{LOADER_ROOT}/webpack-uni-filter-loader"),
            Self::ViewMain => format!("{LOADER_ROOT}/webpack-uni-app-loader/view/main.js"),
            Self::FilterModulesTemplate => {
                format!("{LOADER_ROOT}/webpack-uni-app-loader/filter-modules-template.js")
            }
            Self::PageMeta => format!("{LOADER_ROOT}/webpack-uni-app-loader/page-meta"),
            Self::ComponentLoader => format!("{LOADER_ROOT}/vue-loader"),
            Self::WrapMain | Self::CacheLoader | Self::UrlLoader | Self::FileLoader | Self::Host(_) => {
                self.as_str().to_owned()
            }
        }
    }
}

impl fmt::Display for LoaderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifier of a bundler plugin.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PluginId {
    /// Binds free identifiers to module exports.
    Provide,
    /// Hot module replacement.
    #[serde(rename = "hmr")]
    HotModuleReplacement,
    /// HTML page generation.
    Html,
    /// Static file copying.
    Copy,
    /// `<link rel=preload>` injection.
    Preload,
    /// `<link rel=prefetch>` injection.
    Prefetch,
    /// A host plugin outside the closed set.
    #[serde(untagged)]
    Host(String),
}

impl PluginId {
    /// Plugins that only make sense when the output runs in a web browser.
    pub const WEB_ONLY: [Self; 5] = [
        Self::HotModuleReplacement,
        Self::Html,
        Self::Copy,
        Self::Preload,
        Self::Prefetch,
    ];

    /// Stable name of the plugin.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Provide => "provide",
            Self::HotModuleReplacement => "hmr",
            Self::Html => "html",
            Self::Copy => "copy",
            Self::Preload => "preload",
            Self::Prefetch => "prefetch",
            Self::Host(name) => name,
        }
    }
}

impl fmt::Display for PluginId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_keys_follow_process_kind() {
        assert_eq!(ProcessKind::Service.entry_key(), "app-service");
        assert_eq!(ProcessKind::View.entry_key(), "app-view");
    }

    #[test]
    fn build_mode_parses_node_env() {
        assert_eq!(BuildMode::from_node_env("production"), BuildMode::Production);
        assert_eq!(BuildMode::from_node_env(" Production "), BuildMode::Production);
        assert_eq!(BuildMode::from_node_env("development"), BuildMode::Development);
        assert_eq!(BuildMode::from_node_env(""), BuildMode::Development);
    }

    #[test]
    fn known_rule_names_deserialize_to_closed_variants() {
        let id: RuleId = serde_json::from_str("\"vue\"").expect("deserialize");
        assert_eq!(id, RuleId::Component);
        let id: RuleId = serde_json::from_str("\"svg\"").expect("deserialize");
        assert_eq!(id, RuleId::Svg);
    }

    #[test]
    fn unknown_rule_names_are_kept_as_host_rules() {
        let id: RuleId = serde_json::from_str("\"scss\"").expect("deserialize");
        assert_eq!(id, RuleId::Host("scss".into()));
        assert_eq!(serde_json::to_string(&id).expect("serialize"), "\"scss\"");
    }

    #[test]
    fn plugin_names_match_host_registrations() {
        let json = serde_json::to_string(&PluginId::HotModuleReplacement).expect("serialize");
        assert_eq!(json, "\"hmr\"");
        let id: PluginId = serde_json::from_str("\"prefetch\"").expect("deserialize");
        assert_eq!(id, PluginId::Prefetch);
    }

    #[test]
    fn loader_specifiers_point_into_loader_root() {
        assert!(LoaderId::ViewScript.specifier().starts_with(LOADER_ROOT));
        assert_eq!(LoaderId::WrapMain.specifier(), "wrap-loader");
        assert_eq!(LoaderId::Host("thread-loader".into()).specifier(), "thread-loader");
    }
}
