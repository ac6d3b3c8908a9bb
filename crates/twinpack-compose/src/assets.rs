//! Emission rules for binary assets.
//!
//! Every category goes through the url loader with a one-byte inline limit,
//! so assets always fall back to the file loader. The view process emits the
//! files; the service process only resolves their URLs.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use twinpack_common::constants::{ASSET_INLINE_LIMIT, CONTEXT_RELATIVE_NAME};
use twinpack_common::error::Result;
use twinpack_common::types::{LoaderId, RuleId};

use crate::graph::{LoaderUse, ResourceTest, Rule};
use crate::target::TargetDescriptor;

/// Asset categories handled by dedicated rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetCategory {
    /// SVG.
    VectorGraphics,
    /// PNG, JPEG, GIF, WebP.
    RasterImages,
    /// Audio and video.
    Media,
    /// Web fonts.
    Fonts,
}

impl AssetCategory {
    /// Every category, in rule order.
    pub const ALL: [Self; 4] = [
        Self::VectorGraphics,
        Self::RasterImages,
        Self::Media,
        Self::Fonts,
    ];

    /// Rule identifier for the category.
    #[must_use]
    pub const fn rule_id(self) -> RuleId {
        match self {
            Self::VectorGraphics => RuleId::Svg,
            Self::RasterImages => RuleId::Images,
            Self::Media => RuleId::Media,
            Self::Fonts => RuleId::Fonts,
        }
    }

    /// Path pattern selecting the category.
    #[must_use]
    pub const fn pattern(self) -> &'static str {
        match self {
            Self::VectorGraphics => r"\.(svg)(\?.*)?$",
            Self::RasterImages => r"\.(png|jpe?g|gif|webp)(\?.*)?$",
            Self::Media => r"\.(mp4|webm|ogg|mp3|wav|flac|aac)(\?.*)?$",
            Self::Fonts => r"\.(woff2?|eot|ttf|otf)(\?.*)?$",
        }
    }
}

/// Where emitted assets land.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AssetNaming {
    /// Output path mirrors the source path relative to a root.
    PathPreserving {
        /// Root the output path is made relative to.
        #[serde(rename = "outputPath")]
        output_path: RelativeOutputPath,
    },
    /// Explicit name pattern resolved against a context directory.
    ContextRelative {
        /// Name pattern.
        name: String,
        /// Directory `[path]` is relative to.
        context: PathBuf,
    },
}

/// Output path computed relative to a root directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelativeOutputPath {
    /// The root.
    pub relative_to: PathBuf,
}

/// File loader options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileLoaderOptions {
    /// Whether the file is written to the output directory.
    pub emit_file: bool,
    /// Naming scheme.
    #[serde(flatten)]
    pub naming: AssetNaming,
}

/// Loader used when an asset is above the inline limit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FallbackLoader {
    /// Loader specifier.
    pub loader: String,
    /// Loader options.
    pub options: FileLoaderOptions,
}

/// Url loader options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrlLoaderOptions {
    /// Byte size below which an asset is inlined.
    pub limit: u64,
    /// Loader for assets at or above the limit.
    pub fallback: FallbackLoader,
}

/// Builds the asset rules for a target.
#[derive(Debug, Clone, Copy, Default)]
pub struct AssetRuleComposer;

impl AssetRuleComposer {
    /// Creates a composer.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// File loader options for the target.
    #[must_use]
    pub fn file_options(&self, target: &TargetDescriptor) -> FileLoaderOptions {
        let naming = if target.packaged_ide {
            AssetNaming::ContextRelative {
                name: CONTEXT_RELATIVE_NAME.to_owned(),
                context: target.input_root.clone(),
            }
        } else {
            AssetNaming::PathPreserving {
                output_path: RelativeOutputPath {
                    relative_to: target.input_root.clone(),
                },
            }
        };
        FileLoaderOptions {
            emit_file: target.process.is_view(),
            naming,
        }
    }

    /// Builds one rule per asset category.
    ///
    /// # Errors
    ///
    /// Returns an error if loader options fail to serialize.
    pub fn build(&self, target: &TargetDescriptor) -> Result<Vec<Rule>> {
        let options = UrlLoaderOptions {
            limit: ASSET_INLINE_LIMIT,
            fallback: FallbackLoader {
                loader: LoaderId::FileLoader.specifier(),
                options: self.file_options(target),
            },
        };
        let loader = LoaderUse::new(LoaderId::UrlLoader).with_options(&options)?;
        let rules = AssetCategory::ALL
            .iter()
            .map(|category| {
                Rule::new(category.rule_id())
                    .with_test(ResourceTest::Pattern(category.pattern().to_owned()))
                    .with_loader(loader.clone())
            })
            .collect();
        tracing::debug!(
            process = %target.process,
            emit = options.fallback.options.emit_file,
            "built asset rules"
        );
        Ok(rules)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::Value;
    use twinpack_common::types::{BuildMode, ProcessKind};

    use super::*;

    fn target(process: ProcessKind, packaged_ide: bool) -> TargetDescriptor {
        TargetDescriptor {
            process,
            platform: "app-plus".into(),
            input_root: PathBuf::from("/proj"),
            main_entry: PathBuf::from("/proj/main.js"),
            mode: BuildMode::Production,
            using_stats: false,
            using_cache: false,
            packaged_ide,
        }
    }

    fn url_options(rule: &Rule) -> UrlLoaderOptions {
        let loader = rule.loader(&LoaderId::UrlLoader).expect("url loader");
        serde_json::from_value(Value::Object(loader.options.clone())).expect("options")
    }

    #[test]
    fn one_rule_per_category() {
        let rules = AssetRuleComposer::new()
            .build(&target(ProcessKind::View, false))
            .expect("build");
        let ids: Vec<_> = rules.iter().map(|r| r.id.clone()).collect();
        assert_eq!(
            ids,
            vec![RuleId::Svg, RuleId::Images, RuleId::Media, RuleId::Fonts]
        );
    }

    #[test]
    fn inline_limit_is_one_everywhere() {
        for process in [ProcessKind::Service, ProcessKind::View] {
            for ide in [false, true] {
                let rules = AssetRuleComposer::new()
                    .build(&target(process, ide))
                    .expect("build");
                for rule in &rules {
                    let loader = rule.loader(&LoaderId::UrlLoader).expect("url loader");
                    assert_eq!(loader.options.get("limit"), Some(&Value::from(1)));
                }
            }
        }
    }

    #[test]
    fn only_view_emits_files() {
        let view = AssetRuleComposer::new()
            .build(&target(ProcessKind::View, false))
            .expect("view");
        let service = AssetRuleComposer::new()
            .build(&target(ProcessKind::Service, false))
            .expect("service");
        assert!(url_options(&view[0]).fallback.options.emit_file);
        assert!(!url_options(&service[0]).fallback.options.emit_file);
        assert_eq!(url_options(&service[0]).fallback.loader, "file-loader");
    }

    #[test]
    fn default_naming_preserves_paths_under_root() {
        let rules = AssetRuleComposer::new()
            .build(&target(ProcessKind::View, false))
            .expect("build");
        let fallback = &rules[1]
            .loader(&LoaderId::UrlLoader)
            .expect("url loader")
            .options["fallback"]["options"];
        assert_eq!(fallback["outputPath"]["relativeTo"], Value::from("/proj"));
        assert!(fallback.get("name").is_none());
    }

    #[test]
    fn packaged_ide_uses_context_relative_names() {
        let options = AssetRuleComposer::new().file_options(&target(ProcessKind::View, true));
        assert_eq!(
            options.naming,
            AssetNaming::ContextRelative {
                name: "[path][name].[ext]".into(),
                context: PathBuf::from("/proj"),
            }
        );
        let json = serde_json::to_value(&options).expect("serialize");
        assert_eq!(json["name"], Value::from("[path][name].[ext]"));
        assert_eq!(json["context"], Value::from("/proj"));
        assert_eq!(json["emitFile"], Value::from(true));
    }
}
