//! Module specifiers, entry names, and fixed policy values.

/// Entry key used when compiling the service (logic) process.
pub const SERVICE_ENTRY: &str = "app-service";

/// Entry key used when compiling the view (rendering) process.
pub const VIEW_ENTRY: &str = "app-view";

/// Default entry point registered by the host orchestrator.
pub const HOST_DEFAULT_ENTRY: &str = "app";

/// Name of the runtime chunk emitted by the service graph.
pub const SERVICE_RUNTIME_CHUNK: &str = "app-config";

/// Default main entry, relative to the input root.
pub const DEFAULT_MAIN_ENTRY: &str = "main.js";

/// Default opaque cache directory handed to the bundler.
pub const DEFAULT_CACHE_ROOT: &str = "node_modules/.cache";

/// Default single-file template compiler.
pub const DEFAULT_TEMPLATE_COMPILER: &str = "@dcloudio/uni-template-compiler";

/// Runtime framework module bound into the service process.
pub const RUNTIME_MODULE: &str = "@dcloudio/uni-mp-weixin/dist/mp.js";

/// Filter helper module providing `getDate`/`getRegExp`.
pub const FILTER_HELPER_MODULE: &str = "@dcloudio/uni-mp-weixin/dist/wxs.js";

/// Logging shim bound to `__f__`.
pub const FORMAT_LOG_MODULE: &str = "@dcloudio/vue-cli-plugin-uni/lib/format-log.js";

/// Pages manifest module imported first by every boot sequence.
pub const PAGES_MODULE: &str = "uni-pages";

/// Analytics module imported when stats are enabled.
pub const STATS_MODULE: &str = "@dcloudio/uni-stat";

/// Root under which the plugin's own loaders are published.
pub const LOADER_ROOT: &str = "@dcloudio/vue-cli-plugin-uni/packages";

/// Bundled style loader substituted for the host's `vue-style-loader`.
pub const APP_STYLE_LOADER: &str = "@dcloudio/vue-cli-plugin-uni/packages/app-vue-style-loader";

/// Resource query marking the script block of a component.
pub const SCRIPT_BLOCK_QUERY: &str = "vue&type=script";

/// Resource query marking the template block of a component.
pub const TEMPLATE_BLOCK_QUERY: &str = "vue&type=template";

/// Resource queries marking the auxiliary filter dialect.
pub const FILTER_DIALECT_QUERIES: [&str; 2] = ["lang=wxs", "blockType=wxs"];

/// Byte threshold below which assets would be inlined. A value of 1 means
/// every real asset falls back to file emission.
pub const ASSET_INLINE_LIMIT: u64 = 1;

/// Name pattern used for emitted assets in packaged-IDE mode.
pub const CONTEXT_RELATIVE_NAME: &str = "[path][name].[ext]";

/// Filename pattern for entry bundles.
pub const OUTPUT_FILENAME: &str = "[name].js";

/// Filename pattern for split chunks.
pub const OUTPUT_CHUNK_FILENAME: &str = "[id].js";

/// Global object the bundle attaches to.
pub const OUTPUT_GLOBAL_OBJECT: &str = "this";

/// Module extensions resolved in addition to the host defaults.
pub const RESOLVE_EXTENSIONS: [&str; 1] = [".nvue"];

/// Self-closing tags recognized by the template compiler.
pub const UNARY_TAGS: [&str; 18] = [
    "image", "area", "base", "br", "col", "embed", "frame", "hr", "img", "input", "isindex",
    "keygen", "link", "meta", "param", "source", "track", "wbr",
];
