//! Boot code prepended to the main entry.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use twinpack_common::constants::{PAGES_MODULE, STATS_MODULE};

use crate::target::TargetDescriptor;

/// Builds the boot sequence: pages manifest, optional analytics, then one
/// registration per global component.
#[must_use]
pub fn boot_code(target: &TargetDescriptor, global_components: &BTreeMap<String, String>) -> String {
    let mut code = format!("import '{PAGES_MODULE}';");
    if target.using_stats {
        let _ = write!(code, "import '{STATS_MODULE}';");
    }
    code.push_str(&global_components_code(global_components));
    code
}

/// Import and `Vue.component` registration for each global component.
#[must_use]
pub fn global_components_code(components: &BTreeMap<String, String>) -> String {
    let mut code = String::new();
    for (name, source) in components {
        let identifier = pascal_case(name);
        let source = source.as_str();
        let source = source
            .strip_prefix("@/")
            .or_else(|| source.strip_prefix('/'))
            .unwrap_or(source);
        let source = source.strip_suffix(".vue").unwrap_or(source);
        let _ = write!(
            code,
            "import {identifier} from '@/{source}.vue';Vue.component('{name}',{identifier});"
        );
    }
    code
}

fn pascal_case(name: &str) -> String {
    name.split('-')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_uppercase().chain(chars).collect()
            })
        })
        .collect()
}
