//! Module transformation pipeline for the service and view graphs.
//!
//! Rules are emitted in a fixed order:
//! 1. component script blocks (view-script extraction first on the view,
//!    then using-components resolution);
//! 2. the auxiliary filter dialect, compiled for the service pipeline even
//!    when the view graph is being built;
//! 3. the main entry, wrapped with boot code;
//! 4. component template blocks (module filtering, then page metadata).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use twinpack_common::config::BuildEnv;
use twinpack_common::constants::{
    FILTER_DIALECT_QUERIES, SCRIPT_BLOCK_QUERY, TEMPLATE_BLOCK_QUERY,
};
use twinpack_common::error::Result;
use twinpack_common::types::{LoaderId, RuleId};

use crate::boot::boot_code;
use crate::graph::{LoaderUse, ResourceTest, Rule};
use crate::target::TargetDescriptor;

/// Options of the main entry wrapping stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MainEntryOptions {
    /// Template compiler the wrapper delegates to.
    pub compiler: String,
    /// Code prepended to the entry module.
    pub before: Vec<String>,
}

/// Assembles the ordered rule list for a target.
#[derive(Debug, Clone)]
pub struct RulePipelineBuilder<'a> {
    compiler: &'a str,
    global_components: &'a BTreeMap<String, String>,
}

impl<'a> RulePipelineBuilder<'a> {
    /// Creates a builder reading compiler and component settings from `env`.
    #[must_use]
    pub fn new(env: &'a BuildEnv) -> Self {
        Self {
            compiler: &env.template_compiler,
            global_components: &env.global_components,
        }
    }

    /// Builds the pipeline.
    ///
    /// # Errors
    ///
    /// Returns `EntryOutsideRoot` or `UnresolvedMainEntry` if the target's
    /// main entry is invalid.
    pub fn build(&self, target: &TargetDescriptor) -> Result<Vec<Rule>> {
        target.validate()?;
        let rules = vec![
            script_block_rule(target),
            filter_dialect_rule(),
            self.main_entry_rule(target)?,
            template_block_rule(),
        ];
        tracing::debug!(
            process = %target.process,
            rules = rules.len(),
            "built rule pipeline"
        );
        Ok(rules)
    }

    fn main_entry_rule(&self, target: &TargetDescriptor) -> Result<Rule> {
        let wrapper = if target.process.is_view() {
            LoaderId::ViewMain
        } else {
            LoaderId::WrapMain
        };
        let options = MainEntryOptions {
            compiler: self.compiler.to_owned(),
            before: vec![boot_code(target, self.global_components)],
        };
        Ok(Rule::new(RuleId::MainEntry)
            .with_test(ResourceTest::Path(target.main_entry.clone()))
            .with_loader(LoaderUse::new(wrapper).with_options(&options)?))
    }
}

fn script_block_rule(target: &TargetDescriptor) -> Rule {
    let mut rule = Rule::new(RuleId::ScriptBlock).with_query(SCRIPT_BLOCK_QUERY);
    if target.process.is_view() {
        rule = rule.with_loader(LoaderUse::new(LoaderId::ViewScript));
    }
    rule.with_loader(LoaderUse::new(LoaderId::UsingComponents))
}

// The filter dialect always goes through the service-side compiler.
fn filter_dialect_rule() -> Rule {
    FILTER_DIALECT_QUERIES
        .iter()
        .fold(Rule::new(RuleId::FilterDialect), |rule, q| rule.with_query(*q))
        .with_loader(LoaderUse::new(LoaderId::FilterDialect))
}

fn template_block_rule() -> Rule {
    Rule::new(RuleId::TemplateBlock)
        .with_query(TEMPLATE_BLOCK_QUERY)
        .with_loader(LoaderUse::new(LoaderId::FilterModulesTemplate))
        .with_loader(LoaderUse::new(LoaderId::PageMeta))
}
