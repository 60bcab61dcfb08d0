// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use log::info;
use std::sync::Arc;

use crate::checks::{
    CheckKind, CheckStrategy, GuardRuleEngine, LintCheck, RequiredTagsCheck, TemplateValidator,
    ValidateCheck,
};
use crate::config::GateConfig;
use crate::errors::Result;
use crate::reporter::JobReporter;
use crate::store::ObjectStore;

/// Everything an invocation needs, built once per process and shared by every
/// invocation. Holds no per-invocation state.
#[derive(Clone)]
pub struct AppContext {
    pub config: GateConfig,
    pub store: Arc<dyn ObjectStore>,
    pub reporter: Arc<dyn JobReporter>,
    pub check: Arc<dyn CheckStrategy>,
}

impl AppContext {
    pub fn new(
        config: GateConfig,
        store: Arc<dyn ObjectStore>,
        reporter: Arc<dyn JobReporter>,
        check: Arc<dyn CheckStrategy>,
    ) -> Self {
        AppContext {
            config,
            store,
            reporter,
            check,
        }
    }
}

/// Builds the configured check. `validator` is only called for the validate check.
pub fn build_check<V, F>(config: &GateConfig, validator: F) -> Result<Arc<dyn CheckStrategy>>
where
    V: TemplateValidator + 'static,
    F: FnOnce() -> Result<V>,
{
    let check: Arc<dyn CheckStrategy> = match config.check {
        CheckKind::Lint => {
            let engine = match &config.rules_dir {
                Some(dir) => GuardRuleEngine::from_dir(dir)?,
                None => GuardRuleEngine::builtin(),
            };
            info!(
                "Lint check with {} rule file(s) for regions {:?}",
                engine.rule_files().len(),
                config.lint_regions
            );
            Arc::new(LintCheck::new(engine, config.lint_regions.clone()))
        }
        CheckKind::Tags => {
            info!("Required tags check for {:?}", config.required_tags);
            Arc::new(RequiredTagsCheck::new(config.required_tags.iter().cloned()))
        }
        CheckKind::Validate => {
            info!("Remote template validation check");
            Arc::new(ValidateCheck::new(validator()?))
        }
    };
    Ok(check)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::ValidationIssue;
    use async_trait::async_trait;

    struct NeverCalled;

    #[async_trait]
    impl TemplateValidator for NeverCalled {
        async fn validate(&self, _body: &str) -> std::result::Result<(), ValidationIssue> {
            Ok(())
        }
    }

    fn never_called() -> Result<NeverCalled> {
        panic!("validator must only be built for the validate check")
    }

    #[test]
    fn configured_check_is_built() -> Result<()> {
        for kind in [CheckKind::Lint, CheckKind::Tags].iter() {
            let config = GateConfig {
                check: *kind,
                ..GateConfig::default()
            };
            assert_eq!(build_check(&config, never_called)?.kind(), *kind);
        }

        let config = GateConfig {
            check: CheckKind::Validate,
            ..GateConfig::default()
        };
        assert_eq!(build_check(&config, || Ok(NeverCalled))?.kind(), CheckKind::Validate);
        Ok(())
    }
}
