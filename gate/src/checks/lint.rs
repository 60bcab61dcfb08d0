// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! Rule engine lint check.
//!
//! The rule engine itself is a collaborator behind [`RuleEngine`]. Production
//! uses [`GuardRuleEngine`], which evaluates Guard rule files through `cfn-guard`
//! against the long-form JSON rendering of each template.

use async_trait::async_trait;
use cfn_guard::ValidateInput;
use log::debug;
use serde::Serialize;
use serde_json::Value;
use std::fmt::Formatter;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use walkdir::{DirEntry, WalkDir};

use crate::checks::{CheckKind, CheckStrategy, Issue};
use crate::errors::{Error, Result};
use crate::template::load_template;

pub(crate) const RULE_FILE_SUPPORTED_EXTENSIONS: [&str; 2] = [".guard", ".ruleset"];
pub(crate) const DEFAULT_RULES_NAME: &str = "default.guard";
const DEFAULT_RULES: &str = include_str!("../../rules/default.guard");

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LintMatch {
    pub rule: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

impl std::fmt::Display for LintMatch {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.rule, self.message)?;
        if let Some(location) = &self.location {
            write!(f, " ({})", location)?;
        }
        Ok(())
    }
}

/// A named rule source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleFile {
    pub name: String,
    pub content: String,
}

impl RuleFile {
    pub fn new(name: &str, content: &str) -> Self {
        RuleFile {
            name: name.to_string(),
            content: content.to_string(),
        }
    }
}

pub trait RuleEngine: Send + Sync {
    type RuleSet: Send + Sync;

    /// Selects the rules to run. Empty `includes` selects everything; `excludes`
    /// drop rules by name; `overrides` replace same-named rules or add new ones.
    fn build_rule_set(
        &self,
        includes: &[String],
        excludes: &[String],
        overrides: &[RuleFile],
    ) -> Result<Self::RuleSet>;

    fn run_checks(
        &self,
        name: &str,
        template: &Value,
        rules: &Self::RuleSet,
        regions: &[String],
    ) -> Result<Vec<LintMatch>>;
}

pub struct LintCheck<E: RuleEngine> {
    engine: E,
    regions: Vec<String>,
}

impl<E: RuleEngine> LintCheck<E> {
    pub fn new(engine: E, regions: Vec<String>) -> Self {
        LintCheck { engine, regions }
    }

    pub fn regions(&self) -> &[String] {
        &self.regions
    }
}

#[async_trait]
impl<E: RuleEngine> CheckStrategy for LintCheck<E> {
    fn kind(&self) -> CheckKind {
        CheckKind::Lint
    }

    async fn check(&self, name: &str, text: &str) -> Result<Vec<Issue>> {
        // a template that does not parse fails the run, not just this template
        let template = load_template(text)?;
        let rules = self.engine.build_rule_set(&[], &[], &[])?;
        let matches = self
            .engine
            .run_checks(name, &template, &rules, &self.regions)?;
        Ok(matches.into_iter().map(Issue::Lint).collect())
    }
}

#[derive(Debug, Clone)]
pub struct GuardRuleEngine {
    rule_files: Vec<RuleFile>,
}

impl Default for GuardRuleEngine {
    fn default() -> Self {
        GuardRuleEngine::builtin()
    }
}

impl GuardRuleEngine {
    pub fn new(rule_files: Vec<RuleFile>) -> Self {
        GuardRuleEngine { rule_files }
    }

    pub fn builtin() -> Self {
        GuardRuleEngine::new(vec![RuleFile::new(DEFAULT_RULES_NAME, DEFAULT_RULES)])
    }

    /// Loads every `.guard`/`.ruleset` file under `dir`, in alphabetical order.
    pub fn from_dir(dir: &Path) -> Result<Self> {
        if !dir.is_dir() {
            return Err(Error::ConfigError(format!(
                "rules directory `{}` does not exist",
                dir.display()
            )));
        }

        let mut rule_files = Vec::new();
        let walker = WalkDir::new(dir)
            .sort_by(|a, b| a.file_name().cmp(b.file_name()))
            .into_iter();
        for entry in walker {
            let entry = entry.map_err(|e| Error::ConfigError(e.to_string()))?;
            if !entry.path().is_file() || !has_rule_extension(&entry) {
                continue;
            }
            let name = entry
                .path()
                .strip_prefix(dir)
                .unwrap_or_else(|_| entry.path())
                .display()
                .to_string();
            let mut content = String::new();
            BufReader::new(File::open(entry.path())?).read_to_string(&mut content)?;
            rule_files.push(RuleFile { name, content });
        }

        if rule_files.is_empty() {
            return Err(Error::ConfigError(format!(
                "no rule files ({}) found in `{}`",
                RULE_FILE_SUPPORTED_EXTENSIONS.join(", "),
                dir.display()
            )));
        }
        Ok(GuardRuleEngine::new(rule_files))
    }

    pub fn rule_files(&self) -> &[RuleFile] {
        &self.rule_files
    }
}

fn has_rule_extension(entry: &DirEntry) -> bool {
    let name = entry.file_name().to_string_lossy();
    RULE_FILE_SUPPORTED_EXTENSIONS
        .iter()
        .any(|ext| name.ends_with(ext))
}

impl RuleEngine for GuardRuleEngine {
    type RuleSet = Vec<RuleFile>;

    fn build_rule_set(
        &self,
        includes: &[String],
        excludes: &[String],
        overrides: &[RuleFile],
    ) -> Result<Vec<RuleFile>> {
        let mut selected = self
            .rule_files
            .iter()
            .filter(|r| includes.is_empty() || includes.contains(&r.name))
            .filter(|r| !excludes.contains(&r.name))
            .cloned()
            .collect::<Vec<RuleFile>>();

        for each in overrides {
            match selected.iter_mut().find(|r| r.name == each.name) {
                Some(existing) => existing.content = each.content.clone(),
                None => selected.push(each.clone()),
            }
        }
        Ok(selected)
    }

    fn run_checks(
        &self,
        name: &str,
        template: &Value,
        rules: &Vec<RuleFile>,
        regions: &[String],
    ) -> Result<Vec<LintMatch>> {
        // Guard rules are region agnostic; the regions only show up in the logs.
        debug!(
            "Evaluating {} with {} rule file(s) for regions {:?}",
            name,
            rules.len(),
            regions
        );
        let data = serde_json::to_string(template)?;
        let mut matches = Vec::new();
        for rule in rules {
            let output = cfn_guard::run_checks(
                ValidateInput {
                    content: &data,
                    file_name: name,
                },
                ValidateInput {
                    content: &rule.content,
                    file_name: &rule.name,
                },
                false,
            )
            .map_err(|e| Error::RuleEngineError(format!("{}: {}", rule.name, e)))?;
            matches.extend(parse_guard_report(&rule.name, &output)?);
        }
        Ok(matches)
    }
}

/// Turns the JSON file report `cfn_guard::run_checks` writes into lint matches,
/// one per failing clause.
///
/// Each `not_compliant` entry is a clause report tree: `Rule` and `Disjunctions`
/// nodes group `checks`, while `Clause` (`Binary`/`Unary`) and `Block` leaves
/// carry the messages and the path of the offending value.
pub(crate) fn parse_guard_report(rule_file: &str, output: &str) -> Result<Vec<LintMatch>> {
    let mut matches = Vec::new();
    for report in serde_json::Deserializer::from_str(output).into_iter::<Value>() {
        collect_file_reports(rule_file, &report?, &mut matches);
    }
    Ok(matches)
}

fn collect_file_reports(rule_file: &str, report: &Value, matches: &mut Vec<LintMatch>) {
    match report {
        Value::Array(reports) => {
            for each in reports {
                collect_file_reports(rule_file, each, matches);
            }
        }
        Value::Object(file) => {
            if let Some(Value::Array(clauses)) = file.get("not_compliant") {
                for clause in clauses {
                    collect_clause(rule_file, None, clause, matches);
                }
            }
        }
        _ => {}
    }
}

fn collect_clause(rule_file: &str, rule: Option<&str>, clause: &Value, matches: &mut Vec<LintMatch>) {
    if let Some(nested) = clause.get("Rule") {
        let name = nested.get("name").and_then(Value::as_str).or(rule);
        let checks = children(nested);
        if checks.is_empty() {
            matches.push(leaf_match(rule_file, name, nested, None));
        }
        for check in checks {
            collect_clause(rule_file, name, check, matches);
        }
    } else if let Some(disjunctions) = clause.get("Disjunctions") {
        for check in children(disjunctions) {
            collect_clause(rule_file, rule, check, matches);
        }
    } else if let Some(block) = clause.get("Block") {
        let location = pointer_string(block, "/unresolved/traversed_to/path");
        matches.push(leaf_match(rule_file, rule, block, location));
    } else if let Some(leaf) = clause.get("Clause") {
        if let Some(report) = leaf.get("Binary").or_else(|| leaf.get("Unary")) {
            matches.push(leaf_match(rule_file, rule, report, clause_location(report)));
        }
    }
}

fn children(node: &Value) -> &[Value] {
    match node.get("checks") {
        Some(Value::Array(checks)) => checks,
        _ => &[],
    }
}

// Binary: Resolved/InResolved compare `from`, UnResolved stops at `traversed_to`.
// Unary: Resolved holds `value`; UnResolvedContext has no path.
fn clause_location(report: &Value) -> Option<String> {
    let check = report.get("check")?;
    [
        "/Resolved/from/path",
        "/InResolved/from/path",
        "/Resolved/value/path",
        "/UnResolved/value/traversed_to/path",
    ]
    .iter()
    .find_map(|pointer| pointer_string(check, pointer))
}

fn leaf_match(rule_file: &str, rule: Option<&str>, report: &Value, location: Option<String>) -> LintMatch {
    let message = ["/messages/custom_message", "/messages/error_message", "/context"]
        .iter()
        .find_map(|pointer| pointer_string(report, pointer).map(|m| squash_whitespace(&m)))
        .unwrap_or_else(|| String::from("clause not satisfied"));

    LintMatch {
        rule: rule.map_or_else(|| rule_file.to_string(), String::from),
        message,
        location,
    }
}

fn pointer_string(value: &Value, pointer: &str) -> Option<String> {
    value
        .pointer(pointer)
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .map(String::from)
}

// Custom messages keep the indentation of the rule file they came from.
fn squash_whitespace(message: &str) -> String {
    message.split_whitespace().collect::<Vec<&str>>().join(" ")
}

#[cfg(test)]
#[path = "lint_tests.rs"]
mod lint_tests;
