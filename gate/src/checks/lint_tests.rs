use super::*;
use indoc::indoc;
use pretty_assertions::assert_eq;
use std::sync::Mutex;

#[derive(Default)]
struct RecordingEngine {
    calls: Mutex<Vec<(String, Vec<String>)>>,
    matches: Vec<LintMatch>,
}

impl RuleEngine for RecordingEngine {
    type RuleSet = ();

    fn build_rule_set(
        &self,
        includes: &[String],
        excludes: &[String],
        overrides: &[RuleFile],
    ) -> Result<()> {
        assert!(includes.is_empty() && excludes.is_empty() && overrides.is_empty());
        Ok(())
    }

    fn run_checks(
        &self,
        name: &str,
        template: &Value,
        _rules: &(),
        regions: &[String],
    ) -> Result<Vec<LintMatch>> {
        assert!(template.get("Resources").is_some());
        self.calls
            .lock()
            .unwrap()
            .push((name.to_string(), regions.to_vec()));
        Ok(self.matches.clone())
    }
}

const TEMPLATE: &str = indoc! {r#"
    Resources:
      Volume:
        Type: AWS::EC2::Volume
        Properties:
          Size: 500
          Encrypted: false
          AvailabilityZone: !Select [0, !GetAZs ""]
"#};

#[tokio::test]
async fn lint_passes_configured_regions_to_the_engine() -> Result<()> {
    let check = LintCheck::new(
        RecordingEngine::default(),
        vec![String::from("us-west-2"), String::from("eu-west-1")],
    );
    let issues = check.check("stack.yaml", TEMPLATE).await?;
    assert_eq!(issues, vec![]);
    assert_eq!(
        *check.engine.calls.lock().unwrap(),
        vec![(
            String::from("stack.yaml"),
            vec![String::from("us-west-2"), String::from("eu-west-1")]
        )]
    );
    Ok(())
}

#[tokio::test]
async fn engine_matches_become_issues() -> Result<()> {
    let violation = LintMatch {
        rule: String::from("ebs_volumes_encrypted"),
        message: String::from("All EBS Volumes should be encrypted"),
        location: Some(String::from("/Resources/Volume/Properties/Encrypted")),
    };
    let engine = RecordingEngine {
        matches: vec![violation.clone()],
        ..Default::default()
    };
    let check = LintCheck::new(engine, vec![String::from("us-west-2")]);
    let issues = check.check("stack.yaml", TEMPLATE).await?;
    assert_eq!(issues, vec![Issue::Lint(violation)]);
    assert_eq!(
        issues[0].to_string(),
        "[ebs_volumes_encrypted] All EBS Volumes should be encrypted (/Resources/Volume/Properties/Encrypted)"
    );
    Ok(())
}

#[tokio::test]
async fn unparsable_templates_fail_the_check() {
    let check = LintCheck::new(RecordingEngine::default(), vec![String::from("us-west-2")]);
    let err = check
        .check("broken.yaml", "Resources: [unclosed")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::YamlError(_)));
    assert!(check.engine.calls.lock().unwrap().is_empty());
}

#[test]
fn rule_set_selection() -> Result<()> {
    let engine = GuardRuleEngine::new(vec![
        RuleFile::new("a.guard", "rule a { Resources exists }"),
        RuleFile::new("b.guard", "rule b { Resources exists }"),
        RuleFile::new("c.guard", "rule c { Resources exists }"),
    ]);

    let all = engine.build_rule_set(&[], &[], &[])?;
    assert_eq!(all.len(), 3);

    let included = engine.build_rule_set(&[String::from("b.guard")], &[], &[])?;
    assert_eq!(included, vec![RuleFile::new("b.guard", "rule b { Resources exists }")]);

    let excluded = engine.build_rule_set(&[], &[String::from("a.guard")], &[])?;
    let names = excluded.iter().map(|r| r.name.as_str()).collect::<Vec<&str>>();
    assert_eq!(names, vec!["b.guard", "c.guard"]);

    let overridden = engine.build_rule_set(
        &[],
        &[],
        &[
            RuleFile::new("c.guard", "rule c2 { Resources exists }"),
            RuleFile::new("d.guard", "rule d { Resources exists }"),
        ],
    )?;
    let names = overridden.iter().map(|r| r.name.as_str()).collect::<Vec<&str>>();
    assert_eq!(names, vec!["a.guard", "b.guard", "c.guard", "d.guard"]);
    assert_eq!(overridden[2].content, "rule c2 { Resources exists }");
    Ok(())
}

#[test]
fn rule_files_are_loaded_alphabetically_from_a_directory() -> Result<()> {
    let dir = tempfile::tempdir()?;
    std::fs::write(dir.path().join("zeta.guard"), "rule zeta { Resources exists }")?;
    std::fs::write(dir.path().join("alpha.ruleset"), "rule alpha { Resources exists }")?;
    std::fs::write(dir.path().join("notes.md"), "not a rule")?;

    let engine = GuardRuleEngine::from_dir(dir.path())?;
    let names = engine
        .rule_files()
        .iter()
        .map(|r| r.name.as_str())
        .collect::<Vec<&str>>();
    assert_eq!(names, vec!["alpha.ruleset", "zeta.guard"]);
    Ok(())
}

#[test]
fn empty_or_missing_rule_directories_are_config_errors() -> Result<()> {
    let dir = tempfile::tempdir()?;
    assert!(matches!(
        GuardRuleEngine::from_dir(dir.path()),
        Err(Error::ConfigError(_))
    ));
    assert!(matches!(
        GuardRuleEngine::from_dir(&dir.path().join("missing")),
        Err(Error::ConfigError(_))
    ));
    Ok(())
}

const FILE_REPORT: &str = r#"{
  "name": "stack.yaml",
  "metadata": {},
  "status": "FAIL",
  "not_compliant": [
    {
      "Rule": {
        "name": "ebs_volumes_encrypted",
        "metadata": {},
        "messages": { "custom_message": null, "error_message": null },
        "checks": [
          {
            "Clause": {
              "Binary": {
                "context": " %ebs_volumes[*].Properties.Encrypted EQUALS  true",
                "messages": {
                  "custom_message": "\n        Violation: All EBS Volumes should be encrypted\n        Fix: Set Encrypted property to true\n    ",
                  "error_message": "Check was not compliant as property value [Path=/Resources/Volume/Properties/Encrypted[L:0,C:0] Value=false] not equal to value [Path=[L:0,C:0] Value=true]."
                },
                "check": {
                  "Resolved": {
                    "from": { "path": "/Resources/Volume/Properties/Encrypted", "value": false },
                    "to": { "path": "", "value": true },
                    "comparison": ["Eq", false]
                  }
                }
              }
            }
          }
        ]
      }
    },
    {
      "Rule": {
        "name": "s3_buckets_block_public_access",
        "metadata": {},
        "messages": { "custom_message": null, "error_message": null },
        "checks": [
          {
            "Disjunctions": {
              "checks": [
                {
                  "Clause": {
                    "Unary": {
                      "context": " %s3_buckets[*].Properties.PublicAccessBlockConfiguration EXISTS  ",
                      "messages": {
                        "custom_message": null,
                        "error_message": "Check was not compliant as property [PublicAccessBlockConfiguration] is missing."
                      },
                      "check": {
                        "UnResolved": {
                          "value": {
                            "traversed_to": { "path": "/Resources/Bucket/Properties", "value": {} },
                            "remaining_query": "PublicAccessBlockConfiguration",
                            "reason": "Could not find key PublicAccessBlockConfiguration"
                          },
                          "comparison": ["Exists", false]
                        }
                      }
                    }
                  }
                },
                {
                  "Block": {
                    "context": "Resources.*",
                    "messages": { "custom_message": "", "error_message": "Query did not resolve" },
                    "unresolved": {
                      "traversed_to": { "path": "/Resources", "value": {} },
                      "remaining_query": "*",
                      "reason": null
                    }
                  }
                }
              ]
            }
          }
        ]
      }
    }
  ],
  "not_applicable": ["resources_declare_types"],
  "compliant": ["template_declares_resources"]
}"#;

#[test]
fn file_reports_yield_one_match_per_failing_clause() -> Result<()> {
    let matches = parse_guard_report("default.guard", FILE_REPORT)?;
    assert_eq!(
        matches,
        vec![
            LintMatch {
                rule: String::from("ebs_volumes_encrypted"),
                message: String::from(
                    "Violation: All EBS Volumes should be encrypted Fix: Set Encrypted property to true"
                ),
                location: Some(String::from("/Resources/Volume/Properties/Encrypted")),
            },
            LintMatch {
                rule: String::from("s3_buckets_block_public_access"),
                message: String::from(
                    "Check was not compliant as property [PublicAccessBlockConfiguration] is missing."
                ),
                location: Some(String::from("/Resources/Bucket/Properties")),
            },
            LintMatch {
                rule: String::from("s3_buckets_block_public_access"),
                message: String::from("Query did not resolve"),
                location: Some(String::from("/Resources")),
            },
        ]
    );
    Ok(())
}

#[test]
fn rules_without_clauses_fall_back_to_their_own_messages() -> Result<()> {
    let output = r#"{"name":"stack.yaml","metadata":{},"status":"FAIL","not_compliant":[{"Rule":{"name":"template_declares_resources","metadata":{},"messages":{"custom_message":null,"error_message":"Rule failed"},"checks":[]}}],"not_applicable":[],"compliant":[]}"#;
    assert_eq!(
        parse_guard_report("default.guard", output)?,
        vec![LintMatch {
            rule: String::from("template_declares_resources"),
            message: String::from("Rule failed"),
            location: None,
        }]
    );
    Ok(())
}

#[test]
fn compliant_or_empty_guard_reports_have_no_matches() -> Result<()> {
    assert_eq!(parse_guard_report("r", "")?, vec![]);
    assert_eq!(
        parse_guard_report(
            "r",
            r#"{"name":"d","metadata":{},"status":"PASS","not_compliant":[],"not_applicable":[],"compliant":["x"]}"#
        )?,
        vec![]
    );
    Ok(())
}

#[tokio::test]
async fn builtin_rules_flag_unencrypted_volumes() -> Result<()> {
    let check = LintCheck::new(GuardRuleEngine::builtin(), vec![String::from("us-west-2")]);
    let issues = check.check("stack.yaml", TEMPLATE).await?;
    assert_eq!(
        issues,
        vec![Issue::Lint(LintMatch {
            rule: String::from("ebs_volumes_encrypted"),
            message: String::from(
                "Violation: All EBS Volumes should be encrypted Fix: Set Encrypted property to true"
            ),
            location: Some(String::from("/Resources/Volume/Properties/Encrypted")),
        })]
    );
    Ok(())
}

#[tokio::test]
async fn builtin_rules_pass_compliant_templates() -> Result<()> {
    let template = indoc! {r#"
        Resources:
          Volume:
            Type: AWS::EC2::Volume
            Properties:
              Size: 500
              Encrypted: true
    "#};
    let check = LintCheck::new(GuardRuleEngine::builtin(), vec![String::from("us-west-2")]);
    assert_eq!(check.check("stack.yaml", template).await?, vec![]);
    Ok(())
}
