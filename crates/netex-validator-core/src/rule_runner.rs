//! Applies a selected rule set to one parsed document (`spec.md` §4.6).
//!
//! Rules are precompiled once per dataset run (construction), then applied
//! to every document the orchestrator hands this runner. While evaluating,
//! every `id`-bearing element and every `*Ref` element/`@ref` attribute in
//! the document is harvested into the shared [`IdRepository`], independent
//! of which rules matched.

use crate::id_repository::IdRepository;
use crate::orchestrator::CancellationToken;
use crate::report::{DataLocation, Finding, RuleMeta, Severity};
use crate::rule::Rule;
use crate::xml::XmlTree;
use crate::xpath::ast::Expr;
use crate::xpath::{XPathError, compile, evaluate};

struct CompiledRule {
    rule: Rule,
    expr: Result<Expr, XPathError>,
}

/// Outcome of running the selected rule set against one document.
#[derive(Debug, Default)]
pub struct RunOutcome {
    pub findings: Vec<Finding>,
    pub truncated: bool,
}

/// Precompiles a rule set once, then applies it to any number of documents.
pub struct RuleRunner {
    compiled: Vec<CompiledRule>,
    max_findings: usize,
}

impl RuleRunner {
    /// Precompiles every rule's XPath expression. Rules whose expression
    /// fails to compile still run (they emit a single EVALUATION-ERROR
    /// finding, attributed to the rule, the first time they are applied).
    pub fn new(rules: Vec<Rule>, max_findings: usize) -> Self {
        let compiled = rules
            .into_iter()
            .map(|rule| {
                let expr = compile(&rule.xpath);
                CompiledRule { rule, expr }
            })
            .collect();
        Self {
            compiled,
            max_findings,
        }
    }

    /// Runs every compiled rule against `tree`, then harvests ids/references
    /// for `file_name` into `id_repo`. Stops early once `max_findings` (0 =
    /// unlimited) rule-violation entries have been produced, or as soon as
    /// `cancellation` is observed between two rules, so a file with many
    /// expensive rules is interruptible mid-file rather than only between
    /// whole files.
    pub fn run(
        &self,
        tree: &XmlTree,
        file_name: &str,
        id_repo: &IdRepository,
        cancellation: &CancellationToken,
    ) -> RunOutcome {
        let mut outcome = RunOutcome::default();

        'rules: for compiled in &self.compiled {
            if cancellation.is_cancelled() {
                break 'rules;
            }
            match &compiled.expr {
                Err(err) => {
                    outcome.findings.push(Finding::new(
                        RuleMeta {
                            code: compiled.rule.code.clone(),
                            name: compiled.rule.name.clone(),
                            message: format!("rule '{}' has an invalid expression: {err}", compiled.rule.code),
                            severity: Severity::Warning,
                        },
                        DataLocation::for_file(file_name),
                    ));
                }
                Ok(expr) => {
                    for hit in evaluate(tree, expr) {
                        if self.max_findings != 0 && outcome.findings.len() >= self.max_findings {
                            outcome.truncated = true;
                            break 'rules;
                        }
                        outcome.findings.push(Finding::new(
                            RuleMeta {
                                code: compiled.rule.code.clone(),
                                name: compiled.rule.name.clone(),
                                message: compiled.rule.message.clone(),
                                severity: compiled.rule.severity,
                            },
                            DataLocation {
                                file_name: file_name.to_owned(),
                                line_number: hit.line_number,
                                xpath: hit.computed_xpath,
                                element_id: hit.element_id.unwrap_or_default(),
                            },
                        ));
                    }
                }
            }
        }

        if outcome.truncated {
            outcome.findings.push(Finding::new(
                RuleMeta {
                    code: "FINDINGS-TRUNCATED".into(),
                    name: "Findings truncated".into(),
                    message: format!(
                        "reached the max-findings cap of {} for '{file_name}'; remaining rules were not evaluated",
                        self.max_findings
                    ),
                    severity: Severity::Info,
                },
                DataLocation::for_file(file_name),
            ));
        }

        harvest_ids_and_references(tree, file_name, id_repo);

        outcome
    }
}

fn harvest_ids_and_references(tree: &XmlTree, file_name: &str, id_repo: &IdRepository) {
    for node in tree.all_nodes() {
        let Some(element) = tree.get(node) else { continue };
        let version = element.attr("version").unwrap_or("");

        if let Some(id) = element.attr("id") {
            let _ = id_repo.add_id(id, version, file_name, Some(element.local_name.as_str()));
        }

        let is_ref_element = element.local_name.ends_with("Ref");
        let ref_value = element
            .attr("ref")
            .map(str::to_owned)
            .or_else(|| is_ref_element.then(|| element.text.trim().to_owned()).filter(|s| !s.is_empty()));

        if let Some(ref_id) = ref_value {
            id_repo.add_reference(&ref_id, version, file_name);
        }
    }
}
