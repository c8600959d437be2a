// src/directive/parser.rs
use regex::Regex;

use crate::balancer::Algorithm;
use crate::directive::model::{Criteria, Directive, DirectiveAction, InstanceSpec, Parameters};

/// The directive fields a line can set.
#[derive(Debug, Clone, Copy)]
enum Field {
    Name,
    Algorithm,
    InstanceCount,
    Url,
}

struct FieldRule {
    pattern: Regex,
    field: Field,
}

/// Accumulates matches while scanning; turned into a `Directive` once the
/// whole text has been seen.
#[derive(Default)]
struct Draft {
    name: Option<String>,
    algorithm: Option<Algorithm>,
    instance_count: Option<u32>,
    url: Option<String>,
}

impl Draft {
    fn set(&mut self, field: Field, value: &str) {
        match field {
            Field::Name => self.name = Some(value.to_string()),
            Field::Algorithm => self.algorithm = Some(normalize_algorithm(value)),
            Field::InstanceCount => {
                if let Ok(count) = value.parse::<u32>() {
                    self.instance_count = Some(count);
                }
            }
            Field::Url => self.url = Some(value.to_string()),
        }
    }

    fn finalize(self) -> Directive {
        let count = self.instance_count.unwrap_or(1);
        let instances = match self.url {
            Some(url) if count > 0 => (1..=count)
                .map(|ordinal| InstanceSpec {
                    url: url.clone(),
                    name: format!("instance{ordinal}"),
                    weight: 1,
                })
                .collect(),
            _ => Vec::new(),
        };

        Directive {
            action: DirectiveAction::CreateLoadBalancer,
            criteria: Criteria { name: self.name },
            parameters: Parameters {
                algorithm: self.algorithm.unwrap_or_default(),
                instances,
            },
        }
    }
}

/// Maps a chat token onto an algorithm. Unknown tokens fall back to round
/// robin, matching the selection engine's default. `random` is carried
/// through verbatim; the engine treats it as unrecognized.
fn normalize_algorithm(token: &str) -> Algorithm {
    match token.to_lowercase().as_str() {
        "roundrobin" => Algorithm::RoundRobin,
        "leastconn" => Algorithm::LeastConn,
        "random" => Algorithm::Other("random".to_string()),
        _ => Algorithm::RoundRobin,
    }
}

/// Extracts a structured provisioning directive from free-form text.
///
/// Chat users send loosely structured lines, so the parser optimizes for
/// tolerance over strictness: keyword matching survives common misspellings
/// ("loadbalcer", "instacen"), field order is irrelevant, the last match for
/// a recurring field wins, and lines matching nothing are silently skipped.
/// Parsing never fails; rejecting an unusable directive is the provisioning
/// service's job.
pub struct DirectiveParser {
    rules: Vec<FieldRule>,
}

impl DirectiveParser {
    pub fn new() -> Self {
        let rules = vec![
            // "load balancer name", tolerating one-character misspellings
            // such as "loadbalcer name".
            rule(r"(?i)load\s*ba\w*\s+name\s*[:=]\s*(.+)", Field::Name),
            rule(r"(?i)\balgo\w*\s*[:=]\s*(\S+)", Field::Algorithm),
            // "instance count", tolerating "instacen count".
            rule(r"(?i)\binsta\w*\s+count\s*[:=]\s*(\d+)", Field::InstanceCount),
            rule(r"(?i)\burl\s*[:=]\s*(\S+)", Field::Url),
        ];
        Self { rules }
    }

    /// Single forward pass over the trimmed lines of `text`. Always returns
    /// a directive; an input matching no field yields one with empty
    /// criteria and no instances.
    pub fn parse(&self, text: &str) -> Directive {
        let mut draft = Draft::default();

        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            for rule in &self.rules {
                if let Some(captures) = rule.pattern.captures(line) {
                    let value = captures.get(1).map(|m| m.as_str().trim()).unwrap_or("");
                    if !value.is_empty() {
                        draft.set(rule.field, value);
                    }
                }
            }
        }

        draft.finalize()
    }
}

impl Default for DirectiveParser {
    fn default() -> Self {
        Self::new()
    }
}

fn rule(pattern: &str, field: Field) -> FieldRule {
    FieldRule {
        pattern: Regex::new(pattern).expect("field pattern must compile"),
        field,
    }
}
