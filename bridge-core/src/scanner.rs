//! Heuristic vulnerability hints over captured traffic.
//!
//! Pure substring matching. No state, no I/O; safe to run on any snapshot.

use crate::history::CaptureEntry;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    High,
    Medium,
    Low,
    Info,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Severity::High => "HIGH",
            Severity::Medium => "MEDIUM",
            Severity::Low => "LOW",
            Severity::Info => "INFO",
        };
        f.write_str(label)
    }
}

/// One hint raised against one entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    #[serde(rename = "type")]
    pub kind: String,
    pub severity: Severity,
    pub url: String,
    pub method: String,
    pub detail: String,
}

enum Target {
    Url,
    RequestText,
}

struct Rule {
    kind: &'static str,
    severity: Severity,
    target: Target,
    needles: &'static [&'static str],
    detail: &'static str,
}

const RULES: &[Rule] = &[
    Rule {
        kind: "Potential SSRF",
        severity: Severity::High,
        target: Target::Url,
        needles: &["url=", "path=", "file=", "src=", "img=", "load=", "uri=", "target="],
        detail: "URL contains parameter that may accept user-controlled URLs",
    },
    Rule {
        kind: "Potential SQL Injection",
        severity: Severity::High,
        target: Target::Url,
        needles: &["id=", "user=", "name=", "order=", "sort=", "query=", "search="],
        detail: "URL contains parameter that may be injectable",
    },
    Rule {
        kind: "Sensitive Data in URL",
        severity: Severity::Medium,
        target: Target::Url,
        needles: &["password", "token", "api_key", "secret", "auth", "key"],
        detail: "Sensitive parameter found in URL - may be logged",
    },
    Rule {
        kind: "File Upload Detected",
        severity: Severity::Info,
        target: Target::RequestText,
        needles: &["multipart/form-data"],
        detail: "File upload functionality - check for unrestricted upload",
    },
    Rule {
        kind: "Potential Path Traversal",
        severity: Severity::High,
        target: Target::Url,
        needles: &["file=", "path=", "page=", "include=", "template=", "dir="],
        detail: "URL contains file/path parameter - test for LFI/RFI",
    },
];

/// Run every rule over every entry, in entry order then rule order.
pub fn analyze<'a, I>(entries: I) -> Vec<Finding>
where
    I: IntoIterator<Item = &'a CaptureEntry>,
{
    let mut findings = Vec::new();
    for entry in entries {
        let url = entry.url.to_lowercase();
        let request_text = entry.request_text.to_lowercase();
        for rule in RULES {
            let haystack = match rule.target {
                Target::Url => &url,
                Target::RequestText => &request_text,
            };
            if rule.needles.iter().any(|n| haystack.contains(n)) {
                findings.push(Finding {
                    kind: rule.kind.to_string(),
                    severity: rule.severity,
                    url: entry.url.clone(),
                    method: entry.method.clone(),
                    detail: rule.detail.to_string(),
                });
            }
        }
    }
    findings
}
