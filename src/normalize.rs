use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One compliance finding. Every field is optional on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    #[serde(default)]
    pub issue_identified: Option<String>,
    #[serde(default)]
    pub evidence: Option<String>,
    #[serde(default)]
    pub suggested_fix: Option<String>,
}

impl Issue {
    /// Non-string fields and non-object elements read as absent.
    pub fn from_value(v: &Value) -> Self {
        let field = |key: &str| v.get(key).and_then(Value::as_str).map(str::to_string);
        Self {
            issue_identified: field("issue_identified"),
            evidence: field("evidence"),
            suggested_fix: field("suggested_fix"),
        }
    }
}

/// Canonical success payload, also the shape of the results file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuesPayload {
    pub issues: Vec<Issue>,
}

/// A fixed lookup path into the response body.
#[derive(Debug, Clone, Copy)]
pub struct IssuePath {
    pub segments: &'static [&'static str],
}

impl IssuePath {
    pub fn dotted(&self) -> String {
        self.segments.join(".")
    }

    /// The value at this path, if it is an array.
    pub fn extract<'a>(&self, body: &'a Value) -> Option<&'a Vec<Value>> {
        self.segments
            .iter()
            .try_fold(body, |node, key| node.get(key))?
            .as_array()
    }
}

/// Deepest workflow path first, then progressively shallower fallbacks.
pub const ISSUE_PATHS: &[IssuePath] = &[
    IssuePath {
        segments: &["data", "executeWorkflow", "result", "output", "issues"],
    },
    IssuePath {
        segments: &["result", "output", "issues"],
    },
    IssuePath {
        segments: &["result", "issues"],
    },
    IssuePath {
        segments: &["output", "issues"],
    },
    IssuePath {
        segments: &["issues"],
    },
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Normalized {
    pub issues: Vec<Issue>,
    pub matched_path: String,
}

/// `None` when no known path holds an array.
pub fn normalize_issues(body: &Value) -> Option<Normalized> {
    ISSUE_PATHS.iter().find_map(|path| {
        path.extract(body).map(|items| Normalized {
            issues: items.iter().map(Issue::from_value).collect(),
            matched_path: path.dotted(),
        })
    })
}
