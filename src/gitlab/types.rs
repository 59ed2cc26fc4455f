//! GitLab REST resources, reduced to the fields glbulk reads.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A project as returned by `GET /projects?simple=true`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteProject {
    /// Numeric project id
    pub id: u64,
    /// Full path, e.g. `team/backend/api`
    pub path_with_namespace: String,
    /// Display name
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_branch: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub web_url: Option<String>,
}

impl RemoteProject {
    /// The project's group path.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path_with_namespace
    }
}

/// A group or subgroup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteGroup {
    /// Numeric group id
    pub id: u64,
    /// Display name
    #[serde(default)]
    pub name: String,
    /// Last path segment
    pub path: String,
    /// Full path, e.g. `team/backend`
    pub full_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub web_url: Option<String>,
}

/// A CI pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pipeline {
    /// Pipeline id; later pipelines have higher ids
    pub id: u64,
    /// `success`, `failed`, `running`, ...
    pub status: String,
    /// Branch or tag the pipeline ran for
    #[serde(rename = "ref", default, skip_serializing_if = "Option::is_none")]
    pub ref_name: Option<String>,
    /// Configuration errors; only present on the single-pipeline endpoint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub yaml_errors: Option<String>,
}

/// A CI job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    pub id: u64,
    pub stage: String,
    pub name: String,
    pub status: String,
}

/// Which pipelines to consider when asking for the latest one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineScope {
    /// Pipelines run for branches
    Branches,
    /// Pipelines run for tags
    Tags,
}

impl PipelineScope {
    /// Value of the `scope` query parameter.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Branches => "branches",
            Self::Tags => "tags",
        }
    }
}

impl fmt::Display for PipelineScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
