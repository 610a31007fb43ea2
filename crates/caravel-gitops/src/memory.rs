//! In-memory gitops backend.
//!
//! Records every facade call and hands out deterministic commit ids.
//! Individual operations can be primed to fail for failure-path tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::repo::{EnvValue, GitopsError, GitopsRepo, GitopsResult, RepoInfo};
use crate::tree;

/// One recorded facade call.
#[derive(Debug, Clone, PartialEq)]
pub enum GitopsCall {
    UpdatePipelineOutput {
        application: String,
        cluster: String,
        chart: String,
        output: Value,
    },
    MergeBranch {
        application: String,
        cluster: String,
        pipelinerun_id: u64,
    },
    GetEnvValue {
        application: String,
        cluster: String,
    },
    GetRepoInfo {
        application: String,
        cluster: String,
    },
}

impl GitopsCall {
    /// Short operation name, for order assertions.
    pub fn op(&self) -> &'static str {
        match self {
            Self::UpdatePipelineOutput { .. } => "update_pipeline_output",
            Self::MergeBranch { .. } => "merge_branch",
            Self::GetEnvValue { .. } => "get_env_value",
            Self::GetRepoInfo { .. } => "get_repo_info",
        }
    }
}

/// Value files a rendered cluster repository carries, in apply order.
pub fn default_value_files() -> Vec<String> {
    [
        tree::FILE_APPLICATION,
        tree::FILE_TAGS,
        tree::FILE_SRE,
        tree::FILE_BASE,
        tree::FILE_ENV,
        tree::FILE_RESTART,
        tree::FILE_PIPELINE_OUTPUT,
    ]
    .iter()
    .map(|f| f.to_string())
    .collect()
}

struct Inner {
    env_value: EnvValue,
    repo_info: RepoInfo,
    commit_seq: u64,
    calls: Vec<GitopsCall>,
    fail_op: Option<String>,
}

impl Default for Inner {
    fn default() -> Self {
        Self {
            env_value: EnvValue::default(),
            repo_info: RepoInfo {
                repo_url: String::new(),
                value_files: default_value_files(),
            },
            commit_seq: 0,
            calls: Vec::new(),
            fail_op: None,
        }
    }
}

/// Gitops backend held entirely in memory.
#[derive(Clone, Default)]
pub struct InMemoryGitops {
    inner: Arc<Mutex<Inner>>,
}

impl InMemoryGitops {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_env_value(self, env_value: EnvValue) -> Self {
        self.inner.lock().unwrap().env_value = env_value;
        self
    }

    pub fn with_repo_info(self, repo_info: RepoInfo) -> Self {
        self.inner.lock().unwrap().repo_info = repo_info;
        self
    }

    /// Make the named operation fail with an upstream error.
    pub fn fail_op(&self, op: &str) {
        self.inner.lock().unwrap().fail_op = Some(op.to_string());
    }

    /// Every call recorded so far.
    pub fn calls(&self) -> Vec<GitopsCall> {
        self.inner.lock().unwrap().calls.clone()
    }

    fn record(&self, call: GitopsCall) -> GitopsResult<()> {
        let mut inner = self.inner.lock().unwrap();
        let should_fail = inner.fail_op.as_deref() == Some(call.op());
        debug!(op = call.op(), should_fail, "gitops call");
        inner.calls.push(call);
        if should_fail {
            return Err(GitopsError::Upstream("primed to fail".to_string()));
        }
        Ok(())
    }

    fn next_commit(&self, prefix: &str) -> String {
        let mut inner = self.inner.lock().unwrap();
        inner.commit_seq += 1;
        format!("{prefix}-{}", inner.commit_seq)
    }
}

#[async_trait]
impl GitopsRepo for InMemoryGitops {
    async fn update_pipeline_output(
        &self,
        application: &str,
        cluster: &str,
        chart: &str,
        output: &Value,
    ) -> GitopsResult<String> {
        debug!(
            application,
            cluster,
            file = tree::FILE_PIPELINE_OUTPUT,
            branch = tree::BRANCH_GITOPS,
            "writing pipeline output"
        );
        self.record(GitopsCall::UpdatePipelineOutput {
            application: application.to_string(),
            cluster: cluster.to_string(),
            chart: chart.to_string(),
            output: output.clone(),
        })?;
        Ok(self.next_commit("cfg"))
    }

    async fn merge_branch(
        &self,
        application: &str,
        cluster: &str,
        pipelinerun_id: u64,
    ) -> GitopsResult<String> {
        debug!(
            application,
            cluster,
            from = tree::BRANCH_GITOPS,
            to = tree::BRANCH_STABLE,
            "merging branch"
        );
        self.record(GitopsCall::MergeBranch {
            application: application.to_string(),
            cluster: cluster.to_string(),
            pipelinerun_id,
        })?;
        Ok(self.next_commit("rev"))
    }

    async fn get_env_value(
        &self,
        application: &str,
        cluster: &str,
        _chart: &str,
    ) -> GitopsResult<EnvValue> {
        self.record(GitopsCall::GetEnvValue {
            application: application.to_string(),
            cluster: cluster.to_string(),
        })?;
        Ok(self.inner.lock().unwrap().env_value.clone())
    }

    async fn get_repo_info(&self, application: &str, cluster: &str) -> GitopsResult<RepoInfo> {
        self.record(GitopsCall::GetRepoInfo {
            application: application.to_string(),
            cluster: cluster.to_string(),
        })?;
        Ok(self.inner.lock().unwrap().repo_info.clone())
    }
}
