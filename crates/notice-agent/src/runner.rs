//! Context for out-of-band runner failures.
//!
//! When the scheduler cannot run the poll at all, its failure hook invokes
//! `notice-agent runner-failed`, which records a `runner_failure` occurrence
//! in the ledger without touching the notice board.

/// Identifies the failed scheduled run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunnerContext {
    pub workflow: String,
    pub run_id: String,
    pub repository: String,
    pub server_url: String,
}

impl RunnerContext {
    /// Detail text stored in the ledger.
    pub fn detail(&self) -> String {
        format!("Workflow '{}' failed. Run ID: {}", self.workflow, self.run_id)
    }

    /// Link to the failed run's logs.
    pub fn run_url(&self) -> String {
        format!(
            "{}/{}/actions/runs/{}",
            self.server_url.trim_end_matches('/'),
            self.repository,
            self.run_id
        )
    }

    /// Replace each field that was supplied, keeping the rest.
    pub fn with_overrides(
        mut self,
        workflow: Option<String>,
        run_id: Option<String>,
        repository: Option<String>,
        server_url: Option<String>,
    ) -> Self {
        if let Some(v) = workflow {
            self.workflow = v;
        }
        if let Some(v) = run_id {
            self.run_id = v;
        }
        if let Some(v) = repository {
            self.repository = v;
        }
        if let Some(v) = server_url {
            self.server_url = v;
        }
        self
    }
}

/// Placeholders used when the scheduler did not identify the run.
impl Default for RunnerContext {
    fn default() -> Self {
        Self {
            workflow: "Unknown".into(),
            run_id: "Unknown".into(),
            repository: "Unknown".into(),
            server_url: "https://github.com".into(),
        }
    }
}
