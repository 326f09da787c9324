//! Fan-out of (file, agent) pairs to the provider
//!
//! File selection ranks reviewable files by changed-line count and caps
//! them per mode. Dispatch runs pairs concurrently under a semaphore and
//! an outer deadline; pairs still in flight at the deadline are cancelled
//! and recorded as timeouts while completed pairs are kept.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::agent::{build_prompt, parse_response, AgentKind};
use crate::config::{RetryConfig, ReviewConfig};
use crate::diff::FileChange;
use crate::provider::{call_with_retry, Provider, ProviderError};
use crate::review::ReviewComment;
use crate::{Error, Result};

/// How thorough the review should be
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReviewMode {
    /// All agents, larger file cap
    #[default]
    Full,
    /// Logic and security agents only, smaller file cap
    Quick,
}

impl ReviewMode {
    pub fn agents(&self) -> &'static [AgentKind] {
        match self {
            ReviewMode::Full => AgentKind::all(),
            ReviewMode::Quick => AgentKind::quick(),
        }
    }

    fn file_cap(&self, config: &ReviewConfig) -> usize {
        match self {
            ReviewMode::Full => config.max_files_full,
            ReviewMode::Quick => config.max_files_quick,
        }
    }
}

/// One (file, agent) pair that did not produce comments
#[derive(Debug, Clone)]
pub struct PairFailure {
    pub file_path: String,
    pub agent: AgentKind,
    pub error: ProviderError,
}

/// Everything dispatch produced for one request
#[derive(Debug, Default)]
pub struct DispatchOutcome {
    pub comments: Vec<ReviewComment>,
    pub failures: Vec<PairFailure>,
    /// At least one prompt had its diff truncated to fit the budget
    pub truncated: bool,
}

impl DispatchOutcome {
    pub fn is_partial(&self) -> bool {
        !self.failures.is_empty()
    }
}

/// Runs agents against selected files through one provider
pub struct Orchestrator {
    provider: Arc<dyn Provider>,
    retry: RetryConfig,
    review: ReviewConfig,
}

impl Orchestrator {
    pub fn new(provider: Arc<dyn Provider>, retry: RetryConfig, review: ReviewConfig) -> Self {
        Self {
            provider,
            retry,
            review,
        }
    }

    /// Pick the files to review for this mode
    ///
    /// Reviewable files are ranked by changed-line count descending;
    /// ties keep their diff order. The cap is applied after ranking.
    pub fn select_files<'a>(
        &self,
        files: &'a [FileChange],
        mode: ReviewMode,
    ) -> Vec<&'a FileChange> {
        let mut reviewable: Vec<&FileChange> =
            files.iter().filter(|f| f.is_reviewable()).collect();
        // Stable sort keeps diff order among equal counts.
        reviewable.sort_by_key(|f| std::cmp::Reverse(f.changed_line_count()));
        reviewable.truncate(mode.file_cap(&self.review));
        reviewable
    }

    /// Dispatch every (file, agent) pair and collect the results
    ///
    /// Fails only when every pair failed; any successful pair yields a
    /// (possibly partial) outcome.
    pub async fn dispatch(
        &self,
        files: &[&FileChange],
        mode: ReviewMode,
    ) -> Result<DispatchOutcome> {
        let agents = mode.agents();
        let total_pairs = files.len() * agents.len();
        if total_pairs == 0 {
            return Ok(DispatchOutcome::default());
        }

        info!(
            files = files.len(),
            agents = agents.len(),
            pairs = total_pairs,
            "dispatching review pairs"
        );

        let semaphore = Arc::new(Semaphore::new(self.review.max_concurrency));
        let deadline = tokio::time::Instant::now() + self.review.request_deadline;
        let mut outcome = DispatchOutcome::default();
        let mut tasks: JoinSet<(String, AgentKind, std::result::Result<Vec<ReviewComment>, ProviderError>)> =
            JoinSet::new();
        // Identities of in-flight pairs, so cancelled or panicked tasks
        // are still attributed to their (file, agent).
        let mut pending: HashMap<tokio::task::Id, (String, AgentKind)> = HashMap::new();

        for file in files {
            for &agent in agents {
                let prompt = build_prompt(file, agent, self.review.max_prompt_chars);
                if prompt.truncated {
                    debug!(file = %file.path, agent = agent.name(), "diff truncated for prompt");
                    outcome.truncated = true;
                }

                let provider = Arc::clone(&self.provider);
                let retry = self.retry.clone();
                let semaphore = Arc::clone(&semaphore);
                let path = file.path.clone();

                let handle = tasks.spawn(async move {
                    // Permit is held for the full call including retries.
                    let _permit = semaphore.acquire_owned().await;
                    let result = call_with_retry(
                        provider.as_ref(),
                        &retry,
                        agent.system_prompt(),
                        &prompt.content,
                    )
                    .await
                    .map(|raw| parse_response(&raw, agent, &path));
                    (path, agent, result)
                });
                pending.insert(handle.id(), (file.path.clone(), agent));
            }
        }

        let mut completed = 0usize;
        while completed < total_pairs {
            let next = tokio::time::timeout_at(deadline, tasks.join_next_with_id()).await;
            match next {
                Ok(Some(Ok((id, (path, agent, Ok(comments)))))) => {
                    pending.remove(&id);
                    debug!(file = %path, agent = agent.name(), found = comments.len(), "pair completed");
                    outcome.comments.extend(comments);
                    completed += 1;
                }
                Ok(Some(Ok((id, (path, agent, Err(error)))))) => {
                    pending.remove(&id);
                    warn!(file = %path, agent = agent.name(), kind = error.kind(), "pair failed");
                    outcome.failures.push(PairFailure {
                        file_path: path,
                        agent,
                        error,
                    });
                    completed += 1;
                }
                Ok(Some(Err(join_err))) => {
                    let (path, agent) = pending
                        .remove(&join_err.id())
                        .unwrap_or((String::new(), AgentKind::Logic));
                    warn!(file = %path, agent = agent.name(), error = %join_err, "pair task panicked");
                    outcome.failures.push(PairFailure {
                        file_path: path,
                        agent,
                        error: ProviderError::Fatal(join_err.to_string()),
                    });
                    completed += 1;
                }
                Ok(None) => break,
                Err(_) => {
                    warn!(
                        cancelled = pending.len(),
                        "request deadline reached, cancelling in-flight pairs"
                    );
                    tasks.abort_all();
                    for (_, (path, agent)) in pending.drain() {
                        outcome.failures.push(PairFailure {
                            file_path: path,
                            agent,
                            error: ProviderError::Timeout,
                        });
                    }
                    break;
                }
            }
        }

        if outcome.failures.len() == total_pairs {
            let mut kinds: Vec<&'static str> = outcome
                .failures
                .iter()
                .map(|f| f.error.kind())
                .collect();
            kinds.sort_unstable();
            kinds.dedup();
            return Err(Error::ReviewFailed(format!(
                "all {} review pairs failed ({})",
                total_pairs,
                kinds.join(", ")
            )));
        }

        Ok(outcome)
    }
}
