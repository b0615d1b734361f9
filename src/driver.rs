//! Event loop executing frontier operations over an [`HttpClient`].

use anyhow::{bail, Result};
use futures_util::future::join_all;
use hcf_core::{Destination, Link};
use hcf_frontier::{Category, Completion, CompletionOutcome, Frontier, LinkConsumer, Operation};
use tracing::{debug, info, warn};

use crate::http::HttpClient;

const DEFAULT_MAX_FAILED_ROUNDS: u32 = 5;

/// Totals for one [`Driver::run`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Batches of operations executed
    pub rounds: u64,
    pub links_fetched: u64,
    /// Batch ids acknowledged
    pub batches_deleted: u64,
    pub links_sent: u64,
    /// `newcount` reported by the frontier across adds
    pub links_accepted: u64,
    pub jobs_scheduled: u64,
    /// Operations that failed in transport or were rejected
    pub failed_operations: u64,
}

pub struct Driver<H, C> {
    frontier: Frontier,
    http: H,
    consumer: C,
    ready: Vec<Operation>,
    max_failed_rounds: u32,
}

impl<H, C> Driver<H, C>
where
    H: HttpClient,
    C: LinkConsumer,
{
    pub fn new(frontier: Frontier, http: H, consumer: C) -> Self {
        Self {
            frontier,
            http,
            consumer,
            ready: Vec::new(),
            max_failed_rounds: DEFAULT_MAX_FAILED_ROUNDS,
        }
    }

    /// Give up after this many consecutive rounds containing a failure.
    pub fn with_max_failed_rounds(mut self, rounds: u32) -> Self {
        self.max_failed_rounds = rounds.max(1);
        self
    }

    pub fn frontier(&self) -> &Frontier {
        &self.frontier
    }

    pub fn http(&self) -> &H {
        &self.http
    }

    pub fn into_parts(self) -> (Frontier, H, C) {
        (self.frontier, self.http, self.consumer)
    }

    /// Buffer a link; a full slot's add goes out before the next idle check.
    pub fn add_link(&mut self, destination: Destination, link: Link) -> Result<()> {
        if let Some(op) = self.frontier.add_link(destination, link)? {
            self.ready.push(op);
        }
        Ok(())
    }

    /// Run until the frontier has nothing left to do.
    ///
    /// Every consumer output for a fetched batch is passed to `forward`, which
    /// may buffer links through the frontier; an operation it returns is sent
    /// ahead of the next idle evaluation.
    pub async fn run<F>(&mut self, mut forward: F) -> Result<RunSummary>
    where
        F: FnMut(&mut Frontier, C::Output) -> Result<Option<Operation>>,
    {
        let mut summary = RunSummary::default();
        let mut failed_rounds = 0u32;

        loop {
            let batch = if self.ready.is_empty() {
                let decision = self.frontier.on_idle()?;
                if decision.operations.is_empty() {
                    if decision.keep_alive {
                        bail!("frontier is waiting on completions the driver never issued");
                    }
                    break;
                }
                decision.operations
            } else {
                std::mem::take(&mut self.ready)
            };

            summary.rounds += 1;
            debug!(round = summary.rounds, operations = batch.len(), "executing");

            let responses = join_all(batch.iter().map(|op| self.http.execute(op))).await;

            let mut failed = 0u64;
            // Adds carry links that are no longer buffered; resend them as-is.
            let mut resend = Vec::new();
            for (op, response) in batch.into_iter().zip(responses) {
                let response = match response {
                    Ok(response) => response,
                    Err(e) => {
                        warn!(
                            category = %op.completion.category(),
                            url = %op.url,
                            error = %e,
                            "operation failed"
                        );
                        self.frontier.abandon(&op.completion);
                        failed += 1;
                        if matches!(op.completion, Completion::Add { .. }) {
                            resend.push(op);
                        }
                        continue;
                    }
                };

                match self.frontier.complete(&op.completion, &response)? {
                    CompletionOutcome::Deleted { ids, .. } => {
                        summary.batches_deleted += ids as u64;
                    }
                    CompletionOutcome::Fetched { links, .. } => {
                        summary.links_fetched += links.len() as u64;
                        for output in self.consumer.new_links(links) {
                            if let Some(op) = forward(&mut self.frontier, output)? {
                                self.ready.push(op);
                            }
                        }
                    }
                    CompletionOutcome::Added { sent, accepted } => {
                        summary.links_sent += sent as u64;
                        summary.links_accepted += accepted;
                    }
                    CompletionOutcome::JobScheduled { .. } => {
                        summary.jobs_scheduled += 1;
                    }
                    CompletionOutcome::Rejected { category, .. } => {
                        failed += 1;
                        if category == Category::Flush {
                            resend.push(op);
                        }
                    }
                }
            }

            if !resend.is_empty() {
                debug!(operations = resend.len(), "resending failed add operations");
                resend.append(&mut self.ready);
                self.ready = resend;
            }

            if failed > 0 {
                summary.failed_operations += failed;
                failed_rounds += 1;
                if failed_rounds >= self.max_failed_rounds {
                    bail!(
                        "giving up after {} consecutive rounds with failed operations",
                        failed_rounds
                    );
                }
            } else {
                failed_rounds = 0;
            }
        }

        info!(
            rounds = summary.rounds,
            links_fetched = summary.links_fetched,
            links_sent = summary.links_sent,
            links_accepted = summary.links_accepted,
            "frontier session finished"
        );
        Ok(summary)
    }
}
