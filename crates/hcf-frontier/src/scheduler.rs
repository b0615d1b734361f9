//! Idle-time operation scheduler
//!
//! Each call to [`Frontier::on_idle`] walks a fixed priority chain and emits
//! operations for the first category that applies:
//!
//! 1. delete the batches returned by the last fetch
//! 2. fetch more links
//! 3. flush every buffered slot
//! 4. schedule the follow-up job (once)
//!
//! Later categories wait for a later idle signal. A delete always lands before
//! the next fetch from the same slot, otherwise the frontier would hand back
//! links whose deletion is still pending.

use hcf_batch::WriteBuffer;
use hcf_core::{codec, BatchId, Destination, HttpResponse, Link, QueuedLink};
use tracing::{debug, info, warn};

use crate::cursor::ReadCursor;
use crate::error::{FrontierError, Result};
use crate::request::{Category, Completion, Operation, RequestBuilder};
use crate::settings::{Settings, MAX_BATCH_SIZE};
use crate::trigger::FollowUpTrigger;

/// Result of one idle evaluation.
#[derive(Debug, Default)]
pub struct IdleDecision {
    pub operations: Vec<Operation>,
    /// The host must not shut down: completions are still due.
    pub keep_alive: bool,
}

/// What a completed operation did to the session.
#[derive(Debug, Clone, PartialEq)]
pub enum CompletionOutcome {
    Deleted {
        ids: usize,
        links: usize,
    },
    /// Links to hand to the consumer
    Fetched {
        batch_ids: Vec<BatchId>,
        links: Vec<QueuedLink>,
    },
    Added {
        sent: usize,
        accepted: u64,
    },
    JobScheduled {
        response: String,
    },
    /// Non-success status; nothing was changed
    Rejected {
        category: Category,
        status: u16,
    },
}

/// One crawl session's view of the frontier.
#[derive(Debug)]
pub struct Frontier {
    settings: Settings,
    requests: RequestBuilder,
    buffer: WriteBuffer,
    cursor: ReadCursor,
    follow_up: FollowUpTrigger,
    delete_in_flight: bool,
    fetch_in_flight: bool,
}

impl Frontier {
    pub fn new(settings: Settings) -> Result<Self> {
        validate(&settings)?;

        if settings.batch_size > MAX_BATCH_SIZE {
            warn!(
                batch_size = settings.batch_size,
                max = MAX_BATCH_SIZE,
                "fetch batch size exceeds frontier maximum; capping"
            );
        }

        Ok(Self {
            requests: RequestBuilder::new(&settings),
            buffer: WriteBuffer::new(settings.slot_buffer_size),
            cursor: ReadCursor::new(settings.links_to_fetch),
            follow_up: FollowUpTrigger::new(settings.start_new_job),
            delete_in_flight: false,
            fetch_in_flight: false,
            settings,
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn cursor(&self) -> &ReadCursor {
        &self.cursor
    }

    pub fn buffer(&self) -> &WriteBuffer {
        &self.buffer
    }

    pub fn follow_up(&self) -> &FollowUpTrigger {
        &self.follow_up
    }

    /// A delete or fetch has been issued and not yet completed.
    pub fn has_outstanding(&self) -> bool {
        self.delete_in_flight || self.fetch_in_flight
    }

    /// Buffer a link for `destination`.
    ///
    /// Returns the add operation to send right away when this fills the slot.
    pub fn add_link(&mut self, destination: Destination, link: Link) -> Result<Option<Operation>> {
        match self.buffer.enqueue(destination.clone(), link) {
            Some(batch) => {
                debug!(
                    destination = %destination,
                    links = batch.len(),
                    "slot buffer full; flushing"
                );
                Ok(Some(self.requests.build_add(&destination, batch.links())?))
            }
            None => Ok(None),
        }
    }

    /// Decide what to do with an idle host.
    pub fn on_idle(&mut self) -> Result<IdleDecision> {
        let operations = self.next_operations()?;
        let keep_alive = !operations.is_empty() || self.has_outstanding();

        match operations.first() {
            Some(op) => debug!(
                category = %op.completion.category(),
                operations = operations.len(),
                "idle: issuing operations"
            ),
            None => debug!(keep_alive, "idle: nothing to do"),
        }

        Ok(IdleDecision {
            operations,
            keep_alive,
        })
    }

    fn next_operations(&mut self) -> Result<Vec<Operation>> {
        if !self.has_outstanding() {
            if self.cursor.wants_delete() && !self.settings.debug_mode {
                let destination = self.read_destination()?;
                let op = self.requests.build_delete(
                    destination,
                    self.cursor.pending_ids(),
                    self.cursor.pending_links(),
                )?;
                self.delete_in_flight = true;
                return Ok(vec![op]);
            }

            if self.cursor.wants_fetch() {
                let destination = self.read_destination()?;
                let mincount = self
                    .settings
                    .effective_batch_size()
                    .min(self.cursor.remaining());
                let op = self.requests.build_fetch(destination, mincount);
                self.fetch_in_flight = true;
                return Ok(vec![op]);
            }
        }

        if !self.buffer.is_empty() {
            return self
                .buffer
                .drain_all()
                .into_iter()
                .map(|(destination, batch)| {
                    self.requests
                        .build_add(&destination, batch.links())
                        .map_err(FrontierError::from)
                })
                .collect();
        }

        // The follow-up job waits until no read is outstanding.
        if self.has_outstanding() {
            return Ok(Vec::new());
        }

        if self.follow_up.should_trigger() {
            self.follow_up.mark_triggered();
            return Ok(vec![self.requests.build_schedule()]);
        }

        Ok(Vec::new())
    }

    fn read_destination(&self) -> Result<&Destination> {
        self.settings
            .consume_from
            .as_ref()
            .ok_or(FrontierError::MissingReadDestination(
                self.settings.links_to_fetch,
            ))
    }

    /// Apply the completion of an operation this session issued.
    ///
    /// A non-success status leaves the session unchanged so the same
    /// condition is offered again on the next idle signal. A malformed body
    /// is returned as an error, also without touching the session.
    pub fn complete(
        &mut self,
        completion: &Completion,
        response: &HttpResponse,
    ) -> Result<CompletionOutcome> {
        self.release(completion);

        if !response.is_success() {
            warn!(
                category = %completion.category(),
                status = response.status,
                "frontier rejected operation; state unchanged"
            );
            return Ok(CompletionOutcome::Rejected {
                category: completion.category(),
                status: response.status,
            });
        }

        match completion {
            Completion::Delete {
                destination,
                ids,
                links,
            } => {
                self.cursor.record_delete_confirmed();
                info!(
                    destination = %destination,
                    ids = *ids,
                    links = *links,
                    "deleted ids from frontier"
                );
                Ok(CompletionOutcome::Deleted {
                    ids: *ids,
                    links: *links,
                })
            }
            Completion::Fetch {
                destination,
                requested,
            } => {
                let batches = codec::decode_fetch_response(&response.body)?;
                let mut batch_ids = Vec::with_capacity(batches.len());
                let mut links = Vec::new();
                for batch in batches {
                    batch_ids.push(batch.id);
                    links.extend(batch.requests);
                }

                self.cursor.record_fetch_result(
                    batch_ids.clone(),
                    links.len(),
                    self.settings.debug_mode,
                );
                info!(
                    destination = %destination,
                    requested = *requested,
                    ids = batch_ids.len(),
                    links = links.len(),
                    remaining = self.cursor.remaining(),
                    "obtained links from frontier"
                );
                Ok(CompletionOutcome::Fetched { batch_ids, links })
            }
            Completion::Add { destination, links } => {
                let accepted = codec::decode_add_response(&response.body)?;
                info!(
                    destination = %destination,
                    sent = *links,
                    accepted,
                    "added links to frontier"
                );
                Ok(CompletionOutcome::Added {
                    sent: *links,
                    accepted,
                })
            }
            Completion::ScheduleJob => {
                let response = response.body_text();
                info!(response = %response.trim(), "scheduled follow-up job");
                Ok(CompletionOutcome::JobScheduled { response })
            }
        }
    }

    /// The transport gave up on an operation; nothing is applied.
    pub fn abandon(&mut self, completion: &Completion) {
        self.release(completion);
        if let Completion::Add { destination, links } = completion {
            warn!(
                destination = %destination,
                links = *links,
                "add operation abandoned; its links are no longer buffered"
            );
        }
    }

    fn release(&mut self, completion: &Completion) {
        match completion {
            Completion::Delete { .. } => self.delete_in_flight = false,
            Completion::Fetch { .. } => self.fetch_in_flight = false,
            Completion::Add { .. } | Completion::ScheduleJob => {}
        }
    }
}

fn validate(settings: &Settings) -> Result<()> {
    if settings.project_id.trim().is_empty() {
        return Err(FrontierError::MissingProjectId);
    }
    if settings.slot_buffer_size == 0 {
        return Err(FrontierError::InvalidCapacity);
    }
    if settings.batch_size == 0 {
        return Err(FrontierError::InvalidBatchSize);
    }
    if settings.links_to_fetch > 0 && settings.consume_from.is_none() {
        return Err(FrontierError::MissingReadDestination(
            settings.links_to_fetch,
        ));
    }
    if settings.start_new_job
        && settings
            .spider
            .as_deref()
            .map_or(true, |s| s.trim().is_empty())
    {
        return Err(FrontierError::MissingSpider);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn read_slot() -> Destination {
        Destination::new("test0", "test0")
    }

    fn settings(links_to_fetch: u64) -> Settings {
        Settings {
            links_to_fetch,
            consume_from: Some(read_slot()),
            project_id: "123".into(),
            auth: Some("key".into()),
            ..Settings::default()
        }
    }

    fn fetch_body(batches: &[(&str, usize)]) -> String {
        batches
            .iter()
            .map(|(id, n)| {
                let requests: Vec<_> = (0..*n)
                    .map(|i| json!([format!("http://{}/{}", id, i), null]))
                    .collect();
                json!({"id": id, "requests": requests}).to_string()
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn single(decision: IdleDecision) -> Operation {
        assert!(decision.keep_alive);
        assert_eq!(decision.operations.len(), 1);
        decision.operations.into_iter().next().unwrap()
    }

    fn ok(body: impl Into<Vec<u8>>) -> HttpResponse {
        HttpResponse::new(200, body)
    }

    #[test]
    fn test_fetch_requests_min_of_batch_and_remaining() {
        let mut frontier = Frontier::new(settings(150)).unwrap();
        let op = single(frontier.on_idle().unwrap());
        assert!(op.url.ends_with("/hcf/123/test0/s/test0/q?mincount=150"));

        let mut frontier = Frontier::new(Settings {
            batch_size: 25_000,
            ..settings(1_000_000)
        })
        .unwrap();
        let op = single(frontier.on_idle().unwrap());
        assert!(op.url.ends_with("mincount=10000"));
    }

    #[test]
    fn test_fetch_result_updates_cursor() {
        let mut frontier = Frontier::new(settings(100)).unwrap();
        let op = single(frontier.on_idle().unwrap());

        let outcome = frontier
            .complete(&op.completion, &ok(fetch_body(&[("a", 15), ("b", 25)])))
            .unwrap();
        match outcome {
            CompletionOutcome::Fetched { batch_ids, links } => {
                assert_eq!(batch_ids, vec!["a", "b"]);
                assert_eq!(links.len(), 40);
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert_eq!(frontier.cursor().remaining(), 60);
        assert_eq!(frontier.cursor().pending_ids().len(), 2);
    }

    #[test]
    fn test_delete_precedes_next_fetch() {
        let mut frontier = Frontier::new(settings(100)).unwrap();
        let fetch = single(frontier.on_idle().unwrap());
        frontier
            .complete(&fetch.completion, &ok(fetch_body(&[("a", 10)])))
            .unwrap();

        // Both a delete and another fetch are wanted; only the delete goes out.
        assert!(frontier.cursor().wants_delete());
        assert!(frontier.cursor().remaining() > 0);
        let delete = single(frontier.on_idle().unwrap());
        assert_eq!(delete.completion.category(), Category::Delete);
        assert!(delete.url.ends_with("/q/deleted"));
        assert_eq!(delete.body.as_deref(), Some(&b"\"a\""[..]));

        let outcome = frontier.complete(&delete.completion, &ok("")).unwrap();
        assert_eq!(outcome, CompletionOutcome::Deleted { ids: 1, links: 10 });

        let next = single(frontier.on_idle().unwrap());
        assert_eq!(next.completion.category(), Category::Fetch);
        assert!(next.url.ends_with("mincount=90"));
    }

    #[test]
    fn test_empty_fetch_ends_reading() {
        let mut frontier = Frontier::new(settings(5_000)).unwrap();
        let fetch = single(frontier.on_idle().unwrap());
        frontier.complete(&fetch.completion, &ok("")).unwrap();

        assert_eq!(frontier.cursor().remaining(), 0);
        let decision = frontier.on_idle().unwrap();
        assert!(decision.operations.is_empty());
        assert!(!decision.keep_alive);
    }

    #[test]
    fn test_debug_mode_never_deletes() {
        let mut frontier = Frontier::new(Settings {
            debug_mode: true,
            ..settings(5_000)
        })
        .unwrap();
        let fetch = single(frontier.on_idle().unwrap());
        frontier
            .complete(&fetch.completion, &ok(fetch_body(&[("a", 3)])))
            .unwrap();

        assert!(frontier.cursor().wants_delete());
        assert_eq!(frontier.cursor().remaining(), 0);
        let decision = frontier.on_idle().unwrap();
        assert!(decision.operations.is_empty());
        assert!(!decision.keep_alive);
    }

    #[test]
    fn test_flush_after_reads_settle() {
        let mut frontier = Frontier::new(settings(10)).unwrap();
        let out_a = Destination::new("out", "a");
        let out_b = Destination::new("out", "b");
        assert!(frontier
            .add_link(out_a.clone(), Link::new("http://1"))
            .unwrap()
            .is_none());
        assert!(frontier
            .add_link(out_b.clone(), Link::new("http://2"))
            .unwrap()
            .is_none());

        // Reading comes first even with links buffered.
        let fetch = single(frontier.on_idle().unwrap());
        assert_eq!(fetch.completion.category(), Category::Fetch);
        frontier.complete(&fetch.completion, &ok("")).unwrap();

        let decision = frontier.on_idle().unwrap();
        assert!(decision.keep_alive);
        assert_eq!(decision.operations.len(), 2);
        assert!(decision
            .operations
            .iter()
            .all(|op| op.completion.category() == Category::Flush));
        assert!(decision.operations[0].url.ends_with("/hcf/123/out/s/a"));
        assert!(decision.operations[1].url.ends_with("/hcf/123/out/s/b"));
        assert!(frontier.buffer().is_empty());

        let outcome = frontier
            .complete(
                &decision.operations[0].completion,
                &ok(r#"{"newcount": 1}"#),
            )
            .unwrap();
        assert_eq!(
            outcome,
            CompletionOutcome::Added {
                sent: 1,
                accepted: 1
            }
        );
    }

    #[test]
    fn test_full_slot_returns_add_operation() {
        let mut frontier = Frontier::new(Settings {
            slot_buffer_size: 2,
            ..settings(0)
        })
        .unwrap();
        let dest = Destination::new("out", "0");

        assert!(frontier
            .add_link(dest.clone(), Link::new("a"))
            .unwrap()
            .is_none());
        let op = frontier
            .add_link(dest.clone(), Link::new("b").with_priority(1))
            .unwrap()
            .expect("second link fills the slot");
        assert_eq!(
            op.completion,
            Completion::Add {
                destination: dest,
                links: 2
            }
        );
        assert!(frontier.buffer().is_empty());
    }

    #[test]
    fn test_follow_up_fires_once() {
        let mut frontier = Frontier::new(Settings {
            start_new_job: true,
            spider: Some("sample_spider".into()),
            ..settings(0)
        })
        .unwrap();

        let op = single(frontier.on_idle().unwrap());
        assert_eq!(op.completion, Completion::ScheduleJob);
        assert!(frontier.follow_up().is_triggered());

        for _ in 0..5 {
            let decision = frontier.on_idle().unwrap();
            assert!(decision.operations.is_empty());
            assert!(!decision.keep_alive);
        }

        let outcome = frontier
            .complete(&op.completion, &ok(r#"{"status": "ok", "jobid": "1/2/3"}"#))
            .unwrap();
        assert!(matches!(outcome, CompletionOutcome::JobScheduled { .. }));
    }

    #[test]
    fn test_rejected_delete_is_offered_again() {
        let mut frontier = Frontier::new(settings(100)).unwrap();
        let fetch = single(frontier.on_idle().unwrap());
        frontier
            .complete(&fetch.completion, &ok(fetch_body(&[("a", 2)])))
            .unwrap();

        let delete = single(frontier.on_idle().unwrap());
        let outcome = frontier
            .complete(&delete.completion, &HttpResponse::new(503, "busy"))
            .unwrap();
        assert_eq!(
            outcome,
            CompletionOutcome::Rejected {
                category: Category::Delete,
                status: 503
            }
        );
        assert!(frontier.cursor().wants_delete());

        let retry = single(frontier.on_idle().unwrap());
        assert_eq!(retry, delete);
    }

    #[test]
    fn test_in_flight_read_is_not_reissued() {
        let mut frontier = Frontier::new(settings(100)).unwrap();
        frontier
            .add_link(Destination::new("out", "0"), Link::new("x"))
            .unwrap();

        let fetch = single(frontier.on_idle().unwrap());
        assert!(frontier.has_outstanding());

        // Host signals idle again before the fetch completes: the chain moves
        // on to the buffered links instead of issuing a second fetch.
        let decision = frontier.on_idle().unwrap();
        assert_eq!(decision.operations.len(), 1);
        assert_eq!(
            decision.operations[0].completion.category(),
            Category::Flush
        );

        let decision = frontier.on_idle().unwrap();
        assert!(decision.operations.is_empty());
        assert!(decision.keep_alive);

        frontier.abandon(&fetch.completion);
        assert!(!frontier.has_outstanding());
        let again = single(frontier.on_idle().unwrap());
        assert_eq!(again, fetch);
    }

    #[test]
    fn test_follow_up_waits_for_outstanding_reads() {
        let mut frontier = Frontier::new(Settings {
            start_new_job: true,
            spider: Some("sample_spider".into()),
            ..settings(100)
        })
        .unwrap();

        let fetch = single(frontier.on_idle().unwrap());
        assert_eq!(fetch.completion.category(), Category::Fetch);

        let decision = frontier.on_idle().unwrap();
        assert!(decision.operations.is_empty());
        assert!(decision.keep_alive);
        assert!(!frontier.follow_up().is_triggered());

        // Reading resumes once the fetch lands, then the job is scheduled.
        frontier
            .complete(&fetch.completion, &ok(fetch_body(&[("a", 100)])))
            .unwrap();
        let delete = single(frontier.on_idle().unwrap());
        assert_eq!(delete.completion.category(), Category::Delete);
        assert!(frontier.on_idle().unwrap().operations.is_empty());
        assert!(!frontier.follow_up().is_triggered());

        frontier.complete(&delete.completion, &ok("")).unwrap();
        let schedule = single(frontier.on_idle().unwrap());
        assert_eq!(schedule.completion, Completion::ScheduleJob);
    }

    #[test]
    fn test_malformed_fetch_leaves_state_untouched() {
        let mut frontier = Frontier::new(settings(100)).unwrap();
        let fetch = single(frontier.on_idle().unwrap());

        let err = frontier
            .complete(&fetch.completion, &ok("{not json"))
            .unwrap_err();
        assert!(matches!(err, FrontierError::Core(_)));
        assert_eq!(frontier.cursor().remaining(), 100);
        assert!(!frontier.cursor().wants_delete());
        assert!(!frontier.has_outstanding());
    }

    #[test]
    fn test_settings_validation() {
        let missing_project = Settings {
            project_id: String::new(),
            ..settings(0)
        };
        assert!(matches!(
            Frontier::new(missing_project),
            Err(FrontierError::MissingProjectId)
        ));

        let missing_source = Settings {
            consume_from: None,
            ..settings(10)
        };
        assert!(matches!(
            Frontier::new(missing_source),
            Err(FrontierError::MissingReadDestination(10))
        ));

        let missing_spider = Settings {
            start_new_job: true,
            ..settings(0)
        };
        assert!(matches!(
            Frontier::new(missing_spider),
            Err(FrontierError::MissingSpider)
        ));

        let zero_capacity = Settings {
            slot_buffer_size: 0,
            ..settings(0)
        };
        assert!(matches!(
            Frontier::new(zero_capacity),
            Err(FrontierError::InvalidCapacity)
        ));

        let zero_batch = Settings {
            batch_size: 0,
            ..settings(0)
        };
        assert!(matches!(
            Frontier::new(zero_batch),
            Err(FrontierError::InvalidBatchSize)
        ));
    }
}
