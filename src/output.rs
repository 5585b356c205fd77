//! Delivery of finalized records to an external store, and progress
//! reporting for long parses.
//!
//! Records are flattened into single-level key/value maps (nested objects
//! become dotted keys) and handed to a [`ResultSink`] in fixed-size batches.

use crate::*;
use serde::Serialize;
use std::collections::BTreeMap;

pub type FlatRecord = serde_json::Map<String, serde_json::Value>;

fn flatten_into(prefix: &str, value: serde_json::Value, out: &mut FlatRecord) {
    match value {
        serde_json::Value::Object(map) => {
            for (key, nested) in map {
                let key = if prefix.is_empty() {
                    key
                } else {
                    format!("{}.{}", prefix, key)
                };
                flatten_into(&key, nested, out);
            }
        }
        other => {
            out.insert(prefix.to_string(), other);
        }
    }
}

pub fn flatten_record(record: &dyn erased_serde::Serialize) -> FragActorResult<FlatRecord> {
    let value = serde_json::to_value(record)?;
    let mut out = FlatRecord::new();
    match value {
        serde_json::Value::Object(_) => flatten_into("", value, &mut out),
        other => {
            out.insert("value".to_string(), other);
        }
    }
    Ok(out)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Collection {
    Match,
    Players,
    Rounds,
    Gunfights,
    Damages,
    Grenades,
    PlayerRounds,
    PlayerMatches,
}

impl Collection {
    pub fn name(&self) -> &'static str {
        match self {
            Collection::Match => "match",
            Collection::Players => "players",
            Collection::Rounds => "rounds",
            Collection::Gunfights => "gunfights",
            Collection::Damages => "damages",
            Collection::Grenades => "grenades",
            Collection::PlayerRounds => "player_rounds",
            Collection::PlayerMatches => "player_matches",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordBatch {
    pub collection: Collection,
    pub batch_index: usize,
    pub is_last: bool,
    pub records: Vec<FlatRecord>,
}

/// Splits `records` into batches of at most `batch_size`. An empty
/// collection still yields one empty final batch.
pub fn build_batches(
    collection: Collection,
    records: &[&dyn erased_serde::Serialize],
    batch_size: usize,
) -> FragActorResult<Vec<RecordBatch>> {
    let batch_size = batch_size.max(1);
    if records.is_empty() {
        return Ok(vec![RecordBatch {
            collection,
            batch_index: 0,
            is_last: true,
            records: Vec::new(),
        }]);
    }
    let batch_count = records.len().div_ceil(batch_size);
    records
        .chunks(batch_size)
        .enumerate()
        .map(|(batch_index, chunk)| -> FragActorResult<RecordBatch> {
            Ok(RecordBatch {
                collection,
                batch_index,
                is_last: batch_index + 1 == batch_count,
                records: chunk
                    .iter()
                    .map(|record| flatten_record(*record))
                    .collect::<FragActorResult<Vec<_>>>()?,
            })
        })
        .collect()
}

fn erase<T: Serialize>(records: &[T]) -> Vec<&dyn erased_serde::Serialize> {
    records
        .iter()
        .map(|record| record as &dyn erased_serde::Serialize)
        .collect()
}

impl MatchResult {
    /// Every collection of the result, in delivery order.
    pub fn collections(&self) -> Vec<(Collection, Vec<&dyn erased_serde::Serialize>)> {
        vec![
            (
                Collection::Match,
                vec![&self.match_record as &dyn erased_serde::Serialize],
            ),
            (Collection::Players, erase(&self.players)),
            (Collection::Rounds, erase(&self.rounds)),
            (Collection::Gunfights, erase(&self.gunfights)),
            (Collection::Damages, erase(&self.damages)),
            (Collection::Grenades, erase(&self.grenades)),
            (Collection::PlayerRounds, erase(&self.player_rounds)),
            (Collection::PlayerMatches, erase(&self.player_matches)),
        ]
    }
}

/// Destination for record batches.
pub trait ResultSink {
    fn deliver(&mut self, batch: &RecordBatch) -> Result<(), String>;
}

impl<G> ResultSink for G
where
    G: FnMut(&RecordBatch) -> Result<(), String>,
{
    fn deliver(&mut self, batch: &RecordBatch) -> Result<(), String> {
        self(batch)
    }
}

/// Collects batches in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub batches: Vec<RecordBatch>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self, collection: Collection) -> impl Iterator<Item = &FlatRecord> {
        self.batches
            .iter()
            .filter(move |batch| batch.collection == collection)
            .flat_map(|batch| batch.records.iter())
    }
}

impl ResultSink for MemorySink {
    fn deliver(&mut self, batch: &RecordBatch) -> Result<(), String> {
        self.batches.push(batch.clone());
        Ok(())
    }
}

fn deliver_with_retry<S: ResultSink + ?Sized>(
    sink: &mut S,
    batch: &RecordBatch,
    retry: &RetryPolicy,
) -> FragActorResult<()> {
    let mut attempt = 0;
    loop {
        attempt += 1;
        match sink.deliver(batch) {
            Ok(()) => return Ok(()),
            Err(reason) if attempt >= retry.attempts => {
                return FragActorError::new_result(FragActorErrorVariant::DeliveryFailed {
                    collection: batch.collection.name().to_string(),
                    batch_index: batch.batch_index,
                    attempts: attempt,
                    reason,
                });
            }
            Err(reason) => {
                log::warn!(
                    "Delivery of {} batch {} failed (attempt {}/{}): {}",
                    batch.collection.name(),
                    batch.batch_index,
                    attempt,
                    retry.attempts,
                    reason
                );
                std::thread::sleep(retry.delay());
            }
        }
    }
}

/// Delivers every collection of `result` in batches, retrying each batch
/// according to `retry`. Returns the number of batches delivered.
pub fn deliver_match_result<S: ResultSink + ?Sized>(
    result: &MatchResult,
    sink: &mut S,
    batch_size: usize,
    retry: &RetryPolicy,
) -> FragActorResult<usize> {
    let mut delivered = 0;
    for (collection, records) in result.collections() {
        for batch in build_batches(collection, &records, batch_size)? {
            deliver_with_retry(sink, &batch, retry)?;
            delivered += 1;
        }
        log::debug!("Delivered {} {}", records.len(), collection.name());
    }
    Ok(delivered)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ProcessingStatus {
    Started,
    Processing,
    Finalizing,
    Completed,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressUpdate {
    pub status: ProcessingStatus,
    /// Percent complete, 0 to 100.
    pub progress: u8,
    pub step: u32,
    pub total_steps: u32,
    pub context: BTreeMap<String, String>,
}

pub trait ProgressReporter {
    fn report(&mut self, update: &ProgressUpdate);
}

impl<G> ProgressReporter for G
where
    G: FnMut(&ProgressUpdate),
{
    fn report(&mut self, update: &ProgressUpdate) {
        self(update)
    }
}

/// Forwards updates to a reporter until a terminal failure, after which
/// every further update is refused.
pub struct ProgressTracker {
    reporter: Box<dyn ProgressReporter>,
    halted: bool,
}

impl ProgressTracker {
    pub fn new(reporter: Box<dyn ProgressReporter>) -> Self {
        Self {
            reporter,
            halted: false,
        }
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    pub fn update(&mut self, mut update: ProgressUpdate) -> FragActorResult<()> {
        if self.halted {
            return FragActorError::new_result(FragActorErrorVariant::ProgressHalted);
        }
        update.progress = update.progress.min(100);
        self.reporter.report(&update);
        Ok(())
    }

    /// Reports a fatal error as the terminal update. Non-fatal errors are
    /// only logged.
    pub fn fail(&mut self, error: &FragActorError) {
        if !error.is_fatal() {
            log::warn!("{}", error);
            return;
        }
        if self.halted {
            return;
        }
        let mut context = BTreeMap::new();
        context.insert("error".to_string(), error.to_string());
        context.insert("severity".to_string(), format!("{:?}", error.severity()));
        self.reporter.report(&ProgressUpdate {
            status: ProcessingStatus::Failed,
            progress: 0,
            step: 0,
            total_steps: 0,
            context,
        });
        self.halted = true;
    }
}
