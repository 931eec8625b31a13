//! Fan-out of one logical operation to every physical partition.
//!
//! # Execution Model
//!
//! Each partition operation runs on its own tokio task. The calling task owns
//! the join handles and observes completions in arrival order, so the
//! accumulating [`ReductionState`] is only ever touched by one task. The
//! logical result is produced once, after the last partition completes, even
//! when the first completion is already fatal. Dropping the caller detaches
//! the partition tasks; they run to completion on their own.
//!
//! # Reduction Policies
//!
//! | Policy              | Tolerated kind       | Logical failure                            |
//! |---------------------|----------------------|--------------------------------------------|
//! | `AllMustSucceed`    | none                 | error of the lowest failing index          |
//! | `ToleratedNotFound` | `NotFound`           | first observed non-`NotFound` error        |
//! | `FailOnlyIfAllFail` | `PreconditionFailed` | first other error, or all partitions 412   |
//! | `ConflictTolerant`  | `Conflict`           | first other error, or all partitions 409   |
//!
//! The reductions are pure: [`reduce`] applies a policy to a sequence of
//! outcomes without any concurrency, and the coordinator feeds the same
//! [`ReductionState`] as completions arrive.

use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::ops::Range;
use std::str::FromStr;
use std::time::Instant;

use futures::StreamExt;
use futures::stream::FuturesUnordered;
use tracing::{debug, error, warn};

use super::metrics;
use super::policy::AdminOperation;
use crate::error::{AdminError, AdminResult, ErrorKind};
use crate::topic_name::TopicName;

/// How partition failures combine into one logical outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReductionPolicy {
    AllMustSucceed,
    ToleratedNotFound,
    FailOnlyIfAllFail,
    ConflictTolerant,
}

impl ReductionPolicy {
    /// The error kind this policy absorbs, if any.
    pub fn tolerated_kind(&self) -> Option<ErrorKind> {
        match self {
            ReductionPolicy::AllMustSucceed => None,
            ReductionPolicy::ToleratedNotFound => Some(ErrorKind::NotFound),
            ReductionPolicy::FailOnlyIfAllFail => Some(ErrorKind::PreconditionFailed),
            ReductionPolicy::ConflictTolerant => Some(ErrorKind::Conflict),
        }
    }

    /// Whether a tolerated failure on every partition fails the request.
    fn fails_when_all_tolerated(&self) -> bool {
        matches!(
            self,
            ReductionPolicy::FailOnlyIfAllFail | ReductionPolicy::ConflictTolerant
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReductionPolicy::AllMustSucceed => "all_must_succeed",
            ReductionPolicy::ToleratedNotFound => "tolerated_not_found",
            ReductionPolicy::FailOnlyIfAllFail => "fail_only_if_all_fail",
            ReductionPolicy::ConflictTolerant => "conflict_tolerant",
        }
    }
}

impl fmt::Display for ReductionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReductionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "all_must_succeed" => Ok(ReductionPolicy::AllMustSucceed),
            "tolerated_not_found" => Ok(ReductionPolicy::ToleratedNotFound),
            "fail_only_if_all_fail" => Ok(ReductionPolicy::FailOnlyIfAllFail),
            "conflict_tolerant" => Ok(ReductionPolicy::ConflictTolerant),
            _ => Err(format!(
                "Unknown reduction policy '{s}'. Valid values: all_must_succeed, \
                 tolerated_not_found, fail_only_if_all_fail, conflict_tolerant"
            )),
        }
    }
}

/// Result of one physical operation.
#[derive(Debug, Clone, PartialEq)]
pub struct PartitionOutcome<T> {
    pub partition_index: u32,
    pub result: AdminResult<T>,
}

impl<T> PartitionOutcome<T> {
    pub fn ok(partition_index: u32, value: T) -> Self {
        Self {
            partition_index,
            result: Ok(value),
        }
    }

    pub fn err(partition_index: u32, error: AdminError) -> Self {
        Self {
            partition_index,
            result: Err(error),
        }
    }
}

/// Reduction of every partition outcome of one request.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateOutcome<T> {
    pub policy: ReductionPolicy,
    /// Number of partition outcomes observed.
    pub partitions: u32,
    /// Successful values keyed by partition index.
    pub values: BTreeMap<u32, T>,
    /// Failures the policy absorbed, keyed by partition index.
    pub tolerated: BTreeMap<u32, AdminError>,
    /// The logical error, when the request failed.
    pub error: Option<AdminError>,
}

impl<T> AggregateOutcome<T> {
    #[inline]
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// Successful values keyed by partition index, or the logical error.
    pub fn into_result(self) -> AdminResult<BTreeMap<u32, T>> {
        match self.error {
            Some(e) => Err(e),
            None => Ok(self.values),
        }
    }

    /// Discard values and keep only success or the logical error.
    pub fn into_unit(self) -> AdminResult<()> {
        self.into_result().map(|_| ())
    }
}

/// Accumulator fed one outcome at a time.
///
/// Holds a completion counter and the first-fatal slot. For
/// `AllMustSucceed` the slot keeps the lowest failing index instead of the
/// first observed.
#[derive(Debug)]
pub struct ReductionState<T> {
    policy: ReductionPolicy,
    expected: u32,
    completed: u32,
    values: BTreeMap<u32, T>,
    tolerated: BTreeMap<u32, AdminError>,
    fatal: Option<(u32, AdminError)>,
}

impl<T> ReductionState<T> {
    pub fn new(policy: ReductionPolicy, expected: u32) -> Self {
        Self {
            policy,
            expected,
            completed: 0,
            values: BTreeMap::new(),
            tolerated: BTreeMap::new(),
            fatal: None,
        }
    }

    #[inline]
    pub fn is_complete(&self) -> bool {
        self.completed >= self.expected
    }

    /// Whether the outcome so far is already a logical failure.
    pub fn has_fatal(&self) -> bool {
        self.fatal.is_some()
    }

    /// Fold one outcome in. Returns `true` if the failure was tolerated.
    pub fn observe(&mut self, outcome: PartitionOutcome<T>) -> bool {
        self.completed += 1;
        let index = outcome.partition_index;
        match outcome.result {
            Ok(value) => {
                self.values.insert(index, value);
                false
            }
            Err(e) if Some(e.kind()) == self.policy.tolerated_kind() => {
                self.tolerated.insert(index, e);
                true
            }
            Err(e) => {
                let replace = match &self.fatal {
                    None => true,
                    Some((first, _)) => {
                        self.policy == ReductionPolicy::AllMustSucceed && index < *first
                    }
                };
                if replace {
                    self.fatal = Some((index, e));
                }
                false
            }
        }
    }

    /// Produce the logical outcome.
    pub fn finish(self) -> AggregateOutcome<T> {
        let all_tolerated = self.completed > 0 && self.tolerated.len() as u32 == self.completed;
        let error = match self.fatal {
            Some((_, e)) => Some(e),
            None if all_tolerated && self.policy.fails_when_all_tolerated() => {
                self.tolerated.values().next().cloned()
            }
            None => None,
        };
        AggregateOutcome {
            policy: self.policy,
            partitions: self.completed,
            values: self.values,
            tolerated: self.tolerated,
            error,
        }
    }
}

/// Apply `policy` to outcomes listed in observation order.
pub fn reduce<T>(
    policy: ReductionPolicy,
    outcomes: impl IntoIterator<Item = PartitionOutcome<T>>,
) -> AggregateOutcome<T> {
    let outcomes: Vec<_> = outcomes.into_iter().collect();
    let mut state = ReductionState::new(policy, outcomes.len() as u32);
    for outcome in outcomes {
        state.observe(outcome);
    }
    state.finish()
}

/// Dispatches per-partition operations and reduces their outcomes.
#[derive(Debug, Clone, Copy, Default)]
pub struct FanOutCoordinator;

impl FanOutCoordinator {
    pub fn new() -> Self {
        Self
    }

    /// Spawn `op` for every index and yield `(index, result)` as tasks finish.
    fn spawn_all<T, F, Fut>(
        topic: &TopicName,
        indices: Range<u32>,
        op: F,
    ) -> FuturesUnordered<impl Future<Output = PartitionOutcome<T>>>
    where
        T: Send + 'static,
        F: Fn(TopicName) -> Fut,
        Fut: Future<Output = AdminResult<T>> + Send + 'static,
    {
        indices
            .map(|index| {
                let handle = tokio::spawn(op(topic.partition(index)));
                async move {
                    let result = match handle.await {
                        Ok(result) => result,
                        Err(join_err) => Err(AdminError::from(join_err)),
                    };
                    PartitionOutcome {
                        partition_index: index,
                        result,
                    }
                }
            })
            .collect()
    }

    /// Run `op` on partitions `indices` and return raw outcomes in arrival order.
    pub async fn dispatch<T, F, Fut>(
        &self,
        topic: &TopicName,
        indices: Range<u32>,
        op: F,
    ) -> Vec<PartitionOutcome<T>>
    where
        T: Send + 'static,
        F: Fn(TopicName) -> Fut,
        Fut: Future<Output = AdminResult<T>> + Send + 'static,
    {
        let mut pending = Self::spawn_all(topic, indices.clone(), op);
        let mut outcomes = Vec::with_capacity(indices.len());
        while let Some(outcome) = pending.next().await {
            outcomes.push(outcome);
        }
        outcomes
    }

    /// Run `op` on partitions `indices` and reduce under `policy`.
    pub async fn fan_out<T, F, Fut>(
        &self,
        operation: AdminOperation,
        policy: ReductionPolicy,
        topic: &TopicName,
        indices: Range<u32>,
        op: F,
    ) -> AggregateOutcome<T>
    where
        T: Send + 'static,
        F: Fn(TopicName) -> Fut,
        Fut: Future<Output = AdminResult<T>> + Send + 'static,
    {
        let start = Instant::now();
        let expected = indices.len() as u32;
        let op_label = operation.as_str();

        debug!(
            operation = op_label,
            topic = %topic,
            partitions = expected,
            policy = %policy,
            "Dispatching fan-out"
        );

        let mut pending = Self::spawn_all(topic, indices, op);
        let mut state = ReductionState::new(policy, expected);

        while let Some(outcome) = pending.next().await {
            let index = outcome.partition_index;
            let failure = outcome.result.as_ref().err().cloned();
            let tolerated = state.observe(outcome);

            if let Some(e) = failure {
                metrics::record_partition_failure(
                    op_label,
                    e.kind().as_metric_label(),
                    tolerated,
                );
                if tolerated {
                    debug!(
                        operation = op_label,
                        topic = %topic,
                        partition = index,
                        error = %e,
                        "Tolerated partition failure"
                    );
                } else {
                    error!(
                        operation = op_label,
                        topic = %topic,
                        partition = index,
                        error = %e,
                        "Partition operation failed"
                    );
                }
            }
        }

        let aggregate = state.finish();

        // Missing partitions are expected under ToleratedNotFound.
        if aggregate.is_success()
            && !aggregate.tolerated.is_empty()
            && policy != ReductionPolicy::ToleratedNotFound
        {
            warn!(
                operation = op_label,
                topic = %topic,
                failed = aggregate.tolerated.len(),
                partitions = aggregate.partitions,
                "Partial errors on partitioned topic"
            );
        }

        let outcome = if aggregate.is_success() {
            "success"
        } else {
            "failure"
        };
        metrics::record_fanout(op_label, outcome, start.elapsed().as_secs_f64());

        aggregate
    }
}
