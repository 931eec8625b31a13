//! Topic statistics and their partitioned aggregation.
//!
//! Aggregation is best-effort: partitions whose stats request failed are left
//! out of the totals, never failing the read.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::fanout::PartitionOutcome;
use crate::metadata::PartitionedTopicMetadata;
use crate::topic_name::TopicName;

/// Per-producer counters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublisherStats {
    pub msg_rate_in: f64,
    pub msg_throughput_in: f64,
    pub average_msg_size: f64,
}

impl PublisherStats {
    pub fn add(&mut self, other: &PublisherStats) {
        self.msg_rate_in += other.msg_rate_in;
        self.msg_throughput_in += other.msg_throughput_in;
        self.average_msg_size = if self.msg_rate_in > 0.0 {
            self.msg_throughput_in / self.msg_rate_in
        } else {
            0.0
        };
    }
}

/// Per-subscription counters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionStats {
    pub msg_rate_out: f64,
    pub msg_throughput_out: f64,
    pub msg_rate_redeliver: f64,
    pub msg_rate_expired: f64,
    pub msg_backlog: u64,
    pub unacked_messages: u64,
    pub consumers: u32,
}

impl SubscriptionStats {
    pub fn add(&mut self, other: &SubscriptionStats) {
        self.msg_rate_out += other.msg_rate_out;
        self.msg_throughput_out += other.msg_throughput_out;
        self.msg_rate_redeliver += other.msg_rate_redeliver;
        self.msg_rate_expired += other.msg_rate_expired;
        self.msg_backlog += other.msg_backlog;
        self.unacked_messages += other.unacked_messages;
        self.consumers += other.consumers;
    }
}

/// Per-remote-cluster replication counters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplicatorStats {
    pub msg_rate_in: f64,
    pub msg_throughput_in: f64,
    pub msg_rate_out: f64,
    pub msg_throughput_out: f64,
    pub replication_backlog: u64,
    pub connected: bool,
}

impl ReplicatorStats {
    /// Sum counters; the merged replicator is connected only if both are.
    pub fn add(&mut self, other: &ReplicatorStats) {
        self.msg_rate_in += other.msg_rate_in;
        self.msg_throughput_in += other.msg_throughput_in;
        self.msg_rate_out += other.msg_rate_out;
        self.msg_throughput_out += other.msg_throughput_out;
        self.replication_backlog += other.replication_backlog;
        self.connected &= other.connected;
    }
}

/// Stats of one topic or partition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicStats {
    pub msg_rate_in: f64,
    pub msg_throughput_in: f64,
    pub msg_rate_out: f64,
    pub msg_throughput_out: f64,
    pub average_msg_size: f64,
    pub msg_in_counter: u64,
    pub bytes_in_counter: u64,
    pub msg_out_counter: u64,
    pub bytes_out_counter: u64,
    pub storage_size: u64,
    pub backlog_size: u64,
    /// Publishers keyed by producer name.
    pub publishers: BTreeMap<String, PublisherStats>,
    pub subscriptions: BTreeMap<String, SubscriptionStats>,
    /// Replicators keyed by remote cluster.
    pub replication: BTreeMap<String, ReplicatorStats>,
    #[serde(skip)]
    merged: u32,
}

impl TopicStats {
    /// Merge another partition's stats into this one.
    ///
    /// Counters are summed, keyed maps merged by key, and the average message
    /// size is the mean over merged partitions.
    pub fn add(&mut self, other: &TopicStats) {
        self.merged += 1;
        let n = self.merged as f64;
        self.average_msg_size = (self.average_msg_size * (n - 1.0) + other.average_msg_size) / n;

        self.msg_rate_in += other.msg_rate_in;
        self.msg_throughput_in += other.msg_throughput_in;
        self.msg_rate_out += other.msg_rate_out;
        self.msg_throughput_out += other.msg_throughput_out;
        self.msg_in_counter += other.msg_in_counter;
        self.bytes_in_counter += other.bytes_in_counter;
        self.msg_out_counter += other.msg_out_counter;
        self.bytes_out_counter += other.bytes_out_counter;
        self.storage_size += other.storage_size;
        self.backlog_size += other.backlog_size;

        for (name, p) in &other.publishers {
            self.publishers.entry(name.clone()).or_default().add(p);
        }
        for (name, s) in &other.subscriptions {
            self.subscriptions.entry(name.clone()).or_default().add(s);
        }
        for (cluster, r) in &other.replication {
            self.replication
                .entry(cluster.clone())
                .or_insert_with(|| ReplicatorStats {
                    connected: true,
                    ..Default::default()
                })
                .add(r);
        }
    }

    /// Total backlog across subscriptions.
    pub fn subscription_backlog(&self) -> u64 {
        self.subscriptions.values().map(|s| s.msg_backlog).sum()
    }
}

/// Aggregate stats of a partitioned topic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartitionedTopicStats {
    pub metadata: PartitionedTopicMetadata,
    #[serde(flatten)]
    pub aggregate: TopicStats,
    /// Per-partition stats keyed by physical name; empty unless requested.
    pub partitions: BTreeMap<String, TopicStats>,
}

impl PartitionedTopicStats {
    pub fn new(metadata: PartitionedTopicMetadata) -> Self {
        Self {
            metadata,
            ..Default::default()
        }
    }

    /// Fold partition outcomes in; failed partitions are skipped.
    ///
    /// Returns the number of partitions that contributed.
    pub fn aggregate(
        &mut self,
        topic: &TopicName,
        outcomes: impl IntoIterator<Item = PartitionOutcome<TopicStats>>,
        per_partition: bool,
    ) -> usize {
        let mut ok: Vec<(u32, TopicStats)> = outcomes
            .into_iter()
            .filter_map(|o| o.result.ok().map(|s| (o.partition_index, s)))
            .collect();
        // Merge order must not depend on completion order.
        ok.sort_by_key(|(i, _)| *i);

        for (index, stats) in &ok {
            self.aggregate.add(stats);
            if per_partition {
                self.partitions
                    .insert(topic.partition(*index).to_string(), stats.clone());
            }
        }
        ok.len()
    }
}

/// Cursor view inside internal stats.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CursorInternalStats {
    pub mark_delete_position: String,
    pub read_position: String,
    pub messages_consumed_counter: u64,
}

/// Storage-level view of one partition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicInternalStats {
    pub entries_added_counter: u64,
    pub number_of_entries: u64,
    pub total_size: u64,
    pub current_ledger_entries: u64,
    pub current_ledger_size: u64,
    pub last_confirmed_entry: String,
    pub cursors: BTreeMap<String, CursorInternalStats>,
}

/// Internal stats of every reachable partition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartitionedTopicInternalStats {
    pub metadata: PartitionedTopicMetadata,
    pub partitions: BTreeMap<String, TopicInternalStats>,
}

impl PartitionedTopicInternalStats {
    pub fn new(metadata: PartitionedTopicMetadata) -> Self {
        Self {
            metadata,
            partitions: BTreeMap::new(),
        }
    }

    /// Keep successful partitions keyed by physical name.
    pub fn collect(
        &mut self,
        topic: &TopicName,
        outcomes: impl IntoIterator<Item = PartitionOutcome<TopicInternalStats>>,
    ) {
        for outcome in outcomes {
            if let Ok(stats) = outcome.result {
                self.partitions
                    .insert(topic.partition(outcome.partition_index).to_string(), stats);
            }
        }
    }
}
