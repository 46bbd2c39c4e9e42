//! Durable event log on SQLite.
//!
//! Each topic is split into a fixed number of partitions. A message goes to
//! the partition chosen by hashing its key, and gets the next offset in that
//! partition. Consumer groups track one `next_offset` per partition; a
//! message is redelivered until its offset is committed.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use tracing::{debug, trace};

use super::database::connection::{run_blocking, DbPool};
use super::database::model::{BusMessageRow, BusOffsetRow, NewBusMessageRow};
use super::database::schema::{bus_messages, bus_offsets};
use crate::error::{Error, Result};
use crate::port::outbound::{EventConsumer, EventPublisher, Message};

const FNV_OFFSET_BASIS: u32 = 0x811c_9dc5;
const FNV_PRIME: u32 = 0x0100_0193;

/// Stable partition for `key`: FNV-1a modulo `partitions`.
#[must_use]
pub fn partition_for(key: &str, partitions: u32) -> i32 {
    let hash = key.bytes().fold(FNV_OFFSET_BASIS, |hash, byte| {
        (hash ^ u32::from(byte)).wrapping_mul(FNV_PRIME)
    });
    // Partition counts are capped well below i32::MAX by configuration.
    (hash % partitions.max(1)) as i32
}

fn to_message(row: BusMessageRow) -> Message {
    Message {
        topic: row.topic,
        partition: row.partition_id,
        offset: row.msg_offset,
        key: row.msg_key,
        payload: row.payload,
    }
}

/// Publisher side of the event log.
#[derive(Clone)]
pub struct SqliteEventLog {
    pool: DbPool,
    partitions: u32,
}

impl SqliteEventLog {
    /// Create a log that spreads each topic over `partitions` partitions.
    #[must_use]
    pub fn new(pool: DbPool, partitions: u32) -> Self {
        Self {
            pool,
            partitions: partitions.max(1),
        }
    }

    /// All messages on `topic`, in partition then offset order.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub async fn messages(&self, topic: &str) -> Result<Vec<Message>> {
        let topic = topic.to_string();
        run_blocking(&self.pool, move |conn| {
            let rows: Vec<BusMessageRow> = bus_messages::table
                .filter(bus_messages::topic.eq(&topic))
                .order((bus_messages::partition_id.asc(), bus_messages::msg_offset.asc()))
                .select(BusMessageRow::as_select())
                .load(conn)?;
            Ok(rows.into_iter().map(to_message).collect())
        })
        .await
    }

    /// Messages on `topic` that `group` has not committed yet.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub async fn lag(&self, group: &str, topic: &str) -> Result<i64> {
        let group = group.to_string();
        let topic = topic.to_string();
        run_blocking(&self.pool, move |conn| {
            let offsets: Vec<BusOffsetRow> = bus_offsets::table
                .filter(bus_offsets::group_id.eq(&group))
                .filter(bus_offsets::topic.eq(&topic))
                .select(BusOffsetRow::as_select())
                .load(conn)?;
            let total: i64 = bus_messages::table
                .filter(bus_messages::topic.eq(&topic))
                .count()
                .get_result(conn)?;
            let consumed: i64 = offsets.iter().map(|o| o.next_offset).sum();
            Ok((total - consumed).max(0))
        })
        .await
    }
}

#[async_trait]
impl EventPublisher for SqliteEventLog {
    async fn publish(&self, topic: &str, key: &str, payload: &str) -> Result<()> {
        let partition = partition_for(key, self.partitions);
        let row_topic = topic.to_string();
        let row_key = key.to_string();
        let row_payload = payload.to_string();

        let offset = run_blocking(&self.pool, move |conn| {
            conn.immediate_transaction::<_, Error, _>(|conn| {
                let last: Option<i64> = bus_messages::table
                    .filter(bus_messages::topic.eq(&row_topic))
                    .filter(bus_messages::partition_id.eq(partition))
                    .select(diesel::dsl::max(bus_messages::msg_offset))
                    .first(conn)?;
                let offset = last.map_or(0, |o| o + 1);
                diesel::insert_into(bus_messages::table)
                    .values(&NewBusMessageRow {
                        topic: row_topic,
                        partition_id: partition,
                        msg_offset: offset,
                        msg_key: row_key,
                        payload: row_payload,
                        created_at: Utc::now().to_rfc3339(),
                    })
                    .execute(conn)?;
                Ok(offset)
            })
        })
        .await?;

        debug!(topic, key, partition, offset, "Published message");
        Ok(())
    }
}

/// Consumer-group reader for one topic.
///
/// Reads the assigned partitions round-robin, one message at a time.
pub struct SqliteConsumer {
    pool: DbPool,
    group: String,
    topic: String,
    partitions: Vec<i32>,
    cursor: AtomicUsize,
}

impl SqliteConsumer {
    /// Consume every partition of `topic`.
    #[must_use]
    pub fn new(
        pool: DbPool,
        group: impl Into<String>,
        topic: impl Into<String>,
        partitions: u32,
    ) -> Self {
        let all = (0..partitions.max(1)).map(|p| p as i32).collect();
        Self::assigned(pool, group, topic, all)
    }

    /// Consume only the listed partitions.
    #[must_use]
    pub fn assigned(
        pool: DbPool,
        group: impl Into<String>,
        topic: impl Into<String>,
        partitions: Vec<i32>,
    ) -> Self {
        Self {
            pool,
            group: group.into(),
            topic: topic.into(),
            partitions,
            cursor: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl EventConsumer for SqliteConsumer {
    async fn fetch(&self) -> Result<Option<Message>> {
        if self.partitions.is_empty() {
            return Ok(None);
        }
        let start = self.cursor.load(Ordering::Relaxed) % self.partitions.len();
        let order: Vec<i32> = self
            .partitions
            .iter()
            .cycle()
            .skip(start)
            .take(self.partitions.len())
            .copied()
            .collect();
        let group = self.group.clone();
        let topic = self.topic.clone();

        let found = run_blocking(&self.pool, move |conn| {
            for partition in order {
                let next: Option<i64> = bus_offsets::table
                    .find((&group, &topic, partition))
                    .select(bus_offsets::next_offset)
                    .first(conn)
                    .optional()?;
                let row: Option<BusMessageRow> = bus_messages::table
                    .filter(bus_messages::topic.eq(&topic))
                    .filter(bus_messages::partition_id.eq(partition))
                    .filter(bus_messages::msg_offset.ge(next.unwrap_or(0)))
                    .order(bus_messages::msg_offset.asc())
                    .select(BusMessageRow::as_select())
                    .first(conn)
                    .optional()?;
                if let Some(row) = row {
                    return Ok(Some(to_message(row)));
                }
            }
            Ok(None)
        })
        .await?;

        if let Some(message) = &found {
            if let Some(idx) = self.partitions.iter().position(|p| *p == message.partition) {
                self.cursor.store(idx + 1, Ordering::Relaxed);
            }
            trace!(
                topic = %message.topic,
                partition = message.partition,
                offset = message.offset,
                "Fetched message"
            );
        }
        Ok(found)
    }

    async fn commit(&self, message: &Message) -> Result<()> {
        let group = self.group.clone();
        let topic = message.topic.clone();
        let partition = message.partition;
        let next_offset = message.offset + 1;

        run_blocking(&self.pool, move |conn| {
            conn.immediate_transaction::<_, Error, _>(|conn| {
                let current: Option<i64> = bus_offsets::table
                    .find((&group, &topic, partition))
                    .select(bus_offsets::next_offset)
                    .first(conn)
                    .optional()?;
                let now = Utc::now().to_rfc3339();
                match current {
                    Some(existing) if existing >= next_offset => {}
                    Some(_) => {
                        diesel::update(bus_offsets::table.find((&group, &topic, partition)))
                            .set((
                                bus_offsets::next_offset.eq(next_offset),
                                bus_offsets::updated_at.eq(now),
                            ))
                            .execute(conn)?;
                    }
                    None => {
                        diesel::insert_into(bus_offsets::table)
                            .values(&BusOffsetRow {
                                group_id: group,
                                topic,
                                partition_id: partition,
                                next_offset,
                                updated_at: now,
                            })
                            .execute(conn)?;
                    }
                }
                Ok(())
            })
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::db::TempDb;

    #[test]
    fn partition_is_stable_and_in_range() {
        let p = partition_for("bet-123", 8);
        assert_eq!(p, partition_for("bet-123", 8));
        assert!((0..8).contains(&p));
        assert_eq!(partition_for("anything", 1), 0);
    }

    #[test]
    fn fnv1a_matches_reference_vector() {
        // FNV-1a 32-bit of "a" is 0xe40c292c = 3826002220.
        assert_eq!(partition_for("a", 1000), 220);
    }

    #[tokio::test]
    async fn uncommitted_message_is_redelivered() {
        let db = TempDb::create("bus-redelivery");
        let log = SqliteEventLog::new(db.pool().clone(), 1);
        let consumer = SqliteConsumer::new(db.pool().clone(), "workers", "bet_placed", 1);

        log.publish("bet_placed", "bet-1", "{}").await.unwrap();

        let first = consumer.fetch().await.unwrap().unwrap();
        let again = consumer.fetch().await.unwrap().unwrap();
        assert_eq!(first, again);

        consumer.commit(&first).await.unwrap();
        assert!(consumer.fetch().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn same_key_keeps_publish_order() {
        let db = TempDb::create("bus-order");
        let log = SqliteEventLog::new(db.pool().clone(), 4);
        let consumer = SqliteConsumer::new(db.pool().clone(), "workers", "t", 4);

        for n in 0..3 {
            log.publish("t", "bet-1", &n.to_string()).await.unwrap();
        }

        let mut seen = Vec::new();
        while let Some(message) = consumer.fetch().await.unwrap() {
            seen.push(message.payload.clone());
            consumer.commit(&message).await.unwrap();
        }
        assert_eq!(seen, vec!["0", "1", "2"]);
    }

    #[tokio::test]
    async fn groups_track_offsets_independently() {
        let db = TempDb::create("bus-groups");
        let log = SqliteEventLog::new(db.pool().clone(), 2);
        let a = SqliteConsumer::new(db.pool().clone(), "a", "t", 2);
        let b = SqliteConsumer::new(db.pool().clone(), "b", "t", 2);

        log.publish("t", "k", "x").await.unwrap();
        let msg = a.fetch().await.unwrap().unwrap();
        a.commit(&msg).await.unwrap();

        assert!(a.fetch().await.unwrap().is_none());
        assert!(b.fetch().await.unwrap().is_some());
        assert_eq!(log.lag("a", "t").await.unwrap(), 0);
        assert_eq!(log.lag("b", "t").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn commit_never_moves_offset_backwards() {
        let db = TempDb::create("bus-commit-monotonic");
        let log = SqliteEventLog::new(db.pool().clone(), 1);
        let consumer = SqliteConsumer::new(db.pool().clone(), "g", "t", 1);
        log.publish("t", "k", "0").await.unwrap();
        log.publish("t", "k", "1").await.unwrap();

        let first = consumer.fetch().await.unwrap().unwrap();
        consumer.commit(&first).await.unwrap();
        let second = consumer.fetch().await.unwrap().unwrap();
        consumer.commit(&second).await.unwrap();
        consumer.commit(&first).await.unwrap();

        assert!(consumer.fetch().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn assigned_consumer_ignores_other_partitions() {
        let db = TempDb::create("bus-assigned");
        let log = SqliteEventLog::new(db.pool().clone(), 2);
        let key = "bet-7";
        let owned = partition_for(key, 2);
        let other = 1 - owned;
        let consumer = SqliteConsumer::assigned(db.pool().clone(), "g", "t", vec![other]);

        log.publish("t", key, "x").await.unwrap();

        assert!(consumer.fetch().await.unwrap().is_none());
    }
}
