use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// One historical state of a resource.
///
/// Timestamps are kept at second precision, the resolution HTTP-dates can
/// express, so a Memento always round-trips through `Memento-Datetime`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Memento {
    /// Opaque key into the revision store.
    pub revision_id: i64,
    /// When this state became current (UTC).
    #[serde(deserialize_with = "deserialize_whole_seconds")]
    pub timestamp: DateTime<Utc>,
    /// Absolute, stable URI of exactly this state.
    pub uri: String,
}

impl Memento {
    pub fn new(revision_id: i64, timestamp: DateTime<Utc>, uri: impl Into<String>) -> Self {
        Self {
            revision_id,
            timestamp: timestamp.trunc_subsecs(0),
            uri: uri.into(),
        }
    }
}

fn deserialize_whole_seconds<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    DateTime::<Utc>::deserialize(deserializer).map(|timestamp| timestamp.trunc_subsecs(0))
}

/// The ordered revision history of one resource, oldest first.
///
/// Entries may share a timestamp; the order the store returned them in is
/// kept as the secondary key, so "later" means later in the sequence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<Memento>", into = "Vec<Memento>")]
pub struct RevisionTimeline {
    mementos: Vec<Memento>,
}

impl RevisionTimeline {
    /// Build a timeline from store rows. The sort is stable, so rows that
    /// share a timestamp keep their store order.
    pub fn new(mut mementos: Vec<Memento>) -> Self {
        mementos.sort_by_key(|m| m.timestamp);
        Self { mementos }
    }

    pub fn len(&self) -> usize {
        self.mementos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mementos.is_empty()
    }

    pub fn first(&self) -> Option<&Memento> {
        self.mementos.first()
    }

    pub fn last(&self) -> Option<&Memento> {
        self.mementos.last()
    }

    pub fn get(&self, index: usize) -> Option<&Memento> {
        self.mementos.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Memento> {
        self.mementos.iter()
    }

    pub fn as_slice(&self) -> &[Memento] {
        &self.mementos
    }

    /// Index of `memento` in the timeline, matched by URI.
    pub fn position(&self, memento: &Memento) -> Option<usize> {
        self.mementos.iter().position(|m| m.uri == memento.uri)
    }

    /// Find the Memento for a store revision id.
    pub fn find_revision(&self, revision_id: i64) -> Option<&Memento> {
        self.mementos.iter().find(|m| m.revision_id == revision_id)
    }

    /// The entry immediately before `index`, if any.
    pub fn predecessor(&self, index: usize) -> Option<&Memento> {
        index.checked_sub(1).and_then(|i| self.mementos.get(i))
    }

    /// The entry immediately after `index`, if any.
    pub fn successor(&self, index: usize) -> Option<&Memento> {
        self.mementos.get(index + 1)
    }
}

impl FromIterator<Memento> for RevisionTimeline {
    fn from_iter<I: IntoIterator<Item = Memento>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl From<Vec<Memento>> for RevisionTimeline {
    fn from(mementos: Vec<Memento>) -> Self {
        Self::new(mementos)
    }
}

impl From<RevisionTimeline> for Vec<Memento> {
    fn from(timeline: RevisionTimeline) -> Self {
        timeline.mementos
    }
}

impl<'a> IntoIterator for &'a RevisionTimeline {
    type Item = &'a Memento;
    type IntoIter = std::slice::Iter<'a, Memento>;

    fn into_iter(self) -> Self::IntoIter {
        self.mementos.iter()
    }
}

/// The live, unversioned identity of a resource and its two Memento endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OriginalResource {
    pub uri: String,
    pub timegate_uri: String,
    pub timemap_uri: String,
}

impl OriginalResource {
    pub fn new(
        uri: impl Into<String>,
        timegate_uri: impl Into<String>,
        timemap_uri: impl Into<String>,
    ) -> Self {
        Self {
            uri: uri.into(),
            timegate_uri: timegate_uri.into(),
            timemap_uri: timemap_uri.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2013, 6, day, 0, 0, 0).unwrap()
    }

    #[test]
    fn new_sorts_by_timestamp_keeping_store_order_for_ties() {
        let timeline = RevisionTimeline::new(vec![
            Memento::new(3, at(3), "r3"),
            Memento::new(1, at(1), "r1"),
            Memento::new(2, at(3), "r2"),
        ]);

        let ids: Vec<i64> = timeline.iter().map(|m| m.revision_id).collect();
        assert_eq!(ids, vec![1, 3, 2]);
    }

    #[test]
    fn deserializing_keeps_order_and_second_precision() {
        let json = r#"[
            {"revision_id": 2, "timestamp": "2013-06-03T00:00:00Z", "uri": "r2"},
            {"revision_id": 1, "timestamp": "2013-06-01T00:00:00.750Z", "uri": "r1"}
        ]"#;

        let timeline: RevisionTimeline = serde_json::from_str(json).unwrap();

        let ids: Vec<i64> = timeline.iter().map(|m| m.revision_id).collect();
        assert_eq!(ids, vec![1, 2]);
        assert_eq!(timeline.first().unwrap().timestamp, at(1));
    }

    #[test]
    fn memento_timestamps_are_truncated_to_seconds() {
        let precise = at(1) + chrono::Duration::milliseconds(750);
        let memento = Memento::new(1, precise, "r1");
        assert_eq!(memento.timestamp, at(1));
    }

    #[test]
    fn neighbours_respect_timeline_bounds() {
        let timeline: RevisionTimeline = (1..=3)
            .map(|d| Memento::new(d as i64, at(d), format!("r{}", d)))
            .collect();

        assert!(timeline.predecessor(0).is_none());
        assert_eq!(timeline.predecessor(1).map(|m| m.revision_id), Some(1));
        assert_eq!(timeline.successor(1).map(|m| m.revision_id), Some(3));
        assert!(timeline.successor(2).is_none());
    }
}
