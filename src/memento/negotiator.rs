use chrono::{DateTime, Utc};

use super::MementoError;
use crate::models::{Memento, NegotiationRequest, RevisionTimeline};

/// Pick the Memento that best matches `target`.
///
/// Resolves to the most recent state that already existed at `target`, and
/// never to a later one unless `target` precedes the whole history, in which
/// case the first Memento is the only sensible answer. Among revisions that
/// share a timestamp the one latest in store order wins, except at the very
/// start of the history where the first entry always answers.
pub fn select_memento(
    timeline: &RevisionTimeline,
    target: DateTime<Utc>,
) -> Result<&Memento, MementoError> {
    let mementos = timeline.as_slice();
    let Some(first) = mementos.first() else {
        return Err(MementoError::NoMemento);
    };
    if target <= first.timestamp {
        return Ok(first);
    }

    // Number of Mementos at or before the target; the timeline is sorted.
    let elapsed = mementos.partition_point(|m| m.timestamp <= target);
    Ok(&mementos[elapsed.saturating_sub(1)])
}

/// The most recent Memento, used when no datetime was requested.
pub fn select_latest(timeline: &RevisionTimeline) -> Result<&Memento, MementoError> {
    timeline.last().ok_or(MementoError::NoMemento)
}

/// Dispatch on whether the request named a datetime.
pub fn select_for_request<'a>(
    timeline: &'a RevisionTimeline,
    request: &NegotiationRequest,
) -> Result<&'a Memento, MementoError> {
    match request.target_datetime {
        Some(target) => select_memento(timeline, target),
        None => select_latest(timeline),
    }
}
