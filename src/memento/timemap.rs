use super::{Link, LinkSet, MementoError, Relation, LINK_FORMAT_MEDIA_TYPE};
use crate::models::{OriginalResource, RevisionTimeline};

/// All links of a TimeMap: original, timegate, the TimeMap itself (with its
/// `from`/`until` span), then one entry per Memento, oldest first.
pub fn time_map_links(
    original: &OriginalResource,
    timeline: &RevisionTimeline,
) -> Result<LinkSet, MementoError> {
    let (Some(first), Some(last)) = (timeline.first(), timeline.last()) else {
        return Err(MementoError::EmptyTimeline);
    };

    let mut links = LinkSet::new();
    links.push(Link::new(original.uri.clone(), Relation::Original));
    links.push(Link::new(original.timegate_uri.clone(), Relation::TimeGate));
    links.push(
        Link::new(original.timemap_uri.clone(), Relation::TimeMap)
            .with_media_type(LINK_FORMAT_MEDIA_TYPE)
            .with_range(first.timestamp, last.timestamp),
    );

    for memento in timeline {
        links.push_memento(memento, Relation::Memento);
    }
    links.push_memento(first, Relation::First);
    links.push_memento(last, Relation::Last);

    Ok(links)
}

/// Render the `application/link-format` TimeMap document.
pub fn render_time_map(
    original: &OriginalResource,
    timeline: &RevisionTimeline,
) -> Result<String, MementoError> {
    time_map_links(original, timeline).map(|links| links.to_document())
}
