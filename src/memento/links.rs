//! RFC 8288 Link-format: the typed links tying an Original Resource to its
//! TimeGate, TimeMap and Mementos.

use std::fmt;

use chrono::{DateTime, Utc};

use super::datetime::{format_http_date, parse_http_date};
use super::MementoError;
use crate::models::{Memento, OriginalResource, RevisionTimeline};

pub const LINK_FORMAT_MEDIA_TYPE: &str = "application/link-format";

/// A Memento link relation token.
///
/// Declaration order is the order tokens are written inside a combined
/// `rel` value, e.g. `rel="first last memento"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Relation {
    First,
    Last,
    Prev,
    Next,
    Memento,
    Original,
    TimeGate,
    TimeMap,
}

impl Relation {
    pub fn token(&self) -> &'static str {
        match self {
            Self::First => "first",
            Self::Last => "last",
            Self::Prev => "prev",
            Self::Next => "next",
            Self::Memento => "memento",
            Self::Original => "original",
            Self::TimeGate => "timegate",
            Self::TimeMap => "timemap",
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        match token.to_ascii_lowercase().as_str() {
            "first" => Some(Self::First),
            "last" => Some(Self::Last),
            "prev" => Some(Self::Prev),
            "next" => Some(Self::Next),
            "memento" => Some(Self::Memento),
            "original" => Some(Self::Original),
            "timegate" => Some(Self::TimeGate),
            "timemap" => Some(Self::TimeMap),
            _ => None,
        }
    }
}

/// One typed link. A single target may carry several relations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub target: String,
    relations: Vec<Relation>,
    pub datetime: Option<DateTime<Utc>>,
    pub media_type: Option<String>,
    pub from: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
}

impl Link {
    pub fn new(target: impl Into<String>, relation: Relation) -> Self {
        Self {
            target: target.into(),
            relations: vec![relation],
            datetime: None,
            media_type: None,
            from: None,
            until: None,
        }
    }

    /// A link to `memento` in the given role. Every Memento link also
    /// carries the plain `memento` relation.
    pub fn to_memento(memento: &Memento, relation: Relation) -> Self {
        let mut link = Self::new(memento.uri.clone(), Relation::Memento);
        link.add_relation(relation);
        link.datetime = Some(memento.timestamp);
        link
    }

    pub fn with_datetime(mut self, datetime: DateTime<Utc>) -> Self {
        self.datetime = Some(datetime);
        self
    }

    pub fn with_media_type(mut self, media_type: impl Into<String>) -> Self {
        self.media_type = Some(media_type.into());
        self
    }

    pub fn with_range(mut self, from: DateTime<Utc>, until: DateTime<Utc>) -> Self {
        self.from = Some(from);
        self.until = Some(until);
        self
    }

    pub fn relations(&self) -> &[Relation] {
        &self.relations
    }

    pub fn has_relation(&self, relation: Relation) -> bool {
        self.relations.contains(&relation)
    }

    /// The `rel` parameter value, tokens space-separated.
    pub fn rel(&self) -> String {
        self.relations
            .iter()
            .map(Relation::token)
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn add_relation(&mut self, relation: Relation) {
        if let Err(at) = self.relations.binary_search(&relation) {
            self.relations.insert(at, relation);
        }
    }
}

impl fmt::Display for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}>; rel=\"{}\"", self.target, self.rel())?;
        if let Some(datetime) = self.datetime {
            write!(f, "; datetime=\"{}\"", format_http_date(datetime))?;
        }
        if let Some(media_type) = &self.media_type {
            write!(f, "; type=\"{}\"", media_type)?;
        }
        if let Some(from) = self.from {
            write!(f, "; from=\"{}\"", format_http_date(from))?;
        }
        if let Some(until) = self.until {
            write!(f, "; until=\"{}\"", format_http_date(until))?;
        }
        Ok(())
    }
}

/// An ordered set of links. Emission order is kept exactly as built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkSet {
    links: Vec<Link>,
}

impl LinkSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// The `original`, `timegate` and `timemap` links every Memento-aware
    /// response carries.
    pub fn for_original(original: &OriginalResource) -> Self {
        let mut links = Self::new();
        links.push(Link::new(original.uri.clone(), Relation::Original));
        links.push(Link::new(original.timegate_uri.clone(), Relation::TimeGate));
        links.push(
            Link::new(original.timemap_uri.clone(), Relation::TimeMap)
                .with_media_type(LINK_FORMAT_MEDIA_TYPE),
        );
        links
    }

    pub fn push(&mut self, link: Link) {
        self.links.push(link);
    }

    /// Add `memento` in the given role. If the Memento is already linked, the
    /// relation joins that entry instead of adding a second one.
    pub fn push_memento(&mut self, memento: &Memento, relation: Relation) {
        match self
            .links
            .iter_mut()
            .find(|link| link.target == memento.uri && link.has_relation(Relation::Memento))
        {
            Some(existing) => existing.add_relation(relation),
            None => self.links.push(Link::to_memento(memento, relation)),
        }
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Link> {
        self.links.iter()
    }

    /// First link carrying `relation`.
    pub fn find(&self, relation: Relation) -> Option<&Link> {
        self.links.iter().find(|link| link.has_relation(relation))
    }

    /// All links carrying `relation`.
    pub fn with_relation(&self, relation: Relation) -> impl Iterator<Item = &Link> {
        self.links
            .iter()
            .filter(move |link| link.has_relation(relation))
    }

    /// Single-line rendering for a `Link` header.
    pub fn to_header_value(&self) -> String {
        self.join(", ")
    }

    /// One entry per line, for a TimeMap body.
    pub fn to_document(&self) -> String {
        let mut document = self.join(",\n");
        document.push('\n');
        document
    }

    fn join(&self, separator: &str) -> String {
        self.links
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(separator)
    }

    /// Parse a Link-format header value or document.
    ///
    /// Relation tokens outside the Memento vocabulary are ignored, but every
    /// entry must have a `rel` parameter.
    pub fn parse(input: &str) -> Result<Self, MementoError> {
        let mut links = Self::new();
        for entry in split_unquoted(input, ',') {
            let entry = entry.trim();
            if !entry.is_empty() {
                links.push(parse_link(entry)?);
            }
        }
        Ok(links)
    }
}

impl fmt::Display for LinkSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_header_value())
    }
}

impl<'a> IntoIterator for &'a LinkSet {
    type Item = &'a Link;
    type IntoIter = std::slice::Iter<'a, Link>;

    fn into_iter(self) -> Self::IntoIter {
        self.links.iter()
    }
}

/// Build the links describing `original` and, when set, the `chosen` Memento
/// and its neighbours in `timeline`.
///
/// Emission order is original, timegate, timemap, first, prev, memento,
/// next, last. A Memento filling several roles appears once, at its
/// earliest role.
pub fn build_links(
    original: &OriginalResource,
    timeline: &RevisionTimeline,
    chosen: Option<&Memento>,
) -> LinkSet {
    let mut links = LinkSet::for_original(original);
    let Some(chosen) = chosen else {
        return links;
    };

    let position = timeline.position(chosen);

    if let Some(first) = timeline.first() {
        links.push_memento(first, Relation::First);
    }
    if let Some(prev) = position.and_then(|i| timeline.predecessor(i)) {
        links.push_memento(prev, Relation::Prev);
    }
    links.push_memento(chosen, Relation::Memento);
    if let Some(next) = position.and_then(|i| timeline.successor(i)) {
        links.push_memento(next, Relation::Next);
    }
    if let Some(last) = timeline.last() {
        links.push_memento(last, Relation::Last);
    }

    links
}

/// Split on `separator` outside of `<...>` targets and quoted strings.
fn split_unquoted(input: &str, separator: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut in_target = false;
    let mut in_quotes = false;
    let mut start = 0;

    for (i, c) in input.char_indices() {
        match c {
            '<' if !in_quotes => in_target = true,
            '>' if !in_quotes => in_target = false,
            '"' if !in_target => in_quotes = !in_quotes,
            c if c == separator && !in_target && !in_quotes => {
                parts.push(&input[start..i]);
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    parts.push(&input[start..]);
    parts
}

fn parse_link(entry: &str) -> Result<Link, MementoError> {
    let malformed = |reason: &str| MementoError::InvalidLinkFormat(format!("{reason}: {entry}"));

    let (target, params) = entry
        .strip_prefix('<')
        .and_then(|rest| rest.split_once('>'))
        .ok_or_else(|| malformed("expected <target>"))?;

    let mut link = Link {
        target: target.trim().to_string(),
        relations: Vec::new(),
        datetime: None,
        media_type: None,
        from: None,
        until: None,
    };
    let mut saw_rel = false;

    for param in split_unquoted(params, ';') {
        let param = param.trim();
        if param.is_empty() {
            continue;
        }
        let (key, value) = param
            .split_once('=')
            .ok_or_else(|| malformed("parameter without value"))?;
        let value = value.trim().trim_matches('"');
        let parse_date =
            |value: &str| parse_http_date(value).map_err(|_| malformed("invalid HTTP-date"));

        match key.trim().to_ascii_lowercase().as_str() {
            "rel" => {
                saw_rel = true;
                for relation in value.split_whitespace().filter_map(Relation::from_token) {
                    link.add_relation(relation);
                }
            }
            "datetime" => link.datetime = Some(parse_date(value)?),
            "type" => link.media_type = Some(value.to_string()),
            "from" => link.from = Some(parse_date(value)?),
            "until" => link.until = Some(parse_date(value)?),
            _ => {}
        }
    }

    if !saw_rel {
        return Err(malformed("missing rel"));
    }
    Ok(link)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn original() -> OriginalResource {
        OriginalResource::new(
            "http://wiki.test/wiki/Page",
            "http://wiki.test/timegate/Page",
            "http://wiki.test/timemap/Page",
        )
    }

    fn memento(id: i64, month: u32) -> Memento {
        Memento::new(
            id,
            Utc.with_ymd_and_hms(2013, month, 1, 0, 0, 0).unwrap(),
            format!("http://wiki.test/wiki/Page?oldid={}", id),
        )
    }

    fn timeline(count: i64) -> RevisionTimeline {
        (1..=count).map(|id| memento(id, id as u32)).collect()
    }

    fn rels(links: &LinkSet) -> Vec<String> {
        links.iter().map(Link::rel).collect()
    }

    #[test]
    fn without_memento_only_describes_the_original() {
        let links = build_links(&original(), &timeline(3), None);
        assert_eq!(rels(&links), vec!["original", "timegate", "timemap"]);
        assert_eq!(
            links.to_header_value(),
            "<http://wiki.test/wiki/Page>; rel=\"original\", \
             <http://wiki.test/timegate/Page>; rel=\"timegate\", \
             <http://wiki.test/timemap/Page>; rel=\"timemap\"; type=\"application/link-format\""
        );
    }

    #[test]
    fn middle_memento_gets_all_neighbours_in_order() {
        let timeline = timeline(5);
        let chosen = timeline.get(2).cloned();
        let links = build_links(&original(), &timeline, chosen.as_ref());

        assert_eq!(
            rels(&links),
            vec![
                "original",
                "timegate",
                "timemap",
                "first memento",
                "prev memento",
                "memento",
                "next memento",
                "last memento",
            ]
        );
        let prev = links.find(Relation::Prev).unwrap();
        assert_eq!(prev.target, "http://wiki.test/wiki/Page?oldid=2");
        assert_eq!(
            prev.to_string(),
            "<http://wiki.test/wiki/Page?oldid=2>; rel=\"prev memento\"; \
             datetime=\"Fri, 01 Feb 2013 00:00:00 GMT\""
        );
    }

    #[test]
    fn roles_collapse_onto_one_entry_per_memento() {
        let timeline = timeline(2);
        let chosen = timeline.first().cloned();
        let links = build_links(&original(), &timeline, chosen.as_ref());

        assert_eq!(
            rels(&links),
            vec!["original", "timegate", "timemap", "first memento", "last next memento"]
        );
    }

    #[test]
    fn single_revision_is_both_first_and_last() {
        let timeline = timeline(1);
        let chosen = timeline.first().cloned();
        let links = build_links(&original(), &timeline, chosen.as_ref());

        assert_eq!(links.len(), 4);
        let only = links.find(Relation::Memento).unwrap();
        assert_eq!(only.rel(), "first last memento");
        assert!(only.has_relation(Relation::First) && only.has_relation(Relation::Last));
    }

    #[test]
    fn parses_what_it_renders() {
        let timeline = timeline(4);
        let chosen = timeline.get(1).cloned();
        let links = build_links(&original(), &timeline, chosen.as_ref());

        let parsed = LinkSet::parse(&links.to_document()).unwrap();
        assert_eq!(parsed, links);
    }

    #[test]
    fn parser_keeps_commas_inside_quoted_dates() {
        let parsed = LinkSet::parse(
            "<http://a/1>; rel=\"memento\"; datetime=\"Sat, 10 Aug 2013 00:00:00 GMT\", \
             <http://a>; rel=\"original canonical\"",
        )
        .unwrap();

        assert_eq!(parsed.len(), 2);
        assert_eq!(
            parsed.find(Relation::Memento).unwrap().datetime,
            Some(Utc.with_ymd_and_hms(2013, 8, 10, 0, 0, 0).unwrap())
        );
        assert_eq!(parsed.find(Relation::Original).unwrap().rel(), "original");
    }

    #[test]
    fn parser_rejects_entries_without_target_or_rel() {
        assert!(matches!(
            LinkSet::parse("http://a; rel=\"memento\""),
            Err(MementoError::InvalidLinkFormat(_))
        ));
        assert!(matches!(
            LinkSet::parse("<http://a>; type=\"text/html\""),
            Err(MementoError::InvalidLinkFormat(_))
        ));
    }
}
