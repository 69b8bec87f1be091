//! Heading capture and anchor ID allocation.

use std::collections::HashSet;

use pulldown_cmark::{CowStr, Event, HeadingLevel, Tag, TagEnd};

use crate::util::slugify;

/// Fallback anchor for headings without any alphanumeric text.
const EMPTY_HEADING_ID: &str = "section";

/// Heading currently being captured.
struct ActiveHeading<'a> {
    level: HeadingLevel,
    explicit_id: Option<CowStr<'a>>,
    classes: Vec<CowStr<'a>>,
    attrs: Vec<(CowStr<'a>, Option<CowStr<'a>>)>,
    /// Plain text content (used for the slug and the title).
    text: String,
    /// Inline events between the heading's start and end tags.
    events: Vec<Event<'a>>,
}

/// Tracks heading state while walking the event stream.
///
/// Inline events inside a heading are buffered until the heading closes,
/// since the anchor ID depends on the complete heading text. The buffered
/// events are then replayed into the main stream so that the single HTML
/// writer keeps numbering footnotes in document order. The first
/// level-1 heading also becomes the document title.
#[derive(Default)]
pub(crate) struct HeadingState<'a> {
    active: Option<ActiveHeading<'a>>,
    used_ids: HashSet<String>,
    title: Option<String>,
}

impl<'a> HeadingState<'a> {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Begin capturing a heading.
    pub(crate) fn start(
        &mut self,
        level: HeadingLevel,
        explicit_id: Option<CowStr<'a>>,
        classes: Vec<CowStr<'a>>,
        attrs: Vec<(CowStr<'a>, Option<CowStr<'a>>)>,
    ) {
        self.active = Some(ActiveHeading {
            level,
            explicit_id,
            classes,
            attrs,
            text: String::new(),
            events: Vec::new(),
        });
    }

    pub(crate) fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Append plain text to the heading being captured.
    pub(crate) fn push_text(&mut self, text: &str) {
        if let Some(heading) = &mut self.active {
            heading.text.push_str(text);
        }
    }

    /// Buffer an inline event for the heading being captured.
    pub(crate) fn push_event(&mut self, event: Event<'a>) {
        if let Some(heading) = &mut self.active {
            heading.events.push(event);
        }
    }

    /// Finish the active heading and return its events with the anchor ID set.
    ///
    /// Returns `None` if no heading was being captured.
    pub(crate) fn complete(&mut self) -> Option<Vec<Event<'a>>> {
        let heading = self.active.take()?;
        let text = heading.text.trim();

        if heading.level == HeadingLevel::H1 && self.title.is_none() {
            self.title = Some(text.to_owned());
        }

        let id = match &heading.explicit_id {
            Some(id) => self.claim_id(id),
            None => self.claim_id(&slugify(text)),
        };

        let mut events = Vec::with_capacity(heading.events.len() + 2);
        events.push(Event::Start(Tag::Heading {
            level: heading.level,
            id: Some(CowStr::from(id)),
            classes: heading.classes,
            attrs: heading.attrs,
        }));
        events.extend(heading.events);
        events.push(Event::End(TagEnd::Heading(heading.level)));
        Some(events)
    }

    /// Take the captured title (text of the first H1).
    pub(crate) fn take_title(&mut self) -> Option<String> {
        self.title.take()
    }

    /// Reserve a unique anchor ID, suffixing `-1`, `-2`, ... on collision.
    fn claim_id(&mut self, base: &str) -> String {
        let base = if base.is_empty() {
            EMPTY_HEADING_ID
        } else {
            base
        };

        let mut candidate = base.to_owned();
        let mut suffix = 0;
        while self.used_ids.contains(&candidate) {
            suffix += 1;
            candidate = format!("{base}-{suffix}");
        }
        self.used_ids.insert(candidate.clone());
        candidate
    }
}
