use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use thiserror::Error;

/// Errors raised while turning feed XML into a [`Feed`].
#[derive(Debug, Error)]
pub enum FeedError {
    /// The document is not well-formed XML or cannot be decoded.
    #[error("XML parse error: {0}")]
    Xml(String),

    /// A required element is absent.
    #[error("Malformed feed: <{parent}> has no <{element}> element")]
    MissingElement {
        parent: String,
        element: &'static str,
    },

    /// A required element is absent from one of the items.
    #[error("Malformed feed: item {index} has no <{element}> element")]
    MissingItemElement { index: usize, element: &'static str },
}

/// Feed-level metadata, read once from the `<channel>` element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Channel {
    pub title: String,
    pub description: String,
    pub link: String,
    pub last_build_date: String,
}

/// One `<item>` entry. `pub_date` is kept exactly as the feed wrote it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    pub title: String,
    pub link: String,
    pub pub_date: String,
    pub description: String,
}

/// A parsed feed: the channel plus its items in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feed {
    pub channel: Channel,
    pub items: Vec<Item>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChannelField {
    Title,
    Description,
    Link,
    LastBuildDate,
}

impl ChannelField {
    fn from_name(name: &[u8]) -> Option<Self> {
        match name {
            b"title" => Some(Self::Title),
            b"description" => Some(Self::Description),
            b"link" => Some(Self::Link),
            b"lastBuildDate" => Some(Self::LastBuildDate),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ItemField {
    Title,
    Link,
    PubDate,
    Description,
}

impl ItemField {
    fn from_name(name: &[u8]) -> Option<Self> {
        match name {
            b"title" => Some(Self::Title),
            b"link" => Some(Self::Link),
            b"pubDate" => Some(Self::PubDate),
            b"description" => Some(Self::Description),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
struct ChannelBuilder {
    title: Option<String>,
    description: Option<String>,
    link: Option<String>,
    last_build_date: Option<String>,
}

impl ChannelBuilder {
    fn slot(&mut self, field: ChannelField) -> &mut Option<String> {
        match field {
            ChannelField::Title => &mut self.title,
            ChannelField::Description => &mut self.description,
            ChannelField::Link => &mut self.link,
            ChannelField::LastBuildDate => &mut self.last_build_date,
        }
    }

    fn build(self) -> Result<Channel, FeedError> {
        let missing = |element| FeedError::MissingElement {
            parent: "channel".to_string(),
            element,
        };
        Ok(Channel {
            title: self.title.ok_or_else(|| missing("title"))?,
            description: self.description.ok_or_else(|| missing("description"))?,
            link: self.link.ok_or_else(|| missing("link"))?,
            last_build_date: self
                .last_build_date
                .ok_or_else(|| missing("lastBuildDate"))?,
        })
    }
}

#[derive(Debug, Default)]
struct ItemBuilder {
    title: Option<String>,
    link: Option<String>,
    pub_date: Option<String>,
    description: Option<String>,
}

impl ItemBuilder {
    fn slot(&mut self, field: ItemField) -> &mut Option<String> {
        match field {
            ItemField::Title => &mut self.title,
            ItemField::Link => &mut self.link,
            ItemField::PubDate => &mut self.pub_date,
            ItemField::Description => &mut self.description,
        }
    }

    fn build(self, index: usize) -> Result<Item, FeedError> {
        let missing = |element| FeedError::MissingItemElement { index, element };
        Ok(Item {
            title: self.title.ok_or_else(|| missing("title"))?,
            link: self.link.ok_or_else(|| missing("link"))?,
            pub_date: self.pub_date.ok_or_else(|| missing("pubDate"))?,
            description: self.description.ok_or_else(|| missing("description"))?,
        })
    }
}

#[derive(Debug, Clone, Copy)]
enum Target {
    Channel(ChannelField),
    Item(ItemField),
}

/// Text collection for one field element, including all descendant text.
struct Capture {
    target: Target,
    depth: usize,
    text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChannelState {
    NotSeen,
    Inside,
    Done,
}

/// Element depths: root = 0, channel = 1, channel fields and items = 2,
/// item fields = 3.
const CHANNEL_DEPTH: usize = 1;
const CHANNEL_CHILD_DEPTH: usize = 2;
const ITEM_CHILD_DEPTH: usize = 3;

struct FeedBuilder {
    root: Option<String>,
    path: Vec<Vec<u8>>,
    state: ChannelState,
    channel: ChannelBuilder,
    items: Vec<ItemBuilder>,
    current_item: Option<ItemBuilder>,
    capture: Option<Capture>,
}

impl FeedBuilder {
    fn new() -> Self {
        Self {
            root: None,
            path: Vec::new(),
            state: ChannelState::NotSeen,
            channel: ChannelBuilder::default(),
            items: Vec::new(),
            current_item: None,
            capture: None,
        }
    }

    /// Handles an opening tag at the current depth.
    fn open(&mut self, e: &BytesStart<'_>) {
        let depth = self.path.len();
        let name = e.name();
        let name = name.as_ref();

        if depth == 0 && self.root.is_none() {
            self.root = Some(String::from_utf8_lossy(name).into_owned());
            return;
        }
        if self.capture.is_some() {
            return;
        }

        match (self.state, depth) {
            (ChannelState::NotSeen, CHANNEL_DEPTH) if name == b"channel" => {
                self.state = ChannelState::Inside;
            }
            (ChannelState::Inside, CHANNEL_CHILD_DEPTH) => {
                if name == b"item" {
                    self.current_item = Some(ItemBuilder::default());
                } else if let Some(field) = ChannelField::from_name(name) {
                    // Only the first occurrence of a field counts
                    if self.channel.slot(field).is_none() {
                        self.start_capture(Target::Channel(field), depth);
                    }
                }
            }
            (ChannelState::Inside, ITEM_CHILD_DEPTH) => {
                let in_item =
                    self.path.get(CHANNEL_CHILD_DEPTH).map(Vec::as_slice) == Some(&b"item"[..]);
                if let Some(field) = ItemField::from_name(name) {
                    let unset = in_item
                        && self
                            .current_item
                            .as_mut()
                            .is_some_and(|item| item.slot(field).is_none());
                    if unset {
                        self.start_capture(Target::Item(field), depth);
                    }
                }
            }
            _ => {}
        }
    }

    fn start_capture(&mut self, target: Target, depth: usize) {
        self.capture = Some(Capture {
            target,
            depth,
            text: String::new(),
        });
    }

    /// Handles a closing tag. `depth` is the depth of the element being closed.
    fn close(&mut self, name: &[u8], depth: usize) {
        if self.capture.as_ref().is_some_and(|c| c.depth == depth) {
            if let Some(capture) = self.capture.take() {
                self.finish_capture(capture);
            }
            return;
        }

        match (self.state, depth) {
            (ChannelState::Inside, CHANNEL_CHILD_DEPTH) if name == b"item" => {
                if let Some(item) = self.current_item.take() {
                    self.items.push(item);
                }
            }
            (ChannelState::Inside, CHANNEL_DEPTH) if name == b"channel" => {
                self.state = ChannelState::Done;
            }
            _ => {}
        }
    }

    fn finish_capture(&mut self, capture: Capture) {
        match capture.target {
            Target::Channel(field) => *self.channel.slot(field) = Some(capture.text),
            Target::Item(field) => {
                if let Some(item) = self.current_item.as_mut() {
                    *item.slot(field) = Some(capture.text);
                }
            }
        }
    }

    fn push_text(&mut self, text: &str) {
        if let Some(capture) = self.capture.as_mut() {
            capture.text.push_str(text);
        }
    }

    fn finish(self) -> Result<Feed, FeedError> {
        let root = self
            .root
            .ok_or_else(|| FeedError::Xml("document has no root element".to_string()))?;

        if self.state == ChannelState::NotSeen {
            return Err(FeedError::MissingElement {
                parent: root,
                element: "channel",
            });
        }

        let channel = self.channel.build()?;
        let items = self
            .items
            .into_iter()
            .enumerate()
            .map(|(index, item)| item.build(index))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Feed { channel, items })
    }
}

/// Parses an RSS 2.0 document into a [`Feed`].
///
/// The root element may have any name; its first `<channel>` child supplies
/// the channel fields and the `<item>` list. Every field is required: a
/// missing one is reported as [`FeedError::MissingElement`] or
/// [`FeedError::MissingItemElement`] rather than defaulted. Field values are
/// the element's full text content (CDATA included), entity-unescaped and not
/// trimmed. Text is decoded with the charset named in the XML declaration,
/// UTF-8 when there is none.
///
/// # Security
///
/// `quick-xml` 0.37 never expands `<!ENTITY>` declarations, so a DOCTYPE
/// cannot inject external content; unknown entities fail with
/// [`FeedError::Xml`].
pub fn parse_feed(bytes: &[u8]) -> Result<Feed, FeedError> {
    let mut reader = Reader::from_reader(bytes);
    let mut builder = FeedBuilder::new();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                builder.open(&e);
                builder.path.push(e.name().as_ref().to_vec());
            }
            Ok(Event::Empty(e)) => {
                // A self-closing element is opened and closed at the same depth
                let depth = builder.path.len();
                builder.open(&e);
                builder.close(e.name().as_ref(), depth);
            }
            Ok(Event::End(e)) => {
                builder.path.pop();
                let depth = builder.path.len();
                builder.close(e.name().as_ref(), depth);
            }
            Ok(Event::Text(e)) => {
                if builder.capture.is_some() {
                    let text = e.unescape().map_err(|e| FeedError::Xml(e.to_string()))?;
                    builder.push_text(&text);
                }
            }
            Ok(Event::CData(e)) => {
                if builder.capture.is_some() {
                    let raw = e.into_inner();
                    let text = reader
                        .decoder()
                        .decode(&raw)
                        .map_err(|e| FeedError::Xml(format!("undecodable CDATA: {e}")))?;
                    builder.push_text(&text);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(FeedError::Xml(e.to_string())),
            _ => {}
        }
        buf.clear();
    }

    if let Some(open) = builder.path.last() {
        return Err(FeedError::Xml(format!(
            "unexpected end of document inside <{}>",
            String::from_utf8_lossy(open)
        )));
    }

    let feed = builder.finish()?;
    tracing::debug!(
        channel = %feed.channel.title,
        items = feed.items.len(),
        "Parsed feed"
    );
    Ok(feed)
}
