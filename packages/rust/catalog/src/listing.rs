//! Structural view of one course listing block.
//!
//! A listing is a `<span class="large-text">` whose direct children form a
//! short run of text and element nodes:
//!
//! ```text
//! 0: <b>SUBJ NUM Name</b>
//! 1: " (4 credits)"
//! 2: <br>
//! 3: description                     (no prerequisite)
//! 4: "Prerequisite: ..."             (optional marker)
//! 7: description                     (when the marker is present)
//! ```
//!
//! Fields are read through named [`Slot`]s so a format change surfaces as an
//! [`CourseGraphError::UnrecognizedListing`] rather than an index fault.

use scraper::{ElementRef, Node};

use coursegraph_shared::{Course, CourseGraphError, Result};

/// Listings with this many child nodes or more are not course entries.
pub const MAX_LISTING_NODES: usize = 13;

const CREDIT_MARKER: &str = "credit";
const NOTE_MARKER: &str = "Note:";
const PREREQUISITE_MARKER: &str = "Prerequisite";

/// A direct child of a listing container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListingNode {
    Text(String),
    Element { name: String, text: String },
    Other,
}

impl ListingNode {
    /// Text content of the node (concatenated descendant text for elements).
    pub fn text(&self) -> &str {
        match self {
            Self::Text(text) => text,
            Self::Element { text, .. } => text,
            Self::Other => "",
        }
    }

    fn is_element(&self, tag: &str) -> bool {
        matches!(self, Self::Element { name, .. } if name == tag)
    }
}

/// Named positions of the fields inside a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    Label,
    Credits,
    Description,
    PrerequisiteMarker,
    DescriptionAfterPrerequisite,
}

impl Slot {
    fn index(self) -> usize {
        match self {
            Self::Label => 0,
            Self::Credits => 1,
            Self::Description => 3,
            Self::PrerequisiteMarker => 4,
            Self::DescriptionAfterPrerequisite => 7,
        }
    }
}

/// The child nodes of one listing container plus its bold label text.
#[derive(Debug, Clone)]
pub struct ListingBlock {
    nodes: Vec<ListingNode>,
    bold: Option<String>,
}

impl ListingBlock {
    /// Build a block from a container element.
    pub fn from_element(container: ElementRef<'_>) -> Self {
        let nodes = container
            .children()
            .map(|child| match child.value() {
                Node::Text(text) => ListingNode::Text(String::from(&**text)),
                Node::Element(el) => ListingNode::Element {
                    name: el.name().to_string(),
                    text: ElementRef::wrap(child)
                        .map(|e| e.text().collect::<String>())
                        .unwrap_or_default(),
                },
                _ => ListingNode::Other,
            })
            .collect();

        let bold = container
            .descendants()
            .filter_map(ElementRef::wrap)
            .find(|e| e.value().name() == "b")
            .map(|e| e.text().collect::<String>());

        Self { nodes, bold }
    }

    /// Build a block from already-split nodes.
    pub fn from_nodes(nodes: Vec<ListingNode>) -> Self {
        let bold = nodes
            .iter()
            .find(|n| n.is_element("b"))
            .map(|n| n.text().to_string());
        Self { nodes, bold }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn slot(&self, slot: Slot) -> Option<&ListingNode> {
        self.nodes.get(slot.index())
    }

    fn slot_text(&self, slot: Slot) -> Option<&str> {
        self.slot(slot).map(ListingNode::text)
    }

    /// Whether this block is a real course entry: a bounded run of nodes with
    /// a credit marker after the label and no "Note:" label.
    pub fn is_course_listing(&self) -> bool {
        let bounded = self.len() > 1 && self.len() < MAX_LISTING_NODES;
        let has_credits = self
            .slot_text(Slot::Credits)
            .is_some_and(|t| t.contains(CREDIT_MARKER));
        let is_note = self.bold.as_deref().is_some_and(|b| b.contains(NOTE_MARKER));
        bounded && has_credits && !is_note
    }

    /// Label text with non-breaking spaces normalized.
    pub fn label(&self) -> Result<String> {
        let label = self
            .slot_text(Slot::Label)
            .ok_or_else(|| CourseGraphError::listing("listing has no label node", ""))?;
        Ok(label.replace('\u{a0}', " ").trim().to_string())
    }

    /// The description, which moves further down when a prerequisite line is
    /// present. Blocks too short to carry one yield an empty string.
    pub fn description(&self) -> String {
        let has_prerequisite = self
            .slot_text(Slot::PrerequisiteMarker)
            .is_some_and(|t| t.contains(PREREQUISITE_MARKER));

        let slot = if has_prerequisite {
            Slot::DescriptionAfterPrerequisite
        } else {
            Slot::Description
        };

        self.slot_text(slot)
            .map(|t| t.trim_matches(|c| c == '\n' || c == ' ').to_string())
            .unwrap_or_default()
    }

    /// Turn the block into a [`Course`].
    pub fn to_course(&self) -> Result<Course> {
        let label = self.label()?;
        let (subject, number, name) = split_label(&label)?;
        Ok(Course::new(subject, number, name).with_description(self.description()))
    }
}

/// Split `"SUBJ NUM Name of course"` into its three parts.
pub fn split_label(label: &str) -> Result<(&str, &str, &str)> {
    let (subject, rest) = label
        .split_once(' ')
        .ok_or_else(|| CourseGraphError::listing("no space after subject code", label))?;
    let (number, name) = rest
        .trim_start()
        .split_once(' ')
        .ok_or_else(|| CourseGraphError::listing("no space after course number", label))?;
    let name = name.trim();

    if subject.is_empty() || number.is_empty() || name.is_empty() {
        return Err(CourseGraphError::listing(
            "label is missing subject, number or name",
            label,
        ));
    }

    Ok((subject, number, name))
}
