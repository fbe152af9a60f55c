// ── Command registry ──
//
// The fixed set of logical commands a button can be bound to. Each
// command knows its stable identifier, its display metadata, and the
// wire event it is delivered as.

use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};

use pageturn_api::RemoteEvent;

/// An abstract reader action, independent of the button that triggers it.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    EnumIter,
    EnumString,
    IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum LogicalCommand {
    PreviousPage,
    NextPage,
}

impl LogicalCommand {
    /// Every command, in registry order.
    pub fn all() -> impl Iterator<Item = Self> {
        Self::iter()
    }

    /// Stable identifier used in config files and on the command line.
    pub fn id(self) -> &'static str {
        self.into()
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Self::PreviousPage => "Previous Page",
            Self::NextPage => "Next Page",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::PreviousPage => "Go to previous page in KOReader",
            Self::NextPage => "Go to next page in KOReader",
        }
    }

    /// The event the reader receives for this command.
    pub fn remote_event(self) -> RemoteEvent {
        match self {
            Self::PreviousPage => RemoteEvent::GotoViewRel(-1),
            Self::NextPage => RemoteEvent::GotoViewRel(1),
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        id.parse().ok()
    }

    pub fn from_display_name(name: &str) -> Option<Self> {
        Self::all().find(|c| c.display_name() == name)
    }
}

impl fmt::Display for LogicalCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}
