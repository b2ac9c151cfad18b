//! Host page abstraction
//!
//! The judge page is modelled as two things: a readable snapshot (URL plus
//! serialized HTML) and a change feed of structural events. Nothing here knows
//! about any particular browser mechanism.

mod document;
mod feed;
pub mod problem;

pub use document::{Document, Locator, element_text};
pub use feed::{ChangeFeed, SubscriptionId};

use serde::{Deserialize, Serialize};
use std::sync::{PoisonError, RwLock};

/// A structural change observed on the page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PageEvent {
    /// Elements were added to the tree (outer HTML of each added element)
    Mutation {
        /// Added subtrees
        added: Vec<String>,
    },
    /// The user clicked an element (outer HTML of the click target)
    Click {
        /// Click target
        target: String,
    },
    /// The URL changed without a page load
    Navigated {
        /// New URL
        url: String,
    },
}

/// Read access to the current state of the page
pub trait Page: Send + Sync {
    /// Current URL
    fn url(&self) -> String;

    /// Serialized HTML of the whole document
    fn html(&self) -> String;
}

/// A page whose state is pushed in from outside (native host, trace replay, tests)
#[derive(Debug, Default)]
pub struct SnapshotPage {
    url: RwLock<String>,
    html: RwLock<String>,
}

impl SnapshotPage {
    /// Create a page at `url` with the given document
    pub fn new(url: impl Into<String>, html: impl Into<String>) -> Self {
        Self {
            url: RwLock::new(url.into()),
            html: RwLock::new(html.into()),
        }
    }

    /// Replace the document
    pub fn set_html(&self, html: impl Into<String>) {
        *self.html.write().unwrap_or_else(PoisonError::into_inner) = html.into();
    }

    /// Change the URL
    pub fn set_url(&self, url: impl Into<String>) {
        *self.url.write().unwrap_or_else(PoisonError::into_inner) = url.into();
    }
}

impl Page for SnapshotPage {
    fn url(&self) -> String {
        self.url
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn html(&self) -> String {
        self.html
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
