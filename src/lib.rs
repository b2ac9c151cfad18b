//! leetsync - accepted LeetCode solutions, committed to GitHub
//!
//! The pipeline has three stages:
//! 1. [`editor`] reads the literal solution text out of the page's code editor
//! 2. [`watcher`] watches page events for a submit followed by an "Accepted" verdict
//! 3. [`sync`] upserts the resulting record into a GitHub repository, queueing
//!    it locally when that is not possible
//!
//! Everything the pipeline talks to (the page, the remote content store, the
//! local key-value store) sits behind a trait so it can be swapped in tests.

pub mod auth;
pub mod config;
pub mod editor;
pub mod error;
pub mod host;
pub mod messages;
pub mod page;
pub mod relay;
pub mod storage;
pub mod store;
pub mod sync;
pub mod types;
pub mod watcher;
