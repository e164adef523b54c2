//! # Treeweave Patcher
//!
//! Replays a remote stream of positional edits onto a tree that local code is
//! mutating at the same time.
//!
//! Both sides address nodes by child path, so each side can shift the
//! positions the other refers to. Local mutations go through a
//! [`PatchedDocument`], which records every sibling shift as a [`Delta`]; the
//! [`Rebaser`] folds those deltas into the remote edits still queued before
//! they are resolved, and the visibility gate hides nodes that lie ahead of the
//! running local mutator.
//!
//! ## Architecture
//!
//! ```text
//! local mutator ──► PatchedDocument ──► Reconciler ──► Rebaser
//!                       │  (queries)        │ poll()
//!                       ▼                   ▼
//!                  visibility gate     remote edits ──► inner tree
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use treeweave_patcher::{PatchedDocument, PatcherConfig, ChildPath, RemoteEdit, NewNode, Phase};
//! use treeweave_dom::Document;
//!
//! let mut doc = PatchedDocument::install(Document::new(), PatcherConfig::default());
//! doc.receive_edits([RemoteEdit::Insert {
//!     parent: ChildPath::root(),
//!     index: 0,
//!     node: NewNode::element("div"),
//! }]);
//! let outcome = doc.signal_complete();
//! assert_eq!(outcome.phase, Phase::Done);
//! assert_eq!(doc.inner().to_html(), "<div></div>");
//! ```

mod applier;
mod bootstrap;
mod collection;
mod config;
mod delta;
mod edit;
mod errors;
mod interceptor;
mod path;
mod rebase;
mod reconciler;
mod visibility;
mod wire;

pub use applier::PollOutcome;
pub use bootstrap::{Bootstrap, EditSource, FileSource, PendingFetch, StaticSource};
pub use collection::{LiveCollection, LiveQuery};
pub use config::PatcherConfig;
pub use delta::{Delta, Shift};
pub use edit::{AttrChanges, AttrValue, NewNode, RemoteEdit};
pub use errors::{ApplyError, BootstrapError, DecodeError, ProtocolViolation};
pub use interceptor::PatchedDocument;
pub use path::{path_of, paths_equal, resolve, ChildPath, Position};
pub use rebase::{rebase_path, update_affected_ancestors, Rebase, Rebaser};
pub use reconciler::{Phase, Reconciler};
pub use visibility::is_visible;
pub use wire::{EditRecord, EditStream, RecordContent};
