//! # Wire Format
//!
//! The fetched document is `{"edits": [...]}`. Records are tagged by which
//! keys are present:
//!
//! | key present | edit   |
//! |-------------|--------|
//! | `_type`     | Delete |
//! | `i`         | Insert |
//! | `np`        | Move   |
//! | none        | Merge  |
//!
//! `cpid` is the node path (the parent path for an Insert), `n` the tag,
//! `attrs` the attribute map and `c` either nested child records or text.
//! A record carrying more than one of the tagging keys is rejected.

use crate::edit::{AttrChanges, AttrValue, NewNode, RemoteEdit};
use crate::errors::DecodeError;
use crate::path::ChildPath;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EditStream {
    #[serde(default)]
    pub edits: Vec<EditRecord>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EditRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpid: Option<Vec<usize>>,

    #[serde(
        rename = "_type",
        alias = "type",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub delete_marker: Option<serde_json::Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub i: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attrs: Option<BTreeMap<String, AttrValue>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub c: Option<RecordContent>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub np: Option<Vec<usize>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordContent {
    Children(Vec<EditRecord>),
    Text(String),
}

impl EditStream {
    pub fn from_json(json: &str) -> Result<Self, DecodeError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Convert every record, failing on the first malformed one
    pub fn decode(&self) -> Result<Vec<RemoteEdit>, DecodeError> {
        self.edits
            .iter()
            .enumerate()
            .map(|(index, record)| record.decode(index))
            .collect()
    }
}

impl EditRecord {
    /// Convert into a [`RemoteEdit`]; `index` is only used for error reporting
    pub fn decode(&self, index: usize) -> Result<RemoteEdit, DecodeError> {
        let tags: Vec<&str> = [
            ("_type", self.delete_marker.is_some()),
            ("i", self.i.is_some()),
            ("np", self.np.is_some()),
        ]
        .into_iter()
        .filter_map(|(key, present)| present.then_some(key))
        .collect();
        if tags.len() > 1 {
            return Err(DecodeError::Ambiguous {
                index,
                keys: tags.join(", "),
            });
        }

        let path = ChildPath::new(
            self.cpid
                .clone()
                .ok_or(DecodeError::MissingField { index, field: "cpid" })?,
        );

        if self.delete_marker.is_some() {
            return Ok(RemoteEdit::Delete { path });
        }

        if let Some(target_index) = self.i {
            return Ok(RemoteEdit::Insert {
                parent: path,
                index: target_index,
                node: self.new_node(index)?,
            });
        }

        if let Some(new_parent) = &self.np {
            return Ok(RemoteEdit::Move {
                path,
                new_parent: ChildPath::new(new_parent.clone()),
            });
        }

        let content = match &self.c {
            None => None,
            Some(RecordContent::Text(text)) => Some(text.clone()),
            Some(RecordContent::Children(_)) => {
                return Err(DecodeError::InvalidContent { index });
            }
        };
        Ok(RemoteEdit::Merge {
            path,
            attributes: self.attr_changes(),
            content,
        })
    }

    fn attr_changes(&self) -> AttrChanges {
        self.attrs
            .iter()
            .flatten()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// An element when `n` is present, otherwise a text node from `c`
    fn new_node(&self, index: usize) -> Result<NewNode, DecodeError> {
        let Some(tag) = &self.n else {
            return match &self.c {
                None => Ok(NewNode::Text(String::new())),
                Some(RecordContent::Text(text)) => Ok(NewNode::Text(text.clone())),
                Some(RecordContent::Children(_)) => Err(DecodeError::InvalidContent { index }),
            };
        };

        let children = match &self.c {
            None => Vec::new(),
            Some(RecordContent::Text(text)) => vec![NewNode::Text(text.clone())],
            Some(RecordContent::Children(records)) => records
                .iter()
                .map(|child| child.new_node(index))
                .collect::<Result<_, _>>()?,
        };

        Ok(NewNode::Element {
            tag: tag.clone(),
            attributes: self.attr_changes(),
            children,
        })
    }
}
