use crate::path::ChildPath;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Direction of a sibling shift
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Shift {
    Insert,
    Remove,
}

impl Shift {
    pub fn value(self) -> isize {
        match self {
            Shift::Insert => 1,
            Shift::Remove => -1,
        }
    }

    /// Apply the shift to a sibling index; `None` on underflow
    pub fn apply(self, index: usize) -> Option<usize> {
        index.checked_add_signed(self.value())
    }
}

/// One local mutation: a child of the node at `path` appeared or vanished at
/// `index`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delta {
    pub shift: Shift,
    pub path: ChildPath,
    pub index: usize,
}

impl Delta {
    pub fn insertion(path: ChildPath, index: usize) -> Self {
        Self {
            shift: Shift::Insert,
            path,
            index,
        }
    }

    pub fn removal(path: ChildPath, index: usize) -> Self {
        Self {
            shift: Shift::Remove,
            path,
            index,
        }
    }

    pub fn is_insertion(&self) -> bool {
        self.shift == Shift::Insert
    }

    /// Path of the inserted or removed child itself
    pub fn affected_path(&self) -> ChildPath {
        self.path.child(self.index)
    }
}

impl fmt::Display for Delta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = match self.shift {
            Shift::Insert => '+',
            Shift::Remove => '-',
        };
        write!(f, "{sign}1 at {}[{}]", self.path, self.index)
    }
}
