//! Fixed index paths into embedded datasets

use std::fmt;

use crate::node::{Datasets, Node};

/// Dataset key followed by zero-based array indices
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Path {
    pub dataset: &'static str,
    pub indices: &'static [usize],
}

impl Path {
    pub const fn new(dataset: &'static str, indices: &'static [usize]) -> Self {
        Self { dataset, indices }
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.dataset)?;
        for index in self.indices {
            write!(f, "[{}]", index)?;
        }
        Ok(())
    }
}

/// Look up `path` in `datasets`.
///
/// `None` means the path could not be followed: the dataset is absent, or a
/// step met a null, a non-array or an out-of-range index. A null stored at
/// the final position comes back as `Some(&Node::Null)`.
pub fn extract<'a>(datasets: &'a Datasets, path: &Path) -> Option<&'a Node> {
    datasets.get(path.dataset)?.at(path.indices)
}
