use serde::{Deserialize, Serialize};

/// A page of items returned from Spotify.
///
/// Pages stored in the on-disk cache always hold every item, and have no `next` page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct Page<T> {
    pub items: Vec<T>,
    #[serde(default)]
    pub next: Option<String>,

    // these aren't needed to walk the pages but keep them around for logging purposes
    #[serde(default)]
    pub limit: usize,
    #[serde(default)]
    pub offset: usize,
    #[serde(default)]
    pub total: usize,
}

impl<T> Page<T> {
    /// A page holding every item with nothing after it.
    pub fn complete(items: Vec<T>) -> Self {
        let total = items.len();

        Self {
            items,
            next: None,
            limit: total,
            offset: 0,
            total,
        }
    }
}
