use super::tree::TreeEntry;
use crate::snapshot::{estimate_tokens, FileMap};
use parking_lot::Mutex;

/// Shared scan results, guarded by a single lock.
///
/// Owned by one `scan` call and lent to its workers. Every mutation (path
/// append, file insert, budget accounting) happens under the same lock.
pub(crate) struct Collector {
    inner: Mutex<Collected>,
    token_limit: Option<usize>,
}

#[derive(Default)]
pub(crate) struct Collected {
    pub entries: Vec<TreeEntry>,
    pub files: FileMap,
    pub tokens: usize,
    pub over_budget: usize,
    pub binary: usize,
}

impl Collector {
    pub fn new(token_limit: Option<usize>) -> Self {
        Self {
            inner: Mutex::new(Collected::default()),
            token_limit,
        }
    }

    pub fn record(&self, entry: TreeEntry) {
        self.inner.lock().entries.push(entry);
    }

    pub fn record_binary(&self) {
        self.inner.lock().binary += 1;
    }

    /// Cheap pre-read check so obviously oversized files are not read.
    pub fn fits(&self, len: usize) -> bool {
        match self.token_limit {
            Some(limit) => self.inner.lock().tokens + estimate_tokens(len) <= limit,
            None => true,
        }
    }

    /// Include a file if its estimate fits the remaining budget.
    pub fn offer(&self, path: String, content: String) -> bool {
        let cost = estimate_tokens(content.len());
        let mut inner = self.inner.lock();

        if let Some(limit) = self.token_limit {
            if inner.tokens + cost > limit {
                inner.over_budget += 1;
                return false;
            }
        }

        inner.tokens += cost;
        inner.files.insert(path, content);
        true
    }

    pub fn skip_over_budget(&self) {
        self.inner.lock().over_budget += 1;
    }

    pub fn into_inner(self) -> Collected {
        self.inner.into_inner()
    }
}
