//! Bounded in-memory tail of the child's stderr.

use std::sync::{Arc, Mutex, PoisonError};

use gwhost_core::settings::DEFAULT_TAIL_BUDGET;

/// Keeps roughly the last `budget` characters of appended text.
///
/// Cheap to clone; clones share the same buffer.
#[derive(Debug, Clone)]
pub struct TailBuffer {
    inner: Arc<Mutex<TailInner>>,
}

#[derive(Debug)]
struct TailInner {
    text: String,
    chars: usize,
    budget: usize,
}

impl TailBuffer {
    /// Create a tail holding at most `budget` characters.
    pub fn new(budget: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(TailInner {
                text: String::new(),
                chars: 0,
                budget: budget.max(1),
            })),
        }
    }

    /// Append text, dropping the oldest characters beyond the budget.
    pub fn push(&self, chunk: &str) {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        inner.text.push_str(chunk);
        inner.chars += chunk.chars().count();

        if inner.chars > inner.budget {
            let excess = inner.chars - inner.budget;
            let cut = inner
                .text
                .char_indices()
                .nth(excess)
                .map_or(inner.text.len(), |(idx, _)| idx);
            inner.text.drain(..cut);
            inner.chars = inner.budget;
        }
    }

    /// Current contents.
    pub fn read(&self) -> String {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .text
            .clone()
    }

    /// Whether nothing has been captured yet.
    pub fn is_empty(&self) -> bool {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .text
            .is_empty()
    }
}

impl Default for TailBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_TAIL_BUDGET)
    }
}
