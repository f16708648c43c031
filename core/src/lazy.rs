//! Lazily recomputed cached values.

use parking_lot::Mutex;

/// A cached value that is recomputed on demand after invalidation.
///
/// Readers call [`get_or_compute`](Self::get_or_compute); writers call
/// [`invalidate`](Self::invalidate). The compute closure only runs when the
/// cell holds no valid value.
pub struct LazyCell<T> {
    value: Mutex<Option<T>>,
}

impl<T: Clone> LazyCell<T> {
    /// Create an empty (invalid) cell.
    pub fn new() -> Self {
        Self {
            value: Mutex::new(None),
        }
    }

    /// Create a cell that already holds a valid value.
    pub fn with_value(value: T) -> Self {
        Self {
            value: Mutex::new(Some(value)),
        }
    }

    /// Return the cached value, computing it first if the cell is invalid.
    ///
    /// The second element is `true` when `compute` ran.
    pub fn get_or_compute(&self, compute: impl FnOnce() -> T) -> (T, bool) {
        let mut value = self.value.lock();
        match value.as_ref() {
            Some(v) => (v.clone(), false),
            None => {
                let v = compute();
                *value = Some(v.clone());
                (v, true)
            }
        }
    }

    /// Cached value without recomputation.
    pub fn get(&self) -> Option<T> {
        self.value.lock().clone()
    }

    pub fn invalidate(&self) {
        *self.value.lock() = None;
    }

    pub fn is_valid(&self) -> bool {
        self.value.lock().is_some()
    }
}

impl<T: Clone> Default for LazyCell<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for LazyCell<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("LazyCell").field(&*self.value.lock()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn computes_once_until_invalidated() {
        let cell = LazyCell::new();
        let mut runs = 0;

        let (v, recomputed) = cell.get_or_compute(|| {
            runs += 1;
            7
        });
        assert_eq!((v, recomputed), (7, true));

        let (v, recomputed) = cell.get_or_compute(|| {
            runs += 1;
            8
        });
        assert_eq!((v, recomputed), (7, false));
        assert_eq!(runs, 1);

        cell.invalidate();
        assert!(!cell.is_valid());
        let (v, recomputed) = cell.get_or_compute(|| 9);
        assert_eq!((v, recomputed), (9, true));
    }

    #[test]
    fn with_value_is_valid() {
        let cell = LazyCell::with_value("ready");
        assert!(cell.is_valid());
        assert_eq!(cell.get(), Some("ready"));
    }
}
