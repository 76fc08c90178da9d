//! Shared handle to the application model

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Shared, mutable application model.
///
/// Every update receives a clone of the same handle. Access is scoped to a
/// closure so a lock is never held across an `.await` point:
///
/// ```
/// use lit_up_core::Model;
///
/// let model = Model::new(0_i32);
/// model.update(|count| *count += 1);
/// assert_eq!(model.read(|count| *count), 1);
/// ```
pub struct Model<M> {
    inner: Arc<Mutex<M>>,
}

impl<M> Clone for Model<M> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<M> Model<M> {
    /// Wrap an initial model value.
    pub fn new(model: M) -> Self {
        Self {
            inner: Arc::new(Mutex::new(model)),
        }
    }

    // A panicking update leaves the model as it was at the panic; keep
    // handing it out.
    fn lock(&self) -> MutexGuard<'_, M> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Read the model.
    pub fn read<R>(&self, f: impl FnOnce(&M) -> R) -> R {
        f(&self.lock())
    }

    /// Mutate the model in place.
    pub fn update<R>(&self, f: impl FnOnce(&mut M) -> R) -> R {
        f(&mut self.lock())
    }

    /// Replace the whole model, returning the previous value.
    pub fn replace(&self, model: M) -> M {
        std::mem::replace(&mut *self.lock(), model)
    }

    /// Whether two handles point at the same model.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<M: Clone> Model<M> {
    /// Clone the current model value.
    pub fn snapshot(&self) -> M {
        self.lock().clone()
    }
}

impl<M: Default> Default for Model<M> {
    fn default() -> Self {
        Self::new(M::default())
    }
}

impl<M: fmt::Debug> fmt::Debug for Model<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.read(|model| f.debug_tuple("Model").field(model).finish())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Default, PartialEq)]
    struct Counter {
        count: i32,
    }

    #[test]
    fn test_clones_share_state() {
        let model = Model::new(Counter::default());
        let other = model.clone();

        other.update(|m| m.count = 5);

        assert_eq!(model.read(|m| m.count), 5);
        assert!(model.ptr_eq(&other));
        assert!(!model.ptr_eq(&Model::new(Counter::default())));
    }

    #[test]
    fn test_replace_and_snapshot() {
        let model = Model::new(Counter { count: 1 });
        let old = model.replace(Counter { count: 9 });

        assert_eq!(old, Counter { count: 1 });
        assert_eq!(model.snapshot(), Counter { count: 9 });
    }

    #[test]
    fn test_survives_poisoning() {
        let model = Model::new(Counter::default());
        let poisoner = model.clone();
        let _ = std::thread::spawn(move || {
            poisoner.update(|m| {
                m.count = 3;
                panic!("update blew up");
            })
        })
        .join();

        assert_eq!(model.read(|m| m.count), 3);
    }

    #[test]
    fn test_debug_shows_value() {
        let model = Model::new(Counter { count: 2 });
        assert_eq!(format!("{:?}", model), "Model(Counter { count: 2 })");
    }
}
