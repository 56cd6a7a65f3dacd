use std::fmt;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// A thread-safe, reference-counted resource container with read-write locking.
///
/// `MtResource` provides synchronized access to a value of type `T` that can be shared
/// across threads. It uses an `Arc<RwLock<T>>` internally. The world stores every
/// resident chunk in one, so a chunk produced on a generation worker can be handed to
/// the driving thread and read while the chunk map keeps its own handle.
///
/// # Type Parameters
/// - `T`: The type of the contained resource, must be `Send + Sync`
///
/// # Examples
///
/// ## Sharing Between Threads
/// ```
/// # use std::thread;
/// use rail_world::core::MtResource;
///
/// let counter = MtResource::new(0);
/// let counter_clone = counter.clone();
///
/// let handle = thread::spawn(move || {
///     *counter_clone.get_mut() += 1;
/// });
///
/// handle.join().unwrap();
/// assert_eq!(*counter.get(), 1);
/// ```
///
/// # Performance Considerations
/// - Read operations (`get()`) can occur concurrently
/// - Write operations (`get_mut()`) are exclusive and will block other operations
pub struct MtResource<T: Send + Sync> {
    resource: Arc<RwLock<T>>,
}

impl<T: Send + Sync + 'static> MtResource<T> {
    /// Creates a new `MtResource` containing the given value.
    pub fn new(resource: T) -> Self {
        Self {
            resource: Arc::new(RwLock::new(resource)),
        }
    }

    /// Returns a read-only guard that allows reading the contained value.
    ///
    /// # Panics
    /// Panics if the lock is poisoned.
    pub fn get(&self) -> RwLockReadGuard<'_, T> {
        self.resource.read().unwrap()
    }

    /// Returns a mutable guard that allows modifying the contained value.
    ///
    /// # Panics
    /// Panics if the lock is poisoned.
    pub fn get_mut(&self) -> RwLockWriteGuard<'_, T> {
        self.resource.write().unwrap()
    }

    /// Whether two handles point at the same resource.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.resource, &other.resource)
    }
}

impl<T: Send + Sync> Clone for MtResource<T> {
    fn clone(&self) -> Self {
        Self {
            resource: self.resource.clone(),
        }
    }
}

impl<T: Send + Sync + fmt::Debug> fmt::Debug for MtResource<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.resource.try_read() {
            Ok(guard) => f.debug_tuple("MtResource").field(&*guard).finish(),
            Err(_) => f.write_str("MtResource(<locked>)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_the_value() {
        let resource = MtResource::new(vec![1, 2, 3]);
        let clone = resource.clone();
        clone.get_mut().push(4);
        assert_eq!(resource.get().len(), 4);
        assert!(resource.ptr_eq(&clone));
        assert!(!resource.ptr_eq(&MtResource::new(vec![])));
    }
}
