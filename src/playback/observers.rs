use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

pub type Callback<T> = Rc<dyn Fn(&T)>;

type Slots<T> = RefCell<Vec<(u64, Callback<T>)>>;

/// A list of callbacks that can be registered and disposed independently.
pub struct Observers<T> {
    slots: Rc<Slots<T>>,
    next_key: Cell<u64>,
}

impl<T: 'static> Observers<T> {
    pub fn new() -> Self {
        Self {
            slots: Rc::new(RefCell::new(Vec::new())),
            next_key: Cell::new(0),
        }
    }

    pub fn subscribe(&self, callback: impl Fn(&T) + 'static) -> Subscription {
        let key = self.next_key.get();
        self.next_key.set(key + 1);
        self.slots.borrow_mut().push((key, Rc::new(callback)));

        let slots: Weak<Slots<T>> = Rc::downgrade(&self.slots);
        Subscription::new(move || {
            if let Some(slots) = slots.upgrade() {
                slots.borrow_mut().retain(|(k, _)| *k != key);
            }
        })
    }

    /// Copy of the registered callbacks, so callers can invoke them without
    /// holding a borrow on the list.
    pub fn callbacks(&self) -> Vec<Callback<T>> {
        self.slots
            .borrow()
            .iter()
            .map(|(_, callback)| Rc::clone(callback))
            .collect()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.slots.borrow().len()
    }

    pub fn clear(&self) {
        self.slots.borrow_mut().clear();
    }
}

impl<T: 'static> Default for Observers<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Disposer returned by [`Observers::subscribe`]. Dropping it keeps the
/// callback registered; call [`Subscription::unsubscribe`] to remove it.
#[must_use = "keep the subscription to be able to unsubscribe later"]
pub struct Subscription {
    dispose: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    pub(crate) fn new(dispose: impl FnOnce() + 'static) -> Self {
        Self {
            dispose: Some(Box::new(dispose)),
        }
    }

    pub fn unsubscribe(mut self) {
        if let Some(dispose) = self.dispose.take() {
            dispose();
        }
    }
}
