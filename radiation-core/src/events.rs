//! Disposable event subscriptions.
//!
//! Map and DOM listeners are registered through [`Subscription`]s so the view
//! can drop every callback it installed when it is torn down.

/// Handle to a registered listener. Disposing runs the unregister closure once;
/// dropping an undisposed handle disposes it.
#[must_use = "dropping a Subscription unregisters the listener"]
pub struct Subscription {
    dispose: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    pub fn new(dispose: impl FnOnce() + 'static) -> Self {
        Subscription {
            dispose: Some(Box::new(dispose)),
        }
    }

    pub fn dispose(mut self) {
        self.run();
    }

    pub fn is_active(&self) -> bool {
        self.dispose.is_some()
    }

    fn run(&mut self) {
        if let Some(f) = self.dispose.take() {
            f();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.run();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.is_active())
            .finish()
    }
}

/// Subscriptions owned by one view.
#[derive(Debug, Default)]
pub struct Subscriptions {
    items: Vec<Subscription>,
}

impl Subscriptions {
    pub fn push(&mut self, sub: Subscription) {
        self.items.push(sub);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Dispose in reverse registration order.
    pub fn dispose_all(&mut self) {
        while let Some(sub) = self.items.pop() {
            sub.dispose();
        }
    }
}
