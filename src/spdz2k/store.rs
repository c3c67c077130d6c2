use crate::mpc_core::share::AuthenticatedShare;

/// The values opened since the last MAC check, together with the shares they were opened from.
pub struct OpenedValueStore<T> {
    shares: Vec<AuthenticatedShare<T>>,
    opened: Vec<T>,
}

impl<T> Default for OpenedValueStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> OpenedValueStore<T> {
    pub fn new() -> Self {
        Self {
            shares: Vec::new(),
            opened: Vec::new(),
        }
    }

    pub fn push_opened_value(&mut self, share: AuthenticatedShare<T>, opened: T) {
        self.shares.push(share);
        self.opened.push(opened);
    }

    /// Removes and returns everything stored, in insertion order.
    pub fn pop_values(&mut self) -> (Vec<AuthenticatedShare<T>>, Vec<T>) {
        (
            std::mem::take(&mut self.shares),
            std::mem::take(&mut self.opened),
        )
    }

    pub fn len(&self) -> usize {
        self.opened.len()
    }

    pub fn is_empty(&self) -> bool {
        self.opened.is_empty()
    }

    pub fn exceeds_threshold(&self, threshold: usize) -> bool {
        self.len() > threshold
    }
}
