//! Single-assignment values that connect protocols evaluated in different batches.
//!
//! A [Completer] is held by the protocol that produces a value, the matching [Promise] by
//! everyone that consumes it. Completing consumes the completer, so a value is assigned at most
//! once.
use std::cell::RefCell;
use std::mem;
use std::rc::Rc;

use oneshot::TryRecvError;

use crate::mpc_core::party::error::{MpcError, MpcResult};

enum Slot<T> {
    Pending(oneshot::Receiver<T>),
    Ready(T),
    Abandoned,
}

pub struct Promise<T> {
    slot: Rc<RefCell<Slot<T>>>,
}

pub struct Completer<T> {
    sender: oneshot::Sender<T>,
}

/// Creates a connected completer/promise pair.
pub fn promise<T>() -> (Completer<T>, Promise<T>) {
    let (sender, receiver) = oneshot::channel();
    (
        Completer { sender },
        Promise {
            slot: Rc::new(RefCell::new(Slot::Pending(receiver))),
        },
    )
}

impl<T> Completer<T> {
    pub fn complete(self, value: T) {
        // all promises may already be gone, the value is not needed then
        let _ = self.sender.send(value);
    }
}

impl<T> Clone for Promise<T> {
    fn clone(&self) -> Self {
        Self {
            slot: Rc::clone(&self.slot),
        }
    }
}

impl<T: Clone> Promise<T> {
    /// An already completed promise.
    pub fn ready(value: T) -> Self {
        Self {
            slot: Rc::new(RefCell::new(Slot::Ready(value))),
        }
    }

    fn try_resolve(&self) {
        let mut slot = self.slot.borrow_mut();
        if let Slot::Pending(receiver) = &*slot {
            match receiver.try_recv() {
                Ok(value) => *slot = Slot::Ready(value),
                Err(TryRecvError::Empty) => (),
                Err(TryRecvError::Disconnected) => *slot = Slot::Abandoned,
            }
        }
    }

    /// Non-blocking read.
    pub fn poll(&self) -> Option<T> {
        self.try_resolve();
        match &*self.slot.borrow() {
            Slot::Ready(value) => Some(value.clone()),
            _ => None,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.poll().is_some()
    }

    /// Reads the value, failing if it has not been produced yet.
    pub fn get(&self) -> MpcResult<T> {
        self.try_resolve();
        match &*self.slot.borrow() {
            Slot::Ready(value) => Ok(value.clone()),
            Slot::Pending(_) => Err(MpcError::Misuse(
                "value read before the protocol producing it finished".to_string(),
            )),
            Slot::Abandoned => Err(MpcError::Misuse(
                "the protocol producing this value was dropped".to_string(),
            )),
        }
    }

    /// Blocks until the value is available.
    pub fn wait(&self) -> MpcResult<T> {
        let mut slot = self.slot.borrow_mut();
        if let Slot::Pending(_) = &*slot {
            if let Slot::Pending(receiver) = mem::replace(&mut *slot, Slot::Abandoned) {
                *slot = Slot::Ready(receiver.recv()?);
            }
        }
        match &*slot {
            Slot::Ready(value) => Ok(value.clone()),
            _ => Err(MpcError::Receive),
        }
    }
}

/// Values an application can hand back to the engine for reading after evaluation.
pub trait Resolve {
    type Output;

    fn resolve(&self) -> MpcResult<Self::Output>;
}

impl<T: Clone> Resolve for Promise<T> {
    type Output = T;

    fn resolve(&self) -> MpcResult<T> {
        self.get()
    }
}

impl<R: Resolve> Resolve for Vec<R> {
    type Output = Vec<R::Output>;

    fn resolve(&self) -> MpcResult<Self::Output> {
        self.iter().map(Resolve::resolve).collect()
    }
}

impl<A: Resolve, B: Resolve> Resolve for (A, B) {
    type Output = (A::Output, B::Output);

    fn resolve(&self) -> MpcResult<Self::Output> {
        Ok((self.0.resolve()?, self.1.resolve()?))
    }
}

impl Resolve for () {
    type Output = ();

    fn resolve(&self) -> MpcResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::{promise, Promise, Resolve};
    use crate::mpc_core::party::error::MpcError;

    #[test]
    fn read_before_and_after_completion() {
        let (completer, p) = promise::<u32>();
        let q = p.clone();
        assert_eq!(p.poll(), None);
        assert!(matches!(p.get(), Err(MpcError::Misuse(_))));
        completer.complete(5);
        assert_eq!(p.poll(), Some(5));
        assert_eq!(q.get().unwrap(), 5);
        assert_eq!(q.wait().unwrap(), 5);
    }

    #[test]
    fn dropped_completer() {
        let (completer, p) = promise::<u32>();
        drop(completer);
        assert!(matches!(p.get(), Err(MpcError::Misuse(_))));
        assert!(matches!(p.wait(), Err(MpcError::Receive)));
    }

    #[test]
    fn wait_blocks_until_completed() {
        let (completer, p) = promise::<u32>();
        completer.complete(9);
        assert_eq!(p.wait().unwrap(), 9);
        assert!(p.is_ready());
    }

    #[test]
    fn resolve_composites() {
        let values = vec![Promise::ready(1u8), Promise::ready(2u8)];
        let pair = (Promise::ready(true), values);
        assert_eq!(pair.resolve().unwrap(), (true, vec![1, 2]));
    }
}
