//! Lazily expanded computation trees.
//!
//! A [ProtocolProducer] hands out [NativeProtocol]s in an order that respects data dependencies:
//! a [SequentialProducer] only emits from its first child, so two steps of a sequence never end
//! up in the same batch, while a [ParallelProducer] lets all children contribute.
use std::collections::VecDeque;
use std::fmt::{Debug, Formatter};

use crate::protocol::NativeProtocol;
use crate::share::RingElement;

pub enum ProtocolProducer<T: RingElement> {
    Single(SingleProducer<T>),
    Sequential(SequentialProducer<T>),
    Parallel(ParallelProducer<T>),
    Lazy(LazyProducer<T>),
}

impl<T: RingElement> ProtocolProducer<T> {
    pub fn single(protocol: NativeProtocol<T>) -> Self {
        ProtocolProducer::Single(SingleProducer {
            protocol: Some(protocol),
        })
    }

    pub fn sequential(children: Vec<ProtocolProducer<T>>) -> Self {
        ProtocolProducer::Sequential(SequentialProducer {
            children: children.into(),
        })
    }

    pub fn parallel(children: Vec<ProtocolProducer<T>>) -> Self {
        ProtocolProducer::Parallel(ParallelProducer {
            children: children.into(),
        })
    }

    /// A producer built by `constructor` the first time it is polled.
    pub fn lazy<F>(constructor: F) -> Self
    where
        F: FnOnce() -> ProtocolProducer<T> + 'static,
    {
        ProtocolProducer::Lazy(LazyProducer {
            constructor: Some(Box::new(constructor)),
            inner: None,
        })
    }

    /// False only once nothing can ever be produced again.
    pub fn has_next(&mut self) -> bool {
        match self {
            ProtocolProducer::Single(p) => p.protocol.is_some(),
            ProtocolProducer::Sequential(p) => p.has_next(),
            ProtocolProducer::Parallel(p) => p.has_next(),
            ProtocolProducer::Lazy(p) => p.force().has_next(),
        }
    }

    /// Appends at most `capacity` protocols to `out`. A no-op once exhausted.
    pub fn append(&mut self, out: &mut Vec<NativeProtocol<T>>, capacity: usize) {
        if capacity == 0 {
            return;
        }
        match self {
            ProtocolProducer::Single(p) => {
                if let Some(protocol) = p.protocol.take() {
                    out.push(protocol);
                }
            }
            ProtocolProducer::Sequential(p) => p.append(out, capacity),
            ProtocolProducer::Parallel(p) => p.append(out, capacity),
            ProtocolProducer::Lazy(p) => p.force().append(out, capacity),
        }
    }
}

pub struct SingleProducer<T: RingElement> {
    protocol: Option<NativeProtocol<T>>,
}

pub struct SequentialProducer<T: RingElement> {
    children: VecDeque<ProtocolProducer<T>>,
}

impl<T: RingElement> SequentialProducer<T> {
    fn has_next(&mut self) -> bool {
        loop {
            let Some(head) = self.children.front_mut() else {
                return false;
            };
            let inline = matches!(
                head,
                ProtocolProducer::Sequential(_) | ProtocolProducer::Lazy(_)
            );
            if !inline {
                if head.has_next() {
                    return true;
                }
                self.children.pop_front();
                continue;
            }
            // nested sequences and lazy producers are replaced by their contents
            match self.children.pop_front() {
                Some(ProtocolProducer::Sequential(inner)) => {
                    for child in inner.children.into_iter().rev() {
                        self.children.push_front(child);
                    }
                }
                Some(ProtocolProducer::Lazy(lazy)) => {
                    self.children.push_front(lazy.into_inner());
                }
                _ => (),
            }
        }
    }

    fn append(&mut self, out: &mut Vec<NativeProtocol<T>>, capacity: usize) {
        if self.has_next() {
            if let Some(head) = self.children.front_mut() {
                head.append(out, capacity);
            }
        }
    }
}

pub struct ParallelProducer<T: RingElement> {
    children: VecDeque<ProtocolProducer<T>>,
}

impl<T: RingElement> ParallelProducer<T> {
    fn has_next(&mut self) -> bool {
        self.children.retain_mut(|child| child.has_next());
        !self.children.is_empty()
    }

    fn append(&mut self, out: &mut Vec<NativeProtocol<T>>, capacity: usize) {
        let limit = out.len() + capacity;
        let mut i = 0;
        while i < self.children.len() && out.len() < limit {
            // a child is only removed when found exhausted before appending, so protocols it
            // just handed out are evaluated before its next steps are looked at
            if self.children[i].has_next() {
                let remaining = limit - out.len();
                self.children[i].append(out, remaining);
                i += 1;
            } else {
                self.children.remove(i);
            }
        }
    }
}

type Constructor<T> = Box<dyn FnOnce() -> ProtocolProducer<T>>;

pub struct LazyProducer<T: RingElement> {
    constructor: Option<Constructor<T>>,
    inner: Option<Box<ProtocolProducer<T>>>,
}

impl<T: RingElement> LazyProducer<T> {
    fn force(&mut self) -> &mut ProtocolProducer<T> {
        let constructor = &mut self.constructor;
        self.inner.get_or_insert_with(|| {
            Box::new(match constructor.take() {
                Some(constructor) => constructor(),
                None => ProtocolProducer::sequential(Vec::new()),
            })
        })
    }

    fn into_inner(mut self) -> ProtocolProducer<T> {
        self.force();
        match self.inner {
            Some(inner) => *inner,
            None => ProtocolProducer::sequential(Vec::new()),
        }
    }
}

impl<T: RingElement> Debug for ProtocolProducer<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ProtocolProducer::Single(p) => write!(f, "Single({})", p.protocol.is_some()),
            ProtocolProducer::Sequential(p) => f.debug_list().entries(&p.children).finish(),
            ProtocolProducer::Parallel(p) => {
                write!(f, "Parallel")?;
                f.debug_list().entries(&p.children).finish()
            }
            ProtocolProducer::Lazy(LazyProducer { inner: None, .. }) => write!(f, "Lazy(..)"),
            ProtocolProducer::Lazy(LazyProducer { inner: Some(inner), .. }) => {
                write!(f, "Lazy({:?})", inner)
            }
        }
    }
}

#[cfg(test)]
mod test {
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    use super::ProtocolProducer;
    use crate::protocol::test::RecordingProtocol;
    use crate::protocol::NativeProtocol;
    use crate::share::CompUInt64;

    type Log = Rc<RefCell<Vec<(usize, usize)>>>;

    fn recording(id: usize, log: &Log) -> ProtocolProducer<CompUInt64> {
        ProtocolProducer::single(NativeProtocol::Recording(RecordingProtocol::new(id, 1, log.clone())))
    }

    /// Drains the producer like the evaluator does and returns the recorded ids per batch.
    fn drain(mut producer: ProtocolProducer<CompUInt64>, capacity: usize, log: &Log) -> Vec<Vec<usize>> {
        let mut batches = Vec::new();
        while producer.has_next() {
            let mut batch = Vec::new();
            producer.append(&mut batch, capacity);
            assert!(batch.len() <= capacity);
            log.borrow_mut().clear();
            for p in batch.iter_mut() {
                if let NativeProtocol::Recording(p) = p {
                    p.evaluate(0).unwrap();
                }
            }
            batches.push(log.borrow().iter().map(|(id, _)| *id).collect());
        }
        batches
    }

    #[test]
    fn sequential_order_is_independent_of_capacity() {
        for capacity in [1, 2, 5, 100] {
            let log = Log::default();
            let producer = ProtocolProducer::sequential(vec![
                recording(0, &log),
                ProtocolProducer::sequential(vec![recording(1, &log), recording(2, &log)]),
                recording(3, &log),
            ]);
            let batches = drain(producer, capacity, &log);
            assert_eq!(batches, vec![vec![0], vec![1], vec![2], vec![3]]);
        }
    }

    #[test]
    fn parallel_respects_capacity_and_order() {
        let log = Log::default();
        let producer = ProtocolProducer::parallel((0..5).map(|i| recording(i, &log)).collect());
        let batches = drain(producer, 2, &log);
        assert_eq!(batches, vec![vec![0, 1], vec![2, 3], vec![4]]);
    }

    #[test]
    fn parallel_of_sequences_interleaves_steps() {
        let log = Log::default();
        let producer = ProtocolProducer::parallel(vec![
            ProtocolProducer::sequential(vec![recording(0, &log), recording(1, &log)]),
            ProtocolProducer::sequential(vec![
                recording(10, &log),
                recording(11, &log),
                recording(12, &log),
            ]),
        ]);
        let batches = drain(producer, 10, &log);
        assert_eq!(batches, vec![vec![0, 10], vec![1, 11], vec![12]]);
    }

    #[test]
    fn lazy_is_built_on_first_poll() {
        let log = Log::default();
        let built = Rc::new(Cell::new(false));
        let flag = built.clone();
        let inner_log = log.clone();
        let mut producer = ProtocolProducer::sequential(vec![
            recording(0, &log),
            ProtocolProducer::lazy(move || {
                flag.set(true);
                ProtocolProducer::parallel(vec![recording(1, &inner_log), recording(2, &inner_log)])
            }),
        ]);
        assert!(producer.has_next());
        let mut batch = Vec::new();
        producer.append(&mut batch, 10);
        assert_eq!(batch.len(), 1);
        assert!(!built.get());
        let batches = drain(producer, 10, &log);
        assert!(built.get());
        assert_eq!(batches, vec![vec![1, 2]]);
    }

    #[test]
    fn exhausted_producers_append_nothing() {
        let log = Log::default();
        let mut producer = ProtocolProducer::sequential(vec![ProtocolProducer::parallel(vec![])]);
        assert!(!producer.has_next());
        let mut batch = Vec::new();
        producer.append(&mut batch, 4);
        assert!(batch.is_empty());
        let mut single = recording(0, &log);
        single.append(&mut batch, 0);
        assert!(batch.is_empty());
        single.append(&mut batch, 1);
        single.append(&mut batch, 1);
        assert_eq!(batch.len(), 1);
        assert!(!single.has_next());
    }
}
