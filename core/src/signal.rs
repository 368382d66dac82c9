//! Synchronous listener lists.
//!
//! Dictionaries announce mutations (`dictionary_changed`) to match-state
//! caches through these. Emission runs every listener to completion before
//! the mutator returns; listeners must not re-enter the emitting object.
//! There is no locking: the whole pipeline is single-threaded by contract.

use std::cell::RefCell;
use std::rc::Rc;

type Listener<A> = Rc<dyn Fn(&A)>;

/// Handle returned by [`Signal::connect`]; pass it back to
/// [`Signal::disconnect`] to deregister.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Connection(u64);

pub struct Signal<A> {
    listeners: RefCell<Vec<(u64, Listener<A>)>>,
    next_id: RefCell<u64>,
}

impl<A> Default for Signal<A> {
    fn default() -> Self {
        Self {
            listeners: RefCell::new(Vec::new()),
            next_id: RefCell::new(0),
        }
    }
}

impl<A> Signal<A> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connect(&self, f: impl Fn(&A) + 'static) -> Connection {
        let mut id = self.next_id.borrow_mut();
        *id += 1;
        self.listeners.borrow_mut().push((*id, Rc::new(f)));
        Connection(*id)
    }

    pub fn disconnect(&self, conn: Connection) {
        self.listeners.borrow_mut().retain(|(id, _)| *id != conn.0);
    }

    pub fn emit(&self, arg: &A) {
        // Clone the handles so a listener may connect/disconnect while we run.
        let snapshot: Vec<Listener<A>> = self
            .listeners
            .borrow()
            .iter()
            .map(|(_, f)| Rc::clone(f))
            .collect();
        for f in snapshot {
            f(arg);
        }
    }
}

impl<A> std::fmt::Debug for Signal<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signal")
            .field("listeners", &self.listeners.borrow().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_connect_emit_disconnect() {
        let hits = Rc::new(Cell::new(0));
        let signal: Signal<usize> = Signal::new();

        let hits2 = Rc::clone(&hits);
        let conn = signal.connect(move |layer| {
            assert_eq!(*layer, 1);
            hits2.set(hits2.get() + 1);
        });

        signal.emit(&1);
        assert_eq!(hits.get(), 1);

        signal.disconnect(conn);
        signal.emit(&1);
        assert_eq!(hits.get(), 1);
    }
}
