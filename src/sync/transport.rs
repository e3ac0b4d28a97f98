use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

/// Point-to-point data channel provided by the application shell.
/// Delivery is assumed reliable and ordered.
pub trait Transport {
    fn send(&mut self, frame: Vec<u8>);

    fn is_connected(&self) -> bool {
        true
    }
}

type Queue = Rc<RefCell<VecDeque<Vec<u8>>>>;

/// In-process transport: frames sent on one end queue up on the other.
#[derive(Debug, Clone)]
pub struct LoopbackTransport {
    inbox: Queue,
    outbox: Queue,
    connected: Rc<Cell<bool>>,
}

impl LoopbackTransport {
    /// Two connected ends of one channel.
    pub fn pair() -> (Self, Self) {
        let a: Queue = Rc::default();
        let b: Queue = Rc::default();
        let connected = Rc::new(Cell::new(true));
        (
            Self {
                inbox: a.clone(),
                outbox: b.clone(),
                connected: connected.clone(),
            },
            Self {
                inbox: b,
                outbox: a,
                connected,
            },
        )
    }

    /// Takes every frame delivered to this end so far.
    pub fn drain(&self) -> Vec<Vec<u8>> {
        self.inbox.borrow_mut().drain(..).collect()
    }

    pub fn pending(&self) -> usize {
        self.inbox.borrow().len()
    }

    /// Closes the channel for both ends.
    pub fn close(&self) {
        self.connected.set(false);
    }
}

impl Transport for LoopbackTransport {
    fn send(&mut self, frame: Vec<u8>) {
        if self.connected.get() {
            self.outbox.borrow_mut().push_back(frame);
        }
    }

    fn is_connected(&self) -> bool {
        self.connected.get()
    }
}
