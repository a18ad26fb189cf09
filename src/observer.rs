// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::sync::{Arc, Mutex, Weak};

type Callback = Arc<dyn Fn() + Send + Sync>;

#[derive(Default)]
struct Slots {
    next_id: u64,
    callbacks: Vec<(u64, Callback)>,
}

/// An element modification signal.
///
/// Clones share the same set of connections.
#[derive(Clone, Default)]
pub struct ModifiedSignal {
    slots: Arc<Mutex<Slots>>,
}

impl ModifiedSignal {
    /// Creates a signal without connections.
    pub fn new() -> Self {
        ModifiedSignal::default()
    }

    /// Registers a callback.
    ///
    /// The callback stays connected while the returned token is alive.
    pub fn connect<F: Fn() + Send + Sync + 'static>(&self, f: F) -> Connection {
        let mut slots = match self.slots.lock() {
            Ok(slots) => slots,
            Err(poisoned) => poisoned.into_inner(),
        };

        let id = slots.next_id;
        slots.next_id += 1;
        slots.callbacks.push((id, Arc::new(f)));

        Connection {
            slots: Arc::downgrade(&self.slots),
            id,
        }
    }

    /// Calls every connected callback.
    ///
    /// Callbacks may connect to or disconnect from this signal.
    /// Such changes apply to the next emission.
    pub fn emit(&self) {
        let callbacks: Vec<Callback> = match self.slots.lock() {
            Ok(slots) => slots.callbacks.iter().map(|(_, f)| f.clone()).collect(),
            Err(poisoned) => {
                let slots = poisoned.into_inner();
                slots.callbacks.iter().map(|(_, f)| f.clone()).collect()
            }
        };

        for f in callbacks {
            f();
        }
    }

    /// Returns the number of live connections.
    pub fn connections(&self) -> usize {
        match self.slots.lock() {
            Ok(slots) => slots.callbacks.len(),
            Err(poisoned) => poisoned.into_inner().callbacks.len(),
        }
    }
}

impl std::fmt::Debug for ModifiedSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("ModifiedSignal")
            .field("connections", &self.connections())
            .finish()
    }
}

/// A connection token returned by [`ModifiedSignal::connect`].
///
/// Disconnects on drop.
#[derive(Debug)]
pub struct Connection {
    slots: Weak<Mutex<Slots>>,
    id: u64,
}

impl Connection {
    /// Disconnects explicitly.
    pub fn disconnect(self) {}
}

impl Drop for Connection {
    fn drop(&mut self) {
        if let Some(slots) = self.slots.upgrade() {
            let mut slots = match slots.lock() {
                Ok(slots) => slots,
                Err(poisoned) => poisoned.into_inner(),
            };
            slots.callbacks.retain(|(id, _)| *id != self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn disconnect_on_drop() {
        let signal = ModifiedSignal::new();
        let counter = Arc::new(AtomicUsize::new(0));

        let c = counter.clone();
        let conn = signal.connect(move || {
            c.fetch_add(1, Ordering::Relaxed);
        });

        signal.emit();
        assert_eq!(counter.load(Ordering::Relaxed), 1);

        drop(conn);
        signal.emit();
        assert_eq!(counter.load(Ordering::Relaxed), 1);
        assert_eq!(signal.connections(), 0);
    }

    #[test]
    fn reentrant_callbacks() {
        let signal = ModifiedSignal::new();
        let held: Arc<Mutex<Vec<Connection>>> = Arc::default();

        // Drops every held connection.
        let h = held.clone();
        let _clear = signal.connect(move || {
            h.lock().unwrap().clear();
        });

        // Connects one more callback.
        let (s, h) = (signal.clone(), held.clone());
        let grow = signal.connect(move || {
            let conn = s.connect(|| {});
            h.lock().unwrap().push(conn);
        });

        signal.emit();
        assert_eq!(signal.connections(), 3);

        signal.emit();
        assert_eq!(signal.connections(), 3);

        drop(grow);
        signal.emit();
        assert_eq!(signal.connections(), 1);
    }

    #[test]
    fn token_outlives_signal() {
        let signal = ModifiedSignal::new();
        let conn = signal.connect(|| {});
        drop(signal);
        conn.disconnect();
    }
}
