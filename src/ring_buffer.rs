//! SPSC Ring Buffer - lock-free single-producer/single-consumer channel.
//!
//! Carries `RingRequest` values from a network/ingress thread into the
//! matching engine's single writer thread without blocking either side.
//! Capacity is a runtime constructor argument (not a compile-time
//! power of two), so index arithmetic uses plain modulo rather than a
//! bitmask; the backing store holds `capacity + 1` slots so that a full
//! buffer (`next_head == tail`) is always distinguishable from an empty
//! one (`head == tail`).

use std::cell::UnsafeCell;
use std::mem::MaybeUninit;
use std::sync::atomic::{fence, AtomicUsize, Ordering};

use crate::command::Side;

/// A single queued request: either a submit or a cancel.
///
/// Deliberately narrower than `Command`/`PlaceOrder` - the wire format
/// carries only what price-time priority and cancellation need
/// (identifier, trader tag, price, quantity, side, and which operation
/// this is). Order-type richness never crosses the ring buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RingRequest {
    pub order_id: u64,
    pub trader_tag: u64,
    pub price: u64,
    pub qty: u64,
    pub side: Side,
    /// `true` for a submit, `false` for a cancel. When `false`, only
    /// `order_id` is meaningful.
    pub is_submit: bool,
}

impl RingRequest {
    /// Build a submit request.
    #[inline]
    pub const fn submit(order_id: u64, trader_tag: u64, side: Side, price: u64, qty: u64) -> Self {
        Self {
            order_id,
            trader_tag,
            price,
            qty,
            side,
            is_submit: true,
        }
    }

    /// Build a cancel request.
    #[inline]
    pub const fn cancel(order_id: u64) -> Self {
        Self {
            order_id,
            trader_tag: 0,
            price: 0,
            qty: 0,
            side: Side::Bid,
            is_submit: false,
        }
    }
}

/// Cache-line padded wrapper, so the producer's head and the consumer's
/// tail never share a line and false-share under contention.
#[repr(align(64))]
struct CachePadded<T>(T);

const SPIN_THRESHOLD: usize = 256;

/// The ring buffer itself. Use [`RingBuffer::split`] to obtain a
/// [`Producer`]/[`Consumer`] pair; the buffer is not meant to be driven
/// directly from both ends.
pub struct RingBuffer<T> {
    slots: Box<[UnsafeCell<MaybeUninit<T>>]>,
    head: CachePadded<AtomicUsize>,
    tail: CachePadded<AtomicUsize>,
}

/// The write half: pushes requests in from the ingress side.
pub struct Producer<'a, T> {
    rb: &'a RingBuffer<T>,
}

/// The read half: drains requests into the matching engine.
pub struct Consumer<'a, T> {
    rb: &'a RingBuffer<T>,
}

// Safety: slots are only ever touched by whichever side currently owns
// that index, established by the head/tail handoff below.
unsafe impl<T: Send> Send for RingBuffer<T> {}
unsafe impl<T: Send> Sync for RingBuffer<T> {}

impl<T> Drop for RingBuffer<T> {
    fn drop(&mut self) {
        let mut tail = *self.tail.0.get_mut();
        let head = *self.head.0.get_mut();
        while tail != head {
            unsafe {
                (*self.slots[tail].get()).assume_init_drop();
            }
            tail = (tail + 1) % self.slots.len();
        }
    }
}

impl<T> RingBuffer<T> {
    /// Create a new ring buffer able to hold `capacity` items in flight.
    ///
    /// # Panics
    /// Panics if `capacity` is zero.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "ring buffer capacity must be non-zero");

        let slots = (0..capacity + 1)
            .map(|_| UnsafeCell::new(MaybeUninit::uninit()))
            .collect::<Vec<_>>()
            .into_boxed_slice();

        Self {
            slots,
            head: CachePadded(AtomicUsize::new(0)),
            tail: CachePadded(AtomicUsize::new(0)),
        }
    }

    /// Number of items the buffer can hold (not counting the sentinel slot).
    pub fn capacity(&self) -> usize {
        self.slots.len() - 1
    }

    /// Split into a producer/consumer pair, resetting the buffer to empty.
    pub fn split(&mut self) -> (Producer<'_, T>, Consumer<'_, T>) {
        *self.head.0.get_mut() = 0;
        *self.tail.0.get_mut() = 0;
        (Producer { rb: self }, Consumer { rb: self })
    }

    fn push(&self, item: T) -> Result<(), T> {
        let head = self.head.0.load(Ordering::Relaxed);
        let next_head = (head + 1) % self.slots.len();

        let tail = self.tail.0.load(Ordering::Acquire);
        if next_head == tail {
            return Err(item);
        }

        fence(Ordering::Acquire);
        unsafe {
            (*self.slots[head].get()).write(item);
        }
        self.head.0.store(next_head, Ordering::Release);
        Ok(())
    }

    fn pop(&self) -> Option<T> {
        let tail = self.tail.0.load(Ordering::Relaxed);
        let head = self.head.0.load(Ordering::Acquire);
        if tail == head {
            return None;
        }

        fence(Ordering::Acquire);
        let item = unsafe { (*self.slots[tail].get()).assume_init_read() };
        let next_tail = (tail + 1) % self.slots.len();
        self.tail.0.store(next_tail, Ordering::Release);
        Some(item)
    }

    /// Blocking push with exponential spin backoff, giving up (and
    /// returning the item back) only after sustained contention.
    fn push_spin(&self, mut item: T) -> Result<(), T> {
        let mut spin = 1;
        loop {
            match self.push(item) {
                Ok(()) => return Ok(()),
                Err(returned) => item = returned,
            }
            for _ in 0..spin {
                std::hint::spin_loop();
            }
            if spin < SPIN_THRESHOLD {
                spin *= 2;
            } else {
                return Err(item);
            }
        }
    }

    /// Blocking pop with exponential spin backoff, giving up only after
    /// sustained contention (an idle producer, not just a slow one).
    fn pop_spin(&self) -> Option<T> {
        let mut spin = 1;
        loop {
            if let Some(item) = self.pop() {
                return Some(item);
            }
            for _ in 0..spin {
                std::hint::spin_loop();
            }
            if spin < SPIN_THRESHOLD {
                spin *= 2;
            } else {
                return None;
            }
        }
    }

    /// Returns true if the buffer currently holds no items.
    pub fn is_empty(&self) -> bool {
        self.head.0.load(Ordering::Acquire) == self.tail.0.load(Ordering::Relaxed)
    }

    /// Returns true if the buffer is at capacity.
    pub fn is_full(&self) -> bool {
        let head = self.head.0.load(Ordering::Relaxed);
        let tail = self.tail.0.load(Ordering::Acquire);
        (head + 1) % self.slots.len() == tail
    }

    /// Current number of items in flight.
    pub fn len(&self) -> usize {
        let head = self.head.0.load(Ordering::Acquire);
        let tail = self.tail.0.load(Ordering::Relaxed);
        (head + self.slots.len() - tail) % self.slots.len()
    }
}

impl<'a, T> Producer<'a, T> {
    /// Push a single item. Fails (returning the item) if the buffer is full.
    #[inline]
    pub fn push(&self, item: T) -> Result<(), T> {
        self.rb.push(item)
    }

    /// Push, spinning with exponential backoff until space frees up or
    /// the spin budget is exhausted.
    #[inline]
    pub fn push_spin(&self, item: T) -> Result<(), T> {
        self.rb.push_spin(item)
    }

    pub fn is_full(&self) -> bool {
        self.rb.is_full()
    }
}

impl<'a, T> Consumer<'a, T> {
    /// Pop a single item, or `None` if the buffer is currently empty.
    #[inline]
    pub fn pop(&self) -> Option<T> {
        self.rb.pop()
    }

    /// Pop, spinning with exponential backoff until an item arrives or
    /// the spin budget is exhausted.
    #[inline]
    pub fn pop_spin(&self) -> Option<T> {
        self.rb.pop_spin()
    }

    pub fn is_empty(&self) -> bool {
        self.rb.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_and_pop_fifo() {
        let mut rb: RingBuffer<u8> = RingBuffer::new(3);
        let (producer, consumer) = rb.split();

        assert_eq!(producer.push(1), Ok(()));
        assert_eq!(producer.push(2), Ok(()));
        assert_eq!(producer.push(3), Ok(()));
        assert_eq!(producer.push(4), Err(4)); // full: N+1 slots, N usable

        assert_eq!(consumer.pop(), Some(1));
        assert_eq!(consumer.pop(), Some(2));
        assert_eq!(producer.push(4), Ok(()));
        assert_eq!(consumer.pop(), Some(3));
        assert_eq!(consumer.pop(), Some(4));
        assert_eq!(consumer.pop(), None);
    }

    #[test]
    fn capacity_is_not_required_to_be_a_power_of_two() {
        let rb: RingBuffer<u32> = RingBuffer::new(5);
        assert_eq!(rb.capacity(), 5);
    }

    #[test]
    fn is_empty_and_is_full() {
        let mut rb: RingBuffer<u32> = RingBuffer::new(2);
        let (producer, consumer) = rb.split();

        assert!(producer.push(1).is_ok());
        assert!(!consumer.is_empty());
        assert!(!producer.is_full());

        assert!(producer.push(2).is_ok());
        assert!(producer.is_full());

        assert_eq!(consumer.pop(), Some(1));
        assert_eq!(consumer.pop(), Some(2));
        assert!(consumer.is_empty());
    }

    #[test]
    fn drops_remaining_items() {
        use std::sync::atomic::{AtomicUsize as Counter, Ordering as CO};
        use std::sync::Arc;

        struct DropCounter(Arc<Counter>);
        impl Drop for DropCounter {
            fn drop(&mut self) {
                self.0.fetch_add(1, CO::SeqCst);
            }
        }

        let count = Arc::new(Counter::new(0));
        {
            let mut rb: RingBuffer<DropCounter> = RingBuffer::new(4);
            let (producer, _consumer) = rb.split();
            producer.push(DropCounter(count.clone())).unwrap();
            producer.push(DropCounter(count.clone())).unwrap();
        }
        assert_eq!(count.load(CO::SeqCst), 2);
    }

    #[test]
    fn spsc_threads_preserve_fifo_order() {
        use std::thread;

        let mut rb = RingBuffer::<usize>::new(64);

        thread::scope(|s| {
            let (producer, consumer) = rb.split();

            let prod = s.spawn(move || {
                for i in 0..50_000 {
                    loop {
                        if producer.push(i).is_ok() {
                            break;
                        }
                        std::hint::spin_loop();
                    }
                }
            });

            let cons = s.spawn(move || {
                let mut expected = 0;
                while expected < 50_000 {
                    if let Some(v) = consumer.pop() {
                        assert_eq!(v, expected);
                        expected += 1;
                    }
                }
            });

            prod.join().unwrap();
            cons.join().unwrap();
        });
    }
}
