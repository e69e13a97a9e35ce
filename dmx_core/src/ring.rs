//! Lock-free single-producer single-consumer ring of byte records.
//!
//! Hands variable-length datagrams from the network I/O thread to
//! the emitter thread without blocking either side. Records are
//! length-prefixed and delivered whole, in FIFO order; a write that
//! does not fit fails instead of blocking, so the producer can drop
//! the datagram and move on.

use core::cell::UnsafeCell;
#[cfg(not(loom))]
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

#[cfg(loom)]
use loom::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

/// Record header: little-endian `u32` payload length.
const HEADER: usize = 4;

/// Records are padded to this alignment, so cursors stay 4-aligned.
const ALIGN: usize = 4;

/// Header sentinel marking padding at the wrap point. The consumer
/// skips to the start of the buffer when it reads this value.
const SKIP: u32 = u32::MAX;

#[inline]
const fn align_up(n: usize) -> usize {
    (n + ALIGN - 1) & !(ALIGN - 1)
}

/// Cache-line padded wrapper to prevent false sharing.
///
/// On most modern x86/ARM CPUs, cache lines are 64 bytes.
/// Padding head and tail to separate cache lines prevents
/// false sharing between producer and consumer threads.
#[repr(align(64))]
struct CachePadded<T>(T);

impl<T> CachePadded<T> {
    const fn new(value: T) -> Self {
        CachePadded(value)
    }
}

impl<T> core::ops::Deref for CachePadded<T> {
    type Target = T;

    #[inline]
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Internal shared state for the packet ring.
///
/// `head` and `tail` are monotonically increasing byte counters;
/// masking with `mask` yields the buffer index. Both advance in
/// multiples of [`ALIGN`], and `head - tail` never exceeds
/// `capacity`.
struct PacketRingInner {
    buf: Box<[UnsafeCell<u8>]>,
    capacity: usize,
    mask: usize,
    head: CachePadded<AtomicUsize>, // Write position (producer)
    tail: CachePadded<AtomicUsize>, // Read position (consumer)
}

// SAFETY: access to the byte buffer is synchronized through the
// head/tail atomics with release/acquire ordering; producer and
// consumer never touch the same region concurrently.
unsafe impl Send for PacketRingInner {}
unsafe impl Sync for PacketRingInner {}

impl PacketRingInner {
    fn new(capacity: usize) -> Self {
        // Round up to next power of 2
        let capacity = capacity.next_power_of_two().max(16);
        let mask = capacity - 1;

        let buf: Vec<UnsafeCell<u8>> = (0..capacity).map(|_| UnsafeCell::new(0)).collect();

        Self {
            buf: buf.into_boxed_slice(),
            capacity,
            mask,
            head: CachePadded::new(AtomicUsize::new(0)),
            tail: CachePadded::new(AtomicUsize::new(0)),
        }
    }

    /// # Safety
    ///
    /// The caller must exclusively own `[index, index + 4)`.
    unsafe fn store_u32(&self, index: usize, value: u32) {
        for (i, byte) in value.to_le_bytes().into_iter().enumerate() {
            *self.buf[index + i].get() = byte;
        }
    }

    /// # Safety
    ///
    /// The caller must own `[index, index + 4)` and the producer must
    /// have published it with a release store.
    unsafe fn load_u32(&self, index: usize) -> u32 {
        let mut bytes = [0u8; 4];
        for (i, byte) in bytes.iter_mut().enumerate() {
            *byte = *self.buf[index + i].get();
        }
        u32::from_le_bytes(bytes)
    }
}

/// Factory for creating producer/consumer pairs.
pub struct PacketRing;

impl PacketRing {
    /// Creates a new packet ring with the given byte capacity.
    ///
    /// The actual capacity will be rounded up to the next power of 2.
    /// Returns a `(RingProducer, RingConsumer)` pair for inter-thread
    /// communication.
    ///
    /// # Examples
    ///
    /// ```
    /// use dmx_core::ring::PacketRing;
    ///
    /// let (mut producer, mut consumer) = PacketRing::with_capacity(64);
    ///
    /// let grant = producer.write_request(3).unwrap();
    /// grant[..3].copy_from_slice(b"osc");
    /// producer.write_commit(3);
    ///
    /// assert_eq!(consumer.read_request(), Some(&b"osc"[..]));
    /// consumer.read_advance();
    /// ```
    pub fn with_capacity(capacity: usize) -> (RingProducer, RingConsumer) {
        let inner = Arc::new(PacketRingInner::new(capacity));
        (
            RingProducer {
                inner: Arc::clone(&inner),
                reserved: None,
            },
            RingConsumer { inner, pending: None },
        )
    }
}

struct Reservation {
    head: usize,
    pad: usize,
    granted: usize,
}

/// Producer handle for writing records into the ring.
///
/// This type is `Send` but not `Clone` - only one producer should exist.
pub struct RingProducer {
    inner: Arc<PacketRingInner>,
    reserved: Option<Reservation>,
}

impl RingProducer {
    /// Requests a writable region of at least `min` bytes.
    ///
    /// Returns the maximal contiguous region available, or `None` if
    /// the ring cannot currently hold a record of `min` bytes. Never
    /// blocks. A record that would cross the wrap point is placed at
    /// the start of the buffer instead; the tail gap is skipped.
    ///
    /// Calling this again before [`write_commit`](Self::write_commit)
    /// discards the previous reservation.
    pub fn write_request(&mut self, min: usize) -> Option<&mut [u8]> {
        let head = self.inner.head.load(Ordering::Relaxed);
        let tail = self.inner.tail.load(Ordering::Acquire);

        let free = self.inner.capacity - head.wrapping_sub(tail);
        let index = head & self.inner.mask;
        let room = self.inner.capacity - index;
        let needed = HEADER + align_up(min);

        // Contiguous bytes usable for header + payload, and the tail
        // padding spent to get them.
        let (pad, start, avail) = if needed <= room {
            (0, index, room.min(free))
        } else {
            (room, 0, free.saturating_sub(room))
        };

        if avail < needed {
            return None;
        }

        let granted = avail - HEADER;
        self.reserved = Some(Reservation { head, pad, granted });

        let data = start + HEADER;
        // SAFETY: [data, data + granted) lies beyond `head`, so the
        // consumer cannot observe it until write_commit publishes the
        // new head; the producer has exclusive access until then.
        Some(unsafe {
            let base = UnsafeCell::raw_get(self.inner.buf.as_ptr());
            core::slice::from_raw_parts_mut(base.add(data), granted)
        })
    }

    /// Publishes a record of `written` bytes into the last request.
    ///
    /// The release store on `head` makes the record bytes visible to
    /// the consumer before the new cursor value.
    ///
    /// # Panics
    ///
    /// Panics if no reservation is outstanding or `written` exceeds
    /// the granted region.
    pub fn write_commit(&mut self, written: usize) {
        let res = self
            .reserved
            .take()
            .expect("write_commit without matching write_request");
        assert!(res.granted >= written, "write_commit exceeds granted region");

        let index = res.head & self.inner.mask;
        let record = if res.pad > 0 {
            // SAFETY: the skip marker region belongs to the producer
            // until the head store below.
            unsafe { self.inner.store_u32(index, SKIP) };
            0
        } else {
            index
        };
        // SAFETY: same region as the grant handed out by write_request.
        unsafe { self.inner.store_u32(record, written as u32) };

        let advance = res.pad + HEADER + align_up(written);
        self.inner
            .head
            .store(res.head.wrapping_add(advance), Ordering::Release);
    }

    /// Returns the number of unconsumed bytes in the ring, including
    /// record headers and padding.
    ///
    /// This is an approximate count and may be stale by the time it's used.
    #[inline]
    pub fn len(&self) -> usize {
        let head = self.inner.head.load(Ordering::Relaxed);
        let tail = self.inner.tail.load(Ordering::Relaxed);
        head.wrapping_sub(tail)
    }

    /// Returns `true` if the ring holds no committed records.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the capacity of the ring in bytes.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.inner.capacity
    }
}

struct Pending {
    tail: usize,
    advance: usize,
}

/// Consumer handle for reading records from the ring.
///
/// This type is `Send` but not `Clone` - only one consumer should exist.
pub struct RingConsumer {
    inner: Arc<PacketRingInner>,
    pending: Option<Pending>,
}

impl RingConsumer {
    /// Returns the next committed record, or `None` if the ring is
    /// empty. Never blocks.
    ///
    /// The record stays in the ring until
    /// [`read_advance`](Self::read_advance) retires it; calling
    /// `read_request` again yields the same record.
    pub fn read_request(&mut self) -> Option<&[u8]> {
        let mut tail = self.inner.tail.load(Ordering::Relaxed);
        let head = self.inner.head.load(Ordering::Acquire);

        loop {
            if tail == head {
                return None;
            }

            let index = tail & self.inner.mask;
            // SAFETY: [tail, head) has been published by the producer's
            // release store, which our acquire load synchronizes with.
            let len = unsafe { self.inner.load_u32(index) };

            if len == SKIP {
                // Tail padding; retire it so the producer can reuse it.
                tail = tail.wrapping_add(self.inner.capacity - index);
                self.inner.tail.store(tail, Ordering::Release);
                continue;
            }

            let len = len as usize;
            self.pending = Some(Pending {
                tail,
                advance: HEADER + align_up(len),
            });

            let data = index + HEADER;
            // SAFETY: record bytes are published (see above) and the
            // producer will not touch them before read_advance.
            return Some(unsafe {
                let base = UnsafeCell::raw_get(self.inner.buf.as_ptr());
                core::slice::from_raw_parts(base.add(data), len)
            });
        }
    }

    /// Retires the record most recently returned by
    /// [`read_request`](Self::read_request).
    ///
    /// # Panics
    ///
    /// Panics if no record is outstanding.
    pub fn read_advance(&mut self) {
        let pending = self
            .pending
            .take()
            .expect("read_advance without matching read_request");
        self.inner
            .tail
            .store(pending.tail.wrapping_add(pending.advance), Ordering::Release);
    }

    /// Returns the number of unconsumed bytes in the ring, including
    /// record headers and padding.
    ///
    /// This is an approximate count and may be stale by the time it's used.
    #[inline]
    pub fn len(&self) -> usize {
        let head = self.inner.head.load(Ordering::Relaxed);
        let tail = self.inner.tail.load(Ordering::Relaxed);
        head.wrapping_sub(tail)
    }

    /// Returns `true` if the ring holds no committed records.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the capacity of the ring in bytes.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.inner.capacity
    }
}

#[cfg(all(test, not(loom)))]
mod tests {
    use std::thread;

    use super::*;

    fn push(producer: &mut RingProducer, bytes: &[u8]) -> bool {
        match producer.write_request(bytes.len()) {
            Some(grant) => {
                grant[..bytes.len()].copy_from_slice(bytes);
                producer.write_commit(bytes.len());
                true
            }
            None => false,
        }
    }

    fn pop(consumer: &mut RingConsumer) -> Option<Vec<u8>> {
        let record = consumer.read_request()?.to_vec();
        consumer.read_advance();
        Some(record)
    }

    #[test]
    fn test_basic_write_read() {
        let (mut producer, mut consumer) = PacketRing::with_capacity(64);

        assert!(push(&mut producer, b"one"));
        assert!(push(&mut producer, b"two!"));

        assert_eq!(pop(&mut consumer).as_deref(), Some(&b"one"[..]));
        assert_eq!(pop(&mut consumer).as_deref(), Some(&b"two!"[..]));
        assert_eq!(pop(&mut consumer), None);
    }

    #[test]
    fn test_empty_ring() {
        let (producer, mut consumer) = PacketRing::with_capacity(64);

        assert!(producer.is_empty());
        assert_eq!(consumer.read_request(), None);
    }

    #[test]
    fn test_records_are_not_padded_for_caller() {
        let (mut producer, mut consumer) = PacketRing::with_capacity(64);

        // Length 5 occupies a padded 8-byte region internally but the
        // consumer must see exactly 5 bytes.
        assert!(push(&mut producer, b"abcde"));
        assert_eq!(pop(&mut consumer).as_deref(), Some(&b"abcde"[..]));
    }

    #[test]
    fn test_overflow_fails_without_corruption() {
        let (mut producer, mut consumer) = PacketRing::with_capacity(32);

        assert!(push(&mut producer, &[1u8; 8]));
        assert!(push(&mut producer, &[2u8; 8]));
        // 8 payload + 4 header no longer fits alongside the two
        // committed records.
        assert!(!push(&mut producer, &[3u8; 12]));

        // Previously committed records survive intact.
        assert_eq!(pop(&mut consumer).as_deref(), Some(&[1u8; 8][..]));
        assert_eq!(pop(&mut consumer).as_deref(), Some(&[2u8; 8][..]));
        assert_eq!(pop(&mut consumer), None);

        // And the ring is usable again afterwards.
        assert!(push(&mut producer, &[4u8; 12]));
        assert_eq!(pop(&mut consumer).as_deref(), Some(&[4u8; 12][..]));
    }

    #[test]
    fn test_write_request_replaces_reservation() {
        let (mut producer, mut consumer) = PacketRing::with_capacity(64);

        let _ = producer.write_request(8).unwrap();
        // Request again without committing; only the second one counts.
        assert!(push(&mut producer, b"final"));

        assert_eq!(pop(&mut consumer).as_deref(), Some(&b"final"[..]));
        assert_eq!(pop(&mut consumer), None);
    }

    #[test]
    fn test_read_request_is_idempotent() {
        let (mut producer, mut consumer) = PacketRing::with_capacity(64);

        assert!(push(&mut producer, b"same"));
        assert_eq!(consumer.read_request(), Some(&b"same"[..]));
        assert_eq!(consumer.read_request(), Some(&b"same"[..]));
        consumer.read_advance();
        assert_eq!(consumer.read_request(), None);
    }

    #[test]
    fn test_wraparound_skips_tail_padding() {
        let (mut producer, mut consumer) = PacketRing::with_capacity(32);

        // A 17-byte payload occupies 24 ring bytes, so every second
        // record lands on a partial region at the end of the buffer
        // and goes through the skip marker path.
        for round in 0..64u8 {
            let record = [round; 17];
            assert!(push(&mut producer, &record));
            assert_eq!(pop(&mut consumer).as_deref(), Some(&record[..]));
        }
    }

    #[test]
    fn test_min_larger_than_capacity_fails() {
        let (mut producer, _consumer) = PacketRing::with_capacity(32);

        assert!(producer.write_request(64).is_none());
    }

    #[test]
    fn test_concurrent_fifo_byte_identity() {
        let (mut producer, mut consumer) = PacketRing::with_capacity(256);

        let num_records = 10_000u32;

        let producer_thread = thread::spawn(move || {
            for i in 0..num_records {
                // Vary the record length to exercise padding and wrap.
                let len = 4 + (i % 13) as usize;
                let mut record = vec![0u8; len];
                record[..4].copy_from_slice(&i.to_le_bytes());
                for (j, byte) in record[4..].iter_mut().enumerate() {
                    *byte = (i as usize + j) as u8;
                }

                while !push(&mut producer, &record) {
                    thread::yield_now();
                }
            }
        });

        let consumer_thread = thread::spawn(move || {
            for i in 0..num_records {
                let record = loop {
                    match pop(&mut consumer) {
                        Some(record) => break record,
                        None => thread::yield_now(),
                    }
                };

                let len = 4 + (i % 13) as usize;
                assert_eq!(record.len(), len);
                assert_eq!(u32::from_le_bytes(record[..4].try_into().unwrap()), i);
                for (j, byte) in record[4..].iter().enumerate() {
                    assert_eq!(*byte, (i as usize + j) as u8);
                }
            }
        });

        producer_thread.join().unwrap();
        consumer_thread.join().unwrap();
    }
}

#[cfg(loom)]
mod loom_tests {
    use loom::thread;

    use super::*;

    #[test]
    fn loom_single_record() {
        loom::model(|| {
            let (mut producer, mut consumer) = PacketRing::with_capacity(16);

            let producer_thread = thread::spawn(move || {
                if let Some(grant) = producer.write_request(2) {
                    grant[..2].copy_from_slice(b"ok");
                    producer.write_commit(2);
                }
            });

            let consumer_thread = thread::spawn(move || {
                if let Some(record) = consumer.read_request() {
                    assert_eq!(record, b"ok");
                    consumer.read_advance();
                }
            });

            producer_thread.join().unwrap();
            consumer_thread.join().unwrap();
        });
    }

    #[test]
    fn loom_two_records_in_order() {
        loom::model(|| {
            let (mut producer, mut consumer) = PacketRing::with_capacity(32);

            let producer_thread = thread::spawn(move || {
                for record in [&b"a"[..], &b"bc"[..]] {
                    if let Some(grant) = producer.write_request(record.len()) {
                        grant[..record.len()].copy_from_slice(record);
                        producer.write_commit(record.len());
                    }
                }
            });

            let consumer_thread = thread::spawn(move || {
                let mut seen = Vec::new();
                for _ in 0..2 {
                    if let Some(record) = consumer.read_request() {
                        seen.push(record.to_vec());
                        consumer.read_advance();
                    }
                }
                seen
            });

            producer_thread.join().unwrap();
            let seen = consumer_thread.join().unwrap();
            match seen.len() {
                0 => {}
                1 => assert_eq!(seen[0], b"a"),
                _ => {
                    assert_eq!(seen[0], b"a");
                    assert_eq!(seen[1], b"bc");
                }
            }
        });
    }
}
