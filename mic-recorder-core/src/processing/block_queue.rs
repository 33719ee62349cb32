use std::time::Duration;

use parking_lot::{Condvar, Mutex};

use super::ring_buffer::RingBuffer;

/// Hand-off between the hardware callback and the read loop.
///
/// The callback pushes whatever buffer size the device delivers; the read
/// loop blocks until a full fixed-size block is available. This turns a
/// push-based driver into a pull of uniform blocks.
pub struct BlockQueue {
    buffer: Mutex<RingBuffer<i16>>,
    ready: Condvar,
}

impl BlockQueue {
    /// `capacity` is in samples; overflow drops the oldest audio.
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: Mutex::new(RingBuffer::new(capacity)),
            ready: Condvar::new(),
        }
    }

    /// Called from the hardware callback thread.
    pub fn push(&self, samples: &[i16]) {
        self.buffer.lock().write(samples);
        self.ready.notify_one();
    }

    /// Wait up to `timeout` for `block_len` samples and take them.
    ///
    /// Returns `None` on timeout or when woken by [`wake`](Self::wake) before a
    /// full block is ready.
    pub fn wait_block(&self, block_len: usize, timeout: Duration) -> Option<Vec<i16>> {
        let mut buffer = self.buffer.lock();
        if buffer.count() < block_len {
            self.ready.wait_for(&mut buffer, timeout);
        }
        if buffer.count() >= block_len && block_len > 0 {
            Some(buffer.read(block_len))
        } else {
            None
        }
    }

    /// Take any residual partial block.
    pub fn drain(&self) -> Vec<i16> {
        self.buffer.lock().drain()
    }

    /// Wake the read loop so it can notice a shutdown request.
    pub fn wake(&self) {
        self.ready.notify_all();
    }

    pub fn overflowed(&self) -> u64 {
        self.buffer.lock().overflowed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Instant;

    #[test]
    fn returns_full_blocks_only() {
        let queue = BlockQueue::new(64);
        queue.push(&[1, 2, 3]);
        assert!(queue.wait_block(4, Duration::from_millis(5)).is_none());

        queue.push(&[4, 5]);
        assert_eq!(queue.wait_block(4, Duration::from_millis(5)), Some(vec![1, 2, 3, 4]));
        assert_eq!(queue.drain(), vec![5]);
    }

    #[test]
    fn producer_on_another_thread_wakes_reader() {
        let queue = Arc::new(BlockQueue::new(1024));
        let producer = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || {
                for chunk in [[1i16; 100], [2i16; 100], [3i16; 100]] {
                    thread::sleep(Duration::from_millis(5));
                    queue.push(&chunk);
                }
            })
        };

        let deadline = Instant::now() + Duration::from_secs(2);
        let mut block = None;
        while block.is_none() && Instant::now() < deadline {
            block = queue.wait_block(256, Duration::from_millis(50));
        }
        producer.join().unwrap();

        let block = block.expect("block should arrive");
        assert_eq!(block.len(), 256);
        assert_eq!(block[0], 1);
        assert_eq!(block[255], 3);
    }

    #[test]
    fn wake_returns_without_block() {
        let queue = Arc::new(BlockQueue::new(64));
        let waker = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(20));
                queue.wake();
            })
        };
        let start = Instant::now();
        assert!(queue.wait_block(32, Duration::from_secs(5)).is_none());
        assert!(start.elapsed() < Duration::from_secs(5));
        waker.join().unwrap();
    }
}
