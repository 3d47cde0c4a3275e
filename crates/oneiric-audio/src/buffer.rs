use std::sync::{Arc, Mutex};

/// Thread-safe bounded buffer of mono f32 samples.
///
/// Filled from the capture callback thread. The recorder drains it with
/// [`take`](Self::take); the visualiser only peeks with
/// [`latest`](Self::latest) and never removes samples.
#[derive(Debug, Clone)]
pub struct SampleBuffer {
    samples: Arc<Mutex<Vec<f32>>>,
    /// Maximum buffer size in samples (prevents unbounded growth).
    max_samples: usize,
}

impl SampleBuffer {
    pub fn new(max_samples: usize) -> Self {
        Self {
            samples: Arc::new(Mutex::new(Vec::with_capacity(max_samples.min(1 << 16)))),
            max_samples,
        }
    }

    /// Push samples into the buffer. Drops oldest samples if buffer is full.
    pub fn push(&self, data: &[f32]) {
        if let Ok(mut buf) = self.samples.lock() {
            buf.extend_from_slice(data);
            if buf.len() > self.max_samples {
                let excess = buf.len() - self.max_samples;
                buf.drain(..excess);
            }
        }
    }

    /// Take all buffered samples, leaving the buffer empty.
    pub fn take(&self) -> Vec<f32> {
        if let Ok(mut buf) = self.samples.lock() {
            std::mem::take(&mut *buf)
        } else {
            Vec::new()
        }
    }

    /// Copy of the most recent `n` samples, zero-padded at the front when
    /// fewer are buffered.
    pub fn latest(&self, n: usize) -> Vec<f32> {
        let buf = match self.samples.lock() {
            Ok(b) => b,
            Err(_) => return vec![0.0; n],
        };
        let start = buf.len().saturating_sub(n);
        let mut out = vec![0.0; n - (buf.len() - start)];
        out.extend_from_slice(&buf[start..]);
        out
    }

    pub fn len(&self) -> usize {
        self.samples.lock().map(|b| b.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_take() {
        let buf = SampleBuffer::new(1000);
        assert!(buf.is_empty());
        buf.push(&[0.1, 0.2, 0.3]);
        assert_eq!(buf.len(), 3);
        assert_eq!(buf.take(), vec![0.1, 0.2, 0.3]);
        assert!(buf.is_empty());
    }

    #[test]
    fn test_overflow_keeps_newest() {
        let buf = SampleBuffer::new(5);
        buf.push(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        buf.push(&[6.0, 7.0]);
        assert_eq!(buf.take(), vec![3.0, 4.0, 5.0, 6.0, 7.0]);
    }

    #[test]
    fn test_latest_does_not_drain() {
        let buf = SampleBuffer::new(100);
        buf.push(&[1.0, 2.0, 3.0, 4.0]);
        assert_eq!(buf.latest(2), vec![3.0, 4.0]);
        assert_eq!(buf.len(), 4);
    }

    #[test]
    fn test_latest_pads_short_buffer() {
        let buf = SampleBuffer::new(100);
        buf.push(&[0.5]);
        assert_eq!(buf.latest(3), vec![0.0, 0.0, 0.5]);
        let empty = SampleBuffer::new(10);
        assert_eq!(empty.latest(2), vec![0.0, 0.0]);
    }

    #[test]
    fn test_clones_share_samples() {
        let a = SampleBuffer::new(10);
        let b = a.clone();
        a.push(&[1.0]);
        assert_eq!(b.take(), vec![1.0]);
        assert!(a.is_empty());
    }
}
