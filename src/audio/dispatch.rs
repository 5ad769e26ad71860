use crossbeam_channel::{Sender, TrySendError};
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

/// Downmix multi-channel input to mono while applying the provided converter,
/// so the pipeline sees a single channel regardless of the microphone layout.
pub(super) fn append_downmixed_samples<T, F>(
    buf: &mut Vec<f32>,
    data: &[T],
    channels: usize,
    mut convert: F,
) where
    T: Copy,
    F: FnMut(T) -> f32,
{
    if channels <= 1 {
        buf.extend(data.iter().copied().map(&mut convert));
        return;
    }

    // Average each interleaved frame; a truncated trailing frame still
    // averages over the samples it has.
    for frame in data.chunks(channels) {
        let sum: f32 = frame.iter().copied().map(&mut convert).sum();
        buf.push(sum / frame.len() as f32);
    }
}

/// Runs on the device callback thread: downmixes incoming data, slices it
/// into fixed-size chunks, and hands them to the feed worker without ever
/// blocking. A saturated channel drops the chunk and counts it.
pub(super) struct ChunkDispatcher {
    chunk_samples: usize,
    pending: Vec<f32>,
    scratch: Vec<f32>,
    sender: Sender<Vec<f32>>,
    dropped: Arc<AtomicUsize>,
}

impl ChunkDispatcher {
    pub(super) fn new(
        chunk_samples: usize,
        sender: Sender<Vec<f32>>,
        dropped: Arc<AtomicUsize>,
    ) -> Self {
        Self {
            chunk_samples: chunk_samples.max(1),
            pending: Vec::with_capacity(chunk_samples),
            scratch: Vec::new(),
            sender,
            dropped,
        }
    }

    pub(super) fn push<T, F>(&mut self, data: &[T], channels: usize, convert: F)
    where
        T: Copy,
        F: FnMut(T) -> f32,
    {
        self.scratch.clear();
        append_downmixed_samples(&mut self.scratch, data, channels, convert);
        self.pending.extend_from_slice(&self.scratch);

        while self.pending.len() >= self.chunk_samples {
            let rest = self.pending.split_off(self.chunk_samples);
            let chunk = std::mem::replace(&mut self.pending, rest);
            self.try_send(chunk);
        }
    }

    /// Send whatever partial chunk remains. Called when the stream stops so
    /// the tail of the last chunk is not lost.
    pub(super) fn flush(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        let chunk: Vec<f32> = self.pending.drain(..).collect();
        self.try_send(chunk);
    }

    fn try_send(&mut self, chunk: Vec<f32>) {
        if let Err(err) = self.sender.try_send(chunk) {
            match err {
                TrySendError::Full(_) => {
                    self.dropped.fetch_add(1, Ordering::Relaxed);
                }
                TrySendError::Disconnected(_) => {}
            }
        }
    }
}
