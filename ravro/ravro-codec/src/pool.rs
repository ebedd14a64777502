use std::ops::{Deref, DerefMut};

use parking_lot::Mutex;
use ravro_core::Writer;

/// Writers kept for reuse; extra ones are dropped on return.
const MAX_POOLED: usize = 64;

/// Scratch writers shared by the codecs of one [`Api`](crate::Api).
#[derive(Default)]
pub(crate) struct WriterPool {
    writers: Mutex<Vec<Writer>>,
}

impl WriterPool {
    /// Take a writer without waiting: under contention a fresh one is made.
    pub(crate) fn borrow(&self) -> PooledWriter<'_> {
        let writer = self
            .writers
            .try_lock()
            .and_then(|mut writers| writers.pop())
            .unwrap_or_default();
        PooledWriter { pool: self, writer }
    }

    /// Parked writers; reported as zero while another thread holds the pool.
    pub(crate) fn idle(&self) -> usize {
        self.writers.try_lock().map_or(0, |writers| writers.len())
    }

    fn give_back(&self, mut writer: Writer) {
        writer.reset();
        if let Some(mut writers) = self.writers.try_lock()
            && writers.len() < MAX_POOLED
        {
            writers.push(writer);
        }
    }
}

/// A pooled scratch writer, returned to its pool when dropped.
pub struct PooledWriter<'a> {
    pool: &'a WriterPool,
    writer: Writer,
}

impl Deref for PooledWriter<'_> {
    type Target = Writer;

    fn deref(&self) -> &Writer {
        &self.writer
    }
}

impl DerefMut for PooledWriter<'_> {
    fn deref_mut(&mut self) -> &mut Writer {
        &mut self.writer
    }
}

impl Drop for PooledWriter<'_> {
    fn drop(&mut self) {
        self.pool.give_back(std::mem::take(&mut self.writer));
    }
}
