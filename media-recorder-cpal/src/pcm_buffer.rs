/// Bounded byte ring buffer between the audio callback and the chunker
/// thread. Wrap in `Arc<parking_lot::Mutex<PcmBuffer>>` for cross-thread
/// access.
///
/// Overflow drops the oldest bytes. Dropped bytes are lost recording
/// time, so overflow is logged; the chunker drains often enough that it
/// only happens when the chunker stalls.
#[derive(Debug)]
pub struct PcmBuffer {
    buffer: Vec<u8>,
    write_index: usize,
    read_index: usize,
    available: usize,
    capacity: usize,
}

impl PcmBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: vec![0; capacity],
            write_index: 0,
            read_index: 0,
            available: 0,
            capacity,
        }
    }

    /// Append encoded bytes, dropping the oldest on overflow.
    ///
    /// If `data` is larger than capacity, only the last `capacity` bytes
    /// are kept.
    pub fn write(&mut self, data: &[u8]) {
        if data.is_empty() {
            return;
        }

        let data = if data.len() > self.capacity {
            &data[data.len() - self.capacity..]
        } else {
            data
        };

        let overflow = (self.available + data.len()).saturating_sub(self.capacity);
        if overflow > 0 {
            log::warn!("pcm buffer overflow, dropping {} bytes", overflow);
            self.read_index = (self.read_index + overflow) % self.capacity;
            self.available -= overflow;
        }

        for &byte in data {
            self.buffer[self.write_index] = byte;
            self.write_index = (self.write_index + 1) % self.capacity;
        }
        self.available += data.len();
    }

    /// Read and remove up to `count` bytes.
    ///
    /// Returns fewer bytes if fewer are available.
    pub fn read(&mut self, count: usize) -> Vec<u8> {
        let to_read = count.min(self.available);
        if to_read == 0 {
            return Vec::new();
        }

        let mut result = Vec::with_capacity(to_read);
        for i in 0..to_read {
            result.push(self.buffer[(self.read_index + i) % self.capacity]);
        }
        self.read_index = (self.read_index + to_read) % self.capacity;
        self.available -= to_read;
        result
    }

    /// Drain everything currently buffered.
    pub fn read_all(&mut self) -> Vec<u8> {
        self.read(self.available)
    }

    /// Number of bytes currently available for reading.
    pub fn count(&self) -> usize {
        self.available
    }

    pub fn is_empty(&self) -> bool {
        self.available == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
