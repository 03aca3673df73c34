use std::io;

const INCREMENT: usize = 4096;
const THRESHOLD: usize = 100;

/// Read buffer that keeps unconsumed input between reads.
///
/// Bytes the codec did not use for one response stay buffered, so the next
/// response on a kept-alive connection starts where the previous one ended.
pub(crate) struct FillMoreBuffer {
    buffer: Vec<u8>,
    pos: usize,
    ended: bool,
}

impl FillMoreBuffer {
    pub fn new() -> Self {
        Self {
            buffer: vec![0; INCREMENT],
            pos: 0,
            ended: false,
        }
    }

    /// Read more from `reader`, returning all buffered input.
    ///
    /// Once the reader returns 0 (EOF), no further reads are attempted.
    pub fn fill_more(&mut self, reader: &mut impl io::Read) -> io::Result<&[u8]> {
        if self.ended {
            return Ok(self.buffer());
        }

        if self.pos > self.buffer.len() - THRESHOLD {
            self.buffer.resize(self.buffer.len() + INCREMENT, 0);
        }

        let n = loop {
            match reader.read(&mut self.buffer[self.pos..]) {
                Ok(n) => break n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        };
        self.pos += n;

        if n == 0 {
            self.ended = true;
        }

        Ok(self.buffer())
    }

    pub fn consume(&mut self, amount: usize) {
        let max = amount.min(self.pos);
        self.buffer.copy_within(max..self.pos, 0);
        self.pos -= max;
    }

    pub fn is_ended(&self) -> bool {
        self.ended
    }

    pub fn buffer(&self) -> &[u8] {
        &self.buffer[..self.pos]
    }
}
