use std::str;

use crate::util::find_crlf;
use crate::Error;

/// Decoder for `transfer-encoding: chunked` response bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Dechunker {
    Size,
    Chunk(usize),
    CrLf,
    Ending,
    Trailer,
    Ended,
}

impl Dechunker {
    pub fn new() -> Self {
        Dechunker::Size
    }

    /// Decode as much of `src` as possible, appending chunk data to `dst`.
    ///
    /// Returns how much of `src` was used. Input that stops in the middle of a
    /// chunk size or crlf is left unused until more input arrives.
    pub fn parse_input(&mut self, src: &[u8], dst: &mut Vec<u8>) -> Result<usize, Error> {
        let mut index_in = 0;

        loop {
            let more = match self {
                Dechunker::Size => self.read_size(src, &mut index_in)?,
                Dechunker::Chunk(_) => self.read_data(src, dst, &mut index_in),
                Dechunker::CrLf => self.expect_crlf(src, &mut index_in)?,
                Dechunker::Ending => self.trailer_or_ended(src, &mut index_in),
                Dechunker::Trailer => self.trailer(src, &mut index_in),
                Dechunker::Ended => false,
            };

            if !more {
                break;
            }
        }

        Ok(index_in)
    }

    pub fn is_ended(&self) -> bool {
        matches!(self, Self::Ended)
    }

    fn read_size(&mut self, src: &[u8], index_in: &mut usize) -> Result<bool, Error> {
        let src = &src[*index_in..];

        let i = match find_crlf(src) {
            Some(v) => v,
            None => return Ok(false),
        };

        const SANITY_CHECK: usize = 20;

        // chunk extensions after ; are ignored
        let maybe_meta = src[..i].iter().position(|c| *c == b';');

        let len_end = maybe_meta.unwrap_or(i);
        if len_end > SANITY_CHECK {
            return Err(Error::ChunkExpectedCrLf);
        }

        let len_str = str::from_utf8(&src[..len_end]).map_err(|_| Error::ChunkLenNotAscii)?;

        let len = usize::from_str_radix(len_str.trim(), 16).map_err(|_| Error::ChunkLenNotANumber)?;

        *index_in += i + 2;
        *self = if len == 0 {
            Self::Ending
        } else {
            Self::Chunk(len)
        };

        Ok(true)
    }

    fn read_data(&mut self, src: &[u8], dst: &mut Vec<u8>, index_in: &mut usize) -> bool {
        let src = &src[*index_in..];

        let left = match self {
            Self::Chunk(v) => v,
            _ => unreachable!(),
        };

        let to_read = src.len().min(*left);

        dst.extend_from_slice(&src[..to_read]);
        *index_in += to_read;
        *left -= to_read;

        if *left == 0 {
            *self = Self::CrLf;
        }

        to_read > 0
    }

    fn expect_crlf(&mut self, src: &[u8], index_in: &mut usize) -> Result<bool, Error> {
        let src = &src[*index_in..];

        if src.len() < 2 {
            return Ok(false);
        }

        if &src[..2] != b"\r\n" {
            return Err(Error::ChunkExpectedCrLf);
        }

        *index_in += 2;
        *self = Self::Size;

        Ok(true)
    }

    fn trailer_or_ended(&mut self, src: &[u8], index_in: &mut usize) -> bool {
        let src = &src[*index_in..];

        let i = match find_crlf(src) {
            Some(v) => v,
            None => return false,
        };

        if i == 0 {
            *index_in += 2;
            *self = Self::Ended;
        } else {
            *self = Self::Trailer;
        }

        true
    }

    fn trailer(&mut self, src: &[u8], index_in: &mut usize) -> bool {
        let src = &src[*index_in..];

        let i = match find_crlf(src) {
            Some(v) => v,
            None => return false,
        };

        // trailers are discarded
        *index_in += i + 2;
        *self = Self::Ending;

        true
    }
}
