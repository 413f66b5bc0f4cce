//! Mock telegram source for testing
//!
//! This module provides a chunked byte source that can be used to test the
//! telegram reader without requiring an actual P1 port.

use crate::error::P1Error;
use crate::p1::reader::TelegramSource;
use std::collections::VecDeque;

/// Mock source that hands out one queued chunk per poll
#[derive(Debug, Default)]
pub struct MockTelegramSource {
    /// Chunks to be returned by successive polls
    chunks: VecDeque<Vec<u8>>,
    /// Every value passed to `set_ready`, in order
    ready_history: Vec<bool>,
    /// Number of polls served so far
    polls: usize,
    /// Simulated read error, returned once
    next_error: Option<String>,
}

impl MockTelegramSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a source returning the given chunks in order
    pub fn from_chunks(chunks: Vec<Vec<u8>>) -> Self {
        MockTelegramSource {
            chunks: chunks.into(),
            ..Self::default()
        }
    }

    /// Splits `data` into chunks of `size` bytes (the last one may be shorter)
    pub fn chunked(data: &[u8], size: usize) -> Self {
        Self::from_chunks(data.chunks(size.max(1)).map(<[u8]>::to_vec).collect())
    }

    /// Queue a chunk to be returned by a later poll
    pub fn queue_chunk(&mut self, chunk: &[u8]) {
        self.chunks.push_back(chunk.to_vec());
    }

    /// Queue a number of empty polls (no data available)
    pub fn queue_silence(&mut self, polls: usize) {
        for _ in 0..polls {
            self.chunks.push_back(Vec::new());
        }
    }

    /// Set an error to be returned on the next poll
    pub fn set_next_error(&mut self, message: &str) {
        self.next_error = Some(message.to_string());
    }

    pub fn ready_history(&self) -> &[bool] {
        &self.ready_history
    }

    pub fn polls(&self) -> usize {
        self.polls
    }

    pub fn remaining_chunks(&self) -> usize {
        self.chunks.len()
    }
}

#[async_trait::async_trait]
impl TelegramSource for MockTelegramSource {
    async fn read_available(&mut self) -> Result<Vec<u8>, P1Error> {
        self.polls += 1;
        if let Some(message) = self.next_error.take() {
            return Err(P1Error::SerialPortError(message));
        }
        Ok(self.chunks.pop_front().unwrap_or_default())
    }

    async fn set_ready(&mut self, ready: bool) -> Result<(), P1Error> {
        self.ready_history.push(ready);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunked_split() {
        let source = MockTelegramSource::chunked(b"abcdefg", 3);
        assert_eq!(source.remaining_chunks(), 3);
    }

    #[tokio::test]
    async fn test_exhausted_source_returns_nothing() {
        let mut source = MockTelegramSource::from_chunks(vec![b"ab".to_vec()]);
        assert_eq!(source.read_available().await.unwrap(), b"ab");
        assert!(source.read_available().await.unwrap().is_empty());
        assert_eq!(source.polls(), 2);
    }

    #[tokio::test]
    async fn test_simulated_error() {
        let mut source = MockTelegramSource::new();
        source.set_next_error("unplugged");
        assert!(matches!(
            source.read_available().await,
            Err(P1Error::SerialPortError(_))
        ));
        assert!(source.read_available().await.is_ok());
    }
}
