//! Simulated I2C peripheral

use alloc::collections::VecDeque;
use alloc::vec::Vec;

/// A peripheral that answers to one 7-bit address
///
/// Written bytes are collected; reads are served from a response queue and
/// return 0xFF (SDA left released) once the queue is empty.
#[derive(Debug, Clone)]
pub struct SimDevice {
    address: u8,
    response: VecDeque<u8>,
    received: Vec<u8>,
    write_limit: Option<usize>,
}

impl SimDevice {
    pub fn new(address: u8) -> Self {
        Self {
            address,
            response: VecDeque::new(),
            received: Vec::new(),
            write_limit: None,
        }
    }

    /// Queue bytes returned by subsequent reads
    pub fn with_response(mut self, bytes: &[u8]) -> Self {
        self.queue_response(bytes);
        self
    }

    /// Acknowledge only the first `limit` data bytes, NACK the rest
    pub fn with_write_limit(mut self, limit: usize) -> Self {
        self.write_limit = Some(limit);
        self
    }

    pub fn queue_response(&mut self, bytes: &[u8]) {
        self.response.extend(bytes.iter().copied());
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    /// Every data byte this device acknowledged, in order
    pub fn received(&self) -> &[u8] {
        &self.received
    }

    /// Bytes still queued for reads
    pub fn pending(&self) -> usize {
        self.response.len()
    }

    pub(crate) fn accepts_write(&self) -> bool {
        self.write_limit
            .map_or(true, |limit| self.received.len() < limit)
    }

    pub(crate) fn push_received(&mut self, byte: u8) {
        self.received.push(byte);
    }

    pub(crate) fn next_response(&mut self) -> u8 {
        self.response.pop_front().unwrap_or(0xFF)
    }
}
