//! Scripted transport for exercising the protocol layer
//!
//! Each command write consumes the next reply script. A bare newline (the
//! reset sequence) is accepted without consuming one. A script is a list of
//! chunks handed out one per read; an empty chunk stands for a read that
//! timed out. Once a script runs dry every read times out.

#[cfg(test)]
use crate::error::TransportError;
#[cfg(test)]
use crate::ports::Transport;
#[cfg(test)]
use std::collections::VecDeque;
#[cfg(test)]
use std::io;
#[cfg(test)]
use std::sync::{Arc, Mutex};

#[cfg(test)]
#[derive(Debug, Default)]
struct MockState {
    readable: VecDeque<Vec<u8>>,
    scripts: VecDeque<Vec<Vec<u8>>>,
    written: Vec<u8>,
    writes: usize,
    reads_since_write: u32,
    fail_writes: bool,
    fail_reads: bool,
}

/// Cloneable handle; clones share the same scripted device.
#[cfg(test)]
#[derive(Debug, Clone, Default)]
pub struct MockDevice {
    state: Arc<Mutex<MockState>>,
}

#[cfg(test)]
impl MockDevice {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the reply to the next unanswered write.
    pub fn respond_with(self, chunks: &[&str]) -> Self {
        self.lock()
            .scripts
            .push_back(chunks.iter().map(|c| c.as_bytes().to_vec()).collect());
        self
    }

    /// Queue a reply made of `empty` timed-out reads followed by `chunks`.
    pub fn respond_after_silence(self, empty: usize, chunks: &[&str]) -> Self {
        let mut script = vec![Vec::new(); empty];
        script.extend(chunks.iter().map(|c| c.as_bytes().to_vec()));
        self.lock().scripts.push_back(script);
        self
    }

    /// Make bytes readable right now, as if the device printed them late.
    pub fn push_unsolicited(&self, bytes: &str) {
        self.lock().readable.push_back(bytes.as_bytes().to_vec());
    }

    pub fn fail_writes(self) -> Self {
        self.lock().fail_writes = true;
        self
    }

    pub fn fail_reads(&self) {
        self.lock().fail_reads = true;
    }

    /// Everything written so far, as text.
    pub fn written(&self) -> String {
        String::from_utf8_lossy(&self.lock().written).into_owned()
    }

    pub fn writes(&self) -> usize {
        self.lock().writes
    }

    pub fn reads_since_write(&self) -> u32 {
        self.lock().reads_since_write
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.state.lock().expect("mock device lock poisoned")
    }
}

#[cfg(test)]
impl Transport for MockDevice {
    fn write_all(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        let mut state = self.lock();
        if state.fail_writes {
            let err = io::Error::new(io::ErrorKind::BrokenPipe, "device unplugged");
            return Err(TransportError::io("write", &err));
        }
        state.written.extend_from_slice(bytes);
        state.writes += 1;
        state.reads_since_write = 0;
        if bytes == b"\n" {
            return Ok(());
        }
        if let Some(script) = state.scripts.pop_front() {
            state.readable.extend(script);
        }
        Ok(())
    }

    fn read_chunk(&mut self, buf: &mut [u8]) -> Result<usize, TransportError> {
        let mut state = self.lock();
        if state.fail_reads {
            let err = io::Error::other("read failed");
            return Err(TransportError::io("read", &err));
        }
        state.reads_since_write += 1;
        let Some(mut chunk) = state.readable.pop_front() else {
            return Ok(0);
        };
        if chunk.len() > buf.len() {
            let rest = chunk.split_off(buf.len());
            state.readable.push_front(rest);
        }
        buf[..chunk.len()].copy_from_slice(&chunk);
        Ok(chunk.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract_tests_for;
    use crate::ports::contract_tests::transport_contract;

    #[test]
    fn test_reply_follows_write() {
        let mut device = MockDevice::new().respond_with(&["+OK\n"]);
        let mut buf = [0u8; 16];

        assert_eq!(device.read_chunk(&mut buf).unwrap(), 0);
        device.write_all(b"+FORMAT\n").unwrap();
        assert_eq!(device.read_chunk(&mut buf).unwrap(), 4);
        assert_eq!(&buf[..4], b"+OK\n");
        assert_eq!(device.written(), "+FORMAT\n");
    }

    #[test]
    fn test_silence_counts_as_empty_reads() {
        let mut device = MockDevice::new().respond_after_silence(2, &["x\n"]);
        let mut buf = [0u8; 16];
        device.write_all(b"+SIGN\n").unwrap();

        assert_eq!(device.read_chunk(&mut buf).unwrap(), 0);
        assert_eq!(device.read_chunk(&mut buf).unwrap(), 0);
        assert_eq!(device.read_chunk(&mut buf).unwrap(), 2);
        assert_eq!(device.reads_since_write(), 3);
    }

    contract_tests_for!(
        mock_device_contract,
        make = || MockDevice::new().respond_with(&["noise\n", "+OK,00\n"]),
        tests = {
            test_idle_read_returns_zero => transport_contract::test_idle_read_returns_zero,
            test_command_produces_sentinel_line => transport_contract::test_command_produces_sentinel_line,
            test_drain_discards_pending_output => transport_contract::test_drain_discards_pending_output,
        }
    );
}
