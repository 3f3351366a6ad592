//! A single long-lived TCP client to the local mirroring daemon.

use crate::core::config::MirrorConfig;
use crate::core::{Error, Result};
use crate::delta_client::wire::{Command, Message};
use parking_lot::Mutex;
use std::io::Read;
use std::net::TcpStream;
use std::path::Path;
use std::time::Duration;

/// Client half of the delta-mirroring protocol. Mirroring is best-effort:
/// a `NACK` or transport hiccup is logged, never propagated as a failure
/// of the originating database operation (durability of the primary
/// already happened by the time this is called).
pub struct DeltaClient {
    stream: Mutex<TcpStream>,
    session_id: u32,
}

impl DeltaClient {
    /// Connect to the mirroring daemon and perform the `CONNECT` handshake,
    /// carrying `uid`/`gid`/`pid` and the ADP profile path for the daemon
    /// to cross-check against its own view.
    pub fn connect(addr: &str, timeout: Duration, uid: u32, gid: u32, pid: u32, adp_profile_path: &Path) -> Result<Self> {
        let stream = TcpStream::connect(addr).map_err(|e| Error::SendFail(format!("connect to {addr} failed: {e}")))?;
        stream.set_read_timeout(Some(timeout)).map_err(|e| Error::SendFail(e.to_string()))?;
        stream.set_write_timeout(Some(timeout)).map_err(|e| Error::SendFail(e.to_string()))?;

        let mut payload = Vec::new();
        payload.extend_from_slice(&uid.to_be_bytes());
        payload.extend_from_slice(&gid.to_be_bytes());
        payload.extend_from_slice(&pid.to_be_bytes());
        payload.extend_from_slice(adp_profile_path.to_string_lossy().as_bytes());

        let mut stream = stream;
        Message::new(0, Command::Connect, payload).write_to(&mut stream)?;
        let reply = Message::read_from(&mut stream)?;
        if reply.command != Command::Ack {
            return Err(Error::SendFail("mirror daemon rejected CONNECT".to_string()));
        }

        Ok(Self {
            session_id: reply.session_id,
            stream: Mutex::new(stream),
        })
    }

    /// Connect using a [`MirrorConfig`], returning `None` if mirroring is
    /// disabled in configuration.
    pub fn from_config(config: &MirrorConfig, addr: &str, adp_profile_path: &Path) -> Result<Option<Self>> {
        if !config.enabled {
            return Ok(None);
        }
        let pid = std::process::id();
        Ok(Some(Self::connect(addr, config.timeout, 0, 0, pid, adp_profile_path)?))
    }

    fn exchange(&self, command: Command, payload: Vec<u8>) -> Result<()> {
        let mut stream = self.stream.lock();
        Message::new(self.session_id, command, payload).write_to(&mut *stream)?;
        let reply = Message::read_from(&mut *stream)?;
        match reply.command {
            Command::Ack => Ok(()),
            Command::Nack => {
                tracing::warn!(?command, "delta mirror daemon sent NACK");
                Ok(())
            }
            other => Err(Error::RecvFail(format!("unexpected reply command {other:?}"))),
        }
    }

    /// Forward a batch of delta-log bytes, identical to what was just
    /// flushed locally.
    pub fn send_delta(&self, bytes: &[u8]) -> Result<()> {
        self.exchange(Command::Delta, bytes.to_vec())
    }

    /// Notify the daemon of a newly uploaded blob.
    pub fn quefile(&self, blob_id: u32) -> Result<()> {
        self.exchange(Command::QueFile, blob_id.to_be_bytes().to_vec())
    }

    /// Notify the daemon a blob was deleted.
    pub fn delfile(&self, blob_id: u32) -> Result<()> {
        self.exchange(Command::DelFile, blob_id.to_be_bytes().to_vec())
    }

    /// Close the session.
    pub fn quit(&self) -> Result<()> {
        self.exchange(Command::Quit, Vec::new())
    }
}

impl Drop for DeltaClient {
    fn drop(&mut self) {
        let mut stream = self.stream.lock();
        let _ = Message::new(self.session_id, Command::Quit, Vec::new()).write_to(&mut *stream);
        let mut discard = [0u8; 1];
        let _ = stream.read(&mut discard);
    }
}
