//! 7-byte-header message framing for the delta mirror protocol:
//! 32-bit session-ID, 1 command byte, 16-bit payload length, then payload.
//! All multi-byte integers are big-endian.

use crate::core::{Error, Result};
use std::io::{Read, Write};

/// Header size in bytes.
pub const HEADER_LEN: usize = 7;

/// Commands the core issues to the mirroring daemon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Announce UID/GID/PID and the ADP profile path to cross-check.
    Connect,
    /// Close the session.
    Quit,
    /// Notify the daemon of a newly uploaded blob.
    QueFile,
    /// Notify the daemon a blob was deleted.
    DelFile,
    /// Carry a batch of delta-log bytes, identical to what was flushed locally.
    Delta,
    /// Daemon acknowledgement.
    Ack,
    /// Daemon negative acknowledgement.
    Nack,
}

impl Command {
    fn to_byte(self) -> u8 {
        match self {
            Command::Connect => 1,
            Command::Quit => 2,
            Command::QueFile => 3,
            Command::DelFile => 4,
            Command::Delta => 5,
            Command::Ack => 200,
            Command::Nack => 201,
        }
    }

    fn from_byte(b: u8) -> Result<Self> {
        match b {
            1 => Ok(Command::Connect),
            2 => Ok(Command::Quit),
            3 => Ok(Command::QueFile),
            4 => Ok(Command::DelFile),
            5 => Ok(Command::Delta),
            200 => Ok(Command::Ack),
            201 => Ok(Command::Nack),
            other => Err(Error::Corrupt(format!("unknown delta mirror command byte {other}"))),
        }
    }
}

/// One framed message: session, command, payload.
#[derive(Debug, Clone)]
pub struct Message {
    /// Session ID assigned by the daemon on `CONNECT`, 0 before that.
    pub session_id: u32,
    /// Which command this message carries.
    pub command: Command,
    /// Payload bytes (may be empty, e.g. for `ACK`/`QUIT`).
    pub payload: Vec<u8>,
}

impl Message {
    /// Build a new message.
    pub fn new(session_id: u32, command: Command, payload: Vec<u8>) -> Self {
        Self { session_id, command, payload }
    }

    /// Write this message's wire form to `out`.
    pub fn write_to(&self, out: &mut impl Write) -> Result<()> {
        if self.payload.len() > u16::MAX as usize {
            return Err(Error::Argument("delta mirror payload exceeds 65535 bytes".to_string()));
        }
        let mut header = [0u8; HEADER_LEN];
        header[0..4].copy_from_slice(&self.session_id.to_be_bytes());
        header[4] = self.command.to_byte();
        header[5..7].copy_from_slice(&(self.payload.len() as u16).to_be_bytes());
        out.write_all(&header)?;
        out.write_all(&self.payload)?;
        out.flush()?;
        Ok(())
    }

    /// Read one message's wire form from `input`.
    pub fn read_from(input: &mut impl Read) -> Result<Self> {
        let mut header = [0u8; HEADER_LEN];
        input.read_exact(&mut header)?;
        let session_id = u32::from_be_bytes(header[0..4].try_into().unwrap());
        let command = Command::from_byte(header[4])?;
        let len = u16::from_be_bytes(header[5..7].try_into().unwrap()) as usize;
        let mut payload = vec![0u8; len];
        input.read_exact(&mut payload)?;
        Ok(Self { session_id, command, payload })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_round_trips_through_bytes() {
        let msg = Message::new(42, Command::Delta, b"@c21.o1.m501=Ada".to_vec());
        let mut buf = Vec::new();
        msg.write_to(&mut buf).unwrap();
        assert_eq!(buf.len(), HEADER_LEN + msg.payload.len());

        let mut cursor = std::io::Cursor::new(buf);
        let back = Message::read_from(&mut cursor).unwrap();
        assert_eq!(back.session_id, 42);
        assert_eq!(back.command, Command::Delta);
        assert_eq!(back.payload, msg.payload);
    }
}
