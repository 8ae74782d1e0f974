//! Cable-modem link (port $80).
//!
//! On real hardware this is the HCCA serial line to the cable adaptor. Here
//! it is a TCP connection to an adaptor server. All polling is
//! non-blocking; a modem that never connected, or whose connection
//! dropped, reads as "no data" forever.

use std::collections::VecDeque;
use std::io::{ErrorKind, Read, Write};
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

use crate::error::{NabuError, Result};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(2);

/// Receive buffer limit. Anything beyond stays in the socket until the
/// guest drains port $80.
pub const RX_CAPACITY: usize = 4096;

/// A byte-oriented serial link.
pub trait Modem: Send {
    /// Bytes that can be read right now. Never blocks.
    fn bytes_available(&mut self) -> usize;

    /// Take the next received byte, if any.
    fn read_byte(&mut self) -> Option<u8>;

    /// Send a byte. Dropped silently when disconnected.
    fn write_byte(&mut self, byte: u8);

    fn is_connected(&self) -> bool;
}

/// A link with nothing on the other end.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullModem;

impl Modem for NullModem {
    fn bytes_available(&mut self) -> usize {
        0
    }

    fn read_byte(&mut self) -> Option<u8> {
        None
    }

    fn write_byte(&mut self, _byte: u8) {}

    fn is_connected(&self) -> bool {
        false
    }
}

/// Non-blocking TCP connection to a modem adaptor server.
pub struct TcpModem {
    stream: Option<TcpStream>,
    peer: String,
    rx: VecDeque<u8>,
    tx: VecDeque<u8>,
}

impl TcpModem {
    /// Connect to `addr` (e.g. `127.0.0.1:5816`).
    pub fn connect(addr: &str) -> Result<Self> {
        let err = |source: std::io::Error| NabuError::Modem {
            addr: addr.to_owned(),
            source,
        };
        let target: SocketAddr = addr
            .to_socket_addrs()
            .map_err(err)?
            .next()
            .ok_or_else(|| err(ErrorKind::AddrNotAvailable.into()))?;
        let stream = TcpStream::connect_timeout(&target, CONNECT_TIMEOUT).map_err(err)?;
        stream.set_nonblocking(true).map_err(err)?;
        stream.set_nodelay(true).map_err(err)?;
        tracing::info!("modem connected to {addr}");

        Ok(Self {
            stream: Some(stream),
            peer: addr.to_owned(),
            rx: VecDeque::new(),
            tx: VecDeque::new(),
        })
    }

    fn disconnect(&mut self, reason: &str) {
        if self.stream.take().is_some() {
            tracing::warn!("modem link to {} lost: {reason}", self.peer);
        }
        self.tx.clear();
    }

    /// Pull whatever the socket has without waiting, up to `RX_CAPACITY`.
    fn fill(&mut self) {
        let mut chunk = [0u8; 512];
        while let Some(stream) = self.stream.as_mut() {
            let room = RX_CAPACITY - self.rx.len();
            if room == 0 {
                break;
            }
            let want = room.min(chunk.len());
            match stream.read(&mut chunk[..want]) {
                Ok(0) => self.disconnect("closed by peer"),
                Ok(n) => self.rx.extend(&chunk[..n]),
                Err(e) if e.kind() == ErrorKind::WouldBlock => break,
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => self.disconnect(&e.to_string()),
            }
        }
    }

    /// Push queued output without waiting.
    fn flush_tx(&mut self) {
        while let Some(stream) = self.stream.as_mut() {
            let (head, _) = self.tx.as_slices();
            if head.is_empty() {
                break;
            }
            match stream.write(head) {
                Ok(0) => self.disconnect("write returned zero"),
                Ok(n) => {
                    self.tx.drain(..n);
                }
                Err(e) if e.kind() == ErrorKind::WouldBlock => break,
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => self.disconnect(&e.to_string()),
            }
        }
    }
}

impl Modem for TcpModem {
    fn bytes_available(&mut self) -> usize {
        self.flush_tx();
        self.fill();
        self.rx.len()
    }

    fn read_byte(&mut self) -> Option<u8> {
        if self.rx.is_empty() {
            self.fill();
        }
        self.rx.pop_front()
    }

    fn write_byte(&mut self, byte: u8) {
        if self.stream.is_none() {
            return;
        }
        self.tx.push_back(byte);
        self.flush_tx();
    }

    fn is_connected(&self) -> bool {
        self.stream.is_some()
    }
}
