//! Shared test fixtures
//!
//! `FakeDevice` plays the power strip side of the native protocol on a
//! loopback port. It does its own math so tests don't just check the client
//! against itself.

#![allow(dead_code)]

use std::io::{self, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::thread::{self, JoinHandle};

/// Firmware 2.0 codes
pub const ON_V20: u8 = 0x11;
pub const OFF_V20: u8 = 0x22;

/// How the fake device behaves during a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Behavior {
    /// Complete session
    Full,
    /// Send only half of the task, then hang up
    ShortTask,
    /// Accept the start byte and never answer
    Silent,
    /// Hang up right after receiving the solution
    CloseAfterSolution,
}

/// What the client sent during one session
#[derive(Debug, Clone, Default)]
pub struct Exchange {
    pub start: Option<u8>,
    pub solution: Option<[u8; 4]>,
    pub control: Option<[u8; 4]>,
}

pub struct FakeDevice {
    pub port: u16,
    handle: JoinHandle<Vec<Exchange>>,
}

impl FakeDevice {
    /// Serve `sessions` sessions with the given task and password
    ///
    /// `codes` are the plain per-socket status codes in wire order
    /// (socket 4 first); they persist across sessions.
    pub fn spawn(
        task: [u8; 4],
        password: &str,
        codes: [u8; 4],
        behavior: Behavior,
        sessions: usize,
    ) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let key = device_key(password);

        let handle = thread::spawn(move || {
            let mut codes = codes;
            let mut exchanges = Vec::new();
            for _ in 0..sessions {
                let (stream, _) = listener.accept().unwrap();
                let mut exchange = Exchange::default();
                let _ = serve(stream, task, &key, &mut codes, behavior, &mut exchange);
                exchanges.push(exchange);
            }
            exchanges
        });

        Self { port, handle }
    }

    /// Wait for the device thread and return what the client sent
    pub fn finish(self) -> Vec<Exchange> {
        self.handle.join().unwrap()
    }
}

fn serve(
    mut stream: TcpStream,
    task: [u8; 4],
    key: &[u8; 8],
    codes: &mut [u8; 4],
    behavior: Behavior,
    exchange: &mut Exchange,
) -> io::Result<()> {
    let mut start = [0u8; 1];
    stream.read_exact(&mut start)?;
    exchange.start = Some(start[0]);

    match behavior {
        Behavior::ShortTask => {
            stream.write_all(&task[..2])?;
            return Ok(());
        }
        Behavior::Silent => {
            let mut sink = Vec::new();
            stream.read_to_end(&mut sink)?;
            return Ok(());
        }
        _ => {}
    }

    stream.write_all(&task)?;

    let mut solution = [0u8; 4];
    stream.read_exact(&mut solution)?;
    exchange.solution = Some(solution);

    if behavior == Behavior::CloseAfterSolution {
        return Ok(());
    }

    stream.write_all(&codes.map(|c| device_encode(c, &task, key)))?;

    let mut control = [0u8; 4];
    stream.read_exact(&mut control)?;
    exchange.control = Some(control);

    for (code, byte) in codes.iter_mut().zip(control) {
        match device_decode(byte, &task, key) {
            0x01 => *code = ON_V20,
            0x02 => *code = OFF_V20,
            _ => {}
        }
    }

    stream.write_all(&codes.map(|c| device_encode(c, &task, key)))?;
    Ok(())
}

pub fn device_key(password: &str) -> [u8; 8] {
    let mut key = [b' '; 8];
    key[..password.len()].copy_from_slice(password.as_bytes());
    key
}

pub fn device_encode(code: u8, task: &[u8; 4], key: &[u8; 8]) -> u8 {
    (((code ^ task[2]).wrapping_add(task[3])) ^ key[0]).wrapping_add(key[1])
}

pub fn device_decode(byte: u8, task: &[u8; 4], key: &[u8; 8]) -> u8 {
    (((byte.wrapping_sub(key[1])) ^ key[0]).wrapping_sub(task[3])) ^ task[2]
}

/// A loopback port with nothing listening on it
pub fn closed_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}
