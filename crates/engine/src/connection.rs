// Copyright (C) 2025 Vince Vasta
// SPDX-License-Identifier: Apache-2.0

//! Line based bot connection.
use std::io;
use tokio::{
    io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader},
    net::{
        TcpStream,
        tcp::{OwnedReadHalf, OwnedWriteHalf},
    },
};

use headsup_core::message::QUIT;

/// Maximum length of a bot response line.
const MAX_LINE_LEN: u64 = 4096;

/// A connection that exchanges newline terminated lines with a bot.
#[derive(Debug)]
pub struct Connection {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
}

impl Connection {
    /// Creates a connection from an accepted stream.
    pub fn new(stream: TcpStream) -> Self {
        let _ = stream.set_nodelay(true);
        let (reader, writer) = stream.into_split();
        Self {
            reader: BufReader::new(reader),
            writer,
        }
    }

    /// Sends a line, the newline is added.
    pub async fn send(&mut self, line: &str) -> io::Result<()> {
        let mut buf = Vec::with_capacity(line.len() + 1);
        buf.extend_from_slice(line.as_bytes());
        buf.push(b'\n');
        self.writer.write_all(&buf).await?;
        self.writer.flush().await
    }

    /// Waits for a line, returns None if the bot closed the connection.
    ///
    /// Invalid UTF-8 is replaced so that it fails decoding instead of looking
    /// like a broken connection. A line longer than [MAX_LINE_LEN] is consumed
    /// up to its newline and returned empty.
    pub async fn recv(&mut self) -> io::Result<Option<String>> {
        let mut buf = Vec::new();
        let n = self.read_capped(&mut buf).await?;
        if n == 0 {
            return Ok(None);
        }

        if n as u64 == MAX_LINE_LEN && buf.last() != Some(&b'\n') {
            self.discard_line().await?;
            return Ok(Some(String::new()));
        }

        Ok(Some(String::from_utf8_lossy(&buf).into_owned()))
    }

    async fn read_capped(&mut self, buf: &mut Vec<u8>) -> io::Result<usize> {
        (&mut self.reader)
            .take(MAX_LINE_LEN)
            .read_until(b'\n', buf)
            .await
    }

    /// Skips input up to and including the next newline.
    async fn discard_line(&mut self) -> io::Result<()> {
        let mut buf = Vec::new();
        loop {
            buf.clear();
            let n = self.read_capped(&mut buf).await?;
            if n == 0 || buf.last() == Some(&b'\n') {
                return Ok(());
            }
        }
    }

    /// Sends a line and waits for the response.
    pub async fn exchange(&mut self, line: &str) -> io::Result<Option<String>> {
        self.send(line).await?;
        self.recv().await
    }

    /// Asks the bot to quit and closes the write side of the connection.
    pub async fn close(&mut self) -> io::Result<()> {
        self.send(QUIT).await?;
        self.writer.shutdown().await
    }
}
