// Copyright (C) 2025 Vince Vasta
// SPDX-License-Identifier: Apache-2.0

//! Bot output capture.
use parking_lot::Mutex;
use std::{path::Path, sync::Arc};
use tokio::{
    io::{AsyncRead, AsyncReadExt},
    task::JoinHandle,
};

/// A bounded buffer for the output of a bot processes.
///
/// The buffer is shared by the drain tasks that read the process streams and
/// the session that writes the buffer to a log file when the bot stops.
#[derive(Debug, Clone)]
pub struct OutputLog {
    inner: Arc<Mutex<Inner>>,
}

#[derive(Debug)]
struct Inner {
    chunks: Vec<Vec<u8>>,
    size: usize,
    limit: usize,
}

impl OutputLog {
    /// Creates a buffer that stops accepting output after `limit` bytes.
    pub fn new(limit: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                chunks: Vec::new(),
                size: 0,
                limit,
            })),
        }
    }

    /// Appends a chunk of output.
    ///
    /// Output past the limit is dropped.
    pub fn push(&self, chunk: &[u8]) {
        let mut inner = self.inner.lock();
        let len = chunk.len().min(inner.limit - inner.size);
        if len > 0 {
            inner.size += len;
            inner.chunks.push(chunk[..len].to_vec());
        }
    }

    /// Appends a line of text.
    pub fn push_line(&self, line: &str) {
        let mut chunk = Vec::with_capacity(line.len() + 1);
        chunk.extend_from_slice(line.as_bytes());
        chunk.push(b'\n');
        self.push(&chunk);
    }

    /// The buffer contents.
    pub fn contents(&self) -> Vec<u8> {
        self.inner.lock().chunks.concat()
    }

    /// Spawns a task that appends the output read from `reader` until the
    /// stream is closed.
    ///
    /// The stream is read after the buffer is full so that the process never
    /// blocks on a full pipe.
    pub fn drain<R>(&self, mut reader: R) -> JoinHandle<()>
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let output = self.clone();
        tokio::spawn(async move {
            let mut buf = vec![0u8; 8192];
            loop {
                match reader.read(&mut buf).await {
                    Ok(0) | Err(_) => break,
                    Ok(n) => output.push(&buf[..n]),
                }
            }
        })
    }

    /// Writes the buffer contents to a file.
    pub async fn write_to(&self, path: &Path) -> std::io::Result<()> {
        tokio::fs::write(path, self.contents()).await
    }
}
