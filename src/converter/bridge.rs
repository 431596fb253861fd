//! # 进程内字节管道
//!
//! ## 设计思路
//!
//! 编码在阻塞线程池中执行，HTTP 响应在异步运行时中发送，两者通过一条有界字节管道衔接：
//! - 写端 `PipeWriter` 实现 `std::io::Write`，缓冲区满时阻塞（隐式背压）。
//! - 读端 `PipeReader` 实现 `tokio::io::AsyncRead`，可直接包装成响应体。
//!
//! ## 关闭语义
//!
//! - 写端只能关闭一次：`close` / `close_with_error` 消费 `self`，未显式关闭时，写端被丢弃会随内部 `Sender` 一起释放通道，读端得到 EOF。
//! - `close_with_error` 附带的错误会在读端下一次读取时返回。
//! - 读端被丢弃后，写端阻塞中的写入立即以 `BrokenPipe` 失败，生产者随之退出。

use std::io;
use std::pin::Pin;
use std::task::{Context, Poll, ready};

use bytes::Bytes;
use tokio::io::{AsyncRead, ReadBuf};
use tokio::sync::mpsc;

/// 单个分块的最大字节数。
pub const PIPE_CHUNK_SIZE: usize = 16 * 1024;
/// 默认管道容量（分块数）。
pub const DEFAULT_PIPE_CAPACITY: usize = 8;

type Chunk = io::Result<Bytes>;

/// 创建一条容量为 `capacity` 个分块的管道。
pub fn pipe(capacity: usize) -> (PipeWriter, PipeReader) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (
        PipeWriter {
            tx: Some(tx),
            written: 0,
        },
        PipeReader {
            rx,
            current: Bytes::new(),
            finished: false,
        },
    )
}

/// 管道写端。
///
/// 写入会阻塞当前线程，只能在阻塞线程（如 `spawn_blocking`）中使用。
#[derive(Debug)]
pub struct PipeWriter {
    tx: Option<mpsc::Sender<Chunk>>,
    written: u64,
}

impl PipeWriter {
    /// 已成功交给管道的字节数。
    pub fn bytes_written(&self) -> u64 {
        self.written
    }

    /// 正常关闭，读端读完剩余分块后得到 EOF。
    pub fn close(mut self) {
        self.tx.take();
    }

    /// 带错误关闭，读端在读完已写入分块后收到该错误。
    pub fn close_with_error(mut self, error: io::Error) {
        if let Some(tx) = self.tx.take() {
            if tx.blocking_send(Err(error)).is_err() {
                log::debug!("管道读端已关闭，错误未送达");
            }
        }
    }

    fn broken_pipe() -> io::Error {
        io::Error::new(io::ErrorKind::BrokenPipe, "管道读端已关闭")
    }
}

impl io::Write for PipeWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }

        let tx = self.tx.as_ref().ok_or_else(Self::broken_pipe)?;
        let len = buf.len().min(PIPE_CHUNK_SIZE);

        tx.blocking_send(Ok(Bytes::copy_from_slice(&buf[..len])))
            .map_err(|_| Self::broken_pipe())?;
        self.written += len as u64;

        Ok(len)
    }

    fn flush(&mut self) -> io::Result<()> {
        if self.tx.as_ref().is_some_and(|tx| tx.is_closed()) {
            return Err(Self::broken_pipe());
        }
        Ok(())
    }
}

/// 管道读端：有限、只读一次、不可重启的字节流。
#[derive(Debug)]
pub struct PipeReader {
    rx: mpsc::Receiver<Chunk>,
    current: Bytes,
    finished: bool,
}

impl AsyncRead for PipeReader {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();

        loop {
            if !this.current.is_empty() {
                let len = buf.remaining().min(this.current.len());
                buf.put_slice(&this.current.split_to(len));
                return Poll::Ready(Ok(()));
            }

            if this.finished {
                return Poll::Ready(Ok(()));
            }

            match ready!(this.rx.poll_recv(cx)) {
                Some(Ok(chunk)) => this.current = chunk,
                Some(Err(error)) => {
                    this.finished = true;
                    this.rx.close();
                    return Poll::Ready(Err(error));
                }
                None => this.finished = true,
            }
        }
    }
}
