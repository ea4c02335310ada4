//! Buffered exchange of RESP frames over a byte stream

use std::io::{self, Cursor};

use bytes::{Buf, BytesMut};
use thiserror::Error;
use tokio::{
    io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufWriter},
    net::TcpStream,
};

use super::frame::{self, Frame};

/// Error from reading or writing frames
#[derive(Error, Debug)]
pub enum ConnectionError {
    /// The peer sent bytes that are not a frame
    #[error("protocol error: {0}")]
    Frame(#[from] frame::Error),

    /// The stream failed
    #[error("stream error: {0}")]
    Io(#[from] io::Error),
}

/// One end of a RESP conversation.
///
/// Incoming bytes accumulate in a read buffer until a whole [`Frame`] is available. Outgoing
/// frames are encoded into a scratch buffer and flushed immediately, since every request
/// waits for its reply.
#[derive(Debug)]
pub struct Connection<S = TcpStream> {
    stream: BufWriter<S>,
    rbuf: BytesMut,
    wbuf: BytesMut,
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Wraps a stream.
    pub fn new(stream: S) -> Self {
        Self {
            stream: BufWriter::new(stream),
            rbuf: BytesMut::with_capacity(8 * 1024),
            wbuf: BytesMut::with_capacity(1024),
        }
    }

    /// Waits for the next frame. `None` means the peer closed the stream between frames;
    /// closing in the middle of one is reported as [`io::ErrorKind::ConnectionReset`].
    pub async fn read_frame(&mut self) -> Result<Option<Frame>, ConnectionError> {
        loop {
            if let Some(frame) = self.parse_frame()? {
                return Ok(Some(frame));
            }

            if self.stream.read_buf(&mut self.rbuf).await? == 0 {
                if self.rbuf.is_empty() {
                    return Ok(None);
                }
                return Err(io::Error::new(
                    io::ErrorKind::ConnectionReset,
                    "connection reset by peer",
                )
                .into());
            }
        }
    }

    /// Encodes a frame, writes it out and flushes.
    pub async fn write_frame(&mut self, frame: &Frame) -> Result<(), ConnectionError> {
        self.wbuf.clear();
        frame.encode(&mut self.wbuf);
        self.stream.write_all(&self.wbuf).await?;
        self.stream.flush().await?;
        Ok(())
    }

    fn parse_frame(&mut self) -> Result<Option<Frame>, ConnectionError> {
        let mut buf = Cursor::new(&self.rbuf[..]);
        match Frame::check(&mut buf) {
            Ok(()) => {
                let len = buf.position() as usize;
                buf.set_position(0);
                let frame = Frame::parse(&mut buf)?;
                self.rbuf.advance(len);
                Ok(Some(frame))
            }
            Err(frame::Error::Incomplete) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use tokio::io::duplex;

    use super::*;

    /// Replies the facade receives, with their encoding.
    fn replies() -> Vec<(Frame, &'static [u8])> {
        let cases: [(Frame, &'static [u8]); 7] = [
            (Frame::SimpleString("OK".into()), b"+OK\r\n"),
            (
                Frame::Error("WRONGTYPE Operation against a key".into()),
                b"-WRONGTYPE Operation against a key\r\n",
            ),
            (Frame::Integer(2), b":2\r\n"),
            (Frame::BulkString(Bytes::new()), b"$0\r\n\r\n"),
            (Frame::BulkString("x\r\ny".into()), b"$4\r\nx\r\ny\r\n"),
            (Frame::Null, b"$-1\r\n"),
            (
                Frame::Array(vec![
                    Frame::BulkString("sku".into()),
                    Frame::BulkString("10".into()),
                ]),
                b"*2\r\n$3\r\nsku\r\n$2\r\n10\r\n",
            ),
        ];
        Vec::from(cases)
    }

    #[tokio::test]
    async fn write_frame_encodes_and_flushes() {
        for (frame, expected) in replies() {
            let mut out = Cursor::new(Vec::new());
            Connection::new(&mut out).write_frame(&frame).await.unwrap();
            assert_eq!(out.into_inner(), expected);
        }
    }

    #[tokio::test]
    async fn read_frame_then_clean_close() {
        for (expected, input) in replies() {
            let mut conn = Connection::new(Cursor::new(input.to_vec()));
            assert_eq!(conn.read_frame().await.unwrap(), Some(expected));
            assert_eq!(conn.read_frame().await.unwrap(), None);
        }
    }

    #[tokio::test]
    async fn read_frame_across_partial_writes() {
        let (client, mut server) = duplex(64);
        let mut conn = Connection::new(client);

        let writer = tokio::spawn(async move {
            for chunk in [&b"*2\r\n$3\r"[..], b"\nfoo", b"\r\n:4", b"2\r\n"] {
                server.write_all(chunk).await.unwrap();
                server.flush().await.unwrap();
                tokio::task::yield_now().await;
            }
        });

        let frame = conn.read_frame().await.unwrap();
        assert_eq!(
            frame,
            Some(Frame::Array(vec![
                Frame::BulkString("foo".into()),
                Frame::Integer(42),
            ]))
        );
        writer.await.unwrap();
        assert_eq!(conn.read_frame().await.unwrap(), None);
    }

    #[tokio::test]
    async fn read_frame_reset_mid_frame() {
        let mut stream = Cursor::new(b"$5\r\nhel".to_vec());
        let mut conn = Connection::new(&mut stream);

        match conn.read_frame().await {
            Err(ConnectionError::Io(e)) => assert_eq!(e.kind(), io::ErrorKind::ConnectionReset),
            other => panic!("expected connection reset, got {:?}", other),
        }
    }
}
