use crate::error::{ProtocolError, ProtocolResult};
use crate::packet::Packet;
use crate::session::{ConnectionSession, SessionReader, SessionWriter};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, ReadHalf, WriteHalf};

const READ_CHUNK: usize = 4096;

/// A [`ConnectionSession`] driven over a tokio stream.
pub struct Connection<S> {
    stream: S,
    session: ConnectionSession,
}

impl<S: AsyncRead + AsyncWrite + Unpin> Connection<S> {
    pub fn new(stream: S, session: ConnectionSession) -> Self {
        Self { stream, session }
    }

    pub fn session(&self) -> &ConnectionSession {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut ConnectionSession {
        &mut self.session
    }

    /// Read until one packet is decoded. Its effect is already applied when
    /// this returns.
    pub async fn read_packet(&mut self) -> ProtocolResult<Box<dyn Packet>> {
        loop {
            if let Some(packet) = self.session.next_packet()? {
                return Ok(packet);
            }
            if self.session.is_awaiting_encryption() {
                return Err(ProtocolError::CipherMisuse(
                    "enable encryption before reading further",
                ));
            }
            let mut tmp = [0u8; READ_CHUNK];
            let n = self.stream.read(&mut tmp).await?;
            if n == 0 {
                return Err(ProtocolError::ConnectionClosed);
            }
            self.session.receive(&tmp[..n]);
        }
    }

    pub async fn write_packet(&mut self, packet: &dyn Packet) -> ProtocolResult<()> {
        let frame = self.session.send(packet)?;
        self.stream.write_all(&frame).await?;
        Ok(())
    }

    pub async fn flush(&mut self) -> ProtocolResult<()> {
        self.stream.flush().await?;
        Ok(())
    }

    pub fn into_inner(self) -> (S, ConnectionSession) {
        (self.stream, self.session)
    }

    /// Split for concurrent reading and writing. The session must be in Play.
    pub fn into_split(self) -> ProtocolResult<(ConnectionReader<S>, ConnectionWriter<S>)> {
        let (reader, writer) = self.session.split()?;
        let (read_half, write_half) = tokio::io::split(self.stream);
        Ok((
            ConnectionReader {
                stream: read_half,
                session: reader,
            },
            ConnectionWriter {
                stream: write_half,
                session: writer,
            },
        ))
    }
}

/// Read half of a split connection.
pub struct ConnectionReader<S> {
    stream: ReadHalf<S>,
    session: SessionReader,
}

impl<S: AsyncRead + Unpin> ConnectionReader<S> {
    pub async fn read_packet(&mut self) -> ProtocolResult<Box<dyn Packet>> {
        loop {
            if let Some(packet) = self.session.next_packet()? {
                return Ok(packet);
            }
            let mut tmp = [0u8; READ_CHUNK];
            let n = self.stream.read(&mut tmp).await?;
            if n == 0 {
                return Err(ProtocolError::ConnectionClosed);
            }
            self.session.receive(&tmp[..n]);
        }
    }
}

/// Write half of a split connection.
pub struct ConnectionWriter<S> {
    stream: WriteHalf<S>,
    session: SessionWriter,
}

impl<S: AsyncWrite + Unpin> ConnectionWriter<S> {
    pub async fn write_packet(&mut self, packet: &dyn Packet) -> ProtocolResult<()> {
        let frame = self.session.send(packet)?;
        self.stream.write_all(&frame).await?;
        Ok(())
    }

    pub async fn flush(&mut self) -> ProtocolResult<()> {
        self.stream.flush().await?;
        Ok(())
    }
}
