use std::io::{Stderr, Stdout, Write};
use std::string::FromUtf8Error;

/// Output sink for console reporting. `Vec` buffers let tests read back what was written.
pub struct Writer {
    buffer: WriteBuffer,
}

impl Writer {
    pub fn new(buffer: WriteBuffer) -> Self {
        Self { buffer }
    }

    pub fn into_string(self) -> Result<String, FromUtf8Error> {
        self.buffer.into_string()
    }

    /// Buffered content with ANSI colour codes removed.
    pub fn stripped(self) -> Result<String, FromUtf8Error> {
        let raw = self.buffer.into_string()?;
        String::from_utf8(strip_ansi_escapes::strip(raw.as_bytes()).unwrap_or_default())
    }
}

impl Write for Writer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.buffer.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.buffer.flush()
    }
}

pub enum WriteBuffer {
    Stdout(Stdout),
    Stderr(Stderr),
    Vec(Vec<u8>),
}

impl WriteBuffer {
    fn into_string(self) -> Result<String, FromUtf8Error> {
        match self {
            WriteBuffer::Stdout(..) | WriteBuffer::Stderr(..) => Ok(String::new()),
            WriteBuffer::Vec(vec) => String::from_utf8(vec),
        }
    }
}

impl Write for WriteBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match self {
            WriteBuffer::Stdout(stdout) => stdout.write(buf),
            WriteBuffer::Stderr(stderr) => stderr.write(buf),
            WriteBuffer::Vec(vec) => vec.write(buf),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match self {
            WriteBuffer::Stdout(stdout) => stdout.flush(),
            WriteBuffer::Stderr(stderr) => stderr.flush(),
            WriteBuffer::Vec(vec) => vec.flush(),
        }
    }
}
