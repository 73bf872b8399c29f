//! Host resources wrapped as script objects: files, sockets, pipes, loggers and CSV streams.
//!
//! None of these synchronize their users beyond what is needed to stay memory-safe.
//! Two tasks writing the same file interleave exactly as the OS lets them.

use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream, UdpSocket};
#[cfg(unix)]
use std::os::unix::net::{UnixListener, UnixStream};
use std::sync::Arc;

use chrono::{Local, Utc};
use crossbeam::channel::{Receiver, Sender};
use parking_lot::Mutex;
use thiserror::Error;

use crate::interpreter::environment::SharedWriter;

#[derive(Debug, Error)]
pub enum ResourceError {
    #[error("{0} is closed")]
    Closed(String),
    #[error("{0}")]
    Io(#[from] io::Error),
    #[error("{0}")]
    Csv(#[from] csv::Error),
}

/// How a file was opened, parsed from the short mode strings scripts use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileMode {
    Read,
    Write,
    Append,
    ReadWrite,
    ReadWriteTruncate,
    ReadAppend,
}

impl FileMode {
    pub fn parse(mode: &str) -> Option<FileMode> {
        match mode {
            "r" | "<" => Some(FileMode::Read),
            "w" | ">" => Some(FileMode::Write),
            "a" | ">>" => Some(FileMode::Append),
            "r+" | "+<" => Some(FileMode::ReadWrite),
            "w+" | "+>" => Some(FileMode::ReadWriteTruncate),
            "a+" | "+>>" => Some(FileMode::ReadAppend),
            _ => None,
        }
    }

    fn options(&self) -> OpenOptions {
        let mut options = OpenOptions::new();
        match self {
            FileMode::Read => options.read(true),
            FileMode::Write => options.write(true).create(true).truncate(true),
            FileMode::Append => options.append(true).create(true),
            FileMode::ReadWrite => options.read(true).write(true),
            FileMode::ReadWriteTruncate => options.read(true).write(true).create(true).truncate(true),
            FileMode::ReadAppend => options.read(true).append(true).create(true),
        };
        options
    }
}

/// An open file.
pub struct FileHandle {
    pub path: String,
    pub mode: FileMode,
    inner: Mutex<Option<BufReader<File>>>,
}

impl FileHandle {
    pub fn open(path: &str, mode: FileMode) -> io::Result<Self> {
        let file = mode.options().open(path)?;
        Ok(Self {
            path: path.to_string(),
            mode,
            inner: Mutex::new(Some(BufReader::new(file))),
        })
    }

    fn with<T>(&self, f: impl FnOnce(&mut BufReader<File>) -> io::Result<T>) -> Result<T, ResourceError> {
        let mut inner = self.inner.lock();
        let reader = inner
            .as_mut()
            .ok_or_else(|| ResourceError::Closed(self.path.clone()))?;
        Ok(f(reader)?)
    }

    /// Everything from the current position to the end.
    pub fn read_to_string(&self) -> Result<String, ResourceError> {
        self.with(|reader| {
            let mut text = String::new();
            reader.read_to_string(&mut text)?;
            Ok(text)
        })
    }

    /// Next line without its terminator; `None` at end of file.
    pub fn read_line(&self) -> Result<Option<String>, ResourceError> {
        self.with(|reader| {
            let mut line = String::new();
            if reader.read_line(&mut line)? == 0 {
                return Ok(None);
            }
            while line.ends_with('\n') || line.ends_with('\r') {
                line.pop();
            }
            Ok(Some(line))
        })
    }

    pub fn write(&self, text: &str) -> Result<usize, ResourceError> {
        self.write_bytes(text.as_bytes())
    }

    pub fn write_bytes(&self, bytes: &[u8]) -> Result<usize, ResourceError> {
        self.with(|reader| {
            let file = reader.get_mut();
            file.write_all(bytes)?;
            file.flush()?;
            Ok(bytes.len())
        })
    }

    pub fn close(&self) {
        self.inner.lock().take();
    }

    pub fn is_closed(&self) -> bool {
        self.inner.lock().is_none()
    }
}

/// `io::Write` adapter so other writers (CSV, loggers) can target a script file.
pub struct FileSink(pub Arc<FileHandle>);

impl Write for FileSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0
            .write_bytes(buf)
            .map_err(|err| io::Error::new(io::ErrorKind::Other, err.to_string()))
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Anything a connected socket can be read from and written to.
trait Duplex: Read + Write + Send {}

impl<T: Read + Write + Send> Duplex for T {}

/// A connected UDP socket seen as a byte stream: each read takes one datagram,
/// each write sends one.
struct UdpConn(UdpSocket);

impl Read for UdpConn {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.0.recv(buf)
    }
}

impl Write for UdpConn {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.send(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

enum Listener {
    Tcp(TcpListener),
    #[cfg(unix)]
    Unix(UnixListener),
}

impl Listener {
    fn try_clone(&self) -> io::Result<Listener> {
        match self {
            Listener::Tcp(listener) => listener.try_clone().map(Listener::Tcp),
            #[cfg(unix)]
            Listener::Unix(listener) => listener.try_clone().map(Listener::Unix),
        }
    }

    fn accept(&self) -> io::Result<SocketHandle> {
        match self {
            Listener::Tcp(listener) => {
                let (stream, peer) = listener.accept()?;
                Ok(SocketHandle::from_stream(Box::new(stream), peer.to_string()))
            }
            #[cfg(unix)]
            Listener::Unix(listener) => {
                let (stream, peer) = listener.accept()?;
                let addr = peer
                    .as_pathname()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "@unix".to_string());
                Ok(SocketHandle::from_stream(Box::new(stream), addr))
            }
        }
    }
}

enum SocketKind {
    Stream(Mutex<Option<BufReader<Box<dyn Duplex>>>>),
    Listener(Mutex<Option<Listener>>),
}

/// A TCP, UDP or Unix-domain connection, or a TCP or Unix-domain listener.
pub struct SocketHandle {
    kind: SocketKind,
    addr: String,
}

impl SocketHandle {
    pub fn dial(addr: &str) -> io::Result<Self> {
        let stream = TcpStream::connect(addr)?;
        Ok(Self::from_stream(Box::new(stream), addr.to_string()))
    }

    /// Connect a UDP socket bound to an ephemeral local port to `addr`.
    pub fn dial_udp(addr: &str) -> io::Result<Self> {
        let local = if addr.starts_with('[') { "[::]:0" } else { "0.0.0.0:0" };
        let socket = UdpSocket::bind(local)?;
        socket.connect(addr)?;
        let peer = socket.peer_addr().map(|a| a.to_string()).unwrap_or_else(|_| addr.to_string());
        Ok(Self::from_stream(Box::new(UdpConn(socket)), peer))
    }

    pub fn listen(addr: &str) -> io::Result<Self> {
        let listener = TcpListener::bind(addr)?;
        let local = listener.local_addr().map(|a| a.to_string()).unwrap_or_else(|_| addr.to_string());
        Ok(Self::from_listener(Listener::Tcp(listener), local))
    }

    #[cfg(unix)]
    pub fn dial_unix(path: &str) -> io::Result<Self> {
        let stream = UnixStream::connect(path)?;
        Ok(Self::from_stream(Box::new(stream), path.to_string()))
    }

    #[cfg(unix)]
    pub fn listen_unix(path: &str) -> io::Result<Self> {
        let listener = UnixListener::bind(path)?;
        Ok(Self::from_listener(Listener::Unix(listener), path.to_string()))
    }

    #[cfg(not(unix))]
    pub fn dial_unix(_path: &str) -> io::Result<Self> {
        Err(io::Error::new(io::ErrorKind::Unsupported, "unix sockets are not available"))
    }

    #[cfg(not(unix))]
    pub fn listen_unix(_path: &str) -> io::Result<Self> {
        Err(io::Error::new(io::ErrorKind::Unsupported, "unix sockets are not available"))
    }

    fn from_stream(stream: Box<dyn Duplex>, addr: String) -> Self {
        Self {
            kind: SocketKind::Stream(Mutex::new(Some(BufReader::new(stream)))),
            addr,
        }
    }

    fn from_listener(listener: Listener, addr: String) -> Self {
        Self {
            kind: SocketKind::Listener(Mutex::new(Some(listener))),
            addr,
        }
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }

    pub fn is_listener(&self) -> bool {
        matches!(self.kind, SocketKind::Listener(_))
    }

    fn stream<T>(&self, f: impl FnOnce(&mut BufReader<Box<dyn Duplex>>) -> io::Result<T>) -> Result<T, ResourceError> {
        match &self.kind {
            SocketKind::Stream(stream) => {
                let mut stream = stream.lock();
                let stream = stream
                    .as_mut()
                    .ok_or_else(|| ResourceError::Closed(self.addr.clone()))?;
                Ok(f(stream)?)
            }
            SocketKind::Listener(_) => Err(ResourceError::Io(io::Error::new(
                io::ErrorKind::Unsupported,
                "listener cannot carry data",
            ))),
        }
    }

    /// Blocks for the next incoming connection.
    pub fn accept(&self) -> Result<SocketHandle, ResourceError> {
        match &self.kind {
            SocketKind::Listener(listener) => {
                // Clone the listener so a blocking accept does not hold the lock.
                let listener = listener
                    .lock()
                    .as_ref()
                    .ok_or_else(|| ResourceError::Closed(self.addr.clone()))?
                    .try_clone()?;
                Ok(listener.accept()?)
            }
            SocketKind::Stream(_) => Err(ResourceError::Io(io::Error::new(
                io::ErrorKind::Unsupported,
                "connection cannot accept",
            ))),
        }
    }

    pub fn read_line(&self) -> Result<Option<String>, ResourceError> {
        self.stream(|stream| {
            let mut line = String::new();
            if stream.read_line(&mut line)? == 0 {
                return Ok(None);
            }
            while line.ends_with('\n') || line.ends_with('\r') {
                line.pop();
            }
            Ok(Some(line))
        })
    }

    /// Up to `max` bytes, lossily decoded.
    pub fn read(&self, max: usize) -> Result<String, ResourceError> {
        self.stream(|stream| {
            let mut buf = vec![0u8; max];
            let n = stream.read(&mut buf)?;
            Ok(String::from_utf8_lossy(&buf[..n]).into_owned())
        })
    }

    pub fn write(&self, text: &str) -> Result<usize, ResourceError> {
        self.stream(|stream| {
            let socket = stream.get_mut();
            socket.write_all(text.as_bytes())?;
            socket.flush()?;
            Ok(text.len())
        })
    }

    pub fn close(&self) {
        match &self.kind {
            SocketKind::Stream(stream) => {
                stream.lock().take();
            }
            SocketKind::Listener(listener) => {
                listener.lock().take();
            }
        }
    }
}

/// Synchronous in-memory pipe. A write blocks until a reader takes the chunk.
pub struct PipeHandle {
    writer: Mutex<Option<Sender<String>>>,
    reader: Receiver<String>,
}

impl PipeHandle {
    pub fn new() -> Self {
        let (writer, reader) = crossbeam::channel::bounded(0);
        Self {
            writer: Mutex::new(Some(writer)),
            reader,
        }
    }

    pub fn write(&self, text: &str) -> Result<usize, ResourceError> {
        // Send on a clone so a blocked writer does not hold the lock close needs.
        let writer = self
            .writer
            .lock()
            .clone()
            .ok_or_else(|| ResourceError::Closed("pipe".to_string()))?;
        writer
            .send(text.to_string())
            .map_err(|_| ResourceError::Closed("pipe".to_string()))?;
        Ok(text.len())
    }

    /// Next written chunk; `None` once the write side is closed.
    pub fn read(&self) -> Option<String> {
        self.reader.recv().ok()
    }

    /// Every chunk until the write side is closed.
    pub fn read_all(&self) -> String {
        self.reader.iter().collect()
    }

    /// Close the write side. Readers drain what is in flight, then see end of input.
    pub fn close(&self) {
        self.writer.lock().take();
    }
}

/// Where a logger writes.
pub enum LogSink {
    Writer(SharedWriter),
    File(Arc<FileHandle>),
    Stderr,
}

/// Line header flags, bit-compatible with the classic `log` package layout.
pub mod log_flags {
    pub const DATE: i64 = 1;
    pub const TIME: i64 = 2;
    pub const MICROSECONDS: i64 = 4;
    pub const UTC: i64 = 32;
    pub const MSG_PREFIX: i64 = 64;
    pub const STD: i64 = DATE | TIME;
}

struct LoggerState {
    prefix: String,
    flags: i64,
}

/// Line-oriented logger with a prefix and a timestamp header.
pub struct ScriptLogger {
    sink: LogSink,
    state: Mutex<LoggerState>,
}

impl ScriptLogger {
    pub fn new(sink: LogSink, prefix: &str, flags: i64) -> Self {
        Self {
            sink,
            state: Mutex::new(LoggerState {
                prefix: prefix.to_string(),
                flags,
            }),
        }
    }

    pub fn prefix(&self) -> String {
        self.state.lock().prefix.clone()
    }

    pub fn set_prefix(&self, prefix: &str) {
        self.state.lock().prefix = prefix.to_string();
    }

    pub fn flags(&self) -> i64 {
        self.state.lock().flags
    }

    pub fn set_flags(&self, flags: i64) {
        self.state.lock().flags = flags;
    }

    fn header(&self) -> String {
        let state = self.state.lock();
        let mut header = String::new();
        if state.flags & log_flags::MSG_PREFIX == 0 {
            header.push_str(&state.prefix);
        }
        let (date, time) = if state.flags & log_flags::UTC != 0 {
            let now = Utc::now();
            (now.format("%Y/%m/%d").to_string(), now.format("%H:%M:%S%.6f").to_string())
        } else {
            let now = Local::now();
            (now.format("%Y/%m/%d").to_string(), now.format("%H:%M:%S%.6f").to_string())
        };
        if state.flags & log_flags::DATE != 0 {
            header.push_str(&date);
            header.push(' ');
        }
        if state.flags & (log_flags::TIME | log_flags::MICROSECONDS) != 0 {
            if state.flags & log_flags::MICROSECONDS != 0 {
                header.push_str(&time);
            } else {
                header.push_str(&time[..8]);
            }
            header.push(' ');
        }
        if state.flags & log_flags::MSG_PREFIX != 0 {
            header.push_str(&state.prefix);
        }
        header
    }

    /// Write one entry; a trailing newline is added when missing.
    pub fn output(&self, message: &str) -> Result<(), ResourceError> {
        let mut line = self.header();
        line.push_str(message);
        if !line.ends_with('\n') {
            line.push('\n');
        }
        match &self.sink {
            LogSink::Writer(writer) => {
                let mut writer = writer.lock();
                writer.write_all(line.as_bytes())?;
                writer.flush()?;
            }
            LogSink::File(file) => {
                file.write(&line)?;
            }
            LogSink::Stderr => io::stderr().write_all(line.as_bytes())?,
        }
        Ok(())
    }
}

/// Record-at-a-time CSV reader over a file.
pub struct CsvReaderHandle {
    pub path: String,
    reader: Mutex<Option<csv::Reader<File>>>,
}

impl CsvReaderHandle {
    pub fn open(path: &str, delimiter: u8) -> Result<Self, ResourceError> {
        let reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .delimiter(delimiter)
            .from_path(path)?;
        Ok(Self {
            path: path.to_string(),
            reader: Mutex::new(Some(reader)),
        })
    }

    /// Next record; `None` at end of input.
    pub fn read(&self) -> Result<Option<Vec<String>>, ResourceError> {
        let mut reader = self.reader.lock();
        let reader = reader
            .as_mut()
            .ok_or_else(|| ResourceError::Closed(self.path.clone()))?;
        let mut record = csv::StringRecord::new();
        if !reader.read_record(&mut record)? {
            return Ok(None);
        }
        Ok(Some(record.iter().map(str::to_string).collect()))
    }

    pub fn read_all(&self) -> Result<Vec<Vec<String>>, ResourceError> {
        let mut rows = Vec::new();
        while let Some(row) = self.read()? {
            rows.push(row);
        }
        Ok(rows)
    }

    pub fn close(&self) {
        self.reader.lock().take();
    }
}

/// CSV writer over a path or an already open script file.
pub struct CsvWriterHandle {
    writer: Mutex<csv::Writer<Box<dyn Write + Send>>>,
}

impl CsvWriterHandle {
    pub fn create(path: &str, delimiter: u8) -> Result<Self, ResourceError> {
        let file = File::create(path)?;
        Ok(Self::from_writer(Box::new(file), delimiter))
    }

    pub fn from_writer(sink: Box<dyn Write + Send>, delimiter: u8) -> Self {
        let writer = csv::WriterBuilder::new()
            .flexible(true)
            .delimiter(delimiter)
            .from_writer(sink);
        Self {
            writer: Mutex::new(writer),
        }
    }

    pub fn write(&self, record: &[String]) -> Result<(), ResourceError> {
        self.writer.lock().write_record(record)?;
        Ok(())
    }

    pub fn write_all(&self, records: &[Vec<String>]) -> Result<(), ResourceError> {
        let mut writer = self.writer.lock();
        for record in records {
            writer.write_record(record)?;
        }
        writer.flush()?;
        Ok(())
    }

    pub fn flush(&self) -> Result<(), ResourceError> {
        self.writer.lock().flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::environment::OutputBuffer;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_file_mode_table() {
        assert_eq!(FileMode::parse("<"), Some(FileMode::Read));
        assert_eq!(FileMode::parse(">>"), Some(FileMode::Append));
        assert_eq!(FileMode::parse("+>"), Some(FileMode::ReadWriteTruncate));
        assert_eq!(FileMode::parse("rw"), None);
    }

    #[test]
    fn test_file_write_then_read_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        let path = path.to_str().unwrap();

        let out = FileHandle::open(path, FileMode::Write).unwrap();
        out.write("first\nsecond\n").unwrap();
        out.close();
        assert!(out.write("late").is_err());

        let input = FileHandle::open(path, FileMode::Read).unwrap();
        assert_eq!(input.read_line().unwrap(), Some("first".to_string()));
        assert_eq!(input.read_to_string().unwrap(), "second\n");
        assert_eq!(input.read_line().unwrap(), None);
    }

    #[test]
    fn test_logger_prefix_without_timestamp() {
        let buffer = OutputBuffer::new();
        let logger = ScriptLogger::new(LogSink::Writer(buffer.writer()), "[app] ", 0);
        logger.output("started").unwrap();
        logger.set_flags(log_flags::MSG_PREFIX);
        logger.output("done\n").unwrap();
        assert_eq!(buffer.contents(), "[app] started\n[app] done\n");
    }

    #[test]
    fn test_csv_round_trip_through_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rows.csv");
        let path = path.to_str().unwrap();

        let writer = CsvWriterHandle::create(path, b',').unwrap();
        writer
            .write_all(&[
                vec!["name".into(), "qty".into()],
                vec!["bolt, long".into(), "3".into()],
            ])
            .unwrap();

        let reader = CsvReaderHandle::open(path, b',').unwrap();
        let rows = reader.read_all().unwrap();
        assert_eq!(rows[1], vec!["bolt, long".to_string(), "3".to_string()]);
        assert_eq!(reader.read().unwrap(), None);
    }

    #[test]
    fn test_pipe_hands_chunks_to_reader() {
        let pipe = Arc::new(PipeHandle::new());
        let writer = Arc::clone(&pipe);
        let handle = std::thread::spawn(move || {
            writer.write("ab").unwrap();
            writer.write("cd").unwrap();
            writer.close();
        });
        assert_eq!(pipe.read_all(), "abcd");
        handle.join().unwrap();
        assert_eq!(pipe.read(), None);
        assert!(pipe.write("late").is_err());
    }

    #[test]
    fn test_udp_sockets_exchange_datagrams() {
        let server = UdpSocket::bind("127.0.0.1:0").unwrap();
        let addr = server.local_addr().unwrap().to_string();
        let client = SocketHandle::dial_udp(&addr).unwrap();
        assert_eq!(client.write("ping").unwrap(), 4);

        let mut buf = [0u8; 16];
        let (n, peer) = server.recv_from(&mut buf).unwrap();
        assert_eq!(&buf[..n], b"ping");
        server.send_to(b"pong", peer).unwrap();
        assert_eq!(client.read(16).unwrap(), "pong");
    }

    #[cfg(unix)]
    #[test]
    fn test_unix_socket_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("echo.sock");
        let path = path.to_str().unwrap();
        let listener = SocketHandle::listen_unix(path).unwrap();
        assert!(listener.is_listener());

        let client = SocketHandle::dial_unix(path).unwrap();
        let server = listener.accept().unwrap();
        client.write("hello\n").unwrap();
        assert_eq!(server.read_line().unwrap(), Some("hello".to_string()));
    }
}
