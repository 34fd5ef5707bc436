#![allow(dead_code)]

pub mod uploads {
    use std::path::{Path, PathBuf};

    /// Write `content` where the engine would spool an upload named `name`.
    pub fn spool(dir: &Path, name: &str, content: &[u8]) -> PathBuf {
        let path = dir.join(format!("minihttp.upfile.{name}"));
        std::fs::write(&path, content).unwrap();
        path
    }
}

pub mod sinks {
    use brrtrouter_bridge::engine::ResponseSink;
    use std::io;

    /// Everything an emitter did to a sink, in call order.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum Call {
        Status(u16, String),
        Header(String, Vec<String>),
        Write(Vec<u8>),
        End,
    }

    #[derive(Debug, Default)]
    pub struct RecordingSink {
        pub calls: Vec<Call>,
        /// Fail the n-th write (0-based)
        pub fail_write_at: Option<usize>,
    }

    impl RecordingSink {
        pub fn writes(&self) -> Vec<&[u8]> {
            self.calls
                .iter()
                .filter_map(|c| match c {
                    Call::Write(chunk) => Some(chunk.as_slice()),
                    _ => None,
                })
                .collect()
        }

        pub fn end_count(&self) -> usize {
            self.calls.iter().filter(|c| **c == Call::End).count()
        }
    }

    impl ResponseSink for RecordingSink {
        fn status(&mut self, code: u16, reason: &str) -> io::Result<()> {
            self.calls.push(Call::Status(code, reason.to_string()));
            Ok(())
        }

        fn header(&mut self, name: &str, values: &[&[u8]]) -> io::Result<()> {
            self.calls.push(Call::Header(
                name.to_string(),
                values
                    .iter()
                    .map(|v| String::from_utf8_lossy(v).to_string())
                    .collect(),
            ));
            Ok(())
        }

        fn write(&mut self, chunk: &[u8]) -> io::Result<()> {
            if self.fail_write_at == Some(self.writes().len()) {
                return Err(io::Error::new(io::ErrorKind::BrokenPipe, "client went away"));
            }
            self.calls.push(Call::Write(chunk.to_vec()));
            Ok(())
        }

        fn end(&mut self) -> io::Result<()> {
            self.calls.push(Call::End);
            Ok(())
        }
    }
}

pub mod test_server {
    use std::sync::Once;

    /// Ensures May coroutines are configured only once
    static MAY_INIT: Once = Once::new();

    pub fn setup_may_runtime() {
        MAY_INIT.call_once(|| {
            may::config().set_stack_size(0x8000);
        });
    }
}

pub mod http {
    use std::io::{Read, Write};
    use std::net::{SocketAddr, TcpStream};
    use std::time::Duration;

    /// Send a raw request and collect whatever arrives before the read timeout.
    pub fn send_request(addr: &SocketAddr, req: &str) -> String {
        let mut stream = TcpStream::connect(addr).unwrap();
        stream.write_all(req.as_bytes()).unwrap();
        stream
            .set_read_timeout(Some(Duration::from_millis(500)))
            .unwrap();
        let mut buf = Vec::new();
        loop {
            let mut tmp = [0u8; 1024];
            match stream.read(&mut tmp) {
                Ok(0) => break,
                Ok(n) => buf.extend_from_slice(&tmp[..n]),
                Err(ref e)
                    if e.kind() == std::io::ErrorKind::WouldBlock
                        || e.kind() == std::io::ErrorKind::TimedOut =>
                {
                    break
                }
                Err(e) => panic!("read error: {:?}", e),
            }
        }
        String::from_utf8_lossy(&buf).to_string()
    }
}
