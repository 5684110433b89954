use crate::error::{Error, RemoteError, Result};
use crate::remote::{Connector, Entry, EntryKind, RemoteFs};
use std::io::Read;
use suppaftp::list::File;
use suppaftp::types::FileType;
use suppaftp::{FtpStream, Mode};
use tracing::{debug, info, warn};

pub const DEFAULT_PORT: u16 = 21;

/// An authenticated FTP control connection in passive mode.
///
/// Only [`FtpSession::open`] builds one, so holding a value means connect and
/// login both succeeded.
pub struct FtpSession {
    stream: Option<FtpStream>,
    host: String,
}

impl FtpSession {
    pub fn open(address: &str, login: &str, password: &str) -> Result<Self> {
        let (host, port) = parse_address(address)?;
        info!("connecting to FTP server {host}:{port}");

        let mut stream =
            FtpStream::connect((host.as_str(), port)).map_err(|e| Error::Connection {
                address: format!("{host}:{port}"),
                source: e.into(),
            })?;

        debug!("logging in as {login}");
        if let Err(e) = stream.login(login, password) {
            if let Err(quit) = stream.quit() {
                debug!("QUIT after rejected login failed: {quit}");
            }
            return Err(Error::Authentication {
                login: login.to_string(),
                source: e.into(),
            });
        }

        stream.set_mode(Mode::Passive);
        Ok(Self {
            stream: Some(stream),
            host,
        })
    }

    fn stream(&mut self) -> std::result::Result<&mut FtpStream, RemoteError> {
        self.stream
            .as_mut()
            .ok_or_else(|| RemoteError("session already closed".into()))
    }
}

impl RemoteFs for FtpSession {
    fn current_dir(&mut self) -> std::result::Result<String, RemoteError> {
        Ok(self.stream()?.pwd()?)
    }

    fn change_dir(&mut self, path: &str) -> std::result::Result<(), RemoteError> {
        Ok(self.stream()?.cwd(path)?)
    }

    fn make_dir(&mut self, path: &str) -> std::result::Result<(), RemoteError> {
        Ok(self.stream()?.mkdir(path)?)
    }

    fn list(&mut self, path: &str) -> std::result::Result<Vec<Entry>, RemoteError> {
        let lines = self.stream()?.list(Some(path))?;
        Ok(lines.iter().filter_map(|line| parse_list_line(line)).collect())
    }

    fn store(
        &mut self,
        path: &str,
        mut reader: &mut dyn Read,
    ) -> std::result::Result<u64, RemoteError> {
        let stream = self.stream()?;
        stream.transfer_type(FileType::Binary)?;
        Ok(stream.put_file(path, &mut reader)?)
    }

    fn delete_file(&mut self, path: &str) -> std::result::Result<(), RemoteError> {
        Ok(self.stream()?.rm(path)?)
    }

    fn remove_dir(&mut self, path: &str) -> std::result::Result<(), RemoteError> {
        Ok(self.stream()?.rmdir(path)?)
    }

    fn close(mut self) -> std::result::Result<(), RemoteError> {
        match self.stream.take() {
            Some(mut stream) => {
                info!("logging out of {}", self.host);
                Ok(stream.quit()?)
            }
            None => Ok(()),
        }
    }
}

impl Drop for FtpSession {
    fn drop(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            debug!("session to {} dropped without close, sending QUIT", self.host);
            if let Err(e) = stream.quit() {
                debug!("QUIT on drop failed: {e}");
            }
        }
    }
}

/// Parses one UNIX or DOS style LIST line; unparsable lines are skipped.
fn parse_list_line(line: &str) -> Option<Entry> {
    match line.parse::<File>() {
        Ok(file) => Some(Entry {
            name: file.name().to_string(),
            kind: if file.is_directory() {
                EntryKind::Folder
            } else {
                EntryKind::File
            },
        }),
        Err(e) => {
            warn!("skipping unparsable LIST line {line:?}: {e}");
            None
        }
    }
}

/// Connection settings for opening one [`FtpSession`] per operation.
#[derive(Debug, Clone)]
pub struct FtpConnector {
    pub address: String,
    pub login: String,
    pub password: String,
}

impl Connector for FtpConnector {
    type Session = FtpSession;

    fn open(&self) -> Result<FtpSession> {
        FtpSession::open(&self.address, &self.login, &self.password)
    }
}

/// Splits `host[:port]` or `host port`; the port defaults to 21.
pub fn parse_address(address: &str) -> Result<(String, u16)> {
    let address = address.trim();
    let invalid = || Error::InvalidAddress(address.to_string());

    let (host, port) = match address.split_once([':', ' ']) {
        Some((host, port)) => {
            let port = port.trim_start().parse::<u16>().map_err(|_| invalid())?;
            (host, port)
        }
        None => (address, DEFAULT_PORT),
    };
    if host.is_empty() {
        return Err(invalid());
    }
    Ok((host.to_string(), port))
}
