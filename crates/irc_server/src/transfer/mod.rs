//! Server-mediated file transfer (spec §4.4).
//!
//! Sessions are offered, accepted (which starts automatic streaming), or
//! cancelled. A separate legacy path (`pushData`/`done`) lets a sender
//! push chunks by hand; it intentionally never computes a CRC32, matching
//! the asymmetry in the original tool this was distilled from.

mod crc32;

use crate::constants::*;
use crate::deliver;
use crate::state::{ServerState, Uid};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use crc32::Crc32;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::sync::Mutex;

#[derive(Debug)]
pub enum TransferError {
    UnknownId,
    NotActive,
    NotAccepted,
    WrongParticipant,
    Io(String),
    InvalidBase64,
}

impl std::fmt::Display for TransferError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let msg = match self {
            TransferError::UnknownId => "unknown transfer id",
            TransferError::NotActive => "transfer not active",
            TransferError::NotAccepted => "transfer not accepted yet",
            TransferError::WrongParticipant => "not a participant in this transfer",
            TransferError::Io(e) => return write!(f, "I/O error: {e}"),
            TransferError::InvalidBase64 => "invalid base64",
        };
        write!(f, "{msg}")
    }
}

struct Session {
    sender: Uid,
    receiver: Uid,
    /// Path as given by the sender (read from, during streaming accept).
    source_path: String,
    /// `<uploadsDir>/<id>_<safeName>`, the server-side copy.
    saved_path: PathBuf,
    size_total: u64,
    size_seen: u64,
    accepted: bool,
    active: bool,
}

pub struct TransferEngine {
    uploads_dir: PathBuf,
    next_id: AtomicU64,
    sessions: Mutex<std::collections::HashMap<u64, Session>>,
}

fn sanitize_filename(name: &str) -> String {
    let base = Path::new(name)
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("");
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() { "file".to_string() } else { cleaned }
}

impl TransferEngine {
    pub fn new(uploads_dir: impl Into<PathBuf>) -> Self {
        Self {
            uploads_dir: uploads_dir.into(),
            next_id: AtomicU64::new(1),
            sessions: Mutex::new(std::collections::HashMap::new()),
        }
    }

    /// Creates an offer, touching the server-side destination file, and
    /// returns the new session id plus the server-side path.
    pub async fn create_offer(
        &self,
        sender: Uid,
        receiver: Uid,
        filename: &str,
        size_total: u64,
    ) -> Result<(u64, PathBuf), TransferError> {
        tokio::fs::create_dir_all(&self.uploads_dir)
            .await
            .map_err(|e| TransferError::Io(e.to_string()))?;
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let safe_name = sanitize_filename(filename);
        let saved_path = self.uploads_dir.join(format!("{id}_{safe_name}"));
        tokio::fs::File::create(&saved_path)
            .await
            .map_err(|e| TransferError::Io(e.to_string()))?;

        let mut sessions = self.sessions.lock().await;
        sessions.insert(
            id,
            Session {
                sender,
                receiver,
                source_path: filename.to_string(),
                saved_path: saved_path.clone(),
                size_total,
                size_seen: 0,
                accepted: false,
                active: true,
            },
        );
        log::info!("transfer {id} offered: {filename} ({size_total} bytes advertised)");
        Ok((id, saved_path))
    }

    /// Accepts the offer and streams the source file to the receiver in
    /// base64-encoded chunks, updating the server-side copy and a running
    /// CRC32 as it goes.
    pub async fn accept_and_stream(
        &self,
        id: u64,
        receiver: Uid,
        server: &ServerState,
        server_name: &str,
    ) -> Result<(), TransferError> {
        let (sender, source_path, saved_path) = {
            let mut sessions = self.sessions.lock().await;
            let session = sessions.get_mut(&id).ok_or(TransferError::UnknownId)?;
            if !session.active {
                return Err(TransferError::NotActive);
            }
            if session.receiver != receiver {
                return Err(TransferError::WrongParticipant);
            }
            session.accepted = true;
            (session.sender, session.source_path.clone(), session.saved_path.clone())
        };

        let accepted_line = crate::replies::numeric(server_name, RPL_FILEACCEPTED, "*", &format!("{id} :ACCEPTED"));
        deliver::send_to_uid(server, receiver, &accepted_line);

        let begin_line = crate::replies::numeric(server_name, RPL_FILESTREAMBEGIN, "*", &id.to_string());
        deliver::send_to_uid(server, sender, &begin_line);
        deliver::send_to_uid(server, receiver, &begin_line);

        let mut source = tokio::fs::File::open(&source_path)
            .await
            .map_err(|e| TransferError::Io(e.to_string()))?;
        let mut dest = tokio::fs::OpenOptions::new()
            .write(true)
            .truncate(true)
            .create(true)
            .open(&saved_path)
            .await
            .map_err(|e| TransferError::Io(e.to_string()))?;

        let mut crc = Crc32::new();
        let mut buf = [0u8; FILE_CHUNK_SIZE];
        loop {
            let n = source
                .read(&mut buf)
                .await
                .map_err(|e| TransferError::Io(e.to_string()))?;
            if n == 0 {
                break;
            }
            let chunk = &buf[..n];
            crc.update(chunk);
            dest.write_all(chunk)
                .await
                .map_err(|e| TransferError::Io(e.to_string()))?;

            let encoded = STANDARD.encode(chunk);
            let line = crate::replies::numeric(server_name, RPL_FILEDATA, "*", &encoded);
            deliver::send_to_uid(server, receiver, &line);

            let mut sessions = self.sessions.lock().await;
            if let Some(session) = sessions.get_mut(&id) {
                session.size_seen += n as u64;
            }
        }
        dest.flush().await.map_err(|e| TransferError::Io(e.to_string()))?;

        let (sender, size_seen, size_total) = {
            let mut sessions = self.sessions.lock().await;
            let session = sessions.get_mut(&id).ok_or(TransferError::UnknownId)?;
            session.active = false;
            (session.sender, session.size_seen, session.size_total)
        };

        self.finish_both(server, server_name, id, sender, receiver, size_seen, size_total)
            .await;
        let hash_line = crate::replies::numeric(server_name, RPL_FILEHASH, "*", &crc.finish_hex());
        deliver::send_to_uid(server, sender, &hash_line);
        deliver::send_to_uid(server, receiver, &hash_line);
        log::info!("transfer {id} finished: {size_seen} bytes, crc32={}", crc.finish_hex());
        Ok(())
    }

    async fn finish_both(
        &self,
        server: &ServerState,
        server_name: &str,
        id: u64,
        sender: Uid,
        receiver: Uid,
        size_seen: u64,
        size_total: u64,
    ) {
        let saved_path = {
            let sessions = self.sessions.lock().await;
            sessions
                .get(&id)
                .map(|s| s.saved_path.display().to_string())
                .unwrap_or_default()
        };
        let done_line = crate::replies::numeric(server_name, RPL_FILEDONE, "*", "FILE DONE");
        deliver::send_to_uid(server, sender, &done_line);
        deliver::send_to_uid(server, receiver, &done_line);

        let size_report = if size_total > 0 {
            format!("{saved_path} ({size_seen}/{size_total})")
        } else {
            format!("{saved_path} ({size_seen})")
        };
        let saved_line = crate::replies::numeric(server_name, RPL_FILESAVED, "*", &size_report);
        deliver::send_to_uid(server, sender, &saved_line);
        deliver::send_to_uid(server, receiver, &saved_line);
    }

    /// Legacy manual path: sender-pushed base64 chunk, forwarded verbatim
    /// to the receiver and appended to the server-side copy. No CRC.
    pub async fn push_data(&self, id: u64, sender: Uid, base64_chunk: &str) -> Result<Uid, TransferError> {
        let (receiver, saved_path) = {
            let sessions = self.sessions.lock().await;
            let session = sessions.get(&id).ok_or(TransferError::UnknownId)?;
            if !session.active {
                return Err(TransferError::NotActive);
            }
            if !session.accepted {
                return Err(TransferError::NotAccepted);
            }
            if session.sender != sender {
                return Err(TransferError::WrongParticipant);
            }
            (session.receiver, session.saved_path.clone())
        };

        let raw = decode_tolerant(base64_chunk);
        let mut dest = tokio::fs::OpenOptions::new()
            .append(true)
            .create(true)
            .open(&saved_path)
            .await
            .map_err(|e| TransferError::Io(e.to_string()))?;
        dest.write_all(&raw).await.map_err(|e| TransferError::Io(e.to_string()))?;

        let mut sessions = self.sessions.lock().await;
        if let Some(session) = sessions.get_mut(&id) {
            session.size_seen += raw.len() as u64;
        }
        Ok(receiver)
    }

    /// Legacy manual finalize: reports completion and size, but skips the
    /// CRC32 report (spec §4.4, "intentional limitation").
    pub async fn finish_legacy(
        &self,
        id: u64,
        sender: Uid,
        server: &ServerState,
        server_name: &str,
    ) -> Result<(), TransferError> {
        let (receiver, size_seen, size_total) = {
            let mut sessions = self.sessions.lock().await;
            let session = sessions.get_mut(&id).ok_or(TransferError::UnknownId)?;
            if !session.active {
                return Err(TransferError::NotActive);
            }
            if session.sender != sender {
                return Err(TransferError::WrongParticipant);
            }
            session.active = false;
            (session.receiver, session.size_seen, session.size_total)
        };
        self.finish_both(server, server_name, id, sender, receiver, size_seen, size_total)
            .await;
        Ok(())
    }

    /// Cancels an active session; only its sender or receiver may do so.
    pub async fn cancel(&self, id: u64, who: Uid) -> Result<&'static str, TransferError> {
        let mut sessions = self.sessions.lock().await;
        let session = sessions.get_mut(&id).ok_or(TransferError::UnknownId)?;
        if !session.active {
            return Err(TransferError::NotActive);
        }
        if who != session.sender && who != session.receiver {
            return Err(TransferError::WrongParticipant);
        }
        session.active = false;
        let reason = if who == session.sender {
            "Sender cancelled"
        } else {
            "Receiver cancelled"
        };
        log::info!("transfer {id} cancelled: {reason}");
        Ok(reason)
    }

    pub async fn participants(&self, id: u64) -> Option<(Uid, Uid)> {
        let sessions = self.sessions.lock().await;
        sessions.get(&id).map(|s| (s.sender, s.receiver))
    }
}

/// Decodes ignoring any character outside the standard alphabet and
/// stopping at the first `=`, per spec §4.4. Hand-rolled rather than
/// routed through the `base64` engine because the engine insists on
/// validating padding; this decoder mirrors the original tool's tolerant
/// bit-accumulator instead.
fn decode_tolerant(input: &str) -> Vec<u8> {
    const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";
    let mut table = [-1i16; 256];
    for (i, &c) in ALPHABET.iter().enumerate() {
        table[c as usize] = i as i16;
    }

    let mut out = Vec::new();
    let mut val: u32 = 0;
    let mut bits: i32 = -8;
    for c in input.bytes() {
        if c == b'=' {
            break;
        }
        let d = table[c as usize];
        if d == -1 {
            continue;
        }
        val = (val << 6) | d as u32;
        bits += 6;
        if bits >= 0 {
            out.push(((val >> bits) & 0xFF) as u8);
            bits -= 8;
        }
    }
    out
}

pub fn engine_shared(uploads_dir: impl Into<PathBuf>) -> Arc<TransferEngine> {
    Arc::new(TransferEngine::new(uploads_dir))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitizes_path_components_and_bad_chars() {
        assert_eq!(sanitize_filename("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_filename("my file!.txt"), "my_file_.txt");
        assert_eq!(sanitize_filename("###"), "___");
        assert_eq!(sanitize_filename(""), "file");
    }

    #[test]
    fn decode_tolerant_roundtrips_standard_encoding() {
        let encoded = STANDARD.encode(b"hello world");
        assert_eq!(decode_tolerant(&encoded), b"hello world");
    }

    #[test]
    fn decode_tolerant_ignores_non_alphabet_and_stops_at_padding() {
        let encoded = STANDARD.encode(b"hi");
        let noisy: String = encoded.chars().map(|c| format!("{c} ")).collect();
        assert_eq!(decode_tolerant(&noisy), b"hi");
    }
}
