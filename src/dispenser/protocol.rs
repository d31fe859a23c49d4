//! Line-oriented wire format of the content port.
//!
//! One request and one response per connection:
//!
//! ```text
//! client -> server   42\n          session token (signed integer)
//!                    Alice\n       display name (opaque, logged only)
//! server -> client   <S2> JB\n     label, prefixed by the instance marker if any
//!                    Why did ...\n display text for the label
//! ```
//!
//! A malformed request is answered with a single `ERROR <reason>` line.
//! The admin port carries no payload at all.
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use super::errors::ProtocolError;
use super::session::SessionToken;
use crate::logutil::escape_log;

/// Prefix of the line sent back for a rejected request.
pub const ERROR_PREFIX: &str = "ERROR";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentRequest {
    pub token: SessionToken,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentResponse {
    pub label: String,
    pub marker: Option<String>,
    pub text: String,
}

impl ContentResponse {
    pub fn label_line(&self) -> String {
        match &self.marker {
            Some(marker) => format!("{} {}", marker, self.label),
            None => self.label.clone(),
        }
    }
}

/// Read one line of at most `max_line` bytes, without its terminator.
///
/// Returns `Ok(None)` on a clean end of stream. A final line without a
/// trailing newline is accepted.
pub async fn read_line<R>(reader: &mut R, max_line: usize) -> Result<Option<String>, ProtocolError>
where
    R: AsyncBufRead + Unpin,
{
    let mut buf = Vec::new();
    let n = (&mut *reader)
        .take(max_line as u64)
        .read_until(b'\n', &mut buf)
        .await?;
    if n == 0 {
        return Ok(None);
    }
    if buf.last() == Some(&b'\n') {
        buf.pop();
        if buf.last() == Some(&b'\r') {
            buf.pop();
        }
    } else if n >= max_line {
        return Err(ProtocolError::LineTooLong(max_line));
    }
    String::from_utf8(buf)
        .map(Some)
        .map_err(|_| ProtocolError::InvalidUtf8)
}

/// Read the token and display-name lines of a content request.
pub async fn read_request<R>(reader: &mut R, max_line: usize) -> Result<ContentRequest, ProtocolError>
where
    R: AsyncBufRead + Unpin,
{
    let token_line = read_line(reader, max_line)
        .await?
        .ok_or(ProtocolError::MissingLine("session token"))?;
    let token = token_line
        .parse::<SessionToken>()
        .map_err(|_| ProtocolError::InvalidToken(escape_log(&token_line)))?;
    let name = read_line(reader, max_line)
        .await?
        .ok_or(ProtocolError::MissingLine("name"))?;
    Ok(ContentRequest { token, name })
}

pub async fn write_response<W>(writer: &mut W, response: &ContentResponse) -> Result<(), ProtocolError>
where
    W: AsyncWrite + Unpin,
{
    let payload = format!("{}\n{}\n", response.label_line(), response.text);
    writer.write_all(payload.as_bytes()).await?;
    writer.flush().await?;
    Ok(())
}

pub async fn write_rejection<W>(writer: &mut W, reason: &str) -> Result<(), ProtocolError>
where
    W: AsyncWrite + Unpin,
{
    let payload = format!("{} {}\n", ERROR_PREFIX, reason);
    writer.write_all(payload.as_bytes()).await?;
    writer.flush().await?;
    Ok(())
}

/// Split an optional `<marker> ` prefix off a response label line.
pub fn split_marker(line: &str) -> (Option<&str>, &str) {
    if line.starts_with('<') {
        if let Some(end) = line.find("> ") {
            return (Some(&line[..=end]), &line[end + 2..]);
        }
    }
    (None, line)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::BufReader;

    async fn parse(raw: &[u8]) -> Result<ContentRequest, ProtocolError> {
        let mut reader = BufReader::new(raw);
        read_request(&mut reader, 64).await
    }

    #[tokio::test]
    async fn parses_token_and_name() {
        let req = parse(b"42\nAlice\n").await.unwrap();
        assert_eq!(req.token, SessionToken(42));
        assert_eq!(req.name, "Alice");
    }

    #[tokio::test]
    async fn accepts_crlf_and_missing_final_newline() {
        let req = parse(b"7\r\nBob").await.unwrap();
        assert_eq!(req.token, SessionToken(7));
        assert_eq!(req.name, "Bob");
    }

    #[tokio::test]
    async fn empty_name_line_is_allowed() {
        let req = parse(b"3\n\n").await.unwrap();
        assert_eq!(req.name, "");
    }

    #[tokio::test]
    async fn rejects_non_integer_token() {
        let err = parse(b"abc\nAlice\n").await.unwrap_err();
        assert!(matches!(err, ProtocolError::InvalidToken(ref t) if t == "abc"));
    }

    #[tokio::test]
    async fn rejects_missing_lines() {
        assert!(matches!(
            parse(b"").await.unwrap_err(),
            ProtocolError::MissingLine("session token")
        ));
        assert!(matches!(
            parse(b"42\n").await.unwrap_err(),
            ProtocolError::MissingLine("name")
        ));
    }

    #[tokio::test]
    async fn rejects_overlong_line() {
        let mut raw = vec![b'1'; 100];
        raw.push(b'\n');
        let err = parse(&raw).await.unwrap_err();
        assert!(matches!(err, ProtocolError::LineTooLong(64)));
    }

    #[tokio::test]
    async fn rejects_invalid_utf8() {
        let err = parse(b"1\n\xff\xfe\n").await.unwrap_err();
        assert!(matches!(err, ProtocolError::InvalidUtf8));
    }

    #[tokio::test]
    async fn writes_marker_only_when_present() {
        let mut out = Vec::new();
        let mut resp = ContentResponse {
            label: "JB".into(),
            marker: None,
            text: "framed".into(),
        };
        write_response(&mut out, &resp).await.unwrap();
        assert_eq!(out, b"JB\nframed\n");

        out.clear();
        resp.marker = Some("<S2>".into());
        write_response(&mut out, &resp).await.unwrap();
        assert_eq!(out, b"<S2> JB\nframed\n");
    }

    #[tokio::test]
    async fn rejection_is_one_line() {
        let mut out = Vec::new();
        write_rejection(&mut out, "missing name line").await.unwrap();
        assert_eq!(out, b"ERROR missing name line\n");
    }

    #[test]
    fn split_marker_handles_both_forms() {
        assert_eq!(split_marker("<S2> PA"), (Some("<S2>"), "PA"));
        assert_eq!(split_marker("PA"), (None, "PA"));
        assert_eq!(split_marker("<odd"), (None, "<odd"));
    }
}
