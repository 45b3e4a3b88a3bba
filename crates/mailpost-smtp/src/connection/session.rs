//! The submission session state machine.

use std::fmt;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tracing::{Instrument, debug, info, info_span, warn};

use super::stream::{BoxedStream, Connector, TcpConnector};
use crate::command::Command;
use crate::compose::{ComposedMessage, MessageId};
use crate::config::{SecurityMode, SmtpConfig, validate_local_name};
use crate::error::{Error, Result, SendError};
use crate::parser::{is_last_reply_line, parse_reply};
use crate::transcript::{Direction, Transcript};
use crate::types::{Reply, ReplyCode};

/// Longest reply line accepted, CRLF included.
const MAX_REPLY_LINE: usize = 1000;

/// Where a session is in the submission sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum State {
    /// No socket yet.
    Disconnected,
    /// Socket open, greeting accepted.
    Connected,
    /// EHLO accepted.
    Greeted,
    /// STARTTLS accepted, handshake pending.
    TlsNegotiating,
    /// Handshake done, EHLO must be repeated.
    SecureGreeted,
    /// AUTH LOGIN accepted, username expected.
    AuthUser,
    /// Username accepted, password expected.
    AuthPass,
    /// Ready for a mail transaction.
    Authenticated,
    /// MAIL FROM accepted.
    SenderSet,
    /// At least one RCPT TO accepted.
    RecipientSet,
    /// DATA accepted, message being written.
    Transmitting,
    /// Message accepted for delivery.
    Sent,
    /// Socket released.
    Closed,
}

impl State {
    /// Returns true for every state that owns an open socket.
    #[must_use]
    pub const fn has_socket(self) -> bool {
        !matches!(self, Self::Disconnected | Self::Closed)
    }
}

/// A command/reply step, used to pinpoint failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    /// Server greeting after connect.
    Greeting,
    /// First EHLO.
    Ehlo,
    /// STARTTLS request.
    StartTls,
    /// EHLO repeated over TLS.
    SecureEhlo,
    /// AUTH LOGIN request.
    AuthLogin,
    /// Base64 username.
    AuthUsername,
    /// Base64 password.
    AuthPassword,
    /// MAIL FROM.
    MailFrom,
    /// RCPT TO.
    RcptTo,
    /// DATA.
    Data,
    /// Message content and terminator.
    Message,
    /// QUIT.
    Quit,
}

impl Step {
    /// Returns true for the AUTH LOGIN steps.
    #[must_use]
    pub const fn is_auth(self) -> bool {
        matches!(self, Self::AuthLogin | Self::AuthUsername | Self::AuthPassword)
    }

    const fn as_str(self) -> &'static str {
        match self {
            Self::Greeting => "greeting",
            Self::Ehlo => "EHLO",
            Self::StartTls => "STARTTLS",
            Self::SecureEhlo => "EHLO after STARTTLS",
            Self::AuthLogin => "AUTH LOGIN",
            Self::AuthUsername => "AUTH LOGIN username",
            Self::AuthPassword => "AUTH LOGIN password",
            Self::MailFrom => "MAIL FROM",
            Self::RcptTo => "RCPT TO",
            Self::Data => "DATA",
            Self::Message => "message content",
            Self::Quit => "QUIT",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a successful send.
#[derive(Debug, Clone)]
pub struct SendReport {
    /// Message-ID of the delivered message.
    pub message_id: MessageId,
    /// Every exchange of the session.
    pub transcript: Transcript,
}

/// One SMTP submission over one socket.
///
/// A session is single-use: it connects, walks the fixed command sequence
/// for one message and closes. The socket is shut down on every exit path,
/// and dropping the session releases it as well.
pub struct Session<C = TcpConnector> {
    config: SmtpConfig,
    connector: C,
    stream: Option<BufReader<BoxedStream>>,
    state: State,
    transcript: Transcript,
}

impl Session {
    /// Creates a session that connects over TCP.
    #[must_use]
    pub fn new(config: SmtpConfig) -> Self {
        let connector = TcpConnector::new(config.connect_timeout);
        Self::with_connector(config, connector)
    }
}

impl<C: Connector> Session<C> {
    /// Creates a session that opens its socket through `connector`.
    #[must_use]
    pub const fn with_connector(config: SmtpConfig, connector: C) -> Self {
        Self {
            config,
            connector,
            stream: None,
            state: State::Disconnected,
            transcript: Transcript::new(),
        }
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> State {
        self.state
    }

    /// Exchanges recorded so far.
    #[must_use]
    pub const fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// Returns true while the session owns an open socket.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.stream.is_some()
    }

    /// Delivers `message`.
    ///
    /// # Errors
    ///
    /// Returns the first failure together with the transcript up to that
    /// point. Nothing is retried; the socket is closed before returning.
    pub async fn send(
        &mut self,
        message: &ComposedMessage,
    ) -> std::result::Result<SendReport, SendError> {
        if self.state != State::Disconnected {
            return Err(SendError::new(
                Error::InvalidState(format!("session already used (state {:?})", self.state)),
                self.transcript.clone(),
            ));
        }

        let span = info_span!(
            "smtp_session",
            host = %self.config.endpoint.host,
            port = self.config.endpoint.port
        );

        match self.run(message).instrument(span).await {
            Ok(()) => {
                info!(message_id = %message.message_id(), "message delivered");
                Ok(SendReport {
                    message_id: message.message_id().clone(),
                    transcript: self.transcript.clone(),
                })
            }
            Err(error) => {
                warn!(%error, state = ?self.state, "aborting SMTP session");
                self.close().await;
                Err(SendError::new(error, self.transcript.clone()))
            }
        }
    }

    async fn run(&mut self, message: &ComposedMessage) -> Result<()> {
        validate_local_name(&self.config.local_name)?;
        let endpoint = self.config.endpoint.clone();
        info!(security = ?endpoint.security, "connecting");

        let stream = self.connector.connect(&endpoint).await?;
        self.stream = Some(BufReader::new(stream));
        self.enter(State::Connected);
        self.expect(Step::Greeting, ReplyCode::SERVICE_READY).await?;

        let ehlo = Command::Ehlo {
            hostname: self.config.local_name.clone(),
        };
        self.exchange(Step::Ehlo, &ehlo, ReplyCode::OK, State::Greeted)
            .await?;

        if endpoint.security == SecurityMode::StartTls {
            self.exchange(
                Step::StartTls,
                &Command::StartTls,
                ReplyCode::SERVICE_READY,
                State::TlsNegotiating,
            )
            .await?;
            self.upgrade(&endpoint.host).await?;
            self.exchange(Step::SecureEhlo, &ehlo, ReplyCode::OK, State::Greeted)
                .await?;
        }

        if let Some(credentials) = self.config.credentials.clone() {
            self.exchange(
                Step::AuthLogin,
                &Command::AuthLogin,
                ReplyCode::AUTH_CONTINUE,
                State::AuthUser,
            )
            .await?;
            self.exchange(
                Step::AuthUsername,
                &Command::auth_response(&credentials.username),
                ReplyCode::AUTH_CONTINUE,
                State::AuthPass,
            )
            .await?;
            self.exchange(
                Step::AuthPassword,
                &Command::auth_response(&credentials.password),
                ReplyCode::AUTH_SUCCESS,
                State::Authenticated,
            )
            .await?;
        } else {
            debug!("no credentials configured, skipping AUTH");
            self.enter(State::Authenticated);
        }

        let mail_from = Command::MailFrom {
            from: message.sender().clone(),
        };
        self.exchange(Step::MailFrom, &mail_from, ReplyCode::OK, State::SenderSet)
            .await?;

        for recipient in message.recipients() {
            let rcpt_to = Command::RcptTo {
                to: recipient.clone(),
            };
            self.exchange(Step::RcptTo, &rcpt_to, ReplyCode::OK, State::RecipientSet)
                .await?;
        }

        self.exchange(
            Step::Data,
            &Command::Data,
            ReplyCode::START_DATA,
            State::Transmitting,
        )
        .await?;

        self.transcript.record(Direction::Sent, message.as_str());
        debug!(bytes = message.as_str().len(), "C: <message content>");
        let mut payload = Vec::with_capacity(message.as_str().len() + 2);
        payload.extend_from_slice(message.as_str().as_bytes());
        payload.extend_from_slice(b"\r\n");
        self.write(Step::Message, &payload).await?;
        self.expect(Step::Message, ReplyCode::OK).await?;
        self.enter(State::Sent);

        self.exchange(Step::Quit, &Command::Quit, ReplyCode::CLOSING, State::Sent)
            .await?;
        self.close().await;
        Ok(())
    }

    /// Records and writes one command, then waits for its reply.
    async fn exchange(
        &mut self,
        step: Step,
        command: &Command,
        expected: ReplyCode,
        next: State,
    ) -> Result<Reply> {
        debug!(command = ?command, "C:");
        self.transcript.record(Direction::Sent, command.line());
        self.write(step, &command.serialize()).await?;
        let reply = self.expect(step, expected).await?;
        self.enter(next);
        Ok(reply)
    }

    async fn write(&mut self, step: Step, data: &[u8]) -> Result<()> {
        let after = self.config.read_timeout;
        let stream = self.open_stream()?.get_mut();
        let write = async {
            stream.write_all(data).await?;
            stream.flush().await
        };
        match tokio::time::timeout(after, write).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(Error::Timeout { step, after }),
        }
    }

    /// Reads one complete reply and checks its code.
    ///
    /// The raw reply is recorded before it is validated.
    async fn expect(&mut self, step: Step, expected: ReplyCode) -> Result<Reply> {
        let after = self.config.read_timeout;
        let stream = self.open_stream()?;
        let read = match tokio::time::timeout(after, read_reply_lines(stream)).await {
            Ok(result) => result?,
            Err(_) => return Err(Error::Timeout { step, after }),
        };

        let lines = match read {
            ReplyLines::Complete(lines) => lines,
            ReplyLines::Closed => {
                debug!(%step, "connection closed by server");
                return Err(Error::unexpected_reply(step, expected, ""));
            }
            ReplyLines::TooLong(partial) => {
                warn!(%step, limit = MAX_REPLY_LINE, "reply line too long");
                self.transcript.record(Direction::Received, partial.as_str());
                return Err(Error::unexpected_reply(step, expected, partial));
            }
        };

        let text = lines.join("\n");
        debug!(reply = %text, "S:");
        self.transcript.record(Direction::Received, text.as_str());

        match parse_reply(&lines) {
            Ok(reply) if reply.is(expected) => Ok(reply),
            _ => Err(Error::unexpected_reply(step, expected, text)),
        }
    }

    async fn upgrade(&mut self, host: &str) -> Result<()> {
        // Anything already buffered was sent before the handshake and cannot
        // be trusted. The plaintext socket stays owned so close() shuts it down.
        if !self.open_stream()?.buffer().is_empty() {
            return Err(Error::Tls("server sent data ahead of the TLS handshake".into()));
        }

        let reader = self
            .stream
            .take()
            .ok_or_else(|| Error::InvalidState("no connection to upgrade".into()))?;
        let stream = self.connector.upgrade(reader.into_inner(), host).await?;
        debug!("TLS established");
        self.stream = Some(BufReader::new(stream));
        self.enter(State::SecureGreeted);
        Ok(())
    }

    /// Shuts the socket down. Later calls only update the state.
    async fn close(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            let shutdown = stream.get_mut().shutdown();
            match tokio::time::timeout(self.config.read_timeout, shutdown).await {
                Ok(Ok(())) => debug!("connection closed"),
                Ok(Err(err)) => debug!(%err, "error while closing connection"),
                Err(_) => debug!("timed out closing connection"),
            }
        }
        self.enter(State::Closed);
    }

    fn enter(&mut self, next: State) {
        self.state = next;
        debug_assert_eq!(
            next.has_socket(),
            self.stream.is_some(),
            "state {next:?} disagrees with socket ownership"
        );
    }

    fn open_stream(&mut self) -> Result<&mut BufReader<BoxedStream>> {
        self.stream
            .as_mut()
            .ok_or_else(|| Error::InvalidState("connection is not open".into()))
    }
}

impl<C> fmt::Debug for Session<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("endpoint", &self.config.endpoint)
            .field("state", &self.state)
            .field("transcript_len", &self.transcript.len())
            .finish_non_exhaustive()
    }
}

/// What came back while reading one reply.
#[derive(Debug, PartialEq, Eq)]
enum ReplyLines {
    /// Every line of the reply, CRLF stripped.
    Complete(Vec<String>),
    /// The peer closed the connection before the last line.
    Closed,
    /// A line reached [`MAX_REPLY_LINE`] without a line feed; holds what was read.
    TooLong(String),
}

/// Reads the lines of one reply, following `-` continuations.
///
/// Bytes that are not UTF-8 are replaced rather than rejected. A final line
/// without a line feed counts as the peer closing mid-reply.
async fn read_reply_lines<R>(reader: &mut R) -> std::io::Result<ReplyLines>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = Vec::new();
    let mut raw = Vec::new();
    loop {
        raw.clear();
        (&mut *reader)
            .take(MAX_REPLY_LINE as u64)
            .read_until(b'\n', &mut raw)
            .await?;

        if raw.last() != Some(&b'\n') {
            if raw.len() >= MAX_REPLY_LINE {
                let partial = String::from_utf8_lossy(&raw);
                return Ok(ReplyLines::TooLong(partial.trim_end_matches('\r').to_string()));
            }
            return Ok(ReplyLines::Closed);
        }

        let decoded = String::from_utf8_lossy(&raw);
        let line = decoded.trim_end_matches(['\r', '\n']);
        if line.is_empty() {
            continue;
        }

        let is_last = is_last_reply_line(line);
        lines.push(line.to_string());
        if is_last {
            return Ok(ReplyLines::Complete(lines));
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tokio_test::io::Builder;

    #[tokio::test]
    async fn reads_multi_line_reply() {
        let mock = Builder::new()
            .read(b"250-mx.example.com\r\n250-8BITMIME\r\n")
            .read(b"250 STARTTLS\r\n")
            .build();
        let mut reader = BufReader::new(mock);
        let lines = read_reply_lines(&mut reader).await.unwrap();
        assert_eq!(
            lines,
            ReplyLines::Complete(vec![
                "250-mx.example.com".into(),
                "250-8BITMIME".into(),
                "250 STARTTLS".into(),
            ])
        );
    }

    #[tokio::test]
    async fn skips_blank_lines() {
        let mock = Builder::new().read(b"\r\n220 ready\r\n").build();
        let mut reader = BufReader::new(mock);
        let lines = read_reply_lines(&mut reader).await.unwrap();
        assert_eq!(lines, ReplyLines::Complete(vec!["220 ready".into()]));
    }

    #[tokio::test]
    async fn non_utf8_bytes_are_replaced() {
        let mock = Builder::new().read(b"220 mx.caf\xe9 ESMTP\r\n").build();
        let mut reader = BufReader::new(mock);
        let lines = read_reply_lines(&mut reader).await.unwrap();
        assert_eq!(
            lines,
            ReplyLines::Complete(vec!["220 mx.caf\u{FFFD} ESMTP".into()])
        );
    }

    #[tokio::test]
    async fn overlong_line_stops_at_limit() {
        let mut greeting = b"220 ".to_vec();
        greeting.extend(std::iter::repeat_n(b'x', 2 * MAX_REPLY_LINE));
        let mock = Builder::new().read(&greeting).build();
        let mut reader = BufReader::new(mock);

        let ReplyLines::TooLong(partial) = read_reply_lines(&mut reader).await.unwrap() else {
            panic!("expected an overlong line");
        };
        assert_eq!(partial.len(), MAX_REPLY_LINE);
        assert!(partial.starts_with("220 xxx"));
    }

    #[tokio::test]
    async fn line_without_terminator_is_closed() {
        let mock = Builder::new().read(b"250 ok").build();
        let mut reader = BufReader::new(mock);
        assert_eq!(
            read_reply_lines(&mut reader).await.unwrap(),
            ReplyLines::Closed
        );
    }

    #[tokio::test]
    async fn eof_mid_reply_is_none() {
        let mock = Builder::new().read(b"250-partial\r\n").build();
        let mut reader = BufReader::new(mock);
        assert_eq!(
            read_reply_lines(&mut reader).await.unwrap(),
            ReplyLines::Closed
        );
    }

    #[test]
    fn socket_states() {
        assert!(!State::Disconnected.has_socket());
        assert!(!State::Closed.has_socket());
        assert!(State::Connected.has_socket());
        assert!(State::Sent.has_socket());
    }

    #[test]
    fn auth_steps() {
        assert!(Step::AuthLogin.is_auth());
        assert!(Step::AuthUsername.is_auth());
        assert!(Step::AuthPassword.is_auth());
        assert!(!Step::MailFrom.is_auth());
        assert_eq!(Step::RcptTo.to_string(), "RCPT TO");
    }
}
