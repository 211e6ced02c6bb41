//! The single owner of the socket's write half.
//!
//! Everything that wants to talk to the server clones an [`Outbox`] and
//! pushes lines into an unbounded queue. One writer task drains the queue
//! in order, applies the configured rate limit and flags the link as down
//! when the socket fails.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::{Sink, SinkExt};
use tokio::sync::mpsc;
use tracing::{debug, error};

use crate::common::error::{ProtocolError, ProtocolResult};
use crate::irc::codec::validate_line;
use crate::irc::framer::Framer;

/// Cloneable handle for sending lines to the server.
#[derive(Debug, Clone)]
pub struct Outbox {
    tx: mpsc::UnboundedSender<String>,
    framer: Framer,
}

impl Outbox {
    pub fn new(tx: mpsc::UnboundedSender<String>, framer: Framer) -> Self {
        Self { tx, framer }
    }

    /// An outbox with no link behind it; every send fails with `ServerNotConnected`.
    pub fn detached(framer: Framer) -> Self {
        let (tx, _) = mpsc::unbounded_channel();
        Self { tx, framer }
    }

    pub fn is_attached(&self) -> bool {
        !self.tx.is_closed()
    }

    /// Queue one raw line.
    pub fn send_raw(&self, line: impl Into<String>) -> ProtocolResult<()> {
        let line = line.into();
        validate_line(&line)?;
        self.tx
            .send(line)
            .map_err(|_| ProtocolError::ServerNotConnected)
    }

    /// Frame `text` and send each chunk as a `PRIVMSG`.
    pub fn privmsg(&self, target: &str, text: &str) -> ProtocolResult<()> {
        self.framed("PRIVMSG", target, text)
    }

    /// Frame `text` and send each chunk as a `NOTICE`.
    pub fn notice(&self, target: &str, text: &str) -> ProtocolResult<()> {
        self.framed("NOTICE", target, text)
    }

    fn framed(&self, command: &str, target: &str, text: &str) -> ProtocolResult<()> {
        // "<command> <target> :" ahead of each chunk
        let overhead = command.len() + target.len() + 3;
        for chunk in self.framer.for_overhead(overhead).frame(text) {
            self.send_raw(format!("{} {} :{}", command, target, chunk))?;
        }
        Ok(())
    }

    /// Registration burst: optional `PASS`, then `NICK` and `USER`.
    pub fn register(&self, nick: &str, realname: &str, password: Option<&str>) -> ProtocolResult<()> {
        if let Some(password) = password {
            self.send_raw(format!("PASS {}", password))?;
        }
        self.nick(nick)?;
        self.send_raw(format!("USER {} 0 * :{}", nick, realname))
    }

    pub fn nick(&self, nick: &str) -> ProtocolResult<()> {
        self.send_raw(format!("NICK {}", nick))
    }

    pub fn join(&self, channel: &str) -> ProtocolResult<()> {
        self.send_raw(format!("JOIN {}", channel))
    }

    pub fn pong(&self, server: &str) -> ProtocolResult<()> {
        self.send_raw(format!("PONG :{}", server))
    }

    pub fn quit(&self, reason: &str) -> ProtocolResult<()> {
        self.send_raw(format!("QUIT :{}", reason))
    }
}

/// Minimum spacing between lines for a lines-per-second ceiling.
///
/// `None` disables limiting; so does a rate too high or too low to express.
pub fn rate_period(maxrate: f64) -> Option<Duration> {
    if maxrate.is_nan() || maxrate <= 0.0 {
        return None;
    }
    Duration::try_from_secs_f64(1.0 / maxrate)
        .ok()
        .filter(|period| !period.is_zero())
}

/// Drain `rx` into `sink` until the queue closes or the socket fails.
///
/// `connected` is cleared on a write error so the health check notices.
pub async fn run_writer<S>(
    mut sink: S,
    mut rx: mpsc::UnboundedReceiver<String>,
    rate: Option<Duration>,
    connected: Arc<AtomicBool>,
) where
    S: Sink<String, Error = ProtocolError> + Unpin,
{
    let mut limiter = rate.map(|period| {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        interval
    });

    while let Some(line) = rx.recv().await {
        if let Some(limiter) = limiter.as_mut() {
            limiter.tick().await;
        }
        if let Err(e) = sink.send(line).await {
            error!("Failed to send line, connection lost: {}", e);
            connected.store(false, Ordering::SeqCst);
            return;
        }
    }

    if let Err(e) = sink.close().await {
        debug!("Error closing IRC sink: {}", e);
    }
    debug!("Outbound queue closed");
}

#[cfg(test)]
pub(crate) fn test_outbox() -> (Outbox, mpsc::UnboundedReceiver<String>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (Outbox::new(tx, Framer::new(400)), rx)
}

#[cfg(test)]
pub(crate) fn drain(rx: &mut mpsc::UnboundedReceiver<String>) -> Vec<String> {
    let mut lines = Vec::new();
    while let Ok(line) = rx.try_recv() {
        lines.push(line);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_send_raw_rejects_line_breaks() {
        let (outbox, mut rx) = test_outbox();
        let err = outbox.send_raw("PRIVMSG #t :a\nQUIT").unwrap_err();
        assert!(matches!(err, ProtocolError::InvalidCharacters));
        assert!(drain(&mut rx).is_empty());
    }

    #[test]
    fn test_send_raw_rejects_oversized() {
        let (outbox, _rx) = test_outbox();
        let err = outbox.send_raw("x".repeat(600)).unwrap_err();
        assert!(matches!(err, ProtocolError::MessageTooLong { .. }));
    }

    #[test]
    fn test_detached_outbox_reports_not_connected() {
        let outbox = Outbox::detached(Framer::new(400));
        assert!(!outbox.is_attached());
        assert!(matches!(
            outbox.join("#test"),
            Err(ProtocolError::ServerNotConnected)
        ));
    }

    #[test]
    fn test_privmsg_is_framed() {
        let (outbox, mut rx) = test_outbox();
        let text = "word ".repeat(200);
        outbox.privmsg("#test", &text).unwrap();

        let lines = drain(&mut rx);
        assert!(lines.len() > 1);
        for line in &lines {
            assert!(line.starts_with("PRIVMSG #test :"));
            assert!(line.len() + 2 <= 512);
        }
    }

    #[test]
    fn test_register_with_password() {
        let (outbox, mut rx) = test_outbox();
        outbox.register("b3bot", "B3 IRC bot", Some("secret")).unwrap();
        assert_eq!(
            drain(&mut rx),
            vec!["PASS secret", "NICK b3bot", "USER b3bot 0 * :B3 IRC bot"]
        );
    }

    #[test]
    fn test_rate_period() {
        assert_eq!(rate_period(0.0), None);
        assert_eq!(rate_period(2.0), Some(Duration::from_millis(500)));
        assert_eq!(rate_period(f64::NAN), None);
        assert_eq!(rate_period(f64::INFINITY), None);
        assert_eq!(rate_period(1e-300), None);
    }

    #[tokio::test]
    async fn test_writer_flags_link_on_sink_error() {
        let sink = futures::sink::unfold((), |_, _line: String| async {
            Err::<(), _>(ProtocolError::ServerNotConnected)
        });
        let (tx, rx) = mpsc::unbounded_channel();
        let connected = Arc::new(AtomicBool::new(true));
        tx.send("PING :x".to_string()).unwrap();

        run_writer(Box::pin(sink), rx, None, connected.clone()).await;
        assert!(!connected.load(Ordering::SeqCst));
    }
}
