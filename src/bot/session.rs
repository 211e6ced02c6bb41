//! The IRC session task.
//!
//! Owns the [`Bot`] and drives one connection at a time: registration,
//! the receive loop, console events, the health check and shutdown. The
//! outer [`Session::run`] loop reconnects with exponential backoff.

use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use backon::BackoffBuilder;
use futures::stream::SplitStream;
use futures::StreamExt;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::bot::handlers::event_table;
use crate::bot::outbox::{rate_period, run_writer};
use crate::bot::{Bot, LinkState, Outbox, Request};
use crate::bridge::channels::SessionChannels;
use crate::bridge::Bridge;
use crate::commands::CommandRegistry;
use crate::common::error::ConnectionError;
use crate::config::Config;
use crate::game::Console;
use crate::irc::codec::{new_irc_connection, IrcConnection};
use crate::irc::{Event, EventKind, Framer, Message};

/// Pause after a manual reconnect so the server releases the nickname.
const RECONNECT_PAUSE: Duration = Duration::from_secs(2);

/// How long teardown waits for queued lines to reach the socket.
const WRITER_DRAIN: Duration = Duration::from_secs(5);

const MAX_BACKOFF: Duration = Duration::from_secs(300);

pub(super) type EventHandler = fn(&mut Session, &Event) -> Result<()>;

/// Why a connection ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The host asked us to go offline.
    Shutdown,
    /// A `reconnect` command was issued.
    Reconnect,
    /// The socket closed or the health check failed.
    Dropped,
}

/// Exponential backoff for reconnection: 5s initial, 5min max, factor 1.1,
/// with jitter, unlimited retries.
fn irc_backoff() -> impl Iterator<Item = Duration> {
    backon::ExponentialBuilder::default()
        .with_min_delay(Duration::from_secs(5))
        .with_max_delay(MAX_BACKOFF)
        .with_factor(1.1)
        .with_jitter()
        .without_max_times()
        .build()
}

/// Sleep for `delay` unless shutdown is signalled first; true on shutdown.
async fn pause(shutdown_rx: &mut watch::Receiver<bool>, delay: Duration) -> bool {
    tokio::select! {
        _ = tokio::time::sleep(delay) => false,
        result = shutdown_rx.changed() => result.is_err() || *shutdown_rx.borrow(),
    }
}

pub struct Session {
    pub(super) config: Arc<Config>,
    pub(super) bot: Bot,
    pub(super) registry: CommandRegistry,
    pub(super) bridge: Bridge,
    table: HashMap<EventKind, EventHandler>,
    channels: SessionChannels,
    /// Auto-perform task of the current connection.
    pub(super) perform: Option<JoinHandle<()>>,
}

impl Session {
    pub fn new(config: Arc<Config>, console: Arc<dyn Console>, channels: SessionChannels) -> Self {
        Self {
            bot: Bot::new(config.clone(), console),
            registry: CommandRegistry::from_config(&config),
            bridge: Bridge::new(&config),
            table: event_table(),
            channels,
            perform: None,
            config,
        }
    }

    pub fn bot(&self) -> &Bot {
        &self.bot
    }

    /// Connect, serve and reconnect until shutdown.
    pub async fn run(&mut self) -> Result<()> {
        let host = self.config.irc.address.clone();
        let port = self.config.irc.port;
        let mut shutdown_rx = self.channels.shutdown_rx.clone();
        let mut backoff = irc_backoff();

        loop {
            if *shutdown_rx.borrow() {
                info!("Shutdown signal detected, stopping reconnection loop");
                break;
            }

            self.bot.set_state(LinkState::Connecting);
            info!("Connecting to {}:{}...", host, port);
            let connected = TcpStream::connect((host.as_str(), port))
                .await
                .map_err(|source| ConnectionError::ConnectFailed {
                    host: host.clone(),
                    port,
                    source,
                });

            match connected {
                Ok(stream) => {
                    info!("Connected to IRC server");
                    backoff = irc_backoff(); // Reset backoff on successful connection

                    match self.serve(stream).await {
                        Ok(Outcome::Shutdown) => break,
                        Ok(Outcome::Reconnect) => {
                            if pause(&mut shutdown_rx, RECONNECT_PAUSE).await {
                                break;
                            }
                            continue;
                        }
                        Ok(Outcome::Dropped) => warn!("Disconnected from IRC server"),
                        Err(e) => error!("IRC session error: {:#}", e),
                    }
                }
                Err(e) => error!("{}", e),
            }

            let delay = backoff.next().unwrap_or(MAX_BACKOFF);
            info!("Reconnecting in {:.1} seconds...", delay.as_secs_f64());
            if pause(&mut shutdown_rx, delay).await {
                info!("Shutdown signal received during backoff");
                break;
            }
        }

        self.bot.set_state(LinkState::Disconnected);
        Ok(())
    }

    /// Drive a single connection until it ends.
    pub async fn serve<S>(&mut self, stream: S) -> Result<Outcome>
    where
        S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        let connection = new_irc_connection(stream, self.config.settings.dev);
        let (sink, mut lines) = connection.split();

        let (tx, rx) = mpsc::unbounded_channel();
        let link = Arc::new(AtomicBool::new(true));
        let writer = tokio::spawn(run_writer(
            sink,
            rx,
            rate_period(self.config.irc.maxrate),
            link.clone(),
        ));
        self.bot
            .attach(Outbox::new(tx, Framer::new(self.config.irc.wrap_width)), link);

        let outcome = self.drive(&mut lines).await;
        self.teardown(writer).await;
        outcome
    }

    async fn drive<S>(&mut self, lines: &mut SplitStream<IrcConnection<S>>) -> Result<Outcome>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let irc = &self.config.irc;
        let realname = irc.realname.as_deref().unwrap_or(&irc.nickname);
        self.bot
            .outbox()
            .register(&irc.nickname, realname, irc.password.as_deref())?;

        let mut shutdown_rx = self.channels.shutdown_rx.clone();
        let period = self.config.health_interval();
        let mut health = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
        health.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                line = lines.next() => {
                    match line {
                        Some(Ok(line)) => self.on_line(&line),
                        Some(Err(e)) => {
                            warn!("Failed to read from IRC server: {}", e);
                            return Ok(Outcome::Dropped);
                        }
                        None => {
                            warn!("Connection closed by IRC server");
                            return Ok(Outcome::Dropped);
                        }
                    }
                }

                // Events from the game console
                Some(event) = self.channels.console_rx.recv() => {
                    self.bridge.handle_console_event(&mut self.bot, event);
                }

                _ = health.tick() => {
                    if !self.bot.is_connected() {
                        warn!("Health check failed, IRC link is down");
                        return Ok(Outcome::Dropped);
                    }
                    debug!("Health check passed");
                }

                result = shutdown_rx.changed() => {
                    if result.is_err() || *shutdown_rx.borrow() {
                        info!("Shutdown signal received, leaving IRC");
                        if let Err(e) = self.bot.quit(&self.config.irc.quit_message) {
                            debug!("Could not send QUIT: {}", e);
                        }
                        return Ok(Outcome::Shutdown);
                    }
                }
            }

            if let Some(Request::Reconnect) = self.bot.take_request() {
                info!("Reconnect requested, leaving IRC");
                if let Err(e) = self.bot.quit("rebooting...") {
                    debug!("Could not send QUIT: {}", e);
                }
                return Ok(Outcome::Reconnect);
            }
        }
    }

    /// Parse one line and run its handler; failures are logged, never fatal.
    pub(super) fn on_line(&mut self, line: &str) {
        let event = match Message::parse(line) {
            Ok(message) => Event::from(message),
            Err(e) => {
                warn!("Ignoring malformed line {:?}: {}", line, e);
                return;
            }
        };
        let Some(&handler) = self.table.get(&event.kind) else {
            return;
        };
        if let Err(e) = handler(self, &event) {
            error!("Error handling {}: {:#}", event.command, e);
        }
    }

    /// Drop connection state and let the writer flush what is queued.
    async fn teardown(&mut self, writer: JoinHandle<()>) {
        if let Some(perform) = self.perform.take() {
            perform.abort();
        }
        // drops every outbox sender, which closes the writer's queue
        self.bot.detach();

        let abort = writer.abort_handle();
        match tokio::time::timeout(WRITER_DRAIN, writer).await {
            Ok(Ok(())) => debug!("IRC writer finished"),
            Ok(Err(e)) => warn!("IRC writer task panicked: {}", e),
            Err(_) => {
                warn!("Timed out waiting for the IRC writer to drain");
                abort.abort();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use futures::SinkExt;
    use tokio::io::DuplexStream;
    use tokio_util::codec::{Framed, LinesCodec};

    use super::*;
    use crate::bridge::ChannelBundle;
    use crate::common::messages::ConsoleEvent;
    use crate::common::types::GameClient;
    use crate::config::types::test_config;
    use crate::game::MemoryConsole;

    struct Server {
        lines: Framed<DuplexStream, LinesCodec>,
    }

    impl Server {
        async fn send(&mut self, line: &str) {
            self.lines.send(line.to_string()).await.unwrap();
        }

        async fn expect(&mut self) -> String {
            tokio::time::timeout(Duration::from_secs(5), self.lines.next())
                .await
                .expect("timed out waiting for a line")
                .expect("stream ended")
                .unwrap()
        }

        /// Register, join `#test` and fill the names list.
        async fn welcome(&mut self) {
            assert_eq!(self.expect().await, "NICK b3bot");
            assert_eq!(self.expect().await, "USER b3bot 0 * :b3bot");
            self.send(":srv 001 b3bot :Welcome").await;
            assert_eq!(self.expect().await, "JOIN #test");
            self.send(":b3bot!b3@host JOIN #test").await;
            self.send(":srv 353 b3bot = #test :@alice bob +carol").await;
        }
    }

    struct Running {
        server: Server,
        task: JoinHandle<(Session, Outcome)>,
        bundle_tx: mpsc::UnboundedSender<ConsoleEvent>,
        shutdown_tx: watch::Sender<bool>,
        console: Arc<MemoryConsole>,
    }

    fn start() -> Running {
        let channels = ChannelBundle::new();
        let console = Arc::new(MemoryConsole::new("iourt42"));
        let mut session = Session::new(Arc::new(test_config()), console.clone(), channels.session);
        let (client, server) = tokio::io::duplex(16 * 1024);

        let task = tokio::spawn(async move {
            let outcome = session.serve(client).await.unwrap();
            (session, outcome)
        });

        Running {
            server: Server {
                lines: Framed::new(server, LinesCodec::new()),
            },
            task,
            bundle_tx: channels.console.event_tx,
            shutdown_tx: channels.control.shutdown_tx,
            console,
        }
    }

    #[tokio::test]
    async fn test_full_session_then_shutdown() {
        let mut r = start();
        r.server.welcome().await;

        r.server.send("PING :srv").await;
        assert_eq!(r.server.expect().await, "PONG :srv");

        // alice is an operator: the lookup runs and misses
        r.server.send(":alice!a@h PRIVMSG #test :!lookup b3bot ghost").await;
        let line = r.server.expect().await;
        assert!(line.starts_with("NOTICE alice :"));
        assert!(line.contains("no client found matching"));

        // bob is not
        r.server.send(":bob!b@h PRIVMSG #test :!lookup b3bot ghost").await;
        let line = r.server.expect().await;
        assert!(line.starts_with("NOTICE bob :"));
        assert!(line.contains("no sufficient access to command"));

        r.bundle_tx
            .send(ConsoleEvent::Kick {
                client: GameClient::new(2, "Camper"),
                admin: Some(GameClient::new(1, "Admin")),
                reason: None,
            })
            .unwrap();
        let line = r.server.expect().await;
        assert!(line.starts_with("PRIVMSG #test :"));
        assert!(line.contains("KICK"));

        r.shutdown_tx.send(true).unwrap();
        assert_eq!(r.server.expect().await, "QUIT :B3 is going offline");

        let (session, outcome) = r.task.await.unwrap();
        assert_eq!(outcome, Outcome::Shutdown);
        assert_eq!(session.bot().channels().count(), 0);
        assert_eq!(session.bot().state(), LinkState::Disconnected);
    }

    #[tokio::test]
    async fn test_live_chat_reaches_console() {
        let mut r = start();
        r.server.welcome().await;

        r.server.send(":alice!a@h PRIVMSG #test :!livechat b3bot on").await;
        assert!(r.server.expect().await.contains("livechat: "));
        r.server.send(":bob!b@h PRIVMSG #test :hello players").await;
        // round trip so the relay has been handled
        r.server.send("PING :sync").await;
        assert_eq!(r.server.expect().await, "PONG :sync");

        assert_eq!(r.console.said(), vec!["^7[^1IRC^7] bob: ^3hello players"]);
        r.shutdown_tx.send(true).unwrap();
        r.task.await.unwrap();
    }

    #[tokio::test]
    async fn test_reconnect_command_quits() {
        let mut r = start();
        r.server.welcome().await;

        r.server.send(":alice!a@h PRIVMSG #test :!reconnect b3bot").await;
        assert_eq!(r.server.expect().await, "QUIT :rebooting...");

        let (session, outcome) = r.task.await.unwrap();
        assert_eq!(outcome, Outcome::Reconnect);
        assert_eq!(session.bot().channels().count(), 0);
    }

    #[tokio::test]
    async fn test_server_close_is_a_drop() {
        let mut r = start();
        assert_eq!(r.server.expect().await, "NICK b3bot");
        drop(r.server);

        let (session, outcome) = r.task.await.unwrap();
        assert_eq!(outcome, Outcome::Dropped);
        assert!(!session.bot().outbox().is_attached());
    }
}
