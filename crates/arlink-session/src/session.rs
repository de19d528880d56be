use std::fmt;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use arlink_command::catalog::common::{AllSettings, AllStates};
use arlink_command::{Command, CommandError, CommandRegistry};
use arlink_frame::{
    ack_channel, channel_name, is_command_channel, DatagramFrames, Frame, FrameConfig, FrameError,
    FrameKind, FrameWriter, C2D_COMMAND, C2D_COMMAND_WITH_ACK, C2D_EMERGENCY, PING, PONG,
};
use arlink_transport::{UdpEndpoint, UdpLink};

use crate::error::{Result, SessionError};
use crate::handshake::{handshake, HandshakeConfig, HandshakeResult};
use crate::heartbeat::{is_resync_tick, HeartbeatClock};
use crate::profile::{apply_all, default_profiles, DeviceProfile};
use crate::reliable::{AckTracker, ReliableSender, RetryPolicy};
use crate::state::{update, DeviceState, LinkStatus};

/// Configuration for a device session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub handshake: HandshakeConfig,
    pub retry: RetryPolicy,
    pub frame: FrameConfig,
    /// Time between heartbeat pings.
    pub heartbeat_interval: Duration,
    /// Request all settings and states every this many heartbeats (0 disables).
    pub resync_every: u32,
    /// Receive buffer size; the largest datagram accepted.
    pub recv_buffer_size: usize,
    /// Commands buffered per subscriber before it starts lagging.
    pub command_capacity: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            handshake: HandshakeConfig::default(),
            retry: RetryPolicy::default(),
            frame: FrameConfig::default(),
            heartbeat_interval: Duration::from_secs(1),
            resync_every: 10,
            recv_buffer_size: 65_535,
            command_capacity: 64,
        }
    }
}

impl SessionConfig {
    fn validate(&self) -> Result<()> {
        if self.heartbeat_interval.is_zero() {
            return Err(SessionError::InvalidConfig(
                "heartbeat_interval must be non-zero".to_string(),
            ));
        }
        if self.retry.max_attempts == 0 {
            return Err(SessionError::InvalidConfig(
                "retry.max_attempts must be at least 1".to_string(),
            ));
        }
        if self.command_capacity == 0 {
            return Err(SessionError::InvalidConfig(
                "command_capacity must be at least 1".to_string(),
            ));
        }
        if self.recv_buffer_size == 0 {
            return Err(SessionError::InvalidConfig(
                "recv_buffer_size must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}

struct Shared {
    writer: FrameWriter<UdpLink>,
    tracker: AckTracker,
    registry: Arc<CommandRegistry>,
    profiles: Vec<Box<dyn DeviceProfile>>,
    state: watch::Sender<DeviceState>,
    commands: broadcast::Sender<Arc<dyn Command>>,
    clock: HeartbeatClock,
    cancel: CancellationToken,
    config: SessionConfig,
}

/// A connected device.
///
/// Two background tasks run for the lifetime of the session: one receives
/// and dispatches datagrams, the other sends heartbeats. Both stop when the
/// session is closed or dropped.
pub struct Session {
    shared: Arc<Shared>,
    handshake: HandshakeResult,
    tasks: Vec<JoinHandle<()>>,
}

impl Session {
    /// Connect to the device whose control port is `addr`, using default
    /// configuration, the full command catalog and Bebop profiles.
    pub async fn connect(addr: SocketAddr) -> Result<Self> {
        Self::connect_with_config(addr, SessionConfig::default()).await
    }

    /// Connect with explicit configuration.
    pub async fn connect_with_config(addr: SocketAddr, config: SessionConfig) -> Result<Self> {
        Self::connect_with(
            addr,
            config,
            Arc::new(CommandRegistry::with_catalog()),
            default_profiles(),
        )
        .await
    }

    /// Connect with explicit configuration, command registry and profiles.
    pub async fn connect_with(
        addr: SocketAddr,
        config: SessionConfig,
        registry: Arc<CommandRegistry>,
        profiles: Vec<Box<dyn DeviceProfile>>,
    ) -> Result<Self> {
        config.validate()?;

        let endpoint = UdpEndpoint::bind_for(addr.ip()).await?;
        let d2c_port = endpoint.local_port()?;
        let handshake = handshake(addr, d2c_port, &config.handshake).await?;
        let link = endpoint.into_link(handshake.data_addr);

        let (state, _) = watch::channel(DeviceState {
            link: LinkStatus::Connected,
            ..DeviceState::default()
        });
        let (commands, _) = broadcast::channel(config.command_capacity);

        let shared = Arc::new(Shared {
            writer: FrameWriter::with_config(link, config.frame.clone()),
            tracker: AckTracker::new(),
            registry,
            profiles,
            state,
            commands,
            clock: HeartbeatClock::new(),
            cancel: CancellationToken::new(),
            config,
        });

        let tasks = vec![
            tokio::spawn(receive_loop(Arc::clone(&shared), shared.writer.sink().clone())),
            tokio::spawn(heartbeat_loop(Arc::clone(&shared))),
        ];
        info!(addr = %handshake.data_addr, "session connected");

        Ok(Self {
            shared,
            handshake,
            tasks,
        })
    }

    /// Send a command without waiting for acknowledgment.
    pub async fn send(&self, command: &dyn Command) -> Result<()> {
        self.ensure_open()?;
        self.shared.send_command(C2D_COMMAND, command).await
    }

    /// Send a command the device must acknowledge.
    ///
    /// Returns `Ok(false)` if no acknowledgment arrived within the retry
    /// policy, or if the session was closed while waiting.
    pub async fn send_reliable(&self, command: &dyn Command) -> Result<bool> {
        self.ensure_open()?;
        self.shared
            .send_acknowledged(C2D_COMMAND_WITH_ACK, command)
            .await
    }

    /// Send a command on the emergency channel, with acknowledgment.
    pub async fn send_emergency(&self, command: &dyn Command) -> Result<bool> {
        self.ensure_open()?;
        self.shared.send_acknowledged(C2D_EMERGENCY, command).await
    }

    /// Snapshot of the current device state.
    pub fn state(&self) -> DeviceState {
        self.shared.state.borrow().clone()
    }

    /// Receiver notified on every state change.
    pub fn watch_state(&self) -> watch::Receiver<DeviceState> {
        self.shared.state.subscribe()
    }

    /// Receiver of every decoded inbound command.
    pub fn subscribe_commands(&self) -> broadcast::Receiver<Arc<dyn Command>> {
        self.shared.commands.subscribe()
    }

    /// Device data endpoint.
    pub fn remote_addr(&self) -> SocketAddr {
        self.shared.writer.sink().remote()
    }

    /// Local address of the UDP socket.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.shared.writer.sink().local_addr()?)
    }

    /// Negotiated connection parameters.
    pub fn handshake(&self) -> &HandshakeResult {
        &self.handshake
    }

    pub fn registry(&self) -> &CommandRegistry {
        &self.shared.registry
    }

    pub fn is_closed(&self) -> bool {
        self.shared.cancel.is_cancelled()
    }

    /// Stop the background tasks and wait for them to finish.
    pub async fn close(mut self) {
        self.shared.shutdown();
        for task in std::mem::take(&mut self.tasks) {
            if let Err(err) = task.await {
                warn!(error = %err, "session task failed");
            }
        }
        info!(addr = %self.remote_addr(), "session closed");
    }

    fn ensure_open(&self) -> Result<()> {
        if self.is_closed() {
            Err(SessionError::Closed)
        } else {
            Ok(())
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.shared.shutdown();
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("remote", &self.remote_addr())
            .field("link", &self.shared.state.borrow().link)
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl Shared {
    fn shutdown(&self) {
        if self.cancel.is_cancelled() {
            return;
        }
        self.cancel.cancel();
        self.state
            .send_if_modified(|state| update(&mut state.link, LinkStatus::Disconnected));
    }

    async fn send_command(&self, channel: u8, command: &dyn Command) -> Result<()> {
        let payload = self.registry.encode_to_vec(command)?;
        self.writer.send(FrameKind::Data, channel, &payload).await?;
        trace!(command = command.name(), channel = channel_name(channel), "command sent");
        Ok(())
    }

    async fn send_acknowledged(&self, channel: u8, command: &dyn Command) -> Result<bool> {
        let payload = self.registry.encode_to_vec(command)?;
        let sender = ReliableSender::new(&self.writer, &self.tracker, &self.config.retry);
        let acked = sender.send(channel, &payload, &self.cancel).await?;
        debug!(command = command.name(), channel = channel_name(channel), acked, "acknowledged send finished");
        Ok(acked)
    }

    async fn handle_datagram(&self, datagram: &[u8]) {
        let mut frames = DatagramFrames::new(datagram);
        while let Some(frame) = frames.next() {
            self.handle_frame(&frame).await;
        }
        if let Some(err) = frames.take_error() {
            debug!(error = %err, skipped = frames.skipped(), "dropped malformed frame data");
        } else if frames.skipped() > 0 {
            debug!(skipped = frames.skipped(), "dropped incomplete frame data");
        }
    }

    async fn handle_frame(&self, frame: &Frame) {
        trace!(
            kind = ?frame.kind,
            channel = channel_name(frame.channel),
            sequence = frame.sequence,
            len = frame.payload.len(),
            "frame received"
        );
        self.handle_heartbeat(frame).await;
        self.handle_ack_request(frame).await;
        self.tracker.resolve(frame);
        self.handle_command(frame);
    }

    async fn handle_heartbeat(&self, frame: &Frame) {
        match frame.channel {
            PING => {
                if let Err(err) = self.writer.send(FrameKind::Data, PONG, &frame.payload).await {
                    log_send_error("pong", &err);
                }
            }
            PONG => {
                if let Some(rtt) = self.clock.round_trip(&frame.payload) {
                    trace!(?rtt, "round trip measured");
                    self.state
                        .send_if_modified(|state| update(&mut state.round_trip_time, Some(rtt)));
                }
            }
            _ => {}
        }
    }

    async fn handle_ack_request(&self, frame: &Frame) {
        if frame.kind != FrameKind::DataWithAck {
            return;
        }
        let sequence = self.writer.sequences().next(ack_channel(frame.channel));
        let ack = frame.ack_reply(sequence);
        if let Err(err) = self.writer.write_frame(&ack).await {
            log_send_error("ack", &err);
        }
    }

    fn handle_command(&self, frame: &Frame) {
        if !is_command_channel(frame.channel) || frame.kind == FrameKind::Ack {
            return;
        }
        let mut cursor = &frame.payload[..];
        let command: Arc<dyn Command> = match self.registry.decode(&mut cursor) {
            Ok(command) => Arc::from(command),
            Err(CommandError::UnknownCommand(id)) => {
                debug!(%id, "skipping unknown command");
                return;
            }
            Err(err) => {
                debug!(error = %err, "skipping undecodable command");
                return;
            }
        };
        trace!(command = command.name(), "command received");

        self.state
            .send_if_modified(|state| apply_all(&self.profiles, command.as_ref(), state));
        // No subscribers is fine.
        let _ = self.commands.send(command);
    }

    fn mark_degraded(&self) {
        self.state
            .send_if_modified(|state| update(&mut state.link, LinkStatus::Degraded));
    }
}

fn log_send_error(what: &str, err: &FrameError) {
    match err {
        FrameError::Transport(e) if e.is_transient() => {
            debug!(error = %err, "{what} not sent")
        }
        _ => warn!(error = %err, "{what} not sent"),
    }
}

/// Where the receive loop reads datagrams from.
trait DatagramSource: Send + Sync + 'static {
    fn recv(
        &self,
        buf: &mut [u8],
    ) -> impl Future<Output = arlink_transport::Result<(usize, SocketAddr)>> + Send;

    fn is_from_remote(&self, source: &SocketAddr) -> bool;
}

impl DatagramSource for UdpLink {
    fn recv(
        &self,
        buf: &mut [u8],
    ) -> impl Future<Output = arlink_transport::Result<(usize, SocketAddr)>> + Send {
        UdpLink::recv(self, buf)
    }

    fn is_from_remote(&self, source: &SocketAddr) -> bool {
        UdpLink::is_from_remote(self, source)
    }
}

async fn receive_loop<L: DatagramSource>(shared: Arc<Shared>, link: L) {
    let mut buf = vec![0u8; shared.config.recv_buffer_size];

    loop {
        let received = tokio::select! {
            _ = shared.cancel.cancelled() => break,
            received = link.recv(&mut buf) => received,
        };
        match received {
            Ok((len, source)) => {
                if !link.is_from_remote(&source) {
                    debug!(%source, "ignoring datagram from unexpected source");
                    continue;
                }
                shared.handle_datagram(&buf[..len]).await;
            }
            Err(err) if err.is_transient() => {
                debug!(error = %err, "transient receive error");
            }
            Err(err) => {
                warn!(error = %err, "receive failed, link degraded");
                shared.mark_degraded();
                break;
            }
        }
    }
    debug!("receive loop stopped");
}

async fn heartbeat_loop(shared: Arc<Shared>) {
    let mut ticker = tokio::time::interval(shared.config.heartbeat_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut tick: u64 = 0;

    loop {
        tokio::select! {
            _ = shared.cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        let ping = shared.clock.ping_payload();
        if let Err(err) = shared.writer.send(FrameKind::Data, PING, &ping).await {
            log_send_error("ping", &err);
        }

        if is_resync_tick(tick, shared.config.resync_every) {
            debug!(tick, "requesting settings and states");
            for command in [&AllSettings {} as &dyn Command, &AllStates {}] {
                if let Err(err) = shared.send_command(C2D_COMMAND, command).await {
                    warn!(error = %err, command = command.name(), "resync request failed");
                }
            }
        }
        tick = tick.wrapping_add(1);
    }
    debug!("heartbeat loop stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::io::{self, ErrorKind};
    use std::net::Ipv4Addr;
    use std::sync::Mutex;

    use arlink_command::catalog::ardrone3::{Emergency, TakeOff};
    use arlink_command::catalog::common::BatteryStateChanged;
    use arlink_command::{CommandId, DecodeCommand};
    use arlink_frame::{D2C_COMMAND, D2C_COMMAND_WITH_ACK};
    use arlink_transport::TransportError;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, UdpSocket};
    use tokio::time::timeout;

    use crate::handshake::HandshakeRequest;

    const WAIT: Duration = Duration::from_secs(2);

    /// The device side of a session, on loopback.
    struct Device {
        udp: UdpSocket,
        controller: SocketAddr,
    }

    impl Device {
        async fn send(&self, frame: &Frame) {
            self.udp
                .send_to(&frame.encode(), self.controller)
                .await
                .unwrap();
        }

        /// Next frame the controller sent on `channel`, skipping all others.
        async fn recv_on(&self, channel: u8) -> Frame {
            timeout(WAIT, async {
                let mut buf = [0u8; 2048];
                loop {
                    let (n, _) = self.udp.recv_from(&mut buf).await.unwrap();
                    if let Some(frame) = DatagramFrames::new(&buf[..n]).find(|f| f.channel == channel) {
                        return frame;
                    }
                }
            })
            .await
            .unwrap_or_else(|_| panic!("no frame on channel {channel}"))
        }
    }

    /// Serve one handshake with `reply`; yields the controller's d2c port.
    async fn control_port(reply: String) -> (SocketAddr, JoinHandle<u16>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 512];
            let n = stream.read(&mut buf).await.unwrap();
            let request: HandshakeRequest = serde_json::from_slice(&buf[..n]).unwrap();
            stream.write_all(reply.as_bytes()).await.unwrap();
            request.d2c_port
        });
        (addr, handle)
    }

    async fn connect(config: SessionConfig) -> (Session, Device) {
        let udp = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let c2d_port = udp.local_addr().unwrap().port();
        let (addr, handshake) =
            control_port(format!("{{\"status\":0,\"c2d_port\":{c2d_port}}}\0")).await;

        let session = Session::connect_with_config(addr, config).await.unwrap();
        let d2c_port = handshake.await.unwrap();
        let device = Device {
            udp,
            controller: SocketAddr::new(Ipv4Addr::LOCALHOST.into(), d2c_port),
        };
        (session, device)
    }

    fn test_config() -> SessionConfig {
        SessionConfig {
            heartbeat_interval: Duration::from_millis(50),
            retry: RetryPolicy {
                max_attempts: 3,
                ack_timeout: Duration::from_millis(50),
            },
            ..SessionConfig::default()
        }
    }

    fn command_id(frame: &Frame) -> CommandId {
        CommandId::decode(&mut &frame.payload[..]).unwrap()
    }

    #[tokio::test]
    async fn acked_command_is_acknowledged_and_applied() {
        let (session, device) = connect(test_config()).await;
        let mut commands = session.subscribe_commands();
        let mut state = session.watch_state();

        let payload = session
            .registry()
            .encode_to_vec(&BatteryStateChanged { percent: 87 })
            .unwrap();
        device
            .send(&Frame::new(FrameKind::DataWithAck, D2C_COMMAND_WITH_ACK, 9, payload))
            .await;

        let ack = device.recv_on(ack_channel(D2C_COMMAND_WITH_ACK)).await;
        assert_eq!(ack.kind, FrameKind::Ack);
        assert_eq!(ack.sequence, 1);
        assert_eq!(ack.payload.as_ref(), &[9]);

        let command = timeout(WAIT, commands.recv()).await.unwrap().unwrap();
        assert!(command.is::<BatteryStateChanged>());

        timeout(WAIT, state.wait_for(|s| s.battery_percent == Some(87)))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(session.state().link, LinkStatus::Connected);
    }

    #[tokio::test]
    async fn packed_frames_and_garbage_are_handled() {
        let (session, device) = connect(test_config()).await;
        let mut state = session.watch_state();

        let registry = session.registry();
        let mut datagram = Frame::new(
            FrameKind::Data,
            D2C_COMMAND,
            1,
            registry.encode_to_vec(&BatteryStateChanged { percent: 50 }).unwrap(),
        )
        .encode()
        .to_vec();
        // Unknown command, then a truncated frame.
        datagram.extend_from_slice(&Frame::new(FrameKind::Data, D2C_COMMAND, 2, vec![99u8, 9, 9, 0]).encode());
        datagram.extend_from_slice(&[2, 127, 3, 90, 0]);
        device.udp.send_to(&datagram, device.controller).await.unwrap();

        timeout(WAIT, state.wait_for(|s| s.battery_percent == Some(50)))
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn ping_is_echoed_on_pong_channel() {
        let (_session, device) = connect(test_config()).await;

        let payload = vec![1u8, 2, 3, 4, 5, 6, 7, 8];
        device
            .send(&Frame::new(FrameKind::Data, PING, 1, payload.clone()))
            .await;

        let pong = device.recv_on(PONG).await;
        assert_eq!(pong.kind, FrameKind::Data);
        assert_eq!(pong.payload.as_ref(), payload.as_slice());
    }

    #[tokio::test]
    async fn echoed_ping_sets_round_trip() {
        let (session, device) = connect(test_config()).await;
        let mut state = session.watch_state();

        let ping = device.recv_on(PING).await;
        assert_eq!(ping.payload.len(), 8);
        device
            .send(&Frame::new(FrameKind::Data, PONG, 1, ping.payload))
            .await;

        let state = timeout(WAIT, state.wait_for(|s| s.round_trip_time.is_some()))
            .await
            .unwrap()
            .unwrap()
            .clone();
        assert!(state.round_trip_time.unwrap() < WAIT);
    }

    #[tokio::test]
    async fn first_heartbeat_requests_full_refresh() {
        let (_session, device) = connect(test_config()).await;

        let first = device.recv_on(C2D_COMMAND).await;
        let second = device.recv_on(C2D_COMMAND).await;
        assert_eq!(first.kind, FrameKind::Data);
        assert_eq!(command_id(&first), AllSettings::ID);
        assert_eq!(command_id(&second), AllStates::ID);
        assert_eq!(second.sequence, first.sequence.wrapping_add(1));
    }

    #[tokio::test]
    async fn reliable_send_is_acknowledged() {
        let (session, device) = connect(test_config()).await;

        let device_side = async {
            let frame = device.recv_on(C2D_COMMAND_WITH_ACK).await;
            device.send(&frame.ack_reply(1)).await;
            frame
        };
        let (acked, frame) = tokio::join!(session.send_reliable(&TakeOff {}), device_side);

        assert!(acked.unwrap());
        assert_eq!(frame.kind, FrameKind::DataWithAck);
        assert_eq!(command_id(&frame), TakeOff::ID);
    }

    #[tokio::test]
    async fn unacknowledged_send_is_retried_then_abandoned() {
        let (session, device) = connect(test_config()).await;

        let device_side = async {
            let mut frames = Vec::new();
            for _ in 0..3 {
                frames.push(device.recv_on(C2D_COMMAND_WITH_ACK).await);
            }
            frames
        };
        let (acked, frames) = tokio::join!(session.send_reliable(&TakeOff {}), device_side);

        assert!(!acked.unwrap());
        assert!(frames.iter().all(|f| f == &frames[0]));
    }

    #[tokio::test]
    async fn emergency_goes_out_on_emergency_channel() {
        let (session, device) = connect(test_config()).await;

        let device_side = async {
            let frame = device.recv_on(C2D_EMERGENCY).await;
            device.send(&frame.ack_reply(1)).await;
            frame
        };
        let (acked, frame) = tokio::join!(session.send_emergency(&Emergency {}), device_side);

        assert!(acked.unwrap());
        assert_eq!(command_id(&frame), Emergency::ID);
    }

    #[tokio::test]
    async fn fire_and_forget_send() {
        let (session, device) = connect(SessionConfig {
            resync_every: 0,
            ..test_config()
        })
        .await;

        session.send(&TakeOff {}).await.unwrap();
        let frame = device.recv_on(C2D_COMMAND).await;
        assert_eq!(frame.kind, FrameKind::Data);
        assert_eq!(command_id(&frame), TakeOff::ID);
    }

    #[tokio::test]
    async fn rejected_handshake_yields_no_session() {
        let (addr, _handshake) = control_port("{\"status\":1}\0".to_string()).await;
        let err = Session::connect_with_config(addr, test_config())
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::HandshakeStatus(1)));
    }

    #[tokio::test]
    async fn zero_heartbeat_interval_is_rejected() {
        let config = SessionConfig {
            heartbeat_interval: Duration::ZERO,
            ..SessionConfig::default()
        };
        let err = Session::connect_with_config("127.0.0.1:9".parse().unwrap(), config)
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::InvalidConfig(_)));
    }

    #[tokio::test]
    async fn close_marks_link_disconnected() {
        let (session, _device) = connect(test_config()).await;
        let state = session.watch_state();
        assert!(!session.is_closed());

        session.close().await;
        assert_eq!(state.borrow().link, LinkStatus::Disconnected);
    }

    /// Replays receive results, then waits forever.
    struct ScriptedSource(Mutex<VecDeque<arlink_transport::Result<(usize, SocketAddr)>>>);

    impl DatagramSource for ScriptedSource {
        async fn recv(&self, _buf: &mut [u8]) -> arlink_transport::Result<(usize, SocketAddr)> {
            let next = self.0.lock().unwrap().pop_front();
            match next {
                Some(result) => result,
                None => std::future::pending().await,
            }
        }

        fn is_from_remote(&self, _source: &SocketAddr) -> bool {
            true
        }
    }

    #[tokio::test]
    async fn receive_failure_degrades_link_and_heartbeat_continues() {
        let (session, device) = connect(test_config()).await;
        let source = ScriptedSource(Mutex::new(VecDeque::from([
            Err(TransportError::Receive(io::Error::from(
                ErrorKind::ConnectionRefused,
            ))),
            Err(TransportError::Receive(io::Error::from(
                ErrorKind::NotConnected,
            ))),
        ])));

        let receiver = tokio::spawn(receive_loop(Arc::clone(&session.shared), source));
        timeout(WAIT, receiver).await.unwrap().unwrap();
        assert_eq!(session.state().link, LinkStatus::Degraded);

        // Pings keep flowing after the receive side gave up.
        device.recv_on(PING).await;
        device.recv_on(PING).await;
        assert!(!session.is_closed());
        assert_eq!(session.state().link, LinkStatus::Degraded);
    }
}
