use crate::camera::{CameraController, CameraMode};
use crate::game::StateSynchronizer;
use crate::input::{InputSampler, Key, KeyEdge};
use crate::lifecycle::LifecycleController;
use log::{debug, error, info, warn};
use macroquad::math::Vec3;
use shared::{
    decode, encode, DeathStats, Packet, PlayerState, CLIENT_VERSION, INPUT_TICK_MS, MAX_DATAGRAM,
};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tokio::net::{lookup_host, UdpSocket};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval, sleep_until, Duration, Instant, Interval, MissedTickBehavior};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionStatus {
    Connecting,
    Connected,
    Error(String),
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionStatus::Connecting => write!(f, "Connecting..."),
            ConnectionStatus::Connected => write!(f, "Connected"),
            ConnectionStatus::Error(message) => write!(f, "Connection Error: {}", message),
        }
    }
}

#[derive(Debug)]
pub enum Inbound {
    Packet(Packet),
    TransportError(String),
}

/// One transport session: a connected UDP socket plus a single reader task
/// feeding decoded packets into the inbound channel.
pub struct Connection {
    socket: Arc<UdpSocket>,
    status: ConnectionStatus,
    inbound: mpsc::UnboundedReceiver<Inbound>,
    reader: Option<JoinHandle<()>>,
}

impl Connection {
    pub async fn connect(server_addr: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let server_addr = lookup_host(server_addr)
            .await?
            .next()
            .ok_or("server address did not resolve")?;

        let local_addr = if server_addr.is_ipv6() {
            "[::]:0"
        } else {
            "0.0.0.0:0"
        };
        let socket = UdpSocket::bind(local_addr).await?;
        socket.connect(server_addr).await?;
        let socket = Arc::new(socket);

        let (sender, inbound) = mpsc::unbounded_channel();
        let reader = tokio::spawn(read_loop(Arc::clone(&socket), sender));

        info!("Connecting to {}...", server_addr);
        let mut connection = Connection {
            socket,
            status: ConnectionStatus::Connecting,
            inbound,
            reader: Some(reader),
        };
        connection
            .send(&Packet::Connect {
                client_version: CLIENT_VERSION,
            })
            .await;

        Ok(connection)
    }

    pub fn status(&self) -> &ConnectionStatus {
        &self.status
    }

    pub fn is_open(&self) -> bool {
        self.reader.is_some()
    }

    /// Fire-and-forget. Failures only change the status.
    pub async fn send(&mut self, packet: &Packet) {
        if !self.is_open() {
            return;
        }

        let data = match encode(packet) {
            Ok(data) => data,
            Err(e) => {
                error!("Failed to encode {}: {}", packet.event_name(), e);
                return;
            }
        };

        if let Err(e) = self.socket.send(&data).await {
            error!("Failed to send {}: {}", packet.event_name(), e);
            self.set_status(ConnectionStatus::Error(e.to_string()));
        }
    }

    /// Next inbound item; `None` once the session has been torn down.
    pub async fn recv(&mut self) -> Option<Inbound> {
        let inbound = self.inbound.recv().await?;

        match &inbound {
            Inbound::Packet(Packet::Connected) => self.set_status(ConnectionStatus::Connected),
            Inbound::Packet(Packet::Disconnected { reason }) => {
                self.set_status(ConnectionStatus::Error(reason.clone()))
            }
            Inbound::TransportError(message) => {
                self.set_status(ConnectionStatus::Error(message.clone()))
            }
            Inbound::Packet(_) => {}
        }

        Some(inbound)
    }

    /// Releases the session. Safe to call more than once.
    pub async fn teardown(&mut self) {
        if !self.is_open() {
            return;
        }

        self.send(&Packet::Disconnect).await;

        if let Some(reader) = self.reader.take() {
            reader.abort();
        }
        self.inbound.close();
        info!("Connection closed");
    }

    fn set_status(&mut self, status: ConnectionStatus) {
        if self.status != status {
            match &status {
                ConnectionStatus::Error(message) => error!("Connection error: {}", message),
                other => info!("Connection status: {}", other),
            }
            self.status = status;
        }
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        if let Some(reader) = self.reader.take() {
            reader.abort();
        }
    }
}

async fn read_loop(socket: Arc<UdpSocket>, sender: mpsc::UnboundedSender<Inbound>) {
    let mut buffer = vec![0u8; MAX_DATAGRAM];

    loop {
        let inbound = match socket.recv(&mut buffer).await {
            Ok(len) => match decode(&buffer[..len]) {
                Ok(packet) => Inbound::Packet(packet),
                Err(e) => {
                    warn!("Dropping undecodable datagram ({} bytes): {}", len, e);
                    continue;
                }
            },
            Err(e) => Inbound::TransportError(e.to_string()),
        };

        if sender.send(inbound).is_err() {
            break;
        }
    }
}

/// Events from the UI thread into the session
#[derive(Debug, Clone, PartialEq)]
pub enum UiEvent {
    KeyDown(Key),
    KeyUp(Key),
    Restart,
    Recenter,
    Orbit { yaw: f32, pitch: f32 },
    Zoom(f32),
    Quit,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CameraView {
    pub mode: CameraMode,
    pub position: Vec3,
    pub target: Vec3,
    pub locked: bool,
}

/// Read-only picture of the session for rendering and HUD collaborators
#[derive(Debug, Clone, PartialEq)]
pub struct ClientView {
    pub status: ConnectionStatus,
    pub local_id: Option<String>,
    pub players: Vec<PlayerState>,
    pub camera: CameraView,
    pub human_count: usize,
    pub bot_count: usize,
    pub score: u32,
    pub survival_time: u32,
    pub is_dead: bool,
    pub death_stats: Option<DeathStats>,
    pub queue_position: Option<u32>,
}

impl ClientView {
    pub fn local_player(&self) -> Option<&PlayerState> {
        let id = self.local_id.as_deref()?;
        self.players.iter().find(|player| player.id == id)
    }

    /// Recenter is offered only in Free mode with a live local player.
    pub fn can_recenter(&self) -> bool {
        self.camera.mode == CameraMode::Free
            && !self.is_dead
            && self.local_player().is_some_and(|player| !player.is_dead)
    }
}

impl Default for ClientView {
    fn default() -> Self {
        let camera = CameraController::new();
        Self {
            status: ConnectionStatus::Connecting,
            local_id: None,
            players: Vec::new(),
            camera: CameraView {
                mode: camera.mode(),
                position: camera.position(),
                target: camera.target(),
                locked: camera.is_locked(),
            },
            human_count: 0,
            bot_count: 0,
            score: 0,
            survival_time: 0,
            is_dead: false,
            death_stats: None,
            queue_position: None,
        }
    }
}

/// The UI side of a session
pub struct ClientHandle {
    pub events: mpsc::UnboundedSender<UiEvent>,
    pub view: watch::Receiver<ClientView>,
}

impl ClientHandle {
    /// A handle with no session behind it. The view stays on the error and
    /// events go nowhere.
    pub fn offline(message: impl Into<String>) -> Self {
        let (events, _) = mpsc::unbounded_channel();
        let (_, view) = watch::channel(ClientView {
            status: ConnectionStatus::Error(message.into()),
            ..ClientView::default()
        });
        ClientHandle { events, view }
    }
}

pub struct Client {
    connection: Connection,
    sync: StateSynchronizer,
    input: InputSampler,
    camera: CameraController,
    lifecycle: LifecycleController,
    ticker: Option<Interval>,
    ui_events: mpsc::UnboundedReceiver<UiEvent>,
    view: watch::Sender<ClientView>,
}

impl Client {
    pub async fn connect(
        server_addr: &str,
    ) -> Result<(Self, ClientHandle), Box<dyn std::error::Error>> {
        let connection = Connection::connect(server_addr).await?;

        let (events, ui_events) = mpsc::unbounded_channel();
        let (view_sender, view) = watch::channel(ClientView::default());

        let client = Client {
            connection,
            sync: StateSynchronizer::new(),
            input: InputSampler::new(),
            camera: CameraController::new(),
            lifecycle: LifecycleController::new(),
            ticker: None,
            ui_events,
            view: view_sender,
        };

        Ok((client, ClientHandle { events, view }))
    }

    /// Like [`Client::connect`], but a failure leaves an offline handle whose
    /// view reports the error instead of ending the process.
    pub async fn connect_or_offline(server_addr: &str) -> (Option<Self>, ClientHandle) {
        match Client::connect(server_addr).await {
            Ok((client, handle)) => (Some(client), handle),
            Err(e) => {
                error!("Failed to connect to {}: {}", server_addr, e);
                (None, ClientHandle::offline(e.to_string()))
            }
        }
    }

    /// Drives the session until the UI quits or drops its handle.
    pub async fn run(mut self) {
        self.publish();

        loop {
            let camera_deadline = self.camera.deadline();

            tokio::select! {
                inbound = self.connection.recv() => match inbound {
                    Some(inbound) => self.handle_inbound(inbound),
                    None => {
                        warn!("Inbound channel closed");
                        break;
                    }
                },

                event = self.ui_events.recv() => match event {
                    Some(UiEvent::Quit) | None => break,
                    Some(event) => self.handle_ui(event).await,
                },

                _ = next_tick(&mut self.ticker) => {
                    self.sample_input().await;
                },

                _ = sleep_until(camera_deadline.unwrap_or_else(Instant::now)),
                    if camera_deadline.is_some() =>
                {
                    let local = self.alive_position();
                    self.camera.poll(Instant::now(), local);
                },
            }

            self.sync_ticker();
            self.publish();
        }

        self.shutdown().await;
    }

    fn handle_inbound(&mut self, inbound: Inbound) {
        let packet = match inbound {
            Inbound::Packet(packet) => packet,
            Inbound::TransportError(_) => return,
        };

        match packet {
            Packet::Connected => {}
            Packet::GameState { players } => self.apply_snapshot(players),
            Packet::PlayerJoined { id } => {
                self.lifecycle.joined(id);
                self.camera.reset();
            }
            Packet::PlayerDied(stats) => {
                if self.lifecycle.died(stats) {
                    self.sync.record_death(stats);
                    self.camera.force_free();
                }
            }
            Packet::PlayerRestarted { id } => {
                if self.lifecycle.restarted(id) {
                    self.sync.reset_local_stats();
                    self.camera.reset();
                }
            }
            Packet::Queued { position } => self.lifecycle.queued(position),
            Packet::Disconnected { reason } => {
                warn!("Disconnected: {}", reason);
                self.lifecycle.disconnected();
                self.input.clear();
            }
            other => warn!("Unexpected packet from server: {}", other.event_name()),
        }
    }

    fn apply_snapshot(&mut self, players: HashMap<String, PlayerState>) {
        let local_dead = self
            .sync
            .apply_snapshot(players, self.lifecycle.identity())
            .map(|local| local.is_dead);

        match local_dead {
            Some(true) => {
                if self.lifecycle.observe_death() {
                    self.camera.force_free();
                }
            }
            Some(false) if !self.lifecycle.is_dead() => {
                self.camera.follow(self.sync.last_local_position());
            }
            _ => {}
        }
    }

    async fn handle_ui(&mut self, event: UiEvent) {
        let has_identity = self.lifecycle.identity().is_some();

        match event {
            UiEvent::KeyDown(key) => {
                match key {
                    Key::ToggleCamera => self.toggle_camera(),
                    Key::Recenter => self.recenter(),
                    _ => {}
                }
                self.input.handle_edge(KeyEdge::Pressed(key), has_identity);
            }
            UiEvent::KeyUp(key) => {
                if let Some(packet) = self.input.handle_edge(KeyEdge::Released(key), has_identity) {
                    self.connection.send(&packet).await;
                }
            }
            UiEvent::Restart => {
                if let Some(packet) = self.lifecycle.restart() {
                    self.connection.send(&packet).await;
                }
            }
            UiEvent::Recenter => self.recenter(),
            UiEvent::Orbit { yaw, pitch } => self.camera.orbit(yaw, pitch),
            UiEvent::Zoom(factor) => self.camera.zoom(factor),
            UiEvent::Quit => {}
        }
    }

    fn toggle_camera(&mut self) {
        // Free is pinned while dead
        if self.lifecycle.is_dead() {
            debug!("Camera toggle ignored while dead");
            return;
        }

        let local = self
            .lifecycle
            .identity()
            .and_then(|id| self.sync.player(id))
            .map(|_| self.sync.last_local_position());
        self.camera.request_toggle(Instant::now(), local);
    }

    fn recenter(&mut self) {
        let alive = self.alive_position();
        if !self.camera.request_recenter(Instant::now(), alive) {
            debug!("Recenter ignored");
        }
    }

    fn alive_position(&self) -> Option<Vec3> {
        if self.lifecycle.is_dead() {
            return None;
        }
        self.sync
            .alive_player(self.lifecycle.identity())
            .map(|_| self.sync.last_local_position())
    }

    async fn sample_input(&mut self) {
        if self.lifecycle.is_dead() {
            return;
        }
        let commands = match self.sync.alive_player(self.lifecycle.identity()) {
            Some(local) => self.input.tick(local),
            None => return,
        };

        for command in &commands {
            self.connection.send(command).await;
        }
    }

    /// Input sampling runs only while the local player is known and alive.
    fn sync_ticker(&mut self) {
        let eligible = self.alive_position().is_some() && self.connection.is_open();

        match (eligible, self.ticker.is_some()) {
            (true, false) => {
                let mut ticker = interval(Duration::from_millis(INPUT_TICK_MS));
                ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
                self.ticker = Some(ticker);
                debug!("Input sampling started");
            }
            (false, true) => {
                self.ticker = None;
                debug!("Input sampling stopped");
            }
            _ => {}
        }
    }

    fn publish(&self) {
        let mut players: Vec<PlayerState> = self.sync.players().values().cloned().collect();
        players.sort_by(|a, b| a.id.cmp(&b.id));

        self.view.send_replace(ClientView {
            status: self.connection.status().clone(),
            local_id: self.lifecycle.identity().map(str::to_owned),
            players,
            camera: CameraView {
                mode: self.camera.mode(),
                position: self.camera.position(),
                target: self.camera.target(),
                locked: self.camera.is_locked(),
            },
            human_count: self.sync.human_count(),
            bot_count: self.sync.bot_count(),
            score: self.sync.score(),
            survival_time: self.sync.survival_time(),
            is_dead: self.lifecycle.is_dead(),
            death_stats: self.lifecycle.death_stats(),
            queue_position: self.lifecycle.queue_position(),
        });
    }

    async fn shutdown(&mut self) {
        self.ticker = None;
        self.camera.cancel();
        self.input.clear();
        self.connection.teardown().await;
        self.lifecycle.disconnected();
        self.publish();
        info!("Session ended");
    }
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn fake_server() -> (UdpSocket, String) {
        let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let addr = socket.local_addr().unwrap().to_string();
        (socket, addr)
    }

    async fn recv_packet(socket: &UdpSocket) -> (Packet, std::net::SocketAddr) {
        let mut buffer = vec![0u8; MAX_DATAGRAM];
        let (len, from) =
            tokio::time::timeout(Duration::from_secs(2), socket.recv_from(&mut buffer))
                .await
                .expect("timed out waiting for client packet")
                .unwrap();
        (decode(&buffer[..len]).unwrap(), from)
    }

    #[test]
    fn test_status_display() {
        assert_eq!(ConnectionStatus::Connecting.to_string(), "Connecting...");
        assert_eq!(ConnectionStatus::Connected.to_string(), "Connected");
        assert_eq!(
            ConnectionStatus::Error("refused".to_string()).to_string(),
            "Connection Error: refused"
        );
    }

    #[tokio::test]
    async fn test_connect_sends_handshake_and_tracks_status() {
        let (server, addr) = fake_server().await;
        let mut connection = Connection::connect(&addr).await.unwrap();
        assert_eq!(connection.status(), &ConnectionStatus::Connecting);

        let (packet, client_addr) = recv_packet(&server).await;
        assert_eq!(
            packet,
            Packet::Connect {
                client_version: CLIENT_VERSION
            }
        );

        server
            .send_to(&encode(&Packet::Connected).unwrap(), client_addr)
            .await
            .unwrap();
        assert!(matches!(
            connection.recv().await,
            Some(Inbound::Packet(Packet::Connected))
        ));
        assert_eq!(connection.status(), &ConnectionStatus::Connected);
    }

    #[tokio::test]
    async fn test_garbage_datagram_is_skipped() {
        let (server, addr) = fake_server().await;
        let mut connection = Connection::connect(&addr).await.unwrap();
        let (_, client_addr) = recv_packet(&server).await;

        server.send_to(&[0xff; 5], client_addr).await.unwrap();
        server
            .send_to(&encode(&Packet::Queued { position: 2 }).unwrap(), client_addr)
            .await
            .unwrap();

        assert!(matches!(
            connection.recv().await,
            Some(Inbound::Packet(Packet::Queued { position: 2 }))
        ));
        assert_eq!(connection.status(), &ConnectionStatus::Connecting);
    }

    #[tokio::test]
    async fn test_teardown_is_idempotent() {
        let (server, addr) = fake_server().await;
        let mut connection = Connection::connect(&addr).await.unwrap();
        recv_packet(&server).await;

        connection.teardown().await;
        assert!(!connection.is_open());
        let (packet, _) = recv_packet(&server).await;
        assert_eq!(packet, Packet::Disconnect);

        connection.teardown().await;
        assert!(connection.recv().await.is_none());

        // Nothing goes out after teardown.
        connection.send(&Packet::PlayerIdle).await;
        let mut buffer = [0u8; 64];
        let late =
            tokio::time::timeout(Duration::from_millis(100), server.recv_from(&mut buffer)).await;
        assert!(late.is_err());
    }

    #[tokio::test]
    async fn test_unresolvable_server_leaves_offline_handle() {
        let (client, handle) = Client::connect_or_offline("no-such-host.invalid:3001").await;
        assert!(client.is_none());

        let view = handle.view.borrow().clone();
        assert!(matches!(view.status, ConnectionStatus::Error(_)));
        assert!(view.status.to_string().starts_with("Connection Error: "));
        assert!(view.local_id.is_none());
        assert_eq!(view.camera.mode, CameraMode::Follow);

        // No session is listening.
        assert!(handle.events.send(UiEvent::Quit).is_err());
    }

    #[test]
    fn test_offline_handle_reports_message() {
        let handle = ClientHandle::offline("refused");
        assert_eq!(
            handle.view.borrow().status,
            ConnectionStatus::Error("refused".to_string())
        );
    }

    #[test]
    fn test_default_view() {
        let view = ClientView::default();
        assert_eq!(view.status, ConnectionStatus::Connecting);
        assert_eq!(view.camera.mode, CameraMode::Follow);
        assert!(view.local_player().is_none());
        assert!(!view.can_recenter());
    }
}
