use crate::config::ClientConfig;
use crate::error::ChannelDeliveryError;
use crate::media::{LocalMedia, MediaStream, MediaSurface, SlotId};
use crate::room::{RoomCommand, RoomRoster, RoomSnapshot, RosterChange, SessionSnapshot};
use crate::session::{Action, PeerSessionRegistry, Role, SessionTag, Step, run_step};
use crate::signaling::{RelayLink, SignalingChannel};
use crate::transport::{ConnectionFactory, NegotiationConnection, PeerConnectionState, TransportEvent};
use meshmeet_core::{ParticipantId, ServerFrame, SignalMessage, SignalPayload};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// The client-side event loop of one meeting.
///
/// Owns the roster and every peer session. Relay frames, connection events
/// and handle commands are processed one at a time; negotiation steps run
/// in spawned tasks and report back through the transport channel.
pub struct MeetingRoom {
    config: ClientConfig,
    roster: RoomRoster,
    registry: PeerSessionRegistry,
    local_media: LocalMedia,
    signaling: Arc<dyn SignalingChannel>,
    surface: Arc<dyn MediaSurface>,
    command_rx: mpsc::Receiver<RoomCommand>,
    relay_rx: mpsc::UnboundedReceiver<ServerFrame>,
    relay_open: bool,
    transport_rx: mpsc::Receiver<TransportEvent>,
    transport_tx: mpsc::Sender<TransportEvent>,
}

impl MeetingRoom {
    pub fn new(
        config: ClientConfig,
        local_media: LocalMedia,
        link: RelayLink,
        surface: Arc<dyn MediaSurface>,
        factory: Arc<dyn ConnectionFactory>,
        command_rx: mpsc::Receiver<RoomCommand>,
    ) -> Self {
        let (transport_tx, transport_rx) = mpsc::channel(256);
        let registry = PeerSessionRegistry::new(factory, local_media.clone(), transport_tx.clone());

        Self {
            roster: RoomRoster::new(config.local_id.clone()),
            config,
            registry,
            local_media,
            signaling: link.signaling,
            surface,
            command_rx,
            relay_rx: link.inbound,
            relay_open: true,
            transport_rx,
            transport_tx,
        }
    }

    pub async fn run(mut self) {
        info!(
            "Meeting {} event loop started for {}",
            self.config.meeting_id, self.config.local_id
        );

        loop {
            tokio::select! {
                cmd = self.command_rx.recv() => {
                    match cmd {
                        Some(RoomCommand::Leave { reply }) => {
                            let result = self.shutdown().await;
                            let _ = reply.send(result);
                            break;
                        }
                        Some(c) => self.handle_command(c),
                        None => {
                            info!("All meeting handles dropped. Leaving.");
                            let _ = self.shutdown().await;
                            break;
                        }
                    }
                }

                frame = self.relay_rx.recv(), if self.relay_open => {
                    match frame {
                        Some(f) => self.handle_frame(f).await,
                        None => {
                            warn!("Relay connection closed; established peers stay up");
                            self.relay_open = false;
                        }
                    }
                }

                evt = self.transport_rx.recv() => {
                    if let Some(e) = evt {
                        self.handle_transport_event(e).await;
                    }
                }
            }
        }

        info!("Meeting {} event loop finished", self.config.meeting_id);
    }

    fn handle_command(&mut self, cmd: RoomCommand) {
        match cmd {
            RoomCommand::SetTrackEnabled {
                kind,
                enabled,
                reply,
            } => {
                let switched = self.local_media.set_enabled(kind, enabled);
                self.surface.set_local_track_enabled(kind, enabled);
                info!("Local {} {}", kind, if enabled { "enabled" } else { "disabled" });
                let _ = reply.send(switched);
            }

            RoomCommand::ToggleTrack { kind, reply } => {
                let enabled = !self.local_media.is_enabled(kind);
                self.local_media.set_enabled(kind, enabled);
                self.surface.set_local_track_enabled(kind, enabled);
                info!("Local {} {}", kind, if enabled { "enabled" } else { "disabled" });
                let _ = reply.send(enabled);
            }

            RoomCommand::Snapshot { reply } => {
                let _ = reply.send(self.snapshot());
            }

            RoomCommand::Leave { .. } => {
                error!("Leave must be handled by the event loop");
            }
        }
    }

    async fn handle_frame(&mut self, frame: ServerFrame) {
        match frame {
            ServerFrame::UserJoined {
                participant_id,
                participants,
            } => {
                let change = self.roster.on_join(&participant_id, participants);
                self.publish_roster();

                match change {
                    RosterChange::SelfJoined => {
                        info!("Joined meeting {} ({} present)", self.config.meeting_id, participants);
                    }
                    RosterChange::AlreadyPresent(peer) => {
                        debug!("Duplicate join notice for {}", peer);
                    }
                    RosterChange::PeerJoined(peer) => {
                        info!("{} joined ({} present)", peer, participants);
                        self.start_caller(&peer).await;
                    }
                }
            }

            ServerFrame::UserLeft {
                participant_id,
                participants,
            } => {
                self.roster.on_leave(&participant_id, participants);
                self.publish_roster();

                if participant_id == self.config.local_id {
                    debug!("Ignoring leave notice for ourselves");
                    return;
                }
                info!("{} left ({} present)", participant_id, participants);
                self.teardown(&participant_id).await;
            }

            ServerFrame::Signal(msg) => self.handle_signal(msg).await,

            ServerFrame::Error { message } => {
                warn!("Relay rejected a frame: {}", message);
            }
        }
    }

    async fn start_caller(&mut self, peer: &ParticipantId) {
        let (session, created) = match self.registry.get_or_create(peer, Role::Caller).await {
            Ok(found) => found,
            Err(e) => {
                warn!("{}", e);
                return;
            }
        };
        if !created {
            debug!("Session for {} already exists; not offering", peer);
            return;
        }

        let tag = session.tag().clone();
        match session.negotiation_mut().start_offer() {
            Ok(actions) => self.apply(&tag, actions).await,
            Err(e) => warn!("{}", e),
        }
    }

    async fn handle_signal(&mut self, msg: SignalMessage) {
        if !msg.is_addressed_to(&self.config.local_id) {
            return;
        }
        if msg.from == self.config.local_id {
            warn!("Dropping {} addressed from ourselves", msg.payload.kind());
            return;
        }

        let from = msg.from;
        debug!("Received {} from {}", msg.payload.kind(), from);

        let (session, created) = match self.registry.get_or_create(&from, Role::Callee).await {
            Ok(found) => found,
            Err(e) => {
                warn!("{}", e);
                return;
            }
        };

        let tag = session.tag().clone();
        let negotiation = session.negotiation_mut();
        let result = match msg.payload {
            SignalPayload::Offer(offer) => negotiation.receive_offer(offer),
            SignalPayload::Answer(answer) => negotiation.receive_answer(answer),
            SignalPayload::Candidate(candidate) => negotiation.receive_candidate(candidate),
        };
        let actions = match result {
            Ok(actions) => actions,
            Err(e) => {
                warn!("{}", e);
                negotiation.note_error(e);
                Vec::new()
            }
        };

        if created && self.roster.observe(&from) {
            self.publish_roster();
        }
        self.apply(&tag, actions).await;
    }

    async fn handle_transport_event(&mut self, event: TransportEvent) {
        if !self.registry.is_current(event.tag()) {
            debug!("Dropping event from stale session {}", event.tag());
            return;
        }

        match event {
            TransportEvent::CandidateGenerated(tag, candidate) => {
                self.transmit(&tag, SignalPayload::Candidate(candidate)).await;
            }

            TransportEvent::TrackReceived(tag, track) => {
                info!("Rendering remote {} from {}", track.kind, tag.peer);
                self.surface
                    .render_stream(SlotId::Peer(tag.peer.clone()), MediaStream::Remote(track.clone()));
                if let Some(session) = self.registry.get_mut(&tag.peer) {
                    session.add_remote_track(track);
                }
            }

            TransportEvent::StateChanged(tag, state) => {
                match state {
                    PeerConnectionState::Failed => warn!("Connection to {} failed", tag),
                    _ => debug!("Connection to {} is {:?}", tag, state),
                }
                if let Some(session) = self.registry.get_mut(&tag.peer) {
                    session.set_connection_state(state);
                }
            }

            TransportEvent::StepFinished(tag, outcome) => {
                let events = self.transport_tx.clone();
                let Some(session) = self.registry.get_mut(&tag.peer) else {
                    return;
                };
                if let Some(next) = session.step_done() {
                    Self::spawn_step(events, &tag, session.connection(), next);
                }
                if let Err(e) = &outcome.result {
                    warn!("{}", e);
                }

                let negotiation = session.negotiation_mut();
                let before = negotiation.state();
                let actions = negotiation.step_finished(outcome);
                let after = negotiation.state();
                if before != after {
                    info!("Session {}: {} -> {}", tag, before, after);
                }

                self.apply(&tag, actions).await;
            }
        }
    }

    async fn apply(&mut self, tag: &SessionTag, actions: Vec<Action>) {
        for action in actions {
            match action {
                Action::Run(step) => self.queue_step(tag, step),
                Action::Transmit(payload) => self.transmit(tag, payload).await,
            }
        }
    }

    fn queue_step(&mut self, tag: &SessionTag, step: Step) {
        let events = self.transport_tx.clone();
        let Some(session) = self
            .registry
            .get_mut(&tag.peer)
            .filter(|s| s.tag().epoch == tag.epoch)
        else {
            return;
        };

        match session.queue_step(step) {
            Some(step) => Self::spawn_step(events, tag, session.connection(), step),
            None => debug!("Step queued behind a running one for {}", tag),
        }
    }

    /// The outcome comes back as [`TransportEvent::StepFinished`], which
    /// releases the next queued step of the session.
    fn spawn_step(
        events: mpsc::Sender<TransportEvent>,
        tag: &SessionTag,
        connection: Arc<dyn NegotiationConnection>,
        step: Step,
    ) {
        debug!("Running '{}' for {}", step.name(), tag);

        let tag = tag.clone();
        tokio::spawn(async move {
            let outcome = run_step(connection, tag.peer.clone(), step).await;
            let _ = events.send(TransportEvent::StepFinished(tag, outcome)).await;
        });
    }

    async fn transmit(&mut self, tag: &SessionTag, payload: SignalPayload) {
        let msg = SignalMessage {
            meeting_id: self.config.meeting_id.clone(),
            to: tag.peer.clone(),
            from: self.config.local_id.clone(),
            payload: payload.clone(),
        };

        let result = if self.relay_open {
            self.signaling.send_signal(msg).await
        } else {
            Err(ChannelDeliveryError::Closed)
        };

        let Some(session) = self
            .registry
            .get_mut(&tag.peer)
            .filter(|s| s.tag().epoch == tag.epoch)
        else {
            return;
        };
        let negotiation = session.negotiation_mut();

        match result {
            Ok(()) => {
                debug!("Sent {} to {}", payload.kind(), tag.peer);
                let before = negotiation.state();
                negotiation.delivered(&payload);
                if before != negotiation.state() {
                    info!("Session {}: {} -> {}", tag, before, negotiation.state());
                }
            }
            Err(e) => {
                warn!("Failed to deliver {} to {}: {}", payload.kind(), tag.peer, e);
                negotiation.delivery_failed(&payload, &e);
            }
        }
    }

    async fn teardown(&mut self, peer: &ParticipantId) {
        if self.registry.remove(peer).await.is_some() {
            self.surface.release_slot(&SlotId::Peer(peer.clone()));
        }
    }

    async fn shutdown(&mut self) -> Result<(), ChannelDeliveryError> {
        let sent = if self.relay_open {
            self.signaling
                .send_leave(&self.config.meeting_id, &self.config.local_id)
                .await
        } else {
            Err(ChannelDeliveryError::Closed)
        };
        if let Err(e) = &sent {
            warn!("Could not announce leave: {}", e);
        }

        self.local_media.stop();
        for session in self.registry.clear().await {
            self.surface.release_slot(&SlotId::Peer(session.peer().clone()));
        }
        self.surface.release_slot(&SlotId::Local);

        info!("Left meeting {}", self.config.meeting_id);
        sent
    }

    fn publish_roster(&self) {
        self.surface
            .update_roster(self.roster.participants(), self.roster.count());
    }

    fn snapshot(&self) -> RoomSnapshot {
        let mut sessions: Vec<SessionSnapshot> =
            self.registry.sessions().map(SessionSnapshot::from).collect();
        sessions.sort_by(|a, b| a.peer.cmp(&b.peer));

        RoomSnapshot {
            local_id: self.config.local_id.clone(),
            participants: self.roster.participants().to_vec(),
            count: self.roster.count(),
            sessions,
        }
    }
}
