//! Relay Protocol Handler
//!
//! The authoritative match core: a single actor that owns the session
//! registry and an outbound sender table, and drains one event queue.
//! Serial processing makes every mutate-then-broadcast sequence atomic
//! without locks; broadcasts are fire-and-forget.
//!
//! The server never re-adjudicates a reported hit against the positions
//! it holds — it relays and scores on the client's word. Hardening that
//! would mean calling `game::hit::evaluate_hit` here before
//! `record_hit`; the adjudicator is kept transport-free for exactly
//! that reason.

use std::collections::BTreeMap;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::game::score::DEFAULT_WIN_THRESHOLD;
use crate::game::state::{GameRegistry, PlayerId};
use crate::network::protocol::{
    ClientMessage, HitReport, Hitter, PlayerUpdate, ServerMessage,
};

/// Outbound queue depth per connection. Messages beyond this are
/// dropped, not awaited — the relay must never block mid-mutation.
pub const OUTBOUND_QUEUE_DEPTH: usize = 64;

/// Relay configuration.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Hits needed to win a round.
    pub win_threshold: u32,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            win_threshold: DEFAULT_WIN_THRESHOLD,
        }
    }
}

/// Events delivered to the relay actor, one per inbound transport
/// event. Connect and Disconnect are connection-lifecycle events, not
/// application payloads.
#[derive(Debug)]
pub enum RelayEvent {
    /// A connection completed its handshake.
    Connect {
        /// Id assigned to the connection.
        id: PlayerId,
        /// Outbound queue for this connection.
        sender: mpsc::Sender<ServerMessage>,
    },
    /// An application message arrived on a connection.
    Message {
        /// Connection the message arrived on.
        id: PlayerId,
        /// Decoded payload.
        message: ClientMessage,
    },
    /// A connection closed. Idempotent — may fire more than once for
    /// the same id during teardown races.
    Disconnect {
        /// Connection that closed.
        id: PlayerId,
    },
}

/// Handle for feeding events into a spawned relay actor.
#[derive(Clone)]
pub struct RelayHandle {
    tx: mpsc::Sender<RelayEvent>,
}

impl RelayHandle {
    /// Queue an event for the actor. Ordering is preserved per sender.
    pub async fn submit(&self, event: RelayEvent) {
        if self.tx.send(event).await.is_err() {
            warn!("relay actor is gone; event dropped");
        }
    }
}

/// The relay state machine. Owns all mutable match state; must only
/// ever be driven from one task.
pub struct Relay {
    config: RelayConfig,
    registry: GameRegistry,
    senders: BTreeMap<PlayerId, mpsc::Sender<ServerMessage>>,
}

impl Relay {
    /// Create a relay with no participants.
    pub fn new(config: RelayConfig) -> Self {
        Self {
            config,
            registry: GameRegistry::new(),
            senders: BTreeMap::new(),
        }
    }

    /// Spawn the actor task and return a handle for the transport side.
    pub fn spawn(config: RelayConfig) -> RelayHandle {
        let (tx, mut rx) = mpsc::channel(256);
        let mut relay = Relay::new(config);
        tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                relay.handle(event);
            }
            debug!("relay actor stopped");
        });
        RelayHandle { tx }
    }

    /// Process one event to completion. Mutation and the resulting
    /// broadcasts happen before the next event is looked at.
    pub fn handle(&mut self, event: RelayEvent) {
        match event {
            RelayEvent::Connect { id, sender } => self.handle_connect(id, sender),
            RelayEvent::Message { id, message } => match message {
                ClientMessage::PlayerUpdate(update) => self.handle_player_update(id, update),
                ClientMessage::Hit(report) => self.handle_hit(report),
            },
            RelayEvent::Disconnect { id } => self.handle_disconnect(id),
        }
    }

    /// Registered participant count (for tests and stats).
    pub fn player_count(&self) -> usize {
        self.registry.player_count()
    }

    fn handle_connect(&mut self, id: PlayerId, sender: mpsc::Sender<ServerMessage>) {
        let roster = match self.registry.add_player(id) {
            Ok(roster) => roster,
            Err(e) => {
                // Ids are connection-scoped, so this cannot happen
                // outside a transport bug. Keep the existing entry.
                warn!("rejecting connect: {e}");
                return;
            }
        };

        info!("player {id} connected ({} total)", roster.len());

        let players = roster.iter().map(PlayerUpdate::from_participant).collect();
        Self::send_to(&sender, ServerMessage::Welcome { id, players });
        self.senders.insert(id, sender);
    }

    fn handle_disconnect(&mut self, id: PlayerId) {
        // Both tables drop in the same event; no broadcast references a
        // half-removed participant afterwards.
        self.registry.remove_player(&id);
        if self.senders.remove(&id).is_some() {
            info!(
                "player {id} disconnected ({} remaining)",
                self.registry.player_count()
            );
        }
    }

    /// `playerUpdate`: store the reported state, relay the payload
    /// verbatim to everyone except the sender. No plausibility checks.
    fn handle_player_update(&mut self, sender_id: PlayerId, update: PlayerUpdate) {
        self.registry.update_player(&update.id, &update.to_update());
        self.broadcast_except(sender_id, ServerMessage::OpponentUpdate(update));
    }

    /// `hit`: credit the scoring side, broadcast scores, and if the win
    /// threshold was crossed, broadcast `gameOver` and reset the round.
    fn handle_hit(&mut self, report: HitReport) {
        let scorer = match report.hitter {
            Hitter::Player => Some(report.id),
            Hitter::Opponent => self.registry.opponent_of(&report.id),
        };

        match scorer {
            Some(scorer) => {
                self.registry.scores_mut().record_hit(&scorer);
                debug!(
                    "hit credited to {scorer} (score {:?})",
                    self.registry.scores().get(&scorer)
                );
            }
            // No opponent registered: the report is a safe no-op.
            None => debug!("hit from {} with no opponent; ignored", report.id),
        }

        self.broadcast(ServerMessage::ScoreUpdate {
            scores: self.registry.scores().snapshot(),
        });

        if let Some(winner) = self.registry.scores().winner(self.config.win_threshold) {
            info!("round over, winner {winner}");
            self.broadcast(ServerMessage::GameOver { winner });
            self.registry.reset_round();
        }
    }

    fn broadcast(&self, message: ServerMessage) {
        for sender in self.senders.values() {
            Self::send_to(sender, message.clone());
        }
    }

    fn broadcast_except(&self, excluded: PlayerId, message: ServerMessage) {
        for (id, sender) in &self.senders {
            if *id != excluded {
                Self::send_to(sender, message.clone());
            }
        }
    }

    fn send_to(sender: &mpsc::Sender<ServerMessage>, message: ServerMessage) {
        // Fire-and-forget: a slow or closed connection loses messages
        // instead of stalling the actor.
        if let Err(e) = sender.try_send(message) {
            debug!("outbound message dropped: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::state::Vec3;

    fn id(byte: u8) -> PlayerId {
        PlayerId::from_bytes([byte; 16])
    }

    struct Client {
        id: PlayerId,
        rx: mpsc::Receiver<ServerMessage>,
    }

    impl Client {
        fn drain(&mut self) -> Vec<ServerMessage> {
            let mut out = Vec::new();
            while let Ok(msg) = self.rx.try_recv() {
                out.push(msg);
            }
            out
        }
    }

    fn connect(relay: &mut Relay, byte: u8) -> Client {
        let (tx, rx) = mpsc::channel(OUTBOUND_QUEUE_DEPTH);
        relay.handle(RelayEvent::Connect {
            id: id(byte),
            sender: tx,
        });
        Client { id: id(byte), rx }
    }

    fn update_for(player: PlayerId, position: Vec3) -> PlayerUpdate {
        PlayerUpdate {
            id: player,
            position,
            rotation: Vec3::default(),
            attack_state: None,
            block_state: None,
        }
    }

    fn hit(reporter: PlayerId, hitter: Hitter) -> RelayEvent {
        RelayEvent::Message {
            id: reporter,
            message: ClientMessage::Hit(HitReport { id: reporter, hitter }),
        }
    }

    fn score_of(messages: &[ServerMessage], player: &PlayerId) -> Option<u32> {
        messages.iter().rev().find_map(|msg| match msg {
            ServerMessage::ScoreUpdate { scores } => scores.get(player).copied(),
            _ => None,
        })
    }

    #[test]
    fn welcome_carries_roster() {
        let mut relay = Relay::new(RelayConfig::default());
        let mut a = connect(&mut relay, 1);
        let mut b = connect(&mut relay, 2);

        let welcome_a = a.drain();
        match &welcome_a[0] {
            ServerMessage::Welcome { id, players } => {
                assert_eq!(*id, a.id);
                assert_eq!(players.len(), 1);
            }
            other => panic!("expected welcome, got {other:?}"),
        }

        match &b.drain()[0] {
            ServerMessage::Welcome { id, players } => {
                assert_eq!(*id, b.id);
                assert_eq!(players.len(), 2);
            }
            other => panic!("expected welcome, got {other:?}"),
        }
    }

    /// Scenario: three self-reported hits from A reach the threshold,
    /// fire one gameOver, and the next score update starts from zero.
    #[test]
    fn three_hits_win_and_reset() {
        let mut relay = Relay::new(RelayConfig::default());
        let mut a = connect(&mut relay, 1);
        let mut b = connect(&mut relay, 2);
        a.drain();
        b.drain();

        for expected in 1..=2u32 {
            relay.handle(hit(a.id, Hitter::Player));
            let msgs = a.drain();
            assert_eq!(score_of(&msgs, &a.id), Some(expected));
            assert!(!msgs.iter().any(|m| matches!(m, ServerMessage::GameOver { .. })));
            b.drain();
        }

        relay.handle(hit(a.id, Hitter::Player));
        let a_id = a.id;
        for client in [&mut a, &mut b] {
            let msgs = client.drain();
            assert_eq!(score_of(&msgs, &a_id), Some(3));
            assert!(msgs
                .iter()
                .any(|m| matches!(m, ServerMessage::GameOver { winner } if *winner == a_id)));
        }

        // Round was reset: the next hit counts up from zero.
        relay.handle(hit(b.id, Hitter::Player));
        let msgs = b.drain();
        assert_eq!(score_of(&msgs, &a.id), Some(0));
        assert_eq!(score_of(&msgs, &b.id), Some(1));
    }

    /// Scenario: a playerUpdate reaches only the other side.
    #[test]
    fn update_relayed_to_others_only() {
        let mut relay = Relay::new(RelayConfig::default());
        let mut a = connect(&mut relay, 1);
        let mut b = connect(&mut relay, 2);
        a.drain();
        b.drain();

        let update = update_for(a.id, Vec3::new(1.0, 1.0, 1.0));
        relay.handle(RelayEvent::Message {
            id: a.id,
            message: ClientMessage::PlayerUpdate(update.clone()),
        });

        assert!(a.drain().is_empty());
        let received = b.drain();
        assert_eq!(received.len(), 1);
        match &received[0] {
            ServerMessage::OpponentUpdate(relayed) => assert_eq!(*relayed, update),
            other => panic!("expected opponentUpdate, got {other:?}"),
        }
    }

    /// Scenario: hitter "opponent" credits the other participant.
    #[test]
    fn opponent_hit_credits_other_side() {
        let mut relay = Relay::new(RelayConfig::default());
        let mut a = connect(&mut relay, 1);
        let mut b = connect(&mut relay, 2);
        a.drain();
        b.drain();

        relay.handle(hit(a.id, Hitter::Opponent));
        let msgs = a.drain();
        assert_eq!(score_of(&msgs, &b.id), Some(1));
        assert_eq!(score_of(&msgs, &a.id), Some(0));
    }

    /// Scenario: hitter "opponent" with nobody else connected is a
    /// safe no-op.
    #[test]
    fn opponent_hit_without_opponent_is_noop() {
        let mut relay = Relay::new(RelayConfig::default());
        let mut a = connect(&mut relay, 1);
        a.drain();

        relay.handle(hit(a.id, Hitter::Opponent));
        let msgs = a.drain();
        assert_eq!(score_of(&msgs, &a.id), Some(0));
        assert!(!msgs.iter().any(|m| matches!(m, ServerMessage::GameOver { .. })));
    }

    #[test]
    fn disconnect_is_idempotent_and_stops_broadcasts() {
        let mut relay = Relay::new(RelayConfig::default());
        let mut a = connect(&mut relay, 1);
        let mut b = connect(&mut relay, 2);
        a.drain();
        b.drain();

        relay.handle(RelayEvent::Disconnect { id: b.id });
        relay.handle(RelayEvent::Disconnect { id: b.id });
        assert_eq!(relay.player_count(), 1);

        relay.handle(hit(a.id, Hitter::Player));
        assert!(b.drain().is_empty());
        assert_eq!(score_of(&a.drain(), &a.id), Some(1));
    }

    #[test]
    fn stale_update_after_disconnect_is_dropped() {
        let mut relay = Relay::new(RelayConfig::default());
        let mut a = connect(&mut relay, 1);
        let mut b = connect(&mut relay, 2);
        relay.handle(RelayEvent::Disconnect { id: a.id });
        a.drain();
        b.drain();

        relay.handle(RelayEvent::Message {
            id: a.id,
            message: ClientMessage::PlayerUpdate(update_for(a.id, Vec3::new(5.0, 1.0, 0.0))),
        });

        // Registry unchanged, but the relay still forwards to others —
        // exactly the original's trust-the-sender behavior.
        assert_eq!(relay.player_count(), 1);
        assert_eq!(b.drain().len(), 1);
    }

    #[test]
    fn duplicate_connect_keeps_first_registration() {
        let mut relay = Relay::new(RelayConfig::default());
        let mut a = connect(&mut relay, 1);
        a.drain();

        let (tx, mut dup_rx) = mpsc::channel(OUTBOUND_QUEUE_DEPTH);
        relay.handle(RelayEvent::Connect { id: a.id, sender: tx });

        assert_eq!(relay.player_count(), 1);
        assert!(dup_rx.try_recv().is_err());
    }
}
