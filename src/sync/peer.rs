use tracing::{debug, info, warn};

use crate::category::Category;
use crate::error::ActionError;
use crate::game::{GameMode, GameSession, GameState, PlayerKind, Selection};
use crate::scorecard::LockOutcome;
use crate::sync::frame::{self, PROTOCOL_VERSION};
use crate::sync::message::Message;
use crate::sync::transport::Transport;

pub const HOST_SEAT: usize = 0;
pub const GUEST_SEAT: usize = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Owns the authoritative session.
    Host,
    /// Renders the host's snapshots and forwards its player's intent.
    Guest,
}

impl Role {
    pub fn seat(self) -> usize {
        match self {
            Role::Host => HOST_SEAT,
            Role::Guest => GUEST_SEAT,
        }
    }
}

/// Non-fatal anomalies recorded for display.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProtocolFlags {
    pub remote_version: Option<u32>,
    pub version_mismatch: bool,
    pub malformed_frames: u32,
    pub last_error: Option<String>,
}

/// What an inbound frame meant for the application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeerEvent {
    Hello { version: u32, compatible: bool },
    GameStarted,
    StateApplied,
    ResyncServed,
    RemoteActionApplied,
    RemoteActionRejected(ActionError),
    BonusYahtzee { score: u32 },
    GameOver,
    Emoji(String),
    Chat(String),
    /// Valid message that this role does not act on.
    Ignored,
    Malformed,
}

/// One end of a host/guest session over a `Transport`.
pub struct SyncPeer<T: Transport> {
    role: Role,
    session: GameSession,
    transport: T,
    connected: bool,
    flags: ProtocolFlags,
}

impl<T: Transport> SyncPeer<T> {
    pub fn new(role: Role, session: GameSession, transport: T) -> Self {
        Self {
            role,
            session,
            transport,
            connected: false,
            flags: ProtocolFlags::default(),
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn session(&self) -> &GameSession {
        &self.session
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn flags(&self) -> &ProtocolFlags {
        &self.flags
    }

    pub fn is_connected(&self) -> bool {
        self.connected && self.transport.is_connected()
    }

    /// Connection lifecycle from the shell. On connect both sides announce
    /// their version and a guest asks for a full snapshot.
    pub fn set_connected(&mut self, connected: bool) {
        let was_connected = self.connected;
        self.connected = connected;
        if !connected || was_connected {
            return;
        }
        info!(role = ?self.role, "peer connected");
        self.send(&Message::Hello {
            version: PROTOCOL_VERSION,
        });
        if self.role == Role::Guest {
            self.send(&Message::ResyncRequest);
        }
    }

    /// Host only: starts a two-seat online game and announces it.
    pub fn start_game(&mut self) -> Result<(), ActionError> {
        if self.role != Role::Host {
            return Err(ActionError::NotHost);
        }
        if self.session.state() == GameState::GameOver {
            self.session.return_to_menu();
        }
        self.session.start_new_game_with(
            &[PlayerKind::Human, PlayerKind::Human],
            GameMode::OnlineMultiPlayer,
        )?;
        self.send(&Message::GameStarted {
            player_count: self.session.player_count(),
            mode: GameMode::OnlineMultiPlayer,
        });
        self.broadcast_state();
        Ok(())
    }

    pub fn roll_dice(&mut self) -> Result<(), ActionError> {
        self.session.check_turn(self.role.seat())?;
        match self.role {
            Role::Host => {
                self.session.roll_dice()?;
                self.broadcast_state();
            }
            Role::Guest => {
                if !self.session.can_roll() {
                    return Err(ActionError::NoRollsLeft);
                }
                self.send(&Message::RollDiceRequest);
            }
        }
        Ok(())
    }

    /// Toggles a hold. A guest echoes the toggle locally until the next
    /// snapshot replaces it.
    pub fn toggle_hold(&mut self, index: usize) -> Result<bool, ActionError> {
        self.session.check_turn(self.role.seat())?;
        let held = self.session.toggle_hold(index)?;
        match self.role {
            Role::Host => self.broadcast_state(),
            Role::Guest => self.send(&Message::HoldDiceRequest { index }),
        }
        Ok(held)
    }

    /// Host: locks the category and returns the selection.
    /// Guest: forwards the request and returns `None`.
    pub fn select_category(
        &mut self,
        category: Category,
    ) -> Result<Option<Selection>, ActionError> {
        self.session.check_turn(self.role.seat())?;
        match self.role {
            Role::Host => {
                let selection = self.session.select_category(category)?;
                self.publish_selection(&selection);
                Ok(Some(selection))
            }
            Role::Guest => {
                if !category.is_selectable() {
                    return Err(ActionError::NotSelectable(category));
                }
                self.send(&Message::SelectCategoryRequest {
                    category: category.key().to_string(),
                });
                Ok(None)
            }
        }
    }

    pub fn request_resync(&mut self) {
        self.send(&Message::ResyncRequest);
    }

    pub fn send_emoji(&mut self, emoji: &str) {
        self.send(&Message::Emoji {
            emoji: emoji.to_string(),
        });
    }

    pub fn send_chat(&mut self, text: &str) {
        self.send(&Message::ChatMessage {
            text: text.to_string(),
        });
    }

    /// Handles one inbound frame. Bad frames are recorded, never fatal.
    pub fn receive(&mut self, data: &[u8]) -> PeerEvent {
        let frame = match frame::decode(data) {
            Ok(frame) => frame,
            Err(err) => {
                warn!(role = ?self.role, error = %err, "dropping malformed frame");
                self.flags.malformed_frames += 1;
                self.flags.last_error = Some(err.to_string());
                return PeerEvent::Malformed;
            }
        };
        if frame.version != PROTOCOL_VERSION {
            self.note_version(frame.version);
        }
        debug!(role = ?self.role, message = ?frame.message, "frame received");

        match (self.role, frame.message) {
            (_, Message::Hello { version }) => {
                self.note_version(version);
                PeerEvent::Hello {
                    version,
                    compatible: version == PROTOCOL_VERSION,
                }
            }
            (_, Message::Emoji { emoji }) => PeerEvent::Emoji(emoji),
            (_, Message::ChatMessage { text }) => PeerEvent::Chat(text),

            (Role::Host, Message::ResyncRequest) => {
                self.broadcast_state();
                PeerEvent::ResyncServed
            }
            (Role::Host, Message::RollDiceRequest) => {
                let result = self.session.check_turn(GUEST_SEAT).and_then(|()| {
                    self.session.roll_dice()?;
                    Ok(None)
                });
                self.finish_remote_action(result)
            }
            (Role::Host, Message::HoldDiceRequest { index }) => {
                let result = self.session.check_turn(GUEST_SEAT).and_then(|()| {
                    self.session.toggle_hold(index)?;
                    Ok(None)
                });
                self.finish_remote_action(result)
            }
            (Role::Host, Message::SelectCategoryRequest { category }) => {
                let result = self
                    .session
                    .check_turn(GUEST_SEAT)
                    .and_then(|()| self.session.select_category_key(&category).map(Some));
                self.finish_remote_action(result)
            }

            (Role::Guest, Message::GameStarted { player_count, mode }) => {
                if self.session.state() != GameState::MainMenu {
                    self.session.return_to_menu();
                }
                let kinds = vec![PlayerKind::Human; player_count];
                match self.session.start_new_game_with(&kinds, mode) {
                    Ok(()) => PeerEvent::GameStarted,
                    Err(err) => {
                        warn!(error = %err, "host announced an unplayable game");
                        self.flags.last_error = Some(err.to_string());
                        PeerEvent::Malformed
                    }
                }
            }
            (Role::Guest, Message::GameState { snapshot }) => {
                match self.session.apply_snapshot(&snapshot) {
                    Ok(()) => PeerEvent::StateApplied,
                    Err(err) => {
                        warn!(error = %err, "dropping invalid snapshot");
                        self.flags.malformed_frames += 1;
                        self.flags.last_error = Some(err.to_string());
                        PeerEvent::Malformed
                    }
                }
            }
            (Role::Guest, Message::BonusYahtzeeNotice { score }) => {
                PeerEvent::BonusYahtzee { score }
            }
            (Role::Guest, Message::GameOverNotice) => PeerEvent::GameOver,

            (role, message) => {
                if message.is_request() {
                    warn!(?role, ?message, "request sent to a guest; ignoring");
                } else {
                    debug!(?role, ?message, "message not handled by this role");
                }
                PeerEvent::Ignored
            }
        }
    }

    fn finish_remote_action(&mut self, result: Result<Option<Selection>, ActionError>) -> PeerEvent {
        match result {
            Ok(Some(selection)) => {
                self.publish_selection(&selection);
                PeerEvent::RemoteActionApplied
            }
            Ok(None) => {
                self.broadcast_state();
                PeerEvent::RemoteActionApplied
            }
            Err(err) => {
                info!(error = %err, "remote action rejected");
                self.broadcast_state();
                PeerEvent::RemoteActionRejected(err)
            }
        }
    }

    fn publish_selection(&mut self, selection: &Selection) {
        self.broadcast_state();
        if let LockOutcome::BonusYahtzee { total, .. } = selection.outcome {
            self.send(&Message::BonusYahtzeeNotice { score: total });
        }
        if selection.game_over {
            self.send(&Message::GameOverNotice);
        }
    }

    fn broadcast_state(&mut self) {
        let snapshot = self.session.snapshot();
        self.send(&Message::GameState { snapshot });
    }

    fn note_version(&mut self, version: u32) {
        self.flags.remote_version = Some(version);
        if version != PROTOCOL_VERSION {
            if !self.flags.version_mismatch {
                warn!(
                    local = PROTOCOL_VERSION,
                    remote = version,
                    "protocol version mismatch"
                );
            }
            self.flags.version_mismatch = true;
        }
    }

    fn send(&mut self, message: &Message) {
        if !self.is_connected() {
            debug!(role = ?self.role, ?message, "not connected; message dropped");
            return;
        }
        match frame::encode(message) {
            Ok(bytes) => self.transport.send(bytes),
            Err(err) => {
                warn!(error = %err, "failed to encode message");
                self.flags.last_error = Some(err.to_string());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dice::{DICE_COUNT, Die, DieColor};
    use crate::sync::frame::encode_with_version;
    use crate::sync::message::Snapshot;
    use crate::sync::transport::LoopbackTransport;

    type Peer = SyncPeer<LoopbackTransport>;

    fn connected_pair() -> (Peer, Peer) {
        let (host_end, guest_end) = LoopbackTransport::pair();
        let mut host = SyncPeer::new(Role::Host, GameSession::seeded(5), host_end);
        let mut guest = SyncPeer::new(Role::Guest, GameSession::seeded(6), guest_end);
        host.set_connected(true);
        guest.set_connected(true);
        (host, guest)
    }

    /// Delivers frames both ways until neither side has anything pending.
    fn pump(host: &mut Peer, guest: &mut Peer) -> Vec<PeerEvent> {
        let mut events = Vec::new();
        loop {
            let to_host = host.transport().drain();
            let to_guest = guest.transport().drain();
            if to_host.is_empty() && to_guest.is_empty() {
                return events;
            }
            for frame in to_host {
                events.push(host.receive(&frame));
            }
            for frame in to_guest {
                events.push(guest.receive(&frame));
            }
        }
    }

    #[test]
    fn connecting_exchanges_versions_and_serves_a_resync() {
        let (mut host, mut guest) = connected_pair();

        let events = pump(&mut host, &mut guest);

        assert!(events.contains(&PeerEvent::Hello {
            version: PROTOCOL_VERSION,
            compatible: true
        }));
        assert!(events.contains(&PeerEvent::ResyncServed));
        assert!(events.contains(&PeerEvent::StateApplied));
        assert!(!host.flags().version_mismatch);
    }

    #[test]
    fn guest_requests_are_ignored_out_of_turn() {
        let (mut host, mut guest) = connected_pair();
        host.start_game().unwrap();
        pump(&mut host, &mut guest);

        assert_eq!(
            guest.roll_dice(),
            Err(ActionError::OutOfTurn { player: GUEST_SEAT })
        );
    }

    #[test]
    fn host_rejects_forged_out_of_turn_requests_and_resends_state() {
        let (mut host, mut guest) = connected_pair();
        host.start_game().unwrap();
        pump(&mut host, &mut guest);
        let bytes = frame::encode(&Message::RollDiceRequest).unwrap();

        let event = host.receive(&bytes);

        assert_eq!(
            event,
            PeerEvent::RemoteActionRejected(ActionError::OutOfTurn { player: GUEST_SEAT })
        );
        assert!(host.session().dice().is_blank());
        assert_eq!(guest.transport().pending(), 1);
    }

    #[test]
    fn guest_ignores_requests() {
        let (_host, mut guest) = connected_pair();
        let bytes = frame::encode(&Message::SelectCategoryRequest {
            category: "Chance".to_string(),
        })
        .unwrap();

        assert_eq!(guest.receive(&bytes), PeerEvent::Ignored);
    }

    #[test]
    fn version_mismatch_is_flagged_but_not_fatal() {
        let (_host, mut guest) = connected_pair();
        let bytes = encode_with_version(&Message::Hello { version: 2 }, 2).unwrap();

        let event = guest.receive(&bytes);

        assert_eq!(
            event,
            PeerEvent::Hello {
                version: 2,
                compatible: false
            }
        );
        assert!(guest.flags().version_mismatch);
        assert_eq!(guest.flags().remote_version, Some(2));
        assert!(guest.is_connected());
    }

    #[test]
    fn malformed_frames_are_counted() {
        let (mut host, _guest) = connected_pair();

        assert_eq!(host.receive(b"garbage"), PeerEvent::Malformed);
        assert_eq!(host.receive(b"RBDY\x01\0\0\0\0\0\0\0{}"), PeerEvent::Malformed);

        assert_eq!(host.flags().malformed_frames, 2);
        assert!(host.flags().last_error.is_some());
    }

    #[test]
    fn only_the_host_starts_games() {
        let (_host, mut guest) = connected_pair();

        assert_eq!(guest.start_game(), Err(ActionError::NotHost));
    }

    #[test]
    fn chat_and_emoji_reach_the_other_side() {
        let (mut host, mut guest) = connected_pair();
        pump(&mut host, &mut guest);

        guest.send_chat("gg");
        host.send_emoji("🎲");
        let events = pump(&mut host, &mut guest);

        assert!(events.contains(&PeerEvent::Chat("gg".to_string())));
        assert!(events.contains(&PeerEvent::Emoji("🎲".to_string())));
    }

    #[test]
    fn second_yahtzee_sends_a_bonus_notice_with_the_new_total() {
        let (mut host, mut guest) = connected_pair();
        host.start_game().unwrap();
        let yahtzee = [Die::new(3, DieColor::Red); 5];

        host.session.set_dice(&yahtzee);
        host.select_category(Category::Yahtzee).unwrap();
        pump(&mut host, &mut guest);
        guest.roll_dice().unwrap();
        pump(&mut host, &mut guest);
        guest.select_category(Category::Chance).unwrap();
        pump(&mut host, &mut guest);

        host.session.set_dice(&yahtzee);
        let selection = host.select_category(Category::Yahtzee).unwrap().unwrap();
        let events = pump(&mut host, &mut guest);

        assert_eq!(
            selection.outcome,
            LockOutcome::BonusYahtzee {
                bonus: 100,
                total: 150
            }
        );
        assert!(events.contains(&PeerEvent::BonusYahtzee { score: 150 }));
        assert_eq!(guest.session().current_player(), GUEST_SEAT);
        assert_eq!(guest.session().player_score(HOST_SEAT), 150);
        let host_card = guest.session().player(HOST_SEAT).unwrap().scorecard();
        assert_eq!(host_card.bonus_yahtzees(), 1);
    }

    fn send_snapshot_to(guest: &mut Peer, snapshot: Snapshot) -> PeerEvent {
        let bytes = frame::encode(&Message::GameState { snapshot }).unwrap();
        guest.receive(&bytes)
    }

    #[test]
    fn guest_drops_snapshots_it_cannot_hold() {
        let (mut host, mut guest) = connected_pair();
        host.start_game().unwrap();
        host.roll_dice().unwrap();
        pump(&mut host, &mut guest);
        let before = guest.session().snapshot();

        let huge = Snapshot {
            player_count: usize::MAX,
            ..host.session().snapshot()
        };
        let empty = Snapshot {
            player_count: 0,
            totals: Vec::new(),
            bonus_yahtzees: Vec::new(),
            ..host.session().snapshot()
        };
        let short_dice = Snapshot {
            dice: Vec::new(),
            ..host.session().snapshot()
        };

        assert_eq!(send_snapshot_to(&mut guest, huge), PeerEvent::Malformed);
        assert_eq!(send_snapshot_to(&mut guest, empty), PeerEvent::Malformed);
        assert_eq!(send_snapshot_to(&mut guest, short_dice), PeerEvent::Malformed);

        assert_eq!(guest.flags().malformed_frames, 3);
        assert!(guest.flags().last_error.as_deref().unwrap().contains("invalid snapshot"));
        assert_eq!(guest.session().snapshot(), before);
        assert_eq!(guest.session().dice().len(), DICE_COUNT);
    }

    #[test]
    fn guest_keeps_playing_after_a_dropped_snapshot() {
        let (mut host, mut guest) = connected_pair();
        host.start_game().unwrap();
        host.roll_dice().unwrap();
        host.select_category(Category::Chance).unwrap();
        pump(&mut host, &mut guest);
        let empty = Snapshot {
            player_count: 0,
            totals: Vec::new(),
            bonus_yahtzees: Vec::new(),
            ..host.session().snapshot()
        };
        send_snapshot_to(&mut guest, empty);

        guest.roll_dice().unwrap();
        let events = pump(&mut host, &mut guest);

        assert!(events.contains(&PeerEvent::StateApplied));
        assert_eq!(guest.session().dice(), host.session().dice());
    }

    #[test]
    fn guest_hold_is_echoed_locally_and_confirmed_by_the_host() {
        let (mut host, mut guest) = connected_pair();
        host.start_game().unwrap();
        host.roll_dice().unwrap();
        host.select_category(Category::Chance).unwrap();
        pump(&mut host, &mut guest);
        guest.roll_dice().unwrap();
        pump(&mut host, &mut guest);

        assert_eq!(guest.toggle_hold(2), Ok(true));
        assert!(guest.session().dice().dice()[2].held);
        assert!(!host.session().dice().dice()[2].held);

        pump(&mut host, &mut guest);
        assert!(host.session().dice().dice()[2].held);
        assert_eq!(guest.session().dice(), host.session().dice());
    }

    #[test]
    fn disconnected_peer_sends_nothing() {
        let (host_end, guest_end) = LoopbackTransport::pair();
        let mut guest = SyncPeer::new(Role::Guest, GameSession::seeded(1), guest_end);

        guest.request_resync();

        assert_eq!(host_end.pending(), 0);
    }
}
