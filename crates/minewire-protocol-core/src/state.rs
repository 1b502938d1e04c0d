use serde::Deserialize;

/// The state of a Minecraft protocol connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    Handshaking,
    Status,
    Login,
    Play,
}

impl ConnectionState {
    pub fn from_handshake_next(next: i32) -> Option<Self> {
        match next {
            1 => Some(ConnectionState::Status),
            2 => Some(ConnectionState::Login),
            _ => None,
        }
    }

    /// The `next_state` value a Handshake uses to request this state.
    pub fn handshake_id(self) -> Option<i32> {
        match self {
            ConnectionState::Status => Some(1),
            ConnectionState::Login => Some(2),
            _ => None,
        }
    }

    /// Legal transitions: Handshaking -> Status | Login, Login -> Play.
    pub fn can_transition_to(self, next: ConnectionState) -> bool {
        matches!(
            (self, next),
            (ConnectionState::Handshaking, ConnectionState::Status)
                | (ConnectionState::Handshaking, ConnectionState::Login)
                | (ConnectionState::Login, ConnectionState::Play)
        )
    }
}

/// Which way a packet travels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PacketDirection {
    /// Client -> Server
    Serverbound,
    /// Server -> Client
    Clientbound,
}

/// Which end of the connection a session represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Client,
    Server,
}

impl Side {
    pub fn outbound(self) -> PacketDirection {
        match self {
            Side::Client => PacketDirection::Serverbound,
            Side::Server => PacketDirection::Clientbound,
        }
    }

    pub fn inbound(self) -> PacketDirection {
        match self {
            Side::Client => PacketDirection::Clientbound,
            Side::Server => PacketDirection::Serverbound,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handshake_next() {
        assert_eq!(
            ConnectionState::from_handshake_next(1),
            Some(ConnectionState::Status)
        );
        assert_eq!(
            ConnectionState::from_handshake_next(2),
            Some(ConnectionState::Login)
        );
        assert_eq!(ConnectionState::from_handshake_next(3), None);
        assert_eq!(ConnectionState::Login.handshake_id(), Some(2));
    }

    #[test]
    fn test_transitions() {
        use ConnectionState::*;
        assert!(Handshaking.can_transition_to(Status));
        assert!(Handshaking.can_transition_to(Login));
        assert!(Login.can_transition_to(Play));
        assert!(!Status.can_transition_to(Play));
        assert!(!Handshaking.can_transition_to(Play));
        assert!(!Play.can_transition_to(Login));
    }

    #[test]
    fn test_sides() {
        assert_eq!(Side::Client.outbound(), PacketDirection::Serverbound);
        assert_eq!(Side::Server.inbound(), PacketDirection::Serverbound);
    }
}
