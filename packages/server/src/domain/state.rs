//! The relay's single state owner.

use super::{
    entity::UserEntry, identity::IdentityStore, registry::ConnectionRegistry, room::RoomDirectory,
};

/// Everything the relay knows about live connections.
///
/// Kept behind one lock so that read-then-write sequences spanning several
/// directories are atomic.
#[derive(Debug, Default)]
pub struct ChatState {
    pub connections: ConnectionRegistry,
    pub rooms: RoomDirectory,
    pub identities: IdentityStore,
}

impl ChatState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every live connection with its display name and its own room.
    pub fn users_list(&self) -> Vec<UserEntry> {
        self.identities
            .all_names(self.connections.ids())
            .into_iter()
            .map(|(id, username)| UserEntry {
                id,
                username,
                room: self.rooms.current_room(id),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::domain::{Connection, ConnectionId, MockMessageSink, RoomName, Timestamp};

    #[test]
    fn test_users_list_reports_each_users_own_room() {
        // テスト項目: ユーザー一覧の room は各ユーザー自身のルームを示す
        // given (前提条件):
        let mut state = ChatState::new();
        for id in 1..=2 {
            let conn = ConnectionId::new(id);
            state.connections.add(Connection::new(
                conn,
                Arc::new(MockMessageSink::new()),
                Timestamp::new(0),
            ));
            state.rooms.join(conn, RoomName::general());
        }
        state.identities.set_name(ConnectionId::new(2), "Bob");
        state.rooms.join(
            ConnectionId::new(2),
            RoomName::new("random".to_string()).unwrap(),
        );

        // when (操作):
        let users = state.users_list();

        // then (期待する結果):
        assert_eq!(users.len(), 2);
        assert_eq!(users[0].username.as_str(), "User 1");
        assert_eq!(users[0].room.as_str(), "general");
        assert_eq!(users[1].username.as_str(), "Bob");
        assert_eq!(users[1].room.as_str(), "random");
    }
}
