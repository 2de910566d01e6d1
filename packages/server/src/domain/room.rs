//! Room membership directory.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use super::value_object::{ConnectionId, RoomName};

/// Maps room names to their members and each connection to its current room.
///
/// A connection is recorded in at most one room. Rooms that become empty are
/// dropped, so a missing room and an empty room are indistinguishable.
#[derive(Debug, Default)]
pub struct RoomDirectory {
    rooms: HashMap<RoomName, BTreeSet<ConnectionId>>,
    current: HashMap<ConnectionId, RoomName>,
}

impl RoomDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move `conn` into `room`, leaving its previous room first.
    ///
    /// Rejoining the current room is allowed and leaves membership unchanged.
    pub fn join(&mut self, conn: ConnectionId, room: RoomName) -> RoomName {
        if let Some(previous) = self.current.remove(&conn) {
            self.detach(conn, &previous);
        }
        self.rooms.entry(room.clone()).or_default().insert(conn);
        self.current.insert(conn, room.clone());
        room
    }

    /// Remove `conn` from `room`.
    ///
    /// Returns false when the room does not contain `conn`.
    pub fn leave(&mut self, conn: ConnectionId, room: &RoomName) -> bool {
        let is_member = self
            .rooms
            .get(room)
            .is_some_and(|members| members.contains(&conn));
        if !is_member {
            return false;
        }

        self.detach(conn, room);
        if self.current.get(&conn) == Some(room) {
            self.current.remove(&conn);
        }
        true
    }

    /// The room `conn` is currently in, `"general"` if none is recorded.
    pub fn current_room(&self, conn: ConnectionId) -> RoomName {
        self.current
            .get(&conn)
            .cloned()
            .unwrap_or_else(RoomName::general)
    }

    /// Whether a current-room record exists for `conn`.
    pub fn has_room(&self, conn: ConnectionId) -> bool {
        self.current.contains_key(&conn)
    }

    /// Members of `room` in accept order; empty when the room does not exist.
    pub fn members_of(&self, room: &RoomName) -> Vec<ConnectionId> {
        self.rooms
            .get(room)
            .map(|members| members.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Detach `conn` from whatever room it occupies. Called on disconnect.
    pub fn remove_everywhere(&mut self, conn: ConnectionId) {
        if let Some(room) = self.current.remove(&conn) {
            self.detach(conn, &room);
        }
        // Stray memberships without a current-room record.
        let stray: Vec<RoomName> = self
            .rooms
            .iter()
            .filter(|(_, members)| members.contains(&conn))
            .map(|(name, _)| name.clone())
            .collect();
        for room in stray {
            self.detach(conn, &room);
        }
    }

    /// Member count per non-empty room, sorted by name.
    pub fn room_sizes(&self) -> BTreeMap<RoomName, usize> {
        self.rooms
            .iter()
            .map(|(name, members)| (name.clone(), members.len()))
            .collect()
    }

    fn detach(&mut self, conn: ConnectionId, room: &RoomName) {
        if let Some(members) = self.rooms.get_mut(room) {
            members.remove(&conn);
            if members.is_empty() {
                self.rooms.remove(room);
            }
        }
    }
}
