//! Observer registration and broadcast fan-out
//!
//! This module tracks every connection observing a game: participants
//! answering on their phones, shared displays projected in the room,
//! and moderators steering the session. It validates participant
//! names, keeps a reverse index by role for cheap counting, and
//! delivers round broadcasts and per-question answer feeds through
//! the [`Tunnel`] seam.

use std::{
    collections::{HashMap, HashSet},
    fmt::Display,
    str::FromStr,
};

use enum_map::{Enum, EnumMap};
use itertools::Itertools;
use rustrict::CensorStr;
use serde::{Deserialize, Serialize};
use serde_with::{DeserializeFromStr, SerializeDisplay};
use thiserror::Error;
use uuid::Uuid;

use super::{
    SyncMessage, UpdateMessage, catalog::QuestionId, constants::participant, ledger::Response,
    session::Tunnel,
};

/// A unique identifier for observers of a game
///
/// Each connection (participant, display, or moderator) gets a unique
/// ID that persists throughout its participation in the game session.
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, DeserializeFromStr, SerializeDisplay,
)]
pub struct Id(Uuid);

impl Id {
    /// Creates a new random observer ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for Id {
    /// Creates a new random observer ID (same as `new()`)
    fn default() -> Self {
        Self::new()
    }
}

impl Display for Id {
    /// Formats the ID as a UUID string
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for Id {
    type Err = uuid::Error;

    /// Parses an ID from a UUID string
    ///
    /// # Errors
    ///
    /// Returns a `uuid::Error` if the string is not a valid UUID.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::from_str(s)?))
    }
}

/// The role of a connection observing the game
///
/// The role determines which requests the engine accepts from the
/// connection and which view the client renders. A single game
/// usually has one moderator, one or more displays, and any number
/// of participants.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// A participant answering questions under a chosen name
    Participant {
        /// The participant's display name, validated on registration
        name: String,
    },
    /// A shared screen showing the question, tallies, and standings
    Display,
    /// The operator controlling question flow and round status
    Moderator,
}

/// The kind of observer without associated data
///
/// Useful for gating requests and filtering observers by role without
/// needing the associated data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Enum, Serialize, Deserialize)]
pub enum RoleKind {
    /// A participant answering questions
    Participant,
    /// A shared screen
    Display,
    /// The operator in control
    Moderator,
}

impl Role {
    /// Returns the kind of this role without the associated data
    pub fn kind(&self) -> RoleKind {
        match self {
            Role::Participant { .. } => RoleKind::Participant,
            Role::Display => RoleKind::Display,
            Role::Moderator => RoleKind::Moderator,
        }
    }
}

/// Errors that can occur when registering an observer
#[derive(Error, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The participant name is empty after trimming whitespace
    #[error("name cannot be empty")]
    EmptyName,
    /// The participant name exceeds the maximum length
    #[error("name is too long")]
    NameTooLong,
    /// The participant name contains inappropriate content
    #[error("name is inappropriate")]
    InappropriateName,
}

/// Validates and normalizes a requested participant name
///
/// Trims surrounding whitespace, then rejects empty names, names
/// longer than [`participant::MAX_NAME_LENGTH`] characters, and
/// inappropriate content.
///
/// # Errors
///
/// Returns the corresponding [`Error`] variant when validation fails.
pub fn clean_name(name: &str) -> Result<String, Error> {
    let name = rustrict::trim_whitespace(name);
    if name.is_empty() {
        return Err(Error::EmptyName);
    }
    if name.chars().count() > participant::MAX_NAME_LENGTH {
        return Err(Error::NameTooLong);
    }
    if name.is_inappropriate() {
        return Err(Error::InappropriateName);
    }
    Ok(name.to_owned())
}

/// Serialization helper for Observers struct
#[derive(Deserialize)]
struct ObserversSerde {
    mapping: HashMap<Id, Role>,
    answer_feeds: HashMap<Id, QuestionId>,
}

/// Manages all observers of a game session
///
/// This struct tracks every connected observer, their roles, and which
/// question's answer feed each display or moderator is subscribed to.
/// It provides the fan-out primitives the game engine uses to deliver
/// updates.
#[derive(Default, Serialize, Deserialize)]
#[serde(from = "ObserversSerde")]
pub struct Observers {
    /// Primary mapping from observer ID to their role
    mapping: HashMap<Id, Role>,

    /// Which question's recorded answers each observer wants streamed
    answer_feeds: HashMap<Id, QuestionId>,

    /// Reverse mapping organized by role for efficient filtering
    #[serde(skip_serializing)]
    reverse_mapping: EnumMap<RoleKind, HashSet<Id>>,
}

impl From<ObserversSerde> for Observers {
    /// Reconstructs the Observers struct from serialized data
    ///
    /// This rebuilds the reverse mapping from the primary mapping,
    /// which is necessary since the reverse mapping is not serialized.
    fn from(serde: ObserversSerde) -> Self {
        let ObserversSerde {
            mapping,
            answer_feeds,
        } = serde;
        let mut reverse_mapping: EnumMap<RoleKind, HashSet<Id>> = EnumMap::default();
        for (id, role) in mapping.iter() {
            reverse_mapping[role.kind()].insert(*id);
        }
        Self {
            mapping,
            answer_feeds,
            reverse_mapping,
        }
    }
}

impl Observers {
    /// Registers an observer, validating participant names
    ///
    /// Participant names are trimmed and checked before being stored;
    /// the stored role always carries the normalized name. Registering
    /// an existing ID replaces its role.
    ///
    /// # Arguments
    ///
    /// * `observer_id` - The unique ID for the observer
    /// * `role` - The requested role
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] if a participant name fails validation.
    pub fn add_observer(&mut self, observer_id: Id, role: Role) -> Result<(), Error> {
        let role = match role {
            Role::Participant { name } => Role::Participant {
                name: clean_name(&name)?,
            },
            other => other,
        };

        let kind = role.kind();
        if let Some(previous) = self.mapping.insert(observer_id, role) {
            self.reverse_mapping[previous.kind()].remove(&observer_id);
        }
        self.reverse_mapping[kind].insert(observer_id);

        Ok(())
    }

    /// Removes an observer and closes their tunnel if one is open
    ///
    /// Dropping the registration also releases any answer feed the
    /// observer held.
    ///
    /// # Arguments
    ///
    /// * `observer_id` - The ID of the observer to remove
    /// * `tunnel_finder` - Function to retrieve the tunnel for a given ID
    pub fn remove_observer<T: Tunnel, F: Fn(Id) -> Option<T>>(
        &mut self,
        observer_id: &Id,
        tunnel_finder: F,
    ) {
        if let Some(role) = self.mapping.remove(observer_id) {
            self.reverse_mapping[role.kind()].remove(observer_id);
        }
        self.answer_feeds.remove(observer_id);

        if let Some(tunnel) = tunnel_finder(*observer_id) {
            tunnel.close();
        }
    }

    /// Gets the role of a specific observer
    pub fn get_role(&self, observer_id: Id) -> Option<Role> {
        self.mapping.get(&observer_id).map(|r| r.to_owned())
    }

    /// Checks if an observer is registered in the game session
    pub fn has_observer(&self, observer_id: Id) -> bool {
        self.mapping.contains_key(&observer_id)
    }

    /// Gets the display name of an observer
    ///
    /// This only returns a name for participants, not displays or
    /// moderators.
    pub fn get_name(&self, observer_id: Id) -> Option<String> {
        self.get_role(observer_id).and_then(|r| match r {
            Role::Participant { name } => Some(name),
            _ => None,
        })
    }

    /// Gets the count of observers with a specific role
    ///
    /// # Arguments
    ///
    /// * `filter` - The role kind to count
    pub fn specific_count(&self, filter: RoleKind) -> usize {
        self.reverse_mapping[filter].len()
    }

    /// Gets a vector of all observers with their tunnels and roles
    ///
    /// # Arguments
    ///
    /// * `tunnel_finder` - Function to retrieve the tunnel for a given ID
    ///
    /// # Returns
    ///
    /// Vector of tuples containing (ID, Tunnel, Role) for all observers
    /// with active tunnels
    pub fn vec<T: Tunnel, F: Fn(Id) -> Option<T>>(&self, tunnel_finder: F) -> Vec<(Id, T, Role)> {
        self.reverse_mapping
            .values()
            .flat_map(|v| v.iter())
            .filter_map(|x| match (tunnel_finder(*x), self.mapping.get(x)) {
                (Some(t), Some(r)) => Some((*x, t, r.to_owned())),
                _ => None,
            })
            .collect_vec()
    }

    /// Points an observer's answer feed at a question, or clears it
    ///
    /// Only displays and moderators may hold answer feeds; requests
    /// for participants or unknown observers are ignored.
    ///
    /// # Arguments
    ///
    /// * `observer_id` - The ID of the subscribing observer
    /// * `question_id` - The question to stream answers for, or `None`
    ///   to unsubscribe
    pub fn set_answer_feed(&mut self, observer_id: Id, question_id: Option<QuestionId>) {
        let eligible = matches!(
            self.mapping.get(&observer_id).map(Role::kind),
            Some(RoleKind::Display | RoleKind::Moderator)
        );
        match question_id {
            Some(question_id) if eligible => {
                self.answer_feeds.insert(observer_id, question_id);
            }
            _ => {
                self.answer_feeds.remove(&observer_id);
            }
        }
    }

    /// Gets the question an observer's answer feed points at
    pub fn answer_feed(&self, observer_id: Id) -> Option<QuestionId> {
        self.answer_feeds.get(&observer_id).copied()
    }

    /// Delivers a recorded response to every matching answer feed
    ///
    /// Observers whose feed points at a different question, or who
    /// hold no feed, receive nothing.
    ///
    /// # Arguments
    ///
    /// * `response` - The newly recorded response
    /// * `tunnel_finder` - Function to retrieve tunnels for observers
    pub fn publish_answer<T: Tunnel, F: Fn(Id) -> Option<T>>(
        &self,
        response: &Response,
        tunnel_finder: F,
    ) {
        for (id, question_id) in self.answer_feeds.iter() {
            if *question_id != response.question_id {
                continue;
            }
            let Some(tunnel) = tunnel_finder(*id) else {
                continue;
            };
            tunnel.send_message(&UpdateMessage::Answer(response.clone()));
        }
    }

    /// Broadcasts an update message to all observers
    ///
    /// # Arguments
    ///
    /// * `message` - The update message to broadcast
    /// * `tunnel_finder` - Function to retrieve tunnels for observers
    pub fn announce<T: Tunnel, F: Fn(Id) -> Option<T>>(
        &self,
        message: &UpdateMessage,
        tunnel_finder: F,
    ) {
        for (_, tunnel, _) in self.vec(tunnel_finder) {
            tunnel.send_message(message);
        }
    }

    /// Sends an update message to a specific observer
    ///
    /// # Arguments
    ///
    /// * `message` - The update message to send
    /// * `observer_id` - The ID of the observer to send to
    /// * `tunnel_finder` - Function to retrieve the tunnel for the observer
    pub fn send_message<T: Tunnel, F: Fn(Id) -> Option<T>>(
        &self,
        message: &UpdateMessage,
        observer_id: Id,
        tunnel_finder: F,
    ) {
        let Some(session) = tunnel_finder(observer_id) else {
            return;
        };

        session.send_message(message);
    }

    /// Sends a state synchronization message to a specific observer
    ///
    /// # Arguments
    ///
    /// * `message` - The sync message to send
    /// * `observer_id` - The ID of the observer to send to
    /// * `tunnel_finder` - Function to retrieve the tunnel for the observer
    pub fn send_state<T: Tunnel, F: Fn(Id) -> Option<T>>(
        &self,
        message: &SyncMessage,
        observer_id: Id,
        tunnel_finder: F,
    ) {
        let Some(session) = tunnel_finder(observer_id) else {
            return;
        };

        session.send_state(message);
    }
}
