//! Event Participation State Machine
//!
//! Each (event, user) pair is in one of three states:
//!
//! ```text
//!            postulate              validate
//!   None  -------------->  Waiting  ---------->  Approved
//!         <--------------           <----------
//!           unpostulate              unvalidate
//! ```
//!
//! A [`Roster`] holds the waiting list and the participant list of a single
//! event. A user is never present in both lists, and the participant list
//! never grows past the capacity. Capacity only gates approval; the waiting
//! list is unbounded.
//!
//! The roster is pure data. Callers are responsible for loading it under a
//! lock and persisting the change reported by each transition.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Membership state of a user for one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberState {
    /// Not on either list.
    None,
    /// On the waiting list.
    Waiting,
    /// On the participant list.
    Approved,
}

/// Result of a successful transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The user moved from `from` to `to`.
    Changed { from: MemberState, to: MemberState },
    /// Nothing to do; the roster is untouched.
    Unchanged,
}

impl Outcome {
    /// New state of the user, if the transition changed anything.
    pub const fn new_state(self) -> Option<MemberState> {
        match self {
            Self::Changed { to, .. } => Some(to),
            Self::Unchanged => None,
        }
    }
}

/// Rejected transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ParticipationError {
    #[error("User is already on the waiting list")]
    AlreadyWaiting,

    #[error("User is already a participant")]
    AlreadyApproved,

    #[error("Event is full")]
    EventFull,

    #[error("User is not on the waiting list")]
    NotWaiting,

    #[error("User is not a participant")]
    NotApproved,
}

/// Waiting list and participant list of one event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Roster {
    capacity: Option<u32>,
    waiting: Vec<Uuid>,
    participants: Vec<Uuid>,
}

impl Roster {
    /// Empty roster. `capacity` of `None` means unbounded.
    pub const fn new(capacity: Option<u32>) -> Self {
        Self {
            capacity,
            waiting: Vec::new(),
            participants: Vec::new(),
        }
    }

    /// Rebuild a roster from stored `(user, state)` rows in list order.
    ///
    /// Rows in state [`MemberState::None`] are ignored. A user listed twice
    /// keeps its first state.
    pub fn from_members<I>(capacity: Option<u32>, members: I) -> Self
    where
        I: IntoIterator<Item = (Uuid, MemberState)>,
    {
        let mut roster = Self::new(capacity);
        for (user, state) in members {
            if roster.state_of(user) != MemberState::None {
                continue;
            }
            match state {
                MemberState::Waiting => roster.waiting.push(user),
                MemberState::Approved => roster.participants.push(user),
                MemberState::None => {}
            }
        }
        roster
    }

    pub const fn capacity(&self) -> Option<u32> {
        self.capacity
    }

    pub fn waiting(&self) -> &[Uuid] {
        &self.waiting
    }

    pub fn participants(&self) -> &[Uuid] {
        &self.participants
    }

    /// Whether another participant can be approved.
    pub fn is_full(&self) -> bool {
        self.capacity
            .is_some_and(|cap| self.participants.len() >= cap as usize)
    }

    pub fn state_of(&self, user: Uuid) -> MemberState {
        if self.participants.contains(&user) {
            MemberState::Approved
        } else if self.waiting.contains(&user) {
            MemberState::Waiting
        } else {
            MemberState::None
        }
    }

    /// None -> Waiting.
    pub fn postulate(&mut self, user: Uuid) -> Result<Outcome, ParticipationError> {
        match self.state_of(user) {
            MemberState::Waiting => Err(ParticipationError::AlreadyWaiting),
            MemberState::Approved => Err(ParticipationError::AlreadyApproved),
            MemberState::None => {
                self.waiting.push(user);
                Ok(Outcome::Changed {
                    from: MemberState::None,
                    to: MemberState::Waiting,
                })
            }
        }
    }

    /// Waiting -> None. Any other state is left as is.
    pub fn unpostulate(&mut self, user: Uuid) -> Outcome {
        if self.state_of(user) != MemberState::Waiting {
            return Outcome::Unchanged;
        }
        self.waiting.retain(|id| *id != user);
        Outcome::Changed {
            from: MemberState::Waiting,
            to: MemberState::None,
        }
    }

    /// Waiting -> Approved, subject to capacity.
    pub fn validate(&mut self, user: Uuid) -> Result<Outcome, ParticipationError> {
        match self.state_of(user) {
            MemberState::Approved => Err(ParticipationError::AlreadyApproved),
            MemberState::None => Err(ParticipationError::NotWaiting),
            MemberState::Waiting if self.is_full() => Err(ParticipationError::EventFull),
            MemberState::Waiting => {
                self.waiting.retain(|id| *id != user);
                self.participants.push(user);
                Ok(Outcome::Changed {
                    from: MemberState::Waiting,
                    to: MemberState::Approved,
                })
            }
        }
    }

    /// Approved -> Waiting. The user goes to the back of the waiting list.
    pub fn unvalidate(&mut self, user: Uuid) -> Result<Outcome, ParticipationError> {
        if self.state_of(user) != MemberState::Approved {
            return Err(ParticipationError::NotApproved);
        }
        self.participants.retain(|id| *id != user);
        self.waiting.push(user);
        Ok(Outcome::Changed {
            from: MemberState::Approved,
            to: MemberState::Waiting,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn users(n: usize) -> Vec<Uuid> {
        (0..n).map(|_| Uuid::now_v7()).collect()
    }

    fn pair() -> (Uuid, Uuid) {
        (Uuid::now_v7(), Uuid::now_v7())
    }

    fn triple() -> (Uuid, Uuid, Uuid) {
        (Uuid::now_v7(), Uuid::now_v7(), Uuid::now_v7())
    }

    #[test]
    fn test_postulate_then_validate_scenario() {
        let (a, b) = pair();
        let mut roster = Roster::new(Some(1));

        roster.postulate(a).unwrap();
        assert_eq!(roster.state_of(a), MemberState::Waiting);

        roster.validate(a).unwrap();
        assert_eq!(roster.state_of(a), MemberState::Approved);
        assert!(roster.waiting().is_empty());

        roster.postulate(b).unwrap();
        assert_eq!(roster.state_of(b), MemberState::Waiting);

        assert_eq!(roster.validate(b), Err(ParticipationError::EventFull));
        assert_eq!(roster.state_of(b), MemberState::Waiting);
        assert_eq!(roster.participants(), &[a]);
    }

    #[test]
    fn test_postulate_twice_rejected() {
        let user = Uuid::now_v7();
        let mut roster = Roster::new(None);

        roster.postulate(user).unwrap();
        assert_eq!(roster.postulate(user), Err(ParticipationError::AlreadyWaiting));
        assert_eq!(roster.waiting().len(), 1);
    }

    #[test]
    fn test_postulate_when_approved_rejected() {
        let user = Uuid::now_v7();
        let mut roster = Roster::new(None);

        roster.postulate(user).unwrap();
        roster.validate(user).unwrap();
        assert_eq!(roster.postulate(user), Err(ParticipationError::AlreadyApproved));
    }

    #[test]
    fn test_postulate_not_gated_by_capacity() {
        let (a, b, c) = triple();
        let mut roster = Roster::new(Some(1));

        roster.postulate(a).unwrap();
        roster.validate(a).unwrap();
        assert!(roster.is_full());

        roster.postulate(b).unwrap();
        roster.postulate(c).unwrap();
        assert_eq!(roster.waiting(), &[b, c]);
    }

    #[test]
    fn test_unpostulate_is_idempotent() {
        let user = Uuid::now_v7();
        let mut roster = Roster::new(None);
        roster.postulate(user).unwrap();

        assert_eq!(
            roster.unpostulate(user),
            Outcome::Changed {
                from: MemberState::Waiting,
                to: MemberState::None
            }
        );
        assert_eq!(roster.unpostulate(user), Outcome::Unchanged);
        assert_eq!(roster.state_of(user), MemberState::None);
    }

    #[test]
    fn test_unpostulate_leaves_participant_alone() {
        let user = Uuid::now_v7();
        let mut roster = Roster::new(None);
        roster.postulate(user).unwrap();
        roster.validate(user).unwrap();

        assert_eq!(roster.unpostulate(user), Outcome::Unchanged);
        assert_eq!(roster.state_of(user), MemberState::Approved);
    }

    #[test]
    fn test_unpostulate_only_removes_caller() {
        let (a, b, c) = triple();
        let mut roster = Roster::new(None);
        for u in [a, b, c] {
            roster.postulate(u).unwrap();
        }

        roster.unpostulate(b);
        assert_eq!(roster.waiting(), &[a, c]);
    }

    #[test]
    fn test_validate_requires_waiting() {
        let user = Uuid::now_v7();
        let mut roster = Roster::new(None);

        assert_eq!(roster.validate(user), Err(ParticipationError::NotWaiting));

        roster.postulate(user).unwrap();
        roster.validate(user).unwrap();
        assert_eq!(roster.validate(user), Err(ParticipationError::AlreadyApproved));
    }

    #[test]
    fn test_unvalidate_moves_back_to_end_of_waiting_list() {
        let (a, b) = pair();
        let mut roster = Roster::new(Some(5));
        roster.postulate(a).unwrap();
        roster.postulate(b).unwrap();
        roster.validate(a).unwrap();

        roster.unvalidate(a).unwrap();
        assert!(roster.participants().is_empty());
        assert_eq!(roster.waiting(), &[b, a]);
        assert_eq!(roster.unvalidate(a), Err(ParticipationError::NotApproved));
    }

    #[test]
    fn test_unvalidate_frees_a_slot() {
        let (a, b) = pair();
        let mut roster = Roster::new(Some(1));
        roster.postulate(a).unwrap();
        roster.postulate(b).unwrap();
        roster.validate(a).unwrap();
        assert_eq!(roster.validate(b), Err(ParticipationError::EventFull));

        roster.unvalidate(a).unwrap();
        roster.validate(b).unwrap();
        assert_eq!(roster.participants(), &[b]);
    }

    #[test]
    fn test_from_members_keeps_order_and_drops_duplicates() {
        let (a, b, c) = triple();
        let roster = Roster::from_members(
            Some(2),
            [
                (a, MemberState::Waiting),
                (b, MemberState::Approved),
                (a, MemberState::Approved),
                (c, MemberState::Waiting),
            ],
        );

        assert_eq!(roster.waiting(), &[a, c]);
        assert_eq!(roster.participants(), &[b]);
        assert_eq!(roster.capacity(), Some(2));
    }

    /// Walk every sequence of operations up to a fixed depth and check that
    /// the lists stay disjoint and the participant list stays within bounds.
    #[test]
    fn test_invariants_hold_for_all_short_sequences() {
        const DEPTH: u32 = 4;
        let people = users(3);
        let ops = 4 * people.len();

        for capacity in [None, Some(0), Some(1), Some(2)] {
            for seq in 0..ops.pow(DEPTH) {
                let mut roster = Roster::new(capacity);
                let mut code = seq;
                for _ in 0..DEPTH {
                    let op = code % ops;
                    code /= ops;
                    let user = people[op / 4];
                    match op % 4 {
                        0 => {
                            let _ = roster.postulate(user);
                        }
                        1 => {
                            roster.unpostulate(user);
                        }
                        2 => {
                            let _ = roster.validate(user);
                        }
                        _ => {
                            let _ = roster.unvalidate(user);
                        }
                    }

                    if let Some(cap) = capacity {
                        assert!(roster.participants().len() <= cap as usize);
                    }
                    for id in roster.participants() {
                        assert!(!roster.waiting().contains(id));
                    }
                }
            }
        }
    }
}
