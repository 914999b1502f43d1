//! Toggle transition table.
//!
//! | current | incoming | next    | delta                      |
//! |---------|----------|---------|----------------------------|
//! | none    | like     | like    | likes + 1                  |
//! | none    | dislike  | dislike | dislikes + 1               |
//! | like    | like     | none    | likes - 1                  |
//! | dislike | dislike  | none    | dislikes - 1               |
//! | like    | dislike  | dislike | likes - 1, dislikes + 1    |
//! | dislike | like     | like    | dislikes - 1, likes + 1    |

use common::{ReactionKind, TargetId, UserId};
use store::ReactionChange;

/// The effect of one toggle on a user's reaction and the target tally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub next: Option<ReactionKind>,
    pub likes_delta: i64,
    pub dislikes_delta: i64,
}

impl Transition {
    /// Computes the transition for `incoming` given the user's `current`
    /// reaction.
    pub fn compute(current: Option<ReactionKind>, incoming: ReactionKind) -> Self {
        use ReactionKind::{Dislike, Like};

        let (next, likes_delta, dislikes_delta) = match (current, incoming) {
            (None, Like) => (Some(Like), 1, 0),
            (None, Dislike) => (Some(Dislike), 0, 1),
            (Some(Like), Like) => (None, -1, 0),
            (Some(Dislike), Dislike) => (None, 0, -1),
            (Some(Like), Dislike) => (Some(Dislike), -1, 1),
            (Some(Dislike), Like) => (Some(Like), 1, -1),
        };
        Self {
            next,
            likes_delta,
            dislikes_delta,
        }
    }

    /// The store change applying this transition to a user's `current`
    /// reaction.
    pub fn change(
        &self,
        target_id: TargetId,
        user_id: UserId,
        current: Option<ReactionKind>,
    ) -> ReactionChange {
        ReactionChange {
            target_id,
            user_id,
            previous: current,
            reaction: self.next,
            likes_delta: self.likes_delta,
            dislikes_delta: self.dislikes_delta,
        }
    }
}

/// The change that takes back a committed `change`.
pub(crate) fn reverse(change: ReactionChange) -> ReactionChange {
    ReactionChange {
        previous: change.reaction,
        reaction: change.previous,
        likes_delta: -change.likes_delta,
        dislikes_delta: -change.dislikes_delta,
        ..change
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ReactionKind::{Dislike, Like};
    use common::ReactionTally;

    #[test]
    fn table_matches_toggle_semantics() {
        let cases = [
            (None, Like, Some(Like), (1, 0)),
            (None, Dislike, Some(Dislike), (0, 1)),
            (Some(Like), Like, None, (-1, 0)),
            (Some(Dislike), Dislike, None, (0, -1)),
            (Some(Like), Dislike, Some(Dislike), (-1, 1)),
            (Some(Dislike), Like, Some(Like), (1, -1)),
        ];

        for (current, incoming, next, (likes, dislikes)) in cases {
            let t = Transition::compute(current, incoming);
            assert_eq!(t.next, next, "{current:?} + {incoming:?}");
            assert_eq!((t.likes_delta, t.dislikes_delta), (likes, dislikes));
        }
    }

    #[test]
    fn switch_conserves_total() {
        let t = Transition::compute(Some(Like), Dislike);
        let tally = ReactionTally::new(4, 2);
        let after = tally.apply_delta(t.likes_delta, t.dislikes_delta).unwrap();
        assert_eq!(after, ReactionTally::new(3, 3));
        assert_eq!(after.total(), tally.total());
    }

    #[test]
    fn reverse_undoes_the_change() {
        let (target_id, user_id) = (TargetId::new(), UserId::new());
        let change = Transition::compute(Some(Like), Dislike).change(target_id, user_id, Some(Like));
        let back = reverse(change);

        assert_eq!(back.previous, Some(Dislike));
        assert_eq!(back.reaction, Some(Like));
        assert_eq!((back.likes_delta, back.dislikes_delta), (1, -1));
        assert_eq!(reverse(back), change);
    }
}
