//! Annotated game tree: an arena of move nodes forming a mainline with
//! bracketed variations, navigated with `make_move`/`start_variation`/
//! `end_variation`.
//!
//! Nodes are owned by the [`Game`]'s arena; the PGN-style "variation owned
//! by its branching node" relationship is expressed as an index-based
//! parent back-pointer (never a second owner) — arena+index over
//! `Rc`/`Weak`, keeping the node graph's only real ownership in one place.

use crate::mv::Move;
use crate::position::{Context, Position};
use crate::time_control::TimeControl;

/// A Numeric Annotation Glyph, e.g. `$1` ("good move").
pub type Nag = u8;

/// The standard PGN glyph-to-symbol mapping for the handful of NAGs human
/// annotators actually type by hand; everything else (there are hundreds of
/// numbered glyphs) is rendered numerically by callers.
pub fn nag_text(nag: Nag) -> Option<&'static str> {
    match nag {
        1 => Some("!"),
        2 => Some("?"),
        3 => Some("!!"),
        4 => Some("??"),
        5 => Some("!?"),
        6 => Some("?!"),
        _ => None,
    }
}

struct GameNode {
    mv: Move,
    pre_text: Option<String>,
    post_text: Option<String>,
    nags: Vec<Nag>,
    parent: Option<usize>,
    /// `children[0]` is the mainline continuation from this node;
    /// `children[1..]` are variations — alternatives to `children[0]`, not
    /// to this node itself.
    children: Vec<usize>,
}

/// Header metadata carried alongside the move tree (player names, event,
/// etc. live in the store layer's richer `game` row; this is the minimal
/// set the tree itself cares about).
#[derive(Default, Clone)]
pub struct GameHeader {
    pub white: String,
    pub black: String,
    pub event: String,
    pub site: String,
    pub result: String,
}

pub struct Game {
    start: Position,
    header: GameHeader,
    time_control: Option<TimeControl>,
    arena: Vec<GameNode>,
    root_children: Vec<usize>,
    cursor: Option<usize>,
    pending_variation_parent: Option<Option<usize>>,
    return_stack: Vec<Option<usize>>,
}

impl Game {
    pub fn new(start: Position) -> Game {
        Game {
            start,
            header: GameHeader::default(),
            time_control: None,
            arena: Vec::new(),
            root_children: Vec::new(),
            cursor: None,
            pending_variation_parent: None,
            return_stack: Vec::new(),
        }
    }

    pub fn start_position(&self) -> &Position {
        &self.start
    }

    /// The mainline's first move, followed by any root-level variations
    /// (alternatives to the very first move) — the list a depth-first
    /// encoder starts its traversal from.
    pub fn root_moves(&self) -> &[usize] {
        &self.root_children
    }

    /// `node`'s continuation: `children[0]` is its mainline follow-up,
    /// `children[1..]` are variations branching from `node`'s parent as
    /// alternatives to `node` itself.
    pub fn children(&self, node: usize) -> &[usize] {
        &self.arena[node].children
    }

    pub fn header(&self) -> &GameHeader {
        &self.header
    }

    pub fn header_mut(&mut self) -> &mut GameHeader {
        &mut self.header
    }

    pub fn time_control(&self) -> Option<&TimeControl> {
        self.time_control.as_ref()
    }

    pub fn set_time_control(&mut self, tc: TimeControl) {
        self.time_control = Some(tc);
    }

    fn children_of(&self, parent: Option<usize>) -> &Vec<usize> {
        match parent {
            Some(idx) => &self.arena[idx].children,
            None => &self.root_children,
        }
    }

    fn children_of_mut(&mut self, parent: Option<usize>) -> &mut Vec<usize> {
        match parent {
            Some(idx) => &mut self.arena[idx].children,
            None => &mut self.root_children,
        }
    }

    /// Appends `mv` as a new node: the next move of the mainline, or (if a
    /// `start_variation` is pending) the first move of a new variation.
    /// Returns the new node's index — callers attach annotations via
    /// [`Game::set_pre_text`] / [`Game::set_post_text`] / [`Game::add_nag`]
    /// using that index.
    pub fn make_move(&mut self, mv: Move) -> usize {
        let parent = match self.pending_variation_parent.take() {
            Some(p) => p,
            None => self.cursor,
        };
        let node = GameNode {
            mv,
            pre_text: None,
            post_text: None,
            nags: Vec::new(),
            parent,
            children: Vec::new(),
        };
        let idx = self.arena.len();
        self.arena.push(node);
        self.children_of_mut(parent).push(idx);
        self.cursor = Some(idx);
        idx
    }

    /// Opens a sibling branch from the current node: the next `make_move`
    /// becomes an alternative to the current move rather than its
    /// continuation. Panics if called before any move has been made.
    pub fn start_variation(&mut self) {
        let branch_point = self.cursor.expect("start_variation needs a current move");
        let parent = self.arena[branch_point].parent;
        self.return_stack.push(Some(branch_point));
        self.pending_variation_parent = Some(parent);
    }

    /// Returns to the branching node the most recent `start_variation`
    /// opened from. Panics if there's no matching `start_variation`.
    pub fn end_variation(&mut self) {
        let ret = self
            .return_stack
            .pop()
            .expect("end_variation without matching start_variation");
        self.cursor = ret;
        self.pending_variation_parent = None;
    }

    pub fn current(&self) -> Option<usize> {
        self.cursor
    }

    /// The sequence of moves from the game's start to `node`, following
    /// parent back-pointers and reversing — the mainline-or-variation path
    /// a reference position at `node` is replayed along.
    fn path_to(&self, node: usize) -> Vec<Move> {
        let mut moves = Vec::new();
        let mut cur = Some(node);
        while let Some(idx) = cur {
            moves.push(self.arena[idx].mv);
            cur = self.arena[idx].parent;
        }
        moves.reverse();
        moves
    }

    /// `true` if the position at the current cursor has occurred three or
    /// more times along the path from the game's start — rule-based
    /// threefold repetition, local to this game's own recorded move list
    /// (not a search-driven claim, which stays out of scope).
    pub fn is_threefold_repetition(&self, ctx: &Context) -> bool {
        let Some(node) = self.cursor else { return false };
        let path = self.path_to(node);
        let mut pos = self.start.clone();
        let mut seen = std::collections::HashMap::new();
        *seen.entry(pos.hash()).or_insert(0u32) += 1;
        for mv in path {
            pos.make_move(ctx, mv);
            *seen.entry(pos.hash()).or_insert(0u32) += 1;
        }
        seen.get(&pos.hash()).copied().unwrap_or(0) >= 3
    }

    pub fn move_at(&self, node: usize) -> Move {
        self.arena[node].mv
    }

    pub fn set_pre_text(&mut self, node: usize, text: impl Into<String>) {
        self.arena[node].pre_text = Some(text.into());
    }

    pub fn set_post_text(&mut self, node: usize, text: impl Into<String>) {
        self.arena[node].post_text = Some(text.into());
    }

    pub fn pre_text(&self, node: usize) -> Option<&str> {
        self.arena[node].pre_text.as_deref()
    }

    pub fn post_text(&self, node: usize) -> Option<&str> {
        self.arena[node].post_text.as_deref()
    }

    pub fn add_nag(&mut self, node: usize, nag: Nag) {
        self.arena[node].nags.push(nag);
    }

    pub fn nags(&self, node: usize) -> &[Nag] {
        &self.arena[node].nags
    }

    /// A canonical text dump of the whole tree: `piece-letter + from + to`
    /// for every move, variations in parentheses immediately after the
    /// move they're an alternative to. Used by tests to assert tree shape
    /// without depending on SAN (which needs a live position to
    /// disambiguate, and isn't the point being tested here).
    pub fn canonical_dump(&self) -> String {
        self.dump_list(&self.root_children)
    }

    fn dump_list(&self, list: &[usize]) -> String {
        if list.is_empty() {
            return String::new();
        }
        let main = list[0];
        let mut out = canonical_move_str(self.arena[main].mv);
        for &alt in &list[1..] {
            out.push_str(" (");
            out.push_str(&self.dump_list(std::slice::from_ref(&alt)));
            out.push(')');
        }
        let continuation = self.dump_list(&self.arena[main].children);
        if !continuation.is_empty() {
            out.push(' ');
            out.push_str(&continuation);
        }
        out
    }
}

fn canonical_move_str(mv: Move) -> String {
    format!("{}{}{}", mv.moving_piece().to_char(), mv.from(), mv.to())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mv::flags;
    use crate::piece::PieceType;
    use crate::position::Context;
    use crate::square::Square;

    fn mv(from: &str, to: &str, kind: PieceType) -> Move {
        Move::new(
            Square::from_algebraic(from).unwrap(),
            Square::from_algebraic(to).unwrap(),
            kind,
            PieceType::None,
            0,
        )
    }

    #[test]
    fn tree_round_trip_matches_canonical_dump() {
        use PieceType::*;
        let ctx = Context::new();
        let mut g = Game::new(Position::start(&ctx));

        g.make_move(mv("e2", "e4", Pawn));
        g.start_variation();
        g.make_move(mv("d2", "d4", Pawn));
        g.make_move(mv("g8", "f6", Knight));
        g.make_move(mv("e2", "e4", Pawn));
        g.make_move(mv("b8", "c6", Knight));
        g.start_variation();
        g.make_move(mv("e7", "e5", Pawn));
        g.make_move(mv("f2", "f4", Pawn));
        g.make_move(mv("h7", "h6", Pawn));
        g.end_variation();
        g.end_variation();
        g.make_move(mv("e7", "e5", Pawn));
        g.make_move(mv("b1", "c3", Knight));
        g.start_variation();
        g.make_move(mv("g1", "f3", Knight));
        g.end_variation();
        g.start_variation();
        g.make_move(mv("d2", "d4", Pawn));
        g.end_variation();
        g.make_move(mv("b8", "c6", Knight));
        g.make_move(mv("d2", "d4", Pawn));

        let expected = "Pe2e4 (Pd2d4 Ng8f6 Pe2e4 Nb8c6 (Pe7e5 Pf2f4 Ph7h6)) Pe7e5 Nb1c3 (Ng1f3) (Pd2d4) Nb8c6 Pd2d4";
        assert_eq!(g.canonical_dump(), expected);
    }

    #[test]
    fn annotations_attach_to_their_node() {
        let ctx = Context::new();
        let mut g = Game::new(Position::start(&ctx));
        let n = g.make_move(mv("e2", "e4", PieceType::Pawn).complete(flags::CHECK));
        g.set_pre_text(n, "A bold choice.");
        g.add_nag(n, 1);
        assert_eq!(g.pre_text(n), Some("A bold choice."));
        assert_eq!(g.nags(n), &[1]);
    }

    #[test]
    fn nag_text_maps_standard_glyphs() {
        assert_eq!(nag_text(1), Some("!"));
        assert_eq!(nag_text(6), Some("?!"));
        assert_eq!(nag_text(200), None);
    }

    #[test]
    fn threefold_repetition_detected_on_knight_shuffle() {
        let ctx = Context::new();
        let mut g = Game::new(Position::start(&ctx));
        for _ in 0..2 {
            g.make_move(mv("g1", "f3", PieceType::Knight));
            g.make_move(mv("g8", "f6", PieceType::Knight));
            g.make_move(mv("f3", "g1", PieceType::Knight));
            g.make_move(mv("f6", "g8", PieceType::Knight));
        }
        assert!(g.is_threefold_repetition(&ctx));
    }

    #[test]
    fn no_repetition_after_a_single_shuffle() {
        let ctx = Context::new();
        let mut g = Game::new(Position::start(&ctx));
        g.make_move(mv("g1", "f3", PieceType::Knight));
        g.make_move(mv("g8", "f6", PieceType::Knight));
        assert!(!g.is_threefold_repetition(&ctx));
    }
}
