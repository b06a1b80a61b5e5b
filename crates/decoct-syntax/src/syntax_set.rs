use crate::SyntaxKind;

/// Constant bitset of token and node kinds, for first-sets and lookahead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SyntaxSet(u128);

const _: () = assert!((SyntaxKind::TOMBSTONE as u16) < u128::BITS as u16);

impl SyntaxSet {
    pub const EMPTY: Self = Self(0);

    const fn bit(kind: SyntaxKind) -> u128 {
        1 << kind as u16
    }

    pub const fn new<const N: usize>(kinds: [SyntaxKind; N]) -> Self {
        let mut set = Self::EMPTY;
        let mut i = 0;
        while i < N {
            set = set.with(kinds[i]);
            i += 1;
        }
        set
    }

    pub const fn with(self, kind: SyntaxKind) -> Self {
        Self(self.0 | Self::bit(kind))
    }

    pub const fn contains(self, kind: SyntaxKind) -> bool {
        self.0 & Self::bit(kind) != 0
    }
}
