//! Piece catalog: the 7 tetromino templates, matrix rotation, and the piece RNG.

use thiserror::Error;

/// A piece shape or arena row block: square matrix of cell codes, 0 = empty.
pub type Matrix = Vec<Vec<u8>>;

/// Rotation direction for [`rotate_matrix`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rotation {
    Clockwise,
    CounterClockwise,
}

#[derive(Debug, Error)]
pub enum PieceError {
    #[error("invalid piece code: {0}")]
    InvalidKind(u8),
}

/// Tetromino kinds. Each kind owns a fixed cell code 1..=7 which doubles as its
/// colour index in the theme palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PieceKind {
    T,
    O,
    L,
    J,
    I,
    S,
    Z,
}

impl PieceKind {
    pub const ALL: [Self; 7] = [Self::T, Self::O, Self::L, Self::J, Self::I, Self::S, Self::Z];

    /// Cell code written into the arena when this piece locks (1..=7).
    pub fn code(self) -> u8 {
        match self {
            Self::T => 1,
            Self::O => 2,
            Self::L => 3,
            Self::J => 4,
            Self::I => 5,
            Self::S => 6,
            Self::Z => 7,
        }
    }

    /// Code → kind lookup for values read back out of the arena.
    pub fn from_code(code: u8) -> Result<Self, PieceError> {
        Self::ALL
            .into_iter()
            .find(|k| k.code() == code)
            .ok_or(PieceError::InvalidKind(code))
    }

    /// A fresh owned copy of this kind's template matrix. Shapes are stored
    /// square-padded so the transpose-based rotation stays in the bounding box;
    /// the caller may mutate the copy freely.
    pub fn template(self) -> Matrix {
        match self {
            Self::T => vec![vec![0, 0, 0], vec![1, 1, 1], vec![0, 1, 0]],
            Self::O => vec![vec![2, 2], vec![2, 2]],
            Self::L => vec![vec![0, 3, 0], vec![0, 3, 0], vec![0, 3, 3]],
            Self::J => vec![vec![0, 4, 0], vec![0, 4, 0], vec![4, 4, 0]],
            Self::I => vec![
                vec![0, 5, 0, 0],
                vec![0, 5, 0, 0],
                vec![0, 5, 0, 0],
                vec![0, 5, 0, 0],
            ],
            Self::S => vec![vec![0, 6, 6], vec![6, 6, 0], vec![0, 0, 0]],
            Self::Z => vec![vec![7, 7, 0], vec![0, 7, 7], vec![0, 0, 0]],
        }
    }
}

/// In-place 90° rotation: transpose, then reverse each row (clockwise) or the
/// row order (counter-clockwise). Only valid on square matrices, which is all
/// the catalog contains.
pub fn rotate_matrix(matrix: &mut Matrix, dir: Rotation) {
    let n = matrix.len();
    for y in 0..n {
        for x in 0..y {
            let tmp = matrix[y][x];
            matrix[y][x] = matrix[x][y];
            matrix[x][y] = tmp;
        }
    }
    match dir {
        Rotation::Clockwise => {
            for row in matrix.iter_mut() {
                row.reverse();
            }
        }
        Rotation::CounterClockwise => matrix.reverse(),
    }
}

/// Small LCG for uniform piece selection; seedable so runs can be replayed.
#[derive(Debug, Clone)]
pub struct PieceRng {
    state: u32,
}

impl PieceRng {
    pub fn new(seed: u64) -> Self {
        // Fold the seed down and keep it non-zero.
        let folded = (seed ^ (seed >> 32)) as u32;
        Self {
            state: if folded == 0 { 0x1234_5678 } else { folded },
        }
    }

    fn next_rand(&mut self) -> u32 {
        self.state = self.state.wrapping_mul(1_103_515_245).wrapping_add(12_345);
        self.state >> 16
    }

    /// Uniform draw over the 7 kinds.
    pub fn pick(&mut self) -> PieceKind {
        PieceKind::ALL[(self.next_rand() as usize) % PieceKind::ALL.len()]
    }
}
