//! Quadtree partitioning of a query circle into Z-order cells.
//!
//! A [`QuadCell`] is a code prefix: the cell holds every code whose masked
//! bits equal the cell's code. Each split exposes one more bit pair and yields
//! four children, one per quadrant. Because codes are interleaved, every cell
//! is a single contiguous key range.
//!
//! The covering search runs in three passes:
//!
//! 1. Find the smallest cell whose bounds contain the circle's bounding
//!    rectangle, split it once, and keep the children that overlap the circle.
//! 2. Refine each of those with a keep threshold of 3.
//! 3. Refine the cells kept by pass 2 with a keep threshold of 2.
//!
//! Refinement of one cell descends while exactly one child overlaps the
//! circle. When more children overlap than the threshold allows, the cell is
//! kept whole instead of being split.

use alfalfa_types::code::GeoCode;
use alfalfa_types::range::KeyRange;
use alfalfa_types::rect::GeoRect;
use log::{trace, warn};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::compute::geocode::{LATITUDE_SPAN, LONGITUDE_SPAN, decode_raw};
use crate::compute::geometry::{GeoCircle, overlaps};
use crate::error::AlfalfaError;

/// Keep threshold of the second pass.
pub const SECOND_PASS_THRESHOLD: usize = 3;

/// Keep threshold of the third pass.
pub const THIRD_PASS_THRESHOLD: usize = 2;

/// Top bit pair of a mask.
const TOP_PAIR: u64 = 0xC000_0000_0000_0000;

/// Children of a split cell that overlap the circle.
pub type Survivors = SmallVec<[QuadCell; 4]>;

/// One of the four children of a split cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Quadrant {
    NorthEast,
    NorthWest,
    SouthEast,
    SouthWest,
}

impl Quadrant {
    /// Split order.
    pub const ALL: [Quadrant; 4] = [
        Quadrant::NorthEast,
        Quadrant::NorthWest,
        Quadrant::SouthEast,
        Quadrant::SouthWest,
    ];

    /// Which of the newly exposed bits this quadrant sets.
    ///
    /// Longitude bits sit in odd positions and latitude bits in even ones, so
    /// east sets the odd bit and north the even bit.
    const fn pattern(self) -> u64 {
        match self {
            Quadrant::NorthEast => u64::MAX,
            Quadrant::NorthWest => 0x5555_5555_5555_5555,
            Quadrant::SouthEast => 0xAAAA_AAAA_AAAA_AAAA,
            Quadrant::SouthWest => 0,
        }
    }
}

/// A quadtree cell: a Z-order code prefix and the mask selecting it.
///
/// The mask always consists of whole bit pairs set from the top, so a cell at
/// depth `n` has its top `2n` bits set. The code is kept normalised
/// (`code & mask`), so two cells are equal exactly when they cover the same
/// codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "RawQuadCell", into = "RawQuadCell")]
pub struct QuadCell {
    code: u64,
    mask: u64,
}

impl QuadCell {
    /// Create a cell, clearing code bits outside the mask.
    pub fn new(code: u64, mask: u64) -> Self {
        debug_assert!(
            is_pair_prefix(mask),
            "mask {:016X} is not a whole-pair prefix",
            mask
        );
        Self {
            code: code & mask,
            mask,
        }
    }

    /// The whole world.
    pub const fn root() -> Self {
        Self { code: 0, mask: 0 }
    }

    /// The single-code cell at full precision.
    pub const fn leaf(code: GeoCode) -> Self {
        Self {
            code: code.value(),
            mask: u64::MAX,
        }
    }

    /// The depth-`depth` cell holding `code`. Depth is capped at 32.
    pub fn at_depth(code: GeoCode, depth: u32) -> Self {
        Self::new(code.value(), mask_for_depth(depth.min(32)))
    }

    #[inline]
    pub fn code(&self) -> u64 {
        self.code
    }

    #[inline]
    pub fn mask(&self) -> u64 {
        self.mask
    }

    /// Number of bit pairs fixed by the mask, from 0 (world) to 32 (leaf).
    pub fn depth(&self) -> u32 {
        self.mask.count_ones() / 2
    }

    pub fn is_root(&self) -> bool {
        self.mask == 0
    }

    pub fn is_leaf(&self) -> bool {
        self.mask == u64::MAX
    }

    /// Smallest raw code in the cell.
    pub fn min_code(&self) -> u64 {
        self.code
    }

    /// Largest raw code in the cell.
    pub fn max_code(&self) -> u64 {
        self.code | !self.mask
    }

    /// Inclusive key range holding every code in the cell.
    ///
    /// The sentinel is never a stored code, so a range ending on it is
    /// shortened by one.
    pub fn key_range(&self) -> KeyRange {
        KeyRange::new(
            GeoCode::new(self.min_code()),
            GeoCode::new(self.max_code()),
        )
    }

    pub fn contains_code(&self, code: GeoCode) -> bool {
        code.value() & self.mask == self.code
    }

    /// Whether `other` is this cell or lies inside it.
    pub fn contains_cell(&self, other: &QuadCell) -> bool {
        other.mask & self.mask == self.mask && other.code & self.mask == self.code
    }

    /// Area covered by the cell.
    ///
    /// The south-west corner is the decoded minimum code. The cell extends a
    /// full `span / 2^depth` on each axis from there, up to the grid line past
    /// its last code.
    pub fn bounds(&self) -> GeoRect {
        let (south, west) = decode_raw(self.code);
        let scale = 0.5f64.powi(self.depth() as i32);
        GeoRect::new(
            south,
            west,
            south + LATITUDE_SPAN * scale,
            west + LONGITUDE_SPAN * scale,
        )
    }

    /// Split into four children in NE, NW, SE, SW order.
    ///
    /// Returns `None` for a full-precision cell.
    pub fn split(&self) -> Option<[QuadCell; 4]> {
        if self.is_leaf() {
            return None;
        }

        let child_mask = (self.mask >> 2) | TOP_PAIR;
        let exposed = self.mask ^ child_mask;

        Some(Quadrant::ALL.map(|quadrant| QuadCell {
            code: self.code | (exposed & quadrant.pattern()),
            mask: child_mask,
        }))
    }

    /// The enclosing cell one level up, or `None` for the root.
    pub fn parent(&self) -> Option<QuadCell> {
        if self.is_root() {
            return None;
        }
        Some(QuadCell::new(self.code, self.mask << 2))
    }
}

#[derive(Serialize, Deserialize)]
struct RawQuadCell {
    code: u64,
    mask: u64,
}

impl TryFrom<RawQuadCell> for QuadCell {
    type Error = AlfalfaError;

    fn try_from(raw: RawQuadCell) -> Result<Self, Self::Error> {
        if !is_pair_prefix(raw.mask) {
            return Err(AlfalfaError::InvalidInput(format!(
                "cell mask {:016X} is not a whole-pair prefix",
                raw.mask
            )));
        }
        if raw.code & !raw.mask != 0 {
            return Err(AlfalfaError::InvalidInput(format!(
                "cell code {:016X} has bits outside mask {:016X}",
                raw.code, raw.mask
            )));
        }
        Ok(QuadCell::new(raw.code, raw.mask))
    }
}

impl From<QuadCell> for RawQuadCell {
    fn from(cell: QuadCell) -> Self {
        Self {
            code: cell.code,
            mask: cell.mask,
        }
    }
}

/// Set bits form a run from the top and cover whole bit pairs.
fn is_pair_prefix(mask: u64) -> bool {
    mask.leading_ones() == mask.count_ones() && mask.count_ones() % 2 == 0
}

fn mask_for_depth(depth: u32) -> u64 {
    match depth {
        0 => 0,
        d => u64::MAX << (64 - 2 * d),
    }
}

/// Result of refining a set of cells.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Refinement {
    /// Children of split cells, to refine further
    pub kept: Vec<QuadCell>,
    /// Cells kept whole: rolled back or unsplittable
    pub finalized: Vec<QuadCell>,
}

/// Diagnostic counts for one covering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoveringStats {
    /// Depth of the cell containing the circle's bounding rectangle
    pub container_depth: u32,
    /// Cells surviving the split of the container
    pub first_pass: usize,
    /// Cells kept whole during the second pass
    pub second_pass_finalized: usize,
    /// Cells split during the second pass and handed to the third
    pub second_pass_kept: usize,
    /// Cells kept whole during the third pass
    pub third_pass_finalized: usize,
    /// Cells split during the third pass
    pub third_pass_kept: usize,
}

/// Cells covering a circle, with the counts that produced them.
#[derive(Debug, Clone, PartialEq)]
pub struct Covering {
    pub container: QuadCell,
    /// Disjoint cells in ascending code order
    pub cells: Vec<QuadCell>,
    pub stats: CoveringStats,
}

/// Smallest cell holding the circle's center whose bounds contain the
/// circle's bounding rectangle.
///
/// Widens one level at a time from full precision and stops at the root when
/// no smaller cell fits, which happens for circles crossing a pole or the
/// antimeridian.
pub fn containing_cell(circle: &GeoCircle) -> QuadCell {
    let code = circle.center().code().value();
    let target = circle.bounds();
    let mut mask = u64::MAX;

    loop {
        let cell = QuadCell::new(code, mask);
        if mask == 0 || cell.bounds().contains_rect(target) {
            return cell;
        }
        mask <<= 2;
    }
}

/// Keep the cells that overlap the circle, in input order.
pub fn prune<I>(cells: I, circle: &GeoCircle) -> Survivors
where
    I: IntoIterator<Item = QuadCell>,
{
    cells
        .into_iter()
        .filter(|cell| overlaps(&cell.bounds(), circle))
        .collect()
}

enum Outcome {
    Split(Survivors),
    Whole(QuadCell),
    Empty,
}

/// Refine each cell by repeated splitting.
///
/// For each input cell, split it and prune the children:
/// - no children survive: drop the cell;
/// - exactly one survives: continue from that child;
/// - more than `keep_threshold` survive: keep the last split cell whole;
/// - otherwise: keep the survivors for further refinement.
///
/// A cell that cannot split is kept whole.
pub fn refine(cells: &[QuadCell], keep_threshold: usize, circle: &GeoCircle) -> Refinement {
    let mut refinement = Refinement::default();

    for &cell in cells {
        match refine_cell(cell, keep_threshold, circle) {
            Outcome::Split(survivors) => refinement.kept.extend(survivors),
            Outcome::Whole(cell) => refinement.finalized.push(cell),
            Outcome::Empty => {}
        }
    }

    refinement
}

fn refine_cell(mut cell: QuadCell, keep_threshold: usize, circle: &GeoCircle) -> Outcome {
    loop {
        let Some(children) = cell.split() else {
            trace!("cell {:016X} at full precision", cell.code);
            return Outcome::Whole(cell);
        };

        let survivors = prune(children, circle);
        match survivors.len() {
            0 => {
                trace!("cell {:016X}/{} has no overlapping child", cell.code, cell.depth());
                return Outcome::Empty;
            }
            1 => cell = survivors[0],
            n if n > keep_threshold => {
                trace!(
                    "cell {:016X}/{} kept whole: {} children overlap",
                    cell.code,
                    cell.depth(),
                    n
                );
                return Outcome::Whole(cell);
            }
            _ => return Outcome::Split(survivors),
        }
    }
}

/// Compute the disjoint cells covering `circle`.
pub fn covering(circle: &GeoCircle) -> Covering {
    let container = containing_cell(circle);
    let mut stats = CoveringStats {
        container_depth: container.depth(),
        ..CoveringStats::default()
    };

    if container.is_root() && !container.bounds().contains_rect(circle.bounds()) {
        warn!(
            "circle of {} m at {} extends past the grid; searching from the whole world",
            circle.radius_meters(),
            circle.center()
        );
    }

    let Some(children) = container.split() else {
        return Covering {
            container,
            cells: vec![container],
            stats,
        };
    };

    let first = prune(children, circle);
    stats.first_pass = first.len();

    let second = refine(&first, SECOND_PASS_THRESHOLD, circle);
    stats.second_pass_finalized = second.finalized.len();
    stats.second_pass_kept = second.kept.len();

    let third = refine(&second.kept, THIRD_PASS_THRESHOLD, circle);
    stats.third_pass_finalized = third.finalized.len();
    stats.third_pass_kept = third.kept.len();

    let mut cells = second.finalized;
    cells.extend(third.finalized);
    cells.extend(third.kept);
    cells.sort_unstable();

    Covering {
        container,
        cells,
        stats,
    }
}

/// The disjoint cells covering `circle`, in ascending code order.
pub fn covering_cells(circle: &GeoCircle) -> Vec<QuadCell> {
    covering(circle).cells
}
