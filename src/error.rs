use thiserror::Error;

/// Failures of the layout core that are not plain placement refusals.
///
/// Refused placements (wrong block type, full block, no free space) are
/// reported as `false` by the placement calls and never reach this type.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MapError {
    #[error("invalid road side '{0}', choose 'top', 'bottom', 'left', or 'right'")]
    InvalidSide(String),
    #[error("unknown block type '{0}', expected Yard, Ground, or River")]
    UnknownBlockType(String),
    #[error("unknown item kind '{0}', expected Tree or House")]
    UnknownItemKind(String),
    #[error("block size {size} is smaller than the minimum of {min} pixels")]
    BlockTooSmall { size: u32, min: u32 },
    #[error("{blocks} blocks cannot fill a {rows} x {cols} map")]
    ShapeMismatch { blocks: usize, rows: usize, cols: usize },
}
