//! Submap errors

use thiserror::Error;

use crate::core::Timestamp;
use crate::fusion::BlockIndex;
use crate::submap::SubmapId;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SubmapError {
    #[error("registration points of submap {id} are only available once it is finished")]
    NotFinished { id: SubmapId },

    #[error("ESDF has no block at {block}")]
    MissingEsdfBlock { block: BlockIndex },

    #[error("ESDF block {block} has no voxel at linear index {linear_index}")]
    InvalidEsdfIndex { block: BlockIndex, linear_index: usize },

    #[error("pose history already holds an entry at {0}")]
    DuplicatePoseTimestamp(Timestamp),
}
