//! Errors returned at the engine's API boundaries.
//!
//! Layout itself has no error path: every input has a defined geometric
//! result. Errors only arise while building the box tree, decoding a
//! document, or validating configuration.

use thiserror::Error;

/// Failures while constructing or mutating a box tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    /// The id refers to a slot that was freed or never allocated.
    #[error("box {index}v{generation} is not live in this tree")]
    StaleBox {
        /// Slot index of the offending id.
        index: u32,
        /// Generation carried by the offending id.
        generation: u32,
    },
    /// The parent's kind cannot hold children (text, line breaks, replaced content).
    #[error("box {0} cannot contain children")]
    NotAContainer(u32),
    /// The child is already attached somewhere else.
    #[error("box {0} already has a parent")]
    AlreadyHasParent(u32),
    /// Appending would make a box its own ancestor.
    #[error("appending box {child} under {parent} would create a cycle")]
    Cycle {
        /// The would-be parent.
        parent: u32,
        /// The would-be child.
        child: u32,
    },
    /// The tree has no root box to lay out.
    #[error("box tree has no root")]
    NoRoot,
}

/// Invalid layout configuration values.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Viewport dimensions must be finite and non-negative.
    #[error("viewport {width}x{height} is not a valid size")]
    InvalidViewport {
        /// Requested width.
        width: f32,
        /// Requested height.
        height: f32,
    },
    /// Page and column heights must be positive.
    #[error("fragment height must be positive, got {0}")]
    NonPositiveFragmentHeight(f32),
    /// A multi-column layout needs at least one column.
    #[error("column count must be at least 1")]
    ZeroColumns,
    /// Line grid pitch must be positive.
    #[error("line grid pitch must be positive, got {0}")]
    NonPositiveGridPitch(f32),
    /// The configuration file could not be decoded.
    #[error("failed to decode configuration: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Failures while decoding a serialized box-tree document.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// The JSON itself was malformed or did not match the document schema.
    #[error("failed to decode document: {0}")]
    Decode(#[from] serde_json::Error),
    /// The decoded description violated a tree constraint.
    #[error("invalid box tree: {0}")]
    Tree(#[from] TreeError),
}
