//! Corpus-level analysis: data matrix, PCA and feature ranking

pub mod corpus;
pub mod metadata;
pub mod pca;
pub mod ranking;
pub mod result;
