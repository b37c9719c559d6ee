//! Source maps
//!
//! Version 3 source map reading and writing.

pub mod consumer;
pub mod generator;
pub mod mapping;
pub mod mapping_list;
pub mod raw;
pub mod vlq;

pub use consumer::{
    BasicSourceMapConsumer, Bias, GeneratedPosition, IndexedSourceMapConsumer, Order,
    OriginalPosition, SourceMapConsumer,
};
pub use generator::SourceMapGenerator;
pub use mapping::{Mapping, Position};
pub use mapping_list::MappingList;
pub use raw::{RawOffset, RawSection, RawSourceMap};
pub use vlq::VlqError;
