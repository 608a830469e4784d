//! 库内通用的数据模型。

pub mod track;

pub use track::{
    CanonicalTrack, LyricistsValue, NormalizedPackage, RawPackage, RawTrack, SchemaVersion,
    YearValue,
};
