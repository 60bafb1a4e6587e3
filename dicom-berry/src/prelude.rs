//! 🍇欢迎光临🍓
//!
//! 涵盖了本 crate 一系列常用的功能.

pub use crate::{Idx2d, Point, Polygon, SerialId};

pub use crate::contour::{parse_contour_file, poly_to_mask};
pub use crate::decode::{ImageDecoder, NiftiDecoder, NpyDecoder};

#[cfg(feature = "dicom")]
pub use crate::decode::DicomDecoder;

pub use crate::dataset::{self, home_dataset_dir_with};
pub use crate::dataset::{Batch, BatchIter, DatasetIndex, IndexOptions, LoadMode, Record, RecordData};

pub use crate::{Error, Result};
