//! 数据集索引.

use crate::dataset::matcher::{self, Matched};
use crate::dataset::{BatchIter, IndexOptions, Layout, Record};
use crate::decode::ImageDecoder;
use crate::error::{Error, FolderDefect, Result};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::Arc;

cfg_if::cfg_if! {
    if #[cfg(feature = "rayon")] {
        use rayon::iter::{IntoParallelRefIterator, ParallelIterator};
    }
}

/// 记录统计.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Summary {
    /// 映射表行数.
    pub pairs: usize,

    /// 因目录缺失而被跳过的映射表行数.
    pub skipped: usize,

    /// 记录总数.
    pub records: usize,

    /// 有图像的记录数.
    pub with_image: usize,

    /// 有内轮廓的记录数.
    pub with_inner: usize,

    /// 有外轮廓的记录数.
    pub with_outer: usize,
}

/// 数据目录的完整索引.
///
/// 持有映射表中的全部 `(patient_id, study_id)` 对 (按文件顺序, 保留重复),
/// 以及由它们导出的记录列表. 记录顺序: 外层按映射表顺序, 内层按序号升序.
pub struct DatasetIndex<D> {
    root: PathBuf,
    options: IndexOptions,
    decoder: Arc<D>,
    image_pattern: Regex,
    pairs: Vec<(String, String)>,
    records: Vec<Record>,
    skipped: usize,
}

impl<D: ImageDecoder> DatasetIndex<D> {
    /// 以默认布局和同步加载模式打开数据目录 `root`, 并构建索引.
    #[inline]
    pub fn open<P: AsRef<Path>>(root: P, decoder: D) -> Result<Self> {
        Self::with_options(root, decoder, IndexOptions::default())
    }

    /// 以指定选项打开数据目录 `root`, 并构建索引.
    ///
    /// # 返回值
    ///
    /// 以下情况返回 `Err(Error::InvalidDataFolder)`:
    ///
    /// 1. `root` 不是目录;
    /// 2. 映射表不存在, 不可读, 或不是两列的 CSV;
    /// 3. 图像根目录或轮廓根目录不存在.
    pub fn with_options<P: AsRef<Path>>(root: P, decoder: D, options: IndexOptions) -> Result<Self> {
        let root = root.as_ref().to_owned();
        let invalid = |defect| Error::InvalidDataFolder {
            path: root.clone(),
            defect,
        };
        let layout = &options.layout;

        if !root.is_dir() {
            return Err(invalid(FolderDefect::NotADirectory));
        }
        let link = layout.link_path(&root);
        if !link.is_file() {
            return Err(invalid(FolderDefect::MissingMappingFile));
        }
        let pairs = read_mapping(&link).map_err(invalid)?;
        if !layout.image_root(&root).is_dir() {
            return Err(invalid(FolderDefect::MissingImageDir));
        }
        if !layout.contour_root(&root).is_dir() {
            return Err(invalid(FolderDefect::MissingContourDir));
        }
        let image_pattern = matcher::image_pattern(decoder.extension())?;

        let mut ans = Self {
            root,
            options,
            decoder: Arc::new(decoder),
            image_pattern,
            pairs,
            records: vec![],
            skipped: 0,
        };
        ans.build();
        Ok(ans)
    }

    /// 重新扫描所有映射对, 完整重建记录列表.
    ///
    /// 图像目录缺失, 或内外轮廓目录都缺失的映射对被跳过.
    pub fn build(&mut self) {
        let scan = |(pid, sid): &(String, String)| {
            scan_pair(&self.root, &self.options.layout, &self.image_pattern, pid, sid)
        };

        #[cfg(feature = "rayon")]
        let fragments: Vec<Option<Vec<Record>>> = self.pairs.par_iter().map(scan).collect();
        #[cfg(not(feature = "rayon"))]
        let fragments: Vec<Option<Vec<Record>>> = self.pairs.iter().map(scan).collect();

        let skipped = fragments.iter().filter(|f| f.is_none()).count();
        let records: Vec<Record> = fragments.into_iter().flatten().flatten().collect();
        log::info!(
            "indexed {} records from {} pairs ({skipped} skipped) under `{}`",
            records.len(),
            self.pairs.len(),
            self.root.display()
        );
        self.records = records;
        self.skipped = skipped;
    }

    /// 数据根目录.
    #[inline]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// 构造选项.
    #[inline]
    pub fn options(&self) -> &IndexOptions {
        &self.options
    }

    /// 图像解码器.
    #[inline]
    pub fn decoder(&self) -> &D {
        &self.decoder
    }

    /// 映射表中的 `(patient_id, study_id)` 对, 按文件顺序.
    #[inline]
    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }

    /// 全部记录.
    #[inline]
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// 记录个数.
    #[inline]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// 是否没有任何记录.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// 某个 patient 的全部记录.
    pub fn records_of<'a>(&'a self, patient_id: &'a str) -> impl Iterator<Item = &'a Record> {
        self.records
            .iter()
            .filter(move |r| r.patient_id() == patient_id)
    }

    /// 统计信息.
    pub fn summary(&self) -> Summary {
        let count = |f: fn(&Record) -> bool| self.records.iter().filter(|r| f(r)).count();
        Summary {
            pairs: self.pairs.len(),
            skipped: self.skipped,
            records: self.records.len(),
            with_image: count(Record::has_image),
            with_inner: count(Record::has_inner_contour),
            with_outer: count(Record::has_outer_contour),
        }
    }
}

impl<D: ImageDecoder + Send + Sync + 'static> DatasetIndex<D> {
    /// 以 `batch_size` 为批大小, 打乱后逐批迭代全部记录.
    ///
    /// 每次调用都会重新打乱, 索引本身的记录顺序不变.
    /// `tag_records` 为 `true` 时, 批内每项附带 [`Record::tag`].
    ///
    /// 当 `batch_size == 0` 时, 程序 panic.
    #[inline]
    pub fn iterate(&self, batch_size: usize, tag_records: bool) -> BatchIter<D> {
        BatchIter::new(
            &self.records,
            Arc::clone(&self.decoder),
            self.options.mode,
            batch_size,
            tag_records,
        )
    }
}

/// 读取两列映射表. 表头被跳过, 字段去除首尾空白.
fn read_mapping(path: &Path) -> std::result::Result<Vec<(String, String)>, FolderDefect> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(FolderDefect::MalformedMapping)?;
    let columns = reader
        .headers()
        .map_err(FolderDefect::MalformedMapping)?
        .len();
    if columns != 2 {
        return Err(FolderDefect::MappingColumns(columns));
    }

    let mut pairs = Vec::new();
    for row in reader.records() {
        // 非 flexible 模式下, 每行都与表头等长.
        let row = row.map_err(FolderDefect::MalformedMapping)?;
        pairs.push((row[0].to_owned(), row[1].to_owned()));
    }
    Ok(pairs)
}

/// 扫描一个映射对. 被跳过时返回 `None`.
fn scan_pair(
    root: &Path,
    layout: &Layout,
    image_pattern: &Regex,
    patient_id: &str,
    study_id: &str,
) -> Option<Vec<Record>> {
    let image_dir = layout.image_dir_of(root, patient_id);
    let (inner_dir, outer_dir) = layout.contour_dirs_of(root, study_id);
    let (has_inner, has_outer) = (inner_dir.is_dir(), outer_dir.is_dir());
    if !image_dir.is_dir() || !(has_inner || has_outer) {
        log::info!("skip ({patient_id}, {study_id}): image or contour directory is missing");
        return None;
    }

    let matched = matcher::match_serials(
        Some(image_dir.as_path()),
        has_inner.then_some(inner_dir.as_path()),
        has_outer.then_some(outer_dir.as_path()),
        image_pattern,
    );
    Some(
        matched
            .into_iter()
            .map(|Matched { serial, files }| Record::new(patient_id, study_id, serial, files))
            .collect(),
    )
}
