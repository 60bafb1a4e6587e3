//! 打乱后的批量迭代.

use crate::consts::PREFETCH_THREAD_NAME;
use crate::dataset::{LoadMode, Record, RecordData};
use crate::decode::ImageDecoder;
use crate::error::Result;
use either::Either;
use rand::seq::SliceRandom;
use std::collections::VecDeque;
use std::panic;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// 加载一整批. 任一记录失败则整批失败, 已加载的部分随之释放.
fn load_chunk<D: ImageDecoder + ?Sized>(mut chunk: Vec<Record>, decoder: &D) -> Result<Vec<Record>> {
    for r in chunk.iter_mut() {
        r.load(decoder)?;
    }
    Ok(chunk)
}

/// 一个已加载的批. 在下一次 [`BatchIter::next_batch`] 时被释放.
#[derive(Copy, Clone, Debug)]
pub struct Batch<'a> {
    records: &'a [Record],
    tagged: bool,
}

impl<'a> Batch<'a> {
    /// 批内记录数.
    #[inline]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// 批是否为空. 迭代器从不交付空批.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// 批内记录, 均处于已加载状态.
    #[inline]
    pub fn records(&self) -> &'a [Record] {
        self.records
    }

    /// 逐项访问像素数据.
    ///
    /// 迭代器以 `tag_records = true` 创建时产生 `Right((tag, data))`,
    /// 否则产生 `Left(data)`.
    pub fn iter(&self) -> impl Iterator<Item = Either<&'a RecordData, (String, &'a RecordData)>> {
        let tagged = self.tagged;
        self.records.iter().filter_map(move |r| {
            let data = r.data()?;
            Some(if tagged {
                Either::Right((r.tag(), data))
            } else {
                Either::Left(data)
            })
        })
    }
}

/// 一个 epoch 的批量迭代器. 由 [`crate::DatasetIndex::iterate`] 创建.
///
/// 记录是索引中记录的 `Unloaded` 副本, 因此迭代不会改变索引本身.
/// 任意时刻驻留内存的像素数据不超过两批 (正在交付的一批, 以及正在预取的一批).
pub struct BatchIter<D> {
    decoder: Arc<D>,
    mode: LoadMode,
    tag_records: bool,
    chunks: VecDeque<Vec<Record>>,
    pending: Option<JoinHandle<Result<Vec<Record>>>>,
    current: Vec<Record>,
    batches: usize,
    loaded: usize,
    released: Arc<AtomicUsize>,
}

impl<D: ImageDecoder + Send + Sync + 'static> BatchIter<D> {
    /// 打乱 `records` 的副本并按 `batch_size` 切分. 此时不加载任何数据.
    ///
    /// 当 `batch_size == 0` 时, 程序 panic.
    pub fn new(
        records: &[Record],
        decoder: Arc<D>,
        mode: LoadMode,
        batch_size: usize,
        tag_records: bool,
    ) -> Self {
        assert!(batch_size > 0, "batch size must be positive");
        let mut order: Vec<Record> = records.iter().map(Record::detached).collect();
        order.shuffle(&mut rand::thread_rng());

        let mut chunks = VecDeque::with_capacity(order.len().div_ceil(batch_size));
        let mut rest = order.into_iter().peekable();
        while rest.peek().is_some() {
            chunks.push_back(rest.by_ref().take(batch_size).collect());
        }
        log::debug!(
            "{} records in {} batches of {batch_size}, {mode:?}",
            records.len(),
            chunks.len()
        );

        Self {
            decoder,
            mode,
            tag_records,
            batches: chunks.len(),
            chunks,
            pending: None,
            current: vec![],
            loaded: 0,
            released: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// 本 epoch 的总批数, 即 `ceil(N / batch_size)`.
    #[inline]
    pub fn len(&self) -> usize {
        self.batches
    }

    /// 本 epoch 是否没有任何批.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.batches == 0
    }

    /// 至今交付的记录数.
    #[inline]
    pub fn loaded(&self) -> usize {
        self.loaded
    }

    /// 至今释放的记录数.
    #[inline]
    pub fn released(&self) -> usize {
        self.released.load(Ordering::Acquire)
    }

    /// 释放上一批, 并交付下一批.
    ///
    /// 1. 清空上一次交付的批;
    /// 2. 若有预取线程, 等待其结果; 否则在当前线程加载;
    /// 3. 预取模式下, 若还有剩余的批, 启动一个线程加载它;
    /// 4. 交付本批.
    ///
    /// 本 epoch 结束后返回 `None`. 某批加载失败时返回其错误,
    /// 之后的调用继续交付后续批. 预取线程的 panic 会在调用线程上重新抛出.
    pub fn next_batch(&mut self) -> Option<Result<Batch<'_>>> {
        self.release();

        let loaded = match self.pending.take() {
            Some(handle) => match handle.join() {
                Ok(ans) => ans,
                Err(e) => panic::resume_unwind(e),
            },
            None => load_chunk(self.chunks.pop_front()?, &*self.decoder),
        };
        if self.mode == LoadMode::Prefetch {
            self.prefetch();
        }

        match loaded {
            Ok(records) => {
                self.loaded += records.len();
                self.current = records;
                Some(Ok(Batch {
                    records: &self.current,
                    tagged: self.tag_records,
                }))
            }
            Err(e) => Some(Err(e)),
        }
    }

    /// 对每一批调用 `f`, 遇到第一个错误即停止.
    pub fn for_each_batch<F: FnMut(Batch<'_>)>(mut self, mut f: F) -> Result<()> {
        while let Some(batch) = self.next_batch() {
            f(batch?);
        }
        Ok(())
    }

    fn release(&mut self) {
        let n = self.current.len();
        self.current.clear();
        self.released.fetch_add(n, Ordering::Release);
    }

    fn prefetch(&mut self) {
        let Some(chunk) = self.chunks.pop_front() else {
            return;
        };
        // 线程创建失败时闭包连同 chunk 一起被丢弃, 先留一份身份副本.
        let backup: Vec<Record> = chunk.iter().map(Record::detached).collect();
        let decoder = Arc::clone(&self.decoder);
        let spawned = thread::Builder::new()
            .name(PREFETCH_THREAD_NAME.to_string())
            .spawn(move || load_chunk(chunk, &*decoder));
        match spawned {
            Ok(handle) => {
                log::debug!("prefetching {} records", backup.len());
                self.pending = Some(handle);
            }
            Err(e) => {
                log::warn!("cannot spawn prefetch thread, loading synchronously: {e}");
                self.chunks.push_front(backup);
            }
        }
    }
}

impl<D> Drop for BatchIter<D> {
    fn drop(&mut self) {
        if let Some(handle) = self.pending.take() {
            // 结果 (以及可能的 panic) 直接丢弃.
            let _ = handle.join();
        }
    }
}
