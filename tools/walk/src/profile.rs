//! 遍历统计.

use dicom_berry::Batch;
use std::time::{Duration, Instant};

/// 可累加的计时器.
///
/// 该计时器支持 "中途中断" 与 "结束中断, 继续开始计时".
#[derive(Clone, Debug)]
struct AccTimer {
    consumed: Duration,
    since: Instant,
}

impl AccTimer {
    /// 初始化计时器. 初始化时会视为已经开始计时 (`self.start()`).
    #[inline]
    fn new() -> Self {
        Self {
            consumed: Duration::from_secs(0),
            since: Instant::now(),
        }
    }

    /// 开始计时.
    #[inline]
    fn start(&mut self) {
        self.since = Instant::now();
    }

    /// 结束计时, 并将这一区间的时间累加. 返回本轮计时时长.
    ///
    /// # 注意
    ///
    /// 上一次调用必须是 `self.start()`, 否则计算时间值无意义.
    #[inline]
    fn elapsed(&mut self) -> Duration {
        let d = self.since.elapsed();
        self.consumed += d;
        d
    }

    /// 累计时间 (以微秒为单位).
    #[inline]
    fn total_us(&self) -> u64 {
        self.consumed.as_micros() as u64
    }
}

/// 一个 epoch 的统计.
#[derive(Clone, Debug)]
pub struct Profile {
    /// 交付的批数.
    batches: u64,

    /// 交付的记录数.
    records: u64,

    /// 有图像的记录数.
    with_image: u64,

    /// 内轮廓掩码前景像素总数.
    inner_pixels: u64,

    /// 外轮廓掩码前景像素总数.
    outer_pixels: u64,

    /// 等待批交付的总时间.
    wait_time: AccTimer,

    /// 整个 epoch 的总时间.
    real_time: AccTimer,

    /// 最长的一次等待. 尚无记录时为 `Duration::MAX`.
    most: Duration,
}

impl Profile {
    /// 初始化, 同时开始总计时.
    #[inline]
    pub fn new() -> Self {
        Self {
            batches: 0,
            records: 0,
            with_image: 0,
            inner_pixels: 0,
            outer_pixels: 0,
            wait_time: AccTimer::new(),
            real_time: AccTimer::new(),
            most: Duration::MAX,
        }
    }

    /// 开始等待下一批.
    #[inline]
    pub fn wait_start(&mut self) {
        self.wait_time.start();
    }

    /// 下一批已交付 (或迭代已结束).
    #[inline]
    pub fn wait_elapsed(&mut self) {
        let d = self.wait_time.elapsed();
        self.most = match self.most {
            Duration::MAX => d,
            once => once.max(d),
        };
    }

    /// 统计一个批.
    pub fn count_batch(&mut self, batch: &Batch<'_>) {
        self.batches += 1;
        for r in batch.records() {
            let Some(data) = r.data() else {
                continue;
            };
            log::trace!("{}: {:?}", r.tag(), data.shape());
            self.records += 1;
            self.with_image += u64::from(r.has_image());
            self.inner_pixels += data.inner.iter().filter(|&&v| v).count() as u64;
            self.outer_pixels += data.outer.iter().filter(|&&v| v).count() as u64;
        }
    }

    /// 结束全部计时.
    #[inline]
    pub fn finish(mut self) -> Self {
        self.real_time.elapsed();
        self
    }

    /// 批数.
    #[inline]
    pub fn batches(&self) -> u64 {
        self.batches
    }

    /// 记录数.
    #[inline]
    pub fn records(&self) -> u64 {
        self.records
    }

    /// 有图像的记录数.
    #[inline]
    pub fn with_image(&self) -> u64 {
        self.with_image
    }

    /// (内, 外) 轮廓前景像素总数.
    #[inline]
    pub fn contour_pixels(&self) -> (u64, u64) {
        (self.inner_pixels, self.outer_pixels)
    }

    /// 以微秒为单位的总等待时间.
    #[inline]
    pub fn wait_time_us(&self) -> u64 {
        self.wait_time.total_us()
    }

    /// 以微秒为单位的总时间.
    #[inline]
    pub fn real_time_us(&self) -> u64 {
        self.real_time.total_us()
    }

    /// 以微秒为单位的每批平均等待时间.
    #[inline]
    pub fn avg_wait_time_us(&self) -> Option<f64> {
        match self.batches {
            0 => None,
            n => Some(self.wait_time_us() as f64 / n as f64),
        }
    }

    /// 最长的一次等待. 不存在时返回 `None`.
    pub fn longest_wait(&self) -> Option<Duration> {
        match self.most {
            Duration::MAX => None,
            d => Some(d),
        }
    }
}

impl Default for Profile {
    fn default() -> Self {
        Self::new()
    }
}
