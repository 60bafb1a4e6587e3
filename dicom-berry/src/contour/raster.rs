//! 多边形栅格化.

use crate::error::{Error, Result};
use crate::Point;
use ndarray::Array2;
use num::ToPrimitive;

/// 将多边形 `polygon` 栅格化为 `(height, width)` 的布尔掩码.
///
/// 像素 `(r, c)` 为 `true` 当且仅当其中心 `(c + 0.5, r + 0.5)` 按奇偶 (crossing number)
/// 规则位于多边形内部. 边按半开规则计数 (恰有一个端点严格位于扫描线下方时才相交),
/// 因此相邻多边形的公共边界只会被计入一侧.
///
/// # 返回值
///
/// - `width` 或 `height` 为 0, 或网格大到无法分配时, 返回 `Err(Error::InvalidDimensions)`;
/// - 不同顶点少于 3 个时返回全 `false` 掩码.
pub fn poly_to_mask(polygon: &[Point], width: usize, height: usize) -> Result<Array2<bool>> {
    if width == 0 || height == 0 {
        return Err(Error::InvalidDimensions { width, height });
    }
    super::check_grid(height, width)?;
    let mut mask = Array2::from_elem((height, width), false);
    if !has_area(polygon) {
        return Ok(mask);
    }

    let mut crossings: Vec<f64> = Vec::with_capacity(8);
    for (r, mut row) in mask.rows_mut().into_iter().enumerate() {
        let cy = r as f64 + 0.5;
        scan_crossings(polygon, cy, &mut crossings);
        debug_assert!(crossings.len() % 2 == 0);

        // 中心 cx 在内部 <=> 严格大于 cx 的交点个数为奇数
        // <=> cx 落在某个 [x_{2i}, x_{2i+1}) 区间内.
        for span in crossings.chunks_exact(2) {
            let lo = first_center_at_or_after(span[0]).min(width);
            let hi = first_center_at_or_after(span[1]).min(width);
            if lo < hi {
                row.slice_mut(ndarray::s![lo..hi]).fill(true);
            }
        }
    }
    Ok(mask)
}

/// 收集扫描线 `y = cy` 与多边形各边的交点横坐标, 升序排列.
fn scan_crossings(polygon: &[Point], cy: f64, out: &mut Vec<f64>) {
    out.clear();
    let n = polygon.len();
    for i in 0..n {
        let (x1, y1) = polygon[i];
        let (x2, y2) = polygon[(i + 1) % n];
        if (y1 > cy) != (y2 > cy) {
            out.push(x1 + (cy - y1) * (x2 - x1) / (y2 - y1));
        }
    }
    out.sort_unstable_by(f64::total_cmp);
}

/// 满足 `c + 0.5 >= x` 的最小非负列号 `c`.
#[inline]
fn first_center_at_or_after(x: f64) -> usize {
    let c = (x - 0.5).ceil();
    if c <= 0.0 {
        0
    } else {
        c.to_usize().unwrap_or(usize::MAX)
    }
}

/// 是否存在至少 3 个不同的顶点.
fn has_area(polygon: &[Point]) -> bool {
    let mut distinct: Vec<Point> = Vec::with_capacity(3);
    for p in polygon {
        if !distinct.contains(p) {
            distinct.push(*p);
            if distinct.len() == 3 {
                return true;
            }
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONTOUR_DATA: [Point; 6] = [
        (20.0, 20.0),
        (30.0, 20.0),
        (40.0, 30.0),
        (40.0, 50.0),
        (20.0, 50.0),
        (10.0, 30.0),
    ];

    /// 逐像素射线法, 作为对照.
    fn contains(polygon: &[Point], (px, py): Point) -> bool {
        let mut inside = false;
        let n = polygon.len();
        for i in 0..n {
            let (x1, y1) = polygon[i];
            let (x2, y2) = polygon[(i + 1) % n];
            if (y1 > py) != (y2 > py) && px < x1 + (py - y1) * (x2 - x1) / (y2 - y1) {
                inside = !inside;
            }
        }
        inside
    }

    fn assert_same_as_reference(polygon: &[Point], width: usize, height: usize) {
        let mask = poly_to_mask(polygon, width, height).unwrap();
        assert_eq!(mask.dim(), (height, width));
        for ((r, c), &v) in mask.indexed_iter() {
            let center = (c as f64 + 0.5, r as f64 + 0.5);
            assert_eq!(v, contains(polygon, center), "pixel ({r}, {c})");
        }
    }

    #[test]
    fn test_invalid_dimensions() {
        assert!(matches!(
            poly_to_mask(&CONTOUR_DATA, 0, 10),
            Err(Error::InvalidDimensions {
                width: 0,
                height: 10
            })
        ));
        assert!(poly_to_mask(&CONTOUR_DATA, 10, 0).is_err());
        assert!(poly_to_mask(&CONTOUR_DATA, usize::MAX, usize::MAX).is_err());
    }

    #[test]
    fn test_square() {
        // 覆盖列 2..6, 行 1..4 的像素中心.
        let square = [(2.0, 1.0), (6.0, 1.0), (6.0, 4.0), (2.0, 4.0)];
        let mask = poly_to_mask(&square, 8, 6).unwrap();
        for ((r, c), &v) in mask.indexed_iter() {
            assert_eq!(v, (1..4).contains(&r) && (2..6).contains(&c), "({r}, {c})");
        }
        assert_eq!(mask.iter().filter(|v| **v).count(), 12);
    }

    #[test]
    fn test_matches_reference_crossing() {
        assert_same_as_reference(&CONTOUR_DATA, 41, 51);
        assert_same_as_reference(&CONTOUR_DATA, 64, 64);
        // 被裁剪.
        assert_same_as_reference(&CONTOUR_DATA, 25, 35);

        // 凹多边形, 含负坐标.
        let concave = [
            (-3.0, -3.0),
            (12.3, 0.7),
            (6.1, 5.5),
            (13.7, 11.2),
            (0.4, 9.9),
        ];
        assert_same_as_reference(&concave, 16, 14);
    }

    #[test]
    fn test_interior_and_exterior() {
        let mask = poly_to_mask(&CONTOUR_DATA, 64, 64).unwrap();
        // 严格在内部.
        for (r, c) in [(30, 25), (45, 35), (25, 21), (40, 15)] {
            assert!(mask[(r, c)], "({r}, {c}) should be inside");
        }
        // 严格在外部.
        for (r, c) in [(0, 0), (10, 25), (55, 25), (21, 12), (30, 45), (63, 63)] {
            assert!(!mask[(r, c)], "({r}, {c}) should be outside");
        }
    }

    #[test]
    fn test_deterministic() {
        let a = poly_to_mask(&CONTOUR_DATA, 50, 60).unwrap();
        let b = poly_to_mask(&CONTOUR_DATA, 50, 60).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_degenerate() {
        for poly in [
            vec![],
            vec![(1.0, 1.0)],
            vec![(1.0, 1.0), (5.0, 5.0)],
            vec![(1.0, 1.0), (5.0, 5.0), (1.0, 1.0), (5.0, 5.0)],
        ] {
            let mask = poly_to_mask(&poly, 8, 8).unwrap();
            assert!(mask.iter().all(|v| !*v));
        }
    }

    #[test]
    fn test_shared_edge_not_double_counted() {
        let left = [(0.0, 0.0), (4.0, 0.0), (4.0, 4.0), (0.0, 4.0)];
        let right = [(4.0, 0.0), (8.0, 0.0), (8.0, 4.0), (4.0, 4.0)];
        let a = poly_to_mask(&left, 8, 4).unwrap();
        let b = poly_to_mask(&right, 8, 4).unwrap();
        for (x, y) in a.iter().zip(b.iter()) {
            assert!(*x ^ *y, "every pixel belongs to exactly one square");
        }
    }
}
