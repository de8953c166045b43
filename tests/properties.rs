use rand::{rngs::StdRng, Rng, SeedableRng};
use windowed_median::{check::check_stream, MedianError, WindowedMedian};

fn sorted_window(xs: &[i64], end: usize, w: usize) -> Vec<i64> {
    let start = end.saturating_sub(w);
    let mut v = Vec::from(&xs[start..end]);
    v.sort();
    v
}

#[test]
fn test_size_and_cursor_1() {
    let mut rng = StdRng::seed_from_u64(2024);
    for w in [1, 2, 3, 4, 7, 16] {
        let xs: Vec<i64> = (0..150).map(|_| rng.gen_range(-20..=20)).collect();
        let mut m: WindowedMedian = WindowedMedian::new(w).unwrap();
        for (i, x) in xs.iter().enumerate() {
            m.insert(*x);
            let n = (i + 1).min(w);
            assert_eq!(m.len(), n);
            assert_eq!(m.sorted_values().count(), n);
            assert_eq!(m.cursor_rank(), Some((n - 1) / 2));
        }
    }
}

#[test]
fn test_odd_even_1() {
    let mut rng = StdRng::seed_from_u64(77);
    let xs: Vec<i64> = (0..300).map(|_| rng.gen_range(-1000..=1000)).collect();
    for w in 1..10 {
        let mut m: WindowedMedian = WindowedMedian::new(w).unwrap();
        for i in 0..xs.len() {
            m.insert(xs[i]);
            let v = sorted_window(&xs, i + 1, w);
            let n = v.len();
            let expected = if n % 2 == 1 {
                v[(n - 1) / 2] as f64
            } else {
                0.5 * (v[n / 2 - 1] as f64) + 0.5 * (v[n / 2] as f64)
            };
            assert_eq!(m.median().unwrap(), expected);
            assert_eq!(m.lower_median().unwrap(), v[(n - 1) / 2]);
        }
    }
}

#[test]
fn test_equivalence_1() {
    let mut rng = StdRng::seed_from_u64(5);
    for _ in 0..300 {
        let w = rng.gen_range(1..=12);
        let n = rng.gen_range(1..=40);
        let xs: Vec<i64> = (0..n).map(|_| rng.gen_range(-4..=4)).collect();
        let o = check_stream("prop", w, &xs, None).unwrap();
        assert!(o.passed(), "w={} xs={:?} {:?}", w, xs, o.mismatch);
    }
}

#[test]
fn test_constant_1() {
    for w in 1..10 {
        let mut m: WindowedMedian = WindowedMedian::new(w).unwrap();
        for _ in 0..w {
            m.insert(11);
        }
        assert!(m.is_full());
        assert_eq!(m.median().unwrap(), 11.0);
    }
}

#[test]
fn test_errors_1() {
    assert!(matches!(
        WindowedMedian::<i64>::new(0),
        Err(MedianError::InvalidArgument { .. })
    ));
    let m: WindowedMedian = WindowedMedian::new(5).unwrap();
    assert!(matches!(m.median(), Err(MedianError::EmptyState)));
}

#[test]
fn test_extremes_1() {
    let mut m: WindowedMedian = WindowedMedian::new(2).unwrap();
    m.insert(i64::MAX);
    m.insert(i64::MAX);
    assert_eq!(m.median().unwrap(), i64::MAX as f64);
    m.insert(i64::MIN);
    m.insert(i64::MIN);
    assert_eq!(m.median().unwrap(), i64::MIN as f64);
}
