use indicatif::ProgressBar;
use rand::{rngs::StdRng, Rng, SeedableRng};
use rayon::prelude::{IntoParallelIterator, ParallelIterator};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{error::MedianError, median::WindowedMedian};

/// A stream to check, with the medians it should produce if known.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    pub window_size: usize,
    pub values: Vec<i64>,
    pub expected: Option<Vec<f64>>,
}

impl Scenario {
    pub fn new(name: &str, window_size: usize, values: &[i64]) -> Scenario {
        Scenario {
            name: name.to_string(),
            window_size,
            values: Vec::from(values),
            expected: None,
        }
    }

    pub fn expecting(mut self, expected: &[f64]) -> Scenario {
        self.expected = Some(Vec::from(expected));
        self
    }

    pub fn check(&self) -> Result<Outcome, MedianError> {
        check_stream(
            &self.name,
            self.window_size,
            &self.values,
            self.expected.as_deref(),
        )
    }
}

pub fn builtin_scenarios() -> Vec<Scenario> {
    Vec::from([
        Scenario::new("ascending", 3, &[1, 2, 3, 4, 5, 6, 7, 8, 9])
            .expecting(&[1.0, 1.5, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0]),
        Scenario::new("descending", 3, &[9, 8, 7, 6, 5, 4, 3, 2, 1])
            .expecting(&[9.0, 8.5, 8.0, 7.0, 6.0, 5.0, 4.0, 3.0, 2.0]),
        Scenario::new("dip", 4, &[9, 8, 7, 6, 5, 4, 5, 6])
            .expecting(&[9.0, 8.5, 8.0, 7.0, 6.5, 5.5, 5.0, 5.0]),
        Scenario::new("constant", 3, &[3, 3, 3, 3, 3, 3, 3, 3, 3])
            .expecting(&[3.0; 9]),
        Scenario::new("outlier", 3, &[3, 3, 3, 3, -7, 3, 3, 3, 3])
            .expecting(&[3.0; 9]),
        Scenario::new("mixed", 5, &[4, 3, 3, -5, 7, 1, 3, 4, 5])
            .expecting(&[4.0, 3.5, 3.0, 3.0, 3.0, 3.0, 3.0, 3.0, 4.0]),
        Scenario::new(
            "large",
            6,
            &[
                470211272, 101027544, 1457850878, 1458777923, 2007237709, 823564440, 1115438165,
                1784484492, 74243042, 114807987,
            ],
        ),
    ])
}

/// Where a stream first went wrong.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Mismatch {
    pub step: usize,
    pub value: i64,
    pub size: usize,
    pub cursor_rank: Option<usize>,
    pub median: f64,
    pub naive: f64,
    pub expected: Option<f64>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Outcome {
    pub name: String,
    pub window_size: usize,
    pub length: usize,
    pub mismatch: Option<Mismatch>,
}

impl Outcome {
    pub fn passed(&self) -> bool {
        self.mismatch.is_none()
    }
}

/// Feed `values` into a `WindowedMedian`, and after every insertion compare
/// the median against the sorting reference (and `expected`, when given),
/// and check the window size and cursor position.
pub fn check_stream(
    name: &str,
    window_size: usize,
    values: &[i64],
    expected: Option<&[f64]>,
) -> Result<Outcome, MedianError> {
    let mut wm: WindowedMedian = WindowedMedian::new(window_size)?;
    let mut mismatch = None;
    for (step, value) in values.iter().enumerate() {
        wm.insert(*value);
        let size = wm.len();
        let cursor_rank = wm.cursor_rank();
        let median = wm.median()?;
        let naive = wm.median_naive()?;
        let want = expected.and_then(|e| e.get(step).copied());

        let good = size == (step + 1).min(window_size)
            && cursor_rank == Some((size - 1) / 2)
            && median == naive
            && want.map_or(true, |w| w == median);
        if !good {
            warn!(
                name,
                step,
                size,
                ?cursor_rank,
                median,
                naive,
                ?want,
                "median mismatch"
            );
            mismatch = Some(Mismatch {
                step,
                value: *value,
                size,
                cursor_rank,
                median,
                naive,
                expected: want,
            });
            break;
        }
    }
    debug!(
        name,
        window_size,
        length = values.len(),
        passed = mismatch.is_none(),
        "checked"
    );
    Ok(Outcome {
        name: name.to_string(),
        window_size,
        length: values.len(),
        mismatch,
    })
}

/// Draw a random window size and stream. Values are spread over
/// `[-(2^31 - 1), 0]` when `wide`, and over `[-3, 3]` otherwise, which
/// makes duplicates of the median common.
pub fn random_stream<R: Rng>(
    rng: &mut R,
    max_len: usize,
    max_window: usize,
    wide: bool,
) -> (usize, Vec<i64>) {
    let n = rng.gen_range(1..=max_len);
    let window_size = rng.gen_range(1..=max_window);
    let mut values = Vec::with_capacity(n);
    for _ in 0..n {
        let x = if wide {
            rng.gen_range(-(i32::MAX as i64)..=0)
        } else {
            rng.gen_range(-3..=3)
        };
        values.push(x);
    }
    (window_size, values)
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VerifyConfig {
    pub seed: u64,
    pub trials: usize,
    pub max_len: usize,
    pub max_window: usize,
}

impl Default for VerifyConfig {
    fn default() -> Self {
        VerifyConfig {
            seed: 19,
            trials: 92,
            max_len: 20,
            max_window: 10,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Report {
    pub config: VerifyConfig,
    pub streams: usize,
    pub passed: usize,
    pub failures: Vec<Outcome>,
}

impl Report {
    pub fn ok(&self) -> bool {
        self.failures.is_empty()
    }
}

fn run_trial(config: &VerifyConfig, i: usize) -> Result<Outcome, MedianError> {
    let mut rng = StdRng::seed_from_u64(config.seed.wrapping_add(i as u64));
    let wide = i % 2 == 0;
    let (window_size, values) = random_stream(&mut rng, config.max_len, config.max_window, wide);
    check_stream(&format!("random-{}", i), window_size, &values, None)
}

/// Check the built-in scenarios, then `config.trials` random streams in
/// parallel. Trial `i` is seeded with `config.seed + i`.
pub fn verify(
    config: &VerifyConfig,
    scenarios: &[Scenario],
    opt_prog: Option<&ProgressBar>,
) -> Result<Report, MedianError> {
    if config.max_len == 0 {
        return Err(MedianError::InvalidArgument {
            name: "maximum stream length",
            value: 0,
        });
    }
    if config.max_window == 0 {
        return Err(MedianError::InvalidArgument {
            name: "maximum window size",
            value: 0,
        });
    }

    let mut outcomes: Vec<Outcome> = Vec::new();
    for scenario in scenarios {
        outcomes.push(scenario.check()?);
        if let Some(prog) = opt_prog {
            prog.inc(1);
        }
    }

    let random: Vec<Outcome> = (0..config.trials)
        .into_par_iter()
        .map(|i| {
            let res = run_trial(config, i);
            if let Some(prog) = opt_prog {
                prog.inc(1);
            }
            res
        })
        .collect::<Result<Vec<Outcome>, MedianError>>()?;
    outcomes.extend(random);

    let streams = outcomes.len();
    let failures: Vec<Outcome> = outcomes.into_iter().filter(|o| !o.passed()).collect();
    debug!(streams, failures = failures.len(), "verification done");
    Ok(Report {
        config: config.clone(),
        streams,
        passed: streams - failures.len(),
        failures,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scenarios_1() {
        for s in builtin_scenarios() {
            let o = s.check().unwrap();
            assert!(o.passed(), "{}: {:?}", s.name, o.mismatch);
            assert_eq!(o.length, s.values.len());
        }
    }

    #[test]
    fn test_scenarios_2() {
        let s =
            Scenario::new("wrong", 3, &[1, 2, 3, 4]).expecting(&[1.0, 1.5, 2.0, 2.5]);
        let o = s.check().unwrap();
        let m = o.mismatch.unwrap();
        assert_eq!(m.step, 3);
        assert_eq!(m.value, 4);
        assert_eq!(m.median, 3.0);
        assert_eq!(m.naive, 3.0);
        assert_eq!(m.expected, Some(2.5));
    }

    #[test]
    fn test_scenarios_3() {
        let s = Scenario::new("bad window", 0, &[1]);
        assert!(matches!(
            s.check(),
            Err(MedianError::InvalidArgument { value: 0, .. })
        ));
    }

    #[test]
    fn test_random_stream_1() {
        let mut rng = StdRng::seed_from_u64(7);
        for i in 0..200 {
            let (w, xs) = random_stream(&mut rng, 20, 10, i % 2 == 0);
            assert!(1 <= w && w <= 10);
            assert!(1 <= xs.len() && xs.len() <= 20);
            for x in xs {
                if i % 2 == 0 {
                    assert!(-(i32::MAX as i64) <= x && x <= 0);
                } else {
                    assert!(-3 <= x && x <= 3);
                }
            }
        }
    }

    #[test]
    fn test_random_stream_2() {
        let a = random_stream(&mut StdRng::seed_from_u64(99), 20, 10, true);
        let b = random_stream(&mut StdRng::seed_from_u64(99), 20, 10, true);
        assert_eq!(a, b);
    }

    #[test]
    fn test_verify_1() {
        let config = VerifyConfig::default();
        let scenarios = builtin_scenarios();
        let report = verify(&config, &scenarios, None).unwrap();
        assert!(report.ok(), "{:?}", report.failures);
        assert_eq!(report.streams, scenarios.len() + config.trials);
        assert_eq!(report.passed, report.streams);
    }

    #[test]
    fn test_verify_2() {
        let config = VerifyConfig {
            seed: 1234,
            trials: 400,
            max_len: 60,
            max_window: 16,
        };
        let prog = ProgressBar::hidden();
        let report = verify(&config, &[], Some(&prog)).unwrap();
        assert!(report.ok(), "{:?}", report.failures);
        assert_eq!(prog.position(), 400);
    }

    #[test]
    fn test_verify_3() {
        let scenarios =
            vec![Scenario::new("wrong", 2, &[1, 2]).expecting(&[1.0, 2.0])];
        let config = VerifyConfig {
            trials: 4,
            ..VerifyConfig::default()
        };
        let report = verify(&config, &scenarios, None).unwrap();
        assert!(!report.ok());
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].name, "wrong");
        assert_eq!(report.passed, 4);
    }

    #[test]
    fn test_verify_4() {
        let config = VerifyConfig {
            max_window: 0,
            ..VerifyConfig::default()
        };
        match verify(&config, &[], None) {
            Err(err @ MedianError::InvalidArgument { .. }) => {
                assert_eq!(err.to_string(), "maximum window size must be positive, got 0");
            }
            other => panic!("unexpected {:?}", other.map(|r| r.streams)),
        }
    }

    #[test]
    fn test_verify_5() {
        let config = VerifyConfig {
            max_len: 0,
            ..VerifyConfig::default()
        };
        match verify(&config, &[], None) {
            Err(err @ MedianError::InvalidArgument { .. }) => {
                assert_eq!(err.to_string(), "maximum stream length must be positive, got 0");
            }
            other => panic!("unexpected {:?}", other.map(|r| r.streams)),
        }
    }
}
