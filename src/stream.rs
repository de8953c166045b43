use std::{
    collections::VecDeque,
    ffi::OsStr,
    fs::File,
    io::{self, BufRead, BufReader, BufWriter, Lines, Write},
    marker::PhantomData,
    path::Path,
    str::FromStr,
};

use flate2::{read::MultiGzDecoder, write::GzEncoder, Compression};
use num::rational::Ratio;
use tracing::debug;

use crate::{
    error::MedianError,
    median::{Sample, WindowedMedian},
};

fn is_gzip(filename: &str) -> bool {
    Path::new(filename).extension() == Some(OsStr::new("gz"))
}

/// Open `filename` for reading, decompressing ".gz" files. `-` is stdin.
pub fn open_reader(filename: &str) -> io::Result<Box<dyn BufRead>> {
    if filename == "-" {
        return Ok(Box::new(BufReader::new(io::stdin())));
    }
    let file = File::open(filename)?;
    if is_gzip(filename) {
        Ok(Box::new(BufReader::new(MultiGzDecoder::new(file))))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}

/// Open `filename` for writing, compressing ".gz" files. `-` is stdout.
pub fn open_writer(filename: &str) -> io::Result<Box<dyn Write>> {
    if filename == "-" {
        return Ok(Box::new(BufWriter::new(io::stdout())));
    }
    let file = File::create(filename)?;
    if is_gzip(filename) {
        Ok(Box::new(GzEncoder::new(file, Compression::default())))
    } else {
        Ok(Box::new(BufWriter::new(file)))
    }
}

/// Whitespace separated integers, one or more per line. A `#` starts a
/// comment that runs to the end of the line.
pub struct IntegerStream<R, T> {
    lines: Lines<R>,
    line_no: usize,
    pending: VecDeque<String>,
    _marker: PhantomData<T>,
}

impl<R: BufRead, T: FromStr> IntegerStream<R, T> {
    pub fn new(reader: R) -> IntegerStream<R, T> {
        IntegerStream {
            lines: reader.lines(),
            line_no: 0,
            pending: VecDeque::new(),
            _marker: PhantomData,
        }
    }
}

impl<R: BufRead, T: FromStr> Iterator for IntegerStream<R, T> {
    type Item = Result<T, MedianError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(token) = self.pending.pop_front() {
                let line = self.line_no;
                return Some(
                    token
                        .parse::<T>()
                        .map_err(|_| MedianError::Parse { line, token }),
                );
            }
            let text = match self.lines.next()? {
                Ok(text) => text,
                Err(err) => return Some(Err(err.into())),
            };
            self.line_no += 1;
            let content = match text.find('#') {
                Some(i) => &text[..i],
                None => &text[..],
            };
            self.pending
                .extend(content.split_ascii_whitespace().map(|s| s.to_string()));
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct MedianRow<T> {
    pub index: usize,
    pub value: T,
    pub median: f64,
    pub exact: Ratio<i128>,
}

/// Calls `f` with the running median after each value of `values`.
/// Stops at the first bad value. Returns the number of rows produced.
pub fn with_running_medians<T, I, F>(
    window_size: usize,
    values: I,
    mut f: F,
) -> Result<usize, MedianError>
where
    T: Sample,
    I: IntoIterator<Item = Result<T, MedianError>>,
    F: FnMut(MedianRow<T>) -> Result<(), MedianError>,
{
    let mut wm: WindowedMedian<T> = WindowedMedian::new(window_size)?;
    let mut n = 0;
    for res in values {
        let value = res?;
        wm.insert(value);
        f(MedianRow {
            index: n,
            value,
            median: wm.median()?,
            exact: wm.median_exact()?,
        })?;
        n += 1;
    }
    debug!(window_size, rows = n, "running medians done");
    Ok(n)
}

pub fn running_medians<T: Sample>(
    window_size: usize,
    values: &[T],
) -> Result<Vec<MedianRow<T>>, MedianError> {
    let mut rows = Vec::with_capacity(values.len());
    with_running_medians(window_size, values.iter().map(|x| Ok(*x)), |row| {
        rows.push(row);
        Ok(())
    })?;
    Ok(rows)
}

/// Write `index\tvalue\tmedian` rows with a header line.
pub fn write_running_medians<T, I>(
    out: &mut dyn Write,
    window_size: usize,
    values: I,
    exact: bool,
) -> Result<usize, MedianError>
where
    T: Sample + std::fmt::Display,
    I: IntoIterator<Item = Result<T, MedianError>>,
{
    writeln!(out, "index\tvalue\tmedian")?;
    let n = with_running_medians(window_size, values, |row| {
        if exact {
            writeln!(out, "{}\t{}\t{}", row.index, row.value, row.exact)?;
        } else {
            writeln!(out, "{}\t{}\t{}", row.index, row.value, row.median)?;
        }
        Ok(())
    })?;
    out.flush()?;
    Ok(n)
}
