pub mod check;
pub mod error;
pub mod listy;
pub mod median;
pub mod sorted;
pub mod stream;

pub use error::MedianError;
pub use median::WindowedMedian;
