pub mod timing_source;

pub use timing_source::TimingSource;
