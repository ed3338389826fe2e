//! # taurus_merger
//!
//! taurus_merger regroups seismic waveform data written by Nanometrics Taurus recorders into the
//! layout produced by Centaur recorders. Taurus writes one miniSEED file per station, channel, and
//! hour; Centaur writes one file per station and hour holding all three components. The merger
//! finds the three component files of each station hour, stitches each file into a single
//! continuous trace, and writes the three traces into one miniSEED file.
//!
//! ## Installation
//!
//! The only method of install is from source. If you have not used Rust before, see the
//! [Rust docs](https://www.rust-lang.org/tools/install) for toolchain installation instructions.
//!
//! To build and install the CLI use `cargo install --path ./taurus_merger_cli` from the top level
//! repository. The binary is installed to your cargo install location (typically
//! `~/.cargo/bin/`).
//!
//! ## Input Layout
//!
//! The input directory must contain subdirectories (typically one per day) holding the Taurus
//! files. Only files whose name ends in the input suffix (`seed` by default) are considered, and
//! they must be named
//!
//! ```text
//! <network>.<station>.<location>.<channel>_<YYYYMMDD>_<HHMMSS>.<ext>
//! ```
//!
//! Files are grouped purely on their names: three files of the same start date and time with
//! three different channel codes form a station hour. Sample start times inside the files are
//! not compared. Files which cannot be grouped are reported and left alone.
//!
//! ## Output Layout
//!
//! Each group is written to
//!
//! ```text
//! <output>/<input subdirectory>/<network>.<station>.<location>.<band+instrument>_<YYYYMMDD>_<HHMMSS>.miniseed
//! ```
//!
//! or, when `structured_output` is set, to `<output>/<YYYY>/<MM>/<DD>/` with the same file name.
//!
//! ## Gaps and Overlaps
//!
//! A Taurus file may hold several segments when the recorder lost or repeated data. Such files
//! are merged into one continuous trace, filling gaps by linear interpolation. The size of every
//! gap, in samples at the configured reference rate (250 Hz by default), is collected and printed
//! as two histograms (signed and absolute) at the end of a run.
//!
//! ## Configuration
//!
//! A configuration file is YAML:
//!
//! ```yml
//! input_path: /data/taurus
//! output_path: /data/centaur
//! channel_order: ZNE
//! structured_output: false
//! verbose: true
//! reference_rate: 250.0
//! input_suffix: seed
//! output_extension: miniseed
//! skip_malformed: false
//! ```
//!
//! `channel_order` is optional; when it is omitted the traces keep the order the files were
//! discovered in. `skip_malformed` decides whether a badly named file stops the run (the default)
//! or is skipped with a warning.
pub mod assembler;
pub mod codec;
pub mod config;
pub mod constants;
pub mod descriptor;
pub mod error;
pub mod matcher;
pub mod mseed;
pub mod process;
pub mod reconciler;
pub mod scanner;
pub mod segment;
pub mod stats;
pub mod worker_status;
