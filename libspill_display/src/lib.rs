//! # spill_display
//!
//! spill_display sorts the trigger records of a ProtoDUNE run into those taken while the
//! beam was being extracted (spill ON) and those taken between extractions (spill OFF),
//! and draws an event display for each spill ON record. It reads the text dumps of the
//! raw HDF5 files written by the DAQ and the spill extraction log exported from the beam
//! server.
//!
//! ## Building & Install
//!
//! To build and install the CLI use `cargo install --path ./spill_display_cli` from the
//! top level repository. The HDF5 display backend is optional; enable it with
//! `--features hdf5`. HDF5 must then be installed and discoverable by the `hdf5` crate
//! (set `HDF5_DIR` in `.cargo/config.toml` if it lives in a custom location).
//!
//! ## Workflow
//!
//! The analysis is made of four steps, each available as a CLI subcommand:
//!
//! 1. `locate`: find the raw files of a run under `raw_data_path` and write an ordered
//! file list
//! 2. `filter`: read the dump of every listed file and write one row per trigger record of
//! the configured trigger type to a CSV table
//! 3. `match`: build the spill windows from the beam export and label every row of the
//! table ON or OFF
//! 4. `display`: render the readout window of every spill ON record, one file per record
//!
//! Output tables are never overwritten; `output.csv` becomes `output1.csv`, `output2.csv`,
//! ... if the name is taken.
//!
//! ## Configuration
//!
//! The YAML format of a configuration file is as follows:
//!
//! ```yml
//! raw_data_path: /data/np04/raw
//! trigger_type: 8
//! tick_ns: 16
//! spill_duration_ms: 4800
//! time_base_offset_ms: 0
//! spill_header: null
//! planes:
//! - name: APA1
//!   first_channel: 800
//!   last_channel: 1600
//!   pre_window_ns: 0
//!   post_window_ns: 5898240
//! renderer: svg
//! n_threads: 1
//! ```
//!
//! `time_base_offset_ms` is added to detector time (converted to ms) to land on the beam
//! server clock. `spill_header` lists the column names to use when the beam export came
//! without a header row, e.g. `[Event, Variable, Clock]`.
//!
//! ### Beam Export Format
//!
//! A CSV with at least the columns `Event`, `Variable` and `Clock`. `Clock` is the UTC
//! time of the extraction in milliseconds since the epoch. Every row opens a spill ON
//! window of `spill_duration_ms`; the time up to the next extraction is spill OFF.
//!
//! ### Record Table Format
//!
//! ```csv
//! Run,Subrun,Trigger_Record,Timestamp
//! ```
//!
//! `Timestamp` is the trigger timestamp in detector ticks. The labelled table written by
//! `match` adds a `Spill_Mode` column holding `ON` or `OFF`.
//!
//! ## Output
//!
//! Displays are named `Run<run>-Subrun<subrun>-TriggerRecord<id>.svg` (or `.h5`). The SVG
//! display has one panel per readout plane showing primitive start time against channel,
//! coloured by the log of the ADC integral. The HDF5 display is laid out as:
//!
//! ```text
//! Run27396-Subrun0001-TriggerRecord12.h5 - run, subrun, trigger_record, trigger_timestamp_ns, version
//! |---- APA1 - first_channel, last_channel, start_ns, end_ns
//! |    |---- primitives(dset)
//! ```
//!
//! Every command also writes a log file, which should be checked whenever warnings were
//! reported.
pub mod config;
pub mod constants;
pub mod error;
pub mod extractor;
pub mod file_locator;
#[cfg(feature = "hdf5")]
pub mod hdf_writer;
pub mod plane_map;
pub mod process;
pub mod readout_window;
pub mod record;
pub mod record_table;
pub mod renderer;
pub mod run_info;
pub mod spill_export;
pub mod spill_matcher;
pub mod spill_window;
pub mod summary;
pub mod svg_renderer;
pub mod worker_status;
