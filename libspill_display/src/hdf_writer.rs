use hdf5::types::VarLenUnicode;
use hdf5::File;
use ndarray::Array2;
use std::path::Path;
use std::str::FromStr;

use super::error::RenderError;
use super::readout_window::{PlaneReadout, ReadoutWindow};
use super::renderer::EventDisplayRenderer;

const PRIMITIVES_NAME: &str = "primitives";
/// Columns of the primitives dataset
const N_COLUMNS: usize = 6;
/// This is the version of the output format
const FORMAT_VERSION: &str = "1.0";

// Structure
// / - run, subrun, trigger_record, trigger_timestamp_ns, version
// |---- <plane name> - first_channel, last_channel, start_ns, end_ns
// |    |---- primitives(dset) [channel, time_start, time_peak, time_over_threshold, adc_integral, adc_peak]

/// Writes each readout window as its own small HDF5 file, for displays made offline
#[derive(Debug, Default)]
pub struct HDFDisplayWriter;

impl HDFDisplayWriter {
    pub fn new() -> Self {
        Self
    }

    fn plane_matrix(plane: &PlaneReadout) -> Array2<u64> {
        let mut matrix = Array2::<u64>::zeros((plane.n_samples(), N_COLUMNS));
        for (row, tp) in plane.samples().enumerate() {
            matrix[[row, 0]] = tp.channel as u64;
            matrix[[row, 1]] = tp.time_start_ns;
            matrix[[row, 2]] = tp.time_peak_ns;
            matrix[[row, 3]] = tp.time_over_threshold_ns;
            matrix[[row, 4]] = tp.adc_integral;
            matrix[[row, 5]] = tp.adc_peak;
        }
        matrix
    }
}

impl EventDisplayRenderer for HDFDisplayWriter {
    fn extension(&self) -> &'static str {
        "h5"
    }

    fn render(&mut self, window: &ReadoutWindow, path: &Path) -> Result<(), RenderError> {
        let file_handle = File::create(path)?;
        let version = format!("{}:{}", env!("CARGO_PKG_NAME"), FORMAT_VERSION);

        // unknown identifiers are written as -1
        let run = window.key.run.map(|r| r as i64).unwrap_or(-1);
        let subrun = window.key.subrun.map(|s| s as i64).unwrap_or(-1);
        file_handle
            .new_attr::<i64>()
            .create("run")?
            .write_scalar(&run)?;
        file_handle
            .new_attr::<i64>()
            .create("subrun")?
            .write_scalar(&subrun)?;
        file_handle
            .new_attr::<u64>()
            .create("trigger_record")?
            .write_scalar(&window.key.trigger_id)?;
        file_handle
            .new_attr::<u64>()
            .create("trigger_timestamp_ns")?
            .write_scalar(&window.trigger_timestamp_ns)?;
        file_handle
            .new_attr::<VarLenUnicode>()
            .create("version")?
            .write_scalar(
                &VarLenUnicode::from_str(&version)
                    .map_err(|e| RenderError::Encoding(e.to_string()))?,
            )?;

        for plane in window.planes.iter() {
            let group = file_handle.create_group(&plane.name)?;
            group
                .new_attr::<u32>()
                .create("first_channel")?
                .write_scalar(&plane.first_channel)?;
            group
                .new_attr::<u32>()
                .create("last_channel")?
                .write_scalar(&plane.last_channel)?;
            group
                .new_attr::<u64>()
                .create("start_ns")?
                .write_scalar(&plane.start_ns)?;
            group
                .new_attr::<u64>()
                .create("end_ns")?
                .write_scalar(&plane.end_ns)?;
            group
                .new_dataset_builder()
                .with_data(&Self::plane_matrix(plane))
                .create(PRIMITIVES_NAME)?;
        }

        file_handle.close()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Primitive;
    use std::collections::BTreeMap;

    #[test]
    fn test_plane_matrix_layout() {
        let mut channels = BTreeMap::new();
        channels.insert(
            7,
            vec![Primitive {
                channel: 7,
                time_start_ns: 160,
                adc_integral: 42,
                adc_peak: 9,
                ..Default::default()
            }],
        );
        let plane = PlaneReadout {
            name: String::from("APA1"),
            first_channel: 0,
            last_channel: 10,
            start_ns: 0,
            end_ns: 1000,
            channels,
        };
        let matrix = HDFDisplayWriter::plane_matrix(&plane);
        assert_eq!(matrix.shape(), &[1, N_COLUMNS]);
        assert_eq!(matrix[[0, 0]], 7);
        assert_eq!(matrix[[0, 1]], 160);
        assert_eq!(matrix[[0, 4]], 42);
        assert_eq!(matrix[[0, 5]], 9);
    }
}
