// Channel -> plane lookup, every channel of every plane expanded up front
use fxhash::FxHashMap;

use super::config::PlaneConfig;

/// PlaneMap assigns detector channels to the configured readout planes.
#[derive(Debug, Clone, Default)]
pub struct PlaneMap {
    planes: Vec<PlaneConfig>,
    map: FxHashMap<u32, usize>,
}

impl PlaneMap {
    /// Create a new PlaneMap. Ranges are assumed not to overlap (checked by `Config::validate`);
    /// if they do, the first plane listed wins.
    pub fn new(planes: &[PlaneConfig]) -> Self {
        let mut pm = PlaneMap {
            planes: planes.to_vec(),
            map: FxHashMap::default(),
        };
        for (idx, plane) in planes.iter().enumerate() {
            for channel in plane.first_channel..=plane.last_channel {
                pm.map.entry(channel).or_insert(idx);
            }
        }
        pm
    }

    /// Index of the plane holding a channel. None if the channel is not read out.
    pub fn plane_index(&self, channel: u32) -> Option<usize> {
        self.map.get(&channel).copied()
    }

    pub fn planes(&self) -> &[PlaneConfig] {
        &self.planes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn test_default_planes() {
        let map = PlaneMap::new(&Config::default().planes);
        assert_eq!(map.plane_index(800), Some(0));
        assert_eq!(map.plane_index(1600), Some(0));
        assert_eq!(map.plane_index(7300), Some(1));
        assert_eq!(map.plane_index(4640), Some(2));
        assert_eq!(map.plane_index(9280), Some(3));
        assert_eq!(map.plane_index(3000), None);
        assert_eq!(map.planes()[3].name, "APA4");
    }
}
