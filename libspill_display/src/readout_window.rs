use std::collections::BTreeMap;

use super::plane_map::PlaneMap;
use super::record::{Primitive, RecordBlock, RecordKey, TriggerRecord};

/// The samples of one plane inside its acquisition interval `[start_ns, end_ns)`, grouped by channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaneReadout {
    pub name: String,
    pub first_channel: u32,
    pub last_channel: u32,
    pub start_ns: u64,
    pub end_ns: u64,
    pub channels: BTreeMap<u32, Vec<Primitive>>,
}

impl PlaneReadout {
    pub fn n_samples(&self) -> usize {
        self.channels.values().map(|v| v.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Every sample of the plane ordered by channel, then start time
    pub fn samples(&self) -> impl Iterator<Item = &Primitive> {
        self.channels.values().flatten()
    }
}

/// Everything shown for one trigger record. Exists even when no primitive fell inside.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadoutWindow {
    pub key: RecordKey,
    pub trigger_timestamp_ns: u64,
    pub planes: Vec<PlaneReadout>,
    /// Primitives of the block that landed in no plane interval
    pub n_outside: usize,
}

impl ReadoutWindow {
    pub fn n_samples(&self) -> usize {
        self.planes.iter().map(|p| p.n_samples()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.planes.iter().all(|p| p.is_empty())
    }
}

/// Builds readout windows from a single record block. Never looks at any other block.
#[derive(Debug, Clone)]
pub struct ReadoutAssembler {
    plane_map: PlaneMap,
    tick_ns: u64,
}

impl ReadoutAssembler {
    pub fn new(plane_map: PlaneMap, tick_ns: u64) -> Self {
        Self { plane_map, tick_ns }
    }

    pub fn assemble(&self, block: &RecordBlock) -> ReadoutWindow {
        let trigger_ns = TriggerRecord::from_raw(&block.entry, self.tick_ns).timestamp_ns;
        let mut planes: Vec<PlaneReadout> = self
            .plane_map
            .planes()
            .iter()
            .map(|p| PlaneReadout {
                name: p.name.clone(),
                first_channel: p.first_channel,
                last_channel: p.last_channel,
                start_ns: trigger_ns.saturating_sub(p.pre_window_ns),
                end_ns: trigger_ns.saturating_add(p.post_window_ns),
                channels: BTreeMap::new(),
            })
            .collect();

        let mut n_outside = 0;
        for tp in block.primitives.iter() {
            let plane = match self.plane_map.plane_index(tp.channel) {
                Some(idx) => planes.get_mut(idx),
                None => None,
            };
            let Some(plane) = plane else {
                n_outside += 1;
                continue;
            };
            if plane.start_ns <= tp.time_start_ns && tp.time_start_ns < plane.end_ns {
                plane.channels.entry(tp.channel).or_default().push(*tp);
            } else {
                n_outside += 1;
            }
        }

        for plane in planes.iter_mut() {
            for samples in plane.channels.values_mut() {
                samples.sort_by_key(|tp| tp.time_start_ns);
            }
        }

        ReadoutWindow {
            key: block.entry.key(),
            trigger_timestamp_ns: trigger_ns,
            planes,
            n_outside,
        }
    }
}
