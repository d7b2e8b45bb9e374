/// Which pass a worker is currently reporting on
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Stage {
    #[default]
    Filtering,
    Rendering,
    Finished,
}

/// Progress message sent from a worker to whoever is driving the UI
#[derive(Debug, Clone, Default)]
pub struct WorkerStatus {
    pub progress: f32,
    pub files_done: usize,
    pub files_total: usize,
    pub worker_id: usize,
    pub stage: Stage,
}

impl WorkerStatus {
    pub fn new(files_done: usize, files_total: usize, worker_id: usize, stage: Stage) -> Self {
        let progress = if files_total == 0 {
            1.0
        } else {
            files_done as f32 / files_total as f32
        };
        Self {
            progress,
            files_done,
            files_total,
            worker_id,
            stage,
        }
    }
}
