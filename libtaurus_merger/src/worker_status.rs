/// Progress message sent by the processor after each input directory
#[derive(Debug, Clone, Default)]
pub struct WorkerStatus {
    pub progress: f32,
    pub directory: String,
    pub files_written: usize,
}

impl WorkerStatus {
    pub fn new(progress: f32, directory: &str, files_written: usize) -> Self {
        Self {
            progress,
            directory: directory.to_string(),
            files_written,
        }
    }
}
