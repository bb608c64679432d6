/// Receives a human readable label before each step of an upload.
///
/// Sinks are passive: nothing they do changes how the upload proceeds.
pub trait ProgressSink {
    fn step(&self, label: &str);
}

impl<F> ProgressSink for F
where
    F: Fn(&str),
{
    fn step(&self, label: &str) {
        self(label)
    }
}

/// Discards every label.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn step(&self, _label: &str) {}
}
