/// Per-item callbacks for the batch operations `deploy` and `register`.
///
/// `cancelled` is polled before each item. Work already done on earlier
/// items stays done.
pub trait Progress {
    fn on_item(&mut self, _done: usize, _total: usize) {}

    fn cancelled(&self) -> bool {
        false
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl Progress for NoProgress {}
