use super::{Dispatcher, Work};

/// Runs every unit of work inline, before `dispatch` returns.
#[derive(Clone, Copy, Debug, Default)]
pub struct ImmediateDispatcher;

impl Dispatcher for ImmediateDispatcher {
    fn dispatch(&self, work: Work) {
        work()
    }
}
