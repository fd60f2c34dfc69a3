//! Where per-frame device snapshots come from

use std::any::Any;
use std::collections::VecDeque;

use super::state::DeviceSnapshot;

/// Supplies the authoritative device state once per frame
///
/// Implementations: [`InputCollector`](super::InputCollector) (winit),
/// [`ScriptedSource`] (tests and replays).
pub trait SnapshotSource {
    /// Returns the current device state by value
    fn sample(&mut self) -> DeviceSnapshot;

    /// Downcast to the concrete source, e.g. to feed it window events
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Replays a queue of snapshots, one per `sample` call
///
/// Once the queue runs dry the last snapshot is repeated, which reads as
/// "the player stopped touching anything".
#[derive(Debug, Clone, Default)]
pub struct ScriptedSource {
    queue: VecDeque<DeviceSnapshot>,
    last: DeviceSnapshot,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a source that will return `frames` in order
    pub fn from_frames(frames: impl IntoIterator<Item = DeviceSnapshot>) -> Self {
        Self {
            queue: frames.into_iter().collect(),
            last: DeviceSnapshot::default(),
        }
    }

    /// Queues one more frame
    pub fn push(&mut self, frame: DeviceSnapshot) {
        self.queue.push_back(frame);
    }

    /// Frames not yet sampled
    pub fn remaining(&self) -> usize {
        self.queue.len()
    }
}

impl SnapshotSource for ScriptedSource {
    fn sample(&mut self) -> DeviceSnapshot {
        if let Some(next) = self.queue.pop_front() {
            self.last = next;
        }
        self.last.clone()
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::KeyCode;

    #[test]
    fn test_frames_replay_in_order() {
        let a = DeviceSnapshot::new().with_position(1, 1);
        let b = DeviceSnapshot::new().with_position(2, 2);
        let mut source = ScriptedSource::from_frames([a.clone(), b.clone()]);

        assert_eq!(source.remaining(), 2);
        assert_eq!(source.sample(), a);
        assert_eq!(source.sample(), b);
        assert_eq!(source.remaining(), 0);
    }

    #[test]
    fn test_last_frame_repeats() {
        let held = DeviceSnapshot::new().with_keys([KeyCode::Space]);
        let mut source = ScriptedSource::new();
        assert_eq!(source.sample(), DeviceSnapshot::default());

        source.push(held.clone());
        assert_eq!(source.sample(), held);
        assert_eq!(source.sample(), held);
    }
}
