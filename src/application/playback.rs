//! Active-segment tracking driven by a playback clock.
//!
//! The media player publishes [`PlaybackTick`]s on a [`PlaybackClock`]; each
//! content view follows the clock for its own resource and only sees a new
//! value when the active segment actually changes. Handling a tick is a linear
//! scan over the segments and never touches the alignment.

use serde::{Deserialize, Serialize};
use tokio::{sync::watch, task::JoinHandle};
use tracing::trace;

use crate::domain::segments::SegmentSet;

/// The first segment whose `[start, end)` interval contains `current_time`.
pub fn active_segment_id(segments: &SegmentSet, current_time: f64) -> Option<i64> {
    if !current_time.is_finite() {
        return None;
    }
    segments
        .iter()
        .find(|segment| segment.contains_time(current_time))
        .map(|segment| segment.id)
}

/// One time update from a media player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackTick {
    pub resource_id: String,
    pub current_time: f64,
    pub total_time: f64,
}

impl PlaybackTick {
    pub fn new(resource_id: impl Into<String>, current_time: f64, total_time: f64) -> Self {
        Self {
            resource_id: resource_id.into(),
            current_time,
            total_time,
        }
    }
}

/// Shared playback position. Subscribers always observe the latest tick.
#[derive(Debug)]
pub struct PlaybackClock {
    sender: watch::Sender<Option<PlaybackTick>>,
}

impl PlaybackClock {
    pub fn new() -> Self {
        let (sender, _receiver) = watch::channel(None);
        Self { sender }
    }

    pub fn publish(&self, tick: PlaybackTick) {
        self.sender.send_replace(Some(tick));
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<PlaybackTick>> {
        self.sender.subscribe()
    }
}

impl Default for PlaybackClock {
    fn default() -> Self {
        Self::new()
    }
}

/// Remembers the last active id for one resource so unchanged ticks can be
/// ignored.
#[derive(Debug, Clone)]
pub struct ActiveSegmentTracker {
    resource_id: String,
    last: Option<i64>,
}

impl ActiveSegmentTracker {
    pub fn new(resource_id: impl Into<String>) -> Self {
        Self {
            resource_id: resource_id.into(),
            last: None,
        }
    }

    pub fn current(&self) -> Option<i64> {
        self.last
    }

    /// Returns `Some(new_id)` only when the tick belongs to this resource and
    /// moves the active segment.
    pub fn observe(&mut self, tick: &PlaybackTick, segments: &SegmentSet) -> Option<Option<i64>> {
        if tick.resource_id != self.resource_id {
            return None;
        }
        let next = active_segment_id(segments, tick.current_time);
        if next == self.last {
            return None;
        }
        self.last = next;
        Some(next)
    }
}

/// Spawn a task that follows `clock` for `resource_id` and publishes the active
/// segment id whenever it changes. The task ends when the clock is dropped or
/// every receiver of the returned channel is gone.
pub fn follow_active_segment(
    mut clock: watch::Receiver<Option<PlaybackTick>>,
    resource_id: impl Into<String>,
    segments: SegmentSet,
) -> (watch::Receiver<Option<i64>>, JoinHandle<()>) {
    let (sender, receiver) = watch::channel(None);
    let mut tracker = ActiveSegmentTracker::new(resource_id);

    let handle = tokio::spawn(async move {
        loop {
            let tick = clock.borrow_and_update().clone();
            let change = tick
                .as_ref()
                .and_then(|tick| tracker.observe(tick, &segments).map(|active| (tick, active)));
            if let Some((tick, active)) = change {
                trace!(
                    op = "playback::follow",
                    resource_id = %tick.resource_id,
                    current_time = tick.current_time,
                    active_segment_id = ?active,
                    "Active segment changed"
                );
                if sender.send(active).is_err() {
                    break;
                }
            }

            if clock.changed().await.is_err() {
                break;
            }
        }
    });

    (receiver, handle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::segments::Segment;

    fn segments() -> SegmentSet {
        SegmentSet::from_segments(vec![
            Segment::new(2, "second", 2.0, 3.5),
            Segment::new(1, "first", 0.5, 2.0),
            Segment::new(3, "third", 4.0, 5.0),
        ])
    }

    #[test]
    fn active_id_respects_half_open_intervals() {
        let set = segments();
        assert_eq!(active_segment_id(&set, 0.0), None);
        assert_eq!(active_segment_id(&set, 0.5), Some(1));
        assert_eq!(active_segment_id(&set, 1.999), Some(1));
        assert_eq!(active_segment_id(&set, 2.0), Some(2));
        assert_eq!(active_segment_id(&set, 3.7), None);
        assert_eq!(active_segment_id(&set, 5.0), None);
        assert_eq!(active_segment_id(&set, f64::NAN), None);
    }

    #[test]
    fn empty_segments_never_activate() {
        assert_eq!(active_segment_id(&SegmentSet::empty(), 1.0), None);
    }

    #[test]
    fn tracker_reports_only_changes_for_its_resource() {
        let set = segments();
        let mut tracker = ActiveSegmentTracker::new("episode-1");

        assert_eq!(
            tracker.observe(&PlaybackTick::new("episode-1", 0.6, 5.0), &set),
            Some(Some(1))
        );
        assert_eq!(
            tracker.observe(&PlaybackTick::new("episode-1", 0.9, 5.0), &set),
            None
        );
        assert_eq!(
            tracker.observe(&PlaybackTick::new("episode-2", 2.5, 5.0), &set),
            None
        );
        assert_eq!(tracker.current(), Some(1));
        assert_eq!(
            tracker.observe(&PlaybackTick::new("episode-1", 3.8, 5.0), &set),
            Some(None)
        );
        assert_eq!(tracker.current(), None);
    }

    #[tokio::test]
    async fn follower_publishes_changes_until_clock_drops() {
        let clock = PlaybackClock::new();
        let (mut active, handle) =
            follow_active_segment(clock.subscribe(), "episode-1", segments());

        clock.publish(PlaybackTick::new("episode-1", 1.0, 5.0));
        active.changed().await.expect("active id published");
        assert_eq!(*active.borrow_and_update(), Some(1));

        clock.publish(PlaybackTick::new("episode-2", 4.5, 5.0));
        clock.publish(PlaybackTick::new("episode-1", 4.5, 5.0));
        active.changed().await.expect("active id published");
        assert_eq!(*active.borrow_and_update(), Some(3));

        drop(clock);
        handle.await.expect("follower task exits cleanly");
    }
}
