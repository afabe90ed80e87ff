//! Surface events
//!
//! Resize notifications fan out to subscribers through unbounded channels.
//! A [`ResizeSubscription`] is the receiving handle; dropping it unsubscribes,
//! and the sender is pruned on the next publish.

use futures::channel::mpsc;

/// Size of the presentation surface in physical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceSize {
    pub width: u32,
    pub height: u32,
}

impl SurfaceSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_zero(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height.max(1) as f32
    }
}

#[derive(Default)]
pub struct SurfaceEvents {
    subscribers: Vec<mpsc::UnboundedSender<SurfaceSize>>,
}

impl SurfaceEvents {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self) -> ResizeSubscription {
        let (sender, receiver) = mpsc::unbounded();
        self.subscribers.push(sender);
        ResizeSubscription { receiver }
    }

    /// Delivers a resize to every live subscriber and returns how many
    /// received it. Zero-sized surfaces (minimized windows) are ignored.
    pub fn publish_resize(&mut self, size: SurfaceSize) -> usize {
        if size.is_zero() {
            log::warn!("Ignoring resize to {}x{}", size.width, size.height);
            return 0;
        }
        self.subscribers
            .retain(|sender| sender.unbounded_send(size).is_ok());
        self.subscribers.len()
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers
            .iter()
            .filter(|sender| !sender.is_closed())
            .count()
    }
}

/// Receiving end of a resize subscription.
pub struct ResizeSubscription {
    receiver: mpsc::UnboundedReceiver<SurfaceSize>,
}

impl ResizeSubscription {
    /// Drains queued resizes and returns the most recent one.
    pub fn latest(&mut self) -> Option<SurfaceSize> {
        let mut latest = None;
        while let Ok(Some(size)) = self.receiver.try_next() {
            latest = Some(size);
        }
        latest
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subscribers_receive_latest_size() {
        let mut events = SurfaceEvents::new();
        let mut first = events.subscribe();
        let mut second = events.subscribe();

        assert_eq!(events.publish_resize(SurfaceSize::new(800, 600)), 2);
        assert_eq!(events.publish_resize(SurfaceSize::new(1024, 768)), 2);

        assert_eq!(first.latest(), Some(SurfaceSize::new(1024, 768)));
        assert_eq!(first.latest(), None);
        assert_eq!(second.latest(), Some(SurfaceSize::new(1024, 768)));
    }

    #[test]
    fn test_drop_unsubscribes() {
        let mut events = SurfaceEvents::new();
        let kept = events.subscribe();
        let dropped = events.subscribe();
        assert_eq!(events.subscriber_count(), 2);

        drop(dropped);
        assert_eq!(events.subscriber_count(), 1);
        assert_eq!(events.publish_resize(SurfaceSize::new(10, 10)), 1);
        drop(kept);
        assert_eq!(events.publish_resize(SurfaceSize::new(10, 10)), 0);
    }

    #[test]
    fn test_zero_size_is_ignored() {
        let mut events = SurfaceEvents::new();
        let mut subscription = events.subscribe();
        assert_eq!(events.publish_resize(SurfaceSize::new(0, 600)), 0);
        assert_eq!(subscription.latest(), None);
    }

    #[test]
    fn test_aspect() {
        assert_eq!(SurfaceSize::new(1600, 800).aspect(), 2.0);
        assert_eq!(SurfaceSize::new(10, 0).aspect(), 10.0);
    }
}
