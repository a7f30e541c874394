//! Typed publish/subscribe channel between the map view and side panels.

use crate::FacilityId;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};

/// Signals exchanged between sibling panels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SiteEvent {
    /// A marker on the map gained or lost hover
    MarkerHovered(Option<FacilityId>),
    /// A row in the directory gained or lost hover
    ProjectHover(Option<FacilityId>),
    /// Directory asked the map to centre on a marker
    ZoomToMarker(FacilityId),
}

impl SiteEvent {
    fn kind(&self) -> u8 {
        match self {
            SiteEvent::MarkerHovered(_) => 0,
            SiteEvent::ProjectHover(_) => 1,
            SiteEvent::ZoomToMarker(_) => 2,
        }
    }
}

/// Fan-out bus. Delivery is best effort; dropped subscribers are pruned.
#[derive(Debug, Default)]
pub struct EventBus {
    subscribers: Vec<Sender<SiteEvent>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self) -> Subscription {
        let (tx, rx) = mpsc::channel();
        self.subscribers.push(tx);
        Subscription { rx }
    }

    pub fn publish(&mut self, event: SiteEvent) {
        log::trace!("publish {event:?}");
        self.subscribers
            .retain(|subscriber| subscriber.send(event.clone()).is_ok());
    }
}

/// Receiving end of an [`EventBus`] subscription.
#[derive(Debug)]
pub struct Subscription {
    rx: Receiver<SiteEvent>,
}

impl Subscription {
    /// Returns all pending events in publish order.
    pub fn drain(&self) -> Vec<SiteEvent> {
        let mut events = Vec::new();
        loop {
            match self.rx.try_recv() {
                Ok(event) => events.push(event),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    log::warn!("Event bus disconnected");
                    break;
                }
            }
        }
        events
    }

    /// Returns pending events keeping only the last one of each kind.
    pub fn latest(&self) -> Vec<SiteEvent> {
        let mut latest: Vec<SiteEvent> = Vec::new();
        for event in self.drain() {
            latest.retain(|existing| existing.kind() != event.kind());
            latest.push(event);
        }
        latest
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_subscriber_receives_published_events() {
        let mut bus = EventBus::new();
        let map = bus.subscribe();
        let directory = bus.subscribe();

        bus.publish(SiteEvent::ZoomToMarker("al-ain-hq".into()));

        assert_eq!(
            map.drain(),
            vec![SiteEvent::ZoomToMarker("al-ain-hq".into())]
        );
        assert_eq!(
            directory.drain(),
            vec![SiteEvent::ZoomToMarker("al-ain-hq".into())]
        );
        assert!(map.drain().is_empty());
    }

    #[test]
    fn latest_keeps_last_event_per_kind() {
        let mut bus = EventBus::new();
        let sub = bus.subscribe();

        bus.publish(SiteEvent::MarkerHovered(Some("a".into())));
        bus.publish(SiteEvent::ZoomToMarker("x".into()));
        bus.publish(SiteEvent::MarkerHovered(Some("b".into())));
        bus.publish(SiteEvent::MarkerHovered(None));

        assert_eq!(
            sub.latest(),
            vec![
                SiteEvent::ZoomToMarker("x".into()),
                SiteEvent::MarkerHovered(None),
            ]
        );
    }

    #[test]
    fn dropped_subscribers_are_pruned() {
        let mut bus = EventBus::new();
        let kept = bus.subscribe();
        drop(bus.subscribe());
        assert_eq!(bus.subscribers.len(), 2);

        bus.publish(SiteEvent::ProjectHover(None));
        assert_eq!(bus.subscribers.len(), 1);
        assert_eq!(kept.drain(), vec![SiteEvent::ProjectHover(None)]);
    }
}
