use super::{AlertAnalyzer, EventType, TelemetryEvent};

pub(crate) const FUEL_LOW_ALERT: &str = "Fuel Low Warning";

/// Raises a fuel warning while the trip's current event reports low fuel. The
/// alert holds only as long as FUEL_LOW stays the latest applicable event;
/// the deriver rebuilds the alert list from scratch on every tick.
pub struct FuelAlertAnalyzer;

impl AlertAnalyzer for FuelAlertAnalyzer {
    fn analyze(&self, current_event: &TelemetryEvent) -> Option<String> {
        if current_event.event_type == EventType::FuelLow {
            Some(FUEL_LOW_ALERT.to_string())
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fires_on_fuel_low() {
        let event = TelemetryEvent {
            event_type: EventType::FuelLow,
            ..Default::default()
        };
        assert_eq!(
            FuelAlertAnalyzer.analyze(&event),
            Some(FUEL_LOW_ALERT.to_string())
        );
    }

    #[test]
    fn test_silent_on_other_events() {
        for event_type in [EventType::Moving, EventType::Stopped, EventType::Cancelled] {
            let event = TelemetryEvent {
                event_type,
                ..Default::default()
            };
            assert_eq!(FuelAlertAnalyzer.analyze(&event), None);
        }
    }
}
