//! Random-walk GPS

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use roadlink_core::transport::{LocationError, LocationProvider};
use roadlink_geo::{offset, GeoPoint};
use std::f64::consts::TAU;

/// Walks a fixed step in a random direction on every watch update.
#[derive(Debug)]
pub struct SimulatedLocationProvider {
    position: GeoPoint,
    step_meters: f64,
    rng: StdRng,
    failure: Option<LocationError>,
    remaining_updates: Option<usize>,
}

impl SimulatedLocationProvider {
    pub fn new(start: GeoPoint, step_meters: f64, seed: u64) -> Self {
        Self {
            position: start,
            step_meters: step_meters.max(0.0),
            rng: StdRng::seed_from_u64(seed),
            failure: None,
            remaining_updates: None,
        }
    }

    /// End the watch stream after `updates` more positions.
    #[must_use]
    pub fn with_update_limit(mut self, updates: usize) -> Self {
        self.remaining_updates = Some(updates);
        self
    }

    /// Fail every request with `error` until [`recover`](Self::recover).
    pub fn fail_with(&mut self, error: LocationError) {
        self.failure = Some(error);
    }

    pub fn recover(&mut self) {
        self.failure = None;
    }

    /// Last position handed out
    pub fn position(&self) -> GeoPoint {
        self.position
    }
}

impl LocationProvider for SimulatedLocationProvider {
    fn current_position(&mut self) -> Result<GeoPoint, LocationError> {
        match self.failure {
            Some(error) => Err(error),
            None => Ok(self.position),
        }
    }

    fn next_update(&mut self) -> Option<Result<GeoPoint, LocationError>> {
        if let Some(remaining) = self.remaining_updates.as_mut() {
            if *remaining == 0 {
                return None;
            }
            *remaining -= 1;
        }
        if let Some(error) = self.failure {
            return Some(Err(error));
        }

        let bearing = self.rng.gen_range(0.0..TAU);
        if let Ok(next) = offset(&self.position, self.step_meters, bearing) {
            self.position = next;
        }
        Some(Ok(self.position))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use roadlink_geo::distance;

    const LONDON: GeoPoint = GeoPoint::new(51.5074, -0.1278);

    #[test]
    fn test_steps_have_configured_length() {
        let mut provider = SimulatedLocationProvider::new(LONDON, 25.0, 7);
        let mut previous = provider.current_position().unwrap();
        for _ in 0..20 {
            let next = provider.next_update().unwrap().unwrap();
            assert!((distance(&previous, &next) - 25.0).abs() < 0.5);
            previous = next;
        }
    }

    #[test]
    fn test_same_seed_same_walk() {
        let mut a = SimulatedLocationProvider::new(LONDON, 25.0, 42);
        let mut b = SimulatedLocationProvider::new(LONDON, 25.0, 42);
        for _ in 0..10 {
            assert_eq!(a.next_update(), b.next_update());
        }
    }

    #[test]
    fn test_failure_and_recovery() {
        let mut provider = SimulatedLocationProvider::new(LONDON, 25.0, 1);
        provider.fail_with(LocationError::PermissionDenied);
        assert_eq!(provider.current_position(), Err(LocationError::PermissionDenied));
        assert_eq!(provider.next_update(), Some(Err(LocationError::PermissionDenied)));

        provider.recover();
        assert_eq!(provider.current_position(), Ok(LONDON));
    }

    #[test]
    fn test_update_limit_ends_watch() {
        let mut provider = SimulatedLocationProvider::new(LONDON, 25.0, 1).with_update_limit(2);
        assert!(provider.next_update().is_some());
        assert!(provider.next_update().is_some());
        assert!(provider.next_update().is_none());
    }
}
