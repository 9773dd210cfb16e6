//! Shake detection from accelerometer readings.

pub const STANDARD_GRAVITY: f64 = 9.80665;
const DEFAULT_THRESHOLD: f64 = 4.0;

/// One accelerometer sample, in m/s² per axis.
#[derive(Debug, Clone, PartialEq)]
pub struct SensorReading {
    pub values: Vec<f32>,
}

/// Receives sensor callbacks.
pub trait SensorListener {
    fn on_sensor_changed(&mut self, reading: &SensorReading);

    fn on_accuracy_changed(&mut self, _accuracy: i32) {}
}

type ShakeCallback = Box<dyn FnMut() + Send>;

/// Fires the registered callback when acceleration beyond gravity exceeds the threshold.
pub struct ShakeDetector {
    threshold: f64,
    on_shake: Option<ShakeCallback>,
}

impl Default for ShakeDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl ShakeDetector {
    pub fn new() -> Self {
        Self::with_threshold(DEFAULT_THRESHOLD)
    }

    pub fn with_threshold(threshold: f64) -> Self {
        Self {
            threshold,
            on_shake: None,
        }
    }

    pub fn detect_shakes(&mut self, callback: impl FnMut() + Send + 'static) {
        self.on_shake = Some(Box::new(callback));
    }

    pub fn stop_detecting_shakes(&mut self) {
        self.on_shake = None;
    }

    pub fn is_detecting(&self) -> bool {
        self.on_shake.is_some()
    }

    /// Magnitude of the reading minus standard gravity. `None` for fewer than three axes.
    pub fn acceleration(reading: &SensorReading) -> Option<f64> {
        let [x, y, z] = match reading.values.as_slice() {
            [x, y, z, ..] => [*x, *y, *z].map(f64::from),
            _ => return None,
        };
        Some((x * x + y * y + z * z).sqrt() - STANDARD_GRAVITY)
    }
}

impl SensorListener for ShakeDetector {
    fn on_sensor_changed(&mut self, reading: &SensorReading) {
        let Some(acceleration) = Self::acceleration(reading) else {
            return;
        };
        if acceleration > self.threshold {
            tracing::debug!(acceleration, "Shake detected");
            if let Some(callback) = self.on_shake.as_mut() {
                callback();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn reading(x: f32, y: f32, z: f32) -> SensorReading {
        SensorReading {
            values: vec![x, y, z],
        }
    }

    fn counting_detector() -> (ShakeDetector, Arc<AtomicUsize>) {
        let count = Arc::new(AtomicUsize::new(0));
        let mut detector = ShakeDetector::new();
        let seen = count.clone();
        detector.detect_shakes(move || {
            seen.fetch_add(1, Ordering::SeqCst);
        });
        (detector, count)
    }

    #[test]
    fn resting_device_is_not_a_shake() {
        let (mut detector, count) = counting_detector();
        detector.on_sensor_changed(&reading(0.0, 0.0, 9.81));
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn strong_motion_fires_callback() {
        let (mut detector, count) = counting_detector();
        detector.on_sensor_changed(&reading(10.0, 5.0, 9.81));
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn threshold_is_exclusive() {
        let accel = ShakeDetector::acceleration(&reading(0.0, 0.0, 13.80665)).unwrap();
        assert!((accel - 4.0).abs() < 1e-5);
        let (mut detector, count) = counting_detector();
        detector.on_sensor_changed(&reading(0.0, 0.0, 13.8));
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn short_readings_are_ignored() {
        let (mut detector, count) = counting_detector();
        detector.on_sensor_changed(&SensorReading {
            values: vec![50.0, 50.0],
        });
        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert_eq!(ShakeDetector::acceleration(&SensorReading { values: vec![] }), None);
    }

    #[test]
    fn stopping_removes_callback() {
        let (mut detector, count) = counting_detector();
        detector.stop_detecting_shakes();
        assert!(!detector.is_detecting());
        detector.on_sensor_changed(&reading(30.0, 30.0, 30.0));
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }
}
