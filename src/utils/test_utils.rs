use crate::localization::{Contact, CoordinateSpace, CoordinateType, Lead, Localization};
use crate::processing::affine::AffineMatrix;
use nalgebra::Matrix4;
use rand::Rng;
use std::io::Write;
use std::sync::{Arc, Mutex};

/// Two leads: LA (LA1..LA3) and RB (RB1, RB2), no coordinates.
pub fn sample_localization() -> Localization {
    Localization::from_leads(vec![
        Lead {
            name: "LA".to_string(),
            lead_type: "D".to_string(),
            contacts: vec![Contact::new("LA1"), Contact::new("LA2"), Contact::new("LA3")],
        },
        Lead {
            name: "RB".to_string(),
            lead_type: "S".to_string(),
            contacts: vec![Contact::new("RB1"), Contact::new("RB2")],
        },
    ])
    .unwrap()
}

/// Like [`sample_localization`] with a corrected fsaverage point on LA1 only.
pub fn localization_with_correction(point: [f64; 3]) -> Localization {
    let mut leads = sample_localization().leads().to_vec();
    leads[0].contacts[0]
        .coordinate_spaces
        .entry(CoordinateSpace::SurfaceAverage)
        .or_default()
        .insert(CoordinateType::Corrected, point);
    Localization::from_leads(leads).unwrap()
}

/// One row in the scanner-coordinate CSV layout: name, 9 unused columns, x, y, z.
pub fn coords_row(name: &str, point: [f64; 3]) -> String {
    format!(
        "{},0,0,0,0,0,0,0,0,0,{},{},{}",
        name, point[0], point[1], point[2]
    )
}

/// Well-conditioned random affine: diagonally dominant linear part plus translation.
pub fn random_affine<R: Rng>(rng: &mut R) -> AffineMatrix {
    let mut m = Matrix4::identity();
    for r in 0..3 {
        for c in 0..3 {
            m[(r, c)] = rng.random_range(-1.0..1.0);
        }
        m[(r, r)] += if rng.random_bool(0.5) { 4.0 } else { -4.0 };
        m[(r, 3)] = rng.random_range(-150.0..150.0);
    }
    AffineMatrix::new(m).unwrap()
}

pub fn random_point<R: Rng>(rng: &mut R) -> [f64; 3] {
    [
        rng.random_range(-100.0..100.0),
        rng.random_range(-100.0..100.0),
        rng.random_range(-100.0..100.0),
    ]
}

/// Collects formatted `tracing` output for assertions on log lines.
#[derive(Clone, Default)]
pub struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }

    /// Lines logged at WARN level.
    pub fn warnings(&self) -> Vec<String> {
        self.contents()
            .lines()
            .filter(|l| l.contains("WARN"))
            .map(str::to_string)
            .collect()
    }
}

impl Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Runs `f` with a subscriber writing into the returned buffer.
pub fn with_captured_logs<T>(f: impl FnOnce() -> T) -> (T, CapturedLogs) {
    let logs = CapturedLogs::default();
    let writer = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();
    let out = tracing::subscriber::with_default(subscriber, f);
    (out, logs)
}
