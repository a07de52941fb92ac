//! Telemetry emitter — one formatted line per control iteration.
//!
//! Pure formatting over the current snapshot; no internal state.  Lines go
//! out through the [`TelemetrySink`] port so the serial console is just
//! one adapter and tests can capture lines in memory.
//!
//! Field order (plain mode, space-separated): acceleration X Y Z (g),
//! angular rate R P Y (deg/s, calibration-corrected), magnetic field
//! X Y Z (gauss), temperature (°C), pressure (mmHg), humidity (%),
//! proximity, colour R G B (raw/16), peak audio amplitude.

use core::fmt::Write as _;

use log::info;

use crate::config::{RevisionProfile, SystemConfig, TelemetryMode};
use crate::sensors::SensorSnapshot;

/// kPa → mmHg.
const KPA_TO_MMHG: f32 = 7.500_62;

/// Colour channels are reported at 1/16 of the raw count.
const COLOR_DIVISOR: u16 = 16;

/// Maximum line length (labelled mode with every field at full width).
pub const LINE_CAP: usize = 256;

/// Where telemetry lines go.  The domain never knows whether that is the
/// serial console or a test buffer.
pub trait TelemetrySink {
    fn write_line(&mut self, line: &str);
}

/// Adapter that writes every line to the logger (UART / USB-CDC in
/// production).
pub struct SerialSink;

impl SerialSink {
    pub fn new() -> Self {
        Self
    }
}

impl TelemetrySink for SerialSink {
    fn write_line(&mut self, line: &str) {
        info!("{}", line);
    }
}

/// Format one telemetry line.  `peak` is the carried-over audio peak for
/// this iteration.
pub fn format_line(
    snapshot: &SensorSnapshot,
    peak: u16,
    profile: &RevisionProfile,
    labelled: bool,
) -> heapless::String<LINE_CAP> {
    let [ax, ay, az] = snapshot.accel_g;
    let [gr, gp, gy] = corrected_gyro(snapshot, profile);
    let [mx, my, mz] = snapshot.mag_gauss;
    let mmhg = snapshot.pressure_kpa * KPA_TO_MMHG;
    let [lr, lg, lb] = snapshot.color.map(|c| c / COLOR_DIVISOR);

    let mut line = heapless::String::new();
    let result = if labelled {
        write!(
            line,
            "aX={ax:.2} aY={ay:.2} aZ={az:.2} \
             gR={gr:.2} gP={gp:.2} gY={gy:.2} \
             mX={mx:.2} mY={my:.2} mZ={mz:.2} \
             T={temp:.2} P={mmhg:.2} H={hum:.2} \
             prox={prox} lR={lr} lG={lg} lB={lb} peak={peak}",
            temp = snapshot.temperature_c,
            hum = snapshot.humidity_pct,
            prox = snapshot.proximity,
        )
    } else {
        write!(
            line,
            "{ax:.2} {ay:.2} {az:.2} \
             {gr:.2} {gp:.2} {gy:.2} \
             {mx:.2} {my:.2} {mz:.2} \
             {temp:.2} {mmhg:.2} {hum:.2} \
             {prox} {lr} {lg} {lb} {peak}",
            temp = snapshot.temperature_c,
            hum = snapshot.humidity_pct,
            prox = snapshot.proximity,
        )
    };
    debug_assert!(result.is_ok(), "telemetry line exceeded LINE_CAP");
    line
}

/// Emit one line according to the configured mode; `Off` sends nothing.
pub fn emit<S: TelemetrySink>(
    sink: &mut S,
    cfg: &SystemConfig,
    snapshot: &SensorSnapshot,
    peak: u16,
) {
    if cfg.telemetry == TelemetryMode::Off {
        return;
    }
    let line = format_line(
        snapshot,
        peak,
        cfg.profile(),
        cfg.telemetry == TelemetryMode::Labelled,
    );
    sink.write_line(&line);
}

fn corrected_gyro(snapshot: &SensorSnapshot, profile: &RevisionProfile) -> [f32; 3] {
    let mut out = [0.0f32; 3];
    for i in 0..3 {
        out[i] = snapshot.gyro_dps[i] - profile.gyro_offsets_dps[i];
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BoardRevision;

    struct CaptureSink(Vec<String>);

    impl TelemetrySink for CaptureSink {
        fn write_line(&mut self, line: &str) {
            self.0.push(line.to_owned());
        }
    }

    fn snapshot() -> SensorSnapshot {
        let cfg = SystemConfig::default();
        let mut s = SensorSnapshot::resting(&cfg);
        s.temperature_c = 25.31;
        s.humidity_pct = 40.12;
        s.pressure_kpa = 100.0;
        s.proximity = 12;
        s.color = [48, 52, 40];
        s
    }

    #[test]
    fn plain_line_fields_in_order() {
        let profile = BoardRevision::Rev2.profile();
        let line = format_line(&snapshot(), 650, profile, false);
        let fields: Vec<&str> = line.split_whitespace().collect();
        assert_eq!(fields.len(), 17);
        // Gyro sits on the offsets, so corrected values are zero.
        assert_eq!(fields[3], "0.00");
        assert_eq!(fields[4], "0.00");
        assert_eq!(fields[5], "0.00");
        // 100 kPa → 750.06 mmHg.
        assert_eq!(fields[10], "750.06");
        // Colour counts divided by 16.
        assert_eq!(fields[13], "3");
        assert_eq!(fields[14], "3");
        assert_eq!(fields[15], "2");
        assert_eq!(fields[16], "650");
    }

    #[test]
    fn labelled_line_carries_field_names() {
        let profile = BoardRevision::Rev2.profile();
        let line = format_line(&snapshot(), 42, profile, true);
        for label in ["aX=", "gR=", "mZ=", "T=", "P=", "H=", "prox=", "peak=42"] {
            assert!(line.contains(label), "missing {label} in {line}");
        }
    }

    #[test]
    fn off_mode_emits_nothing() {
        let mut cfg = SystemConfig::default();
        cfg.telemetry = TelemetryMode::Off;
        let mut sink = CaptureSink(Vec::new());
        emit(&mut sink, &cfg, &snapshot(), 0);
        assert!(sink.0.is_empty());

        cfg.telemetry = TelemetryMode::Plain;
        emit(&mut sink, &cfg, &snapshot(), 0);
        assert_eq!(sink.0.len(), 1);
    }
}
